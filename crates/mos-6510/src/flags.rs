//! 6510 processor status register (P).

use std::fmt;

/// Carry.
pub const C: u8 = 0x01;
/// Zero.
pub const Z: u8 = 0x02;
/// IRQ disable.
pub const I: u8 = 0x04;
/// Decimal mode for ADC/SBC.
pub const D: u8 = 0x08;
/// Break. Cleared by the interrupt entry sequence so a pushed status byte
/// tells a hardware interrupt apart from BRK.
pub const B: u8 = 0x10;
/// Unused, reads as 1 after any pull.
pub const U: u8 = 0x20;
/// Overflow.
pub const V: u8 = 0x40;
/// Negative.
pub const N: u8 = 0x80;

/// Processor status register.
///
/// B is stored like any other bit because the sequencer pushes the live
/// value: clear during the hardware interrupt sequence, set otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Power-on value: B and U set, everything else clear.
    #[must_use]
    pub const fn power_on() -> Self {
        Self(B | U)
    }

    /// Status as pulled by PLP/RTI. B and U always come back set.
    #[must_use]
    pub const fn pulled(value: u8) -> Self {
        Self(value | B | U)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Set N and Z from a result byte.
    pub fn set_nz(&mut self, value: u8) {
        self.set(Z, value == 0);
        self.set(N, value & 0x80 != 0);
    }

    /// Carry as 0 or 1.
    #[must_use]
    pub const fn carry(self) -> u8 {
        self.0 & C
    }
}

impl fmt::Display for Status {
    /// `NV-BDIZC`, upper case for set flags.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, char); 8] = [
            (N, 'N'),
            (V, 'V'),
            (U, '-'),
            (B, 'B'),
            (D, 'D'),
            (I, 'I'),
            (Z, 'Z'),
            (C, 'C'),
        ];
        for (flag, name) in NAMES {
            let shown = if self.contains(flag) {
                name
            } else {
                name.to_ascii_lowercase()
            };
            write!(f, "{shown}")?;
        }
        Ok(())
    }
}
