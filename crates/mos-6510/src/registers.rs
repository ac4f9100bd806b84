//! 6510 programmer-visible registers.

use crate::Status;

/// Base of the hardware stack page.
pub const STACK_PAGE: u16 = 0x0100;

/// Register file.
///
/// | Reg | Width | Notes |
/// |-----|-------|-------|
/// | A   | 8     | accumulator |
/// | X,Y | 8     | index registers |
/// | S   | 8     | stack pointer into page 1, post-decrement push |
/// | PC  | 16    | program counter |
/// | P   | 8     | status, see [`crate::flags`] |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub pc: u16,
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Values loaded when RST is triggered. The reset sequence then pushes
    /// three bytes, leaving S at $FC when the first instruction runs.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFF,
            pc: 0,
            p: Status::power_on(),
        }
    }

    /// Address of the current stack slot.
    #[must_use]
    pub const fn stack_address(&self) -> u16 {
        STACK_PAGE | self.s as u16
    }

    /// Address to write a pushed byte to. Decrements S.
    pub fn push(&mut self) -> u16 {
        let address = self.stack_address();
        self.s = self.s.wrapping_sub(1);
        address
    }

    /// Increments S and returns the address to pull from.
    pub fn pull(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        self.stack_address()
    }

    pub(crate) fn pc_low(&self) -> u8 {
        self.pc as u8
    }

    pub(crate) fn pc_high(&self) -> u8 {
        (self.pc >> 8) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pull_wrap_inside_page_one() {
        let mut regs = Registers::new();
        regs.s = 0x00;
        assert_eq!(regs.push(), 0x0100);
        assert_eq!(regs.s, 0xFF);
        assert_eq!(regs.pull(), 0x0100);
        assert_eq!(regs.s, 0x00);
    }
}
