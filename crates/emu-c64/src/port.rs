//! 6510 on-chip I/O port at $00 (direction) and $01 (data).
//!
//! Bits 0-2 drive the PLA's LORAM/HIRAM/CHAREN inputs. Bits 6 and 7 are
//! not connected: a 1 written while they are outputs lingers on the pins
//! for a while after they are switched to inputs, then reads as 0.

/// Cycles an undriven bit 6/7 keeps its charge.
pub const FALL_OFF_CYCLES: u64 = 350_000;

#[derive(Debug, Clone, Copy, Default)]
struct FloatingBit {
    set: bool,
    falling_off: bool,
    deadline: u64,
}

impl FloatingBit {
    fn valid(self, now: u64) -> bool {
        self.set && !(self.falling_off && self.deadline < now)
    }

    fn expire(&mut self, now: u64) {
        if self.falling_off && self.deadline < now {
            self.set = false;
            self.falling_off = false;
        }
    }

    /// The direction register is being written with `output` for this bit.
    fn direction_written(&mut self, output: bool, now: u64) {
        if !self.set {
            return;
        }
        if !output && !self.falling_off {
            self.falling_off = true;
            self.deadline = now + FALL_OFF_CYCLES;
        } else if output && self.falling_off {
            self.falling_off = false;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessorPort {
    dir: u8,
    data: u8,
    /// Levels on the pins.
    data_out: u8,
    /// What a read of $01 returns, before bits 6/7 fall off.
    data_read: u8,
    bit6: FloatingBit,
    bit7: FloatingBit,
}

impl Default for ProcessorPort {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorPort {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: 0,
            data: 0x3F,
            data_out: 0x3F,
            data_read: 0x3F,
            bit6: FloatingBit::default(),
            bit7: FloatingBit::default(),
        }
    }

    /// Power-on state: every pin an input. Returns the PLA lines.
    pub fn reset(&mut self) -> u8 {
        *self = Self::new();
        self.update()
    }

    /// Recompute the pins and return the lines that feed the PLA.
    fn update(&mut self) -> u8 {
        self.data_out = (self.data_out & !self.dir) | (self.data & self.dir);
        // Bits 0-2 and 4 have pull-ups; bit 5 (cassette motor) does not.
        self.data_read = (self.data | !self.dir) & (self.data_out | 0x17);
        let lines = self.data_read;
        if self.dir & 0x20 == 0 {
            self.data_read &= 0xDF;
        }
        lines
    }

    /// Read $00 or $01. `now` is the current PHI2 cycle.
    #[must_use]
    pub fn read(&self, address: u16, now: u64) -> u8 {
        if address & 1 == 0 {
            return self.dir;
        }
        let mut value = self.data_read;
        if !self.bit6.valid(now) {
            value &= !0x40;
        }
        if !self.bit7.valid(now) {
            value &= !0x80;
        }
        value
    }

    /// Write $00 or $01 and return the new PLA lines.
    pub fn write(&mut self, address: u16, value: u8, now: u64) -> u8 {
        self.bit6.expire(now);
        self.bit7.expire(now);

        if address & 1 == 0 {
            self.bit7.direction_written(value & 0x80 != 0, now);
            self.bit6.direction_written(value & 0x40 != 0, now);
            self.dir = value;
        } else {
            if self.dir & value & 0x80 != 0 {
                self.bit7.set = true;
            }
            if self.dir & value & 0x40 != 0 {
                self.bit6.set = true;
            }
            self.data = value;
        }
        self.update()
    }

    #[must_use]
    pub fn direction(&self) -> u8 {
        self.dir
    }

    /// Levels currently driven on the pins.
    #[must_use]
    pub fn data_out(&self) -> u8 {
        self.data_out
    }
}
