//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// The CPU reaches memory and peripherals through this trait; a machine
/// implements it with whatever bank decoding it needs behind `read`.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// Flat 64K RAM with no side effects. Used by CPU tests.
pub struct SimpleBus {
    memory: Box<[u8; 0x1_0000]>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x1_0000]),
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.memory[usize::from(address.wrapping_add(i as u16))] = byte;
        }
    }

    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_wraps_at_top_of_memory() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFF, &[0x12, 0x34]);
        assert_eq!(bus.peek(0xFFFF), 0x12);
        assert_eq!(bus.peek(0x0000), 0x34);
    }

    #[test]
    fn read_sees_writes() {
        let mut bus = SimpleBus::new();
        bus.write(0xC000, 0xA5);
        assert_eq!(bus.read(0xC000), 0xA5);
    }
}
