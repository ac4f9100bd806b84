//! RAM, ROM images and colour RAM.
//!
//! Banking lives in the PLA; this module only stores bytes. The 6510 port
//! at $00/$01 overlays RAM, so writes there still reach the RAM below (see
//! [`crate::port`]).

use crate::config::{BASIC_ROM_SIZE, C64Config, CHAR_ROM_SIZE, KERNAL_ROM_SIZE};
use crate::error::Result;

pub const COLOUR_RAM_SIZE: usize = 0x400;

/// 64K RAM, the three ROMs and 1K of 4-bit colour RAM.
pub struct C64Memory {
    ram: Box<[u8; 0x10000]>,
    /// Kernal ROM (8K, mapped at $E000-$FFFF).
    kernal_rom: Box<[u8]>,
    /// BASIC ROM (8K, mapped at $A000-$BFFF).
    basic_rom: Box<[u8]>,
    /// Character ROM (4K, at $D000 for the CPU, $1000/$9000 for the VIC).
    char_rom: Box<[u8]>,
    /// Low nibble only.
    colour_ram: [u8; COLOUR_RAM_SIZE],
}

impl C64Memory {
    /// Take the ROM images from `config`, rejecting any of the wrong size.
    pub fn new(config: &C64Config) -> Result<Self> {
        config.validate()?;
        let mut memory = Self {
            ram: Box::new([0; 0x10000]),
            kernal_rom: config.kernal_rom.clone().into_boxed_slice(),
            basic_rom: config.basic_rom.clone().into_boxed_slice(),
            char_rom: config.char_rom.clone().into_boxed_slice(),
            colour_ram: [0; COLOUR_RAM_SIZE],
        };
        memory.reset();
        Ok(memory)
    }

    /// Power-on pattern: zeros with 64-byte runs of $FF every 128 bytes
    /// from $07C0, then colour RAM cleared.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        for start in (0x07C0..0x10000).step_by(128) {
            self.ram[start..start + 64].fill(0xFF);
        }
        self.reset_colour_ram();
    }

    pub fn reset_colour_ram(&mut self) {
        self.colour_ram.fill(0);
    }

    #[must_use]
    pub fn ram_read(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    pub fn ram_write(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }

    #[must_use]
    pub fn ram(&self) -> &[u8; 0x10000] {
        &self.ram
    }

    #[must_use]
    pub fn kernal_read(&self, address: u16) -> u8 {
        self.kernal_rom[usize::from(address) & (KERNAL_ROM_SIZE - 1)]
    }

    #[must_use]
    pub fn basic_read(&self, address: u16) -> u8 {
        self.basic_rom[usize::from(address) & (BASIC_ROM_SIZE - 1)]
    }

    #[must_use]
    pub fn char_read(&self, address: u16) -> u8 {
        self.char_rom[usize::from(address) & (CHAR_ROM_SIZE - 1)]
    }

    #[must_use]
    pub fn colour_read(&self, address: u16) -> u8 {
        self.colour_ram[usize::from(address) & (COLOUR_RAM_SIZE - 1)]
    }

    pub fn colour_write(&mut self, address: u16, value: u8) {
        self.colour_ram[usize::from(address) & (COLOUR_RAM_SIZE - 1)] = value & 0x0F;
    }
}
