//! Expansion port cartridges.
//!
//! A cartridge provides up to two 8K ROM windows and two I/O pages:
//!
//! - ROML at $8000-$9FFF
//! - ROMH at $A000-$BFFF, or at $E000-$FFFF in Ultimax mode
//! - IO1 at $DE00-$DEFF and IO2 at $DF00-$DFFF
//!
//! Its GAME and EXROM lines (active low) tell the PLA which of these to
//! map:
//!
//! | GAME | EXROM | Mode              |
//! |------|-------|-------------------|
//! | 1    | 1     | no cartridge      |
//! | 1    | 0     | 8K: ROML          |
//! | 0    | 0     | 16K: ROML + ROMH  |
//! | 0    | 1     | Ultimax           |
//!
//! Bank-switching hardware implements [`Cartridge`] itself and switches
//! lines through the [`Backplane`] passed to its I/O handlers.

use crate::error::{C64Error, Result};
use crate::io::Backplane;

pub const ROM_WINDOW_SIZE: usize = 0x2000;

pub trait Cartridge {
    /// `(GAME, EXROM)` levels driven after reset. `false` is asserted.
    fn game_exrom(&self) -> (bool, bool);

    /// Byte at `address` in the ROML window, or `None` if nothing answers.
    fn roml(&self, address: u16) -> Option<u8>;

    /// Byte at `address` in the ROMH window, or `None` if nothing answers.
    fn romh(&self, address: u16) -> Option<u8>;

    /// CPU write into ROML while in Ultimax mode.
    fn write_roml(&mut self, _address: u16, _value: u8) {}

    /// CPU write into ROMH while in Ultimax mode.
    fn write_romh(&mut self, _address: u16, _value: u8) {}

    fn read_io1(&mut self, _address: u16, _bp: &mut Backplane<'_>) -> Option<u8> {
        None
    }

    fn write_io1(&mut self, _address: u16, _value: u8, _bp: &mut Backplane<'_>) {}

    fn read_io2(&mut self, _address: u16, _bp: &mut Backplane<'_>) -> Option<u8> {
        None
    }

    fn write_io2(&mut self, _address: u16, _value: u8, _bp: &mut Backplane<'_>) {}

    /// A clock event this cartridge scheduled.
    fn handle_event(&mut self, _token: u16, _bp: &mut Backplane<'_>) {}

    /// Machine reset, before the GAME/EXROM levels are applied.
    fn reset(&mut self, _bp: &mut Backplane<'_>) {}
}

/// Plain ROM cartridge with no bank switching.
#[derive(Debug, Clone)]
pub struct RomCartridge {
    roml: Option<Box<[u8]>>,
    romh: Option<Box<[u8]>>,
    game: bool,
    exrom: bool,
}

impl RomCartridge {
    /// 8K cartridge: ROML only, BASIC stays visible.
    pub fn normal_8k(roml: &[u8]) -> Result<Self> {
        Ok(Self {
            roml: Some(window("ROML", roml)?),
            romh: None,
            game: true,
            exrom: false,
        })
    }

    /// 16K cartridge: ROML plus ROMH over BASIC.
    pub fn normal_16k(roml: &[u8], romh: &[u8]) -> Result<Self> {
        Ok(Self {
            roml: Some(window("ROML", roml)?),
            romh: Some(window("ROMH", romh)?),
            game: false,
            exrom: false,
        })
    }

    /// Ultimax cartridge: ROMH replaces the kernal and most of memory
    /// disappears. A 4K ROMH image is mirrored across the 8K window.
    pub fn ultimax(roml: Option<&[u8]>, romh: &[u8]) -> Result<Self> {
        let romh = if romh.len() == ROM_WINDOW_SIZE / 2 {
            romh.repeat(2).into_boxed_slice()
        } else {
            window("ROMH", romh)?
        };
        Ok(Self {
            roml: roml.map(|data| window("ROML", data)).transpose()?,
            romh: Some(romh),
            game: false,
            exrom: true,
        })
    }

    /// Pick the layout from the image size: 8K is a normal 8K cartridge,
    /// 16K is ROML followed by ROMH.
    pub fn from_image(data: &[u8]) -> Result<Self> {
        match data.len() {
            ROM_WINDOW_SIZE => Self::normal_8k(data),
            len if len == 2 * ROM_WINDOW_SIZE => {
                let (roml, romh) = data.split_at(ROM_WINDOW_SIZE);
                Self::normal_16k(roml, romh)
            }
            actual => Err(C64Error::RomSize {
                name: "cartridge",
                expected: 2 * ROM_WINDOW_SIZE,
                actual,
            }),
        }
    }
}

impl Cartridge for RomCartridge {
    fn game_exrom(&self) -> (bool, bool) {
        (self.game, self.exrom)
    }

    fn roml(&self, address: u16) -> Option<u8> {
        self.roml
            .as_ref()
            .map(|rom| rom[usize::from(address) & (ROM_WINDOW_SIZE - 1)])
    }

    fn romh(&self, address: u16) -> Option<u8> {
        self.romh
            .as_ref()
            .map(|rom| rom[usize::from(address) & (ROM_WINDOW_SIZE - 1)])
    }
}

fn window(name: &'static str, data: &[u8]) -> Result<Box<[u8]>> {
    if data.len() == ROM_WINDOW_SIZE {
        Ok(data.into())
    } else {
        Err(C64Error::RomSize {
            name,
            expected: ROM_WINDOW_SIZE,
            actual: data.len(),
        })
    }
}
