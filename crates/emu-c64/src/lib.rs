//! Cycle-accurate Commodore 64 machine core.
//!
//! The machine runs on one half-cycle event clock (985,248 Hz PAL). The
//! 6510 executes one micro-op per clock event and the PLA routes every
//! access through sixteen 4K bank handlers. The VIC-II, SID and CIAs plug
//! in through [`IoDevice`]; cartridges through [`Cartridge`].

mod bus;
mod c64;
pub mod cartridge;
pub mod config;
pub mod error;
pub mod io;
mod memory;
pub mod pla;
pub mod port;
pub mod prg;

pub use bus::{C64Bus, SystemBus};
pub use c64::{Board, C64, C64Event};
pub use cartridge::{Cartridge, RomCartridge};
pub use config::{C64Config, C64Model};
pub use error::C64Error;
pub use io::{Backplane, Chip, DeviceId, IoBank, IoDevice, OpenBus};
pub use memory::C64Memory;
pub use pla::{CpuSignal, Pla, ReadBank, VicBank, WriteBank};
pub use port::ProcessorPort;
