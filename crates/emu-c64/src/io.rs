//! The I/O window at $D000-$DFFF and the interface peripheral chips use to
//! reach the rest of the machine.
//!
//! The window is split into sixteen 256-byte pages:
//!
//! | Pages | Handler                  |
//! |-------|--------------------------|
//! | 0-3   | VIC-II                   |
//! | 4-7   | SID                      |
//! | 8-11  | colour RAM               |
//! | 12    | CIA1                     |
//! | 13    | CIA2                     |
//! | 14    | cartridge IO1            |
//! | 15    | cartridge IO2            |
//!
//! Chips are not part of this crate. They plug in as [`IoDevice`]s and get
//! a [`Backplane`] on every access and event, through which they drive the
//! interrupt lines, BA and the VIC bank, schedule their own clock events
//! and fetch memory the way the VIC does.

use emu_core::{EventClock, Phase};

use crate::bus::MemoryView;
use crate::c64::C64Event;
use crate::cartridge::Cartridge;
use crate::memory::C64Memory;
use crate::pla::Pla;
use crate::port::ProcessorPort;

/// A chip socket in the I/O window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chip {
    Vic,
    Sid,
    Cia1,
    Cia2,
}

impl Chip {
    pub const ALL: [Chip; 4] = [Chip::Vic, Chip::Sid, Chip::Cia1, Chip::Cia2];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Owner of a clock event scheduled through a [`Backplane`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    Chip(Chip),
    Cartridge,
}

/// Which handler a $Dxxx address reaches when I/O is banked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoBank {
    Chip(Chip),
    ColourRam,
    Io1,
    Io2,
}

impl IoBank {
    #[must_use]
    pub fn of(address: u16) -> Self {
        match (address >> 8) & 0x0F {
            0..=3 => Self::Chip(Chip::Vic),
            4..=7 => Self::Chip(Chip::Sid),
            8..=11 => Self::ColourRam,
            12 => Self::Chip(Chip::Cia1),
            13 => Self::Chip(Chip::Cia2),
            14 => Self::Io1,
            _ => Self::Io2,
        }
    }
}

/// A memory-mapped peripheral. Addresses are passed unmasked; a chip
/// mirrors its registers across its pages itself.
pub trait IoDevice {
    fn read(&mut self, address: u16, bp: &mut Backplane<'_>) -> u8;

    fn write(&mut self, address: u16, value: u8, bp: &mut Backplane<'_>);

    /// A clock event this device scheduled with [`Backplane::schedule`].
    fn handle_event(&mut self, _token: u16, _bp: &mut Backplane<'_>) {}

    /// Machine reset. The clock has already been rewound.
    fn reset(&mut self, _bp: &mut Backplane<'_>) {}
}

/// An empty socket: reads float to the last byte on the data bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenBus;

impl IoDevice for OpenBus {
    fn read(&mut self, _address: u16, bp: &mut Backplane<'_>) -> u8 {
        bp.data_bus()
    }

    fn write(&mut self, _address: u16, _value: u8, _bp: &mut Backplane<'_>) {}
}

/// The rest of the machine, as seen from one device during one callback.
pub struct Backplane<'a> {
    pub(crate) pla: &'a mut Pla,
    pub(crate) clock: &'a mut EventClock<C64Event>,
    pub(crate) memory: &'a C64Memory,
    pub(crate) port: &'a ProcessorPort,
    /// Absent while the cartridge itself is the caller.
    pub(crate) cartridge: Option<&'a dyn Cartridge>,
    pub(crate) owner: DeviceId,
    /// Program counter when the callback started, for the byte the CPU is
    /// stalled on.
    pub(crate) cpu_pc: u16,
}

impl Backplane<'_> {
    #[must_use]
    pub fn owner(&self) -> DeviceId {
        self.owner
    }

    // --- Lines ----------------------------------------------------------

    /// Assert or release this device's hold on IRQ.
    pub fn set_irq(&mut self, state: bool) {
        self.pla.set_irq(state);
    }

    /// Assert or release this device's hold on NMI.
    pub fn set_nmi(&mut self, state: bool) {
        self.pla.set_nmi(state);
    }

    pub fn set_ba(&mut self, state: bool) {
        self.pla.set_ba(state, self.clock);
    }

    /// VIC bank from CIA2 port A: $0000, $4000, $8000 or $C000.
    pub fn set_vic_mem_base(&mut self, base: u16) {
        self.pla.set_vic_mem_base(base);
    }

    pub fn set_game_exrom(
        &mut self,
        game_phi1: bool,
        exrom_phi1: bool,
        game_phi2: bool,
        exrom_phi2: bool,
    ) {
        self.pla
            .set_game_exrom(game_phi1, exrom_phi1, game_phi2, exrom_phi2);
    }

    pub fn set_cartridge_dma(&mut self, active: bool) {
        self.pla.set_cartridge_dma(active);
    }

    // --- Clock ----------------------------------------------------------

    /// Schedule `token` for this device `cycles` from now, aligned to
    /// `phase`. Rescheduling a pending token moves it.
    pub fn schedule(&mut self, token: u16, cycles: u32, phase: Phase) -> u64 {
        self.clock
            .schedule(C64Event::Device(self.owner, token), cycles, phase)
    }

    pub fn cancel(&mut self, token: u16) -> bool {
        self.clock.cancel(C64Event::Device(self.owner, token))
    }

    #[must_use]
    pub fn is_pending(&self, token: u16) -> bool {
        self.clock.is_pending(C64Event::Device(self.owner, token))
    }

    #[must_use]
    pub fn time(&self, phase: Phase) -> u64 {
        self.clock.time(phase)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.clock.phase()
    }

    // --- VIC memory access ----------------------------------------------

    /// VIC fetch in PHI1. `address` is the low 14 bits; the VIC bank is
    /// added here. The byte stays on the data bus.
    pub fn vic_read_phi1(&mut self, address: u16) -> u8 {
        let value = self.view().vic_fetch(address);
        self.pla.latch_data_bus(value);
        value
    }

    /// VIC fetch in PHI2. While the CPU still owns the bus the VIC reads
    /// nothing.
    pub fn vic_read_phi2(&mut self, address: u16) -> u8 {
        if self.pla.aec() {
            0xFF
        } else {
            self.vic_read_phi1(address)
        }
    }

    /// Colour RAM fetch in PHI2. While the CPU owns the bus the VIC gets
    /// the low nibble of whatever the CPU is reading at PC.
    #[must_use]
    pub fn vic_read_color_phi2(&self, address: u16) -> u8 {
        if self.pla.aec() {
            self.view().cpu_peek(self.cpu_pc) & 0x0F
        } else {
            self.memory.colour_read(address)
        }
    }

    /// Last byte the VIC fetched in PHI1.
    #[must_use]
    pub fn data_bus(&self) -> u8 {
        self.pla.data_bus()
    }

    fn view(&self) -> MemoryView<'_> {
        MemoryView {
            pla: &*self.pla,
            memory: self.memory,
            port: self.port,
            cartridge: self.cartridge,
            now: self.clock.time(Phase::Phi2),
        }
    }
}
