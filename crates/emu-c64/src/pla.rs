//! PLA: bank switching, interrupt lines and bus arbitration.
//!
//! The 64K address space is split into sixteen 4K banks. The PLA keeps one
//! handler per bank for CPU reads, CPU writes and VIC reads, recomputed
//! whenever one of its inputs changes:
//!
//! | Input  | Source                         |
//! |--------|--------------------------------|
//! | LORAM  | 6510 port bit 0                |
//! | HIRAM  | 6510 port bit 1                |
//! | CHAREN | 6510 port bit 2                |
//! | GAME   | cartridge port, per clock phase |
//! | EXROM  | cartridge port, per clock phase |
//!
//! IRQ and NMI are open-collector lines shared by several chips, so the
//! PLA counts assertions and only tells the CPU about 0↔1 transitions.
//! Those notifications, and RDY changes caused by BA, are queued as
//! [`CpuSignal`]s for the machine to deliver once the current access or
//! event callback returns.

use std::collections::VecDeque;

use emu_core::{EventClock, Observable, Phase, Value};

use crate::c64::C64Event;

pub const BANK_COUNT: usize = 16;

/// Handler for a CPU read from one 4K bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadBank {
    /// RAM with the 6510 port at $00/$01.
    ZeroPage,
    Ram,
    Basic,
    Kernal,
    CharRom,
    Io,
    Roml,
    Romh,
    /// Nothing drives the bus in Ultimax mode.
    Ultimax,
}

/// Handler for a CPU write to one 4K bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBank {
    ZeroPage,
    Ram,
    Io,
    Roml,
    Romh,
    Ultimax,
}

/// Handler for a VIC fetch from one 4K bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VicBank {
    Ram,
    CharRom,
    Romh,
}

/// Line changes for the CPU, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuSignal {
    TriggerIrq,
    ClearIrq,
    TriggerNmi,
    SetRdy(bool),
}

#[derive(Debug, Clone)]
pub struct Pla {
    loram: bool,
    hiram: bool,
    charen: bool,

    game_phi1: bool,
    exrom_phi1: bool,
    game_phi2: bool,
    exrom_phi2: bool,

    /// VA14/VA15 from CIA2: $0000, $4000, $8000 or $C000.
    vic_mem_base: u16,

    ba: bool,
    aec: bool,
    cartridge_dma: bool,

    irq_count: u32,
    nmi_count: u32,

    cpu_read: [ReadBank; BANK_COUNT],
    cpu_write: [WriteBank; BANK_COUNT],
    vic_read: [VicBank; BANK_COUNT],

    /// Last byte the VIC fetched in PHI1. Read back from unmapped space.
    data_bus: u8,

    signals: VecDeque<CpuSignal>,
}

impl Default for Pla {
    fn default() -> Self {
        Self::new()
    }
}

impl Pla {
    /// Power-on state. All cartridge lines start low and every bank except
    /// bank 0 is RAM until [`Pla::reset`] computes the real maps.
    #[must_use]
    pub fn new() -> Self {
        let mut cpu_read = [ReadBank::Ram; BANK_COUNT];
        let mut cpu_write = [WriteBank::Ram; BANK_COUNT];
        cpu_read[0] = ReadBank::ZeroPage;
        cpu_write[0] = WriteBank::ZeroPage;

        Self {
            loram: true,
            hiram: true,
            charen: true,
            game_phi1: false,
            exrom_phi1: false,
            game_phi2: false,
            exrom_phi2: false,
            vic_mem_base: 0,
            ba: false,
            aec: false,
            cartridge_dma: false,
            irq_count: 0,
            nmi_count: 0,
            cpu_read,
            cpu_write,
            vic_read: [VicBank::Ram; BANK_COUNT],
            data_bus: 0,
            signals: VecDeque::new(),
        }
    }

    /// Release every cartridge line, clear the interrupt counts and BA.
    /// The port lines keep their state; the processor port drives them.
    pub fn reset(&mut self) {
        self.vic_mem_base = 0;
        self.aec = false;
        self.ba = true;

        self.game_phi1 = true;
        self.game_phi2 = true;
        self.exrom_phi1 = true;
        self.exrom_phi2 = true;

        self.irq_count = 0;
        self.nmi_count = 0;
        self.signals.clear();

        self.update_vic_maps();
        self.update_cpu_maps();
    }

    // --- Bank maps ------------------------------------------------------

    fn update_cpu_maps(&mut self) {
        let (loram, hiram, charen) = (self.loram, self.hiram, self.charen);
        let (game, exrom) = (self.game_phi2, self.exrom_phi2);

        if exrom && !game {
            self.cpu_read[1..].fill(ReadBank::Ultimax);
            self.cpu_write[1..].fill(WriteBank::Ultimax);

            self.cpu_read[8..=9].fill(ReadBank::Roml);
            self.cpu_write[8..=9].fill(WriteBank::Roml);
            self.cpu_read[13] = ReadBank::Io;
            self.cpu_write[13] = WriteBank::Io;
            self.cpu_read[14..=15].fill(ReadBank::Romh);
            self.cpu_write[14..=15].fill(WriteBank::Romh);
        } else {
            self.cpu_read[1..].fill(ReadBank::Ram);
            self.cpu_write[1..].fill(WriteBank::Ram);

            if loram && hiram && !exrom {
                self.cpu_read[8..=9].fill(ReadBank::Roml);
            }

            if hiram && !exrom && !game {
                self.cpu_read[10..=11].fill(ReadBank::Romh);
            } else if loram && hiram && game {
                self.cpu_read[10..=11].fill(ReadBank::Basic);
            }

            if charen && (loram || hiram) && (game || !exrom) {
                self.cpu_read[13] = ReadBank::Io;
                self.cpu_write[13] = WriteBank::Io;
            } else if !charen && (((loram || hiram) && game) || (hiram && !game && !exrom)) {
                self.cpu_read[13] = ReadBank::CharRom;
            }

            if hiram && (game || !exrom) {
                self.cpu_read[14..=15].fill(ReadBank::Kernal);
            }
        }

        log::trace!(
            "CPU banks: LORAM={} HIRAM={} CHAREN={} GAME={} EXROM={}",
            u8::from(loram),
            u8::from(hiram),
            u8::from(charen),
            u8::from(game),
            u8::from(exrom)
        );
    }

    fn update_vic_maps(&mut self) {
        let (game, exrom) = (self.game_phi1, self.exrom_phi1);

        let char_bank = if game || !exrom {
            VicBank::CharRom
        } else {
            VicBank::Ram
        };
        self.vic_read[1] = char_bank;
        self.vic_read[9] = char_bank;

        let top_bank = if exrom && !game {
            VicBank::Romh
        } else {
            VicBank::Ram
        };
        for bank in (3..BANK_COUNT).step_by(4) {
            self.vic_read[bank] = top_bank;
        }
    }

    /// Port lines from the 6510: bit 0 LORAM, bit 1 HIRAM, bit 2 CHAREN.
    pub fn set_cpu_port(&mut self, bits: u8) {
        self.loram = bits & 0x01 != 0;
        self.hiram = bits & 0x02 != 0;
        self.charen = bits & 0x04 != 0;
        self.update_cpu_maps();
    }

    /// Cartridge GAME/EXROM as seen in each clock phase. The VIC uses the
    /// PHI1 pair and the CPU the PHI2 pair.
    pub fn set_game_exrom(
        &mut self,
        game_phi1: bool,
        exrom_phi1: bool,
        game_phi2: bool,
        exrom_phi2: bool,
    ) {
        self.game_phi1 = game_phi1;
        self.exrom_phi1 = exrom_phi1;
        self.update_vic_maps();

        self.game_phi2 = game_phi2;
        self.exrom_phi2 = exrom_phi2;
        self.update_cpu_maps();
    }

    pub fn set_vic_mem_base(&mut self, base: u16) {
        self.vic_mem_base = base;
    }

    #[must_use]
    pub fn vic_mem_base(&self) -> u16 {
        self.vic_mem_base
    }

    #[must_use]
    pub fn cpu_read_bank(&self, address: u16) -> ReadBank {
        self.cpu_read[usize::from(address >> 12)]
    }

    #[must_use]
    pub fn cpu_write_bank(&self, address: u16) -> WriteBank {
        self.cpu_write[usize::from(address >> 12)]
    }

    /// Bank handler for a full 16-bit VIC address (base already applied).
    #[must_use]
    pub fn vic_read_bank(&self, address: u16) -> VicBank {
        self.vic_read[usize::from(address >> 12)]
    }

    #[must_use]
    pub fn cpu_read_map(&self) -> &[ReadBank; BANK_COUNT] {
        &self.cpu_read
    }

    #[must_use]
    pub fn cpu_write_map(&self) -> &[WriteBank; BANK_COUNT] {
        &self.cpu_write
    }

    #[must_use]
    pub fn vic_read_map(&self) -> &[VicBank; BANK_COUNT] {
        &self.vic_read
    }

    // --- Bus arbitration ------------------------------------------------

    /// BA from the VIC. Low asks the CPU to stop at its next read; AEC
    /// follows three cycles later in PHI1, after the longest run of writes
    /// the 6510 can make.
    pub fn set_ba(&mut self, state: bool, clock: &mut EventClock<C64Event>) {
        if state == self.ba {
            return;
        }
        self.ba = state;

        if !self.cartridge_dma {
            self.signals.push_back(CpuSignal::SetRdy(state));
        }

        if state {
            self.aec = true;
            clock.cancel(C64Event::AecRelease);
        } else {
            clock.schedule(C64Event::AecRelease, 3, Phase::Phi1);
        }
    }

    pub(crate) fn release_aec(&mut self) {
        self.aec = false;
    }

    /// While a cartridge drives DMA, BA no longer reaches the CPU's RDY.
    pub fn set_cartridge_dma(&mut self, active: bool) {
        self.cartridge_dma = active;
    }

    #[must_use]
    pub fn ba(&self) -> bool {
        self.ba
    }

    /// True while the CPU owns the bus in PHI2.
    #[must_use]
    pub fn aec(&self) -> bool {
        self.aec
    }

    // --- Interrupt lines ------------------------------------------------

    /// Assert (`true`) or release one source's hold on IRQ.
    pub fn set_irq(&mut self, state: bool) {
        if state {
            if self.irq_count == 0 {
                self.signals.push_back(CpuSignal::TriggerIrq);
            }
            self.irq_count += 1;
        } else if self.irq_count == 0 {
            log::warn!("IRQ released with no source holding it");
        } else {
            self.irq_count -= 1;
            if self.irq_count == 0 {
                self.signals.push_back(CpuSignal::ClearIrq);
            }
        }
    }

    /// Assert or release one source's hold on NMI. Only the first assertion
    /// produces an edge.
    pub fn set_nmi(&mut self, state: bool) {
        if state {
            if self.nmi_count == 0 {
                self.signals.push_back(CpuSignal::TriggerNmi);
            }
            self.nmi_count += 1;
        } else if self.nmi_count == 0 {
            log::warn!("NMI released with no source holding it");
        } else {
            self.nmi_count -= 1;
        }
    }

    #[must_use]
    pub fn irq_count(&self) -> u32 {
        self.irq_count
    }

    #[must_use]
    pub fn nmi_count(&self) -> u32 {
        self.nmi_count
    }

    /// Oldest undelivered CPU signal.
    pub fn take_signal(&mut self) -> Option<CpuSignal> {
        self.signals.pop_front()
    }

    // --- Data bus ---------------------------------------------------------

    #[must_use]
    pub fn data_bus(&self) -> u8 {
        self.data_bus
    }

    pub(crate) fn latch_data_bus(&mut self, value: u8) {
        self.data_bus = value;
    }

    #[must_use]
    pub fn lines(&self) -> (bool, bool, bool) {
        (self.loram, self.hiram, self.charen)
    }

    #[must_use]
    pub fn game_exrom(&self) -> (bool, bool, bool, bool) {
        (
            self.game_phi1,
            self.exrom_phi1,
            self.game_phi2,
            self.exrom_phi2,
        )
    }
}

const QUERY_PATHS: &[&str] = &[
    "loram",
    "hiram",
    "charen",
    "game",
    "exrom",
    "ba",
    "aec",
    "irq_count",
    "nmi_count",
    "vic_mem_base",
    "data_bus",
    "cpu_map",
    "vic_map",
];

impl Observable for Pla {
    fn query(&self, path: &str) -> Option<Value> {
        let value = match path {
            "loram" => self.loram.into(),
            "hiram" => self.hiram.into(),
            "charen" => self.charen.into(),
            "game" => self.game_phi2.into(),
            "exrom" => self.exrom_phi2.into(),
            "ba" => self.ba.into(),
            "aec" => self.aec.into(),
            "irq_count" => self.irq_count.into(),
            "nmi_count" => self.nmi_count.into(),
            "vic_mem_base" => self.vic_mem_base.into(),
            "data_bus" => self.data_bus.into(),
            "cpu_map" => self
                .cpu_read
                .iter()
                .map(|bank| format!("{bank:?}"))
                .collect::<Vec<_>>()
                .into(),
            "vic_map" => self
                .vic_read
                .iter()
                .map(|bank| format!("{bank:?}"))
                .collect::<Vec<_>>()
                .into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
