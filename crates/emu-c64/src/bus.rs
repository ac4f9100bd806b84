//! C64 bus: dispatches CPU and VIC accesses through the PLA's bank maps.
//!
//! The C64 is fully memory-mapped; every access goes through the handler
//! the PLA selected for its 4K bank. Chip registers sit behind the I/O
//! bank and are reached through [`IoDevice`]s.

use emu_core::{Bus, EventClock, Phase};

use crate::c64::C64Event;
use crate::cartridge::Cartridge;
use crate::io::{Backplane, Chip, DeviceId, IoBank, IoDevice, OpenBus};
use crate::memory::C64Memory;
use crate::pla::{Pla, ReadBank, VicBank, WriteBank};
use crate::port::ProcessorPort;

/// Everything a read can reach without touching a chip register.
#[derive(Clone, Copy)]
pub(crate) struct MemoryView<'a> {
    pub(crate) pla: &'a Pla,
    pub(crate) memory: &'a C64Memory,
    pub(crate) port: &'a ProcessorPort,
    pub(crate) cartridge: Option<&'a dyn Cartridge>,
    /// Current PHI2 cycle, for the processor port.
    pub(crate) now: u64,
}

impl MemoryView<'_> {
    /// CPU view of `address` with no side effects. Chip registers read as
    /// the floating data bus.
    pub(crate) fn cpu_peek(&self, address: u16) -> u8 {
        let data_bus = self.pla.data_bus();
        match self.pla.cpu_read_bank(address) {
            ReadBank::ZeroPage if address < 2 => self.port.read(address, self.now),
            ReadBank::ZeroPage | ReadBank::Ram => self.memory.ram_read(address),
            ReadBank::Basic => self.memory.basic_read(address),
            ReadBank::Kernal => self.memory.kernal_read(address),
            ReadBank::CharRom => self.memory.char_read(address),
            ReadBank::Io => match IoBank::of(address) {
                IoBank::ColourRam => self.memory.colour_read(address) | (data_bus & 0xF0),
                _ => data_bus,
            },
            ReadBank::Roml => self
                .cartridge
                .and_then(|cart| cart.roml(address))
                .unwrap_or(data_bus),
            ReadBank::Romh => self
                .cartridge
                .and_then(|cart| cart.romh(address))
                .unwrap_or(data_bus),
            ReadBank::Ultimax => data_bus,
        }
    }

    /// VIC fetch: the low 14 bits of `address` within the current VIC bank.
    pub(crate) fn vic_fetch(&self, address: u16) -> u8 {
        let address = (address & 0x3FFF) | self.pla.vic_mem_base();
        match self.pla.vic_read_bank(address) {
            VicBank::Ram => self.memory.ram_read(address),
            VicBank::CharRom => self.memory.char_read(address),
            VicBank::Romh => self
                .cartridge
                .and_then(|cart| cart.romh(address))
                .unwrap_or_else(|| self.pla.data_bus()),
        }
    }
}

/// PLA, memory, processor port, the four chip sockets and the cartridge
/// port.
pub struct C64Bus {
    pub pla: Pla,
    pub memory: C64Memory,
    pub port: ProcessorPort,
    chips: [Box<dyn IoDevice>; 4],
    cartridge: Option<Box<dyn Cartridge>>,
}

impl C64Bus {
    /// Every chip socket starts empty.
    #[must_use]
    pub fn new(memory: C64Memory) -> Self {
        Self {
            pla: Pla::new(),
            memory,
            port: ProcessorPort::new(),
            chips: [
                Box::new(OpenBus),
                Box::new(OpenBus),
                Box::new(OpenBus),
                Box::new(OpenBus),
            ],
            cartridge: None,
        }
    }

    /// Plug `device` into `chip`'s socket, returning what was there.
    pub fn attach_chip(&mut self, chip: Chip, device: Box<dyn IoDevice>) -> Box<dyn IoDevice> {
        std::mem::replace(&mut self.chips[chip.index()], device)
    }

    #[must_use]
    pub fn chip(&self, chip: Chip) -> &dyn IoDevice {
        self.chips[chip.index()].as_ref()
    }

    pub fn chip_mut(&mut self, chip: Chip) -> &mut dyn IoDevice {
        self.chips[chip.index()].as_mut()
    }

    pub fn set_cartridge(
        &mut self,
        cartridge: Option<Box<dyn Cartridge>>,
    ) -> Option<Box<dyn Cartridge>> {
        std::mem::replace(&mut self.cartridge, cartridge)
    }

    #[must_use]
    pub fn cartridge(&self) -> Option<&dyn Cartridge> {
        self.cartridge.as_deref()
    }

    pub(crate) fn view(&self, now: u64) -> MemoryView<'_> {
        MemoryView {
            pla: &self.pla,
            memory: &self.memory,
            port: &self.port,
            cartridge: self.cartridge.as_deref(),
            now,
        }
    }

    /// CPU view of `address` without side effects.
    #[must_use]
    pub fn peek(&self, address: u16, now: u64) -> u8 {
        self.view(now).cpu_peek(address)
    }

    /// CPU read. `cpu_pc` is forwarded to any chip that needs the byte the
    /// CPU is stalled on.
    pub fn cpu_read(
        &mut self,
        address: u16,
        clock: &mut EventClock<C64Event>,
        cpu_pc: u16,
    ) -> u8 {
        match self.pla.cpu_read_bank(address) {
            ReadBank::Io => self.io_read(address, clock, cpu_pc),
            _ => self.peek(address, clock.time(Phase::Phi2)),
        }
    }

    pub fn cpu_write(
        &mut self,
        address: u16,
        value: u8,
        clock: &mut EventClock<C64Event>,
        cpu_pc: u16,
    ) {
        match self.pla.cpu_write_bank(address) {
            WriteBank::ZeroPage if address < 2 => {
                let lines = self.port.write(address, value, clock.time(Phase::Phi2));
                self.pla.set_cpu_port(lines);
                // The RAM cell under the port gets whatever floats on the bus.
                self.memory.ram_write(address, self.pla.data_bus());
            }
            WriteBank::ZeroPage | WriteBank::Ram => self.memory.ram_write(address, value),
            WriteBank::Io => self.io_write(address, value, clock, cpu_pc),
            WriteBank::Roml => {
                if let Some(cart) = self.cartridge.as_deref_mut() {
                    cart.write_roml(address, value);
                }
            }
            WriteBank::Romh => {
                if let Some(cart) = self.cartridge.as_deref_mut() {
                    cart.write_romh(address, value);
                }
            }
            WriteBank::Ultimax => {}
        }
    }

    fn io_read(&mut self, address: u16, clock: &mut EventClock<C64Event>, cpu_pc: u16) -> u8 {
        let Self {
            pla,
            memory,
            port,
            chips,
            cartridge,
        } = self;

        match IoBank::of(address) {
            IoBank::Chip(chip) => {
                let mut bp = Backplane {
                    pla,
                    clock,
                    memory,
                    port,
                    cartridge: cartridge.as_deref(),
                    owner: DeviceId::Chip(chip),
                    cpu_pc,
                };
                chips[chip.index()].read(address, &mut bp)
            }
            IoBank::ColourRam => memory.colour_read(address) | (pla.data_bus() & 0xF0),
            bank @ (IoBank::Io1 | IoBank::Io2) => {
                let Some(cart) = cartridge.as_deref_mut() else {
                    return pla.data_bus();
                };
                let mut bp = Backplane {
                    pla,
                    clock,
                    memory,
                    port,
                    cartridge: None,
                    owner: DeviceId::Cartridge,
                    cpu_pc,
                };
                let value = if bank == IoBank::Io1 {
                    cart.read_io1(address, &mut bp)
                } else {
                    cart.read_io2(address, &mut bp)
                };
                value.unwrap_or_else(|| bp.data_bus())
            }
        }
    }

    fn io_write(
        &mut self,
        address: u16,
        value: u8,
        clock: &mut EventClock<C64Event>,
        cpu_pc: u16,
    ) {
        let Self {
            pla,
            memory,
            port,
            chips,
            cartridge,
        } = self;

        match IoBank::of(address) {
            IoBank::Chip(chip) => {
                let mut bp = Backplane {
                    pla,
                    clock,
                    memory,
                    port,
                    cartridge: cartridge.as_deref(),
                    owner: DeviceId::Chip(chip),
                    cpu_pc,
                };
                chips[chip.index()].write(address, value, &mut bp);
            }
            IoBank::ColourRam => memory.colour_write(address, value),
            bank @ (IoBank::Io1 | IoBank::Io2) => {
                if let Some(cart) = cartridge.as_deref_mut() {
                    let mut bp = Backplane {
                        pla,
                        clock,
                        memory,
                        port,
                        cartridge: None,
                        owner: DeviceId::Cartridge,
                        cpu_pc,
                    };
                    if bank == IoBank::Io1 {
                        cart.write_io1(address, value, &mut bp);
                    } else {
                        cart.write_io2(address, value, &mut bp);
                    }
                }
            }
        }
    }

    /// Run `f` for one device with a backplane owned by it. Does nothing
    /// for the cartridge slot when it is empty.
    fn with_device(
        &mut self,
        owner: DeviceId,
        clock: &mut EventClock<C64Event>,
        cpu_pc: u16,
        f: impl FnOnce(DeviceRef<'_>, &mut Backplane<'_>),
    ) {
        let Self {
            pla,
            memory,
            port,
            chips,
            cartridge,
        } = self;

        match owner {
            DeviceId::Chip(chip) => {
                let mut bp = Backplane {
                    pla,
                    clock,
                    memory,
                    port,
                    cartridge: cartridge.as_deref(),
                    owner,
                    cpu_pc,
                };
                f(DeviceRef::Chip(chips[chip.index()].as_mut()), &mut bp);
            }
            DeviceId::Cartridge => {
                if let Some(cart) = cartridge.as_deref_mut() {
                    let mut bp = Backplane {
                        pla,
                        clock,
                        memory,
                        port,
                        cartridge: None,
                        owner,
                        cpu_pc,
                    };
                    f(DeviceRef::Cartridge(cart), &mut bp);
                }
            }
        }
    }

    /// Deliver a clock event to the device that scheduled it.
    pub fn device_event(
        &mut self,
        owner: DeviceId,
        token: u16,
        clock: &mut EventClock<C64Event>,
        cpu_pc: u16,
    ) {
        self.with_device(owner, clock, cpu_pc, |device, bp| match device {
            DeviceRef::Chip(chip) => chip.handle_event(token, bp),
            DeviceRef::Cartridge(cart) => cart.handle_event(token, bp),
        });
    }

    /// Reset the cartridge and apply its GAME/EXROM levels. Without a
    /// cartridge the lines stay released.
    pub fn reset_cartridge(&mut self, clock: &mut EventClock<C64Event>, cpu_pc: u16) {
        self.with_device(DeviceId::Cartridge, clock, cpu_pc, |device, bp| {
            if let DeviceRef::Cartridge(cart) = device {
                cart.reset(bp);
                let (game, exrom) = cart.game_exrom();
                bp.set_game_exrom(game, exrom, game, exrom);
            }
        });
    }

    pub fn reset_chips(&mut self, clock: &mut EventClock<C64Event>, cpu_pc: u16) {
        for chip in Chip::ALL {
            self.with_device(DeviceId::Chip(chip), clock, cpu_pc, |device, bp| {
                if let DeviceRef::Chip(device) = device {
                    device.reset(bp);
                }
            });
        }
    }
}

enum DeviceRef<'a> {
    Chip(&'a mut dyn IoDevice),
    Cartridge(&'a mut dyn Cartridge),
}

/// The CPU's view of the bus during one clock event.
pub struct SystemBus<'a> {
    pub bus: &'a mut C64Bus,
    pub clock: &'a mut EventClock<C64Event>,
    pub cpu_pc: u16,
}

impl Bus for SystemBus<'_> {
    fn read(&mut self, address: u16) -> u8 {
        self.bus.cpu_read(address, self.clock, self.cpu_pc)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.bus.cpu_write(address, value, self.clock, self.cpu_pc);
    }
}
