//! Top-level C64 system.
//!
//! A single event clock at half-cycle resolution drives the machine. The
//! CPU runs one micro-op per event and reschedules itself; the PLA and the
//! attached chips schedule their own events on the same clock. One PAL
//! frame is 312 lines × 63 cycles = 19,656 CPU cycles.
//!
//! # Event loop
//!
//! Each event:
//! 1. CPU: run one slot through the bus, reschedule one cycle later
//!    unless stalled by RDY
//! 2. AEC release: the VIC takes the bus in PHI2
//! 3. Chip/cartridge event: handed to its owner with a backplane
//!
//! After every event, line changes the PLA queued (IRQ, NMI, RDY) are
//! delivered to the CPU in order.

use emu_core::{EventClock, EventHandler, Observable, Phase, Value};
use mos_6510::{CpuEvent, Mos6510};

use crate::bus::{C64Bus, SystemBus};
use crate::cartridge::Cartridge;
use crate::config::{BUILTIN_IDLE_LOOP, C64Config, C64Model};
use crate::error::Result;
use crate::io::{Chip, DeviceId, IoDevice};
use crate::memory::C64Memory;
use crate::pla::CpuSignal;
use crate::prg;

/// Where the stock kernal waits for keyboard input.
const KERNAL_READY_PC: u16 = 0xE5CD;

/// Boot gives up after this many frames.
const MAX_BOOT_FRAMES: u32 = 200;

/// Longest stretch [`C64::update`] will emulate: 1/25 s.
const MAX_UPDATE_DIVISOR: u64 = 25;

/// Everything that can be scheduled on the machine clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum C64Event {
    Cpu(CpuEvent),
    /// BA has been low for three cycles: the VIC owns PHI2.
    AecRelease,
    Device(DeviceId, u16),
}

impl From<CpuEvent> for C64Event {
    fn from(event: CpuEvent) -> Self {
        Self::Cpu(event)
    }
}

/// CPU and bus; the clock lives beside them so it can be lent to both.
pub struct Board {
    pub cpu: Mos6510,
    pub bus: C64Bus,
}

impl Board {
    fn deliver_signals(&mut self, clock: &mut EventClock<C64Event>) {
        while let Some(signal) = self.bus.pla.take_signal() {
            match signal {
                CpuSignal::TriggerIrq => self.cpu.trigger_irq(clock),
                CpuSignal::ClearIrq => self.cpu.clear_irq(),
                CpuSignal::TriggerNmi => self.cpu.trigger_nmi(clock),
                CpuSignal::SetRdy(rdy) => self.cpu.set_rdy(rdy, clock),
            }
        }
    }
}

impl EventHandler<C64Event> for Board {
    fn handle_event(&mut self, event: C64Event, clock: &mut EventClock<C64Event>) {
        let cpu_pc = self.cpu.pc();
        match event {
            C64Event::Cpu(cpu_event) => {
                let mut bus = SystemBus {
                    bus: &mut self.bus,
                    clock: &mut *clock,
                    cpu_pc,
                };
                if self.cpu.run_cycle(cpu_event, &mut bus) {
                    clock.schedule(event, 1, Phase::Any);
                }
            }
            C64Event::AecRelease => self.bus.pla.release_aec(),
            C64Event::Device(owner, token) => self.bus.device_event(owner, token, clock, cpu_pc),
        }
        self.deliver_signals(clock);
    }
}

/// C64 system.
pub struct C64 {
    clock: EventClock<C64Event>,
    board: Board,
    model: C64Model,
    /// The built-in kernal idles somewhere else than the stock one.
    builtin_kernal: bool,
    /// Completed frame counter.
    frame_count: u64,
}

impl C64 {
    /// Create a C64 from the given configuration and reset it.
    pub fn new(config: &C64Config) -> Result<Self> {
        let memory = C64Memory::new(config)?;
        let mut c64 = Self {
            clock: EventClock::new(f64::from(config.model.cpu_frequency())),
            board: Board {
                cpu: Mos6510::new(),
                bus: C64Bus::new(memory),
            },
            model: config.model,
            builtin_kernal: config.has_builtin_kernal(),
            frame_count: 0,
        };
        c64.reset();
        Ok(c64)
    }

    /// Hard reset: clock, PLA and cartridge lines, CPU, chips, processor
    /// port, RAM and colour RAM.
    pub fn reset(&mut self) {
        let Self { clock, board, .. } = self;
        let cpu_pc = board.cpu.pc();

        clock.reset();
        board.bus.pla.reset();
        board.bus.reset_cartridge(clock, cpu_pc);
        board.cpu.trigger_rst(clock);
        board.bus.reset_chips(clock, cpu_pc);

        let lines = board.bus.port.reset();
        board.bus.pla.set_cpu_port(lines);
        board.bus.memory.reset();

        board.deliver_signals(clock);
        self.frame_count = 0;
        log::debug!("C64 reset ({:?})", self.model);
    }

    /// Run every event due at the next pending time. Returns `false` if
    /// nothing is scheduled (the CPU is stalled and no chip is active).
    pub fn step(&mut self) -> bool {
        self.clock.step(&mut self.board)
    }

    /// Run for at least `cycles` CPU cycles and return how many ran.
    pub fn run_cycles(&mut self, cycles: u64) -> u64 {
        let start = self.clock.time_and_phase();
        let end = start + 2 * cycles;
        while self.clock.time_and_phase() < end {
            if !self.step() {
                break;
            }
        }
        (self.clock.time_and_phase() - start) / 2
    }

    /// Run one frame's worth of cycles.
    pub fn run_frame(&mut self) -> u64 {
        self.frame_count += 1;
        self.run_cycles(u64::from(self.model.cycles_per_frame()))
    }

    /// Run for `delta_ms` of emulated time, at most 1/25 s per call.
    pub fn update(&mut self, delta_ms: u32) -> u64 {
        let frequency = u64::from(self.model.cpu_frequency());
        let cycles = (frequency * u64::from(delta_ms) / 1000).min(frequency / MAX_UPDATE_DIVISOR);
        self.run_cycles(cycles)
    }

    /// Run until the CPU fetches an instruction at `pc`, giving up after
    /// `max_frames` frames. Returns whether `pc` was reached.
    pub fn run_until_pc(&mut self, pc: u16, max_frames: u32) -> bool {
        let budget = 2 * u64::from(max_frames) * u64::from(self.model.cycles_per_frame());
        let end = self.clock.time_and_phase() + budget;
        let mut current = self.board.cpu.instruction_address();

        while self.clock.time_and_phase() < end {
            if !self.step() {
                return false;
            }
            let address = self.board.cpu.instruction_address();
            if address != current {
                current = address;
                if address == pc {
                    return true;
                }
            }
        }
        false
    }

    /// Let the kernal finish its start-up so a program can be injected.
    /// With a cartridge attached start-up is the cartridge's business and
    /// this returns `false` at once.
    pub fn run_until_kernal_ready(&mut self) -> bool {
        if self.board.bus.cartridge().is_some() {
            return false;
        }
        let target = if self.builtin_kernal {
            BUILTIN_IDLE_LOOP
        } else {
            KERNAL_READY_PC
        };
        self.run_until_pc(target, MAX_BOOT_FRAMES)
    }

    /// Copy a PRG image into RAM and return its load address.
    pub fn inject_prg(&mut self, data: &[u8]) -> Result<u16> {
        prg::load_prg(&mut self.board.bus.memory, data)
    }

    // --- Lines ------------------------------------------------------------

    pub fn set_irq(&mut self, state: bool) {
        self.board.bus.pla.set_irq(state);
        self.board.deliver_signals(&mut self.clock);
    }

    pub fn set_nmi(&mut self, state: bool) {
        self.board.bus.pla.set_nmi(state);
        self.board.deliver_signals(&mut self.clock);
    }

    pub fn set_ba(&mut self, state: bool) {
        self.board.bus.pla.set_ba(state, &mut self.clock);
        self.board.deliver_signals(&mut self.clock);
    }

    pub fn set_game_exrom(
        &mut self,
        game_phi1: bool,
        exrom_phi1: bool,
        game_phi2: bool,
        exrom_phi2: bool,
    ) {
        self.board
            .bus
            .pla
            .set_game_exrom(game_phi1, exrom_phi1, game_phi2, exrom_phi2);
    }

    pub fn set_vic_mem_base(&mut self, base: u16) {
        self.board.bus.pla.set_vic_mem_base(base);
    }

    /// Drive the PLA's port lines directly, bypassing the 6510 port.
    pub fn set_cpu_port(&mut self, bits: u8) {
        self.board.bus.pla.set_cpu_port(bits);
    }

    /// Continue at `pc` from the next opcode fetch.
    pub fn set_pc(&mut self, pc: u16) {
        self.board.cpu.set_pc(pc);
    }

    // --- Expansion ------------------------------------------------------

    /// Insert a cartridge and reset so its lines take effect.
    pub fn attach_cartridge(&mut self, cartridge: Box<dyn Cartridge>) {
        let (game, exrom) = cartridge.game_exrom();
        self.board.bus.set_cartridge(Some(cartridge));
        log::debug!(
            "cartridge attached (GAME={}, EXROM={})",
            u8::from(game),
            u8::from(exrom)
        );
        self.reset();
    }

    /// Remove the cartridge, if any, and reset.
    pub fn detach_cartridge(&mut self) -> Option<Box<dyn Cartridge>> {
        let cartridge = self.board.bus.set_cartridge(None);
        if cartridge.is_some() {
            log::debug!("cartridge detached");
            self.reset();
        }
        cartridge
    }

    /// Plug a chip into its socket and return the previous occupant. The
    /// chip is not reset; call [`C64::reset`] to start it from power-on.
    pub fn attach_chip(&mut self, chip: Chip, device: Box<dyn IoDevice>) -> Box<dyn IoDevice> {
        self.board.bus.attach_chip(chip, device)
    }

    // --- Accessors ------------------------------------------------------

    #[must_use]
    pub fn cpu(&self) -> &Mos6510 {
        &self.board.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6510 {
        &mut self.board.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &C64Bus {
        &self.board.bus
    }

    pub fn bus_mut(&mut self) -> &mut C64Bus {
        &mut self.board.bus
    }

    #[must_use]
    pub fn clock(&self) -> &EventClock<C64Event> {
        &self.clock
    }

    #[must_use]
    pub fn model(&self) -> C64Model {
        self.model
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// CPU view of `address` without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.board.bus.peek(address, self.clock.time(Phase::Phi2))
    }
}

fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl Observable for C64 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.board.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("pla.") {
            self.board.bus.pla.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|address| Value::U8(self.peek(address)))
        } else if let Some(rest) = path.strip_prefix("clock.") {
            match rest {
                "now" => Some(self.clock.time_and_phase().into()),
                "cycle" => Some(self.clock.time(Phase::Phi2).into()),
                "phase" => Some(format!("{:?}", self.clock.phase()).into()),
                "pending" => Some((self.clock.pending_len() as u64).into()),
                _ => None,
            }
        } else {
            match path {
                "frame_count" => Some(self.frame_count.into()),
                _ => self.board.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6510_paths>",
            "pla.<pla_paths>",
            "memory.<address>",
            "clock.now",
            "clock.cycle",
            "clock.phase",
            "clock.pending",
            "frame_count",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c64() -> C64 {
        C64::new(&C64Config::builtin(C64Model::C64Pal)).unwrap()
    }

    #[test]
    fn reset_schedules_only_the_cpu() {
        let c64 = c64();
        assert_eq!(c64.clock().pending_len(), 1);
        assert!(c64.clock().is_pending(C64Event::Cpu(CpuEvent::NonStealing)));
        assert_eq!(c64.cpu().regs.s, 0xFF);
    }

    #[test]
    fn builtin_kernal_boots_to_idle_loop() {
        let mut c64 = c64();
        assert!(c64.run_until_kernal_ready());
        assert_eq!(c64.cpu().instruction_address(), BUILTIN_IDLE_LOOP);
        assert_eq!(c64.peek(0x0000), 0x2F);
        assert_eq!(c64.peek(0x0001) & 0x07, 0x07);
        assert!(!c64.cpu().status().contains(mos_6510::flags::I));
    }

    #[test]
    fn run_cycles_covers_the_request() {
        let mut c64 = c64();
        let ran = c64.run_cycles(1000);
        assert!((1000..1002).contains(&ran), "ran {ran}");
        let frame = c64.run_frame();
        assert!(frame >= 19_656);
        assert_eq!(c64.frame_count(), 1);
    }

    #[test]
    fn update_is_capped_at_a_25th_of_a_second() {
        let mut c64 = c64();
        let ran = c64.update(1000);
        assert!((39_409..39_412).contains(&ran), "ran {ran}");
    }

    #[test]
    fn query_routes_prefixes() {
        let mut c64 = c64();
        c64.run_until_kernal_ready();
        assert_eq!(c64.query("cpu.pc"), c64.query("pc"));
        assert_eq!(c64.query("pla.hiram"), Some(Value::Bool(true)));
        assert_eq!(c64.query("memory.$FFFD"), Some(Value::U8(0xE0)));
        assert_eq!(c64.query("memory.0xFFFD"), Some(Value::U8(0xE0)));
        assert_eq!(c64.query("memory.65533"), Some(Value::U8(0xE0)));
        assert_eq!(c64.query("clock.pending"), Some(Value::U64(1)));
        assert!(c64.query("memory.zz").is_none());
    }
}
