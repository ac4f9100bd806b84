//! Test rig: a 6510 on flat RAM, driven by its own event clock.

#![allow(dead_code)]

use emu_core::{EventClock, EventHandler, Phase, SimpleBus};
use mos_6510::{CpuEvent, Mos6510};

pub const PROGRAM: u16 = 0x0200;
pub const IRQ_HANDLER: u16 = 0x0300;
pub const NMI_HANDLER: u16 = 0x0400;

/// CPU and memory; the clock lives beside them so it can be lent to both.
pub struct Board {
    pub cpu: Mos6510,
    pub bus: SimpleBus,
}

impl EventHandler<CpuEvent> for Board {
    fn handle_event(&mut self, event: CpuEvent, clock: &mut EventClock<CpuEvent>) {
        if self.cpu.run_cycle(event, &mut self.bus) {
            clock.schedule(event, 1, Phase::Any);
        }
    }
}

pub struct Rig {
    pub clock: EventClock<CpuEvent>,
    pub board: Board,
}

impl Rig {
    /// `program` at $0200, vectors pointing at $0300 (IRQ/BRK) and $0400
    /// (NMI), each handler `INX`/`INY` then `RTI`. The reset sequence has
    /// already run when this returns.
    pub fn new(program: &[u8]) -> Self {
        let mut bus = SimpleBus::new();
        bus.load(PROGRAM, program);
        bus.load(IRQ_HANDLER, &[0xE8, 0x40]); // INX; RTI
        bus.load(NMI_HANDLER, &[0xC8, 0x40]); // INY; RTI
        bus.load(0xFFFA, &[0x00, 0x04, 0x00, 0x02, 0x00, 0x03]);

        let mut rig = Self {
            clock: EventClock::new(985_248.0),
            board: Board {
                cpu: Mos6510::new(),
                bus,
            },
        };
        rig.board.cpu.trigger_rst(&mut rig.clock);
        let reset_cycles = rig.run_instruction();
        assert_eq!(reset_cycles, 7, "reset sequence");
        assert_eq!(rig.cpu().instruction_address(), PROGRAM);
        rig
    }

    pub fn cpu(&self) -> &Mos6510 {
        &self.board.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6510 {
        &mut self.board.cpu
    }

    pub fn bus(&mut self) -> &mut SimpleBus {
        &mut self.board.bus
    }

    /// One clock step. False once the CPU has stalled with nothing pending.
    pub fn cycle(&mut self) -> bool {
        self.clock.step(&mut self.board)
    }

    /// Step until the next opcode fetch (or interrupt entry) and return the
    /// number of cycles it took.
    pub fn run_instruction(&mut self) -> u32 {
        let mut cycles = 0;
        loop {
            assert!(self.cycle(), "CPU stalled with no event pending");
            cycles += 1;
            if self.cpu().at_instruction_boundary() {
                return cycles;
            }
            assert!(cycles < 16, "instruction did not complete");
        }
    }

    pub fn run_instructions(&mut self, count: usize) {
        for _ in 0..count {
            self.run_instruction();
        }
    }

    pub fn trigger_irq(&mut self) {
        self.board.cpu.trigger_irq(&mut self.clock);
    }

    pub fn trigger_nmi(&mut self) {
        self.board.cpu.trigger_nmi(&mut self.clock);
    }

    pub fn set_rdy(&mut self, rdy: bool) {
        self.board.cpu.set_rdy(rdy, &mut self.clock);
    }
}
