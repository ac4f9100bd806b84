//! The 6510 sequencer: state, clock events and interrupt logic.

use emu_core::{Bus, EventClock, Observable, Phase, Value};

use crate::flags::{self, I};
use crate::table::{InstructionTable, MicroOp, instruction_table};
use crate::{Registers, Status};

/// Clock events owned by the CPU. Exactly one of them is pending while the
/// CPU is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuEvent {
    /// RDY high: every slot runs.
    NonStealing,
    /// RDY low: no-steal slots run, the first stealable slot stalls.
    Stealing,
}

/// Make `to` the CPU's pending event. A running CPU keeps the slot time
/// `from` already had, even when called from inside that slot; a stalled
/// CPU resumes at the next PHI2.
fn switch_event<E>(clock: &mut EventClock<E>, from: CpuEvent, to: CpuEvent)
where
    E: From<CpuEvent> + Copy + PartialEq,
{
    if let Some(trigger) = clock.trigger_time(from.into()) {
        clock.cancel(from.into());
        clock.schedule_at(to.into(), trigger);
    } else if !clock.is_pending(to.into()) {
        clock.schedule(to.into(), 0, Phase::Phi2);
    }
}

/// Where the CPU is with respect to a pending interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptState {
    /// No interrupt source is active.
    None,
    /// A source became active when the packed cycle counter had this value.
    /// It is taken at the end of the current instruction if that is more
    /// than two cycles later, otherwise at the end of the next one.
    PendingAt(i32),
    /// The interrupt is taken at the end of the current instruction.
    InProgress,
}

/// Address and length of the previously completed instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastInstruction {
    pub address: u16,
    pub cycles: i32,
}

/// MOS 6510 driven one micro-op per clock event.
///
/// The CPU does not own its clock or its bus. The owner forwards
/// [`CpuEvent`]s to [`Mos6510::run_cycle`] and reschedules the event one
/// cycle later when it returns `true`.
pub struct Mos6510 {
    pub regs: Registers,
    table: &'static InstructionTable,

    /// `(opcode << 3) | subcycle` of the next slot to run.
    cycle_count: i32,
    interrupt: InterruptState,

    rdy: bool,
    nmi: bool,
    rst: bool,
    irq_line: bool,

    pub(crate) effective_address: u16,
    /// Address before the page fix-up of an indexed access.
    pub(crate) uncorrected_address: u16,
    pub(crate) pointer: u16,
    pub(crate) data: u8,

    goto_address: Option<u16>,

    instruction_address: u16,
    last: LastInstruction,
    /// -1 while a taken branch skipped its fix-up slot.
    pub(crate) branch_adjust: i32,
    jammed: bool,
}

impl Default for Mos6510 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6510 {
    /// A powered-off CPU. Nothing runs until [`Mos6510::trigger_rst`]
    /// schedules the first event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            table: instruction_table(),
            cycle_count: 0,
            interrupt: InterruptState::None,
            rdy: true,
            nmi: false,
            rst: false,
            irq_line: false,
            effective_address: 0,
            uncorrected_address: 0,
            pointer: 0,
            data: 0,
            goto_address: None,
            instruction_address: 0,
            last: LastInstruction::default(),
            branch_adjust: 0,
            jammed: false,
        }
    }

    // --- Clock interface -------------------------------------------------

    /// Run the slot for one clock event. Returns whether the event should be
    /// scheduled again one cycle later.
    pub fn run_cycle<B: Bus>(&mut self, event: CpuEvent, bus: &mut B) -> bool {
        match event {
            CpuEvent::NonStealing => {
                self.run_slot(bus);
                true
            }
            CpuEvent::Stealing => {
                if self.table.is_no_steal(self.slot()) {
                    self.run_slot(bus);
                    true
                } else {
                    // Stalled cycles don't count towards the interrupt delay.
                    if self.interrupt == InterruptState::PendingAt(self.cycle_count) {
                        self.interrupt = InterruptState::PendingAt(self.cycle_count - 1);
                    }
                    false
                }
            }
        }
    }

    fn run_slot<B: Bus>(&mut self, bus: &mut B) {
        let op = self.table.op(self.slot());
        self.cycle_count += 1;
        self.execute(op, bus);
    }

    fn slot(&self) -> usize {
        self.cycle_count as usize
    }

    /// Drive the RDY line. Low switches to the stealing event so the VIC can
    /// take the bus at the CPU's next read.
    pub fn set_rdy<E>(&mut self, rdy: bool, clock: &mut EventClock<E>)
    where
        E: From<CpuEvent> + Copy + PartialEq,
    {
        self.rdy = rdy;
        if rdy {
            switch_event(clock, CpuEvent::Stealing, CpuEvent::NonStealing);
        } else {
            switch_event(clock, CpuEvent::NonStealing, CpuEvent::Stealing);
        }
    }

    /// Reset the CPU and start the reset sequence at the next PHI2.
    ///
    /// Instructions in flight are abandoned, which real hardware would not
    /// do, but no program can observe it.
    pub fn trigger_rst<E>(&mut self, clock: &mut EventClock<E>)
    where
        E: From<CpuEvent> + Copy + PartialEq,
    {
        self.regs = Registers::new();
        self.interrupt = InterruptState::None;
        self.irq_line = false;
        self.nmi = false;
        self.rst = false;
        self.rdy = true;
        self.goto_address = None;
        self.branch_adjust = 0;
        self.jammed = false;

        switch_event(clock, CpuEvent::Stealing, CpuEvent::NonStealing);

        // Run the BRK sequence from its first slot.
        self.cycle_count = 0;
        self.rst = true;
        self.calculate_interrupt_trigger_cycle();
        log::debug!("6510 reset");
    }

    /// Latch an NMI edge. It cannot be withdrawn.
    pub fn trigger_nmi<E>(&mut self, clock: &mut EventClock<E>)
    where
        E: From<CpuEvent> + Copy + PartialEq,
    {
        self.nmi = true;
        self.calculate_interrupt_trigger_cycle();
        if !self.rdy {
            switch_event(clock, CpuEvent::NonStealing, CpuEvent::Stealing);
        }
    }

    /// IRQ line pulled low.
    pub fn trigger_irq<E>(&mut self, clock: &mut EventClock<E>)
    where
        E: From<CpuEvent> + Copy + PartialEq,
    {
        self.irq_line = true;
        self.calculate_interrupt_trigger_cycle();
        if !self.rdy && self.interrupt == InterruptState::PendingAt(self.cycle_count) {
            switch_event(clock, CpuEvent::NonStealing, CpuEvent::Stealing);
        }
    }

    /// IRQ line released.
    pub fn clear_irq(&mut self) {
        self.irq_line = false;
        self.calculate_interrupt_trigger_cycle();
    }

    /// Continue at `address` from the next opcode fetch.
    pub fn set_pc(&mut self, address: u16) {
        self.goto_address = Some(address);
    }

    // --- Interrupt sequencing --------------------------------------------

    pub(crate) fn calculate_interrupt_trigger_cycle(&mut self) {
        if self.interrupt == InterruptState::None && self.interrupt_source_active() {
            self.interrupt = InterruptState::PendingAt(self.cycle_count);
        }
    }

    fn interrupt_source_active(&self) -> bool {
        self.rst || self.nmi || (!self.regs.p.contains(I) && self.irq_line)
    }

    /// Last slot of every instruction.
    pub(crate) fn finish<B: Bus>(&mut self, bus: &mut B) {
        let due = match self.interrupt {
            InterruptState::None => false,
            InterruptState::PendingAt(at) => self.cycle_count > at + 2,
            InterruptState::InProgress => true,
        };
        if due {
            self.enter_interrupt(bus);
        } else {
            self.fetch_next_opcode(bus);
        }
    }

    /// Start the BRK sequence with B clear in place of the next opcode.
    fn enter_interrupt<B: Bus>(&mut self, bus: &mut B) {
        bus.read(self.regs.pc);
        self.cycle_count = 0;
        self.regs.p.set(flags::B, false);
        self.interrupt = InterruptState::None;
        log::trace!(
            "interrupt at ${:04X} (rst={} nmi={} irq={})",
            self.regs.pc,
            self.rst,
            self.nmi,
            self.irq_line
        );
    }

    pub(crate) fn fetch_next_opcode<B: Bus>(&mut self, bus: &mut B) {
        if let Some(address) = self.goto_address.take() {
            self.regs.pc = address;
        }

        self.last = LastInstruction {
            address: self.instruction_address,
            cycles: (self.cycle_count & 7) + self.branch_adjust,
        };
        self.branch_adjust = 0;

        self.instruction_address = self.regs.pc;
        self.cycle_count = i32::from(bus.read(self.regs.pc)) << 3;
        self.regs.pc = self.regs.pc.wrapping_add(1);

        if !self.interrupt_source_active() {
            self.interrupt = InterruptState::None;
        }
        if self.interrupt != InterruptState::None {
            self.interrupt = InterruptState::InProgress;
        }
    }

    /// Pick the vector for the interrupt sequence. RST wins over NMI, NMI
    /// over IRQ and BRK. Both latches are consumed.
    pub(crate) fn take_vector(&mut self) -> u16 {
        let vector = if self.rst {
            0xFFFC
        } else if self.nmi {
            0xFFFA
        } else {
            0xFFFE
        };
        self.rst = false;
        self.nmi = false;
        self.calculate_interrupt_trigger_cycle();
        vector
    }

    /// SEI takes effect for an IRQ that has not yet been committed.
    pub(crate) fn drop_masked_irq(&mut self) {
        if !self.rst && !self.nmi && self.interrupt != InterruptState::None {
            self.interrupt = InterruptState::None;
        }
    }

    /// A taken branch in the same page delays an interrupt that became
    /// pending during this instruction.
    pub(crate) fn defer_interrupt_for_branch(&mut self) {
        if let InterruptState::PendingAt(at) = self.interrupt {
            if at >> 3 == self.cycle_count >> 3 {
                self.interrupt = InterruptState::PendingAt(at + 2);
            }
        }
    }

    /// Skip the next slot (the page fix-up read).
    pub(crate) fn skip_slot(&mut self) {
        self.cycle_count += 1;
    }

    /// Stay on the current slot forever.
    pub(crate) fn jam(&mut self) {
        self.cycle_count -= 1;
        if !self.jammed {
            self.jammed = true;
            log::warn!(
                "CPU jammed by opcode ${:02X} at ${:04X}",
                self.opcode(),
                self.instruction_address
            );
        }
    }

    // --- Accessors -------------------------------------------------------

    #[must_use]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.regs.p
    }

    /// Packed `(opcode << 3) | subcycle` counter.
    #[must_use]
    pub fn cycle_count(&self) -> i32 {
        self.cycle_count
    }

    /// Opcode currently executing (0 during the interrupt sequence).
    #[must_use]
    pub fn opcode(&self) -> u8 {
        (self.cycle_count >> 3) as u8
    }

    /// True right after an opcode fetch, before its first slot runs.
    #[must_use]
    pub fn at_instruction_boundary(&self) -> bool {
        self.cycle_count & 7 == 0
    }

    /// Address the current instruction was fetched from.
    #[must_use]
    pub fn instruction_address(&self) -> u16 {
        self.instruction_address
    }

    #[must_use]
    pub fn last_instruction(&self) -> LastInstruction {
        self.last
    }

    #[must_use]
    pub fn interrupt_state(&self) -> InterruptState {
        self.interrupt
    }

    #[must_use]
    pub fn rdy(&self) -> bool {
        self.rdy
    }

    #[must_use]
    pub fn irq_line(&self) -> bool {
        self.irq_line
    }

    #[must_use]
    pub fn nmi_latched(&self) -> bool {
        self.nmi
    }

    #[must_use]
    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    /// Micro-op the next event will run.
    #[must_use]
    pub fn next_micro_op(&self) -> MicroOp {
        self.table.op(self.slot())
    }
}

const QUERY_PATHS: &[&str] = &[
    "pc",
    "a",
    "x",
    "y",
    "s",
    "p",
    "flags.n",
    "flags.v",
    "flags.b",
    "flags.d",
    "flags.i",
    "flags.z",
    "flags.c",
    "cycle_count",
    "opcode",
    "subcycle",
    "interrupt",
    "rdy",
    "irq",
    "nmi",
    "jammed",
    "instruction_address",
    "last.address",
    "last.cycles",
];

impl Observable for Mos6510 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(flag) = path.strip_prefix("flags.") {
            let bit = match flag {
                "n" => flags::N,
                "v" => flags::V,
                "b" => flags::B,
                "d" => flags::D,
                "i" => flags::I,
                "z" => flags::Z,
                "c" => flags::C,
                _ => return None,
            };
            return Some(self.regs.p.contains(bit).into());
        }

        let value = match path {
            "pc" => self.regs.pc.into(),
            "a" => self.regs.a.into(),
            "x" => self.regs.x.into(),
            "y" => self.regs.y.into(),
            "s" => self.regs.s.into(),
            "p" => self.regs.p.bits().into(),
            "cycle_count" => self.cycle_count.into(),
            "opcode" => self.opcode().into(),
            "subcycle" => ((self.cycle_count & 7) as u8).into(),
            "interrupt" => match self.interrupt {
                InterruptState::None => "none".into(),
                InterruptState::PendingAt(at) => format!("pending@{at}").into(),
                InterruptState::InProgress => "in_progress".into(),
            },
            "rdy" => self.rdy.into(),
            "irq" => self.irq_line.into(),
            "nmi" => self.nmi.into(),
            "jammed" => self.jammed.into(),
            "instruction_address" => self.instruction_address.into(),
            "last.address" => self.last.address.into(),
            "last.cycles" => self.last.cycles.into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
