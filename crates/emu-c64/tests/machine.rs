//! Whole-machine behaviour on the built-in ROMs: interrupts arriving
//! through the PLA, BA stalling the CPU, banking under program control
//! and chips driving the clock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use emu_c64::config::BUILTIN_IDLE_LOOP;
use emu_c64::{Backplane, C64, C64Config, C64Model, Chip, IoDevice};
use emu_core::Phase;

fn booted() -> C64 {
    let mut c64 = C64::new(&C64Config::builtin(C64Model::C64Pal)).expect("builtin ROMs");
    assert!(c64.run_until_kernal_ready(), "builtin kernal did not boot");
    c64
}

/// Place machine code at `address` and continue there.
fn run_code(c64: &mut C64, address: u16, code: &[u8]) {
    let mut prg = vec![address as u8, (address >> 8) as u8];
    prg.extend_from_slice(code);
    c64.inject_prg(&prg).expect("valid PRG");
    c64.set_pc(address);
}

/// Raises IRQ every `period` cycles and lets go of it 20 cycles later.
struct PeriodicIrq {
    period: u32,
    fired: Rc<Cell<u32>>,
}

const FIRE: u16 = 0;
const RELEASE: u16 = 1;

impl IoDevice for PeriodicIrq {
    fn read(&mut self, _address: u16, bp: &mut Backplane<'_>) -> u8 {
        bp.data_bus()
    }

    fn write(&mut self, _address: u16, _value: u8, _bp: &mut Backplane<'_>) {}

    fn handle_event(&mut self, token: u16, bp: &mut Backplane<'_>) {
        match token {
            FIRE => {
                self.fired.set(self.fired.get() + 1);
                bp.set_irq(true);
                bp.schedule(RELEASE, 20, Phase::Phi1);
                bp.schedule(FIRE, self.period, Phase::Phi1);
            }
            _ => bp.set_irq(false),
        }
    }

    fn reset(&mut self, bp: &mut Backplane<'_>) {
        bp.schedule(FIRE, self.period, Phase::Phi1);
    }
}

/// Pulls BA low once, `after` cycles from reset, and never lets go.
struct BusHog {
    after: u32,
}

impl IoDevice for BusHog {
    fn read(&mut self, _address: u16, bp: &mut Backplane<'_>) -> u8 {
        bp.data_bus()
    }

    fn write(&mut self, _address: u16, _value: u8, _bp: &mut Backplane<'_>) {}

    fn handle_event(&mut self, _token: u16, bp: &mut Backplane<'_>) {
        bp.set_ba(false);
    }

    fn reset(&mut self, bp: &mut Backplane<'_>) {
        bp.schedule(0, self.after, Phase::Phi1);
    }
}

#[test]
fn chip_interrupts_reach_the_kernal_handler() {
    let fired = Rc::new(Cell::new(0));
    let mut c64 = C64::new(&C64Config::builtin(C64Model::C64Pal)).expect("builtin ROMs");
    c64.attach_chip(
        Chip::Cia1,
        Box::new(PeriodicIrq {
            period: 1000,
            fired: Rc::clone(&fired),
        }),
    );
    c64.reset();
    assert!(c64.run_until_kernal_ready());
    let before = c64.peek(0x00A2);

    // Stop halfway between two interrupts so no handler is in flight.
    c64.run_cycles(10_500);

    assert!(fired.get() >= 10, "fired {}", fired.get());
    assert_eq!(c64.peek(0x00A2), before.wrapping_add(fired.get() as u8));
    assert_eq!(c64.bus().pla.irq_count(), 0);
    assert!(!c64.cpu().irq_line());
}

#[test]
fn irq_line_stays_low_until_every_source_lets_go() {
    let mut c64 = booted();

    c64.set_irq(true);
    c64.set_irq(true);
    assert!(c64.cpu().irq_line());
    assert_eq!(c64.bus().pla.irq_count(), 2);

    c64.set_irq(false);
    assert!(c64.cpu().irq_line());

    c64.set_irq(false);
    assert!(!c64.cpu().irq_line());

    // A stray release is ignored rather than wrapping the count.
    c64.set_irq(false);
    assert_eq!(c64.bus().pla.irq_count(), 0);
}

#[test]
fn nmi_edge_runs_the_handler_once() {
    let mut c64 = booted();

    c64.set_nmi(true);
    assert!(c64.run_until_pc(0xE040, 1), "NMI handler not entered");
    assert!(c64.run_until_pc(BUILTIN_IDLE_LOOP, 1));

    // Still held: no new edge, so no second NMI.
    assert!(!c64.run_until_pc(0xE040, 1));

    c64.set_nmi(false);
    c64.set_nmi(true);
    assert!(c64.run_until_pc(0xE040, 1), "second edge lost");
}

#[test]
fn ba_low_stalls_the_cpu_until_released() {
    let mut c64 = C64::new(&C64Config::builtin(C64Model::C64Pal)).expect("builtin ROMs");
    c64.attach_chip(Chip::Vic, Box::new(BusHog { after: 2000 }));
    c64.reset();
    assert!(c64.run_until_kernal_ready());

    // loop: INC $FB; JMP loop
    run_code(&mut c64, 0xC000, &[0xE6, 0xFB, 0x4C, 0x00, 0xC0]);
    c64.run_cycles(1000);
    let counted = c64.peek(0x00FB);
    assert!(c64.cpu().rdy());
    assert!(c64.bus().pla.ba());

    // BA goes low at 2000 cycles; the CPU stops and nothing else runs.
    let ran = c64.run_cycles(5000);
    assert!(ran < 5000, "clock never ran dry");
    assert!(!c64.cpu().rdy());
    assert!(!c64.bus().pla.ba());
    assert!(!c64.bus().pla.aec());
    assert_eq!(c64.clock().pending_len(), 0);

    let frozen = c64.peek(0x00FB);
    assert_ne!(frozen, counted);
    assert_eq!(c64.run_cycles(100), 0);
    assert_eq!(c64.peek(0x00FB), frozen);

    c64.set_ba(true);
    assert!(c64.bus().pla.aec());
    c64.run_cycles(100);
    assert_ne!(c64.peek(0x00FB), frozen);
}

#[derive(Clone, Copy)]
enum Line {
    Ba,
    Nmi,
    Irq,
}

/// Logs each CPU access with its PHI2 cycle and pulls a line from inside
/// the first read and/or the first write.
struct Strobe {
    on_read: Option<Line>,
    on_write: Option<Line>,
    log: Rc<RefCell<Vec<(u64, u8)>>>,
}

impl Strobe {
    fn pull(line: Line, bp: &mut Backplane<'_>) {
        match line {
            Line::Ba => bp.set_ba(false),
            Line::Nmi => bp.set_nmi(true),
            Line::Irq => bp.set_irq(true),
        }
    }
}

impl IoDevice for Strobe {
    fn read(&mut self, _address: u16, bp: &mut Backplane<'_>) -> u8 {
        self.log.borrow_mut().push((bp.time(Phase::Phi2), 0x41));
        if let Some(line) = self.on_read.take() {
            Self::pull(line, bp);
        }
        0x41
    }

    fn write(&mut self, _address: u16, value: u8, bp: &mut Backplane<'_>) {
        self.log.borrow_mut().push((bp.time(Phase::Phi2), value));
        if let Some(line) = self.on_write.take() {
            Self::pull(line, bp);
        }
    }
}

type AccessLog = Rc<RefCell<Vec<(u64, u8)>>>;

/// Run `INC $DC00` in a loop against a [`Strobe`] on CIA1.
fn inc_cia1(on_read: Option<Line>, on_write: Option<Line>) -> (C64, AccessLog) {
    let log = AccessLog::default();
    let mut c64 = booted();
    c64.attach_chip(
        Chip::Cia1,
        Box::new(Strobe {
            on_read,
            on_write,
            log: Rc::clone(&log),
        }),
    );
    // loop: INC $DC00; JMP loop
    run_code(&mut c64, 0xC000, &[0xEE, 0x00, 0xDC, 0x4C, 0x00, 0xC0]);
    c64.run_cycles(20);
    (c64, log)
}

fn assert_back_to_back(log: &AccessLog) {
    let log = log.borrow();
    let t = log[0].0;
    assert_eq!(
        log[..3],
        [(t, 0x41), (t + 1, 0x41), (t + 2, 0x42)],
        "read, dummy write and final write on consecutive cycles"
    );
}

#[test]
fn read_modify_write_runs_on_consecutive_cycles() {
    let (_, log) = inc_cia1(None, None);
    assert_back_to_back(&log);
}

#[test]
fn ba_pulled_during_a_read_keeps_the_writes_in_step() {
    let (mut c64, log) = inc_cia1(Some(Line::Ba), None);

    // Both writes go through under RDY low, then the CPU stalls for good.
    assert_back_to_back(&log);
    assert_eq!(log.borrow().len(), 3);
    assert!(!c64.cpu().rdy());
    assert_eq!(c64.run_cycles(10), 0);
}

#[test]
fn nmi_raised_by_a_write_under_rdy_low_keeps_the_writes_in_step() {
    let (c64, log) = inc_cia1(Some(Line::Ba), Some(Line::Nmi));
    assert_back_to_back(&log);
    assert_eq!(c64.bus().pla.nmi_count(), 1);
}

#[test]
fn irq_raised_under_rdy_low_keeps_the_writes_in_step() {
    let (c64, log) = inc_cia1(Some(Line::Ba), Some(Line::Irq));
    assert_back_to_back(&log);
    assert!(c64.cpu().irq_line());
}

#[test]
fn program_banks_ram_in_under_basic() {
    let mut c64 = booted();
    c64.bus_mut().memory.ram_write(0xA000, 0x5A);
    assert_eq!(c64.peek(0xA000), 0x00, "BASIC ROM should be visible");

    run_code(
        &mut c64,
        0xC000,
        &[
            0xA9, 0x34, // LDA #$34
            0x85, 0x01, // STA $01
            0xAD, 0x00, 0xA0, // LDA $A000
            0x85, 0x02, // STA $02
            0xA9, 0x37, // LDA #$37
            0x85, 0x01, // STA $01
            0x4C, 0x0D, 0xC0, // JMP $C00D
        ],
    );
    assert!(c64.run_until_pc(0xC00D, 1));

    assert_eq!(c64.peek(0x0002), 0x5A);
    assert_eq!(c64.bus().pla.lines(), (true, true, true));
    assert_eq!(c64.peek(0xA000), 0x00);
}

#[test]
fn io_pages_follow_charen() {
    let mut c64 = booted();
    c64.bus_mut().memory.colour_write(0xD800, 0x0E);
    c64.bus_mut().memory.ram_write(0xD800, 0x77);

    let colour = c64.peek(0xD800);
    assert_eq!(colour & 0x0F, 0x0E);
    assert_eq!(colour & 0xF0, c64.bus().pla.data_bus() & 0xF0);

    // CHAREN low: character ROM, which is blank in the built-in set.
    c64.set_cpu_port(0b011);
    assert_eq!(c64.peek(0xD800), 0x00);

    // Everything low: plain RAM.
    c64.set_cpu_port(0b000);
    assert_eq!(c64.peek(0xD800), 0x77);
}

#[test]
fn basic_program_sets_end_pointers() {
    let mut c64 = booted();
    let load = c64
        .inject_prg(&[0x01, 0x08, 0x0B, 0x08, 0x0A, 0x00, 0x99, 0x00, 0x00, 0x00])
        .expect("valid PRG");
    assert_eq!(load, 0x0801);
    assert_eq!(c64.peek(0x0805), 0x99);
    assert_eq!(c64.peek(0x002D), 0x09);
    assert_eq!(c64.peek(0x002E), 0x08);
}

#[test]
fn short_prg_is_rejected() {
    let mut c64 = booted();
    assert!(c64.inject_prg(&[0x00]).is_err());
}
