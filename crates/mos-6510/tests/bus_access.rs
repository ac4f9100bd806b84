//! Every cycle puts an address on the bus, dummy cycles included.

use emu_core::{Bus, EventClock, SimpleBus};
use mos_6510::{CpuEvent, Mos6510};

const PROGRAM: u16 = 0x0200;

/// Flat RAM that remembers every address read.
struct Recording {
    ram: SimpleBus,
    reads: Vec<u16>,
}

impl Bus for Recording {
    fn read(&mut self, address: u16) -> u8 {
        self.reads.push(address);
        self.ram.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram.write(address, value);
    }
}

/// A CPU past its reset sequence with `program`'s opcode already fetched.
fn started(program: &[u8], x: u8) -> (Mos6510, Recording) {
    let mut bus = Recording {
        ram: SimpleBus::new(),
        reads: Vec::new(),
    };
    bus.ram.load(PROGRAM, program);
    bus.ram.load(0xFFFC, &[0x00, 0x02]);

    let mut clock: EventClock<CpuEvent> = EventClock::new(985_248.0);
    let mut cpu = Mos6510::new();
    cpu.trigger_rst(&mut clock);
    for _ in 0..7 {
        assert!(cpu.run_cycle(CpuEvent::NonStealing, &mut bus));
    }
    assert!(cpu.at_instruction_boundary());
    cpu.regs.x = x;
    bus.reads.clear();
    (cpu, bus)
}

/// Addresses read up to and including the next opcode fetch.
fn reads_of(program: &[u8], x: u8) -> Vec<u16> {
    let (mut cpu, mut bus) = started(program, x);
    loop {
        cpu.run_cycle(CpuEvent::NonStealing, &mut bus);
        if cpu.at_instruction_boundary() {
            return bus.reads;
        }
        assert!(bus.reads.len() < 16, "instruction did not complete");
    }
}

#[test]
fn indexed_indirect_reads_the_unindexed_pointer() {
    // LDA ($10,X) with X=4: pointer $14/$15 -> $3000
    let reads = reads_of(&[0xA1, 0x10, 0x00, 0x00], 4);
    assert_eq!(reads[..4], [0x0201, 0x0010, 0x0014, 0x0015]);
    assert_eq!(reads.len(), 6);
}

#[test]
fn zero_page_indexed_reads_the_base_address() {
    // LDA $F0,X with X=$20 wraps to $10
    let reads = reads_of(&[0xB5, 0xF0], 0x20);
    assert_eq!(reads, [0x0201, 0x00F0, 0x0010, 0x0202]);
}

#[test]
fn pull_reads_the_stack_before_moving_it() {
    // Reset leaves S at $FC.
    let reads = reads_of(&[0x68], 0);
    assert_eq!(reads, [0x0201, 0x01FC, 0x01FD, 0x0201]);
}

#[test]
fn dummy_pointer_read_stalls_under_rdy_low() {
    let (mut cpu, mut bus) = started(&[0xA1, 0x10], 0);
    assert!(cpu.run_cycle(CpuEvent::NonStealing, &mut bus));
    assert!(!cpu.run_cycle(CpuEvent::Stealing, &mut bus));
    assert_eq!(bus.reads, [0x0201], "nothing reaches the bus while stalled");
}
