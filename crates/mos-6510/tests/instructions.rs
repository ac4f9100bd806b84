//! Instruction semantics, documented and undocumented.

mod common;

use common::Rig;
use mos_6510::flags;

fn run(program: &[u8], instructions: usize) -> Rig {
    let mut rig = Rig::new(program);
    rig.run_instructions(instructions);
    rig
}

#[test]
fn test_stack_pha_pla() {
    // LDA #$42; PHA; LDA #$00; PLA
    let rig = run(&[0xA9, 0x42, 0x48, 0xA9, 0x00, 0x68], 4);
    assert_eq!(rig.cpu().regs.a, 0x42, "PLA should restore A");
    assert_eq!(rig.cpu().regs.s, 0xFC, "SP back where reset left it");
    assert!(!rig.cpu().regs.p.contains(flags::Z));
}

#[test]
fn test_php_pushes_b_and_u() {
    // SEC; PHP
    let mut rig = run(&[0x38, 0x08], 2);
    let pushed = rig.bus().peek(0x01FC);
    assert_eq!(pushed & (flags::B | flags::U | flags::C), flags::B | flags::U | flags::C);
}

#[test]
fn test_plp_restores_flags() {
    // SEC; PHP; CLC; PLP
    let rig = run(&[0x38, 0x08, 0x18, 0x28], 4);
    assert!(rig.cpu().regs.p.contains(flags::C), "PLP should restore carry");
    assert_eq!(rig.cpu().regs.s, 0xFC);
}

#[test]
fn test_jsr_pushes_return_minus_one() {
    let mut rig = run(&[0x20, 0x34, 0x12], 1);
    assert_eq!(rig.cpu().instruction_address(), 0x1234);
    assert_eq!(rig.bus().peek(0x01FC), 0x02);
    assert_eq!(rig.bus().peek(0x01FB), 0x02, "address of JSR's last byte");
}

#[test]
fn test_zero_page_indexing_wraps() {
    // LDX #$02; LDA $FF,X
    let mut rig = Rig::new(&[0xA2, 0x02, 0xB5, 0xFF]);
    rig.bus().poke(0x0001, 0x99);
    rig.bus().poke(0x0101, 0x11);
    rig.run_instructions(2);
    assert_eq!(rig.cpu().regs.a, 0x99);
}

#[test]
fn test_jmp_indirect_does_not_cross_page() {
    let mut rig = Rig::new(&[0x6C, 0xFF, 0x10]);
    rig.bus().poke(0x10FF, 0x00);
    rig.bus().poke(0x1000, 0x05);
    rig.bus().poke(0x1100, 0x09);
    rig.run_instruction();
    assert_eq!(rig.cpu().instruction_address(), 0x0500);
}

#[test]
fn test_indexed_page_cross_reads_uncorrected_address_first() {
    // LDA $10FF,X with X=1 reads $1000 (dummy) then $1100.
    let mut rig = Rig::new(&[0xBD, 0xFF, 0x10]);
    rig.cpu_mut().regs.x = 1;
    rig.bus().poke(0x1000, 0xAA);
    rig.bus().poke(0x1100, 0x55);
    rig.run_instruction();
    assert_eq!(rig.cpu().regs.a, 0x55);
}

#[test]
fn test_decimal_adc_via_program() {
    // SED; CLC; LDA #$19; ADC #$28
    let rig = run(&[0xF8, 0x18, 0xA9, 0x19, 0x69, 0x28], 4);
    assert_eq!(rig.cpu().regs.a, 0x47);
    assert!(!rig.cpu().regs.p.contains(flags::C));
}

#[test]
fn test_inc_read_modify_write_writes_twice() {
    let mut rig = Rig::new(&[0xEE, 0x00, 0x10]);
    rig.bus().poke(0x1000, 0xFF);
    rig.run_instruction();
    assert_eq!(rig.bus().peek(0x1000), 0x00);
    assert!(rig.cpu().regs.p.contains(flags::Z));
}

#[test]
fn test_bit_copies_operand_bits() {
    // LDA #$01; BIT $10
    let mut rig = Rig::new(&[0xA9, 0x01, 0x24, 0x10]);
    rig.bus().poke(0x0010, 0xC0);
    rig.run_instructions(2);
    let p = rig.cpu().regs.p;
    assert!(p.contains(flags::N));
    assert!(p.contains(flags::V));
    assert!(p.contains(flags::Z));
}

#[test]
fn test_cmp_sets_carry_when_greater_or_equal() {
    // LDA #$40; CMP #$40
    let rig = run(&[0xA9, 0x40, 0xC9, 0x40], 2);
    assert!(rig.cpu().regs.p.contains(flags::C));
    assert!(rig.cpu().regs.p.contains(flags::Z));
}

#[test]
fn test_txs_leaves_flags_alone() {
    // LDX #$00; TXS; LDX #$80; TSX
    let rig = run(&[0xA2, 0x00, 0x9A, 0xA2, 0x80, 0xBA], 4);
    assert_eq!(rig.cpu().regs.s, 0x00);
    assert_eq!(rig.cpu().regs.x, 0x00);
    assert!(rig.cpu().regs.p.contains(flags::Z), "TSX sets Z");
}

#[test]
fn test_lax_loads_a_and_x() {
    let mut rig = Rig::new(&[0xA7, 0x10]);
    rig.bus().poke(0x0010, 0x83);
    rig.run_instruction();
    assert_eq!(rig.cpu().regs.a, 0x83);
    assert_eq!(rig.cpu().regs.x, 0x83);
    assert!(rig.cpu().regs.p.contains(flags::N));
}

#[test]
fn test_sax_stores_a_and_x() {
    // LDA #$F0; LDX #$3C; SAX $10
    let mut rig = run(&[0xA9, 0xF0, 0xA2, 0x3C, 0x87, 0x10], 3);
    assert_eq!(rig.bus().peek(0x0010), 0x30);
}

#[test]
fn test_slo_shifts_then_ors() {
    // LDA #$01; SLO $10
    let mut rig = Rig::new(&[0xA9, 0x01, 0x07, 0x10]);
    rig.bus().poke(0x0010, 0x81);
    rig.run_instructions(2);
    assert_eq!(rig.bus().peek(0x0010), 0x02);
    assert_eq!(rig.cpu().regs.a, 0x03);
    assert!(rig.cpu().regs.p.contains(flags::C));
}

#[test]
fn test_dcp_decrements_then_compares() {
    // LDA #$10; DCP $10
    let mut rig = Rig::new(&[0xA9, 0x10, 0xC7, 0x10]);
    rig.bus().poke(0x0010, 0x11);
    rig.run_instructions(2);
    assert_eq!(rig.bus().peek(0x0010), 0x10);
    assert!(rig.cpu().regs.p.contains(flags::Z));
    assert!(rig.cpu().regs.p.contains(flags::C));
}

#[test]
fn test_isb_increments_then_subtracts() {
    // SEC; LDA #$10; ISB $10
    let mut rig = Rig::new(&[0x38, 0xA9, 0x10, 0xE7, 0x10]);
    rig.bus().poke(0x0010, 0x04);
    rig.run_instructions(3);
    assert_eq!(rig.bus().peek(0x0010), 0x05);
    assert_eq!(rig.cpu().regs.a, 0x0B);
}

#[test]
fn test_anc_copies_n_into_c() {
    // LDA #$FF; ANC #$80
    let rig = run(&[0xA9, 0xFF, 0x0B, 0x80], 2);
    assert_eq!(rig.cpu().regs.a, 0x80);
    assert!(rig.cpu().regs.p.contains(flags::C));
}

#[test]
fn test_asr_ands_then_shifts() {
    // LDA #$FF; ASR #$03
    let rig = run(&[0xA9, 0xFF, 0x4B, 0x03], 2);
    assert_eq!(rig.cpu().regs.a, 0x01);
    assert!(rig.cpu().regs.p.contains(flags::C));
}

#[test]
fn test_lxa_uses_magic_constant() {
    // LDA #$00; LXA #$FF -> ($00 | $EE) & $FF
    let rig = run(&[0xA9, 0x00, 0xAB, 0xFF], 2);
    assert_eq!(rig.cpu().regs.a, 0xEE);
    assert_eq!(rig.cpu().regs.x, 0xEE);
}

#[test]
fn test_sbx_subtracts_from_a_and_x() {
    // LDA #$0F; LDX #$FF; SBX #$05
    let rig = run(&[0xA9, 0x0F, 0xA2, 0xFF, 0xCB, 0x05], 3);
    assert_eq!(rig.cpu().regs.x, 0x0A);
    assert!(rig.cpu().regs.p.contains(flags::C));
}

#[test]
fn test_las_ands_stack_pointer() {
    let mut rig = Rig::new(&[0xBB, 0x00, 0x10]);
    rig.bus().poke(0x1000, 0xF0);
    rig.run_instruction();
    // S was $FC after reset.
    assert_eq!(rig.cpu().regs.a, 0xF0);
    assert_eq!(rig.cpu().regs.x, 0xF0);
    assert_eq!(rig.cpu().regs.s, 0xF0);
}

#[test]
fn test_shx_page_cross_corrupts_high_byte() {
    // LDX #$FF; LDY #$01; SHX $10FF,Y
    let mut rig = run(&[0xA2, 0xFF, 0xA0, 0x01, 0x9E, 0xFF, 0x10], 3);
    // X & (high byte of $1100 + 1) = $12, which also replaces the high byte.
    assert_eq!(rig.bus().peek(0x1200), 0x12);
    assert_eq!(rig.bus().peek(0x1100), 0x00);
}

#[test]
fn test_set_pc_applies_at_next_fetch() {
    let mut rig = Rig::new(&[0xE8, 0xE8]);
    rig.cpu_mut().set_pc(0x0600);
    rig.bus().poke(0x0600, 0xC8);
    rig.run_instruction();
    assert_eq!(rig.cpu().regs.x, 1, "current instruction finishes");
    assert_eq!(rig.cpu().instruction_address(), 0x0600);
    assert_eq!(rig.cpu().pc(), 0x0601);
}
