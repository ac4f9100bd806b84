//! The micro-op table.
//!
//! Every opcode owns eight consecutive slots, so the slot for the current
//! cycle is `(opcode << 3) | subcycle`. An instruction's sequence is its
//! addressing fetches, an optional operand read, the effect, and a final
//! [`MicroOp::Finish`] that either fetches the next opcode or enters the
//! interrupt sequence. The opcode fetch itself happens in the previous
//! instruction's last slot, which is how fetch overlaps execution.
//!
//! Alongside each slot sits a no-steal flag. Slots that write to the bus
//! keep running while RDY is low; all others stall.

use std::sync::OnceLock;

use crate::flags;

/// Number of slots per opcode.
pub const SLOTS_PER_OPCODE: usize = 8;

/// Size of the table: 256 opcodes times eight slots.
pub const TABLE_SIZE: usize = 256 * SLOTS_PER_OPCODE;

/// One cycle's worth of CPU work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    // Operand and address fetches.
    /// Dummy read of PC, the second cycle of every one-byte instruction.
    ReadPc,
    /// Read the byte at PC into the data latch; step PC unless the
    /// interrupt sequence is running.
    ReadOperand,
    FetchLowAddr,
    FetchHighAddr,
    /// Indexed high-byte fetch that always takes the fix-up cycle.
    FetchHighAddrX,
    FetchHighAddrY,
    /// Indexed high-byte fetch that skips the fix-up cycle when no page is
    /// crossed.
    FetchHighAddrXSkip,
    FetchHighAddrYSkip,
    FetchLowPointer,
    FetchHighPointer,
    /// Dummy read of the zero-page base, then add the index to it.
    IndexZeroPageX,
    IndexZeroPageY,
    /// Dummy read of the `(zp,X)` pointer, then add X to it.
    IndexPointerX,
    FetchLowEffAddr,
    FetchHighEffAddr,
    FetchHighEffAddrY,
    FetchHighEffAddrYSkip,
    /// Read from the not-yet-corrected address of an indexed access.
    ThrowAwayRead,
    ReadData,
    WriteData,
    /// Dummy read of the current stack slot.
    ReadStack,

    // Stack.
    PushPcLow,
    PushPcHigh,
    PushStatus,
    PullPcLow,
    PullPcHigh,
    PullStatus,

    // BRK and the interrupt sequence.
    /// Push PCL, pick the vector (RST, NMI, then IRQ) and clear the latches.
    PushPcLowSelectVector,
    /// Push P with the live B bit, then set B and I.
    PushStatusMaskIrq,
    FetchVectorLow,
    FetchVectorHigh,
    /// Unconditional opcode fetch, ending the interrupt sequence.
    FetchOpcode,

    // Control flow.
    /// End of instruction: enter a due interrupt or fetch the next opcode.
    Finish,
    Jump,
    ReturnFromSubroutine,
    ReturnFromInterrupt,
    /// Conditional branch on `flag` being `set`.
    Branch { flag: u8, set: bool },
    /// Lock the sequencer in place.
    Jam,

    // Effects. Register and flag effects end the instruction themselves.
    Adc,
    Anc,
    And,
    Ane,
    Arr,
    AslA,
    Asl,
    Asr,
    Bit,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dcp,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Isb,
    Las,
    Lax,
    Lda,
    Ldx,
    Ldy,
    LsrA,
    Lsr,
    Lxa,
    Ora,
    Pha,
    Pla,
    Rla,
    RolA,
    Rol,
    RorA,
    Ror,
    Rra,
    Sax,
    Sbc,
    Sbx,
    Sec,
    Sed,
    Sei,
    Sha,
    Shs,
    Shx,
    Shy,
    Slo,
    Sre,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

/// Mnemonics, documented and otherwise.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Adc, Anc, And, Ane, Arr, Asl, Asr, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl,
    Brk, Bvc, Bvs, Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dcp, Dec, Dex, Dey,
    Eor, Inc, Inx, Iny, Isb, Jam, Jmp, Jsr, Las, Lax, Lda, Ldx, Ldy, Lsr,
    Lxa, Nop, Ora, Pha, Php, Pla, Plp, Rla, Rol, Ror, Rra, Rti, Rts, Sax,
    Sbc, Sbx, Sec, Sed, Sei, Sha, Shs, Shx, Shy, Slo, Sre, Sta, Stx, Sty,
    Tax, Tay, Tsx, Txa, Txs, Tya,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Imp,
    Acc,
    Imm,
    Rel,
    Zp,
    Zpx,
    Zpy,
    Abs,
    Abx,
    Aby,
    Ind,
    Izx,
    Izy,
    /// No addressing; JAM opcodes.
    Kil,
}

/// How an operation uses its addressed memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Modify,
    Store,
    Control,
}

impl Op {
    fn access(self) -> Access {
        match self {
            Op::Sta | Op::Stx | Op::Sty | Op::Sax | Op::Sha | Op::Shs | Op::Shx | Op::Shy => {
                Access::Store
            }
            Op::Asl | Op::Lsr | Op::Rol | Op::Ror | Op::Dec | Op::Inc => Access::Modify,
            Op::Dcp | Op::Isb | Op::Rla | Op::Rra | Op::Slo | Op::Sre => Access::Modify,
            Op::Jmp | Op::Jsr => Access::Control,
            _ => Access::Read,
        }
    }
}

#[rustfmt::skip]
#[allow(clippy::enum_glob_use)]
const OPCODES: [(Op, Mode); 256] = {
    use Mode::*;
    use Op::*;
    [
        // 0x00
        (Brk, Imm), (Ora, Izx), (Jam, Kil), (Slo, Izx), (Nop, Zp),  (Ora, Zp),  (Asl, Zp),  (Slo, Zp),
        (Php, Imp), (Ora, Imm), (Asl, Acc), (Anc, Imm), (Nop, Abs), (Ora, Abs), (Asl, Abs), (Slo, Abs),
        // 0x10
        (Bpl, Rel), (Ora, Izy), (Jam, Kil), (Slo, Izy), (Nop, Zpx), (Ora, Zpx), (Asl, Zpx), (Slo, Zpx),
        (Clc, Imp), (Ora, Aby), (Nop, Imp), (Slo, Aby), (Nop, Abx), (Ora, Abx), (Asl, Abx), (Slo, Abx),
        // 0x20
        (Jsr, Abs), (And, Izx), (Jam, Kil), (Rla, Izx), (Bit, Zp),  (And, Zp),  (Rol, Zp),  (Rla, Zp),
        (Plp, Imp), (And, Imm), (Rol, Acc), (Anc, Imm), (Bit, Abs), (And, Abs), (Rol, Abs), (Rla, Abs),
        // 0x30
        (Bmi, Rel), (And, Izy), (Jam, Kil), (Rla, Izy), (Nop, Zpx), (And, Zpx), (Rol, Zpx), (Rla, Zpx),
        (Sec, Imp), (And, Aby), (Nop, Imp), (Rla, Aby), (Nop, Abx), (And, Abx), (Rol, Abx), (Rla, Abx),
        // 0x40
        (Rti, Imm), (Eor, Izx), (Jam, Kil), (Sre, Izx), (Nop, Zp),  (Eor, Zp),  (Lsr, Zp),  (Sre, Zp),
        (Pha, Imp), (Eor, Imm), (Lsr, Acc), (Asr, Imm), (Jmp, Abs), (Eor, Abs), (Lsr, Abs), (Sre, Abs),
        // 0x50
        (Bvc, Rel), (Eor, Izy), (Jam, Kil), (Sre, Izy), (Nop, Zpx), (Eor, Zpx), (Lsr, Zpx), (Sre, Zpx),
        (Cli, Imp), (Eor, Aby), (Nop, Imp), (Sre, Aby), (Nop, Abx), (Eor, Abx), (Lsr, Abx), (Sre, Abx),
        // 0x60
        (Rts, Imm), (Adc, Izx), (Jam, Kil), (Rra, Izx), (Nop, Zp),  (Adc, Zp),  (Ror, Zp),  (Rra, Zp),
        (Pla, Imp), (Adc, Imm), (Ror, Acc), (Arr, Imm), (Jmp, Ind), (Adc, Abs), (Ror, Abs), (Rra, Abs),
        // 0x70
        (Bvs, Rel), (Adc, Izy), (Jam, Kil), (Rra, Izy), (Nop, Zpx), (Adc, Zpx), (Ror, Zpx), (Rra, Zpx),
        (Sei, Imp), (Adc, Aby), (Nop, Imp), (Rra, Aby), (Nop, Abx), (Adc, Abx), (Ror, Abx), (Rra, Abx),
        // 0x80
        (Nop, Imm), (Sta, Izx), (Nop, Imm), (Sax, Izx), (Sty, Zp),  (Sta, Zp),  (Stx, Zp),  (Sax, Zp),
        (Dey, Imp), (Nop, Imm), (Txa, Imp), (Ane, Imm), (Sty, Abs), (Sta, Abs), (Stx, Abs), (Sax, Abs),
        // 0x90
        (Bcc, Rel), (Sta, Izy), (Jam, Kil), (Sha, Izy), (Sty, Zpx), (Sta, Zpx), (Stx, Zpy), (Sax, Zpy),
        (Tya, Imp), (Sta, Aby), (Txs, Imp), (Shs, Aby), (Shy, Abx), (Sta, Abx), (Shx, Aby), (Sha, Aby),
        // 0xA0
        (Ldy, Imm), (Lda, Izx), (Ldx, Imm), (Lax, Izx), (Ldy, Zp),  (Lda, Zp),  (Ldx, Zp),  (Lax, Zp),
        (Tay, Imp), (Lda, Imm), (Tax, Imp), (Lxa, Imm), (Ldy, Abs), (Lda, Abs), (Ldx, Abs), (Lax, Abs),
        // 0xB0
        (Bcs, Rel), (Lda, Izy), (Jam, Kil), (Lax, Izy), (Ldy, Zpx), (Lda, Zpx), (Ldx, Zpy), (Lax, Zpy),
        (Clv, Imp), (Lda, Aby), (Tsx, Imp), (Las, Aby), (Ldy, Abx), (Lda, Abx), (Ldx, Aby), (Lax, Aby),
        // 0xC0
        (Cpy, Imm), (Cmp, Izx), (Nop, Imm), (Dcp, Izx), (Cpy, Zp),  (Cmp, Zp),  (Dec, Zp),  (Dcp, Zp),
        (Iny, Imp), (Cmp, Imm), (Dex, Imp), (Sbx, Imm), (Cpy, Abs), (Cmp, Abs), (Dec, Abs), (Dcp, Abs),
        // 0xD0
        (Bne, Rel), (Cmp, Izy), (Jam, Kil), (Dcp, Izy), (Nop, Zpx), (Cmp, Zpx), (Dec, Zpx), (Dcp, Zpx),
        (Cld, Imp), (Cmp, Aby), (Nop, Imp), (Dcp, Aby), (Nop, Abx), (Cmp, Abx), (Dec, Abx), (Dcp, Abx),
        // 0xE0
        (Cpx, Imm), (Sbc, Izx), (Nop, Imm), (Isb, Izx), (Cpx, Zp),  (Sbc, Zp),  (Inc, Zp),  (Isb, Zp),
        (Inx, Imp), (Sbc, Imm), (Nop, Imp), (Sbc, Imm), (Cpx, Abs), (Sbc, Abs), (Inc, Abs), (Isb, Abs),
        // 0xF0
        (Beq, Rel), (Sbc, Izy), (Jam, Kil), (Isb, Izy), (Nop, Zpx), (Sbc, Zpx), (Inc, Zpx), (Isb, Zpx),
        (Sed, Imp), (Sbc, Aby), (Nop, Imp), (Isb, Aby), (Nop, Abx), (Sbc, Abx), (Inc, Abx), (Isb, Abx),
    ]
};

/// Slots under construction for one opcode.
struct Sequence {
    slots: Vec<(MicroOp, bool)>,
}

impl Sequence {
    fn new() -> Self {
        Self {
            slots: Vec::with_capacity(SLOTS_PER_OPCODE),
        }
    }

    fn op(&mut self, op: MicroOp) -> &mut Self {
        self.slots.push((op, false));
        self
    }

    fn no_steal(&mut self, op: MicroOp) -> &mut Self {
        self.slots.push((op, true));
        self
    }

    fn ops(&mut self, ops: &[MicroOp]) -> &mut Self {
        for &op in ops {
            self.op(op);
        }
        self
    }
}

/// The 2048-slot instruction table and its no-steal flags.
pub struct InstructionTable {
    ops: [MicroOp; TABLE_SIZE],
    no_steal: [bool; TABLE_SIZE],
}

impl InstructionTable {
    /// Build the table from the opcode matrix.
    #[must_use]
    pub fn build() -> Self {
        let mut table = Self {
            ops: [MicroOp::Jam; TABLE_SIZE],
            no_steal: [false; TABLE_SIZE],
        };

        for (opcode, &(op, mode)) in OPCODES.iter().enumerate() {
            let mut seq = Sequence::new();
            addressing(op, mode, &mut seq);
            if mode_touches_memory(mode) && matches!(op.access(), Access::Read | Access::Modify) {
                seq.op(MicroOp::ReadData);
            }
            effect(op, mode, &mut seq);
            seq.op(MicroOp::Finish);

            assert!(
                seq.slots.len() <= SLOTS_PER_OPCODE,
                "opcode {opcode:02X} needs {} slots",
                seq.slots.len()
            );

            let base = opcode << 3;
            for (i, &(micro, no_steal)) in seq.slots.iter().enumerate() {
                table.ops[base + i] = micro;
                table.no_steal[base + i] = no_steal;
            }
        }

        table
    }

    /// Micro-op for a packed `(opcode << 3) | subcycle` slot.
    #[must_use]
    pub fn op(&self, slot: usize) -> MicroOp {
        self.ops[slot]
    }

    /// Whether the slot keeps running while RDY is low.
    #[must_use]
    pub fn is_no_steal(&self, slot: usize) -> bool {
        self.no_steal[slot]
    }

    /// The slots of one opcode, up to and including its first `Finish` or
    /// `FetchOpcode`.
    #[must_use]
    pub fn sequence(&self, opcode: u8) -> &[MicroOp] {
        let base = usize::from(opcode) << 3;
        let slots = &self.ops[base..base + SLOTS_PER_OPCODE];
        let end = slots
            .iter()
            .position(|op| matches!(op, MicroOp::Finish | MicroOp::FetchOpcode | MicroOp::Jam))
            .map_or(SLOTS_PER_OPCODE, |i| i + 1);
        &slots[..end]
    }
}

/// The shared table, built on first use.
pub fn instruction_table() -> &'static InstructionTable {
    static TABLE: OnceLock<InstructionTable> = OnceLock::new();
    TABLE.get_or_init(InstructionTable::build)
}

fn mode_touches_memory(mode: Mode) -> bool {
    matches!(
        mode,
        Mode::Zp | Mode::Zpx | Mode::Zpy | Mode::Abs | Mode::Abx | Mode::Aby | Mode::Izx | Mode::Izy
    )
}

fn addressing(op: Op, mode: Mode, seq: &mut Sequence) {
    use MicroOp as M;
    let reads = op.access() == Access::Read;
    match mode {
        Mode::Imp | Mode::Acc => {
            seq.op(M::ReadPc);
        }
        Mode::Imm | Mode::Rel => {
            seq.op(M::ReadOperand);
        }
        Mode::Zp => {
            seq.op(M::FetchLowAddr);
        }
        Mode::Zpx => {
            seq.ops(&[M::FetchLowAddr, M::IndexZeroPageX]);
        }
        Mode::Zpy => {
            seq.ops(&[M::FetchLowAddr, M::IndexZeroPageY]);
        }
        // JSR fetches its high byte after the pushes.
        Mode::Abs if op == Op::Jsr => {
            seq.op(M::FetchLowAddr);
        }
        Mode::Abs => {
            seq.ops(&[M::FetchLowAddr, M::FetchHighAddr]);
        }
        Mode::Abx => {
            let high = if reads { M::FetchHighAddrXSkip } else { M::FetchHighAddrX };
            seq.ops(&[M::FetchLowAddr, high, M::ThrowAwayRead]);
        }
        Mode::Aby => {
            let high = if reads { M::FetchHighAddrYSkip } else { M::FetchHighAddrY };
            seq.ops(&[M::FetchLowAddr, high, M::ThrowAwayRead]);
        }
        Mode::Ind => {
            seq.ops(&[M::FetchLowPointer, M::FetchHighPointer, M::FetchLowEffAddr, M::FetchHighEffAddr]);
        }
        Mode::Izx => {
            seq.ops(&[M::FetchLowPointer, M::IndexPointerX, M::FetchLowEffAddr, M::FetchHighEffAddr]);
        }
        Mode::Izy => {
            let high = if reads { M::FetchHighEffAddrYSkip } else { M::FetchHighEffAddrY };
            seq.ops(&[M::FetchLowPointer, M::FetchLowEffAddr, high, M::ThrowAwayRead]);
        }
        Mode::Kil => {}
    }
}

fn branch(seq: &mut Sequence, flag: u8, set: bool) {
    seq.ops(&[MicroOp::Branch { flag, set }, MicroOp::ThrowAwayRead]);
}

/// Dummy write of the old value, then the real write.
fn read_modify_write(seq: &mut Sequence, effect: MicroOp) {
    seq.no_steal(effect).no_steal(MicroOp::WriteData);
}

fn store(seq: &mut Sequence, effect: MicroOp) {
    seq.no_steal(effect);
}

/// Effects that occupy a single slot with no special ordering.
fn simple_effect(op: Op) -> Option<MicroOp> {
    use MicroOp as M;
    let micro = match op {
        Op::Adc => M::Adc,
        Op::Anc => M::Anc,
        Op::And => M::And,
        Op::Ane => M::Ane,
        Op::Arr => M::Arr,
        Op::Asr => M::Asr,
        Op::Bit => M::Bit,
        Op::Clc => M::Clc,
        Op::Cld => M::Cld,
        Op::Cli => M::Cli,
        Op::Clv => M::Clv,
        Op::Cmp => M::Cmp,
        Op::Cpx => M::Cpx,
        Op::Cpy => M::Cpy,
        Op::Dex => M::Dex,
        Op::Dey => M::Dey,
        Op::Eor => M::Eor,
        Op::Inx => M::Inx,
        Op::Iny => M::Iny,
        Op::Las => M::Las,
        Op::Lax => M::Lax,
        Op::Lda => M::Lda,
        Op::Ldx => M::Ldx,
        Op::Ldy => M::Ldy,
        Op::Lxa => M::Lxa,
        Op::Ora => M::Ora,
        Op::Sbc => M::Sbc,
        Op::Sbx => M::Sbx,
        Op::Sec => M::Sec,
        Op::Sed => M::Sed,
        Op::Sei => M::Sei,
        Op::Tax => M::Tax,
        Op::Tay => M::Tay,
        Op::Tsx => M::Tsx,
        Op::Txa => M::Txa,
        Op::Txs => M::Txs,
        Op::Tya => M::Tya,
        _ => return None,
    };
    Some(micro)
}

fn effect(op: Op, mode: Mode, seq: &mut Sequence) {
    use MicroOp as M;

    if let Some(micro) = simple_effect(op) {
        seq.op(micro);
        return;
    }

    let accumulator = mode == Mode::Acc;
    match op {
        Op::Asl if accumulator => {
            seq.op(M::AslA);
        }
        Op::Lsr if accumulator => {
            seq.op(M::LsrA);
        }
        Op::Rol if accumulator => {
            seq.op(M::RolA);
        }
        Op::Ror if accumulator => {
            seq.op(M::RorA);
        }
        Op::Asl => read_modify_write(seq, M::Asl),
        Op::Lsr => read_modify_write(seq, M::Lsr),
        Op::Rol => read_modify_write(seq, M::Rol),
        Op::Ror => read_modify_write(seq, M::Ror),
        Op::Dec => read_modify_write(seq, M::Dec),
        Op::Inc => read_modify_write(seq, M::Inc),
        Op::Dcp => read_modify_write(seq, M::Dcp),
        Op::Isb => read_modify_write(seq, M::Isb),
        Op::Rla => read_modify_write(seq, M::Rla),
        Op::Rra => read_modify_write(seq, M::Rra),
        Op::Slo => read_modify_write(seq, M::Slo),
        Op::Sre => read_modify_write(seq, M::Sre),

        Op::Sta => store(seq, M::Sta),
        Op::Stx => store(seq, M::Stx),
        Op::Sty => store(seq, M::Sty),
        Op::Sax => store(seq, M::Sax),
        Op::Sha => store(seq, M::Sha),
        Op::Shs => store(seq, M::Shs),
        Op::Shx => store(seq, M::Shx),
        Op::Shy => store(seq, M::Shy),

        Op::Bcc => branch(seq, flags::C, false),
        Op::Bcs => branch(seq, flags::C, true),
        Op::Bne => branch(seq, flags::Z, false),
        Op::Beq => branch(seq, flags::Z, true),
        Op::Bpl => branch(seq, flags::N, false),
        Op::Bmi => branch(seq, flags::N, true),
        Op::Bvc => branch(seq, flags::V, false),
        Op::Bvs => branch(seq, flags::V, true),

        Op::Brk => {
            seq.no_steal(M::PushPcHigh)
                .no_steal(M::PushPcLowSelectVector)
                .no_steal(M::PushStatusMaskIrq)
                .ops(&[M::FetchVectorLow, M::FetchVectorHigh, M::FetchOpcode]);
        }
        Op::Jsr => {
            seq.op(M::ReadStack)
                .no_steal(M::PushPcHigh)
                .no_steal(M::PushPcLow)
                .ops(&[M::FetchHighAddr, M::Jump]);
        }
        Op::Jmp => {
            seq.op(M::Jump);
        }
        Op::Pha => {
            seq.no_steal(M::Pha);
        }
        Op::Php => {
            seq.no_steal(M::PushStatus);
        }
        Op::Pla => {
            seq.ops(&[M::ReadStack, M::Pla]);
        }
        Op::Plp => {
            seq.ops(&[M::ReadStack, M::PullStatus, M::Finish]);
        }
        Op::Rti => {
            seq.ops(&[
                M::ReadStack,
                M::PullStatus,
                M::PullPcLow,
                M::PullPcHigh,
                M::ReturnFromInterrupt,
            ]);
        }
        Op::Rts => {
            seq.ops(&[M::ReadStack, M::PullPcLow, M::PullPcHigh, M::ReturnFromSubroutine]);
        }
        Op::Jam => {
            seq.op(M::Jam);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_twelve_opcodes_jam() {
        let table = instruction_table();
        let jams: Vec<u8> = (0..=255u8)
            .filter(|&op| table.op(usize::from(op) << 3) == MicroOp::Jam)
            .collect();
        assert_eq!(
            jams,
            vec![0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2]
        );
    }

    #[test]
    fn every_live_opcode_ends_in_an_opcode_fetch() {
        let table = instruction_table();
        for opcode in 0..=255u8 {
            let seq = table.sequence(opcode);
            let last = *seq.last().expect("non-empty sequence");
            assert!(
                matches!(last, MicroOp::Finish | MicroOp::FetchOpcode | MicroOp::Jam),
                "opcode {opcode:02X} has no terminating slot: {seq:?}"
            );
        }
    }

    #[test]
    fn read_modify_write_slots_cannot_be_stolen() {
        let table = instruction_table();
        // INC $nnnn,X
        let base = 0xFE << 3;
        assert_eq!(
            table.sequence(0xFE),
            &[
                MicroOp::FetchLowAddr,
                MicroOp::FetchHighAddrX,
                MicroOp::ThrowAwayRead,
                MicroOp::ReadData,
                MicroOp::Inc,
                MicroOp::WriteData,
                MicroOp::Finish,
            ]
        );
        assert!(!table.is_no_steal(base + 3), "operand read stalls");
        assert!(table.is_no_steal(base + 4), "dummy write runs");
        assert!(table.is_no_steal(base + 5), "final write runs");
    }

    #[test]
    fn brk_pushes_are_no_steal() {
        let table = instruction_table();
        let flags: Vec<bool> = (0..7).map(|i| table.is_no_steal(i)).collect();
        assert_eq!(flags, vec![false, true, true, true, false, false, false]);
    }

    #[test]
    fn indexed_reads_use_the_page_skip_fetch() {
        let table = instruction_table();
        assert_eq!(table.op((0xBD << 3) + 1), MicroOp::FetchHighAddrXSkip); // LDA abs,X
        assert_eq!(table.op((0x9D << 3) + 1), MicroOp::FetchHighAddrX); // STA abs,X
        assert_eq!(table.op((0xB1 << 3) + 2), MicroOp::FetchHighEffAddrYSkip); // LDA (zp),Y
        assert_eq!(table.op((0x91 << 3) + 2), MicroOp::FetchHighEffAddrY); // STA (zp),Y
    }

    #[test]
    fn rmw_indirect_uses_all_eight_slots() {
        // SLO (zp,X)
        assert_eq!(instruction_table().sequence(0x03).len(), 8);
    }
}
