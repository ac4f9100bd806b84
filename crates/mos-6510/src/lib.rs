//! Cycle-exact MOS 6510 CPU.
//!
//! The CPU is a table of micro-ops indexed by `(opcode << 3) | subcycle`.
//! One clock event runs one slot, so a bus access lands in exactly the
//! cycle real silicon performs it. Undocumented opcodes are included; the
//! twelve JAM opcodes lock the sequencer.
//!
//! RDY is honoured by switching between two clock events. While RDY is low
//! only slots flagged no-steal (writes) run; the first read stalls until RDY
//! returns or an interrupt arrives.

mod alu;
mod cpu;
mod execute;
pub mod flags;
mod registers;
mod table;

pub use cpu::{CpuEvent, InterruptState, LastInstruction, Mos6510};
pub use flags::Status;
pub use registers::{Registers, STACK_PAGE};
pub use table::{InstructionTable, MicroOp, SLOTS_PER_OPCODE, TABLE_SIZE, instruction_table};
