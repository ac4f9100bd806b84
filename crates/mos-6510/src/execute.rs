//! Micro-op dispatch.

use emu_core::Bus;

use crate::flags::{self, C, D, I, N, V, Z};
use crate::table::MicroOp;
use crate::{Mos6510, Status};

/// Magic constant of ANE and LXA. Chip dependent; $EE matches most C64s.
const ANE_MAGIC: u8 = 0xEE;

impl Mos6510 {
    pub(crate) fn execute<B: Bus>(&mut self, op: MicroOp, bus: &mut B) {
        match op {
            // --- Addressing ----------------------------------------------
            MicroOp::ReadPc => {
                bus.read(self.regs.pc);
            }
            MicroOp::ReadOperand => {
                self.data = bus.read(self.regs.pc);
                // B is clear only inside the interrupt sequence, which must
                // not step over the byte it replaced.
                if self.regs.p.contains(flags::B) {
                    self.regs.pc = self.regs.pc.wrapping_add(1);
                }
            }
            MicroOp::FetchLowAddr => self.fetch_low_addr(bus),
            MicroOp::IndexZeroPageX => {
                bus.read(self.effective_address);
                self.effective_address = (self.effective_address + u16::from(self.regs.x)) & 0xFF;
            }
            MicroOp::IndexZeroPageY => {
                bus.read(self.effective_address);
                self.effective_address = (self.effective_address + u16::from(self.regs.y)) & 0xFF;
            }
            MicroOp::FetchHighAddr => self.fetch_high_addr(bus),
            MicroOp::FetchHighAddrX => {
                self.fetch_high_addr(bus);
                self.apply_index(self.regs.x);
            }
            MicroOp::FetchHighAddrY => {
                self.fetch_high_addr(bus);
                self.apply_index(self.regs.y);
            }
            MicroOp::FetchHighAddrXSkip => {
                self.fetch_high_addr(bus);
                self.apply_index(self.regs.x);
                self.skip_fixup_within_page();
            }
            MicroOp::FetchHighAddrYSkip => {
                self.fetch_high_addr(bus);
                self.apply_index(self.regs.y);
                self.skip_fixup_within_page();
            }
            MicroOp::FetchLowPointer => {
                self.pointer = u16::from(bus.read(self.regs.pc));
                self.regs.pc = self.regs.pc.wrapping_add(1);
            }
            MicroOp::FetchHighPointer => {
                self.pointer |= u16::from(bus.read(self.regs.pc)) << 8;
                self.regs.pc = self.regs.pc.wrapping_add(1);
            }
            MicroOp::IndexPointerX => {
                bus.read(self.pointer);
                self.pointer = (self.pointer + u16::from(self.regs.x)) & 0xFF;
            }
            MicroOp::FetchLowEffAddr => {
                self.effective_address = u16::from(bus.read(self.pointer));
            }
            MicroOp::FetchHighEffAddr => self.fetch_high_eff_addr(bus),
            MicroOp::FetchHighEffAddrY => {
                self.fetch_high_eff_addr(bus);
                self.apply_index(self.regs.y);
            }
            MicroOp::FetchHighEffAddrYSkip => {
                self.fetch_high_eff_addr(bus);
                self.apply_index(self.regs.y);
                self.skip_fixup_within_page();
            }
            MicroOp::ThrowAwayRead => {
                bus.read(self.uncorrected_address);
            }
            MicroOp::ReadData => {
                self.data = bus.read(self.effective_address);
            }
            MicroOp::WriteData => bus.write(self.effective_address, self.data),
            MicroOp::ReadStack => {
                bus.read(self.regs.stack_address());
            }

            // --- Stack ---------------------------------------------------
            MicroOp::PushPcLow => self.push(bus, self.regs.pc_low()),
            MicroOp::PushPcHigh => self.push(bus, self.regs.pc_high()),
            MicroOp::PushStatus => self.push(bus, self.regs.p.bits()),
            MicroOp::PullPcLow => {
                let address = self.regs.pull();
                self.effective_address = u16::from(bus.read(address));
            }
            MicroOp::PullPcHigh => {
                let address = self.regs.pull();
                self.effective_address |= u16::from(bus.read(address)) << 8;
            }
            MicroOp::PullStatus => {
                let address = self.regs.pull();
                self.regs.p = Status::pulled(bus.read(address));
                self.calculate_interrupt_trigger_cycle();
            }

            // --- BRK / interrupt sequence --------------------------------
            MicroOp::PushPcLowSelectVector => {
                self.push(bus, self.regs.pc_low());
                self.effective_address = self.take_vector();
            }
            MicroOp::PushStatusMaskIrq => {
                self.push(bus, self.regs.p.bits());
                self.regs.p.set(flags::B, true);
                self.regs.p.set(I, true);
            }
            MicroOp::FetchVectorLow => {
                self.regs.pc = u16::from(bus.read(self.effective_address));
            }
            MicroOp::FetchVectorHigh => {
                let high = bus.read(self.effective_address.wrapping_add(1));
                self.regs.pc |= u16::from(high) << 8;
            }
            MicroOp::FetchOpcode => self.fetch_next_opcode(bus),

            // --- Control flow --------------------------------------------
            MicroOp::Finish => self.finish(bus),
            MicroOp::Jump => {
                self.regs.pc = self.effective_address;
                self.finish(bus);
            }
            MicroOp::ReturnFromSubroutine => {
                bus.read(self.effective_address);
                self.regs.pc = self.effective_address.wrapping_add(1);
            }
            MicroOp::ReturnFromInterrupt => {
                self.regs.pc = self.effective_address;
                self.finish(bus);
            }
            MicroOp::Branch { flag, set } => {
                if self.regs.p.contains(flag) == set {
                    self.take_branch(bus);
                } else {
                    self.finish(bus);
                }
            }
            MicroOp::Jam => self.jam(),

            // --- Loads, logic and arithmetic -----------------------------
            MicroOp::Adc => {
                self.add_with_carry(self.data);
                self.finish(bus);
            }
            MicroOp::Sbc => {
                self.subtract_with_borrow(self.data);
                self.finish(bus);
            }
            MicroOp::And => self.load_a(bus, self.regs.a & self.data),
            MicroOp::Ora => self.load_a(bus, self.regs.a | self.data),
            MicroOp::Eor => self.load_a(bus, self.regs.a ^ self.data),
            MicroOp::Lda => self.load_a(bus, self.data),
            MicroOp::Ldx => {
                self.regs.x = self.data;
                self.regs.p.set_nz(self.regs.x);
                self.finish(bus);
            }
            MicroOp::Ldy => {
                self.regs.y = self.data;
                self.regs.p.set_nz(self.regs.y);
                self.finish(bus);
            }
            MicroOp::Lax => {
                self.regs.x = self.data;
                self.load_a(bus, self.data);
            }
            MicroOp::Anc => {
                self.regs.a &= self.data;
                self.regs.p.set_nz(self.regs.a);
                self.regs.p.set(C, self.regs.p.contains(N));
                self.finish(bus);
            }
            MicroOp::Ane => {
                let value = (self.regs.a | ANE_MAGIC) & self.regs.x & self.data;
                self.load_a(bus, value);
            }
            MicroOp::Lxa => {
                let value = self.data & (self.regs.a | ANE_MAGIC);
                self.regs.x = value;
                self.load_a(bus, value);
            }
            MicroOp::Arr => {
                self.and_rotate_right(self.data);
                self.finish(bus);
            }
            MicroOp::Asr => {
                let value = self.regs.a & self.data;
                let shifted = self.shift_right(value);
                self.load_a(bus, shifted);
            }
            MicroOp::Las => {
                let value = self.data & self.regs.s;
                self.regs.s = value;
                self.regs.x = value;
                self.load_a(bus, value);
            }
            MicroOp::Sbx => {
                let minuend = i32::from(self.regs.x & self.regs.a);
                let difference = minuend - i32::from(self.data);
                self.regs.x = difference as u8;
                self.regs.p.set_nz(self.regs.x);
                self.regs.p.set(C, difference >= 0);
                self.finish(bus);
            }
            MicroOp::Bit => {
                let p = &mut self.regs.p;
                p.set(Z, self.regs.a & self.data == 0);
                p.set(N, self.data & 0x80 != 0);
                p.set(V, self.data & 0x40 != 0);
                self.finish(bus);
            }
            MicroOp::Cmp => {
                self.compare(self.regs.a, self.data);
                self.finish(bus);
            }
            MicroOp::Cpx => {
                self.compare(self.regs.x, self.data);
                self.finish(bus);
            }
            MicroOp::Cpy => {
                self.compare(self.regs.y, self.data);
                self.finish(bus);
            }

            // --- Accumulator shifts --------------------------------------
            MicroOp::AslA => {
                let value = self.shift_left(self.regs.a);
                self.load_a(bus, value);
            }
            MicroOp::LsrA => {
                let value = self.shift_right(self.regs.a);
                self.load_a(bus, value);
            }
            MicroOp::RolA => {
                let value = self.rotate_left(self.regs.a);
                self.load_a(bus, value);
            }
            MicroOp::RorA => {
                let value = self.rotate_right(self.regs.a);
                self.load_a(bus, value);
            }

            // --- Read-modify-write: dummy write, then modify the latch ---
            MicroOp::Asl => {
                self.write_back(bus);
                self.data = self.shift_left(self.data);
                self.regs.p.set_nz(self.data);
            }
            MicroOp::Lsr => {
                self.write_back(bus);
                self.data = self.shift_right(self.data);
                self.regs.p.set_nz(self.data);
            }
            MicroOp::Rol => {
                self.write_back(bus);
                self.data = self.rotate_left(self.data);
                self.regs.p.set_nz(self.data);
            }
            MicroOp::Ror => {
                self.write_back(bus);
                self.data = self.rotate_right(self.data);
                self.regs.p.set_nz(self.data);
            }
            MicroOp::Dec => {
                self.write_back(bus);
                self.data = self.data.wrapping_sub(1);
                self.regs.p.set_nz(self.data);
            }
            MicroOp::Inc => {
                self.write_back(bus);
                self.data = self.data.wrapping_add(1);
                self.regs.p.set_nz(self.data);
            }
            MicroOp::Dcp => {
                self.write_back(bus);
                self.data = self.data.wrapping_sub(1);
                self.compare(self.regs.a, self.data);
            }
            MicroOp::Isb => {
                self.write_back(bus);
                self.data = self.data.wrapping_add(1);
                self.regs.p.set_nz(self.data);
                self.subtract_with_borrow(self.data);
            }
            MicroOp::Rla => {
                self.write_back(bus);
                self.data = self.rotate_left(self.data);
                self.regs.a &= self.data;
                self.regs.p.set_nz(self.regs.a);
            }
            MicroOp::Rra => {
                self.write_back(bus);
                self.data = self.rotate_right(self.data);
                self.regs.p.set_nz(self.data);
                self.add_with_carry(self.data);
            }
            MicroOp::Slo => {
                self.write_back(bus);
                self.data = self.shift_left(self.data);
                self.regs.a |= self.data;
                self.regs.p.set_nz(self.regs.a);
            }
            MicroOp::Sre => {
                self.write_back(bus);
                self.data = self.shift_right(self.data);
                self.regs.a ^= self.data;
                self.regs.p.set_nz(self.regs.a);
            }

            // --- Stores ----------------------------------------------------
            MicroOp::Sta => self.store(bus, self.regs.a),
            MicroOp::Stx => self.store(bus, self.regs.x),
            MicroOp::Sty => self.store(bus, self.regs.y),
            MicroOp::Sax => self.store(bus, self.regs.a & self.regs.x),
            MicroOp::Sha => {
                let value = self.regs.x & self.regs.a & self.high_byte_plus_one();
                self.store_unstable(bus, value);
            }
            MicroOp::Shs => {
                self.regs.s = self.regs.a & self.regs.x;
                let value = self.regs.s & self.high_byte_plus_one();
                self.store_unstable(bus, value);
            }
            MicroOp::Shx => {
                let value = self.regs.x & self.high_byte_plus_one();
                self.store_unstable(bus, value);
            }
            MicroOp::Shy => {
                let value = self.regs.y & self.high_byte_plus_one();
                self.store_unstable(bus, value);
            }

            // --- Stack effects -------------------------------------------
            MicroOp::Pha => self.push(bus, self.regs.a),
            MicroOp::Pla => {
                let address = self.regs.pull();
                self.regs.a = bus.read(address);
                self.regs.p.set_nz(self.regs.a);
            }

            // --- Flags and transfers -------------------------------------
            MicroOp::Clc => self.set_flag_and_finish(bus, C, false),
            MicroOp::Cld => self.set_flag_and_finish(bus, D, false),
            MicroOp::Clv => self.set_flag_and_finish(bus, V, false),
            MicroOp::Sec => self.set_flag_and_finish(bus, C, true),
            MicroOp::Sed => self.set_flag_and_finish(bus, D, true),
            MicroOp::Cli => {
                self.regs.p.set(I, false);
                self.calculate_interrupt_trigger_cycle();
                self.finish(bus);
            }
            MicroOp::Sei => {
                self.regs.p.set(I, true);
                self.finish(bus);
                self.drop_masked_irq();
            }
            MicroOp::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.set_nz(self.regs.x);
                self.finish(bus);
            }
            MicroOp::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.set_nz(self.regs.y);
                self.finish(bus);
            }
            MicroOp::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.set_nz(self.regs.x);
                self.finish(bus);
            }
            MicroOp::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.set_nz(self.regs.y);
                self.finish(bus);
            }
            MicroOp::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.set_nz(self.regs.x);
                self.finish(bus);
            }
            MicroOp::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.set_nz(self.regs.y);
                self.finish(bus);
            }
            MicroOp::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.set_nz(self.regs.x);
                self.finish(bus);
            }
            MicroOp::Txa => self.load_a(bus, self.regs.x),
            MicroOp::Tya => self.load_a(bus, self.regs.y),
            MicroOp::Txs => {
                self.regs.s = self.regs.x;
                self.finish(bus);
            }
        }
    }

    fn fetch_low_addr<B: Bus>(&mut self, bus: &mut B) {
        self.effective_address = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);
    }

    fn fetch_high_addr<B: Bus>(&mut self, bus: &mut B) {
        self.effective_address |= u16::from(bus.read(self.regs.pc)) << 8;
        self.regs.pc = self.regs.pc.wrapping_add(1);
    }

    /// The high pointer byte comes from the same page as the low one.
    fn fetch_high_eff_addr<B: Bus>(&mut self, bus: &mut B) {
        self.pointer = (self.pointer & 0xFF00) | (self.pointer.wrapping_add(1) & 0x00FF);
        self.effective_address |= u16::from(bus.read(self.pointer)) << 8;
    }

    /// Add an index register, remembering the address the CPU puts on the
    /// bus before the carry into the high byte is applied.
    fn apply_index(&mut self, index: u8) {
        let index = u16::from(index);
        let base = self.effective_address;
        self.uncorrected_address = (base & 0xFF00) | (base.wrapping_add(index) & 0x00FF);
        self.effective_address = base.wrapping_add(index);
    }

    fn skip_fixup_within_page(&mut self) {
        if self.effective_address == self.uncorrected_address {
            self.skip_slot();
        }
    }

    fn take_branch<B: Bus>(&mut self, bus: &mut B) {
        bus.read(self.regs.pc);

        let offset = i16::from(self.data as i8);
        let target = self.regs.pc.wrapping_add_signed(offset);
        self.uncorrected_address = (self.regs.pc & 0xFF00) | (target & 0x00FF);
        self.effective_address = target;

        if self.effective_address == self.uncorrected_address {
            self.skip_slot();
            self.branch_adjust = -1;
            self.defer_interrupt_for_branch();
        }

        self.regs.pc = target;
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let address = self.regs.push();
        bus.write(address, value);
    }

    fn load_a<B: Bus>(&mut self, bus: &mut B, value: u8) {
        self.regs.a = value;
        self.regs.p.set_nz(value);
        self.finish(bus);
    }

    fn set_flag_and_finish<B: Bus>(&mut self, bus: &mut B, flag: u8, on: bool) {
        self.regs.p.set(flag, on);
        self.finish(bus);
    }

    /// First write of a read-modify-write: the unmodified value goes back.
    fn write_back<B: Bus>(&mut self, bus: &mut B) {
        bus.write(self.effective_address, self.data);
    }

    fn store<B: Bus>(&mut self, bus: &mut B, value: u8) {
        self.data = value;
        bus.write(self.effective_address, value);
    }

    fn high_byte_plus_one(&self) -> u8 {
        ((self.effective_address >> 8) as u8).wrapping_add(1)
    }

    /// SHA/SHS/SHX/SHY: on a page cross the stored value also replaces the
    /// high byte of the target address.
    fn store_unstable<B: Bus>(&mut self, bus: &mut B, value: u8) {
        if self.uncorrected_address != self.effective_address {
            self.effective_address = (u16::from(value) << 8) | (self.effective_address & 0x00FF);
        }
        self.store(bus, value);
    }
}
