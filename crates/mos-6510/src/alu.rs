//! Arithmetic shared by the documented and undocumented opcodes.
//!
//! Decimal mode follows NMOS behaviour: ADC takes Z from the binary sum and
//! N/V from the half-adjusted high nibble; SBC takes every flag from the
//! binary difference and only adjusts A.

use crate::Mos6510;
use crate::flags::{C, D, N, V, Z};

impl Mos6510 {
    pub(crate) fn add_with_carry(&mut self, value: u8) {
        let a = i32::from(self.regs.a);
        let s = i32::from(value);
        let carry = i32::from(self.regs.p.carry());
        let sum = a + s + carry;

        if self.regs.p.contains(D) {
            let mut lo = (a & 0x0F) + (s & 0x0F) + carry;
            let mut hi = (a & 0xF0) + (s & 0xF0);
            if lo > 0x09 {
                lo += 0x06;
            }
            if lo > 0x0F {
                hi += 0x10;
            }
            let p = &mut self.regs.p;
            p.set(Z, sum & 0xFF == 0);
            p.set(N, hi & 0x80 != 0);
            p.set(V, (hi ^ a) & 0x80 != 0 && (a ^ s) & 0x80 == 0);
            if hi > 0x90 {
                hi += 0x60;
            }
            p.set(C, hi > 0xFF);
            self.regs.a = ((hi & 0xF0) | (lo & 0x0F)) as u8;
        } else {
            let p = &mut self.regs.p;
            p.set(C, sum > 0xFF);
            p.set(V, (sum ^ a) & 0x80 != 0 && (a ^ s) & 0x80 == 0);
            self.regs.a = sum as u8;
            self.regs.p.set_nz(self.regs.a);
        }
    }

    pub(crate) fn subtract_with_borrow(&mut self, value: u8) {
        let a = i32::from(self.regs.a);
        let s = i32::from(value);
        let borrow = i32::from(self.regs.p.carry() ^ 1);
        let difference = (a - s - borrow) & 0xFFFF;

        let p = &mut self.regs.p;
        p.set(C, difference < 0x100);
        p.set(V, (difference ^ a) & 0x80 != 0 && (a ^ s) & 0x80 != 0);
        p.set_nz(difference as u8);

        if self.regs.p.contains(D) {
            let mut lo = (a & 0x0F) - (s & 0x0F) - borrow;
            let mut hi = (a & 0xF0) - (s & 0xF0);
            if lo & 0x10 != 0 {
                lo -= 0x06;
                hi -= 0x10;
            }
            if hi & 0x100 != 0 {
                hi -= 0x60;
            }
            self.regs.a = ((hi & 0xF0) | (lo & 0x0F)) as u8;
        } else {
            self.regs.a = difference as u8;
        }
    }

    /// CMP/CPX/CPY and the compare half of DCP.
    pub(crate) fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set_nz(register.wrapping_sub(value));
        self.regs.p.set(C, register >= value);
    }

    /// AND with the operand, then rotate right through carry, with its own
    /// decimal-mode fix-ups.
    pub(crate) fn and_rotate_right(&mut self, value: u8) {
        let data = value & self.regs.a;
        let mut a = data >> 1;
        if self.regs.p.contains(C) {
            a |= 0x80;
        }

        if self.regs.p.contains(D) {
            let data = u32::from(data);
            let p = &mut self.regs.p;
            p.set(N, p.contains(C));
            p.set(Z, a == 0);
            p.set(V, (data ^ u32::from(a)) & 0x40 != 0);
            if (data & 0x0F) + (data & 0x01) > 5 {
                a = (a & 0xF0) | (a.wrapping_add(6) & 0x0F);
            }
            let carry = ((data + (data & 0x10)) & 0x1F0) > 0x50;
            p.set(C, carry);
            if carry {
                a = a.wrapping_add(0x60);
            }
            self.regs.a = a;
        } else {
            self.regs.a = a;
            let p = &mut self.regs.p;
            p.set_nz(a);
            p.set(C, a & 0x40 != 0);
            p.set(V, ((a & 0x40) ^ ((a & 0x20) << 1)) != 0);
        }
    }

    /// Shift the data latch left, carry out of bit 7.
    pub(crate) fn shift_left(&mut self, value: u8) -> u8 {
        self.regs.p.set(C, value & 0x80 != 0);
        value << 1
    }

    pub(crate) fn shift_right(&mut self, value: u8) -> u8 {
        self.regs.p.set(C, value & 0x01 != 0);
        value >> 1
    }

    pub(crate) fn rotate_left(&mut self, value: u8) -> u8 {
        let carry_in = self.regs.p.carry();
        self.regs.p.set(C, value & 0x80 != 0);
        (value << 1) | carry_in
    }

    pub(crate) fn rotate_right(&mut self, value: u8) -> u8 {
        let carry_in = self.regs.p.carry() << 7;
        self.regs.p.set(C, value & 0x01 != 0);
        (value >> 1) | carry_in
    }
}
