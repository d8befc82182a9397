/*!
execute.rs - 6502 ALU and flag semantics shared by the dispatch families.

The arithmetic core is `add_with_carry`, a pure function returning the
8-bit result with carry and overflow. SBC is ADC of the one's complement
(`a + !m + c`), which gives the borrow-as-inverted-carry convention and the
canonical overflow rule for free: V is set when both addends share a sign
and the result's sign differs.

Decimal mode is ignored; the 2A03 has no BCD adder.
*/

use crate::cpu::state::{CpuState, Status};

/// Outcome of an 8-bit add.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub carry: bool,
    pub overflow: bool,
}

#[inline]
pub fn add_with_carry(a: u8, m: u8, carry_in: bool) -> AluResult {
    let sum = a as u16 + m as u16 + carry_in as u16;
    let value = sum as u8;
    AluResult {
        value,
        carry: sum > 0xFF,
        overflow: (!(a ^ m) & (a ^ value) & 0x80) != 0,
    }
}

#[inline]
pub fn subtract_with_borrow(a: u8, m: u8, carry_in: bool) -> AluResult {
    add_with_carry(a, !m, carry_in)
}

#[inline]
fn apply(cpu: &mut CpuState, r: AluResult) {
    cpu.a = r.value;
    cpu.set_flag(Status::CARRY, r.carry);
    cpu.set_flag(Status::OVERFLOW, r.overflow);
    cpu.update_zn(r.value);
}

pub fn adc(cpu: &mut CpuState, m: u8) {
    let r = add_with_carry(cpu.a, m, cpu.flag(Status::CARRY));
    apply(cpu, r);
}

pub fn sbc(cpu: &mut CpuState, m: u8) {
    let r = subtract_with_borrow(cpu.a, m, cpu.flag(Status::CARRY));
    apply(cpu, r);
}

/// CMP/CPX/CPY: C = reg >= m, Z/N from reg - m.
#[inline]
pub fn compare(cpu: &mut CpuState, reg: u8, m: u8) {
    cpu.set_flag(Status::CARRY, reg >= m);
    cpu.update_zn(reg.wrapping_sub(m));
}

/// BIT: Z from A & m, N and V copied from bits 7 and 6 of m.
#[inline]
pub fn bit(cpu: &mut CpuState, m: u8) {
    cpu.set_flag(Status::ZERO, cpu.a & m == 0);
    cpu.set_flag(Status::NEGATIVE, m & 0x80 != 0);
    cpu.set_flag(Status::OVERFLOW, m & 0x40 != 0);
}

// ------------------------------------------------------------------
// Shifts and rotates: return the new value, set C from the bit shifted out.
// ------------------------------------------------------------------

pub fn asl(cpu: &mut CpuState, v: u8) -> u8 {
    cpu.set_flag(Status::CARRY, v & 0x80 != 0);
    let r = v << 1;
    cpu.update_zn(r);
    r
}

pub fn lsr(cpu: &mut CpuState, v: u8) -> u8 {
    cpu.set_flag(Status::CARRY, v & 0x01 != 0);
    let r = v >> 1;
    cpu.update_zn(r);
    r
}

pub fn rol(cpu: &mut CpuState, v: u8) -> u8 {
    let carry_in = cpu.flag(Status::CARRY) as u8;
    cpu.set_flag(Status::CARRY, v & 0x80 != 0);
    let r = (v << 1) | carry_in;
    cpu.update_zn(r);
    r
}

pub fn ror(cpu: &mut CpuState, v: u8) -> u8 {
    let carry_in = (cpu.flag(Status::CARRY) as u8) << 7;
    cpu.set_flag(Status::CARRY, v & 0x01 != 0);
    let r = (v >> 1) | carry_in;
    cpu.update_zn(r);
    r
}
