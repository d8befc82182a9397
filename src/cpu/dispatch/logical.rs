//! logical.rs - AND / ORA / EOR / BIT

use crate::bus::Bus;
use crate::cpu::addressing::Operand;
use crate::cpu::execute::bit;
use crate::cpu::state::CpuState;
use crate::cpu::table::Mnemonic;
use crate::error::EmuError;

pub(super) fn execute<B: Bus + ?Sized>(
    m: Mnemonic,
    op: &Operand,
    cpu: &mut CpuState,
    bus: &mut B,
) -> Result<u32, EmuError> {
    let v = op.read(cpu, bus)?;
    match m {
        Mnemonic::And => cpu.a &= v,
        Mnemonic::Ora => cpu.a |= v,
        Mnemonic::Eor => cpu.a ^= v,
        Mnemonic::Bit => {
            bit(cpu, v);
            return Ok(0);
        }
        _ => return Err(op.undefined()),
    }
    cpu.update_zn(cpu.a);
    Ok(0)
}
