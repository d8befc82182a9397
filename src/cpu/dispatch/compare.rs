/*!
compare.rs - CMP / CPX / CPY

C = register >= operand, Z/N from the 8-bit difference. Registers are not
modified.
*/

use crate::bus::Bus;
use crate::cpu::addressing::Operand;
use crate::cpu::execute::compare;
use crate::cpu::state::CpuState;
use crate::cpu::table::Mnemonic;
use crate::error::EmuError;

pub(super) fn execute<B: Bus + ?Sized>(
    m: Mnemonic,
    op: &Operand,
    cpu: &mut CpuState,
    bus: &mut B,
) -> Result<u32, EmuError> {
    let reg = match m {
        Mnemonic::Cmp => cpu.a,
        Mnemonic::Cpx => cpu.x,
        Mnemonic::Cpy => cpu.y,
        _ => return Err(op.undefined()),
    };
    let v = op.read(cpu, bus)?;
    compare(cpu, reg, v);
    Ok(0)
}
