/*!
load_store.rs - LDA / LDX / LDY / STA / STX / STY

Loads set Z/N from the loaded value. Stores write through the effective
address without reading it first and leave flags alone.
*/

use crate::bus::Bus;
use crate::cpu::addressing::Operand;
use crate::cpu::state::CpuState;
use crate::cpu::table::Mnemonic;
use crate::error::EmuError;

pub(super) fn execute<B: Bus + ?Sized>(
    m: Mnemonic,
    op: &Operand,
    cpu: &mut CpuState,
    bus: &mut B,
) -> Result<u32, EmuError> {
    match m {
        Mnemonic::Lda => {
            cpu.a = op.read(cpu, bus)?;
            cpu.update_zn(cpu.a);
        }
        Mnemonic::Ldx => {
            cpu.x = op.read(cpu, bus)?;
            cpu.update_zn(cpu.x);
        }
        Mnemonic::Ldy => {
            cpu.y = op.read(cpu, bus)?;
            cpu.update_zn(cpu.y);
        }
        Mnemonic::Sta => bus.write(op.require_address()?, cpu.a)?,
        Mnemonic::Stx => bus.write(op.require_address()?, cpu.x)?,
        Mnemonic::Sty => bus.write(op.require_address()?, cpu.y)?,
        _ => return Err(op.undefined()),
    }
    Ok(0)
}
