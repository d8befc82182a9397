/*!
arithmetic.rs - ADC / SBC opcode family

ADC: 0x69, 0x65, 0x75, 0x6D, 0x7D*, 0x79*, 0x61, 0x71*
SBC: 0xE9, 0xE5, 0xF5, 0xED, 0xFD*, 0xF9*, 0xE1, 0xF1*

(*) page-cross capable; the penalty is applied by the dispatcher from the
table row, not here.
*/

use crate::bus::Bus;
use crate::cpu::addressing::Operand;
use crate::cpu::execute::{adc, sbc};
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
        Mnemonic::Adc => adc(cpu, v),
        Mnemonic::Sbc => sbc(cpu, v),
        _ => return Err(op.undefined()),
    }
    Ok(0)
}
