/*!
branches.rs - conditional relative branches

| opcode | mnemonic | taken when |
|--------|----------|------------|
| 0x10   | BPL      | N clear    |
| 0x30   | BMI      | N set      |
| 0x50   | BVC      | V clear    |
| 0x70   | BVS      | V set      |
| 0x90   | BCC      | C clear    |
| 0xB0   | BCS      | C set      |
| 0xD0   | BNE      | Z clear    |
| 0xF0   | BEQ      | Z set      |

Cycles: 2 base, +1 when taken, +1 more when the target lies on a different
page than the instruction that follows the branch.
*/

use crate::cpu::addressing::Operand;
use crate::cpu::state::{CpuState, Status};
use crate::cpu::table::Mnemonic;
use crate::error::EmuError;

pub(super) fn execute(m: Mnemonic, op: &Operand, cpu: &mut CpuState) -> Result<u32, EmuError> {
    let taken = match m {
        Mnemonic::Bpl => !cpu.flag(Status::NEGATIVE),
        Mnemonic::Bmi => cpu.flag(Status::NEGATIVE),
        Mnemonic::Bvc => !cpu.flag(Status::OVERFLOW),
        Mnemonic::Bvs => cpu.flag(Status::OVERFLOW),
        Mnemonic::Bcc => !cpu.flag(Status::CARRY),
        Mnemonic::Bcs => cpu.flag(Status::CARRY),
        Mnemonic::Bne => !cpu.flag(Status::ZERO),
        Mnemonic::Beq => cpu.flag(Status::ZERO),
        _ => return Err(op.undefined()),
    };
    if !taken {
        return Ok(0);
    }
    cpu.pc = op.require_address()?;
    Ok(1 + op.page_crossed as u32)
}
