/*!
dispatch - one fetch/decode/execute step, routed by mnemonic tag.

Step sequence
=============
1. `addressing::fetch` reads the instruction and advances PC past it.
2. `addressing::resolve` computes the operand (value source / effective address).
3. Base cycles come from the table row; one more is charged when the row has
   `page_penalty` and resolution crossed a page.
4. The mnemonic selects a family module; the family returns any extra
   cycles it incurred (branches).

Families
========
- load_store:   LDA LDX LDY STA STX STY
- arithmetic:   ADC SBC
- logical:      AND ORA EOR BIT
- compare:      CMP CPX CPY
- branches:     BCC BCS BEQ BMI BNE BPL BVC BVS
- rmw:          ASL LSR ROL ROR INC DEC
- control_flow: JMP JSR RTS RTI BRK (+ hardware interrupt entry)
- misc:         transfers, stack, flag set/clear, register INC/DEC, NOP

A family that receives a mnemonic or mode it does not implement returns
`EmuError::UndefinedEncoding`; there is no silent fall-through.
*/

mod arithmetic;
mod branches;
mod compare;
pub(crate) mod control_flow;
mod load_store;
mod logical;
mod misc;
mod rmw;

use crate::bus::Bus;
use crate::cpu::addressing::{self, DecodedInstruction, Operand};
use crate::cpu::state::CpuState;
use crate::cpu::table::Mnemonic;
use crate::error::EmuError;

/// What a completed step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepInfo {
    pub decoded: DecodedInstruction,
    pub cycles: u32,
}

pub(crate) fn step<B: Bus + ?Sized>(cpu: &mut CpuState, bus: &mut B) -> Result<StepInfo, EmuError> {
    let decoded = addressing::fetch(cpu, bus)?;
    let operand = addressing::resolve(&decoded, cpu, bus)?;
    let ins = decoded.instruction;

    let mut cycles = ins.cycles as u32;
    if ins.page_penalty && operand.page_crossed {
        cycles += 1;
    }
    cycles += execute(ins.mnemonic, &operand, cpu, bus)?;
    Ok(StepInfo { decoded, cycles })
}

fn execute<B: Bus + ?Sized>(
    m: Mnemonic,
    op: &Operand,
    cpu: &mut CpuState,
    bus: &mut B,
) -> Result<u32, EmuError> {
    use Mnemonic::*;
    match m {
        Lda | Ldx | Ldy | Sta | Stx | Sty => load_store::execute(m, op, cpu, bus),
        Adc | Sbc => arithmetic::execute(m, op, cpu, bus),
        And | Ora | Eor | Bit => logical::execute(m, op, cpu, bus),
        Cmp | Cpx | Cpy => compare::execute(m, op, cpu, bus),
        Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs => branches::execute(m, op, cpu),
        Asl | Lsr | Rol | Ror | Inc | Dec => rmw::execute(m, op, cpu, bus),
        Jmp | Jsr | Rts | Rti | Brk => control_flow::execute(m, op, cpu, bus),
        Tax | Tay | Tsx | Txa | Txs | Tya | Pha | Php | Pla | Plp | Clc | Cld | Cli | Clv | Sec
        | Sed | Sei | Inx | Iny | Dex | Dey | Nop => misc::execute(m, op, cpu, bus),
    }
}
