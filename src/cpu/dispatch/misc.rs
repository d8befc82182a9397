/*!
misc.rs - implied-mode housekeeping opcodes

Transfers:  TAX TAY TXA TYA TSX (Z/N updated)   TXS (flags untouched)
Stack:      PHA PHP (B set in the pushed copy)  PLA (Z/N)  PLP (B dropped)
Flags:      CLC SEC CLI SEI CLV CLD SED
Registers:  INX INY DEX DEY
NOP
*/

use crate::bus::Bus;
use crate::cpu::addressing::Operand;
use crate::cpu::state::{CpuState, Status};
use crate::cpu::table::Mnemonic;
use crate::error::EmuError;

pub(super) fn execute<B: Bus + ?Sized>(
    m: Mnemonic,
    op: &Operand,
    cpu: &mut CpuState,
    bus: &mut B,
) -> Result<u32, EmuError> {
    use Mnemonic::*;
    match m {
        Tax => {
            cpu.x = cpu.a;
            cpu.update_zn(cpu.x);
        }
        Tay => {
            cpu.y = cpu.a;
            cpu.update_zn(cpu.y);
        }
        Txa => {
            cpu.a = cpu.x;
            cpu.update_zn(cpu.a);
        }
        Tya => {
            cpu.a = cpu.y;
            cpu.update_zn(cpu.a);
        }
        Tsx => {
            cpu.x = cpu.sp;
            cpu.update_zn(cpu.x);
        }
        Txs => cpu.sp = cpu.x,

        Pha => cpu.push(bus, cpu.a)?,
        Php => {
            let status = cpu.status_for_push(true);
            cpu.push(bus, status)?;
        }
        Pla => {
            cpu.a = cpu.pop(bus)?;
            cpu.update_zn(cpu.a);
        }
        Plp => {
            let status = cpu.pop(bus)?;
            cpu.restore_status(status);
        }

        Clc => cpu.set_flag(Status::CARRY, false),
        Sec => cpu.set_flag(Status::CARRY, true),
        Cli => cpu.set_flag(Status::IRQ_DISABLE, false),
        Sei => cpu.set_flag(Status::IRQ_DISABLE, true),
        Clv => cpu.set_flag(Status::OVERFLOW, false),
        Cld => cpu.set_flag(Status::DECIMAL, false),
        Sed => cpu.set_flag(Status::DECIMAL, true),

        Inx => {
            cpu.x = cpu.x.wrapping_add(1);
            cpu.update_zn(cpu.x);
        }
        Iny => {
            cpu.y = cpu.y.wrapping_add(1);
            cpu.update_zn(cpu.y);
        }
        Dex => {
            cpu.x = cpu.x.wrapping_sub(1);
            cpu.update_zn(cpu.x);
        }
        Dey => {
            cpu.y = cpu.y.wrapping_sub(1);
            cpu.update_zn(cpu.y);
        }

        Nop => {}
        _ => return Err(op.undefined()),
    }
    Ok(0)
}
