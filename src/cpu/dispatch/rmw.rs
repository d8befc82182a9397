/*!
rmw.rs - ASL / LSR / ROL / ROR / INC / DEC

Accumulator forms operate on A. Memory forms follow the read-modify-write
bus choreography of the real part:

  read original -> write original back (dummy) -> write modified

The dummy write is observable on side-effecting registers, so it is kept.
Cycle costs are fixed by the table (indexed RMW always pays the extra cycle).
*/

use crate::bus::Bus;
use crate::cpu::addressing::{Operand, Target};
use crate::cpu::execute::{asl, lsr, rol, ror};
use crate::cpu::state::CpuState;
use crate::cpu::table::Mnemonic;
use crate::error::EmuError;

fn modify(m: Mnemonic, op: &Operand, cpu: &mut CpuState, v: u8) -> Result<u8, EmuError> {
    Ok(match m {
        Mnemonic::Asl => asl(cpu, v),
        Mnemonic::Lsr => lsr(cpu, v),
        Mnemonic::Rol => rol(cpu, v),
        Mnemonic::Ror => ror(cpu, v),
        Mnemonic::Inc => {
            let r = v.wrapping_add(1);
            cpu.update_zn(r);
            r
        }
        Mnemonic::Dec => {
            let r = v.wrapping_sub(1);
            cpu.update_zn(r);
            r
        }
        _ => return Err(op.undefined()),
    })
}

pub(super) fn execute<B: Bus + ?Sized>(
    m: Mnemonic,
    op: &Operand,
    cpu: &mut CpuState,
    bus: &mut B,
) -> Result<u32, EmuError> {
    match op.target {
        Target::Accumulator => {
            let v = cpu.a;
            cpu.a = modify(m, op, cpu, v)?;
        }
        Target::Memory(addr) => {
            let v = bus.read(addr)?;
            bus.write(addr, v)?;
            let r = modify(m, op, cpu, v)?;
            bus.write(addr, r)?;
        }
        Target::Immediate(_) | Target::Implied => return Err(op.undefined()),
    }
    Ok(0)
}
