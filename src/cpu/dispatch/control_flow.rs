/*!
control_flow.rs - JMP / JSR / RTS / RTI / BRK and hardware interrupt entry

  JMP abs   (0x4C)
  JMP (ind) (0x6C)  page-wrap pointer quirk resolved by addressing
  JSR abs   (0x20)
  RTS       (0x60)
  RTI       (0x40)
  BRK       (0x00)

Behavior Details
================
- PC already points past the instruction; every opcode here assigns PC
  directly.
- JSR pushes (next PC - 1), high byte first; RTS pulls and adds 1.
- BRK pushes PC + 1 (the padding byte after the opcode is skipped), then
  status with B set, sets I and loads the IRQ/BRK vector.
- RTI pulls status (B dropped, bit 5 forced), then PCL, then PCH.
- `interrupt` is the shared push/vector sequence. NMI and IRQ enter through
  it with the current PC and B clear.
*/

use crate::bus::Bus;
use crate::cpu::addressing::Operand;
use crate::cpu::state::{CpuState, IRQ_VECTOR, Status};
use crate::cpu::table::Mnemonic;
use crate::error::EmuError;

/// Cycles taken by the hardware interrupt sequence.
pub(crate) const INTERRUPT_CYCLES: u32 = 7;

/// Push `return_pc` and status, set I, and jump through `vector`.
pub(crate) fn interrupt<B: Bus + ?Sized>(
    cpu: &mut CpuState,
    bus: &mut B,
    vector: u16,
    return_pc: u16,
    set_break: bool,
) -> Result<(), EmuError> {
    cpu.push_word(bus, return_pc)?;
    let status = cpu.status_for_push(set_break);
    cpu.push(bus, status)?;
    cpu.set_flag(Status::IRQ_DISABLE, true);
    cpu.pc = bus.read_word(vector)?;
    Ok(())
}

#[inline]
fn op_jsr<B: Bus + ?Sized>(cpu: &mut CpuState, bus: &mut B, target: u16) -> Result<(), EmuError> {
    let ret = cpu.pc.wrapping_sub(1);
    cpu.push_word(bus, ret)?;
    cpu.pc = target;
    Ok(())
}

#[inline]
fn op_rts<B: Bus + ?Sized>(cpu: &mut CpuState, bus: &mut B) -> Result<(), EmuError> {
    cpu.pc = cpu.pop_word(bus)?.wrapping_add(1);
    Ok(())
}

#[inline]
fn op_rti<B: Bus + ?Sized>(cpu: &mut CpuState, bus: &mut B) -> Result<(), EmuError> {
    let status = cpu.pop(bus)?;
    cpu.restore_status(status);
    cpu.pc = cpu.pop_word(bus)?;
    Ok(())
}

pub(super) fn execute<B: Bus + ?Sized>(
    m: Mnemonic,
    op: &Operand,
    cpu: &mut CpuState,
    bus: &mut B,
) -> Result<u32, EmuError> {
    match m {
        Mnemonic::Jmp => cpu.pc = op.require_address()?,
        Mnemonic::Jsr => op_jsr(cpu, bus, op.require_address()?)?,
        Mnemonic::Rts => op_rts(cpu, bus)?,
        Mnemonic::Rti => op_rti(cpu, bus)?,
        Mnemonic::Brk => {
            let ret = cpu.pc.wrapping_add(1);
            interrupt(cpu, bus, IRQ_VECTOR, ret, true)?;
        }
        _ => return Err(op.undefined()),
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use crate::cpu::state::Status;
    use crate::test_utils::setup_cpu;

    #[test]
    fn jsr_then_rts_returns_after_call_and_restores_sp() {
        // $8000: JSR $8010 ; $8003: NOP ; $8010: RTS
        let mut prg = vec![0xEA; 0x20];
        prg[0..3].copy_from_slice(&[0x20, 0x10, 0x80]);
        prg[0x10] = 0x60;
        let (mut cpu, mut bus) = setup_cpu(&prg);
        let sp = cpu.state().sp;

        assert_eq!(cpu.step(&mut bus).unwrap(), 6);
        assert_eq!(cpu.state().pc, 0x8010);
        assert_eq!(cpu.state().sp, sp.wrapping_sub(2));
        // Return address on the stack is the last byte of the JSR.
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x02);

        assert_eq!(cpu.step(&mut bus).unwrap(), 6);
        assert_eq!(cpu.state().pc, 0x8003);
        assert_eq!(cpu.state().sp, sp);
    }

    #[test]
    fn jmp_absolute_and_indirect() {
        // JMP $8006 ; (pad) ; $8006: JMP ($0300)
        let (mut cpu, mut bus) = setup_cpu(&[0x4C, 0x06, 0x80, 0xEA, 0xEA, 0xEA, 0x6C, 0x00, 0x03]);
        bus.mem[0x0300] = 0x34;
        bus.mem[0x0301] = 0x12;
        assert_eq!(cpu.step(&mut bus).unwrap(), 3);
        assert_eq!(cpu.state().pc, 0x8006);
        assert_eq!(cpu.step(&mut bus).unwrap(), 5);
        assert_eq!(cpu.state().pc, 0x1234);
    }

    #[test]
    fn brk_then_rti_restores_pc_and_status() {
        // $8000: SEC ; $8001: BRK ; $8002: (padding) ; $8003: NOP
        // handler at $9000: RTI
        let mut prg = vec![0xEA; 0x2000];
        prg[0] = 0x38;
        prg[1] = 0x00;
        prg[0x1000] = 0x40;
        let (mut cpu, mut bus) = setup_cpu(&prg);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;

        cpu.step(&mut bus).unwrap();
        let before = *cpu.state();
        assert_eq!(before.pc, 0x8001);

        assert_eq!(cpu.step(&mut bus).unwrap(), 7);
        let s = cpu.state();
        assert_eq!(s.pc, 0x9000);
        assert!(s.flag(Status::IRQ_DISABLE));
        // Pushed status carries B.
        assert_eq!(bus.mem[0x01FB], u8::from(before.status) | 0x10);
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x03);

        assert_eq!(cpu.step(&mut bus).unwrap(), 6);
        let after = *cpu.state();
        assert_eq!(after.pc, 0x8003);
        assert_eq!(after.status, before.status);
        assert_eq!(u8::from(after.status), u8::from(before.status));
        assert_eq!(after.sp, before.sp);
    }

    #[test]
    fn rti_ignores_pulled_break_bit() {
        let (mut cpu, mut bus) = setup_cpu(&[0x40]);
        cpu.state_mut().sp = 0xFA;
        bus.mem[0x01FB] = 0xFF;
        bus.mem[0x01FC] = 0x00;
        bus.mem[0x01FD] = 0x90;
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.state().pc, 0x9000);
        assert!(!cpu.state().flag(Status::BREAK));
        assert!(cpu.state().flag(Status::UNUSED));
    }
}
