/*!
core.rs - `Cpu` facade over `CpuState` and the dispatcher.

Entry points
============
- `step`  - execute one instruction, returning the cycles it consumed.
- `reset` - reinitialize registers and reload PC from the reset vector.
- `nmi`   - service a non-maskable interrupt (current PC pushed, B clear).
- `irq`   - service a maskable interrupt unless I is set.

The orchestrator calls `nmi`/`irq` only between instructions, so every
register mutation inside an instruction is atomic from the outside.

Introspection
=============
`state()` exposes the register file, `total_cycles()` the cycle count since
power-on, `instructions()` the number of executed instructions.
*/

use log::{Level, debug, log_enabled, trace};

use crate::bus::Bus;
use crate::cpu::dispatch::{self, control_flow};
use crate::cpu::state::{CpuState, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR, Status};
use crate::error::EmuError;

/// Cycles spent by the reset sequence.
pub const RESET_CYCLES: u32 = 7;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cpu {
    state: CpuState,
    cycles: u64,
    instructions: u64,
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> &CpuState {
        &self.state
    }

    /// Mutable register access for loaders and tests.
    #[inline]
    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    #[inline]
    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    #[inline]
    pub fn total_cycles(&self) -> u64 {
        self.cycles
    }

    #[inline]
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    pub fn reset<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u32, EmuError> {
        self.state = CpuState::default();
        self.state.pc = bus.read_word(RESET_VECTOR)?;
        self.cycles += RESET_CYCLES as u64;
        debug!("CPU reset, PC=${:04X}", self.state.pc);
        Ok(RESET_CYCLES)
    }

    pub fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u32, EmuError> {
        let before = self.state;
        let info = dispatch::step(&mut self.state, bus)?;
        if log_enabled!(Level::Trace) {
            trace!(
                "{:04X}  {:<14} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
                info.decoded.pc,
                info.decoded.to_string(),
                before.a,
                before.x,
                before.y,
                before.status.bits(),
                before.sp,
                self.cycles
            );
        }
        self.cycles += info.cycles as u64;
        self.instructions += 1;
        Ok(info.cycles)
    }

    pub fn nmi<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u32, EmuError> {
        let pc = self.state.pc;
        control_flow::interrupt(&mut self.state, bus, NMI_VECTOR, pc, false)?;
        debug!("NMI from ${pc:04X} -> ${:04X}", self.state.pc);
        self.cycles += control_flow::INTERRUPT_CYCLES as u64;
        Ok(control_flow::INTERRUPT_CYCLES)
    }

    /// Returns 0 when masked.
    pub fn irq<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u32, EmuError> {
        if self.state.flag(Status::IRQ_DISABLE) {
            return Ok(0);
        }
        let pc = self.state.pc;
        control_flow::interrupt(&mut self.state, bus, IRQ_VECTOR, pc, false)?;
        self.cycles += control_flow::INTERRUPT_CYCLES as u64;
        Ok(control_flow::INTERRUPT_CYCLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FlatBus, setup_cpu};

    #[test]
    fn reset_loads_vector_and_reinitializes_registers() {
        let mut bus = FlatBus::new();
        bus.mem[0xFFFC] = 0x34;
        bus.mem[0xFFFD] = 0x12;
        let mut cpu = Cpu::new();
        cpu.state_mut().a = 0x55;
        cpu.state_mut().sp = 0x10;
        assert_eq!(cpu.reset(&mut bus).unwrap(), 7);
        assert_eq!(cpu.pc(), 0x1234);
        assert_eq!(cpu.state().a, 0);
        assert_eq!(cpu.state().sp, 0xFD);
        assert_eq!(u8::from(cpu.state().status), 0x24);
    }

    #[test]
    fn nmi_pushes_current_pc_with_break_clear() {
        let (mut cpu, mut bus) = setup_cpu(&[0xEA]);
        bus.mem[0xFFFA] = 0x00;
        bus.mem[0xFFFB] = 0xC0;
        assert_eq!(cpu.nmi(&mut bus).unwrap(), 7);
        assert_eq!(cpu.pc(), 0xC000);
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x00);
        assert_eq!(bus.mem[0x01FB] & 0x10, 0);
        assert_eq!(bus.mem[0x01FB] & 0x20, 0x20);
        assert!(cpu.state().flag(Status::IRQ_DISABLE));
    }

    #[test]
    fn nmi_then_rti_resumes_interrupted_instruction() {
        // $8000: NOP ; handler at $8100: RTI
        let mut prg = vec![0xEA; 0x200];
        prg[0x100] = 0x40;
        let (mut cpu, mut bus) = setup_cpu(&prg);
        bus.mem[0xFFFA] = 0x00;
        bus.mem[0xFFFB] = 0x81;
        cpu.step(&mut bus).unwrap();
        let before = *cpu.state();
        cpu.nmi(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(*cpu.state(), before);
    }

    #[test]
    fn irq_respects_interrupt_disable() {
        // CLI
        let (mut cpu, mut bus) = setup_cpu(&[0x58]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;
        assert_eq!(cpu.irq(&mut bus).unwrap(), 0);
        assert_eq!(cpu.pc(), 0x8000);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.irq(&mut bus).unwrap(), 7);
        assert_eq!(cpu.pc(), 0x9000);
        // Pushed copy has B clear, unlike BRK.
        assert_eq!(bus.mem[0x01FB], 0x20);
    }

    #[test]
    fn counters_accumulate() {
        let (mut cpu, mut bus) = setup_cpu(&[0xEA, 0xA9, 0x01]);
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.instructions(), 2);
        assert_eq!(cpu.total_cycles(), 4);
    }

    #[test]
    fn undefined_opcode_propagates() {
        let (mut cpu, mut bus) = setup_cpu(&[0xFF]);
        let err = cpu.step(&mut bus).unwrap_err();
        assert_eq!(err, EmuError::UndefinedOpcode { opcode: 0xFF, pc: 0x8000 });
        assert_eq!(cpu.instructions(), 0);
    }
}
