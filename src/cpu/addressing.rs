/*!
addressing.rs - instruction fetch and operand resolution for the 13 addressing modes.

Overview
========
A step runs in three stages:

1. `fetch` reads the opcode, looks it up in the instruction table, reads the
   operand bytes and advances PC past the whole instruction. An opcode with
   no table entry is `EmuError::UndefinedOpcode`.
2. `resolve` turns the raw operand bytes into an `Operand`: an immediate
   value, the accumulator, nothing (implicit), or an effective address, and
   records whether indexing crossed a page.
3. Family handlers ask the operand for its value (`Operand::read`) or store
   through it (`Operand::write`). Values are read lazily so stores never
   touch their target before writing, which matters for side-effecting
   registers.

PC convention
=============
PC already points at the next instruction when a handler runs. Relative
branch targets are computed from that PC; JMP/JSR/RTS/RTI/BRK assign PC
outright. Nothing adjusts PC after a handler returns.

Quirks reproduced
=================
- Zero-page indexed modes and zero-page pointers wrap inside page $00.
- JMP ($xxFF) fetches the high byte from $xx00 rather than the next page.
*/

use crate::bus::Bus;
use crate::cpu::state::CpuState;
use crate::cpu::table::{self, AddrMode, Instruction, Mnemonic};
use crate::error::EmuError;

/// A fetched instruction: table entry plus its concrete operand bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Address of the opcode byte.
    pub pc: u16,
    pub instruction: &'static Instruction,
    operand: [u8; 2],
}

impl DecodedInstruction {
    pub fn new(pc: u16, instruction: &'static Instruction, operand: [u8; 2]) -> Self {
        Self {
            pc,
            instruction,
            operand,
        }
    }

    /// Operand bytes exactly as they appear in memory (0, 1 or 2 bytes).
    #[inline]
    pub fn operand_bytes(&self) -> &[u8] {
        &self.operand[..self.instruction.len() as usize - 1]
    }

    #[inline]
    pub fn byte(&self) -> u8 {
        self.operand[0]
    }

    #[inline]
    pub fn word(&self) -> u16 {
        u16::from_le_bytes(self.operand)
    }

    /// Opcode followed by operand bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.instruction.len() as usize);
        bytes.push(self.instruction.opcode);
        bytes.extend_from_slice(self.operand_bytes());
        bytes
    }

    /// Address of the following instruction.
    #[inline]
    pub fn next_pc(&self) -> u16 {
        self.pc.wrapping_add(self.instruction.len() as u16)
    }
}

/// Where an instruction's operand lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Implied,
    Accumulator,
    Immediate(u8),
    Memory(u16),
}

/// Resolved operand: `(value, effective address)` source for the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operand {
    pub target: Target,
    pub page_crossed: bool,
    mnemonic: Mnemonic,
    mode: AddrMode,
}

impl Operand {
    #[inline]
    pub fn address(&self) -> Option<u16> {
        match self.target {
            Target::Memory(addr) => Some(addr),
            _ => None,
        }
    }

    /// Effective address, for handlers that cannot work without one.
    #[inline]
    pub fn require_address(&self) -> Result<u16, EmuError> {
        self.address().ok_or_else(|| self.undefined())
    }

    pub fn read<B: Bus + ?Sized>(&self, cpu: &CpuState, bus: &mut B) -> Result<u8, EmuError> {
        match self.target {
            Target::Immediate(v) => Ok(v),
            Target::Accumulator => Ok(cpu.a),
            Target::Memory(addr) => bus.read(addr),
            Target::Implied => Err(self.undefined()),
        }
    }

    pub fn write<B: Bus + ?Sized>(
        &self,
        cpu: &mut CpuState,
        bus: &mut B,
        value: u8,
    ) -> Result<(), EmuError> {
        match self.target {
            Target::Accumulator => {
                cpu.a = value;
                Ok(())
            }
            Target::Memory(addr) => bus.write(addr, value),
            Target::Immediate(_) | Target::Implied => Err(self.undefined()),
        }
    }

    /// The handler was given a mode the instruction has no meaning for.
    #[inline]
    pub fn undefined(&self) -> EmuError {
        EmuError::UndefinedEncoding {
            mnemonic: self.mnemonic,
            mode: self.mode,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Fetch
// ------------------------------------------------------------------------------------------------

/// Read the instruction at PC and advance PC past it.
pub fn fetch<B: Bus + ?Sized>(
    cpu: &mut CpuState,
    bus: &mut B,
) -> Result<DecodedInstruction, EmuError> {
    let pc = cpu.pc;
    let opcode = bus.read(pc)?;
    let instruction = table::decode(opcode).ok_or(EmuError::UndefinedOpcode { opcode, pc })?;
    let mut operand = [0u8; 2];
    for (i, slot) in operand
        .iter_mut()
        .take(instruction.len() as usize - 1)
        .enumerate()
    {
        *slot = bus.read(pc.wrapping_add(1 + i as u16))?;
    }
    cpu.pc = pc.wrapping_add(instruction.len() as u16);
    Ok(DecodedInstruction::new(pc, instruction, operand))
}

// ------------------------------------------------------------------------------------------------
// Resolve
// ------------------------------------------------------------------------------------------------

#[inline]
fn crosses_page(base: u16, effective: u16) -> bool {
    (base & 0xFF00) != (effective & 0xFF00)
}

/// Little-endian pointer from zero page, wrapping $FF -> $00.
#[inline]
pub fn read_word_zp<B: Bus + ?Sized>(bus: &mut B, zp: u8) -> Result<u16, EmuError> {
    let lo = bus.read(zp as u16)? as u16;
    let hi = bus.read(zp.wrapping_add(1) as u16)? as u16;
    Ok((hi << 8) | lo)
}

/// Pointer fetch for JMP (indirect), including the page-wrap bug.
#[inline]
pub fn read_word_indirect_bug<B: Bus + ?Sized>(bus: &mut B, ptr: u16) -> Result<u16, EmuError> {
    let lo = bus.read(ptr)? as u16;
    let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
    let hi = bus.read(hi_addr)? as u16;
    Ok((hi << 8) | lo)
}

/// Compute the operand for a decoded instruction. `cpu.pc` must already point past it.
pub fn resolve<B: Bus + ?Sized>(
    decoded: &DecodedInstruction,
    cpu: &CpuState,
    bus: &mut B,
) -> Result<Operand, EmuError> {
    let mode = decoded.instruction.mode;
    let mut page_crossed = false;
    let target = match mode {
        AddrMode::Implicit => Target::Implied,
        AddrMode::Accumulator => Target::Accumulator,
        AddrMode::Immediate => Target::Immediate(decoded.byte()),
        AddrMode::ZeroPage => Target::Memory(decoded.byte() as u16),
        AddrMode::ZeroPageX => Target::Memory(decoded.byte().wrapping_add(cpu.x) as u16),
        AddrMode::ZeroPageY => Target::Memory(decoded.byte().wrapping_add(cpu.y) as u16),
        AddrMode::Relative => {
            let offset = decoded.byte() as i8;
            let target = cpu.pc.wrapping_add(offset as u16);
            page_crossed = crosses_page(cpu.pc, target);
            Target::Memory(target)
        }
        AddrMode::Absolute => Target::Memory(decoded.word()),
        AddrMode::AbsoluteX | AddrMode::AbsoluteY => {
            let index = if mode == AddrMode::AbsoluteX { cpu.x } else { cpu.y };
            let base = decoded.word();
            let addr = base.wrapping_add(index as u16);
            page_crossed = crosses_page(base, addr);
            Target::Memory(addr)
        }
        AddrMode::Indirect => Target::Memory(read_word_indirect_bug(bus, decoded.word())?),
        AddrMode::IndirectX => {
            let zp = decoded.byte().wrapping_add(cpu.x);
            Target::Memory(read_word_zp(bus, zp)?)
        }
        AddrMode::IndirectY => {
            let base = read_word_zp(bus, decoded.byte())?;
            let addr = base.wrapping_add(cpu.y as u16);
            page_crossed = crosses_page(base, addr);
            Target::Memory(addr)
        }
    };
    Ok(Operand {
        target,
        page_crossed,
        mnemonic: decoded.instruction.mnemonic,
        mode,
    })
}
