/*!
state.rs - 6502 architectural state (registers + flags) and stack helpers.

Overview
========
`CpuState` owns every architecturally visible register. It excludes bus
wiring, decode and timing, which live in the dispatch and core layers.

Status register bit layout
==========================
```text
Bit: 7 6 5 4 3 2 1 0
     N V 1 B D I Z C
```

`Status` is a `bitflags` type over that byte and converts losslessly in both
directions. The live register keeps UNUSED set and BREAK clear; BREAK only
exists in copies pushed by PHP and BRK.

Stack
=====
The stack lives in page $01. Push writes at `$0100 | SP` then decrements SP;
pop increments SP then reads. SP wraps modulo 256, so the page never changes.
*/

use bitflags::bitflags;

use crate::bus::Bus;
use crate::error::EmuError;

bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        const CARRY = 1;
        const ZERO = 1 << 1;
        const IRQ_DISABLE = 1 << 2;
        const DECIMAL = 1 << 3;
        const BREAK = 1 << 4;
        const UNUSED = 1 << 5;
        const OVERFLOW = 1 << 6;
        const NEGATIVE = 1 << 7;
    }
}

impl From<u8> for Status {
    #[inline]
    fn from(byte: u8) -> Self {
        Status::from_bits_retain(byte)
    }
}

impl From<Status> for u8 {
    #[inline]
    fn from(status: Status) -> Self {
        status.bits()
    }
}

pub const STACK_PAGE: u16 = 0x0100;
pub const POWER_ON_SP: u8 = 0xFD;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: Status,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: POWER_ON_SP,
            pc: 0,
            status: Status::IRQ_DISABLE | Status::UNUSED,
        }
    }
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    #[inline]
    pub fn flag(&self, flag: Status) -> bool {
        self.status.contains(flag)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Status, on: bool) {
        self.status.set(flag, on);
    }

    /// Z from the value being zero, N from bit 7.
    #[inline]
    pub fn update_zn(&mut self, value: u8) {
        self.status.set(Status::ZERO, value == 0);
        self.status.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    /// Copy of the status byte as PHP/BRK (B set) or IRQ/NMI (B clear) push it.
    #[inline]
    pub fn status_for_push(&self, set_break: bool) -> u8 {
        let mut s = self.status | Status::UNUSED;
        s.set(Status::BREAK, set_break);
        s.bits()
    }

    /// Load a status byte pulled by PLP/RTI: B is discarded, UNUSED forced.
    #[inline]
    pub fn restore_status(&mut self, byte: u8) {
        self.status = (Status::from(byte) | Status::UNUSED) - Status::BREAK;
    }

    // ------------------------------------------------------------------
    // Stack
    // ------------------------------------------------------------------

    #[inline]
    pub fn stack_addr(&self) -> u16 {
        STACK_PAGE | self.sp as u16
    }

    pub fn push<B: Bus + ?Sized>(&mut self, bus: &mut B, value: u8) -> Result<(), EmuError> {
        bus.write(self.stack_addr(), value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    pub fn pop<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u8, EmuError> {
        self.sp = self.sp.wrapping_add(1);
        bus.read(self.stack_addr())
    }

    /// High byte first, so the word sits little-endian in memory.
    pub fn push_word<B: Bus + ?Sized>(&mut self, bus: &mut B, value: u16) -> Result<(), EmuError> {
        self.push(bus, (value >> 8) as u8)?;
        self.push(bus, value as u8)
    }

    pub fn pop_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u16, EmuError> {
        let lo = self.pop(bus)? as u16;
        let hi = self.pop(bus)? as u16;
        Ok((hi << 8) | lo)
    }
}
