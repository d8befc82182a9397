/*!
OAM DMA: page-select latch and transfer.

Behavioral model
- A CPU write to $4014 latches the source page through the bus hook. Nothing
  else happens inside the instruction that performed the write.
- At the instruction boundary the orchestrator takes the latch, copies
  `$XX00-$XXFF` from CPU space into PPU OAM through OAMDATA semantics
  (starting at the current OAMADDR, wrapping), and charges the CPU a stall of
  513 cycles, or 514 when the transfer starts on an odd CPU cycle.
- Source reads go through the normal bus path, so a page inside the PPU
  register window has the same side effects a CPU read would.
- The stall is a returned cycle count; the PPU keeps running through it.
*/

use log::debug;

use crate::bus::{Bus, IoPort};
use crate::error::EmuError;

pub const OAM_DMA_REGISTER: u16 = 0x4014;
pub const OAM_DMA_BYTES: usize = 256;
/// One dummy/alignment cycle plus 256 read/write pairs.
pub const OAM_DMA_BASE_STALL: u32 = 513;

/// Receives DMA bytes exactly as if each were written to OAMDATA ($2004).
pub trait OamWriter {
    fn write_oam_data(&mut self, value: u8);
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DmaController {
    pending: Option<u8>,
    transfers: u64,
}

impl DmaController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Source page latched by the last $4014 write, consuming it.
    #[inline]
    pub fn take_pending(&mut self) -> Option<u8> {
        self.pending.take()
    }

    /// Completed transfers since power-on.
    #[inline]
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    /// CPU cycles the transfer blocks when it begins on `cpu_cycle`.
    #[inline]
    pub fn stall_cycles(cpu_cycle: u64) -> u32 {
        OAM_DMA_BASE_STALL + (cpu_cycle & 1) as u32
    }

    /// Read the 256-byte source page through `bus`.
    pub fn read_page<B: Bus + ?Sized>(
        bus: &mut B,
        page: u8,
    ) -> Result<[u8; OAM_DMA_BYTES], EmuError> {
        let base = (page as u16) << 8;
        let mut data = [0u8; OAM_DMA_BYTES];
        for (i, slot) in data.iter_mut().enumerate() {
            *slot = bus.read(base | i as u16)?;
        }
        Ok(data)
    }

    /// Push a page read by `read_page` into OAM and account for the transfer.
    pub fn deliver<W: OamWriter + ?Sized>(
        &mut self,
        page: u8,
        data: &[u8; OAM_DMA_BYTES],
        oam: &mut W,
    ) {
        for &byte in data {
            oam.write_oam_data(byte);
        }
        self.transfers += 1;
        debug!("OAM DMA from ${page:02X}00 (transfer #{})", self.transfers);
    }
}

impl IoPort for DmaController {
    /// $4014 is write-only.
    fn read_port(&mut self, _port: u16) -> Result<u8, EmuError> {
        Ok(0)
    }

    fn write_port(&mut self, _port: u16, value: u8) -> Result<(), EmuError> {
        self.pending = Some(value);
        Ok(())
    }

    fn peek_port(&self, _port: u16) -> u8 {
        self.pending.unwrap_or(0)
    }
}
