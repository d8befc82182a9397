#![doc = r#"
PPU register window on the CPU bus

Purpose
- Connect $2000-$3FFF to the PPU. The CPU bus hooks the window with stride 8,
  so `port` is already the register index 0..=7 and mirrors need no decoding
  here.
- Register semantics (status clear, write toggle, buffered PPUDATA, OAMDATA)
  live on `Ppu` itself; this module only adapts them to `IoPort`.
"#]

use crate::bus::IoPort;
use crate::error::EmuError;
use crate::ppu::Ppu;

impl IoPort for Ppu {
    #[inline]
    fn read_port(&mut self, port: u16) -> Result<u8, EmuError> {
        self.read_register(port & 7)
    }

    #[inline]
    fn write_port(&mut self, port: u16, value: u8) -> Result<(), EmuError> {
        self.write_register(port & 7, value)
    }

    fn peek_port(&self, port: u16) -> u8 {
        self.peek_register(port & 7)
    }
}
