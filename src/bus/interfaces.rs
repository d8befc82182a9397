/*!
interfaces: narrow traits that decouple the cores from concrete bus wiring.

- `Bus` is what the CPU core sees: fallible byte reads/writes plus a
  little-endian word helper. `MemoryBus` implements it; tests may substitute
  anything that does.
- `IoPort` is the capability a register owner hands to the bus. The bus keeps
  it in its hook table and calls it for every access that lands in the hooked
  window, before storage is consulted. `port` is the register index inside the
  window (the address modulo the hook stride).
*/

use crate::error::EmuError;

/// CPU-facing memory interface.
pub trait Bus {
    fn read(&mut self, addr: u16) -> Result<u8, EmuError>;

    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmuError>;

    /// Little-endian 16-bit read of `addr` and `addr + 1` (wrapping at $FFFF).
    #[inline]
    fn read_word(&mut self, addr: u16) -> Result<u16, EmuError> {
        let lo = self.read(addr)? as u16;
        let hi = self.read(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }
}

/// Owner-provided read/write hook for a window of special registers.
pub trait IoPort {
    /// Register read with side effects (status clears, buffered data, ...).
    fn read_port(&mut self, port: u16) -> Result<u8, EmuError>;

    fn write_port(&mut self, port: u16, value: u8) -> Result<(), EmuError>;

    /// Side-effect free view of a register for debuggers.
    fn peek_port(&self, _port: u16) -> u8 {
        0
    }
}
