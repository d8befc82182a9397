#![doc = r#"
Bus module: region-composed address spaces shared by the CPU and PPU cores.

Overview
- A `MemoryBus` is one flat address space of a configured size (64 KiB for the
  CPU, 16 KiB for the PPU). It is assembled once through `BusBuilder` and its
  layout is immutable afterwards.
- Storage lives in named byte regions. A region can be placed at several
  offsets, which is how hardware mirroring is expressed (2 KiB of work RAM
  repeated across $0000-$1FFF, four nametable windows over 2 KiB of CIRAM).
- Cartridge placements do not index their region directly; the owning
  `Mapper` translates each address into an offset of the PRG or CHR image.
- Hooks intercept a window of addresses before storage is consulted and hand
  the access to an `IoPort` owned elsewhere (PPU registers, OAM DMA trigger).

Access order
1. Addresses at or beyond the bus size fail with `AddressOutOfRange`.
2. A hook covering the address receives the access.
3. A placement covering the address resolves it to a region byte.
4. Anything else is open bus: reads return the last value driven on the bus,
   writes are dropped.

Modules
- interfaces: `Bus` (CPU-facing) and `IoPort` (hook capability) traits.
- cpu_interface: the CPU memory map.
- ppu_space: the PPU memory map (CHR, nametable mirroring, palette aliasing).
- ppu_registers: `IoPort` implementation for the PPU register window.
- dma: OAM DMA trigger latch, stall length and transfer.
- clock: master clock that keeps CPU cycles and PPU dots in ratio.
"#]

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{BusKind, EmuError};
use crate::mapper::Mapper;

pub mod clock;
pub mod cpu_interface;
pub mod dma;
pub mod interfaces;
pub mod ppu_registers;
pub mod ppu_space;

#[cfg(test)]
mod tests;

pub use clock::MasterClock;
pub use cpu_interface::build_cpu_bus;
pub use dma::{DmaController, OAM_DMA_REGISTER};
pub use interfaces::{Bus, IoPort};
pub use ppu_space::build_ppu_bus;

/// Index of a region inside its bus.
pub type RegionId = usize;

/// Which cartridge image a placement translates into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartSpace {
    Prg,
    Chr,
}

struct Region {
    name: &'static str,
    data: Vec<u8>,
    writable: bool,
}

enum Target {
    /// `region[base + (addr - start) % span]`
    Storage {
        region: RegionId,
        base: usize,
        span: usize,
    },
    /// Offset supplied by the mapper.
    Cartridge {
        region: RegionId,
        space: CartSpace,
        mapper: Rc<dyn Mapper>,
    },
}

struct Placement {
    start: u32,
    end: u32,
    target: Target,
}

struct Hook {
    start: u32,
    end: u32,
    stride: u32,
    port: Rc<RefCell<dyn IoPort>>,
}

// ------------------------------------------------------------------------------------------------
// Builder
// ------------------------------------------------------------------------------------------------

/// Collects regions, placements and hooks, then freezes them into a `MemoryBus`.
pub struct BusBuilder {
    kind: BusKind,
    size: u32,
    regions: Vec<Region>,
    placements: Vec<Placement>,
    hooks: Vec<Hook>,
}

impl BusBuilder {
    pub fn new(kind: BusKind, size: u32) -> Self {
        Self {
            kind,
            size,
            regions: Vec::new(),
            placements: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Register a backing byte array. It is not addressable until placed.
    pub fn region(&mut self, name: &'static str, data: Vec<u8>, writable: bool) -> RegionId {
        self.regions.push(Region {
            name,
            data,
            writable,
        });
        self.regions.len() - 1
    }

    /// Place a whole region at `start`, repeating it if `len` exceeds the region size.
    pub fn map(&mut self, region: RegionId, start: u32, len: u32) -> Result<&mut Self, EmuError> {
        let span = self.region_len(region)?;
        self.map_slice(region, start, len, 0, span)
    }

    /// Place `region[base..base + span]` at `start`, repeating it across `len` bytes.
    pub fn map_slice(
        &mut self,
        region: RegionId,
        start: u32,
        len: u32,
        base: usize,
        span: usize,
    ) -> Result<&mut Self, EmuError> {
        let region_len = self.region_len(region)?;
        if span == 0 || base.checked_add(span).is_none_or(|end| end > region_len) {
            return Err(EmuError::BusLayout(format!(
                "slice {base:#X}+{span:#X} outside region '{}' of {region_len:#X} bytes",
                self.regions[region].name
            )));
        }
        self.place(start, len, Target::Storage { region, base, span })
    }

    /// Register `region` at every multiple of its size inside `[start, start + window)`.
    pub fn map_mirrored(
        &mut self,
        region: RegionId,
        start: u32,
        window: u32,
    ) -> Result<&mut Self, EmuError> {
        let len = self.region_len(region)? as u32;
        if len == 0 || window % len != 0 {
            return Err(EmuError::BusLayout(format!(
                "window {window:#X} is not a multiple of region '{}' ({len:#X} bytes)",
                self.regions[region].name
            )));
        }
        let end = start.checked_add(window).ok_or_else(|| {
            EmuError::BusLayout(format!("window {start:#X}+{window:#X} overflows the bus"))
        })?;
        let mut at = start;
        while at < end {
            self.map(region, at, len)?;
            at += len;
        }
        Ok(self)
    }

    /// Place a cartridge image whose offsets are resolved by `mapper`.
    pub fn map_cartridge(
        &mut self,
        region: RegionId,
        start: u32,
        len: u32,
        space: CartSpace,
        mapper: Rc<dyn Mapper>,
    ) -> Result<&mut Self, EmuError> {
        self.region_len(region)?;
        self.place(
            start,
            len,
            Target::Cartridge {
                region,
                space,
                mapper,
            },
        )
    }

    /// Route `[start, end)` to `port`; the port index is `(addr - start) % stride`.
    pub fn hook(
        &mut self,
        start: u32,
        end: u32,
        stride: u32,
        port: Rc<RefCell<dyn IoPort>>,
    ) -> Result<&mut Self, EmuError> {
        if start >= end || end > self.size || stride == 0 {
            return Err(EmuError::BusLayout(format!(
                "hook {start:#06X}..{end:#06X} (stride {stride}) does not fit a {}-byte bus",
                self.size
            )));
        }
        if self.hooks.iter().any(|h| start < h.end && h.start < end) {
            return Err(EmuError::BusLayout(format!(
                "hook {start:#06X}..{end:#06X} overlaps an existing hook"
            )));
        }
        self.hooks.push(Hook {
            start,
            end,
            stride,
            port,
        });
        Ok(self)
    }

    pub fn build(self) -> MemoryBus {
        MemoryBus {
            kind: self.kind,
            size: self.size,
            regions: self.regions,
            placements: self.placements,
            hooks: self.hooks,
            open_bus: 0,
        }
    }

    fn region_len(&self, region: RegionId) -> Result<usize, EmuError> {
        self.regions
            .get(region)
            .map(|r| r.data.len())
            .ok_or_else(|| EmuError::BusLayout(format!("unknown region id {region}")))
    }

    fn place(&mut self, start: u32, len: u32, target: Target) -> Result<&mut Self, EmuError> {
        let end = start.checked_add(len).filter(|&end| len != 0 && end <= self.size);
        let Some(end) = end else {
            return Err(EmuError::BusLayout(format!(
                "placement {start:#06X}+{len:#X} does not fit a {:#X}-byte bus",
                self.size
            )));
        };
        if self.placements.iter().any(|p| start < p.end && p.start < end) {
            return Err(EmuError::BusLayout(format!(
                "placement {start:#06X}..{end:#06X} overlaps an existing placement"
            )));
        }
        let at = self.placements.partition_point(|p| p.start < start);
        self.placements.insert(at, Placement { start, end, target });
        Ok(self)
    }
}

// ------------------------------------------------------------------------------------------------
// MemoryBus
// ------------------------------------------------------------------------------------------------

/// An assembled address space.
pub struct MemoryBus {
    kind: BusKind,
    size: u32,
    regions: Vec<Region>,
    placements: Vec<Placement>,
    hooks: Vec<Hook>,
    open_bus: u8,
}

impl fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let regions: Vec<_> = self.regions.iter().map(|r| (r.name, r.data.len())).collect();
        f.debug_struct("MemoryBus")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("regions", &regions)
            .field("placements", &self.placements.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl MemoryBus {
    #[inline]
    pub fn kind(&self) -> BusKind {
        self.kind
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Fallible read honoring hooks, placements and open bus.
    pub fn read(&mut self, addr: u16) -> Result<u8, EmuError> {
        let a = self.check(addr)?;
        let value = if let Some((hook, port)) = self.hook_at(a) {
            hook.port.borrow_mut().read_port(port)?
        } else {
            match self.resolve(a)? {
                Some((region, index)) => self.regions[region].data[index],
                None => self.open_bus,
            }
        };
        self.open_bus = value;
        Ok(value)
    }

    /// Fallible write; read-only and unmapped storage drop the value.
    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), EmuError> {
        let a = self.check(addr)?;
        self.open_bus = value;
        if let Some((hook, port)) = self.hook_at(a) {
            return hook.port.borrow_mut().write_port(port, value);
        }
        if let Some((region, index)) = self.resolve(a)? {
            let region = &mut self.regions[region];
            if region.writable {
                region.data[index] = value;
            }
        }
        Ok(())
    }

    /// Read without side effects, for introspection.
    pub fn peek(&self, addr: u16) -> Result<u8, EmuError> {
        let a = self.check(addr)?;
        if let Some((hook, port)) = self.hook_at(a) {
            return Ok(hook.port.borrow().peek_port(port));
        }
        Ok(match self.resolve(a)? {
            Some((region, index)) => self.regions[region].data[index],
            None => self.open_bus,
        })
    }

    /// Raw contents of a region.
    pub fn region(&self, id: RegionId) -> Option<&[u8]> {
        self.regions.get(id).map(|r| r.data.as_slice())
    }

    /// Raw contents of the first region registered under `name`.
    pub fn region_named(&self, name: &str) -> Option<&[u8]> {
        self.regions.iter().find(|r| r.name == name).map(|r| r.data.as_slice())
    }

    #[inline]
    fn check(&self, addr: u16) -> Result<u32, EmuError> {
        let a = addr as u32;
        if a >= self.size {
            return Err(EmuError::AddressOutOfRange {
                bus: self.kind,
                address: a,
                size: self.size,
            });
        }
        Ok(a)
    }

    #[inline]
    fn hook_at(&self, a: u32) -> Option<(&Hook, u16)> {
        self.hooks
            .iter()
            .find(|h| a >= h.start && a < h.end)
            .map(|h| (h, ((a - h.start) % h.stride) as u16))
    }

    #[inline]
    fn placement_at(&self, a: u32) -> Option<&Placement> {
        let i = self.placements.partition_point(|p| p.start <= a);
        if i == 0 {
            return None;
        }
        let p = &self.placements[i - 1];
        (a < p.end).then_some(p)
    }

    fn resolve(&self, a: u32) -> Result<Option<(RegionId, usize)>, EmuError> {
        let Some(p) = self.placement_at(a) else {
            return Ok(None);
        };
        match &p.target {
            Target::Storage { region, base, span } => {
                Ok(Some((*region, base + (a - p.start) as usize % span)))
            }
            Target::Cartridge {
                region,
                space,
                mapper,
            } => {
                let offset = match space {
                    CartSpace::Prg => mapper.map_cpu(a as u16),
                    CartSpace::Chr => mapper.map_ppu(a as u16),
                };
                match offset {
                    Some(o) if o < self.regions[*region].data.len() => Ok(Some((*region, o))),
                    _ => Err(EmuError::AddressOutOfRange {
                        bus: self.kind,
                        address: a,
                        size: self.size,
                    }),
                }
            }
        }
    }
}

impl Bus for MemoryBus {
    #[inline]
    fn read(&mut self, addr: u16) -> Result<u8, EmuError> {
        MemoryBus::read(self, addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmuError> {
        MemoryBus::write(self, addr, value)
    }
}
