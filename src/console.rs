/*!
Console: the clock orchestrator that owns one emulation session.

Wiring
- The mapper is chosen once from the cartridge image, then shared by both
  buses. The PPU owns its own bus; the CPU bus reaches the PPU register window
  and the $4014 DMA latch through `IoPort` hooks.
- Nothing is global: two `Console` values are two independent machines.

Step model
- `step` is one instruction boundary: either the service of an NMI requested
  during the previous step, or one CPU instruction. The cycles it reports are
  converted to PPU dots by the `MasterClock`, and those dots run before `step`
  returns, so register side effects of the next instruction always observe a
  PPU that is caught up.
- An OAM DMA latched by the instruction runs right after it: the page is read
  through the CPU bus, written into OAM, and the stall (513/514 cycles) is
  charged to the same step with the PPU running through it.
- The PPU is never borrowed across `Cpu::step`; PPU register accesses borrow
  it through the bus hook for the duration of one access.

Faults
- The first error from any step is latched. The session stops there: every
  later call returns the same error without touching machine state.
*/

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use log::{debug, error, info};

use crate::bus::{DmaController, MasterClock, MemoryBus, build_cpu_bus, build_ppu_bus};
use crate::cartridge::CartridgeImage;
use crate::config::{EmulatorConfig, Region};
use crate::cpu::Cpu;
use crate::error::EmuError;
use crate::mapper::mapper_for;
use crate::ppu::{PixelSink, Ppu, PpuSnapshot};

pub struct Console {
    region: Region,
    cpu: Cpu,
    bus: MemoryBus,
    ppu: Rc<RefCell<Ppu>>,
    dma: Rc<RefCell<DmaController>>,
    clock: MasterClock,
    nmi_pending: bool,
    frame_ready: bool,
    fault: Option<EmuError>,
}

impl Console {
    /// Load `image` and wire a powered-off machine. Call `reset` before stepping.
    pub fn new(image: CartridgeImage, config: &EmulatorConfig) -> Result<Self, EmuError> {
        let region = config.region;
        let mapper = mapper_for(&image)?;
        let CartridgeImage { prg_rom, chr_rom, .. } = image;

        let ppu_bus = build_ppu_bus(chr_rom, mapper.clone())?;
        let ppu = Rc::new(RefCell::new(Ppu::new(region, ppu_bus)));
        let dma = Rc::new(RefCell::new(DmaController::new()));
        let bus = build_cpu_bus(prg_rom, mapper, ppu.clone(), dma.clone())?;

        info!("console ready ({region:?})");
        Ok(Self {
            region,
            cpu: Cpu::new(),
            bus,
            ppu,
            dma,
            clock: MasterClock::new(region),
            nmi_pending: false,
            frame_ready: false,
            fault: None,
        })
    }

    /// Reset line: CPU reloads the reset vector, PPU and clock restart.
    /// Memory contents survive. Returns the cycles the reset sequence took.
    pub fn reset(&mut self, sink: &mut dyn PixelSink) -> Result<u32, EmuError> {
        self.guard(|c| {
            c.ppu.borrow_mut().reset();
            c.clock.reset();
            c.nmi_pending = false;
            c.frame_ready = false;
            let cycles = c.cpu.reset(&mut c.bus)?;
            c.run_ppu(cycles, sink)?;
            info!("reset: PC=${:04X}", c.cpu.pc());
            Ok(cycles)
        })
    }

    /// Advance one instruction boundary; returns the CPU cycles consumed,
    /// including any DMA stall.
    pub fn step(&mut self, sink: &mut dyn PixelSink) -> Result<u32, EmuError> {
        self.guard(|c| c.step_inner(sink))
    }

    /// Step until the PPU enters vblank; returns the CPU cycles consumed.
    pub fn run_frame(&mut self, sink: &mut dyn PixelSink) -> Result<u64, EmuError> {
        let mut total = 0u64;
        loop {
            total += self.step(sink)? as u64;
            if std::mem::take(&mut self.frame_ready) {
                return Ok(total);
            }
        }
    }

    // -----------------------------
    // Introspection
    // -----------------------------

    #[inline]
    pub fn region(&self) -> Region {
        self.region
    }

    #[inline]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Borrow the PPU. Do not hold the guard across `step`.
    pub fn ppu(&self) -> Ref<'_, Ppu> {
        self.ppu.borrow()
    }

    pub fn ppu_snapshot(&self) -> PpuSnapshot {
        self.ppu.borrow().snapshot()
    }

    /// Side-effect free read of CPU address space.
    pub fn peek(&self, addr: u16) -> Result<u8, EmuError> {
        self.bus.peek(addr)
    }

    #[inline]
    pub fn master_cycles(&self) -> u64 {
        self.clock.master_cycles()
    }

    /// CPU cycles since reset, DMA stalls included.
    #[inline]
    pub fn cpu_cycles(&self) -> u64 {
        self.clock.cpu_cycles()
    }

    #[inline]
    pub fn dma_transfers(&self) -> u64 {
        self.dma.borrow().transfers()
    }

    /// The latched fault, if the session has stopped.
    #[inline]
    pub fn fault(&self) -> Option<&EmuError> {
        self.fault.as_ref()
    }

    // -----------------------------
    // Internals
    // -----------------------------

    fn guard<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, EmuError>,
    ) -> Result<T, EmuError> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        f(self).inspect_err(|err| {
            error!("session halted at PC=${:04X}: {err}", self.cpu.pc());
            self.fault = Some(err.clone());
        })
    }

    fn step_inner(&mut self, sink: &mut dyn PixelSink) -> Result<u32, EmuError> {
        if std::mem::take(&mut self.nmi_pending) {
            let cycles = self.cpu.nmi(&mut self.bus)?;
            self.run_ppu(cycles, sink)?;
            return Ok(cycles);
        }

        let mut cycles = self.cpu.step(&mut self.bus)?;
        self.run_ppu(cycles, sink)?;

        let pending = self.dma.borrow_mut().take_pending();
        if let Some(page) = pending {
            let stall = DmaController::stall_cycles(self.clock.cpu_cycles());
            let data = DmaController::read_page(&mut self.bus, page)?;
            self.dma
                .borrow_mut()
                .deliver(page, &data, &mut *self.ppu.borrow_mut());
            self.run_ppu(stall, sink)?;
            cycles += stall;
        }
        Ok(cycles)
    }

    /// Run the PPU dots that `cycles` CPU cycles make due and collect its latches.
    fn run_ppu(&mut self, cycles: u32, sink: &mut dyn PixelSink) -> Result<(), EmuError> {
        let dots = self.clock.advance_cpu(cycles);
        let mut ppu = self.ppu.borrow_mut();
        for _ in 0..dots {
            ppu.tick(sink)?;
        }
        if ppu.take_nmi() {
            debug!("NMI requested at scanline {} dot {}", ppu.scanline(), ppu.dot());
            self.nmi_pending = true;
        }
        if ppu.take_frame_complete() {
            self.frame_ready = true;
        }
        Ok(())
    }
}
