use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::error::ErrorKind;
use crate::mapper::Nrom;
use crate::cartridge::Mirroring;

/// Register file that records accesses and clears bit 7 of register 2 on read.
#[derive(Default)]
struct Latch {
    regs: [u8; 8],
    reads: Vec<u16>,
    writes: Vec<(u16, u8)>,
}

impl IoPort for Latch {
    fn read_port(&mut self, port: u16) -> Result<u8, EmuError> {
        self.reads.push(port);
        let v = self.regs[port as usize];
        if port == 2 {
            self.regs[2] &= 0x7F;
        }
        Ok(v)
    }

    fn write_port(&mut self, port: u16, value: u8) -> Result<(), EmuError> {
        self.writes.push((port, value));
        self.regs[port as usize] = value;
        Ok(())
    }

    fn peek_port(&self, port: u16) -> u8 {
        self.regs[port as usize]
    }
}

fn setup() -> (MemoryBus, Rc<RefCell<Latch>>, Rc<RefCell<DmaController>>) {
    let latch = Rc::new(RefCell::new(Latch::default()));
    let dma = Rc::new(RefCell::new(DmaController::new()));
    let mut prg = vec![0xEA; 0x4000];
    prg[0] = 0xA9;
    prg[0x3FFC] = 0x00;
    prg[0x3FFD] = 0x80;
    let mapper = Rc::new(Nrom::new(prg.len(), 0, Mirroring::Horizontal).unwrap());
    let bus = build_cpu_bus(prg, mapper, latch.clone(), dma.clone()).unwrap();
    (bus, latch, dma)
}

#[test]
fn ram_written_in_lowest_window_is_visible_in_every_mirror() {
    let (mut bus, _, _) = setup();
    for (i, addr) in [0x0000u16, 0x0123, 0x07FF].into_iter().enumerate() {
        let value = 0x40 + i as u8;
        bus.write(addr, value).unwrap();
        for window in 0..4u16 {
            assert_eq!(bus.read(addr + window * 0x0800).unwrap(), value);
        }
    }
    // And writes through a mirror land in the same cell.
    bus.write(0x1800, 0x99).unwrap();
    assert_eq!(bus.read(0x0000).unwrap(), 0x99);
}

#[test]
fn hooks_intercept_every_eighth_byte_of_the_register_window() {
    let (mut bus, latch, _) = setup();
    latch.borrow_mut().regs[2] = 0x80;

    assert_eq!(bus.read(0x3FFA).unwrap(), 0x80);
    assert_eq!(bus.read(0x2002).unwrap(), 0x00);
    bus.write(0x2008 + 6, 0x21).unwrap();

    let latch = latch.borrow();
    assert_eq!(latch.reads, vec![2, 2]);
    assert_eq!(latch.writes, vec![(6, 0x21)]);
}

#[test]
fn peek_has_no_side_effects() {
    let (mut bus, latch, _) = setup();
    latch.borrow_mut().regs[2] = 0x80;
    assert_eq!(bus.peek(0x2002).unwrap(), 0x80);
    assert_eq!(bus.peek(0x2002).unwrap(), 0x80);
    assert!(latch.borrow().reads.is_empty());
    assert_eq!(bus.read(0x2002).unwrap(), 0x80);
}

#[test]
fn dma_register_is_hooked_above_plain_io_storage() {
    let (mut bus, _, dma) = setup();
    bus.write(0x4015, 0x0F).unwrap();
    assert_eq!(bus.read(0x4015).unwrap(), 0x0F);
    bus.write(0x4014, 0x02).unwrap();
    assert_eq!(dma.borrow_mut().take_pending(), Some(0x02));
}

#[test]
fn prg_rom_is_read_only_and_mirrored() {
    let (mut bus, _, _) = setup();
    assert_eq!(bus.read(0x8000).unwrap(), 0xA9);
    assert_eq!(bus.read(0xC000).unwrap(), 0xA9);
    bus.write(0x8000, 0x00).unwrap();
    assert_eq!(bus.read(0x8000).unwrap(), 0xA9);
    assert_eq!(bus.read_word(0xFFFC).unwrap(), 0x8000);
}

#[test]
fn prg_ram_is_writable() {
    let (mut bus, _, _) = setup();
    bus.write(0x6000, 0x12).unwrap();
    bus.write(0x7FFF, 0x34).unwrap();
    assert_eq!(bus.read(0x6000).unwrap(), 0x12);
    assert_eq!(bus.read(0x7FFF).unwrap(), 0x34);
    assert_eq!(bus.region_named("prg_ram").unwrap()[0x1FFF], 0x34);
}

#[test]
fn unmapped_reads_return_last_bus_value() {
    let (mut bus, _, _) = setup();
    bus.write(0x0010, 0x5C).unwrap();
    bus.read(0x0010).unwrap();
    assert_eq!(bus.read(0x5000).unwrap(), 0x5C);
    bus.write(0x5000, 0x77).unwrap();
    assert_eq!(bus.read(0x5000).unwrap(), 0x77);
}

#[test]
fn accesses_beyond_bus_size_fail() {
    let mut b = BusBuilder::new(BusKind::Cpu, 0x0800);
    let ram = b.region("ram", vec![0; 0x800], true);
    b.map(ram, 0, 0x800).unwrap();
    let mut bus = b.build();

    let err = bus.read(0x0800).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AddressOutOfRange);
    assert_eq!(
        err,
        EmuError::AddressOutOfRange {
            bus: BusKind::Cpu,
            address: 0x0800,
            size: 0x0800
        }
    );
    assert!(bus.write(0xFFFF, 1).is_err());
    assert!(bus.peek(0x1000).is_err());
}

#[test]
fn overlapping_or_oversized_layouts_are_rejected() {
    let mut b = BusBuilder::new(BusKind::Cpu, 0x1000);
    let a = b.region("a", vec![0; 0x100], true);
    b.map(a, 0x000, 0x100).unwrap();
    assert!(matches!(b.map(a, 0x080, 0x100), Err(EmuError::BusLayout(_))));
    assert!(matches!(b.map(a, 0xF80, 0x100), Err(EmuError::BusLayout(_))));
    assert!(matches!(b.map_mirrored(a, 0x400, 0x180), Err(EmuError::BusLayout(_))));
    assert!(matches!(b.map_slice(a, 0x800, 0x10, 0xF8, 0x10), Err(EmuError::BusLayout(_))));
}

#[test]
fn layouts_that_overflow_the_address_type_are_rejected() {
    let mut b = BusBuilder::new(BusKind::Cpu, 0x1000);
    let a = b.region("a", vec![0; 0x100], true);
    assert!(matches!(b.map_slice(a, 0xFFFF_FF00, 0x200, 0, 0x100), Err(EmuError::BusLayout(_))));
    assert!(matches!(b.map(a, 0x100, u32::MAX), Err(EmuError::BusLayout(_))));
    assert!(matches!(b.map_mirrored(a, 0xFFFF_FF00, 0x200), Err(EmuError::BusLayout(_))));
    assert!(matches!(b.map_slice(a, 0, 0x10, usize::MAX, 2), Err(EmuError::BusLayout(_))));
    // Nothing was placed by the failed calls.
    b.map(a, 0x000, 0x1000).unwrap();
}

#[test]
fn placements_are_found_regardless_of_registration_order() {
    let mut b = BusBuilder::new(BusKind::Cpu, 0x100);
    let hi = b.region("hi", vec![0xBB; 0x10], false);
    let lo = b.region("lo", vec![0xAA; 0x10], false);
    b.map(hi, 0x80, 0x10).unwrap();
    b.map(lo, 0x00, 0x10).unwrap();
    let mut bus = b.build();
    assert_eq!(bus.read(0x05).unwrap(), 0xAA);
    assert_eq!(bus.read(0x85).unwrap(), 0xBB);
}
