//! famicore runner: loads a raw PRG/CHR pair (or assembles a small built-in
//! demo), runs it for a number of frames and prints the final machine state.
//!
//! Frames are handed to a consumer thread over a bounded channel; the core
//! itself stays on the main thread.

use std::fs;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser, ValueEnum};
use crossbeam::channel::{self, Receiver};
use log::{LevelFilter, Log, Metadata, Record, debug, info};

use famicore::cpu::{AddrMode, Mnemonic, encode};
use famicore::{CartridgeImage, Console, EmulatorConfig, FrameBuffer, Mirroring, Region};

/// Headless famicore runner
#[derive(Parser, Debug)]
#[command(name = "famicore")]
#[command(about = "Run a raw PRG/CHR image on the famicore core", long_about = None)]
struct Args {
    /// Raw PRG image (16 or 32 KiB); the built-in demo runs when omitted
    #[arg(long)]
    prg: Option<PathBuf>,

    /// Raw CHR image; 8 KiB of CHR RAM when omitted
    #[arg(long)]
    chr: Option<PathBuf>,

    /// Mapper number requested by the cartridge
    #[arg(long, default_value_t = 0)]
    mapper: u16,

    /// Nametable mirroring
    #[arg(long, value_enum, default_value_t = MirroringArg::Horizontal)]
    mirroring: MirroringArg,

    /// Video region
    #[arg(long, value_enum, default_value_t = RegionArg::Ntsc)]
    region: RegionArg,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Write the last frame to this PNG file
    #[cfg(feature = "screenshot")]
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Log verbosity (-v info, -vv debug, -vvv per-instruction trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MirroringArg {
    Horizontal,
    Vertical,
}

impl From<MirroringArg> for Mirroring {
    fn from(value: MirroringArg) -> Self {
        match value {
            MirroringArg::Horizontal => Mirroring::Horizontal,
            MirroringArg::Vertical => Mirroring::Vertical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RegionArg {
    Ntsc,
    Pal,
}

impl From<RegionArg> for Region {
    fn from(value: RegionArg) -> Self {
        match value {
            RegionArg::Ntsc => Region::Ntsc,
            RegionArg::Pal => Region::Pal,
        }
    }
}

// -----------------------------
// Logging
// -----------------------------

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbosity: u8) -> Result<()> {
    log::set_logger(&LOGGER).context("installing the stderr logger")?;
    log::set_max_level(match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
    Ok(())
}

// -----------------------------
// Built-in demo
// -----------------------------

const ORIGIN: u16 = 0x8000;
const DEMO_PALETTE_AT: u16 = 0x80C0;
const DEMO_NMI_AT: u16 = 0x80D0;
const DEMO_PALETTE: [u8; 4] = [0x0F, 0x21, 0x11, 0x01];

/// Minimal assembler over the instruction table.
struct Asm {
    origin: u16,
    code: Vec<u8>,
}

impl Asm {
    fn new(origin: u16) -> Self {
        Self { origin, code: Vec::new() }
    }

    fn here(&self) -> u16 {
        self.origin + self.code.len() as u16
    }

    fn op(&mut self, mnemonic: Mnemonic, mode: AddrMode, operand: u16) -> Result<()> {
        let instr = encode(mnemonic, mode)?;
        self.code.push(instr.opcode);
        match instr.len() {
            2 => self.code.push(operand as u8),
            3 => self.code.extend_from_slice(&operand.to_le_bytes()),
            _ => {}
        }
        Ok(())
    }

    fn implied(&mut self, mnemonic: Mnemonic) -> Result<()> {
        self.op(mnemonic, AddrMode::Implicit, 0)
    }

    fn branch(&mut self, mnemonic: Mnemonic, target: u16) -> Result<()> {
        let offset = target as i32 - (self.here() as i32 + 2);
        let Ok(offset) = i8::try_from(offset) else {
            bail!("branch to ${target:04X} out of range");
        };
        self.op(mnemonic, AddrMode::Relative, offset as u8 as u16)
    }
}

/// Checkerboard on the top rows, palette from PRG, NMI-driven horizontal scroll.
fn demo_image(mirroring: Mirroring) -> Result<CartridgeImage> {
    use AddrMode::*;
    use Mnemonic::*;

    let mut a = Asm::new(ORIGIN);
    a.implied(Sei)?;
    a.implied(Cld)?;
    a.op(Ldx, Immediate, 0xFF)?;
    a.implied(Txs)?;
    for _ in 0..2 {
        let wait = a.here();
        a.op(Bit, Absolute, 0x2002)?;
        a.branch(Bpl, wait)?;
    }

    // Palette 0 from the table in PRG.
    a.op(Lda, Immediate, 0x3F)?;
    a.op(Sta, Absolute, 0x2006)?;
    a.op(Lda, Immediate, 0x00)?;
    a.op(Sta, Absolute, 0x2006)?;
    a.op(Ldx, Immediate, 0x00)?;
    let palette = a.here();
    a.op(Lda, AbsoluteX, DEMO_PALETTE_AT)?;
    a.op(Sta, Absolute, 0x2007)?;
    a.implied(Inx)?;
    a.op(Cpx, Immediate, DEMO_PALETTE.len() as u16)?;
    a.branch(Bne, palette)?;

    // Tile 1: solid low plane, written into CHR RAM.
    a.op(Lda, Immediate, 0x00)?;
    a.op(Sta, Absolute, 0x2006)?;
    a.op(Lda, Immediate, 0x10)?;
    a.op(Sta, Absolute, 0x2006)?;
    a.op(Lda, Immediate, 0xFF)?;
    a.op(Ldx, Immediate, 0x08)?;
    let tile = a.here();
    a.op(Sta, Absolute, 0x2007)?;
    a.implied(Dex)?;
    a.branch(Bne, tile)?;

    // Alternate tiles 0/1 over the first 256 nametable bytes.
    a.op(Lda, Immediate, 0x20)?;
    a.op(Sta, Absolute, 0x2006)?;
    a.op(Lda, Immediate, 0x00)?;
    a.op(Sta, Absolute, 0x2006)?;
    a.op(Ldx, Immediate, 0x00)?;
    let fill = a.here();
    a.implied(Txa)?;
    a.op(And, Immediate, 0x01)?;
    a.op(Sta, Absolute, 0x2007)?;
    a.implied(Inx)?;
    a.branch(Bne, fill)?;

    a.op(Lda, Immediate, 0x80)?;
    a.op(Sta, Absolute, 0x2000)?;
    a.op(Lda, Immediate, 0x1E)?;
    a.op(Sta, Absolute, 0x2001)?;
    let idle = a.here();
    a.op(Jmp, Absolute, idle)?;

    if a.here() > DEMO_PALETTE_AT {
        bail!("demo program overruns its palette table");
    }

    let mut nmi = Asm::new(DEMO_NMI_AT);
    nmi.op(Inc, ZeroPage, 0x00)?;
    nmi.op(Lda, ZeroPage, 0x00)?;
    nmi.op(Sta, Absolute, 0x2005)?;
    nmi.op(Lda, Immediate, 0x00)?;
    nmi.op(Sta, Absolute, 0x2005)?;
    nmi.implied(Rti)?;

    let mut prg = vec![0xEA; 0x4000];
    let place = |prg: &mut Vec<u8>, at: u16, bytes: &[u8]| {
        let start = (at - ORIGIN) as usize;
        prg[start..start + bytes.len()].copy_from_slice(bytes);
    };
    place(&mut prg, ORIGIN, &a.code);
    place(&mut prg, DEMO_PALETTE_AT, &DEMO_PALETTE);
    place(&mut prg, DEMO_NMI_AT, &nmi.code);
    // NMI, RESET, IRQ/BRK
    let vectors = [DEMO_NMI_AT, ORIGIN, ORIGIN];
    for (i, v) in vectors.iter().enumerate() {
        let at = prg.len() - 6 + i * 2;
        prg[at..at + 2].copy_from_slice(&v.to_le_bytes());
    }
    Ok(CartridgeImage::new(prg, Vec::new(), 0, mirroring))
}

fn load_image(args: &Args) -> Result<CartridgeImage> {
    let mirroring = args.mirroring.into();
    let Some(prg_path) = &args.prg else {
        info!("no PRG given, running the built-in demo");
        return demo_image(mirroring);
    };
    let prg = fs::read(prg_path)
        .with_context(|| format!("reading PRG image {}", prg_path.display()))?;
    let chr = match &args.chr {
        Some(path) => {
            fs::read(path).with_context(|| format!("reading CHR image {}", path.display()))?
        }
        None => Vec::new(),
    };
    Ok(CartridgeImage::new(prg, chr, args.mapper, mirroring))
}

// -----------------------------
// Frame consumer
// -----------------------------

/// Drain frames until the producer hangs up; returns how many arrived.
fn consume_frames(rx: Receiver<FrameBuffer>, screenshot: Option<PathBuf>) -> Result<u64> {
    #[cfg(not(feature = "screenshot"))]
    let _ = screenshot;
    let mut count = 0u64;
    let mut last = None;
    for frame in rx {
        count += 1;
        debug!("frame {count}: checksum {:016X}", frame.checksum());
        last = Some(frame);
    }
    if let Some(frame) = &last {
        info!("last frame checksum {:016X}", frame.checksum());
        #[cfg(feature = "screenshot")]
        if let Some(path) = screenshot {
            save_png(frame, &path)?;
        }
    }
    Ok(count)
}

#[cfg(feature = "screenshot")]
fn save_png(frame: &FrameBuffer, path: &std::path::Path) -> Result<()> {
    use famicore::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

    let img = image::RgbaImage::from_raw(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, frame.to_rgba())
        .context("frame buffer does not match the screen size")?;
    img.save(path).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = EmulatorConfig::new(args.region.into());
    let image = load_image(&args)?;
    let mut console = Console::new(image, &config).context("loading cartridge")?;

    #[cfg(feature = "screenshot")]
    let screenshot = args.screenshot.clone();
    #[cfg(not(feature = "screenshot"))]
    let screenshot = None;

    let (tx, rx) = channel::bounded::<FrameBuffer>(2);
    let consumer = thread::spawn(move || consume_frames(rx, screenshot));

    let mut frame = FrameBuffer::new();
    console.reset(&mut frame).context("reset")?;
    for n in 0..args.frames {
        let cycles = console
            .run_frame(&mut frame)
            .with_context(|| format!("running frame {n}"))?;
        debug!("frame {n}: {cycles} CPU cycles");
        tx.send(frame.clone()).context("frame consumer hung up")?;
    }
    drop(tx);

    let delivered = consumer
        .join()
        .map_err(|_| anyhow!("frame consumer panicked"))??;

    let region = console.region();
    info!(
        "emulated {:.2}s at {:.2} Hz ({region:?})",
        console.master_cycles() as f64 / region.crystal_hz() as f64,
        region.frame_rate()
    );

    let cpu = console.cpu().state();
    let ppu = console.ppu_snapshot();
    println!("frames: {delivered} ({} CPU cycles)", console.cpu_cycles());
    println!(
        "CPU  A:{:02X} X:{:02X} Y:{:02X} SP:{:02X} PC:{:04X} P:{:02X}",
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.sp,
        cpu.pc,
        cpu.status.bits()
    );
    print!("PPU  line:{} dot:{} frame:{} ", ppu.scanline, ppu.dot, ppu.frame);
    println!(
        "ctrl:{:02X} mask:{:02X} status:{:02X} v:{:04X} t:{:04X} x:{} w:{}",
        ppu.ctrl.bits(),
        ppu.mask.bits(),
        ppu.status.bits(),
        ppu.v.raw(),
        ppu.t.raw(),
        ppu.fine_x,
        ppu.w as u8
    );
    Ok(())
}
