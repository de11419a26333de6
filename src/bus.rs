//! System bus for the Dragon 32
//!
//! 65,536 cells, each tagged `Ram`, `Rom`, or `Io(DeviceId)`. CPU accesses
//! and peripheral re-entrant accesses all pass through [`Bus::read`] /
//! [`Bus::write`]; there is no separate port space.
//!
//! Memory map:
//! ```text
//! 0x0000-0x7FFF  32 KiB RAM
//! 0x8000-0xFEFF  BASIC + DOS + cartridge ROM
//! 0xFF00-0xFF03  PIA0
//! 0xFF20-0xFF23  PIA1
//! 0xFF40-0xFF48  WD2797 + drive control
//! 0xFFC0-0xFFDF  SAM control toggles
//! 0xFFF0-0xFFFF  interrupt vectors (in ROM)
//! ```

use crate::peripherals::Peripherals;

/// Which device a [`CellTag::Io`] cell forwards to. A closed sum type
/// instead of a stored handler pointer, per the slotted-table design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceId {
    Pia0,
    Pia1,
    Disk,
    Sam,
    Tape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellTag {
    Ram,
    Rom,
    Io(DeviceId),
}

/// Access kind passed to the I/O trace hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// Read-only view of CPU state, handed to I/O handlers (the tape trap in
/// particular needs `s` to pull a byte off the hardware stack) so they can
/// introspect without the bus owning a reference to the CPU.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuView {
    pub pc: u16,
    pub last_pc: u16,
    pub s: u16,
}

pub struct Bus {
    data: Box<[u8; 0x10000]>,
    tags: Box<[CellTag; 0x10000]>,
    pub peripherals: Peripherals,

    /// Set by the executive/machine before each `step()` so I/O handlers
    /// (notably the tape trap) can read CPU state without the bus owning
    /// a reference to the CPU.
    pub cpu_view: CpuView,

    /// Zero-overhead-when-unset I/O trace hook, invoked for every
    /// `Io`-tagged access.
    pub on_io: Option<fn(u16, AccessKind, u8)>,

    last_exception: Option<String>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; 0x10000]),
            tags: Box::new([CellTag::Ram; 0x10000]),
            peripherals: Peripherals::new(),
            cpu_view: CpuView::default(),
            on_io: None,
            last_exception: None,
        }
    }

    /// Copy `bytes` into RAM starting at `base`, irrespective of the
    /// current tag at those addresses.
    pub fn load(&mut self, base: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            let addr = base.wrapping_add(i as u16);
            self.data[addr as usize] = b;
        }
    }

    /// Mark `[lo, hi]` inclusive read-only. Must be called after `load`.
    /// Addresses already carved out for I/O (PIA/disk/SAM windows inside
    /// the BASIC/DOS ROM range) are left untouched.
    pub fn define_rom(&mut self, lo: u16, hi: u16) {
        for addr in lo..=hi {
            if !matches!(self.tags[addr as usize], CellTag::Io(_)) {
                self.tags[addr as usize] = CellTag::Rom;
            }
        }
    }

    /// Route `[lo, hi]` inclusive through `device`. A later call over an
    /// already-`Io` range replaces the previous handler (last-writer-wins).
    pub fn define_io(&mut self, lo: u16, hi: u16, device: DeviceId) {
        for addr in lo..=hi {
            self.tags[addr as usize] = CellTag::Io(device);
        }
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        match self.tags[addr as usize] {
            CellTag::Ram | CellTag::Rom => self.data[addr as usize],
            CellTag::Io(device) => {
                let value = self.dispatch_read(device, addr);
                if let Some(hook) = self.on_io {
                    hook(addr, AccessKind::Read, value);
                }
                value
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match self.tags[addr as usize] {
            CellTag::Ram => self.data[addr as usize] = value,
            CellTag::Rom => {
                // Expected runtime condition, not an error: a common 6809
                // idiom writes through ROM-shadowed variables.
            }
            CellTag::Io(device) => {
                self.dispatch_write(device, addr, value);
                if let Some(hook) = self.on_io {
                    hook(addr, AccessKind::Write, value);
                }
            }
        }
    }

    /// Non-side-effecting read for disassembly/debug dumps. I/O cells
    /// return a best-effort peek without re-invoking the handler.
    pub fn peek(&self, addr: u16) -> u8 {
        match self.tags[addr as usize] {
            CellTag::Ram | CellTag::Rom => self.data[addr as usize],
            CellTag::Io(device) => self.peek_device(device, addr),
        }
    }

    fn dispatch_read(&mut self, device: DeviceId, addr: u16) -> u8 {
        match device {
            DeviceId::Pia0 => self.peripherals.read_pia0(addr),
            DeviceId::Pia1 => self.peripherals.pia1.read(addr),
            DeviceId::Sam => self.peripherals.sam.read(addr),
            DeviceId::Disk => self.peripherals.disk.read(addr),
            // The trap shadows an ordinary RAM variable; reads see it.
            DeviceId::Tape => self.data[addr as usize],
        }
    }

    fn dispatch_write(&mut self, device: DeviceId, addr: u16, value: u8) {
        match device {
            DeviceId::Pia0 => self.peripherals.pia0.write(addr, value),
            DeviceId::Pia1 => {
                self.peripherals.pia1.write(addr, value);
                let mode_bits = self.peripherals.pia1.port_b_output() >> 3;
                self.peripherals.vdg.set_pia_mode(mode_bits);
            }
            DeviceId::Sam => self.peripherals.sam.write(addr, &mut self.peripherals.vdg),
            DeviceId::Disk => self.peripherals.disk.write(addr, value),
            DeviceId::Tape => {
                // Write-through: the ROM still uses the variable, the trap
                // only observes the traffic.
                self.data[addr as usize] = value;
                let view = self.cpu_view;
                self.peripherals.tape.on_trap_write(view, self.data.as_slice());
            }
        }
    }

    fn peek_device(&self, device: DeviceId, addr: u16) -> u8 {
        match device {
            DeviceId::Pia0 => self.peripherals.pia0.peek(),
            DeviceId::Pia1 => self.peripherals.pia1.peek(),
            DeviceId::Tape => self.data[addr as usize],
            _ => 0,
        }
    }

    /// Repaint the VDG frame from the current RAM image. Split borrow so
    /// the VDG (owned by `peripherals`) can read the byte array while
    /// being stepped mutably.
    pub fn render_frame(&mut self) {
        let Self { data, peripherals, .. } = self;
        peripherals.vdg.render(data);
    }

    /// Fatal diagnostic sink used when no `on_exception` hook is attached;
    /// the executive eventually routes the condition to the host's
    /// `halt()`.
    pub fn log_exception(&mut self, message: &str) {
        eprintln!("core exception: {message}");
        self.last_exception = Some(message.to_string());
    }

    pub fn last_exception(&self) -> Option<&str> {
        self.last_exception.as_deref()
    }

    pub fn raw(&self) -> &[u8; 0x10000] {
        &self.data
    }

    pub fn raw_mut(&mut self) -> &mut [u8; 0x10000] {
        &mut self.data
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
