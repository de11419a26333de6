//! Machine orchestrator
//!
//! Owns the CPU and bus, wires up the memory map, and provides the
//! reset/ROM-load/disk-mount/save-state surface the executive and the C
//! ABI build on. Keeps an execution-history ring buffer for crash
//! diagnostics.

use crate::bus::{Bus, DeviceId};
use crate::cpu::{Cpu, CpuState};
use crate::host::{BlockStream, FunctionKey};
use crate::image::VecStream;
use crate::peripherals::vdg::{FRAME_HEIGHT, FRAME_WIDTH};

/// RAM/ROM/IO ranges fixed by the Dragon's memory map.
pub const RAM_END: u16 = 0x7FFF;
pub const ROM_BASE: u16 = 0x8000;
pub const ROM_END: u16 = 0xFEFF;
pub const CARTRIDGE_BASE: u16 = 0xC000;
const EXEC_VECTOR: u16 = 0x009D;

/// BASIC's `CasLastSine` cassette-driver variable; the tape trap write
/// handler is registered here. The address overlaps general RAM in
/// non-BASIC environments, so the handler writes through (see
/// DESIGN.md).
const TAPE_TRAP_ADDR: u16 = 0x01AE;

/// Save-state container magic + format version.
const STATE_MAGIC: [u8; 4] = *b"D32S";
const STATE_VERSION: u16 = 1;
const STATE_HEADER_SIZE: usize = 8;
const STATE_SIZE: usize = STATE_HEADER_SIZE + 16 + 0x10000 + 2 + 8 + 8 + 8;

const HISTORY_SIZE: usize = 64;

#[derive(Clone, Copy, Default)]
struct HistoryEntry {
    pc: u16,
    opcode: [u8; 5],
    opcode_len: u8,
}

/// Execution history ring buffer for crash diagnostics.
struct ExecutionHistory {
    entries: [HistoryEntry; HISTORY_SIZE],
    write_idx: usize,
    count: usize,
}

impl ExecutionHistory {
    fn new() -> Self {
        Self {
            entries: [HistoryEntry::default(); HISTORY_SIZE],
            write_idx: 0,
            count: 0,
        }
    }

    fn record(&mut self, pc: u16, opcode: [u8; 5], opcode_len: u8) {
        self.entries[self.write_idx] = HistoryEntry { pc, opcode, opcode_len };
        self.write_idx = (self.write_idx + 1) % HISTORY_SIZE;
        if self.count < HISTORY_SIZE {
            self.count += 1;
        }
    }

    fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        let start = if self.count < HISTORY_SIZE { 0 } else { self.write_idx };
        (0..self.count).map(move |i| &self.entries[(start + i) % HISTORY_SIZE])
    }

    fn clear(&mut self) {
        self.write_idx = 0;
        self.count = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    EmptyRom,
    RomTooLarge,
    BufferTooSmall,
    StateInvalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    FrameComplete,
    Halted,
    Exception,
}

pub struct Machine {
    cpu: Cpu,
    bus: Bus,
    rom_loaded: bool,
    history: ExecutionHistory,
    last_stop: StopReason,
    total_cycles: u64,
}

impl Machine {
    pub fn new() -> Self {
        let mut bus = Bus::new();
        bus.define_io(0xFF00, 0xFF03, DeviceId::Pia0);
        bus.define_io(0xFF20, 0xFF23, DeviceId::Pia1);
        bus.define_io(0xFF40, 0xFF48, DeviceId::Disk);
        bus.define_io(0xFFC0, 0xFFDF, DeviceId::Sam);
        bus.define_io(TAPE_TRAP_ADDR, TAPE_TRAP_ADDR, DeviceId::Tape);
        Self {
            cpu: Cpu::new(),
            bus,
            rom_loaded: false,
            history: ExecutionHistory::new(),
            last_stop: StopReason::FrameComplete,
            total_cycles: 0,
        }
    }

    /// Load a ROM image at `base` (`ROM_BASE` for BASIC/DOS, `CARTRIDGE_BASE`
    /// for a cartridge), mark it read-only, and point the EXEC vector at it.
    pub fn load_rom(&mut self, base: u16, data: &[u8]) -> Result<(), CoreError> {
        if data.is_empty() {
            return Err(CoreError::EmptyRom);
        }
        let end = base as usize + data.len() - 1;
        if end > ROM_END as usize {
            return Err(CoreError::RomTooLarge);
        }
        self.bus.load(base, data);
        self.bus.define_rom(base, end as u16);
        self.bus.write(EXEC_VECTOR, (CARTRIDGE_BASE >> 8) as u8);
        self.bus.write(EXEC_VECTOR + 1, CARTRIDGE_BASE as u8);
        self.rom_loaded = true;
        self.reset(true);
        Ok(())
    }

    /// Hand the WD2797 a mounted image stream (SD/FAT32-backed on
    /// firmware hosts).
    pub fn mount_disk(&mut self, stream: Box<dyn BlockStream>) {
        self.bus.peripherals.disk.mount(stream);
    }

    /// Convenience for hosts that hold the whole image in memory (C ABI,
    /// wasm, tests).
    pub fn mount_disk_bytes(&mut self, bytes: Vec<u8>) {
        self.mount_disk(Box::new(VecStream::new(bytes)));
    }

    /// Eject the mounted image, returning the stream so the loader can
    /// close it.
    pub fn eject_disk(&mut self) -> Option<Box<dyn BlockStream>> {
        self.bus.peripherals.disk.unmount()
    }

    pub fn take_tape_output(&mut self) -> Option<Vec<u8>> {
        self.bus.peripherals.tape.take_output()
    }

    pub fn tape_filename(&self) -> &[u8] {
        self.bus.peripherals.tape.filename()
    }

    pub fn set_scan_code(&mut self, code: u8, pressed: bool) {
        self.bus.peripherals.set_scan_code(code, pressed);
    }

    pub fn take_function_key(&mut self) -> FunctionKey {
        self.bus.peripherals.take_function_key()
    }

    pub fn set_joystick(&mut self, button: bool, comparator: bool) {
        self.bus.peripherals.set_joystick(button, comparator);
    }

    pub fn set_cassette_input(&mut self, bit: bool) {
        self.bus.peripherals.set_cassette_input(bit);
    }

    pub fn dac_value(&self) -> u8 {
        self.bus.peripherals.dac_value()
    }

    pub fn audio_mux_select(&self) -> u8 {
        self.bus.peripherals.audio_mux_select()
    }

    pub fn disk_motor_on(&self) -> bool {
        self.bus.peripherals.disk.motor_on()
    }

    pub fn tape_motor_on(&self) -> bool {
        self.bus.peripherals.tape_motor_on() || self.bus.peripherals.tape.capturing()
    }

    /// `cold` performs a full power-on reset; a warm reset (the short
    /// reset-button press) only touches CC.I, CC.F and PC.
    pub fn reset(&mut self, cold: bool) {
        self.cpu.reset_vector(&mut self.bus, cold);
        if cold {
            self.bus.peripherals.reset();
        }
        self.history.clear();
        self.last_stop = StopReason::FrameComplete;
        self.total_cycles = 0;
    }

    /// Run one MC6809E instruction and record history. Returns the
    /// machine cycles consumed.
    pub fn step(&mut self) -> u32 {
        if !self.rom_loaded {
            return 0;
        }
        self.bus.cpu_view = crate::bus::CpuView {
            pc: self.cpu.pc,
            last_pc: self.cpu.last_pc,
            s: self.cpu.s,
        };

        let cycles = self.cpu.step(&mut self.bus);
        self.history.record(
            self.cpu.last_pc,
            self.cpu.last_opcode_bytes,
            self.cpu.last_opcode_len,
        );
        self.total_cycles += cycles as u64;

        match self.cpu.state {
            CpuState::Halted => self.last_stop = StopReason::Halted,
            CpuState::Exception => self.last_stop = StopReason::Exception,
            _ => {}
        }
        cycles
    }

    /// Drive the disk's 1 ms tick and forward its FIRQ/NMI requests; the
    /// DRQ-paced FIRQ goes through PIA1's cartridge line.
    pub fn tick_disk_1ms(&mut self) {
        let (firq, nmi) = self.bus.peripherals.tick_1ms();
        if firq && self.bus.peripherals.cartridge_firq() {
            self.cpu.firq();
        }
        if nmi {
            self.cpu.nmi();
        }
    }

    /// Cartridge CB1 edge (auto-start cartridges pulse this); FIRQ is
    /// asserted if PIA1 has the interrupt enabled.
    pub fn cartridge_firq(&mut self) {
        if self.bus.peripherals.cartridge_firq() {
            self.cpu.firq();
        }
    }

    /// 20 ms refresh: repaint the frame and latch the vsync edge into
    /// PIA0, raising IRQ when enabled.
    pub fn vsync(&mut self) {
        if self.bus.peripherals.vsync_irq() {
            self.cpu.irq();
        }
        self.bus.render_frame();
    }

    pub fn framebuffer(&self) -> &[u8; FRAME_WIDTH * FRAME_HEIGHT] {
        self.bus.peripherals.vdg.last_frame_ref()
    }

    pub fn last_stop_reason(&self) -> StopReason {
        self.last_stop
    }

    pub fn pc(&self) -> u16 {
        self.cpu.pc
    }

    pub fn cpu_state(&self) -> CpuState {
        self.cpu.state
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn mnemonic_at(&self, pc: u16) -> String {
        self.cpu.mnemonic_at(&self.bus, pc)
    }

    /// Flat save-state: header, CPU register file, the 64 KiB RAM/ROM
    /// image, and every peripheral's register state. Mounted disk images
    /// live behind the stream collaborator and are not captured; restore
    /// against the same loaded ROM (the cell tags derive from
    /// `load_rom`).
    pub fn save_state_size(&self) -> usize {
        STATE_SIZE
    }

    pub fn save_state(&self, buffer: &mut [u8]) -> Result<usize, CoreError> {
        if buffer.len() < STATE_SIZE {
            return Err(CoreError::BufferTooSmall);
        }
        let p = &self.bus.peripherals;
        buffer[0..4].copy_from_slice(&STATE_MAGIC);
        buffer[4..6].copy_from_slice(&STATE_VERSION.to_le_bytes());
        buffer[6..8].fill(0);
        let mut at = STATE_HEADER_SIZE;
        buffer[at..at + 16].copy_from_slice(&self.cpu.save());
        at += 16;
        buffer[at..at + 0x10000].copy_from_slice(self.bus.raw());
        at += 0x10000;
        buffer[at..at + 2].copy_from_slice(&p.sam.save());
        at += 2;
        buffer[at..at + 8].copy_from_slice(&p.pia0.save());
        at += 8;
        buffer[at..at + 8].copy_from_slice(&p.pia1.save());
        at += 8;
        buffer[at..at + 8].copy_from_slice(&p.disk.save());
        Ok(STATE_SIZE)
    }

    pub fn load_state(&mut self, buffer: &[u8]) -> Result<(), CoreError> {
        if buffer.len() < STATE_SIZE {
            return Err(CoreError::BufferTooSmall);
        }
        if buffer[0..4] != STATE_MAGIC
            || u16::from_le_bytes([buffer[4], buffer[5]]) != STATE_VERSION
        {
            return Err(CoreError::StateInvalid);
        }
        let mut at = STATE_HEADER_SIZE;
        let mut cpu_bytes = [0u8; 16];
        cpu_bytes.copy_from_slice(&buffer[at..at + 16]);
        self.cpu.restore(cpu_bytes);
        at += 16;
        self.bus.raw_mut().copy_from_slice(&buffer[at..at + 0x10000]);
        at += 0x10000;
        let p = &mut self.bus.peripherals;
        p.sam.restore([buffer[at], buffer[at + 1]]);
        at += 2;
        let mut regs = [0u8; 8];
        regs.copy_from_slice(&buffer[at..at + 8]);
        p.pia0.restore(regs);
        at += 8;
        regs.copy_from_slice(&buffer[at..at + 8]);
        p.pia1.restore(regs);
        at += 8;
        regs.copy_from_slice(&buffer[at..at + 8]);
        p.disk.restore(regs);
        // The VDG's mode inputs are derived state: re-forward them from
        // the restored SAM and PIA1.
        p.sam.sync_vdg(&mut p.vdg);
        let mode_bits = p.pia1.port_b_output() >> 3;
        p.vdg.set_pia_mode(mode_bits);
        self.history.clear();
        Ok(())
    }

    pub fn dump_registers(&self) -> String {
        format!(
            "A={:02X} B={:02X} D={:04X} X={:04X} Y={:04X} U={:04X} S={:04X} PC={:04X} DP={:02X}\n\
             CC={:02X} [EFHINZVC]={:08b}",
            self.cpu.a,
            self.cpu.b,
            self.cpu.d(),
            self.cpu.x,
            self.cpu.y,
            self.cpu.u,
            self.cpu.s,
            self.cpu.pc,
            self.cpu.dp,
            self.cpu.cc,
            self.cpu.cc,
        )
    }

    pub fn dump_history(&self) -> String {
        let mut out = String::new();
        out.push_str("Execution history (oldest to newest):\n");
        for entry in self.history.iter() {
            let slice = &entry.opcode[..entry.opcode_len as usize];
            let mnemonic = crate::disasm::disassemble(slice).mnemonic;
            let bytes_str: String = slice
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!("  PC={:04X}  {:12}  {}\n", entry.pc, bytes_str, mnemonic));
        }
        out.push_str(&format!("\nCurrent PC: {:04X}\n", self.cpu.pc));
        out.push_str(&format!("Total cycles: {}\n", self.total_cycles));
        out.push_str(&format!("Stop reason: {:?}\n", self.last_stop));
        out
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
