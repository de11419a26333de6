//! WD2797 floppy disk controller
//!
//! Registers at 0xFF40-0xFF43 (CMD/STATUS, TRACK, SECTOR, DATA) and
//! 0xFF48 (DRIVE/MOTOR). Implements RESTORE/SEEK (type I), READ/WRITE
//! SECTOR (type II), READ ADDRESS/WRITE TRACK (type III), and FORCE
//! INTERRUPT (type IV).
//!
//! The controller never owns image bytes: it drives a [`BlockStream`]
//! handed over at mount time (SD/FAT32-backed on firmware hosts, an
//! in-memory [`crate::image::VecStream`] elsewhere). Media errors from
//! the stream are folded into STATUS bits; they never propagate as Rust
//! errors.

use crate::host::BlockStream;

const TRACK_BUF_SIZE: usize = 4608;
const SECTORS_PER_TRACK: usize = 18;
const SECTOR_SIZE: usize = 256;

/// WRITE TRACK init streams lead with a fixed gap/index pattern; the
/// {track, head, sector, size} ID quad sits right behind it.
const WRITE_TRACK_ID_OFFSET: usize = 111;
const FORMAT_FILL_BYTE: u8 = 0xE5;

/// Completion NMI fires this many 1 ms ticks after a command finishes,
/// modelling the drive's head-settle delay.
const COMPLETION_NMI_TICKS: u32 = 250;

mod status {
    pub const BUSY: u8 = 1 << 0;
    pub const DRQ: u8 = 1 << 1;
    pub const TRACK0: u8 = 1 << 2;
    pub const CRC_ERR: u8 = 1 << 3;
    pub const RECORD_NOT_FOUND: u8 = 1 << 4;
    pub const HEAD_LOADED: u8 = 1 << 5;
    pub const WRITE_PROTECT: u8 = 1 << 6;
    pub const NOT_READY: u8 = 1 << 7;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Read,
    Write,
    ReadId,
    WriteTrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    None,
    Raw,
    Vdk,
}

pub struct Disk {
    cmd: u8,
    status: u8,
    track: u8,
    sector: u8,
    data: u8,
    motor_on: bool,
    double_density: bool,
    nmi_inhibit: bool,
    drive: u8,
    side: u8,

    state: State,
    buffer: Box<[u8; TRACK_BUF_SIZE]>,
    buf_index: usize,
    buf_len: usize,

    stream: Option<Box<dyn BlockStream>>,
    image_kind: ImageKind,
    vdk_header_size: usize,
    vdk_tracks: u8,
    vdk_sides: u8,

    completion_ticks: Option<u32>,
}

impl Disk {
    pub fn new() -> Self {
        Self {
            cmd: 0,
            status: status::TRACK0,
            track: 0,
            sector: 0,
            data: 0,
            motor_on: false,
            double_density: false,
            nmi_inhibit: false,
            drive: 0,
            side: 0,
            state: State::Idle,
            buffer: Box::new([0u8; TRACK_BUF_SIZE]),
            buf_index: 0,
            buf_len: 0,
            stream: None,
            image_kind: ImageKind::None,
            vdk_header_size: 0,
            vdk_tracks: 0,
            vdk_sides: 0,
            completion_ticks: None,
        }
    }

    /// Reinitialize controller state, keeping the mounted stream.
    pub fn reset(&mut self) {
        let stream = self.stream.take();
        let kind = self.image_kind;
        let header = (self.vdk_header_size, self.vdk_tracks, self.vdk_sides);
        *self = Self::new();
        self.stream = stream;
        self.image_kind = kind;
        (self.vdk_header_size, self.vdk_tracks, self.vdk_sides) = header;
    }

    /// Mount an image stream. For VDK images the 12-byte header is read
    /// up front and cached; its `header_size` field offsets every sector
    /// access from then on.
    pub fn mount(&mut self, mut stream: Box<dyn BlockStream>) {
        self.image_kind = stream.kind();
        self.vdk_header_size = 0;
        self.vdk_tracks = 0;
        self.vdk_sides = 0;
        if self.image_kind == ImageKind::Vdk {
            let mut bytes = [0u8; 12];
            let header = if stream.seek(0).is_ok() && stream.read(&mut bytes) == Ok(12) {
                crate::image::VdkHeader::parse(&bytes).ok()
            } else {
                None
            };
            match header {
                Some(h) => {
                    self.vdk_header_size = h.header_size as usize;
                    self.vdk_tracks = h.tracks;
                    self.vdk_sides = h.sides;
                }
                None => self.image_kind = ImageKind::None,
            }
        }
        self.stream = Some(stream);
    }

    pub fn unmount(&mut self) -> Option<Box<dyn BlockStream>> {
        self.image_kind = ImageKind::None;
        self.stream.take()
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        match addr & 0xFF {
            0x40 => self.status,
            0x41 => self.track,
            0x42 => self.sector,
            0x43 => self.read_data(),
            _ => 0,
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr & 0xFF {
            0x40 => self.exec_command(value),
            0x41 => self.track = value,
            0x42 => self.sector = value,
            0x43 => self.write_data(value),
            0x48 => {
                self.drive = value & 0x03;
                self.motor_on = value & 0x04 != 0;
                self.double_density = value & 0x08 != 0;
                self.side = (value >> 4) & 0x01;
                self.nmi_inhibit = value & 0x20 != 0;
            }
            _ => {}
        }
    }

    pub fn motor_on(&self) -> bool {
        self.motor_on
    }

    /// Byte offset of the current track's first sector, track-major:
    /// `header + ((track*sides)+side)*18*256`.
    fn track_base_offset(&self, track: u8, side: u8) -> usize {
        self.vdk_header_size
            + ((track as usize * self.vdk_sides.max(1) as usize) + side as usize)
                * SECTORS_PER_TRACK
                * SECTOR_SIZE
    }

    fn sector_offset(&self) -> usize {
        self.track_base_offset(self.track, self.side)
            + (self.sector.saturating_sub(1)) as usize * SECTOR_SIZE
    }

    fn track_out_of_range(&self) -> bool {
        self.vdk_tracks != 0 && self.track >= self.vdk_tracks
    }

    fn exec_command(&mut self, cmd: u8) {
        self.cmd = cmd;
        if self.image_kind == ImageKind::None && cmd & 0xF0 != 0xD0 {
            // No image mounted: everything but FORCE INTERRUPT completes
            // immediately with no effect.
            self.status = status::NOT_READY;
            return;
        }
        match cmd & 0xF0 {
            0x00 => self.restore_cmd(),
            0x10 => self.seek(),
            0x80 | 0x90 => self.read_sector(),
            0xA0 | 0xB0 => self.write_sector(),
            0xC0 => self.read_address(),
            0xF0 => self.write_track(),
            0xD0 => self.force_interrupt(),
            // Type I step commands (0x20-0x70) share SEEK's observable
            // behavior at this fidelity: position the head, report Track0.
            _ => self.seek(),
        }
    }

    fn raise_intrq(&mut self) {
        self.completion_ticks = Some(0);
    }

    /// Type I commands report head load from bit 3 of the command byte.
    fn type1_status(&self) -> u8 {
        let mut st = if self.track == 0 { status::TRACK0 } else { 0 };
        if self.cmd & 0x08 != 0 {
            st |= status::HEAD_LOADED;
        }
        st
    }

    fn restore_cmd(&mut self) {
        self.track = 0;
        self.status = self.type1_status();
        self.raise_intrq();
    }

    fn seek(&mut self) {
        self.track = self.data;
        self.status = self.type1_status();
        self.raise_intrq();
    }

    fn read_sector(&mut self) {
        let offset = self.sector_offset();
        if self.track_out_of_range() || !self.stream_read(offset, SECTOR_SIZE) {
            self.status = status::RECORD_NOT_FOUND | status::CRC_ERR;
            self.raise_intrq();
            return;
        }
        self.buf_index = 0;
        self.buf_len = SECTOR_SIZE;
        self.state = State::Read;
        self.status = status::BUSY | status::DRQ;
    }

    fn write_sector(&mut self) {
        if self.track_out_of_range() {
            self.status = status::RECORD_NOT_FOUND | status::CRC_ERR;
            self.raise_intrq();
            return;
        }
        self.buf_index = 0;
        self.buf_len = SECTOR_SIZE;
        self.state = State::Write;
        self.status = status::BUSY | status::DRQ;
    }

    fn read_address(&mut self) {
        self.buffer[0] = self.track;
        self.buffer[1] = 1; // side
        self.buffer[2] = self.sector;
        self.buffer[3] = 0xFF; // 256-byte sectors
        self.buffer[4] = 0xA5; // CRC sentinel
        self.buffer[5] = 0xA5;
        self.buf_index = 0;
        self.buf_len = 6;
        self.state = State::ReadId;
        self.status = status::BUSY | status::DRQ;
    }

    fn write_track(&mut self) {
        self.buf_index = 0;
        self.buf_len = TRACK_BUF_SIZE;
        self.state = State::WriteTrack;
        self.status = status::BUSY | status::DRQ;
    }

    fn force_interrupt(&mut self) {
        self.state = State::Idle;
        self.status = 0;
        self.completion_ticks = None;
    }

    fn read_data(&mut self) -> u8 {
        if self.buf_index >= self.buf_len {
            return self.data;
        }
        let byte = self.buffer[self.buf_index];
        self.data = byte;
        self.buf_index += 1;
        self.status &= !status::DRQ;
        if self.buf_index >= self.buf_len {
            self.finish_transfer();
        }
        byte
    }

    fn write_data(&mut self, value: u8) {
        self.data = value;
        if self.buf_index < self.buf_len {
            self.buffer[self.buf_index] = value;
            self.buf_index += 1;
            self.status &= !status::DRQ;
        }
        if self.buf_index >= self.buf_len && self.state != State::Idle {
            self.flush_write();
            self.finish_transfer();
        }
    }

    fn flush_write(&mut self) {
        match self.state {
            State::Write => {
                let offset = self.sector_offset();
                if !self.stream_write_buffer(offset, SECTOR_SIZE) {
                    self.status |= status::RECORD_NOT_FOUND | status::CRC_ERR;
                }
            }
            State::WriteTrack => self.format_track(),
            _ => {}
        }
    }

    /// Format: the init stream's gap bytes are skipped, the ID quad names
    /// the {track, head, sector, size} being laid down, and the whole
    /// track is rewritten as fill bytes.
    fn format_track(&mut self) {
        let id = &self.buffer[WRITE_TRACK_ID_OFFSET..WRITE_TRACK_ID_OFFSET + 4];
        let (track, head) = (id[0], id[1]);
        let base = self.track_base_offset(track, head);
        self.buffer[..TRACK_BUF_SIZE].fill(FORMAT_FILL_BYTE);
        if !self.stream_write_buffer(base, TRACK_BUF_SIZE) {
            self.status |= status::WRITE_PROTECT;
        }
    }

    fn finish_transfer(&mut self) {
        self.state = State::Idle;
        self.status &= !(status::BUSY | status::DRQ);
        self.raise_intrq();
    }

    fn stream_read(&mut self, offset: usize, len: usize) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        stream.seek(offset as u64).is_ok() && stream.read(&mut self.buffer[..len]) == Ok(len)
    }

    fn stream_write_buffer(&mut self, offset: usize, len: usize) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        stream.seek(offset as u64).is_ok() && stream.write(&self.buffer[..len]) == Ok(len)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    /// Flat register image for save states. In-flight transfers are not
    /// persisted; a restore lands the controller idle with its registers
    /// intact, which matches restoring "between commands".
    pub fn save(&self) -> [u8; 8] {
        let flags = self.drive
            | (self.motor_on as u8) << 2
            | (self.double_density as u8) << 3
            | (self.side & 0x01) << 4
            | (self.nmi_inhibit as u8) << 5;
        [
            self.cmd,
            self.status & !(status::BUSY | status::DRQ),
            self.track,
            self.sector,
            self.data,
            flags,
            0,
            0,
        ]
    }

    pub fn restore(&mut self, bytes: [u8; 8]) {
        self.cmd = bytes[0];
        self.status = bytes[1];
        self.track = bytes[2];
        self.sector = bytes[3];
        self.data = bytes[4];
        let flags = bytes[5];
        self.drive = flags & 0x03;
        self.motor_on = flags & 0x04 != 0;
        self.double_density = flags & 0x08 != 0;
        self.side = (flags >> 4) & 0x01;
        self.nmi_inhibit = flags & 0x20 != 0;
        self.state = State::Idle;
        self.buf_index = 0;
        self.buf_len = 0;
        self.completion_ticks = None;
    }

    /// 1 ms executive tick: while a transfer is in flight, pulse DRQ and
    /// request FIRQ; [`COMPLETION_NMI_TICKS`] after a command completes,
    /// request NMI unless inhibited.
    pub fn tick_1ms(&mut self) -> (bool, bool) {
        let mut firq = false;
        let mut nmi = false;
        if self.state != State::Idle {
            self.status |= status::DRQ;
            firq = true;
        }
        if let Some(ticks) = self.completion_ticks.as_mut() {
            *ticks += 1;
            if *ticks >= COMPLETION_NMI_TICKS {
                self.completion_ticks = None;
                if !self.nmi_inhibit {
                    nmi = true;
                }
            }
        }
        (firq, nmi)
    }
}

impl Default for Disk {
    fn default() -> Self {
        Self::new()
    }
}
