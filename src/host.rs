//! Host collaborator surface
//!
//! The core never touches an OS API directly; every external effect goes
//! through [`HostIo`]. A host implementation backs this with whatever SD
//! card, framebuffer, and GPIO lines the target platform provides.
//!
//! Disk and cassette images cross a narrower seam: the SD/FAT32 stack is
//! an external collaborator, so the WD2797 consumes a [`BlockStream`] it
//! is handed at mount time instead of reaching through `HostIo` for file
//! operations.

/// Synthesized function-key channel, latched by the keyboard scan-code
/// sentinel (0x3B = F1) instead of a real matrix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionKey {
    #[default]
    None,
    LoaderEscape,
}

/// The 16-entry host palette the frame buffer's bytes index into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PaletteIndex {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    Gray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    LightMagenta = 13,
    Yellow = 14,
    White = 15,
}

/// Which of the two motor-LED sources a `motor_led_on`/`motor_led_off` call
/// refers to.
pub mod motor {
    pub const DISK: u8 = 0x01;
    pub const TAPE: u8 = 0x02;
}

/// Errors a block byte-stream collaborator can report back; the disk
/// component turns these into STATUS bits rather than propagating them
/// as Rust errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    NotReady,
    SeekOutOfRange,
    ReadFault,
    WriteFault,
}

/// Flat byte-stream over a mounted disk image, provided by the host's
/// SD/FAT32 stack (or an in-memory buffer in tests and wasm hosts). The
/// WD2797 is the only consumer.
pub trait BlockStream {
    fn seek(&mut self, offset: u64) -> Result<(), StreamError>;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;
    fn kind(&self) -> crate::peripherals::disk::ImageKind;
}

/// The only surface the core depends on. A real host (SBC firmware,
/// desktop shell, wasm page) implements this once; the core never reaches
/// past it for time, pixels, input, or persistent storage.
pub trait HostIo {
    /// Monotonic microsecond clock.
    fn now_us(&self) -> u32;

    /// Next pending keyboard scan code, 0 if none. Bit 7 set marks a key
    /// release (XT-style break code); F1's make code 0x3B is the
    /// loader-escape sentinel.
    fn read_scan_code(&mut self) -> u8;

    fn joystick_button(&self) -> bool;
    /// Comparator output; valid once the host has let the DAC settle
    /// (>= 20 us after `write_dac`).
    fn joystick_comparator(&self) -> bool;

    /// Latch a 6-bit value onto the external DAC.
    fn write_dac(&mut self, value: u8);
    /// Two-bit sound multiplexer select lines.
    fn audio_mux_select(&mut self, value: u8);

    /// Active low: `false` means the button is currently pressed.
    fn reset_button(&self) -> bool;

    fn motor_led_on(&mut self, source_mask: u8);
    fn motor_led_off(&mut self, source_mask: u8);

    /// Append one captured CAS stream to the host's tape output file.
    /// `filename` is the (possibly empty) name extracted from the stream's
    /// namefile block.
    fn tape_write(&mut self, filename: &[u8], data: &[u8]) -> Result<usize, StreamError>;

    /// Fatal programming-invariant violation: `diagnostic` carries
    /// the register/history dump. The core does not recover; hosts
    /// typically log and stop the machine loop.
    fn halt(&mut self, diagnostic: &str);
}
