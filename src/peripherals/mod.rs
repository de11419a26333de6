//! Dragon 32 peripheral controllers
//!
//! One file per chip, glued into a single [`Peripherals`] value here:
//! - SAM address multiplexer (video-relevant subset)
//! - Two MC6821 PIAs (keyboard/joystick/vsync, and DAC/cartridge/VDG-mode)
//! - MC6847 VDG
//! - WD2797 floppy controller
//! - Cassette tape capture trap

pub mod disk;
pub mod pia;
pub mod sam;
pub mod tape;
pub mod vdg;

pub use disk::Disk;
pub use pia::Pia;
pub use sam::Sam;
pub use tape::Tape;
pub use vdg::Vdg;

use crate::host::FunctionKey;

/// F1's XT make code; translated to the loader-escape channel instead of
/// a matrix position.
const LOADER_ESCAPE_SCAN_CODE: u8 = 0x3B;

/// 8-column × 7-row keyboard matrix, strobed by PIA0 port A (active-low
/// column drive) and sensed on PIA0 port B (active-low rows).
pub struct Keyboard {
    /// Per-column pressed-row mask (bit r set = key down at row r).
    cols: [u8; 8],
}

impl Keyboard {
    fn new() -> Self {
        Self { cols: [0; 8] }
    }

    fn reset(&mut self) {
        self.cols = [0; 8];
    }

    /// Translate a host scan code into a matrix key-down/up edit.
    /// The loader-escape sentinel never touches the matrix.
    fn apply_scan_code(&mut self, code: u8, pressed: bool) -> Option<FunctionKey> {
        if code == LOADER_ESCAPE_SCAN_CODE {
            return pressed.then_some(FunctionKey::LoaderEscape);
        }
        let col = (code & 0x07) as usize;
        let row = (code >> 3) & 0x07;
        if row < 7 {
            if pressed {
                self.cols[col] |= 1 << row;
            } else {
                self.cols[col] &= !(1 << row);
            }
        }
        None
    }

    /// Row sense for the given column strobe byte (both active low): a
    /// pressed key pulls its row bit low when its column is driven low.
    /// Bit 7 has no row wired and floats high.
    fn row_sense(&self, strobe: u8) -> u8 {
        let mut sense = 0xFFu8;
        for (col, &rows) in self.cols.iter().enumerate() {
            if strobe & (1 << col) == 0 {
                sense &= !rows;
            }
        }
        sense
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Peripherals {
    pub sam: Sam,
    pub pia0: Pia,
    pub pia1: Pia,
    pub vdg: Vdg,
    pub disk: Disk,
    pub tape: Tape,
    pub keyboard: Keyboard,

    pending_function_key: Option<FunctionKey>,
}

impl Peripherals {
    pub fn new() -> Self {
        Self {
            sam: Sam::new(),
            pia0: Pia::new(),
            pia1: Pia::new(),
            vdg: Vdg::new(),
            disk: Disk::new(),
            tape: Tape::new(),
            keyboard: Keyboard::new(),
            pending_function_key: None,
        }
    }

    pub fn reset(&mut self) {
        self.sam.reset();
        self.pia0.reset();
        self.pia1.reset();
        self.vdg.reset();
        self.disk.reset();
        self.tape.reset();
        self.keyboard.reset();
        self.pending_function_key = None;
    }

    /// Feed a host scan code into the keyboard model, latching the
    /// synthesized function-key channel when the sentinel code fires.
    pub fn set_scan_code(&mut self, code: u8, pressed: bool) {
        if let Some(key) = self.keyboard.apply_scan_code(code, pressed) {
            self.pending_function_key = Some(key);
        }
    }

    pub fn take_function_key(&mut self) -> FunctionKey {
        self.pending_function_key.take().unwrap_or(FunctionKey::None)
    }

    /// PIA0 read with the keyboard row sense recomputed against the
    /// current column strobe; BASIC writes a strobe to port A and reads
    /// port B back-to-back, so the sense has to be fresh at read time.
    pub fn read_pia0(&mut self, addr: u16) -> u8 {
        if addr & 0x03 == 2 {
            let strobe = self.pia0.port_a_output();
            self.pia0.set_port_b_input(self.keyboard.row_sense(strobe));
        }
        self.pia0.read(addr)
    }

    /// Joystick lines into PIA0 port A: comparator on bit 7, fire button
    /// pulling bit 0 low.
    pub fn set_joystick(&mut self, button: bool, comparator: bool) {
        self.pia0.set_port_a_input(0x80, comparator);
        self.pia0.set_port_a_input(0x01, !button);
    }

    /// 50 Hz vertical-sync edge on PIA0 CB1; returns true if the edge
    /// should assert IRQ to the CPU.
    pub fn vsync_irq(&mut self) -> bool {
        self.pia0.latch_c1_edge(true)
    }

    /// Cartridge edge on PIA1 CB1; returns true if FIRQ should be
    /// asserted. Service is by reading PIA1 port B.
    pub fn cartridge_firq(&mut self) -> bool {
        self.pia1.latch_c1_edge(true)
    }

    /// 6-bit DAC value currently latched on PIA1 port A[7:2].
    pub fn dac_value(&self) -> u8 {
        self.pia1.port_a_output() >> 2
    }

    /// Two-bit sound-multiplexer select driven by PIA0's CA2/CB2 outputs.
    pub fn audio_mux_select(&self) -> u8 {
        self.pia0.c2_output(false) as u8 | (self.pia0.c2_output(true) as u8) << 1
    }

    /// PIA1 CA2 drives the cassette motor relay.
    pub fn tape_motor_on(&self) -> bool {
        self.pia1.c2_output(false)
    }

    pub fn set_cassette_input(&mut self, bit: bool) {
        self.pia1.set_port_a_input(0x02, bit);
    }

    /// 1 ms executive tick: advances the disk state machine and reports
    /// whether FIRQ/NMI should be raised on the CPU.
    pub fn tick_1ms(&mut self) -> (bool, bool) {
        self.disk.tick_1ms()
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Self::new()
    }
}
