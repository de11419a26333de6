//! WebAssembly bindings for the Dragon 32 emulator core
//!
//! Browser hosts talk to the core through this wrapper instead of the C
//! ABI in `lib.rs`: wasm-bindgen generates the JS glue directly from the
//! method signatures below, so there's no hand-written FFI shim to keep in
//! sync. Only built with `--features wasm` (or automatically under
//! `wasm32` via the `[target.'cfg(...)'.dependencies]` table).

use wasm_bindgen::prelude::*;

use crate::executive::Executive;
use crate::host::{HostIo, StreamError};
use crate::machine::Machine;

/// WASM is single-threaded, so unlike the C ABI's `*mut Machine` this owns
/// the emulator directly with no mutex.
#[wasm_bindgen]
pub struct WasmMachine {
    inner: Machine,
    executive: Executive,
    host: BrowserHost,
}

/// Minimal `HostIo` for a browser host: tape captures are buffered here
/// and pulled out by JS after `poll`, rather than written inside the
/// trait method (there's no synchronous file I/O in a page).
struct BrowserHost {
    now_us: u32,
    scan_code: u8,
    reset_button: bool,
    joystick_button: bool,
    joystick_comparator: bool,
    tape_capture: Option<Vec<u8>>,
}

impl HostIo for BrowserHost {
    fn now_us(&self) -> u32 {
        self.now_us
    }
    fn read_scan_code(&mut self) -> u8 {
        self.scan_code
    }
    fn joystick_button(&self) -> bool {
        self.joystick_button
    }
    fn joystick_comparator(&self) -> bool {
        self.joystick_comparator
    }
    fn write_dac(&mut self, _value: u8) {}
    fn audio_mux_select(&mut self, _value: u8) {}
    fn reset_button(&self) -> bool {
        self.reset_button
    }
    fn motor_led_on(&mut self, _source_mask: u8) {}
    fn motor_led_off(&mut self, _source_mask: u8) {}
    fn tape_write(&mut self, _filename: &[u8], data: &[u8]) -> Result<usize, StreamError> {
        self.tape_capture = Some(data.to_vec());
        Ok(data.len())
    }
    fn halt(&mut self, diagnostic: &str) {
        web_sys::console::error_1(&diagnostic.into());
    }
}

#[wasm_bindgen]
impl WasmMachine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmMachine {
        console_error_panic_hook::set_once();
        WasmMachine {
            inner: Machine::new(),
            executive: Executive::new(),
            host: BrowserHost {
                now_us: 0,
                scan_code: 0,
                reset_button: true,
                joystick_button: false,
                joystick_comparator: false,
                tape_capture: None,
            },
        }
    }

    /// Run one executive iteration against the page's clock. JS calls
    /// this in a `requestAnimationFrame`-driven loop.
    #[wasm_bindgen]
    pub fn poll(&mut self, now_us: u32) -> bool {
        self.host.now_us = now_us;
        let stepped = self.executive.poll(&mut self.inner, &mut self.host);
        self.host.scan_code = 0;
        stepped
    }

    #[wasm_bindgen]
    pub fn set_joystick(&mut self, button: bool, comparator: bool) {
        self.host.joystick_button = button;
        self.host.joystick_comparator = comparator;
    }

    #[wasm_bindgen]
    pub fn resume_from_loader(&mut self) {
        self.executive.resume();
    }

    /// Load a ROM image at `base` (0x8000 for BASIC/DOS, 0xC000 for a
    /// cartridge). Returns 0 on success, negative error code on failure.
    #[wasm_bindgen]
    pub fn load_rom(&mut self, base: u16, data: &[u8]) -> i32 {
        match self.inner.load_rom(base, data) {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }

    #[wasm_bindgen]
    pub fn mount_disk(&mut self, data: &[u8]) {
        self.inner.mount_disk_bytes(data.to_vec());
    }

    #[wasm_bindgen]
    pub fn reset(&mut self, cold: bool) {
        self.inner.reset(cold);
    }

    /// Step the CPU for up to `max_instructions`, then service the disk and
    /// VDG tick timers. Returns the number of instructions actually run.
    #[wasm_bindgen]
    pub fn run_frame_budget(&mut self, max_instructions: u32) -> u32 {
        let mut ran = 0;
        for _ in 0..max_instructions {
            self.inner.step();
            ran += 1;
        }
        self.inner.tick_disk_1ms();
        self.inner.vsync();
        ran
    }

    #[wasm_bindgen]
    pub fn framebuffer_width(&self) -> u32 {
        crate::peripherals::vdg::FRAME_WIDTH as u32
    }

    #[wasm_bindgen]
    pub fn framebuffer_height(&self) -> u32 {
        crate::peripherals::vdg::FRAME_HEIGHT as u32
    }

    /// Copy the 8bpp indexed framebuffer out as packed bytes; the caller
    /// maps indices through the MC6847 palette on the JS side.
    #[wasm_bindgen]
    pub fn framebuffer(&self) -> Vec<u8> {
        self.inner.framebuffer().to_vec()
    }

    /// Queue a key event for the next `poll`; releases carry the XT
    /// break bit.
    #[wasm_bindgen]
    pub fn set_scan_code(&mut self, code: u8, pressed: bool) {
        self.host.scan_code = if pressed { code & 0x7F } else { code | 0x80 };
    }

    #[wasm_bindgen]
    pub fn set_reset_button(&mut self, pressed: bool) {
        self.host.reset_button = !pressed;
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.inner.pc()
    }

    #[wasm_bindgen]
    pub fn save_state_size(&self) -> usize {
        self.inner.save_state_size()
    }

    #[wasm_bindgen]
    pub fn save_state(&self) -> Vec<u8> {
        let size = self.inner.save_state_size();
        let mut buffer = vec![0u8; size];
        match self.inner.save_state(&mut buffer) {
            Ok(written) => {
                buffer.truncate(written);
                buffer
            }
            Err(_) => Vec::new(),
        }
    }

    #[wasm_bindgen]
    pub fn load_state(&mut self, data: &[u8]) -> i32 {
        match self.inner.load_state(data) {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }

    /// Take the most recently flushed tape capture (CAS-format), if any.
    #[wasm_bindgen]
    pub fn take_tape_output(&mut self) -> Option<Vec<u8>> {
        self.host.tape_capture.take().or_else(|| self.inner.take_tape_output())
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}
