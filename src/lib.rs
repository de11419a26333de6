//! Dragon 32 Emulator Core
//!
//! This crate provides a platform-agnostic emulator core with a stable C
//! ABI. No OS APIs are used from inside the core; everything a host needs
//! to supply crosses the [`host::HostIo`] trait instead.
//!
//! # Architecture
//!
//! - `bus`: 64 KiB unified address space, memory-mapped I/O dispatch
//! - `cpu`: MC6809E interpreter
//! - `peripherals`: SAM, two MC6821 PIAs, MC6847 VDG, WD2797, tape trap
//! - `host`: the external-collaborator trait and `FunctionKey`
//! - `machine`: orchestrator tying CPU + bus + peripherals together
//! - `executive`: the host-facing scheduling loop
//! - `disasm`: MC6809E disassembler (debug dumps only)
//! - `image`: VDK/CAS file format helpers
//!
//! # Memory map
//!
//! | Address Range     | Region                      |
//! |--------------------|-----------------------------|
//! | 0x0000 - 0x7FFF    | 32 KiB RAM                   |
//! | 0x8000 - 0xFEFF    | BASIC + DOS + cartridge ROM  |
//! | 0xFF00 - 0xFF03    | PIA0                         |
//! | 0xFF20 - 0xFF23    | PIA1                         |
//! | 0xFF40 - 0xFF48    | WD2797 + drive control       |
//! | 0xFFC0 - 0xFFDF    | SAM control toggles          |
//! | 0xFFF0 - 0xFFFF    | Interrupt vectors (in ROM)   |

pub mod bus;
pub mod cpu;
pub mod disasm;
pub mod executive;
pub mod host;
pub mod image;
pub mod machine;
pub mod peripherals;
#[cfg(feature = "wasm")]
pub mod wasm;


use std::ptr;
use std::slice;

pub use machine::Machine;

/// Create a new machine instance. Returns null on allocation failure.
#[no_mangle]
pub extern "C" fn emu_create() -> *mut Machine {
    let machine = Box::new(Machine::new());
    Box::into_raw(machine)
}

/// Destroy a machine instance. Safe to call with a null pointer.
#[no_mangle]
pub extern "C" fn emu_destroy(machine: *mut Machine) {
    if !machine.is_null() {
        unsafe {
            drop(Box::from_raw(machine));
        }
    }
}

/// Load a ROM image at `base` (0x8000 for BASIC/DOS, 0xC000 for a
/// cartridge). Returns 0 on success, negative error code on failure.
#[no_mangle]
pub extern "C" fn emu_load_rom(machine: *mut Machine, base: u16, data: *const u8, len: usize) -> i32 {
    if machine.is_null() || data.is_null() {
        return -1;
    }
    let machine = unsafe { &mut *machine };
    let rom_data = unsafe { slice::from_raw_parts(data, len) };
    match machine.load_rom(base, rom_data) {
        Ok(()) => 0,
        Err(machine::CoreError::EmptyRom) => -2,
        Err(machine::CoreError::RomTooLarge) => -3,
        Err(_) => -100,
    }
}

/// Mount a disk image (VDK or raw). The bytes are copied.
#[no_mangle]
pub extern "C" fn emu_mount_disk(machine: *mut Machine, data: *const u8, len: usize) -> i32 {
    if machine.is_null() || data.is_null() {
        return -1;
    }
    let machine = unsafe { &mut *machine };
    let bytes = unsafe { slice::from_raw_parts(data, len) }.to_vec();
    machine.mount_disk_bytes(bytes);
    0
}

/// Eject the mounted disk image, if any.
#[no_mangle]
pub extern "C" fn emu_eject_disk(machine: *mut Machine) {
    if machine.is_null() {
        return;
    }
    drop(unsafe { &mut *machine }.eject_disk());
}

/// Pulse the cartridge FIRQ line (auto-start cartridges tie it to the
/// bus clock; hosts emulate the pulse when a cartridge is mounted).
#[no_mangle]
pub extern "C" fn emu_cartridge_firq(machine: *mut Machine) {
    if machine.is_null() {
        return;
    }
    unsafe { &mut *machine }.cartridge_firq();
}

/// Reset the machine. `cold` selects a full power-on reset vs. the warm
/// reset performed by a short reset-button press.
#[no_mangle]
pub extern "C" fn emu_reset(machine: *mut Machine, cold: i32) {
    if machine.is_null() {
        return;
    }
    let machine = unsafe { &mut *machine };
    machine.reset(cold != 0);
}

/// Run one executive iteration worth of CPU stepping (a single
/// instruction); hosts call this in a loop and drive `emu_vsync`/
/// `emu_tick_disk` themselves on their own timebase.
#[no_mangle]
pub extern "C" fn emu_step(machine: *mut Machine) -> u32 {
    if machine.is_null() {
        return 0;
    }
    let machine = unsafe { &mut *machine };
    machine.step()
}

#[no_mangle]
pub extern "C" fn emu_tick_disk(machine: *mut Machine) {
    if machine.is_null() {
        return;
    }
    unsafe { &mut *machine }.tick_disk_1ms();
}

#[no_mangle]
pub extern "C" fn emu_run_frame(machine: *mut Machine) {
    if machine.is_null() {
        return;
    }
    unsafe { &mut *machine }.vsync();
}

/// Get a pointer to the 256x192 8bpp framebuffer, owned by the machine.
#[no_mangle]
pub extern "C" fn emu_framebuffer(machine: *const Machine, w: *mut i32, h: *mut i32) -> *const u8 {
    if machine.is_null() {
        return ptr::null();
    }
    let machine = unsafe { &*machine };
    if !w.is_null() {
        unsafe { *w = peripherals::vdg::FRAME_WIDTH as i32 };
    }
    if !h.is_null() {
        unsafe { *h = peripherals::vdg::FRAME_HEIGHT as i32 };
    }
    machine.framebuffer().as_ptr()
}

/// Feed a host keyboard scan code. `pressed` is non-zero for key-down.
#[no_mangle]
pub extern "C" fn emu_set_scan_code(machine: *mut Machine, code: u8, pressed: i32) {
    if machine.is_null() {
        return;
    }
    unsafe { &mut *machine }.set_scan_code(code, pressed != 0);
}

#[no_mangle]
pub extern "C" fn emu_save_state_size(machine: *const Machine) -> usize {
    if machine.is_null() {
        return 0;
    }
    unsafe { &*machine }.save_state_size()
}

/// Save machine state to a buffer. Returns bytes written on success,
/// negative error code on failure.
#[no_mangle]
pub extern "C" fn emu_save_state(machine: *const Machine, out: *mut u8, cap: usize) -> i32 {
    if machine.is_null() || out.is_null() {
        return -1;
    }
    let machine = unsafe { &*machine };
    let buffer = unsafe { slice::from_raw_parts_mut(out, cap) };
    match machine.save_state(buffer) {
        Ok(size) => size as i32,
        Err(_) => -100,
    }
}

/// Load machine state from a buffer. Returns 0 on success, negative error
/// code on failure.
#[no_mangle]
pub extern "C" fn emu_load_state(machine: *mut Machine, data: *const u8, len: usize) -> i32 {
    if machine.is_null() || data.is_null() {
        return -1;
    }
    let machine = unsafe { &mut *machine };
    let buffer = unsafe { slice::from_raw_parts(data, len) };
    match machine.load_state(buffer) {
        Ok(()) => 0,
        Err(_) => -100,
    }
}

/// Take the most recently flushed tape capture (one CAS-format file), if
/// any. Returns the number of bytes written into `out`, 0 if no capture is
/// pending, or negative if `out` is too small (the capture is retained in
/// that case so the host can retry with a larger buffer).
#[no_mangle]
pub extern "C" fn emu_take_tape_output(machine: *mut Machine, out: *mut u8, cap: usize) -> i32 {
    if machine.is_null() || out.is_null() {
        return -1;
    }
    let machine = unsafe { &mut *machine };
    match machine.take_tape_output() {
        Some(bytes) if bytes.len() <= cap => {
            let buffer = unsafe { slice::from_raw_parts_mut(out, cap) };
            buffer[..bytes.len()].copy_from_slice(&bytes);
            bytes.len() as i32
        }
        Some(_) => -2,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_destroy() {
        let machine = emu_create();
        assert!(!machine.is_null());
        emu_destroy(machine);
    }

    #[test]
    fn test_framebuffer_dimensions() {
        let machine = emu_create();
        let mut w: i32 = 0;
        let mut h: i32 = 0;
        let fb = emu_framebuffer(machine, &mut w, &mut h);
        assert!(!fb.is_null());
        assert_eq!(w, 256);
        assert_eq!(h, 192);
        emu_destroy(machine);
    }

    #[test]
    fn test_load_rom_null_pointer_rejected() {
        let machine = emu_create();
        let code = emu_load_rom(machine, 0xC000, ptr::null(), 0);
        assert_eq!(code, -1);
        emu_destroy(machine);
    }

    #[test]
    fn test_load_empty_rom_fails() {
        let machine = emu_create();
        let data: [u8; 0] = [];
        let code = emu_load_rom(machine, 0xC000, data.as_ptr(), 0);
        assert_eq!(code, -2);
        emu_destroy(machine);
    }

    #[test]
    fn test_load_rom_and_step() {
        let machine = emu_create();
        let rom = [0x12u8, 0x12, 0x3F]; // NOP, NOP, SWI
        let code = emu_load_rom(machine, 0xC000, rom.as_ptr(), rom.len());
        assert_eq!(code, 0);
        let cycles = emu_step(machine);
        assert!(cycles > 0);
        emu_destroy(machine);
    }

    #[test]
    fn test_scan_code_round_trip_does_not_panic() {
        let machine = emu_create();
        emu_set_scan_code(machine, 0x0A, 1);
        emu_set_scan_code(machine, 0x0A, 0);
        emu_destroy(machine);
    }
}
