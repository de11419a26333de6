//! Host-facing scheduling loop
//!
//! This core has a fixed set of periodic concerns: CPU instruction
//! stepping, the WD2797's 1 ms interrupt tick, the 50 Hz VDG
//! refresh/vsync IRQ, and the reset button's hold timer. A single
//! `Executive::poll` services all of them against the host's
//! microsecond clock, so there is no general-purpose timer table.

use crate::host::{motor, FunctionKey, HostIo};
use crate::machine::Machine;

const DISK_TICK_US: u32 = 1_000;
const VSYNC_TICK_US: u32 = 20_000;
const COLD_RESET_HOLD_US: u32 = 1_500_000;

/// Tracks the accumulated microsecond timers the executive polls every
/// iteration, plus the output levels already forwarded to the host so
/// DAC/mux/LED calls only fire on change.
pub struct Executive {
    last_disk_tick_us: u32,
    last_vsync_us: u32,
    reset_held_since: Option<u32>,
    suspended: bool,
    halted: bool,
    last_dac: u8,
    last_mux: u8,
    led_state: u8,
}

impl Executive {
    pub fn new() -> Self {
        Self {
            last_disk_tick_us: 0,
            last_vsync_us: 0,
            reset_held_since: None,
            suspended: false,
            halted: false,
            last_dac: 0,
            last_mux: 0,
            led_state: 0,
        }
    }

    /// One executive iteration: step the CPU, service periodic
    /// ticks due at `now_us`, poll the reset button, keyboard and
    /// function-key channel, and mirror output lines to the host.
    /// Returns `true` if the CPU actually stepped (false while suspended
    /// for `LOADER_ESCAPE`).
    pub fn poll(&mut self, machine: &mut Machine, host: &mut impl HostIo) -> bool {
        let now = host.now_us();

        if self.suspended || self.halted {
            self.poll_reset(machine, host, now);
            return false;
        }

        machine.step();
        if machine.cpu_state() == crate::cpu::CpuState::Exception {
            // Fatal invariant violation: emit the diagnostic dump and
            // stop stepping. RESET is the only way back.
            self.halted = true;
            let diagnostic = format!("{}\n{}", machine.dump_registers(), machine.dump_history());
            host.halt(&diagnostic);
            return false;
        }
        self.poll_reset(machine, host, now);

        if now.wrapping_sub(self.last_disk_tick_us) >= DISK_TICK_US {
            self.last_disk_tick_us = now;
            machine.tick_disk_1ms();
        }

        if now.wrapping_sub(self.last_vsync_us) >= VSYNC_TICK_US {
            self.last_vsync_us = now;
            machine.vsync();
        }

        self.poll_keyboard(machine, host);
        self.sync_outputs(machine, host);
        self.service_tape(machine, host);

        true
    }

    fn poll_keyboard(&mut self, machine: &mut Machine, host: &mut impl HostIo) {
        let code = host.read_scan_code();
        if code != 0 {
            // Bit 7 marks an XT break code (key release).
            machine.set_scan_code(code & 0x7F, code & 0x80 == 0);
        }
        if machine.take_function_key() == FunctionKey::LoaderEscape {
            self.suspended = true;
        }
    }

    /// Mirror the PIA-driven output lines out to the host: DAC level,
    /// sound mux select, joystick comparator sample, and the motor LEDs.
    fn sync_outputs(&mut self, machine: &mut Machine, host: &mut impl HostIo) {
        let dac = machine.dac_value();
        if dac != self.last_dac {
            self.last_dac = dac;
            host.write_dac(dac);
        }
        let mux = machine.audio_mux_select();
        if mux != self.last_mux {
            self.last_mux = mux;
            host.audio_mux_select(mux);
        }
        // The host guarantees the comparator sample respects the DAC
        // settle time, so it is safe to read back every iteration.
        machine.set_joystick(host.joystick_button(), host.joystick_comparator());

        let mut leds = 0u8;
        if machine.disk_motor_on() {
            leds |= motor::DISK;
        }
        if machine.tape_motor_on() {
            leds |= motor::TAPE;
        }
        let turned_on = leds & !self.led_state;
        let turned_off = self.led_state & !leds;
        if turned_on != 0 {
            host.motor_led_on(turned_on);
        }
        if turned_off != 0 {
            host.motor_led_off(turned_off);
        }
        self.led_state = leds;
    }

    /// Flush a completed tape capture out through the host's file writer.
    fn service_tape(&mut self, machine: &mut Machine, host: &mut impl HostIo) {
        if let Some(bytes) = machine.take_tape_output() {
            let filename = machine.tape_filename().to_vec();
            // Write faults are a host/media concern; the capture is gone
            // either way, matching a real deck's fire-and-forget write.
            let _ = host.tape_write(&filename, &bytes);
        }
    }

    /// Short press (< 1.5 s) triggers a warm reset on release; a hold past
    /// `COLD_RESET_HOLD_US` zeros the cold-start marker (0x0071) and forces
    /// a cold reset immediately.
    fn poll_reset(&mut self, machine: &mut Machine, host: &mut impl HostIo, now: u32) {
        let pressed = !host.reset_button();
        match (pressed, self.reset_held_since) {
            (true, None) => self.reset_held_since = Some(now),
            (true, Some(since)) => {
                if now.wrapping_sub(since) >= COLD_RESET_HOLD_US {
                    machine.bus_mut().write(0x0071, 0);
                    machine.reset(true);
                    self.reset_held_since = None;
                    self.suspended = false;
                    self.halted = false;
                }
            }
            (false, Some(_)) => {
                machine.reset(false);
                self.reset_held_since = None;
                self.halted = false;
            }
            (false, None) => {}
        }
    }

    /// Hand control back after a `LOADER_ESCAPE` suspension (called by
    /// the loader collaborator once it is done).
    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

impl Default for Executive {
    fn default() -> Self {
        Self::new()
    }
}
