//! Boot trace harness
//!
//! Loads a ROM image, runs a bounded number of instructions, and dumps
//! the register file plus the execution-history ring buffer. Useful for
//! comparing boot behavior against another emulator's trace.
//!
//! Usage: trace <rom-file> [instruction-count] [load-base-hex]

use std::env;
use std::fs;
use std::process::ExitCode;

use chrono::Local;
use dragon32_core::machine::{Machine, ROM_BASE};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(rom_path) = args.get(1) else {
        eprintln!("usage: trace <rom-file> [instruction-count] [load-base-hex]");
        return ExitCode::FAILURE;
    };
    let count: u64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1_000_000);
    let base: u16 = args
        .get(3)
        .and_then(|s| u16::from_str_radix(s.trim_start_matches("0x"), 16).ok())
        .unwrap_or(ROM_BASE);

    let rom = match fs::read(rom_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {rom_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut machine = Machine::new();
    if let Err(err) = machine.load_rom(base, &rom) {
        eprintln!("failed to load ROM: {err:?}");
        return ExitCode::FAILURE;
    }

    println!(
        "[{}] tracing {} instructions from {rom_path} (base {base:04X})",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        count
    );

    for executed in 0..count {
        machine.step();
        if !matches!(
            machine.cpu_state(),
            dragon32_core::cpu::CpuState::Running
        ) {
            println!(
                "stopped after {executed} instructions: {:?} at PC={:04X} ({})",
                machine.cpu_state(),
                machine.pc(),
                machine.mnemonic_at(machine.pc())
            );
            break;
        }
    }

    println!("{}", machine.dump_registers());
    println!("{}", machine.dump_history());
    println!(
        "[{}] done, {} cycles",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        machine.total_cycles()
    );
    ExitCode::SUCCESS
}
