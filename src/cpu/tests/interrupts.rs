//! Interrupt acceptance, priority, and stacking tests
//!
//! # References
//! - Motorola MC6809E datasheet (MC6809-D), interrupt section

use crate::bus::Bus;
use crate::cpu::{flags, vectors, Cpu, CpuState};

/// CPU with S initialized (disarming the post-reset NMI mask), interrupt
/// masks cleared, and the three service vectors pointing at distinct
/// handlers that immediately RTI.
fn interruptible_cpu(bus: &mut Bus) -> Cpu {
    let mut cpu = Cpu::new();
    bus.load(vectors::NMI, &[0x40, 0x00]);
    bus.load(vectors::FIRQ, &[0x50, 0x00]);
    bus.load(vectors::IRQ, &[0x60, 0x00]);
    bus.load(0x4000, &[0x3B]); // RTI
    bus.load(0x5000, &[0x3B]);
    bus.load(0x6000, &[0x3B]);
    bus.load(0x2000, &[0x12, 0x12, 0x12, 0x12]); // NOPs
    cpu.pc = 0x2000;
    cpu.s = 0x7F00;
    cpu.mark_s_initialized();
    cpu.set_flag(flags::I, false);
    cpu.set_flag(flags::F, false);
    cpu
}

#[test]
fn priority_is_nmi_then_firq_then_irq() {
    let mut bus = Bus::new();
    let mut cpu = interruptible_cpu(&mut bus);
    cpu.nmi();
    cpu.firq();
    cpu.irq();

    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x4000, "NMI vectors first");

    // NMI entry masked I and F; RTI restores the pre-interrupt CC, after
    // which FIRQ outranks IRQ.
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x5000, "FIRQ after RTI");

    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x6000, "IRQ last");
}

#[test]
fn irq_pushes_twelve_bytes_in_documented_order() {
    let mut bus = Bus::new();
    let mut cpu = interruptible_cpu(&mut bus);
    cpu.a = 0xA1;
    cpu.b = 0xB2;
    cpu.x = 0x1122;
    cpu.y = 0x3344;
    cpu.u = 0x5566;
    cpu.dp = 0xD7;
    let cc_before = cpu.cc | flags::E; // E is set as part of the stacking
    cpu.irq();
    cpu.step(&mut bus);

    assert_eq!(cpu.s, 0x7F00 - 12);
    // Top of stack upward: CC, A, B, DP, X, Y, U, PC.
    assert_eq!(bus.read(cpu.s), cc_before);
    assert_eq!(bus.read(cpu.s + 1), 0xA1);
    assert_eq!(bus.read(cpu.s + 2), 0xB2);
    assert_eq!(bus.read(cpu.s + 3), 0xD7);
    assert_eq!(bus.read(cpu.s + 4), 0x11);
    assert_eq!(bus.read(cpu.s + 5), 0x22);
    assert_eq!(bus.read(cpu.s + 6), 0x33);
    assert_eq!(bus.read(cpu.s + 7), 0x44);
    assert_eq!(bus.read(cpu.s + 8), 0x55);
    assert_eq!(bus.read(cpu.s + 9), 0x66);
    assert_eq!(bus.read(cpu.s + 10), 0x20);
    assert_eq!(bus.read(cpu.s + 11), 0x00);
}

#[test]
fn firq_pushes_only_pc_and_cc_with_e_clear() {
    let mut bus = Bus::new();
    let mut cpu = interruptible_cpu(&mut bus);
    cpu.set_flag(flags::E, true); // must be cleared by FIRQ stacking
    cpu.firq();
    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x5000);
    assert_eq!(cpu.s, 0x7F00 - 3);
    assert!(bus.read(cpu.s) & flags::E == 0, "E clear in the stacked CC");
    assert_eq!(bus.read(cpu.s + 1), 0x20);
    assert_eq!(bus.read(cpu.s + 2), 0x00);
    assert!(cpu.flag(flags::F) && cpu.flag(flags::I), "FIRQ masks both lines");
}

#[test]
fn rti_after_firq_pops_the_short_frame() {
    let mut bus = Bus::new();
    let mut cpu = interruptible_cpu(&mut bus);
    cpu.firq();
    cpu.step(&mut bus);
    cpu.step(&mut bus); // RTI
    assert_eq!(cpu.pc, 0x2000);
    assert_eq!(cpu.s, 0x7F00);
}

#[test]
fn nmi_is_masked_until_s_is_first_written() {
    let mut bus = Bus::new();
    let mut cpu = Cpu::new(); // cold reset: NMI armed only after S init
    bus.load(vectors::NMI, &[0x40, 0x00]);
    bus.load(0x2000, &[0x12, 0x10, 0xCE, 0x7F, 0x00, 0x12]); // NOP; LDS #$7F00; NOP
    cpu.pc = 0x2000;

    cpu.nmi();
    cpu.step(&mut bus);
    assert_ne!(cpu.pc, 0x4000, "NMI ignored before the first S write");

    cpu.step(&mut bus); // LDS disarms the mask
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x4000, "latched NMI taken at the next boundary");
}

#[test]
fn masked_irq_stays_latched_until_unmasked() {
    let mut bus = Bus::new();
    let mut cpu = interruptible_cpu(&mut bus);
    cpu.set_flag(flags::I, true);
    cpu.irq();
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x2001, "masked IRQ does not vector");
    cpu.set_flag(flags::I, false);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x6000);
}

#[test]
fn cwai_stacks_once_and_wakes_without_restacking() {
    let mut bus = Bus::new();
    let mut cpu = interruptible_cpu(&mut bus);
    bus.load(0x2000, &[0x3C, 0xEF]); // CWAI #$EF (clear I, wait)
    cpu.step(&mut bus);
    assert_eq!(cpu.state, CpuState::WaitingInterrupt);
    let s_after_cwai = cpu.s;
    assert_eq!(s_after_cwai, 0x7F00 - 12, "CWAI pushes the full frame up front");

    cpu.step(&mut bus);
    assert_eq!(cpu.state, CpuState::WaitingInterrupt, "still waiting, no line yet");

    cpu.irq();
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x6000);
    assert_eq!(cpu.s, s_after_cwai, "wake-up must not push a second frame");

    cpu.step(&mut bus); // RTI unwinds the CWAI frame
    assert_eq!(cpu.pc, 0x2002);
    assert_eq!(cpu.s, 0x7F00);
}

#[test]
fn sync_waits_for_an_unmasked_line() {
    let mut bus = Bus::new();
    let mut cpu = interruptible_cpu(&mut bus);
    bus.load(0x2000, &[0x13, 0x12]); // SYNC; NOP
    cpu.step(&mut bus);
    assert_eq!(cpu.state, CpuState::Syncing);
    cpu.step(&mut bus);
    assert_eq!(cpu.state, CpuState::Syncing);
    cpu.irq();
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x6000);
}

#[test]
fn swi2_and_swi3_do_not_touch_the_masks() {
    let mut bus = Bus::new();
    let mut cpu = interruptible_cpu(&mut bus);
    bus.load(vectors::SWI2, &[0x70, 0x00]);
    cpu.s = 0x7F00;
    bus.load(0x2000, &[0x10, 0x3F]); // SWI2
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x7000);
    assert!(!cpu.flag(flags::I), "SWI2 leaves I untouched");
    assert!(!cpu.flag(flags::F), "SWI2 leaves F untouched");
    assert!(cpu.flag(flags::E));
}
