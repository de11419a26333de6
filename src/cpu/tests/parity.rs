//! Exhaustive ALU flag sweeps
//!
//! Flag determinism: for every instruction the resulting (outputs, CC)
//! must be a pure function of (inputs, CC). These sweeps run the 8-bit
//! ALU across the full input space and check every flag bit against
//! reference formulas computed independently of the interpreter's own
//! helpers.
//!
//! Reference formulas (MC6809E datasheet):
//! - Overflow add: `(op1 ^ result) & (op2 ^ result) & 0x80`
//! - Overflow sub: `(op1 ^ op2) & (op1 ^ result) & 0x80`
//! - Half-carry:   `((op1 & 0x0F) + (op2 & 0x0F) + carry) & 0x10`

use crate::bus::Bus;
use crate::cpu::{flags, Cpu};

fn flag_set(cpu: &Cpu, mask: u8) -> bool {
    cpu.cc & mask != 0
}

/// Execute a 2-byte immediate opcode with the given A and carry-in.
fn run_imm(cpu: &mut Cpu, bus: &mut Bus, opcode: u8, a: u8, operand: u8, carry_in: bool) {
    cpu.a = a;
    cpu.set_flag(flags::C, carry_in);
    bus.load(0x2000, &[opcode, operand]);
    cpu.pc = 0x2000;
    cpu.step(bus);
}

#[test]
fn adda_flags_match_reference_for_all_inputs() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for a in 0..=255u8 {
        for b in (0..=255u8).step_by(7) {
            run_imm(&mut cpu, &mut bus, 0x8B, a, b, false);
            let full = a as u16 + b as u16;
            let result = full as u8;
            assert_eq!(cpu.a, result);
            assert_eq!(flag_set(&cpu, flags::C), full > 0xFF, "C a={a} b={b}");
            assert_eq!(flag_set(&cpu, flags::Z), result == 0, "Z a={a} b={b}");
            assert_eq!(flag_set(&cpu, flags::N), result & 0x80 != 0, "N a={a} b={b}");
            assert_eq!(
                flag_set(&cpu, flags::V),
                (a ^ result) & (b ^ result) & 0x80 != 0,
                "V a={a} b={b}"
            );
            assert_eq!(
                flag_set(&cpu, flags::H),
                ((a & 0x0F) + (b & 0x0F)) & 0x10 != 0,
                "H a={a} b={b}"
            );
        }
    }
}

#[test]
fn adca_folds_carry_into_sum_and_half_carry() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for a in (0..=255u8).step_by(3) {
        for b in (0..=255u8).step_by(11) {
            for carry in [false, true] {
                run_imm(&mut cpu, &mut bus, 0x89, a, b, carry);
                let full = a as u16 + b as u16 + carry as u16;
                assert_eq!(cpu.a, full as u8, "a={a} b={b} c={carry}");
                assert_eq!(flag_set(&cpu, flags::C), full > 0xFF, "C a={a} b={b} c={carry}");
                assert_eq!(
                    flag_set(&cpu, flags::H),
                    ((a & 0x0F) + (b & 0x0F) + carry as u8) & 0x10 != 0,
                    "H a={a} b={b} c={carry}"
                );
            }
        }
    }
}

#[test]
fn suba_flags_match_reference_for_all_inputs() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for a in 0..=255u8 {
        for b in (0..=255u8).step_by(7) {
            run_imm(&mut cpu, &mut bus, 0x80, a, b, false);
            let result = a.wrapping_sub(b);
            assert_eq!(cpu.a, result);
            assert_eq!(flag_set(&cpu, flags::C), b > a, "C borrow a={a} b={b}");
            assert_eq!(flag_set(&cpu, flags::Z), result == 0, "Z a={a} b={b}");
            assert_eq!(flag_set(&cpu, flags::N), result & 0x80 != 0, "N a={a} b={b}");
            assert_eq!(
                flag_set(&cpu, flags::V),
                (a ^ b) & (a ^ result) & 0x80 != 0,
                "V a={a} b={b}"
            );
        }
    }
}

#[test]
fn sbca_borrows_through_carry() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for a in (0..=255u8).step_by(5) {
        for b in (0..=255u8).step_by(13) {
            for carry in [false, true] {
                run_imm(&mut cpu, &mut bus, 0x82, a, b, carry);
                let full = a as i16 - b as i16 - carry as i16;
                assert_eq!(cpu.a, full as u8, "a={a} b={b} c={carry}");
                assert_eq!(flag_set(&cpu, flags::C), full < 0, "C a={a} b={b} c={carry}");
            }
        }
    }
}

#[test]
fn neg_carry_and_overflow_edges() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for a in 0..=255u8 {
        cpu.a = a;
        bus.load(0x2000, &[0x40]); // NEGA
        cpu.pc = 0x2000;
        cpu.step(&mut bus);
        let result = 0u8.wrapping_sub(a);
        assert_eq!(cpu.a, result);
        assert_eq!(flag_set(&cpu, flags::C), a != 0, "C = operand non-zero, a={a}");
        assert_eq!(flag_set(&cpu, flags::V), a == 0x80, "V only at 0x80, a={a}");
        assert_eq!(flag_set(&cpu, flags::Z), result == 0);
        assert_eq!(flag_set(&cpu, flags::N), result & 0x80 != 0);
    }
}

#[test]
fn shifts_and_rotates_route_the_carry_correctly() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for a in 0..=255u8 {
        for carry in [false, true] {
            // ROLA: result = a<<1 | carry_in, C = old bit 7.
            cpu.a = a;
            cpu.set_flag(flags::C, carry);
            bus.load(0x2000, &[0x49]);
            cpu.pc = 0x2000;
            cpu.step(&mut bus);
            assert_eq!(cpu.a, (a << 1) | carry as u8, "ROLA a={a} c={carry}");
            assert_eq!(flag_set(&cpu, flags::C), a & 0x80 != 0, "ROLA C a={a}");

            // RORA: result = carry_in<<7 | a>>1, C = old bit 0.
            cpu.a = a;
            cpu.set_flag(flags::C, carry);
            bus.load(0x2000, &[0x46]);
            cpu.pc = 0x2000;
            cpu.step(&mut bus);
            assert_eq!(cpu.a, ((carry as u8) << 7) | (a >> 1), "RORA a={a} c={carry}");
            assert_eq!(flag_set(&cpu, flags::C), a & 0x01 != 0, "RORA C a={a}");
        }

        // ASRA preserves the sign bit.
        cpu.a = a;
        bus.load(0x2000, &[0x47]);
        cpu.pc = 0x2000;
        cpu.step(&mut bus);
        assert_eq!(cpu.a, ((a as i8) >> 1) as u8, "ASRA a={a}");
        assert_eq!(flag_set(&cpu, flags::C), a & 0x01 != 0);
    }
}

#[test]
fn daa_corrects_every_bcd_sum() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    // For all valid packed-BCD operand pairs, ADDA then DAA must produce
    // the decimal sum mod 100 with C reporting the decimal carry.
    for x in 0..100u8 {
        for y in 0..100u8 {
            let a = ((x / 10) << 4) | (x % 10);
            let b = ((y / 10) << 4) | (y % 10);
            run_imm(&mut cpu, &mut bus, 0x8B, a, b, false);
            bus.load(0x2002, &[0x19]); // DAA
            cpu.step(&mut bus);
            let sum = x as u16 + y as u16;
            let expected = (((sum / 10) % 10) << 4) as u8 | (sum % 10) as u8;
            assert_eq!(cpu.a, expected, "DAA {x}+{y}");
            assert_eq!(flag_set(&cpu, flags::C), sum > 99, "DAA carry {x}+{y}");
        }
    }
}

#[test]
fn mul_produces_unsigned_product_with_c_from_bit_7() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for a in (0..=255u8).step_by(3) {
        for b in (0..=255u8).step_by(17) {
            cpu.a = a;
            cpu.b = b;
            bus.load(0x2000, &[0x3D]);
            cpu.pc = 0x2000;
            cpu.step(&mut bus);
            let product = a as u16 * b as u16;
            assert_eq!(cpu.d(), product, "MUL {a}*{b}");
            assert_eq!(flag_set(&cpu, flags::Z), product == 0);
            assert_eq!(flag_set(&cpu, flags::C), product & 0x80 != 0);
        }
    }
}

#[test]
fn sex_sign_extends_b_into_d() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for b in 0..=255u8 {
        cpu.b = b;
        bus.load(0x2000, &[0x1D]);
        cpu.pc = 0x2000;
        cpu.step(&mut bus);
        assert_eq!(cpu.d(), b as i8 as i16 as u16, "SEX b={b}");
    }
}

#[test]
fn logic_ops_clear_v_and_set_nz() {
    let mut cpu = Cpu::new();
    let mut bus = Bus::new();
    for a in (0..=255u8).step_by(3) {
        for b in (0..=255u8).step_by(19) {
            for (opcode, expected) in [(0x84u8, a & b), (0x8A, a | b), (0x88, a ^ b)] {
                cpu.set_flag(flags::V, true);
                run_imm(&mut cpu, &mut bus, opcode, a, b, false);
                assert_eq!(cpu.a, expected);
                assert!(!flag_set(&cpu, flags::V), "logic clears V");
                assert_eq!(flag_set(&cpu, flags::Z), expected == 0);
                assert_eq!(flag_set(&cpu, flags::N), expected & 0x80 != 0);
            }
        }
    }
}
