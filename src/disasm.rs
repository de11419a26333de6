//! MC6809E disassembler
//!
//! Used by `Cpu::mnemonic_at` for trace/debug dumps; not part of the
//! execution path. Covers the page-1 opcode map in full and the page-2/
//! page-3 (0x10/0x11 prefixed) extensions as a mnemonic table, since those
//! pages only add long branches and a handful of 16-bit compare/load
//! opcodes over their page-1 counterparts.

/// Result of disassembling one instruction.
#[derive(Debug, Clone)]
pub struct DisasmResult {
    pub bytes: String,
    pub mnemonic: String,
    pub length: usize,
}

pub fn disassemble(opcode: &[u8]) -> DisasmResult {
    if opcode.is_empty() {
        return DisasmResult {
            bytes: String::new(),
            mnemonic: "???".to_string(),
            length: 0,
        };
    }

    let (mnemonic, length) = disasm_main(opcode);
    let bytes = opcode[..length.min(opcode.len())]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ");

    DisasmResult {
        bytes,
        mnemonic,
        length,
    }
}

fn disasm_main(opcode: &[u8]) -> (String, usize) {
    match opcode[0] {
        0x10 => {
            if opcode.len() < 2 {
                return ("LBRA?".to_string(), 1);
            }
            let (mnemonic, inner_len) = page2_mnemonic(opcode[1], &opcode[2..]);
            (mnemonic, 2 + inner_len)
        }
        0x11 => {
            if opcode.len() < 2 {
                return ("SWI2/3?".to_string(), 1);
            }
            let (mnemonic, inner_len) = page3_mnemonic(opcode[1], &opcode[2..]);
            (mnemonic, 2 + inner_len)
        }
        op => page1_mnemonic(op, &opcode[1..]),
    }
}

fn byte_at(rest: &[u8], i: usize) -> u8 {
    rest.get(i).copied().unwrap_or(0)
}

fn word_at(rest: &[u8], i: usize) -> u16 {
    ((byte_at(rest, i) as u16) << 8) | byte_at(rest, i + 1) as u16
}

/// Indexed postbyte operands are rendered opaquely as `,X` since decoding
/// the full postbyte table is the addressing-mode resolver's job
/// (`cpu::helpers::indexed_effective_address`), not the disassembler's.
fn page1_mnemonic(op: u8, rest: &[u8]) -> (String, usize) {
    macro_rules! imm8 {
        ($name:expr) => {
            (format!("{} #${:02X}", $name, byte_at(rest, 0)), 2)
        };
    }
    macro_rules! imm16 {
        ($name:expr) => {
            (format!("{} #${:04X}", $name, word_at(rest, 0)), 3)
        };
    }
    macro_rules! dir {
        ($name:expr) => {
            (format!("{} <${:02X}", $name, byte_at(rest, 0)), 2)
        };
    }
    macro_rules! idx {
        ($name:expr) => {
            (format!("{} ,X", $name), 2)
        };
    }
    macro_rules! ext {
        ($name:expr) => {
            (format!("{} >${:04X}", $name, word_at(rest, 0)), 3)
        };
    }
    macro_rules! inh {
        ($name:expr) => {
            ($name.to_string(), 1)
        };
    }
    macro_rules! rel8 {
        ($name:expr) => {
            (format!("{} ${:02X}", $name, byte_at(rest, 0)), 2)
        };
    }

    match op {
        0x00 => dir!("NEG"),
        0x03 => dir!("COM"),
        0x04 => dir!("LSR"),
        0x06 => dir!("ROR"),
        0x07 => dir!("ASR"),
        0x08 => dir!("LSL"),
        0x09 => dir!("ROL"),
        0x0A => dir!("DEC"),
        0x0C => dir!("INC"),
        0x0D => dir!("TST"),
        0x0E => dir!("JMP"),
        0x0F => dir!("CLR"),

        0x12 => inh!("NOP"),
        0x13 => inh!("SYNC"),
        0x16 => (format!("LBRA ${:04X}", word_at(rest, 0)), 3),
        0x17 => (format!("LBSR ${:04X}", word_at(rest, 0)), 3),
        0x19 => inh!("DAA"),
        0x1A => imm8!("ORCC"),
        0x1C => imm8!("ANDCC"),
        0x1D => inh!("SEX"),
        0x1E => imm8!("EXG"),
        0x1F => imm8!("TFR"),

        0x20 => rel8!("BRA"),
        0x21 => rel8!("BRN"),
        0x22 => rel8!("BHI"),
        0x23 => rel8!("BLS"),
        0x24 => rel8!("BCC"),
        0x25 => rel8!("BCS"),
        0x26 => rel8!("BNE"),
        0x27 => rel8!("BEQ"),
        0x28 => rel8!("BVC"),
        0x29 => rel8!("BVS"),
        0x2A => rel8!("BPL"),
        0x2B => rel8!("BMI"),
        0x2C => rel8!("BGE"),
        0x2D => rel8!("BLT"),
        0x2E => rel8!("BGT"),
        0x2F => rel8!("BLE"),

        0x30 => idx!("LEAX"),
        0x31 => idx!("LEAY"),
        0x32 => idx!("LEAS"),
        0x33 => idx!("LEAU"),
        0x34 => imm8!("PSHS"),
        0x35 => imm8!("PULS"),
        0x36 => imm8!("PSHU"),
        0x37 => imm8!("PULU"),
        0x39 => inh!("RTS"),
        0x3A => inh!("ABX"),
        0x3B => inh!("RTI"),
        0x3C => imm8!("CWAI"),
        0x3D => inh!("MUL"),
        0x3F => inh!("SWI"),

        0x40 => inh!("NEGA"),
        0x43 => inh!("COMA"),
        0x44 => inh!("LSRA"),
        0x46 => inh!("RORA"),
        0x47 => inh!("ASRA"),
        0x48 => inh!("LSLA"),
        0x49 => inh!("ROLA"),
        0x4A => inh!("DECA"),
        0x4C => inh!("INCA"),
        0x4D => inh!("TSTA"),
        0x4F => inh!("CLRA"),

        0x50 => inh!("NEGB"),
        0x53 => inh!("COMB"),
        0x54 => inh!("LSRB"),
        0x56 => inh!("RORB"),
        0x57 => inh!("ASRB"),
        0x58 => inh!("LSLB"),
        0x59 => inh!("ROLB"),
        0x5A => inh!("DECB"),
        0x5C => inh!("INCB"),
        0x5D => inh!("TSTB"),
        0x5F => inh!("CLRB"),

        0x60 => idx!("NEG"),
        0x63 => idx!("COM"),
        0x64 => idx!("LSR"),
        0x66 => idx!("ROR"),
        0x67 => idx!("ASR"),
        0x68 => idx!("LSL"),
        0x69 => idx!("ROL"),
        0x6A => idx!("DEC"),
        0x6C => idx!("INC"),
        0x6D => idx!("TST"),
        0x6E => idx!("JMP"),
        0x6F => idx!("CLR"),

        0x70 => ext!("NEG"),
        0x73 => ext!("COM"),
        0x74 => ext!("LSR"),
        0x76 => ext!("ROR"),
        0x77 => ext!("ASR"),
        0x78 => ext!("LSL"),
        0x79 => ext!("ROL"),
        0x7A => ext!("DEC"),
        0x7C => ext!("INC"),
        0x7D => ext!("TST"),
        0x7E => ext!("JMP"),
        0x7F => ext!("CLR"),

        0x80 => imm8!("SUBA"),
        0x81 => imm8!("CMPA"),
        0x82 => imm8!("SBCA"),
        0x83 => imm16!("SUBD"),
        0x84 => imm8!("ANDA"),
        0x85 => imm8!("BITA"),
        0x86 => imm8!("LDA"),
        0x88 => imm8!("EORA"),
        0x89 => imm8!("ADCA"),
        0x8A => imm8!("ORA"),
        0x8B => imm8!("ADDA"),
        0x8C => imm16!("CMPX"),
        0x8D => rel8!("BSR"),
        0x8E => imm16!("LDX"),

        0x90 => dir!("SUBA"),
        0x91 => dir!("CMPA"),
        0x92 => dir!("SBCA"),
        0x93 => dir!("SUBD"),
        0x94 => dir!("ANDA"),
        0x95 => dir!("BITA"),
        0x96 => dir!("LDA"),
        0x97 => dir!("STA"),
        0x98 => dir!("EORA"),
        0x99 => dir!("ADCA"),
        0x9A => dir!("ORA"),
        0x9B => dir!("ADDA"),
        0x9C => dir!("CMPX"),
        0x9D => dir!("JSR"),
        0x9E => dir!("LDX"),
        0x9F => dir!("STX"),

        0xA0 => idx!("SUBA"),
        0xA1 => idx!("CMPA"),
        0xA2 => idx!("SBCA"),
        0xA3 => idx!("SUBD"),
        0xA4 => idx!("ANDA"),
        0xA5 => idx!("BITA"),
        0xA6 => idx!("LDA"),
        0xA7 => idx!("STA"),
        0xA8 => idx!("EORA"),
        0xA9 => idx!("ADCA"),
        0xAA => idx!("ORA"),
        0xAB => idx!("ADDA"),
        0xAC => idx!("CMPX"),
        0xAD => idx!("JSR"),
        0xAE => idx!("LDX"),
        0xAF => idx!("STX"),

        0xB0 => ext!("SUBA"),
        0xB1 => ext!("CMPA"),
        0xB2 => ext!("SBCA"),
        0xB3 => ext!("SUBD"),
        0xB4 => ext!("ANDA"),
        0xB5 => ext!("BITA"),
        0xB6 => ext!("LDA"),
        0xB7 => ext!("STA"),
        0xB8 => ext!("EORA"),
        0xB9 => ext!("ADCA"),
        0xBA => ext!("ORA"),
        0xBB => ext!("ADDA"),
        0xBC => ext!("CMPX"),
        0xBD => ext!("JSR"),
        0xBE => ext!("LDX"),
        0xBF => ext!("STX"),

        0xC0 => imm8!("SUBB"),
        0xC1 => imm8!("CMPB"),
        0xC2 => imm8!("SBCB"),
        0xC3 => imm16!("ADDD"),
        0xC4 => imm8!("ANDB"),
        0xC5 => imm8!("BITB"),
        0xC6 => imm8!("LDB"),
        0xC8 => imm8!("EORB"),
        0xC9 => imm8!("ADCB"),
        0xCA => imm8!("ORB"),
        0xCB => imm8!("ADDB"),
        0xCC => imm16!("LDD"),
        0xCE => imm16!("LDU"),

        0xD0 => dir!("SUBB"),
        0xD1 => dir!("CMPB"),
        0xD2 => dir!("SBCB"),
        0xD3 => dir!("ADDD"),
        0xD4 => dir!("ANDB"),
        0xD5 => dir!("BITB"),
        0xD6 => dir!("LDB"),
        0xD7 => dir!("STB"),
        0xD8 => dir!("EORB"),
        0xD9 => dir!("ADCB"),
        0xDA => dir!("ORB"),
        0xDB => dir!("ADDB"),
        0xDC => dir!("LDD"),
        0xDD => dir!("STD"),
        0xDE => dir!("LDU"),
        0xDF => dir!("STU"),

        0xE0 => idx!("SUBB"),
        0xE1 => idx!("CMPB"),
        0xE2 => idx!("SBCB"),
        0xE3 => idx!("ADDD"),
        0xE4 => idx!("ANDB"),
        0xE5 => idx!("BITB"),
        0xE6 => idx!("LDB"),
        0xE7 => idx!("STB"),
        0xE8 => idx!("EORB"),
        0xE9 => idx!("ADCB"),
        0xEA => idx!("ORB"),
        0xEB => idx!("ADDB"),
        0xEC => idx!("LDD"),
        0xED => idx!("STD"),
        0xEE => idx!("LDU"),
        0xEF => idx!("STU"),

        0xF0 => ext!("SUBB"),
        0xF1 => ext!("CMPB"),
        0xF2 => ext!("SBCB"),
        0xF3 => ext!("ADDD"),
        0xF4 => ext!("ANDB"),
        0xF5 => ext!("BITB"),
        0xF6 => ext!("LDB"),
        0xF7 => ext!("STB"),
        0xF8 => ext!("EORB"),
        0xF9 => ext!("ADCB"),
        0xFA => ext!("ORB"),
        0xFB => ext!("ADDB"),
        0xFC => ext!("LDD"),
        0xFD => ext!("STD"),
        0xFE => ext!("LDU"),
        0xFF => ext!("STU"),

        _ => ("???".to_string(), 1),
    }
}

fn page2_mnemonic(op: u8, rest: &[u8]) -> (String, usize) {
    let long_branch = |name: &str| (format!("{} ${:04X}", name, word_at(rest, 0)), 2);
    match op {
        0x21 => long_branch("LBRN"),
        0x22 => long_branch("LBHI"),
        0x23 => long_branch("LBLS"),
        0x24 => long_branch("LBCC"),
        0x25 => long_branch("LBCS"),
        0x26 => long_branch("LBNE"),
        0x27 => long_branch("LBEQ"),
        0x28 => long_branch("LBVC"),
        0x29 => long_branch("LBVS"),
        0x2A => long_branch("LBPL"),
        0x2B => long_branch("LBMI"),
        0x2C => long_branch("LBGE"),
        0x2D => long_branch("LBLT"),
        0x2E => long_branch("LBGT"),
        0x2F => long_branch("LBLE"),
        0x3F => ("SWI2".to_string(), 0),
        _ => prefixed_16bit_op(op, rest, &["CMPD", "CMPY", "LDY", "STY", "LDS", "STS"]),
    }
}

fn page3_mnemonic(op: u8, rest: &[u8]) -> (String, usize) {
    match op {
        0x3F => ("SWI3".to_string(), 0),
        _ => prefixed_16bit_op(op, rest, &["CMPU", "CMPS", "", "", "", ""]),
    }
}

/// Shared decode for the prefixed 16-bit compare/load/store opcodes. The
/// low nibble picks the operation (3=cmp1, C=cmp2, E=load, F=store) and
/// the high nibble the addressing mode, mirroring the unprefixed layout.
fn prefixed_16bit_op(op: u8, rest: &[u8], names: &[&str; 6]) -> (String, usize) {
    if op & 0x80 == 0 {
        return ("???".to_string(), 0);
    }
    let name = match (op & 0x0F, op & 0xF0) {
        (0x3, _) => names[0],
        (0xC, _) => names[1],
        (0xE, 0x80..=0xB0) => names[2],
        (0xF, 0x80..=0xB0) => names[3],
        (0xE, _) => names[4],
        (0xF, _) => names[5],
        _ => "",
    };
    if name.is_empty() {
        return ("???".to_string(), 0);
    }
    match op & 0xF0 {
        0x80 | 0xC0 => (format!("{} #${:04X}", name, word_at(rest, 0)), 2),
        0x90 | 0xD0 => (format!("{} <${:02X}", name, byte_at(rest, 0)), 1),
        0xA0 | 0xE0 => (format!("{} ,X", name), 1),
        0xB0 | 0xF0 => (format!("{} >${:04X}", name, word_at(rest, 0)), 2),
        _ => ("???".to_string(), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_inherent() {
        let r = disassemble(&[0x12, 0, 0, 0, 0]);
        assert_eq!(r.mnemonic, "NOP");
        assert_eq!(r.length, 1);
    }

    #[test]
    fn decodes_immediate_operand() {
        let r = disassemble(&[0x86, 0x42, 0, 0, 0]);
        assert_eq!(r.mnemonic, "LDA #$42");
        assert_eq!(r.length, 2);
    }

    #[test]
    fn decodes_page2_long_branch() {
        let r = disassemble(&[0x10, 0x26, 0x00, 0x10, 0]);
        assert_eq!(r.mnemonic, "LBNE $0010");
        assert_eq!(r.length, 4);
    }

    #[test]
    fn unknown_opcode_falls_back() {
        let r = disassemble(&[0x11, 0x01, 0, 0, 0]);
        assert_eq!(r.mnemonic, "???");
    }
}
