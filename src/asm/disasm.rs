//! Disassembler for cu8 programs.
//!
//! Converts instruction words back to readable assembly.

use crate::cpu::decode::{decode_word, encode, Instruction, InstructionWord};
use crate::cpu::registers::{register_index, REGISTER_COUNT};
use crate::memory::data::REPORTED_IO;
use crate::memory::Program;

/// Disassemble a single instruction word to text.
///
/// Words the assembler could not reproduce from the mnemonic form (a
/// register operand above R31, or a non-zero unused operand) come out as
/// `DW` so the listing still reassembles to the same image.
pub fn disassemble_word(word: InstructionWord) -> String {
    let word = word & 0xFF_FFFF;
    match decode_word(word) {
        Ok(decoded) if encode(&decoded) == word && registers_in_range(&decoded) => {
            format_instruction(&decoded)
        }
        Ok(_) => format!("DW {:#08x}", word),
        Err(_) => format!("??? {:#08x}", word),
    }
}

fn registers_in_range(instr: &Instruction) -> bool {
    let valid = |reg: u8| usize::from(reg) < REGISTER_COUNT;
    match *instr {
        Instruction::Ldi { reg, .. }
        | Instruction::Out { reg, .. }
        | Instruction::In { reg, .. }
        | Instruction::Sts { reg, .. }
        | Instruction::Lds { reg, .. }
        | Instruction::Push { reg }
        | Instruction::Pop { reg } => valid(reg),
        Instruction::Mov { dst, src } => valid(dst) && valid(src),
        Instruction::Nop | Instruction::Jmp { .. } | Instruction::Call { .. } | Instruction::Ret => true,
    }
}

/// Disassemble a whole program, with a header line per subroutine.
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();
    output.push_str("; cu8 disassembly\n");
    output.push_str("; ---------------\n");

    for (addr, word) in program.words.iter().enumerate() {
        if let Some(sub) = program.subroutines.iter().find(|s| s.start as usize == addr) {
            output.push_str(&format!("\n{}:\n", sub.name));
        }
        let line = disassemble_word(*word);
        output.push_str(&format!("{:03}: {:<20} ; {:06x}\n", addr, line, word));
    }

    output
}

/// Format a decoded instruction as assembly text.
///
/// Register operands are shown as the register they select.
pub fn format_instruction(instr: &Instruction) -> String {
    match *instr {
        Instruction::Nop => "NOP".to_string(),
        Instruction::Ldi { reg, value } => format!("LDI {}, {:#04x}", r(reg), value),
        Instruction::Mov { dst, src } => format!("MOV {}, {}", r(dst), r(src)),
        Instruction::Out { io, reg } => format!("OUT {}, {}", io_operand(io), r(reg)),
        Instruction::In { reg, io } => format!("IN {}, {}", r(reg), io_operand(io)),
        Instruction::Sts { addr, reg } => format!("STS {:#04x}, {}", addr, r(reg)),
        Instruction::Lds { reg, addr } => format!("LDS {}, {:#04x}", r(reg), addr),
        Instruction::Jmp { target } => format!("JMP {}", target),
        Instruction::Call { target } => format!("CALL {}", target),
        Instruction::Ret => "RET".to_string(),
        Instruction::Push { reg } => format!("PUSH {}", r(reg)),
        Instruction::Pop { reg } => format!("POP {}", r(reg)),
    }
}

fn r(reg: u8) -> String {
    format!("R{}", register_index(reg))
}

/// Use the register name for known I/O addresses.
fn io_operand(addr: u8) -> String {
    REPORTED_IO
        .iter()
        .find(|(_, a)| *a == addr)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| format!("{:#04x}", addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;
    use crate::memory::data::{DDRB, PORTB};
    use crate::memory::sample;

    #[test]
    fn test_disassemble_ldi() {
        let word = encode(&Instruction::Ldi { reg: 16, value: 7 });
        assert_eq!(disassemble_word(word), "LDI R16, 0x07");
    }

    #[test]
    fn test_disassemble_io_names() {
        assert_eq!(disassemble_word(encode(&Instruction::Out { io: DDRB, reg: 16 })), "OUT DDRB, R16");
        assert_eq!(disassemble_word(encode(&Instruction::In { reg: 1, io: 0x40 })), "IN R1, 0x40");
        assert_eq!(disassemble_word(encode(&Instruction::Out { io: PORTB, reg: 19 })), "OUT PORTB, R19");
    }

    #[test]
    fn test_non_canonical_words_fall_back_to_dw() {
        // LDI R40, 7
        assert_eq!(disassemble_word(0x01_28_07), "DW 0x012807");
        // JMP 5 with a stray second operand
        assert_eq!(disassemble_word(0x07_05_09), "DW 0x070509");
        assert_eq!(disassemble_word(0x07_05_00), "JMP 5");
    }

    #[test]
    fn test_odd_words_reassemble() {
        let words = vec![0x01_28_07, 0x07_05_09, 0x02_21_03, 0x0A_10_00];
        let source: String = words.iter().map(|w| disassemble_word(*w) + "\n").collect();
        assert_eq!(crate::asm::assemble(&source).unwrap().words, words);
    }

    #[test]
    fn test_format_reduces_register_operands() {
        assert_eq!(format_instruction(&Instruction::Ldi { reg: 40, value: 1 }), "LDI R8, 0x01");
        assert_eq!(format_instruction(&Instruction::Mov { dst: 33, src: 2 }), "MOV R1, R2");
    }

    #[test]
    fn test_disassemble_unknown() {
        assert!(disassemble_word(0x7F_01_02).starts_with("???"));
    }

    #[test]
    fn test_disassemble_program() {
        let listing = disassemble(&sample::blink());
        assert!(listing.contains("setup:"));
        assert!(listing.contains("008: CALL 16"));
        assert!(listing.contains("RET"));
    }

    #[test]
    fn test_disassembly_reassembles() {
        let program = sample::blink();
        let source: String = program
            .words
            .iter()
            .map(|w| disassemble_word(*w) + "\n")
            .collect();
        let words = crate::asm::assemble(&source).unwrap().words;
        assert_eq!(words, program.words);
    }
}
