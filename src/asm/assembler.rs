//! Two-pass assembler for cu8 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! LED1 = 1 << PORTB0      ; Constant
//! setup:                  ; Label opening a subroutine
//!     CALL init_ports     ; Call by label
//! .again:                 ; Local label (no subroutine of its own)
//!     LDI R16, LED1 | 0x02
//!     OUT DDRB, R16
//!     JMP again
//!     ORG 0x20            ; Pad with NOP up to an address
//!     DW 0x010203         ; Raw instruction word
//! ```
//!
//! Numbers may be decimal, `0x` hex or `0b` binary. Operand expressions
//! support `|` and `<<`. The I/O symbols DDRB, PORTB, PINB and PORTB0-PORTB2
//! are predefined.

use crate::cpu::decode::{Fields, InstructionWord, Opcode};
use crate::cpu::registers::REGISTER_COUNT;
use crate::memory::data::{DDRB, PINB, PORTB, PORTB0, PORTB1, PORTB2};
use crate::memory::program::{Program, ProgramError, Subroutine, PROGRAM_MEMORY_SIZE};
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code into a program image.
pub fn assemble(source: &str) -> Result<Program, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// How an operand is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    /// A register name, R0-R31.
    Register,
    /// An 8-bit expression: constant, address or label.
    Value,
}

fn operand_layout(op: Opcode) -> &'static [Operand] {
    use Operand::*;
    match op {
        Opcode::Nop | Opcode::Ret => &[],
        Opcode::Ldi => &[Register, Value],
        Opcode::Mov => &[Register, Register],
        Opcode::Out => &[Value, Register],
        Opcode::In => &[Register, Value],
        Opcode::Sts => &[Value, Register],
        Opcode::Lds => &[Register, Value],
        Opcode::Jmp | Opcode::Call => &[Value],
        Opcode::Push | Opcode::Pop => &[Register],
    }
}

/// One emitted program word, still unresolved.
#[derive(Debug, Clone)]
enum Item {
    Instruction { line: usize, opcode: Opcode, operands: Vec<String> },
    Word { line: usize, expr: String },
    Fill,
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label or constant -> value).
    symbols: HashMap<String, i64>,
    /// Subroutine labels in definition order.
    subroutines: Vec<(String, usize)>,
    /// Output items; the index is the address.
    items: Vec<Item>,
}

impl Assembler {
    fn new() -> Self {
        let builtins = [
            ("DDRB", DDRB),
            ("PORTB", PORTB),
            ("PINB", PINB),
            ("PORTB0", PORTB0),
            ("PORTB1", PORTB1),
            ("PORTB2", PORTB2),
        ];
        Self {
            symbols: builtins.iter().map(|&(k, v)| (k.to_string(), i64::from(v))).collect(),
            subroutines: Vec::new(),
            items: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Program, AssemblerError> {
        // Pass 1: Collect symbols and lay out addresses
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Encode with every label known
        let words = self
            .items
            .iter()
            .map(|item| self.encode_item(item))
            .collect::<Result<Vec<InstructionWord>, _>>()?;

        let program = Program { words, subroutines: self.subroutine_table() };
        program.validate()?;
        Ok(program)
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        // Label definition
        if let Some((label, rest)) = line.split_once(':') {
            self.define_label(label.trim(), line_num)?;
            line = rest.trim();
            if line.is_empty() {
                return Ok(());
            }
        }

        // Constant definition
        if let Some((name, expr)) = line.split_once('=') {
            let name = name.trim();
            check_identifier(name, line_num)?;
            let value = self.eval(expr, line_num)?;
            return self.define_symbol(name, value, line_num);
        }

        let (mnemonic, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let operands: Vec<String> = rest
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        match mnemonic.to_uppercase().as_str() {
            // Directives
            "ORG" => {
                let [addr] = expect_operands::<1>(&operands, "ORG", line_num)?;
                let addr = self.eval(addr, line_num)?;
                if addr < self.items.len() as i64 || addr > PROGRAM_MEMORY_SIZE as i64 {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value: addr });
                }
                self.items.resize(addr as usize, Item::Fill);
            }

            "DW" => {
                let [expr] = expect_operands::<1>(&operands, "DW", line_num)?;
                self.items.push(Item::Word { line: line_num, expr: expr.to_string() });
            }

            // Instructions
            _ => {
                let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.to_string() }
                })?;
                let expected = operand_layout(opcode).len();
                if operands.len() != expected {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: format!(
                            "{} takes {} operand(s), found {}",
                            opcode.mnemonic(),
                            expected,
                            operands.len()
                        ),
                    });
                }
                self.items.push(Item::Instruction { line: line_num, opcode, operands });
            }
        }

        Ok(())
    }

    fn define_label(&mut self, label: &str, line_num: usize) -> Result<(), AssemblerError> {
        let (name, local) = match label.strip_prefix('.') {
            Some(name) => (name, true),
            None => (label, false),
        };
        check_identifier(name, line_num)?;
        let addr = self.items.len();
        self.define_symbol(name, addr as i64, line_num)?;
        if !local {
            self.subroutines.push((name.to_string(), addr));
        }
        Ok(())
    }

    fn define_symbol(&mut self, name: &str, value: i64, line_num: usize) -> Result<(), AssemblerError> {
        if self.symbols.insert(name.to_string(), value).is_some() {
            return Err(AssemblerError::DuplicateSymbol { line: line_num, symbol: name.to_string() });
        }
        Ok(())
    }

    /// Subroutine ranges: each label runs up to the next one, the last up to
    /// the end of the program. Empty ranges are dropped.
    fn subroutine_table(&self) -> Vec<Subroutine> {
        let end = self.items.len();
        self.subroutines
            .iter()
            .enumerate()
            .filter_map(|(i, (name, start))| {
                let next = self.subroutines.get(i + 1).map(|(_, s)| *s).unwrap_or(end);
                (next > *start).then(|| Subroutine::new(name.clone(), *start as u16, next as u16))
            })
            .collect()
    }

    fn encode_item(&self, item: &Item) -> Result<InstructionWord, AssemblerError> {
        match item {
            Item::Fill => Ok(0),
            Item::Word { line, expr } => {
                let value = self.eval(expr, *line)?;
                if !(0..=0xFF_FFFF).contains(&value) {
                    return Err(AssemblerError::ValueOutOfRange { line: *line, value });
                }
                Ok(value as InstructionWord)
            }
            Item::Instruction { line, opcode, operands } => {
                let mut bytes = [0u8; 2];
                for (slot, (kind, text)) in operand_layout(*opcode).iter().zip(operands).enumerate() {
                    bytes[slot] = match kind {
                        Operand::Register => parse_register(text, *line)?,
                        Operand::Value => self.eval_byte(text, *line)?,
                    };
                }
                Ok(Fields { opcode: *opcode as u8, op1: bytes[0], op2: bytes[1] }.join())
            }
        }
    }

    fn eval_byte(&self, expr: &str, line_num: usize) -> Result<u8, AssemblerError> {
        let value = self.eval(expr, line_num)?;
        u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, value })
    }

    /// Evaluate `a | b | ...` where each term is an atom or `atom << atom`.
    fn eval(&self, expr: &str, line_num: usize) -> Result<i64, AssemblerError> {
        split_top_level(strip_parens(expr.trim()), '|')
            .into_iter()
            .try_fold(0i64, |acc, term| Ok(acc | self.eval_term(term, line_num)?))
    }

    fn eval_term(&self, term: &str, line_num: usize) -> Result<i64, AssemblerError> {
        let term = strip_parens(term.trim());
        match term.split_once("<<") {
            Some((lhs, rhs)) => {
                let value = self.eval_atom(lhs, line_num)?;
                let shift = self.eval_atom(rhs, line_num)?;
                if !(0..32).contains(&shift) {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value: shift });
                }
                Ok(value << shift)
            }
            None => self.eval_atom(term, line_num),
        }
    }

    fn eval_atom(&self, atom: &str, line_num: usize) -> Result<i64, AssemblerError> {
        let atom = strip_parens(atom.trim());
        if atom.is_empty() {
            return Err(AssemblerError::SyntaxError { line: line_num, message: "missing operand".into() });
        }
        if atom.starts_with(|c: char| c.is_ascii_digit()) {
            return parse_number(atom).ok_or_else(|| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid number literal `{}`", atom),
            });
        }
        self.symbols
            .get(atom)
            .copied()
            .ok_or_else(|| AssemblerError::UndefinedSymbol { line: line_num, symbol: atom.to_string() })
    }
}

fn expect_operands<'a, const N: usize>(
    operands: &'a [String],
    directive: &str,
    line_num: usize,
) -> Result<[&'a str; N], AssemblerError> {
    if operands.len() != N {
        return Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("{} requires {} operand(s)", directive, N),
        });
    }
    Ok(std::array::from_fn(|i| operands[i].as_str()))
}

fn check_identifier(name: &str, line_num: usize) -> Result<(), AssemblerError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid || parse_register(name, line_num).is_ok() {
        return Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid symbol name `{}`", name),
        });
    }
    Ok(())
}

fn parse_register(text: &str, line_num: usize) -> Result<u8, AssemblerError> {
    text.strip_prefix(['R', 'r'])
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|&n| (n as usize) < REGISTER_COUNT)
        .ok_or_else(|| AssemblerError::InvalidRegister { line: line_num, operand: text.to_string() })
}

fn parse_number(text: &str) -> Option<i64> {
    let text = text.replace('_', "");
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()
    } else {
        text.parse().ok()
    }
}

/// Remove parentheses wrapping the whole expression, e.g. `((1 << 2))`.
fn strip_parens(mut expr: &str) -> &str {
    while expr.starts_with('(') && expr.ends_with(')') && closing_paren(expr) == Some(expr.len() - 1) {
        expr = expr[1..expr.len() - 1].trim();
    }
    expr
}

/// Index of the parenthesis closing the one at index 0.
fn closing_paren(expr: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside parentheses.
fn split_top_level(expr: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&expr[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined symbol on line {line}: {symbol}")]
    UndefinedSymbol { line: usize, symbol: String },

    #[error("duplicate symbol on line {line}: {symbol}")]
    DuplicateSymbol { line: usize, symbol: String },

    #[error("invalid register on line {line}: {operand}")]
    InvalidRegister { line: usize, operand: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error(transparent)]
    Program(#[from] ProgramError),
}
