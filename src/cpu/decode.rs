//! Instruction word layout and decoder.
//!
//! Every instruction is a 24-bit word held in a `u32`:
//!
//! ```text
//!  23        16 15         8 7          0
//! +------------+------------+------------+
//! |   opcode   |  operand 1 |  operand 2 |
//! +------------+------------+------------+
//! ```

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// A raw 24-bit instruction word. Bits 31..24 are ignored.
pub type InstructionWord = u32;

/// Offset added by STS/LDS to reach the extended data page.
pub const EXTENDED_PAGE_OFFSET: u16 = 256;

/// Operation codes of the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    Ldi = 0x01,
    Mov = 0x02,
    Out = 0x03,
    In = 0x04,
    Sts = 0x05,
    Lds = 0x06,
    Jmp = 0x07,
    Call = 0x08,
    Ret = 0x09,
    Push = 0x0A,
    Pop = 0x0B,
}

impl Opcode {
    /// Every opcode, in encoding order.
    pub const ALL: [Opcode; 12] = [
        Opcode::Nop,
        Opcode::Ldi,
        Opcode::Mov,
        Opcode::Out,
        Opcode::In,
        Opcode::Sts,
        Opcode::Lds,
        Opcode::Jmp,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Push,
        Opcode::Pop,
    ];

    /// Look up an opcode by its numeric value.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| *op as u8 == value)
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Ldi => "LDI",
            Opcode::Mov => "MOV",
            Opcode::Out => "OUT",
            Opcode::In => "IN",
            Opcode::Sts => "STS",
            Opcode::Lds => "LDS",
            Opcode::Jmp => "JMP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::from_u8(value).ok_or(DecodeError::InvalidOpcode(value))
    }
}

/// The three fields extracted from an instruction word during DECODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fields {
    pub opcode: u8,
    pub op1: u8,
    pub op2: u8,
}

impl Fields {
    /// Split a word into opcode (bits 23..16), op1 (15..8) and op2 (7..0).
    pub fn split(word: InstructionWord) -> Self {
        Self {
            opcode: (word >> 16) as u8,
            op1: (word >> 8) as u8,
            op2: word as u8,
        }
    }

    /// Pack the fields back into a word.
    pub fn join(self) -> InstructionWord {
        (u32::from(self.opcode) << 16) | (u32::from(self.op1) << 8) | u32::from(self.op2)
    }
}

/// A decoded instruction.
///
/// Register operands are kept as raw bytes; the register file reduces them
/// to a valid index when accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// No operation.
    Nop,
    /// R[reg] := value
    Ldi { reg: u8, value: u8 },
    /// R[dst] := R[src]
    Mov { dst: u8, src: u8 },
    /// data[io] := R[reg]
    Out { io: u8, reg: u8 },
    /// R[reg] := data[io]
    In { reg: u8, io: u8 },
    /// data[addr + 256] := R[reg]
    Sts { addr: u8, reg: u8 },
    /// R[reg] := data[addr + 256]
    Lds { reg: u8, addr: u8 },
    /// PC := target
    Jmp { target: u8 },
    /// push PC; PC := target
    Call { target: u8 },
    /// PC := pop
    Ret,
    /// push R[reg]
    Push { reg: u8 },
    /// R[reg] := pop
    Pop { reg: u8 },
}

impl Instruction {
    /// The opcode this instruction encodes to.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Ldi { .. } => Opcode::Ldi,
            Instruction::Mov { .. } => Opcode::Mov,
            Instruction::Out { .. } => Opcode::Out,
            Instruction::In { .. } => Opcode::In,
            Instruction::Sts { .. } => Opcode::Sts,
            Instruction::Lds { .. } => Opcode::Lds,
            Instruction::Jmp { .. } => Opcode::Jmp,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::Ret => Opcode::Ret,
            Instruction::Push { .. } => Opcode::Push,
            Instruction::Pop { .. } => Opcode::Pop,
        }
    }

    /// Operand fields in encoding order. Unused operands are zero.
    pub fn operands(&self) -> (u8, u8) {
        match *self {
            Instruction::Nop | Instruction::Ret => (0, 0),
            Instruction::Ldi { reg, value } => (reg, value),
            Instruction::Mov { dst, src } => (dst, src),
            Instruction::Out { io, reg } => (io, reg),
            Instruction::In { reg, io } => (reg, io),
            Instruction::Sts { addr, reg } => (addr, reg),
            Instruction::Lds { reg, addr } => (reg, addr),
            Instruction::Jmp { target } | Instruction::Call { target } => (target, 0),
            Instruction::Push { reg } | Instruction::Pop { reg } => (reg, 0),
        }
    }
}

/// Decode the fields produced by the DECODE state into an instruction.
///
/// Operands of single-operand instructions ignore `op2`, so `JMP 5, 9` and
/// `JMP 5, 0` decode identically.
pub fn decode(fields: Fields) -> Result<Instruction, DecodeError> {
    let Fields { opcode, op1, op2 } = fields;
    let instruction = match Opcode::try_from(opcode)? {
        Opcode::Nop => Instruction::Nop,
        Opcode::Ldi => Instruction::Ldi { reg: op1, value: op2 },
        Opcode::Mov => Instruction::Mov { dst: op1, src: op2 },
        Opcode::Out => Instruction::Out { io: op1, reg: op2 },
        Opcode::In => Instruction::In { reg: op1, io: op2 },
        Opcode::Sts => Instruction::Sts { addr: op1, reg: op2 },
        Opcode::Lds => Instruction::Lds { reg: op1, addr: op2 },
        Opcode::Jmp => Instruction::Jmp { target: op1 },
        Opcode::Call => Instruction::Call { target: op1 },
        Opcode::Ret => Instruction::Ret,
        Opcode::Push => Instruction::Push { reg: op1 },
        Opcode::Pop => Instruction::Pop { reg: op1 },
    };
    Ok(instruction)
}

/// Decode a full instruction word.
pub fn decode_word(word: InstructionWord) -> Result<Instruction, DecodeError> {
    decode(Fields::split(word))
}

/// Assemble an instruction into its 24-bit word.
pub fn encode(instr: &Instruction) -> InstructionWord {
    let (op1, op2) = instr.operands();
    Fields { opcode: instr.opcode() as u8, op1, op2 }.join()
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),
}
