//! Control unit of the 8-bit core.
//!
//! - 24-bit instruction words: opcode, operand 1, operand 2
//! - 32 general-purpose registers R0-R31 and a 6-bit status register
//! - FETCH -> DECODE -> EXECUTE state machine with reset-on-fault recovery

pub mod registers;
pub mod decode;
pub mod effect;
pub mod execute;
pub mod snapshot;

pub use registers::{RegisterFile, StatusRegister};
pub use decode::{Instruction, InstructionWord, Opcode, Fields, DecodeError};
pub use effect::Effect;
pub use execute::{Cpu, CpuState, Fault, Step};
pub use snapshot::Snapshot;
