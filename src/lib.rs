//! # cu8
//!
//! An emulator of the control unit of a simplified 8-bit microcontroller.
//!
//! The control unit runs a FETCH -> DECODE -> EXECUTE state machine over a
//! twelve-instruction set, driving a 256-word program memory, a 512-byte data
//! memory with memory-mapped I/O, and a hardware stack. It is meant for
//! teaching how a CPU core steps through its instruction cycle.

pub mod cpu;
pub mod memory;
pub mod asm;
pub mod config;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, Fault, Instruction, InstructionWord, Opcode, Snapshot, Step};
pub use memory::{DataMemory, Program, ProgramError, ProgramMemory, Stack};
pub use asm::{assemble, disassemble, AssemblerError, load_image, save_image, ImageError};
pub use config::{RunConfig, ConfigError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
