//! Memory resources driven by the control unit.
//!
//! - [`ProgramMemory`]: 256 fixed-width instruction words
//! - [`DataMemory`]: byte store with an I/O page and an extended page
//! - [`Stack`]: call/return and register spill stack

pub mod program;
pub mod data;
pub mod stack;
pub mod sample;

pub use program::{Program, ProgramMemory, ProgramError, Subroutine};
pub use data::DataMemory;
pub use stack::Stack;
