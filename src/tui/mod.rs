//! TUI debugger for the cu8 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Program listing with subroutine names and breakpoints
//! - Control unit view (state, PC, MAR, IR, SR)
//! - Register file, I/O registers and stack
//! - State-step/cycle/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
