//! WebAssembly bindings for the cu8 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::{Cpu, Program, Step};
use crate::asm::assembler::assemble;
use crate::asm::disasm::{disassemble, disassemble_word, format_instruction};
use crate::asm::image::parse_image;
use crate::memory::sample;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly control unit wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a control unit running the built-in sample program.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmCpu, JsError> {
        Self::with_program(sample::blink())
    }

    fn with_program(program: Program) -> Result<WasmCpu, JsError> {
        Ok(Self { cpu: Cpu::new(program).map_err(js_error)? })
    }

    /// Load a program from assembly source code. Returns the word count.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let program = assemble(source).map_err(js_error)?;
        let len = program.len();
        self.cpu = Cpu::new(program).map_err(js_error)?;
        Ok(len)
    }

    /// Load a program from `.hex` image text. Returns the word count.
    #[wasm_bindgen]
    pub fn load_image_text(&mut self, text: &str) -> Result<usize, JsError> {
        let program = parse_image(text).map_err(js_error)?;
        let len = program.len();
        self.cpu = Cpu::new(program).map_err(js_error)?;
        Ok(len)
    }

    /// Run one state transition. Returns a description of what happened.
    #[wasm_bindgen]
    pub fn step(&mut self) -> String {
        match self.cpu.step() {
            Step::Fetched { address, word } => format!("FETCH {:03}: {:06x}", address, word),
            Step::Decoded(fields) => format!(
                "DECODE opcode={:#04x} op1={:#04x} op2={:#04x}",
                fields.opcode, fields.op1, fields.op2
            ),
            Step::Executed(instr) => format!("EXECUTE {}", format_instruction(&instr)),
            Step::Recovered(fault) => format!("FAULT {} (reset)", fault),
        }
    }

    /// Run one full instruction cycle. Returns the executed instruction.
    #[wasm_bindgen]
    pub fn cycle(&mut self) -> Result<String, JsError> {
        let instr = self.cpu.cycle().map_err(js_error)?;
        Ok(format_instruction(&instr))
    }

    /// Run `max_cycles` instruction cycles. Returns how many of them hit a
    /// fault and reset the unit.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> u32 {
        let mut faults = 0;
        for _ in 0..max_cycles {
            // Faults reset the unit; keep going like the hardware would
            if self.cpu.cycle().is_err() {
                faults += 1;
            }
        }
        faults
    }

    /// Reset the control unit.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Get the cycle counter. It restarts from zero after every reset.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.cpu.pc()
    }

    /// Get FSM state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        self.cpu.state().name().to_string()
    }

    /// Get the full register file R0-R31.
    #[wasm_bindgen]
    pub fn registers(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.cpu.regs.as_slice())
    }

    /// Get a data memory byte.
    #[wasm_bindgen]
    pub fn data_at(&self, address: u16) -> u8 {
        self.cpu.data.read(address)
    }

    /// Disassembly listing of the loaded program.
    #[wasm_bindgen]
    pub fn listing(&self) -> String {
        disassemble(self.cpu.program().image())
    }

    /// Get the diagnostic snapshot as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        self.cpu.snapshot().to_json().map_err(js_error)
    }

    /// Get the diagnostic snapshot as the framed text report.
    #[wasm_bindgen]
    pub fn report(&self) -> String {
        self.cpu.snapshot().to_string()
    }
}

/// Assemble source code and return instruction count.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let program = assemble(source).map_err(js_error)?;
    Ok(program.len())
}

/// Disassemble a single 24-bit instruction word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u32) -> String {
    disassemble_word(word)
}
