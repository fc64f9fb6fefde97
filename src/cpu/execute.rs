//! Control unit for the 8-bit core.
//!
//! Implements the FETCH -> DECODE -> EXECUTE state machine. Each call to
//! [`Cpu::step`] performs one state transition; [`Cpu::cycle`] runs a whole
//! instruction cycle.

use crate::cpu::decode::{self, Fields, Instruction, InstructionWord, Opcode};
use crate::cpu::effect::{self, Effect};
use crate::cpu::registers::{RegisterFile, StatusRegister};
use crate::memory::{DataMemory, Program, ProgramError, ProgramMemory, Stack};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Control unit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum CpuState {
    /// Load the next instruction into IR.
    Fetch = 0,
    /// Split IR into opcode and operands.
    Decode = 1,
    /// Carry out the decoded instruction.
    Execute = 2,
}

impl CpuState {
    /// Map a raw state code to a state.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(CpuState::Fetch),
            1 => Some(CpuState::Decode),
            2 => Some(CpuState::Execute),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CpuState::Fetch => "Fetch",
            CpuState::Decode => "Decode",
            CpuState::Execute => "Execute",
        }
    }

    /// The state that follows this one in a normal cycle.
    pub fn next(self) -> Self {
        match self {
            CpuState::Fetch => CpuState::Decode,
            CpuState::Decode => CpuState::Execute,
            CpuState::Execute => CpuState::Fetch,
        }
    }
}

/// What a single FSM transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// FETCH loaded `word` from `address`.
    Fetched { address: u8, word: InstructionWord },
    /// DECODE extracted the instruction fields.
    Decoded(Fields),
    /// EXECUTE carried out an instruction.
    Executed(Instruction),
    /// EXECUTE hit a fault and reset the unit.
    Recovered(Fault),
}

/// A condition the control unit recovered from by resetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum Fault {
    #[error("unrecognized opcode {opcode:#04x} at address {address}")]
    UnknownOpcode { opcode: u8, address: u8 },

    #[error("unrecognized state code {0}")]
    UnknownState(u8),
}

/// The control unit together with the memories it drives.
#[derive(Clone)]
pub struct Cpu {
    /// Instruction register.
    ir: InstructionWord,
    /// Program counter: address of the next instruction to fetch.
    pc: u8,
    /// Memory address register: address of the instruction being executed.
    mar: u8,
    /// Status register (ISNZVC).
    sr: StatusRegister,
    /// Fields extracted by the last DECODE.
    fields: Fields,
    state: CpuState,
    /// Instruction cycles completed since the last reset.
    cycles: u64,

    /// General-purpose registers R0-R31.
    pub regs: RegisterFile,
    /// Data memory (I/O page and extended page).
    pub data: DataMemory,
    /// Call/return stack.
    pub stack: Stack,
    program: ProgramMemory,
}

impl Cpu {
    /// Create a control unit for `program` and reset it, which loads the
    /// program into program memory.
    pub fn new(program: Program) -> Result<Self, ProgramError> {
        let mut cpu = Self {
            ir: 0,
            pc: 0,
            mar: 0,
            sr: StatusRegister::new(),
            fields: Fields::default(),
            state: CpuState::Fetch,
            cycles: 0,
            regs: RegisterFile::new(),
            data: DataMemory::new(),
            stack: Stack::new(),
            program: ProgramMemory::new(program)?,
        };
        cpu.reset();
        Ok(cpu)
    }

    /// Reset the control unit: zero every register, return to FETCH at
    /// address 0, clear data memory and the stack, and make sure the program
    /// is loaded.
    pub fn reset(&mut self) {
        self.ir = 0;
        self.pc = 0;
        self.mar = 0;
        self.sr.clear();
        self.fields = Fields::default();
        self.state = CpuState::Fetch;
        self.cycles = 0;
        self.regs.clear();

        self.data.reset();
        self.stack.reset();
        self.program.load();
        log::debug!("control unit reset");
    }

    /// Run the next state of the instruction cycle.
    pub fn step(&mut self) -> Step {
        let step = match self.state {
            CpuState::Fetch => {
                self.ir = self.program.read(self.pc);
                self.mar = self.pc;
                self.pc = self.pc.wrapping_add(1);
                self.state = self.state.next();
                Step::Fetched { address: self.mar, word: self.ir }
            }
            CpuState::Decode => {
                self.fields = Fields::split(self.ir);
                self.state = self.state.next();
                Step::Decoded(self.fields)
            }
            CpuState::Execute => self.execute(),
        };
        log::trace!("{:?} -> {}", step, self.state.name());
        step
    }

    /// Run state transitions until one full FETCH, DECODE, EXECUTE sequence
    /// has completed. Called mid-cycle, it finishes the current cycle.
    ///
    /// Returns the executed instruction, or the fault that reset the unit.
    pub fn cycle(&mut self) -> Result<Instruction, Fault> {
        loop {
            match self.step() {
                Step::Executed(instr) => return Ok(instr),
                Step::Recovered(fault) => return Err(fault),
                Step::Fetched { .. } | Step::Decoded(_) => {}
            }
        }
    }

    /// Force the FSM into the state with raw code `raw`.
    ///
    /// Unknown codes reset the unit, the same recovery an unknown opcode
    /// gets.
    pub fn force_state(&mut self, raw: u8) -> Result<CpuState, Fault> {
        match CpuState::from_raw(raw) {
            Some(state) => {
                self.state = state;
                Ok(state)
            }
            None => {
                let fault = Fault::UnknownState(raw);
                log::warn!("{}, resetting", fault);
                self.reset();
                Err(fault)
            }
        }
    }

    fn execute(&mut self) -> Step {
        let step = match decode::decode(self.fields) {
            Ok(instr) => {
                let effect = effect::effect(instr, &self.regs, &self.data, self.pc);
                log::debug!("{:03}: {:?} => {:?}", self.mar, instr, effect);
                self.apply(effect);
                self.cycles += 1;
                Step::Executed(instr)
            }
            Err(_) => {
                let fault = Fault::UnknownOpcode { opcode: self.fields.opcode, address: self.mar };
                log::warn!("{}, resetting", fault);
                self.reset();
                Step::Recovered(fault)
            }
        };
        self.state = CpuState::Execute.next();
        step
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::SetRegister { reg, value } => self.regs.set(reg, value),
            Effect::WriteData { address, value } => self.data.write(address, value),
            Effect::Jump { target } => self.pc = target,
            Effect::Call { return_address, target } => {
                self.stack.push(return_address);
                self.pc = target;
            }
            Effect::Return => self.pc = self.stack.pop(),
            Effect::Push { value } => self.stack.push(value),
            Effect::Pop { reg } => {
                let value = self.stack.pop();
                self.regs.set(reg, value);
            }
        }
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn ir(&self) -> InstructionWord {
        self.ir
    }

    pub fn mar(&self) -> u8 {
        self.mar
    }

    pub fn sr(&self) -> StatusRegister {
        self.sr
    }

    /// Fields produced by the most recent DECODE.
    pub fn fields(&self) -> Fields {
        self.fields
    }

    /// Opcode of the current instruction, if it is a known one.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.fields.opcode)
    }

    /// Mnemonic of the current instruction, or "Unknown".
    pub fn instruction_name(&self) -> &'static str {
        self.opcode().map(Opcode::mnemonic).unwrap_or("Unknown")
    }

    /// Name of the subroutine the current instruction belongs to.
    pub fn subroutine_name(&self) -> &str {
        self.program.subroutine_name(self.mar)
    }

    pub fn program(&self) -> &ProgramMemory {
        &self.program
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("mar", &self.mar)
            .field("ir", &format_args!("{:#08x}", self.ir))
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}
