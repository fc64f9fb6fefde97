//! Read-only diagnostic view of the control unit.

use crate::cpu::decode::InstructionWord;
use crate::cpu::execute::{Cpu, CpuState};
use crate::cpu::registers::REPORTED_REGISTERS;
use crate::memory::data::REPORTED_IO;
use serde::Serialize;
use std::fmt;

/// A named 8-bit location shown in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: u8,
}

/// Point-in-time view of the control unit and its memories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Subroutine containing the current instruction (from MAR).
    pub subroutine: String,
    /// Mnemonic of the current instruction.
    pub instruction: String,
    pub state: CpuState,
    pub pc: u8,
    pub stack_depth: usize,
    /// Last value pushed onto the stack.
    pub stack_top: u8,
    pub ir: InstructionWord,
    /// Status register bits, ISNZVC.
    pub sr: u8,
    pub registers: Vec<NamedValue>,
    pub io: Vec<NamedValue>,
}

impl Snapshot {
    /// Capture the current state of `cpu`. Nothing is modified.
    pub fn capture(cpu: &Cpu) -> Self {
        let registers = REPORTED_REGISTERS
            .iter()
            .map(|&reg| NamedValue { name: format!("R{}", reg), value: cpu.regs.get(reg) })
            .collect();
        let io = REPORTED_IO
            .iter()
            .map(|&(name, addr)| NamedValue { name: name.to_string(), value: cpu.data.read(u16::from(addr)) })
            .collect();

        Self {
            subroutine: cpu.subroutine_name().to_string(),
            instruction: cpu.instruction_name().to_string(),
            state: cpu.state(),
            pc: cpu.pc(),
            stack_depth: cpu.stack.depth(),
            stack_top: cpu.stack.top(),
            ir: cpu.ir(),
            sr: cpu.sr().bits(),
            registers,
            io,
        }
    }

    /// IR as three space-separated bytes: opcode, op1, op2.
    pub fn ir_binary(&self) -> String {
        format!(
            "{:08b} {:08b} {:08b}",
            (self.ir >> 16) & 0xFF,
            (self.ir >> 8) & 0xFF,
            self.ir & 0xFF
        )
    }

    pub fn sr_binary(&self) -> String {
        format!("{:06b}", self.sr)
    }

    /// Render as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

const RULE: &str = "--------------------------------------------------------------------------------";

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "{:<40}{}", "Current subroutine:", self.subroutine)?;
        writeln!(f, "{:<40}{}", "Current instruction:", self.instruction)?;
        writeln!(f, "{:<40}{}", "Current state:", self.state.name())?;
        writeln!(f)?;
        writeln!(f, "{:<40}{}", "Program counter:", self.pc)?;
        writeln!(f, "{:<40}{}", "Stack depth:", self.stack_depth)?;
        writeln!(f, "{:<40}{}", "Last element added to the stack:", self.stack_top)?;
        writeln!(f)?;
        writeln!(f, "{:<40}{}", "Instruction register:", self.ir_binary())?;
        writeln!(f, "{:<40}{}", "Status register (ISNZVC):", self.sr_binary())?;
        writeln!(f)?;
        for reg in &self.registers {
            let label = format!("Content in CPU register {}:", reg.name);
            writeln!(f, "{:<40}{:08b}", label, reg.value)?;
        }
        writeln!(f)?;
        for io in &self.io {
            let label = format!("Content in I/O register {}:", io.name);
            writeln!(f, "{:<40}{:08b}", label, io.value)?;
        }
        write!(f, "{}", RULE)
    }
}

impl Cpu {
    /// Capture a diagnostic snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::sample;

    fn sample_cpu() -> Cpu {
        Cpu::new(sample::blink()).unwrap()
    }

    #[test]
    fn test_snapshot_after_reset() {
        let snap = sample_cpu().snapshot();
        assert_eq!(snap.subroutine, "RESET_vect");
        assert_eq!(snap.instruction, "NOP");
        assert_eq!(snap.state, CpuState::Fetch);
        assert_eq!(snap.pc, 0);
        assert_eq!(snap.stack_depth, 0);
        assert_eq!(snap.sr_binary(), "000000");
        assert_eq!(snap.registers.len(), 4);
        assert_eq!(snap.io[0].name, "DDRB");
    }

    #[test]
    fn test_snapshot_tracks_execution() {
        let mut cpu = sample_cpu();
        cpu.cycle().unwrap(); // JMP main
        cpu.cycle().unwrap(); // CALL setup

        let snap = cpu.snapshot();
        assert_eq!(snap.subroutine, "main");
        assert_eq!(snap.instruction, "CALL");
        assert_eq!(snap.pc, sample::SETUP);
        assert_eq!(snap.stack_depth, 1);
        assert_eq!(snap.stack_top, sample::MAIN + 1);
        assert_eq!(snap.ir_binary(), "00001000 00010000 00000000");
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut cpu = sample_cpu();
        cpu.step();
        let before = format!("{:?}", cpu);
        let _ = cpu.snapshot();
        assert_eq!(format!("{:?}", cpu), before);
        assert_eq!(cpu.state(), CpuState::Decode);
    }

    #[test]
    fn test_display_report() {
        let text = sample_cpu().snapshot().to_string();
        assert!(text.contains("Current subroutine:"));
        assert!(text.contains("RESET_vect"));
        assert!(text.contains("Content in CPU register R16:"));
        assert!(text.contains("Content in I/O register PINB:"));
    }

    #[test]
    fn test_json() {
        let json = sample_cpu().snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["state"], "FETCH");
        assert_eq!(value["subroutine"], "RESET_vect");
    }
}
