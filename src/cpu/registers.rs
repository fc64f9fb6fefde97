//! Register file and status register.
//!
//! The control unit has 32 general-purpose 8-bit registers, R0 to R31.
//! Symbolic names such as R16 are plain indices into the file.

use serde::{Serialize, Deserialize};

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 32;

pub const R16: u8 = 16;
pub const R17: u8 = 17;
pub const R18: u8 = 18;
pub const R19: u8 = 19;
pub const R24: u8 = 24;

/// Registers shown in the diagnostic report.
pub const REPORTED_REGISTERS: [u8; 4] = [R16, R17, R18, R24];

/// Reduce a raw register operand to a valid index.
///
/// Operands are not validated; out-of-range values wrap into R0..R31.
#[inline]
pub fn register_index(operand: u8) -> usize {
    operand as usize % REGISTER_COUNT
}

/// The general-purpose register file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    regs: [u8; REGISTER_COUNT],
}

impl RegisterFile {
    /// Create a register file with all registers zeroed.
    pub const fn new() -> Self {
        Self { regs: [0; REGISTER_COUNT] }
    }

    /// Read a register.
    #[inline]
    pub fn get(&self, reg: u8) -> u8 {
        self.regs[register_index(reg)]
    }

    /// Write a register.
    #[inline]
    pub fn set(&mut self, reg: u8, value: u8) {
        self.regs[register_index(reg)] = value;
    }

    /// Zero every register.
    pub fn clear(&mut self) {
        self.regs = [0; REGISTER_COUNT];
    }

    /// All registers, R0 first.
    pub fn as_slice(&self) -> &[u8] {
        &self.regs
    }

    pub fn is_zeroed(&self) -> bool {
        self.regs.iter().all(|&r| r == 0)
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show non-zero registers
        let mut map = f.debug_map();
        for (i, value) in self.regs.iter().enumerate().filter(|(_, v)| **v != 0) {
            map.entry(&format_args!("R{}", i), value);
        }
        map.finish()
    }
}

/// Status register holding the flags I S N Z V C (bit 5 down to bit 0).
///
/// No instruction in the current set writes it; it is only zeroed on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusRegister(u8);

impl StatusRegister {
    pub const CARRY: u8 = 1 << 0;
    pub const OVERFLOW: u8 = 1 << 1;
    pub const ZERO: u8 = 1 << 2;
    pub const NEGATIVE: u8 = 1 << 3;
    pub const SIGN: u8 = 1 << 4;
    pub const INTERRUPT: u8 = 1 << 5;

    const MASK: u8 = 0b0011_1111;

    pub const fn new() -> Self {
        Self(0)
    }

    /// Raw flag bits, bit 5 = I.
    pub fn bits(self) -> u8 {
        self.0 & Self::MASK
    }

    pub fn flag(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_read_write() {
        let mut regs = RegisterFile::new();
        regs.set(R16, 0x07);
        assert_eq!(regs.get(R16), 0x07);
        assert_eq!(regs.get(R17), 0);
    }

    #[test]
    fn test_register_index_wraps() {
        let mut regs = RegisterFile::new();
        regs.set(32 + 5, 9);
        assert_eq!(regs.get(5), 9);
        assert_eq!(register_index(255), 31);
    }

    #[test]
    fn test_clear() {
        let mut regs = RegisterFile::new();
        regs.set(0, 1);
        regs.set(31, 2);
        assert!(!regs.is_zeroed());
        regs.clear();
        assert!(regs.is_zeroed());
    }

    #[test]
    fn test_status_register_starts_clear() {
        let sr = StatusRegister::new();
        assert_eq!(sr.bits(), 0);
        assert!(!sr.flag(StatusRegister::INTERRUPT));
    }
}
