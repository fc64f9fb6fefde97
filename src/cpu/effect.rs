//! Opcode semantics as pure functions.
//!
//! [`effect`] maps a decoded instruction, together with read-only views of
//! the register file and data memory, to the single [`Effect`] it has on the
//! machine. The control unit applies the effect during EXECUTE.

use crate::cpu::decode::{Instruction, EXTENDED_PAGE_OFFSET};
use crate::cpu::registers::RegisterFile;
use crate::memory::DataMemory;
use serde::{Serialize, Deserialize};

/// The side effect of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Nothing changes.
    None,
    /// R[reg] := value
    SetRegister { reg: u8, value: u8 },
    /// data[address] := value
    WriteData { address: u16, value: u8 },
    /// PC := target
    Jump { target: u8 },
    /// push return_address; PC := target
    Call { return_address: u8, target: u8 },
    /// PC := pop
    Return,
    /// push value
    Push { value: u8 },
    /// R[reg] := pop
    Pop { reg: u8 },
}

/// Compute the effect of `instr`.
///
/// `pc` is the program counter at EXECUTE time, i.e. the address following
/// the instruction, which CALL pushes as its return address.
pub fn effect(instr: Instruction, regs: &RegisterFile, data: &DataMemory, pc: u8) -> Effect {
    match instr {
        Instruction::Nop => Effect::None,

        // ==================== Registers ====================

        Instruction::Ldi { reg, value } => Effect::SetRegister { reg, value },

        Instruction::Mov { dst, src } => Effect::SetRegister { reg: dst, value: regs.get(src) },

        // ==================== Data Memory ====================

        Instruction::Out { io, reg } => Effect::WriteData {
            address: u16::from(io),
            value: regs.get(reg),
        },

        Instruction::In { reg, io } => Effect::SetRegister {
            reg,
            value: data.read(u16::from(io)),
        },

        Instruction::Sts { addr, reg } => Effect::WriteData {
            address: u16::from(addr) + EXTENDED_PAGE_OFFSET,
            value: regs.get(reg),
        },

        Instruction::Lds { reg, addr } => Effect::SetRegister {
            reg,
            value: data.read(u16::from(addr) + EXTENDED_PAGE_OFFSET),
        },

        // ==================== Control Flow ====================

        Instruction::Jmp { target } => Effect::Jump { target },

        Instruction::Call { target } => Effect::Call { return_address: pc, target },

        Instruction::Ret => Effect::Return,

        // ==================== Stack ====================

        Instruction::Push { reg } => Effect::Push { value: regs.get(reg) },

        Instruction::Pop { reg } => Effect::Pop { reg },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::{R16, R17};
    use crate::memory::data::{DDRB, PINB};

    fn regs_with(pairs: &[(u8, u8)]) -> RegisterFile {
        let mut regs = RegisterFile::new();
        for &(reg, value) in pairs {
            regs.set(reg, value);
        }
        regs
    }

    #[test]
    fn test_nop() {
        let e = effect(Instruction::Nop, &RegisterFile::new(), &DataMemory::new(), 3);
        assert_eq!(e, Effect::None);
    }

    #[test]
    fn test_ldi() {
        let e = effect(Instruction::Ldi { reg: R16, value: 0x2A }, &RegisterFile::new(), &DataMemory::new(), 0);
        assert_eq!(e, Effect::SetRegister { reg: R16, value: 0x2A });
    }

    #[test]
    fn test_mov_reads_source() {
        let regs = regs_with(&[(R17, 0x55)]);
        let e = effect(Instruction::Mov { dst: R16, src: R17 }, &regs, &DataMemory::new(), 0);
        assert_eq!(e, Effect::SetRegister { reg: R16, value: 0x55 });
    }

    #[test]
    fn test_out_targets_io_page() {
        let regs = regs_with(&[(R16, 0x07)]);
        let e = effect(Instruction::Out { io: DDRB, reg: R16 }, &regs, &DataMemory::new(), 0);
        assert_eq!(e, Effect::WriteData { address: u16::from(DDRB), value: 0x07 });
    }

    #[test]
    fn test_in_reads_io_page() {
        let mut data = DataMemory::new();
        data.write(u16::from(PINB), 0x81);
        let e = effect(Instruction::In { reg: R17, io: PINB }, &RegisterFile::new(), &data, 0);
        assert_eq!(e, Effect::SetRegister { reg: R17, value: 0x81 });
    }

    #[test]
    fn test_sts_uses_extended_page() {
        let regs = regs_with(&[(R16, 9)]);
        let e = effect(Instruction::Sts { addr: 255, reg: R16 }, &regs, &DataMemory::new(), 0);
        assert_eq!(e, Effect::WriteData { address: 511, value: 9 });
    }

    #[test]
    fn test_lds_uses_extended_page() {
        let mut data = DataMemory::new();
        data.write(0x10, 1);
        data.write(0x110, 2);
        let e = effect(Instruction::Lds { reg: R16, addr: 0x10 }, &RegisterFile::new(), &data, 0);
        assert_eq!(e, Effect::SetRegister { reg: R16, value: 2 });
    }

    #[test]
    fn test_jmp() {
        let e = effect(Instruction::Jmp { target: 40 }, &RegisterFile::new(), &DataMemory::new(), 3);
        assert_eq!(e, Effect::Jump { target: 40 });
    }

    #[test]
    fn test_call_pushes_current_pc() {
        let e = effect(Instruction::Call { target: 16 }, &RegisterFile::new(), &DataMemory::new(), 9);
        assert_eq!(e, Effect::Call { return_address: 9, target: 16 });
    }

    #[test]
    fn test_ret_and_pop() {
        let regs = RegisterFile::new();
        let data = DataMemory::new();
        assert_eq!(effect(Instruction::Ret, &regs, &data, 0), Effect::Return);
        assert_eq!(effect(Instruction::Pop { reg: 3 }, &regs, &data, 0), Effect::Pop { reg: 3 });
    }

    #[test]
    fn test_push_reads_register() {
        let regs = regs_with(&[(R16, 0xC3)]);
        let e = effect(Instruction::Push { reg: R16 }, &regs, &DataMemory::new(), 0);
        assert_eq!(e, Effect::Push { value: 0xC3 });
    }

    #[test]
    fn test_register_operand_wraps() {
        let regs = regs_with(&[(1, 0x11)]);
        let e = effect(Instruction::Push { reg: 33 }, &regs, &DataMemory::new(), 0);
        assert_eq!(e, Effect::Push { value: 0x11 });
    }
}
