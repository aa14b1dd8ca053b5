//! Protmem Instruction Set
//!
//! RV32 integer subset needed to run a protected routine, plus Xprotmem.
//!
//! ## Instruction Formats
//! - R-type: [funct7:7][rs2:5][rs1:5][funct3:3][rd:5][opcode:7]
//! - I-type: [imm:12][rs1:5][funct3:3][rd:5][opcode:7]
//! - S-type: [imm:7][rs2:5][rs1:5][funct3:3][imm:5][opcode:7]
//! - B-type: S-type layout, 13-bit even offset
//! - U-type: [imm:20][rd:5][opcode:7]
//! - J-type: [imm:20][rd:5][opcode:7], 21-bit even offset

use crate::opcode::Opcode;
use crate::register::Register;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ========== Upper Immediate ==========
    /// LUI: rd = imm << 12 (imm is the 20-bit upper field)
    Lui { rd: Register, imm: u32 },

    // ========== Arithmetic ==========
    /// ADD: rd = rs1 + rs2
    Add { rd: Register, rs1: Register, rs2: Register },

    /// SUB: rd = rs1 - rs2
    Sub { rd: Register, rs1: Register, rs2: Register },

    /// ADDI: rd = rs1 + imm (sign-extended 12-bit)
    Addi { rd: Register, rs1: Register, imm: i32 },

    // ========== Memory - Load ==========
    /// LB: rd = sign_extend(mem[rs1 + imm][7:0])
    Lb { rd: Register, rs1: Register, imm: i32 },

    /// LBU: rd = zero_extend(mem[rs1 + imm][7:0])
    Lbu { rd: Register, rs1: Register, imm: i32 },

    /// LW: rd = mem[rs1 + imm][31:0]
    Lw { rd: Register, rs1: Register, imm: i32 },

    // ========== Memory - Store ==========
    /// SB: mem[rs1 + imm][7:0] = rs2[7:0]
    Sb { rs1: Register, rs2: Register, imm: i32 },

    /// SW: mem[rs1 + imm][31:0] = rs2
    Sw { rs1: Register, rs2: Register, imm: i32 },

    // ========== Branch ==========
    /// BEQ: if (rs1 == rs2) PC += offset
    Beq { rs1: Register, rs2: Register, offset: i32 },

    /// BNE: if (rs1 != rs2) PC += offset
    Bne { rs1: Register, rs2: Register, offset: i32 },

    /// BLT: if (rs1 < rs2) PC += offset (signed)
    Blt { rs1: Register, rs2: Register, offset: i32 },

    /// BGE: if (rs1 >= rs2) PC += offset (signed)
    Bge { rs1: Register, rs2: Register, offset: i32 },

    // ========== Jump ==========
    /// JAL: rd = PC + 4; PC += offset
    Jal { rd: Register, offset: i32 },

    /// JALR: rd = PC + 4; PC = (rs1 + imm) & ~1
    Jalr { rd: Register, rs1: Register, imm: i32 },

    // ========== System ==========
    /// ECALL: System call (a7 = syscall number)
    Ecall,

    /// EBREAK: Breakpoint / halt execution
    Ebreak,

    // ========== Xprotmem ==========
    /// SETPROTI: entry_pointer = rs1
    Setproti { rs1: Register },

    /// SETPROTD: segment = (base: rs1, length: rs2)
    Setprotd { rs1: Register, rs2: Register },

    /// ENTERPROT: rd = PC + 4; lock; PC = entry_pointer
    Enterprot { rd: Register },

    /// EXITPROT: unlock; PC = rs1
    Exitprot { rs1: Register },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Lui { .. } => Opcode::Lui,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Sub { .. } => Opcode::Sub,
            Instruction::Addi { .. } => Opcode::Addi,
            Instruction::Lb { .. } => Opcode::Lb,
            Instruction::Lbu { .. } => Opcode::Lbu,
            Instruction::Lw { .. } => Opcode::Lw,
            Instruction::Sb { .. } => Opcode::Sb,
            Instruction::Sw { .. } => Opcode::Sw,
            Instruction::Beq { .. } => Opcode::Beq,
            Instruction::Bne { .. } => Opcode::Bne,
            Instruction::Blt { .. } => Opcode::Blt,
            Instruction::Bge { .. } => Opcode::Bge,
            Instruction::Jal { .. } => Opcode::Jal,
            Instruction::Jalr { .. } => Opcode::Jalr,
            Instruction::Ecall => Opcode::Ecall,
            Instruction::Ebreak => Opcode::Ebreak,
            Instruction::Setproti { .. } => Opcode::Setproti,
            Instruction::Setprotd { .. } => Opcode::Setprotd,
            Instruction::Enterprot { .. } => Opcode::Enterprot,
            Instruction::Exitprot { .. } => Opcode::Exitprot,
        }
    }

    /// Get instruction mnemonic
    #[inline]
    pub fn mnemonic(&self) -> &'static str {
        self.opcode().mnemonic()
    }

    /// Destination register, if the instruction writes one
    pub fn destination(&self) -> Option<Register> {
        match self {
            Instruction::Lui { rd, .. }
            | Instruction::Add { rd, .. }
            | Instruction::Sub { rd, .. }
            | Instruction::Addi { rd, .. }
            | Instruction::Lb { rd, .. }
            | Instruction::Lbu { rd, .. }
            | Instruction::Lw { rd, .. }
            | Instruction::Jal { rd, .. }
            | Instruction::Jalr { rd, .. }
            | Instruction::Enterprot { rd } => Some(*rd),
            _ => None,
        }
    }

    /// True if this instruction may redirect the PC
    pub fn is_control_flow(&self) -> bool {
        let op = self.opcode();
        op.is_branch()
            || matches!(
                op,
                Opcode::Jal | Opcode::Jalr | Opcode::Enterprot | Opcode::Exitprot
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_opcodes() {
        let ext = [
            Instruction::Setproti { rs1: Register::T1 },
            Instruction::Setprotd { rs1: Register::A0, rs2: Register::T1 },
            Instruction::Enterprot { rd: Register::A5 },
            Instruction::Exitprot { rs1: Register::A5 },
        ];
        for instr in ext {
            assert!(instr.opcode().is_extension());
        }
        assert!(!Instruction::Ecall.opcode().is_extension());
    }

    #[test]
    fn test_destination() {
        assert_eq!(
            Instruction::Enterprot { rd: Register::A5 }.destination(),
            Some(Register::A5)
        );
        assert_eq!(Instruction::Exitprot { rs1: Register::A5 }.destination(), None);
        assert_eq!(
            Instruction::Sb { rs1: Register::A4, rs2: Register::T1, imm: 0 }.destination(),
            None
        );
    }

    #[test]
    fn test_control_flow() {
        assert!(Instruction::Enterprot { rd: Register::A5 }.is_control_flow());
        assert!(Instruction::Exitprot { rs1: Register::A5 }.is_control_flow());
        assert!(Instruction::Beq { rs1: Register::ZERO, rs2: Register::ZERO, offset: 8 }.is_control_flow());
        assert!(!Instruction::Setproti { rs1: Register::T1 }.is_control_flow());
    }

    #[test]
    fn test_mnemonic() {
        assert_eq!(Instruction::Setprotd { rs1: Register::A0, rs2: Register::T1 }.mnemonic(), "setprotd");
        assert_eq!(Instruction::Ebreak.mnemonic(), "ebreak");
    }
}
