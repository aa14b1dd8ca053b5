//! # Opcode Definitions
//!
//! One variant per supported instruction. RV32 distinguishes instructions by
//! major opcode plus `funct3`/`funct7`; this enum names the combination.
//!
//! ## Families
//! - Upper immediate: LUI
//! - Arithmetic: ADD, SUB, ADDI
//! - Load: LB, LBU, LW
//! - Store: SB, SW
//! - Branch: BEQ, BNE, BLT, BGE
//! - Jump: JAL, JALR
//! - System: ECALL, EBREAK
//! - Xprotmem: SETPROTI, SETPROTD, ENTERPROT, EXITPROT

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Lui,
    Add,
    Sub,
    Addi,
    Lb,
    Lbu,
    Lw,
    Sb,
    Sw,
    Beq,
    Bne,
    Blt,
    Bge,
    Jal,
    Jalr,
    Ecall,
    Ebreak,
    /// SETPROTI: entry_pointer = rs1
    Setproti,
    /// SETPROTD: segment = (rs1, rs2)
    Setprotd,
    /// ENTERPROT: rd = pc + 4; lock; pc = entry_pointer
    Enterprot,
    /// EXITPROT: unlock; pc = rs1
    Exitprot,
}

impl Opcode {
    pub const ALL: [Opcode; 21] = [
        Opcode::Lui,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Addi,
        Opcode::Lb,
        Opcode::Lbu,
        Opcode::Lw,
        Opcode::Sb,
        Opcode::Sw,
        Opcode::Beq,
        Opcode::Bne,
        Opcode::Blt,
        Opcode::Bge,
        Opcode::Jal,
        Opcode::Jalr,
        Opcode::Ecall,
        Opcode::Ebreak,
        Opcode::Setproti,
        Opcode::Setprotd,
        Opcode::Enterprot,
        Opcode::Exitprot,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Lui => "lui",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Addi => "addi",
            Opcode::Lb => "lb",
            Opcode::Lbu => "lbu",
            Opcode::Lw => "lw",
            Opcode::Sb => "sb",
            Opcode::Sw => "sw",
            Opcode::Beq => "beq",
            Opcode::Bne => "bne",
            Opcode::Blt => "blt",
            Opcode::Bge => "bge",
            Opcode::Jal => "jal",
            Opcode::Jalr => "jalr",
            Opcode::Ecall => "ecall",
            Opcode::Ebreak => "ebreak",
            Opcode::Setproti => "setproti",
            Opcode::Setprotd => "setprotd",
            Opcode::Enterprot => "enterprot",
            Opcode::Exitprot => "exitprot",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        let mnemonic = mnemonic.to_ascii_lowercase();
        Self::ALL.iter().copied().find(|op| op.mnemonic() == mnemonic)
    }

    /// True for the four Xprotmem instructions
    #[inline]
    pub fn is_extension(self) -> bool {
        matches!(
            self,
            Opcode::Setproti | Opcode::Setprotd | Opcode::Enterprot | Opcode::Exitprot
        )
    }

    #[inline]
    pub fn is_load(self) -> bool {
        matches!(self, Opcode::Lb | Opcode::Lbu | Opcode::Lw)
    }

    #[inline]
    pub fn is_store(self) -> bool {
        matches!(self, Opcode::Sb | Opcode::Sw)
    }

    #[inline]
    pub fn is_branch(self) -> bool {
        matches!(self, Opcode::Beq | Opcode::Bne | Opcode::Blt | Opcode::Bge)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
