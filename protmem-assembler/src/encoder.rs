//! Instruction encoding to 32-bit RV32 words
//!
//! [`encode`] masks every field to its width; [`check_ranges`] is the
//! validating counterpart and is run by the assembler before encoding.

use protmem_spec::encoding::*;
use protmem_spec::{Instruction, Register, SpecError};

#[inline]
fn r(reg: Register) -> u32 {
    reg.index() as u32
}

/// Encode instruction to a 32-bit word
pub fn encode(instr: &Instruction) -> u32 {
    match *instr {
        Instruction::Lui { rd, imm } => pack_u(OPCODE_LUI, r(rd), imm),

        Instruction::Add { rd, rs1, rs2 } => pack_r(OPCODE_OP, r(rd), FUNCT3_ADD_SUB, r(rs1), r(rs2), FUNCT7_ADD),
        Instruction::Sub { rd, rs1, rs2 } => pack_r(OPCODE_OP, r(rd), FUNCT3_ADD_SUB, r(rs1), r(rs2), FUNCT7_SUB),
        Instruction::Addi { rd, rs1, imm } => pack_i(OPCODE_OP_IMM, r(rd), FUNCT3_ADDI, r(rs1), imm),

        Instruction::Lb { rd, rs1, imm } => pack_i(OPCODE_LOAD, r(rd), FUNCT3_LB, r(rs1), imm),
        Instruction::Lbu { rd, rs1, imm } => pack_i(OPCODE_LOAD, r(rd), FUNCT3_LBU, r(rs1), imm),
        Instruction::Lw { rd, rs1, imm } => pack_i(OPCODE_LOAD, r(rd), FUNCT3_LW, r(rs1), imm),

        Instruction::Sb { rs1, rs2, imm } => pack_s(OPCODE_STORE, FUNCT3_SB, r(rs1), r(rs2), imm),
        Instruction::Sw { rs1, rs2, imm } => pack_s(OPCODE_STORE, FUNCT3_SW, r(rs1), r(rs2), imm),

        Instruction::Beq { rs1, rs2, offset } => pack_b(OPCODE_BRANCH, FUNCT3_BEQ, r(rs1), r(rs2), offset),
        Instruction::Bne { rs1, rs2, offset } => pack_b(OPCODE_BRANCH, FUNCT3_BNE, r(rs1), r(rs2), offset),
        Instruction::Blt { rs1, rs2, offset } => pack_b(OPCODE_BRANCH, FUNCT3_BLT, r(rs1), r(rs2), offset),
        Instruction::Bge { rs1, rs2, offset } => pack_b(OPCODE_BRANCH, FUNCT3_BGE, r(rs1), r(rs2), offset),

        Instruction::Jal { rd, offset } => pack_j(OPCODE_JAL, r(rd), offset),
        Instruction::Jalr { rd, rs1, imm } => pack_i(OPCODE_JALR, r(rd), FUNCT3_JALR, r(rs1), imm),

        Instruction::Ecall => pack_i(OPCODE_SYSTEM, 0, 0, 0, IMM_ECALL as i32),
        Instruction::Ebreak => pack_i(OPCODE_SYSTEM, 0, 0, 0, IMM_EBREAK as i32),

        // ========== Xprotmem (custom-0, R-type, funct7 = 0) ==========
        Instruction::Setproti { rs1 } => pack_r(OPCODE_CUSTOM_0, 0, FUNCT3_SETPROTI, r(rs1), 0, 0),
        Instruction::Setprotd { rs1, rs2 } => pack_r(OPCODE_CUSTOM_0, 0, FUNCT3_SETPROTD, r(rs1), r(rs2), 0),
        Instruction::Enterprot { rd } => pack_r(OPCODE_CUSTOM_0, r(rd), FUNCT3_ENTERPROT, 0, 0, 0),
        Instruction::Exitprot { rs1 } => pack_r(OPCODE_CUSTOM_0, 0, FUNCT3_EXITPROT, r(rs1), 0, 0),
    }
}

fn check_signed(value: i32, bits: u32) -> Result<(), SpecError> {
    if fits_signed(value as i64, bits) {
        Ok(())
    } else {
        Err(SpecError::ImmediateOutOfRange {
            value: value as i64,
            bits,
        })
    }
}

/// Check that every immediate of `instr` fits its encoding field
pub fn check_ranges(instr: &Instruction) -> Result<(), SpecError> {
    match *instr {
        Instruction::Lui { imm, .. } if imm > 0xF_FFFF => Err(SpecError::ImmediateOutOfRange {
            value: imm as i64,
            bits: 20,
        }),
        Instruction::Addi { imm, .. }
        | Instruction::Lb { imm, .. }
        | Instruction::Lbu { imm, .. }
        | Instruction::Lw { imm, .. }
        | Instruction::Sb { imm, .. }
        | Instruction::Sw { imm, .. }
        | Instruction::Jalr { imm, .. } => check_signed(imm, 12),
        Instruction::Beq { offset, .. }
        | Instruction::Bne { offset, .. }
        | Instruction::Blt { offset, .. }
        | Instruction::Bge { offset, .. } => check_signed(offset, 13),
        Instruction::Jal { offset, .. } => check_signed(offset, 21),
        _ => Ok(()),
    }
}
