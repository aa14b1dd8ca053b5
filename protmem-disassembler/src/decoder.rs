//! Instruction decoder
//!
//! Strict: reserved fields (unused register slots, `funct7` of the
//! custom-0 group, the SYSTEM operand fields) must be zero.

use crate::error::{DisassemblerError, Result};
use protmem_spec::encoding::*;
use protmem_spec::{Instruction, Register};

/// Decode 32-bit instruction word
pub fn decode(word: u32) -> Result<Instruction> {
    match extract_opcode(word) {
        OPCODE_LUI => decode_lui(word),
        OPCODE_OP => decode_op(word),
        OPCODE_OP_IMM => decode_op_imm(word),
        OPCODE_LOAD => decode_load(word),
        OPCODE_STORE => decode_store(word),
        OPCODE_BRANCH => decode_branch(word),
        OPCODE_JAL => decode_jal(word),
        OPCODE_JALR => decode_jalr(word),
        OPCODE_SYSTEM => decode_system(word),
        OPCODE_CUSTOM_0 => decode_protmem(word),
        opcode => Err(DisassemblerError::UnknownOpcode(opcode as u8)),
    }
}

#[inline]
fn register(index: u32) -> Register {
    // 5-bit fields always name a valid register
    Register::from_index(index as usize).unwrap_or(Register::ZERO)
}

#[inline]
fn rd(word: u32) -> Register {
    register(extract_rd(word))
}

#[inline]
fn rs1(word: u32) -> Register {
    register(extract_rs1(word))
}

#[inline]
fn rs2(word: u32) -> Register {
    register(extract_rs2(word))
}

fn decode_lui(word: u32) -> Result<Instruction> {
    Ok(Instruction::Lui {
        rd: rd(word),
        imm: extract_imm_u(word),
    })
}

fn decode_op(word: u32) -> Result<Instruction> {
    let (rd, rs1, rs2) = (rd(word), rs1(word), rs2(word));
    match (extract_funct3(word), extract_funct7(word)) {
        (FUNCT3_ADD_SUB, FUNCT7_ADD) => Ok(Instruction::Add { rd, rs1, rs2 }),
        (FUNCT3_ADD_SUB, FUNCT7_SUB) => Ok(Instruction::Sub { rd, rs1, rs2 }),
        _ => Err(DisassemblerError::InvalidEncoding(word)),
    }
}

fn decode_op_imm(word: u32) -> Result<Instruction> {
    match extract_funct3(word) {
        FUNCT3_ADDI => Ok(Instruction::Addi {
            rd: rd(word),
            rs1: rs1(word),
            imm: extract_imm_i(word),
        }),
        _ => Err(DisassemblerError::InvalidEncoding(word)),
    }
}

fn decode_load(word: u32) -> Result<Instruction> {
    let (rd, rs1, imm) = (rd(word), rs1(word), extract_imm_i(word));
    match extract_funct3(word) {
        FUNCT3_LB => Ok(Instruction::Lb { rd, rs1, imm }),
        FUNCT3_LBU => Ok(Instruction::Lbu { rd, rs1, imm }),
        FUNCT3_LW => Ok(Instruction::Lw { rd, rs1, imm }),
        _ => Err(DisassemblerError::InvalidEncoding(word)),
    }
}

fn decode_store(word: u32) -> Result<Instruction> {
    let (rs1, rs2, imm) = (rs1(word), rs2(word), extract_imm_s(word));
    match extract_funct3(word) {
        FUNCT3_SB => Ok(Instruction::Sb { rs1, rs2, imm }),
        FUNCT3_SW => Ok(Instruction::Sw { rs1, rs2, imm }),
        _ => Err(DisassemblerError::InvalidEncoding(word)),
    }
}

fn decode_branch(word: u32) -> Result<Instruction> {
    let (rs1, rs2, offset) = (rs1(word), rs2(word), extract_imm_b(word));
    match extract_funct3(word) {
        FUNCT3_BEQ => Ok(Instruction::Beq { rs1, rs2, offset }),
        FUNCT3_BNE => Ok(Instruction::Bne { rs1, rs2, offset }),
        FUNCT3_BLT => Ok(Instruction::Blt { rs1, rs2, offset }),
        FUNCT3_BGE => Ok(Instruction::Bge { rs1, rs2, offset }),
        _ => Err(DisassemblerError::InvalidEncoding(word)),
    }
}

fn decode_jal(word: u32) -> Result<Instruction> {
    Ok(Instruction::Jal {
        rd: rd(word),
        offset: extract_imm_j(word),
    })
}

fn decode_jalr(word: u32) -> Result<Instruction> {
    if extract_funct3(word) != FUNCT3_JALR {
        return Err(DisassemblerError::InvalidEncoding(word));
    }
    Ok(Instruction::Jalr {
        rd: rd(word),
        rs1: rs1(word),
        imm: extract_imm_i(word),
    })
}

fn decode_system(word: u32) -> Result<Instruction> {
    if extract_rd(word) != 0 || extract_rs1(word) != 0 || extract_funct3(word) != 0 {
        return Err(DisassemblerError::InvalidEncoding(word));
    }
    match word >> 20 {
        IMM_ECALL => Ok(Instruction::Ecall),
        IMM_EBREAK => Ok(Instruction::Ebreak),
        _ => Err(DisassemblerError::InvalidEncoding(word)),
    }
}

fn decode_protmem(word: u32) -> Result<Instruction> {
    if extract_funct7(word) != 0 {
        return Err(DisassemblerError::InvalidEncoding(word));
    }

    // (rd, rs1, rs2) slots used by each instruction
    let (uses_rd, uses_rs1, uses_rs2, instr) = match extract_funct3(word) {
        FUNCT3_SETPROTI => (false, true, false, Instruction::Setproti { rs1: rs1(word) }),
        FUNCT3_SETPROTD => (
            false,
            true,
            true,
            Instruction::Setprotd {
                rs1: rs1(word),
                rs2: rs2(word),
            },
        ),
        FUNCT3_ENTERPROT => (true, false, false, Instruction::Enterprot { rd: rd(word) }),
        FUNCT3_EXITPROT => (false, true, false, Instruction::Exitprot { rs1: rs1(word) }),
        _ => return Err(DisassemblerError::InvalidEncoding(word)),
    };

    let reserved_set = (!uses_rd && extract_rd(word) != 0)
        || (!uses_rs1 && extract_rs1(word) != 0)
        || (!uses_rs2 && extract_rs2(word) != 0);
    if reserved_set {
        return Err(DisassemblerError::InvalidEncoding(word));
    }

    Ok(instr)
}
