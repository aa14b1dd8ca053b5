//! # Instruction Encoding Constants and Helpers
//!
//! Shared by the assembler's encoder and the disassembler's decoder.
//!
//! ## Instruction Format (32-bit, RV32)
//!
//! ```text
//! R-type: [funct7:7][rs2:5][rs1:5][funct3:3][rd:5][opcode:7]
//! I-type: [imm[11:0]:12][rs1:5][funct3:3][rd:5][opcode:7]
//! S-type: [imm[11:5]:7][rs2:5][rs1:5][funct3:3][imm[4:0]:5][opcode:7]
//! B-type: [imm[12|10:5]:7][rs2:5][rs1:5][funct3:3][imm[4:1|11]:5][opcode:7]
//! U-type: [imm[31:12]:20][rd:5][opcode:7]
//! J-type: [imm[20|10:1|11|19:12]:20][rd:5][opcode:7]
//! ```
//!
//! Xprotmem uses R-type on `custom-0` with `funct7 = 0`.

// ============================================================================
// Major Opcodes
// ============================================================================

pub const OPCODE_LOAD: u32 = 0b000_0011;
pub const OPCODE_CUSTOM_0: u32 = 0b000_1011;
pub const OPCODE_OP_IMM: u32 = 0b001_0011;
pub const OPCODE_STORE: u32 = 0b010_0011;
pub const OPCODE_OP: u32 = 0b011_0011;
pub const OPCODE_LUI: u32 = 0b011_0111;
pub const OPCODE_BRANCH: u32 = 0b110_0011;
pub const OPCODE_JALR: u32 = 0b110_0111;
pub const OPCODE_JAL: u32 = 0b110_1111;
pub const OPCODE_SYSTEM: u32 = 0b111_0011;

// ============================================================================
// funct3 / funct7 values
// ============================================================================

pub const FUNCT3_ADD_SUB: u32 = 0b000;
pub const FUNCT3_ADDI: u32 = 0b000;
pub const FUNCT3_JALR: u32 = 0b000;

pub const FUNCT3_LB: u32 = 0b000;
pub const FUNCT3_LW: u32 = 0b010;
pub const FUNCT3_LBU: u32 = 0b100;

pub const FUNCT3_SB: u32 = 0b000;
pub const FUNCT3_SW: u32 = 0b010;

pub const FUNCT3_BEQ: u32 = 0b000;
pub const FUNCT3_BNE: u32 = 0b001;
pub const FUNCT3_BLT: u32 = 0b100;
pub const FUNCT3_BGE: u32 = 0b101;

pub const FUNCT7_ADD: u32 = 0b000_0000;
pub const FUNCT7_SUB: u32 = 0b010_0000;

pub const FUNCT3_SETPROTI: u32 = 0b000;
pub const FUNCT3_SETPROTD: u32 = 0b001;
pub const FUNCT3_ENTERPROT: u32 = 0b010;
pub const FUNCT3_EXITPROT: u32 = 0b011;

/// SYSTEM immediates
pub const IMM_ECALL: u32 = 0;
pub const IMM_EBREAK: u32 = 1;

// ============================================================================
// Field Extraction
// ============================================================================

pub const OPCODE_MASK: u32 = 0x7F;
pub const REGISTER_MASK: u32 = 0x1F;

#[inline]
pub const fn extract_opcode(word: u32) -> u32 {
    word & OPCODE_MASK
}

#[inline]
pub const fn extract_rd(word: u32) -> u32 {
    (word >> 7) & REGISTER_MASK
}

#[inline]
pub const fn extract_funct3(word: u32) -> u32 {
    (word >> 12) & 0x7
}

#[inline]
pub const fn extract_rs1(word: u32) -> u32 {
    (word >> 15) & REGISTER_MASK
}

#[inline]
pub const fn extract_rs2(word: u32) -> u32 {
    (word >> 20) & REGISTER_MASK
}

#[inline]
pub const fn extract_funct7(word: u32) -> u32 {
    word >> 25
}

/// Sign-extended I-type immediate
#[inline]
pub const fn extract_imm_i(word: u32) -> i32 {
    (word as i32) >> 20
}

/// Sign-extended S-type immediate
#[inline]
pub const fn extract_imm_s(word: u32) -> i32 {
    (((word as i32) >> 25) << 5) | ((word >> 7) & 0x1F) as i32
}

/// Sign-extended B-type offset
#[inline]
pub const fn extract_imm_b(word: u32) -> i32 {
    (((word as i32) >> 31) << 12)
        | (((word >> 7) & 0x1) << 11) as i32
        | (((word >> 25) & 0x3F) << 5) as i32
        | (((word >> 8) & 0xF) << 1) as i32
}

/// U-type upper field (20 bits, not shifted)
#[inline]
pub const fn extract_imm_u(word: u32) -> u32 {
    word >> 12
}

/// Sign-extended J-type offset
#[inline]
pub const fn extract_imm_j(word: u32) -> i32 {
    (((word as i32) >> 31) << 20)
        | (word & 0x000F_F000) as i32
        | (((word >> 20) & 0x1) << 11) as i32
        | (((word >> 21) & 0x3FF) << 1) as i32
}

// ============================================================================
// Field Packing
// ============================================================================

#[inline]
pub const fn pack_r(opcode: u32, rd: u32, funct3: u32, rs1: u32, rs2: u32, funct7: u32) -> u32 {
    (funct7 << 25)
        | ((rs2 & REGISTER_MASK) << 20)
        | ((rs1 & REGISTER_MASK) << 15)
        | ((funct3 & 0x7) << 12)
        | ((rd & REGISTER_MASK) << 7)
        | (opcode & OPCODE_MASK)
}

#[inline]
pub const fn pack_i(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm: i32) -> u32 {
    (((imm as u32) & 0xFFF) << 20)
        | ((rs1 & REGISTER_MASK) << 15)
        | ((funct3 & 0x7) << 12)
        | ((rd & REGISTER_MASK) << 7)
        | (opcode & OPCODE_MASK)
}

#[inline]
pub const fn pack_s(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7F) << 25)
        | ((rs2 & REGISTER_MASK) << 20)
        | ((rs1 & REGISTER_MASK) << 15)
        | ((funct3 & 0x7) << 12)
        | ((imm & 0x1F) << 7)
        | (opcode & OPCODE_MASK)
}

#[inline]
pub const fn pack_b(opcode: u32, funct3: u32, rs1: u32, rs2: u32, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 12) & 0x1) << 31)
        | (((imm >> 5) & 0x3F) << 25)
        | ((rs2 & REGISTER_MASK) << 20)
        | ((rs1 & REGISTER_MASK) << 15)
        | ((funct3 & 0x7) << 12)
        | (((imm >> 1) & 0xF) << 8)
        | (((imm >> 11) & 0x1) << 7)
        | (opcode & OPCODE_MASK)
}

#[inline]
pub const fn pack_u(opcode: u32, rd: u32, imm20: u32) -> u32 {
    ((imm20 & 0xF_FFFF) << 12) | ((rd & REGISTER_MASK) << 7) | (opcode & OPCODE_MASK)
}

#[inline]
pub const fn pack_j(opcode: u32, rd: u32, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3FF) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (imm & 0x000F_F000)
        | ((rd & REGISTER_MASK) << 7)
        | (opcode & OPCODE_MASK)
}

// ============================================================================
// Range Helpers
// ============================================================================

/// True if `value` fits in a signed field of `bits` bits
#[inline]
pub const fn fits_signed(value: i64, bits: u32) -> bool {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    value >= min && value <= max
}

/// Split a 32-bit constant into a `lui` upper field and an `addi` immediate
///
/// `(hi << 12) + lo == value` with `lo` in the signed 12-bit range.
#[inline]
pub const fn split_hi_lo(value: u32) -> (u32, i32) {
    let hi = (value.wrapping_add(0x800) >> 12) & 0xF_FFFF;
    let lo = value.wrapping_sub(hi << 12) as i32;
    (hi, lo)
}
