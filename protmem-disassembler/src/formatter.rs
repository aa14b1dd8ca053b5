//! Instruction formatting to assembly text

use protmem_spec::Instruction;

/// Format instruction as assembly text, using ABI register names
pub fn format(instr: &Instruction) -> String {
    let m = instr.mnemonic();
    match *instr {
        Instruction::Lui { rd, imm } => format!("{m} {rd}, {imm:#x}"),

        Instruction::Add { rd, rs1, rs2 } | Instruction::Sub { rd, rs1, rs2 } => {
            format!("{m} {rd}, {rs1}, {rs2}")
        }

        Instruction::Addi { rd, rs1, imm } => format!("{m} {rd}, {rs1}, {imm}"),

        Instruction::Lb { rd, rs1, imm }
        | Instruction::Lbu { rd, rs1, imm }
        | Instruction::Lw { rd, rs1, imm }
        | Instruction::Jalr { rd, rs1, imm } => format!("{m} {rd}, {imm}({rs1})"),

        Instruction::Sb { rs1, rs2, imm } | Instruction::Sw { rs1, rs2, imm } => {
            format!("{m} {rs2}, {imm}({rs1})")
        }

        Instruction::Beq { rs1, rs2, offset }
        | Instruction::Bne { rs1, rs2, offset }
        | Instruction::Blt { rs1, rs2, offset }
        | Instruction::Bge { rs1, rs2, offset } => format!("{m} {rs1}, {rs2}, {offset}"),

        Instruction::Jal { rd, offset } => format!("{m} {rd}, {offset}"),

        Instruction::Ecall | Instruction::Ebreak => m.to_string(),

        Instruction::Setproti { rs1 } | Instruction::Exitprot { rs1 } => format!("{m} {rs1}"),
        Instruction::Setprotd { rs1, rs2 } => format!("{m} {rs1}, {rs2}"),
        Instruction::Enterprot { rd } => format!("{m} {rd}"),
    }
}

/// Absolute target of a PC-relative branch or jump at `pc`
pub fn branch_target(instr: &Instruction, pc: u32) -> Option<u32> {
    match *instr {
        Instruction::Beq { offset, .. }
        | Instruction::Bne { offset, .. }
        | Instruction::Blt { offset, .. }
        | Instruction::Bge { offset, .. }
        | Instruction::Jal { offset, .. } => Some(pc.wrapping_add(offset as u32)),
        _ => None,
    }
}
