//! Instruction execution
//!
//! Every load and store is checked by the Protection Unit before memory is
//! touched. The Xprotmem instructions are forwarded to the unit's handlers.

use crate::error::{Fault, FaultReport, Result, RuntimeError};
use crate::memory::Memory;
use crate::protection::{AccessKind, ModeKind, ProtectionUnit};
use crate::state::{HaltReason, VMState};
use protmem_spec::{Instruction, Opcode};

/// Hart context captured before an instruction runs, used to report a fault
#[derive(Debug, Clone, Copy)]
pub struct FaultContext {
    pub mode: ModeKind,
    pub pc: u32,
    pub cycle: u64,
    pub opcode: Option<Opcode>,
}

impl FaultContext {
    pub fn capture(state: &VMState, unit: &ProtectionUnit, opcode: Option<Opcode>) -> Self {
        Self {
            mode: unit.mode(),
            pc: state.pc,
            cycle: state.cycles,
            opcode,
        }
    }

    pub fn raise(self, fault: Fault) -> RuntimeError {
        RuntimeError::Fault(FaultReport {
            fault,
            mode: self.mode,
            pc: self.pc,
            cycle: self.cycle,
            opcode: self.opcode,
        })
    }
}

#[inline]
fn effective_address(state: &VMState, base: protmem_spec::Register, imm: i32) -> u32 {
    state.read_reg(base).wrapping_add(imm as u32)
}

fn load_byte(memory: &Memory, unit: &ProtectionUnit, address: u32, ctx: FaultContext) -> Result<u8> {
    unit.check_access(address, AccessKind::Read)
        .map_err(|f| ctx.raise(f))?;
    memory.read_u8(address)
}

fn load_word(memory: &Memory, unit: &ProtectionUnit, address: u32, ctx: FaultContext) -> Result<u32> {
    unit.check_range(address, 4, AccessKind::Read)
        .map_err(|f| ctx.raise(f))?;
    memory.read_u32(address)
}

fn store_byte(
    memory: &mut Memory,
    unit: &ProtectionUnit,
    address: u32,
    value: u8,
    ctx: FaultContext,
) -> Result<()> {
    unit.check_access(address, AccessKind::Write)
        .map_err(|f| ctx.raise(f))?;
    memory.write_u8(address, value)
}

fn store_word(
    memory: &mut Memory,
    unit: &ProtectionUnit,
    address: u32,
    value: u32,
    ctx: FaultContext,
) -> Result<()> {
    unit.check_range(address, 4, AccessKind::Write)
        .map_err(|f| ctx.raise(f))?;
    memory.write_u32(address, value)
}

#[inline]
fn branch(state: &mut VMState, taken: bool, offset: i32) {
    if taken {
        state.pc = state.pc.wrapping_add(offset as u32);
    } else {
        state.advance_pc();
    }
}

/// Execute a single instruction.
///
/// `ecall` only advances the PC; the VM dispatches the syscall.
pub fn execute(
    instr: &Instruction,
    state: &mut VMState,
    memory: &mut Memory,
    unit: &mut ProtectionUnit,
) -> Result<()> {
    let ctx = FaultContext::capture(state, unit, Some(instr.opcode()));

    match *instr {
        Instruction::Lui { rd, imm } => {
            state.write_reg(rd, imm << 12);
            state.advance_pc();
        }

        // ========== Arithmetic ==========
        Instruction::Add { rd, rs1, rs2 } => {
            let result = state.read_reg(rs1).wrapping_add(state.read_reg(rs2));
            state.write_reg(rd, result);
            state.advance_pc();
        }

        Instruction::Sub { rd, rs1, rs2 } => {
            let result = state.read_reg(rs1).wrapping_sub(state.read_reg(rs2));
            state.write_reg(rd, result);
            state.advance_pc();
        }

        Instruction::Addi { rd, rs1, imm } => {
            let result = state.read_reg(rs1).wrapping_add(imm as u32);
            state.write_reg(rd, result);
            state.advance_pc();
        }

        // ========== Loads ==========
        Instruction::Lb { rd, rs1, imm } => {
            let address = effective_address(state, rs1, imm);
            let byte = load_byte(memory, unit, address, ctx)?;
            state.write_reg(rd, byte as i8 as i32 as u32);
            state.advance_pc();
        }

        Instruction::Lbu { rd, rs1, imm } => {
            let address = effective_address(state, rs1, imm);
            let byte = load_byte(memory, unit, address, ctx)?;
            state.write_reg(rd, byte as u32);
            state.advance_pc();
        }

        Instruction::Lw { rd, rs1, imm } => {
            let address = effective_address(state, rs1, imm);
            let word = load_word(memory, unit, address, ctx)?;
            state.write_reg(rd, word);
            state.advance_pc();
        }

        // ========== Stores ==========
        Instruction::Sb { rs1, rs2, imm } => {
            let address = effective_address(state, rs1, imm);
            store_byte(memory, unit, address, state.read_reg(rs2) as u8, ctx)?;
            state.advance_pc();
        }

        Instruction::Sw { rs1, rs2, imm } => {
            let address = effective_address(state, rs1, imm);
            store_word(memory, unit, address, state.read_reg(rs2), ctx)?;
            state.advance_pc();
        }

        // ========== Branches ==========
        Instruction::Beq { rs1, rs2, offset } => {
            let taken = state.read_reg(rs1) == state.read_reg(rs2);
            branch(state, taken, offset);
        }

        Instruction::Bne { rs1, rs2, offset } => {
            let taken = state.read_reg(rs1) != state.read_reg(rs2);
            branch(state, taken, offset);
        }

        Instruction::Blt { rs1, rs2, offset } => {
            let taken = (state.read_reg(rs1) as i32) < (state.read_reg(rs2) as i32);
            branch(state, taken, offset);
        }

        Instruction::Bge { rs1, rs2, offset } => {
            let taken = (state.read_reg(rs1) as i32) >= (state.read_reg(rs2) as i32);
            branch(state, taken, offset);
        }

        // ========== Jumps ==========
        Instruction::Jal { rd, offset } => {
            let link = state.pc.wrapping_add(4);
            state.pc = state.pc.wrapping_add(offset as u32);
            state.write_reg(rd, link);
        }

        Instruction::Jalr { rd, rs1, imm } => {
            let link = state.pc.wrapping_add(4);
            // Target is computed before rd is written (rd may equal rs1)
            let target = effective_address(state, rs1, imm) & !1;
            state.pc = target;
            state.write_reg(rd, link);
        }

        // ========== System ==========
        Instruction::Ecall => {
            state.advance_pc();
        }

        Instruction::Ebreak => {
            state.halt(HaltReason::Ebreak);
        }

        // ========== Xprotmem ==========
        Instruction::Setproti { rs1 } => {
            unit.setproti(state.read_reg(rs1))
                .map_err(|f| ctx.raise(f))?;
            state.advance_pc();
        }

        Instruction::Setprotd { rs1, rs2 } => {
            unit.setprotd(state.read_reg(rs1), state.read_reg(rs2))
                .map_err(|f| ctx.raise(f))?;
            state.advance_pc();
        }

        Instruction::Enterprot { rd } => {
            let link = state.pc.wrapping_add(4);
            let entry = unit.enterprot(link).map_err(|f| ctx.raise(f))?;
            state.write_reg(rd, link);
            state.pc = entry;
        }

        Instruction::Exitprot { rs1 } => {
            let next = unit.exitprot(state.read_reg(rs1))
                .map_err(|f| ctx.raise(f))?;
            state.pc = next;
        }
    }

    Ok(())
}
