//! Disassembler errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisassemblerError {
    #[error("Invalid instruction encoding: 0x{0:08X}")]
    InvalidEncoding(u32),

    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("Invalid program: {0}")]
    InvalidProgram(#[from] protmem_spec::SpecError),
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;
