//! # Error Types for the Protmem ISA

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    // Program format errors
    #[error("Invalid program magic: expected 0x4D454D50, got {0:#010x}")]
    InvalidMagic(u32),

    #[error("Invalid program version: expected {expected:#010x}, found {found:#010x}")]
    InvalidVersion { expected: u32, found: u32 },

    #[error("Invalid header size: expected {expected} bytes, found {found} bytes")]
    InvalidHeaderSize { expected: usize, found: usize },

    #[error("Invalid program size: expected {expected} bytes, found {found} bytes")]
    InvalidProgramSize { expected: usize, found: usize },

    #[error("Invalid code size: expected {expected} bytes, found {found} bytes")]
    InvalidCodeSize { expected: usize, found: usize },

    #[error("Invalid data size: expected {expected} bytes, found {found} bytes")]
    InvalidDataSize { expected: usize, found: usize },

    #[error("Entry point {entry:#010x} outside code section")]
    InvalidEntryPoint { entry: u32 },

    // Instruction errors
    #[error("Invalid instruction encoding: {0:#010x}")]
    InvalidEncoding(u32),

    #[error("Invalid register index: {0} (valid range: 0-31)")]
    InvalidRegister(u8),

    #[error("Immediate {value} does not fit in {bits} bits")]
    ImmediateOutOfRange { value: i64, bits: u32 },
}

pub type Result<T> = std::result::Result<T, SpecError>;
