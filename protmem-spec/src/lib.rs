//! # Protmem ISA Specification
//!
//! A minimal RV32 integer subset plus the Xprotmem extension: four
//! instructions that configure and toggle a Protected Memory Segment (PMS).
//!
//! ## Key Features
//! - 32 general-purpose 32-bit registers (x0 hard-wired to zero)
//! - Standard RV32I encodings for the general subset
//! - Xprotmem on the `custom-0` major opcode (`setproti`, `setprotd`,
//!   `enterprot`, `exitprot`)
//! - Flat little-endian byte-addressed memory

pub mod config;
pub mod encoding;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod register;

pub use config::{ConfigError, MachineConfig};
pub use error::{Result, SpecError};
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::{Program, ProgramHeader, MAGIC, VERSION};
pub use register::{Register, NUM_REGISTERS};

/// Word size
pub type Word = u32;

/// Address type (32-bit)
pub type Address = u32;

/// Instruction size in bytes
pub const INSTRUCTION_SIZE: u32 = 4;
