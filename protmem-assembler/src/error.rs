//! Assembler errors
//!
//! Every variant carries the 1-based source line it was raised on.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unknown instruction at line {line}: {mnemonic}")]
    UnknownInstruction { line: usize, mnemonic: String },

    #[error("Invalid operands at line {line}: {mnemonic} expects {expected}")]
    InvalidOperands {
        line: usize,
        mnemonic: String,
        expected: &'static str,
    },

    #[error("Invalid immediate at line {line}: {value} does not fit in {bits} bits")]
    InvalidImmediate { line: usize, value: i64, bits: u32 },

    #[error("Misaligned target at line {line}: offset {offset} is not a multiple of 2")]
    MisalignedTarget { line: usize, offset: i64 },

    #[error("Undefined label at line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("Duplicate label at line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("Invalid directive at line {line}: .{directive}")]
    InvalidDirective { line: usize, directive: String },

    #[error("Line {line}: {what} not allowed in the {section} section")]
    WrongSection {
        line: usize,
        what: String,
        section: &'static str,
    },

    #[error("Line {line}: {section} section overflows its region ({size} bytes, capacity {capacity})")]
    SectionOverflow {
        line: usize,
        section: &'static str,
        size: u64,
        capacity: u32,
    },
}

impl AssemblerError {
    /// Source line of the error
    pub fn line(&self) -> usize {
        match self {
            AssemblerError::SyntaxError { line, .. }
            | AssemblerError::UnknownInstruction { line, .. }
            | AssemblerError::InvalidOperands { line, .. }
            | AssemblerError::InvalidImmediate { line, .. }
            | AssemblerError::MisalignedTarget { line, .. }
            | AssemblerError::UndefinedLabel { line, .. }
            | AssemblerError::DuplicateLabel { line, .. }
            | AssemblerError::InvalidDirective { line, .. }
            | AssemblerError::WrongSection { line, .. }
            | AssemblerError::SectionOverflow { line, .. } => *line,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
