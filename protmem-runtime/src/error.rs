//! Runtime error types for the Protmem VM

use crate::protection::{AccessKind, ModeKind};
use protmem_spec::{Opcode, SpecError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Privileged protection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Setproti,
    Setprotd,
    Enterprot,
    Exitprot,
    /// Host or hart read of the entry pointer register
    ReadEntryPointer,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Setproti => "setproti",
            Operation::Setprotd => "setprotd",
            Operation::Enterprot => "enterprot",
            Operation::Exitprot => "exitprot",
            Operation::ReadEntryPointer => "entry pointer read",
        })
    }
}

/// Protection register left unconfigured at `enterprot`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissingConfig {
    EntryPointer,
    Segment,
    EmptySegment,
    Both,
}

impl fmt::Display for MissingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingConfig::EntryPointer => "entry pointer not set",
            MissingConfig::Segment => "segment not set",
            MissingConfig::EmptySegment => "segment has zero length",
            MissingConfig::Both => "entry pointer and segment not set",
        })
    }
}

/// Protection fault raised by the Protection Unit. Always terminal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Fault {
    #[error("privilege violation: {operation} not permitted in {mode} mode")]
    PrivilegeViolation { operation: Operation, mode: ModeKind },

    #[error("configuration fault: {missing}")]
    ConfigurationFault { missing: MissingConfig },

    #[error("protmem violation: {kind} at {address:#010x}")]
    ProtmemViolation { address: u32, kind: AccessKind },
}

impl Fault {
    /// Stable numeric code, used for process exit status
    pub fn code(&self) -> u8 {
        match self {
            Fault::PrivilegeViolation { .. } => 1,
            Fault::ConfigurationFault { .. } => 2,
            Fault::ProtmemViolation { .. } => 3,
        }
    }
}

/// Fault together with the hart context it was raised in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultReport {
    pub fault: Fault,
    /// Mode at the time of the fault
    pub mode: ModeKind,
    /// PC of the faulting instruction
    pub pc: u32,
    /// Cycle of the faulting instruction
    pub cycle: u64,
    /// Opcode being executed, if the fault was not raised at fetch
    pub opcode: Option<Opcode>,
}

impl fmt::Display for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pc {:#010x}, cycle {}, {} mode", self.fault, self.pc, self.cycle, self.mode)?;
        if let Some(opcode) = self.opcode {
            write!(f, ", executing {opcode}")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    #[error("{0}")]
    Fault(FaultReport),

    #[error("Memory out of bounds: address {address:#x}")]
    OutOfBounds { address: u32 },

    #[error("Misaligned access: address {address:#x}, alignment {alignment}")]
    MisalignedAccess { address: u32, alignment: u32 },

    #[error("Misaligned PC: {pc:#x}")]
    MisalignedPc { pc: u32 },

    #[error("Decode error at PC {pc:#x}: {source}")]
    Decode {
        pc: u32,
        #[source]
        source: protmem_disassembler::DisassemblerError,
    },

    #[error("Program does not fit in memory: {section} section ends at {end:#x}, memory is {size:#x} bytes")]
    ProgramTooLarge { section: &'static str, end: u64, size: u32 },

    #[error("Invalid syscall: {syscall}")]
    InvalidSyscall { syscall: u32 },
}

impl RuntimeError {
    /// Fault report, if this error is a protection fault
    pub fn fault(&self) -> Option<&FaultReport> {
        match self {
            RuntimeError::Fault(report) => Some(report),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
