//! # Protmem Runtime
//!
//! Execute Protmem programs on a simulated RV32 hart with a Protection Unit.
//!
//! The Protection Unit guards a single Protected Memory Segment: while the
//! hart is Locked, only the trusted routine entered through `enterprot` may
//! touch the segment. Any other fetch, load or store inside it raises a
//! terminal protection fault.
//!
//! ## Example
//!
//! ```rust,no_run
//! use protmem_runtime::{VM, VMConfig};
//! use protmem_spec::Program;
//!
//! let program = Program::from_code(vec![0x0010_0073]); // ebreak
//! let vm = VM::new(program, VMConfig::default()).unwrap();
//! let result = vm.run().unwrap();
//! println!("Cycles: {}", result.cycles);
//! ```

pub mod error;
pub mod execute;
pub mod memory;
pub mod protection;
pub mod state;
pub mod syscall;
pub mod vm;

pub use error::{Fault, FaultReport, MissingConfig, Operation, Result, RuntimeError};
pub use memory::Memory;
pub use protection::{
    decide, AccessKind, ModeKind, ProtectionState, ProtectionUnit, Segment, SegmentCapability,
};
pub use state::{HaltReason, VMState};
pub use syscall::{handle_syscall, IOHandler};
pub use vm::{ExecutionResult, VMConfig, VM};

/// Simple execution helper
///
/// Runs a program on the default machine and returns the output bytes.
/// A protection fault is returned as [`RuntimeError::Fault`].
pub fn run(program: protmem_spec::Program) -> Result<Vec<u8>> {
    let result = VM::new(program, VMConfig::default())?.run()?;
    match result.halt_reason {
        HaltReason::Fault(report) => Err(RuntimeError::Fault(report)),
        _ => Ok(result.output),
    }
}
