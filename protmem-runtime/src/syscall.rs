//! Syscall handling
//!
//! Syscall number in `a7`, following the RISC-V Linux ABI:
//! - `exit` (93): halt with exit code `a0`
//! - `write` (64): append `a2` bytes at address `a1` to the output buffer
//! - `write_int` (1): append the decimal value of `a0` to the output buffer
//!
//! `write` reads guest memory and is checked like any other load.

use crate::error::{Result, RuntimeError};
use crate::execute::FaultContext;
use crate::memory::Memory;
use crate::protection::{AccessKind, ProtectionUnit};
use crate::state::{HaltReason, VMState};
use protmem_spec::Register;
use tracing::debug;

pub const SYSCALL_WRITE_INT: u32 = 1;
pub const SYSCALL_WRITE: u32 = 64;
pub const SYSCALL_EXIT: u32 = 93;

/// Output buffer filled by the `write` syscalls
#[derive(Debug, Clone, Default)]
pub struct IOHandler {
    output: Vec<u8>,
}

impl IOHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

/// Handle an `ecall`. `ctx` is the context of the `ecall` instruction.
pub fn handle_syscall(
    state: &mut VMState,
    memory: &Memory,
    unit: &ProtectionUnit,
    io: &mut IOHandler,
    ctx: FaultContext,
) -> Result<()> {
    let number = state.read_reg(Register::A7);

    match number {
        SYSCALL_EXIT => {
            let code = state.read_reg(Register::A0);
            debug!(code, "exit");
            state.halt(HaltReason::Exit(code));
        }

        SYSCALL_WRITE => {
            let address = state.read_reg(Register::A1);
            let len = state.read_reg(Register::A2);
            unit.check_range(address, len, AccessKind::Read)
                .map_err(|f| ctx.raise(f))?;
            io.write(memory.read_bytes(address, len)?);
            state.write_reg(Register::A0, len);
        }

        SYSCALL_WRITE_INT => {
            let value = state.read_reg(Register::A0) as i32;
            io.write(value.to_string().as_bytes());
        }

        _ => return Err(RuntimeError::InvalidSyscall { syscall: number }),
    }

    Ok(())
}
