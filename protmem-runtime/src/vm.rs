//! Virtual Machine: one hart with its Protection Unit

use crate::error::{FaultReport, Result, RuntimeError};
use crate::execute::{execute, FaultContext};
use crate::memory::Memory;
use crate::protection::{AccessKind, ModeKind, ProtectionUnit};
use crate::state::{HaltReason, VMState};
use crate::syscall::{handle_syscall, IOHandler};
use protmem_spec::{Instruction, MachineConfig, Program, SpecError, NUM_REGISTERS};
use std::borrow::Cow;
use tracing::{trace, warn};

/// VM configuration
#[derive(Debug, Clone)]
pub struct VMConfig {
    /// Maximum number of cycles before halting
    pub max_cycles: u64,

    /// Log every executed instruction at `trace` level
    pub trace: bool,

    /// Memory size and section layout
    pub machine: MachineConfig,
}

impl Default for VMConfig {
    fn default() -> Self {
        Self {
            max_cycles: 1_000_000,
            trace: false,
            machine: MachineConfig::DEFAULT,
        }
    }
}

/// Execution result
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Number of instructions retired
    pub cycles: u64,

    /// Bytes written by the `write` syscalls
    pub output: Vec<u8>,

    /// Reason for halting
    pub halt_reason: HaltReason,

    /// Register file at halt
    pub registers: [u32; NUM_REGISTERS],

    /// Protection mode at halt
    pub final_mode: ModeKind,
}

impl ExecutionResult {
    pub fn output_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    pub fn fault(&self) -> Option<&FaultReport> {
        match &self.halt_reason {
            HaltReason::Fault(report) => Some(report),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> Option<u32> {
        match self.halt_reason {
            HaltReason::Exit(code) => Some(code),
            _ => None,
        }
    }
}

/// Protmem Virtual Machine
pub struct VM {
    state: VMState,
    memory: Memory,
    unit: ProtectionUnit,
    io: IOHandler,
    config: VMConfig,
}

impl VM {
    /// Create a VM with `program` loaded at its section bases
    pub fn new(program: Program, config: VMConfig) -> Result<Self> {
        config.machine.validate().map_err(SpecError::from)?;
        program.validate()?;

        let mut memory = Memory::new(config.machine.memory_size);
        memory.load_program(&program)?;

        Ok(Self {
            state: VMState::new(program.header.entry_point),
            memory,
            unit: ProtectionUnit::new(),
            io: IOHandler::new(),
            config,
        })
    }

    /// Run until halt and consume the VM.
    ///
    /// Output written before a runtime error is dropped with the VM; use
    /// [`VM::run_to_halt`] to keep it.
    pub fn run(mut self) -> Result<ExecutionResult> {
        self.run_to_halt()?;
        Ok(self.into_result())
    }

    /// Run until halt.
    ///
    /// A runtime error stops the loop without halting the hart. Registers,
    /// mode and output up to that point stay observable through the
    /// accessors.
    pub fn run_to_halt(&mut self) -> Result<()> {
        while !self.state.is_halted() {
            if self.state.cycles >= self.config.max_cycles {
                self.state.halt(HaltReason::CycleLimit);
                break;
            }
            self.step()?;
        }
        Ok(())
    }

    /// Execute one instruction.
    ///
    /// A protection fault halts the hart with [`HaltReason::Fault`] and is
    /// not returned as an error. Does nothing once halted.
    pub fn step(&mut self) -> Result<()> {
        if self.state.is_halted() {
            return Ok(());
        }

        match self.try_step() {
            Err(RuntimeError::Fault(report)) => {
                warn!(%report, "protection fault");
                self.state.halt(HaltReason::Fault(report));
                Ok(())
            }
            other => other,
        }
    }

    fn try_step(&mut self) -> Result<()> {
        let inst = self.fetch_and_decode()?;

        let ctx = FaultContext::capture(&self.state, &self.unit, Some(inst.opcode()));
        execute(&inst, &mut self.state, &mut self.memory, &mut self.unit)?;

        if matches!(inst, Instruction::Ecall) {
            handle_syscall(&mut self.state, &self.memory, &self.unit, &mut self.io, ctx)?;
        }

        self.state.inc_cycles();
        Ok(())
    }

    /// Fetch and decode the instruction at PC
    fn fetch_and_decode(&mut self) -> Result<Instruction> {
        let pc = self.state.pc;
        if pc % 4 != 0 {
            return Err(RuntimeError::MisalignedPc { pc });
        }

        let ctx = FaultContext::capture(&self.state, &self.unit, None);
        self.unit.admit_fetch(pc).map_err(|f| ctx.raise(f))?;
        self.unit
            .check_range(pc, 4, AccessKind::Fetch)
            .map_err(|f| ctx.raise(f))?;

        let word = self.memory.read_u32(pc)?;
        let inst = protmem_disassembler::decode(word)
            .map_err(|source| RuntimeError::Decode { pc, source })?;

        if self.config.trace {
            trace!(
                cycle = self.state.cycles,
                pc = format_args!("{pc:#010x}"),
                mode = %self.unit.mode(),
                "{}",
                protmem_disassembler::format(&inst)
            );
        }

        Ok(inst)
    }

    /// Final result of a halted run
    pub fn into_result(self) -> ExecutionResult {
        ExecutionResult {
            cycles: self.state.cycles,
            output: self.io.output().to_vec(),
            halt_reason: self.state.halt_reason.clone().unwrap_or(HaltReason::Ebreak),
            registers: self.state.registers,
            final_mode: self.unit.mode(),
        }
    }

    pub fn state(&self) -> &VMState {
        &self.state
    }

    /// Host access to the hart state, as a debugger would have
    pub fn state_mut(&mut self) -> &mut VMState {
        &mut self.state
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn protection(&self) -> &ProtectionUnit {
        &self.unit
    }

    pub fn output(&self) -> &[u8] {
        self.io.output()
    }

    pub fn config(&self) -> &VMConfig {
        &self.config
    }
}
