//! Protmem CLI: assemble and run programs on the simulated hart

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use protmem_runtime::{ExecutionResult, HaltReason, VMConfig, VM};
use protmem_spec::{MachineConfig, Program};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status when the cycle limit is reached
const EXIT_CYCLE_LIMIT: u8 = 124;

/// Base added to the fault code, as for a process killed by a signal
const EXIT_FAULT_BASE: u8 = 128;

#[derive(Parser)]
#[command(name = "protmem")]
#[command(about = "Protection-mode instruction-set simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble and run a program
    Run {
        /// Assembly source file
        file: PathBuf,

        /// Halt after this many instructions
        #[arg(long, default_value_t = VMConfig::default().max_cycles)]
        max_cycles: u64,

        /// Size of the flat memory in bytes
        #[arg(long, default_value_t = MachineConfig::DEFAULT.memory_size)]
        memory_size: u32,

        /// Log every executed instruction
        #[arg(long)]
        trace: bool,
    },

    /// Assemble a program and print its disassembly
    Disasm {
        /// Assembly source file
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Commands::Run { trace: true, .. });
    init_logging(trace);

    match cli.command {
        Commands::Run {
            file,
            max_cycles,
            memory_size,
            trace,
        } => cmd_run(&file, max_cycles, memory_size, trace),
        Commands::Disasm { file } => cmd_disasm(&file),
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `trace` with `--trace`
fn init_logging(trace: bool) {
    let default = if trace { "trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(file: &Path, machine: &MachineConfig) -> Result<Program> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    protmem_assembler::assemble_with(&source, machine)
        .with_context(|| format!("failed to assemble {}", file.display()))
}

fn cmd_run(file: &Path, max_cycles: u64, memory_size: u32, trace: bool) -> Result<ExitCode> {
    let machine = MachineConfig {
        memory_size,
        ..MachineConfig::DEFAULT
    };
    machine.validate().context("invalid --memory-size")?;

    let program = load(file, &machine)?;
    let config = VMConfig {
        max_cycles,
        trace,
        machine,
    };

    let mut vm = VM::new(program, config)?;
    let outcome = vm.run_to_halt();

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(vm.output())?;
    stdout.flush()?;

    outcome.with_context(|| {
        format!(
            "execution stopped at pc {:#010x} in {} mode after {} cycles",
            vm.state().pc,
            vm.protection().mode(),
            vm.state().cycles
        )
    })?;

    let result = vm.into_result();
    if let HaltReason::Fault(report) = &result.halt_reason {
        eprintln!("protmem: {report}");
    } else if result.halt_reason == HaltReason::CycleLimit {
        eprintln!("protmem: cycle limit reached after {} cycles", result.cycles);
    }

    Ok(ExitCode::from(exit_status(&result)))
}

/// Process exit status for a halted run
fn exit_status(result: &ExecutionResult) -> u8 {
    match &result.halt_reason {
        HaltReason::Exit(code) => *code as u8,
        HaltReason::Ebreak => 0,
        HaltReason::CycleLimit => EXIT_CYCLE_LIMIT,
        HaltReason::Fault(report) => EXIT_FAULT_BASE + report.fault.code(),
    }
}

fn cmd_disasm(file: &Path) -> Result<ExitCode> {
    let program = load(file, &MachineConfig::DEFAULT)?;
    let listing = protmem_disassembler::disassemble(&program)?;
    print!("{listing}");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protmem_runtime::{AccessKind, Fault, FaultReport, MissingConfig, ModeKind, Operation};
    use protmem_spec::NUM_REGISTERS;

    fn halted(halt_reason: HaltReason) -> ExecutionResult {
        ExecutionResult {
            cycles: 10,
            output: Vec::new(),
            halt_reason,
            registers: [0; NUM_REGISTERS],
            final_mode: ModeKind::Unlocked,
        }
    }

    fn faulted(fault: Fault) -> ExecutionResult {
        halted(HaltReason::Fault(FaultReport {
            fault,
            mode: ModeKind::Locked,
            pc: 0x1010,
            cycle: 10,
            opcode: None,
        }))
    }

    #[test]
    fn test_exit_status_for_exit_and_ebreak() {
        assert_eq!(exit_status(&halted(HaltReason::Exit(0))), 0);
        assert_eq!(exit_status(&halted(HaltReason::Exit(42))), 42);
        // Truncated to the low 8 bits
        assert_eq!(exit_status(&halted(HaltReason::Exit(0x1FF))), 0xFF);
        assert_eq!(exit_status(&halted(HaltReason::Ebreak)), 0);
    }

    #[test]
    fn test_exit_status_for_cycle_limit() {
        assert_eq!(exit_status(&halted(HaltReason::CycleLimit)), 124);
    }

    #[test]
    fn test_exit_status_for_faults() {
        let privilege = faulted(Fault::PrivilegeViolation {
            operation: Operation::Setprotd,
            mode: ModeKind::Locked,
        });
        let configuration = faulted(Fault::ConfigurationFault { missing: MissingConfig::Both });
        let protmem = faulted(Fault::ProtmemViolation { address: 0x10000, kind: AccessKind::Read });

        assert_eq!(exit_status(&privilege), 129);
        assert_eq!(exit_status(&configuration), 130);
        assert_eq!(exit_status(&protmem), 131);
    }

    #[test]
    fn test_demo_exits_with_privilege_violation_status() {
        let program = protmem_assembler::assemble(include_str!("../../demos/protmem_demo.s")).unwrap();
        let result = VM::new(program, VMConfig::default()).unwrap().run().unwrap();
        assert_eq!(exit_status(&result), 129);
    }
}
