//! Hart state: registers, PC, cycle counter

use crate::error::FaultReport;
use protmem_spec::{Register, NUM_REGISTERS};

#[derive(Debug, Clone)]
pub struct VMState {
    /// General-purpose registers x0-x31
    pub registers: [u32; NUM_REGISTERS],

    /// Program counter
    pub pc: u32,

    /// Retired instruction count
    pub cycles: u64,

    pub halted: bool,

    pub halt_reason: Option<HaltReason>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// `exit` syscall with the given code
    Exit(u32),
    /// EBREAK instruction
    Ebreak,
    /// Cycle budget exhausted
    CycleLimit,
    /// Protection fault
    Fault(FaultReport),
}

impl VMState {
    pub fn new(entry_point: u32) -> Self {
        Self {
            registers: [0; NUM_REGISTERS],
            pc: entry_point,
            cycles: 0,
            halted: false,
            halt_reason: None,
        }
    }

    /// Read register (x0 always returns 0)
    #[inline]
    pub fn read_reg(&self, reg: Register) -> u32 {
        if reg.is_zero() {
            0
        } else {
            self.registers[reg.index()]
        }
    }

    /// Write register (writes to x0 are ignored)
    #[inline]
    pub fn write_reg(&mut self, reg: Register, value: u32) {
        if !reg.is_zero() {
            self.registers[reg.index()] = value;
        }
    }

    #[inline]
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(4);
    }

    #[inline]
    pub fn inc_cycles(&mut self) {
        self.cycles += 1;
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn halt(&mut self, reason: HaltReason) {
        self.halted = true;
        self.halt_reason = Some(reason);
    }
}
