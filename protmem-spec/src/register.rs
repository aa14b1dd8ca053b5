//! Register definitions (RISC-V calling convention)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of registers
pub const NUM_REGISTERS: usize = 32;

/// Register (x0-x31)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    R0 = 0,   // zero - hardwired to 0
    R1 = 1,   // ra
    R2 = 2,   // sp
    R3 = 3,   // gp
    R4 = 4,   // tp
    R5 = 5,   // t0
    R6 = 6,   // t1
    R7 = 7,   // t2
    R8 = 8,   // s0/fp
    R9 = 9,   // s1
    R10 = 10, // a0
    R11 = 11, // a1
    R12 = 12, // a2
    R13 = 13, // a3
    R14 = 14, // a4
    R15 = 15, // a5
    R16 = 16, // a6
    R17 = 17, // a7
    R18 = 18, // s2
    R19 = 19, // s3
    R20 = 20, // s4
    R21 = 21, // s5
    R22 = 22, // s6
    R23 = 23, // s7
    R24 = 24, // s8
    R25 = 25, // s9
    R26 = 26, // s10
    R27 = 27, // s11
    R28 = 28, // t3
    R29 = 29, // t4
    R30 = 30, // t5
    R31 = 31, // t6
}

const ALL: [Register; NUM_REGISTERS] = [
    Register::R0, Register::R1, Register::R2, Register::R3,
    Register::R4, Register::R5, Register::R6, Register::R7,
    Register::R8, Register::R9, Register::R10, Register::R11,
    Register::R12, Register::R13, Register::R14, Register::R15,
    Register::R16, Register::R17, Register::R18, Register::R19,
    Register::R20, Register::R21, Register::R22, Register::R23,
    Register::R24, Register::R25, Register::R26, Register::R27,
    Register::R28, Register::R29, Register::R30, Register::R31,
];

const ABI_NAMES: [&str; NUM_REGISTERS] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2",
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7",
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

impl Register {
    pub const ZERO: Self = Self::R0;
    pub const RA: Self = Self::R1;
    pub const SP: Self = Self::R2;
    pub const GP: Self = Self::R3;
    pub const TP: Self = Self::R4;
    pub const T0: Self = Self::R5;
    pub const T1: Self = Self::R6;
    pub const T2: Self = Self::R7;
    pub const FP: Self = Self::R8;
    pub const A0: Self = Self::R10;
    pub const A1: Self = Self::R11;
    pub const A2: Self = Self::R12;
    pub const A3: Self = Self::R13;
    pub const A4: Self = Self::R14;
    pub const A5: Self = Self::R15;
    pub const A6: Self = Self::R16;
    pub const A7: Self = Self::R17;

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        ALL.get(index).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// ABI name (`a0`, `t1`, ...)
    pub fn name(self) -> &'static str {
        ABI_NAMES[self.index()]
    }

    /// Parse an ABI name, `fp`, or a numeric `xN` name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name == "fp" {
            return Some(Self::FP);
        }
        if let Some(pos) = ABI_NAMES.iter().position(|n| *n == name) {
            return Self::from_index(pos);
        }
        name.strip_prefix('x')
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(Self::from_index)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_bounds() {
        assert_eq!(Register::from_index(0), Some(Register::ZERO));
        assert_eq!(Register::from_index(31), Some(Register::R31));
        assert_eq!(Register::from_index(32), None);
    }

    #[test]
    fn test_index_matches_discriminant() {
        for (i, reg) in ALL.iter().enumerate() {
            assert_eq!(reg.index(), i);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Register::from_name("a5"), Some(Register::A5));
        assert_eq!(Register::from_name("T1"), Some(Register::T1));
        assert_eq!(Register::from_name("fp"), Some(Register::R8));
        assert_eq!(Register::from_name("s0"), Some(Register::R8));
        assert_eq!(Register::from_name("x13"), Some(Register::A3));
        assert_eq!(Register::from_name("x32"), None);
        assert_eq!(Register::from_name("r1"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Register::A3.to_string(), "a3");
        assert_eq!(Register::ZERO.to_string(), "zero");
    }
}
