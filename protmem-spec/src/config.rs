//! # Machine Configuration
//!
//! Memory size and section placement for a simulated hart. The assembler
//! uses the section bases for layout; the runtime sizes its flat memory
//! from `memory_size`.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachineConfig {
    /// Size of the flat memory in bytes
    pub memory_size: u32,
    /// Address of the first instruction
    pub code_base: u32,
    /// Address of the first data byte
    pub data_base: u32,
}

impl MachineConfig {
    /// Default machine: 1 MiB of memory, code at 0x1000, data at 0x10000
    pub const DEFAULT: Self = Self {
        memory_size: 1 << 20,
        code_base: 0x0000_1000,
        data_base: 0x0001_0000,
    };

    /// Smallest memory accepted by `validate`
    pub const MIN_MEMORY_SIZE: u32 = 0x2000;

    /// Largest memory accepted by `validate` (256 MiB)
    pub const MAX_MEMORY_SIZE: u32 = 1 << 28;

    /// Create a new configuration with validation
    pub fn new(memory_size: u32, code_base: u32, data_base: u32) -> Result<Self, ConfigError> {
        let config = Self {
            memory_size,
            code_base,
            data_base,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_size < Self::MIN_MEMORY_SIZE || self.memory_size > Self::MAX_MEMORY_SIZE {
            return Err(ConfigError::InvalidMemorySize(self.memory_size));
        }
        if self.memory_size % 4 != 0 {
            return Err(ConfigError::UnalignedMemorySize(self.memory_size));
        }
        if self.code_base % 4 != 0 {
            return Err(ConfigError::UnalignedCodeBase(self.code_base));
        }
        if self.code_base >= self.data_base {
            return Err(ConfigError::SectionOrder {
                code_base: self.code_base,
                data_base: self.data_base,
            });
        }
        if self.data_base >= self.memory_size {
            return Err(ConfigError::DataOutsideMemory {
                data_base: self.data_base,
                memory_size: self.memory_size,
            });
        }
        Ok(())
    }

    /// Bytes available for code
    #[inline]
    pub const fn code_capacity(&self) -> u32 {
        self.data_base - self.code_base
    }

    /// Bytes available for data
    #[inline]
    pub const fn data_capacity(&self) -> u32 {
        self.memory_size - self.data_base
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MachineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MachineConfig {{ memory: {} KiB, code: {:#010x}, data: {:#010x} }}",
            self.memory_size / 1024,
            self.code_base,
            self.data_base,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("memory size {0:#x} outside [{min:#x}, {max:#x}]", min = MachineConfig::MIN_MEMORY_SIZE, max = MachineConfig::MAX_MEMORY_SIZE)]
    InvalidMemorySize(u32),

    #[error("memory size {0:#x} is not a multiple of 4")]
    UnalignedMemorySize(u32),

    #[error("code base {0:#010x} is not 4-byte aligned")]
    UnalignedCodeBase(u32),

    #[error("code base {code_base:#010x} must lie below data base {data_base:#010x}")]
    SectionOrder { code_base: u32, data_base: u32 },

    #[error("data base {data_base:#010x} outside memory of {memory_size:#x} bytes")]
    DataOutsideMemory { data_base: u32, memory_size: u32 },
}
