//! # Program Structure
//!
//! Program header and binary format.

use crate::config::MachineConfig;
use crate::error::SpecError;
use std::fmt;

/// Magic number for Protmem program files: "PMEM" little-endian
pub const MAGIC: u32 = 0x4D45_4D50;

/// Version: v1.0 = 0x00010000
pub const VERSION: u32 = 0x0001_0000;

/// Program header (32 bytes)
///
/// Binary format:
/// ```text
/// Offset  Size  Field
/// ──────────────────────────────────
/// 0x00    4     magic ("PMEM")
/// 0x04    4     version
/// 0x08    4     entry_point
/// 0x0C    4     code_base
/// 0x10    4     code_size
/// 0x14    4     data_base
/// 0x18    4     data_size
/// 0x1C    4     flags (reserved)
/// ```
#[repr(C)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramHeader {
    pub magic: u32,
    pub version: u32,
    /// Address of the first instruction executed
    pub entry_point: u32,
    /// Load address of the code section
    pub code_base: u32,
    /// Code section size in bytes
    pub code_size: u32,
    /// Load address of the data section
    pub data_base: u32,
    /// Data section size in bytes
    pub data_size: u32,
    /// Reserved
    pub flags: u32,
}

impl ProgramHeader {
    /// Header size in bytes
    pub const SIZE: usize = 32;

    /// Create a new header laid out for the default machine
    pub fn new() -> Self {
        Self::for_machine(&MachineConfig::DEFAULT)
    }

    /// Create a header laid out for `config`
    pub fn for_machine(config: &MachineConfig) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            entry_point: config.code_base,
            code_base: config.code_base,
            code_size: 0,
            data_base: config.data_base,
            data_size: 0,
            flags: 0,
        }
    }

    /// Validate the header
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.magic != MAGIC {
            return Err(SpecError::InvalidMagic(self.magic));
        }

        if self.version != VERSION {
            return Err(SpecError::InvalidVersion {
                expected: VERSION,
                found: self.version,
            });
        }

        let code_end = self.code_base as u64 + self.code_size as u64;
        let entry = self.entry_point as u64;
        if self.code_size > 0 && (entry < self.code_base as u64 || entry >= code_end || entry % 4 != 0) {
            return Err(SpecError::InvalidEntryPoint {
                entry: self.entry_point,
            });
        }

        Ok(())
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let fields = [
            self.magic,
            self.version,
            self.entry_point,
            self.code_base,
            self.code_size,
            self.data_base,
            self.data_size,
            self.flags,
        ];

        let mut bytes = [0u8; Self::SIZE];
        for (chunk, field) in bytes.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpecError> {
        if bytes.len() < Self::SIZE {
            return Err(SpecError::InvalidHeaderSize {
                expected: Self::SIZE,
                found: bytes.len(),
            });
        }

        let field = |i: usize| {
            let o = i * 4;
            u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]])
        };

        let header = Self {
            magic: field(0),
            version: field(1),
            entry_point: field(2),
            code_base: field(3),
            code_size: field(4),
            data_base: field(5),
            data_size: field(6),
            flags: field(7),
        };

        header.validate()?;
        Ok(header)
    }
}

impl Default for ProgramHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProgramHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Protmem Program Header")?;
        writeln!(f, "  Magic:       {:#010x}", self.magic)?;
        writeln!(f, "  Version:     {:#010x}", self.version)?;
        writeln!(f, "  Entry:       {:#010x}", self.entry_point)?;
        writeln!(f, "  Code:        {:#010x} ({} bytes)", self.code_base, self.code_size)?;
        writeln!(f, "  Data:        {:#010x} ({} bytes)", self.data_base, self.data_size)?;
        Ok(())
    }
}

/// Complete program structure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    /// Program header
    pub header: ProgramHeader,

    /// Code section (instruction words)
    pub code: Vec<u32>,

    /// Data section (initialized data)
    pub data: Vec<u8>,
}

impl Program {
    /// Create a new empty program
    pub fn new() -> Self {
        Self {
            header: ProgramHeader::new(),
            code: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Create a program from raw instruction words for the default machine
    pub fn from_code(code: Vec<u32>) -> Self {
        let mut program = Self::new();
        program.header.code_size = (code.len() * 4) as u32;
        program.code = code;
        program
    }

    /// Create a program with both sections laid out for `config`
    pub fn with_sections(config: &MachineConfig, entry_point: u32, code: Vec<u32>, data: Vec<u8>) -> Self {
        let mut header = ProgramHeader::for_machine(config);
        header.entry_point = entry_point;
        header.code_size = (code.len() * 4) as u32;
        header.data_size = data.len() as u32;
        Self { header, code, data }
    }

    /// Address one past the last instruction
    pub fn code_end(&self) -> u32 {
        self.header.code_base.wrapping_add(self.header.code_size)
    }

    /// Validate the program
    pub fn validate(&self) -> Result<(), SpecError> {
        self.header.validate()?;

        if self.code.len() * 4 != self.header.code_size as usize {
            return Err(SpecError::InvalidCodeSize {
                expected: self.header.code_size as usize,
                found: self.code.len() * 4,
            });
        }

        if self.data.len() != self.header.data_size as usize {
            return Err(SpecError::InvalidDataSize {
                expected: self.header.data_size as usize,
                found: self.data.len(),
            });
        }

        Ok(())
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ProgramHeader::SIZE + self.code.len() * 4 + self.data.len());

        bytes.extend_from_slice(&self.header.to_bytes());
        for &word in &self.code {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes.extend_from_slice(&self.data);

        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpecError> {
        let header = ProgramHeader::from_bytes(bytes)?;

        if header.code_size % 4 != 0 {
            return Err(SpecError::InvalidCodeSize {
                expected: (header.code_size as usize / 4) * 4,
                found: header.code_size as usize,
            });
        }

        let code_start = ProgramHeader::SIZE;
        let code_end = code_start + header.code_size as usize;
        let data_end = code_end + header.data_size as usize;

        if bytes.len() < data_end {
            return Err(SpecError::InvalidProgramSize {
                expected: data_end,
                found: bytes.len(),
            });
        }

        let code = bytes[code_start..code_end]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let data = bytes[code_end..data_end].to_vec();

        let program = Self { header, code, data };
        program.validate()?;
        Ok(program)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}
