//! Flat byte-addressed memory
//!
//! Little-endian, fixed size, zero-initialized. Memory knows nothing about
//! protection; callers go through the Protection Unit first.

use crate::error::{Result, RuntimeError};
use protmem_spec::Program;

#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(size: u32) -> Self {
        Self {
            bytes: vec![0; size as usize],
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Byte range `[address, address + len)`, bounds-checked
    fn range(&self, address: u32, len: u32) -> Result<std::ops::Range<usize>> {
        let start = address as usize;
        let end = start + len as usize;
        if end > self.bytes.len() {
            // Report the first byte that is out of range
            let first_bad = address.max(self.size());
            return Err(RuntimeError::OutOfBounds { address: first_bad });
        }
        Ok(start..end)
    }

    pub fn read_u8(&self, address: u32) -> Result<u8> {
        let range = self.range(address, 1)?;
        Ok(self.bytes[range.start])
    }

    pub fn write_u8(&mut self, address: u32, value: u8) -> Result<()> {
        let range = self.range(address, 1)?;
        self.bytes[range.start] = value;
        Ok(())
    }

    pub fn read_u32(&self, address: u32) -> Result<u32> {
        check_word_alignment(address)?;
        let range = self.range(address, 4)?;
        let b = &self.bytes[range];
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<()> {
        check_word_alignment(address)?;
        let range = self.range(address, 4)?;
        self.bytes[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn read_bytes(&self, address: u32, len: u32) -> Result<&[u8]> {
        let range = self.range(address, len)?;
        Ok(&self.bytes[range])
    }

    pub fn write_bytes(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let range = self.range(address, data.len() as u32)?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Copy a program's code and data sections to their load addresses
    pub fn load_program(&mut self, program: &Program) -> Result<()> {
        let header = &program.header;
        self.check_section("code", header.code_base, header.code_size)?;
        self.check_section("data", header.data_base, header.data_size)?;

        for (i, &word) in program.code.iter().enumerate() {
            let address = header.code_base + (i as u32) * 4;
            self.write_u32(address, word)?;
        }
        self.write_bytes(header.data_base, &program.data)
    }

    fn check_section(&self, section: &'static str, base: u32, size: u32) -> Result<()> {
        let end = base as u64 + size as u64;
        if end > self.size() as u64 {
            return Err(RuntimeError::ProgramTooLarge {
                section,
                end,
                size: self.size(),
            });
        }
        Ok(())
    }
}

#[inline]
fn check_word_alignment(address: u32) -> Result<()> {
    if address % 4 != 0 {
        return Err(RuntimeError::MisalignedAccess {
            address,
            alignment: 4,
        });
    }
    Ok(())
}
