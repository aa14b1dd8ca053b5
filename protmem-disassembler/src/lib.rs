//! # Protmem Disassembler
//!
//! Decode Protmem machine code (RV32 subset plus Xprotmem) back into
//! assembly text. The runtime uses [`decode`] for instruction fetch.
//!
//! ## Example
//!
//! ```rust
//! use protmem_spec::Program;
//! use protmem_disassembler::disassemble;
//!
//! let program = Program::from_code(vec![0x0000_0073, 0x0010_0073]); // ecall, ebreak
//! let asm = disassemble(&program).unwrap();
//! assert!(asm.contains("ebreak"));
//! ```

pub mod decoder;
pub mod disassembler;
pub mod error;
pub mod formatter;

pub use decoder::decode;
pub use disassembler::disassemble;
pub use error::{DisassemblerError, Result};
pub use formatter::{branch_target, format};
