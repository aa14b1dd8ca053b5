//! Protmem Assembler
//!
//! Assemble Protmem assembly language (RV32 subset plus Xprotmem) into a
//! loadable [`Program`](protmem_spec::Program).
//!
//! ## Example
//!
//! ```rust
//! use protmem_assembler::assemble;
//!
//! let source = r#"
//!     .data
//!     secret: .byte 17, 96, 101, 27
//!     .text
//!     _start:
//!         la a0, secret
//!         setprotd a0, a1
//!         ebreak
//! "#;
//!
//! let program = assemble(source).unwrap();
//! assert_eq!(program.data.len(), 4);
//! ```

pub mod assembler;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod parser;

pub use assembler::{assemble, assemble_with, parse_instruction, SymbolTable, ENTRY_LABEL};
pub use encoder::{check_ranges, encode};
pub use error::{AssemblerError, Result};
pub use parser::{parse_line, parse_register, Line, Operand, Statement};
