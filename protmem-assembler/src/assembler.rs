//! Main assembler logic
//!
//! Two passes over the parsed lines:
//! 1. lay out `.text` and `.data` and record every label's address;
//! 2. lower each statement at its final address and emit words and bytes.

use crate::encoder::{check_ranges, encode};
use crate::error::{AssemblerError, Result};
use crate::parser::{parse_line, Line, Operand, Statement};
use protmem_spec::encoding::split_hi_lo;
use protmem_spec::{Instruction, MachineConfig, Program, Register, SpecError};
use std::collections::HashMap;

/// Label name to absolute address
pub type SymbolTable = HashMap<String, u32>;

/// Label whose address becomes the entry point
pub const ENTRY_LABEL: &str = "_start";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Text,
    Data,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Section::Text => "text",
            Section::Data => "data",
        }
    }
}

/// Location counters of both sections
struct Cursor<'a> {
    config: &'a MachineConfig,
    section: Section,
    text: u32,
    data: u32,
}

impl<'a> Cursor<'a> {
    fn new(config: &'a MachineConfig) -> Self {
        Self {
            config,
            section: Section::Text,
            text: 0,
            data: 0,
        }
    }

    fn address(&self) -> u32 {
        match self.section {
            Section::Text => self.config.code_base + self.text,
            Section::Data => self.config.data_base + self.data,
        }
    }

    fn capacity(&self) -> u32 {
        match self.section {
            Section::Text => self.config.code_capacity(),
            Section::Data => self.config.data_capacity(),
        }
    }

    fn used(&self) -> u32 {
        match self.section {
            Section::Text => self.text,
            Section::Data => self.data,
        }
    }

    fn remaining(&self) -> u32 {
        self.capacity() - self.used()
    }

    fn advance(&mut self, bytes: u64, line: usize) -> Result<()> {
        let size = self.used() as u64 + bytes;
        if size > self.capacity() as u64 {
            return Err(AssemblerError::SectionOverflow {
                line,
                section: self.section.name(),
                size,
                capacity: self.capacity(),
            });
        }
        match self.section {
            Section::Text => self.text = size as u32,
            Section::Data => self.data = size as u32,
        }
        Ok(())
    }
}

/// Assemble source code into a program for the default machine
pub fn assemble(source: &str) -> Result<Program> {
    assemble_with(source, &MachineConfig::DEFAULT)
}

/// Assemble source code into a program laid out for `config`
pub fn assemble_with(source: &str, config: &MachineConfig) -> Result<Program> {
    let lines = source
        .lines()
        .enumerate()
        .map(|(i, text)| parse_line(text, i + 1))
        .collect::<Result<Vec<_>>>()?;

    let symbols = collect_symbols(&lines, config)?;
    let (code, data) = emit(&lines, &symbols, config)?;

    let entry_point = match symbols.get(ENTRY_LABEL) {
        Some(&address) => {
            let code_end = config.code_base as u64 + code.len() as u64 * 4;
            if (address as u64) < config.code_base as u64 || address as u64 >= code_end {
                let line = lines
                    .iter()
                    .find(|l| l.labels.iter().any(|name| name == ENTRY_LABEL))
                    .map_or(0, |l| l.number);
                return Err(AssemblerError::WrongSection {
                    line,
                    what: format!("{ENTRY_LABEL} label"),
                    section: Section::Data.name(),
                });
            }
            address
        }
        None => config.code_base,
    };

    Ok(Program::with_sections(config, entry_point, code, data))
}

/// Pass 1: section layout and label addresses
fn collect_symbols(lines: &[Line], config: &MachineConfig) -> Result<SymbolTable> {
    let mut symbols = SymbolTable::new();
    let mut cursor = Cursor::new(config);

    for line in lines {
        // A label on a section switch line binds in the new section
        if let Some(Statement::Directive { name, .. }) = &line.statement {
            if let Some(section) = section_switch(name) {
                cursor.section = section;
            }
        }

        for label in &line.labels {
            if symbols.insert(label.clone(), cursor.address()).is_some() {
                return Err(AssemblerError::DuplicateLabel {
                    line: line.number,
                    label: label.clone(),
                });
            }
        }

        match &line.statement {
            None => {}
            Some(Statement::Instruction { mnemonic, .. }) => {
                if cursor.section != Section::Text {
                    return Err(wrong_section(line.number, mnemonic, cursor.section));
                }
                let count = expansion_len(mnemonic).ok_or_else(|| AssemblerError::UnknownInstruction {
                    line: line.number,
                    mnemonic: mnemonic.clone(),
                })?;
                cursor.advance(count as u64 * 4, line.number)?;
            }
            Some(Statement::Directive { name, args }) => {
                if section_switch(name).is_some() || is_ignored(name) {
                    continue;
                }
                // Values are irrelevant here; only sizes are
                let bytes = directive_bytes(name, args, line.number, &cursor, |_| Some(0))?;
                cursor.advance(bytes.len() as u64, line.number)?;
            }
        }
    }

    Ok(symbols)
}

/// Pass 2: lower and encode
fn emit(lines: &[Line], symbols: &SymbolTable, config: &MachineConfig) -> Result<(Vec<u32>, Vec<u8>)> {
    let mut code = Vec::new();
    let mut data = Vec::new();
    let mut cursor = Cursor::new(config);

    for line in lines {
        match &line.statement {
            None => {}
            Some(Statement::Instruction { mnemonic, operands }) => {
                let pc = cursor.address();
                let lowered = lower(mnemonic, operands, pc, line.number, symbols)?;
                cursor.advance(lowered.len() as u64 * 4, line.number)?;
                code.extend(lowered.iter().map(encode));
            }
            Some(Statement::Directive { name, args }) => {
                if let Some(section) = section_switch(name) {
                    cursor.section = section;
                    continue;
                }
                if is_ignored(name) {
                    continue;
                }
                let bytes = directive_bytes(name, args, line.number, &cursor, |s| symbols.get(s).copied())?;
                cursor.advance(bytes.len() as u64, line.number)?;
                match cursor.section {
                    Section::Data => data.extend_from_slice(&bytes),
                    Section::Text => code.extend(
                        bytes
                            .chunks_exact(4)
                            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
                    ),
                }
            }
        }
    }

    Ok((code, data))
}

fn section_switch(name: &str) -> Option<Section> {
    match name {
        "text" => Some(Section::Text),
        "data" => Some(Section::Data),
        _ => None,
    }
}

fn is_ignored(name: &str) -> bool {
    matches!(name, "globl" | "global")
}

fn wrong_section(line: usize, what: &str, section: Section) -> AssemblerError {
    AssemblerError::WrongSection {
        line,
        what: what.to_string(),
        section: section.name(),
    }
}

/// Bytes emitted by a data directive at the cursor
fn directive_bytes(
    name: &str,
    args: &[Operand],
    line: usize,
    cursor: &Cursor<'_>,
    resolve: impl Fn(&str) -> Option<u32>,
) -> Result<Vec<u8>> {
    let invalid = || AssemblerError::InvalidDirective {
        line,
        directive: name.to_string(),
    };

    if !matches!(name, "byte" | "word" | "zero" | "space" | "ascii" | "asciz" | "string" | "align") {
        return Err(invalid());
    }
    // Only .word is allowed in .text, where it emits raw instruction words
    if cursor.section == Section::Text && name != "word" {
        return Err(wrong_section(line, &format!(".{name}"), Section::Text));
    }

    let mut bytes = Vec::new();
    match name {
        "byte" => {
            for arg in args {
                match *arg {
                    Operand::Immediate(v) if (-128..=255).contains(&v) => bytes.push(v as u8),
                    Operand::Immediate(value) => {
                        return Err(AssemblerError::InvalidImmediate { line, value, bits: 8 })
                    }
                    _ => return Err(invalid()),
                }
            }
        }
        "word" => {
            for arg in args {
                let value = match arg {
                    Operand::Immediate(v) if (i32::MIN as i64..=u32::MAX as i64).contains(v) => *v as u32,
                    Operand::Immediate(value) => {
                        return Err(AssemblerError::InvalidImmediate {
                            line,
                            value: *value,
                            bits: 32,
                        })
                    }
                    Operand::Symbol(label) => resolve(label).ok_or_else(|| AssemblerError::UndefinedLabel {
                        line,
                        label: label.clone(),
                    })?,
                    _ => return Err(invalid()),
                };
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        "zero" | "space" => match args {
            [Operand::Immediate(n)] if *n >= 0 => {
                if *n > cursor.remaining() as i64 {
                    return Err(AssemblerError::SectionOverflow {
                        line,
                        section: cursor.section.name(),
                        size: cursor.used() as u64 + *n as u64,
                        capacity: cursor.capacity(),
                    });
                }
                bytes.resize(*n as usize, 0);
            }
            _ => return Err(invalid()),
        },
        "ascii" | "asciz" | "string" => {
            for arg in args {
                let Operand::Str(s) = arg else {
                    return Err(invalid());
                };
                bytes.extend_from_slice(s.as_bytes());
                if name != "ascii" {
                    bytes.push(0);
                }
            }
        }
        "align" => match args {
            [Operand::Immediate(n)] if (0..=12).contains(n) => {
                let align = 1u32 << *n;
                let pad = (align - cursor.address() % align) % align;
                bytes.resize(pad as usize, 0);
            }
            _ => return Err(invalid()),
        },
        _ => return Err(invalid()),
    }

    Ok(bytes)
}

/// Number of machine instructions a mnemonic expands to
fn expansion_len(mnemonic: &str) -> Option<usize> {
    match mnemonic {
        "li" | "la" => Some(2),
        "lui" | "add" | "sub" | "addi" | "lb" | "lbu" | "lw" | "sb" | "sw" | "beq" | "bne" | "blt"
        | "bge" | "jal" | "jalr" | "ecall" | "ebreak" | "setproti" | "setprotd" | "enterprot"
        | "exitprot" | "mv" | "j" | "ret" | "nop" | "call" | "beqz" | "bnez" => Some(1),
        _ => None,
    }
}

/// Operand accessor for one statement
struct Operands<'a> {
    mnemonic: &'a str,
    operands: &'a [Operand],
    line: usize,
    pc: u32,
    symbols: &'a SymbolTable,
}

impl Operands<'_> {
    fn shape_error(&self, expected: &'static str) -> AssemblerError {
        AssemblerError::InvalidOperands {
            line: self.line,
            mnemonic: self.mnemonic.to_string(),
            expected,
        }
    }

    fn expect(&self, count: usize, expected: &'static str) -> Result<()> {
        if self.operands.len() != count {
            return Err(self.shape_error(expected));
        }
        Ok(())
    }

    fn reg(&self, i: usize, expected: &'static str) -> Result<Register> {
        match self.operands.get(i) {
            Some(Operand::Register(reg)) => Ok(*reg),
            _ => Err(self.shape_error(expected)),
        }
    }

    fn imm(&self, i: usize, expected: &'static str) -> Result<i64> {
        match self.operands.get(i) {
            Some(Operand::Immediate(v)) => Ok(*v),
            _ => Err(self.shape_error(expected)),
        }
    }

    fn mem(&self, i: usize, expected: &'static str) -> Result<(i64, Register)> {
        match self.operands.get(i) {
            Some(Operand::Memory { offset, base }) => Ok((*offset, *base)),
            _ => Err(self.shape_error(expected)),
        }
    }

    fn symbol(&self, label: &str) -> Result<u32> {
        self.symbols
            .get(label)
            .copied()
            .ok_or_else(|| AssemblerError::UndefinedLabel {
                line: self.line,
                label: label.to_string(),
            })
    }

    /// PC-relative offset: a label, or a literal offset
    fn offset(&self, i: usize, expected: &'static str) -> Result<i64> {
        let offset = match self.operands.get(i) {
            Some(Operand::Symbol(label)) => self.symbol(label)? as i64 - self.pc as i64,
            Some(Operand::Immediate(v)) => *v,
            _ => return Err(self.shape_error(expected)),
        };
        if offset % 2 != 0 {
            return Err(AssemblerError::MisalignedTarget {
                line: self.line,
                offset,
            });
        }
        Ok(offset)
    }

    /// 32-bit constant: an immediate for `li`, a label for `la`
    fn constant(&self, i: usize, expected: &'static str) -> Result<u32> {
        match self.operands.get(i) {
            Some(Operand::Immediate(v)) if (i32::MIN as i64..=u32::MAX as i64).contains(v) => Ok(*v as u32),
            Some(Operand::Immediate(value)) => Err(AssemblerError::InvalidImmediate {
                line: self.line,
                value: *value,
                bits: 32,
            }),
            Some(Operand::Symbol(label)) if self.mnemonic == "la" => self.symbol(label),
            _ => Err(self.shape_error(expected)),
        }
    }

    fn narrow(&self, value: i64) -> Result<i32> {
        i32::try_from(value).map_err(|_| AssemblerError::InvalidImmediate {
            line: self.line,
            value,
            bits: 32,
        })
    }
}

/// Lower one statement at `pc` to machine instructions
fn lower(
    mnemonic: &str,
    operands: &[Operand],
    pc: u32,
    line: usize,
    symbols: &SymbolTable,
) -> Result<Vec<Instruction>> {
    let ops = Operands {
        mnemonic,
        operands,
        line,
        pc,
        symbols,
    };

    const RRR: &str = "rd, rs1, rs2";
    const RRI: &str = "rd, rs1, imm";
    const LOAD: &str = "rd, offset(rs1)";
    const STORE: &str = "rs2, offset(rs1)";
    const BRANCH: &str = "rs1, rs2, target";

    let instrs = match mnemonic {
        "lui" => {
            ops.expect(2, "rd, imm")?;
            let imm = ops.imm(1, "rd, imm")?;
            let imm = u32::try_from(imm).map_err(|_| AssemblerError::InvalidImmediate {
                line,
                value: imm,
                bits: 20,
            })?;
            vec![Instruction::Lui { rd: ops.reg(0, "rd, imm")?, imm }]
        }
        "add" | "sub" => {
            ops.expect(3, RRR)?;
            let (rd, rs1, rs2) = (ops.reg(0, RRR)?, ops.reg(1, RRR)?, ops.reg(2, RRR)?);
            vec![if mnemonic == "add" {
                Instruction::Add { rd, rs1, rs2 }
            } else {
                Instruction::Sub { rd, rs1, rs2 }
            }]
        }
        "addi" => {
            ops.expect(3, RRI)?;
            let imm = ops.narrow(ops.imm(2, RRI)?)?;
            vec![Instruction::Addi { rd: ops.reg(0, RRI)?, rs1: ops.reg(1, RRI)?, imm }]
        }
        "lb" | "lbu" | "lw" => {
            ops.expect(2, LOAD)?;
            let rd = ops.reg(0, LOAD)?;
            let (offset, rs1) = ops.mem(1, LOAD)?;
            let imm = ops.narrow(offset)?;
            vec![match mnemonic {
                "lb" => Instruction::Lb { rd, rs1, imm },
                "lbu" => Instruction::Lbu { rd, rs1, imm },
                _ => Instruction::Lw { rd, rs1, imm },
            }]
        }
        "sb" | "sw" => {
            ops.expect(2, STORE)?;
            let rs2 = ops.reg(0, STORE)?;
            let (offset, rs1) = ops.mem(1, STORE)?;
            let imm = ops.narrow(offset)?;
            vec![if mnemonic == "sb" {
                Instruction::Sb { rs1, rs2, imm }
            } else {
                Instruction::Sw { rs1, rs2, imm }
            }]
        }
        "beq" | "bne" | "blt" | "bge" => {
            ops.expect(3, BRANCH)?;
            let (rs1, rs2) = (ops.reg(0, BRANCH)?, ops.reg(1, BRANCH)?);
            let offset = ops.narrow(ops.offset(2, BRANCH)?)?;
            vec![match mnemonic {
                "beq" => Instruction::Beq { rs1, rs2, offset },
                "bne" => Instruction::Bne { rs1, rs2, offset },
                "blt" => Instruction::Blt { rs1, rs2, offset },
                _ => Instruction::Bge { rs1, rs2, offset },
            }]
        }
        "beqz" | "bnez" => {
            ops.expect(2, "rs1, target")?;
            let rs1 = ops.reg(0, "rs1, target")?;
            let offset = ops.narrow(ops.offset(1, "rs1, target")?)?;
            let rs2 = Register::ZERO;
            vec![if mnemonic == "beqz" {
                Instruction::Beq { rs1, rs2, offset }
            } else {
                Instruction::Bne { rs1, rs2, offset }
            }]
        }
        "jal" => match operands.len() {
            1 => vec![Instruction::Jal {
                rd: Register::RA,
                offset: ops.narrow(ops.offset(0, "[rd,] target")?)?,
            }],
            2 => vec![Instruction::Jal {
                rd: ops.reg(0, "[rd,] target")?,
                offset: ops.narrow(ops.offset(1, "[rd,] target")?)?,
            }],
            _ => return Err(ops.shape_error("[rd,] target")),
        },
        "j" | "call" => {
            ops.expect(1, "target")?;
            let rd = if mnemonic == "j" { Register::ZERO } else { Register::RA };
            vec![Instruction::Jal { rd, offset: ops.narrow(ops.offset(0, "target")?)? }]
        }
        "jalr" => {
            const JALR: &str = "rs1 | rd, offset(rs1) | rd, rs1, imm";
            match operands {
                [Operand::Register(rs1)] => vec![Instruction::Jalr { rd: Register::RA, rs1: *rs1, imm: 0 }],
                [Operand::Register(rd), Operand::Memory { offset, base }] => vec![Instruction::Jalr {
                    rd: *rd,
                    rs1: *base,
                    imm: ops.narrow(*offset)?,
                }],
                [Operand::Register(rd), Operand::Register(rs1), Operand::Immediate(imm)] => {
                    vec![Instruction::Jalr { rd: *rd, rs1: *rs1, imm: ops.narrow(*imm)? }]
                }
                _ => return Err(ops.shape_error(JALR)),
            }
        }
        "ret" => {
            ops.expect(0, "no operands")?;
            vec![Instruction::Jalr { rd: Register::ZERO, rs1: Register::RA, imm: 0 }]
        }
        "ecall" | "ebreak" | "nop" => {
            ops.expect(0, "no operands")?;
            vec![match mnemonic {
                "ecall" => Instruction::Ecall,
                "ebreak" => Instruction::Ebreak,
                _ => Instruction::Addi { rd: Register::ZERO, rs1: Register::ZERO, imm: 0 },
            }]
        }
        "mv" => {
            ops.expect(2, "rd, rs")?;
            vec![Instruction::Addi { rd: ops.reg(0, "rd, rs")?, rs1: ops.reg(1, "rd, rs")?, imm: 0 }]
        }
        "li" | "la" => {
            let expected = if mnemonic == "li" { "rd, imm" } else { "rd, label" };
            ops.expect(2, expected)?;
            let rd = ops.reg(0, expected)?;
            let (hi, lo) = split_hi_lo(ops.constant(1, expected)?);
            vec![Instruction::Lui { rd, imm: hi }, Instruction::Addi { rd, rs1: rd, imm: lo }]
        }

        // ========== Xprotmem ==========
        "setproti" => {
            ops.expect(1, "rs1")?;
            vec![Instruction::Setproti { rs1: ops.reg(0, "rs1")? }]
        }
        "setprotd" => {
            ops.expect(2, "rs1, rs2")?;
            vec![Instruction::Setprotd { rs1: ops.reg(0, "rs1, rs2")?, rs2: ops.reg(1, "rs1, rs2")? }]
        }
        "enterprot" => {
            ops.expect(1, "rd")?;
            vec![Instruction::Enterprot { rd: ops.reg(0, "rd")? }]
        }
        "exitprot" => {
            ops.expect(1, "rs1")?;
            vec![Instruction::Exitprot { rs1: ops.reg(0, "rs1")? }]
        }

        _ => {
            return Err(AssemblerError::UnknownInstruction {
                line,
                mnemonic: mnemonic.to_string(),
            })
        }
    };

    for instr in &instrs {
        check_ranges(instr).map_err(|err| match err {
            SpecError::ImmediateOutOfRange { value, bits } => AssemblerError::InvalidImmediate { line, value, bits },
            other => AssemblerError::SyntaxError {
                line,
                column: 0,
                message: other.to_string(),
            },
        })?;
    }

    Ok(instrs)
}

/// Parse a single instruction with no labels in scope
pub fn parse_instruction(text: &str) -> Result<Instruction> {
    let line = parse_line(text, 1)?;
    let Some(Statement::Instruction { mnemonic, operands }) = line.statement else {
        return Err(AssemblerError::SyntaxError {
            line: 1,
            column: 1,
            message: "expected an instruction".to_string(),
        });
    };

    let mut lowered = lower(&mnemonic, &operands, 0, 1, &SymbolTable::new())?;
    if lowered.len() != 1 {
        return Err(AssemblerError::SyntaxError {
            line: 1,
            column: 1,
            message: format!("{mnemonic} expands to {} instructions", lowered.len()),
        });
    }
    Ok(lowered.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test
            ecall
            ebreak
        "#;

        let program = assemble(source).unwrap();
        assert_eq!(program.code, vec![0x0000_0073, 0x0010_0073]);
        assert_eq!(program.header.entry_point, MachineConfig::DEFAULT.code_base);
    }

    #[test]
    fn test_entry_is_start_label() {
        let program = assemble("nop\n_start:\n  ebreak\n").unwrap();
        assert_eq!(program.header.entry_point, MachineConfig::DEFAULT.code_base + 4);
    }

    #[test]
    fn test_li_always_two_instructions() {
        let program = assemble("li a0, 5\nli a1, 0x12345678\nli a2, -1").unwrap();
        assert_eq!(program.code.len(), 6);
        assert_eq!(
            protmem_spec::encoding::extract_imm_u(program.code[2]),
            0x12345
        );
    }

    #[test]
    fn test_data_section_and_la() {
        let source = "
            .data
            secret: .byte 17, 96, 101, 27
            msg:    .ascii \"ok\"
            .text
            la a0, msg
        ";
        let program = assemble(source).unwrap();
        assert_eq!(program.data, vec![17, 96, 101, 27, b'o', b'k']);
        assert_eq!(program.code.len(), 2);

        let base = MachineConfig::DEFAULT.data_base + 4;
        let (hi, lo) = split_hi_lo(base);
        assert_eq!(program.code[0], encode(&Instruction::Lui { rd: Register::A0, imm: hi }));
        assert_eq!(
            program.code[1],
            encode(&Instruction::Addi { rd: Register::A0, rs1: Register::A0, imm: lo })
        );
    }

    #[test]
    fn test_forward_and_backward_branches() {
        let source = "
            loop:
                beqz t0, done
                addi t0, t0, -1
                j loop
            done:
                ebreak
        ";
        let program = assemble(source).unwrap();
        let decoded = protmem_spec::encoding::extract_imm_b(program.code[0]);
        assert_eq!(decoded, 12);
        let back = protmem_spec::encoding::extract_imm_j(program.code[2]);
        assert_eq!(back, -8);
    }

    #[test]
    fn test_word_directive_with_label() {
        let source = "
            .data
            value: .word 0xCAFEBABE
            ptr:   .word value
        ";
        let program = assemble(source).unwrap();
        assert_eq!(&program.data[0..4], &0xCAFE_BABEu32.to_le_bytes());
        assert_eq!(&program.data[4..8], &MachineConfig::DEFAULT.data_base.to_le_bytes());
    }

    #[test]
    fn test_align_and_zero() {
        let source = ".data\n.byte 1\n.align 2\nafter: .zero 3\n.text\nla a0, after";
        let program = assemble(source).unwrap();
        assert_eq!(program.data, vec![1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = assemble("nop\nfrob a0").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UnknownInstruction { line: 2, mnemonic: "frob".to_string() }
        );

        let err = assemble("nop\n\nj nowhere").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UndefinedLabel { line: 3, label: "nowhere".to_string() }
        );

        let err = assemble("a:\nnop\na:\n").unwrap_err();
        assert_eq!(err, AssemblerError::DuplicateLabel { line: 3, label: "a".to_string() });

        let err = assemble("addi a0, a0, 4096").unwrap_err();
        assert_eq!(err, AssemblerError::InvalidImmediate { line: 1, value: 4096, bits: 12 });

        let err = assemble(".data\nnop").unwrap_err();
        assert!(matches!(err, AssemblerError::WrongSection { line: 2, .. }));

        let err = assemble("add a0, a1").unwrap_err();
        assert!(matches!(err, AssemblerError::InvalidOperands { line: 1, .. }));

        let err = assemble("beq a0, a1, 3").unwrap_err();
        assert_eq!(err, AssemblerError::MisalignedTarget { line: 1, offset: 3 });
    }

    #[test]
    fn test_start_in_data_rejected() {
        let err = assemble(".data\n_start: .byte 0\n.text\nebreak").unwrap_err();
        assert!(matches!(err, AssemblerError::WrongSection { line: 2, .. }));
    }

    #[test]
    fn test_parse_instruction() {
        assert_eq!(
            parse_instruction("enterprot a5").unwrap(),
            Instruction::Enterprot { rd: Register::A5 }
        );
        assert_eq!(
            parse_instruction("ret").unwrap(),
            Instruction::Jalr { rd: Register::ZERO, rs1: Register::RA, imm: 0 }
        );
        assert!(parse_instruction("li a0, 1").is_err());
        assert!(parse_instruction(".data").is_err());
    }
}
