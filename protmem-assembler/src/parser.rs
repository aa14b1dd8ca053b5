//! Assembly parser
//!
//! Turns one source line into labels plus an optional statement. Operands
//! stay symbolic here; label resolution and range checks happen when the
//! assembler lowers a statement at a known address.

use crate::error::{AssemblerError, Result};
use crate::lexer::Token;
use logos::Logos;
use protmem_spec::Register;
use std::ops::Range;

/// Instruction or directive operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Immediate(i64),
    /// Bare identifier that is not a register name
    Symbol(String),
    /// `offset(base)`
    Memory { offset: i64, base: Register },
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Instruction { mnemonic: String, operands: Vec<Operand> },
    Directive { name: String, args: Vec<Operand> },
}

/// One parsed source line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    /// 1-based line number
    pub number: usize,
    pub labels: Vec<String>,
    pub statement: Option<Statement>,
}

type Spanned = (Token, Range<usize>);

fn syntax_error(line: usize, span: &Range<usize>, message: impl Into<String>) -> AssemblerError {
    AssemblerError::SyntaxError {
        line,
        column: span.start + 1,
        message: message.into(),
    }
}

fn tokenize(text: &str, line: usize) -> Result<Vec<Spanned>> {
    let mut lex = Token::lexer(text);
    let mut tokens = Vec::new();
    while let Some(token) = lex.next() {
        match token {
            Ok(token) => tokens.push((token, lex.span())),
            Err(()) => {
                return Err(syntax_error(
                    line,
                    &lex.span(),
                    format!("unexpected input '{}'", lex.slice()),
                ))
            }
        }
    }
    Ok(tokens)
}

/// Parse one source line
pub fn parse_line(text: &str, number: usize) -> Result<Line> {
    let tokens = tokenize(text, number)?;
    let mut line = Line {
        number,
        ..Line::default()
    };

    let mut rest = tokens.as_slice();
    while let [(Token::Identifier(name), _), (Token::Colon, _), tail @ ..] = rest {
        line.labels.push(name.clone());
        rest = tail;
    }

    let Some(((head, span), tail)) = rest.split_first() else {
        return Ok(line);
    };

    line.statement = Some(match head {
        Token::Identifier(mnemonic) => Statement::Instruction {
            mnemonic: mnemonic.to_ascii_lowercase(),
            operands: parse_operands(tail, number)?,
        },
        Token::Directive(name) => Statement::Directive {
            name: name.to_ascii_lowercase(),
            args: parse_operands(tail, number)?,
        },
        _ => return Err(syntax_error(number, span, "expected instruction, directive or label")),
    });

    Ok(line)
}

fn parse_operands(tokens: &[Spanned], line: usize) -> Result<Vec<Operand>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut operands = Vec::new();
    let groups = tokens.split(|(t, _)| *t == Token::Comma);
    let mut cursor = tokens[0].1.clone();

    for group in groups {
        if let Some((_, span)) = group.last() {
            cursor = span.clone();
        }
        if group.is_empty() {
            return Err(syntax_error(line, &cursor, "expected operand"));
        }
        operands.push(parse_operand(group, line)?);
    }

    Ok(operands)
}

fn parse_operand(group: &[Spanned], line: usize) -> Result<Operand> {
    match group {
        [(Token::Identifier(name), _)] => Ok(match Register::from_name(name) {
            Some(reg) => Operand::Register(reg),
            None => Operand::Symbol(name.clone()),
        }),
        [(Token::Number(n), _)] => Ok(Operand::Immediate(*n)),
        [(Token::Str(s), _)] => Ok(Operand::Str(s.clone())),
        [(Token::Number(offset), _), (Token::LParen, _), (Token::Identifier(base), span), (Token::RParen, _)] => {
            Ok(Operand::Memory {
                offset: *offset,
                base: register(base, line, span)?,
            })
        }
        [(Token::LParen, _), (Token::Identifier(base), span), (Token::RParen, _)] => Ok(Operand::Memory {
            offset: 0,
            base: register(base, line, span)?,
        }),
        [(_, span), ..] => Err(syntax_error(line, span, "malformed operand")),
        [] => Err(AssemblerError::SyntaxError {
            line,
            column: 0,
            message: "expected operand".to_string(),
        }),
    }
}

fn register(name: &str, line: usize, span: &Range<usize>) -> Result<Register> {
    Register::from_name(name)
        .ok_or_else(|| syntax_error(line, span, format!("invalid register '{name}'")))
}

/// Parse register name
pub fn parse_register(name: &str) -> Option<Register> {
    Register::from_name(name)
}
