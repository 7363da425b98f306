//! This module provides parsing utilities for MIPS assembly.
//!
//! Labels may be used as branch and jump targets. Numeric branch targets are
//! word offsets from the next instruction, numeric jump targets are word
//! addresses, exactly as they are encoded.
use std::collections::BTreeMap;
use std::fmt;

use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::isa::{func_code, op_code, reg_number, Instr};

#[derive(Parser)]
#[grammar = "src/asm.pest"] // relative to the crate root
pub struct MipsAsmParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    Syntax { line: usize, message: String },
    UnknownRegister { line: usize, name: String },
    UndefinedLabel { line: usize, label: String },
    DuplicateLabel { line: usize, label: String },
    /// Immediate, shift amount or target that does not fit its field.
    OutOfRange { line: usize, value: i64 },
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmError::Syntax { line, message } => write!(f, "line {line}: {message}"),
            AsmError::UnknownRegister { line, name } => {
                write!(f, "line {line}: register name `{name}` is not valid")
            }
            AsmError::UndefinedLabel { line, label } => {
                write!(f, "line {line}: label `{label}` is not defined")
            }
            AsmError::DuplicateLabel { line, label } => {
                write!(f, "line {line}: label `{label}` is defined twice")
            }
            AsmError::OutOfRange { line, value } => {
                write!(f, "line {line}: value {value} does not fit in its field")
            }
        }
    }
}

impl std::error::Error for AsmError {}

pub type SymbolMap = BTreeMap<String, u32>;

fn line_of(pair: &Pair<'_, Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn parse_num(s: &str) -> Option<i64> {
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    Some(if neg { -value } else { value })
}

fn mnemonic(pair: Option<Pair<'_, Rule>>) -> String {
    pair.map(|p| p.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Second pass state: label table and the address of the current line.
struct Resolver<'a> {
    symbols: &'a SymbolMap,
    addr: u32,
    line: usize,
}

impl Resolver<'_> {
    fn range(&self, value: i64) -> AsmError {
        AsmError::OutOfRange {
            line: self.line,
            value,
        }
    }

    fn reg(&self, pair: Option<Pair<'_, Rule>>) -> Result<u8, AsmError> {
        let name = pair.map(|p| p.as_str()).unwrap_or_default();
        reg_number(name).ok_or_else(|| AsmError::UnknownRegister {
            line: self.line,
            name: name.to_string(),
        })
    }

    fn num(&self, pair: Option<Pair<'_, Rule>>) -> Result<i64, AsmError> {
        let s = pair.map(|p| p.as_str()).unwrap_or_default();
        parse_num(s).ok_or_else(|| AsmError::Syntax {
            line: self.line,
            message: format!("invalid number `{s}`"),
        })
    }

    /// 16-bit immediate. Hex literals up to 0xffff wrap into the signed range.
    fn imm(&self, pair: Option<Pair<'_, Rule>>) -> Result<i16, AsmError> {
        let is_hex = pair.as_ref().is_some_and(|p| p.as_str().contains(['x', 'X']));
        let value = self.num(pair)?;
        if let Ok(v) = i16::try_from(value) {
            return Ok(v);
        }
        if is_hex && (0..=0xffff).contains(&value) {
            return Ok(value as u16 as i16);
        }
        Err(self.range(value))
    }

    fn label(&self, pair: &Pair<'_, Rule>) -> Result<u32, AsmError> {
        self.symbols
            .get(pair.as_str())
            .copied()
            .ok_or_else(|| AsmError::UndefinedLabel {
                line: self.line,
                label: pair.as_str().to_string(),
            })
    }

    fn branch_offset(&self, pair: Option<Pair<'_, Rule>>) -> Result<i16, AsmError> {
        match pair {
            Some(p) if p.as_rule() == Rule::label => {
                let offset = (self.label(&p)? as i64 - (self.addr as i64 + 4)) / 4;
                i16::try_from(offset).map_err(|_| self.range(offset))
            }
            other => self.imm(other),
        }
    }

    fn jump_target(&self, pair: Option<Pair<'_, Rule>>) -> Result<u32, AsmError> {
        let value = match pair {
            Some(p) if p.as_rule() == Rule::label => (self.label(&p)? >> 2) as i64,
            other => self.num(other)?,
        };
        if !(0..1 << 26).contains(&value) {
            return Err(self.range(value));
        }
        Ok(value as u32)
    }

    fn instr(&self, pair: Pair<'_, Rule>) -> Result<Instr, AsmError> {
        let rule = pair.as_rule();
        let mut it = pair.into_inner();
        Ok(match rule {
            Rule::i_nop => Instr::Nop,
            Rule::i_arith => {
                let func = match mnemonic(it.next()).as_str() {
                    "add" => func_code::ADD,
                    "sub" => func_code::SUB,
                    "and" => func_code::AND,
                    "or" => func_code::OR,
                    _ => func_code::XOR,
                };
                let rd = self.reg(it.next())?;
                let rs = self.reg(it.next())?;
                let rt = self.reg(it.next())?;
                Instr::Arith { func, rd, rs, rt }
            }
            Rule::i_shift => {
                let func = match mnemonic(it.next()).as_str() {
                    "sll" => func_code::SLL,
                    "srl" => func_code::SRL,
                    _ => func_code::SRA,
                };
                let rd = self.reg(it.next())?;
                let rt = self.reg(it.next())?;
                let sa = self.num(it.next())?;
                if !(0..32).contains(&sa) {
                    return Err(self.range(sa));
                }
                Instr::Shift {
                    func,
                    rd,
                    rt,
                    sa: sa as u8,
                }
            }
            Rule::i_jr => Instr::Jr {
                rs: self.reg(it.next())?,
            },
            Rule::i_addi => {
                let rt = self.reg(it.next())?;
                let rs = self.reg(it.next())?;
                let imm = self.imm(it.next())?;
                Instr::Addi { rt, rs, imm }
            }
            Rule::i_mem => {
                let op = match mnemonic(it.next()).as_str() {
                    "lw" => op_code::LW,
                    _ => op_code::SW,
                };
                let rt = self.reg(it.next())?;
                let mut mem = it.next().map(|p| p.into_inner()).into_iter().flatten();
                let first = mem.next();
                let (offset, base) = match first {
                    Some(p) if p.as_rule() == Rule::num => (self.imm(Some(p))?, mem.next()),
                    reg => (0, reg),
                };
                Instr::Mem {
                    op,
                    rt,
                    base: self.reg(base)?,
                    offset,
                }
            }
            Rule::i_branch2 => {
                let op = match mnemonic(it.next()).as_str() {
                    "beq" => op_code::BEQ,
                    _ => op_code::BNE,
                };
                let rs = self.reg(it.next())?;
                let rt = self.reg(it.next())?;
                let offset = self.branch_offset(it.next())?;
                Instr::Branch { op, rs, rt, offset }
            }
            Rule::i_branch1 => {
                let op = match mnemonic(it.next()).as_str() {
                    "bgez" => op_code::BGEZ,
                    _ => op_code::BGTZ,
                };
                let rs = self.reg(it.next())?;
                let offset = self.branch_offset(it.next())?;
                Instr::Branch {
                    op,
                    rs,
                    rt: 0,
                    offset,
                }
            }
            Rule::i_jump => {
                let op = match mnemonic(it.next()).as_str() {
                    "jal" => op_code::JAL,
                    _ => op_code::J,
                };
                Instr::Jump {
                    op,
                    target: self.jump_target(it.next())?,
                }
            }
            _ => unreachable!("not an instruction rule: {rule:?}"),
        })
    }
}

/// Transform assembly text into instruction words, one per instruction,
/// starting at address 0.
pub fn assemble(src: &str) -> Result<Vec<u32>, AsmError> {
    let main = MipsAsmParser::parse(Rule::main, src)
        .map_err(|err| {
            let line = match err.line_col {
                LineColLocation::Pos((line, _)) | LineColLocation::Span((line, _), _) => line,
            };
            AsmError::Syntax {
                line,
                message: err.variant.message().to_string(),
            }
        })?
        .next()
        .into_iter()
        .flat_map(|main| main.into_inner());

    // first pass: addresses of labels
    let mut symbols = SymbolMap::new();
    let mut instrs = Vec::new();
    for line in main.filter(|l| l.as_rule() == Rule::line) {
        let addr = instrs.len() as u32 * 4;
        for pair in line.into_inner() {
            if pair.as_rule() == Rule::label_def {
                let name = pair.as_str().trim_end_matches(':').trim().to_string();
                if symbols.insert(name.clone(), addr).is_some() {
                    return Err(AsmError::DuplicateLabel {
                        line: line_of(&pair),
                        label: name,
                    });
                }
            } else {
                instrs.push(pair);
            }
        }
    }
    tracing::debug!(?symbols, "labels resolved");

    let mut words = Vec::with_capacity(instrs.len());
    for (i, pair) in instrs.into_iter().enumerate() {
        let resolver = Resolver {
            symbols: &symbols,
            addr: i as u32 * 4,
            line: line_of(&pair),
        };
        words.push(resolver.instr(pair)?.encode());
    }
    Ok(words)
}
