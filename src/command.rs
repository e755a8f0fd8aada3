//! The command classifier: one raw VM source line in, one typed
//! [`Command`] out.
//!
//! Classification is the only place malformed input is rejected; every
//! command that survives it translates infallibly. A line is at most one
//! command; `//` starts a comment that runs to the end of the line.

use std::fmt;

use crate::error::{Result, TranslateError};

/// The nine arithmetic/logical operator words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Op {
    /// The VM source spelling.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Neg => "neg",
            Op::Eq => "eq",
            Op::Gt => "gt",
            Op::Lt => "lt",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
        }
    }
}

/// The eight virtual memory segments a push/pop can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl Segment {
    /// Base-pointer register for the four indirect segments, `None` for
    /// everything addressed some other way.
    pub fn base_symbol(self) -> Option<&'static str> {
        match self {
            Segment::Local => Some("LCL"),
            Segment::Argument => Some("ARG"),
            Segment::This => Some("THIS"),
            Segment::That => Some("THAT"),
            _ => None,
        }
    }

    /// The VM source spelling.
    pub fn name(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
            Segment::Static => "static",
        }
    }
}

/// A classified VM command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Arithmetic(Op),
    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: u16 },
    Call { name: String, args: u16 },
    Return,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Arithmetic(op) => f.write_str(op.mnemonic()),
            CommandKind::Push { segment, index } => {
                write!(f, "push {} {}", segment.name(), index)
            }
            CommandKind::Pop { segment, index } => {
                write!(f, "pop {} {}", segment.name(), index)
            }
            CommandKind::Label(name) => write!(f, "label {name}"),
            CommandKind::Goto(name) => write!(f, "goto {name}"),
            CommandKind::IfGoto(name) => write!(f, "if-goto {name}"),
            CommandKind::Function { name, locals } => {
                write!(f, "function {name} {locals}")
            }
            CommandKind::Call { name, args } => write!(f, "call {name} {args}"),
            CommandKind::Return => f.write_str("return"),
        }
    }
}

/// A command plus the 1-based source line it came from. The line number
/// feeds call return-address labels, so it travels with the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub line: usize,
}

/// Classify one source line.
///
/// Returns `Ok(None)` for blank and comment-only lines. `unit` is the
/// compilation unit name, used only for error context here.
pub fn classify(line: &str, line_no: usize, unit: &str) -> Result<Option<Command>> {
    let text = line.split("//").next().unwrap_or("").trim();
    if text.is_empty() {
        return Ok(None);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let kind = match words[0] {
        "add" => CommandKind::Arithmetic(Op::Add),
        "sub" => CommandKind::Arithmetic(Op::Sub),
        "neg" => CommandKind::Arithmetic(Op::Neg),
        "eq" => CommandKind::Arithmetic(Op::Eq),
        "gt" => CommandKind::Arithmetic(Op::Gt),
        "lt" => CommandKind::Arithmetic(Op::Lt),
        "and" => CommandKind::Arithmetic(Op::And),
        "or" => CommandKind::Arithmetic(Op::Or),
        "not" => CommandKind::Arithmetic(Op::Not),
        "push" => mem_access(&words, false, line_no, unit)?,
        "pop" => mem_access(&words, true, line_no, unit)?,
        "label" => CommandKind::Label(target(&words, "label", line_no, unit)?),
        "goto" => CommandKind::Goto(target(&words, "goto", line_no, unit)?),
        "if-goto" => CommandKind::IfGoto(target(&words, "if-goto", line_no, unit)?),
        "function" => {
            let (name, locals) = name_and_count(&words, "function", line_no, unit)?;
            CommandKind::Function { name, locals }
        }
        "call" => {
            let (name, args) = name_and_count(&words, "call", line_no, unit)?;
            CommandKind::Call { name, args }
        }
        "return" => CommandKind::Return,
        other => {
            return Err(TranslateError::UnknownCommand {
                unit: unit.to_string(),
                line: line_no,
                word: other.to_string(),
            });
        }
    };

    Ok(Some(Command {
        kind,
        line: line_no,
    }))
}

/// Parse `push <segment> <index>` / `pop <segment> <index>`, rejecting
/// everything the generator must never see: pops into `constant`, and
/// pointer/temp indices outside their fixed windows.
fn mem_access(words: &[&str], is_pop: bool, line_no: usize, unit: &str) -> Result<CommandKind> {
    let command = if is_pop { "pop" } else { "push" };
    let segment = match operand(words, 1, command, line_no, unit)? {
        "constant" => Segment::Constant,
        "local" => Segment::Local,
        "argument" => Segment::Argument,
        "this" => Segment::This,
        "that" => Segment::That,
        "pointer" => Segment::Pointer,
        "temp" => Segment::Temp,
        "static" => Segment::Static,
        other => {
            return Err(TranslateError::UnknownSegment {
                unit: unit.to_string(),
                line: line_no,
                word: other.to_string(),
            });
        }
    };
    let index = number(operand(words, 2, command, line_no, unit)?, line_no, unit)?;

    if is_pop && segment == Segment::Constant {
        return Err(TranslateError::ConstantPop {
            unit: unit.to_string(),
            line: line_no,
        });
    }
    match segment {
        Segment::Pointer if index > 1 => Err(TranslateError::PointerIndex {
            unit: unit.to_string(),
            line: line_no,
            index,
        }),
        Segment::Temp if index > 7 => Err(TranslateError::TempIndex {
            unit: unit.to_string(),
            line: line_no,
            index,
        }),
        _ if is_pop => Ok(CommandKind::Pop { segment, index }),
        _ => Ok(CommandKind::Push { segment, index }),
    }
}

/// Parse the label operand of `label` / `goto` / `if-goto`.
fn target(words: &[&str], command: &'static str, line_no: usize, unit: &str) -> Result<String> {
    Ok(operand(words, 1, command, line_no, unit)?.to_string())
}

/// Parse `<name> <n>` as used by `function` and `call`.
fn name_and_count(
    words: &[&str],
    command: &'static str,
    line_no: usize,
    unit: &str,
) -> Result<(String, u16)> {
    let name = operand(words, 1, command, line_no, unit)?.to_string();
    let count = number(operand(words, 2, command, line_no, unit)?, line_no, unit)?;
    Ok((name, count))
}

fn operand<'a>(
    words: &[&'a str],
    i: usize,
    command: &'static str,
    line_no: usize,
    unit: &str,
) -> Result<&'a str> {
    words
        .get(i)
        .copied()
        .ok_or_else(|| TranslateError::MissingOperand {
            unit: unit.to_string(),
            line: line_no,
            command,
        })
}

fn number(word: &str, line_no: usize, unit: &str) -> Result<u16> {
    word.parse::<u16>().map_err(|_| TranslateError::BadNumber {
        unit: unit.to_string(),
        line: line_no,
        word: word.to_string(),
    })
}
