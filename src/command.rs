use std::{fmt, str::FromStr};

use miette::Result;

use crate::{error, lexer::Line, symbol::MAX_ADDR};

/// Named region of the stack machine's abstract memory.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Static,
    /// RAM[5..=12]
    Temp,
    /// Aliases THIS (0) and THAT (1)
    Pointer,
}

impl Segment {
    /// Largest index the segment accepts.
    pub fn max_index(self) -> u16 {
        match self {
            Segment::Temp => 7,
            Segment::Pointer => 1,
            _ => MAX_ADDR,
        }
    }

    /// Base register holding the segment's address, for segments that have one.
    pub fn base_register(self) -> Option<&'static str> {
        match self {
            Segment::Local => Some("LCL"),
            Segment::Argument => Some("ARG"),
            Segment::This => Some("THIS"),
            Segment::That => Some("THAT"),
            _ => None,
        }
    }
}

impl FromStr for Segment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Segment::Constant),
            "local" => Ok(Segment::Local),
            "argument" => Ok(Segment::Argument),
            "this" => Ok(Segment::This),
            "that" => Ok(Segment::That),
            "static" => Ok(Segment::Static),
            "temp" => Ok(Segment::Temp),
            "pointer" => Ok(Segment::Pointer),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Static => "static",
            Segment::Temp => "temp",
            Segment::Pointer => "pointer",
        };
        f.write_str(s)
    }
}

/// Arithmetic, logical and relational stack operators.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArithOp {
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

impl ArithOp {
    /// Change in stack depth caused by the operator.
    pub fn depth_delta(self) -> i32 {
        match self {
            ArithOp::Neg | ArithOp::Not => 0,
            _ => -1,
        }
    }
}

impl FromStr for ArithOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ArithOp::Add),
            "sub" => Ok(ArithOp::Sub),
            "neg" => Ok(ArithOp::Neg),
            "eq" => Ok(ArithOp::Eq),
            "gt" => Ok(ArithOp::Gt),
            "lt" => Ok(ArithOp::Lt),
            "and" => Ok(ArithOp::And),
            "or" => Ok(ArithOp::Or),
            "not" => Ok(ArithOp::Not),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Neg => "neg",
            ArithOp::Eq => "eq",
            ArithOp::Gt => "gt",
            ArithOp::Lt => "lt",
            ArithOp::And => "and",
            ArithOp::Or => "or",
            ArithOp::Not => "not",
        };
        f.write_str(s)
    }
}

/// Single stack-machine command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VmCommand {
    Arithmetic(ArithOp),
    Push(Segment, u16),
    Pop(Segment, u16),
}

impl VmCommand {
    /// Parse one source line. `src` is only used for diagnostics.
    pub fn parse(line: &Line, src: &str) -> Result<VmCommand> {
        let keyword = &line.words[0];
        let operands = &line.words[1..];
        match keyword.text {
            "push" | "pop" => {
                if operands.len() != 2 {
                    return Err(error::vm_operand_count(
                        line.span(),
                        src,
                        line.number,
                        keyword.text,
                        2,
                        operands.len(),
                    ));
                }
                let (seg_word, idx_word) = (&operands[0], &operands[1]);
                let segment: Segment = seg_word.text.parse().map_err(|_| {
                    error::vm_unknown_segment(seg_word.span, src, line.number, seg_word.text)
                })?;
                // Digits only: `+1` and `-1` are rejected even though `u32` would accept `+1`
                if !idx_word.text.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(error::vm_bad_index(
                        idx_word.span,
                        src,
                        line.number,
                        idx_word.text,
                    ));
                }
                let max = segment.max_index();
                let index = match idx_word.text.parse::<u32>() {
                    Ok(index) if index <= max as u32 => index as u16,
                    Ok(index) => {
                        return Err(error::vm_index_range(
                            idx_word.span,
                            src,
                            line.number,
                            segment,
                            index,
                            max,
                        ))
                    }
                    Err(_) => {
                        return Err(error::vm_index_range(
                            idx_word.span,
                            src,
                            line.number,
                            segment,
                            u32::MAX,
                            max,
                        ))
                    }
                };
                if keyword.text == "push" {
                    Ok(VmCommand::Push(segment, index))
                } else if segment == Segment::Constant {
                    Err(error::vm_pop_constant(seg_word.span, src, line.number))
                } else {
                    Ok(VmCommand::Pop(segment, index))
                }
            }
            other => {
                let op: ArithOp = other.parse().map_err(|_| {
                    error::vm_unknown_command(keyword.span, src, line.number, other)
                })?;
                if !operands.is_empty() {
                    return Err(error::vm_operand_count(
                        line.span(),
                        src,
                        line.number,
                        other,
                        0,
                        operands.len(),
                    ));
                }
                Ok(VmCommand::Arithmetic(op))
            }
        }
    }

    /// Checks the segment rules `parse` enforces, for commands built in code.
    pub fn validate(self) -> Result<Self> {
        match self {
            VmCommand::Pop(Segment::Constant, _) => Err(error::vm_invalid_pop_constant(self)),
            VmCommand::Push(segment, index) | VmCommand::Pop(segment, index)
                if index > segment.max_index() =>
            {
                Err(error::vm_invalid_index(self, segment, segment.max_index()))
            }
            _ => Ok(self),
        }
    }

    /// Change in stack depth caused by the command.
    pub fn depth_delta(&self) -> i32 {
        match self {
            VmCommand::Arithmetic(op) => op.depth_delta(),
            VmCommand::Push(..) => 1,
            VmCommand::Pop(..) => -1,
        }
    }
}

impl fmt::Display for VmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmCommand::Arithmetic(op) => write!(f, "{op}"),
            VmCommand::Push(segment, index) => write!(f, "push {segment} {index}"),
            VmCommand::Pop(segment, index) => write!(f, "pop {segment} {index}"),
        }
    }
}
