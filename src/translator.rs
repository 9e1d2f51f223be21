use miette::Result;

use crate::{
    command::{ArithOp, Segment, VmCommand},
    error,
    lexer::lines,
};

/// RAM address of `temp 0`.
const TEMP_BASE: u16 = 5;

/// Translates the commands of one VM unit into Hack assembly. Each command becomes a
/// self-contained sequence that leaves SP pointing one past the new top of stack.
pub struct VmTranslator<'a> {
    /// Reference to the source file
    src: &'a str,
    /// Qualifies `static` variables so units do not share them
    unit: &'a str,
    /// Comparison label counter, owned by the session so labels stay unique across units
    labels: &'a mut u32,
    annotate: bool,
    out: String,
}

impl<'a> VmTranslator<'a> {
    pub fn new(src: &'a str, unit: &'a str, labels: &'a mut u32, annotate: bool) -> Self {
        VmTranslator {
            src,
            unit,
            labels,
            annotate,
            out: String::new(),
        }
    }

    /// Translate every command, failing on the first malformed line.
    pub fn translate(mut self) -> Result<String> {
        let mut commands = 0usize;
        for line in lines(self.src) {
            let command = VmCommand::parse(&line, self.src)?;
            self.command(command)?;
            commands += 1;
        }
        log::debug!("translated {commands} command(s) from unit `{}`", self.unit);
        Ok(self.out)
    }

    /// Translates a single command, rejecting segment indices the target cannot address.
    pub fn command(&mut self, command: VmCommand) -> Result<()> {
        let command = command.validate()?;
        if self.annotate {
            self.emit(&format!("// {command}"));
        }
        match command {
            VmCommand::Push(segment, index) => self.push(segment, index),
            VmCommand::Pop(segment, index) => self.pop(segment, index)?,
            VmCommand::Arithmetic(op) => self.arithmetic(op),
        }
        Ok(())
    }

    fn emit(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn emit_all(&mut self, lines: &[&str]) {
        for line in lines {
            self.emit(line);
        }
    }

    fn static_symbol(&self, index: u16) -> String {
        format!("@{}.{}", self.unit, index)
    }

    fn pointer_register(index: u16) -> &'static str {
        // Index is range checked by `VmCommand::validate`
        if index == 0 {
            "@THIS"
        } else {
            "@THAT"
        }
    }

    fn push(&mut self, segment: Segment, index: u16) {
        // Load the value into D
        match segment {
            Segment::Constant => {
                self.emit(&format!("@{index}"));
                self.emit("D=A");
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                let base = segment.base_register().unwrap_or_default();
                self.emit(&format!("@{base}"));
                self.emit("D=M");
                self.emit(&format!("@{index}"));
                self.emit_all(&["A=D+A", "D=M"]);
            }
            Segment::Static => {
                let sym = self.static_symbol(index);
                self.emit(&sym);
                self.emit("D=M");
            }
            Segment::Temp => {
                self.emit(&format!("@{}", TEMP_BASE + index));
                self.emit("D=M");
            }
            Segment::Pointer => {
                self.emit(Self::pointer_register(index));
                self.emit("D=M");
            }
        }
        // *SP = D; SP++
        self.emit_all(&["@SP", "AM=M+1", "A=A-1", "M=D"]);
    }

    fn pop(&mut self, segment: Segment, index: u16) -> Result<()> {
        match segment {
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                // Target address goes through R13 since popping needs both A and D
                let base = segment.base_register().unwrap_or_default();
                self.emit(&format!("@{base}"));
                self.emit("D=M");
                self.emit(&format!("@{index}"));
                self.emit_all(&["D=D+A", "@R13", "M=D"]);
                self.emit_all(&["@SP", "AM=M-1", "D=M", "@R13", "A=M", "M=D"]);
            }
            Segment::Static | Segment::Temp | Segment::Pointer => {
                self.emit_all(&["@SP", "AM=M-1", "D=M"]);
                let target = match segment {
                    Segment::Static => self.static_symbol(index),
                    Segment::Temp => format!("@{}", TEMP_BASE + index),
                    _ => Self::pointer_register(index).to_string(),
                };
                self.emit(&target);
                self.emit("M=D");
            }
            Segment::Constant => {
                return Err(error::vm_invalid_pop_constant(VmCommand::Pop(segment, index)));
            }
        }
        Ok(())
    }

    fn arithmetic(&mut self, op: ArithOp) {
        match op {
            ArithOp::Add => self.binary("M=D+M"),
            ArithOp::Sub => self.binary("M=M-D"),
            ArithOp::And => self.binary("M=D&M"),
            ArithOp::Or => self.binary("M=D|M"),
            ArithOp::Neg => self.unary("M=-M"),
            ArithOp::Not => self.unary("M=!M"),
            ArithOp::Eq => self.compare("EQ", "JEQ"),
            ArithOp::Gt => self.compare("GT", "JGT"),
            ArithOp::Lt => self.compare("LT", "JLT"),
        }
    }

    /// Pop y into D, leave A at x so `op` can combine them in place.
    fn binary(&mut self, op: &str) {
        self.emit_all(&["@SP", "AM=M-1", "D=M", "A=A-1", op]);
    }

    fn unary(&mut self, op: &str) {
        self.emit_all(&["@SP", "A=M-1", op]);
    }

    /// Computes x - y and branches on its sign. True is -1, false is 0.
    fn compare(&mut self, name: &str, jump: &str) {
        let n = *self.labels;
        *self.labels += 1;
        let on_true = format!("${name}.TRUE.{n}");
        let end = format!("${name}.END.{n}");

        self.emit_all(&["@SP", "AM=M-1", "D=M", "A=A-1", "D=M-D"]);
        self.emit(&format!("@{on_true}"));
        self.emit(&format!("D;{jump}"));
        self.emit_all(&["@SP", "A=M-1", "M=0"]);
        self.emit(&format!("@{end}"));
        self.emit("0;JMP");
        self.emit(&format!("({on_true})"));
        self.emit_all(&["@SP", "A=M-1", "M=-1"]);
        self.emit(&format!("({end})"));
    }
}
