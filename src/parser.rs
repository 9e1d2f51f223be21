use miette::Result;

use crate::{
    air::{Air, AirStmt, Instr, Operand, SymbolRef},
    error,
    lexer::{lines, Line},
    symbol::{is_symbol, Comp, Dest, Jump, SymbolTable, MAX_ADDR},
};

/// First assembler pass: turns source lines into AIR and binds every label definition to the
/// ROM address of the instruction that follows it.
pub struct AsmParser<'a> {
    /// Reference to the source file
    src: &'a str,
    symbols: &'a mut SymbolTable,
    /// Assembly intermediate representation
    air: Air,
    /// ROM address of the next instruction. Label lines do not advance it.
    pc: u32,
    labels: usize,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str, symbols: &'a mut SymbolTable) -> Self {
        AsmParser {
            src,
            symbols,
            air: Air::new(),
            pc: 0,
            labels: 0,
        }
    }

    /// Create AIR out of the source lines
    pub fn parse(mut self) -> Result<Air> {
        for line in lines(self.src) {
            let text = line.joined();
            if let Some(label) = text.strip_prefix('(') {
                self.parse_label(&line, label)?;
            } else if let Some(value) = text.strip_prefix('@') {
                let operand = self.parse_address(&line, value)?;
                self.add_instr(&line, Instr::Address(operand))?;
            } else {
                let instr = self.parse_compute(&line, &text)?;
                self.add_instr(&line, instr)?;
            }
        }
        log::debug!(
            "pass 1: {} instruction(s), {} label(s)",
            self.air.len(),
            self.labels
        );
        // Consume self to return AIR
        Ok(self.air)
    }

    fn add_instr(&mut self, line: &Line, instr: Instr) -> Result<()> {
        if self.pc > MAX_ADDR as u32 {
            return Err(error::asm_rom_overflow(line.span(), self.src, line.number));
        }
        self.air.add_stmt(AirStmt {
            instr,
            line: line.number,
            span: line.span(),
        });
        self.pc += 1;
        Ok(())
    }

    /// `label` is the line text after the opening parenthesis.
    fn parse_label(&mut self, line: &Line, label: &str) -> Result<()> {
        let span = line.span();
        let Some(name) = label.strip_suffix(')') else {
            return Err(error::asm_invalid_line(span, self.src, line.number));
        };
        if !is_symbol(name) {
            return Err(error::asm_invalid_symbol(span, self.src, line.number, name));
        }
        if self.symbols.is_predefined(name) {
            return Err(error::asm_predefined_label(span, self.src, line.number, name));
        }
        if self.pc > MAX_ADDR as u32 {
            return Err(error::asm_rom_overflow(span, self.src, line.number));
        }
        if let Err(addr) = self.symbols.bind(name, self.pc as u16) {
            return Err(error::asm_duplicate_label(
                span,
                self.src,
                line.number,
                name,
                addr,
            ));
        }
        log::trace!("bound label `{name}` to {}", self.pc);
        self.labels += 1;
        Ok(())
    }

    fn parse_address(&self, line: &Line, value: &str) -> Result<Operand> {
        let span = line.span();
        let digits = value.strip_prefix('-').unwrap_or(value);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return match value.parse::<i64>() {
                Ok(val) if (0..=MAX_ADDR as i64).contains(&val) => Ok(Operand::Lit(val as u16)),
                _ => Err(error::asm_addr_range(span, self.src, line.number, value)),
            };
        }
        if value.is_empty() {
            return Err(error::asm_invalid_line(span, self.src, line.number));
        }
        if !is_symbol(value) {
            return Err(error::asm_invalid_symbol(span, self.src, line.number, value));
        }
        Ok(Operand::Symbol(SymbolRef::unresolved(value)))
    }

    /// Split `[dest=]comp[;jump]` and look each field up in its table. An absent dest or jump
    /// is the null code, a present but unknown one is an error.
    fn parse_compute(&self, line: &Line, text: &str) -> Result<Instr> {
        let span = line.span();
        let (dest, rest) = match text.split_once('=') {
            Some((dest, rest)) => (Some(dest), rest),
            None => (None, text),
        };
        let (comp, jump) = match rest.split_once(';') {
            Some((comp, jump)) => (comp, Some(jump)),
            None => (rest, None),
        };
        let has_separator = dest.is_some() || jump.is_some();

        let comp = match comp.parse::<Comp>() {
            Ok(comp) => comp,
            Err(_) if !has_separator => {
                return Err(error::asm_invalid_line(span, self.src, line.number))
            }
            Err(_) if comp.is_empty() => {
                return Err(error::asm_missing_comp(span, self.src, line.number))
            }
            Err(_) => return Err(error::asm_unknown_comp(span, self.src, line.number, comp)),
        };
        let dest = match dest {
            None => Dest::Null,
            Some(dest) => dest
                .parse::<Dest>()
                .map_err(|_| error::asm_unknown_dest(span, self.src, line.number, dest))?,
        };
        let jump = match jump {
            None => Jump::Null,
            Some(jump) => jump
                .parse::<Jump>()
                .map_err(|_| error::asm_unknown_jump(span, self.src, line.number, jump))?,
        };
        Ok(Instr::Compute { dest, comp, jump })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<(Air, SymbolTable)> {
        let mut symbols = SymbolTable::new();
        let air = AsmParser::new(src, &mut symbols).parse()?;
        Ok((air, symbols))
    }

    fn code(src: &str) -> String {
        parse(src).unwrap_err().code().unwrap().to_string()
    }

    #[test]
    fn parse_address_forms() {
        let (air, _) = parse("@21\n@i\n@R1").unwrap();
        assert_eq!(air.get(0).instr, Instr::Address(Operand::Lit(21)));
        assert_eq!(
            air.get(1).instr,
            Instr::Address(Operand::Symbol(SymbolRef::unresolved("i")))
        );
        assert_eq!(
            air.get(2).instr,
            Instr::Address(Operand::Symbol(SymbolRef::unresolved("R1")))
        );
    }

    #[test]
    fn parse_compute_fields() {
        let (air, _) = parse("AM=M+1\n0;JMP\nD\nD = D - A ; JGT").unwrap();
        assert_eq!(
            air.get(0).instr,
            Instr::Compute { dest: Dest::AM, comp: Comp::MPlusOne, jump: Jump::Null }
        );
        assert_eq!(
            air.get(1).instr,
            Instr::Compute { dest: Dest::Null, comp: Comp::Zero, jump: Jump::Jmp }
        );
        assert_eq!(
            air.get(2).instr,
            Instr::Compute { dest: Dest::Null, comp: Comp::D, jump: Jump::Null }
        );
        assert_eq!(
            air.get(3).instr,
            Instr::Compute { dest: Dest::D, comp: Comp::DMinusA, jump: Jump::Jgt }
        );
    }

    #[test]
    fn labels_bind_to_next_instruction() {
        let src = r#"
        // comment lines do not count
        @END
        0;JMP
        (LOOP)

        (AGAIN)
        D=D-1
        (END)
        @END
        "#;
        let (air, symbols) = parse(src).unwrap();
        assert_eq!(air.len(), 4);
        assert_eq!(symbols.get("LOOP"), Some(2));
        assert_eq!(symbols.get("AGAIN"), Some(2));
        assert_eq!(symbols.get("END"), Some(3));
        // Pass 1 allocates no variables
        assert_eq!(symbols.next_variable(), 16);
    }

    #[test]
    fn records_source_lines() {
        let (air, _) = parse("\n\n@1\n// x\nD=A").unwrap();
        assert_eq!(air.get(0).line, 3);
        assert_eq!(air.get(1).line, 5);
    }

    #[test]
    fn structural_errors() {
        assert_eq!(code("hello"), "asm::structure");
        assert_eq!(code("@"), "asm::structure");
        assert_eq!(code("(LOOP"), "asm::structure");
        assert_eq!(code("(1LOOP)"), "asm::symbol");
        assert_eq!(code("@a-b"), "asm::symbol");
        assert_eq!(code("@1x"), "asm::symbol");
    }

    #[test]
    fn address_range_errors() {
        assert!(parse("@32767").is_ok());
        assert_eq!(code("@32768"), "asm::addr_range");
        assert_eq!(code("@-1"), "asm::addr_range");
        assert_eq!(code("@99999999999999999999999"), "asm::addr_range");
    }

    #[test]
    fn field_errors() {
        assert_eq!(code("D=D*A"), "asm::comp");
        assert_eq!(code("D=;JMP"), "asm::missing_comp");
        assert_eq!(code("X=D"), "asm::dest");
        assert_eq!(code("DM=D"), "asm::dest");
        assert_eq!(code("0;JUMP"), "asm::jump");
        assert_eq!(code("D;"), "asm::jump");
    }

    #[test]
    fn label_errors() {
        assert_eq!(code("(X)\n@1\n(X)"), "asm::duplicate_label");
        assert_eq!(code("(SCREEN)"), "asm::predefined_label");
    }

    #[test]
    fn unknown_comp_names_mnemonic_and_line() {
        let err = parse("@1\n\nM=D^A").unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized computation `D^A` on line 3");
    }

    #[test]
    fn rom_overflow() {
        let full = "D=A\n".repeat(MAX_ADDR as usize + 1);
        let (air, _) = parse(&full).unwrap();
        assert_eq!(air.len(), MAX_ADDR as usize + 1);

        let err = parse(&format!("{full}D=A\n")).unwrap_err();
        assert_eq!(err.code().unwrap().to_string(), "asm::rom_overflow");
        assert!(err.to_string().contains("32769"));
    }
}
