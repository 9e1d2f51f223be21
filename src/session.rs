use miette::Result;

use crate::{
    air::format_word,
    features::Features,
    parser::AsmParser,
    symbol::{is_symbol, SymbolTable},
    translator::VmTranslator,
};

/// Initial stack pointer set by the bootstrap code.
pub const STACK_BASE: u16 = 256;

/// Owns all state of one translation and assembly run. Nothing is shared between sessions.
#[derive(Debug, Default)]
pub struct Session {
    features: Features,
    symbols: SymbolTable,
    /// Next comparison label number
    labels: u32,
}

impl Session {
    pub fn new(features: Features) -> Self {
        Session {
            features,
            symbols: SymbolTable::new(),
            labels: 0,
        }
    }

    pub fn features(&self) -> Features {
        self.features
    }

    /// Translate a single VM unit. `unit` qualifies the unit's static variables.
    pub fn translate_unit(&mut self, unit: &str, src: &str) -> Result<String> {
        let unit = unit_symbol(unit);
        VmTranslator::new(src, &unit, &mut self.labels, self.features.annotate).translate()
    }

    /// Translate a whole program made of `(unit, source)` pairs, adding the bootstrap and halt
    /// code when those features are enabled.
    pub fn translate(&mut self, units: &[(&str, &str)]) -> Result<String> {
        let mut out = String::new();
        if self.features.bootstrap {
            if self.features.annotate {
                out.push_str("// bootstrap\n");
            }
            out.push_str(&format!("@{STACK_BASE}\nD=A\n@SP\nM=D\n"));
        }
        for (unit, src) in units {
            out.push_str(&self.translate_unit(unit, src)?);
        }
        if self.features.halt {
            if self.features.annotate {
                out.push_str("// halt\n");
            }
            out.push_str("($HALT)\n@$HALT\n0;JMP\n");
        }
        Ok(out)
    }

    /// Assemble `src` in two passes: labels are bound first so forward references resolve,
    /// then operands are resolved and every instruction encoded. Ends the session.
    pub fn assemble(mut self, src: &str) -> Result<Binary> {
        let parser = AsmParser::new(src, &mut self.symbols);
        let mut air = parser.parse()?;
        air.backpatch(&mut self.symbols, src)?;
        let words = air.iter().map(|stmt| stmt.emit()).collect::<Result<Vec<_>>>()?;
        Ok(Binary {
            words,
            symbols: self.symbols,
        })
    }

    /// Translate and assemble in one go.
    pub fn build(mut self, units: &[(&str, &str)]) -> Result<Binary> {
        let asm = self.translate(units)?;
        self.assemble(&asm)
    }
}

/// Make a unit name usable inside a symbol.
fn unit_symbol(unit: &str) -> String {
    if is_symbol(unit) {
        return unit.to_string();
    }
    let mut sym: String = unit
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || "_.$:".contains(c) { c } else { '_' })
        .collect();
    if !sym.starts_with(|c: char| !c.is_ascii_digit()) {
        sym.insert(0, '_');
    }
    sym
}

/// Output of a successful assembly run.
#[derive(Debug)]
pub struct Binary {
    words: Vec<u16>,
    symbols: SymbolTable,
}

impl Binary {
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn into_words(self) -> Vec<u16> {
        self.words
    }

    /// Symbols as they stood at the end of assembly.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// `.hack` text: one 16-digit binary line per word.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.words.len() * 17);
        for word in &self.words {
            out.push_str(&format_word(*word));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(src: &str) -> Result<Binary> {
        Session::default().assemble(src)
    }

    #[test]
    fn assembles_addition_example() {
        let bin = assemble("@2\nD=A\n@3\nD=D+A\n@0\nM=D\n").unwrap();
        assert_eq!(
            bin.to_text(),
            "0000000000000010\n\
             1110110000010000\n\
             0000000000000011\n\
             1110000010010000\n\
             0000000000000000\n\
             1110001100001000\n"
        );
    }

    #[test]
    fn output_is_deterministic() {
        let src = "@7\nD=A\n@SCREEN\nM=D\n0;JMP";
        assert_eq!(assemble(src).unwrap().to_text(), assemble(src).unwrap().to_text());
    }

    #[test]
    fn variables_in_first_appearance_order() {
        let src = "@foo\nM=1\n@bar\nM=0\n@foo\nD=M\n@baz\n@R5\n@bar";
        let bin = assemble(src).unwrap();
        assert_eq!(bin.words()[0], 16);
        assert_eq!(bin.words()[2], 17);
        assert_eq!(bin.words()[4], 16);
        assert_eq!(bin.words()[6], 18);
        assert_eq!(bin.words()[7], 5);
        assert_eq!(bin.words()[8], 17);
    }

    #[test]
    fn forward_label_resolves_to_next_instruction() {
        let src = "@END\n0;JMP\n// skip\n@i\n(END)\n// trailing\n@END\n0;JMP";
        let bin = assemble(src).unwrap();
        assert_eq!(bin.words()[0], 3);
        assert_eq!(bin.symbols().get("END"), Some(3));
        // Labels are bound before variables, so `i` is still the first variable
        assert_eq!(bin.symbols().get("i"), Some(16));
    }

    #[test]
    fn sessions_do_not_share_symbols() {
        assert!(assemble("(LOOP)\n@LOOP").is_ok());
        assert!(assemble("(LOOP)\n@LOOP").is_ok());
        let bin = assemble("@x").unwrap();
        assert_eq!(bin.words(), &[16]);
    }

    #[test]
    fn fails_without_partial_output() {
        assert!(assemble("@1\nD=A\nD=Q\n@2").is_err());
    }

    #[test]
    fn translate_adds_bootstrap_and_halt() {
        let mut session = Session::new("bootstrap,halt".parse().unwrap());
        let asm = session.translate(&[("Main", "push constant 1")]).unwrap();
        assert!(asm.starts_with("@256\nD=A\n@SP\nM=D\n"));
        assert!(asm.ends_with("($HALT)\n@$HALT\n0;JMP\n"));
    }

    #[test]
    fn translate_multiple_units() {
        let mut session = Session::new(Features::default());
        let asm = session
            .translate(&[("Foo", "push static 0\neq"), ("Bar", "pop static 0\neq")])
            .unwrap();
        assert!(asm.contains("@Foo.0"));
        assert!(asm.contains("@Bar.0"));
        assert!(asm.contains("($EQ.TRUE.0)"));
        assert!(asm.contains("($EQ.TRUE.1)"));
        let bin = session.assemble(&asm).unwrap();
        assert_eq!(bin.symbols().get("Foo.0"), Some(16));
        assert_eq!(bin.symbols().get("Bar.0"), Some(17));
    }

    #[test]
    fn unit_names_become_symbols() {
        assert_eq!(unit_symbol("Main"), "Main");
        assert_eq!(unit_symbol("my-prog"), "my_prog");
        assert_eq!(unit_symbol("7seg"), "_7seg");
    }

    #[test]
    fn variables_run_out_past_top_of_ram() {
        // Addresses 16 through 32767 hold exactly 32752 variables
        let src: String = (0..32752).map(|n| format!("@v{n}\n")).collect();
        let bin = assemble(&src).unwrap();
        assert_eq!(bin.words().last(), Some(&0x7FFF));

        let err = assemble(&format!("{src}@v32752\n")).unwrap_err();
        assert_eq!(err.code().unwrap().to_string(), "asm::variables");
        assert!(err.to_string().contains("32753"));
    }
}
