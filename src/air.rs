use miette::{bail, Result};

use crate::{
    error,
    span::Span,
    symbol::{Comp, Dest, Jump, SymbolTable, MAX_ADDR},
};

/// Assembly intermediate representation, the instructions of a program in ROM order.
#[derive(Debug, Default)]
pub struct Air {
    ast: Vec<AirStmt>,
}

impl Air {
    pub fn new() -> Self {
        Air { ast: Vec::new() }
    }

    pub fn add_stmt(&mut self, stmt: AirStmt) {
        self.ast.push(stmt)
    }

    /// Resolve every symbolic address operand in program order. Labels were bound while
    /// parsing, so any symbol still unknown here is a variable and gets the next free slot.
    pub fn backpatch(&mut self, symbols: &mut SymbolTable, src: &str) -> Result<()> {
        let first_var = symbols.next_variable();
        for stmt in &mut self.ast {
            if let Instr::Address(Operand::Symbol(sym)) = &mut stmt.instr {
                let addr = symbols.resolve_or_alloc(&sym.name).ok_or_else(|| {
                    error::asm_out_of_variables(stmt.span, src, stmt.line, &sym.name)
                })?;
                sym.addr = Some(addr);
            }
        }
        log::debug!(
            "pass 2: resolved symbols, {} new variable(s)",
            symbols.next_variable() - first_var
        );
        Ok(())
    }

    pub fn get(&self, idx: usize) -> &AirStmt {
        &self.ast[idx]
    }

    pub fn len(&self) -> usize {
        self.ast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ast.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AirStmt> {
        self.ast.iter()
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AirStmt;
    type IntoIter = std::slice::Iter<'a, AirStmt>;

    fn into_iter(self) -> Self::IntoIter {
        self.ast.iter()
    }
}

/// Single instruction along with where it came from.
#[derive(PartialEq, Eq, Debug)]
pub struct AirStmt {
    pub instr: Instr,
    /// 1-based source line
    pub line: usize,
    pub span: Span,
}

#[derive(PartialEq, Eq, Debug)]
pub enum Instr {
    /// Load a value into A
    Address(Operand),
    /// Compute a function of A, D and M, store it and optionally jump
    Compute { dest: Dest, comp: Comp, jump: Jump },
}

#[derive(PartialEq, Eq, Debug)]
pub enum Operand {
    Lit(u16),
    Symbol(SymbolRef),
}

/// Symbolic operand, filled in during backpatching.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SymbolRef {
    pub name: String,
    pub addr: Option<u16>,
}

impl SymbolRef {
    pub fn unresolved(name: &str) -> Self {
        SymbolRef {
            name: name.to_string(),
            addr: None,
        }
    }

    pub fn resolved(name: &str, addr: u16) -> Self {
        SymbolRef {
            name: name.to_string(),
            addr: Some(addr),
        }
    }
}

const COMPUTE_TAG: u16 = 0b111 << 13;

impl AirStmt {
    /// Encode the statement as a 16-bit machine word.
    pub fn emit(&self) -> Result<u16> {
        match &self.instr {
            Instr::Address(Operand::Lit(val)) => Ok(*val & MAX_ADDR),
            Instr::Address(Operand::Symbol(sym)) => match sym.addr {
                Some(addr) => Ok(addr & MAX_ADDR),
                None => bail!(
                    "Symbol `{}` on line {} was not backpatched",
                    sym.name,
                    self.line
                ),
            },
            Instr::Compute { dest, comp, jump } => {
                Ok(COMPUTE_TAG | comp.bits() << 6 | dest.bits() << 3 | jump.bits())
            }
        }
    }
}

/// Render a machine word the way `.hack` files store it.
pub fn format_word(word: u16) -> String {
    format!("{word:016b}")
}
