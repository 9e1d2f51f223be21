// Translating
mod command;
pub use command::{ArithOp, Segment, VmCommand};
mod translator;
pub use translator::VmTranslator;

// Assembling
mod parser;
pub use parser::AsmParser;
mod air;
pub use air::{format_word, Air, AirStmt, Instr, Operand, SymbolRef};
mod symbol;
pub use symbol::{Comp, Dest, Jump, SymbolTable};

// One run of the pipeline
mod session;
pub use session::{Binary, Session, STACK_BASE};
mod features;
pub use features::Features;

// Running
mod runtime;
pub use runtime::{RunOutcome, RunState};

mod error;
mod lexer;
mod span;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
