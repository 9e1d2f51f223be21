use miette::{miette, LabeledSpan, Report, Severity};

use crate::{
    command::{Segment, VmCommand},
    span::Span,
};

// VM translator errors

pub fn vm_unknown_command(span: Span, src: &str, line: usize, found: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "vm::command",
        help = "commands are `push`, `pop`, or one of add, sub, neg, eq, gt, lt, and, or, not",
        labels = vec![LabeledSpan::at(span, "unknown command")],
        "Unknown VM command `{found}` on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn vm_unknown_segment(span: Span, src: &str, line: usize, found: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "vm::segment",
        help = "segments are constant, local, argument, this, that, static, temp, and pointer",
        labels = vec![LabeledSpan::at(span, "unknown segment")],
        "Unknown memory segment `{found}` on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn vm_bad_index(span: Span, src: &str, line: usize, found: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "vm::index",
        help = "segment indices are non-negative decimal integers",
        labels = vec![LabeledSpan::at(span, "not an index")],
        "Expected a segment index, found `{found}` on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn vm_index_range(
    span: Span,
    src: &str,
    line: usize,
    segment: Segment,
    index: u32,
    max: u16,
) -> Report {
    miette!(
        severity = Severity::Error,
        code = "vm::index_range",
        help = format!("the {segment} segment accepts indices from 0 to {max}"),
        labels = vec![LabeledSpan::at(span, "out-of-range index")],
        "Index {index} is out of range for segment {segment} on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn vm_pop_constant(span: Span, src: &str, line: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "vm::pop_constant",
        help = "the constant segment is read-only, pop into another segment",
        labels = vec![LabeledSpan::at(span, "read-only segment")],
        "Cannot pop into the constant segment on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn vm_invalid_index(command: VmCommand, segment: Segment, max: u16) -> Report {
    miette!(
        severity = Severity::Error,
        code = "vm::index_range",
        help = format!("the {segment} segment accepts indices from 0 to {max}"),
        "Command `{command}` has an out-of-range index",
    )
}

pub fn vm_invalid_pop_constant(command: VmCommand) -> Report {
    miette!(
        severity = Severity::Error,
        code = "vm::pop_constant",
        help = "the constant segment is read-only, pop into another segment",
        "Command `{command}` pops into the constant segment",
    )
}

pub fn vm_operand_count(
    span: Span,
    src: &str,
    line: usize,
    command: &str,
    expected: usize,
    found: usize,
) -> Report {
    miette!(
        severity = Severity::Error,
        code = "vm::operands",
        help = "push and pop take a segment and an index, other commands take nothing",
        labels = vec![LabeledSpan::at(span, "incorrect operands")],
        "Command `{command}` expects {expected} operand(s), found {found} on line {line}",
    )
    .with_source_code(src.to_string())
}

// Assembler errors

pub fn asm_invalid_line(span: Span, src: &str, line: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::structure",
        help = "lines must be `@value`, `dest=comp;jump`, or a `(LABEL)` definition",
        labels = vec![LabeledSpan::at(span, "unrecognized line")],
        "Line {line} is not a valid instruction or label",
    )
    .with_source_code(src.to_string())
}

pub fn asm_invalid_symbol(span: Span, src: &str, line: usize, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::symbol",
        help = "symbols use letters, digits, `_`, `.`, `$`, `:` and cannot start with a digit",
        labels = vec![LabeledSpan::at(span, "invalid symbol")],
        "Invalid symbol `{name}` on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn asm_duplicate_label(span: Span, src: &str, line: usize, name: &str, addr: u16) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::duplicate_label",
        help = "labels can only be defined once per program",
        labels = vec![LabeledSpan::at(span, "duplicate label")],
        "Label `{name}` on line {line} is already bound to {addr}",
    )
    .with_source_code(src.to_string())
}

pub fn asm_predefined_label(span: Span, src: &str, line: usize, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::predefined_label",
        help = "SP, LCL, ARG, THIS, THAT, R0-R15, SCREEN and KBD are reserved",
        labels = vec![LabeledSpan::at(span, "reserved name")],
        "Label `{name}` on line {line} redefines a predefined symbol",
    )
    .with_source_code(src.to_string())
}

pub fn asm_addr_range(span: Span, src: &str, line: usize, value: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::addr_range",
        help = "address values range from 0 to 32,767",
        labels = vec![LabeledSpan::at(span, "out-of-range address")],
        "Address `{value}` on line {line} does not fit in 15 bits",
    )
    .with_source_code(src.to_string())
}

pub fn asm_rom_overflow(span: Span, src: &str, line: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::rom_overflow",
        help = "programs can contain at most 32,768 instructions",
        labels = vec![LabeledSpan::at(span, "does not fit")],
        "Instruction on line {line} is past the end of instruction memory",
    )
    .with_source_code(src.to_string())
}

pub fn asm_out_of_variables(span: Span, src: &str, line: usize, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::variables",
        help = "variables are allocated from address 16 up to 32,767",
        labels = vec![LabeledSpan::at(span, "no free address")],
        "No address left for variable `{name}` on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn asm_missing_comp(span: Span, src: &str, line: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::missing_comp",
        help = "compute instructions need a computation such as `D+1` or `0`",
        labels = vec![LabeledSpan::at(span, "no computation")],
        "Missing computation on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn asm_unknown_comp(span: Span, src: &str, line: usize, mnemonic: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::comp",
        help = "check the list of computations in the Hack instruction set",
        labels = vec![LabeledSpan::at(span, "unknown computation")],
        "Unrecognized computation `{mnemonic}` on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn asm_unknown_dest(span: Span, src: &str, line: usize, mnemonic: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::dest",
        help = "destinations are M, D, MD, A, AM, AD, or AMD",
        labels = vec![LabeledSpan::at(span, "unknown destination")],
        "Unrecognized destination `{mnemonic}` on line {line}",
    )
    .with_source_code(src.to_string())
}

pub fn asm_unknown_jump(span: Span, src: &str, line: usize, mnemonic: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::jump",
        help = "jumps are JGT, JEQ, JGE, JLT, JNE, JLE, or JMP",
        labels = vec![LabeledSpan::at(span, "unknown jump")],
        "Unrecognized jump `{mnemonic}` on line {line}",
    )
    .with_source_code(src.to_string())
}
