use thiserror::Error;

/// Failures turning assembly text into a resolved [`crate::Program`]. These
/// are internal pipeline errors, not user-facing source diagnostics — by the
/// time text reaches the assembler it was produced by codegen, never typed
/// by a person, so there is no `DiagnosticSink`/source-line rendering here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssembleError {
    #[error("line {line}: unknown mnemonic '{mnemonic}'")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: '{mnemonic}' expects {expected} operand(s), found {found}")]
    WrongOperandCount { line: usize, mnemonic: String, expected: usize, found: usize },

    #[error("line {line}: invalid operand '{operand}' for '{mnemonic}'")]
    InvalidOperand { line: usize, mnemonic: String, operand: String },

    #[error("line {line}: undefined label '{label}'")]
    UnresolvedLabel { line: usize, label: String },

    #[error("line {line}: label '{label}' is already defined")]
    DuplicateLabel { line: usize, label: String },

    #[error("missing required '.globals' directive")]
    MissingGlobalsDirective,
}
