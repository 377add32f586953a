use thiserror::Error;

use pixardis_types::Type;

/// A runtime failure (spec.md §4.6). Unlike compile-time diagnostics, these
/// halt execution — the VM has no "continue past an error" mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("expected a {expected} value, found {found}")]
    TypeMismatch { expected: &'static str, found: Type },

    #[error("division by zero")]
    DivisionByZero,

    #[error("pixel coordinates ({x}, {y}) are outside the {width}x{height} canvas")]
    PixelOutOfBounds { x: i32, y: i32, width: u32, height: u32 },

    #[error("call stack underflow")]
    FrameUnderflow,

    #[error("return used outside an active call frame")]
    NoPendingReturn,

    #[error("program counter {0} is outside the loaded program")]
    ProgramCounterOutOfBounds(usize),

    #[error("'__random_int' upper bound must be positive, found {0}")]
    InvalidRandomBound(i32),
}
