//! Shared vocabulary for the Pixardis pipeline: the runtime value
//! representation, the type system, the resolved instruction set, and the
//! diagnostic types every pass reports through. Depended on by every other
//! `pixardis-*` crate and nothing else, mirroring `ancvm_types`' place at the
//! bottom of the teacher workspace.

pub mod diagnostic;
pub mod instr;
pub mod peekable;
pub mod ty;
pub mod value;

pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, Span};
pub use instr::Instr;
pub use peekable::PeekableIterator;
pub use ty::Type;
pub use value::{pack_colour, unpack_colour, Value};
