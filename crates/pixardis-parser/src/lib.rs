//! The Pixardis recursive-descent parser (spec.md §4.2) and the arena-based
//! AST it builds (spec.md §9 design notes).

pub mod ast;
mod parser;

pub use ast::{
    Ast, BinaryOp, Expr, ExprId, ExprKind, Function, Param, Stmt, StmtId, StmtKind, UnaryOp,
};
pub use parser::parse;

use pixardis_types::DiagnosticSink;

/// Lexes and parses a complete source string, handing back the AST together
/// with every diagnostic collected by either pass.
pub fn parse_source(source: &str) -> (Ast, DiagnosticSink) {
    let (tokens, mut sink) = pixardis_lexer::lex(source);
    let lines: Vec<String> = source.lines().map(|l| l.to_string()).collect();
    let (ast, parse_sink) = parse(tokens, &lines);
    sink.extend(parse_sink);
    (ast, sink)
}
