use pixardis_lexer::{Keyword, Token, TokenKind, TypeKeyword};
use pixardis_types::{Diagnostic, DiagnosticKind, DiagnosticSink, Span, Type};

use crate::ast::{Ast, BinaryOp, ExprId, ExprKind, Function, Param, StmtId, StmtKind, UnaryOp};

/// Fixed arities for the builtin statements/expressions named in spec.md
/// §6. Builtins are not ordinary function calls syntactically — they take a
/// bare, unparenthesised comma-separated argument list — so the parser needs
/// to know up front how many expressions to read.
fn builtin_arity(name: &str) -> Option<usize> {
    Some(match name {
        "__clear" => 1,
        "__write" | "__pixel" => 3,
        "__write_box" => 5,
        "__print" => 1,
        "__delay" => 1,
        "__read" => 2,
        "__random_int" => 1,
        "__width" | "__height" => 0,
        _ => return None,
    })
}

/// A parse failure that has already been recorded in the diagnostic sink;
/// the value itself only signals "stop parsing this production and
/// resynchronize" to the caller.
struct Bail;

type PResult<T> = Result<T, Bail>;

pub fn parse(tokens: Vec<Token>, lines: &[String]) -> (Ast, DiagnosticSink) {
    let mut parser = Parser {
        tokens,
        pos: 0,
        sink: DiagnosticSink::new(),
        lines: lines.to_vec(),
        ast: Ast::new(),
    };
    parser.parse_program();
    (parser.ast, parser.sink)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    sink: DiagnosticSink,
    lines: Vec<String>,
    ast: Ast,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn source_line(&self, line: u32) -> String {
        self.lines
            .get((line.saturating_sub(1)) as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn error(&mut self, span: Span, message: impl Into<String>) -> Bail {
        self.sink.push(Diagnostic::new(
            DiagnosticKind::Syntax,
            span,
            message,
            self.source_line(span.line),
        ));
        Bail
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.peek_kind() == &kind {
            Ok(self.advance())
        } else {
            let span = self.span();
            let found = self.peek_kind().clone();
            Err(self.error(span, format!("Expected {}, found {}.", what, found)))
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skips forward to the next `;` or `}` so parsing can resume after a
    /// syntax error (spec.md §4.2).
    fn synchronize(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_program(&mut self) {
        while !self.at_eof() {
            if self.check(&TokenKind::Keyword(Keyword::Fun)) {
                if let Ok(func) = self.parse_function() {
                    self.ast.functions.push(func);
                } else {
                    self.synchronize();
                }
            } else if let Ok(stmt) = self.parse_statement() {
                self.ast.top_level.push(stmt);
            } else {
                self.synchronize();
            }
        }
    }

    fn parse_type(&mut self) -> PResult<Type> {
        let span = self.span();
        match self.peek_kind().clone() {
            TokenKind::TypeKeyword(TypeKeyword::Int) => {
                self.advance();
                Ok(Type::Int)
            }
            TokenKind::TypeKeyword(TypeKeyword::Float) => {
                self.advance();
                Ok(Type::Float)
            }
            TokenKind::TypeKeyword(TypeKeyword::Bool) => {
                self.advance();
                Ok(Type::Bool)
            }
            TokenKind::TypeKeyword(TypeKeyword::Colour) => {
                self.advance();
                Ok(Type::Colour)
            }
            other => Err(self.error(span, format!("Expected a type, found {}.", other))),
        }
    }

    fn parse_ident(&mut self) -> PResult<String> {
        let span = self.span();
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(span, format!("Expected an identifier, found {}.", other))),
        }
    }

    fn parse_function(&mut self) -> PResult<Function> {
        let span = self.span();
        self.expect(TokenKind::Keyword(Keyword::Fun), "'fun'")?;
        let name = self.parse_ident()?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let pspan = self.span();
                let pname = self.parse_ident()?;
                self.expect(TokenKind::Colon, "':'")?;
                let ty = self.parse_type()?;
                params.push(Param { name: pname, ty, span: pspan });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Arrow, "'->'")?;
        let return_type = self.parse_type()?;
        let body = self.parse_block()?;
        Ok(Function { name, params, return_type, body, span })
    }

    fn parse_block(&mut self) -> PResult<Vec<StmtId>> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            match self.parse_statement() {
                Ok(id) => stmts.push(id),
                Err(Bail) => self.synchronize(),
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> PResult<StmtId> {
        let span = self.span();
        match self.peek_kind().clone() {
            TokenKind::Keyword(Keyword::Let) => self.parse_let(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::LBrace => {
                let body = self.parse_block()?;
                Ok(self.ast.alloc_stmt(StmtKind::Block(body), span))
            }
            TokenKind::Builtin(_) => self.parse_builtin_statement(),
            TokenKind::Ident(_) => self.parse_assign_or_expr_statement(),
            other => Err(self.error(span, format!("Unexpected token {} at start of statement.", other))),
        }
    }

    fn parse_let(&mut self) -> PResult<StmtId> {
        let span = self.span();
        self.advance(); // 'let'
        let name = self.parse_ident()?;
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;

        let array_size = if self.eat(&TokenKind::LBracket) {
            let size_span = self.span();
            let size = match self.peek_kind().clone() {
                TokenKind::IntLiteral(v) if v >= 0 => {
                    self.advance();
                    v as usize
                }
                other => {
                    return Err(self.error(size_span, format!("Expected an array size, found {}.", other)))
                }
            };
            self.expect(TokenKind::RBracket, "']'")?;
            Some(size)
        } else {
            None
        };

        self.expect(TokenKind::Assign, "'='")?;

        let (init, init_list) = if array_size.is_some() {
            self.expect(TokenKind::LBracket, "'['")?;
            let mut elems = Vec::new();
            if !self.check(&TokenKind::RBracket) {
                loop {
                    elems.push(self.parse_expression()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBracket, "']'")?;
            (None, Some(elems))
        } else {
            (Some(self.parse_expression()?), None)
        };

        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(self.ast.alloc_stmt(
            StmtKind::Let { name, ty, array_size, init, init_list },
            span,
        ))
    }

    fn parse_assign_or_expr_statement(&mut self) -> PResult<StmtId> {
        let span = self.span();
        let start = self.pos;

        // `name[` is unambiguous: only an indexed assignment starts this
        // way (an indexed *load* can only appear nested inside a larger
        // expression, never stand alone as a statement).
        let name = self.parse_ident()?;
        if self.eat(&TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.expect(TokenKind::RBracket, "']'")?;
            self.expect(TokenKind::Assign, "'='")?;
            let value = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            return Ok(self.ast.alloc_stmt(
                StmtKind::Assign { name, index: Some(index), value },
                span,
            ));
        }
        if self.eat(&TokenKind::Assign) {
            let value = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            return Ok(self.ast.alloc_stmt(
                StmtKind::Assign { name, index: None, value },
                span,
            ));
        }

        // Not an assignment after all: rewind and parse the whole thing as
        // a single expression statement (e.g. a function call for effect).
        self.pos = start;
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(self.ast.alloc_stmt(StmtKind::ExprStmt(expr), span))
    }

    /// Parses a bare `lhs = expr` or `lhs[expr] = expr` pair with no
    /// trailing `;`, used for the `for` loop's step clause.
    fn parse_assign_no_semicolon(&mut self) -> PResult<StmtId> {
        let span = self.span();
        let name = self.parse_ident()?;
        if self.eat(&TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.expect(TokenKind::RBracket, "']'")?;
            self.expect(TokenKind::Assign, "'='")?;
            let value = self.parse_expression()?;
            return Ok(self.ast.alloc_stmt(
                StmtKind::Assign { name, index: Some(index), value },
                span,
            ));
        }
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_expression()?;
        Ok(self.ast.alloc_stmt(StmtKind::Assign { name, index: None, value }, span))
    }

    fn parse_if(&mut self) -> PResult<StmtId> {
        let span = self.span();
        self.advance(); // 'if'
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.eat(&TokenKind::Keyword(Keyword::Else)) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(self.ast.alloc_stmt(StmtKind::If { cond, then_branch, else_branch }, span))
    }

    fn parse_while(&mut self) -> PResult<StmtId> {
        let span = self.span();
        self.advance(); // 'while'
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.parse_block()?;
        Ok(self.ast.alloc_stmt(StmtKind::While { cond, body }, span))
    }

    fn parse_for(&mut self) -> PResult<StmtId> {
        let span = self.span();
        self.advance(); // 'for'
        self.expect(TokenKind::LParen, "'('")?;

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::Keyword(Keyword::Let)) {
            Some(self.parse_let()?)
        } else {
            let stmt = self.parse_assign_no_semicolon()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            Some(stmt)
        };
        if init.is_none() {
            self.expect(TokenKind::Semicolon, "';'")?;
        }

        let cond = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "';'")?;

        let step = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_assign_no_semicolon()?)
        };
        self.expect(TokenKind::RParen, "')'")?;

        let body = self.parse_block()?;
        Ok(self.ast.alloc_stmt(StmtKind::For { init, cond, step, body }, span))
    }

    fn parse_return(&mut self) -> PResult<StmtId> {
        let span = self.span();
        self.advance(); // 'return'
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(self.ast.alloc_stmt(StmtKind::Return { value }, span))
    }

    fn parse_builtin_statement(&mut self) -> PResult<StmtId> {
        let span = self.span();
        let name = match self.advance().kind {
            TokenKind::Builtin(n) => n,
            _ => unreachable!(),
        };
        let arity = builtin_arity(&name)
            .ok_or_else(|| self.error(span, format!("Unknown builtin '{}'.", name)))?;
        let args = self.parse_builtin_args(arity, &name, span)?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(self.ast.alloc_stmt(StmtKind::Builtin { name, args }, span))
    }

    fn parse_builtin_args(&mut self, arity: usize, name: &str, span: Span) -> PResult<Vec<ExprId>> {
        let mut args = Vec::with_capacity(arity);
        for i in 0..arity {
            if i > 0 {
                self.expect(TokenKind::Comma, "','")?;
            }
            args.push(self.parse_expression()?);
        }
        let _ = name;
        let _ = span;
        Ok(args)
    }

    // ---- expressions (precedence climbing) ----

    fn parse_expression(&mut self) -> PResult<ExprId> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<ExprId> {
        let mut lhs = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            let span = self.span();
            self.advance();
            let rhs = self.parse_and()?;
            lhs = self.ast.alloc_expr(ExprKind::Binary { op: BinaryOp::Or, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<ExprId> {
        let mut lhs = self.parse_equality()?;
        while self.check(&TokenKind::And) {
            let span = self.span();
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = self.ast.alloc_expr(ExprKind::Binary { op: BinaryOp::And, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> PResult<ExprId> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = self.ast.alloc_expr(ExprKind::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> PResult<ExprId> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = self.ast.alloc_expr(ExprKind::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<ExprId> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.ast.alloc_expr(ExprKind::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<ExprId> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.ast.alloc_expr(ExprKind::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<ExprId> {
        let span = self.span();
        match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.ast.alloc_expr(ExprKind::Unary { op: UnaryOp::Neg, operand }, span))
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.ast.alloc_expr(ExprKind::Unary { op: UnaryOp::Not, operand }, span))
            }
            _ => self.parse_cast(),
        }
    }

    fn parse_cast(&mut self) -> PResult<ExprId> {
        let expr = self.parse_primary()?;
        self.finish_cast(expr)
    }

    fn finish_cast(&mut self, mut expr: ExprId) -> PResult<ExprId> {
        while self.check(&TokenKind::Keyword(Keyword::As)) {
            let span = self.span();
            self.advance();
            let target = self.parse_type()?;
            expr = self.ast.alloc_expr(ExprKind::Cast { expr, target }, span);
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<ExprId> {
        let span = self.span();
        match self.peek_kind().clone() {
            TokenKind::IntLiteral(v) => {
                self.advance();
                Ok(self.ast.alloc_expr(ExprKind::IntLiteral(v), span))
            }
            TokenKind::FloatLiteral(v) => {
                self.advance();
                Ok(self.ast.alloc_expr(ExprKind::FloatLiteral(v), span))
            }
            TokenKind::ColourLiteral(v) => {
                self.advance();
                Ok(self.ast.alloc_expr(ExprKind::ColourLiteral(v), span))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(self.ast.alloc_expr(ExprKind::BoolLiteral(true), span))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(self.ast.alloc_expr(ExprKind::BoolLiteral(false), span))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Builtin(name) => {
                self.advance();
                let arity = builtin_arity(&name)
                    .ok_or_else(|| self.error(span, format!("Unknown builtin '{}'.", name)))?;
                let args = self.parse_builtin_args(arity, &name, span)?;
                Ok(self.ast.alloc_expr(ExprKind::BuiltinCall { name, args }, span))
            }
            TokenKind::Ident(name) => {
                self.advance();
                self.parse_postfix_from_ident(name, span)
            }
            other => Err(self.error(span, format!("Unexpected token {} in expression.", other))),
        }
    }

    fn parse_postfix_from_ident(&mut self, name: String, span: Span) -> PResult<ExprId> {
        if self.eat(&TokenKind::LParen) {
            let mut args = Vec::new();
            if !self.check(&TokenKind::RParen) {
                loop {
                    args.push(self.parse_expression()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(self.ast.alloc_expr(ExprKind::Call { name, args }, span));
        }
        if self.eat(&TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.expect(TokenKind::RBracket, "']'")?;
            return Ok(self.ast.alloc_expr(ExprKind::Index { name, index }, span));
        }
        Ok(self.ast.alloc_expr(ExprKind::Variable(name), span))
    }
}
