use pixardis_types::{Diagnostic, DiagnosticKind, DiagnosticSink, Span};

use crate::token::{Keyword, Token, TokenKind, TypeKeyword};

/// Scans an entire source string into a token stream, collecting every
/// lexical error instead of stopping at the first one (spec.md §4.1:
/// "lexing continues from the next synchronization point ... so that
/// multiple errors can be reported"). The synchronization point is the next
/// run of whitespace.
pub fn lex(source: &str) -> (Vec<Token>, DiagnosticSink) {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    let mut sink = DiagnosticSink::new();

    loop {
        match lexer.next_token() {
            Ok(token) => {
                let done = token.kind == TokenKind::Eof;
                tokens.push(token);
                if done {
                    break;
                }
            }
            Err(diagnostic) => {
                sink.push(diagnostic);
                lexer.synchronize();
            }
        }
    }

    (tokens, sink)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    lines: Vec<String>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            lines: source.lines().map(|l| l.to_string()).collect(),
        }
    }

    fn source_line(&self, line: u32) -> String {
        self.lines
            .get((line.saturating_sub(1)) as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Lexical, span, message, self.source_line(span.line))
    }

    /// Skips forward to the next whitespace run so a subsequent call to
    /// `next_token` starts on a clean boundary.
    fn synchronize(&mut self) {
        while let Some(ch) = self.peek(0) {
            if ch.is_whitespace() {
                return;
            }
            self.advance();
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), Diagnostic> {
        loop {
            match self.peek(0) {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek(1) == Some('/') => {
                    while let Some(ch) = self.peek(0) {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek(1) == Some('*') => {
                    let start = Span::new(self.line, self.column);
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(ch) = self.peek(0) {
                        if ch == '*' && self.peek(1) == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }
                    if !closed {
                        return Err(self.error(start, "Unterminated block comment."));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, Diagnostic> {
        self.skip_whitespace_and_comments()?;

        let span = Span::new(self.line, self.column);
        let ch = match self.peek(0) {
            Some(ch) => ch,
            None => return Ok(Token::new(TokenKind::Eof, span)),
        };

        if ch == '_' && self.peek(1) == Some('_') {
            return self.lex_builtin(span);
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(self.lex_word(span));
        }
        if ch.is_ascii_digit() || (ch == '.' && self.peek(1).is_some_and(|c| c.is_ascii_digit())) {
            return self.lex_number(span);
        }
        if ch == '#' {
            return self.lex_colour(span);
        }

        self.lex_punctuation_or_operator(span)
    }

    fn lex_word(&mut self, span: Span) -> Token {
        let mut ident = String::new();
        while let Some(ch) = self.peek(0) {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(kw) = Keyword::from_str(&ident) {
            return Token::new(TokenKind::Keyword(kw), span);
        }
        if let Some(ty) = TypeKeyword::from_str(&ident) {
            return Token::new(TokenKind::TypeKeyword(ty), span);
        }
        if ident == "and" {
            return Token::new(TokenKind::And, span);
        }
        if ident == "or" {
            return Token::new(TokenKind::Or, span);
        }
        if ident == "not" {
            return Token::new(TokenKind::Not, span);
        }
        Token::new(TokenKind::Ident(ident), span)
    }

    fn lex_builtin(&mut self, span: Span) -> Result<Token, Diagnostic> {
        let mut name = String::new();
        while let Some(ch) = self.peek(0) {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Ok(Token::new(TokenKind::Builtin(name), span))
    }

    fn lex_number(&mut self, span: Span) -> Result<Token, Diagnostic> {
        let mut text = String::new();
        let mut is_float = false;

        while let Some(ch) = self.peek(0) {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.advance();
            while let Some(ch) = self.peek(0) {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek(0), Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if self.peek(lookahead).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push(self.advance().unwrap());
                if matches!(self.peek(0), Some('+') | Some('-')) {
                    text.push(self.advance().unwrap());
                }
                while let Some(ch) = self.peek(0) {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        if is_float {
            text.parse::<f64>()
                .map(|v| Token::new(TokenKind::FloatLiteral(v), span))
                .map_err(|_| self.error(span, format!("Malformed float literal '{}'.", text)))
        } else {
            text.parse::<i32>()
                .map(|v| Token::new(TokenKind::IntLiteral(v), span))
                .map_err(|_| self.error(span, format!("Malformed integer literal '{}'.", text)))
        }
    }

    fn lex_colour(&mut self, span: Span) -> Result<Token, Diagnostic> {
        self.advance(); // '#'
        let mut digits = String::new();
        while digits.len() < 6 {
            match self.peek(0) {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    digits.push(ch);
                    self.advance();
                }
                _ => break,
            }
        }
        if digits.len() != 6 {
            return Err(self.error(
                span,
                format!("Colour literal must have exactly 6 hex digits, found {}.", digits.len()),
            ));
        }
        let value = u32::from_str_radix(&digits, 16)
            .map_err(|_| self.error(span, "Malformed colour literal."))?;
        Ok(Token::new(TokenKind::ColourLiteral(value), span))
    }

    fn lex_punctuation_or_operator(&mut self, span: Span) -> Result<Token, Diagnostic> {
        let two: Option<String> = match (self.peek(0), self.peek(1)) {
            (Some(a), Some(b)) => Some(format!("{}{}", a, b)),
            _ => None,
        };

        if let Some(two) = two.as_deref() {
            let kind = match two {
                "==" => Some(TokenKind::Eq),
                "!=" => Some(TokenKind::Ne),
                "<=" => Some(TokenKind::Le),
                ">=" => Some(TokenKind::Ge),
                "->" => Some(TokenKind::Arrow),
                _ => None,
            };
            if let Some(kind) = kind {
                self.advance();
                self.advance();
                return Ok(Token::new(kind, span));
            }
        }

        let ch = self.advance().unwrap();
        let kind = match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            other => return Err(self.error(span, format!("Unexpected character '{}'.", other))),
        };
        Ok(Token::new(kind, span))
    }
}
