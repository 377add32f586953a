//! The Pixardis source-language lexer (spec.md §4.1).

mod lexer;
mod token;

pub use lexer::lex;
pub use token::{Keyword, Token, TokenKind, TypeKeyword};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, sink) = lex(src);
        assert!(sink.is_empty(), "unexpected lex errors: {:?}", sink.into_vec());
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_identifiers_and_keywords() {
        assert_eq!(
            kinds("let fun if else while for return as"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Keyword(Keyword::Fun),
                TokenKind::Keyword(Keyword::If),
                TokenKind::Keyword(Keyword::Else),
                TokenKind::Keyword(Keyword::While),
                TokenKind::Keyword(Keyword::For),
                TokenKind::Keyword(Keyword::Return),
                TokenKind::Keyword(Keyword::As),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_builtin_identifiers_distinctly() {
        assert_eq!(
            kinds("__print __width"),
            vec![
                TokenKind::Builtin("__print".to_string()),
                TokenKind::Builtin("__width".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numeric_literals() {
        assert_eq!(
            kinds("42 3.14 2e3 .5"),
            vec![
                TokenKind::IntLiteral(42),
                TokenKind::FloatLiteral(3.14),
                TokenKind::FloatLiteral(2000.0),
                TokenKind::FloatLiteral(0.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_colour_literal() {
        assert_eq!(
            kinds("#102030"),
            vec![TokenKind::ColourLiteral(0x102030), TokenKind::Eof]
        );
    }

    #[test]
    fn rejects_malformed_colour_literal_and_continues() {
        let (tokens, sink) = lex("#12 __print");
        assert_eq!(sink.len(), 1);
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Builtin(_))));
    }

    #[test]
    fn operators_are_matched_longest_first() {
        assert_eq!(
            kinds("== != <= >= -> = < >"),
            vec![
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Arrow,
                TokenKind::Assign,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        assert_eq!(
            kinds("// a comment\n/* block \n comment */ 42"),
            vec![TokenKind::IntLiteral(42), TokenKind::Eof]
        );
    }

    #[test]
    fn reports_unterminated_block_comment() {
        let (_, sink) = lex("/* never closed");
        assert_eq!(sink.len(), 1);
    }
}
