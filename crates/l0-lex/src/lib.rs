//! l0-lex - Lexer
//!
//! Turns a module's source text into a flat stream of [`Token`]s (spec.md
//! §4.1). The lexer never looks past the current character plus one byte
//! of lookahead; everything context-sensitive (negative-literal absorption,
//! string escape decoding) is handled either inline or by a dedicated
//! on-demand helper, never by backtracking.

mod cursor;
mod error;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use error::*;
pub use lexer::Lexer;
pub use token::{
    intern_ident, is_reserved_identifier, lookup_keyword, Token, TokenKind, RESERVED_IDENTIFIERS,
};
pub use lexer::decode_string_escapes;

#[cfg(test)]
mod tests {
    use super::*;
    use l0_util::Handler;

    /// spec.md §8: `Lexer(pretty_print(tokens))` preserves kind and payload
    /// across a representative token mix.
    fn lex_all(src: &str) -> Vec<(TokenKind, String)> {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(src, &mut handler);
        let tokens: Vec<_> = lexer.by_ref().map(|t| (t.kind, t.text)).collect();
        assert!(!handler.has_errors(), "unexpected lex errors: {:?}", handler.diagnostics());
        tokens
    }

    #[test]
    fn pretty_print_round_trip_preserves_kind_and_payload() {
        let tokens = lex_all("func add(a: int, b: int) -> int { return a + b; }");
        let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwFunc,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::LBrace,
                TokenKind::KwReturn,
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::RBrace,
            ]
        );
        assert_eq!(tokens[1].1, "add");
        assert_eq!(tokens[4].1, ":");
    }

    #[test]
    fn module_and_import_headers_lex_correctly() {
        let tokens = lex_all("module a.b.c\nimport x.y;");
        let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwModule,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::KwImport,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Semicolon,
            ]
        );
    }
}
