//! Identifier and keyword lexing.

use crate::token::{lookup_keyword, Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    pub fn lex_identifier(&mut self) -> Token {
        let start = self.cursor.position();
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        let span = self.make_span();
        Token::new(kind, text, span)
    }
}

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use crate::{Lexer, TokenKind};
    use l0_util::Handler;

    #[test]
    fn lexes_plain_identifier() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("frobnicate", &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "frobnicate");
    }

    #[test]
    fn lexes_keyword() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("return", &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::KwReturn);
    }

    #[test]
    fn true_false_are_bool_literals() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("true false", &mut handler);
        assert_eq!(lexer.next_token().kind, TokenKind::BoolLiteral);
        assert_eq!(lexer.next_token().kind, TokenKind::BoolLiteral);
    }
}
