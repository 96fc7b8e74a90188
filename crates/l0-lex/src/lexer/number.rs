//! Integer literal lexing (spec.md §4.1: 32-bit signed, decimal only).

use crate::error::{LEX_INTEGER_OVERFLOW, LEX_MALFORMED_DIGIT_RUN};
use crate::lexer::identifier::{is_ident_continue, is_ident_start};
use crate::token::{Token, TokenKind};
use crate::Lexer;
use l0_util::Span;

impl<'a> Lexer<'a> {
    /// Lexes a run of decimal digits starting at the cursor, optionally
    /// preceded by a `-` already consumed by the caller (`negative`).
    /// Produces `TokenKind::IntLiteral` with `text` holding the literal as
    /// written (including a leading `-` when absorbed).
    pub fn lex_number(&mut self, negative: bool) -> Token {
        let digit_start = self.cursor.position();
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        let digits = self.cursor.slice_from(digit_start);

        // A digit run immediately followed by an identifier-start character
        // (e.g. `123abc`) is not a valid adjacent token pair; this prevents
        // silently splitting it into two tokens.
        if is_ident_start(self.cursor.current_char()) {
            while is_ident_continue(self.cursor.current_char()) {
                self.cursor.advance();
            }
            let span = self.make_span();
            self.report_error(
                LEX_MALFORMED_DIGIT_RUN,
                format!("malformed digit run '{}'", self.cursor.slice_from(self.token_start)),
            );
            return Token::new(TokenKind::Invalid, self.cursor.slice_from(self.token_start), span);
        }

        let text = if negative {
            format!("-{digits}")
        } else {
            digits.to_string()
        };

        let span = self.make_span();
        match text.parse::<i32>() {
            Ok(_) => Token::new(TokenKind::IntLiteral, text, span),
            Err(_) => {
                self.report_error(
                    LEX_INTEGER_OVERFLOW,
                    format!("integer literal '{text}' does not fit in a 32-bit signed integer"),
                );
                Token::new(TokenKind::IntLiteral, text, span)
            }
        }
    }

    pub(crate) fn make_span(&self) -> Span {
        Span::new(
            self.file,
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
            self.cursor.line(),
            self.cursor.column(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{Lexer, TokenKind};
    use l0_util::Handler;

    fn lex_one(src: &str) -> crate::token::Token {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(src, &mut handler);
        lexer.next_token()
    }

    #[test]
    fn lexes_plain_decimal() {
        let tok = lex_one("42");
        assert_eq!(tok.kind, TokenKind::IntLiteral);
        assert_eq!(tok.text, "42");
    }

    #[test]
    fn reports_overflow() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("99999999999", &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IntLiteral);
        assert!(handler.has_errors());
        assert!(handler.diagnostics()[0].message.contains("LEX-0060"));
    }

    #[test]
    fn reports_malformed_digit_run() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("123abc", &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Invalid);
        assert!(handler.has_errors());
        assert!(handler.diagnostics()[0].message.contains("LEX-0061"));
    }
}
