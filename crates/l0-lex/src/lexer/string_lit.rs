//! String and byte literal lexing, plus the on-demand escape decoder.
//!
//! String tokens keep their verbatim source text (quotes included); escape
//! decoding is deferred to whichever pass actually needs the literal's
//! value (spec.md §4.1), via [`decode_string_escapes`] below.

use crate::error::{
    LEX_EMPTY_BYTE_LITERAL, LEX_ESCAPE_OUT_OF_RANGE, LEX_INCOMPLETE_ESCAPE,
    LEX_INVALID_HEX_ESCAPE, LEX_NON_ASCII_BYTE_LITERAL, LEX_UNKNOWN_ESCAPE,
    LEX_UNTERMINATED_BYTE_LITERAL, LEX_UNTERMINATED_STRING,
};
use crate::token::{Token, TokenKind};
use crate::Lexer;
use l0_util::{DiagnosticBuilder, Handler, Span};

impl<'a> Lexer<'a> {
    /// Scans a `"..."` string literal. Backslash escapes are skipped over
    /// (not validated) so a `\"` doesn't terminate the literal early.
    pub fn lex_string(&mut self) -> Token {
        let start = self.cursor.position();
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.current_char() {
                '"' => {
                    self.cursor.advance();
                    break;
                }
                '\0' if self.cursor.is_at_end() => {
                    let span = self.make_span();
                    self.report_error(LEX_UNTERMINATED_STRING, "unterminated string literal");
                    return Token::new(TokenKind::Invalid, self.cursor.slice_from(start), span);
                }
                '\\' => {
                    self.cursor.advance();
                    if !self.cursor.is_at_end() {
                        self.cursor.advance();
                    }
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
        let text = self.cursor.slice_from(start).to_string();
        let span = self.make_span();
        Token::new(TokenKind::StringLiteral, text, span)
    }

    /// Scans a `'c'` byte literal: a single ASCII printable character or a
    /// C-like escape, between single quotes.
    pub fn lex_byte(&mut self) -> Token {
        let start = self.cursor.position();
        self.cursor.advance(); // opening quote

        if self.cursor.current_char() == '\'' {
            let span = self.make_span_from(start);
            self.cursor.advance();
            self.report_error(LEX_EMPTY_BYTE_LITERAL, "empty byte literal");
            return Token::new(TokenKind::Invalid, self.cursor.slice_from(start), span);
        }

        if self.cursor.current_char() == '\\' {
            self.cursor.advance();
            if !self.cursor.is_at_end() {
                self.cursor.advance();
            }
        } else if !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if !c.is_ascii() {
                let consumed_start = self.cursor.position();
                self.cursor.advance();
                let span = self.make_span_from(consumed_start);
                self.report_error(
                    LEX_NON_ASCII_BYTE_LITERAL,
                    format!("byte literal contains non-ASCII character '{c}'"),
                );
                // consume up to the closing quote if present, for recovery
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\'' {
                    self.cursor.advance();
                }
                if self.cursor.current_char() == '\'' {
                    self.cursor.advance();
                }
                return Token::new(TokenKind::Invalid, self.cursor.slice_from(start), span);
            }
            self.cursor.advance();
        }

        if self.cursor.current_char() != '\'' {
            let span = self.make_span();
            self.report_error(LEX_UNTERMINATED_BYTE_LITERAL, "unterminated byte literal");
            return Token::new(TokenKind::Invalid, self.cursor.slice_from(start), span);
        }
        self.cursor.advance();

        let text = self.cursor.slice_from(start).to_string();
        let span = self.make_span();
        Token::new(TokenKind::ByteLiteral, text, span)
    }

    fn make_span_from(&self, start: usize) -> Span {
        Span::new(
            self.file,
            start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
            self.cursor.line(),
            self.cursor.column(),
        )
    }
}

/// Decodes the escapes in a string or byte literal's verbatim text
/// (quotes included, either `"..."` or `'...'`) into the characters it
/// denotes. Called by later passes — the lexer itself never looks inside
/// escapes.
///
/// Supports `\n \t \r \0 \\ \' \" \xHH`. Any other `\c` is `LEX-0050`.
pub fn decode_string_escapes(raw: &str, span: Span, handler: &mut Handler) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(raw);
    decode_escapes(inner, span, handler)
}

fn decode_escapes(inner: &str, span: Span, handler: &mut Handler) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => {
                DiagnosticBuilder::error(LEX_INCOMPLETE_ESCAPE, "incomplete escape at end of literal")
                    .span(span)
                    .emit(handler);
            }
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                match (hi.and_then(|c| c.to_digit(16)), lo.and_then(|c| c.to_digit(16))) {
                    (Some(hi), Some(lo)) => {
                        let byte = (hi * 16 + lo) as u8;
                        if byte > 0x7f {
                            DiagnosticBuilder::error(
                                LEX_ESCAPE_OUT_OF_RANGE,
                                format!("escape value \\x{hi:x}{lo:x} is out of ASCII range"),
                            )
                            .span(span)
                            .emit(handler);
                        }
                        out.push(byte as char);
                    }
                    _ => {
                        DiagnosticBuilder::error(
                            LEX_INVALID_HEX_ESCAPE,
                            "expected two hex digits after \\x",
                        )
                        .span(span)
                        .emit(handler);
                    }
                }
            }
            Some(other) => {
                DiagnosticBuilder::error(LEX_UNKNOWN_ESCAPE, format!("unknown escape '\\{other}'"))
                    .span(span)
                    .emit(handler);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lexer, TokenKind};
    use l0_util::Handler;

    #[test]
    fn lexes_plain_string() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(r#""hello""#, &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::StringLiteral);
        assert_eq!(tok.text, "\"hello\"");
    }

    #[test]
    fn escaped_quote_does_not_terminate_string() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(r#""a\"b""#, &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::StringLiteral);
        assert!(!handler.has_errors());
    }

    #[test]
    fn unterminated_string_reports_lex_0010() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("\"abc", &mut handler);
        lexer.next_token();
        assert!(handler.has_errors());
        assert!(handler.diagnostics()[0].message.contains("LEX-0010"));
    }

    #[test]
    fn empty_byte_literal_reports_lex_0020() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("''", &mut handler);
        lexer.next_token();
        assert!(handler.diagnostics()[0].message.contains("LEX-0020"));
    }

    #[test]
    fn unterminated_byte_literal_reports_lex_0021() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("'a", &mut handler);
        lexer.next_token();
        assert!(handler.diagnostics()[0].message.contains("LEX-0021"));
    }

    #[test]
    fn decode_escapes_handles_newline_and_hex() {
        let mut handler = Handler::new();
        let decoded = decode_string_escapes(r#""a\nb\x41""#, Span::DUMMY, &mut handler);
        assert_eq!(decoded, "a\nbA");
        assert!(!handler.has_errors());
    }

    #[test]
    fn decode_escapes_reports_unknown_escape() {
        let mut handler = Handler::new();
        decode_string_escapes(r#""\q""#, Span::DUMMY, &mut handler);
        assert!(handler.diagnostics()[0].message.contains("LEX-0050"));
    }
}
