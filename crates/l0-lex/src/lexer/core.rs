//! Main `Lexer` struct and token dispatch.

use crate::error::LEX_UNKNOWN_CHARACTER;
use crate::lexer::identifier::is_ident_start;
use crate::token::{Token, TokenKind};
use crate::Cursor;
use l0_util::{DiagnosticBuilder, DiagnosticCode, FileId, Handler, Span};

/// Whether the previously emitted token can end an expression. `-` right
/// after such a token is binary subtraction; otherwise a literal `-42` is
/// absorbed into a single negative-integer token (spec.md §4.1).
fn ends_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::IntLiteral
            | TokenKind::ByteLiteral
            | TokenKind::StringLiteral
            | TokenKind::BoolLiteral
            | TokenKind::Identifier
            | TokenKind::KwNull
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace
    )
}

pub struct Lexer<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) handler: &'a mut Handler,
    pub(crate) file: FileId,
    pub(crate) token_start: usize,
    pub(crate) token_start_line: u32,
    pub(crate) token_start_column: u32,
    pub(crate) bom_checked: bool,
    prev_kind: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, handler: &'a mut Handler) -> Self {
        Self::with_file(source, FileId::DUMMY, handler)
    }

    pub fn with_file(source: &'a str, file: FileId, handler: &'a mut Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            file,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            bom_checked: false,
            prev_kind: None,
        }
    }

    /// Returns the next token, or a `TokenKind::Eof` token once the source
    /// is exhausted. Subsequent calls after `Eof` keep returning `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::new(TokenKind::Eof, "", self.make_span());
        }

        let tok = self.dispatch();
        self.prev_kind = Some(tok.kind);
        tok
    }

    fn dispatch(&mut self) -> Token {
        let c = self.cursor.current_char();
        let simple = |kind: TokenKind, lexer: &mut Self| {
            lexer.cursor.advance();
            let span = lexer.make_span();
            Token::new(kind, lexer.cursor.slice_from(lexer.token_start), span)
        };

        match c {
            '(' => simple(TokenKind::LParen, self),
            ')' => simple(TokenKind::RParen, self),
            '{' => simple(TokenKind::LBrace, self),
            '}' => simple(TokenKind::RBrace, self),
            '[' => simple(TokenKind::LBracket, self),
            ']' => simple(TokenKind::RBracket, self),
            ',' => simple(TokenKind::Comma, self),
            ';' => simple(TokenKind::Semicolon, self),
            '^' => simple(TokenKind::Caret, self),
            '~' => simple(TokenKind::Tilde, self),
            '"' => self.lex_string(),
            '\'' => self.lex_byte(),
            c if c.is_ascii_digit() => self.lex_number(false),
            c if is_ident_start(c) => self.lex_identifier(),
            '-' => self.lex_minus(),
            '+' => simple(TokenKind::Plus, self),
            '*' => simple(TokenKind::Star, self),
            '/' => simple(TokenKind::Slash, self),
            '%' => simple(TokenKind::Percent, self),
            '=' => self.lex_eq(),
            '!' => self.lex_bang(),
            '<' => self.lex_lt(),
            '>' => self.lex_gt(),
            '&' => self.lex_amp(),
            '|' => self.lex_pipe(),
            ':' => self.lex_colon(),
            '.' => simple(TokenKind::Dot, self),
            c => {
                self.cursor.advance();
                let span = self.make_span();
                self.report_error(LEX_UNKNOWN_CHARACTER, format!("unexpected character '{c}'"));
                Token::new(TokenKind::Invalid, self.cursor.slice_from(self.token_start), span)
            }
        }
    }

    /// `-` is absorbed into the following integer literal unless the
    /// previous token could already end an expression, in which case it is
    /// binary subtraction.
    fn lex_minus(&mut self) -> Token {
        if self.cursor.peek_char(1).is_ascii_digit()
            && !self.prev_kind.is_some_and(ends_expression)
        {
            self.cursor.advance(); // consume '-'
            return self.lex_number(true);
        }
        if self.cursor.peek_char(1) == '>' {
            self.cursor.advance();
            self.cursor.advance();
            let span = self.make_span();
            return Token::new(TokenKind::Arrow, self.cursor.slice_from(self.token_start), span);
        }
        self.cursor.advance();
        let span = self.make_span();
        Token::new(TokenKind::Minus, self.cursor.slice_from(self.token_start), span)
    }

    fn lex_eq(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            let span = self.make_span();
            return Token::new(TokenKind::EqEq, self.cursor.slice_from(self.token_start), span);
        }
        if self.cursor.match_char('>') {
            let span = self.make_span();
            return Token::new(TokenKind::FatArrow, self.cursor.slice_from(self.token_start), span);
        }
        let span = self.make_span();
        Token::new(TokenKind::Eq, self.cursor.slice_from(self.token_start), span)
    }

    fn lex_bang(&mut self) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.match_char('=') {
            TokenKind::NotEq
        } else {
            TokenKind::Bang
        };
        let span = self.make_span();
        Token::new(kind, self.cursor.slice_from(self.token_start), span)
    }

    fn lex_lt(&mut self) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.match_char('=') {
            TokenKind::LtEq
        } else if self.cursor.match_char('<') {
            TokenKind::Shl
        } else {
            TokenKind::Lt
        };
        let span = self.make_span();
        Token::new(kind, self.cursor.slice_from(self.token_start), span)
    }

    fn lex_gt(&mut self) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.match_char('=') {
            TokenKind::GtEq
        } else if self.cursor.match_char('>') {
            TokenKind::Shr
        } else {
            TokenKind::Gt
        };
        let span = self.make_span();
        Token::new(kind, self.cursor.slice_from(self.token_start), span)
    }

    fn lex_amp(&mut self) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.match_char('&') {
            TokenKind::AndAnd
        } else {
            TokenKind::Amp
        };
        let span = self.make_span();
        Token::new(kind, self.cursor.slice_from(self.token_start), span)
    }

    fn lex_pipe(&mut self) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.match_char('|') {
            TokenKind::OrOr
        } else {
            TokenKind::Pipe
        };
        let span = self.make_span();
        Token::new(kind, self.cursor.slice_from(self.token_start), span)
    }

    fn lex_colon(&mut self) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.match_char(':') {
            TokenKind::ColonColon
        } else {
            TokenKind::Colon
        };
        let span = self.make_span();
        Token::new(kind, self.cursor.slice_from(self.token_start), span)
    }

    pub fn report_error(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        let span = self.make_span();
        DiagnosticBuilder::error(code, message)
            .span(span)
            .emit(self.handler);
    }

    pub fn line(&self) -> u32 {
        self.cursor.line()
    }

    pub fn column(&self) -> u32 {
        self.cursor.column()
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(src, &mut handler);
        lexer.by_ref().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_punctuation() {
        assert_eq!(
            kinds("(){}[],;"),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Comma,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn arrow_and_fat_arrow_distinguished_from_minus_and_eq() {
        assert_eq!(kinds("->"), vec![TokenKind::Arrow]);
        assert_eq!(kinds("=>"), vec![TokenKind::FatArrow]);
        assert_eq!(kinds("= ="), vec![TokenKind::Eq, TokenKind::Eq]);
    }

    #[test]
    fn leading_minus_absorbed_into_literal_at_start_of_file() {
        assert_eq!(kinds("-42"), vec![TokenKind::IntLiteral]);
    }

    #[test]
    fn minus_after_identifier_is_binary_subtraction() {
        assert_eq!(
            kinds("x-42"),
            vec![TokenKind::Identifier, TokenKind::Minus, TokenKind::IntLiteral]
        );
    }

    #[test]
    fn minus_after_open_paren_is_absorbed() {
        assert_eq!(
            kinds("(-1)"),
            vec![TokenKind::LParen, TokenKind::IntLiteral, TokenKind::RParen]
        );
    }

    #[test]
    fn reserved_punctuation_tokens_still_lex() {
        assert_eq!(
            kinds("& | ^ ~ << >>"),
            vec![
                TokenKind::Amp,
                TokenKind::Pipe,
                TokenKind::Caret,
                TokenKind::Tilde,
                TokenKind::Shl,
                TokenKind::Shr,
            ]
        );
    }

    #[test]
    fn double_ampersand_is_logical_and_not_two_reserved_amps() {
        assert_eq!(kinds("&&"), vec![TokenKind::AndAnd]);
    }
}
