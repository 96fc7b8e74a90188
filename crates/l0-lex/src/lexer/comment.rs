//! Comment and whitespace skipping.

use crate::error::LEX_UNTERMINATED_BLOCK_COMMENT;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Skips all whitespace and comments preceding the next token. Comments
    /// do not nest; `/* /* */` closes at the first `*/`.
    pub fn skip_trivia(&mut self) {
        if !self.bom_checked {
            self.bom_checked = true;
            if self.cursor.remaining().starts_with('\u{FEFF}') {
                self.cursor.advance();
            }
        }

        loop {
            if self.cursor.is_at_end() {
                return;
            }
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' | '\n' => self.cursor.advance(),
                '/' if self.cursor.peek_char(1) == '/' => self.skip_line_comment(),
                '/' if self.cursor.peek_char(1) == '*' => self.skip_block_comment(),
                _ => return,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.cursor.advance();
        self.cursor.advance();
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.cursor.advance();
        self.cursor.advance();
        loop {
            if self.cursor.is_at_end() {
                self.report_error(LEX_UNTERMINATED_BLOCK_COMMENT, "unterminated block comment");
                return;
            }
            if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                self.cursor.advance();
                self.cursor.advance();
                return;
            }
            self.cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Lexer, TokenKind};
    use l0_util::Handler;

    #[test]
    fn skips_line_comment() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("// hi\nx", &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "x");
    }

    #[test]
    fn skips_block_comment() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("/* c */x", &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Identifier);
    }

    #[test]
    fn unterminated_block_comment_reports_lex_0070() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("/* never closed", &mut handler);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Eof);
        assert!(handler.has_errors());
        assert!(handler.diagnostics()[0].message.contains("LEX-0070"));
    }
}
