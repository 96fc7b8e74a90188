//! Statement parsing (spec.md §3 "AST", §4.2 "Parser"): blocks, `let`,
//! assignment, expression statements, `if/else`, `while`, `for`, `return`,
//! `match`, `case`, `with`, `drop`, `break`, `continue`.

use crate::error::*;
use crate::{
    AssignStmt, Block, CaseArm, CaseStmt, DropStmt, ElseBranch, ForStmt, IfStmt, Literal,
    LocalLet, MatchArm, MatchPattern, MatchStmt, Parser, ReturnStmt, Stmt, WhileStmt, WithItem,
    WithStmt,
};
use l0_lex::TokenKind;

impl<'a> Parser<'a> {
    pub fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(TokenKind::LBrace, PAR_EXPECTED_BLOCK_LBRACE, "'{' to open a block")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace, PAR_EXPECTED_BLOCK_RBRACE, "'}' to close a block")?;
        Some(Block { stmts, span: self.span_from(start) })
    }

    pub fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.current_kind() {
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            TokenKind::KwLet => self.parse_local_let(true).map(Stmt::Let),
            TokenKind::KwIf => self.parse_if().map(Stmt::If),
            TokenKind::KwWhile => self.parse_while().map(Stmt::While),
            TokenKind::KwFor => self.parse_for().map(Stmt::For),
            TokenKind::KwReturn => self.parse_return().map(Stmt::Return),
            TokenKind::KwMatch => self.parse_match().map(Stmt::Match),
            TokenKind::KwCase => self.parse_case().map(Stmt::Case),
            TokenKind::KwWith => self.parse_with().map(Stmt::With),
            TokenKind::KwDrop => self.parse_drop().map(Stmt::Drop),
            TokenKind::KwBreak => {
                let span = self.current_span();
                self.advance();
                self.expect(TokenKind::Semicolon, PAR_EXPECTED_BREAK_SEMI, "';' after 'break'")?;
                Some(Stmt::Break(span))
            }
            TokenKind::KwContinue => {
                let span = self.current_span();
                self.advance();
                self.expect(TokenKind::Semicolon, PAR_EXPECTED_CONTINUE_SEMI, "';' after 'continue'")?;
                Some(Stmt::Continue(span))
            }
            _ => self.parse_assign_or_expr_stmt(true),
        }
    }

    /// `let name[: Type] = expr`. When `consume_semi` is false (the `for`
    /// loop's init clause), the caller consumes the trailing `;` itself.
    fn parse_local_let(&mut self, consume_semi: bool) -> Option<LocalLet> {
        let start = self.current_span();
        self.advance(); // 'let'
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_LET_NAME, "a name after 'let'")?;
        let name = self.intern(&name_tok.text);
        let ty = if self.eat(TokenKind::Colon) { Some(self.parse_type()?) } else { None };
        self.expect(TokenKind::Eq, PAR_EXPECTED_LET_INIT, "'=' in let statement")?;
        let init = self.parse_expr()?;
        if consume_semi {
            self.expect(TokenKind::Semicolon, PAR_EXPECTED_STMT_SEMI, "';' after let statement")?;
        }
        Some(LocalLet { name, ty, init, span: self.span_from(start) })
    }

    /// Parses an expression, then disambiguates assignment (`target =
    /// value;`) from a plain expression statement by looking one token
    /// past the expression for `=`.
    fn parse_assign_or_expr_stmt(&mut self, consume_semi: bool) -> Option<Stmt> {
        let start = self.current_span();
        let expr = self.parse_expr()?;
        if self.eat(TokenKind::Eq) {
            let value = self.parse_expr()?;
            if consume_semi {
                self.expect(TokenKind::Semicolon, PAR_EXPECTED_STMT_SEMI, "';' after assignment")?;
            }
            return Some(Stmt::Assign(AssignStmt { target: expr, value, span: self.span_from(start) }));
        }
        if consume_semi {
            self.expect(TokenKind::Semicolon, PAR_EXPECTED_EXPR_STMT_SEMI, "';' after expression statement")?;
        }
        Some(Stmt::Expr(expr))
    }

    fn parse_if(&mut self) -> Option<IfStmt> {
        let start = self.current_span();
        self.advance(); // 'if'
        self.expect(TokenKind::LParen, PAR_EXPECTED_IF_LPAREN, "'(' after 'if'")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, PAR_EXPECTED_IF_RPAREN, "')' after if condition")?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(TokenKind::KwElse) {
            if self.check(TokenKind::KwIf) {
                Some(ElseBranch::If(Box::new(self.parse_if()?)))
            } else {
                Some(ElseBranch::Block(self.parse_block()?))
            }
        } else {
            None
        };
        Some(IfStmt { cond, then_block, else_block, span: self.span_from(start) })
    }

    fn parse_while(&mut self) -> Option<WhileStmt> {
        let start = self.current_span();
        self.advance(); // 'while'
        self.expect(TokenKind::LParen, PAR_EXPECTED_WHILE_LPAREN, "'(' after 'while'")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, PAR_EXPECTED_WHILE_RPAREN, "')' after while condition")?;
        let body = self.parse_block()?;
        Some(WhileStmt { cond, body, span: self.span_from(start) })
    }

    fn parse_for(&mut self) -> Option<ForStmt> {
        let start = self.current_span();
        self.advance(); // 'for'
        self.expect(TokenKind::LParen, PAR_EXPECTED_FOR_LPAREN, "'(' after 'for'")?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else if self.check(TokenKind::KwLet) {
            Some(Box::new(Stmt::Let(self.parse_local_let(false)?)))
        } else {
            Some(Box::new(self.parse_assign_or_expr_stmt(false)?))
        };
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_FOR_SEMI, "';' after for-loop init clause")?;

        let cond = if self.check(TokenKind::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_FOR_SEMI, "';' after for-loop condition")?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_assign_or_expr_stmt(false)?))
        };
        self.expect(TokenKind::RParen, PAR_EXPECTED_FOR_RPAREN, "')' after for-loop clauses")?;

        let body = self.parse_block()?;
        Some(ForStmt { init, cond, update, body, span: self.span_from(start) })
    }

    fn parse_return(&mut self) -> Option<ReturnStmt> {
        let start = self.current_span();
        self.advance(); // 'return'
        let value = if self.check(TokenKind::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_RETURN_SEMI, "';' after return statement")?;
        Some(ReturnStmt { value, span: self.span_from(start) })
    }

    fn parse_match(&mut self) -> Option<MatchStmt> {
        let start = self.current_span();
        self.advance(); // 'match'
        self.expect(TokenKind::LParen, PAR_EXPECTED_MATCH_LPAREN, "'(' after 'match'")?;
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::RParen, PAR_EXPECTED_MATCH_RPAREN, "')' after match scrutinee")?;
        self.expect(TokenKind::LBrace, PAR_EXPECTED_BLOCK_LBRACE, "'{' to open match body")?;

        let mut arms = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            arms.push(self.parse_match_arm()?);
        }
        if arms.is_empty() {
            self.error_here(PAR_EMPTY_MATCH, "'match' must have at least one arm");
            return None;
        }
        self.expect(TokenKind::RBrace, PAR_EXPECTED_BLOCK_RBRACE, "'}' to close match body")?;
        Some(MatchStmt { scrutinee, arms, span: self.span_from(start) })
    }

    fn parse_match_arm(&mut self) -> Option<MatchArm> {
        let start = self.current_span();
        let pattern = if self.eat(TokenKind::KwElse) {
            MatchPattern::Wildcard(self.span_from(start))
        } else {
            let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_MATCH_ARM_BODY, "a variant name or 'else'")?;
            let name = self.intern(&name_tok.text);
            self.expect(TokenKind::LParen, PAR_EXPECTED_PARAM_LPAREN, "'(' after variant pattern name")?;
            let mut bindings = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    let binding = self.expect(TokenKind::Identifier, PAR_EXPECTED_MATCH_ARM_BODY, "a binding name")?;
                    bindings.push(self.intern(&binding.text));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, PAR_EXPECTED_PARAM_RPAREN, "')' after variant pattern bindings")?;
            MatchPattern::Variant { name, bindings, span: self.span_from(start) }
        };
        self.expect(TokenKind::FatArrow, PAR_EXPECTED_MATCH_FATARROW, "'=>' after match pattern")?;
        let body = self.parse_block()?;
        Some(MatchArm { pattern, body, span: self.span_from(start) })
    }

    fn parse_case(&mut self) -> Option<CaseStmt> {
        let start = self.current_span();
        self.advance(); // 'case'
        self.expect(TokenKind::LParen, PAR_EXPECTED_CASE_LPAREN, "'(' after 'case'")?;
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::RParen, PAR_EXPECTED_CASE_RPAREN, "')' after case scrutinee")?;
        self.expect(TokenKind::LBrace, PAR_EXPECTED_BLOCK_LBRACE, "'{' to open case body")?;

        let mut arms = Vec::new();
        let mut else_arm = None;
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.check(TokenKind::KwElse) {
                self.advance();
                self.expect(TokenKind::FatArrow, PAR_EXPECTED_MATCH_FATARROW, "'=>' after 'else'")?;
                else_arm = Some(self.parse_block()?);
                continue;
            }
            arms.push(self.parse_case_arm()?);
        }
        self.expect(TokenKind::RBrace, PAR_EXPECTED_BLOCK_RBRACE, "'}' to close case body")?;
        Some(CaseStmt { scrutinee, arms, else_arm, span: self.span_from(start) })
    }

    fn parse_case_arm(&mut self) -> Option<CaseArm> {
        let start = self.current_span();
        let pattern = self.parse_case_literal()?;
        self.expect(TokenKind::FatArrow, PAR_EXPECTED_MATCH_FATARROW, "'=>' after case pattern")?;
        let body = self.parse_block()?;
        Some(CaseArm { pattern, body, span: self.span_from(start) })
    }

    fn parse_case_literal(&mut self) -> Option<Literal> {
        match self.current_kind() {
            TokenKind::IntLiteral => {
                let tok = self.advance();
                Some(Literal::Int(tok.text.parse().unwrap_or(0)))
            }
            TokenKind::ByteLiteral => {
                let tok = self.advance();
                let decoded = l0_lex::decode_string_escapes(&tok.text, tok.span, self.handler);
                Some(Literal::Byte(decoded.as_bytes().first().copied().unwrap_or(0)))
            }
            TokenKind::BoolLiteral => {
                let tok = self.advance();
                Some(Literal::Bool(tok.text == "true"))
            }
            TokenKind::StringLiteral => {
                let tok = self.advance();
                Some(Literal::String(tok.text.clone()))
            }
            _ => {
                self.error_here(PAR_EXPECTED_CASE_ARM, "expected a literal case pattern");
                None
            }
        }
    }

    fn parse_with(&mut self) -> Option<WithStmt> {
        let start = self.current_span();
        self.advance(); // 'with'
        self.expect(TokenKind::LParen, PAR_EXPECTED_WITH_LPAREN, "'(' after 'with'")?;
        let mut items = Vec::new();
        loop {
            items.push(self.parse_with_item()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, PAR_EXPECTED_WITH_RPAREN, "')' after with-item list")?;
        let body = self.parse_block()?;
        let cleanup = if self.eat(TokenKind::KwCleanup) { Some(self.parse_block()?) } else { None };
        Some(WithStmt { items, body, cleanup, span: self.span_from(start) })
    }

    fn parse_with_item(&mut self) -> Option<WithItem> {
        let start = self.current_span();
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_WITH_NAME, "a binding name")?;
        let name = self.intern(&name_tok.text);
        self.expect(TokenKind::Eq, PAR_EXPECTED_WITH_EQ, "'=' in with-item")?;
        let init = self.parse_expr()?;
        let cleanup = if self.eat(TokenKind::KwCleanup) { Some(self.parse_block()?) } else { None };
        Some(WithItem { name, init, cleanup, span: self.span_from(start) })
    }

    fn parse_drop(&mut self) -> Option<DropStmt> {
        let start = self.current_span();
        self.advance(); // 'drop'
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_DROP_NAME, "a local name after 'drop'")?;
        let name = self.intern(&name_tok.text);
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_STMT_SEMI, "';' after drop statement")?;
        Some(DropStmt { name, span: self.span_from(start) })
    }
}
