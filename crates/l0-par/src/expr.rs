//! Expression parsing (spec.md §4.2): precedence climbing, tightest to
//! loosest: postfix (call, index, field, cast, try) > unary (`-`, `!`,
//! `*`-deref) > `*` `/` `%` > `+` `-` > comparisons > equality > `&&` >
//! `||`.

use crate::error::*;
use crate::{
    BinOp, BinaryExpr, CallExpr, CastExpr, Expr, FieldExpr, IndexExpr, Literal, NewExpr, Parser,
    SizeOfArg, UnOp, UnaryExpr,
};
use l0_lex::TokenKind;

/// Binding powers, loosest to tightest. Every binary operator here is
/// left-associative, so the right-hand recursive call always uses `bp + 1`.
mod bp {
    pub const OR: u8 = 2;
    pub const AND: u8 = 4;
    pub const EQUALITY: u8 = 6;
    pub const COMPARISON: u8 = 8;
    pub const ADDITIVE: u8 = 10;
    pub const MULTIPLICATIVE: u8 = 12;
}

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_expr_bp(0)
    }

    fn infix_binop(&self) -> Option<(BinOp, u8)> {
        Some(match self.current_kind() {
            TokenKind::OrOr => (BinOp::Or, bp::OR),
            TokenKind::AndAnd => (BinOp::And, bp::AND),
            TokenKind::EqEq => (BinOp::Eq, bp::EQUALITY),
            TokenKind::NotEq => (BinOp::NotEq, bp::EQUALITY),
            TokenKind::Lt => (BinOp::Lt, bp::COMPARISON),
            TokenKind::LtEq => (BinOp::LtEq, bp::COMPARISON),
            TokenKind::Gt => (BinOp::Gt, bp::COMPARISON),
            TokenKind::GtEq => (BinOp::GtEq, bp::COMPARISON),
            TokenKind::Plus => (BinOp::Add, bp::ADDITIVE),
            TokenKind::Minus => (BinOp::Sub, bp::ADDITIVE),
            TokenKind::Star => (BinOp::Mul, bp::MULTIPLICATIVE),
            TokenKind::Slash => (BinOp::Div, bp::MULTIPLICATIVE),
            TokenKind::Percent => (BinOp::Mod, bp::MULTIPLICATIVE),
            TokenKind::Amp
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::Shl
            | TokenKind::Shr => return None,
            _ => return None,
        })
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            if matches!(
                self.current_kind(),
                TokenKind::Amp | TokenKind::Pipe | TokenKind::Caret | TokenKind::Shl | TokenKind::Shr
            ) {
                self.error_here(
                    PAR_RESERVED_PUNCTUATION,
                    "bitwise/shift operators are reserved and not usable in expressions",
                );
                return None;
            }
            let Some((op, lbp)) = self.infix_binop() else { break };
            if lbp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr_bp(lbp + 1)?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary(BinaryExpr { op, left: Box::new(lhs), right: Box::new(rhs), span });
        }

        Some(lhs)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.current_kind() {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Bang => Some(UnOp::Not),
            TokenKind::Star => Some(UnOp::Deref),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.to(operand.span());
            return Some(Expr::Unary(UnaryExpr { op, operand: Box::new(operand), span }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_kind() {
                TokenKind::LParen => {
                    let start = expr.span();
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.expect(TokenKind::RParen, PAR_EXPECTED_CALL_RPAREN, "')' after call arguments")?;
                    expr = Expr::Call(CallExpr { callee: Box::new(expr), args, span: start.to(end.span) });
                }
                TokenKind::LBracket => {
                    let start = expr.span();
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.expect(TokenKind::RBracket, PAR_UNEXPECTED_TOKEN, "']' after index expression")?;
                    expr = Expr::Index(IndexExpr { object: Box::new(expr), index: Box::new(index), span: start.to(end.span) });
                }
                TokenKind::Dot => {
                    let start = expr.span();
                    self.advance();
                    let field = self.expect(TokenKind::Identifier, PAR_EXPECTED_FIELD_NAME, "a field name after '.'")?;
                    let name = self.intern(&field.text);
                    expr = Expr::Field(FieldExpr { object: Box::new(expr), field: name, span: start.to(field.span) });
                }
                TokenKind::KwAs => {
                    let start = expr.span();
                    self.advance();
                    let target = self.parse_type()?;
                    let span = start.to(target.span());
                    expr = Expr::Cast(CastExpr { expr: Box::new(expr), target, span });
                }
                TokenKind::Question => {
                    let span = expr.span().to(self.current_span());
                    self.advance();
                    expr = Expr::Try(Box::new(expr), span);
                }
                _ => break,
            }
        }

        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.current_kind() {
            TokenKind::IntLiteral => {
                let tok = self.advance();
                let value: i32 = tok.text.parse().unwrap_or(0);
                Some(Expr::Literal(Literal::Int(value), tok.span))
            }
            TokenKind::ByteLiteral => {
                let tok = self.advance();
                let decoded = l0_lex::decode_string_escapes(&tok.text, tok.span, self.handler);
                let byte = decoded.as_bytes().first().copied().unwrap_or(0);
                Some(Expr::Literal(Literal::Byte(byte), tok.span))
            }
            TokenKind::BoolLiteral => {
                let tok = self.advance();
                Some(Expr::Literal(Literal::Bool(tok.text == "true"), tok.span))
            }
            TokenKind::StringLiteral => {
                let tok = self.advance();
                Some(Expr::Literal(Literal::String(tok.text.clone()), tok.span))
            }
            TokenKind::KwNull => {
                let tok = self.advance();
                Some(Expr::Literal(Literal::Null, tok.span))
            }
            TokenKind::Identifier => self.parse_var_ref_or_path(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let end = self.expect(TokenKind::RParen, PAR_EXPECTED_RPAREN_AFTER_EXPR, "')' after expression")?;
                Some(Expr::Paren(Box::new(inner), start.to(end.span)))
            }
            TokenKind::KwNew => self.parse_new(),
            TokenKind::KwSizeof => self.parse_sizeof(),
            TokenKind::KwOrd => self.parse_ord(),
            _ => {
                self.error_here(PAR_EXPECTED_PRIMARY_EXPR, format!("expected an expression, found '{}'", self.current().text));
                None
            }
        }
    }

    /// `name` or `module::name`; a path nested deeper than one qualifying
    /// segment is rejected immediately (spec.md §4.7 TYP-0158 forbids it
    /// everywhere, so the parser never constructs the deeper shape).
    fn parse_var_ref_or_path(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let first = self.advance();
        let mut module = None;
        let mut name = self.intern(&first.text);

        if self.eat(TokenKind::ColonColon) {
            let second = self.expect(TokenKind::Identifier, PAR_OVERQUALIFIED_PATH, "an identifier after '::'")?;
            if self.check(TokenKind::ColonColon) {
                self.error_here(PAR_OVERQUALIFIED_PATH, "module-qualified names may have at most one '::' segment");
                return None;
            }
            module = Some(name);
            name = self.intern(&second.text);
        }

        Some(Expr::VarRef { module, name, span: self.span_from(start) })
    }

    fn parse_new(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // 'new'
        let target = self.parse_type()?;
        self.expect(TokenKind::LParen, PAR_EXPECTED_NEW_TYPE, "'(' after type in 'new' expression")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.expect(TokenKind::RParen, PAR_EXPECTED_NEW_RPAREN, "')' after 'new' arguments")?;
        Some(Expr::New(NewExpr { target, args, span: start.to(end.span) }))
    }

    fn parse_sizeof(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // 'sizeof'
        self.expect(TokenKind::LParen, PAR_EXPECTED_INTRINSIC_LPAREN, "'(' after 'sizeof'")?;
        let arg = if self.is_bare_type_start() {
            SizeOfArg::Type(self.parse_type()?)
        } else {
            SizeOfArg::Expr(self.parse_expr()?)
        };
        let end = self.expect(TokenKind::RParen, PAR_EXPECTED_SIZEOF_RPAREN, "')' after 'sizeof' argument")?;
        Some(Expr::SizeOf(Box::new(arg), start.to(end.span)))
    }

    fn parse_ord(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // 'ord'
        self.expect(TokenKind::LParen, PAR_EXPECTED_INTRINSIC_LPAREN, "'(' after 'ord'")?;
        let arg = self.parse_expr()?;
        let end = self.expect(TokenKind::RParen, PAR_EXPECTED_ORD_RPAREN, "')' after 'ord' argument")?;
        Some(Expr::Ord(Box::new(arg), start.to(end.span)))
    }

    /// A single bare identifier immediately followed by `)` is ambiguous
    /// between a type name and a nullary expression; `sizeof` resolves it
    /// in favor of the type reading only in that exact shape (spec.md
    /// §4.7: "a plain type name identifier"). Anything else — including a
    /// name followed by `*`/`?`/`::` — is also read as a type, since those
    /// suffixes only make sense on a type.
    fn is_bare_type_start(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Identifier)
            && matches!(
                self.peek_kind(1),
                TokenKind::RParen | TokenKind::Star | TokenKind::Question | TokenKind::ColonColon
            )
    }
}
