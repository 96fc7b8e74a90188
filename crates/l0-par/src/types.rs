//! Type expression parsing (spec.md §3 "Types"): a name, optionally
//! module-qualified, followed by any number of `*` (pointer) and `?`
//! (nullable) suffixes, e.g. `string`, `geometry::Point*`, `int*?`.
//!
//! Array/slice syntax (`T[]`) is syntactically reserved and rejected with
//! `PAR-9401` rather than silently absorbed as something else.

use crate::error::*;
use crate::{Parser, TypeExpr};
use l0_lex::TokenKind;

impl<'a> Parser<'a> {
    pub fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        let first = self.expect(TokenKind::Identifier, PAR_EXPECTED_TYPE, "a type name")?;
        let mut module = None;
        let mut name = self.intern(&first.text);

        if self.eat(TokenKind::ColonColon) {
            let second = self.expect(TokenKind::Identifier, PAR_EXPECTED_TYPE_NAME, "a type name after '::'")?;
            module = Some(name);
            name = self.intern(&second.text);
        }

        let mut ty = TypeExpr::Named { module, name, span: self.span_from(start) };

        loop {
            if self.check(TokenKind::LBracket) {
                self.error_here(PAR_ARRAY_TYPE_RESERVED, "array/slice type syntax 'T[]' is reserved");
                return None;
            }
            if self.eat(TokenKind::Star) {
                ty = TypeExpr::Pointer(Box::new(ty), self.span_from(start));
            } else if self.eat(TokenKind::Question) {
                ty = TypeExpr::Nullable(Box::new(ty), self.span_from(start));
            } else {
                break;
            }
        }

        Some(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use l0_lex::Lexer;
    use l0_util::{Handler, Interner};

    fn parse_ty(src: &str) -> Option<TypeExpr> {
        let mut handler = Handler::new();
        let mut interner = Interner::new();
        let mut lexer = Lexer::new(src, &mut handler);
        let tokens: Vec<_> = lexer.by_ref().collect();
        let mut parser = Parser::new(tokens, &mut handler, &mut interner);
        parser.parse_type()
    }

    #[test]
    fn parses_plain_name() {
        assert!(matches!(parse_ty("int"), Some(TypeExpr::Named { .. })));
    }

    #[test]
    fn parses_pointer_and_nullable_suffixes() {
        assert!(matches!(parse_ty("int*"), Some(TypeExpr::Pointer(_, _))));
        assert!(matches!(parse_ty("int?"), Some(TypeExpr::Nullable(_, _))));
        assert!(matches!(parse_ty("int*?"), Some(TypeExpr::Nullable(_, _))));
    }

    #[test]
    fn parses_qualified_name() {
        match parse_ty("geometry::Point") {
            Some(TypeExpr::Named { module: Some(_), .. }) => {}
            other => panic!("expected qualified named type, got {other:?}"),
        }
    }

    #[test]
    fn rejects_array_syntax() {
        let mut handler = Handler::new();
        let mut interner = Interner::new();
        let mut lexer = Lexer::new("int[]", &mut handler);
        let tokens: Vec<_> = lexer.by_ref().collect();
        let mut parser = Parser::new(tokens, &mut handler, &mut interner);
        assert!(parser.parse_type().is_none());
        assert!(handler.diagnostics()[0].message.contains("PAR-9401"));
    }
}
