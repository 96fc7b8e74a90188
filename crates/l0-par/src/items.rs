//! Top-level declaration parsing: `func`, `struct`, `enum`, `type`, and
//! top-level `let` (spec.md §3 "AST", §4.2 "Parser").

use crate::error::*;
use crate::{
    Decl, EnumDecl, EnumVariant, FieldDecl, FuncDecl, LetDecl, Param, Parser, StructDecl,
    TypeAliasDecl,
};
use l0_lex::{is_reserved_identifier, TokenKind};

impl<'a> Parser<'a> {
    pub fn parse_decl(&mut self) -> Option<Decl> {
        match self.current_kind() {
            TokenKind::KwExtern | TokenKind::KwFunc => self.parse_func_decl().map(Decl::Func),
            TokenKind::KwStruct => self.parse_struct_decl().map(Decl::Struct),
            TokenKind::KwEnum => self.parse_enum_decl().map(Decl::Enum),
            TokenKind::KwType => self.parse_type_alias_decl().map(Decl::TypeAlias),
            TokenKind::KwLet => self.parse_top_level_let().map(Decl::Let),
            _ => {
                self.error_here(
                    PAR_EXPECTED_ITEM,
                    format!("expected a top-level declaration, found '{}'", self.current().text),
                );
                None
            }
        }
    }

    fn parse_func_decl(&mut self) -> Option<FuncDecl> {
        let start = self.current_span();
        let is_extern = self.eat(TokenKind::KwExtern);
        self.expect(TokenKind::KwFunc, PAR_EXPECTED_ITEM, "'func'")?;
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_FN_NAME, "a function name")?;
        let name = self.intern(&name_tok.text);

        self.expect(TokenKind::LParen, PAR_EXPECTED_PARAM_LPAREN, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, PAR_EXPECTED_PARAM_RPAREN, "')' after parameter list")?;

        let ret_type = if self.eat(TokenKind::Arrow) { Some(self.parse_type()?) } else { None };

        let body = if is_extern {
            self.expect(TokenKind::Semicolon, PAR_EXPECTED_FN_BODY_OR_SEMI, "';' after extern function signature")?;
            None
        } else {
            Some(self.parse_block()?)
        };

        let span = self.span_from(start);
        Some(FuncDecl { name, params, ret_type, body, is_extern, span })
    }

    fn parse_param(&mut self) -> Option<Param> {
        let start = self.current_span();
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_PARAM_NAME, "a parameter name")?;
        if is_reserved_identifier(&name_tok.text) {
            self.error_here(
                PAR_RESERVED_PARAM_NAME,
                format!("'{}' is a reserved type name and cannot be used as a parameter name", name_tok.text),
            );
            return None;
        }
        let name = self.intern(&name_tok.text);
        self.expect(TokenKind::Colon, PAR_EXPECTED_PARAM_COLON, "':' after parameter name")?;
        let ty = self.parse_type()?;
        Some(Param { name, ty, span: self.span_from(start) })
    }

    fn parse_struct_decl(&mut self) -> Option<StructDecl> {
        let start = self.current_span();
        self.advance(); // 'struct'
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_ITEM, "a struct name")?;
        let name = self.intern(&name_tok.text);
        self.expect(TokenKind::LBrace, PAR_EXPECTED_BLOCK_LBRACE, "'{' to open struct body")?;

        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            fields.push(self.parse_field_decl()?);
        }
        if fields.is_empty() {
            self.error_here(PAR_EMPTY_STRUCT, format!("struct '{}' must declare at least one field", name_tok.text));
            return None;
        }
        self.expect(TokenKind::RBrace, PAR_EXPECTED_BLOCK_RBRACE, "'}' to close struct body")?;

        Some(StructDecl { name, fields, span: self.span_from(start) })
    }

    fn parse_field_decl(&mut self) -> Option<FieldDecl> {
        let start = self.current_span();
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_ITEM, "a field name")?;
        let name = self.intern(&name_tok.text);
        self.expect(TokenKind::Colon, PAR_EXPECTED_PARAM_COLON, "':' after field name")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_FIELD_SEMI, "';' after field declaration")?;
        Some(FieldDecl { name, ty, span: self.span_from(start) })
    }

    fn parse_enum_decl(&mut self) -> Option<EnumDecl> {
        let start = self.current_span();
        self.advance(); // 'enum'
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_ITEM, "an enum name")?;
        let name = self.intern(&name_tok.text);
        self.expect(TokenKind::LBrace, PAR_EXPECTED_BLOCK_LBRACE, "'{' to open enum body")?;

        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            variants.push(self.parse_enum_variant()?);
        }
        if variants.is_empty() {
            self.error_here(PAR_EMPTY_ENUM, format!("enum '{}' must declare at least one variant", name_tok.text));
            return None;
        }
        self.expect(TokenKind::RBrace, PAR_EXPECTED_BLOCK_RBRACE, "'}' to close enum body")?;

        Some(EnumDecl { name, variants, span: self.span_from(start) })
    }

    fn parse_enum_variant(&mut self) -> Option<EnumVariant> {
        let start = self.current_span();
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_VARIANT_NAME, "a variant name")?;
        let name = self.intern(&name_tok.text);
        self.expect(TokenKind::LParen, PAR_EXPECTED_PARAM_LPAREN, "'(' after variant name")?;
        let mut fields = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                fields.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, PAR_EXPECTED_PARAM_RPAREN, "')' after variant field list")?;
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_FIELD_SEMI, "';' after variant declaration")?;
        Some(EnumVariant { name, fields, span: self.span_from(start) })
    }

    fn parse_type_alias_decl(&mut self) -> Option<TypeAliasDecl> {
        let start = self.current_span();
        self.advance(); // 'type'
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_ITEM, "a type alias name")?;
        let name = self.intern(&name_tok.text);
        self.expect(TokenKind::Eq, PAR_EXPECTED_ALIAS_EQ, "'=' after type alias name")?;
        let target = self.parse_type()?;
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_FIELD_SEMI, "';' after type alias")?;
        Some(TypeAliasDecl { name, target, span: self.span_from(start) })
    }

    fn parse_top_level_let(&mut self) -> Option<LetDecl> {
        let start = self.current_span();
        self.advance(); // 'let'
        let name_tok = self.expect(TokenKind::Identifier, PAR_EXPECTED_LET_NAME, "a name after 'let'")?;
        if is_reserved_identifier(&name_tok.text) {
            self.error_here(
                PAR_RESERVED_LET_NAME,
                format!("'{}' is a reserved type name and cannot be used as a let name", name_tok.text),
            );
            return None;
        }
        let name = self.intern(&name_tok.text);
        let ty = if self.eat(TokenKind::Colon) { Some(self.parse_type()?) } else { None };
        self.expect(TokenKind::Eq, PAR_EXPECTED_LET_INIT, "'=' in let declaration")?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_STMT_SEMI, "';' after let declaration")?;
        Some(LetDecl { name, ty, init, span: self.span_from(start) })
    }
}
