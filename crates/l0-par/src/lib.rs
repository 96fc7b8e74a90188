//! l0-par - Parser
//!
//! Recursive-descent, left-to-right, single-token lookahead (spec.md §4.2).
//! The token stream is fully materialized up front by the caller (lexing
//! already completed, diagnostics already flushed for lexical errors); the
//! parser only ever looks at `tokens[position]` and `tokens[position + 1]`,
//! never backtracking past a token it has consumed.
//!
//! Error recovery is intentionally shallow: on a syntax error the parser
//! reports one diagnostic and stops parsing the enclosing module (spec.md
//! §4.2's "partly error-recovering inside blocks" applies at the statement
//! level inside `items.rs`/`stmt.rs`, not here).

pub mod ast;
mod error;
mod expr;
mod items;
mod stmt;
mod types;

pub use ast::*;
pub use error::*;

use l0_lex::{Token, TokenKind};
use l0_util::{DiagnosticBuilder, Handler, Interner, Span, Symbol};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    handler: &'a mut Handler,
    interner: &'a mut Interner,
    /// Set once a fatal syntax error has been reported; every further
    /// top-level parse call returns `None` immediately.
    poisoned: bool,
}

impl<'a> Parser<'a> {
    /// `tokens` need not include a trailing `Eof` token (the lexer's
    /// `Iterator` impl stops before yielding one) — a sentinel is appended
    /// here if missing, so `current_kind()` can always answer `Eof` once
    /// the real tokens are exhausted instead of repeating the last token.
    pub fn new(mut tokens: Vec<Token>, handler: &'a mut Handler, interner: &'a mut Interner) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or(Span::DUMMY);
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        Self {
            tokens,
            position: 0,
            handler,
            interner,
            poisoned: false,
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.position + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes `kind` or reports `code` and poisons the parser.
    fn expect(&mut self, kind: TokenKind, code: l0_util::DiagnosticCode, what: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error_here(code, format!("expected {what}, found '{}'", self.current().text));
            None
        }
    }

    fn error_here(&mut self, code: l0_util::DiagnosticCode, message: impl Into<String>) {
        self.poisoned = true;
        DiagnosticBuilder::error(code, message)
            .span(self.current_span())
            .emit(self.handler);
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.tokens[self.position.saturating_sub(1).min(self.tokens.len() - 1)].span)
    }

    /// Parses one full module: header, imports, then top-level declarations.
    /// Returns `None` once the parser has been poisoned by a syntax error,
    /// per spec.md §4.2's "reports a diagnostic and stops further
    /// processing of the module".
    pub fn parse_module(&mut self, filename: Symbol) -> Option<Module> {
        let start = self.current_span();
        let name = self.parse_module_header()?;

        let mut imports = Vec::new();
        while self.check(TokenKind::KwImport) {
            imports.push(self.parse_import()?);
        }

        let mut decls = Vec::new();
        while !self.is_at_end() {
            decls.push(self.parse_decl()?);
        }

        let span = self.span_from(start);
        Some(Module { name, imports, decls, filename, span })
    }

    fn parse_module_header(&mut self) -> Option<Vec<Symbol>> {
        self.expect(TokenKind::KwModule, PAR_EXPECTED_MODULE_HEADER, "'module'")?;
        self.parse_dotted_path(PAR_EXPECTED_MODULE_HEADER)
    }

    fn parse_import(&mut self) -> Option<Import> {
        let start = self.current_span();
        self.advance(); // 'import'
        let path = self.parse_dotted_path(PAR_EXPECTED_IMPORT_PATH)?;
        self.expect(TokenKind::Semicolon, PAR_EXPECTED_IMPORT_PATH, "';' after import");
        Some(Import { path, span: self.span_from(start) })
    }

    /// `a.b.c`, used for both the module header and import statements.
    fn parse_dotted_path(&mut self, code: l0_util::DiagnosticCode) -> Option<Vec<Symbol>> {
        let mut segments = Vec::new();
        let first = self.expect(TokenKind::Identifier, code, "an identifier")?;
        segments.push(self.intern(&first.text));
        while self.eat(TokenKind::Dot) {
            let seg = self.expect(TokenKind::Identifier, code, "an identifier after '.'")?;
            segments.push(self.intern(&seg.text));
        }
        Some(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l0_lex::Lexer;

    fn parse(src: &str) -> (Option<Module>, bool) {
        let mut handler = Handler::new();
        let mut interner = Interner::new();
        let mut lexer = Lexer::new(src, &mut handler);
        let tokens: Vec<_> = lexer.by_ref().collect();
        let name = interner.intern("test");
        let mut parser = Parser::new(tokens, &mut handler, &mut interner);
        let module = parser.parse_module(name);
        (module, handler.has_errors())
    }

    #[test]
    fn parses_minimal_module() {
        let (module, had_errors) = parse("module main\nfunc main() -> int { return 0; }");
        assert!(!had_errors);
        let module = module.expect("module should parse");
        assert_eq!(module.decls.len(), 1);
        assert!(module.imports.is_empty());
    }

    #[test]
    fn parses_module_with_import() {
        let (module, had_errors) = parse("module main\nimport a.b;\nfunc main() -> int { return 0; }");
        assert!(!had_errors);
        let module = module.expect("module should parse");
        assert_eq!(module.imports.len(), 1);
    }

    #[test]
    fn missing_module_header_is_an_error() {
        let (module, had_errors) = parse("func main() -> int { return 0; }");
        assert!(had_errors);
        assert!(module.is_none());
    }

    #[test]
    fn parses_struct_enum_alias_and_toplevel_let() {
        let src = r#"
            module shapes
            struct Point { x: int; y: int; }
            enum Shape { Circle(Point, int); Empty(); }
            type Coord = int;
            let origin: Point = new Point(0, 0);
        "#;
        let (module, had_errors) = parse(src);
        assert!(!had_errors, "unexpected errors");
        let module = module.expect("module should parse");
        assert_eq!(module.decls.len(), 4);
        assert!(matches!(module.decls[0], Decl::Struct(_)));
        assert!(matches!(module.decls[1], Decl::Enum(_)));
        assert!(matches!(module.decls[2], Decl::TypeAlias(_)));
        assert!(matches!(module.decls[3], Decl::Let(_)));
    }

    #[test]
    fn parses_extern_function_without_body() {
        let src = "module io\nextern func concat_s(a: string, b: string) -> string;";
        let (module, had_errors) = parse(src);
        assert!(!had_errors);
        let module = module.expect("module should parse");
        match &module.decls[0] {
            Decl::Func(f) => {
                assert!(f.is_extern);
                assert!(f.body.is_none());
            }
            other => panic!("expected a func decl, got {other:?}"),
        }
    }

    #[test]
    fn parses_full_statement_grammar() {
        let src = r#"
            module prog
            enum C { A(); B(); }
            func f(c: C, n: int) -> int {
                let total = 0;
                if (n > 0) {
                    total = total + 1;
                } else {
                    total = total - 1;
                }
                while (n > 0) {
                    n = n - 1;
                }
                for (let i = 0; i < n; i = i + 1) {
                    total = total + i;
                }
                match (c) {
                    A() => { return 1; }
                    else => { return 0; }
                }
                case (n) {
                    0 => { return 0; }
                    else => { return total; }
                }
            }
        "#;
        let (module, had_errors) = parse(src);
        assert!(!had_errors, "unexpected errors");
        assert!(module.is_some());
    }

    #[test]
    fn parses_with_and_drop() {
        let src = r#"
            module prog
            func f(p: int*) -> int {
                with (x = p) {
                    drop x;
                } cleanup {
                    return 0;
                }
                return 1;
            }
        "#;
        let (module, had_errors) = parse(src);
        assert!(!had_errors, "unexpected errors");
        assert!(module.is_some());
    }

    #[test]
    fn operator_precedence_nests_as_expected() {
        let mut handler = Handler::new();
        let mut interner = Interner::new();
        let mut lexer = Lexer::new("1 + 2 * 3 == 7 && true", &mut handler);
        let tokens: Vec<_> = lexer.by_ref().collect();
        let mut parser = Parser::new(tokens, &mut handler, &mut interner);
        let expr = parser.parse_expr().expect("should parse");
        assert!(!handler.has_errors());
        match expr {
            ast::Expr::Binary(and_expr) => assert_eq!(and_expr.op, ast::BinOp::And),
            other => panic!("expected top-level '&&', got {other:?}"),
        }
    }

    #[test]
    fn reserved_punctuation_in_expression_is_rejected() {
        let mut handler = Handler::new();
        let mut interner = Interner::new();
        let mut lexer = Lexer::new("1 & 2", &mut handler);
        let tokens: Vec<_> = lexer.by_ref().collect();
        let mut parser = Parser::new(tokens, &mut handler, &mut interner);
        assert!(parser.parse_expr().is_none());
        assert!(handler.diagnostics()[0].message.contains("PAR-0226"));
    }

    #[test]
    fn overqualified_path_is_rejected() {
        let mut handler = Handler::new();
        let mut interner = Interner::new();
        let mut lexer = Lexer::new("a::b::c", &mut handler);
        let tokens: Vec<_> = lexer.by_ref().collect();
        let mut parser = Parser::new(tokens, &mut handler, &mut interner);
        assert!(parser.parse_expr().is_none());
        assert!(handler.diagnostics()[0].message.contains("PAR-0182"));
    }

    #[test]
    fn reserved_identifier_as_param_name_is_rejected() {
        let (module, had_errors) = parse("module m\nfunc f(int: int) -> int { return int; }");
        assert!(had_errors);
        assert!(module.is_none());
    }
}
