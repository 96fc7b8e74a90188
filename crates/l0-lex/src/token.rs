//! Token kinds produced by the lexer (spec.md §3 "Tokens", §4.1 "Lexer").

use l0_util::{Span, Symbol};

/// The tag of a [`Token`]. Reserved-but-unused operators (`&`, `|`, `^`,
/// `~`, `<<`, `>>`) get their own kinds so the parser can reject them with
/// a stable `PAR-0226` rather than failing earlier with an unknown-token
/// lex error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    IntLiteral,
    ByteLiteral,
    StringLiteral,
    BoolLiteral,
    Identifier,

    // Keywords
    KwModule,
    KwImport,
    KwFunc,
    KwExtern,
    KwStruct,
    KwEnum,
    KwType,
    KwLet,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwReturn,
    KwMatch,
    KwCase,
    KwWith,
    KwCleanup,
    KwDrop,
    KwBreak,
    KwContinue,
    KwNew,
    KwNull,
    KwSizeof,
    KwOrd,
    KwAs,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    ColonColon,
    Dot,
    Arrow,     // ->
    FatArrow,  // =>
    Question,  // ?
    Star,      // * (multiply / deref / pointer suffix, disambiguated by parser)
    Slash,
    Percent,
    Plus,
    Minus,
    Bang,
    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,

    // Reserved-but-unused (spec.md §4.1): emitted as distinct kinds so the
    // parser rejects them with PAR-0226 instead of the lexer failing.
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,

    Eof,
    /// A character the lexer could not classify; carries no further payload
    /// since the diagnostic is emitted at the point of encounter.
    Invalid,
}

/// One lexical token: its kind, the verbatim source text it was lexed from,
/// and its span. String literal text is preserved verbatim (escape decoding
/// is a separate, on-demand concern per spec.md §4.1).
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Intern the token's identifier text as a [`Symbol`]. Only meaningful when
/// `kind == Identifier`.
pub fn intern_ident(token: &Token, interner: &mut l0_util::Interner) -> Symbol {
    interner.intern(&token.text)
}

/// Keyword lookup table, consulted after an identifier-shaped run of
/// characters has been scanned.
pub fn lookup_keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "module" => TokenKind::KwModule,
        "import" => TokenKind::KwImport,
        "func" => TokenKind::KwFunc,
        "extern" => TokenKind::KwExtern,
        "struct" => TokenKind::KwStruct,
        "enum" => TokenKind::KwEnum,
        "type" => TokenKind::KwType,
        "let" => TokenKind::KwLet,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "for" => TokenKind::KwFor,
        "return" => TokenKind::KwReturn,
        "match" => TokenKind::KwMatch,
        "case" => TokenKind::KwCase,
        "with" => TokenKind::KwWith,
        "cleanup" => TokenKind::KwCleanup,
        "drop" => TokenKind::KwDrop,
        "break" => TokenKind::KwBreak,
        "continue" => TokenKind::KwContinue,
        "new" => TokenKind::KwNew,
        "null" => TokenKind::KwNull,
        "sizeof" => TokenKind::KwSizeof,
        "ord" => TokenKind::KwOrd,
        "as" => TokenKind::KwAs,
        "true" | "false" => TokenKind::BoolLiteral,
        _ => return None,
    })
}

/// Identifiers reserved as type/keyword names that cannot be used as
/// let/parameter names (spec.md §4.2, PAR-0010/11).
pub const RESERVED_IDENTIFIERS: &[&str] = &["int", "byte", "bool", "string", "void"];

pub fn is_reserved_identifier(text: &str) -> bool {
    RESERVED_IDENTIFIERS.contains(&text)
}
