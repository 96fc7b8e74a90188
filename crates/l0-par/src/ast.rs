//! AST node definitions (spec.md §3 "AST").
//!
//! A module is a flat list of top-level declarations plus a flat list of
//! imports; there is no nested module system (spec.md's non-goals exclude
//! one), no generics, no traits, no closures.

use l0_util::{Span, Symbol};

#[derive(Clone, Debug)]
pub struct Module {
    pub name: Vec<Symbol>,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub filename: Symbol,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Import {
    pub path: Vec<Symbol>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Decl {
    Func(FuncDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    TypeAlias(TypeAliasDecl),
    Let(LetDecl),
}

impl Decl {
    pub fn name(&self) -> Symbol {
        match self {
            Decl::Func(d) => d.name,
            Decl::Struct(d) => d.name,
            Decl::Enum(d) => d.name,
            Decl::TypeAlias(d) => d.name,
            Decl::Let(d) => d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Func(d) => d.span,
            Decl::Struct(d) => d.span,
            Decl::Enum(d) => d.span,
            Decl::TypeAlias(d) => d.span,
            Decl::Let(d) => d.span,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub ret_type: Option<TypeExpr>,
    /// `None` for `extern` declarations, which have no body and are
    /// emitted under their bare source-language name.
    pub body: Option<Block>,
    pub is_extern: bool,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct StructDecl {
    pub name: Symbol,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub name: Symbol,
    pub variants: Vec<EnumVariant>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumVariant {
    pub name: Symbol,
    /// Positional payload types, e.g. `Pair(int, int);`. Empty for a
    /// unit-like variant written `Unit();`.
    pub fields: Vec<TypeExpr>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct TypeAliasDecl {
    pub name: Symbol,
    pub target: TypeExpr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct LetDecl {
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub init: Expr,
    pub span: Span,
}

/// A type as written in source, before signature resolution maps it onto a
/// `Type` (spec.md §3's `Builtin`/`Struct`/`Enum`/`Pointer`/`Nullable`/`Func`
/// sum). `TypeExpr` only needs the syntactic shapes a programmer can write:
/// a name (optionally module-qualified), a pointer suffix `*`, and a
/// nullable suffix `?`.
#[derive(Clone, Debug)]
pub enum TypeExpr {
    /// A bare or qualified name: `int`, `string`, `geometry::Point`.
    Named { module: Option<Symbol>, name: Symbol, span: Span },
    Pointer(Box<TypeExpr>, Span),
    Nullable(Box<TypeExpr>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. } => *span,
            TypeExpr::Pointer(_, span) => *span,
            TypeExpr::Nullable(_, span) => *span,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Block(Block),
    Let(LocalLet),
    Assign(AssignStmt),
    Expr(Expr),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    Match(MatchStmt),
    Case(CaseStmt),
    With(WithStmt),
    Drop(DropStmt),
    Break(Span),
    Continue(Span),
}

#[derive(Clone, Debug)]
pub struct LocalLet {
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub init: Expr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Block,
    pub else_block: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ElseBranch {
    Block(Block),
    If(Box<IfStmt>),
}

#[derive(Clone, Debug)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub update: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct MatchStmt {
    pub scrutinee: Expr,
    pub arms: Vec<MatchArm>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct MatchArm {
    pub pattern: MatchPattern,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum MatchPattern {
    /// `VariantName(binding, binding, ...)`.
    Variant { name: Symbol, bindings: Vec<Symbol>, span: Span },
    /// `else`.
    Wildcard(Span),
}

#[derive(Clone, Debug)]
pub struct CaseStmt {
    pub scrutinee: Expr,
    pub arms: Vec<CaseArm>,
    pub else_arm: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct CaseArm {
    pub pattern: Literal,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct WithStmt {
    pub items: Vec<WithItem>,
    pub body: Block,
    pub cleanup: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct WithItem {
    pub name: Symbol,
    pub init: Expr,
    pub cleanup: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct DropStmt {
    pub name: Symbol,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Literal {
    Int(i32),
    Byte(u8),
    Bool(bool),
    /// Verbatim token text, quotes included; escape decoding is deferred
    /// to `l0_lex::decode_string_escapes` when a later pass needs the value.
    String(String),
    Null,
}

#[derive(Clone, Debug)]
pub enum Expr {
    Literal(Literal, Span),
    /// A variable or top-level name reference, optionally qualified with a
    /// module path (`module::name`). `PAR-0182` rejects any path deeper
    /// than one qualifying segment.
    VarRef { module: Option<Symbol>, name: Symbol, span: Span },
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Call(CallExpr),
    Index(IndexExpr),
    Field(FieldExpr),
    Cast(CastExpr),
    New(NewExpr),
    Try(Box<Expr>, Span),
    Paren(Box<Expr>, Span),
    /// A bare type name used as the sole argument to a type-taking
    /// intrinsic (`sizeof(int)`).
    TypeExpr(TypeExpr),
    SizeOf(Box<SizeOfArg>, Span),
    Ord(Box<Expr>, Span),
}

/// `sizeof` accepts a bare type expression, a plain type name identifier
/// (syntactically indistinguishable from a `VarRef` until signature
/// resolution), or any other expression, in which case its natural type is
/// used (spec.md §4.7 "Intrinsics").
#[derive(Clone, Debug)]
pub enum SizeOfArg {
    Type(TypeExpr),
    Expr(Expr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, s) => *s,
            Expr::VarRef { span, .. } => *span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::Field(e) => e.span,
            Expr::Cast(e) => e.span,
            Expr::New(e) => e.span,
            Expr::Try(_, s) => *s,
            Expr::Paren(_, s) => *s,
            Expr::TypeExpr(t) => t.span(),
            Expr::SizeOf(_, s) => *s,
            Expr::Ord(_, s) => *s,
        }
    }

    /// Place expressions denote existing bindings (spec.md §4.8 ARC rules):
    /// variable references, dereferences, field accesses, indexing, and
    /// parenthesized places.
    pub fn is_place(&self) -> bool {
        match self {
            Expr::VarRef { .. } | Expr::Field(_) | Expr::Index(_) => true,
            Expr::Unary(u) => matches!(u.op, UnOp::Deref),
            Expr::Paren(inner, _) => inner.is_place(),
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Deref,
}

#[derive(Clone, Debug)]
pub struct UnaryExpr {
    pub op: UnOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
}

#[derive(Clone, Debug)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct IndexExpr {
    pub object: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FieldExpr {
    pub object: Box<Expr>,
    pub field: Symbol,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct CastExpr {
    pub expr: Box<Expr>,
    pub target: TypeExpr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct NewExpr {
    pub target: TypeExpr,
    pub args: Vec<Expr>,
    pub span: Span,
}
