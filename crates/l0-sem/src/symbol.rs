//! Per-module symbol tables (spec.md §3 "Symbols").

use crate::types::Type;
use l0_util::{FxHashMap, Symbol};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Func,
    Struct,
    Enum,
    EnumVariant,
    TypeAlias,
    Let,
}

/// A reference to the AST node that introduced a symbol: which top-level
/// declaration in the owning module, and (for an enum variant) which
/// variant of that declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeclRef {
    pub decl_index: usize,
    pub variant_index: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct ModSymbol {
    pub name: Symbol,
    pub kind: SymbolKind,
    /// Dotted-path key of the module that declares this symbol (see
    /// [`crate::module_key`]), not necessarily the module currently
    /// resolving it.
    pub module: Symbol,
    pub decl: DeclRef,
    /// Populated by the signature resolver once this symbol's type is
    /// known; `None` beforehand or if resolution failed.
    pub resolved_type: Option<Type>,
}

/// Per-module name environment (spec.md §3, §4.4).
#[derive(Debug)]
pub struct ModuleEnv {
    pub name: Symbol,
    pub locals: FxHashMap<Symbol, ModSymbol>,
    pub imported: FxHashMap<Symbol, ModSymbol>,
    /// `locals ∪ (imported names that are not ambiguous)` (spec.md §3,
    /// invariant 2: never contains a name that is both ambiguous and
    /// locally absent).
    pub all: FxHashMap<Symbol, ModSymbol>,
    /// name -> source module keys, populated only for names imported from
    /// more than one module.
    pub ambiguous_imports: FxHashMap<Symbol, Vec<Symbol>>,
}

impl ModuleEnv {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            locals: FxHashMap::default(),
            imported: FxHashMap::default(),
            all: FxHashMap::default(),
            ambiguous_imports: FxHashMap::default(),
        }
    }
}
