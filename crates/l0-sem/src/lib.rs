//! l0-sem - Semantic analysis
//!
//! Runs name resolution, signature resolution, local scope resolution, and
//! flow-sensitive type checking over a fully parsed, import-closed set of
//! modules (spec.md §4.4-§4.7). Each pass is independently testable; the
//! whole pipeline is wired together by [`analyze`].

pub mod check;
pub mod error;
pub mod resolve;
pub mod scope;
pub mod sig;
pub mod symbol;
pub mod types;

pub use check::{check_module, FuncTypeInfo, TypeCheckResult};
pub use error::*;
pub use resolve::resolve_names;
pub use scope::{LocalKind, LocalScopeResolver, Rib, RibId, ScopeTree};
pub use sig::{resolve_signatures, EnumInfo, SignatureTables, StructInfo};
pub use symbol::{DeclRef, ModSymbol, ModuleEnv, SymbolKind};
pub use types::{can_assign, Builtin, Type};

use l0_par::ast;
use l0_util::{FxHashMap, Handler, Interner, Symbol};

/// Interns a module's dotted-path name segments (`["geometry", "shapes"]`)
/// as a single `.`-joined symbol (`geometry.shapes`), the canonical
/// hashmap key used for every per-module table in this crate. Matches the
/// original implementation's convention of keying modules by their joined
/// dotted name string.
pub fn module_key(interner: &mut Interner, segments: &[Symbol]) -> Symbol {
    let joined = segments.iter().map(|s| interner.resolve(*s)).collect::<Vec<_>>().join(".");
    interner.intern(&joined)
}

/// Combined output of the full semantic pipeline for one compilation unit.
pub struct SemaResult {
    pub envs: FxHashMap<Symbol, ModuleEnv>,
    pub tables: SignatureTables,
}

/// Runs name resolution, signature resolution, and (for every non-extern
/// function body) local scope resolution plus type checking, in that
/// order, over the given import-closed module set. Each pass still runs
/// even if an earlier one reported errors, so a single invocation surfaces
/// as many diagnostics as possible (spec.md §7: "diagnostics accumulate,
/// passes do not abort on first error").
pub fn analyze(modules: &[ast::Module], interner: &mut Interner, handler: &mut Handler) -> SemaResult {
    let mut envs = resolve_names(modules, interner, handler);
    let tables = resolve_signatures(modules, &mut envs, interner, handler);

    for module in modules {
        let key = module_key(interner, &module.name);
        for decl in &module.decls {
            if let ast::Decl::Func(func) = decl {
                if func.body.is_some() {
                    check_module(module, key, func, &envs, &tables, interner, handler);
                }
            }
        }
    }

    SemaResult { envs, tables }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l0_lex::Lexer;
    use l0_par::Parser;

    fn parse_module(src: &str, interner: &mut Interner, filename: &str) -> ast::Module {
        let mut handler = Handler::new();
        let tokens: Vec<_> = Lexer::new(src, &mut handler).collect();
        assert!(!handler.has_errors(), "lex errors: {:?}", handler.diagnostics());
        let fname_sym = interner.intern(filename);
        let mut parser = Parser::new(tokens, &mut handler, interner);
        let module = parser.parse_module(fname_sym).expect("module parses");
        assert!(!handler.has_errors(), "parse errors: {:?}", handler.diagnostics());
        module
    }

    #[test]
    fn module_key_joins_dotted_segments() {
        let mut interner = Interner::new();
        let a = interner.intern("geometry");
        let b = interner.intern("shapes");
        let key = module_key(&mut interner, &[a, b]);
        assert_eq!(interner.resolve(key), "geometry.shapes");
    }

    #[test]
    fn module_key_is_stable_across_calls() {
        let mut interner = Interner::new();
        let a = interner.intern("m");
        let k1 = module_key(&mut interner, &[a]);
        let k2 = module_key(&mut interner, &[a]);
        assert_eq!(k1, k2);
    }

    #[test]
    fn full_pipeline_accepts_well_typed_program() {
        let mut interner = Interner::new();
        let src = "module m;\n\
                    func add(a: int, b: int) -> int {\n\
                    \treturn a + b;\n\
                    }\n";
        let module = parse_module(src, &mut interner, "m.l0");
        let modules = vec![module];
        let mut handler = Handler::new();
        let _result = analyze(&modules, &mut interner, &mut handler);
        assert!(!handler.has_errors(), "unexpected errors: {:?}", handler.diagnostics());
    }

    #[test]
    fn full_pipeline_rejects_missing_return() {
        let mut interner = Interner::new();
        let src = "module m;\n\
                    func f() -> int {\n\
                    \tlet x: int = 1;\n\
                    }\n";
        let module = parse_module(src, &mut interner, "m.l0");
        let modules = vec![module];
        let mut handler = Handler::new();
        let _result = analyze(&modules, &mut interner, &mut handler);
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("TYP-0010")));
    }
}
