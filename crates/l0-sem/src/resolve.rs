//! Name resolution: per-module symbol collection and open-import merging
//! (spec.md §4.4), ported from the original implementation's
//! `NameResolver._collect_locals`/`_open_imports`.

use crate::symbol::{DeclRef, ModSymbol, ModuleEnv, SymbolKind};
use crate::{error::*, module_key};
use l0_par::ast;
use l0_util::{DiagnosticBuilder, FxHashMap, Handler, Interner, Symbol};

pub fn resolve_names(
    modules: &[ast::Module],
    interner: &mut Interner,
    handler: &mut Handler,
) -> FxHashMap<Symbol, ModuleEnv> {
    let mut envs = FxHashMap::default();
    for module in modules {
        let key = module_key(interner, &module.name);
        envs.insert(key, ModuleEnv::new(key));
    }

    let keys: Vec<Symbol> = modules.iter().map(|m| module_key(interner, &m.name)).collect();
    for (module, key) in modules.iter().zip(&keys) {
        collect_locals(module, *key, &mut envs, interner, handler);
    }

    let by_key: FxHashMap<Symbol, &ast::Module> =
        keys.iter().copied().zip(modules.iter()).collect();
    for (module, key) in modules.iter().zip(&keys) {
        open_imports(module, *key, &by_key, &mut envs, interner, handler);
    }

    envs
}

fn collect_locals(
    module: &ast::Module,
    key: Symbol,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    interner: &mut Interner,
    handler: &mut Handler,
) {
    for (decl_index, decl) in module.decls.iter().enumerate() {
        match decl {
            ast::Decl::Func(d) => {
                define_local(envs, key, module, d.name, SymbolKind::Func, decl_index, None, interner, handler);
            }
            ast::Decl::Struct(d) => {
                define_local(envs, key, module, d.name, SymbolKind::Struct, decl_index, None, interner, handler);
            }
            ast::Decl::Enum(d) => {
                define_local(envs, key, module, d.name, SymbolKind::Enum, decl_index, None, interner, handler);
                for (variant_index, variant) in d.variants.iter().enumerate() {
                    define_local(
                        envs,
                        key,
                        module,
                        variant.name,
                        SymbolKind::EnumVariant,
                        decl_index,
                        Some(variant_index),
                        interner,
                        handler,
                    );
                }
            }
            ast::Decl::TypeAlias(d) => {
                define_local(envs, key, module, d.name, SymbolKind::TypeAlias, decl_index, None, interner, handler);
            }
            ast::Decl::Let(d) => {
                define_local(envs, key, module, d.name, SymbolKind::Let, decl_index, None, interner, handler);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn define_local(
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    key: Symbol,
    module: &ast::Module,
    name: Symbol,
    kind: SymbolKind,
    decl_index: usize,
    variant_index: Option<usize>,
    interner: &mut Interner,
    handler: &mut Handler,
) {
    let env = envs.get_mut(&key).expect("module env must exist");
    if env.locals.contains_key(&name) {
        DiagnosticBuilder::error(
            RES_DUPLICATE_LOCAL,
            format!(
                "duplicate top-level definition of '{}' in module '{}'",
                interner.resolve(name),
                module_display(interner, &module.name),
            ),
        )
        .filename(interner.resolve(module.filename))
        .span(module.decls[decl_index].span())
        .emit(handler);
        return;
    }
    let sym = ModSymbol {
        name,
        kind,
        module: key,
        decl: DeclRef { decl_index, variant_index },
        resolved_type: None,
    };
    env.locals.insert(name, sym.clone());
    env.all.insert(name, sym);
}

fn open_imports(
    module: &ast::Module,
    key: Symbol,
    by_key: &FxHashMap<Symbol, &ast::Module>,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    interner: &mut Interner,
    handler: &mut Handler,
) {
    for import in &module.imports {
        let imported_key = module_key(interner, &import.path);
        let Some(imported_module) = by_key.get(&imported_key).copied() else {
            DiagnosticBuilder::error(
                RES_UNKNOWN_IMPORTED_MODULE,
                format!(
                    "unknown imported module '{}' in module '{}'",
                    module_display(interner, &import.path),
                    module_display(interner, &module.name),
                ),
            )
            .filename(interner.resolve(module.filename))
            .span(import.span)
            .emit(handler);
            continue;
        };

        let imported_locals: Vec<ModSymbol> =
            envs.get(&imported_key).unwrap().locals.values().cloned().collect();

        for imp_sym in imported_locals {
            let name = imp_sym.name;
            let env = envs.get_mut(&key).unwrap();

            if let Some(local_sym) = env.locals.get(&name).cloned() {
                if extern_signatures_compatible(module, &local_sym, imported_module, &imp_sym) {
                    DiagnosticBuilder::warning(
                        RES_EXTERN_SHADOW_COMPATIBLE,
                        format!(
                            "imported extern function '{}::{}' will be shadowed by a compatible \
                             local extern declaration in module '{}'",
                            module_display(interner, &import.path),
                            interner.resolve(name),
                            module_display(interner, &module.name),
                        ),
                    )
                    .filename(interner.resolve(module.filename))
                    .span(module.decls[local_sym.decl.decl_index].span())
                    .emit(handler);
                } else {
                    DiagnosticBuilder::warning(
                        RES_IMPORT_SHADOWED_BY_LOCAL,
                        format!(
                            "imported symbol '{}::{}' will be shadowed by a local definition in module '{}'",
                            module_display(interner, &import.path),
                            interner.resolve(name),
                            module_display(interner, &module.name),
                        ),
                    )
                    .filename(interner.resolve(module.filename))
                    .span(module.decls[local_sym.decl.decl_index].span())
                    .emit(handler);
                }
                continue;
            }

            if let Some(existing) = env.imported.get(&name).cloned() {
                if existing.module != imp_sym.module {
                    let prev_module = existing.module;
                    DiagnosticBuilder::warning(
                        RES_AMBIGUOUS_IMPORT,
                        format!(
                            "symbol '{}' imported from multiple modules ('{}', '{}') into '{}'; \
                             unqualified '{}' will be ambiguous unless a local definition shadows it; \
                             otherwise qualify as '<module>::{}'",
                            interner.resolve(name),
                            interner.resolve(prev_module),
                            module_display(interner, &import.path),
                            module_display(interner, &module.name),
                            interner.resolve(name),
                            interner.resolve(name),
                        ),
                    )
                    .filename(interner.resolve(module.filename))
                    .span(import.span)
                    .emit(handler);

                    if env.all.get(&name).map(|s| s.module) == Some(existing.module) {
                        env.all.remove(&name);
                    }
                    env.ambiguous_imports.entry(name).or_insert_with(|| vec![prev_module]).push(imported_key);
                }
                continue;
            }

            env.imported.insert(name, imp_sym.clone());
            env.all.entry(name).or_insert(imp_sym);
        }
    }
}

/// Syntactic prototype equality between two `extern` declarations (spec.md
/// §4.4's "byte-identical prototype" rule): same arity, same parameter type
/// spelling in order, same return type spelling. Compared on the raw
/// `TypeExpr` shape rather than the later-resolved `Type`, since this pass
/// runs before signature resolution.
fn extern_signatures_compatible(
    local_module: &ast::Module,
    local: &ModSymbol,
    imported_module: &ast::Module,
    imported: &ModSymbol,
) -> bool {
    if local.kind != SymbolKind::Func || imported.kind != SymbolKind::Func {
        return false;
    }
    let ast::Decl::Func(a) = &local_module.decls[local.decl.decl_index] else { return false };
    let ast::Decl::Func(b) = &imported_module.decls[imported.decl.decl_index] else { return false };
    if !a.is_extern || !b.is_extern || a.params.len() != b.params.len() {
        return false;
    }
    a.params.iter().zip(&b.params).all(|(pa, pb)| type_expr_eq(&pa.ty, &pb.ty))
        && match (&a.ret_type, &b.ret_type) {
            (Some(ra), Some(rb)) => type_expr_eq(ra, rb),
            (None, None) => true,
            _ => false,
        }
}

fn type_expr_eq(a: &ast::TypeExpr, b: &ast::TypeExpr) -> bool {
    match (a, b) {
        (
            ast::TypeExpr::Named { module: ma, name: na, .. },
            ast::TypeExpr::Named { module: mb, name: nb, .. },
        ) => ma == mb && na == nb,
        (ast::TypeExpr::Pointer(ia, _), ast::TypeExpr::Pointer(ib, _)) => type_expr_eq(ia, ib),
        (ast::TypeExpr::Nullable(ia, _), ast::TypeExpr::Nullable(ib, _)) => type_expr_eq(ia, ib),
        _ => false,
    }
}

pub fn module_display(interner: &Interner, segments: &[Symbol]) -> String {
    segments.iter().map(|s| interner.resolve(*s)).collect::<Vec<_>>().join(".")
}
