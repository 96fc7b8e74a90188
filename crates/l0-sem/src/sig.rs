//! Signature resolution: struct/enum/function/alias/let signatures and
//! value-type cycle detection (spec.md §4.5), ported from the original
//! implementation's `SignatureResolver`.

use crate::error::*;
use crate::module_key;
use crate::symbol::{ModuleEnv, SymbolKind};
use crate::types::{Builtin, Type};
use l0_par::ast;
use l0_util::{DiagnosticBuilder, FxHashMap, FxHashSet, Handler, Interner, Symbol};

#[derive(Clone, Debug)]
pub struct StructInfo {
    pub fields: Vec<(Symbol, Type)>,
}

#[derive(Clone, Debug)]
pub struct EnumInfo {
    /// Ordered as declared, so codegen can emit a stable tag enumeration.
    pub variants: Vec<(Symbol, Vec<Type>)>,
}

#[derive(Default)]
pub struct SignatureTables {
    pub func_types: FxHashMap<(Symbol, Symbol), Type>,
    pub struct_infos: FxHashMap<(Symbol, Symbol), StructInfo>,
    pub enum_infos: FxHashMap<(Symbol, Symbol), EnumInfo>,
    pub let_types: FxHashMap<(Symbol, Symbol), Type>,
}

/// Shared, read-only context threaded through every resolver function: the
/// module-by-key lookup table, so a symbol's owning module's AST can be
/// found regardless of which module is currently being resolved.
struct Ctx<'a> {
    by_key: FxHashMap<Symbol, &'a ast::Module>,
}

pub fn resolve_signatures(
    modules: &[ast::Module],
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    interner: &mut Interner,
    handler: &mut Handler,
) -> SignatureTables {
    let mut tables = SignatureTables::default();
    let keys: Vec<Symbol> = modules.iter().map(|m| module_key(interner, &m.name)).collect();
    let by_key: FxHashMap<Symbol, &ast::Module> = keys.iter().copied().zip(modules.iter()).collect();
    let ctx = Ctx { by_key };

    for (module, key) in modules.iter().zip(&keys) {
        resolve_module_signatures(&ctx, module, *key, envs, &mut tables, interner, handler);
    }

    detect_value_type_cycles(&ctx, &tables, interner, handler);
    tables
}

fn resolve_module_signatures(
    ctx: &Ctx,
    module: &ast::Module,
    key: Symbol,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    tables: &mut SignatureTables,
    interner: &mut Interner,
    handler: &mut Handler,
) {
    for decl in &module.decls {
        match decl {
            ast::Decl::Struct(d) => resolve_struct(ctx, module, key, d, envs, tables, interner, handler),
            ast::Decl::Enum(d) => resolve_enum(ctx, module, key, d, envs, tables, interner, handler),
            ast::Decl::Func(d) => resolve_func(ctx, module, key, d, envs, tables, interner, handler),
            ast::Decl::TypeAlias(d) => {
                let mut stack = FxHashSet::default();
                resolve_type_alias_symbol(ctx, key, d.name, envs, interner, handler, &mut stack);
            }
            ast::Decl::Let(d) => resolve_let(ctx, module, key, d, envs, tables, interner, handler),
        }
    }
}

/// Resolves a `TypeExpr` as written in source (in module `key`) into a
/// `Type`, looking up named types through `env.all` (open-import visible
/// set).
fn resolve_type_expr(
    ctx: &Ctx,
    module: &ast::Module,
    key: Symbol,
    ty: &ast::TypeExpr,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    interner: &mut Interner,
    handler: &mut Handler,
    alias_stack: &mut FxHashSet<(Symbol, Symbol)>,
) -> Option<Type> {
    match ty {
        ast::TypeExpr::Pointer(inner, _) => {
            let inner_ty = resolve_type_expr(ctx, module, key, inner, envs, interner, handler, alias_stack)?;
            Some(Type::Pointer(Box::new(inner_ty)))
        }
        ast::TypeExpr::Nullable(inner, span) => {
            let inner_ty = resolve_type_expr(ctx, module, key, inner, envs, interner, handler, alias_stack)?;
            if inner_ty.is_void() {
                DiagnosticBuilder::error(SIG_VOID_NULLABLE, "type 'void' cannot be nullable")
                    .filename(interner.resolve(module.filename))
                    .span(*span)
                    .emit(handler);
                return None;
            }
            Some(Type::Nullable(Box::new(inner_ty)))
        }
        ast::TypeExpr::Named { module: qual, name, span } => {
            let name_text = interner.resolve(*name).to_string();
            if qual.is_none() {
                if let Some(builtin) = Builtin::from_name(&name_text) {
                    return Some(Type::Builtin(builtin));
                }
            }

            let lookup_env_key = match qual {
                Some(m) => module_key(interner, std::slice::from_ref(m)),
                None => key,
            };
            let sym = envs.get(&lookup_env_key).and_then(|e| e.all.get(name)).cloned();
            let Some(sym) = sym else {
                DiagnosticBuilder::error(
                    SIG_UNKNOWN_TYPE,
                    format!("unknown type '{name_text}' in module '{}'", display_module(interner, &module.name)),
                )
                .filename(interner.resolve(module.filename))
                .span(*span)
                .emit(handler);
                return None;
            };

            match sym.kind {
                SymbolKind::Struct => Some(Type::Struct(sym.module, sym.name)),
                SymbolKind::Enum => Some(Type::Enum(sym.module, sym.name)),
                SymbolKind::TypeAlias => {
                    resolve_type_alias_symbol(ctx, sym.module, sym.name, envs, interner, handler, alias_stack)
                }
                _ => {
                    DiagnosticBuilder::error(
                        SIG_SYMBOL_NOT_A_TYPE,
                        format!(
                            "symbol '{name_text}' in module '{}' is not a type",
                            display_module(interner, &module.name)
                        ),
                    )
                    .filename(interner.resolve(module.filename))
                    .span(*span)
                    .emit(handler);
                    None
                }
            }
        }
    }
}

fn resolve_type_alias_symbol(
    ctx: &Ctx,
    owning_key: Symbol,
    alias_name: Symbol,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    interner: &mut Interner,
    handler: &mut Handler,
    alias_stack: &mut FxHashSet<(Symbol, Symbol)>,
) -> Option<Type> {
    if let Some(cached) =
        envs.get(&owning_key).and_then(|e| e.all.get(&alias_name)).and_then(|s| s.resolved_type.clone())
    {
        return Some(cached);
    }

    let cache_key = (owning_key, alias_name);
    let owning_module = *ctx.by_key.get(&owning_key)?;
    if !alias_stack.insert(cache_key) {
        DiagnosticBuilder::error(
            SIG_CYCLIC_ALIAS,
            format!(
                "cyclic type alias involving '{}' in module '{}'",
                interner.resolve(alias_name),
                interner.resolve(owning_key)
            ),
        )
        .filename(interner.resolve(owning_module.filename))
        .emit(handler);
        return None;
    }

    let decl_ref = envs.get(&owning_key)?.all.get(&alias_name)?.decl;
    let Some(ast::Decl::TypeAlias(alias_decl)) = owning_module.decls.get(decl_ref.decl_index) else {
        alias_stack.remove(&cache_key);
        return None;
    };
    let target_ty =
        resolve_type_expr(ctx, owning_module, owning_key, &alias_decl.target, envs, interner, handler, alias_stack);
    alias_stack.remove(&cache_key);

    if let Some(ty) = &target_ty {
        set_symbol_type(envs, owning_key, alias_name, ty.clone());
    }
    target_ty
}

fn resolve_struct(
    ctx: &Ctx,
    module: &ast::Module,
    key: Symbol,
    decl: &ast::StructDecl,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    tables: &mut SignatureTables,
    interner: &mut Interner,
    handler: &mut Handler,
) {
    let struct_ty = Type::Struct(key, decl.name);
    set_symbol_type(envs, key, decl.name, struct_ty);

    let mut fields = Vec::new();
    let mut alias_stack = FxHashSet::default();
    for field in &decl.fields {
        if let Some(ty) = resolve_type_expr(ctx, module, key, &field.ty, envs, interner, handler, &mut alias_stack) {
            fields.push((field.name, ty));
        }
    }
    tables.struct_infos.insert((key, decl.name), StructInfo { fields });
}

fn resolve_enum(
    ctx: &Ctx,
    module: &ast::Module,
    key: Symbol,
    decl: &ast::EnumDecl,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    tables: &mut SignatureTables,
    interner: &mut Interner,
    handler: &mut Handler,
) {
    let enum_ty = Type::Enum(key, decl.name);
    set_symbol_type(envs, key, decl.name, enum_ty.clone());

    let mut variants = Vec::new();
    for variant in &decl.variants {
        let mut alias_stack = FxHashSet::default();
        let field_types: Vec<Type> = variant
            .fields
            .iter()
            .filter_map(|f| resolve_type_expr(ctx, module, key, f, envs, interner, handler, &mut alias_stack))
            .collect();
        // Constructors are typed uniformly as functions into the enum
        // (spec.md §4.5: "set the variant symbol's type to Func(...)").
        set_symbol_type(envs, key, variant.name, Type::Func(field_types.clone(), Box::new(enum_ty.clone())));
        variants.push((variant.name, field_types));
    }
    tables.enum_infos.insert((key, decl.name), EnumInfo { variants });
}

fn resolve_func(
    ctx: &Ctx,
    module: &ast::Module,
    key: Symbol,
    decl: &ast::FuncDecl,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    tables: &mut SignatureTables,
    interner: &mut Interner,
    handler: &mut Handler,
) {
    let mut ok = true;
    let mut alias_stack = FxHashSet::default();
    let mut param_types = Vec::new();
    for p in &decl.params {
        match resolve_type_expr(ctx, module, key, &p.ty, envs, interner, handler, &mut alias_stack) {
            Some(t) => param_types.push(t),
            None => ok = false,
        }
    }
    let ret_type = match &decl.ret_type {
        Some(rt) => resolve_type_expr(ctx, module, key, rt, envs, interner, handler, &mut alias_stack),
        None => Some(Type::Builtin(Builtin::Void)),
    };
    if ret_type.is_none() {
        ok = false;
    }
    if !ok {
        return;
    }
    let func_ty = Type::Func(param_types, Box::new(ret_type.unwrap()));
    set_symbol_type(envs, key, decl.name, func_ty.clone());
    tables.func_types.insert((key, decl.name), func_ty);
}

fn resolve_let(
    ctx: &Ctx,
    module: &ast::Module,
    key: Symbol,
    decl: &ast::LetDecl,
    envs: &mut FxHashMap<Symbol, ModuleEnv>,
    tables: &mut SignatureTables,
    interner: &mut Interner,
    handler: &mut Handler,
) {
    let mut alias_stack = FxHashSet::default();
    let let_ty = match &decl.ty {
        Some(t) => resolve_type_expr(ctx, module, key, t, envs, interner, handler, &mut alias_stack),
        None => infer_literal_type(module, key, &decl.init, envs),
    };
    let Some(let_ty) = let_ty else {
        if decl.ty.is_none() {
            DiagnosticBuilder::error(
                SIG_CANNOT_INFER_LET,
                format!(
                    "cannot infer type for let '{}' - type annotation required for non-literal initializers",
                    interner.resolve(decl.name)
                ),
            )
            .filename(interner.resolve(module.filename))
            .span(decl.span)
            .emit(handler);
        }
        return;
    };
    set_symbol_type(envs, key, decl.name, let_ty.clone());
    tables.let_types.insert((key, decl.name), let_ty);
}

fn infer_literal_type(
    module: &ast::Module,
    key: Symbol,
    expr: &ast::Expr,
    envs: &FxHashMap<Symbol, ModuleEnv>,
) -> Option<Type> {
    match expr {
        ast::Expr::Literal(ast::Literal::Int(_), _) => Some(Type::Builtin(Builtin::Int)),
        ast::Expr::Literal(ast::Literal::Byte(_), _) => Some(Type::Builtin(Builtin::Byte)),
        ast::Expr::Literal(ast::Literal::Bool(_), _) => Some(Type::Builtin(Builtin::Bool)),
        ast::Expr::Literal(ast::Literal::String(_), _) => Some(Type::Builtin(Builtin::String)),
        ast::Expr::Literal(ast::Literal::Null, _) => None,
        ast::Expr::Call(call) => {
            let ast::Expr::VarRef { module: None, name, .. } = call.callee.as_ref() else { return None };
            let sym = envs.get(&key)?.all.get(name)?;
            match sym.kind {
                SymbolKind::Struct => Some(Type::Struct(sym.module, sym.name)),
                SymbolKind::TypeAlias => match &sym.resolved_type {
                    Some(t @ Type::Struct(..)) => Some(t.clone()),
                    _ => None,
                },
                SymbolKind::EnumVariant => envs.get(&key)?.all.values().find_map(|s| {
                    if s.kind != SymbolKind::Enum {
                        return None;
                    }
                    let ast::Decl::Enum(e) = &module.decls[s.decl.decl_index] else { return None };
                    e.variants.iter().any(|v| v.name == *name).then(|| Type::Enum(s.module, s.name))
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

fn set_symbol_type(envs: &mut FxHashMap<Symbol, ModuleEnv>, key: Symbol, name: Symbol, ty: Type) {
    if let Some(env) = envs.get_mut(&key) {
        if let Some(sym) = env.locals.get_mut(&name) {
            sym.resolved_type = Some(ty.clone());
        }
        if let Some(sym) = env.all.get_mut(&name) {
            sym.resolved_type = Some(ty);
        }
    }
}

fn display_module(interner: &Interner, segments: &[Symbol]) -> String {
    segments.iter().map(|s| interner.resolve(*s)).collect::<Vec<_>>().join(".")
}

/// Dependency edges for value-typed (non-pointer) fields only (spec.md
/// §4.5: "recursing through `Nullable` but *not* through `Pointer`").
fn value_type_dependencies(ty: &Type, out: &mut FxHashSet<(Symbol, Symbol)>) {
    match ty {
        Type::Pointer(_) => {}
        Type::Nullable(inner) => value_type_dependencies(inner, out),
        Type::Struct(m, n) | Type::Enum(m, n) => {
            out.insert((*m, *n));
        }
        _ => {}
    }
}

fn detect_value_type_cycles(ctx: &Ctx, tables: &SignatureTables, interner: &mut Interner, handler: &mut Handler) {
    let mut graph: FxHashMap<(Symbol, Symbol), FxHashSet<(Symbol, Symbol)>> = FxHashMap::default();

    for (node, info) in &tables.struct_infos {
        let mut deps = FxHashSet::default();
        for (_, ty) in &info.fields {
            value_type_dependencies(ty, &mut deps);
        }
        graph.insert(*node, deps);
    }
    for (node, info) in &tables.enum_infos {
        let mut deps = FxHashSet::default();
        for (_, field_types) in &info.variants {
            for ty in field_types {
                value_type_dependencies(ty, &mut deps);
            }
        }
        graph.insert(*node, deps);
    }

    // Kahn's algorithm: repeatedly remove nodes with no remaining
    // dependencies. Anything left over participates in a cycle.
    let mut in_degree: FxHashMap<(Symbol, Symbol), usize> = graph.iter().map(|(k, v)| (*k, v.len())).collect();
    let mut queue: Vec<(Symbol, Symbol)> = in_degree.iter().filter(|(_, d)| **d == 0).map(|(k, _)| *k).collect();
    let mut processed = FxHashSet::default();

    while let Some(node) = queue.pop() {
        processed.insert(node);
        for (dependent, deps) in graph.iter() {
            if deps.contains(&node) {
                if let Some(d) = in_degree.get_mut(dependent) {
                    if *d > 0 {
                        *d -= 1;
                        if *d == 0 && !processed.contains(dependent) {
                            queue.push(*dependent);
                        }
                    }
                }
            }
        }
    }

    if processed.len() == graph.len() {
        return;
    }

    let mut unresolved: Vec<(Symbol, Symbol)> = graph.keys().filter(|n| !processed.contains(*n)).copied().collect();
    unresolved.sort_by_key(|(m, n)| (interner.resolve(*m).to_string(), interner.resolve(*n).to_string()));

    let mut parts = Vec::new();
    for node in unresolved.iter().take(3) {
        let deps: Vec<String> = graph
            .get(node)
            .into_iter()
            .flatten()
            .filter(|d| unresolved.contains(d))
            .map(|(m, n)| format!("{}::{}", interner.resolve(*m), interner.resolve(*n)))
            .collect();
        if !deps.is_empty() {
            parts.push(format!(
                "{}::{} depends on {}",
                interner.resolve(node.0),
                interner.resolve(node.1),
                deps.join(", ")
            ));
        }
    }
    let cycle_desc = parts.join("; ");

    let (first_mod, first_name) = unresolved[0];
    let target_module = ctx.by_key.get(&first_mod).copied();
    let target_span = target_module.and_then(|m| {
        m.decls.iter().find_map(|d| match d {
            ast::Decl::Struct(s) if s.name == first_name => Some(s.span),
            ast::Decl::Enum(e) if e.name == first_name => Some(e.span),
            _ => None,
        })
    });

    let mut builder = DiagnosticBuilder::error(
        SIG_VALUE_TYPE_CYCLE,
        format!(
            "value-type cycle detected: {cycle_desc}. This creates infinite-size types. \
             Consider using pointers to break the cycle."
        ),
    );
    if let Some(m) = target_module {
        builder = builder.filename(interner.resolve(m.filename));
    }
    if let Some(span) = target_span {
        builder = builder.span(span);
    }
    builder.emit(handler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_names;
    use l0_lex::Lexer;
    use l0_par::Parser;
    use l0_util::{Handler, Interner};

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
    fn struct_field_types_resolve() {
        let mut interner = Interner::new();
        let src = "module geometry;\nstruct Point { x: int; y: int; }\n";
        let module = parse_module(src, &mut interner, "geometry.l0");
        let modules = vec![module];
        let mut handler = Handler::new();
        let mut envs = resolve_names(&modules, &mut interner, &mut handler);
        let tables = resolve_signatures(&modules, &mut envs, &mut interner, &mut handler);
        assert!(!handler.has_errors());
        let key = module_key(&mut interner, &modules[0].name);
        let name = interner.intern("Point");
        let info = tables.struct_infos.get(&(key, name)).expect("struct info");
        assert_eq!(info.fields.len(), 2);
        assert_eq!(info.fields[0].1, Type::Builtin(Builtin::Int));
    }

    #[test]
    fn direct_struct_self_reference_is_a_cycle() {
        let mut interner = Interner::new();
        let src = "module bad;\nstruct Node { next: Node; }\n";
        let module = parse_module(src, &mut interner, "bad.l0");
        let modules = vec![module];
        let mut handler = Handler::new();
        let mut envs = resolve_names(&modules, &mut interner, &mut handler);
        let _tables = resolve_signatures(&modules, &mut envs, &mut interner, &mut handler);
        assert!(handler.has_errors());
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("SIG-0040")));
    }

    #[test]
    fn pointer_breaks_value_type_cycle() {
        let mut interner = Interner::new();
        let src = "module ok;\nstruct Node { next: Node*; }\n";
        let module = parse_module(src, &mut interner, "ok.l0");
        let modules = vec![module];
        let mut handler = Handler::new();
        let mut envs = resolve_names(&modules, &mut interner, &mut handler);
        let _tables = resolve_signatures(&modules, &mut envs, &mut interner, &mut handler);
        assert!(!handler.has_errors());
    }

    #[test]
    fn void_nullable_rejected() {
        let mut interner = Interner::new();
        let src = "module m;\nstruct S { x: void?; }\n";
        let module = parse_module(src, &mut interner, "m.l0");
        let modules = vec![module];
        let mut handler = Handler::new();
        let mut envs = resolve_names(&modules, &mut interner, &mut handler);
        let _tables = resolve_signatures(&modules, &mut envs, &mut interner, &mut handler);
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("SIG-0011")));
    }
}
