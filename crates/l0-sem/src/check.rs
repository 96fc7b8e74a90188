//! Flow-sensitive expression/statement type checking (spec.md §4.7), ported
//! from the original implementation's `ExpressionTypeChecker`.
//!
//! Unlike name/signature resolution, this pass keeps its own lexical scope
//! stack rather than consulting the pre-built [`crate::scope::ScopeTree`]
//! (that tree is an independent artifact for the emitter; the original
//! keeps the same separation between `LocalScopeResolver` and
//! `ExpressionTypeChecker`). It still runs [`crate::scope::LocalScopeResolver`]
//! once per function so callers get a scope tree back alongside the
//! checking diagnostics.

use crate::error::*;
use crate::scope::{LocalScopeResolver, ScopeTree};
use crate::sig::SignatureTables;
use crate::symbol::{ModSymbol, ModuleEnv, SymbolKind};
use crate::types::{can_assign, Builtin, Type};
use l0_par::ast;
use l0_util::{DiagnosticBuilder, DiagnosticCode, FxHashMap, FxHashSet, Handler, Interner, Span, Symbol};

/// A function's parameter/result types, as already recorded in
/// [`SignatureTables::func_types`]; handed back alongside the scope tree so
/// a caller doesn't have to re-look it up.
pub struct FuncTypeInfo {
    pub params: Vec<Type>,
    pub result: Type,
}

pub struct TypeCheckResult {
    pub scopes: ScopeTree,
    pub func_type: FuncTypeInfo,
    /// Natural (pre-widening) type of every expression, keyed by span since
    /// this AST has no stable node identity to key on.
    pub expr_types: FxHashMap<Span, Type>,
}

enum Lookup<'a> {
    Found(&'a ModSymbol),
    Ambiguous(Vec<Symbol>),
    UnknownModule(String),
    ModuleNotImported(String),
    NotFound,
}

pub fn check_module(
    module: &ast::Module,
    key: Symbol,
    func: &ast::FuncDecl,
    envs: &FxHashMap<Symbol, ModuleEnv>,
    tables: &SignatureTables,
    interner: &mut Interner,
    handler: &mut Handler,
) -> TypeCheckResult {
    let scopes = LocalScopeResolver::resolve(func);

    let func_ty = tables.func_types.get(&(key, func.name)).cloned().unwrap_or(Type::Func(
        Vec::new(),
        Box::new(Type::Builtin(Builtin::Void)),
    ));
    let (params, result) = match &func_ty {
        Type::Func(p, r) => (p.clone(), (**r).clone()),
        other => (Vec::new(), other.clone()),
    };

    let mut checker = Checker {
        module,
        module_key: key,
        envs,
        tables,
        interner,
        handler,
        func_result: result.clone(),
        local_scopes: vec![func.params.iter().zip(&params).map(|(p, t)| (p.name, t.clone())).collect()],
        alive_scopes: vec![func.params.iter().map(|p| (p.name, true)).collect()],
        loop_depth: 0,
        next_stmt_unreachable: false,
        expr_types: FxHashMap::default(),
    };

    let body = func.body.as_ref().expect("check_module requires a non-extern function");
    let guarantees_return = checker.check_block(body, true, false);

    if !result.is_void() && !guarantees_return {
        DiagnosticBuilder::error(
            TYP_MISSING_RETURN,
            format!(
                "not all control paths return a value of type '{}'",
                format_type(&result, checker.interner)
            ),
        )
        .filename(checker.interner.resolve(module.filename))
        .span(func.span)
        .emit(checker.handler);
    }

    TypeCheckResult { scopes, func_type: FuncTypeInfo { params, result }, expr_types: checker.expr_types }
}

struct Checker<'a> {
    module: &'a ast::Module,
    module_key: Symbol,
    envs: &'a FxHashMap<Symbol, ModuleEnv>,
    tables: &'a SignatureTables,
    interner: &'a mut Interner,
    handler: &'a mut Handler,
    func_result: Type,
    local_scopes: Vec<FxHashMap<Symbol, Type>>,
    alive_scopes: Vec<FxHashMap<Symbol, bool>>,
    loop_depth: u32,
    next_stmt_unreachable: bool,
    expr_types: FxHashMap<Span, Type>,
}

impl<'a> Checker<'a> {
    // -- scope stack ----------------------------------------------------

    fn push_scope(&mut self) {
        self.local_scopes.push(FxHashMap::default());
        self.alive_scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.local_scopes.pop();
        self.alive_scopes.pop();
    }

    fn lookup_local(&self, name: Symbol) -> Option<&Type> {
        self.local_scopes.iter().rev().find_map(|s| s.get(&name))
    }

    fn lookup_alive(&self, name: Symbol) -> Option<bool> {
        self.alive_scopes.iter().rev().find_map(|s| s.get(&name).copied())
    }

    fn set_alive(&mut self, name: Symbol, alive: bool) {
        for scope in self.alive_scopes.iter_mut().rev() {
            if scope.contains_key(&name) {
                scope.insert(name, alive);
                return;
            }
        }
    }

    fn declare_local(&mut self, name: Symbol, ty: Type, span: Span) {
        if let Some(existing) = self.local_scopes.last().and_then(|s| s.get(&name)) {
            DiagnosticBuilder::error(
                TYP_DUPLICATE_LOCAL,
                format!(
                    "local variable '{}' already declared in this scope with type '{}'",
                    self.interner.resolve(name),
                    format_type(existing, self.interner)
                ),
            )
            .filename(self.filename())
            .span(span)
            .emit(self.handler);
            return;
        }

        if self.lookup_local(name).is_some() {
            DiagnosticBuilder::warning(
                TYP_SHADOWS_OUTER_LOCAL,
                format!("local variable '{}' shadows variable from outer scope", self.interner.resolve(name)),
            )
            .filename(self.filename())
            .span(span)
            .emit(self.handler);
        }

        self.warn_if_shadows_module_symbol(name, span);

        self.local_scopes.last_mut().unwrap().insert(name, ty);
        self.alive_scopes.last_mut().unwrap().insert(name, true);
    }

    fn warn_if_shadows_module_symbol(&mut self, name: Symbol, span: Span) {
        match self.lookup_unqualified(name) {
            Lookup::Found(sym) => {
                let is_local_module = sym.module == self.module_key;
                match sym.kind {
                    SymbolKind::EnumVariant => {
                        let code = if is_local_module { TYP_SHADOWS_ENUM_VARIANT } else { TYP_SHADOWS_IMPORTED_ENUM_VARIANT };
                        DiagnosticBuilder::warning(
                            code,
                            format!(
                                "local variable '{}' shadows {}enum variant '{}::{}'",
                                self.interner.resolve(name),
                                if is_local_module { "" } else { "imported " },
                                self.interner.resolve(sym.module),
                                self.interner.resolve(name)
                            ),
                        )
                        .filename(self.filename())
                        .span(span)
                        .emit(self.handler);
                    }
                    SymbolKind::Func | SymbolKind::Struct | SymbolKind::Enum | SymbolKind::TypeAlias => {
                        let kind_label = match sym.kind {
                            SymbolKind::Func => "function",
                            SymbolKind::Struct => "struct",
                            SymbolKind::Enum => "enum",
                            SymbolKind::TypeAlias => "type alias",
                            _ => unreachable!(),
                        };
                        DiagnosticBuilder::warning(
                            TYP_SHADOWS_MODULE_SYMBOL,
                            format!(
                                "local variable '{}' shadows {}{} '{}::{}'",
                                self.interner.resolve(name),
                                if is_local_module { "" } else { "imported " },
                                kind_label,
                                self.interner.resolve(sym.module),
                                self.interner.resolve(name)
                            ),
                        )
                        .filename(self.filename())
                        .span(span)
                        .emit(self.handler);
                    }
                    SymbolKind::Let => {}
                }
            }
            Lookup::Ambiguous(modules) => {
                let modules_str =
                    modules.iter().map(|m| self.interner.resolve(*m).to_string()).collect::<Vec<_>>().join("', '");
                DiagnosticBuilder::warning(
                    TYP_SHADOWS_AMBIGUOUS_IMPORT,
                    format!(
                        "local variable '{}' shadows ambiguous imported symbol (from modules '{}')",
                        self.interner.resolve(name),
                        modules_str
                    ),
                )
                .filename(self.filename())
                .span(span)
                .emit(self.handler);
            }
            Lookup::UnknownModule(_) | Lookup::ModuleNotImported(_) | Lookup::NotFound => {}
        }
    }

    fn filename(&self) -> &str {
        self.interner.resolve(self.module.filename)
    }

    fn error(&mut self, code: DiagnosticCode, span: Span, message: impl Into<String>) {
        DiagnosticBuilder::error(code, message).filename(self.filename()).span(span).emit(self.handler);
    }

    fn warn(&mut self, code: DiagnosticCode, span: Span, message: impl Into<String>) {
        DiagnosticBuilder::warning(code, message).filename(self.filename()).span(span).emit(self.handler);
    }

    // -- symbol lookup ----------------------------------------------------

    fn lookup_unqualified(&self, name: Symbol) -> Lookup<'a> {
        let env = match self.envs.get(&self.module_key) {
            Some(e) => e,
            None => return Lookup::NotFound,
        };
        if let Some(sym) = env.all.get(&name) {
            return Lookup::Found(sym);
        }
        if let Some(modules) = env.ambiguous_imports.get(&name) {
            return Lookup::Ambiguous(modules.clone());
        }
        Lookup::NotFound
    }

    fn lookup_qualified(&self, qual: Symbol, name: Symbol) -> Lookup<'a> {
        let qual_text = self.interner.resolve(qual).to_string();
        let is_imported = self.module.imports.iter().any(|imp| {
            let path_text = imp.path.iter().map(|s| self.interner.resolve(*s)).collect::<Vec<_>>().join(".");
            path_text == qual_text
        });
        if !is_imported {
            return Lookup::ModuleNotImported(qual_text);
        }
        let Some(target_env) = self.envs.values().find(|e| self.interner.resolve(e.name) == qual_text) else {
            return Lookup::UnknownModule(qual_text);
        };
        match target_env.locals.get(&name) {
            Some(sym) => Lookup::Found(sym),
            None => Lookup::NotFound,
        }
    }

    fn lookup_symbol(&self, qual: Option<Symbol>, name: Symbol) -> Lookup<'a> {
        match qual {
            Some(m) => self.lookup_qualified(m, name),
            None => self.lookup_unqualified(name),
        }
    }

    fn qualified_display(&self, qual: Option<Symbol>, name: Symbol) -> String {
        match qual {
            Some(m) => format!("{}::{}", self.interner.resolve(m), self.interner.resolve(name)),
            None => self.interner.resolve(name).to_string(),
        }
    }

    // -- local type-expr resolution (spec.md §4.7: mirrors §4.5's rules,
    // but reads already-cached symbol types instead of re-deriving them) --

    fn resolve_local_type(&mut self, ty: &ast::TypeExpr) -> Option<Type> {
        match ty {
            ast::TypeExpr::Pointer(inner, _) => Some(Type::Pointer(Box::new(self.resolve_local_type(inner)?))),
            ast::TypeExpr::Nullable(inner, span) => {
                let inner_ty = self.resolve_local_type(inner)?;
                if inner_ty.is_void() {
                    self.error(TYP_LOCAL_VOID_NULLABLE, *span, "type 'void' cannot be nullable");
                    return None;
                }
                Some(Type::Nullable(Box::new(inner_ty)))
            }
            ast::TypeExpr::Named { module: qual, name, span } => {
                let name_text = self.interner.resolve(*name).to_string();
                if qual.is_none() {
                    if let Some(builtin) = Builtin::from_name(&name_text) {
                        return Some(Type::Builtin(builtin));
                    }
                }
                match self.lookup_symbol(*qual, *name) {
                    Lookup::Found(sym) => match sym.kind {
                        SymbolKind::Struct => Some(Type::Struct(sym.module, sym.name)),
                        SymbolKind::Enum => Some(Type::Enum(sym.module, sym.name)),
                        SymbolKind::TypeAlias => {
                            if sym.resolved_type.is_none() {
                                self.error(
                                    TYP_ALIAS_TARGET_UNRESOLVED,
                                    *span,
                                    format!("type alias '{name_text}' does not have a resolved type"),
                                );
                            }
                            sym.resolved_type.clone()
                        }
                        _ => {
                            self.error(
                                TYP_LOCAL_SYMBOL_NOT_A_TYPE,
                                *span,
                                format!("symbol '{name_text}' is not a type"),
                            );
                            None
                        }
                    },
                    Lookup::Ambiguous(modules) => {
                        let modules_str =
                            modules.iter().map(|m| self.interner.resolve(*m).to_string()).collect::<Vec<_>>().join("', '");
                        self.error(
                            TYP_LOCAL_UNKNOWN_TYPE,
                            *span,
                            format!("ambiguous type '{name_text}' (imported from modules '{modules_str}')"),
                        );
                        None
                    }
                    Lookup::UnknownModule(m) | Lookup::ModuleNotImported(m) => {
                        self.error(TYP_LOCAL_UNKNOWN_TYPE, *span, format!("unknown type '{name_text}' in module '{m}'"));
                        None
                    }
                    Lookup::NotFound => {
                        self.error(TYP_LOCAL_UNKNOWN_TYPE, *span, format!("unknown type '{name_text}'"));
                        None
                    }
                }
            }
        }
    }

    // -- block / statement traversal -------------------------------------

    /// Returns whether this block guarantees a return along every path.
    fn check_block(&mut self, block: &ast::Block, track_return: bool, push_scope: bool) -> bool {
        if push_scope {
            self.push_scope();
        }
        let mut unreachable_warned = false;
        let mut guarantees_return = false;
        let mut still_tracking = track_return;
        for stmt in &block.stmts {
            if guarantees_return && !unreachable_warned {
                self.warn(TYP_UNREACHABLE_AFTER_RETURN, stmt_span(stmt), "unreachable code after 'return'");
                unreachable_warned = true;
            }
            if self.next_stmt_unreachable && !unreachable_warned {
                self.warn(TYP_UNREACHABLE_CODE, stmt_span(stmt), "unreachable code");
                unreachable_warned = true;
            }
            let stmt_returns = self.check_stmt(stmt, still_tracking);
            if track_return {
                guarantees_return = guarantees_return || stmt_returns;
                if guarantees_return {
                    still_tracking = false;
                }
            }
        }
        self.next_stmt_unreachable = false;
        if push_scope {
            self.pop_scope();
        }
        track_return && guarantees_return
    }

    /// Returns whether this single statement guarantees a return.
    fn check_stmt(&mut self, stmt: &ast::Stmt, track_return: bool) -> bool {
        match stmt {
            ast::Stmt::Return(ret) => {
                self.check_return(ret);
                true
            }
            ast::Stmt::Expr(expr) => {
                self.infer_expr(expr, None, "expression");
                false
            }
            ast::Stmt::Let(let_stmt) => {
                self.check_let(let_stmt);
                false
            }
            ast::Stmt::Assign(assign) => {
                self.check_assign(assign);
                false
            }
            ast::Stmt::Drop(drop) => {
                self.check_drop(drop);
                false
            }
            ast::Stmt::If(if_stmt) => self.check_if(if_stmt, track_return),
            ast::Stmt::While(while_stmt) => {
                self.check_while(while_stmt, track_return);
                false
            }
            ast::Stmt::For(for_stmt) => {
                self.check_for(for_stmt, track_return);
                false
            }
            ast::Stmt::Match(match_stmt) => self.check_match(match_stmt, track_return),
            ast::Stmt::Case(case_stmt) => self.check_case(case_stmt, track_return),
            ast::Stmt::With(with_stmt) => self.check_with(with_stmt, track_return),
            ast::Stmt::Block(block) => self.check_block(block, track_return, true),
            ast::Stmt::Break(span) => {
                if self.loop_depth == 0 {
                    self.error(TYP_BREAK_OUTSIDE_LOOP, *span, "'break' statement not within a loop");
                }
                self.next_stmt_unreachable = true;
                false
            }
            ast::Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    self.error(TYP_CONTINUE_OUTSIDE_LOOP, *span, "'continue' statement not within a loop");
                }
                self.next_stmt_unreachable = true;
                false
            }
        }
    }

    fn check_return(&mut self, ret: &ast::ReturnStmt) {
        let expected = self.func_result.clone();
        match &ret.value {
            None => {}
            Some(value) => {
                self.infer_expr(value, Some(&expected), "return value");
            }
        }
    }

    fn check_let(&mut self, let_stmt: &ast::LocalLet) {
        let annot_ty = match &let_stmt.ty {
            Some(t) => match self.resolve_local_type(t) {
                Some(ty) => Some(ty),
                None => {
                    self.error(
                        TYP_CANNOT_RESOLVE_ANNOTATION,
                        t.span(),
                        format!("cannot resolve type annotation for variable '{}'", self.interner.resolve(let_stmt.name)),
                    );
                    return;
                }
            },
            None => None,
        };

        if let Some(ty) = &annot_ty {
            if ty.is_void() {
                self.error(TYP_VOID_TYPE, let_stmt.span, "variable cannot have type 'void'");
                return;
            }
            let descriptor = format!("initializer for variable '{}'", self.interner.resolve(let_stmt.name));
            if self.infer_expr(&let_stmt.init, Some(ty), &descriptor).is_none() {
                return;
            }
            self.declare_local(let_stmt.name, ty.clone(), let_stmt.span);
            return;
        }

        let descriptor = format!("initializer for variable '{}'", self.interner.resolve(let_stmt.name));
        let value_ty = self.infer_expr(&let_stmt.init, None, &descriptor);
        match value_ty {
            None => {
                self.error(
                    TYP_INITIALIZER_MISMATCH,
                    let_stmt.span,
                    format!("initializer for '{}' type mismatch", self.interner.resolve(let_stmt.name)),
                );
            }
            Some(Type::Null) => {
                self.error(TYP_CANNOT_INFER_NULL, let_stmt.span, "cannot infer type from 'null'; explicit type required");
            }
            Some(ty) if ty.is_void() => {
                self.error(TYP_VOID_INITIALIZER, let_stmt.init.span(), "initializer is 'void', cannot assign to variable");
            }
            Some(ty) => self.declare_local(let_stmt.name, ty, let_stmt.span),
        }
    }

    fn check_assign(&mut self, assign: &ast::AssignStmt) {
        if let ast::Expr::VarRef { module: None, name, .. } = &assign.target {
            self.set_alive(*name, true);
        }
        let target_ty = self.infer_expr(&assign.target, None, "assignment target");
        match target_ty {
            Some(ty) => {
                let descriptor = format!("assignment to {}", describe_lvalue(&assign.target, self.interner));
                self.infer_expr(&assign.value, Some(&ty), &descriptor);
            }
            None => {
                self.infer_expr(&assign.value, None, "assignment value");
            }
        }
    }

    fn check_drop(&mut self, drop: &ast::DropStmt) {
        let Some(var_ty) = self.lookup_local(drop.name).cloned() else {
            self.error(TYP_UNKNOWN_VARIABLE, drop.span, format!("unknown variable '{}'", self.interner.resolve(drop.name)));
            return;
        };
        let is_ptr = var_ty.is_pointer();
        let is_opt_ptr = matches!(&var_ty, Type::Nullable(inner) if inner.is_pointer());
        if !is_ptr && !is_opt_ptr {
            self.error(
                TYP_DROP_NOT_POINTER,
                drop.span,
                format!("cannot drop non-pointer type '{}'", format_type(&var_ty, self.interner)),
            );
            return;
        }
        if self.lookup_alive(drop.name) == Some(false) {
            self.error(TYP_DOUBLE_DROP, drop.span, format!("use of dropped variable '{}'", self.interner.resolve(drop.name)));
            return;
        }
        self.set_alive(drop.name, false);
    }

    fn check_if(&mut self, if_stmt: &ast::IfStmt, track_return: bool) -> bool {
        let cond_ty = self.infer_expr(&if_stmt.cond, None, "condition in if statement");
        if let Some(ty) = &cond_ty {
            if !ty.is_bool() {
                self.error(TYP_IF_COND_NOT_BOOL, if_stmt.span, "if condition must have type 'bool'");
            }
        }

        let pre_alive = self.alive_scopes.clone();

        let then_returns = self.check_block(&if_stmt.then_block, track_return, true);
        let then_alive = self.alive_scopes.clone();

        let mut else_returns = false;
        if let Some(else_branch) = &if_stmt.else_block {
            self.alive_scopes = pre_alive;
            else_returns = self.check_else(else_branch, track_return);
            let else_alive = std::mem::replace(&mut self.alive_scopes, Vec::new());

            let merged: Vec<FxHashMap<Symbol, bool>> = then_alive
                .iter()
                .zip(else_alive.iter())
                .map(|(then_scope, else_scope)| {
                    let mut merged_scope = FxHashMap::default();
                    for name in then_scope.keys().chain(else_scope.keys()) {
                        let then_alive_val = then_scope.get(name).copied().unwrap_or(true);
                        let else_alive_val = else_scope.get(name).copied().unwrap_or(true);
                        merged_scope.insert(*name, then_alive_val && else_alive_val);
                    }
                    merged_scope
                })
                .collect();
            self.alive_scopes = merged;
        } else {
            self.alive_scopes = then_alive;
        }

        track_return && then_returns && else_returns
    }

    fn check_else(&mut self, branch: &ast::ElseBranch, track_return: bool) -> bool {
        match branch {
            ast::ElseBranch::Block(block) => self.check_block(block, track_return, true),
            ast::ElseBranch::If(if_stmt) => self.check_if(if_stmt, track_return),
        }
    }

    fn check_while(&mut self, while_stmt: &ast::WhileStmt, track_return: bool) {
        let cond_ty = self.infer_expr(&while_stmt.cond, None, "condition in while loop");
        if let Some(ty) = &cond_ty {
            if !ty.is_bool() {
                self.error(TYP_WHILE_COND_NOT_BOOL, while_stmt.span, "while condition must have type 'bool'");
            }
        }
        self.loop_depth += 1;
        // A loop body may run zero times, so its own return-path never
        // propagates to the enclosing function (spec.md §4.7).
        self.check_block(&while_stmt.body, track_return, true);
        self.loop_depth -= 1;
    }

    fn check_for(&mut self, for_stmt: &ast::ForStmt, track_return: bool) {
        self.push_scope();
        if let Some(init) = &for_stmt.init {
            self.check_stmt(init, false);
        }
        if let Some(cond) = &for_stmt.cond {
            let cond_ty = self.infer_expr(cond, None, "condition in for loop");
            if let Some(ty) = &cond_ty {
                if !ty.is_bool() {
                    self.error(TYP_FOR_COND_NOT_BOOL, for_stmt.span, "for loop condition must have type 'bool'");
                }
            }
        }
        if let Some(update) = &for_stmt.update {
            self.check_stmt(update, false);
        }
        self.loop_depth += 1;
        self.check_block(&for_stmt.body, track_return, false);
        self.loop_depth -= 1;
        self.pop_scope();
    }

    fn check_match(&mut self, match_stmt: &ast::MatchStmt, track_return: bool) -> bool {
        let scrutinee_ty = self.infer_expr(&match_stmt.scrutinee, None, "match scrutinee");
        let Some(Type::Enum(enum_mod, enum_name)) = scrutinee_ty.clone() else {
            self.error(
                TYP_MATCH_SCRUTINEE_NOT_ENUM,
                match_stmt.span,
                format!(
                    "match expression must have enum type, got '{}'",
                    scrutinee_ty.map(|t| format_type(&t, self.interner)).unwrap_or_else(|| "<unknown>".to_string())
                ),
            );
            return false;
        };

        let mut all_arms_return = !match_stmt.arms.is_empty();
        let mut covered: FxHashSet<Symbol> = FxHashSet::default();

        for arm in &match_stmt.arms {
            self.push_scope();
            if let ast::MatchPattern::Variant { name, bindings, span } = &arm.pattern {
                covered.insert(*name);
                let info = self.tables.enum_infos.get(&(enum_mod, enum_name)).cloned();
                match info.as_ref().and_then(|i| i.variants.iter().find(|(n, _)| n == name)) {
                    Some((_, field_types)) => {
                        if bindings.len() == field_types.len() {
                            let bound: Vec<(Symbol, Type)> =
                                bindings.iter().zip(field_types.iter()).map(|(b, t)| (*b, t.clone())).collect();
                            for (binding, field_ty) in bound {
                                self.declare_local(binding, field_ty, arm.span);
                            }
                        } else {
                            self.error(
                                TYP_MATCH_ARITY,
                                *span,
                                format!(
                                    "pattern variable count mismatch: variant '{}' has {} field(s) but pattern has {} variable(s)",
                                    self.interner.resolve(*name),
                                    field_types.len(),
                                    bindings.len()
                                ),
                            );
                        }
                    }
                    None => {
                        self.error(
                            TYP_MATCH_UNKNOWN_VARIANT,
                            *span,
                            format!(
                                "unknown variant '{}' for enum '{}'",
                                self.interner.resolve(*name),
                                format_type(&Type::Enum(enum_mod, enum_name), self.interner)
                            ),
                        );
                    }
                }
            }
            let arm_returns = self.check_block(&arm.body, track_return, false);
            all_arms_return = all_arms_return && arm_returns;
            self.pop_scope();
        }

        if self.tables.enum_infos.get(&(enum_mod, enum_name)).is_none() {
            self.error(
                TYP_NO_ENUM_INFO,
                match_stmt.span,
                format!("no type information for enum '{}'", format_type(&Type::Enum(enum_mod, enum_name), self.interner)),
            );
            return false;
        }

        let is_wildcard_present = match_stmt.arms.iter().any(|a| matches!(a.pattern, ast::MatchPattern::Wildcard(_)));
        let enum_variant_count = self.tables.enum_infos.get(&(enum_mod, enum_name)).map(|i| i.variants.len()).unwrap_or(0);
        let mut is_exhaustive = is_wildcard_present;
        if !is_wildcard_present {
            if covered.len() == enum_variant_count {
                is_exhaustive = true;
            } else if let Some(info) = self.tables.enum_infos.get(&(enum_mod, enum_name)) {
                let missing: Vec<String> =
                    info.variants.iter().filter(|(n, _)| !covered.contains(n)).map(|(n, _)| self.interner.resolve(*n).to_string()).collect();
                self.error(
                    TYP_MATCH_NOT_EXHAUSTIVE,
                    match_stmt.span,
                    format!(
                        "non-exhaustive match: missing variants ({}) for enum '{}'",
                        missing.join(", "),
                        format_type(&Type::Enum(enum_mod, enum_name), self.interner)
                    ),
                );
            }
        } else if covered.len() == enum_variant_count {
            self.warn(
                TYP_MATCH_WILDCARD_UNREACHABLE,
                match_stmt.span,
                format!(
                    "unreachable wildcard pattern in match: all variants of enum '{}' are already covered",
                    format_type(&Type::Enum(enum_mod, enum_name), self.interner)
                ),
            );
        }

        track_return && is_exhaustive && all_arms_return
    }

    /// `case` scrutinizes a scalar value against a set of literal patterns.
    /// The original implementation never reached expression-level type
    /// checking for `case` (codegen-only); this follows the same
    /// exhaustiveness-free, duplicate-checked shape as a C `switch`.
    fn check_case(&mut self, case_stmt: &ast::CaseStmt, track_return: bool) -> bool {
        let scrutinee_ty = self.infer_expr(&case_stmt.scrutinee, None, "case scrutinee");

        let mut seen = FxHashSet::default();
        let mut all_return = !case_stmt.arms.is_empty();
        for arm in &case_stmt.arms {
            let pattern_ty = literal_type(&arm.pattern);
            if let (Some(scrutinee), pattern) = (&scrutinee_ty, &pattern_ty) {
                if !can_assign(scrutinee, pattern, false) && !can_assign(pattern, scrutinee, false) {
                    self.error(
                        TYP_CASE_PATTERN_TYPE_MISMATCH,
                        arm.span,
                        format!(
                            "case pattern type '{}' does not match scrutinee type '{}'",
                            format_type(pattern, self.interner),
                            format_type(scrutinee, self.interner)
                        ),
                    );
                }
            }
            let key = literal_key(&arm.pattern);
            if !seen.insert(key) {
                self.error(
                    TYP_CASE_DUPLICATE_LITERAL,
                    arm.span,
                    "duplicate literal in 'case' statement",
                );
            }
            let arm_returns = self.check_block(&arm.body, track_return, true);
            all_return = all_return && arm_returns;
        }

        let else_returns = match &case_stmt.else_arm {
            Some(else_block) => self.check_block(else_block, track_return, true),
            None => false,
        };

        track_return && case_stmt.else_arm.is_some() && all_return && else_returns
    }

    /// `with (r = acquire()) { body } [cleanup { ... }]` binds each item as
    /// a local alive for `body`'s duration; cleanup blocks get their own
    /// scope, matching [`LocalScopeResolver`]'s tree shape.
    fn check_with(&mut self, with_stmt: &ast::WithStmt, track_return: bool) -> bool {
        self.push_scope();
        for item in &with_stmt.items {
            let descriptor = format!("initializer for with-item '{}'", self.interner.resolve(item.name));
            if let Some(ty) = self.infer_expr(&item.init, None, &descriptor) {
                self.declare_local(item.name, ty, item.span);
            }
        }
        let body_returns = self.check_block(&with_stmt.body, track_return, false);
        if let Some(item_cleanup) = with_stmt.items.iter().find_map(|i| i.cleanup.as_ref()) {
            self.push_scope();
            self.check_block(item_cleanup, false, false);
            self.pop_scope();
        }
        if let Some(cleanup) = &with_stmt.cleanup {
            self.push_scope();
            self.check_block(cleanup, false, false);
            self.pop_scope();
        }
        self.pop_scope();
        track_return && body_returns
    }

    // -- expressions ------------------------------------------------------

    fn infer_expr(&mut self, expr: &ast::Expr, widening: Option<&Type>, descriptor: &str) -> Option<Type> {
        if let Some(cached) = self.expr_types.get(&expr.span()) {
            let cached = cached.clone();
            if let Some(w) = widening {
                self.check_widening(expr, w, &cached, descriptor);
            }
            return Some(cached);
        }

        let result = match expr {
            ast::Expr::Literal(lit, _) => Some(literal_type(lit)),
            ast::Expr::VarRef { module, name, span } => self.infer_var_ref(*module, *name, *span),
            ast::Expr::Unary(u) => self.infer_unary(u),
            ast::Expr::Binary(b) => self.infer_binary(b),
            ast::Expr::Call(c) => self.infer_call(c),
            ast::Expr::Index(i) => self.infer_index(i),
            ast::Expr::Field(f) => self.infer_field(f),
            ast::Expr::Cast(c) => self.infer_cast(c),
            ast::Expr::New(n) => self.infer_new(n),
            ast::Expr::Try(inner, span) => self.infer_try(inner, *span),
            ast::Expr::Paren(inner, _) => self.infer_expr(inner, None, descriptor),
            ast::Expr::TypeExpr(t) => {
                self.error(TYP_TYPE_EXPR_AS_VALUE, t.span(), "type expression is only valid as argument to a type-accepting intrinsic");
                None
            }
            ast::Expr::SizeOf(arg, span) => Some(self.infer_sizeof(arg, *span)),
            ast::Expr::Ord(inner, span) => Some(self.infer_ord(inner, *span)),
        };

        if let Some(ty) = &result {
            self.expr_types.insert(expr.span(), ty.clone());
        }

        if let (Some(ty), Some(w)) = (&result, widening) {
            if !self.check_widening(expr, w, ty, descriptor) {
                return None;
            }
        }

        result
    }

    fn check_widening(&mut self, expr: &ast::Expr, widening: &Type, actual: &Type, descriptor: &str) -> bool {
        if can_assign(widening, actual, false) {
            return true;
        }
        self.error(
            TYP_WIDENING_MISMATCH,
            expr.span(),
            format!(
                "{descriptor} type mismatch: expected '{}', got '{}'",
                format_type(widening, self.interner),
                format_type(actual, self.interner)
            ),
        );
        false
    }

    fn infer_var_ref(&mut self, module: Option<Symbol>, name: Symbol, span: Span) -> Option<Type> {
        if module.is_none() {
            if let Some(local_ty) = self.lookup_local(name).cloned() {
                if self.lookup_alive(name) == Some(false) {
                    self.error(TYP_DROPPED_VAR_USE, span, format!("use of dropped variable '{}'", self.interner.resolve(name)));
                }
                return Some(local_ty);
            }
        }

        match self.lookup_symbol(module, name) {
            Lookup::Found(sym) => match sym.kind {
                SymbolKind::Func | SymbolKind::Let => sym.resolved_type.clone(),
                SymbolKind::EnumVariant => match &sym.resolved_type {
                    Some(Type::Func(params, result)) if params.is_empty() => Some((**result).clone()),
                    Some(Type::Func(..)) => {
                        self.error(
                            TYP_VARIANT_NEEDS_CALL_SYNTAX,
                            span,
                            format!("variant '{}' requires arguments; use '{}(...)' constructor syntax", self.interner.resolve(name), self.interner.resolve(name)),
                        );
                        None
                    }
                    _ => None,
                },
                SymbolKind::Struct | SymbolKind::Enum | SymbolKind::TypeAlias => {
                    self.error(TYP_SYMBOL_NOT_A_VALUE, span, format!("symbol '{}' is not a value", self.interner.resolve(name)));
                    None
                }
            },
            Lookup::Ambiguous(modules) => {
                let modules_str = modules.iter().map(|m| self.interner.resolve(*m).to_string()).collect::<Vec<_>>().join("', '");
                let hints = modules
                    .iter()
                    .map(|m| format!("'{}::{}'", self.interner.resolve(*m), self.interner.resolve(name)))
                    .collect::<Vec<_>>()
                    .join(" or ");
                self.error(
                    TYP_AMBIGUOUS_IDENTIFIER,
                    span,
                    format!(
                        "ambiguous identifier '{}' (imported from modules '{modules_str}'); use {hints} to disambiguate",
                        self.interner.resolve(name)
                    ),
                );
                None
            }
            Lookup::UnknownModule(m) => {
                self.error(
                    TYP_UNKNOWN_IDENTIFIER_UNKNOWN_MODULE,
                    span,
                    format!("unknown identifier '{}' (unknown module '{m}')", self.qualified_display(module, name)),
                );
                None
            }
            Lookup::ModuleNotImported(m) => {
                self.error(
                    TYP_UNKNOWN_IDENTIFIER_MODULE_NOT_IMPORTED,
                    span,
                    format!("unknown identifier '{}' (module '{m}' not imported)", self.qualified_display(module, name)),
                );
                None
            }
            Lookup::NotFound => {
                self.error(TYP_UNKNOWN_IDENTIFIER, span, format!("unknown identifier '{}'", self.qualified_display(module, name)));
                None
            }
        }
    }

    fn infer_unary(&mut self, u: &ast::UnaryExpr) -> Option<Type> {
        let operand_ty = self.infer_expr(&u.operand, None, "unary operand");
        match u.op {
            ast::UnOp::Neg => match &operand_ty {
                Some(t) if t.is_integer_kind() => Some(Type::Builtin(Builtin::Int)),
                Some(t) => {
                    self.error(
                        TYP_UNARY_NEG_NOT_INT,
                        u.span,
                        format!("unary '-' expects operand of type 'int', got '{}'", format_type(t, self.interner)),
                    );
                    None
                }
                None => None,
            },
            ast::UnOp::Not => match &operand_ty {
                Some(t) if t.is_bool() => Some(Type::Builtin(Builtin::Bool)),
                Some(t) => {
                    self.error(
                        TYP_UNARY_NOT_NOT_BOOL,
                        u.span,
                        format!("unary '!' expects operand of type 'bool', got '{}'", format_type(t, self.interner)),
                    );
                    None
                }
                None => None,
            },
            ast::UnOp::Deref => match &operand_ty {
                Some(Type::Pointer(inner)) => Some((**inner).clone()),
                Some(t) => {
                    self.error(
                        TYP_NULLABLE_DEREF,
                        u.span,
                        format!("cannot dereference expression of type '{}'; expected a pointer type", format_type(t, self.interner)),
                    );
                    None
                }
                None => None,
            },
        }
    }

    fn infer_binary(&mut self, b: &ast::BinaryExpr) -> Option<Type> {
        let left = self.infer_expr(&b.left, None, "binary operand");
        let right = self.infer_expr(&b.right, None, "binary operand");
        match b.op {
            ast::BinOp::Add | ast::BinOp::Sub | ast::BinOp::Mul | ast::BinOp::Div | ast::BinOp::Mod => {
                self.binary_both_int(b, left, right, Type::Builtin(Builtin::Int))
            }
            ast::BinOp::Lt | ast::BinOp::LtEq | ast::BinOp::Gt | ast::BinOp::GtEq => {
                self.binary_both_int(b, left, right, Type::Builtin(Builtin::Bool))
            }
            ast::BinOp::Eq | ast::BinOp::NotEq => self.binary_equality(b, left, right),
            ast::BinOp::And | ast::BinOp::Or => self.binary_both_bool(b, left, right),
        }
    }

    fn binary_both_int(&mut self, b: &ast::BinaryExpr, left: Option<Type>, right: Option<Type>, result: Type) -> Option<Type> {
        match (&left, &right) {
            (Some(l), Some(r)) if l.is_integer_kind() && r.is_integer_kind() => Some(result),
            (Some(l), Some(r)) => {
                self.error(
                    TYP_ARITH_NOT_INT,
                    b.span,
                    format!(
                        "operator '{}' expects operands of type 'int', got '{}' and '{}'",
                        op_text(b.op),
                        format_type(l, self.interner),
                        format_type(r, self.interner)
                    ),
                );
                None
            }
            _ => None,
        }
    }

    fn binary_both_bool(&mut self, b: &ast::BinaryExpr, left: Option<Type>, right: Option<Type>) -> Option<Type> {
        match (&left, &right) {
            (Some(l), Some(r)) if l.is_bool() && r.is_bool() => Some(Type::Builtin(Builtin::Bool)),
            (Some(l), Some(r)) => {
                self.error(
                    TYP_LOGICAL_NOT_BOOL,
                    b.span,
                    format!(
                        "operator '{}' expects operands of type 'bool', got '{}' and '{}'",
                        op_text(b.op),
                        format_type(l, self.interner),
                        format_type(r, self.interner)
                    ),
                );
                None
            }
            _ => None,
        }
    }

    fn binary_equality(&mut self, b: &ast::BinaryExpr, left: Option<Type>, right: Option<Type>) -> Option<Type> {
        let (left, right) = (left?, right?);

        let is_null_check = (matches!(left, Type::Null) && is_nullable_or_ptr(&right))
            || (matches!(right, Type::Null) && is_nullable_or_ptr(&left));

        if !is_null_check && !(can_assign(&right, &left, false) || can_assign(&left, &right, false)) {
            self.error(
                TYP_EQUALITY_MISMATCH,
                b.span,
                format!(
                    "equality operator '{}' requires both operands to have the same type (or be a valid null check), got '{}' and '{}'",
                    op_text(b.op),
                    format_type(&left, self.interner),
                    format_type(&right, self.interner)
                ),
            );
            return None;
        }

        if !is_null_check && !(left.is_integer_kind() || left.is_bool()) {
            self.error(
                TYP_EQUALITY_UNSUPPORTED_TYPE,
                b.span,
                format!("equality not supported for type '{}' in this stage", format_type(&left, self.interner)),
            );
            return None;
        }

        Some(Type::Builtin(Builtin::Bool))
    }

    fn infer_sizeof(&mut self, arg: &ast::SizeOfArg, span: Span) -> Type {
        let target_ty = match arg {
            ast::SizeOfArg::Type(t) => self.resolve_local_type(t),
            ast::SizeOfArg::Expr(e) => self.infer_expr(e, None, "sizeof operand"),
        };
        if let Some(t) = &target_ty {
            if t.is_void() {
                self.error(TYP_SIZEOF_VOID, span, "cannot take sizeof(void)");
            }
        }
        Type::Builtin(Builtin::Int)
    }

    fn infer_ord(&mut self, inner: &ast::Expr, span: Span) -> Type {
        let arg_ty = self.infer_expr(inner, None, "ord operand");
        match arg_ty {
            Some(Type::Enum(..)) => {}
            Some(t) => {
                self.error(TYP_ORD_NOT_ENUM, span, format!("ord expects an enum value, got '{}'", format_type(&t, self.interner)));
            }
            None => {}
        }
        Type::Builtin(Builtin::Int)
    }

    fn infer_call(&mut self, call: &ast::CallExpr) -> Option<Type> {
        let ast::Expr::VarRef { module, name, span } = call.callee.as_ref() else {
            self.error(TYP_CALLEE_NOT_IDENTIFIER, call.span, "callee must be a function name");
            for arg in &call.args {
                self.infer_expr(arg, None, "call argument");
            }
            return None;
        };

        match self.lookup_symbol(*module, *name) {
            Lookup::Found(sym) => {
                let sym = sym.clone();
                match sym.kind {
                    SymbolKind::Struct => self.infer_struct_ctor(call, &sym, sym.module, sym.name),
                    SymbolKind::TypeAlias => match &sym.resolved_type {
                        Some(Type::Struct(m, n)) => {
                            let (m, n) = (*m, *n);
                            self.infer_struct_ctor(call, &sym, m, n)
                        }
                        _ => {
                            self.error(TYP_CALLEE_NOT_CALLABLE, call.span, format!("symbol '{}' is not callable", self.interner.resolve(*name)));
                            None
                        }
                    },
                    SymbolKind::EnumVariant => self.infer_variant_ctor(call, &sym, *name),
                    SymbolKind::Func => {
                        let Some(Type::Func(params, result)) = sym.resolved_type.clone() else {
                            return None;
                        };
                        if params.len() != call.args.len() {
                            self.error(
                                TYP_CALL_ARITY,
                                call.span,
                                format!("function call has wrong number of arguments: expected {}, got {}", params.len(), call.args.len()),
                            );
                        }
                        for (i, arg) in call.args.iter().enumerate() {
                            if let Some(param_ty) = params.get(i) {
                                let descriptor = format!("argument {} to function '{}'", i + 1, self.interner.resolve(*name));
                                self.infer_expr(arg, Some(param_ty), &descriptor);
                            } else {
                                self.infer_expr(arg, None, "call argument");
                            }
                        }
                        Some((*result).clone())
                    }
                    SymbolKind::Enum | SymbolKind::Let => {
                        self.error(TYP_CALLEE_NOT_CALLABLE, call.span, format!("symbol '{}' is not callable", self.interner.resolve(*name)));
                        None
                    }
                }
            }
            Lookup::Ambiguous(modules) => {
                let modules_str = modules.iter().map(|m| self.interner.resolve(*m).to_string()).collect::<Vec<_>>().join("', '");
                let hints = modules
                    .iter()
                    .map(|m| format!("'{}::{}'", self.interner.resolve(*m), self.interner.resolve(*name)))
                    .collect::<Vec<_>>()
                    .join(" or ");
                self.error(
                    TYP_UNRESOLVED_CALLEE,
                    call.span,
                    format!("ambiguous identifier '{}' (imported from modules '{modules_str}'); use {hints} to disambiguate", self.interner.resolve(*name)),
                );
                None
            }
            Lookup::UnknownModule(m) | Lookup::ModuleNotImported(m) => {
                self.error(TYP_UNRESOLVED_CALLEE, *span, format!("unknown identifier '{}' (module '{m}')", self.qualified_display(*module, *name)));
                None
            }
            Lookup::NotFound => {
                self.error(TYP_UNRESOLVED_CALLEE, *span, format!("unknown identifier '{}'", self.qualified_display(*module, *name)));
                None
            }
        }
    }

    fn infer_struct_ctor(&mut self, call: &ast::CallExpr, _sym: &ModSymbol, struct_mod: Symbol, struct_name: Symbol) -> Option<Type> {
        let Some(info) = self.tables.struct_infos.get(&(struct_mod, struct_name)).cloned() else {
            self.error(TYP_CTOR_NO_INFO, call.span, format!("no type information for struct '{}'", self.interner.resolve(struct_name)));
            return None;
        };
        if info.fields.len() != call.args.len() {
            self.error(
                TYP_CTOR_ARITY,
                call.span,
                format!(
                    "struct constructor '{}' expects {} argument(s), got {}",
                    self.interner.resolve(struct_name),
                    info.fields.len(),
                    call.args.len()
                ),
            );
        }
        for (i, arg) in call.args.iter().enumerate() {
            if let Some((field_name, field_ty)) = info.fields.get(i) {
                let descriptor = format!(
                    "argument {} to struct constructor '{}' for field '{}'",
                    i + 1,
                    self.interner.resolve(struct_name),
                    self.interner.resolve(*field_name)
                );
                self.infer_expr(arg, Some(field_ty), &descriptor);
            }
        }
        Some(Type::Struct(struct_mod, struct_name))
    }

    fn infer_variant_ctor(&mut self, call: &ast::CallExpr, sym: &ModSymbol, variant_name: Symbol) -> Option<Type> {
        let Some(Type::Func(params, result)) = sym.resolved_type.clone() else {
            self.error(TYP_VARIANT_NO_INFO, call.span, format!("variant '{}' has no type information", self.interner.resolve(variant_name)));
            return None;
        };
        if params.len() != call.args.len() {
            self.error(
                TYP_VARIANT_ARITY,
                call.span,
                format!(
                    "variant constructor '{}' expects {} argument(s), got {}",
                    self.interner.resolve(variant_name),
                    params.len(),
                    call.args.len()
                ),
            );
        }
        for (i, arg) in call.args.iter().enumerate() {
            if let Some(param_ty) = params.get(i) {
                let descriptor = format!("argument {} to variant constructor '{}'", i + 1, self.interner.resolve(variant_name));
                self.infer_expr(arg, Some(param_ty), &descriptor);
            }
        }
        Some((*result).clone())
    }

    fn infer_index(&mut self, idx: &ast::IndexExpr) -> Option<Type> {
        let array_ty = self.infer_expr(&idx.object, None, "indexed expression");
        let index_ty = self.infer_expr(&idx.index, None, "index");

        if let Some(t) = &index_ty {
            if !t.is_integer_kind() {
                self.error(TYP_INDEX_NOT_INT, idx.span, format!("index expression must have type 'int', got '{}'", format_type(t, self.interner)));
            }
        }

        match &array_ty {
            Some(Type::Nullable(_)) => {
                self.error(
                    TYP_INDEX_NULLABLE_POINTER,
                    idx.span,
                    format!("cannot index into nullable type '{}'; expected a non-null array", format_type(array_ty.as_ref().unwrap(), self.interner)),
                );
                None
            }
            Some(t) => {
                self.error(TYP_INDEX_RESERVED, idx.span, format!("cannot index into expression of type '{}'; expected an array type", format_type(t, self.interner)));
                None
            }
            None => None,
        }
    }

    fn infer_field(&mut self, field: &ast::FieldExpr) -> Option<Type> {
        let mut obj_ty = self.infer_expr(&field.object, None, "field access target")?;

        if let Type::Nullable(inner) = &obj_ty {
            if matches!(**inner, Type::Struct(..)) {
                self.error(
                    TYP_FIELD_THROUGH_NULLABLE,
                    field.span,
                    format!("cannot access field '{}' on nullable struct '{}'; expected a non-null struct", self.interner.resolve(field.field), format_type(&obj_ty, self.interner)),
                );
                return None;
            }
        }

        if let Type::Pointer(inner) = &obj_ty {
            if matches!(**inner, Type::Struct(..)) {
                obj_ty = (**inner).clone();
            }
        }

        match &obj_ty {
            Type::Struct(m, n) => {
                let info = self.tables.struct_infos.get(&(*m, *n))?;
                if let Some((_, ty)) = info.fields.iter().find(|(name, _)| *name == field.field) {
                    Some(ty.clone())
                } else {
                    self.error(
                        TYP_UNKNOWN_FIELD,
                        field.span,
                        format!("struct '{}' has no field '{}'", format_type(&obj_ty, self.interner), self.interner.resolve(field.field)),
                    );
                    None
                }
            }
            t => {
                self.error(TYP_FIELD_NOT_STRUCT, field.span, format!("cannot access field '{}' on non-struct type '{}'", self.interner.resolve(field.field), format_type(t, self.interner)));
                None
            }
        }
    }

    fn infer_cast(&mut self, cast: &ast::CastExpr) -> Option<Type> {
        let expr_ty = self.infer_expr(&cast.expr, None, "cast operand")?;
        let target_ty = self.resolve_local_type(&cast.target)?;

        if can_assign(&target_ty, &expr_ty, true) {
            Some(target_ty)
        } else {
            self.error(
                TYP_INVALID_CAST,
                cast.span,
                format!("cannot cast from '{}' to '{}'", format_type(&expr_ty, self.interner), format_type(&target_ty, self.interner)),
            );
            None
        }
    }

    fn infer_try(&mut self, inner: &ast::Expr, span: Span) -> Option<Type> {
        let inner_ty = self.infer_expr(inner, None, "try operand")?;
        let Type::Nullable(payload) = &inner_ty else {
            self.error(TYP_TRY_NOT_NULLABLE, span, format!("cannot apply '?' to non-nullable type '{}'", format_type(&inner_ty, self.interner)));
            return None;
        };
        if !matches!(self.func_result, Type::Nullable(_)) {
            self.error(TYP_TRY_FN_NOT_NULLABLE, span, "cannot use '?' in a function that does not return a nullable type (T?)");
            return None;
        }
        Some((**payload).clone())
    }

    fn infer_new(&mut self, new_expr: &ast::NewExpr) -> Option<Type> {
        let base_ty = self.resolve_local_type(&new_expr.target);

        let Some(base_ty) = base_ty else {
            if let ast::TypeExpr::Named { module, name, .. } = &new_expr.target {
                if let Lookup::Found(sym) = self.lookup_symbol(*module, *name) {
                    if sym.kind == SymbolKind::EnumVariant {
                        let sym = sym.clone();
                        let synth_call = ast::CallExpr {
                            callee: Box::new(ast::Expr::VarRef { module: *module, name: *name, span: new_expr.span }),
                            args: new_expr.args.clone(),
                            span: new_expr.span,
                        };
                        let enum_ty = self.infer_variant_ctor(&synth_call, &sym, *name);
                        return enum_ty.map(|t| Type::Pointer(Box::new(t)));
                    }
                }
            }
            self.error(TYP_NEW_UNKNOWN_TYPE, new_expr.span, "unknown type in 'new' expression");
            return None;
        };

        match &base_ty {
            Type::Enum(..) => {
                self.error(
                    TYP_NEW_ENUM_NO_VARIANT,
                    new_expr.span,
                    format!("cannot allocate enum type '{}' without a variant", format_type(&base_ty, self.interner)),
                );
                None
            }
            Type::Struct(m, n) => {
                let Some(info) = self.tables.struct_infos.get(&(*m, *n)).cloned() else {
                    self.error(TYP_NEW_STRUCT_NO_INFO, new_expr.span, format!("missing struct info for {}.{}", self.interner.resolve(*m), self.interner.resolve(*n)));
                    return None;
                };
                if !new_expr.args.is_empty() {
                    if new_expr.args.len() != info.fields.len() {
                        self.error(
                            TYP_NEW_STRUCT_ARITY,
                            new_expr.span,
                            format!("struct '{}' expects {} argument(s), got {}", self.interner.resolve(*n), info.fields.len(), new_expr.args.len()),
                        );
                    }
                    for (field, arg) in info.fields.iter().zip(&new_expr.args) {
                        let descriptor = format!("field '{}' of struct '{}'", self.interner.resolve(field.0), self.interner.resolve(*n));
                        self.infer_expr(arg, Some(&field.1), &descriptor);
                    }
                }
                Some(Type::Pointer(Box::new(base_ty.clone())))
            }
            _ => {
                if new_expr.args.len() > 1 {
                    self.error(
                        TYP_NEW_BARE_ARITY,
                        new_expr.span,
                        format!("'new {}' expects at most 1 argument, got {}", format_type(&base_ty, self.interner), new_expr.args.len()),
                    );
                } else if new_expr.args.len() == 1 {
                    let arg_ty = self.infer_expr(&new_expr.args[0], None, "new initializer");
                    if let Some(arg_ty) = &arg_ty {
                        if !can_assign(&base_ty, arg_ty, false) {
                            self.error(
                                TYP_NEW_BARE_MISMATCH,
                                new_expr.args[0].span(),
                                format!("cannot initialize '{}' with value of type '{}'", format_type(&base_ty, self.interner), format_type(arg_ty, self.interner)),
                            );
                        }
                    }
                }
                Some(Type::Pointer(Box::new(base_ty)))
            }
        }
    }
}

fn stmt_span(stmt: &ast::Stmt) -> Span {
    match stmt {
        ast::Stmt::Block(b) => b.span,
        ast::Stmt::Let(s) => s.span,
        ast::Stmt::Assign(s) => s.span,
        ast::Stmt::Expr(e) => e.span(),
        ast::Stmt::If(s) => s.span,
        ast::Stmt::While(s) => s.span,
        ast::Stmt::For(s) => s.span,
        ast::Stmt::Return(s) => s.span,
        ast::Stmt::Match(s) => s.span,
        ast::Stmt::Case(s) => s.span,
        ast::Stmt::With(s) => s.span,
        ast::Stmt::Drop(s) => s.span,
        ast::Stmt::Break(s) | ast::Stmt::Continue(s) => *s,
    }
}

fn literal_type(lit: &ast::Literal) -> Type {
    match lit {
        ast::Literal::Int(_) => Type::Builtin(Builtin::Int),
        ast::Literal::Byte(_) => Type::Builtin(Builtin::Byte),
        ast::Literal::Bool(_) => Type::Builtin(Builtin::Bool),
        ast::Literal::String(_) => Type::Builtin(Builtin::String),
        ast::Literal::Null => Type::Null,
    }
}

fn literal_key(lit: &ast::Literal) -> String {
    match lit {
        ast::Literal::Int(i) => format!("i{i}"),
        ast::Literal::Byte(b) => format!("b{b}"),
        ast::Literal::Bool(b) => format!("B{b}"),
        ast::Literal::String(s) => format!("s{s}"),
        ast::Literal::Null => "null".to_string(),
    }
}

fn is_nullable_or_ptr(ty: &Type) -> bool {
    matches!(ty, Type::Nullable(_) | Type::Pointer(_))
}

fn op_text(op: ast::BinOp) -> &'static str {
    match op {
        ast::BinOp::Add => "+",
        ast::BinOp::Sub => "-",
        ast::BinOp::Mul => "*",
        ast::BinOp::Div => "/",
        ast::BinOp::Mod => "%",
        ast::BinOp::Lt => "<",
        ast::BinOp::LtEq => "<=",
        ast::BinOp::Gt => ">",
        ast::BinOp::GtEq => ">=",
        ast::BinOp::Eq => "==",
        ast::BinOp::NotEq => "!=",
        ast::BinOp::And => "&&",
        ast::BinOp::Or => "||",
    }
}

fn describe_lvalue(expr: &ast::Expr, interner: &Interner) -> String {
    match expr {
        ast::Expr::VarRef { name, .. } => format!("variable '{}'", interner.resolve(*name)),
        ast::Expr::Field(f) => format!("field '{}'", interner.resolve(f.field)),
        ast::Expr::Index(_) => "array element".to_string(),
        ast::Expr::Unary(u) if u.op == ast::UnOp::Deref => "dereferenced pointer".to_string(),
        _ => "expression".to_string(),
    }
}

pub fn format_type(ty: &Type, interner: &Interner) -> String {
    match ty {
        Type::Builtin(b) => b.name().to_string(),
        Type::Struct(m, n) | Type::Enum(m, n) => format!("{}::{}", interner.resolve(*m), interner.resolve(*n)),
        Type::Pointer(inner) => format!("{}*", format_type(inner, interner)),
        Type::Nullable(inner) => format!("{}?", format_type(inner, interner)),
        Type::Func(params, result) => format!(
            "({}) -> {}",
            params.iter().map(|p| format_type(p, interner)).collect::<Vec<_>>().join(", "),
            format_type(result, interner)
        ),
        Type::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_names;
    use crate::sig::resolve_signatures;
    use crate::{module_key, SemaResult};
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

    fn run(src: &str) -> (Handler, SemaResult) {
        let mut interner = Interner::new();
        let module = parse_module(src, &mut interner, "t.l0");
        let modules = vec![module];
        let mut handler = Handler::new();
        let result = crate::analyze(&modules, &mut interner, &mut handler);
        (handler, result)
    }

    #[test]
    fn arithmetic_and_return_type_check() {
        let (handler, _) = run(
            "module m;\nfunc add(a: int, b: int) -> int {\n\treturn a + b;\n}\n",
        );
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn if_without_else_never_guarantees_return() {
        let (handler, _) = run(
            "module m;\nfunc f(a: bool) -> int {\n\tif (a) {\n\t\treturn 1;\n\t}\n}\n",
        );
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("TYP-0010")));
    }

    #[test]
    fn if_else_both_returning_satisfies_function() {
        let (handler, _) = run(
            "module m;\nfunc f(a: bool) -> int {\n\tif (a) {\n\t\treturn 1;\n\t} else {\n\t\treturn 2;\n\t}\n}\n",
        );
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn drop_then_use_is_rejected() {
        let (handler, _) = run(
            "module m;\nstruct P { x: int; }\nfunc f() -> int {\n\tlet p: P* = new P(1);\n\tdrop p;\n\treturn *p.x;\n}\n",
        );
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("TYP-0150") || d.message.contains("TYP-0222")));
    }

    #[test]
    fn match_requires_exhaustive_arms() {
        let (handler, _) = run(
            "module m;\nenum E { A(); B(); }\nfunc f(e: E) -> int {\n\tmatch (e) {\n\t\tA() => { return 1; }\n\t}\n\treturn 0;\n}\n",
        );
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("TYP-0104")));
    }

    #[test]
    fn struct_constructor_arity_is_checked() {
        let (handler, _) = run(
            "module m;\nstruct P { x: int; y: int; }\nfunc f() -> P {\n\treturn P(1);\n}\n",
        );
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("TYP-0191")));
    }

    #[test]
    fn duplicate_local_is_rejected() {
        let (handler, _) = run(
            "module m;\nfunc f() -> int {\n\tlet x: int = 1;\n\tlet x: int = 2;\n\treturn x;\n}\n",
        );
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("TYP-0020")));
    }

    #[test]
    fn sizeof_and_ord_are_well_typed() {
        let (handler, _) = run(
            "module m;\nenum E { A(); B(); }\nfunc f(e: E) -> int {\n\treturn sizeof(int) + ord(e);\n}\n",
        );
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    }

    #[test]
    fn module_key_helper_is_stable() {
        let mut interner = Interner::new();
        let a = interner.intern("m");
        assert_eq!(module_key(&mut interner, &[a]), module_key(&mut interner, &[a]));
    }
}
