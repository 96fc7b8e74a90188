//! Top-level orchestration: turns an [`Analysis`] into one C99 translation
//! unit (spec.md §4.8), grounded on the original implementation's
//! `Backend.generate` (`l0_backend.py`).
//!
//! Emission order mirrors the original: a fixed preamble (includes, builtin
//! typedefs), early value-optional wrappers, struct/enum definitions in
//! dependency order, late value-optional wrappers, function declarations
//! (forward prototypes, so call order never matters), function
//! definitions, and finally a C `main()` wrapper if the program declares an
//! entry point.

use l0_par::ast::{self, Block, ElseBranch, Expr, Stmt};
use l0_sem::symbol::{ModSymbol, SymbolKind};
use l0_sem::{Builtin, SignatureTables, Type};
use l0_util::{FxHashMap, IceError, IceResult, Interner, Span, Symbol};

use crate::analysis::Analysis;
use crate::cleanup::{ScopeStack, WithCleanup};
use crate::ctype::{self, WrapperSet};
use crate::error::*;
use crate::mangle;
use crate::writer::Writer;

/// Mutable state threaded through one call to [`generate`]. Lives only for
/// the duration of code generation; nothing here survives it.
pub struct Lowering<'a> {
    pub(crate) analysis: &'a Analysis<'a>,
    pub(crate) tables: &'a SignatureTables,
    pub(crate) interner: &'a mut Interner,
    module_by_key: FxHashMap<Symbol, &'a ast::Module>,
    pub(crate) out: Writer,
    pub(crate) scopes: ScopeStack,
    pub(crate) current_module: Symbol,
    pub(crate) current_func: Symbol,
    pub(crate) current_result_ty: Type,
    pub(crate) tmp_counter: u32,
    label_counter: u32,
    /// Continue-target label for each loop currently being lowered,
    /// innermost last — a `continue` inside a `for` must still run the
    /// loop's update clause, which a bare C `continue` can't express once
    /// the loop itself is lowered as a `while (1) { ... }` (spec.md §4.8
    /// "Cleanup scheduling").
    loop_label_stack: Vec<String>,
    next_stmt_unreachable: bool,
}

/// Lowers a fully type-checked compilation unit into a single C99 source
/// string.
pub fn generate(analysis: &Analysis, interner: &mut Interner) -> IceResult<String> {
    let module_by_key: FxHashMap<Symbol, &ast::Module> = analysis
        .modules
        .iter()
        .map(|m| (l0_sem::module_key(interner, &m.name), m))
        .collect();

    let placeholder = interner.intern("<none>");

    let mut lowering = Lowering {
        analysis,
        tables: analysis.tables,
        interner,
        module_by_key,
        out: Writer::new(),
        scopes: ScopeStack::new(),
        current_module: placeholder,
        current_func: placeholder,
        current_result_ty: Type::Builtin(Builtin::Void),
        tmp_counter: 0,
        label_counter: 0,
        loop_label_stack: Vec::new(),
        next_stmt_unreachable: false,
    };

    lowering.emit_preamble();

    let mut wrappers = WrapperSet::new();
    wrappers.collect(lowering.interner, lowering.tables, lowering.analysis.all_expr_types());
    wrappers.emit(&mut lowering.out, lowering.interner, lowering.tables, true)?;

    let ordered = lowering.type_definition_order()?;
    for (module_key, name) in &ordered {
        lowering.emit_type_definition(*module_key, *name)?;
    }

    wrappers.emit(&mut lowering.out, lowering.interner, lowering.tables, false)?;
    lowering.out.emit_blank();

    lowering.emit_function_prototypes()?;
    lowering.out.emit_blank();

    for module in lowering.analysis.modules {
        let key = l0_sem::module_key(&mut *lowering.interner, &module.name);
        for decl in &module.decls {
            if let ast::Decl::Func(f) = decl {
                if f.body.is_some() {
                    lowering.emit_function_definition(key, f)?;
                }
            }
        }
    }

    lowering.emit_main_wrapper_if_needed()?;

    Ok(lowering.out.into_string())
}

impl<'a> Lowering<'a> {
    fn emit_preamble(&mut self) {
        self.out.emit("/* Generated by the L0 compiler. Do not edit by hand. */");
        self.out.emit("#include <stdint.h>");
        self.out.emit("#include <stddef.h>");
        self.out.emit("#include \"l0_runtime.h\"");
        self.out.emit_blank();
        self.out.emit("typedef int32_t l0_int;");
        self.out.emit("typedef uint8_t l0_byte;");
        self.out.emit("typedef uint8_t l0_bool;");
        self.out.emit_blank();
    }

    /// Builds the set of struct/enum declarations in topological
    /// value-containment order (a struct must be fully defined before
    /// anything that embeds it *by value*; a pointer-typed field never
    /// creates an ordering edge, since C only needs a forward declaration
    /// for that). Grounded on the original's
    /// `_build_type_dependency_graph`/`_topological_sort` (Kahn's
    /// algorithm); a cycle here is impossible post signature-resolution
    /// (spec.md §4.5 already rejects one), so any leftover node is an ICE.
    fn type_definition_order(&self) -> IceResult<Vec<(Symbol, Symbol)>> {
        let mut nodes: Vec<(Symbol, Symbol)> = self.tables.struct_infos.keys().copied().collect();
        nodes.extend(self.tables.enum_infos.keys().copied());
        nodes.sort_by_key(|(m, n)| (self.interner.resolve(*m).to_string(), self.interner.resolve(*n).to_string()));

        let mut deps: FxHashMap<(Symbol, Symbol), Vec<(Symbol, Symbol)>> = FxHashMap::default();
        for key in &nodes {
            deps.insert(*key, self.value_type_dependencies(*key));
        }

        let mut in_degree: FxHashMap<(Symbol, Symbol), usize> = nodes.iter().map(|k| (*k, 0)).collect();
        for key in &nodes {
            for dep in &deps[key] {
                if let Some(d) = in_degree.get_mut(dep) {
                    *d += 1;
                }
            }
        }

        // Kahn's algorithm, but queued the other way round: a node is
        // ready once every node *it depends on* has already been emitted,
        // so we track remaining-dependency counts per node instead of
        // fan-out in-degree.
        let mut remaining: FxHashMap<(Symbol, Symbol), usize> =
            nodes.iter().map(|k| (*k, deps[k].len())).collect();
        let mut ready: Vec<(Symbol, Symbol)> = nodes.iter().copied().filter(|k| remaining[k] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());
        let mut dependents: FxHashMap<(Symbol, Symbol), Vec<(Symbol, Symbol)>> = FxHashMap::default();
        for key in &nodes {
            for dep in &deps[key] {
                dependents.entry(*dep).or_default().push(*key);
            }
        }

        while let Some(key) = ready.pop() {
            order.push(key);
            if let Some(ds) = dependents.get(&key) {
                for d in ds {
                    if let Some(r) = remaining.get_mut(d) {
                        *r -= 1;
                        if *r == 0 {
                            ready.push(*d);
                        }
                    }
                }
            }
        }

        if order.len() != nodes.len() {
            return Err(IceError::new(ICE_TYPE_CYCLE, "value-type dependency graph has a cycle"));
        }
        Ok(order)
    }

    fn value_type_dependencies(&self, key: (Symbol, Symbol)) -> Vec<(Symbol, Symbol)> {
        let mut deps = Vec::new();
        if let Some(info) = self.tables.struct_infos.get(&key) {
            for (_, ty) in &info.fields {
                extract_value_dependency(ty, &mut deps);
            }
        } else if let Some(info) = self.tables.enum_infos.get(&key) {
            for (_, fields) in &info.variants {
                for ty in fields {
                    extract_value_dependency(ty, &mut deps);
                }
            }
        }
        deps
    }

    fn emit_type_definition(&mut self, module: Symbol, name: Symbol) -> IceResult<()> {
        if let Some(info) = self.tables.struct_infos.get(&(module, name)).cloned() {
            let c_name = mangle::mangle_struct_name(self.interner, module, name);
            self.out.emit(format!("struct {c_name} {{"));
            self.out.indent();
            for (field_name, ty) in &info.fields {
                let c_ty = ctype::emit_type(self.interner, self.tables, ty)?;
                let field = mangle::mangle_identifier(self.interner.resolve(*field_name));
                self.out.emit(format!("{c_ty} {field};"));
            }
            self.out.dedent();
            self.out.emit("};");
            self.out.emit_blank();
        } else if let Some(info) = self.tables.enum_infos.get(&(module, name)).cloned() {
            let c_name = mangle::mangle_enum_name(self.interner, module, name);
            let tag_ty = ctype::emit_enum_tag_name(self.interner, module, name);
            self.out.emit(format!("typedef enum {{"));
            self.out.indent();
            for (variant_name, _) in &info.variants {
                let tag_const = mangle::enum_tag_constant(self.interner, module, name, *variant_name);
                self.out.emit(format!("{tag_const},"));
            }
            self.out.dedent();
            self.out.emit(format!("}} {tag_ty};"));
            self.out.emit_blank();

            self.out.emit(format!("struct {c_name} {{"));
            self.out.indent();
            self.out.emit(format!("{tag_ty} tag;"));
            let has_payload = info.variants.iter().any(|(_, fields)| !fields.is_empty());
            if has_payload {
                self.out.emit("union {");
                self.out.indent();
                for (variant_name, fields) in &info.variants {
                    if fields.is_empty() {
                        continue;
                    }
                    let member = mangle::mangle_identifier(self.interner.resolve(*variant_name));
                    self.out.emit("struct {");
                    self.out.indent();
                    for (i, ty) in fields.iter().enumerate() {
                        let c_ty = ctype::emit_type(self.interner, self.tables, ty)?;
                        self.out.emit(format!("{c_ty} f{i};"));
                    }
                    self.out.dedent();
                    self.out.emit(format!("}} {member};"));
                }
                self.out.dedent();
                self.out.emit("} payload;");
            }
            self.out.dedent();
            self.out.emit("};");
            self.out.emit_blank();
        }
        Ok(())
    }

    fn emit_function_prototypes(&mut self) -> IceResult<()> {
        for module in self.analysis.modules {
            let key = l0_sem::module_key(&mut *self.interner, &module.name);
            for decl in &module.decls {
                let ast::Decl::Func(f) = decl else { continue };
                if f.is_extern {
                    continue;
                }
                let sig = self.function_signature(key, f)?;
                self.out.emit(format!("{sig};"));
            }
        }
        Ok(())
    }

    fn function_signature(&mut self, module: Symbol, f: &ast::FuncDecl) -> IceResult<String> {
        let func_ty = self.tables.func_types.get(&(module, f.name)).cloned().unwrap_or(Type::Func(
            Vec::new(),
            Box::new(Type::Builtin(Builtin::Void)),
        ));
        let Type::Func(params, result) = func_ty else {
            return Err(IceError::new(ICE_UNSUPPORTED_STMT, "function symbol does not have a function type"));
        };
        let result_ty = ctype::emit_type(self.interner, self.tables, &result)?;
        let name = mangle::mangle_function_name(self.interner, module, f.name);
        let mut param_strs = Vec::new();
        for (p, ty) in f.params.iter().zip(params.iter()) {
            let c_ty = ctype::emit_type(self.interner, self.tables, ty)?;
            let p_name = mangle::mangle_identifier(self.interner.resolve(p.name));
            param_strs.push(format!("{c_ty} {p_name}"));
        }
        if param_strs.is_empty() {
            param_strs.push("void".to_string());
        }
        Ok(format!("{result_ty} {name}({})", param_strs.join(", ")))
    }

    fn emit_function_definition(&mut self, module: Symbol, f: &ast::FuncDecl) -> IceResult<()> {
        let func_ty = self.tables.func_types.get(&(module, f.name)).cloned().unwrap_or(Type::Func(
            Vec::new(),
            Box::new(Type::Builtin(Builtin::Void)),
        ));
        let Type::Func(params, result) = func_ty else {
            return Err(IceError::new(ICE_UNSUPPORTED_STMT, "function symbol does not have a function type"));
        };

        self.current_module = module;
        self.current_func = f.name;
        self.current_result_ty = (*result).clone();

        let sig = self.function_signature(module, f)?;
        self.out.emit(format!("{sig} {{"));
        self.out.indent();

        self.scopes = ScopeStack::new();
        self.scopes.push();
        for (p, ty) in f.params.iter().zip(params.iter()) {
            let p_name = mangle::mangle_identifier(self.interner.resolve(p.name));
            self.scopes.current_mut().declare(p_name, ty.clone());
        }

        self.next_stmt_unreachable = false;
        let body = f.body.as_ref().expect("non-extern function has a body");
        self.emit_stmts(&body.stmts)?;

        // A function whose body falls through without an explicit `return`
        // is only well-typed when its result is `void` (spec.md §4.7
        // "every path through a non-void function must return"); such a
        // fall-through still needs its scope's owned vars cleaned up.
        if !self.next_stmt_unreachable {
            self.emit_cleanup_current_scope_only()?;
        }
        self.scopes.pop();

        self.out.dedent();
        self.out.emit("}");
        self.out.emit_blank();
        Ok(())
    }

    fn emit_main_wrapper_if_needed(&mut self) -> IceResult<()> {
        let Some(entry) = self.analysis.entry_module else { return Ok(()) };
        let main_name = self.interner.intern("main");
        if !self.tables.func_types.contains_key(&(entry, main_name)) {
            return Ok(());
        }
        let callee = mangle::mangle_function_name(self.interner, entry, main_name);
        self.out.emit("int main(int argc, char** argv) {");
        self.out.indent();
        self.out.emit(format!("{RT_INIT_ARGS}(argc, argv);", RT_INIT_ARGS = crate::runtime::RT_INIT_ARGS));
        let result = self.tables.func_types.get(&(entry, main_name)).and_then(|t| match t {
            Type::Func(_, r) => Some((**r).clone()),
            _ => None,
        });
        match result {
            Some(Type::Builtin(Builtin::Int)) => {
                self.out.emit(format!("return (int){callee}();"));
            }
            _ => {
                self.out.emit(format!("{callee}();"));
                self.out.emit("return 0;");
            }
        }
        self.out.dedent();
        self.out.emit("}");
        Ok(())
    }

    // ---- Symbol/type resolution helpers ----
    // No standalone `resolve_symbol`/`resolve_type_ref` helper is exported
    // from the semantic-analysis crate (unlike the original's resolver
    // module, which the backend delegates to directly) — these walk the
    // module environments' own maps instead.

    pub(crate) fn lookup_symbol(&self, module: Option<Symbol>, name: Symbol, span: Span) -> IceResult<ModSymbol> {
        let env_key = match module {
            Some(m) => self.qualifier_to_module_key(m),
            None => self.current_module,
        };
        let env = self
            .analysis
            .envs
            .get(&env_key)
            .ok_or_else(|| IceError::new(ICE_MISSING_EXPR_TYPE, "unknown module environment").with_span(span))?;
        env.all
            .get(&name)
            .cloned()
            .ok_or_else(|| IceError::new(ICE_MISSING_EXPR_TYPE, format!("unresolved symbol '{}'", self.interner.resolve(name))).with_span(span))
    }

    fn qualifier_to_module_key(&self, qualifier: Symbol) -> Symbol {
        let text = self.interner.resolve(qualifier).to_string();
        for key in self.module_by_key.keys() {
            if self.interner.resolve(*key) == text {
                return *key;
            }
        }
        qualifier
    }

    pub(crate) fn is_extern_function(&self, module: Symbol, name: Symbol) -> bool {
        self.module_by_key
            .get(&module)
            .into_iter()
            .flat_map(|m| m.decls.iter())
            .any(|d| matches!(d, ast::Decl::Func(f) if f.name == name && f.is_extern))
    }

    pub(crate) fn find_variant_decl(&self, module: Symbol, variant_name: Symbol) -> Option<(Symbol, Vec<Type>)> {
        let m = self.module_by_key.get(&module)?;
        for decl in &m.decls {
            if let ast::Decl::Enum(e) = decl {
                if e.variants.iter().any(|v| v.name == variant_name) {
                    let info = self.tables.enum_infos.get(&(module, e.name))?;
                    let fields = info.variants.iter().find(|(n, _)| *n == variant_name)?.1.clone();
                    return Some((e.name, fields));
                }
            }
        }
        None
    }

    pub(crate) fn resolve_type_ref(&self, ty: &ast::TypeExpr, span: Span) -> IceResult<Type> {
        match ty {
            ast::TypeExpr::Pointer(inner, _) => Ok(Type::Pointer(Box::new(self.resolve_type_ref(inner, span)?))),
            ast::TypeExpr::Nullable(inner, _) => Ok(Type::Nullable(Box::new(self.resolve_type_ref(inner, span)?))),
            ast::TypeExpr::Named { module, name, span: nspan } => {
                let text = self.interner.resolve(*name).to_string();
                if module.is_none() {
                    if let Some(b) = Builtin::from_name(&text) {
                        return Ok(Type::Builtin(b));
                    }
                }
                let sym = self.lookup_symbol(*module, *name, *nspan)?;
                match sym.kind {
                    SymbolKind::Struct => Ok(Type::Struct(sym.module, sym.name)),
                    SymbolKind::Enum => Ok(Type::Enum(sym.module, sym.name)),
                    SymbolKind::TypeAlias => sym
                        .resolved_type
                        .clone()
                        .ok_or_else(|| IceError::new(ICE_UNKNOWN_TYPE_KIND, "unresolved type alias reached code emission").with_span(span)),
                    _ => Err(IceError::new(ICE_UNKNOWN_TYPE_KIND, format!("symbol '{text}' is not a type")).with_span(span)),
                }
            }
        }
    }
}

/// Statement lowering and cleanup scheduling (spec.md §4.8 "Cleanup
/// scheduling"), grounded on the original implementation's
/// `Backend._emit_stmt` family and its scope-context push/pop bookkeeping.
impl<'a> Lowering<'a> {
    pub(crate) fn emit_stmts(&mut self, stmts: &[Stmt]) -> IceResult<()> {
        for s in stmts {
            self.emit_stmt(s)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, s: &Stmt) -> IceResult<()> {
        match s {
            Stmt::Block(b) => {
                self.out.emit("{");
                self.out.indent();
                self.scopes.push();
                self.next_stmt_unreachable = false;
                self.emit_stmts(&b.stmts)?;
                if !self.next_stmt_unreachable {
                    self.emit_cleanup_current_scope_only()?;
                }
                self.scopes.pop();
                self.out.dedent();
                self.out.emit("}");
                Ok(())
            }
            Stmt::Let(l) => self.emit_let(l),
            Stmt::Assign(a) => self.emit_assign(a),
            Stmt::Expr(e) => {
                let value = self.emit_expr_owned_if_needed(e)?;
                self.out.emit(format!("{value};"));
                Ok(())
            }
            Stmt::If(i) => self.emit_if(i),
            Stmt::While(w) => self.emit_while(w),
            Stmt::For(f) => self.emit_for(f),
            Stmt::Return(r) => self.emit_return(r),
            Stmt::Match(m) => self.emit_match(m),
            Stmt::Case(c) => self.emit_case(c),
            Stmt::With(w) => self.emit_with(w),
            Stmt::Drop(d) => self.emit_drop(d),
            Stmt::Break(span) => self.emit_break(*span),
            Stmt::Continue(span) => self.emit_continue(*span),
        }
    }

    fn emit_let(&mut self, l: &ast::LocalLet) -> IceResult<()> {
        let ty = match &l.ty {
            Some(texpr) => self.resolve_type_ref(texpr, l.span)?,
            None => self.expr_type(&l.init)?,
        };
        let value = self.emit_owned_expr_with_expected_type(&l.init, &ty)?;
        let c_ty = ctype::emit_type(self.interner, self.tables, &ty)?;
        let name = mangle::mangle_identifier(self.interner.resolve(l.name));
        self.out.emit(format!("{c_ty} {name} = {value};"));
        self.scopes.current_mut().declare(name.clone(), ty.clone());
        if self.analysis.has_arc_data(&ty) {
            self.scopes.current_mut().add_owned(name, ty);
        }
        Ok(())
    }

    fn emit_assign(&mut self, a: &ast::AssignStmt) -> IceResult<()> {
        let ty = self.expr_type(&a.target)?;
        let target_str = self.emit_expr(&a.target)?;
        let value = self.emit_owned_expr_with_expected_type(&a.value, &ty)?;
        if self.analysis.has_arc_data(&ty) {
            self.emit_release_value(&target_str, &ty)?;
        }
        self.out.emit(format!("{target_str} = {value};"));
        if let Expr::VarRef { module: None, name, .. } = &a.target {
            let mangled = mangle::mangle_identifier(self.interner.resolve(*name));
            if self.analysis.has_arc_data(&ty) {
                self.scopes.current_mut().promote_to_owned(&mangled, ty);
            }
        }
        Ok(())
    }

    /// Emits one `if`/`else`/`else if` chain as nested C blocks (rather
    /// than a single-line `} else if (...) {`, which the line-oriented
    /// [`Writer`] can't compose) and reports whether the whole chain is
    /// unreachable afterwards — true only when every branch, including an
    /// `else`, is (spec.md §4.8 "Unreachability tracking").
    fn emit_if(&mut self, i: &ast::IfStmt) -> IceResult<()> {
        let unreachable = self.emit_if_inner(i)?;
        self.next_stmt_unreachable = unreachable;
        Ok(())
    }

    fn emit_if_inner(&mut self, i: &ast::IfStmt) -> IceResult<bool> {
        let cond = self.emit_expr_owned_if_needed(&i.cond)?;
        self.out.emit(format!("if ({cond}) {{"));
        self.out.indent();
        self.scopes.push();
        self.next_stmt_unreachable = false;
        self.emit_stmts(&i.then_block.stmts)?;
        let then_unreachable = self.next_stmt_unreachable;
        if !then_unreachable {
            self.emit_cleanup_current_scope_only()?;
        }
        self.scopes.pop();
        self.out.dedent();

        let (else_unreachable, has_else) = match &i.else_block {
            None => {
                self.out.emit("}");
                (false, false)
            }
            Some(ElseBranch::Block(b)) => {
                self.out.emit("} else {");
                self.out.indent();
                self.scopes.push();
                self.next_stmt_unreachable = false;
                self.emit_stmts(&b.stmts)?;
                let u = self.next_stmt_unreachable;
                if !u {
                    self.emit_cleanup_current_scope_only()?;
                }
                self.scopes.pop();
                self.out.dedent();
                self.out.emit("}");
                (u, true)
            }
            Some(ElseBranch::If(elif)) => {
                self.out.emit("} else {");
                self.out.indent();
                let u = self.emit_if_inner(elif)?;
                self.out.dedent();
                self.out.emit("}");
                (u, true)
            }
        };
        Ok(has_else && then_unreachable && else_unreachable)
    }

    /// Lowered as `while (1) { if (!(cond)) break; <body> <label>: ; }`
    /// rather than a native C `while`, so [`emit_continue`]'s cleanup-then-
    /// jump has a single uniform target shared with [`emit_for`].
    fn emit_while(&mut self, w: &ast::WhileStmt) -> IceResult<()> {
        self.label_counter += 1;
        let label = format!("_cont_{}", self.label_counter);
        self.out.emit("while (1) {");
        self.out.indent();
        self.scopes.push_loop();
        self.loop_label_stack.push(label.clone());

        let cond = self.emit_expr_owned_if_needed(&w.cond)?;
        self.out.emit(format!("if (!({cond})) {{ break; }}"));
        self.next_stmt_unreachable = false;
        self.emit_stmts(&w.body.stmts)?;
        if !self.next_stmt_unreachable {
            self.emit_cleanup_current_scope_only()?;
        }
        self.out.emit(format!("{label}: ;"));

        self.loop_label_stack.pop();
        self.scopes.pop();
        self.out.dedent();
        self.out.emit("}");
        self.next_stmt_unreachable = false;
        Ok(())
    }

    fn emit_for(&mut self, f: &ast::ForStmt) -> IceResult<()> {
        self.out.emit("{");
        self.out.indent();
        self.scopes.push();
        if let Some(init) = f.init.as_deref() {
            self.emit_stmt(init)?;
        }

        self.label_counter += 1;
        let label = format!("_cont_{}", self.label_counter);
        self.out.emit("while (1) {");
        self.out.indent();
        self.scopes.push_loop();
        self.loop_label_stack.push(label.clone());

        if let Some(cond) = &f.cond {
            let c = self.emit_expr_owned_if_needed(cond)?;
            self.out.emit(format!("if (!({c})) {{ break; }}"));
        }
        self.next_stmt_unreachable = false;
        self.emit_stmts(&f.body.stmts)?;
        if !self.next_stmt_unreachable {
            self.emit_cleanup_current_scope_only()?;
        }
        self.out.emit(format!("{label}: ;"));
        if let Some(update) = f.update.as_deref() {
            self.emit_stmt(update)?;
        }

        self.loop_label_stack.pop();
        self.scopes.pop();
        self.out.dedent();
        self.out.emit("}");

        self.emit_cleanup_current_scope_only()?;
        self.scopes.pop();
        self.out.dedent();
        self.out.emit("}");
        self.next_stmt_unreachable = false;
        Ok(())
    }

    fn emit_break(&mut self, span: Span) -> IceResult<()> {
        let loop_idx = self
            .scopes
            .innermost_loop_index()
            .ok_or_else(|| IceError::new(ICE_BREAK_OUTSIDE_LOOP, "'break' outside a loop").with_span(span))?;
        for idx in self.scopes.chain_to_loop(loop_idx).collect::<Vec<_>>() {
            self.run_with_cleanup(idx)?;
            self.emit_release_owned(idx, None)?;
        }
        self.out.emit("break;");
        self.next_stmt_unreachable = true;
        Ok(())
    }

    fn emit_continue(&mut self, span: Span) -> IceResult<()> {
        let loop_idx = self
            .scopes
            .innermost_loop_index()
            .ok_or_else(|| IceError::new(ICE_CONTINUE_OUTSIDE_LOOP, "'continue' outside a loop").with_span(span))?;
        let label = self
            .loop_label_stack
            .last()
            .cloned()
            .ok_or_else(|| IceError::new(ICE_CONTINUE_OUTSIDE_LOOP, "no continue target for this loop").with_span(span))?;
        for idx in self.scopes.chain_to_loop(loop_idx).collect::<Vec<_>>() {
            self.run_with_cleanup(idx)?;
            self.emit_release_owned(idx, None)?;
        }
        self.out.emit(format!("goto {label};"));
        self.next_stmt_unreachable = true;
        Ok(())
    }

    fn emit_return(&mut self, r: &ast::ReturnStmt) -> IceResult<()> {
        match &r.value {
            None => {
                self.emit_cleanup_to_root()?;
                self.out.emit("return;");
            }
            Some(e) => {
                let result_ty = self.current_result_ty.clone();
                let value = self.emit_owned_expr_with_expected_type(e, &result_ty)?;
                let c_ty = ctype::emit_type(self.interner, self.tables, &result_ty)?;
                let tmp = self.fresh_tmp("ret");
                self.out.emit(format!("{c_ty} {tmp} = {value};"));
                self.emit_cleanup_to_root()?;
                self.out.emit(format!("return {tmp};"));
            }
        }
        self.next_stmt_unreachable = true;
        Ok(())
    }

    fn emit_drop(&mut self, d: &ast::DropStmt) -> IceResult<()> {
        let mangled = mangle::mangle_identifier(self.interner.resolve(d.name));
        let ty = self
            .scopes
            .lookup_declared(&mangled)
            .cloned()
            .or_else(|| self.tables.let_types.get(&(self.current_module, d.name)).cloned())
            .ok_or_else(|| IceError::new(ICE_UNSUPPORTED_STMT, "'drop' of an unknown local").with_span(d.span))?;

        let pointee = match &ty {
            Type::Pointer(inner) => inner.as_ref().clone(),
            Type::Nullable(inner) if inner.is_pointer() => match inner.as_ref() {
                Type::Pointer(p) => p.as_ref().clone(),
                _ => unreachable!(),
            },
            _ => return Err(IceError::new(ICE_UNSUPPORTED_STMT, "'drop' target is not a pointer").with_span(d.span)),
        };

        self.out.emit(format!("if ({mangled} != NULL) {{"));
        self.out.indent();
        self.emit_release_value(&format!("(*{mangled})"), &pointee)?;
        self.out.emit(format!("{}({mangled});", crate::runtime::RT_DROP));
        self.out.dedent();
        self.out.emit("}");
        self.out.emit(format!("{mangled} = NULL;"));

        if let Some(idx) = self.scopes.find_declaring_scope(&mangled) {
            self.scopes.scope_mut(idx).owned_vars.retain(|(n, _)| n != &mangled);
        }
        Ok(())
    }

    /// Materializes a `match`/`case` scrutinee into a named place so its
    /// representation can be read repeatedly without recomputing a
    /// side-effecting expression (spec.md §4.8: "a non-place ARC-typed
    /// scrutinee [is tracked] as an owned temporary for cleanup").
    fn materialize_scrutinee(&mut self, e: &Expr, ty: &Type, hint: &str) -> IceResult<String> {
        if e.is_place() {
            return self.emit_expr(e);
        }
        let v = self.emit_expr(e)?;
        let c_ty = ctype::emit_type(self.interner, self.tables, ty)?;
        let tmp = self.fresh_tmp(hint);
        self.out.emit(format!("{c_ty} {tmp} = {v};"));
        self.scopes.current_mut().declare(tmp.clone(), ty.clone());
        if self.analysis.has_arc_data(ty) {
            self.scopes.current_mut().add_owned(tmp.clone(), ty.clone());
        }
        Ok(tmp)
    }

    fn emit_match(&mut self, m: &ast::MatchStmt) -> IceResult<()> {
        let scrut_ty = self.expr_type(&m.scrutinee)?;
        let (em, en) = match scrut_ty.non_null() {
            Type::Enum(m, n) => (*m, *n),
            _ => return Err(IceError::new(ICE_MISSING_MATCH_TYPE, "'match' scrutinee is not an enum").with_span(m.span)),
        };
        let info = self
            .tables
            .enum_infos
            .get(&(em, en))
            .cloned()
            .ok_or_else(|| IceError::new(ICE_MISSING_ENUM_INFO, "enum info missing for 'match'").with_span(m.span))?;

        self.out.emit("{");
        self.out.indent();
        self.scopes.push();
        let scrut = self.materialize_scrutinee(&m.scrutinee, &scrut_ty, "scrutinee")?;

        self.out.emit(format!("switch (({scrut}).tag) {{"));
        self.out.indent();
        let mut has_wildcard = false;
        let mut arm_unreachable = Vec::new();
        for arm in &m.arms {
            match &arm.pattern {
                ast::MatchPattern::Variant { name, bindings, .. } => {
                    let tag_const = mangle::enum_tag_constant(self.interner, em, en, *name);
                    self.out.emit(format!("case {tag_const}: {{"));
                    self.out.indent();
                    self.scopes.push();
                    if let Some((_, field_types)) = info.variants.iter().find(|(n, _)| n == name) {
                        let variant_field = mangle::mangle_identifier(self.interner.resolve(*name));
                        for (i, (binding, fty)) in bindings.iter().zip(field_types.iter()).enumerate() {
                            let bname = mangle::mangle_identifier(self.interner.resolve(*binding));
                            let c_ty = ctype::emit_type(self.interner, self.tables, fty)?;
                            self.out.emit(format!("{c_ty} {bname} = ({scrut}).payload.{variant_field}.f{i};"));
                            // A pattern binding is borrowed from the
                            // scrutinee, never owned: the scrutinee (or its
                            // temp) remains responsible for any release.
                            self.scopes.current_mut().declare(bname, fty.clone());
                        }
                    }
                    self.next_stmt_unreachable = false;
                    self.emit_stmts(&arm.body.stmts)?;
                    let u = self.next_stmt_unreachable;
                    if !u {
                        self.emit_cleanup_current_scope_only()?;
                    }
                    self.scopes.pop();
                    self.out.emit("break;");
                    self.out.dedent();
                    self.out.emit("}");
                    arm_unreachable.push(u);
                }
                ast::MatchPattern::Wildcard(_) => {
                    has_wildcard = true;
                    self.out.emit("default: {");
                    self.out.indent();
                    self.scopes.push();
                    self.next_stmt_unreachable = false;
                    self.emit_stmts(&arm.body.stmts)?;
                    let u = self.next_stmt_unreachable;
                    if !u {
                        self.emit_cleanup_current_scope_only()?;
                    }
                    self.scopes.pop();
                    self.out.emit("break;");
                    self.out.dedent();
                    self.out.emit("}");
                    arm_unreachable.push(u);
                }
            }
        }
        if !has_wildcard {
            self.out.emit("default: break;");
        }
        self.out.dedent();
        self.out.emit("}");

        self.emit_cleanup_current_scope_only()?;
        self.scopes.pop();
        self.out.dedent();
        self.out.emit("}");

        self.next_stmt_unreachable = has_wildcard && arm_unreachable.iter().all(|u| *u);
        Ok(())
    }

    fn emit_case(&mut self, c: &ast::CaseStmt) -> IceResult<()> {
        let scrut_ty = self.expr_type(&c.scrutinee)?;
        self.out.emit("{");
        self.out.indent();
        self.scopes.push();
        let scrut = self.materialize_scrutinee(&c.scrutinee, &scrut_ty, "scrutinee")?;
        let is_string = matches!(scrut_ty.non_null(), Type::Builtin(Builtin::String));

        let mut arm_unreachable = Vec::new();
        if is_string {
            let mut first = true;
            for arm in &c.arms {
                let lit = self.emit_literal(&arm.pattern, arm.span)?;
                let cond = format!("rt_string_equals({scrut}, {lit})");
                self.out.emit(format!("{} ({cond}) {{", if first { "if" } else { "else if" }));
                first = false;
                self.out.indent();
                self.scopes.push();
                self.next_stmt_unreachable = false;
                self.emit_stmts(&arm.body.stmts)?;
                let u = self.next_stmt_unreachable;
                if !u {
                    self.emit_cleanup_current_scope_only()?;
                }
                self.scopes.pop();
                self.out.dedent();
                self.out.emit("}");
                arm_unreachable.push(u);
            }
            if let Some(else_block) = &c.else_arm {
                self.out.emit("else {");
                self.out.indent();
                self.scopes.push();
                self.next_stmt_unreachable = false;
                self.emit_stmts(&else_block.stmts)?;
                let u = self.next_stmt_unreachable;
                if !u {
                    self.emit_cleanup_current_scope_only()?;
                }
                self.scopes.pop();
                self.out.dedent();
                self.out.emit("}");
                arm_unreachable.push(u);
            }
        } else {
            self.out.emit(format!("switch ({scrut}) {{"));
            self.out.indent();
            for arm in &c.arms {
                let lit = self.emit_literal(&arm.pattern, arm.span)?;
                self.out.emit(format!("case {lit}: {{"));
                self.out.indent();
                self.scopes.push();
                self.next_stmt_unreachable = false;
                self.emit_stmts(&arm.body.stmts)?;
                let u = self.next_stmt_unreachable;
                if !u {
                    self.emit_cleanup_current_scope_only()?;
                }
                self.scopes.pop();
                self.out.emit("break;");
                self.out.dedent();
                self.out.emit("}");
                arm_unreachable.push(u);
            }
            if let Some(else_block) = &c.else_arm {
                self.out.emit("default: {");
                self.out.indent();
                self.scopes.push();
                self.next_stmt_unreachable = false;
                self.emit_stmts(&else_block.stmts)?;
                let u = self.next_stmt_unreachable;
                if !u {
                    self.emit_cleanup_current_scope_only()?;
                }
                self.scopes.pop();
                self.out.emit("break;");
                self.out.dedent();
                self.out.emit("}");
                arm_unreachable.push(u);
            } else {
                self.out.emit("default: break;");
            }
            self.out.dedent();
            self.out.emit("}");
        }

        self.emit_cleanup_current_scope_only()?;
        self.scopes.pop();
        self.out.dedent();
        self.out.emit("}");

        self.next_stmt_unreachable = c.else_arm.is_some() && !arm_unreachable.is_empty() && arm_unreachable.iter().all(|u| *u);
        Ok(())
    }

    fn emit_with(&mut self, w: &ast::WithStmt) -> IceResult<()> {
        self.out.emit("{");
        self.out.indent();
        self.scopes.push();

        match &w.cleanup {
            None => {
                let mut inline_blocks: Vec<Block> = Vec::new();
                for item in &w.items {
                    let ty = self.expr_type(&item.init)?;
                    let value = self.emit_owned_expr_with_expected_type(&item.init, &ty)?;
                    let c_ty = ctype::emit_type(self.interner, self.tables, &ty)?;
                    let name = mangle::mangle_identifier(self.interner.resolve(item.name));
                    self.out.emit(format!("{c_ty} {name} = {value};"));
                    self.scopes.current_mut().declare(name.clone(), ty.clone());
                    if let Some(cleanup_block) = &item.cleanup {
                        inline_blocks.push(cleanup_block.clone());
                    } else if self.analysis.has_arc_data(&ty) {
                        self.scopes.current_mut().add_owned(name.clone(), ty.clone());
                    }
                    self.scopes.current_mut().with_cleanup = Some(WithCleanup::Inline(inline_blocks.clone()));
                }
            }
            Some(shared) => {
                for item in &w.items {
                    let ty = self.expr_type(&item.init)?;
                    let c_ty = ctype::emit_type(self.interner, self.tables, &ty)?;
                    let name = mangle::mangle_identifier(self.interner.resolve(item.name));
                    let default = match &ty {
                        Type::Nullable(inner) => ctype::emit_none_value(self.interner, self.tables, inner)?,
                        Type::Pointer(_) => "NULL".to_string(),
                        _ => format!("(({c_ty}){{0}})"),
                    };
                    self.out.emit(format!("{c_ty} {name} = {default};"));
                    self.scopes.current_mut().declare(name, ty);
                }
                self.scopes.current_mut().with_cleanup = Some(WithCleanup::Block(shared.clone()));
                for item in &w.items {
                    let ty = self.expr_type(&item.init)?;
                    let value = self.emit_owned_expr_with_expected_type(&item.init, &ty)?;
                    let name = mangle::mangle_identifier(self.interner.resolve(item.name));
                    self.out.emit(format!("{name} = {value};"));
                }
            }
        }

        self.next_stmt_unreachable = false;
        self.emit_stmts(&w.body.stmts)?;
        if !self.next_stmt_unreachable {
            self.emit_cleanup_current_scope_only()?;
        }
        self.scopes.pop();
        self.out.dedent();
        self.out.emit("}");
        Ok(())
    }

    /// Runs a scope's `with`-cleanup exactly once, guarded by
    /// `with_cleanup_in_progress` so a cleanup block itself hitting a
    /// `return`/`?`/`break` that re-enters this same scope's cleanup walk
    /// can't recurse into itself.
    fn run_with_cleanup(&mut self, idx: usize) -> IceResult<()> {
        if self.scopes.scope(idx).with_cleanup_in_progress {
            return Ok(());
        }
        let Some(cleanup) = self.scopes.scope(idx).with_cleanup.clone() else { return Ok(()) };
        self.scopes.scope_mut(idx).with_cleanup_in_progress = true;
        match cleanup {
            WithCleanup::Inline(blocks) => {
                for block in blocks.iter().rev() {
                    self.out.emit("{");
                    self.out.indent();
                    self.emit_stmts(&block.stmts)?;
                    self.out.dedent();
                    self.out.emit("}");
                }
            }
            WithCleanup::Block(block) => {
                self.out.emit("{");
                self.out.indent();
                self.emit_stmts(&block.stmts)?;
                self.out.dedent();
                self.out.emit("}");
            }
        }
        self.scopes.scope_mut(idx).with_cleanup_in_progress = false;
        Ok(())
    }

    fn emit_release_owned(&mut self, idx: usize, skip: Option<&str>) -> IceResult<()> {
        let vars: Vec<(String, Type)> = self.scopes.scope(idx).owned_vars.clone();
        for (name, ty) in vars.into_iter().rev() {
            if skip == Some(name.as_str()) {
                continue;
            }
            if self.analysis.has_arc_data(&ty) {
                self.emit_release_value(&name, &ty)?;
            }
        }
        Ok(())
    }

    pub(crate) fn emit_cleanup_current_scope_only(&mut self) -> IceResult<()> {
        let idx = self.scopes.current_index();
        self.run_with_cleanup(idx)?;
        self.emit_release_owned(idx, None)
    }

    /// Runs every scope's cleanup from innermost out to the function's
    /// root scope, for a `return` or a `?`-triggered early exit (spec.md
    /// §4.8 "Cleanup scheduling": "`return`/`?` walks the entire scope
    /// chain to the root").
    pub(crate) fn emit_cleanup_to_root(&mut self) -> IceResult<()> {
        for idx in self.scopes.chain_to_root().collect::<Vec<_>>() {
            self.run_with_cleanup(idx)?;
            self.emit_release_owned(idx, None)?;
        }
        Ok(())
    }

    /// Field-by-field ARC release for a value of type `ty` already
    /// materialized as the C lvalue `value` (spec.md §4.8 "String
    /// semantics (ARC)"): a plain release call for a string, a recursive
    /// per-field walk for a struct, a tag-switch per-variant walk for an
    /// enum, and a `has_value`/niche-null guard for a nullable.
    pub(crate) fn emit_release_value(&mut self, value: &str, ty: &Type) -> IceResult<()> {
        match ty {
            Type::Builtin(Builtin::String) => {
                self.out.emit(format!("{}({value});", crate::runtime::RT_STRING_RELEASE));
                Ok(())
            }
            Type::Struct(m, n) => {
                let Some(info) = self.analysis.struct_info(*m, *n).cloned() else { return Ok(()) };
                for (fname, fty) in &info.fields {
                    if self.analysis.has_arc_data(fty) {
                        let f = mangle::mangle_identifier(self.interner.resolve(*fname));
                        self.emit_release_value(&format!("({value}).{f}"), fty)?;
                    }
                }
                Ok(())
            }
            Type::Enum(m, n) => {
                let Some(info) = self.tables.enum_infos.get(&(*m, *n)).cloned() else { return Ok(()) };
                if !info.variants.iter().any(|(_, fields)| fields.iter().any(|t| self.analysis.has_arc_data(t))) {
                    return Ok(());
                }
                self.out.emit(format!("switch (({value}).tag) {{"));
                self.out.indent();
                for (variant_name, fields) in &info.variants {
                    if !fields.iter().any(|t| self.analysis.has_arc_data(t)) {
                        continue;
                    }
                    let tag_const = mangle::enum_tag_constant(self.interner, *m, *n, *variant_name);
                    let member = mangle::mangle_identifier(self.interner.resolve(*variant_name));
                    self.out.emit(format!("case {tag_const}: {{"));
                    self.out.indent();
                    for (i, fty) in fields.iter().enumerate() {
                        if self.analysis.has_arc_data(fty) {
                            self.emit_release_value(&format!("({value}).payload.{member}.f{i}"), fty)?;
                        }
                    }
                    self.out.emit("break;");
                    self.out.dedent();
                    self.out.emit("}");
                }
                self.out.emit("default: break;");
                self.out.dedent();
                self.out.emit("}");
                Ok(())
            }
            Type::Nullable(inner) => {
                if !self.analysis.has_arc_data(inner) {
                    return Ok(());
                }
                if ctype::is_niche_nullable(inner) {
                    // A plain scope-owned nullable pointer never owns its
                    // pointee by itself here: `drop` releases the pointee
                    // explicitly, the scope only ever owns the pointer value.
                    Ok(())
                } else {
                    self.out.emit(format!("if (({value}).has_value) {{"));
                    self.out.indent();
                    self.emit_release_value(&format!("({value}).value"), inner)?;
                    self.out.dedent();
                    self.out.emit("}");
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

fn extract_value_dependency(ty: &Type, out: &mut Vec<(Symbol, Symbol)>) {
    match ty {
        Type::Struct(m, n) | Type::Enum(m, n) => out.push((*m, *n)),
        Type::Nullable(inner) if !ctype::is_niche_nullable(inner) => extract_value_dependency(inner, out),
        _ => {}
    }
}
