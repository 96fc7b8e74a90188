//! Expression lowering (spec.md §4.8), grounded on the original
//! implementation's `Backend._emit_expr` family (`l0_backend.py`).
//!
//! Every function here returns a C expression as a `String`; side effects
//! that can't be expressed as a single C expression (ARC-temp
//! materialization, checked-cast bailouts inside `try`) are emitted as
//! statements onto `self.out` first and the helper returns just the name of
//! the temporary it produced.

use l0_par::ast::{self, BinOp, Expr, Literal, UnOp};
use l0_sem::{symbol::SymbolKind, Builtin, Type};
use l0_util::IceResult;

use crate::error::*;
use crate::lower::Lowering;
use crate::runtime::*;

impl<'a> Lowering<'a> {
    /// Whether emitting `e` as a C expression can run arbitrary side
    /// effects (a call, in particular) — used to decide whether a
    /// compound-assignment target needs its address cached in a temporary
    /// before being evaluated twice.
    pub(crate) fn has_side_effects(&self, e: &Expr) -> bool {
        match e {
            Expr::Literal(..) | Expr::VarRef { .. } => false,
            Expr::Call(_) | Expr::New(_) | Expr::Try(..) => true,
            Expr::Unary(u) => self.has_side_effects(&u.operand),
            Expr::Binary(b) => self.has_side_effects(&b.left) || self.has_side_effects(&b.right),
            Expr::Index(i) => self.has_side_effects(&i.object) || self.has_side_effects(&i.index),
            Expr::Field(f) => self.has_side_effects(&f.object),
            Expr::Cast(c) => self.has_side_effects(&c.expr),
            Expr::Paren(inner, _) => self.has_side_effects(inner),
            Expr::TypeExpr(_) | Expr::SizeOf(..) | Expr::Ord(..) => false,
        }
    }

    /// A fresh compiler-generated temporary name, never colliding with a
    /// user identifier (spec.md §4.8 "Name mangling": the `_`-prefix/`l0_`
    /// namespace is reserved for exactly this).
    pub(crate) fn fresh_tmp(&mut self, hint: &str) -> String {
        self.tmp_counter += 1;
        format!("_t{}_{}", self.tmp_counter, hint)
    }

    /// Whether a non-place rvalue of type `ty` needs materializing into an
    /// owned scope temporary before use, so it can be released on scope
    /// exit rather than leaking (spec.md §4.8 "String semantics (ARC)").
    pub(crate) fn needs_arc_temp(&self, e: &Expr, ty: &Type) -> bool {
        !e.is_place() && self.analysis.has_arc_data(ty)
    }

    /// Emits `let <tmp> = <value>;`, registers it as owned in the current
    /// scope, and returns the temporary's name as a place the caller can
    /// read from (and whose ownership it can later transfer out of).
    pub(crate) fn materialize_arc_temp(&mut self, value: String, ty: &Type) -> IceResult<String> {
        let c_ty = crate::ctype::emit_type(self.interner, self.tables, ty)?;
        let tmp = self.fresh_tmp("arc");
        self.out.emit(format!("{c_ty} {tmp} = {value};"));
        self.scopes.current_mut().declare(tmp.clone(), ty.clone());
        self.scopes.current_mut().add_owned(tmp.clone(), ty.clone());
        Ok(tmp)
    }

    /// Emits `e`'s natural-type C expression, materializing an ARC
    /// temporary first if `e` is a non-place rvalue carrying owned data.
    pub(crate) fn emit_expr_owned_if_needed(&mut self, e: &Expr) -> IceResult<String> {
        let ty = self.expr_type(e)?;
        let raw = self.emit_expr(e)?;
        if self.needs_arc_temp(e, &ty) {
            self.materialize_arc_temp(raw, &ty)
        } else {
            Ok(raw)
        }
    }

    /// Looks up the natural (pre-widening) type recorded for `e` during type
    /// checking; an internal compiler error if absent, since every
    /// expression in a type-checked function must have one.
    pub(crate) fn expr_type(&self, e: &Expr) -> IceResult<Type> {
        self.analysis
            .expr_type(self.current_module, self.current_func, e.span())
            .cloned()
            .ok_or_else(|| l0_util::IceError::new(ICE_MISSING_EXPR_TYPE, "expression has no inferred type").with_span(e.span()))
    }

    /// Converts an already-emitted C expression of type `from` into an
    /// expression of type `to`, applying `byte -> int` widening and
    /// `T -> T?` lifting (spec.md §4.7 "Assignability"). Narrowing/unwrap
    /// conversions only ever happen explicitly via `as`, never here.
    pub(crate) fn convert_expr_with_expected_type(&self, raw: String, from: &Type, to: &Type) -> IceResult<String> {
        if from == to {
            return Ok(raw);
        }
        match (from, to) {
            (Type::Null, Type::Nullable(inner)) => crate::ctype::emit_none_value(self.interner, self.tables, inner),
            (Type::Null, Type::Pointer(_)) => Ok("NULL".to_string()),
            (_, Type::Nullable(inner)) if from == inner.as_ref() => {
                crate::ctype::emit_some_value(self.interner, self.tables, inner, &raw)
            }
            (Type::Builtin(Builtin::Byte), Type::Builtin(Builtin::Int)) => Ok(format!("((l0_int){raw})")),
            _ => Ok(raw),
        }
    }

    /// Emits `e`, then converts it to `expected` — the form used for
    /// anything assigned into an already-typed destination (a `let`'s
    /// initializer, a `return` value, a plain positional call argument).
    pub(crate) fn emit_expr_with_expected_type(&mut self, e: &Expr, expected: &Type) -> IceResult<String> {
        if let Expr::Literal(Literal::Null, _) = e {
            return crate::ctype::emit_none_value(self.interner, self.tables, expected.non_null());
        }
        let natural = self.expr_type(e)?;
        let raw = self.emit_expr(e)?;
        self.convert_expr_with_expected_type(raw, &natural, expected)
    }

    /// Like [`emit_expr_with_expected_type`], but for a destination that
    /// takes ownership of its value: a place expression being copied gets
    /// retained first (spec.md §4.8 "retain-on-copy"); a non-place rvalue
    /// is used as-is, since its one materialization already is the owned
    /// value.
    pub(crate) fn emit_owned_expr_with_expected_type(&mut self, e: &Expr, expected: &Type) -> IceResult<String> {
        let natural = self.expr_type(e)?;
        let raw = self.emit_expr(e)?;
        let converted = self.convert_expr_with_expected_type(raw, &natural, expected)?;
        if e.is_place() && self.analysis.has_arc_data(&natural) {
            Ok(format!("{}({converted})", RT_STRING_RETAIN))
        } else {
            Ok(converted)
        }
    }

    pub(crate) fn emit_expr(&mut self, e: &Expr) -> IceResult<String> {
        match e {
            Expr::Literal(lit, span) => self.emit_literal(lit, *span),
            Expr::VarRef { module, name, span } => self.emit_var_ref(*module, *name, *span),
            Expr::Unary(u) => self.emit_unary(u),
            Expr::Binary(b) => self.emit_binary(b),
            Expr::Call(c) => self.emit_call(c),
            Expr::Index(i) => Err(l0_util::IceError::new(ICE_UNSUPPORTED_STMT, "index expressions are not implemented").with_span(i.span)),
            Expr::Field(f) => self.emit_field(f),
            Expr::Cast(c) => self.emit_cast(c),
            Expr::New(n) => self.emit_new(n),
            Expr::Try(inner, span) => self.emit_try(inner, *span),
            Expr::Paren(inner, _) => self.emit_expr(inner),
            Expr::TypeExpr(_) => {
                Err(l0_util::IceError::new(ICE_UNSUPPORTED_STMT, "bare type expression used as a value"))
            }
            Expr::SizeOf(arg, span) => self.emit_sizeof(arg, *span),
            Expr::Ord(inner, span) => self.emit_ord(inner, *span),
        }
    }

    pub(crate) fn emit_literal(&mut self, lit: &Literal, span: l0_util::Span) -> IceResult<String> {
        match lit {
            Literal::Int(v) => Ok(format!("((l0_int){v})")),
            Literal::Byte(v) => Ok(format!("((l0_byte){v})")),
            Literal::Bool(v) => Ok(format!("((l0_bool){})", if *v { 1 } else { 0 })),
            Literal::String(text) => Ok(format!("{RT_STRING_FROM_LITERAL}({text})")),
            Literal::Null => {
                // A bare `null` only ever reaches here through a context
                // that didn't route it through `emit_expr_with_expected_type`
                // first (e.g. as a direct comparison operand); callers of
                // binary-op null comparisons special-case it before calling
                // `emit_expr`, so this is reached only for a genuinely
                // untyped null, which cannot happen post type-check.
                let _ = span;
                Ok("NULL".to_string())
            }
        }
    }

    fn emit_var_ref(&mut self, module: Option<l0_util::Symbol>, name: l0_util::Symbol, span: l0_util::Span) -> IceResult<String> {
        if module.is_none() {
            if let Some(ty) = self.scopes.lookup_declared(&crate::mangle::mangle_identifier(self.interner.resolve(name))) {
                let _ = ty;
                return Ok(crate::mangle::mangle_identifier(self.interner.resolve(name)));
            }
        }
        let sym = self.lookup_symbol(module, name, span)?;
        match sym.kind {
            SymbolKind::Func => {
                if self.is_extern_function(sym.module, sym.name) {
                    Ok(self.interner.resolve(sym.name).to_string())
                } else {
                    Ok(crate::mangle::mangle_function_name(self.interner, sym.module, sym.name))
                }
            }
            SymbolKind::Let => Ok(crate::mangle::mangle_let_name(self.interner, sym.module, sym.name)),
            SymbolKind::EnumVariant => self.emit_variant_constructor_call(sym.module, sym.name, &[], span),
            other => Err(l0_util::IceError::new(
                ICE_UNSUPPORTED_STMT,
                format!("symbol of kind {other:?} used as a bare value"),
            )
            .with_span(span)),
        }
    }

    fn emit_unary(&mut self, u: &ast::UnaryExpr) -> IceResult<String> {
        let inner = self.emit_expr_owned_if_needed(&u.operand)?;
        Ok(match u.op {
            UnOp::Neg => format!("(-{inner})"),
            UnOp::Not => format!("(!{inner})"),
            UnOp::Deref => format!("(*{inner})"),
        })
    }

    fn emit_binary(&mut self, b: &ast::BinaryExpr) -> IceResult<String> {
        // Null-comparisons against a nullable/pointer operand compare
        // against the niche/has_value representation directly rather than
        // routing the `null` literal through the normal literal emitter.
        if matches!(b.op, BinOp::Eq | BinOp::NotEq) {
            if let Some(s) = self.try_emit_null_comparison(b)? {
                return Ok(s);
            }
        }

        let left_ty = self.expr_type(&b.left)?;
        let lhs = self.emit_expr_owned_if_needed(&b.left)?;
        let rhs = self.emit_expr_owned_if_needed(&b.right)?;

        if left_ty.is_integer_kind() {
            if let Some(rt) = self.checked_int_op(b.op) {
                return Ok(format!("{rt}({lhs}, {rhs})"));
            }
        }

        let c_op = match b.op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        Ok(format!("({lhs} {c_op} {rhs})"))
    }

    fn checked_int_op(&self, op: BinOp) -> Option<&'static str> {
        match op {
            BinOp::Add => Some(RT_IADD),
            BinOp::Sub => Some(RT_ISUB),
            BinOp::Mul => Some(RT_IMUL),
            BinOp::Div => Some(RT_IDIV),
            BinOp::Mod => Some(RT_IMOD),
            _ => None,
        }
    }

    fn try_emit_null_comparison(&mut self, b: &ast::BinaryExpr) -> IceResult<Option<String>> {
        let (null_side, other, other_ty) = if matches!(&*b.left, Expr::Literal(Literal::Null, _)) {
            (true, &b.right, self.expr_type(&b.right)?)
        } else if matches!(&*b.right, Expr::Literal(Literal::Null, _)) {
            (true, &b.left, self.expr_type(&b.left)?)
        } else {
            (false, &b.left, Type::Null)
        };
        if !null_side {
            return Ok(None);
        }
        let other_expr = self.emit_expr(other)?;
        let cmp = if matches!(b.op, BinOp::Eq) { "==" } else { "!=" };
        let check = if crate::ctype::is_niche_nullable(other_ty.non_null()) || other_ty.is_pointer() {
            format!("({other_expr} {cmp} NULL)")
        } else {
            let want = if matches!(b.op, BinOp::Eq) { "0" } else { "1" };
            format!("(({other_expr}).has_value == {want})")
        };
        Ok(Some(check))
    }

    fn emit_field(&mut self, f: &ast::FieldExpr) -> IceResult<String> {
        let obj_ty = self.expr_type(&f.object)?;
        let obj = self.emit_expr_owned_if_needed(&f.object)?;
        let field_name = crate::mangle::mangle_identifier(self.interner.resolve(f.field));
        let sep = if obj_ty.is_pointer() { "->" } else { "." };
        Ok(format!("({obj}{sep}{field_name})"))
    }

    fn emit_cast(&mut self, c: &ast::CastExpr) -> IceResult<String> {
        let from = self.expr_type(&c.expr)?;
        let to = self.resolve_type_ref(&c.target, c.span)?;
        let inner = self.emit_expr_owned_if_needed(&c.expr)?;

        match (&from, &to) {
            (Type::Builtin(Builtin::Int), Type::Builtin(Builtin::Byte)) => {
                Ok(format!("{RT_NARROW_BYTE}({inner})"))
            }
            (_, Type::Nullable(inner_ty)) if &from == inner_ty.as_ref() => {
                crate::ctype::emit_some_value(self.interner, self.tables, inner_ty, &inner)
            }
            (Type::Nullable(inner_ty), _) if inner_ty.as_ref() == &to => self.emit_unwrap(&inner, inner_ty, c.span),
            _ => {
                let c_ty = crate::ctype::emit_type(self.interner, self.tables, &to)?;
                Ok(format!("(({c_ty}){inner})"))
            }
        }
    }

    /// Unwraps a nullable expression already materialized into `inner`,
    /// aborting via the runtime's pointer/option unwrap helper on `none`
    /// (spec.md §4.8 "Checked narrowing: T? -> T").
    fn emit_unwrap(&mut self, inner: &str, inner_ty: &Type, span: l0_util::Span) -> IceResult<String> {
        let _ = span;
        if crate::ctype::is_niche_nullable(inner_ty) {
            Ok(format!("{RT_UNWRAP_PTR}({inner})"))
        } else {
            Ok(format!("{RT_UNWRAP_OPT}({inner}).value"))
        }
    }

    fn emit_new(&mut self, n: &ast::NewExpr) -> IceResult<String> {
        let target = self.resolve_type_ref(&n.target, n.span)?;
        let c_ty = crate::ctype::emit_type(self.interner, self.tables, &target)?;
        let tmp = self.fresh_tmp("new");

        match &target {
            Type::Struct(m, name) => {
                let info = self
                    .analysis
                    .struct_info(*m, *name)
                    .ok_or_else(|| l0_util::IceError::new(ICE_MISSING_STRUCT_INFO, "struct info missing for 'new'").with_span(n.span))?
                    .fields
                    .clone();
                if n.args.is_empty() {
                    self.out.emit(format!("{c_ty}* {tmp} = ({c_ty}*){RT_ALLOC_OBJ}(sizeof({c_ty}));"));
                } else {
                    let inits = self.emit_positional_field_inits(&n.args, &info)?;
                    self.out.emit(format!("{c_ty}* {tmp} = ({c_ty}*){RT_ALLOC_OBJ}(sizeof({c_ty}));"));
                    self.out.emit(format!("*{tmp} = ({c_ty}){{ {inits} }};"));
                }
            }
            Type::Enum(..) => {
                if n.args.len() != 1 {
                    return Err(l0_util::IceError::new(ICE_UNSUPPORTED_STMT, "'new' of an enum takes exactly one initializer").with_span(n.span));
                }
                let value = self.emit_owned_expr_with_expected_type(&n.args[0], &target)?;
                self.out.emit(format!("{c_ty}* {tmp} = ({c_ty}*){RT_ALLOC_OBJ}(sizeof({c_ty}));"));
                self.out.emit(format!("*{tmp} = {value};"));
            }
            _ => {
                self.out.emit(format!("{c_ty}* {tmp} = ({c_ty}*){RT_ALLOC_OBJ}(sizeof({c_ty}));"));
                if let Some(arg) = n.args.first() {
                    let value = self.emit_owned_expr_with_expected_type(arg, &target)?;
                    self.out.emit(format!("*{tmp} = {value};"));
                }
            }
        }
        Ok(tmp)
    }

    fn emit_positional_field_inits(&mut self, args: &[Expr], fields: &[(l0_util::Symbol, Type)]) -> IceResult<String> {
        let mut parts = Vec::new();
        for (arg, (field_name, field_ty)) in args.iter().zip(fields.iter()) {
            let name = crate::mangle::mangle_identifier(self.interner.resolve(*field_name));
            let value = self.emit_owned_expr_with_expected_type(arg, field_ty)?;
            parts.push(format!(".{name} = {value}"));
        }
        Ok(parts.join(", "))
    }

    fn emit_sizeof(&mut self, arg: &ast::SizeOfArg, span: l0_util::Span) -> IceResult<String> {
        let ty = match arg {
            ast::SizeOfArg::Type(t) => self.resolve_type_ref(t, span)?,
            ast::SizeOfArg::Expr(e) => self.expr_type(e)?,
        };
        let c_ty = crate::ctype::emit_type(self.interner, self.tables, &ty)?;
        Ok(format!("((l0_int)sizeof({c_ty}))"))
    }

    fn emit_ord(&mut self, inner: &Expr, span: l0_util::Span) -> IceResult<String> {
        let ty = self.expr_type(inner)?;
        let value = self.emit_expr(inner)?;
        if !matches!(ty.non_null(), Type::Enum(..)) {
            return Err(l0_util::IceError::new(ICE_UNSUPPORTED_STMT, "'ord' applied to a non-enum value").with_span(span));
        }
        Ok(format!("((l0_int)({value}).tag)"))
    }

    fn emit_try(&mut self, inner: &Expr, span: l0_util::Span) -> IceResult<String> {
        let ty = self.expr_type(inner)?;
        let scrutinee = self.emit_expr_owned_if_needed(inner)?;
        let tmp = self.fresh_tmp("try");
        let c_ty = crate::ctype::emit_type(self.interner, self.tables, &ty)?;
        self.out.emit(format!("{c_ty} {tmp} = {scrutinee};"));

        let inner_ty = match &ty {
            Type::Nullable(inner_ty) => inner_ty.as_ref().clone(),
            other => other.clone(),
        };
        let is_none = if crate::ctype::is_niche_nullable(&inner_ty) {
            format!("({tmp} == NULL)")
        } else {
            format!("(!({tmp}).has_value)")
        };

        self.out.emit(format!("if ({is_none}) {{"));
        self.out.indent();
        let result_ty = self.current_result_ty.clone();
        if matches!(result_ty, Type::Builtin(Builtin::Void)) {
            self.emit_cleanup_to_root()?;
            self.out.emit("return;");
        } else {
            let none_value = crate::ctype::emit_none_value(self.interner, self.tables, result_ty.non_null())?;
            let c_ty = crate::ctype::emit_type(self.interner, self.tables, &result_ty)?;
            let ret_tmp = self.fresh_tmp("none_ret");
            self.out.emit(format!("{c_ty} {ret_tmp} = {none_value};"));
            self.emit_cleanup_to_root()?;
            self.out.emit(format!("return {ret_tmp};"));
        }
        let _ = span;
        self.out.dedent();
        self.out.emit("}");

        if crate::ctype::is_niche_nullable(&inner_ty) {
            Ok(tmp)
        } else {
            Ok(format!("({tmp}).value"))
        }
    }

    fn emit_call(&mut self, c: &ast::CallExpr) -> IceResult<String> {
        let Expr::VarRef { module, name, span } = c.callee.as_ref() else {
            return Err(l0_util::IceError::new(ICE_UNSUPPORTED_STMT, "only a bare name may be called").with_span(c.span));
        };
        let (module, name, span) = (*module, *name, *span);

        if module.is_none() {
            let bare = self.interner.resolve(name).to_string();
            if let Some(s) = self.try_emit_intrinsic(&bare, &c.args, c.span)? {
                return Ok(s);
            }
        }

        let sym = self.lookup_symbol(module, name, span)?;
        match sym.kind {
            SymbolKind::Struct => self.emit_struct_constructor_call(sym.module, sym.name, &c.args, c.span),
            SymbolKind::EnumVariant => self.emit_variant_constructor_call(sym.module, sym.name, &c.args, c.span),
            SymbolKind::Func => self.emit_plain_call(sym.module, sym.name, &c.args, c.span),
            other => Err(l0_util::IceError::new(ICE_UNSUPPORTED_STMT, format!("symbol of kind {other:?} called")).with_span(c.span)),
        }
    }

    /// `sizeof`/`ord` are syntactically ordinary calls (`sizeof(int)`,
    /// `ord(value)`) until name resolution has no type or function bound to
    /// the bare name `sizeof`/`ord` at all — they're reserved words in
    /// value position, handled here before any symbol lookup runs.
    fn try_emit_intrinsic(&mut self, name: &str, args: &[Expr], span: l0_util::Span) -> IceResult<Option<String>> {
        match name {
            "sizeof" => {
                let Some(first) = args.first() else { return Ok(None) };
                let arg = match first {
                    Expr::VarRef { module: None, name, .. } => {
                        let named = ast::TypeExpr::Named { module: None, name: *name, span };
                        match self.resolve_type_ref(&named, span) {
                            Ok(_) => ast::SizeOfArg::Type(named),
                            Err(_) => ast::SizeOfArg::Expr(first.clone()),
                        }
                    }
                    other => ast::SizeOfArg::Expr(other.clone()),
                };
                self.emit_sizeof(&arg, span).map(Some)
            }
            "ord" => match args.first() {
                Some(first) => self.emit_ord(first, span).map(Some),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn emit_plain_call(&mut self, module: l0_util::Symbol, name: l0_util::Symbol, args: &[Expr], span: l0_util::Span) -> IceResult<String> {
        let func_ty = self
            .tables
            .func_types
            .get(&(module, name))
            .cloned()
            .ok_or_else(|| l0_util::IceError::new(ICE_MISSING_EXPR_TYPE, "function signature missing").with_span(span))?;
        let Type::Func(params, _) = func_ty else {
            return Err(l0_util::IceError::new(ICE_UNSUPPORTED_STMT, "call target is not a function").with_span(span));
        };
        let callee = if self.is_extern_function(module, name) {
            self.interner.resolve(name).to_string()
        } else {
            crate::mangle::mangle_function_name(self.interner, module, name)
        };
        let arg_strs = self.emit_call_args(args, &params)?;
        Ok(format!("{callee}({})", arg_strs.join(", ")))
    }

    fn emit_call_args(&mut self, args: &[Expr], params: &[Type]) -> IceResult<Vec<String>> {
        let mut out = Vec::with_capacity(args.len());
        for (arg, param_ty) in args.iter().zip(params.iter()) {
            out.push(self.emit_owned_expr_with_expected_type(arg, param_ty)?);
        }
        Ok(out)
    }

    fn emit_struct_constructor_call(&mut self, module: l0_util::Symbol, name: l0_util::Symbol, args: &[Expr], span: l0_util::Span) -> IceResult<String> {
        let info = self
            .analysis
            .struct_info(module, name)
            .ok_or_else(|| l0_util::IceError::new(ICE_MISSING_STRUCT_INFO, "struct info missing for constructor call").with_span(span))?
            .fields
            .clone();
        let c_ty = crate::ctype::emit_type(self.interner, self.tables, &Type::Struct(module, name))?;
        let inits = self.emit_positional_field_inits(args, &info)?;
        Ok(format!("(({c_ty}){{ {inits} }})"))
    }

    fn emit_variant_constructor_call(&mut self, module: l0_util::Symbol, variant_name: l0_util::Symbol, args: &[Expr], span: l0_util::Span) -> IceResult<String> {
        let (enum_name, field_types) = self
            .find_variant_decl(module, variant_name)
            .ok_or_else(|| l0_util::IceError::new(ICE_MISSING_VARIANT_DECL, "enum variant declaration not found").with_span(span))?;

        let c_ty = crate::ctype::emit_type(self.interner, self.tables, &Type::Enum(module, enum_name))?;
        let tag_value = crate::mangle::enum_tag_constant(self.interner, module, enum_name, variant_name);
        let variant_field = crate::mangle::mangle_identifier(self.interner.resolve(variant_name));

        let mut parts = vec![format!(".tag = {tag_value}")];
        if !field_types.is_empty() {
            let mut member_inits = Vec::new();
            for (i, (arg, field_ty)) in args.iter().zip(field_types.iter()).enumerate() {
                let value = self.emit_owned_expr_with_expected_type(arg, field_ty)?;
                member_inits.push(format!(".f{i} = {value}"));
            }
            parts.push(format!(".payload.{variant_field} = {{ {} }}", member_inits.join(", ")));
        }
        Ok(format!("(({c_ty}){{ {} }})", parts.join(", ")))
    }
}
