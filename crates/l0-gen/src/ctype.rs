//! Type emission: `Type` -> C type text, and the value-optional wrapper
//! scheme (spec.md §4.8 "Type emission"), grounded on the original
//! implementation's `CEmitter.emit_type`/`_opt_*` family.

use l0_sem::{Builtin, SignatureTables, Type};
use l0_util::{FxHashMap, Interner, IceError};

use crate::error::{ICE_FUNC_POINTER_TYPE, ICE_NULL_TYPE};
use crate::mangle::{mangle_enum_name, mangle_struct_name};

/// A nullable type is *niche-optimized* when its inner type is already a
/// pointer: `T*?` is represented as a bare `T*` with `NULL` as the
/// none-value, needing no wrapper struct.
pub fn is_niche_nullable(inner: &Type) -> bool {
    matches!(inner, Type::Pointer(_))
}

/// A stable key identifying the inner type of a value-optional, used both
/// as the wrapper's dictionary key and as its mangled suffix.
fn opt_key_for_type(interner: &Interner, tables: &SignatureTables, t: &Type) -> String {
    match t {
        Type::Builtin(b) => b.name().to_string(),
        Type::Struct(m, n) => format!("s_{}", mangle_struct_name(interner, *m, *n)),
        Type::Enum(m, n) => format!("e_{}", mangle_enum_name(interner, *m, *n)),
        Type::Pointer(inner) => format!("p_{}", opt_key_for_type(interner, tables, inner)),
        Type::Nullable(inner) => format!("n_{}", opt_key_for_type(interner, tables, inner)),
        Type::Func(..) => "fn".to_string(),
        Type::Null => "unk".to_string(),
    }
}

pub fn opt_wrapper_name_for_inner(interner: &Interner, tables: &SignatureTables, inner: &Type) -> String {
    format!("l0_opt_{}", opt_key_for_type(interner, tables, inner))
}

/// Whether `inner`'s wrapper can be defined before any user struct/enum
/// definitions are emitted (builtins, and nullable-by-value-of-builtin
/// chains thereof).
fn is_early_inner(inner: &Type) -> bool {
    match inner {
        Type::Builtin(_) => true,
        Type::Nullable(nested) if !is_niche_nullable(nested) => is_early_inner(nested),
        _ => false,
    }
}

/// Converts a resolved [`Type`] to its C spelling. Errors only on shapes
/// this stage never produces for a well-typed program (a raw `Func` type
/// reaching codegen, or the placeholder `Null` type) — both are internal
/// compiler errors, not user-facing diagnostics.
pub fn emit_type(interner: &Interner, tables: &SignatureTables, ty: &Type) -> Result<String, IceError> {
    match ty {
        Type::Builtin(Builtin::Int) => Ok("l0_int".to_string()),
        Type::Builtin(Builtin::Byte) => Ok("l0_byte".to_string()),
        Type::Builtin(Builtin::Bool) => Ok("l0_bool".to_string()),
        Type::Builtin(Builtin::String) => Ok("l0_string".to_string()),
        Type::Builtin(Builtin::Void) => Ok("void".to_string()),
        Type::Struct(m, n) => Ok(format!("struct {}", mangle_struct_name(interner, *m, *n))),
        Type::Enum(m, n) => Ok(format!("struct {}", mangle_enum_name(interner, *m, *n))),
        Type::Pointer(inner) => Ok(format!("{}*", emit_type(interner, tables, inner)?)),
        Type::Nullable(inner) => {
            if is_niche_nullable(inner) {
                emit_type(interner, tables, inner)
            } else {
                Ok(opt_wrapper_name_for_inner(interner, tables, inner))
            }
        }
        Type::Func(..) => Err(IceError::new(ICE_FUNC_POINTER_TYPE, "function pointer type emission not implemented")),
        Type::Null => Err(IceError::new(ICE_NULL_TYPE, "bare 'null' type reached code emission")),
    }
}

pub fn emit_enum_tag_name(interner: &Interner, module_key: l0_util::Symbol, enum_name: l0_util::Symbol) -> String {
    format!("{}_tag", mangle_enum_name(interner, module_key, enum_name))
}

/// The C value of the "none" case for a nullable type.
pub fn emit_none_value(interner: &Interner, tables: &SignatureTables, t: &Type) -> Result<String, IceError> {
    if is_niche_nullable(t) {
        return Ok("NULL".to_string());
    }
    let wrapper = opt_wrapper_name_for_inner(interner, tables, t);
    let _ = emit_type(interner, tables, t)?;
    Ok(format!("(({wrapper}){{.has_value = 0}})"))
}

/// The C value wrapping `inner_expr` as the "some" case for a nullable type.
pub fn emit_some_value(
    interner: &Interner,
    tables: &SignatureTables,
    t: &Type,
    inner_expr: &str,
) -> Result<String, IceError> {
    if is_niche_nullable(t) {
        return Ok(inner_expr.to_string());
    }
    let wrapper = opt_wrapper_name_for_inner(interner, tables, t);
    Ok(format!("(({wrapper}){{.has_value = 1, .value = {inner_expr}}})"))
}

/// Tracks every value-optional wrapper struct this program needs, keyed by
/// its mangled name, deduplicated across every signature and every
/// inferred expression type. Populated once via [`WrapperSet::collect`],
/// then drained in two passes by [`WrapperSet::emit`].
#[derive(Default)]
pub struct WrapperSet {
    wrappers: FxHashMap<String, Type>,
    emitted: FxHashMap<String, bool>,
}

impl WrapperSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn visit(&mut self, interner: &Interner, tables: &SignatureTables, t: &Type) {
        match t {
            Type::Nullable(inner) => {
                if !is_niche_nullable(inner) {
                    let name = opt_wrapper_name_for_inner(interner, tables, inner);
                    self.wrappers.insert(name, (**inner).clone());
                }
                self.visit(interner, tables, inner);
            }
            Type::Pointer(inner) => self.visit(interner, tables, inner),
            Type::Func(params, result) => {
                for p in params {
                    self.visit(interner, tables, p);
                }
                self.visit(interner, tables, result);
            }
            _ => {}
        }
    }

    /// Scans function signatures, struct fields, enum variant payloads, and
    /// every type inferred during checking for nullable-by-value shapes.
    pub fn collect<'a>(
        &mut self,
        interner: &Interner,
        tables: &SignatureTables,
        extra_types: impl IntoIterator<Item = &'a Type>,
    ) {
        for ty in tables.func_types.values() {
            self.visit(interner, tables, ty);
        }
        for info in tables.struct_infos.values() {
            for (_, ty) in &info.fields {
                self.visit(interner, tables, ty);
            }
        }
        for info in tables.enum_infos.values() {
            for (_, field_types) in &info.variants {
                for ty in field_types {
                    self.visit(interner, tables, ty);
                }
            }
        }
        for ty in extra_types {
            self.visit(interner, tables, ty);
        }
    }

    /// Emits every collected wrapper whose inner type is ready at this
    /// phase: `early` wrappers (builtin-inner) must precede user struct/enum
    /// definitions; the rest follow them.
    pub fn emit(
        &mut self,
        out: &mut crate::writer::Writer,
        interner: &Interner,
        tables: &SignatureTables,
        early: bool,
    ) -> Result<(), IceError> {
        let mut items: Vec<(String, Type)> = self.wrappers.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, inner) in items {
            if *self.emitted.get(&name).unwrap_or(&false) {
                continue;
            }
            if is_early_inner(&inner) != early {
                continue;
            }
            let c_inner = emit_type(interner, tables, &inner)?;
            let guard = name.to_uppercase();
            out.emit(format!("#ifndef {guard}_DEFINED"));
            out.emit(format!("#define {guard}_DEFINED"));
            out.emit(format!("typedef struct {{ l0_bool has_value; {c_inner} value; }} {name};"));
            out.emit(format!("#endif /* {guard}_DEFINED */"));
            out.emit_blank();
            self.emitted.insert(name, true);
        }
        Ok(())
    }
}
