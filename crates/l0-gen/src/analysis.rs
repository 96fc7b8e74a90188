//! Front-end results bundled for code generation, grounded on the original
//! implementation's `AnalysisResult` (`l0_analysis.py`): everything the
//! emitter needs to turn a fully type-checked compilation unit into C,
//! without re-deriving any of it.

use l0_par::ast;
use l0_sem::{ModuleEnv, SignatureTables, StructInfo, TypeCheckResult, Type};
use l0_util::{FxHashMap, Span, Symbol};

/// Per-function type-checking output, keyed the same way as every other
/// signature table in this pipeline: `(module_key, function_name)`.
pub struct Analysis<'a> {
    pub modules: &'a [ast::Module],
    pub envs: &'a FxHashMap<Symbol, ModuleEnv>,
    pub tables: &'a SignatureTables,
    pub funcs: FxHashMap<(Symbol, Symbol), TypeCheckResult>,
    /// Module key of the module whose `main` function (if any) should be
    /// wrapped by a C `main()` (spec.md §4.8 "Entry point").
    pub entry_module: Option<Symbol>,
}

impl<'a> Analysis<'a> {
    pub fn struct_info(&self, module: Symbol, name: Symbol) -> Option<&StructInfo> {
        self.tables.struct_infos.get(&(module, name))
    }

    pub fn is_arc_type(&self, ty: &Type) -> bool {
        matches!(ty, Type::Builtin(l0_sem::Builtin::String))
    }

    /// Whether `ty` transitively contains ARC-managed data (spec.md §4.8
    /// "String semantics (ARC)": "a compound type transitively containing a
    /// string"), recursing through struct fields and enum variant payloads.
    /// Pointers never contribute: `Stage 1` never auto-drops through them.
    pub fn has_arc_data(&self, ty: &Type) -> bool {
        if self.is_arc_type(ty) {
            return true;
        }
        match ty {
            Type::Struct(m, n) => self
                .tables
                .struct_infos
                .get(&(*m, *n))
                .is_some_and(|info| info.fields.iter().any(|(_, t)| self.has_arc_data(t))),
            Type::Enum(m, n) => self.tables.enum_infos.get(&(*m, *n)).is_some_and(|info| {
                info.variants.iter().any(|(_, field_types)| field_types.iter().any(|t| self.has_arc_data(t)))
            }),
            Type::Nullable(inner) => self.has_arc_data(inner),
            _ => false,
        }
    }

    pub fn expr_type(&self, module: Symbol, func: Symbol, span: Span) -> Option<&Type> {
        self.funcs.get(&(module, func))?.expr_types.get(&span)
    }

    /// Every type that was ever inferred anywhere in the program, used to
    /// seed [`crate::ctype::WrapperSet::collect`] so locals/temporaries that
    /// never show up in a signature still get their optional wrapper
    /// emitted.
    pub fn all_expr_types(&self) -> impl Iterator<Item = &Type> {
        self.funcs.values().flat_map(|f| f.expr_types.values())
    }
}
