//! C99 name mangling (spec.md §4.8 "Name mangling").
//!
//! Grounded on the original implementation's `CEmitter.mangle_*` family
//! (`l0_c_emitter.py`): every declaration lands in a single flat C
//! namespace, so module paths are folded into the identifier itself.

use l0_util::{Interner, Symbol};

/// C89/C99 keywords plus a handful of names (`NULL`, `bool`, `true`, ...)
/// that would otherwise collide with headers this crate's runtime pulls in.
pub const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "alignas", "alignof", "atomic", "bool",
    "complex", "imaginary", "NULL", "null", "true", "false", "asm", "offsetof", "typeof",
];

fn is_c_keyword(name: &str) -> bool {
    C_KEYWORDS.contains(&name)
}

/// Renders a module key symbol (`"geometry.shapes"`) as its mangled
/// underscore form (`"geometry_shapes"`).
pub fn mangle_module(interner: &Interner, module_key: Symbol) -> String {
    interner.resolve(module_key).replace('.', "_")
}

pub fn mangle_struct_name(interner: &Interner, module_key: Symbol, name: Symbol) -> String {
    format!("l0_{}_{}", mangle_module(interner, module_key), interner.resolve(name))
}

pub fn mangle_enum_name(interner: &Interner, module_key: Symbol, name: Symbol) -> String {
    format!("l0_{}_{}", mangle_module(interner, module_key), interner.resolve(name))
}

pub fn mangle_function_name(interner: &Interner, module_key: Symbol, name: Symbol) -> String {
    format!("l0_{}_{}", mangle_module(interner, module_key), interner.resolve(name))
}

/// The C enumerator constant for one variant's tag value, e.g.
/// `l0_geometry_Shape_tag_Circle`.
pub fn enum_tag_constant(interner: &Interner, module_key: Symbol, enum_name: Symbol, variant_name: Symbol) -> String {
    format!("{}_tag_{}", mangle_enum_name(interner, module_key, enum_name), interner.resolve(variant_name))
}

pub fn mangle_let_name(interner: &Interner, module_key: Symbol, name: Symbol) -> String {
    let raw = interner.resolve(name);
    let safe = if is_c_keyword(raw) { format!("l0_kw_{raw}") } else { raw.to_string() };
    format!("l0_{}_{}", mangle_module(interner, module_key), safe)
}

/// Mangles a local identifier (parameter, `let`, pattern binding). Appends
/// `__v` when the bare name would collide with a C keyword, already ends
/// with `__v`, or starts with `_`/`l0_` (both reserved for runtime and
/// compiler-generated names).
pub fn mangle_identifier(name: &str) -> String {
    if is_c_keyword(name) || name.ends_with("__v") || name.starts_with("l0_") || name.starts_with('_') {
        format!("{name}__v")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifier_is_untouched() {
        assert_eq!(mangle_identifier("count"), "count");
    }

    #[test]
    fn keyword_identifier_gets_suffix() {
        assert_eq!(mangle_identifier("int"), "int__v");
    }

    #[test]
    fn reserved_prefix_gets_suffix() {
        assert_eq!(mangle_identifier("_tmp"), "_tmp__v");
        assert_eq!(mangle_identifier("l0_helper"), "l0_helper__v");
    }

    #[test]
    fn already_suffixed_identifier_is_suffixed_again() {
        assert_eq!(mangle_identifier("x__v"), "x__v__v");
    }

    #[test]
    fn struct_name_folds_dotted_module_path() {
        let mut interner = Interner::new();
        let module = interner.intern("geometry.shapes");
        let name = interner.intern("Point");
        assert_eq!(mangle_struct_name(&interner, module, name), "l0_geometry_shapes_Point");
    }
}
