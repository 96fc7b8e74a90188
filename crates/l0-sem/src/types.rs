//! The resolved type system (spec.md §3 "Types") and the `can_assign`
//! compatibility relation used throughout signature resolution and type
//! checking (spec.md §4.7 "Assignability").

use l0_util::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Int,
    Byte,
    Bool,
    String,
    Void,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Builtin::Int),
            "byte" => Some(Builtin::Byte),
            "bool" => Some(Builtin::Bool),
            "string" => Some(Builtin::String),
            "void" => Some(Builtin::Void),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Int => "int",
            Builtin::Byte => "byte",
            Builtin::Bool => "bool",
            Builtin::String => "string",
            Builtin::Void => "void",
        }
    }
}

/// A fully resolved type. `module`/`name` fields on `Struct`/`Enum` identify
/// the declaring module (as its dotted-path key symbol, see
/// [`crate::module_key`]) and the declaration's own name symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Builtin(Builtin),
    Struct(Symbol, Symbol),
    Enum(Symbol, Symbol),
    Pointer(Box<Type>),
    Nullable(Box<Type>),
    Func(Vec<Type>, Box<Type>),
    /// The type of the bare `null` literal before it is assigned into a
    /// nullable-typed context. Never appears in a resolved signature table.
    Null,
}

impl Type {
    pub fn is_integer_kind(&self) -> bool {
        matches!(self, Type::Builtin(Builtin::Int) | Type::Builtin(Builtin::Byte))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Builtin(Builtin::Bool))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Builtin(Builtin::Void))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Strips one `Nullable` layer, if present; otherwise returns `self`.
    pub fn non_null(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }
}

/// `can_assign(target, source)` (spec.md §4.7 "Assignability"). When
/// `allow_promotion` is set (cast contexts only), also accepts the two
/// runtime-checked narrowing conversions `int -> byte` and `T? -> T`.
pub fn can_assign(target: &Type, source: &Type, allow_promotion: bool) -> bool {
    if target == source {
        return true;
    }
    match (target, source) {
        // null -> T? (and null -> any Pointer, which is nullable-compatible
        // at the ABI level per spec.md §9's niche-optimization note)
        (_, Type::Null) => matches!(target, Type::Nullable(_) | Type::Pointer(_)),
        // byte -> int widening
        (Type::Builtin(Builtin::Int), Type::Builtin(Builtin::Byte)) => true,
        // recursive matching under Nullable on both sides
        (Type::Nullable(t_inner), Type::Nullable(s_inner)) => {
            can_assign(t_inner, s_inner, allow_promotion)
        }
        // T -> T? lifting
        (Type::Nullable(t_inner), _) => can_assign(t_inner, source, allow_promotion),
        // Pointer(void) <-> Pointer(T) compatibility
        (Type::Pointer(t_inner), Type::Pointer(s_inner)) => {
            matches!(**t_inner, Type::Builtin(Builtin::Void))
                || matches!(**s_inner, Type::Builtin(Builtin::Void))
                || can_assign(t_inner, s_inner, allow_promotion)
        }
        // casts only: checked narrowing
        (Type::Builtin(Builtin::Byte), Type::Builtin(Builtin::Int)) if allow_promotion => true,
        (t, Type::Nullable(s_inner)) if allow_promotion && !matches!(t, Type::Nullable(_)) => {
            can_assign(t, s_inner, allow_promotion)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l0_util::Interner;

    fn sym(interner: &mut Interner, s: &str) -> Symbol {
        interner.intern(s)
    }

    #[test]
    fn byte_widens_to_int() {
        assert!(can_assign(&Type::Builtin(Builtin::Int), &Type::Builtin(Builtin::Byte), false));
        assert!(!can_assign(&Type::Builtin(Builtin::Byte), &Type::Builtin(Builtin::Int), false));
    }

    #[test]
    fn int_narrows_to_byte_only_under_promotion() {
        let (int, byte) = (Type::Builtin(Builtin::Int), Type::Builtin(Builtin::Byte));
        assert!(!can_assign(&byte, &int, false));
        assert!(can_assign(&byte, &int, true));
    }

    #[test]
    fn value_lifts_into_nullable() {
        let mut interner = Interner::new();
        let m = sym(&mut interner, "m");
        let n = sym(&mut interner, "Point");
        let st = Type::Struct(m, n);
        let nullable_st = Type::Nullable(Box::new(st.clone()));
        assert!(can_assign(&nullable_st, &st, false));
        assert!(!can_assign(&st, &nullable_st, false));
    }

    #[test]
    fn null_assigns_into_nullable_and_pointer_not_bare_value() {
        let inner = Type::Builtin(Builtin::Int);
        assert!(can_assign(&Type::Nullable(Box::new(inner.clone())), &Type::Null, false));
        assert!(can_assign(&Type::Pointer(Box::new(inner.clone())), &Type::Null, false));
        assert!(!can_assign(&inner, &Type::Null, false));
    }

    #[test]
    fn pointer_void_is_bidirectionally_compatible() {
        let void_ptr = Type::Pointer(Box::new(Type::Builtin(Builtin::Void)));
        let mut interner = Interner::new();
        let m = sym(&mut interner, "m");
        let n = sym(&mut interner, "Point");
        let struct_ptr = Type::Pointer(Box::new(Type::Struct(m, n)));
        assert!(can_assign(&void_ptr, &struct_ptr, false));
        assert!(can_assign(&struct_ptr, &void_ptr, false));
    }
}
