//! Fixed names of the runtime support functions the emitted C calls into
//! (spec.md §4.8; the runtime library's own implementation is out of
//! scope per spec.md §1's non-goals). Centralized here so a rename only
//! touches one file.

pub const RT_IADD: &str = "_rt_iadd";
pub const RT_ISUB: &str = "_rt_isub";
pub const RT_IMUL: &str = "_rt_imul";
pub const RT_IDIV: &str = "_rt_idiv";
pub const RT_IMOD: &str = "_rt_imod";
pub const RT_NARROW_BYTE: &str = "_rt_narrow_l0_byte";
pub const RT_ALLOC_OBJ: &str = "_rt_alloc_obj";
pub const RT_DROP: &str = "_rt_drop";
pub const RT_INIT_ARGS: &str = "_rt_init_args";
pub const RT_UNWRAP_PTR: &str = "_unwrap_ptr";
pub const RT_UNWRAP_OPT: &str = "_unwrap_opt";
pub const RT_STRING_RETAIN: &str = "rt_string_retain";
pub const RT_STRING_RELEASE: &str = "rt_string_release";
pub const RT_STRING_FROM_LITERAL: &str = "_rt_l0_string_from_const_literal";
