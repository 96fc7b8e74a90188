//! Internal-compiler-error codes this crate can raise (spec.md §7:
//! "unrecoverable... not a substitute for a diagnostic"). Every one of
//! these represents an invariant an earlier pass is supposed to have
//! already guaranteed; none of them are reachable from user input once
//! name resolution, signature resolution, and type checking have all
//! passed without errors. Numbers mirror the original implementation's
//! `[ICE-NNNN]` tags (`l0_c_emitter.py`/`l0_backend.py`) so a cross-reference
//! against that tool's own error log still lines up.

pub const ICE_UNKNOWN_BUILTIN: u32 = 1290;
pub const ICE_FUNC_POINTER_TYPE: u32 = 1291;
pub const ICE_NULL_TYPE: u32 = 1292;
pub const ICE_MISSING_STRUCT_INFO: u32 = 1270;
pub const ICE_MISSING_VARIANT_INFO: u32 = 1271;
pub const ICE_MISSING_ENUM_INFO: u32 = 1080;
pub const ICE_SCOPE_UNDERFLOW: u32 = 1330;
pub const ICE_TYPE_CYCLE: u32 = 1340;
pub const ICE_MISSING_EXPR_TYPE: u32 = 1310;
pub const ICE_MISSING_ASSIGN_TYPE: u32 = 1240;
pub const ICE_UNSUPPORTED_STMT: u32 = 1250;
pub const ICE_BREAK_OUTSIDE_LOOP: u32 = 1020;
pub const ICE_CONTINUE_OUTSIDE_LOOP: u32 = 1021;
pub const ICE_MISSING_LET_TYPE: u32 = 1170;
pub const ICE_MISSING_VARIANT_DECL: u32 = 1304;
pub const ICE_MISSING_MATCH_TYPE: u32 = 1190;
pub const ICE_UNKNOWN_TYPE_KIND: u32 = 9299;
