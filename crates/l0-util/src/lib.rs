//! l0-util - Core Utilities and Foundation Types
//!
//! Fundamental types shared by every stage of the L0 compiler: source
//! spans, an interned [`Symbol`] type, typed-index vectors, and the
//! diagnostic model described in spec.md §§3, 6 and 7.
//!
//! None of these types carry process-global state — a [`symbol::Interner`]
//! and a [`diagnostic::Handler`] are both owned by the current compilation
//! and dropped with it, per spec.md §5 ("there is none [global state] in
//! the core").

pub mod diagnostic;
pub mod ice;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use ice::{IceError, IceResult};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::{Interner, Symbol};

pub use rustc_hash::{FxHashMap, FxHashSet};
