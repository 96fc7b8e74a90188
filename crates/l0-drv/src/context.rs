//! Per-compilation configuration (spec.md §4.3, ambient driver config),
//! grounded on the original implementation's `CompilationContext`
//! (`l0_context.py`).
//!
//! These flags are orthogonal to diagnostics: they never change whether a
//! program is accepted, only how much the driver logs while accepting or
//! rejecting it, and whether the emitted C carries line directives / ARC
//! and memory tracing hooks.

/// Mirrors the original's `LogLevel(IntEnum)`. Kept as its own small
/// ladder (rather than going straight to [`tracing::level_filters::LevelFilter`])
/// because `SILENT` has no equivalent there — `CompilationContext::log_level`
/// is the user-facing knob, turned into an [`EnvFilter`](tracing_subscriber::EnvFilter)
/// directive once, in the CLI binary's `main`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Silent = 0,
    Error = 3,
    Warning = 6,
    Info = 10,
    Debug = 30,
}

impl LogLevel {
    pub fn to_level_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Silent => tracing::level_filters::LevelFilter::OFF,
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warning => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
        }
    }
}

/// Driver-wide switches threaded through module loading and code
/// generation. `Default` matches the original's `CompilationContext.default()`.
#[derive(Clone, Copy, Debug)]
pub struct CompilationContext {
    /// Emit a `#line` directive ahead of the generated translation unit
    /// pointing back at the entry module's own source file, so a C
    /// compiler's own diagnostics/debugger still reference `.l0` source
    /// rather than the generated file.
    pub emit_line_directives: bool,
    /// Wrap every ARC retain/release the emitter generates in a
    /// `L0_TRACE_ARC`-guarded stderr trace line (spec.md §6 "Optional
    /// tracing").
    pub trace_arc: bool,
    /// Same, for allocator calls, guarded by `L0_TRACE_MEMORY`.
    pub trace_memory: bool,
    /// Render log lines as structured `key=value` pairs instead of plain
    /// text. Maps onto `tracing_subscriber::fmt`'s field formatting at CLI
    /// startup.
    pub log_rich_format: bool,
    pub log_level: LogLevel,
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self {
            emit_line_directives: true,
            trace_arc: false,
            trace_memory: false,
            log_rich_format: false,
            log_level: LogLevel::Warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_matches_original_defaults() {
        let ctx = CompilationContext::default();
        assert!(ctx.emit_line_directives);
        assert!(!ctx.trace_arc);
        assert!(!ctx.trace_memory);
        assert!(!ctx.log_rich_format);
        assert_eq!(ctx.log_level, LogLevel::Warning);
    }

    #[test]
    fn log_level_ordering_matches_original_ladder() {
        assert!(LogLevel::Silent < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }
}
