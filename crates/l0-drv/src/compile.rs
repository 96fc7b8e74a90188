//! Orchestration tying the module loader, semantic analysis, and the C
//! emitter together (spec.md §4.3 "orchestrates the pipeline end to end"),
//! grounded on the original implementation's `L0Driver.analyze`
//! (`l0_driver.py`) and `l0_sem::analyze`'s own pipeline shape.
//!
//! [`l0_sem::analyze`] itself only reports diagnostics — it never keeps the
//! per-function [`TypeCheckResult`]s the emitter needs, so `compile` runs
//! the same three passes by hand to also build the [`l0_gen::Analysis`]
//! the emitter consumes.

use l0_par::ast;
use l0_sem::{check_module, resolve_names, resolve_signatures, TypeCheckResult};
use l0_util::{Diagnostic, DiagnosticBuilder, DiagnosticCode, FxHashMap, Handler, Interner, Symbol};

use crate::context::CompilationContext;
use crate::loader::CompilationUnit;

pub struct CompileOutput {
    /// The generated C99 translation unit, present only when code
    /// generation ran — spec.md §7: "code generation runs only when
    /// diagnostics contain zero `error`-kind entries".
    pub source: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn compile(unit: CompilationUnit, interner: &mut Interner, context: &CompilationContext) -> CompileOutput {
    let mut handler = Handler::new();
    let CompilationUnit { modules, entry_module, paths } = unit;

    tracing::debug!("resolving names across {} module(s)", modules.len());
    let mut envs = resolve_names(&modules, interner, &mut handler);
    tracing::debug!("resolving signatures");
    let tables = resolve_signatures(&modules, &mut envs, interner, &mut handler);

    let mut funcs: FxHashMap<(Symbol, Symbol), TypeCheckResult> = FxHashMap::default();
    let mut entry_module_key = None;
    for module in &modules {
        let key = l0_sem::module_key(interner, &module.name);
        if interner.resolve(key) == entry_module.as_str() {
            entry_module_key = Some(key);
        }
        for decl in &module.decls {
            if let ast::Decl::Func(f) = decl {
                if f.body.is_some() {
                    tracing::debug!("type-checking {}.{}", interner.resolve(key), interner.resolve(f.name));
                    let result = check_module(module, key, f, &envs, &tables, interner, &mut handler);
                    funcs.insert((key, f.name), result);
                }
            }
        }
    }

    if handler.has_errors() {
        tracing::info!("compilation failed with {} diagnostic(s), skipping code generation", handler.diagnostics().len());
        return CompileOutput { source: None, diagnostics: handler.into_diagnostics() };
    }

    let analysis = l0_gen::Analysis { modules: &modules, envs: &envs, tables: &tables, funcs, entry_module: entry_module_key };

    match l0_gen::generate(&analysis, interner) {
        Ok(body) => {
            let source = apply_context_prefix(body, context, &entry_module, &paths);
            tracing::info!("generated {} byte(s) of C99", source.len());
            CompileOutput { source: Some(source), diagnostics: handler.into_diagnostics() }
        }
        Err(ice) => {
            let mut diagnostics = handler.into_diagnostics();
            diagnostics.push(DiagnosticBuilder::error(DiagnosticCode::new("ICE", ice.code), ice.message.clone()).maybe_span(ice.span).build());
            CompileOutput { source: None, diagnostics }
        }
    }
}

/// Prepends the trace-macro `#define`s and entry-file `#line` directive
/// [`CompilationContext`] asks for. Additive only — never changes a single
/// byte of what [`l0_gen::generate`] itself produced.
fn apply_context_prefix(body: String, context: &CompilationContext, entry_module: &str, paths: &FxHashMap<String, std::path::PathBuf>) -> String {
    let mut prefix = String::new();
    if context.trace_arc {
        prefix.push_str("#define L0_TRACE_ARC 1\n");
    }
    if context.trace_memory {
        prefix.push_str("#define L0_TRACE_MEMORY 1\n");
    }
    if context.emit_line_directives {
        if let Some(path) = paths.get(entry_module) {
            prefix.push_str(&format!("#line 1 \"{}\"\n", path.display()));
        }
    }
    if prefix.is_empty() {
        body
    } else {
        prefix.push('\n');
        prefix.push_str(&body);
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ModuleLoader;
    use crate::paths::SourceSearchPaths;

    fn build_unit(dir: &std::path::Path, entry: &str, interner: &mut Interner) -> CompilationUnit {
        let mut search = SourceSearchPaths::new();
        search.add_project_root(dir);
        let mut handler = Handler::new();
        ModuleLoader::new(search, interner).load_unit(entry, &mut handler).expect("module loads")
    }

    #[test]
    fn compiles_a_minimal_program_to_c() {
        let dir = std::env::temp_dir().join("l0-drv-compile-test-minimal");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("m.l0"), "module m;\nfunc main() -> int {\n\treturn 0;\n}\n").unwrap();

        let mut interner = Interner::new();
        let unit = build_unit(&dir, "m", &mut interner);
        let context = CompilationContext::default();
        let out = compile(unit, &mut interner, &context);

        assert!(out.diagnostics.iter().all(|d| !matches!(d.level, l0_util::Level::Error)), "{:?}", out.diagnostics);
        let source = out.source.expect("code generation ran");
        assert!(source.contains("int main("));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn type_errors_suppress_code_generation() {
        let dir = std::env::temp_dir().join("l0-drv-compile-test-type-error");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("m.l0"), "module m;\nfunc main() -> int {\n\tlet x: int = \"not an int\";\n\treturn x;\n}\n").unwrap();

        let mut interner = Interner::new();
        let unit = build_unit(&dir, "m", &mut interner);
        let context = CompilationContext::default();
        let out = compile(unit, &mut interner, &context);

        assert!(out.source.is_none());
        assert!(out.diagnostics.iter().any(|d| matches!(d.level, l0_util::Level::Error)));

        std::fs::remove_dir_all(&dir).ok();
    }
}
