//! Module loading and import-closure construction (spec.md §4.3 "Module
//! loader"), grounded on the original implementation's `L0Driver`
//! (`l0_driver.py`): `load_module` / `build_compilation_unit`.
//!
//! Cycle detection walks an explicit loading stack rather than a set, so a
//! detected cycle can report the actual chain of module names involved
//! rather than just "a cycle exists somewhere". A module is cached (and
//! recorded in load order) *before* its own imports are recursed into —
//! loading `a` which imports `b` which imports `a` back must see `a`
//! still on the loading stack, not yet in the cache, for the cycle check
//! to fire.

use std::path::{Path, PathBuf};

use l0_par::ast;
use l0_util::{FxHashMap, Handler, Interner, Symbol};

use crate::error::DriverError;
use crate::paths::SourceSearchPaths;

fn dotted_name(interner: &Interner, segments: &[Symbol]) -> String {
    segments.iter().map(|s| interner.resolve(*s)).collect::<Vec<_>>().join(".")
}

fn import_names(interner: &Interner, module: &ast::Module) -> Vec<String> {
    module.imports.iter().map(|imp| dotted_name(interner, &imp.path)).collect()
}

/// The transitive closure of modules reachable from one entry module,
/// ready to hand to [`l0_sem::analyze`].
#[derive(Debug)]
pub struct CompilationUnit {
    pub modules: Vec<ast::Module>,
    pub entry_module: String,
    /// Resolved source path for every loaded module, by its dotted name —
    /// used for `#line` directives and diagnostic filenames.
    pub paths: FxHashMap<String, PathBuf>,
}

pub struct ModuleLoader<'a> {
    search_paths: SourceSearchPaths,
    interner: &'a mut Interner,
    cache: FxHashMap<String, ast::Module>,
    paths: FxHashMap<String, PathBuf>,
    /// Load order, entry module first — the original's dict-insertion-order
    /// equivalent.
    order: Vec<String>,
    /// Modules currently mid-load, innermost last, for cycle detection.
    loading: Vec<String>,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(search_paths: SourceSearchPaths, interner: &'a mut Interner) -> Self {
        Self {
            search_paths,
            interner,
            cache: FxHashMap::default(),
            paths: FxHashMap::default(),
            order: Vec::new(),
            loading: Vec::new(),
        }
    }

    /// Loads `entry_module` (a dotted module name, resolved through the
    /// configured search roots) and its full transitive import closure.
    pub fn load_unit(mut self, entry_module: &str, handler: &mut Handler) -> Result<CompilationUnit, DriverError> {
        self.load_module(entry_module, handler)?;
        self.finish(entry_module)
    }

    /// Loads the entry module directly from a file path given on the
    /// command line — the module name is whatever the file itself
    /// declares, not derived from any search root.
    pub fn load_entry_file(mut self, entry_path: &Path, handler: &mut Handler) -> Result<CompilationUnit, DriverError> {
        let module = self.load_single_file(entry_path, handler)?;
        let name = dotted_name(self.interner, &module.name);
        let imports = import_names(self.interner, &module);
        self.cache.insert(name.clone(), module);
        self.paths.insert(name.clone(), entry_path.to_path_buf());
        self.order.push(name.clone());

        self.loading.push(name.clone());
        for import in imports {
            if let Err(e) = self.load_module(&import, handler) {
                self.loading.pop();
                return Err(e);
            }
        }
        self.loading.pop();

        self.finish(&name)
    }

    fn finish(mut self, entry_module: &str) -> Result<CompilationUnit, DriverError> {
        let modules = self
            .order
            .iter()
            .map(|name| self.cache.remove(name).expect("every name in `order` was inserted into `cache` at the same time"))
            .collect();
        Ok(CompilationUnit { modules, entry_module: entry_module.to_string(), paths: self.paths })
    }

    fn load_module(&mut self, module_name: &str, handler: &mut Handler) -> Result<(), DriverError> {
        if let Some(pos) = self.loading.iter().position(|m| m == module_name) {
            let mut cycle: Vec<String> = self.loading[pos..].to_vec();
            cycle.push(module_name.to_string());
            return Err(DriverError::ImportCycle { cycle });
        }
        if self.cache.contains_key(module_name) {
            return Ok(());
        }

        self.loading.push(module_name.to_string());
        let result = self.load_and_link(module_name, handler);
        self.loading.pop();
        result
    }

    fn load_and_link(&mut self, module_name: &str, handler: &mut Handler) -> Result<(), DriverError> {
        let path = self.search_paths.resolve(module_name)?;
        let module = self.load_single_file(&path, handler)?;

        let declared = dotted_name(self.interner, &module.name);
        if declared != module_name {
            return Err(DriverError::ModuleNameMismatch {
                path,
                declared,
                expected: module_name.to_string(),
            });
        }

        let imports = import_names(self.interner, &module);
        self.cache.insert(module_name.to_string(), module);
        self.paths.insert(module_name.to_string(), path);
        self.order.push(module_name.to_string());

        for import in imports {
            self.load_module(&import, handler)?;
        }
        Ok(())
    }

    fn load_single_file(&mut self, path: &Path, handler: &mut Handler) -> Result<ast::Module, DriverError> {
        let bytes = std::fs::read(path).map_err(|e| DriverError::Io { path: path.to_path_buf(), source: e })?;
        let text = String::from_utf8(bytes).map_err(|_| DriverError::InvalidUtf8 { path: path.to_path_buf() })?;

        let filename_sym = self.interner.intern(&path.to_string_lossy());
        let tokens: Vec<_> = l0_lex::Lexer::new(&text, handler).collect();
        let mut parser = l0_par::Parser::new(tokens, handler, self.interner);
        parser.parse_module(filename_sym).ok_or_else(|| DriverError::ParseFailed { path: path.to_path_buf() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l0_util::Handler;

    fn write_module(dir: &Path, relpath: &str, src: &str) {
        let full = dir.join(relpath);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, src).unwrap();
    }

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("l0-drv-loader-test-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_a_single_module_with_no_imports() {
        let dir = fresh_dir("single");
        write_module(&dir, "m.l0", "module m;\nfunc main() -> int {\n\treturn 0;\n}\n");

        let mut interner = Interner::new();
        let mut paths = SourceSearchPaths::new();
        paths.add_project_root(&dir);
        let mut handler = Handler::new();
        let unit = ModuleLoader::new(paths, &mut interner).load_unit("m", &mut handler).unwrap();

        assert!(!handler.has_errors());
        assert_eq!(unit.modules.len(), 1);
        assert_eq!(unit.entry_module, "m");
    }

    #[test]
    fn loads_transitive_imports_in_dependency_first_order() {
        let dir = fresh_dir("transitive");
        write_module(&dir, "a.l0", "module a;\nimport b;\nfunc a_fn() -> int {\n\treturn b_fn();\n}\n");
        write_module(&dir, "b.l0", "module b;\nfunc b_fn() -> int {\n\treturn 1;\n}\n");

        let mut interner = Interner::new();
        let mut search = SourceSearchPaths::new();
        search.add_project_root(&dir);
        let mut handler = Handler::new();
        let unit = ModuleLoader::new(search, &mut interner).load_unit("a", &mut handler).unwrap();

        assert_eq!(unit.modules.len(), 2);
        assert!(unit.paths.contains_key("a"));
        assert!(unit.paths.contains_key("b"));
    }

    #[test]
    fn detects_a_direct_import_cycle() {
        let dir = fresh_dir("cycle");
        write_module(&dir, "a.l0", "module a;\nimport b;\n");
        write_module(&dir, "b.l0", "module b;\nimport a;\n");

        let mut interner = Interner::new();
        let mut search = SourceSearchPaths::new();
        search.add_project_root(&dir);
        let mut handler = Handler::new();
        let err = ModuleLoader::new(search, &mut interner).load_unit("a", &mut handler).unwrap_err();
        assert!(matches!(err, DriverError::ImportCycle { .. }));
    }

    #[test]
    fn reports_module_name_mismatch() {
        let dir = fresh_dir("mismatch");
        write_module(&dir, "a.l0", "module not_a;\n");

        let mut interner = Interner::new();
        let mut search = SourceSearchPaths::new();
        search.add_project_root(&dir);
        let mut handler = Handler::new();
        let err = ModuleLoader::new(search, &mut interner).load_unit("a", &mut handler).unwrap_err();
        assert!(matches!(err, DriverError::ModuleNameMismatch { .. }));
    }

    #[test]
    fn load_entry_file_uses_the_files_own_declared_module_name() {
        let dir = fresh_dir("entry-file");
        let entry = dir.join("main.l0");
        std::fs::write(&entry, "module whatever_it_likes;\nfunc main() -> int {\n\treturn 0;\n}\n").unwrap();

        let mut interner = Interner::new();
        let search = SourceSearchPaths::new();
        let mut handler = Handler::new();
        let unit = ModuleLoader::new(search, &mut interner).load_entry_file(&entry, &mut handler).unwrap();

        assert_eq!(unit.entry_module, "whatever_it_likes");
        assert_eq!(unit.modules.len(), 1);
    }
}
