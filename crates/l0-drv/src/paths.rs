//! Module name to source file resolution (spec.md §4.3 "Module loader"),
//! grounded on the original implementation's `SourceSearchPaths`
//! (`l0_paths.py`).
//!
//! A module name is a dotted path (`geometry.shapes`); it resolves to a
//! relative file path by replacing dots with path separators and
//! appending `.l0`. System roots are searched before project roots, and
//! within each list earlier entries win, matching the original's
//! first-match-wins order.

use std::path::{Path, PathBuf};

use crate::error::DriverError;

/// Ordered lists of directories searched for a module's source file.
#[derive(Default)]
pub struct SourceSearchPaths {
    system_roots: Vec<PathBuf>,
    project_roots: Vec<PathBuf>,
}

impl SourceSearchPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_system_root(&mut self, root: impl Into<PathBuf>) {
        self.system_roots.push(root.into());
    }

    pub fn add_project_root(&mut self, root: impl Into<PathBuf>) {
        self.project_roots.push(root.into());
    }

    /// `geometry.shapes` -> `geometry/shapes.l0`.
    pub fn module_relpath(module_name: &str) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in module_name.split('.') {
            path.push(segment);
        }
        path.set_extension("l0");
        path
    }

    /// Resolves `module_name` against every root, system roots first, in
    /// registration order. The first root under which the relative path
    /// exists on disk wins.
    pub fn resolve(&self, module_name: &str) -> Result<PathBuf, DriverError> {
        let rel = Self::module_relpath(module_name);
        for root in self.system_roots.iter().chain(self.project_roots.iter()) {
            let candidate = root.join(&rel);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(DriverError::ModuleNotFound { module: module_name.to_string(), relpath: rel })
    }

    /// Resolves a module name that is itself a file path (a single entry
    /// module passed straight on the command line, not found under any
    /// search root), used by [`crate::loader::ModuleLoader::load_entry_file`].
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_relpath_replaces_dots_with_separators() {
        let rel = SourceSearchPaths::module_relpath("geometry.shapes");
        assert_eq!(rel, PathBuf::from("geometry").join("shapes.l0"));
    }

    #[test]
    fn single_segment_module_relpath_has_no_separator() {
        assert_eq!(SourceSearchPaths::module_relpath("main"), PathBuf::from("main.l0"));
    }

    #[test]
    fn resolve_fails_with_module_not_found_when_absent_everywhere() {
        let mut paths = SourceSearchPaths::new();
        paths.add_project_root("/nonexistent/l0-drv-test-root");
        let err = paths.resolve("nope.at.all").unwrap_err();
        assert!(matches!(err, DriverError::ModuleNotFound { .. }));
    }

    #[test]
    fn system_roots_are_searched_before_project_roots() {
        let dir = std::env::temp_dir().join("l0-drv-paths-test-system-first");
        let sys = dir.join("sys");
        let proj = dir.join("proj");
        std::fs::create_dir_all(&sys).unwrap();
        std::fs::create_dir_all(&proj).unwrap();
        std::fs::write(sys.join("m.l0"), "module m;\n").unwrap();
        std::fs::write(proj.join("m.l0"), "module m;\n").unwrap();

        let mut paths = SourceSearchPaths::new();
        paths.add_system_root(&sys);
        paths.add_project_root(&proj);
        let found = paths.resolve("m").unwrap();
        assert_eq!(found, sys.join("m.l0"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
