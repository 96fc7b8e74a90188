//! Scope-context stack for cleanup scheduling (spec.md §4.8 "Cleanup
//! scheduling"), grounded on the original implementation's
//! `ScopeContext`/`Backend._push_scope`/`_pop_scope`.
//!
//! The original models scopes as a parent-linked chain so cleanup walks
//! can start from any interior scope and climb to the root. Every walk in
//! this compiler only ever starts at the *current* scope, so a flat stack
//! (`Vec<Scope>`, walked from the end backwards) is equivalent and avoids
//! the reference-counted parent pointers the original needs in Python.

use l0_par::ast::Block;
use l0_sem::Type;

/// How a `with`-scope's user cleanup code was written (spec.md §4.8:
/// "implicit per-item form" vs "explicit block form").
#[derive(Clone)]
pub enum WithCleanup {
    /// One inline cleanup block per succeeded `WithItem`, in binding order;
    /// run in reverse (LIFO) so a later item's init failure only tears down
    /// the items that already succeeded.
    Inline(Vec<Block>),
    /// A single `cleanup { ... }` block shared by the whole `with`.
    Block(Block),
}

pub struct Scope {
    /// `(mangled_name, type)` for every local visible in this scope,
    /// parameters included — used for lvalue-caching type lookups.
    pub declared_vars: Vec<(String, Type)>,
    /// `(mangled_name, type)` for locals this scope itself is responsible
    /// for cleaning up, in declaration order.
    pub owned_vars: Vec<(String, Type)>,
    pub with_cleanup: Option<WithCleanup>,
    pub with_cleanup_in_progress: bool,
}

impl Scope {
    fn new() -> Self {
        Self { declared_vars: Vec::new(), owned_vars: Vec::new(), with_cleanup: None, with_cleanup_in_progress: false }
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: Type) {
        self.declared_vars.push((name.into(), ty));
    }

    pub fn add_owned(&mut self, name: impl Into<String>, ty: Type) {
        self.owned_vars.push((name.into(), ty));
    }

    /// Promotes an already-declared (but not yet owned) local — a borrowed
    /// parameter that has just been reassigned — into an owned one (spec.md
    /// §4.8 "Reassignment").
    pub fn promote_to_owned(&mut self, name: &str, ty: Type) {
        if !self.owned_vars.iter().any(|(n, _)| n == name) {
            self.owned_vars.push((name.to_string(), ty));
        }
    }
}

/// Stack of lexical scopes plus the subset that are loop bodies, mirroring
/// `Backend._current_scope` / `Backend._loop_scope_stack`.
#[derive(Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    /// Indices into `scopes` identifying loop-body scopes, innermost last.
    loop_scopes: Vec<usize>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) -> usize {
        self.scopes.push(Scope::new());
        self.scopes.len() - 1
    }

    pub fn push_loop(&mut self) -> usize {
        let idx = self.push();
        self.loop_scopes.push(idx);
        idx
    }

    pub fn pop(&mut self) {
        let idx = self.scopes.len().saturating_sub(1);
        if self.loop_scopes.last() == Some(&idx) {
            self.loop_scopes.pop();
        }
        self.scopes.pop();
    }

    /// Index of the innermost scope, for cleanup helpers that need to
    /// name "here" explicitly rather than just reach for `current_mut`.
    pub fn current_index(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope underflow")
    }

    pub fn current(&self) -> &Scope {
        self.scopes.last().expect("scope underflow")
    }

    pub fn innermost_loop_index(&self) -> Option<usize> {
        self.loop_scopes.last().copied()
    }

    /// Looks up a declared local's type by its already-mangled name,
    /// searching from the innermost scope outward.
    pub fn lookup_declared(&self, mangled_name: &str) -> Option<&Type> {
        for scope in self.scopes.iter().rev() {
            if let Some((_, ty)) = scope.declared_vars.iter().find(|(n, _)| n == mangled_name) {
                return Some(ty);
            }
        }
        None
    }

    /// Returns the index of the scope (searching from the innermost
    /// outward) in which `mangled_name` is declared, if any.
    pub fn find_declaring_scope(&self, mangled_name: &str) -> Option<usize> {
        self.scopes.iter().enumerate().rev().find_map(|(i, scope)| {
            scope.declared_vars.iter().any(|(n, _)| n == mangled_name).then_some(i)
        })
    }

    pub fn scope_mut(&mut self, idx: usize) -> &mut Scope {
        &mut self.scopes[idx]
    }

    pub fn scope(&self, idx: usize) -> &Scope {
        &self.scopes[idx]
    }

    /// Indices of every scope from the innermost outward, for a cleanup
    /// walk that runs all the way to the root (`return`/`?`).
    pub fn chain_to_root(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.scopes.len()).rev()
    }

    /// Indices from the innermost scope up to and including `loop_scope`
    /// (`break`/`continue`).
    pub fn chain_to_loop(&self, loop_scope: usize) -> impl Iterator<Item = usize> + '_ {
        (loop_scope..self.scopes.len()).rev()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
