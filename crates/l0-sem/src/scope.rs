//! Local scope resolution (spec.md §4.6): a parent-linked scope tree per
//! non-extern function body, ported from the original implementation's
//! `LocalScopeResolver`.
//!
//! Blocks carry no stable node identity in this AST (they're plain owned
//! values, not arena-allocated), so scopes are keyed by the block's/arm's
//! `Span` instead of the original's `id(node)` - spans are unique within a
//! single function body since the parser never reuses one.

use l0_par::ast;
use l0_util::{define_idx, FxHashMap, IndexVec, Span, Symbol};

define_idx!(RibId);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalKind {
    Param,
    Local,
    PatternVar,
}

#[derive(Debug)]
pub struct Rib {
    pub bindings: FxHashMap<Symbol, LocalKind>,
    pub parent: Option<RibId>,
}

/// Scope tree for a single function body. Unlike the front end's
/// [`crate::symbol::ModuleEnv`], this tree never resolves names itself -
/// it only records which names are visible in which blocks, for the type
/// checker and emitter to consult and build their own stacks from.
pub struct ScopeTree {
    pub ribs: IndexVec<RibId, Rib>,
    pub root: RibId,
    block_scopes: FxHashMap<Span, RibId>,
    match_arm_scopes: FxHashMap<Span, RibId>,
}

impl ScopeTree {
    fn new() -> Self {
        let mut ribs = IndexVec::new();
        let root = ribs.push(Rib { bindings: FxHashMap::default(), parent: None });
        Self { ribs, root, block_scopes: FxHashMap::default(), match_arm_scopes: FxHashMap::default() }
    }

    fn enter_scope(&mut self, parent: RibId) -> RibId {
        self.ribs.push(Rib { bindings: FxHashMap::default(), parent: Some(parent) })
    }

    /// First declaration in a scope wins; duplicate-declaration diagnostics
    /// are the type checker's job (spec.md §4.6: "duplicate declarations
    /// within a single scope are tolerated silently at this layer").
    fn declare(&mut self, rib: RibId, name: Symbol, kind: LocalKind) {
        self.ribs[rib].bindings.entry(name).or_insert(kind);
    }

    pub fn block_scope(&self, span: Span) -> Option<RibId> {
        self.block_scopes.get(&span).copied()
    }

    pub fn match_arm_scope(&self, span: Span) -> Option<RibId> {
        self.match_arm_scopes.get(&span).copied()
    }

    /// Walks outward from `rib`, returning the first scope (if any) that
    /// declares `name`.
    pub fn resolve(&self, rib: RibId, name: Symbol) -> Option<LocalKind> {
        let mut current = Some(rib);
        while let Some(id) = current {
            if let Some(kind) = self.ribs[id].bindings.get(&name) {
                return Some(*kind);
            }
            current = self.ribs[id].parent;
        }
        None
    }
}

pub struct LocalScopeResolver;

impl LocalScopeResolver {
    /// Builds the scope tree for one non-extern function's body.
    pub fn resolve(func: &ast::FuncDecl) -> ScopeTree {
        let mut tree = ScopeTree::new();
        let root = tree.root;
        let body = func.body.as_ref().expect("resolve_function_scopes requires a non-extern function");

        for param in &func.params {
            tree.declare(root, param.name, LocalKind::Param);
        }
        tree.block_scopes.insert(body.span, root);
        Self::visit_block(&mut tree, body, root);
        tree
    }

    fn visit_block(tree: &mut ScopeTree, block: &ast::Block, scope: RibId) {
        for stmt in &block.stmts {
            Self::visit_stmt(tree, stmt, scope);
        }
    }

    fn visit_stmt(tree: &mut ScopeTree, stmt: &ast::Stmt, scope: RibId) {
        match stmt {
            ast::Stmt::Let(let_stmt) => {
                tree.declare(scope, let_stmt.name, LocalKind::Local);
            }
            ast::Stmt::If(if_stmt) => {
                Self::visit_block(tree, &if_stmt.then_block, scope);
                if let Some(else_branch) = &if_stmt.else_block {
                    Self::visit_else(tree, else_branch, scope);
                }
            }
            ast::Stmt::While(while_stmt) => {
                let body_scope = tree.enter_scope(scope);
                tree.block_scopes.insert(while_stmt.body.span, body_scope);
                Self::visit_block(tree, &while_stmt.body, body_scope);
            }
            ast::Stmt::For(for_stmt) => {
                // The init/update statements live in a for-outer scope
                // shared with the loop body (spec.md §4.7: "all scoped
                // inside a for-outer scope").
                let outer_scope = tree.enter_scope(scope);
                if let Some(init) = &for_stmt.init {
                    Self::visit_stmt(tree, init, outer_scope);
                }
                tree.block_scopes.insert(for_stmt.body.span, outer_scope);
                Self::visit_block(tree, &for_stmt.body, outer_scope);
            }
            ast::Stmt::Match(match_stmt) => {
                for arm in &match_stmt.arms {
                    Self::visit_match_arm(tree, arm, scope);
                }
            }
            ast::Stmt::Case(case_stmt) => {
                for arm in &case_stmt.arms {
                    let arm_scope = tree.enter_scope(scope);
                    tree.block_scopes.insert(arm.body.span, arm_scope);
                    Self::visit_block(tree, &arm.body, arm_scope);
                }
                if let Some(else_arm) = &case_stmt.else_arm {
                    let arm_scope = tree.enter_scope(scope);
                    tree.block_scopes.insert(else_arm.span, arm_scope);
                    Self::visit_block(tree, else_arm, arm_scope);
                }
            }
            ast::Stmt::With(with_stmt) => {
                let with_scope = tree.enter_scope(scope);
                for item in &with_stmt.items {
                    tree.declare(with_scope, item.name, LocalKind::Local);
                }
                tree.block_scopes.insert(with_stmt.body.span, with_scope);
                Self::visit_block(tree, &with_stmt.body, with_scope);
                if let Some(cleanup) = &with_stmt.cleanup {
                    let cleanup_scope = tree.enter_scope(scope);
                    tree.block_scopes.insert(cleanup.span, cleanup_scope);
                    Self::visit_block(tree, cleanup, cleanup_scope);
                }
            }
            ast::Stmt::Block(block) => {
                let block_scope = tree.enter_scope(scope);
                tree.block_scopes.insert(block.span, block_scope);
                Self::visit_block(tree, block, block_scope);
            }
            // Assign/Expr/Return/Drop/Break/Continue introduce no bindings
            // or scopes of their own.
            ast::Stmt::Assign(_)
            | ast::Stmt::Expr(_)
            | ast::Stmt::Return(_)
            | ast::Stmt::Drop(_)
            | ast::Stmt::Break(_)
            | ast::Stmt::Continue(_) => {}
        }
    }

    fn visit_else(tree: &mut ScopeTree, branch: &ast::ElseBranch, scope: RibId) {
        match branch {
            ast::ElseBranch::Block(block) => {
                let block_scope = tree.enter_scope(scope);
                tree.block_scopes.insert(block.span, block_scope);
                Self::visit_block(tree, block, block_scope);
            }
            ast::ElseBranch::If(if_stmt) => {
                Self::visit_block(tree, &if_stmt.then_block, scope);
                if let Some(else_branch) = &if_stmt.else_block {
                    Self::visit_else(tree, else_branch, scope);
                }
            }
        }
    }

    fn visit_match_arm(tree: &mut ScopeTree, arm: &ast::MatchArm, parent_scope: RibId) {
        let arm_scope = tree.enter_scope(parent_scope);
        tree.match_arm_scopes.insert(arm.span, arm_scope);
        tree.block_scopes.insert(arm.body.span, arm_scope);

        if let ast::MatchPattern::Variant { bindings, .. } = &arm.pattern {
            for name in bindings {
                tree.declare(arm_scope, *name, LocalKind::PatternVar);
            }
        }
        Self::visit_block(tree, &arm.body, arm_scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l0_lex::Lexer;
    use l0_par::Parser;
    use l0_util::{Handler, Interner};

    fn parse_func(src: &str) -> ast::Module {
        let mut interner = Interner::new();
        let mut handler = Handler::new();
        let tokens: Vec<_> = Lexer::new(src, &mut handler).collect();
        assert!(!handler.has_errors(), "lex errors: {:?}", handler.diagnostics());
        let filename = interner.intern("t.l0");
        let mut parser = Parser::new(tokens, &mut handler, &mut interner);
        let module = parser.parse_module(filename).expect("parses");
        assert!(!handler.has_errors(), "parse errors: {:?}", handler.diagnostics());
        module
    }

    fn only_func(module: &ast::Module) -> &ast::FuncDecl {
        module
            .decls
            .iter()
            .find_map(|d| match d {
                ast::Decl::Func(f) => Some(f),
                _ => None,
            })
            .expect("one func decl")
    }

    #[test]
    fn params_and_top_level_lets_share_root_scope() {
        let module = parse_func(
            "module m;\nfunc f(a: int) -> int {\n\tlet b: int = a;\n\treturn b;\n}\n",
        );
        let func = only_func(&module);
        let tree = LocalScopeResolver::resolve(func);
        assert!(tree.resolve(tree.root, func.params[0].name).is_some());
    }

    #[test]
    fn while_body_gets_a_child_scope() {
        let module = parse_func(
            "module m;\nfunc f() -> int {\n\tlet i: int = 0;\n\twhile (i) {\n\t\tlet j: int = i;\n\t}\n\treturn i;\n}\n",
        );
        let func = only_func(&module);
        let tree = LocalScopeResolver::resolve(func);
        let ast::Stmt::While(w) = &func.body.as_ref().unwrap().stmts[1] else { panic!("expected while") };
        let body_scope = tree.block_scope(w.body.span).expect("body scope recorded");
        assert_ne!(body_scope, tree.root);
        assert_eq!(tree.ribs[body_scope].parent, Some(tree.root));
    }

    #[test]
    fn match_arm_binds_pattern_variables_in_its_own_scope() {
        let module = parse_func(
            "module m;\nenum E { A(int); B(); }\nfunc f(e: E) -> int {\n\tmatch (e) {\n\t\tA(x) => { return x; }\n\t\telse => { return 0; }\n\t}\n}\n",
        );
        let func = only_func(&module);
        let tree = LocalScopeResolver::resolve(func);
        let ast::Stmt::Match(m) = &func.body.as_ref().unwrap().stmts[0] else { panic!("expected match") };
        let arm_scope = tree.match_arm_scope(m.arms[0].span).expect("arm scope recorded");
        let ast::MatchPattern::Variant { bindings, .. } = &m.arms[0].pattern else { panic!("variant pattern") };
        assert!(tree.resolve(arm_scope, bindings[0]).is_some());
        assert!(tree.resolve(tree.root, bindings[0]).is_none());
    }
}
