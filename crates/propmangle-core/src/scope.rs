//! Lexical scope analysis.
//!
//! One pass over the tree builds a scope tree and records every binding, so
//! a later walk can ask whether a name is bound at any node. Hoisting is
//! resolved up front: a `var` used before its declaration is still bound.

use crate::classify::BindingQuery;
use propmangle_parser::{Ast, NodeId, NodeKind, VarKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

pub type ScopeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Function,
    Block,
    Catch,
    Class,
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    /// Names declared in this scope.
    bindings: FxHashSet<String>,
    /// A direct `eval` or `with` appears in this scope or a nested one.
    has_eval: bool,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            kind,
            bindings: FxHashSet::default(),
            has_eval: false,
        }
    }
}

/// Scopes of one program, and the nodes that open them.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    /// Scope-opening node to the scope its children live in.
    by_node: FxHashMap<NodeId, ScopeId>,
    /// Every name declared in any scope.
    declared: FxHashSet<String>,
}

impl ScopeTree {
    /// Build the scope tree of `ast`.
    pub fn build(ast: &Ast) -> Self {
        let mut tree = Self {
            scopes: vec![Scope::new(ScopeKind::Program, None)],
            by_node: FxHashMap::default(),
            declared: FxHashSet::default(),
        };
        for &stmt in &ast.body {
            tree.collect(ast, stmt, 0);
        }
        tree
    }

    pub fn root(&self) -> ScopeId {
        0
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope].kind
    }

    /// The scope opened by `node`, if it opens one.
    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.by_node.get(&node).copied()
    }

    pub fn has_eval(&self, scope: ScopeId) -> bool {
        self.scopes[scope].has_eval
    }

    /// Whether `name` is declared in `scope` or an enclosing scope, or is a
    /// built-in global.
    pub fn is_bound(&self, scope: ScopeId, name: &str) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scopes[id].bindings.contains(name) {
                return true;
            }
            current = self.scopes[id].parent;
        }
        is_builtin_global(name)
    }

    /// Whether `name` is declared anywhere in the program or is a built-in
    /// global. A substitute equal to such a name could capture or shadow it.
    pub fn declares(&self, name: &str) -> bool {
        self.declared.contains(name) || is_builtin_global(name)
    }

    /// Binding query at `scope`.
    pub fn view(&self, scope: ScopeId) -> ScopeView<'_> {
        ScopeView { tree: self, scope }
    }

    fn add_scope(&mut self, kind: ScopeKind, parent: ScopeId, node: NodeId) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(kind, Some(parent)));
        self.by_node.insert(node, id);
        id
    }

    fn add_binding(&mut self, name: &str, scope: ScopeId) {
        self.scopes[scope].bindings.insert(name.to_string());
        self.declared.insert(name.to_string());
    }

    /// Nearest function or program scope, for `var` hoisting.
    fn hoist_target(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let kind = self.scopes[current].kind;
            if kind == ScopeKind::Function || kind == ScopeKind::Program {
                return current;
            }
            match self.scopes[current].parent {
                Some(p) => current = p,
                None => return current,
            }
        }
    }

    /// Mark a scope and all its ancestors as containing `eval`.
    fn mark_eval(&mut self, scope: ScopeId) {
        let mut current = Some(scope);
        while let Some(id) = current {
            self.scopes[id].has_eval = true;
            current = self.scopes[id].parent;
        }
    }

    fn collect(&mut self, ast: &Ast, node: NodeId, scope: ScopeId) {
        let inner = match ast.kind(node) {
            NodeKind::VarDecl { kind, declarators } => {
                let target = if *kind == VarKind::Var {
                    self.hoist_target(scope)
                } else {
                    scope
                };
                for &declarator in declarators {
                    if let NodeKind::Declarator { binding, .. } = ast.kind(declarator) {
                        self.bind_pattern(ast, *binding, target);
                    }
                }
                scope
            }
            NodeKind::FunctionDecl(func) => {
                if let Some(name) = func.name.and_then(|n| ast.name(n)) {
                    self.add_binding(name, scope);
                }
                let fn_scope = self.add_scope(ScopeKind::Function, scope, node);
                for &param in &func.params {
                    self.bind_pattern(ast, param, fn_scope);
                }
                fn_scope
            }
            NodeKind::FunctionExpr(func) => {
                let fn_scope = self.add_scope(ScopeKind::Function, scope, node);
                // Visible only inside the function itself.
                if let Some(name) = func.name.and_then(|n| ast.name(n)) {
                    self.add_binding(name, fn_scope);
                }
                for &param in &func.params {
                    self.bind_pattern(ast, param, fn_scope);
                }
                fn_scope
            }
            NodeKind::Arrow { params, .. } => {
                let fn_scope = self.add_scope(ScopeKind::Function, scope, node);
                for &param in params {
                    self.bind_pattern(ast, param, fn_scope);
                }
                fn_scope
            }
            NodeKind::ClassDecl(class) => {
                let name = class.name.and_then(|n| ast.name(n));
                if let Some(name) = name {
                    self.add_binding(name, scope);
                }
                let class_scope = self.add_scope(ScopeKind::Class, scope, node);
                if let Some(name) = name {
                    self.add_binding(name, class_scope);
                }
                class_scope
            }
            NodeKind::ClassExpr(class) => {
                let class_scope = self.add_scope(ScopeKind::Class, scope, node);
                if let Some(name) = class.name.and_then(|n| ast.name(n)) {
                    self.add_binding(name, class_scope);
                }
                class_scope
            }
            NodeKind::Block(_)
            | NodeKind::For { .. }
            | NodeKind::ForIn { .. }
            | NodeKind::ForOf { .. }
            | NodeKind::Switch { .. } => self.add_scope(ScopeKind::Block, scope, node),
            NodeKind::CatchClause { param, .. } => {
                let catch_scope = self.add_scope(ScopeKind::Catch, scope, node);
                if let Some(param) = *param {
                    self.bind_pattern(ast, param, catch_scope);
                }
                catch_scope
            }
            NodeKind::Call { callee, .. } => {
                if matches!(ast.kind(*callee), NodeKind::Ident(name) if name == "eval") {
                    warn!(offset = ast.span(node).start, "direct eval; renamed names may be looked up dynamically");
                    self.mark_eval(scope);
                }
                scope
            }
            NodeKind::With { .. } => {
                warn!(offset = ast.span(node).start, "with statement; renamed names may be looked up dynamically");
                self.mark_eval(scope);
                scope
            }
            _ => scope,
        };

        for child in ast.children(node) {
            self.collect(ast, child, inner);
        }
    }

    /// Bind every name introduced by a binding pattern.
    fn bind_pattern(&mut self, ast: &Ast, pattern: NodeId, scope: ScopeId) {
        match ast.kind(pattern) {
            NodeKind::BindingIdent(name) => self.add_binding(name, scope),
            NodeKind::ArrayPattern(elements) => {
                for &element in elements.iter().flatten() {
                    self.bind_pattern(ast, element, scope);
                }
            }
            NodeKind::ObjectPattern(props) => {
                for &prop in props {
                    match ast.kind(prop) {
                        NodeKind::Property { value, .. } => self.bind_pattern(ast, *value, scope),
                        NodeKind::Rest(arg) => self.bind_pattern(ast, *arg, scope),
                        _ => {}
                    }
                }
            }
            NodeKind::AssignPattern { target, .. } => self.bind_pattern(ast, *target, scope),
            NodeKind::Rest(arg) => self.bind_pattern(ast, *arg, scope),
            _ => {}
        }
    }
}

/// [`BindingQuery`] answered from one scope of a [`ScopeTree`].
#[derive(Debug, Clone, Copy)]
pub struct ScopeView<'a> {
    tree: &'a ScopeTree,
    scope: ScopeId,
}

impl BindingQuery for ScopeView<'_> {
    fn has_local_binding(&self, name: &str) -> bool {
        self.tree.is_bound(self.scope, name)
    }
}

/// ECMAScript built-in globals and context names.
///
/// These resolve at runtime without a declaration in the program, so they
/// count as bound and are never renamed as unresolved globals.
pub fn is_builtin_global(name: &str) -> bool {
    matches!(
        name,
        "Array"
            | "ArrayBuffer"
            | "Atomics"
            | "BigInt"
            | "BigInt64Array"
            | "BigUint64Array"
            | "Boolean"
            | "DataView"
            | "Date"
            | "Error"
            | "EvalError"
            | "FinalizationRegistry"
            | "Float32Array"
            | "Float64Array"
            | "Function"
            | "Infinity"
            | "Int16Array"
            | "Int32Array"
            | "Int8Array"
            | "Intl"
            | "JSON"
            | "Map"
            | "Math"
            | "NaN"
            | "Number"
            | "Object"
            | "Promise"
            | "Proxy"
            | "RangeError"
            | "ReferenceError"
            | "Reflect"
            | "RegExp"
            | "Set"
            | "SharedArrayBuffer"
            | "String"
            | "Symbol"
            | "SyntaxError"
            | "TypeError"
            | "URIError"
            | "Uint16Array"
            | "Uint32Array"
            | "Uint8Array"
            | "Uint8ClampedArray"
            | "WeakMap"
            | "WeakRef"
            | "WeakSet"
            | "arguments"
            | "decodeURI"
            | "decodeURIComponent"
            | "encodeURI"
            | "encodeURIComponent"
            | "escape"
            | "eval"
            | "globalThis"
            | "isFinite"
            | "isNaN"
            | "parseFloat"
            | "parseInt"
            | "undefined"
            | "unescape"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use propmangle_parser::parse;

    /// Scope of the first identifier reference named `name`.
    fn scope_at(ast: &Ast, tree: &ScopeTree, name: &str) -> ScopeId {
        let target = ast
            .ids()
            .find(|&id| matches!(ast.kind(id), NodeKind::Ident(n) if n == name))
            .unwrap();
        let mut found = None;
        let mut stack: Vec<(NodeId, ScopeId)> = ast.body.iter().rev().map(|&s| (s, tree.root())).collect();
        while let Some((node, scope)) = stack.pop() {
            let scope = tree.scope_of(node).unwrap_or(scope);
            if node == target {
                found = Some(scope);
                break;
            }
            for child in ast.children(node).into_iter().rev() {
                stack.push((child, scope));
            }
        }
        found.unwrap()
    }

    #[test]
    fn test_var_hoists_to_function() {
        let ast = parse("function f() { { var a = 1; let b = 2; } use1; } use2;").unwrap();
        let tree = ScopeTree::build(&ast);
        let inner = scope_at(&ast, &tree, "use1");
        assert_eq!(tree.kind(inner), ScopeKind::Function);
        assert!(tree.is_bound(inner, "a"));
        assert!(!tree.is_bound(inner, "b"));
        assert!(tree.is_bound(inner, "f"));

        let outer = scope_at(&ast, &tree, "use2");
        assert_eq!(outer, tree.root());
        assert!(tree.is_bound(outer, "f"));
        assert!(!tree.is_bound(outer, "a"));
    }

    #[test]
    fn test_use_before_declaration() {
        let ast = parse("o.x = 1; var o = {};").unwrap();
        let tree = ScopeTree::build(&ast);
        assert!(tree.is_bound(tree.root(), "o"));
    }

    #[test]
    fn test_parameters_and_patterns() {
        let ast = parse("function f(a, {b, c: [d]}, ...e) { marker; } var {x, y: {z}} = o;").unwrap();
        let tree = ScopeTree::build(&ast);
        let inner = scope_at(&ast, &tree, "marker");
        for name in ["a", "b", "d", "e", "x", "z"] {
            assert!(tree.is_bound(inner, name), "{name} should be bound");
        }
        assert!(!tree.is_bound(inner, "c"));
        assert!(!tree.is_bound(tree.root(), "a"));
    }

    #[test]
    fn test_function_expression_name_is_local() {
        let ast = parse("var g = function h() { inside; }; outside;").unwrap();
        let tree = ScopeTree::build(&ast);
        assert!(tree.is_bound(scope_at(&ast, &tree, "inside"), "h"));
        assert!(!tree.is_bound(scope_at(&ast, &tree, "outside"), "h"));
    }

    #[test]
    fn test_arrow_and_catch_scopes() {
        let ast = parse("var f = (p) => p1; try {} catch (err) { c1; } c2;").unwrap();
        let tree = ScopeTree::build(&ast);
        assert!(tree.is_bound(scope_at(&ast, &tree, "p1"), "p"));
        let catch = scope_at(&ast, &tree, "c1");
        assert!(tree.is_bound(catch, "err"));
        assert!(!tree.is_bound(scope_at(&ast, &tree, "c2"), "err"));
    }

    #[test]
    fn test_for_let_and_class_scopes() {
        let ast = parse("for (let i = 0; i < 1; i++) { loop1; } after; var K = class Named { m() { named; } };").unwrap();
        let tree = ScopeTree::build(&ast);
        assert!(tree.is_bound(scope_at(&ast, &tree, "loop1"), "i"));
        assert!(!tree.is_bound(scope_at(&ast, &tree, "after"), "i"));
        assert!(tree.is_bound(scope_at(&ast, &tree, "named"), "Named"));
        assert!(!tree.is_bound(tree.root(), "Named"));
    }

    #[test]
    fn test_builtins_are_bound() {
        let ast = parse("").unwrap();
        let tree = ScopeTree::build(&ast);
        assert!(tree.view(tree.root()).has_local_binding("Object"));
        assert!(tree.view(tree.root()).has_local_binding("undefined"));
        assert!(!tree.view(tree.root()).has_local_binding("document"));
    }

    #[test]
    fn test_declares_covers_every_scope() {
        let ast = parse("function f(a) { let B = 1; } class K {}").unwrap();
        let tree = ScopeTree::build(&ast);
        for name in ["f", "a", "B", "K", "Map"] {
            assert!(tree.declares(name), "{name} should be declared");
        }
        assert!(!tree.declares("document"));
        assert!(!tree.is_bound(tree.root(), "B"));
    }

    #[test]
    fn test_eval_is_recorded() {
        let ast = parse("function f() { eval('x'); }").unwrap();
        let tree = ScopeTree::build(&ast);
        assert!(tree.has_eval(tree.root()));
        let plain = ScopeTree::build(&parse("function f() {}").unwrap());
        assert!(!plain.has_eval(plain.root()));
    }
}
