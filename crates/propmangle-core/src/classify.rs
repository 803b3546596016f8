//! Which names at a node are submitted for renaming.
//!
//! Rules are local to one node and its parent: property and method keys are
//! always renamed, computed and string keys never are, a non-computed member
//! access renames its property and also its object when the object is an
//! unbound, non-alias identifier, and a bare identifier is renamed unless it
//! is locally bound or half of a meta-property.

use propmangle_parser::{Ast, MethodKind, NodeId, NodeKind};
use rustc_hash::FxHashSet;

/// Answers whether a name is bound at the current position.
pub trait BindingQuery {
    fn has_local_binding(&self, name: &str) -> bool;
}

impl<F> BindingQuery for F
where
    F: Fn(&str) -> bool,
{
    fn has_local_binding(&self, name: &str) -> bool {
        self(name)
    }
}

/// What to do at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Skip,
    /// Rename this name-holding node.
    Rename(NodeId),
    /// Clear the shorthand flag of `property`, then rename `key`.
    ExpandShorthand { property: NodeId, key: NodeId },
    /// Rename `property`, then `object` if present.
    RenameMember { property: NodeId, object: Option<NodeId> },
}

/// Classify `node`, whose parent in the tree is `parent`.
pub fn classify<B: BindingQuery + ?Sized>(
    ast: &Ast,
    node: NodeId,
    parent: Option<NodeId>,
    bindings: &B,
    aliases: &FxHashSet<String>,
) -> Verdict {
    match ast.kind(node) {
        NodeKind::Property {
            key,
            shorthand,
            computed,
            ..
        } => {
            if *computed || !is_prop_name(ast, *key) {
                Verdict::Skip
            } else if *shorthand {
                Verdict::ExpandShorthand {
                    property: node,
                    key: *key,
                }
            } else {
                Verdict::Rename(*key)
            }
        }

        NodeKind::ClassMethod {
            key, kind, computed, ..
        } => {
            // `constructor` is looked up by the language, not by user code.
            if *computed || *kind == MethodKind::Constructor || !is_prop_name(ast, *key) {
                Verdict::Skip
            } else {
                Verdict::Rename(*key)
            }
        }

        NodeKind::ClassField { key, computed, .. } => {
            if *computed || !is_prop_name(ast, *key) {
                Verdict::Skip
            } else {
                Verdict::Rename(*key)
            }
        }

        NodeKind::Member {
            object,
            property,
            computed,
            ..
        } => {
            if *computed || !is_prop_name(ast, *property) {
                return Verdict::Skip;
            }
            let object = match ast.kind(*object) {
                NodeKind::Ident(name) if !bindings.has_local_binding(name) && !aliases.contains(name) => {
                    Some(*object)
                }
                _ => None,
            };
            Verdict::RenameMember {
                property: *property,
                object,
            }
        }

        NodeKind::Ident(name) => {
            let in_meta_property =
                parent.is_some_and(|p| matches!(ast.kind(p), NodeKind::MetaProperty { .. }));
            if in_meta_property || bindings.has_local_binding(name) {
                Verdict::Skip
            } else {
                Verdict::Rename(node)
            }
        }

        // Reached only through their parent's rule.
        NodeKind::PropName(_) => Verdict::Skip,

        NodeKind::VarDecl { .. }
        | NodeKind::Declarator { .. }
        | NodeKind::FunctionDecl(_)
        | NodeKind::ClassDecl(_)
        | NodeKind::Block(_)
        | NodeKind::ExprStmt(_)
        | NodeKind::If { .. }
        | NodeKind::For { .. }
        | NodeKind::ForIn { .. }
        | NodeKind::ForOf { .. }
        | NodeKind::While { .. }
        | NodeKind::DoWhile { .. }
        | NodeKind::Return(_)
        | NodeKind::Throw(_)
        | NodeKind::Try { .. }
        | NodeKind::CatchClause { .. }
        | NodeKind::Switch { .. }
        | NodeKind::SwitchCase { .. }
        | NodeKind::Break(_)
        | NodeKind::Continue(_)
        | NodeKind::Labeled { .. }
        | NodeKind::With { .. }
        | NodeKind::Empty
        | NodeKind::Debugger
        | NodeKind::BindingIdent(_)
        | NodeKind::ArrayPattern(_)
        | NodeKind::ObjectPattern(_)
        | NodeKind::AssignPattern { .. }
        | NodeKind::Rest(_)
        | NodeKind::This
        | NodeKind::Super
        | NodeKind::Null
        | NodeKind::Bool(_)
        | NodeKind::Number(_)
        | NodeKind::Str(_)
        | NodeKind::Regex { .. }
        | NodeKind::Template { .. }
        | NodeKind::TaggedTemplate { .. }
        | NodeKind::Array(_)
        | NodeKind::Object(_)
        | NodeKind::FunctionExpr(_)
        | NodeKind::Arrow { .. }
        | NodeKind::ClassExpr(_)
        | NodeKind::Unary { .. }
        | NodeKind::Update { .. }
        | NodeKind::Binary { .. }
        | NodeKind::Assign { .. }
        | NodeKind::Conditional { .. }
        | NodeKind::Call { .. }
        | NodeKind::New { .. }
        | NodeKind::MetaProperty { .. }
        | NodeKind::Sequence(_)
        | NodeKind::Spread(_)
        | NodeKind::Yield { .. }
        | NodeKind::Await(_) => Verdict::Skip,
    }
}

fn is_prop_name(ast: &Ast, id: NodeId) -> bool {
    matches!(ast.kind(id), NodeKind::PropName(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use propmangle_parser::parse;

    fn aliases() -> FxHashSet<String> {
        ["window".to_string()].into_iter().collect()
    }

    fn unbound(_: &str) -> bool {
        false
    }

    fn find(ast: &Ast, pred: impl Fn(&NodeKind) -> bool) -> NodeId {
        ast.ids().find(|&id| pred(ast.kind(id))).unwrap()
    }

    fn find_all(ast: &Ast, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        ast.ids().filter(|&id| pred(ast.kind(id))).collect()
    }

    #[test]
    fn test_member_with_global_object() {
        let ast = parse("foo.bar;").unwrap();
        let member = find(&ast, |k| matches!(k, NodeKind::Member { .. }));
        let NodeKind::Member { object, property, .. } = *ast.kind(member) else {
            unreachable!()
        };
        assert_eq!(
            classify(&ast, member, None, &unbound, &aliases()),
            Verdict::RenameMember {
                property,
                object: Some(object)
            }
        );
    }

    #[test]
    fn test_member_with_bound_or_alias_object() {
        let ast = parse("o.bar; window.baz; this.qux; f().x;").unwrap();
        let bound = |name: &str| name == "o";
        for member in find_all(&ast, |k| matches!(k, NodeKind::Member { .. })) {
            match classify(&ast, member, None, &bound, &aliases()) {
                Verdict::RenameMember { object, .. } => assert_eq!(object, None),
                other => panic!("unexpected verdict {other:?}"),
            }
        }
    }

    #[test]
    fn test_computed_member_skipped() {
        let ast = parse(r#"o["foo"]; o[k];"#).unwrap();
        for member in find_all(&ast, |k| matches!(k, NodeKind::Member { .. })) {
            assert_eq!(classify(&ast, member, None, &unbound, &aliases()), Verdict::Skip);
        }
    }

    #[test]
    fn test_property_keys() {
        let ast = parse(r#"var o = {"foo": 1, ["bar"]: 2, 3: 4, baz: 5};"#).unwrap();
        let verdicts: Vec<_> = find_all(&ast, |k| matches!(k, NodeKind::Property { .. }))
            .into_iter()
            .map(|p| classify(&ast, p, None, &unbound, &aliases()))
            .collect();
        assert_eq!(verdicts[..3], [Verdict::Skip, Verdict::Skip, Verdict::Skip]);
        assert!(matches!(verdicts[3], Verdict::Rename(key) if ast.name(key) == Some("baz")));
    }

    #[test]
    fn test_shorthand_property() {
        let ast = parse("var x; var o = {x};").unwrap();
        let property = find(&ast, |k| matches!(k, NodeKind::Property { .. }));
        let verdict = classify(&ast, property, None, &|n: &str| n == "x", &aliases());
        assert!(matches!(verdict, Verdict::ExpandShorthand { property: p, key } if p == property && ast.name(key) == Some("x")));
    }

    #[test]
    fn test_class_members() {
        let ast = parse("class C { constructor() {} foo() {} static bar = 1; [baz]() {} }").unwrap();
        let methods = find_all(&ast, |k| matches!(k, NodeKind::ClassMethod { .. }));
        let verdicts: Vec<_> = methods
            .iter()
            .map(|&m| classify(&ast, m, None, &unbound, &aliases()))
            .collect();
        assert_eq!(verdicts[0], Verdict::Skip);
        assert!(matches!(verdicts[1], Verdict::Rename(key) if ast.name(key) == Some("foo")));
        assert_eq!(verdicts[2], Verdict::Skip);

        let field = find(&ast, |k| matches!(k, NodeKind::ClassField { .. }));
        assert!(matches!(
            classify(&ast, field, None, &unbound, &aliases()),
            Verdict::Rename(key) if ast.name(key) == Some("bar")
        ));
    }

    #[test]
    fn test_identifier_rules() {
        let ast = parse("function f() { return new.target; } log(x);").unwrap();
        let meta = find(&ast, |k| matches!(k, NodeKind::MetaProperty { .. }));
        for child in ast.children(meta) {
            assert_eq!(classify(&ast, child, Some(meta), &unbound, &aliases()), Verdict::Skip);
        }

        let log = find(&ast, |k| matches!(k, NodeKind::Ident(n) if n == "log"));
        assert_eq!(classify(&ast, log, None, &unbound, &aliases()), Verdict::Rename(log));
        assert_eq!(classify(&ast, log, None, &|n: &str| n == "log", &aliases()), Verdict::Skip);
    }

    #[test]
    fn test_bindings_and_bare_prop_names_skipped() {
        let ast = parse("var a = b.c;").unwrap();
        let binding = find(&ast, |k| matches!(k, NodeKind::BindingIdent(_)));
        let prop = find(&ast, |k| matches!(k, NodeKind::PropName(_)));
        assert_eq!(classify(&ast, binding, None, &unbound, &aliases()), Verdict::Skip);
        assert_eq!(classify(&ast, prop, None, &unbound, &aliases()), Verdict::Skip);
    }
}
