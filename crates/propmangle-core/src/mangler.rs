//! Writes substitutes into the tree, at most once per node.

use crate::cache::NameTable;
use crate::classify::{BindingQuery, Verdict};
use crate::config::MangleOptions;
use crate::policy::RenamePolicy;
use propmangle_parser::{Ast, NodeId, NodeKind};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::ops::AddAssign;
use tracing::trace;

/// Counters for one or more runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MangleStats {
    /// Name occurrences whose text changed.
    pub renamed: usize,
    /// Substitutes added to the table.
    pub generated: usize,
}

impl AddAssign for MangleStats {
    fn add_assign(&mut self, other: Self) {
        self.renamed += other.renamed;
        self.generated += other.generated;
    }
}

/// Applies verdicts for one run over one tree.
///
/// `processed` lives as long as the mangler, so a node reached by two rules
/// (a member's object and the identifier itself) is renamed only once.
pub struct PropertyMangler<'a, T: NameTable + ?Sized> {
    policy: RenamePolicy<'a>,
    table: &'a mut T,
    processed: FxHashSet<NodeId>,
    stats: MangleStats,
}

impl<'a, T: NameTable + ?Sized> PropertyMangler<'a, T> {
    pub fn new(options: &'a MangleOptions, table: &'a mut T) -> Self {
        Self {
            policy: RenamePolicy::new(options),
            table,
            processed: FxHashSet::default(),
            stats: MangleStats::default(),
        }
    }

    /// Never hand out a new substitute for which `taken` holds.
    #[must_use]
    pub fn avoiding(mut self, taken: &'a dyn BindingQuery) -> Self {
        self.policy = self.policy.avoiding(taken);
        self
    }

    /// Rename `node` unless it was already handled in this run. Returns
    /// whether its name changed.
    pub fn apply_if_needed(&mut self, ast: &mut Ast, node: NodeId) -> bool {
        if !self.processed.insert(node) {
            return false;
        }
        let Some(current) = ast.name(node) else {
            return false;
        };
        let substitute = self.policy.resolve(current, self.table);
        if substitute.fresh {
            self.stats.generated += 1;
        }
        if substitute.name == current {
            return false;
        }
        trace!(from = current, to = %substitute.name, node = node.index(), "rename");
        if let Some(name) = ast.name_mut(node) {
            *name = substitute.name;
        }
        self.stats.renamed += 1;
        true
    }

    /// Carry out a verdict.
    pub fn apply(&mut self, ast: &mut Ast, verdict: Verdict) {
        match verdict {
            Verdict::Skip => {}
            Verdict::Rename(node) => {
                self.apply_if_needed(ast, node);
            }
            Verdict::ExpandShorthand { property, key } => {
                if let NodeKind::Property { shorthand, .. } = ast.kind_mut(property) {
                    *shorthand = false;
                }
                self.apply_if_needed(ast, key);
            }
            Verdict::RenameMember { property, object } => {
                self.apply_if_needed(ast, property);
                if let Some(object) = object {
                    self.apply_if_needed(ast, object);
                }
            }
        }
    }

    pub fn stats(&self) -> MangleStats {
        self.stats
    }

    pub fn finish(self) -> MangleStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NameCache;
    use crate::config::CacheOptions;
    use propmangle_parser::parse;

    fn prop_names(ast: &Ast) -> Vec<NodeId> {
        ast.ids()
            .filter(|&id| matches!(ast.kind(id), NodeKind::PropName(_)))
            .collect()
    }

    #[test]
    fn test_node_is_renamed_once() {
        let mut ast = parse("o.foo;").unwrap();
        let key = prop_names(&ast)[0];
        let options = MangleOptions::default();
        let mut cache = NameCache::new(CacheOptions::default()).unwrap();
        let mut mangler = PropertyMangler::new(&options, &mut cache);

        assert!(mangler.apply_if_needed(&mut ast, key));
        assert_eq!(ast.name(key), Some("A"));
        // A second rule on the same node must not rename "A" again.
        assert!(!mangler.apply_if_needed(&mut ast, key));
        assert_eq!(ast.name(key), Some("A"));

        let stats = mangler.finish();
        assert_eq!(stats, MangleStats { renamed: 1, generated: 1 });
        assert_eq!(cache.get("A"), None);
    }

    #[test]
    fn test_expand_shorthand() {
        let mut ast = parse("var x; var o = {x};").unwrap();
        let property = ast
            .ids()
            .find(|&id| matches!(ast.kind(id), NodeKind::Property { .. }))
            .unwrap();
        let key = prop_names(&ast)[0];
        let options = MangleOptions::default();
        let mut cache = NameCache::new(CacheOptions::default()).unwrap();
        let mut mangler = PropertyMangler::new(&options, &mut cache);
        mangler.apply(&mut ast, Verdict::ExpandShorthand { property, key });

        assert!(matches!(ast.kind(property), NodeKind::Property { shorthand: false, .. }));
        assert_eq!(ast.name(key), Some("A"));
    }

    #[test]
    fn test_protected_name_is_not_counted() {
        let mut ast = parse("window;").unwrap();
        let ident = ast
            .ids()
            .find(|&id| matches!(ast.kind(id), NodeKind::Ident(_)))
            .unwrap();
        let options = MangleOptions::default();
        let mut cache = NameCache::new(CacheOptions::default()).unwrap();
        let mut mangler = PropertyMangler::new(&options, &mut cache);
        assert!(!mangler.apply_if_needed(&mut ast, ident));
        assert_eq!(mangler.stats(), MangleStats::default());
    }

    #[test]
    fn test_stats_add() {
        let mut total = MangleStats { renamed: 1, generated: 1 };
        total += MangleStats { renamed: 2, generated: 0 };
        assert_eq!(total, MangleStats { renamed: 3, generated: 1 });
    }
}
