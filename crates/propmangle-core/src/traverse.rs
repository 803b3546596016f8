//! Full-tree runs: scope analysis, then one pre-order walk that classifies
//! and renames every node.

use crate::cache::NameTable;
use crate::classify::classify;
use crate::config::MangleOptions;
use crate::mangler::{MangleStats, PropertyMangler};
use crate::scope::{ScopeId, ScopeTree};
use propmangle_parser::{parse, Ast, Codegen, CodegenOptions, NodeId, ParseError};
use serde::Serialize;
use tracing::debug;

/// Mangle every property and unresolved global in `ast`.
///
/// Nodes are visited in source order, so with a fresh table the first name
/// encountered receives the first substitute. New substitutes skip every name
/// the program declares and every built-in global; skipped candidates still
/// advance the seed.
pub fn mangle_program<T: NameTable + ?Sized>(ast: &mut Ast, table: &mut T, options: &MangleOptions) -> MangleStats {
    let scopes = ScopeTree::build(ast);
    let taken = |name: &str| scopes.declares(name);
    let mut mangler = PropertyMangler::new(options, table).avoiding(&taken);

    let mut stack: Vec<(NodeId, Option<NodeId>, ScopeId)> =
        ast.body.iter().rev().map(|&stmt| (stmt, None, scopes.root())).collect();
    let mut visited = 0usize;

    while let Some((node, parent, scope)) = stack.pop() {
        visited += 1;
        let scope = scopes.scope_of(node).unwrap_or(scope);
        let verdict = classify(ast, node, parent, &scopes.view(scope), &options.global_aliases);
        mangler.apply(ast, verdict);

        for child in ast.children(node).into_iter().rev() {
            stack.push((child, Some(node), scope));
        }
    }

    let stats = mangler.finish();
    debug!(
        nodes = visited,
        scopes = scopes.len(),
        renamed = stats.renamed,
        generated = stats.generated,
        eval = scopes.has_eval(scopes.root()),
        "mangled program"
    );
    stats
}

/// Result of [`mangle_source`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MangleOutput {
    pub code: String,
    pub stats: MangleStats,
}

/// Parse, mangle and print one script.
pub fn mangle_source<T: NameTable + ?Sized>(
    source: &str,
    table: &mut T,
    options: &MangleOptions,
    codegen: CodegenOptions,
) -> Result<MangleOutput, ParseError> {
    let mut ast = parse(source)?;
    let stats = mangle_program(&mut ast, table, options);
    let code = Codegen::new(&ast, codegen).generate();
    Ok(MangleOutput { code, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NameCache;
    use crate::config::CacheOptions;

    fn mangle(source: &str) -> String {
        let mut cache = NameCache::new(CacheOptions::default()).unwrap();
        mangle_source(source, &mut cache, &MangleOptions::default(), CodegenOptions::default())
            .unwrap()
            .code
    }

    #[test]
    fn test_global_reference_consistency() {
        assert_eq!(mangle("foo.bar = 1; log(foo);"), "B.A = 1;\nC(B);\n");
    }

    #[test]
    fn test_local_binding_kept() {
        assert_eq!(mangle("let o = {}; o.foo = 1;"), "let o = {};\no.A = 1;\n");
    }

    #[test]
    fn test_keys_and_methods() {
        assert_eq!(
            mangle("function test() { var o = {foo: 1, bar() {}}; o.baz = 2; }"),
            "function test() {\n  var o = {A: 1, B() {}};\n  o.C = 2;\n}\n"
        );
    }

    #[test]
    fn test_function_name_is_a_binding() {
        assert_eq!(mangle("function f() {} f.x = 1;"), "function f() {}\nf.A = 1;\n");
    }

    #[test]
    fn test_nested_member_chain() {
        assert_eq!(mangle("a.b.c;"), "C.B.A;\n");
    }

    #[test]
    fn test_substitute_skips_declared_names() {
        assert_eq!(mangle("class A extends Base {}"), "class A extends B {}\n");
        assert_eq!(mangle("var A = 1, B = 2; o.x;"), "var A = 1, B = 2;\nD.C;\n");
    }

    #[test]
    fn test_parse_error() {
        let mut cache = NameCache::new(CacheOptions::default()).unwrap();
        let err = mangle_source("var = 1;", &mut cache, &MangleOptions::default(), CodegenOptions::default());
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats() {
        let mut cache = NameCache::new(CacheOptions::default()).unwrap();
        let out = mangle_source("a.x; a.x; b.y;", &mut cache, &MangleOptions::default(), CodegenOptions::default())
            .unwrap();
        assert_eq!(out.stats.generated, 4);
        assert_eq!(out.stats.renamed, 6);
        assert_eq!(cache.seed(), 4);
    }
}
