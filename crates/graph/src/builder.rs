use crate::error::Result;
use crate::types::{
    CallEdge, CallGraph, CallType, DependencyEdge, DependencyGraph, FunctionNode, NamespaceNode,
};
use cljscope_analyzer::{Analyzer, DefinitionRecord, DependencyKind, NamespaceRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static CALL_SITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([a-zA-Z][\w.*+!?<>=/-]*)").expect("valid call site regex"));

/// Heads that are never counted as calls
const SPECIAL_FORMS: &[&str] = &[
    "let",
    "if",
    "when",
    "cond",
    "case",
    "try",
    "catch",
    "finally",
    "do",
    "loop",
    "recur",
    "fn",
    "defn",
    "defn-",
    "def",
    "defmacro",
    "quote",
    "syntax-quote",
    "unquote",
    "unquote-splicing",
    "and",
    "or",
    "not",
];

/// Each occurrence adds one to a function's complexity score
const NESTING_MARKERS: &[&str] = &["(let ", "(if ", "(when ", "(cond ", "(loop "];

/// Names called from `body`, deduplicated in first-occurrence order
pub fn extract_calls(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    CALL_SITE
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| !SPECIAL_FORMS.contains(name))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Call count plus one per nested binding, conditional or loop construct
pub fn call_complexity(calls: &[String], body: &str) -> usize {
    calls.len()
        + NESTING_MARKERS
            .iter()
            .map(|marker| body.matches(marker).count())
            .sum::<usize>()
}

/// Build call and dependency graphs from Clojure source
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    analyzer: Analyzer,
}

impl GraphBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self::with_analyzer(Analyzer::new()?))
    }

    pub fn with_analyzer(analyzer: Analyzer) -> Self {
        Self { analyzer }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Build the call graph of every `defn`/`defn-` in `code`
    pub fn build_call_graph(&self, code: &str) -> CallGraph {
        let graph = call_graph_from(self.analyzer.find_functions(code, None));
        log::info!(
            "Built call graph: {} functions, {} calls",
            graph.function_count(),
            graph.call_count()
        );
        graph
    }

    /// Build the dependency graph of every `ns` declaration in `code`
    pub fn build_dependency_graph(&self, code: &str) -> DependencyGraph {
        let graph = dependency_graph_from(self.analyzer.find_namespaces(code));
        log::info!(
            "Built namespace graph: {} namespaces, {} dependencies",
            graph.namespace_count(),
            graph.dependency_count()
        );
        graph
    }
}

/// Two phases: register every function name, then resolve call sites against the registry
pub fn call_graph_from(functions: Vec<DefinitionRecord>) -> CallGraph {
    let mut graph = CallGraph::new();

    // Phase 1: registry
    for definition in functions {
        graph.add_function(FunctionNode::new(definition));
    }

    // Phase 2: call sites
    let indices: Vec<_> = graph.graph.node_indices().collect();
    for caller_idx in indices {
        let (caller, line, calls) = {
            let node = &mut graph.graph[caller_idx];
            let calls = extract_calls(&node.definition.text);
            node.complexity_score = call_complexity(&calls, &node.definition.text);
            node.calls_made = calls.clone();
            (node.name.clone(), node.definition.start_line, calls)
        };

        for callee in calls {
            let call_type = match graph.find_function(&callee) {
                Some(callee_idx) => {
                    graph.graph[callee_idx].called_by.push(caller.clone());
                    graph.graph.add_edge(caller_idx, callee_idx, ());
                    CallType::Direct
                }
                None => CallType::External,
            };
            graph.calls.push(CallEdge {
                caller: caller.clone(),
                callee,
                call_type,
                line,
            });
        }
    }

    graph
}

/// Forward edges from each declaration, reverse `dependents` for declared targets
pub fn dependency_graph_from(namespaces: Vec<NamespaceRecord>) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for ns in namespaces {
        let requires = ns.required_names();
        let imports = ns.imported_names();
        graph.add_namespace(NamespaceNode::new(ns.definition, requires, imports));
    }

    let indices: Vec<_> = graph.graph.node_indices().collect();
    for from_idx in indices {
        let node = &graph.graph[from_idx];
        let from = node.name.clone();
        let namespace_line = node.definition.start_line;
        let entries: Vec<(String, DependencyKind)> = node
            .requires
            .iter()
            .map(|d| (d.clone(), DependencyKind::Require))
            .chain(node.imports.iter().map(|d| (d.clone(), DependencyKind::Import)))
            .collect();

        for (to, kind) in entries {
            if let Some(to_idx) = graph.find_namespace(&to) {
                graph.graph[to_idx].dependents.push(from.clone());
                graph.graph.add_edge(from_idx, to_idx, kind);
            }
            graph.dependencies.push(DependencyEdge {
                from: from.clone(),
                to,
                kind,
                namespace_line,
            });
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_calls_skips_special_forms() {
        let body = "(defn f [x] (let [y (g x)] (if (pos? y) (g y) (str/join \",\" (h)))))";
        assert_eq!(extract_calls(body), vec!["g", "pos?", "str/join", "h"]);
    }

    #[test]
    fn test_call_complexity_counts_nesting() {
        let body = "(defn f [x] (let [y 1] (when x (if y (a) (b)))))";
        let calls = extract_calls(body);
        assert_eq!(calls, vec!["a", "b"]);
        // two calls, one let, one when, one if
        assert_eq!(call_complexity(&calls, body), 5);
    }

    #[test]
    fn test_build_simple_graph() {
        let builder = GraphBuilder::new().unwrap();
        let graph = builder.build_call_graph("(defn foo [] (bar))\n(defn bar [] (println 1))");

        assert_eq!(graph.function_count(), 2);
        assert_eq!(graph.call_count(), 2);
        assert_eq!(graph.graph.edge_count(), 1);
        assert_eq!(graph.get_function("bar").unwrap().called_by, vec!["foo"]);
        assert_eq!(graph.calls[1].call_type, CallType::External);
        assert_eq!(graph.calls[1].line, 2);
    }

    #[test]
    fn test_redefinition_replaces_registry_entry() {
        let builder = GraphBuilder::new().unwrap();
        let graph = builder.build_call_graph("(defn f [] (a))\n(defn g [] (f))\n(defn f [] (b))");
        assert_eq!(graph.function_names(), vec!["f", "g"]);
        assert_eq!(graph.get_function("f").unwrap().calls_made, vec!["b"]);
        assert_eq!(graph.get_function("f").unwrap().definition.start_line, 3);
    }

    #[test]
    fn test_dependency_graph_edges() {
        let builder = GraphBuilder::new().unwrap();
        let code = "(ns a (:require [b :as b] [clojure.string :as str]) (:import [java.util Date]))\n(ns b)";
        let graph = builder.build_dependency_graph(code);

        assert_eq!(graph.namespace_names(), vec!["a", "b"]);
        assert_eq!(graph.dependency_count(), 3);
        assert_eq!(graph.graph.edge_count(), 1);
        assert_eq!(graph.get_namespace("b").unwrap().dependents, vec!["a"]);
        assert_eq!(
            graph.get_namespace("a").unwrap().all_dependencies,
            vec!["b", "clojure.string", "java.util"]
        );
        assert_eq!(graph.dependencies[2].kind, DependencyKind::Import);
    }
}
