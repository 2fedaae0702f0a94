use crate::builder::GraphBuilder;
use crate::error::{GraphError, Result};
use crate::graph::{Recursion, TransitiveDependencies};
use crate::types::{CallEdge, CallGraph, DependencyEdge, DependencyGraph, FunctionNode, NamespaceNode};
use cljscope_analyzer::{elide_always, round_to, DependencyKind};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

/// Maximum degree and every entry reaching it (nothing when the maximum is zero)
fn most_connected(degrees: &[(&str, usize)]) -> (usize, Vec<String>) {
    let max = degrees.iter().map(|&(_, d)| d).max().unwrap_or(0);
    let names = degrees
        .iter()
        .filter(|&&(_, d)| d == max && d > 0)
        .map(|&(name, _)| name.to_string())
        .collect();
    (max, names)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallGraphMetrics {
    pub total_functions: usize,
    pub total_calls: usize,
    pub avg_calls_per_function: f64,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    pub highly_called_functions: Vec<String>,
    pub highly_calling_functions: Vec<String>,
    pub total_complexity: usize,
    pub average_complexity: f64,
    /// Calls over the squared function count
    pub call_density: f64,
}

impl CallGraphMetrics {
    pub fn from_graph(graph: &CallGraph) -> Self {
        let total_functions = graph.function_count();
        let total_calls = graph.call_count();
        let in_degrees: Vec<_> = graph
            .functions()
            .map(|f| (f.name.as_str(), f.called_by.len()))
            .collect();
        let out_degrees: Vec<_> = graph
            .functions()
            .map(|f| (f.name.as_str(), f.calls_made.len()))
            .collect();
        let (max_in_degree, highly_called_functions) = most_connected(&in_degrees);
        let (max_out_degree, highly_calling_functions) = most_connected(&out_degrees);
        let total_complexity: usize = graph.functions().map(|f| f.complexity_score).sum();

        let (avg_calls_per_function, average_complexity, call_density) = if total_functions == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let n = total_functions as f64;
            (
                total_calls as f64 / n,
                round_to(total_complexity as f64 / n, 2),
                total_calls as f64 / (n * n),
            )
        };

        Self {
            total_functions,
            total_calls,
            avg_calls_per_function,
            max_in_degree,
            max_out_degree,
            highly_called_functions,
            highly_calling_functions,
            total_complexity,
            average_complexity,
            call_density,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDefinitionInfo {
    pub line: usize,
    pub private: bool,
    pub params: Option<String>,
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallAnalysis {
    pub calls_made: usize,
    pub called_by_count: usize,
    pub complexity_score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRelationships {
    pub calls: Vec<String>,
    pub called_by: Vec<String>,
    /// Other callers of the registered functions this one calls
    pub indirect_relationships: Vec<String>,
}

/// Detailed view of one function in a call graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionAnalysis {
    pub function_name: String,
    pub definition_info: FunctionDefinitionInfo,
    pub call_analysis: CallAnalysis,
    pub relationships: FunctionRelationships,
}

impl FunctionAnalysis {
    pub fn new(graph: &CallGraph, function: &FunctionNode) -> Self {
        Self {
            function_name: function.name.clone(),
            definition_info: FunctionDefinitionInfo {
                line: function.definition.start_line,
                private: function.definition.is_private(),
                params: function.definition.params.clone(),
                docstring: function.definition.docstring.clone(),
            },
            call_analysis: CallAnalysis {
                calls_made: function.calls_made.len(),
                called_by_count: function.called_by.len(),
                complexity_score: function.complexity_score,
            },
            relationships: FunctionRelationships {
                calls: function.calls_made.clone(),
                called_by: function.called_by.clone(),
                indirect_relationships: graph.indirect_relationships(&function.name),
            },
        }
    }
}

/// Traced call graph of a source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallGraphReport {
    pub functions: Vec<FunctionNode>,
    pub calls: Vec<CallEdge>,
    pub metrics: CallGraphMetrics,
    pub recursion: Recursion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_analysis: Option<FunctionAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDependencies {
    pub function: String,
    pub dependencies: FunctionAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceMetrics {
    pub total_namespaces: usize,
    pub total_dependencies: usize,
    pub requires: usize,
    pub imports: usize,
    pub avg_dependencies_per_namespace: f64,
    pub avg_dependents_per_namespace: f64,
    pub max_dependencies: usize,
    pub max_dependents: usize,
    pub namespaces_with_most_dependencies: Vec<String>,
    pub most_depended_upon_namespaces: Vec<String>,
    pub dependency_density: f64,
}

impl NamespaceMetrics {
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let total_namespaces = graph.namespace_count();
        let total_dependencies = graph.dependency_count();
        let count_kind =
            |kind: DependencyKind| graph.dependencies.iter().filter(|d| d.kind == kind).count();

        let dependency_counts: Vec<_> = graph
            .namespaces()
            .map(|ns| (ns.name.as_str(), ns.dependency_count))
            .collect();
        let dependent_counts: Vec<_> = graph
            .namespaces()
            .map(|ns| (ns.name.as_str(), ns.dependents.len()))
            .collect();
        let (max_dependencies, namespaces_with_most_dependencies) =
            most_connected(&dependency_counts);
        let (max_dependents, most_depended_upon_namespaces) = most_connected(&dependent_counts);

        let (avg_dependencies, avg_dependents, density) = if total_namespaces == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let n = total_namespaces as f64;
            let dependencies: usize = graph.namespaces().map(|ns| ns.dependency_count).sum();
            let dependents: usize = graph.namespaces().map(|ns| ns.dependents.len()).sum();
            (
                round_to(dependencies as f64 / n, 2),
                round_to(dependents as f64 / n, 2),
                round_to(total_dependencies as f64 / (n * n), 4),
            )
        };

        Self {
            total_namespaces,
            total_dependencies,
            requires: count_kind(DependencyKind::Require),
            imports: count_kind(DependencyKind::Import),
            avg_dependencies_per_namespace: avg_dependencies,
            avg_dependents_per_namespace: avg_dependents,
            max_dependencies,
            max_dependents,
            namespaces_with_most_dependencies,
            most_depended_upon_namespaces,
            dependency_density: density,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceDefinitionInfo {
    pub line: usize,
    pub docstring: Option<String>,
    /// Truncated declaration text
    pub declaration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyAnalysis {
    pub requires_count: usize,
    pub imports_count: usize,
    pub total_dependencies: usize,
    pub dependents_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceRelationships {
    pub requires: Vec<String>,
    pub imports: Vec<String>,
    pub dependents: Vec<String>,
}

/// Per-depth counts of a bounded transitive closure.
///
/// Serialized with one flat `depth_N` key per depth, in depth order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitiveAnalysis {
    /// Hop count (from 1) -> dependencies found at that depth
    pub depth_counts: BTreeMap<usize, usize>,
    pub total_transitive: usize,
    pub dependencies_by_depth: Vec<Vec<String>>,
}

impl Serialize for TransitiveAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.depth_counts.len() + 2))?;
        for (depth, count) in &self.depth_counts {
            map.serialize_entry(&format!("depth_{depth}"), count)?;
        }
        map.serialize_entry("total_transitive", &self.total_transitive)?;
        map.serialize_entry("dependencies_by_depth", &self.dependencies_by_depth)?;
        map.end()
    }
}

impl From<TransitiveDependencies> for TransitiveAnalysis {
    fn from(deps: TransitiveDependencies) -> Self {
        Self {
            depth_counts: deps
                .levels
                .iter()
                .enumerate()
                .map(|(i, level)| (i + 1, level.len()))
                .collect(),
            total_transitive: deps.total(),
            dependencies_by_depth: deps.levels,
        }
    }
}

/// Detailed view of one namespace in a dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceAnalysis {
    pub namespace_name: String,
    pub definition_info: NamespaceDefinitionInfo,
    pub dependency_analysis: DependencyAnalysis,
    pub relationships: NamespaceRelationships,
    pub transitive_analysis: TransitiveAnalysis,
}

impl NamespaceAnalysis {
    pub fn new(
        graph: &DependencyGraph,
        ns: &NamespaceNode,
        max_depth: usize,
        declaration_chars: usize,
    ) -> Self {
        Self {
            namespace_name: ns.name.clone(),
            definition_info: NamespaceDefinitionInfo {
                line: ns.definition.start_line,
                docstring: ns.definition.docstring.clone(),
                declaration: elide_always(&ns.definition.text, declaration_chars),
            },
            dependency_analysis: DependencyAnalysis {
                requires_count: ns.requires.len(),
                imports_count: ns.imports.len(),
                total_dependencies: ns.dependency_count,
                dependents_count: ns.dependents.len(),
            },
            relationships: NamespaceRelationships {
                requires: ns.requires.clone(),
                imports: ns.imports.clone(),
                dependents: ns.dependents.clone(),
            },
            transitive_analysis: graph.transitive_dependencies(&ns.name, max_depth).into(),
        }
    }
}

/// Namespace dependency graph of a source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyGraphReport {
    pub namespaces: Vec<NamespaceNode>,
    pub dependencies: Vec<DependencyEdge>,
    pub metrics: NamespaceMetrics,
    pub cycles: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_analysis: Option<NamespaceAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyTreeNode {
    pub name: String,
    pub dependencies: Vec<String>,
    pub transitive_analysis: TransitiveAnalysis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyTreeMetadata {
    pub total_dependencies: usize,
    pub transitive_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyTree {
    pub root_namespace: String,
    pub tree: DependencyTreeNode,
    pub metadata: DependencyTreeMetadata,
}

impl GraphBuilder {
    /// Call graph of every function, plus a detailed view of `target` when given.
    ///
    /// Every function body is scanned either way, so `called_by` lists are complete.
    pub fn trace_function_calls(&self, code: &str, target: Option<&str>) -> Result<CallGraphReport> {
        let graph = self.build_call_graph(code);

        let target_analysis = match target {
            Some(name) => {
                let function = graph.get_function(name).ok_or_else(|| {
                    GraphError::FunctionNotFound {
                        name: name.to_string(),
                        available: graph.function_names(),
                    }
                })?;
                Some(FunctionAnalysis::new(&graph, function))
            }
            None => None,
        };

        Ok(CallGraphReport {
            metrics: CallGraphMetrics::from_graph(&graph),
            recursion: graph.recursion(),
            functions: graph.functions().cloned().collect(),
            calls: graph.calls,
            target_analysis,
        })
    }

    /// What `function` calls and what calls it
    pub fn find_function_dependencies(&self, code: &str, function: &str) -> Result<FunctionDependencies> {
        let report = self.trace_function_calls(code, Some(function))?;
        let dependencies = report.target_analysis.ok_or_else(|| GraphError::FunctionNotFound {
            name: function.to_string(),
            available: report.functions.iter().map(|f| f.name.clone()).collect(),
        })?;
        Ok(FunctionDependencies {
            function: function.to_string(),
            dependencies,
        })
    }

    /// Dependency graph of every namespace, plus a detailed view of `target` when given
    pub fn analyze_namespace_dependencies(
        &self,
        code: &str,
        target: Option<&str>,
    ) -> Result<DependencyGraphReport> {
        let graph = self.build_dependency_graph(code);
        let config = self.analyzer().config();

        let target_analysis = match target {
            Some(name) => {
                let ns = graph.get_namespace(name).ok_or_else(|| GraphError::NamespaceNotFound {
                    name: name.to_string(),
                    available: graph.namespace_names(),
                })?;
                Some(NamespaceAnalysis::new(
                    &graph,
                    ns,
                    config.max_transitive_depth,
                    config.declaration_preview_chars,
                ))
            }
            None => None,
        };

        Ok(DependencyGraphReport {
            metrics: NamespaceMetrics::from_graph(&graph),
            cycles: graph.cycles(),
            namespaces: graph.namespaces().cloned().collect(),
            dependencies: graph.dependencies,
            target_analysis,
        })
    }

    /// Direct and bucketed transitive dependencies of `root`
    pub fn namespace_dependency_tree(&self, code: &str, root: &str) -> Result<DependencyTree> {
        let report = self.analyze_namespace_dependencies(code, Some(root))?;
        let analysis = report.target_analysis.ok_or_else(|| GraphError::NamespaceNotFound {
            name: root.to_string(),
            available: report.namespaces.iter().map(|ns| ns.name.clone()).collect(),
        })?;

        let dependencies = analysis
            .relationships
            .requires
            .iter()
            .chain(&analysis.relationships.imports)
            .cloned()
            .collect();

        Ok(DependencyTree {
            root_namespace: root.to_string(),
            metadata: DependencyTreeMetadata {
                total_dependencies: analysis.dependency_analysis.total_dependencies,
                transitive_count: analysis.transitive_analysis.total_transitive,
            },
            tree: DependencyTreeNode {
                name: root.to_string(),
                dependencies,
                transitive_analysis: analysis.transitive_analysis,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_call_metrics() {
        let code = "(defn a [] (b) (c))\n(defn b [] (c))\n(defn c [] (let [x 1] x))";
        let graph = GraphBuilder::new().unwrap().build_call_graph(code);
        let metrics = CallGraphMetrics::from_graph(&graph);

        assert_eq!(metrics.total_functions, 3);
        assert_eq!(metrics.total_calls, 3);
        assert_eq!(metrics.avg_calls_per_function, 1.0);
        assert_eq!(metrics.max_in_degree, 2);
        assert_eq!(metrics.highly_called_functions, vec!["c"]);
        assert_eq!(metrics.max_out_degree, 2);
        assert_eq!(metrics.highly_calling_functions, vec!["a"]);
        // a: 2 calls, b: 1 call, c: one let
        assert_eq!(metrics.total_complexity, 4);
        assert_eq!(metrics.average_complexity, 1.33);
        assert_eq!(metrics.call_density, 3.0 / 9.0);
    }

    #[test]
    fn test_degree_ties_are_all_reported() {
        let graph = GraphBuilder::new()
            .unwrap()
            .build_call_graph("(defn a [] (x))\n(defn b [] (y))\n(defn c [] 1)");
        let metrics = CallGraphMetrics::from_graph(&graph);
        assert_eq!(metrics.highly_calling_functions, vec!["a", "b"]);
        assert!(metrics.highly_called_functions.is_empty());
    }

    #[test]
    fn test_namespace_metrics() {
        let code = "(ns a (:require [b] [c]))\n(ns b (:require [c]) (:import [java.io File]))\n(ns c)";
        let graph = GraphBuilder::new().unwrap().build_dependency_graph(code);
        let metrics = NamespaceMetrics::from_graph(&graph);

        assert_eq!(metrics.total_namespaces, 3);
        assert_eq!(metrics.total_dependencies, 4);
        assert_eq!((metrics.requires, metrics.imports), (3, 1));
        assert_eq!(metrics.avg_dependencies_per_namespace, 1.33);
        assert_eq!(metrics.avg_dependents_per_namespace, 1.0);
        assert_eq!(metrics.namespaces_with_most_dependencies, vec!["a", "b"]);
        assert_eq!(metrics.most_depended_upon_namespaces, vec!["c"]);
        assert_eq!(metrics.dependency_density, 0.4444);
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let builder = GraphBuilder::new().unwrap();
        let calls = CallGraphMetrics::from_graph(&builder.build_call_graph(""));
        assert_eq!(calls.total_functions, 0);
        assert_eq!(calls.call_density, 0.0);
        let namespaces = NamespaceMetrics::from_graph(&builder.build_dependency_graph(""));
        assert_eq!(namespaces.total_namespaces, 0);
        assert_eq!(namespaces.dependency_density, 0.0);
    }

    #[test]
    fn test_transitive_analysis_keys() {
        let deps = TransitiveDependencies {
            levels: vec![vec!["b".into()], vec![], vec!["a".into(), "c".into()]],
        };
        let json = serde_json::to_value(TransitiveAnalysis::from(deps)).unwrap();
        assert_eq!(json["depth_1"], 1);
        assert_eq!(json["depth_2"], 0);
        assert_eq!(json["depth_3"], 2);
        assert_eq!(json["total_transitive"], 3);
    }

    #[test]
    fn test_deep_transitive_analysis_keeps_depth_order() {
        let deps = TransitiveDependencies {
            levels: vec![Vec::new(); 12],
        };
        let analysis = TransitiveAnalysis::from(deps);
        let keys: Vec<_> = analysis.depth_counts.keys().copied().collect();
        assert_eq!(keys, (1..=12).collect::<Vec<_>>());

        let json = serde_json::to_string(&analysis).unwrap();
        let position = |key: &str| json.find(&format!("\"{key}\"")).unwrap();
        assert!(position("depth_2") < position("depth_10"));
        assert!(position("depth_9") < position("depth_10"));
        assert!(position("depth_12") < position("total_transitive"));
    }
}
