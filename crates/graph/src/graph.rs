use crate::types::{CallGraph, DependencyGraph};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashSet;

/// Recursive functions of a call graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recursion {
    /// Functions calling themselves directly
    pub self_recursive: Vec<String>,
    /// Groups of functions calling each other in a cycle
    pub mutually_recursive: Vec<Vec<String>>,
}

impl CallGraph {
    pub fn in_degree(&self, name: &str) -> usize {
        self.get_function(name).map_or(0, |f| f.called_by.len())
    }

    pub fn out_degree(&self, name: &str) -> usize {
        self.get_function(name).map_or(0, |f| f.calls_made.len())
    }

    /// Other callers of the registered functions this one calls
    pub fn indirect_relationships(&self, name: &str) -> Vec<String> {
        let Some(function) = self.get_function(name) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        function
            .calls_made
            .iter()
            .filter_map(|callee| self.get_function(callee))
            .flat_map(|callee| callee.called_by.iter())
            .filter(|caller| caller.as_str() != name && seen.insert(caller.as_str()))
            .cloned()
            .collect()
    }

    pub fn recursion(&self) -> Recursion {
        let self_recursive = self
            .functions()
            .filter(|f| f.calls_made.iter().any(|c| *c == f.name))
            .map(|f| f.name.clone())
            .collect();

        Recursion {
            self_recursive,
            mutually_recursive: cycles(&self.graph, |f| f.name.clone()),
        }
    }
}

/// Namespaces reachable from a root, bucketed by hop count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitiveDependencies {
    /// `levels[k]` holds the dependencies found `k + 1` hops away
    pub levels: Vec<Vec<String>>,
}

impl TransitiveDependencies {
    pub fn at_depth(&self, depth: usize) -> &[String] {
        depth
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .map_or(&[][..], Vec::as_slice)
    }

    pub fn total(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Unique names found up to and including `depth`
    pub fn cumulative(&self, depth: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        self.levels
            .iter()
            .take(depth)
            .flatten()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }
}

impl DependencyGraph {
    /// Breadth-first expansion from `root` up to `max_depth` hops.
    ///
    /// Level one is the declared dependency list as written. Each namespace is
    /// expanded at most once; the root itself is not marked, so a cycle back to
    /// it shows up at the depth where it closes.
    pub fn transitive_dependencies(&self, root: &str, max_depth: usize) -> TransitiveDependencies {
        let mut levels: Vec<Vec<String>> = Vec::with_capacity(max_depth);
        let Some(root_node) = self.get_namespace(root) else {
            return TransitiveDependencies { levels };
        };
        if max_depth == 0 {
            return TransitiveDependencies { levels };
        }

        levels.push(root_node.all_dependencies.clone());
        let mut visited: HashSet<String> = HashSet::new();

        for _ in 1..max_depth {
            let mut next: Vec<String> = Vec::new();
            let frontier = levels.last().map_or(&[][..], Vec::as_slice);
            for name in frontier {
                if !visited.insert(name.clone()) {
                    continue;
                }
                let Some(node) = self.get_namespace(name) else {
                    continue;
                };
                for dep in &node.all_dependencies {
                    if !next.contains(dep) {
                        next.push(dep.clone());
                    }
                }
            }
            levels.push(next);
        }

        TransitiveDependencies { levels }
    }

    /// Groups of declared namespaces depending on each other in a cycle
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut found = cycles(&self.graph, |ns| ns.name.clone());
        for idx in self.graph.node_indices() {
            if self.graph.contains_edge(idx, idx) {
                found.push(vec![self.graph[idx].name.clone()]);
            }
        }
        found
    }
}

/// Strongly connected components with more than one node, in document order
fn cycles<N, E>(graph: &DiGraph<N, E>, name: impl Fn(&N) -> String) -> Vec<Vec<String>> {
    let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|mut component| {
            component.sort();
            component
        })
        .collect();
    components.sort();

    components
        .into_iter()
        .map(|component| component.into_iter().map(|idx| name(&graph[idx])).collect())
        .collect()
}
