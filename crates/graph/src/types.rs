use cljscope_analyzer::{DefinitionRecord, DependencyKind};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

/// Function in a call graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionNode {
    pub name: String,
    pub definition: DefinitionRecord,
    /// Callees in first-occurrence order, external ones included
    pub calls_made: Vec<String>,
    /// Registered functions calling this one
    pub called_by: Vec<String>,
    pub complexity_score: usize,
}

impl FunctionNode {
    pub fn new(definition: DefinitionRecord) -> Self {
        Self {
            name: definition.name.clone(),
            definition,
            calls_made: Vec::new(),
            called_by: Vec::new(),
            complexity_score: 0,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls_made.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    /// Callee is defined in the same source
    Direct,
    /// Library, builtin or otherwise unknown callee
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
    pub call_type: CallType,
    /// Line where the caller is defined
    pub line: usize,
}

/// Call relationships between the functions of one source.
///
/// `graph` only holds registered functions; calls to external names live in
/// `calls` alone.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    pub graph: DiGraph<FunctionNode, ()>,

    /// Function name -> NodeIndex mapping
    pub function_index: HashMap<String, NodeIndex>,

    /// Every call edge, grouped by caller in definition order
    pub calls: Vec<CallEdge>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function; a later definition with the same name replaces the earlier one
    pub fn add_function(&mut self, node: FunctionNode) -> NodeIndex {
        if let Some(&idx) = self.function_index.get(&node.name) {
            log::warn!(
                "Function `{}` redefined at line {}",
                node.name,
                node.definition.start_line
            );
            self.graph[idx] = node;
            return idx;
        }

        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.function_index.insert(name, idx);
        idx
    }

    pub fn find_function(&self, name: &str) -> Option<NodeIndex> {
        self.function_index.get(name).copied()
    }

    pub fn get_function(&self, name: &str) -> Option<&FunctionNode> {
        self.find_function(name).map(|idx| &self.graph[idx])
    }

    /// Functions in definition order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn function_names(&self) -> Vec<String> {
        self.functions().map(|f| f.name.clone()).collect()
    }

    pub fn function_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Edges to external callees included
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }
}

/// Namespace in a dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceNode {
    pub name: String,
    pub definition: DefinitionRecord,
    pub requires: Vec<String>,
    pub imports: Vec<String>,
    /// Requires followed by imports
    pub all_dependencies: Vec<String>,
    pub dependency_count: usize,
    /// Registered namespaces depending on this one
    pub dependents: Vec<String>,
}

impl NamespaceNode {
    pub fn new(definition: DefinitionRecord, requires: Vec<String>, imports: Vec<String>) -> Self {
        let all_dependencies: Vec<String> = requires.iter().chain(&imports).cloned().collect();
        Self {
            name: definition.name.clone(),
            definition,
            dependency_count: all_dependencies.len(),
            requires,
            imports,
            all_dependencies,
            dependents: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    /// Line of the depending namespace declaration
    pub namespace_line: usize,
}

/// Declared dependencies between the namespaces of one source.
///
/// `graph` only links namespaces declared in the source; `dependencies` keeps
/// every declared entry.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub graph: DiGraph<NamespaceNode, DependencyKind>,

    /// Namespace name -> NodeIndex mapping
    pub namespace_index: HashMap<String, NodeIndex>,

    pub dependencies: Vec<DependencyEdge>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace; a repeated declaration replaces the earlier one
    pub fn add_namespace(&mut self, node: NamespaceNode) -> NodeIndex {
        if let Some(&idx) = self.namespace_index.get(&node.name) {
            log::warn!(
                "Namespace `{}` declared again at line {}",
                node.name,
                node.definition.start_line
            );
            self.graph[idx] = node;
            return idx;
        }

        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.namespace_index.insert(name, idx);
        idx
    }

    pub fn find_namespace(&self, name: &str) -> Option<NodeIndex> {
        self.namespace_index.get(name).copied()
    }

    pub fn get_namespace(&self, name: &str) -> Option<&NamespaceNode> {
        self.find_namespace(name).map(|idx| &self.graph[idx])
    }

    /// Namespaces in declaration order
    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn namespace_names(&self) -> Vec<String> {
        self.namespaces().map(|ns| ns.name.clone()).collect()
    }

    pub fn namespace_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }
}
