//! # cljscope Graph
//!
//! Call graphs and namespace dependency graphs over Clojure source.
//!
//! ## Features
//!
//! - **Call graph** - which functions call which, external callees included
//! - **Degree metrics** - in/out degree, most connected functions, density
//! - **Recursion** - self-calls and mutually recursive groups
//! - **Namespace graph** - require/import edges, dependents, bounded transitive closure
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     │
//!     ├──> Analyzer (defn / ns locators)
//!     │
//!     ├──> Graph Builder
//!     │      ├─ Phase 1: register function / namespace names
//!     │      └─ Phase 2: resolve call sites / dependency entries
//!     │
//!     ├──> Graphs (petgraph)
//!     │      ├─ Nodes: functions, namespaces declared in the source
//!     │      └─ Edges: calls, requires, imports
//!     │
//!     └──> Reports
//!            ├─ Metrics (degrees, density, complexity)
//!            └─ Target analysis (relationships, transitive depth buckets)
//! ```

mod builder;
mod error;
mod graph;
mod report;
mod types;

pub use builder::{call_complexity, call_graph_from, dependency_graph_from, extract_calls, GraphBuilder};
pub use error::{GraphError, Result};
pub use graph::{Recursion, TransitiveDependencies};
pub use report::{
    CallAnalysis, CallGraphMetrics, CallGraphReport, DependencyAnalysis, DependencyGraphReport,
    DependencyTree, DependencyTreeMetadata, DependencyTreeNode, FunctionAnalysis,
    FunctionDefinitionInfo, FunctionDependencies, FunctionRelationships, NamespaceAnalysis,
    NamespaceDefinitionInfo, NamespaceMetrics, NamespaceRelationships, TransitiveAnalysis,
};
pub use types::{
    CallEdge, CallGraph, CallType, DependencyEdge, DependencyGraph, FunctionNode, NamespaceNode,
};
