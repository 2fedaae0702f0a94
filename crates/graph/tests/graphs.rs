use cljscope_analyzer::{Analyzer, AnalyzerConfig};
use cljscope_graph::{CallType, GraphBuilder, GraphError};
use pretty_assertions::assert_eq;

const ORDERS: &str = r#"(ns shop.orders
  "Order flow."
  (:require [shop.db :as db]
            [shop.pricing :as pricing]
            [clojure.string :as str]))

(defn- validate [order]
  (when (empty? (:items order))
    (throw (ex-info "empty" {}))))

(defn total [order]
  (pricing/sum (map :price (:items order))))

(defn place!
  "Validates, prices and stores an order."
  [order]
  (validate order)
  (let [t (total order)]
    (db/save! (assoc order :total t))))

(defn retry [order n]
  (if (pos? n)
    (or (place! order) (retry order (dec n)))
    (validate order)))
"#;

const RING: &str = "(ns ring.a (:require [ring.b]))\n\
                    (ns ring.b (:require [ring.c]))\n\
                    (ns ring.c (:require [ring.a]) (:import [java.time Instant]))";

fn builder() -> GraphBuilder {
    GraphBuilder::new().expect("grammar loads")
}

#[test]
fn called_by_mirrors_internal_edges() {
    let report = builder().trace_function_calls(ORDERS, None).unwrap();

    for edge in &report.calls {
        let callee = report.functions.iter().find(|f| f.name == edge.callee);
        match (edge.call_type, callee) {
            (CallType::Direct, Some(callee)) => assert!(
                callee.called_by.contains(&edge.caller),
                "{} missing caller {}",
                edge.callee,
                edge.caller
            ),
            (CallType::External, None) => {}
            other => panic!("inconsistent edge {edge:?}: {other:?}"),
        }
    }
    for function in &report.functions {
        for caller in &function.called_by {
            let caller = report.functions.iter().find(|f| &f.name == caller).unwrap();
            assert!(caller.calls_made.contains(&function.name));
        }
    }
}

#[test]
fn traced_call_graph() {
    let report = builder().trace_function_calls(ORDERS, None).unwrap();
    let names: Vec<_> = report.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["validate", "total", "place!", "retry"]);

    let validate = &report.functions[0];
    assert_eq!(validate.called_by, vec!["place!", "retry"]);
    assert_eq!(validate.calls_made, vec!["empty?", "throw", "ex-info"]);

    assert_eq!(report.metrics.total_functions, 4);
    assert_eq!(report.metrics.max_in_degree, 2);
    assert_eq!(report.metrics.highly_called_functions, vec!["validate"]);
    assert_eq!(report.recursion.self_recursive, vec!["retry"]);
    assert!(report.target_analysis.is_none());
}

#[test]
fn target_function_analysis() {
    let deps = builder().find_function_dependencies(ORDERS, "place!").unwrap();
    let analysis = deps.dependencies;
    assert_eq!(deps.function, "place!");
    assert_eq!(analysis.definition_info.line, 14);
    assert!(!analysis.definition_info.private);
    assert_eq!(
        analysis.definition_info.docstring.as_deref(),
        Some("Validates, prices and stores an order.")
    );
    assert_eq!(analysis.relationships.calls, vec!["validate", "total", "db/save!", "assoc"]);
    assert_eq!(analysis.relationships.called_by, vec!["retry"]);
    assert_eq!(analysis.relationships.indirect_relationships, vec!["retry"]);
    // four calls and one let
    assert_eq!(analysis.call_analysis.complexity_score, 5);
}

#[test]
fn unknown_function_lists_available_names() {
    let err = builder().trace_function_calls(ORDERS, Some("missing")).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.available(), ["validate", "total", "place!", "retry"]);
    assert!(matches!(err, GraphError::FunctionNotFound { .. }));
}

#[test]
fn namespace_only_source_has_empty_call_graph() {
    let report = builder()
        .trace_function_calls("(ns only.decl (:require [x.y]))", None)
        .unwrap();
    assert_eq!(report.metrics.total_functions, 0);
    assert_eq!(report.metrics.total_calls, 0);
    assert_eq!(report.metrics.avg_calls_per_function, 0.0);
    assert_eq!(report.metrics.average_complexity, 0.0);
    assert_eq!(report.metrics.call_density, 0.0);
}

#[test]
fn cycle_reaches_root_at_depth_three() {
    let tree = builder().namespace_dependency_tree(RING, "ring.a").unwrap();
    assert_eq!(tree.tree.dependencies, vec!["ring.b"]);

    let levels = &tree.tree.transitive_analysis.dependencies_by_depth;
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[0], vec!["ring.b"]);
    assert_eq!(levels[1], vec!["ring.c"]);
    assert_eq!(levels[2], vec!["ring.a", "java.time"]);
    assert_eq!(tree.metadata.total_dependencies, 1);
    assert_eq!(tree.metadata.transitive_count, 4);
}

#[test]
fn depth_one_equals_direct_dependencies() {
    let report = builder()
        .analyze_namespace_dependencies(ORDERS, Some("shop.orders"))
        .unwrap();
    let analysis = report.target_analysis.unwrap();
    assert_eq!(
        analysis.transitive_analysis.dependencies_by_depth[0],
        report.namespaces[0].all_dependencies
    );
    assert_eq!(analysis.transitive_analysis.depth_counts[&1], 3);
    assert_eq!(analysis.definition_info.docstring.as_deref(), Some("Order flow."));
    assert!(analysis.definition_info.declaration.ends_with("..."));
    assert!(analysis.relationships.dependents.is_empty());
}

#[test]
fn cumulative_closure_grows_with_depth() {
    let graph = builder().build_dependency_graph(RING);
    let deps = graph.transitive_dependencies("ring.b", 3);
    let sizes: Vec<_> = (1..=3).map(|k| deps.cumulative(k).len()).collect();
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]), "sizes: {sizes:?}");
}

#[test]
fn configured_depth_bounds_transitive_analysis() {
    let config = AnalyzerConfig {
        max_transitive_depth: 2,
        ..AnalyzerConfig::default()
    };
    let builder = GraphBuilder::with_analyzer(Analyzer::with_config(config).unwrap());
    let report = builder
        .analyze_namespace_dependencies(RING, Some("ring.a"))
        .unwrap();
    let analysis = report.target_analysis.unwrap();
    assert_eq!(analysis.transitive_analysis.total_transitive, 2);
    assert!(!analysis.transitive_analysis.depth_counts.contains_key(&3));
    assert_eq!(report.cycles, vec![vec!["ring.a", "ring.b", "ring.c"]]);
}

#[test]
fn unknown_namespace_lists_available_names() {
    let err = builder().namespace_dependency_tree(RING, "ring.z").unwrap_err();
    assert!(matches!(err, GraphError::NamespaceNotFound { .. }));
    assert_eq!(err.available(), ["ring.a", "ring.b", "ring.c"]);
}

#[test]
fn reports_are_repeatable() {
    let builder = builder();
    let first = serde_json::to_string(&builder.trace_function_calls(ORDERS, None).unwrap()).unwrap();
    let second = serde_json::to_string(&builder.trace_function_calls(ORDERS, None).unwrap()).unwrap();
    assert_eq!(first, second);

    let first = serde_json::to_string(&builder.analyze_namespace_dependencies(RING, None).unwrap()).unwrap();
    let second = serde_json::to_string(&builder.analyze_namespace_dependencies(RING, None).unwrap()).unwrap();
    assert_eq!(first, second);
}
