//! Locators for definitions: functions, namespaces, macros, protocols and types.

use crate::bindings::{leading_params, parameter_bindings};
use crate::detail::{definition_detail, namespace_detail};
use crate::grammar::ClojureGrammar;
use crate::locator::{KeywordRule, KeywordTable, NameFilter, NameToken};
use crate::source::SourceText;
use crate::types::{
    ClassifiedOccurrence, DefinitionKind, DefinitionRecord, DependencyKind, DependencyStatement,
    MethodSignature, NamespaceRecord, TypeRecord,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static FUNCTIONS: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::new(&[
        KeywordRule::new("defn", "defn").with_name(NameToken::Symbol),
        KeywordRule::new("defn-", "defn-").with_name(NameToken::Symbol),
    ])
    .expect("valid function keyword table")
});

static NAMESPACES: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::new(&[KeywordRule::new("ns", "ns").with_name(NameToken::Qualified)])
        .expect("valid namespace keyword table")
});

static MACRO_DEFINITIONS: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::new(&[KeywordRule::new("defmacro", "definition").with_name(NameToken::Symbol)])
        .expect("valid macro keyword table")
});

static THREADING: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::new(&[
        KeywordRule::new("->", "threading"),
        KeywordRule::new("->>", "threading"),
        KeywordRule::new("some->", "conditional_threading"),
        KeywordRule::new("some->>", "conditional_threading"),
        KeywordRule::new("cond->", "conditional_threading"),
        KeywordRule::new("cond->>", "conditional_threading"),
        KeywordRule::new("as->", "binding_threading"),
    ])
    .expect("valid threading keyword table")
});

static TYPES: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::new(&[
        KeywordRule::new("defprotocol", "defprotocol").with_name(NameToken::Symbol),
        KeywordRule::new("deftype", "deftype").with_name(NameToken::Symbol),
        KeywordRule::new("defrecord", "defrecord").with_name(NameToken::Symbol),
        KeywordRule::new("reify", "reify").with_fixed_name("anonymous"),
        KeywordRule::new("extend-type", "extend-type").with_name(NameToken::Qualified),
        KeywordRule::new("extend-protocol", "extend-protocol").with_name(NameToken::Symbol),
    ])
    .expect("valid protocol/type keyword table")
});

static PROTOCOL_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\(\s*([a-z][\w?!*<>=+-]*)\s+\[([^\]]*)\](?:\s+"([^"]*)")?"#)
        .expect("valid protocol method regex")
});

static TYPE_FIELDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*def(?:type|record)\s+[\w*+!?<>=-]+\s+\[([^\]]*)\]")
        .expect("valid type fields regex")
});

static TYPE_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*([a-z][\w?!*<>=+-]*)\s+\[([^\]]*)\]").expect("valid type method regex")
});

/// Binding forms whose vector would otherwise read as a method signature
const BINDING_FORMS: &[&str] = &[
    "let", "loop", "fn", "for", "doseq", "dotimes", "binding", "when-let", "if-let",
    "when-some", "if-some", "with-open",
];

/// Macro definition or threading-macro usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroCategory {
    Definition,
    Threading,
    ConditionalThreading,
    BindingThreading,
}

impl MacroCategory {
    fn from_label(label: &str) -> Self {
        match label {
            "threading" => Self::Threading,
            "conditional_threading" => Self::ConditionalThreading,
            "binding_threading" => Self::BindingThreading,
            _ => Self::Definition,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Threading => "threading",
            Self::ConditionalThreading => "conditional_threading",
            Self::BindingThreading => "binding_threading",
        }
    }
}

pub type MacroOccurrence = ClassifiedOccurrence<MacroCategory>;

/// `defn` / `defn-` definitions with docstring, params and parameter destructuring
pub fn locate_functions(
    source: &SourceText<'_>,
    grammar: &ClojureGrammar,
    filter: Option<&NameFilter>,
) -> Vec<DefinitionRecord> {
    FUNCTIONS
        .locate(source.as_str(), filter)
        .into_iter()
        .map(|m| {
            let name = m.name.unwrap_or_default();
            let mut record =
                DefinitionRecord::new(source, name, DefinitionKind::Function, m.keyword, m.span);
            enrich_definition(grammar, &mut record);
            if record.params.is_none() {
                record.params = leading_params(&record.text).map(str::to_string);
            }
            if let Some(params) = &record.params {
                record.bindings = parameter_bindings(params);
            }
            record
        })
        .collect()
}

fn enrich_definition(grammar: &ClojureGrammar, record: &mut DefinitionRecord) {
    match definition_detail(grammar, &record.text) {
        Ok(detail) => {
            record.docstring = detail.docstring;
            record.params = detail.params;
        }
        Err(e) => log::debug!(
            "No detail for {} `{}` at line {}: {}",
            record.kind.as_str(),
            record.name,
            record.start_line,
            e
        ),
    }
}

/// `ns` declarations with docstring and dependency entries
pub fn locate_namespaces(source: &SourceText<'_>, grammar: &ClojureGrammar) -> Vec<NamespaceRecord> {
    NAMESPACES
        .locate(source.as_str(), None)
        .into_iter()
        .map(|m| {
            let name = m.name.unwrap_or_default();
            let mut definition =
                DefinitionRecord::new(source, name, DefinitionKind::Namespace, m.keyword, m.span);
            let (requires, imports) = match namespace_detail(grammar, &definition.text) {
                Ok(detail) => {
                    definition.docstring = detail.docstring;
                    (detail.requires, detail.imports)
                }
                Err(e) => {
                    log::debug!("No detail for namespace `{}`: {}", definition.name, e);
                    (Vec::new(), Vec::new())
                }
            };
            NamespaceRecord {
                definition,
                requires,
                imports,
            }
        })
        .collect()
}

/// Flat list of require/import entries across all namespaces
pub fn dependency_statements(namespaces: &[NamespaceRecord]) -> Vec<DependencyStatement> {
    let mut statements = Vec::new();
    for ns in namespaces {
        let entries = ns
            .requires
            .iter()
            .map(|s| (DependencyKind::Require, s))
            .chain(ns.imports.iter().map(|s| (DependencyKind::Import, s)));
        for (kind, statement) in entries {
            statements.push(DependencyStatement {
                kind,
                statement: statement.clone(),
                dependency: crate::types::dependency_name(statement),
                namespace: ns.name().to_string(),
                source_line: ns.definition.start_line,
            });
        }
    }
    statements
}

/// `defmacro` definitions (filtered by name) plus every threading-macro usage
pub fn locate_macros(
    source: &SourceText<'_>,
    grammar: &ClojureGrammar,
    filter: Option<&NameFilter>,
) -> Vec<MacroOccurrence> {
    let mut macros: Vec<MacroOccurrence> = MACRO_DEFINITIONS
        .locate(source.as_str(), filter)
        .into_iter()
        .map(|m| {
            let mut occurrence = ClassifiedOccurrence::new(
                source,
                "defmacro",
                m.keyword,
                MacroCategory::Definition,
                m.span,
            );
            occurrence.name = m.name;
            match definition_detail(grammar, &occurrence.text) {
                Ok(detail) => {
                    occurrence.docstring = detail.docstring;
                    occurrence.params = detail.params;
                }
                Err(e) => log::debug!("No detail for macro {:?}: {}", occurrence.name, e),
            }
            occurrence
        })
        .collect();

    macros.extend(locate_threading_macros(source));
    macros.sort_by_key(|m| m.span.start);
    macros
}

/// Threading-macro usages only
pub fn locate_threading_macros(source: &SourceText<'_>) -> Vec<MacroOccurrence> {
    THREADING
        .locate(source.as_str(), None)
        .into_iter()
        .map(|m| {
            let mut occurrence = ClassifiedOccurrence::new(
                source,
                "threading_macro",
                m.keyword,
                MacroCategory::from_label(m.label),
                m.span,
            );
            occurrence.name = Some(m.keyword.to_string());
            occurrence
        })
        .collect()
}

/// Protocols, types, records, reify and extension forms
pub fn locate_protocols_and_types(
    source: &SourceText<'_>,
    grammar: &ClojureGrammar,
    filter: Option<&NameFilter>,
) -> Vec<TypeRecord> {
    TYPES
        .locate(source.as_str(), filter)
        .into_iter()
        .map(|m| {
            let kind = match m.keyword {
                "defprotocol" => DefinitionKind::Protocol,
                "deftype" => DefinitionKind::Type,
                "defrecord" => DefinitionKind::Record,
                "reify" => DefinitionKind::Reify,
                "extend-type" => DefinitionKind::ExtendType,
                _ => DefinitionKind::ExtendProtocol,
            };
            let name = m.name.unwrap_or_default();
            let mut definition = DefinitionRecord::new(source, name, kind, m.keyword, m.span);

            let (fields, methods) = match kind {
                DefinitionKind::Protocol => {
                    if let Ok(detail) = definition_detail(grammar, &definition.text) {
                        definition.docstring = detail.docstring;
                    }
                    (Vec::new(), protocol_methods(&definition.text))
                }
                DefinitionKind::Type | DefinitionKind::Record => {
                    type_fields_and_methods(&definition.text)
                }
                _ => (Vec::new(), implemented_methods(&definition.text, &[])),
            };

            TypeRecord {
                definition,
                methods,
                fields,
            }
        })
        .collect()
}

fn protocol_methods(text: &str) -> Vec<MethodSignature> {
    PROTOCOL_METHOD
        .captures_iter(text)
        .filter_map(|captures| {
            Some(MethodSignature {
                name: captures.get(1)?.as_str().to_string(),
                params: captures.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                docstring: captures.get(3).map(|m| m.as_str().to_string()),
            })
        })
        .collect()
}

fn type_fields_and_methods(text: &str) -> (Vec<String>, Vec<MethodSignature>) {
    let fields: Vec<String> = TYPE_FIELDS
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let methods = implemented_methods(text, &fields);
    (fields, methods)
}

fn implemented_methods(text: &str, fields: &[String]) -> Vec<MethodSignature> {
    TYPE_METHOD
        .captures_iter(text)
        .filter_map(|captures| {
            let name = captures.get(1)?.as_str();
            if BINDING_FORMS.contains(&name) || fields.iter().any(|f| f == name) {
                return None;
            }
            Some(MethodSignature {
                name: name.to_string(),
                params: captures.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                docstring: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BindingShape, Visibility};
    use pretty_assertions::assert_eq;

    fn grammar() -> ClojureGrammar {
        ClojureGrammar::new().unwrap()
    }

    #[test]
    fn test_function_with_destructured_params() {
        let source = SourceText::new("(defn f [{:keys [a b]}] (+ a b))");
        let functions = locate_functions(&source, &grammar(), None);
        assert_eq!(functions.len(), 1);
        let f = &functions[0];
        assert_eq!(f.name, "f");
        assert_eq!(f.visibility, Visibility::Public);
        assert_eq!(f.params.as_deref(), Some("[{:keys [a b]}]"));
        assert_eq!(f.bindings.len(), 1);
        assert_eq!(f.bindings[0].shape, BindingShape::MapKeys);
        assert_eq!(f.bindings[0].extracted_vars, vec!["a", "b"]);
    }

    #[test]
    fn test_adjacent_functions_keep_their_own_detail() {
        let code = "(defn a \"first\" [x] x)(defn- b [y] y)";
        let functions = locate_functions(&SourceText::new(code), &grammar(), None);
        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].docstring.as_deref(), Some("first"));
        assert_eq!(functions[0].text, "(defn a \"first\" [x] x)");
        assert!(functions[1].is_private());
        assert_eq!(functions[1].docstring, None);
        assert_eq!(functions[1].params.as_deref(), Some("[y]"));
    }

    #[test]
    fn test_namespaces_and_dependency_statements() {
        let code = "(ns app.core\n  (:require [clojure.string :as str])\n  (:import [java.util Date]))\n\n(ns app.util)";
        let source = SourceText::new(code);
        let namespaces = locate_namespaces(&source, &grammar());
        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[0].required_names(), vec!["clojure.string"]);
        assert_eq!(namespaces[0].imported_names(), vec!["java.util"]);
        assert_eq!(namespaces[1].definition.start_line, 5);

        let statements = dependency_statements(&namespaces);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].kind, DependencyKind::Import);
        assert_eq!(statements[1].dependency.as_deref(), Some("java.util"));
        assert_eq!(statements[1].namespace, "app.core");
    }

    #[test]
    fn test_macros_and_threading() {
        let code = "(defmacro unless \"Inverted when.\" [test & body] `(when (not ~test) ~@body))\n(defn g [m] (-> m :a (some-> inc)))";
        let source = SourceText::new(code);
        let macros = locate_macros(&source, &grammar(), None);
        let summary: Vec<_> = macros
            .iter()
            .map(|m| (m.category, m.name.clone().unwrap_or_default()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (MacroCategory::Definition, "unless".to_string()),
                (MacroCategory::Threading, "->".to_string()),
                (MacroCategory::ConditionalThreading, "some->".to_string()),
            ]
        );
        assert_eq!(macros[0].docstring.as_deref(), Some("Inverted when."));
        assert_eq!(locate_threading_macros(&source).len(), 2);
    }

    #[test]
    fn test_protocols_and_types() {
        let code = r#"(defprotocol Shape
  "Geometric shapes."
  (area [this] "Surface area.")
  (scale [this factor]))

(defrecord Circle [radius]
  Shape
  (area [this] (let [r radius] (* Math/PI r r)))
  (scale [this factor] (->Circle (* radius factor))))

(extend-type java.lang.String Shape (area [s] 0))"#;
        let found = locate_protocols_and_types(&SourceText::new(code), &grammar(), None);
        let kinds: Vec<_> = found.iter().map(|t| t.definition.kind).collect();
        assert_eq!(
            kinds,
            vec![DefinitionKind::Protocol, DefinitionKind::Record, DefinitionKind::ExtendType]
        );

        let protocol = &found[0];
        assert_eq!(protocol.definition.docstring.as_deref(), Some("Geometric shapes."));
        assert_eq!(protocol.methods.len(), 2);
        assert_eq!(protocol.methods[0].docstring.as_deref(), Some("Surface area."));
        assert_eq!(protocol.methods[1].params, "this factor");

        let record = &found[1];
        assert_eq!(record.fields, vec!["radius"]);
        let names: Vec<_> = record.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["area", "scale"]);

        assert_eq!(found[2].definition.name, "java.lang.String");
    }
}
