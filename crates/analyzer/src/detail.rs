//! Detail extraction from a single isolated form.
//!
//! The grammar is only trusted on one self-contained form at a time, so callers
//! slice the form out with the boundary scanner before handing it over here.

use crate::error::DetailError;
use crate::grammar::{first_form, node_text, value_children, ClojureGrammar};
use tree_sitter::Node;

/// Docstring and parameter vector of a `defn`-shaped form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDetail {
    pub docstring: Option<String>,
    pub params: Option<String>,
}

/// Docstring and dependency entries of an `ns` form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceDetail {
    pub docstring: Option<String>,
    pub requires: Vec<String>,
    pub imports: Vec<String>,
}

/// `(head name "doc"? attr-map? [params] ...)`
pub fn definition_detail(
    grammar: &ClojureGrammar,
    form_text: &str,
) -> Result<FormDetail, DetailError> {
    let tree = grammar.parse(form_text)?;
    let list = first_form(&tree, "list_lit").ok_or(DetailError::NoStructuredMatch("list"))?;
    let children = value_children(list);

    let mut rest = match children.as_slice() {
        [head, name, rest @ ..] if head.kind() == "sym_lit" && name.kind() == "sym_lit" => {
            rest.iter()
        }
        _ => return Err(DetailError::NoStructuredMatch("definition")),
    }
    .peekable();

    let mut detail = FormDetail::default();
    if let Some(doc) = rest.next_if(|node| node.kind() == "str_lit") {
        detail.docstring = Some(unquote(node_text(form_text, *doc)));
    }
    detail.params = rest
        .find(|node| node.kind() == "vec_lit")
        .map(|node| node_text(form_text, *node).to_string());

    Ok(detail)
}

/// `(ns name "doc"? (:require ...) (:import ...))`
pub fn namespace_detail(
    grammar: &ClojureGrammar,
    form_text: &str,
) -> Result<NamespaceDetail, DetailError> {
    let tree = grammar.parse(form_text)?;
    let list = first_form(&tree, "list_lit").ok_or(DetailError::NoStructuredMatch("ns"))?;

    let mut detail = NamespaceDetail {
        docstring: value_children(list)
            .into_iter()
            .skip(2)
            .find(|node| node.kind() == "str_lit")
            .map(|node| unquote(node_text(form_text, node))),
        ..Default::default()
    };
    collect_dependencies(form_text, list, &mut detail);
    Ok(detail)
}

fn collect_dependencies(content: &str, node: Node<'_>, detail: &mut NamespaceDetail) {
    if node.kind() == "list_lit" {
        let children = value_children(node);
        if let Some((first, entries)) = children.split_first() {
            if first.kind() == "kwd_lit" {
                match node_text(content, *first) {
                    ":require" => detail.requires.extend(
                        entries
                            .iter()
                            .filter(|n| matches!(n.kind(), "vec_lit" | "sym_lit"))
                            .map(|n| node_text(content, *n).trim().to_string()),
                    ),
                    ":import" => detail.imports.extend(
                        entries
                            .iter()
                            .filter(|n| matches!(n.kind(), "vec_lit" | "list_lit" | "sym_lit"))
                            .map(|n| node_text(content, *n).trim().to_string()),
                    ),
                    _ => {}
                }
            }
        }
    }

    for child in value_children(node) {
        if matches!(child.kind(), "list_lit" | "vec_lit") {
            collect_dependencies(content, child, detail);
        }
    }
}

fn unquote(literal: &str) -> String {
    literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grammar() -> ClojureGrammar {
        ClojureGrammar::new().unwrap()
    }

    #[test]
    fn test_definition_with_docstring_and_params() {
        let detail =
            definition_detail(&grammar(), "(defn greet \"Says hi.\" [name] (str \"hi \" name))")
                .unwrap();
        assert_eq!(detail.docstring.as_deref(), Some("Says hi."));
        assert_eq!(detail.params.as_deref(), Some("[name]"));
    }

    #[test]
    fn test_definition_with_attr_map() {
        let detail =
            definition_detail(&grammar(), "(defn f {:added \"1.0\"} [a b] (+ a b))").unwrap();
        assert_eq!(detail.docstring, None);
        assert_eq!(detail.params.as_deref(), Some("[a b]"));
    }

    #[test]
    fn test_multi_arity_has_no_params() {
        let detail = definition_detail(&grammar(), "(defn f ([x] x) ([x y] y))").unwrap();
        assert_eq!(detail, FormDetail::default());
    }

    #[test]
    fn test_not_a_definition() {
        let err = definition_detail(&grammar(), "[1 2 3]").unwrap_err();
        assert_eq!(err, DetailError::NoStructuredMatch("list"));
    }

    #[test]
    fn test_namespace_dependencies() {
        let text = r#"(ns app.core
  "Entry point."
  (:require [clojure.string :as str]
            [app.db :refer [query]]
            clojure.set)
  (:import [java.util Date UUID]
           (java.io File)))"#;
        let detail = namespace_detail(&grammar(), text).unwrap();
        assert_eq!(detail.docstring.as_deref(), Some("Entry point."));
        assert_eq!(
            detail.requires,
            vec![
                "[clojure.string :as str]",
                "[app.db :refer [query]]",
                "clojure.set"
            ]
        );
        assert_eq!(detail.imports, vec!["[java.util Date UUID]", "(java.io File)"]);
    }
}
