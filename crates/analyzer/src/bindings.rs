//! Destructuring analysis of binding and parameter vectors.

use crate::boundary::scan_form;
use crate::source::SourceText;
use crate::classify::round_to;
use crate::types::{
    BindingContext, BindingOccurrence, BindingPattern, BindingShape, DestructuringKind,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::Range;

static BINDING_CONTEXTS: Lazy<Vec<(Regex, BindingContext)>> = Lazy::new(|| {
    [
        (r"\(\s*defn-?\s+[\w*+!?<>=-]+\s+", BindingContext::FunctionParams),
        (r"\(\s*let\s+", BindingContext::LetBindings),
        (r"\(\s*for\s+", BindingContext::ForBindings),
        (r"\(\s*doseq\s+", BindingContext::DoseqBindings),
    ]
    .into_iter()
    .map(|(pattern, context)| {
        (
            Regex::new(pattern).expect("valid binding context regex"),
            context,
        )
    })
    .collect()
});

static MAP_PATTERNS: Lazy<Vec<(Regex, BindingShape)>> = Lazy::new(|| {
    [
        ("keys", BindingShape::MapKeys),
        ("strs", BindingShape::MapStrs),
        ("syms", BindingShape::MapSyms),
    ]
    .into_iter()
    .map(|(marker, shape)| {
        let pattern = format!(r"\{{[^}}]*:{marker}\s+\[([^\]]+)\][^}}]*\}}");
        (
            Regex::new(&pattern).expect("valid map destructuring regex"),
            shape,
        )
    })
    .collect()
});

static SEQUENTIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid sequential destructuring regex"));

/// Classify the destructuring inside a binding vector's content
/// (the text between its outer brackets).
pub fn analyze_bindings(binding_text: &str) -> Vec<BindingPattern> {
    let mut found: Vec<(usize, BindingPattern)> = Vec::new();
    let mut key_vectors: Vec<Range<usize>> = Vec::new();

    for (regex, shape) in MAP_PATTERNS.iter() {
        for captures in regex.captures_iter(binding_text) {
            let (Some(whole), Some(keys)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            key_vectors.push(keys.range());

            let map_text = scan_form(binding_text, whole.start())
                .map_or(whole.as_str(), |span| &binding_text[span.start..span.end]);
            let mut pattern = BindingPattern::new(*shape, split_tokens(keys.as_str()));
            pattern.has_alias = map_text.split_whitespace().any(|t| t == ":as");
            found.push((whole.start(), pattern));
        }
    }

    for captures in SEQUENTIAL.captures_iter(binding_text) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if key_vectors.contains(&inner.range()) {
            continue;
        }
        let content = inner.as_str();
        if [":keys", ":strs", ":syms"].iter().any(|m| content.contains(m)) {
            continue;
        }

        let elements = split_tokens(content);
        let vars: Vec<String> = elements
            .iter()
            .filter(|e| *e != "&" && *e != ":as")
            .cloned()
            .collect();
        let mut pattern = BindingPattern::new(BindingShape::Sequential, vars);
        pattern.has_rest = elements.iter().any(|e| e == "&");
        pattern.has_alias = elements.iter().any(|e| e == ":as");
        found.push((whole.start(), pattern));
    }

    let nested = binding_text.contains('{') && binding_text.contains('[');
    found.sort_by_key(|(start, _)| *start);
    found
        .into_iter()
        .map(|(_, mut pattern)| {
            if nested {
                pattern.nested = true;
                pattern.complexity += 1;
            }
            pattern
        })
        .collect()
}

/// Destructuring in every `defn`/`defn-` parameter vector and `let`/`for`/`doseq` binding
pub fn locate_bindings(source: &SourceText<'_>) -> Vec<BindingOccurrence> {
    let text = source.as_str();
    let mut found = Vec::new();

    for (regex, context) in BINDING_CONTEXTS.iter() {
        for m in regex.find_iter(text) {
            let open = m.end();
            if text.as_bytes().get(open) != Some(&b'[') {
                continue;
            }
            let Some(span) = scan_form(text, open) else {
                continue;
            };
            if span.truncated {
                log::debug!("Skipping unbalanced binding vector at byte {open}");
                continue;
            }

            let content = &text[span.start + 1..span.end - 1];
            let start_line = source.line_of(open);
            found.extend(
                analyze_bindings(content)
                    .into_iter()
                    .map(|pattern| BindingOccurrence {
                        pattern,
                        context: *context,
                        span,
                        start_line,
                        full_binding: content.to_string(),
                    }),
            );
        }
    }

    found.sort_by_key(|occ| (occ.span.start, occ.context));
    found
}

static LEADING_DEFN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(\s*defn-?\s+[\w*+!?<>=-]+\s+").expect("valid leading defn regex")
});

/// Parameter vector directly following the name of a `defn` form.
///
/// Text-scan fallback for when the isolated re-parse yields nothing.
pub fn leading_params(form_text: &str) -> Option<&str> {
    let open = LEADING_DEFN.find(form_text)?.end();
    let span = scan_form(form_text, open)?;
    if span.truncated || form_text.as_bytes()[open] != b'[' {
        return None;
    }
    Some(&form_text[span.start..span.end])
}

/// Destructuring found in a `[...]` parameter vector, brackets included
pub fn parameter_bindings(params: &str) -> Vec<BindingPattern> {
    let inner = params
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(params);
    analyze_bindings(inner)
}

/// Aggregate destructuring complexity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestructuringSummary {
    pub total_patterns: usize,
    pub map_destructuring: usize,
    pub vector_destructuring: usize,
    pub nested_patterns: usize,
    pub average_complexity: f64,
    pub max_complexity: usize,
    pub contexts: Vec<BindingContext>,
}

impl DestructuringSummary {
    pub fn from_occurrences(occurrences: &[BindingOccurrence]) -> Self {
        let count_kind = |kind: DestructuringKind| {
            occurrences
                .iter()
                .filter(|o| o.pattern.kind == kind)
                .count()
        };
        let total_complexity: usize = occurrences.iter().map(|o| o.pattern.complexity).sum();

        Self {
            total_patterns: occurrences.len(),
            map_destructuring: count_kind(DestructuringKind::Map),
            vector_destructuring: count_kind(DestructuringKind::Vector),
            nested_patterns: occurrences.iter().filter(|o| o.pattern.nested).count(),
            average_complexity: round_to(
                total_complexity as f64 / occurrences.len().max(1) as f64,
                2,
            ),
            max_complexity: occurrences
                .iter()
                .map(|o| o.pattern.complexity)
                .max()
                .unwrap_or(0),
            contexts: occurrences
                .iter()
                .map(|o| o.context)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

fn split_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DestructuringKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_keys_reported_once() {
        let patterns = analyze_bindings("{:keys [a b]}");
        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.shape, BindingShape::MapKeys);
        assert_eq!(pattern.extracted_vars, vec!["a", "b"]);
        assert!(pattern.nested);
        assert_eq!(pattern.complexity, 3);
    }

    #[test]
    fn test_map_alias_and_defaults() {
        let patterns = analyze_bindings("{:strs [host port] :or {port 80} :as conf}");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].shape, BindingShape::MapStrs);
        assert_eq!(patterns[0].extracted_vars, vec!["host", "port"]);
        assert!(patterns[0].has_alias);
    }

    #[test]
    fn test_sequential_rest_and_alias() {
        let patterns = analyze_bindings("[head & tail :as all] coll");
        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.kind, DestructuringKind::Vector);
        assert_eq!(pattern.extracted_vars, vec!["head", "tail", "all"]);
        assert!(pattern.has_rest);
        assert!(pattern.has_alias);
        assert!(!pattern.nested);
        assert_eq!(pattern.complexity, 3);
    }

    #[test]
    fn test_plain_bindings_have_no_patterns() {
        assert!(analyze_bindings("x 1 y (inc x)").is_empty());
        assert!(analyze_bindings("").is_empty());
    }

    #[test]
    fn test_locate_in_contexts() {
        let code = "(defn f [{:keys [a b]}] (+ a b))\n(let [[x y] pair] x)\n(doseq [{:syms [s]} items] s)";
        let source = SourceText::new(code);
        let found = locate_bindings(&source);
        let contexts: Vec<_> = found.iter().map(|o| o.context).collect();
        assert_eq!(
            contexts,
            vec![
                BindingContext::FunctionParams,
                BindingContext::LetBindings,
                BindingContext::DoseqBindings
            ]
        );
        assert_eq!(found[1].start_line, 2);
        assert_eq!(found[1].full_binding, "[x y] pair");
        assert_eq!(found[2].pattern.shape, BindingShape::MapSyms);
    }

    #[test]
    fn test_docstring_before_params_is_skipped() {
        let source = SourceText::new("(defn f \"doc\" [[a b]] a)");
        assert!(locate_bindings(&source).is_empty());
    }

    #[test]
    fn test_unbalanced_binding_is_skipped() {
        let source = SourceText::new("(let [[a b] pair");
        assert!(locate_bindings(&source).is_empty());
    }

    #[test]
    fn test_leading_params() {
        assert_eq!(leading_params("(defn f [a & more] a)"), Some("[a & more]"));
        assert_eq!(leading_params("(defn f \"doc\" [a] a)"), None);
        assert_eq!(leading_params("(defn f ([a] a))"), None);
    }

    #[test]
    fn test_summary() {
        let code = "(defn f [{:keys [a b]}] a)\n(let [[x & xs] v] x)";
        let summary = DestructuringSummary::from_occurrences(&locate_bindings(&SourceText::new(code)));
        assert_eq!(summary.total_patterns, 2);
        assert_eq!(summary.map_destructuring, 1);
        assert_eq!(summary.vector_destructuring, 1);
        assert_eq!(summary.nested_patterns, 1);
        // {:keys [a b]} is 2 + 1 for nesting, [x & xs] is 2
        assert_eq!(summary.average_complexity, 2.5);
        assert_eq!(summary.max_complexity, 3);
        assert_eq!(
            summary.contexts,
            vec![BindingContext::FunctionParams, BindingContext::LetBindings]
        );
    }

    #[test]
    fn test_empty_summary() {
        let summary = DestructuringSummary::from_occurrences(&[]);
        assert_eq!(summary.total_patterns, 0);
        assert_eq!(summary.average_complexity, 0.0);
        assert_eq!(summary.max_complexity, 0);
    }

    #[test]
    fn test_parameter_bindings() {
        let patterns = parameter_bindings("[{:keys [a b]}]");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].extracted_vars, vec!["a", "b"]);
    }
}
