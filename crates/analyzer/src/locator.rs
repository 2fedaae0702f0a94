//! Table-driven keyword matching.
//!
//! A rule matches an opening parenthesis, optional whitespace, a literal
//! keyword and (optionally) a name token. Every match is delimited with the
//! boundary scanner starting at the parenthesis.

use crate::boundary::{scan_form, Span};
use crate::error::{AnalyzerError, Result};
use regex::Regex;

/// Shape of the token captured after the keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameToken {
    /// No name is captured
    None,
    /// Symbol characters (`[\w*+!?<>=-]+`), e.g. `save!` or `valid?`
    Symbol,
    /// Word characters, dots and dashes (`[\w.-]+`)
    Qualified,
}

impl NameToken {
    const fn pattern(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Symbol => Some(r"[\w*+!?<>=-]+"),
            Self::Qualified => Some(r"[\w.-]+"),
        }
    }
}

/// One `(keyword, label)` entry of a classifier table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRule {
    pub keyword: &'static str,
    pub label: &'static str,
    pub name: NameToken,
    /// Name reported for rules that never capture one (e.g. `reify`)
    pub fixed_name: Option<&'static str>,
    /// Whether at least one whitespace character must follow the keyword
    pub requires_space: bool,
}

impl KeywordRule {
    pub const fn new(keyword: &'static str, label: &'static str) -> Self {
        Self {
            keyword,
            label,
            name: NameToken::None,
            fixed_name: None,
            requires_space: true,
        }
    }

    #[must_use]
    pub const fn with_name(mut self, name: NameToken) -> Self {
        self.name = name;
        self
    }

    #[must_use]
    pub const fn with_fixed_name(mut self, name: &'static str) -> Self {
        self.fixed_name = Some(name);
        self
    }

    /// Accept the keyword with no whitespace after it
    #[must_use]
    pub const fn space_optional(mut self) -> Self {
        self.requires_space = false;
        self
    }

    fn pattern(&self) -> String {
        let space = if self.requires_space { r"\s+" } else { r"\s*" };
        let keyword = regex::escape(self.keyword);
        match self.name.pattern() {
            Some(name) => format!(r"\(\s*({keyword}){space}({name})"),
            None => format!(r"\(\s*({keyword}){space}"),
        }
    }
}

/// Filter applied to a match before its boundary is scanned
#[derive(Debug, Clone)]
pub enum NameFilter {
    Exact(String),
    /// Regex anchored at the start of the name
    Pattern(Regex),
}

impl NameFilter {
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(&format!("^(?:{pattern})"))
            .map(Self::Pattern)
            .map_err(|e| AnalyzerError::invalid_pattern(format!("{pattern}: {e}")))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == name,
            Self::Pattern(regex) => regex.is_match(name),
        }
    }
}

/// A located keyword form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub keyword: &'static str,
    pub label: &'static str,
    pub name: Option<String>,
    pub span: Span,
}

/// A compiled set of keyword rules
#[derive(Debug, Clone)]
pub struct KeywordTable {
    rules: Vec<(KeywordRule, Regex)>,
}

impl KeywordTable {
    pub fn new(rules: &[KeywordRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern())
                    .map(|regex| (*rule, regex))
                    .map_err(|e| AnalyzerError::invalid_pattern(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Locate every rule match in document order.
    ///
    /// The filter tests the captured name for named rules and the rule label
    /// for unnamed ones. Rules with a fixed name bypass the filter.
    pub fn locate(&self, text: &str, filter: Option<&NameFilter>) -> Vec<KeywordMatch> {
        let mut found: Vec<(usize, KeywordMatch)> = Vec::new();

        for (order, (rule, regex)) in self.rules.iter().enumerate() {
            for captures in regex.captures_iter(text) {
                let Some(whole) = captures.get(0) else {
                    continue;
                };
                let name = captures.get(2).map(|m| m.as_str().to_string());

                let passes = match (filter, &name, rule.fixed_name) {
                    (None, _, _) | (Some(_), None, Some(_)) => true,
                    (Some(filter), Some(name), _) => filter.matches(name),
                    (Some(filter), None, None) => filter.matches(rule.label),
                };
                if !passes {
                    continue;
                }

                let Some(span) = scan_form(text, whole.start()) else {
                    continue;
                };
                found.push((
                    order,
                    KeywordMatch {
                        keyword: rule.keyword,
                        label: rule.label,
                        name: name.or_else(|| rule.fixed_name.map(str::to_string)),
                        span,
                    },
                ));
            }
        }

        found.sort_by_key(|(order, m)| (m.span.start, *order));
        found.into_iter().map(|(_, m)| m).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> KeywordTable {
        KeywordTable::new(&[
            KeywordRule::new("defn", "defn").with_name(NameToken::Symbol),
            KeywordRule::new("defn-", "defn-").with_name(NameToken::Symbol),
            KeywordRule::new("reify", "reify").with_fixed_name("anonymous"),
        ])
        .unwrap()
    }

    #[test]
    fn test_matches_in_document_order() {
        let text = "(defn- b [] 1)\n(defn a [] (reify P))";
        let found = table().locate(text, None);
        let names: Vec<_> = found.iter().map(|m| m.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["b", "a", "anonymous"]);
        assert_eq!(found[0].keyword, "defn-");
        assert_eq!(found[1].span, Span::new(15, 36));
    }

    #[test]
    fn test_whitespace_inside_open_paren() {
        let found = table().locate("( defn   spaced [x] x)", None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("spaced"));
    }

    #[test]
    fn test_name_filter_is_anchored() {
        let text = "(defn tool-a [] 1) (defn my-tool [] 2)";
        let filter = NameFilter::pattern("tool-.*").unwrap();
        let found = table().locate(text, Some(&filter));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("tool-a"));
    }

    #[test]
    fn test_exact_filter_skips_fixed_name_rules() {
        let text = "(defn a [] 1) (defn b [] (reify P))";
        let found = table().locate(text, Some(&NameFilter::exact("b")));
        let names: Vec<_> = found.iter().filter_map(|m| m.name.as_deref()).collect();
        assert_eq!(names, vec!["b", "anonymous"]);
    }

    #[test]
    fn test_unnamed_rules_filter_on_label() {
        let table = KeywordTable::new(&[
            KeywordRule::new("go", "go_block"),
            KeywordRule::new("chan", "channel_creation").space_optional(),
        ])
        .unwrap();
        let text = "(go (chan))";
        assert_eq!(table.locate(text, None).len(), 2);
        let filter = NameFilter::pattern("channel").unwrap();
        let found = table.locate(text, Some(&filter));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "channel_creation");
        assert_eq!(found[0].span, Span::new(4, 10));
    }

    #[test]
    fn test_invalid_filter_pattern() {
        let err = NameFilter::pattern("(unclosed").unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidPattern(_)), "got: {err:?}");
    }
}
