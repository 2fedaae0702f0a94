//! Cursor-position analysis.
//!
//! The cursor is first resolved to its enclosing top-level form with the
//! boundary scanner; only that form is handed to the parser, and the parse
//! tree is used for the parent/child/sibling walk inside it.

use crate::bindings::locate_bindings;
use crate::boundary::{
    enclosing_top_level, scan_back, scan_form, top_level_forms, Delimiter, Form, FormKind, Span,
};
use crate::classify::{concurrency, state};
use crate::config::AnalyzerConfig;
use crate::definitions::{locate_functions, locate_macros, locate_namespaces};
use crate::error::{AnalyzerError, Result};
use crate::grammar::{value_children, ClojureGrammar};
use crate::source::{elide, Position, SourceText};
use crate::types::DestructuringKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use tree_sitter::{Node, Tree};

/// Lists, vectors and maps; sets are not walked into
fn is_collection(node: Node<'_>) -> bool {
    matches!(
        FormKind::from_node_kind(node.kind()),
        Some(FormKind::List | FormKind::Vector | FormKind::Map)
    )
}

static DEFN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(defn-?\s+([\w*+!?<>=-]+)").expect("valid defn name regex"));
static NS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(ns\s+([\w.-]+)").expect("valid ns name regex"));
static DEFMACRO_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(defmacro\s+([\w*+!?<>=-]+)").expect("valid defmacro name regex")
});
static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\((defprotocol|deftype|defrecord)(?:\s+([\w*+!?<>=-]+))?")
        .expect("valid type name regex")
});
static CALL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^\s(]+)").expect("valid call name regex"));

/// Heads that never classify a list as a plain call
const NON_CALL_HEADS: &[&str] = &[
    "defn", "defn-", "ns", "defmacro", "defprotocol", "deftype", "defrecord", "let",
];

/// A form resolved from a cursor position or a navigation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormLocation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub span: Span,
    /// Enclosing list/vector/map forms below the top level
    pub depth: usize,
}

impl FormLocation {
    fn new(source: &SourceText<'_>, kind: &'static str, span: Span, depth: usize) -> Self {
        let start = source.position(span.start).unwrap_or_default();
        let end = source.position(span.end).unwrap_or_default();
        Self {
            kind,
            text: source.slice(span).to_string(),
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
            span,
            depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
    Up,
    Down,
    Top,
}

impl Direction {
    pub const ALL: [Direction; 5] = [Self::Next, Self::Prev, Self::Up, Self::Down, Self::Top];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Up => "up",
            Self::Down => "down",
            Self::Top => "top",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown direction: {s}"))
    }
}

/// Partner of the delimiter under the cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchingDelimiter {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub character: char,
    pub container_type: FormKind,
}

/// Cursor resolved inside its isolated top-level form
struct Cursor<'s, 'a> {
    source: &'s SourceText<'a>,
    top: Form,
    tree: Tree,
    /// Cursor offset relative to the top-level form
    relative: usize,
}

impl<'s, 'a> Cursor<'s, 'a> {
    fn open(
        source: &'s SourceText<'a>,
        grammar: &ClojureGrammar,
        line: usize,
        column: usize,
    ) -> Result<Self> {
        let not_found = || AnalyzerError::NoFormAtPosition { line, column };
        let offset = source.offset(line, column).ok_or_else(not_found)?;
        let top = enclosing_top_level(source.as_str(), offset).ok_or_else(not_found)?;
        let tree = grammar
            .parse(source.slice(top.span))
            .map_err(|e| AnalyzerError::parse(e.to_string()))?;
        Ok(Self {
            source,
            top,
            tree,
            relative: offset - top.span.start,
        })
    }

    /// The top-level collection node of the isolated parse
    fn top_node(&self) -> Option<Node<'_>> {
        value_children(self.tree.root_node()).into_iter().next()
    }

    /// Innermost list containing the cursor, else the top-level form
    fn current(&self) -> Option<Node<'_>> {
        let root = self.tree.root_node();
        let mut node = root.descendant_for_byte_range(self.relative, self.relative);
        while let Some(n) = node {
            if FormKind::from_node_kind(n.kind()) == Some(FormKind::List) {
                return Some(n);
            }
            node = n.parent();
        }
        self.top_node()
    }

    fn is_top(&self, node: Node<'_>) -> bool {
        node.parent().map_or(true, |p| p.id() == self.tree.root_node().id())
    }

    fn location(&self, node: Node<'_>) -> FormLocation {
        let base = self.top.span.start;
        let span = Span::new(base + node.start_byte(), base + node.end_byte());
        FormLocation::new(self.source, node.kind(), span, depth(node))
    }

    fn top_location(&self) -> FormLocation {
        FormLocation::new(self.source, self.top.kind.as_str(), self.top.span, 0)
    }

    fn sibling_top_form(&self, direction: Direction) -> Option<FormLocation> {
        let forms = top_level_forms(self.source.as_str());
        let idx = forms.iter().position(|f| f.span == self.top.span)?;
        let target = match direction {
            Direction::Next => forms.get(idx + 1),
            _ => idx.checked_sub(1).and_then(|prev| forms.get(prev)),
        }?;
        Some(FormLocation::new(self.source, target.kind.as_str(), target.span, 0))
    }

    fn navigate(&self, direction: Direction) -> Option<FormLocation> {
        let current = self.current()?;
        if direction == Direction::Top {
            return Some(self.top_location());
        }
        if matches!(direction, Direction::Next | Direction::Prev) && self.is_top(current) {
            return self.sibling_top_form(direction);
        }

        let target = match direction {
            Direction::Next => {
                skip_trivia(current.next_named_sibling(), |n| n.next_named_sibling())
            }
            Direction::Prev => {
                skip_trivia(current.prev_named_sibling(), |n| n.prev_named_sibling())
            }
            Direction::Up => {
                let mut parent = current.parent();
                while let Some(p) = parent {
                    if is_collection(p) {
                        break;
                    }
                    parent = p.parent();
                }
                parent
            }
            Direction::Down => value_children(current)
                .into_iter()
                .find(|child| is_collection(*child)),
            Direction::Top => None,
        }?;
        Some(self.location(target))
    }
}

fn skip_trivia<'t>(
    start: Option<Node<'t>>,
    step: impl Fn(Node<'t>) -> Option<Node<'t>>,
) -> Option<Node<'t>> {
    let mut node = start;
    while let Some(n) = node {
        if !matches!(n.kind(), "comment" | "dis_expr") {
            return Some(n);
        }
        node = step(n);
    }
    None
}

fn depth(node: Node<'_>) -> usize {
    let mut depth = 0;
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "source" {
            break;
        }
        if is_collection(n) {
            depth += 1;
        }
        current = n.parent();
    }
    depth
}

/// Innermost list form containing the cursor
pub fn form_at(
    source: &SourceText<'_>,
    grammar: &ClojureGrammar,
    line: usize,
    column: usize,
) -> Result<FormLocation> {
    let cursor = Cursor::open(source, grammar, line, column)?;
    let current = cursor
        .current()
        .ok_or(AnalyzerError::NoFormAtPosition { line, column })?;
    Ok(cursor.location(current))
}

/// Step from the form at the cursor; `Ok(None)` when there is nothing that way
pub fn navigate(
    source: &SourceText<'_>,
    grammar: &ClojureGrammar,
    line: usize,
    column: usize,
    direction: Direction,
) -> Result<Option<FormLocation>> {
    Ok(Cursor::open(source, grammar, line, column)?.navigate(direction))
}

/// Partner of the delimiter at the cursor, by boundary scanning
pub fn matching_delimiter(
    source: &SourceText<'_>,
    line: usize,
    column: usize,
) -> Option<MatchingDelimiter> {
    let text = source.as_str();
    let offset = source.offset(line, column)?;
    let byte = *text.as_bytes().get(offset)?;

    let (open, partner) = if Delimiter::from_open(byte).is_some() {
        let span = scan_form(text, offset)?;
        if span.truncated {
            return None;
        }
        (offset, span.end - 1)
    } else if Delimiter::from_close(byte).is_some() {
        let open = scan_back(text, offset)?;
        (open, open)
    } else {
        return None;
    };

    let container_type = match text.as_bytes()[open] {
        b'(' => FormKind::List,
        b'[' => FormKind::Vector,
        _ if open > 0 && text.as_bytes()[open - 1] == b'#' => FormKind::Set,
        _ => FormKind::Map,
    };
    let position = source.position(partner)?;
    Some(MatchingDelimiter {
        line: position.line,
        column: position.column,
        offset: partner,
        character: char::from(text.as_bytes()[partner]),
        container_type,
    })
}

fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// What the form at the cursor is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum FormContext {
    FunctionDefinition {
        #[serde(skip_serializing_if = "Option::is_none")]
        function_name: Option<String>,
    },
    NamespaceDefinition {
        #[serde(skip_serializing_if = "Option::is_none")]
        namespace_name: Option<String>,
    },
    MacroDefinition {
        #[serde(skip_serializing_if = "Option::is_none")]
        macro_name: Option<String>,
    },
    TypeDefinition {
        construct_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        type_name: Option<String>,
    },
    LetBinding,
    FunctionCall {
        #[serde(skip_serializing_if = "Option::is_none")]
        function_name: Option<String>,
    },
    VectorLiteral,
    MapLiteral,
    Unknown,
}

impl FormContext {
    pub fn classify(form_text: &str) -> Self {
        let text = form_text.trim();
        let capture = |regex: &Lazy<Regex>| first_capture(regex, text);

        if text.starts_with("(defn") {
            Self::FunctionDefinition {
                function_name: capture(&DEFN_NAME),
            }
        } else if text.starts_with("(ns ") {
            Self::NamespaceDefinition {
                namespace_name: capture(&NS_NAME),
            }
        } else if text.starts_with("(defmacro") {
            Self::MacroDefinition {
                macro_name: capture(&DEFMACRO_NAME),
            }
        } else if let Some(captures) = TYPE_NAME.captures(text) {
            Self::TypeDefinition {
                construct_type: captures.get(1).map_or("", |m| m.as_str()).to_string(),
                type_name: captures.get(2).map(|m| m.as_str().to_string()),
            }
        } else if text.starts_with("(let ") {
            Self::LetBinding
        } else if text.starts_with('(')
            && !NON_CALL_HEADS.iter().any(|head| text[1..].starts_with(head))
        {
            Self::FunctionCall {
                function_name: capture(&CALL_NAME),
            }
        } else if text.starts_with('[') {
            Self::VectorLiteral
        } else if text.starts_with('{') {
            Self::MapLiteral
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub private: bool,
    pub params: Option<String>,
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceInfo {
    pub name: String,
    pub docstring: Option<String>,
    pub requires: Vec<String>,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestructuringInfo {
    pub patterns: usize,
    pub complexity: usize,
    pub types: Vec<DestructuringKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsyncInfo {
    pub patterns: usize,
    pub types: Vec<String>,
    pub complexity_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateInfo {
    pub operations: usize,
    pub categories: Vec<state::StateCategory>,
    pub mutations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroInfo {
    pub count: usize,
    pub types: Vec<String>,
}

/// Summaries of the form at the cursor; absent sections found nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SemanticInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<NamespaceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructuring: Option<DestructuringInfo>,
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<AsyncInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_management: Option<StateInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macros: Option<MacroInfo>,
}

impl SemanticInfo {
    fn gather(grammar: &ClojureGrammar, context: &FormContext, form_text: &str) -> Self {
        let source = SourceText::new(form_text);
        let mut info = Self::default();

        match context {
            FormContext::FunctionDefinition { .. } => {
                info.function = locate_functions(&source, grammar, None)
                    .into_iter()
                    .next()
                    .map(|f| FunctionInfo {
                        private: f.is_private(),
                        name: f.name,
                        params: f.params,
                        docstring: f.docstring,
                    });
            }
            FormContext::NamespaceDefinition { .. } => {
                info.namespace = locate_namespaces(&source, grammar)
                    .into_iter()
                    .next()
                    .map(|ns| NamespaceInfo {
                        name: ns.definition.name,
                        docstring: ns.definition.docstring,
                        requires: ns.requires,
                        imports: ns.imports,
                    });
            }
            _ => {}
        }

        let bindings = locate_bindings(&source);
        if !bindings.is_empty() {
            let mut types = Vec::new();
            for binding in &bindings {
                if !types.contains(&binding.pattern.kind) {
                    types.push(binding.pattern.kind);
                }
            }
            info.destructuring = Some(DestructuringInfo {
                patterns: bindings.len(),
                complexity: bindings.iter().map(|b| b.pattern.complexity).sum(),
                types,
            });
        }

        let async_ops = concurrency::CLASSIFIER.classify(&source, None);
        if !async_ops.is_empty() {
            let summary = concurrency::ConcurrencySummary::from_occurrences(&async_ops);
            info.concurrency = Some(AsyncInfo {
                patterns: summary.total_patterns,
                types: summary.pattern_types,
                complexity_score: summary.complexity_score,
            });
        }

        let state_ops = state::CLASSIFIER.classify(&source, None);
        if !state_ops.is_empty() {
            info.state_management = Some(StateInfo {
                operations: state_ops.len(),
                categories: state_ops
                    .iter()
                    .map(|op| op.category)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
                mutations: state_ops.iter().filter(|op| op.is_mutation).count(),
            });
        }

        let macros = locate_macros(&source, grammar, None);
        if !macros.is_empty() {
            info.macros = Some(MacroInfo {
                count: macros.len(),
                types: macros
                    .iter()
                    .map(|m| m.pattern_type.clone())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
            });
        }

        info
    }
}

/// One navigation direction in a cursor report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl NavigationTarget {
    fn from_location(location: Option<FormLocation>, preview_chars: usize) -> Self {
        match location {
            Some(target) => Self {
                available: true,
                target_line: Some(target.start_line),
                target_type: Some(target.kind),
                preview: Some(elide(&target.text, preview_chars)),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchingParen {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<char>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub next: NavigationTarget,
    pub prev: NavigationTarget,
    pub up: NavigationTarget,
    pub down: NavigationTarget,
    pub top: NavigationTarget,
    pub matching_paren: MatchingParen,
}

/// Usage pattern spotted by substring in the form text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectedPattern {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
}

const PATTERN_MARKERS: &[(&str, &str, &[&str])] = &[
    (
        "threading_macro",
        "Uses threading macros for data transformation",
        &["->", "->>", "some->", "cond->"],
    ),
    (
        "map_destructuring",
        "Uses map destructuring for parameter binding",
        &["{:keys [", "{:strs [", "{:syms ["],
    ),
    (
        "core_async",
        "Uses core.async for concurrent programming",
        &["go ", "go-loop", "<!", ">!", "chan"],
    ),
    (
        "state_management",
        "Manages mutable state using Clojure reference types",
        &["atom", "swap!", "reset!", "ref", "dosync"],
    ),
    (
        "clojure_spec",
        "Uses clojure.spec for data validation and specification",
        &["s/def", "s/valid?", "s/conform"],
    ),
];

fn detect_patterns(text: &str) -> Vec<DetectedPattern> {
    PATTERN_MARKERS
        .iter()
        .filter(|(_, _, markers)| markers.iter().any(|m| text.contains(m)))
        .map(|&(kind, description, _)| DetectedPattern { kind, description })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub priority: Priority,
    pub description: &'static str,
}

fn suggestions(
    config: &AnalyzerConfig,
    context: &FormContext,
    info: &SemanticInfo,
    patterns: &[DetectedPattern],
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    let documented = info.function.as_ref().is_some_and(|f| f.docstring.is_some());
    if matches!(context, FormContext::FunctionDefinition { .. }) && !documented {
        suggestions.push(Suggestion {
            kind: "documentation",
            priority: Priority::Medium,
            description: "Consider adding a docstring to document this function",
        });
    }

    if info
        .destructuring
        .as_ref()
        .is_some_and(|d| d.complexity > config.complex_destructuring_threshold)
    {
        suggestions.push(Suggestion {
            kind: "complexity",
            priority: Priority::Low,
            description: "Complex destructuring pattern - consider breaking into smaller parts",
        });
    }

    if info
        .state_management
        .as_ref()
        .is_some_and(|s| s.mutations > config.mutation_threshold)
    {
        suggestions.push(Suggestion {
            kind: "state_management",
            priority: Priority::Medium,
            description: "Multiple state mutations - consider transaction boundaries",
        });
    }

    for pattern in patterns {
        if pattern.kind == "threading_macro" {
            suggestions.push(Suggestion {
                kind: "refactoring",
                priority: Priority::Low,
                description: "Consider if threading macro improves readability here",
            });
        }
    }

    suggestions
}

/// Everything known about the form at a cursor position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorReport {
    pub position: Position,
    pub sexpression: Option<FormLocation>,
    pub context: Option<FormContext>,
    pub semantic_info: SemanticInfo,
    pub navigation: Navigation,
    pub patterns: Vec<DetectedPattern>,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CursorReport {
    fn failed(position: Position, error: String) -> Self {
        Self {
            position,
            sexpression: None,
            context: None,
            semantic_info: SemanticInfo::default(),
            navigation: Navigation::default(),
            patterns: Vec::new(),
            suggestions: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.sexpression.is_none()
    }
}

/// Composite report for the form at `line`/`column`.
///
/// Never fails: a cursor outside every form yields a report carrying an error.
pub fn analyze_at(
    source: &SourceText<'_>,
    grammar: &ClojureGrammar,
    config: &AnalyzerConfig,
    line: usize,
    column: usize,
) -> CursorReport {
    let position = Position::new(line, column);
    let cursor = match Cursor::open(source, grammar, line, column) {
        Ok(cursor) => cursor,
        Err(e) if e.is_not_found() => {
            return CursorReport::failed(position, "No s-expression found at position".to_string())
        }
        Err(e) => {
            log::debug!("Cursor analysis at {line}:{column} failed: {e}");
            return CursorReport::failed(position, e.to_string());
        }
    };
    let Some(current) = cursor.current() else {
        return CursorReport::failed(position, "No s-expression found at position".to_string());
    };

    let sexpression = cursor.location(current);
    let context = FormContext::classify(&sexpression.text);
    let semantic_info = SemanticInfo::gather(grammar, &context, &sexpression.text);

    let target = |direction| {
        NavigationTarget::from_location(cursor.navigate(direction), config.preview_chars)
    };
    let navigation = Navigation {
        next: target(Direction::Next),
        prev: target(Direction::Prev),
        up: target(Direction::Up),
        down: target(Direction::Down),
        top: target(Direction::Top),
        matching_paren: matching_delimiter(source, line, column)
            .map(|m| MatchingParen {
                available: true,
                line: Some(m.line),
                column: Some(m.column),
                character: Some(m.character),
            })
            .unwrap_or_default(),
    };

    let patterns = detect_patterns(&sexpression.text);
    let suggestions = suggestions(config, &context, &semantic_info, &patterns);

    CursorReport {
        position,
        sexpression: Some(sexpression),
        context: Some(context),
        semantic_info,
        navigation,
        patterns,
        suggestions,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CODE: &str = "(ns app.core)\n\n(defn handler [{:keys [db user]}]\n  (let [conn (:conn db)]\n    (-> user (assoc :seen true) (save conn))))";

    fn grammar() -> ClojureGrammar {
        ClojureGrammar::new().unwrap()
    }

    #[test]
    fn test_form_at_innermost_list() {
        let source = SourceText::new(CODE);
        let form = form_at(&source, &grammar(), 5, 4).unwrap();
        assert_eq!(form.kind, "list_lit");
        assert_eq!(form.text, "(-> user (assoc :seen true) (save conn))");
        assert_eq!((form.start_line, form.start_column), (5, 4));
        assert_eq!(form.depth, 2);
    }

    #[test]
    fn test_form_at_whitespace_is_not_found() {
        let source = SourceText::new(CODE);
        let err = form_at(&source, &grammar(), 2, 0).unwrap_err();
        assert!(err.is_not_found(), "got: {err:?}");
        let err = form_at(&source, &grammar(), 99, 0).unwrap_err();
        assert!(err.is_not_found(), "got: {err:?}");
    }

    #[test]
    fn test_navigation_inside_form() {
        let source = SourceText::new(CODE);
        let g = grammar();
        let up = navigate(&source, &g, 5, 4, Direction::Up).unwrap().unwrap();
        assert_eq!(up.start_line, 4);
        assert!(up.text.starts_with("(let"));

        let down = navigate(&source, &g, 5, 4, Direction::Down).unwrap().unwrap();
        assert_eq!(down.text, "(assoc :seen true)");

        assert_eq!(navigate(&source, &g, 5, 4, Direction::Next).unwrap(), None);
        let prev = navigate(&source, &g, 5, 4, Direction::Prev).unwrap().unwrap();
        assert_eq!(prev.kind, "vec_lit");

        let top = navigate(&source, &g, 5, 4, Direction::Top).unwrap().unwrap();
        assert_eq!(top.start_line, 3);
        assert_eq!(top.depth, 0);
    }

    #[test]
    fn test_navigation_steps_over_sets() {
        let source = SourceText::new("(f #{(g 1)})");
        let g = grammar();
        let form = form_at(&source, &g, 1, 6).unwrap();
        assert_eq!(form.text, "(g 1)");
        assert_eq!(form.depth, 1);

        let up = navigate(&source, &g, 1, 6, Direction::Up).unwrap().unwrap();
        assert_eq!(up.text, "(f #{(g 1)})");
        assert_eq!(navigate(&source, &g, 1, 1, Direction::Down).unwrap(), None);
    }

    #[test]
    fn test_navigation_between_top_level_forms() {
        let source = SourceText::new(CODE);
        let g = grammar();
        let prev = navigate(&source, &g, 3, 0, Direction::Prev).unwrap().unwrap();
        assert_eq!(prev.text, "(ns app.core)");
        assert_eq!(navigate(&source, &g, 3, 0, Direction::Next).unwrap(), None);
        assert_eq!(navigate(&source, &g, 3, 0, Direction::Up).unwrap(), None);
    }

    #[test]
    fn test_matching_delimiter() {
        let source = SourceText::new(CODE);
        let close = matching_delimiter(&source, 5, 4).unwrap();
        assert_eq!((close.line, close.column, close.character), (5, 43, ')'));
        assert_eq!(close.container_type, FormKind::List);

        let open = matching_delimiter(&source, 5, 43).unwrap();
        assert_eq!((open.line, open.column, open.character), (5, 4, '('));

        assert_eq!(matching_delimiter(&source, 5, 5), None);
    }

    #[test]
    fn test_context_classification() {
        assert_eq!(
            FormContext::classify("(defn- helper [x] x)"),
            FormContext::FunctionDefinition {
                function_name: Some("helper".to_string())
            }
        );
        assert_eq!(
            FormContext::classify("(defrecord Point [x y])"),
            FormContext::TypeDefinition {
                construct_type: "defrecord".to_string(),
                type_name: Some("Point".to_string())
            }
        );
        assert_eq!(FormContext::classify("(let [a 1] a)"), FormContext::LetBinding);
        assert_eq!(FormContext::classify("(letfn [(f [] 1)] (f))"), FormContext::Unknown);
        assert_eq!(
            FormContext::classify("(str/join \",\" xs)"),
            FormContext::FunctionCall {
                function_name: Some("str/join".to_string())
            }
        );
        assert_eq!(FormContext::classify("{:a 1}"), FormContext::MapLiteral);
    }

    #[test]
    fn test_report_for_threading_call() {
        let source = SourceText::new(CODE);
        let report = analyze_at(&source, &grammar(), &AnalyzerConfig::default(), 5, 4);
        assert_eq!(report.error, None);
        assert_eq!(
            report.context,
            Some(FormContext::FunctionCall {
                function_name: Some("->".to_string())
            })
        );
        let kinds: Vec<_> = report.patterns.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec!["threading_macro"]);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].kind, "refactoring");
        assert_eq!(report.semantic_info.macros.as_ref().map(|m| m.count), Some(1));
        assert!(report.semantic_info.function.is_none());

        assert!(report.navigation.up.available);
        assert!(!report.navigation.next.available);
        assert_eq!(report.navigation.prev.target_type, Some("vec_lit"));
        assert_eq!(report.navigation.matching_paren.column, Some(43));
    }

    #[test]
    fn test_report_for_function_definition() {
        let source = SourceText::new(CODE);
        let report = analyze_at(&source, &grammar(), &AnalyzerConfig::default(), 3, 0);
        let function = report.semantic_info.function.clone().unwrap();
        assert_eq!(function.name, "handler");
        assert!(!function.private);
        assert_eq!(function.params.as_deref(), Some("[{:keys [db user]}]"));

        let destructuring = report.semantic_info.destructuring.clone().unwrap();
        assert_eq!(destructuring.patterns, 1);
        assert_eq!(destructuring.complexity, 3);
        assert_eq!(destructuring.types, vec![DestructuringKind::Map]);

        let kinds: Vec<_> = report.patterns.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec!["threading_macro", "map_destructuring"]);
        let suggestions: Vec<_> = report.suggestions.iter().map(|s| s.kind).collect();
        assert_eq!(suggestions, vec!["documentation", "refactoring"]);
        assert_eq!(report.navigation.top.target_line, Some(3));
        assert_eq!(report.navigation.down.target_type, Some("vec_lit"));
    }

    #[test]
    fn test_report_outside_any_form() {
        let source = SourceText::new(CODE);
        let report = analyze_at(&source, &grammar(), &AnalyzerConfig::default(), 2, 0);
        assert!(report.is_not_found());
        assert_eq!(report.error.as_deref(), Some("No s-expression found at position"));
        assert!(report.patterns.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sexpression"], serde_json::Value::Null);
        assert_eq!(json["navigation"]["next"]["available"], false);
    }

    #[test]
    fn test_state_suggestion_uses_threshold() {
        let code = "(defn bump \"Bumps.\" [] (swap! a inc) (swap! a inc) (reset! b 0) (swap! c inc))";
        let source = SourceText::new(code);
        let report = analyze_at(&source, &grammar(), &AnalyzerConfig::default(), 1, 0);
        assert_eq!(report.semantic_info.state_management.as_ref().map(|s| s.mutations), Some(4));
        let suggestions: Vec<_> = report.suggestions.iter().map(|s| s.kind).collect();
        assert_eq!(suggestions, vec!["state_management"]);
    }
}
