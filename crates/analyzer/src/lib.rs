//! # cljscope Analyzer
//!
//! Structural analysis of Clojure source text: definitions, destructuring,
//! core.async and reference-type usage, idioms, and cursor context.
//!
//! ## Approach
//!
//! The parser is only trusted on one self-contained form at a time. Form
//! extents come from delimiter-depth scanning over the raw text; each form
//! found that way is re-parsed in isolation for docstrings and parameters.
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     │
//!     ├──> Position Index (byte offset ↔ line/column)
//!     │
//!     ├──> Boundary Scanner (depth counting, truncated spans on bad input)
//!     │
//!     ├──> Keyword Locator (leading keyword + optional name, name filters)
//!     │    ├─> Definitions (defn, ns, defmacro, protocols/types)
//!     │    │    └─> Isolated-Form Detail (tree-sitter re-parse)
//!     │    └─> Classifiers (core.async, state) → weighted summaries
//!     │
//!     ├──> Binding Analyzer (map/sequential destructuring)
//!     │
//!     ├──> Idiom Detectors → idiom summary
//!     │
//!     └──> Cursor Context (form, context, semantics, navigation)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use cljscope_analyzer::Analyzer;
//!
//! let analyzer = Analyzer::new().unwrap();
//! let code = "(defn greet \"Says hi.\" [{:keys [name]}] (str \"hi \" name))";
//!
//! for function in analyzer.find_functions(code, None) {
//!     println!("{} at line {}: {:?}", function.name, function.start_line, function.docstring);
//! }
//! ```

mod analyzer;
mod bindings;
mod boundary;
pub mod classify;
mod config;
mod context;
mod definitions;
mod detail;
mod error;
mod grammar;
mod idioms;
mod locator;
mod source;
mod types;

pub use analyzer::{Analyzer, IdiomReport};
pub use bindings::{analyze_bindings, DestructuringSummary};
pub use boundary::{scan_form, top_level_forms, Delimiter, Form, FormKind, Span};
pub use classify::concurrency::{ConcurrencyCategory, ConcurrencyOccurrence, ConcurrencySummary};
pub use classify::round_to;
pub use classify::state::{StateCategory, StateOccurrence, StateSummary};
pub use config::AnalyzerConfig;
pub use context::{
    AsyncInfo, CursorReport, DestructuringInfo, DetectedPattern, Direction, FormContext,
    FormLocation, FunctionInfo, MacroInfo, MatchingDelimiter, MatchingParen, NamespaceInfo,
    Navigation, NavigationTarget, Priority, SemanticInfo, StateInfo, Suggestion,
};
pub use definitions::{MacroCategory, MacroOccurrence};
pub use error::{AnalyzerError, DetailError, Result};
pub use grammar::ClojureGrammar;
pub use idioms::{IdiomCategory, IdiomOccurrence, IdiomSummary, PatternStrength};
pub use locator::{KeywordMatch, KeywordRule, KeywordTable, NameFilter, NameToken};
pub use source::{elide, elide_always, Position, SourceText};
pub use types::{
    dependency_name, BindingContext, BindingOccurrence, BindingPattern, BindingShape,
    ClassifiedOccurrence, DefinitionKind, DefinitionRecord, DependencyKind, DependencyStatement,
    DestructuringKind, MethodSignature, NamespaceRecord, TypeRecord, Visibility,
};
