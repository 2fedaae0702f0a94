use crate::bindings::{locate_bindings, DestructuringSummary};
use crate::classify::concurrency::{self, ConcurrencyOccurrence, ConcurrencySummary};
use crate::classify::state::{self, StateCategory, StateOccurrence, StateSummary};
use crate::config::AnalyzerConfig;
use crate::context::{self, CursorReport, Direction, FormLocation, MatchingDelimiter};
use crate::definitions::{self, MacroOccurrence};
use crate::error::{AnalyzerError, Result};
use crate::grammar::ClojureGrammar;
use crate::idioms::{self, IdiomOccurrence, IdiomSummary};
use crate::locator::NameFilter;
use crate::source::SourceText;
use crate::types::{
    BindingOccurrence, DefinitionKind, DefinitionRecord, DependencyStatement, DestructuringKind,
    NamespaceRecord, TypeRecord,
};
use serde::Serialize;

/// Idioms of a source plus every classifier summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdiomReport {
    pub idioms: Vec<IdiomOccurrence>,
    pub summary: IdiomSummary,
    pub concurrency: ConcurrencySummary,
    pub state: StateSummary,
    pub destructuring: DestructuringSummary,
}

/// Structural analysis over Clojure source text.
///
/// Holds only the immutable grammar handle and configuration, so one analyzer
/// can serve any number of threads. Every operation takes the full source
/// text and returns owned results.
#[derive(Debug, Clone)]
pub struct Analyzer {
    grammar: ClojureGrammar,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Analyzer with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Result<Self> {
        config.validate().map_err(AnalyzerError::invalid_config)?;
        Ok(Self {
            grammar: ClojureGrammar::new()?,
            config,
        })
    }

    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub const fn grammar(&self) -> &ClojureGrammar {
        &self.grammar
    }

    pub fn find_functions(
        &self,
        code: &str,
        filter: Option<&NameFilter>,
    ) -> Vec<DefinitionRecord> {
        definitions::locate_functions(&SourceText::new(code), &self.grammar, filter)
    }

    pub fn find_namespaces(&self, code: &str) -> Vec<NamespaceRecord> {
        definitions::locate_namespaces(&SourceText::new(code), &self.grammar)
    }

    /// Every require/import entry, tagged with its namespace
    pub fn find_dependencies(&self, code: &str) -> Vec<DependencyStatement> {
        definitions::dependency_statements(&self.find_namespaces(code))
    }

    /// `defmacro` definitions matching `filter`, plus all threading-macro usages
    pub fn find_macros(&self, code: &str, filter: Option<&NameFilter>) -> Vec<MacroOccurrence> {
        definitions::locate_macros(&SourceText::new(code), &self.grammar, filter)
    }

    pub fn find_threading_macros(&self, code: &str) -> Vec<MacroOccurrence> {
        definitions::locate_threading_macros(&SourceText::new(code))
    }

    pub fn find_protocols_and_types(
        &self,
        code: &str,
        filter: Option<&NameFilter>,
    ) -> Vec<TypeRecord> {
        definitions::locate_protocols_and_types(&SourceText::new(code), &self.grammar, filter)
    }

    pub fn find_protocols(&self, code: &str, filter: Option<&NameFilter>) -> Vec<TypeRecord> {
        self.find_protocols_and_types(code, filter)
            .into_iter()
            .filter(|t| t.definition.kind == DefinitionKind::Protocol)
            .collect()
    }

    /// `deftype` and `defrecord` forms
    pub fn find_types(&self, code: &str, filter: Option<&NameFilter>) -> Vec<TypeRecord> {
        self.find_protocols_and_types(code, filter)
            .into_iter()
            .filter(|t| t.definition.kind.is_type())
            .collect()
    }

    pub fn analyze_destructuring(&self, code: &str) -> Vec<BindingOccurrence> {
        locate_bindings(&SourceText::new(code))
    }

    pub fn find_destructuring(
        &self,
        code: &str,
        kind: Option<DestructuringKind>,
    ) -> Vec<BindingOccurrence> {
        let mut found = self.analyze_destructuring(code);
        if let Some(kind) = kind {
            found.retain(|o| o.pattern.kind == kind);
        }
        found
    }

    pub fn destructuring_summary(&self, code: &str) -> DestructuringSummary {
        DestructuringSummary::from_occurrences(&self.analyze_destructuring(code))
    }

    /// core.async usage; the filter tests the pattern type (`go_block`, `channel_close`, ...)
    pub fn find_async_patterns(
        &self,
        code: &str,
        filter: Option<&NameFilter>,
    ) -> Vec<ConcurrencyOccurrence> {
        concurrency::CLASSIFIER.classify(&SourceText::new(code), filter)
    }

    pub fn find_go_blocks(&self, code: &str) -> Vec<ConcurrencyOccurrence> {
        self.find_async_patterns(code, None)
            .into_iter()
            .filter(|o| o.category == concurrency::ConcurrencyCategory::AsyncBlocks)
            .collect()
    }

    pub fn find_channel_operations(&self, code: &str) -> Vec<ConcurrencyOccurrence> {
        self.find_async_patterns(code, None)
            .into_iter()
            .filter(|o| o.category.is_channel_operation())
            .collect()
    }

    pub fn concurrency_summary(&self, code: &str) -> ConcurrencySummary {
        ConcurrencySummary::from_occurrences(&self.find_async_patterns(code, None))
    }

    /// Reference-type and other state operations; the filter tests the pattern type
    pub fn find_state_operations(
        &self,
        code: &str,
        filter: Option<&NameFilter>,
    ) -> Vec<StateOccurrence> {
        state::CLASSIFIER.classify(&SourceText::new(code), filter)
    }

    pub fn find_atoms(&self, code: &str) -> Vec<StateOccurrence> {
        self.find_state_operations(code, None)
            .into_iter()
            .filter(|o| o.category == StateCategory::Atoms)
            .collect()
    }

    pub fn find_state_mutations(&self, code: &str) -> Vec<StateOccurrence> {
        self.find_state_operations(code, None)
            .into_iter()
            .filter(|o| o.is_mutation)
            .collect()
    }

    pub fn state_summary(&self, code: &str) -> StateSummary {
        StateSummary::from_occurrences(&self.find_state_operations(code, None))
    }

    pub fn analyze_at(&self, code: &str, line: usize, column: usize) -> CursorReport {
        context::analyze_at(&SourceText::new(code), &self.grammar, &self.config, line, column)
    }

    pub fn form_at(&self, code: &str, line: usize, column: usize) -> Result<FormLocation> {
        context::form_at(&SourceText::new(code), &self.grammar, line, column)
    }

    pub fn navigate(
        &self,
        code: &str,
        line: usize,
        column: usize,
        direction: Direction,
    ) -> Result<Option<FormLocation>> {
        context::navigate(&SourceText::new(code), &self.grammar, line, column, direction)
    }

    pub fn matching_delimiter(
        &self,
        code: &str,
        line: usize,
        column: usize,
    ) -> Option<MatchingDelimiter> {
        context::matching_delimiter(&SourceText::new(code), line, column)
    }

    /// Idioms whose type or description contains `filter` (case-insensitive)
    pub fn find_idioms(&self, code: &str, filter: Option<&str>) -> Vec<IdiomOccurrence> {
        idioms::find_idioms(&SourceText::new(code), &self.config, filter)
    }

    pub fn idiom_summary(&self, code: &str) -> IdiomSummary {
        let source = SourceText::new(code);
        let found = idioms::find_idioms(&source, &self.config, None);
        IdiomSummary::from_occurrences(&found, source.line_count())
    }

    /// Filtered idioms with the unfiltered summaries of every classifier
    pub fn summarize_idioms(&self, code: &str, filter: Option<&str>) -> IdiomReport {
        let source = SourceText::new(code);
        IdiomReport {
            idioms: idioms::find_idioms(&source, &self.config, filter),
            summary: self.idiom_summary(code),
            concurrency: self.concurrency_summary(code),
            state: self.state_summary(code),
            destructuring: self.destructuring_summary(code),
        }
    }
}
