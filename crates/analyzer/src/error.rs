use thiserror::Error;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur while analyzing Clojure source
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// A name filter could not be compiled into a pattern
    #[error("Invalid name pattern: {0}")]
    InvalidPattern(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The Clojure grammar could not be loaded into a parser
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    /// The parser produced no tree
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The cursor does not sit inside any form, or lies outside the text
    #[error("No s-expression found at position {line}:{column}")]
    NoFormAtPosition { line: usize, column: usize },
}

impl AnalyzerError {
    /// Create an invalid pattern error
    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// True when the error means "nothing at that location"
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NoFormAtPosition { .. })
    }
}

/// Why an isolated form yielded no structured detail.
///
/// Never fatal: callers keep the record built from the keyword scan and
/// simply leave the enrichment fields empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetailError {
    #[error("parser unavailable: {0}")]
    ParserUnavailable(String),

    #[error("parser produced no tree")]
    ParseFailed,

    #[error("no {0} form found in isolated text")]
    NoStructuredMatch(&'static str),
}
