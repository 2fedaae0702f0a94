use crate::boundary::Span;
use crate::source::SourceText;
use serde::{Deserialize, Serialize};

/// Kind of a located definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Function,
    Namespace,
    Protocol,
    Type,
    Record,
    Reify,
    ExtendType,
    ExtendProtocol,
}

impl DefinitionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Namespace => "namespace",
            Self::Protocol => "protocol",
            Self::Type => "type",
            Self::Record => "record",
            Self::Reify => "reify",
            Self::ExtendType => "extend_type",
            Self::ExtendProtocol => "extend_protocol",
        }
    }

    /// deftype / defrecord
    pub const fn is_type(&self) -> bool {
        matches!(self, Self::Type | Self::Record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// A function, namespace or protocol/type definition.
///
/// Optional fields stay empty when the isolated re-parse yields nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    pub name: String,
    pub kind: DefinitionKind,
    /// Defining keyword as written (`defn-`, `defrecord`, ...)
    pub keyword: String,
    pub visibility: Visibility,
    pub span: Span,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
    /// Destructuring found in the parameter vector
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<BindingPattern>,
}

impl DefinitionRecord {
    pub(crate) fn new(
        source: &SourceText<'_>,
        name: impl Into<String>,
        kind: DefinitionKind,
        keyword: &str,
        span: Span,
    ) -> Self {
        let (start_line, end_line) = source.line_range(span);
        Self {
            name: name.into(),
            kind,
            keyword: keyword.to_string(),
            visibility: if keyword.ends_with('-') {
                Visibility::Private
            } else {
                Visibility::Public
            },
            span,
            start_line,
            end_line,
            text: source.slice(span).to_string(),
            docstring: None,
            params: None,
            bindings: Vec::new(),
        }
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

/// A namespace declaration with its dependency entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    #[serde(flatten)]
    pub definition: DefinitionRecord,
    /// Raw `:require` entries, e.g. `[clojure.string :as str]`
    pub requires: Vec<String>,
    /// Raw `:import` entries, e.g. `[java.util Date]`
    pub imports: Vec<String>,
}

impl NamespaceRecord {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Namespace names taken from `:require` entries
    pub fn required_names(&self) -> Vec<String> {
        self.requires.iter().filter_map(|s| dependency_name(s)).collect()
    }

    /// Package names taken from `:import` entries
    pub fn imported_names(&self) -> Vec<String> {
        self.imports.iter().filter_map(|s| dependency_name(s)).collect()
    }
}

/// First token of a dependency entry once its outer delimiters are stripped
pub fn dependency_name(statement: &str) -> Option<String> {
    statement
        .trim()
        .trim_matches(|c| matches!(c, '[' | ']' | '(' | ')'))
        .split_whitespace()
        .next()
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Require,
    Import,
}

impl DependencyKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Require => "require",
            Self::Import => "import",
        }
    }
}

/// One require/import entry of a namespace declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyStatement {
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub statement: String,
    pub dependency: Option<String>,
    pub namespace: String,
    pub source_line: usize,
}

/// Method signature declared by a protocol or implemented by a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    pub params: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

/// Protocol, type, record, reify or extension form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    #[serde(flatten)]
    pub definition: DefinitionRecord,
    pub methods: Vec<MethodSignature>,
    pub fields: Vec<String>,
}

/// Destructuring shape of a binding pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingShape {
    MapKeys,
    MapStrs,
    MapSyms,
    Sequential,
}

impl BindingShape {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MapKeys => "keys",
            Self::MapStrs => "strs",
            Self::MapSyms => "syms",
            Self::Sequential => "sequential",
        }
    }

    pub const fn kind(&self) -> DestructuringKind {
        match self {
            Self::Sequential => DestructuringKind::Vector,
            _ => DestructuringKind::Map,
        }
    }
}

/// Map vs. sequential destructuring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestructuringKind {
    #[serde(rename = "map_destructuring")]
    Map,
    #[serde(rename = "vector_destructuring")]
    Vector,
}

impl DestructuringKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Map => "map_destructuring",
            Self::Vector => "vector_destructuring",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "map" | "map_destructuring" => Some(Self::Map),
            "vector" | "sequential" | "vector_destructuring" => Some(Self::Vector),
            _ => None,
        }
    }
}

/// A destructuring pattern and its complexity score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingPattern {
    #[serde(rename = "type")]
    pub kind: DestructuringKind,
    pub shape: BindingShape,
    /// Bound names in source order
    pub extracted_vars: Vec<String>,
    pub has_rest: bool,
    pub has_alias: bool,
    pub nested: bool,
    /// Variable count, plus one when the binding nests maps and vectors
    pub complexity: usize,
}

impl BindingPattern {
    pub(crate) fn new(shape: BindingShape, extracted_vars: Vec<String>) -> Self {
        Self {
            kind: shape.kind(),
            shape,
            complexity: extracted_vars.len(),
            extracted_vars,
            has_rest: false,
            has_alias: false,
            nested: false,
        }
    }
}

/// Where a binding vector was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingContext {
    FunctionParams,
    LetBindings,
    ForBindings,
    DoseqBindings,
}

impl BindingContext {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FunctionParams => "function_params",
            Self::LetBindings => "let_bindings",
            Self::ForBindings => "for_bindings",
            Self::DoseqBindings => "doseq_bindings",
        }
    }
}

/// A binding pattern located in source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingOccurrence {
    #[serde(flatten)]
    pub pattern: BindingPattern,
    pub context: BindingContext,
    /// Span of the whole binding vector, brackets included
    pub span: Span,
    pub start_line: usize,
    /// Binding vector content without its outer brackets
    pub full_binding: String,
}

/// A keyword occurrence tagged by a classifier table.
///
/// `C` is the classifier's category type; the optional fields are only filled
/// by the classifiers that know them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedOccurrence<C> {
    pub pattern_type: String,
    pub keyword: String,
    pub category: C,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub span: Span,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_mutation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
}

impl<C> ClassifiedOccurrence<C> {
    pub(crate) fn new(
        source: &SourceText<'_>,
        pattern_type: &str,
        keyword: &str,
        category: C,
        span: Span,
    ) -> Self {
        let (start_line, end_line) = source.line_range(span);
        Self {
            pattern_type: pattern_type.to_string(),
            keyword: keyword.to_string(),
            category,
            name: None,
            span,
            start_line,
            end_line,
            text: source.slice(span).to_string(),
            is_mutation: false,
            docstring: None,
            params: None,
        }
    }
}
