//! Idiom detectors and the idiom summary.
//!
//! Each detector is a regex over the raw text; matches that open a form are
//! extended to the whole form with the boundary scanner.

use crate::boundary::{scan_form, Span};
use crate::classify::round_to;
use crate::config::AnalyzerConfig;
use crate::source::{elide, elide_always, SourceText};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Characters kept in the snippet of single-keyword idioms
const KEYWORD_SNIPPET_CHARS: usize = 50;

/// Idiom family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdiomCategory {
    Functional,
    Syntax,
    Collection,
    State,
    ControlFlow,
    NilHandling,
}

impl IdiomCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Functional => "functional",
            Self::Syntax => "syntax",
            Self::Collection => "collection",
            Self::State => "state",
            Self::ControlFlow => "control_flow",
            Self::NilHandling => "nil_handling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStrength {
    Medium,
    High,
}

/// A recognized idiom
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdiomOccurrence {
    pub idiom_type: &'static str,
    pub category: IdiomCategory,
    pub description: String,
    pub code_snippet: String,
    pub span: Span,
    pub start_line: usize,
    pub complexity_score: f64,
    pub benefits: &'static [&'static str],
    pub pattern_strength: PatternStrength,
}

/// Idiom recognized by a single leading keyword
struct KeywordIdiom {
    keyword: &'static str,
    idiom_type: &'static str,
    category: IdiomCategory,
    description: &'static str,
    complexity: f64,
    strength: PatternStrength,
    benefits: &'static [&'static str],
}

const NIL_SAFE_THREADING: &[&str] = &["Nil safety", "Clean error handling", "Functional style"];

const KEYWORD_IDIOMS: &[KeywordIdiom] = {
    use IdiomCategory::*;
    use PatternStrength::*;
    &[
        KeywordIdiom {
            keyword: "some->",
            idiom_type: "threading_some",
            category: Functional,
            description: "Nil-safe threading",
            complexity: 2.0,
            strength: Medium,
            benefits: NIL_SAFE_THREADING,
        },
        KeywordIdiom {
            keyword: "some->>",
            idiom_type: "threading_some_last",
            category: Functional,
            description: "Nil-safe thread-last",
            complexity: 2.0,
            strength: Medium,
            benefits: NIL_SAFE_THREADING,
        },
        KeywordIdiom {
            keyword: "as->",
            idiom_type: "threading_as",
            category: Functional,
            description: "Named threading with binding",
            complexity: 2.0,
            strength: Medium,
            benefits: NIL_SAFE_THREADING,
        },
        KeywordIdiom {
            keyword: "comp",
            idiom_type: "function_composition",
            category: Functional,
            description: "Function composition using comp",
            complexity: 3.0,
            strength: High,
            benefits: &["Reusable transformations", "Mathematical composition", "Clean abstractions"],
        },
        KeywordIdiom {
            keyword: "partial",
            idiom_type: "partial_application",
            category: Functional,
            description: "Partial function application",
            complexity: 2.0,
            strength: Medium,
            benefits: &["Currying", "Function specialization", "Higher-order abstractions"],
        },
        KeywordIdiom {
            keyword: "update-in",
            idiom_type: "nested_update",
            category: State,
            description: "Nested data structure update with update-in",
            complexity: 3.0,
            strength: High,
            benefits: &["Immutable updates", "Clean nested access", "Functional state management"],
        },
        KeywordIdiom {
            keyword: "assoc-in",
            idiom_type: "nested_association",
            category: State,
            description: "Nested data structure association with assoc-in",
            complexity: 2.5,
            strength: Medium,
            benefits: &["Immutable updates", "Deep data access", "Clean syntax"],
        },
        KeywordIdiom {
            keyword: "when-let",
            idiom_type: "conditional_binding",
            category: ControlFlow,
            description: "Conditional binding with when-let",
            complexity: 2.0,
            strength: High,
            benefits: &["Nil safety", "Clean conditionals", "Avoid nested ifs"],
        },
        KeywordIdiom {
            keyword: "if-let",
            idiom_type: "conditional_binding_with_else",
            category: ControlFlow,
            description: "Conditional binding with if-let",
            complexity: 2.5,
            strength: High,
            benefits: &["Nil safety", "Complete conditionals", "Elegant error handling"],
        },
        KeywordIdiom {
            keyword: "fnil",
            idiom_type: "nil_safe_function",
            category: NilHandling,
            description: "Nil-safe function with fnil",
            complexity: 2.0,
            strength: Medium,
            benefits: &["Nil safety", "Function adaptation", "Defensive programming"],
        },
    ]
};

/// `(keyword-a | keyword-b)` sequence helpers
const SEQUENCE_IDIOMS: &[(&str, &str, &str)] = &[
    ("take-while", "drop-while", "conditional_sequence_processing"),
    ("partition-by", "group-by", "data_grouping"),
    ("map-indexed", "keep-indexed", "indexed_processing"),
    ("frequencies", "group-by", "data_analysis"),
];

const HOF_CHAINS: &[&[&str]] = &[
    &["map", "filter", "reduce"],
    &["filter", "map"],
    &["remove", "map"],
    &["map", "mapcat"],
    &["group-by", "map"],
];

fn keyword_regex(alternatives: &str) -> Regex {
    Regex::new(&format!(r"\(\s*({alternatives})\s+")).expect("valid idiom keyword regex")
}

static THREAD_FIRST: Lazy<Regex> = Lazy::new(|| keyword_regex("->"));
static THREAD_LAST: Lazy<Regex> = Lazy::new(|| keyword_regex("->>"));
static COND: Lazy<Regex> = Lazy::new(|| keyword_regex("cond"));

static KEYWORD_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    KEYWORD_IDIOMS
        .iter()
        .map(|idiom| keyword_regex(&regex::escape(idiom.keyword)))
        .collect()
});

static SEQUENCE_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    SEQUENCE_IDIOMS
        .iter()
        .map(|(a, b, _)| keyword_regex(&format!("{}|{}", regex::escape(a), regex::escape(b))))
        .collect()
});

static HOF_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    HOF_CHAINS
        .iter()
        .map(|chain| {
            let body = chain
                .iter()
                .map(|f| regex::escape(f))
                .collect::<Vec<_>>()
                .join(r"\s+.*?\)\s*\(\s*");
            RegexBuilder::new(&format!(r"\(\s*{body}\s+"))
                .dot_matches_new_line(true)
                .build()
                .expect("valid higher-order chain regex")
        })
        .collect()
});

static TRANSDUCER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(map|filter|take|drop|partition)\s+[^)]*\)\s*\(")
        .expect("valid transducer regex")
});

static MAP_KEYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\s*:keys\s*\[([^\]]+)\]").expect("valid map keys regex"));

static VECTOR_REST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^&\]]*&[^&\]]*|\[[^\]]*\][^&\]]*)\]").expect("valid vector rest regex")
});

static OR_DEFAULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*or\s+[^)]+\s+[^)]+\)").expect("valid or default regex"));

/// Detector context shared by every idiom family
struct Detector<'s, 'a> {
    source: &'s SourceText<'a>,
    config: &'s AnalyzerConfig,
    found: Vec<IdiomOccurrence>,
}

impl<'s, 'a> Detector<'s, 'a> {
    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        idiom_type: &'static str,
        category: IdiomCategory,
        description: String,
        code_snippet: String,
        span: Span,
        complexity_score: f64,
        benefits: &'static [&'static str],
        pattern_strength: PatternStrength,
    ) {
        self.found.push(IdiomOccurrence {
            idiom_type,
            category,
            description,
            code_snippet,
            span,
            start_line: self.source.line_of(span.start),
            complexity_score,
            benefits,
            pattern_strength,
        });
    }

    /// Whole form opened at `start`, or the bare match when it cannot be delimited
    fn form_span(&self, start: usize, end: usize) -> Span {
        scan_form(self.source.as_str(), start).unwrap_or_else(|| Span::new(start, end))
    }

    fn threading(&mut self) {
        let text = self.source.as_str();
        let variants: [(&Regex, &'static str, &str, &'static [&'static str]); 2] = [
            (
                &*THREAD_FIRST,
                "threading_first",
                "Thread-first",
                &["Improved readability", "Left-to-right data flow", "Avoids nested calls"],
            ),
            (
                &*THREAD_LAST,
                "threading_last",
                "Thread-last",
                &["Collection processing", "Sequence transformations", "Functional composition"],
            ),
        ];

        for (regex, idiom_type, label, benefits) in variants {
            for m in regex.find_iter(text) {
                let Some(span) = scan_form(text, m.start()) else {
                    continue;
                };
                if span.truncated {
                    continue;
                }
                let chain = self.source.slice(span);
                let steps = chain.matches('(').count().saturating_sub(1);
                let strength = if steps >= self.config.high_step_threshold {
                    PatternStrength::High
                } else {
                    PatternStrength::Medium
                };
                self.push(
                    idiom_type,
                    IdiomCategory::Functional,
                    format!("{label} macro with ~{steps} transformation steps"),
                    elide(chain, self.config.snippet_chars),
                    span,
                    (steps as f64 * 0.5).min(5.0),
                    benefits,
                    strength,
                );
            }
        }
    }

    fn keyword_idioms(&mut self) {
        let text = self.source.as_str();
        for (idiom, regex) in KEYWORD_IDIOMS.iter().zip(KEYWORD_REGEXES.iter()) {
            for m in regex.find_iter(text) {
                let span = self.form_span(m.start(), m.end());
                self.push(
                    idiom.idiom_type,
                    idiom.category,
                    idiom.description.to_string(),
                    elide_always(m.as_str(), KEYWORD_SNIPPET_CHARS),
                    span,
                    idiom.complexity,
                    idiom.benefits,
                    idiom.strength,
                );
            }
        }
    }

    fn destructuring(&mut self) {
        let text = self.source.as_str();
        for captures in MAP_KEYS.captures_iter(text) {
            let (Some(whole), Some(keys)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let keys: Vec<&str> = keys.as_str().split_whitespace().collect();
            let shown = keys
                .iter()
                .take(3)
                .map(|k| format!("'{k}'"))
                .collect::<Vec<_>>()
                .join(", ");
            let more = if keys.len() > 3 { "..." } else { "" };
            let strength = if keys.len() >= 3 {
                PatternStrength::High
            } else {
                PatternStrength::Medium
            };
            self.push(
                "map_destructuring",
                IdiomCategory::Syntax,
                format!("Map destructuring extracting {} keys: [{shown}]{more}", keys.len()),
                whole.as_str().to_string(),
                Span::new(whole.start(), whole.end()),
                (keys.len() as f64 * 0.3).min(3.0),
                &["Clean parameter extraction", "Readable function signatures", "Less boilerplate"],
                strength,
            );
        }

        for m in VECTOR_REST.find_iter(text) {
            if !m.as_str().contains('&') {
                continue;
            }
            self.push(
                "vector_destructuring_rest",
                IdiomCategory::Syntax,
                "Vector destructuring with rest parameters (&)".to_string(),
                m.as_str().to_string(),
                Span::new(m.start(), m.end()),
                2.0,
                &["Flexible parameter handling", "Variadic functions", "Clean syntax"],
                PatternStrength::Medium,
            );
        }
    }

    fn higher_order_chains(&mut self) {
        let text = self.source.as_str();
        for (chain, regex) in HOF_CHAINS.iter().zip(HOF_REGEXES.iter()) {
            for m in regex.find_iter(text) {
                self.push(
                    "hof_chain",
                    IdiomCategory::Functional,
                    format!("Higher-order function chain: {}", chain.join(" -> ")),
                    elide_always(m.as_str(), self.config.snippet_chars),
                    Span::new(m.start(), m.end()),
                    chain.len() as f64 * 0.8,
                    &["Functional composition", "Data transformation", "Immutable processing"],
                    PatternStrength::High,
                );
            }
        }
    }

    fn collections(&mut self) {
        let text = self.source.as_str();
        for (&(_, _, idiom_type), regex) in SEQUENCE_IDIOMS.iter().zip(SEQUENCE_REGEXES.iter()) {
            for captures in regex.captures_iter(text) {
                let (Some(whole), Some(function)) = (captures.get(0), captures.get(1)) else {
                    continue;
                };
                let span = self.form_span(whole.start(), whole.end());
                self.push(
                    idiom_type,
                    IdiomCategory::Collection,
                    format!("Collection processing using {}", function.as_str()),
                    elide_always(whole.as_str(), KEYWORD_SNIPPET_CHARS),
                    span,
                    2.5,
                    &["Efficient processing", "Lazy evaluation", "Memory efficient"],
                    PatternStrength::Medium,
                );
            }
        }

        for m in TRANSDUCER.find_iter(text) {
            self.push(
                "transducer_usage",
                IdiomCategory::Collection,
                "Potential transducer usage pattern".to_string(),
                elide_always(m.as_str(), KEYWORD_SNIPPET_CHARS),
                Span::new(m.start(), m.end()),
                4.0,
                &["Composable transformations", "Performance optimization", "Reusable logic"],
                PatternStrength::High,
            );
        }
    }

    fn multi_conditionals(&mut self) {
        let text = self.source.as_str();
        for m in COND.find_iter(text) {
            let rest = &text[m.start()..];
            let sample_end = rest
                .char_indices()
                .nth(self.config.cond_sample_chars)
                .map_or(rest.len(), |(idx, _)| idx);
            let sample = &rest[..sample_end];
            let branches = sample.matches('\n').count() + 1;
            let strength = if branches >= 4 {
                PatternStrength::High
            } else {
                PatternStrength::Medium
            };
            let span = self.form_span(m.start(), m.end());
            self.push(
                "multi_conditional",
                IdiomCategory::ControlFlow,
                format!("Multi-branch conditional with ~{branches} conditions"),
                elide_always(sample, self.config.snippet_chars),
                span,
                (branches as f64 * 0.5).min(5.0),
                &["Clean multi-way branching", "Avoid nested ifs", "Pattern matching style"],
                strength,
            );
        }
    }

    fn nil_defaults(&mut self) {
        let text = self.source.as_str();
        for m in OR_DEFAULT.find_iter(text) {
            self.push(
                "default_value",
                IdiomCategory::NilHandling,
                "Default value using or".to_string(),
                m.as_str().to_string(),
                Span::new(m.start(), m.end()),
                1.0,
                &["Nil safety", "Default fallbacks", "Clean syntax"],
                PatternStrength::Medium,
            );
        }
    }
}

/// Run every idiom detector, in position order.
///
/// `filter` keeps idioms whose type or description contains it, ignoring case.
pub fn find_idioms(
    source: &SourceText<'_>,
    config: &AnalyzerConfig,
    filter: Option<&str>,
) -> Vec<IdiomOccurrence> {
    let mut detector = Detector {
        source,
        config,
        found: Vec::new(),
    };
    detector.threading();
    detector.keyword_idioms();
    detector.destructuring();
    detector.higher_order_chains();
    detector.collections();
    detector.multi_conditionals();
    detector.nil_defaults();

    let mut idioms = detector.found;
    if let Some(filter) = filter.map(str::to_lowercase) {
        idioms.retain(|idiom| {
            idiom.idiom_type.contains(&filter)
                || idiom.description.to_lowercase().contains(&filter)
        });
    }
    idioms.sort_by_key(|idiom| idiom.span.start);
    idioms
}

/// Aggregate idiom counts and scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdiomSummary {
    pub total_idioms: usize,
    pub categories: BTreeMap<IdiomCategory, usize>,
    /// Average idiom complexity
    pub complexity_score: f64,
    /// `(2 * high + total) / lines * 100`, capped at 100
    pub idiomatic_score: f64,
    /// Five most frequent idiom types, ties in first-seen order
    pub top_patterns: Vec<(String, usize)>,
    /// Idiom types seen per category
    pub pattern_distribution: BTreeMap<IdiomCategory, BTreeSet<&'static str>>,
}

impl IdiomSummary {
    pub fn from_occurrences(idioms: &[IdiomOccurrence], line_count: usize) -> Self {
        let mut categories = BTreeMap::new();
        let mut pattern_distribution: BTreeMap<IdiomCategory, BTreeSet<&'static str>> =
            BTreeMap::new();
        let mut pattern_counts: Vec<(String, usize)> = Vec::new();

        for idiom in idioms {
            *categories.entry(idiom.category).or_insert(0) += 1;
            pattern_distribution
                .entry(idiom.category)
                .or_default()
                .insert(idiom.idiom_type);
            match pattern_counts.iter_mut().find(|(t, _)| t == idiom.idiom_type) {
                Some((_, count)) => *count += 1,
                None => pattern_counts.push((idiom.idiom_type.to_string(), 1)),
            }
        }
        pattern_counts.sort_by(|a, b| b.1.cmp(&a.1));
        pattern_counts.truncate(5);

        let total = idioms.len();
        let total_complexity: f64 = idioms.iter().map(|i| i.complexity_score).sum();
        let high = idioms
            .iter()
            .filter(|i| i.pattern_strength == PatternStrength::High)
            .count();
        let idiomatic_score = if total == 0 {
            0.0
        } else {
            ((high * 2 + total) as f64 / line_count.max(1) as f64 * 100.0).min(100.0)
        };

        Self {
            total_idioms: total,
            categories,
            complexity_score: round_to(total_complexity / total.max(1) as f64, 2),
            idiomatic_score: round_to(idiomatic_score, 2),
            top_patterns: pattern_counts,
            pattern_distribution,
        }
    }
}
