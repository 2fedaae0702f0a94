//! Table-driven pattern classifiers.
//!
//! Each classifier is a list of keyword rules tagged with a category. Located
//! occurrences are scored as the sum of category count times category weight.

pub mod concurrency;
pub mod state;

use crate::error::Result;
use crate::locator::{KeywordRule, KeywordTable, NameFilter};
use crate::source::SourceText;
use crate::types::ClassifiedOccurrence;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Category of a classifier table
pub trait Category: Copy + Eq + Ord + Serialize {
    fn as_str(&self) -> &'static str;

    /// Weight used by the aggregate complexity score
    fn weight(&self) -> u32;
}

/// One row of a classifier table
#[derive(Debug, Clone, Copy)]
pub struct ClassifierRule<C> {
    pub rule: KeywordRule,
    pub category: C,
    pub mutates: bool,
}

impl<C> ClassifierRule<C> {
    pub const fn new(keyword: &'static str, label: &'static str, category: C) -> Self {
        Self {
            rule: KeywordRule::new(keyword, label),
            category,
            mutates: false,
        }
    }

    #[must_use]
    pub const fn mutating(mut self) -> Self {
        self.mutates = true;
        self
    }

    #[must_use]
    pub const fn space_optional(mut self) -> Self {
        self.rule = self.rule.space_optional();
        self
    }
}

/// A compiled classifier table
#[derive(Debug, Clone)]
pub struct Classifier<C> {
    table: KeywordTable,
    tags: HashMap<&'static str, (C, bool)>,
}

impl<C: Category> Classifier<C> {
    pub fn new(rules: &[ClassifierRule<C>]) -> Result<Self> {
        let keyword_rules: Vec<KeywordRule> = rules.iter().map(|r| r.rule).collect();
        Ok(Self {
            table: KeywordTable::new(&keyword_rules)?,
            tags: rules
                .iter()
                .map(|r| (r.rule.label, (r.category, r.mutates)))
                .collect(),
        })
    }

    /// Occurrences in document order; the filter tests the pattern type
    pub fn classify(
        &self,
        source: &SourceText<'_>,
        filter: Option<&NameFilter>,
    ) -> Vec<ClassifiedOccurrence<C>> {
        self.table
            .locate(source.as_str(), filter)
            .into_iter()
            .filter_map(|m| {
                let (category, mutates) = *self.tags.get(m.label)?;
                let mut occurrence =
                    ClassifiedOccurrence::new(source, m.label, m.keyword, category, m.span);
                occurrence.is_mutation = mutates;
                Some(occurrence)
            })
            .collect()
    }
}

/// Counts shared by every classifier summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub total: usize,
    pub categories: BTreeMap<String, usize>,
    pub complexity_score: u32,
    pub intensity: f64,
    pub pattern_types: Vec<String>,
    pub mutations: usize,
}

impl Tally {
    pub fn of<C: Category>(occurrences: &[ClassifiedOccurrence<C>]) -> Self {
        let mut per_category: BTreeMap<C, usize> = BTreeMap::new();
        for occurrence in occurrences {
            *per_category.entry(occurrence.category).or_default() += 1;
        }

        let complexity_score: u32 = per_category
            .iter()
            .map(|(category, count)| category.weight() * *count as u32)
            .sum();
        let total = occurrences.len();

        Self {
            total,
            categories: per_category
                .iter()
                .map(|(category, count)| (category.as_str().to_string(), *count))
                .collect(),
            complexity_score,
            intensity: round_to(f64::from(complexity_score) / total.max(1) as f64, 2),
            pattern_types: occurrences
                .iter()
                .map(|o| o.pattern_type.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            mutations: occurrences.iter().filter(|o| o.is_mutation).count(),
        }
    }
}

/// Round half away from zero to `places` decimals
/// Round to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
