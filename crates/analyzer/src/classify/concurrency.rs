//! core.async usage.

use super::{Category, Classifier, ClassifierRule, Tally};
use crate::types::ClassifiedOccurrence;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyCategory {
    AsyncBlocks,
    ChannelCreation,
    ChannelIo,
    ChannelSelection,
    ChannelUtilities,
    CoordinationUtilities,
}

impl ConcurrencyCategory {
    /// Channel-level categories (everything except blocks and coordination)
    pub const fn is_channel_operation(&self) -> bool {
        matches!(
            self,
            Self::ChannelCreation | Self::ChannelIo | Self::ChannelSelection | Self::ChannelUtilities
        )
    }
}

impl Category for ConcurrencyCategory {
    fn as_str(&self) -> &'static str {
        match self {
            Self::AsyncBlocks => "async_blocks",
            Self::ChannelCreation => "channel_creation",
            Self::ChannelIo => "channel_io",
            Self::ChannelSelection => "channel_selection",
            Self::ChannelUtilities => "channel_utilities",
            Self::CoordinationUtilities => "coordination_utilities",
        }
    }

    fn weight(&self) -> u32 {
        match self {
            Self::AsyncBlocks => 3,
            Self::ChannelCreation => 2,
            Self::ChannelIo => 2,
            Self::ChannelSelection => 4,
            Self::ChannelUtilities => 1,
            Self::CoordinationUtilities => 2,
        }
    }
}

pub type ConcurrencyOccurrence = ClassifiedOccurrence<ConcurrencyCategory>;

const RULES: &[ClassifierRule<ConcurrencyCategory>] = {
    use ConcurrencyCategory::*;
    &[
        ClassifierRule::new("go", "go_block", AsyncBlocks),
        ClassifierRule::new("go-loop", "go_loop", AsyncBlocks),
        ClassifierRule::new("chan", "channel_creation", ChannelCreation).space_optional(),
        ClassifierRule::new("buffer", "buffer_creation", ChannelCreation),
        ClassifierRule::new("dropping-buffer", "dropping_buffer", ChannelCreation),
        ClassifierRule::new("sliding-buffer", "sliding_buffer", ChannelCreation),
        ClassifierRule::new(">!", "channel_put_blocking", ChannelIo),
        ClassifierRule::new(">!!", "channel_put_blocking_sync", ChannelIo),
        ClassifierRule::new("<!", "channel_take_blocking", ChannelIo),
        ClassifierRule::new("<!!", "channel_take_blocking_sync", ChannelIo),
        ClassifierRule::new("alt!", "alt_blocking", ChannelSelection),
        ClassifierRule::new("alts!", "alts_blocking", ChannelSelection),
        ClassifierRule::new("alt!!", "alt_blocking_sync", ChannelSelection),
        ClassifierRule::new("alts!!", "alts_blocking_sync", ChannelSelection),
        ClassifierRule::new("close!", "channel_close", ChannelUtilities),
        ClassifierRule::new("pipe", "channel_pipe", ChannelUtilities),
        ClassifierRule::new("split", "channel_split", ChannelUtilities),
        ClassifierRule::new("mult", "channel_mult", ChannelUtilities),
        ClassifierRule::new("tap", "channel_tap", ChannelUtilities),
        ClassifierRule::new("untap", "channel_untap", ChannelUtilities),
        ClassifierRule::new("pub", "channel_pub", ChannelUtilities),
        ClassifierRule::new("sub", "channel_sub", ChannelUtilities),
        ClassifierRule::new("unsub", "channel_unsub", ChannelUtilities),
        ClassifierRule::new("thread", "thread_block", CoordinationUtilities),
        ClassifierRule::new("timeout", "timeout_channel", CoordinationUtilities),
        ClassifierRule::new("onto-chan", "onto_chan", CoordinationUtilities),
        ClassifierRule::new("to-chan", "to_chan", CoordinationUtilities),
        ClassifierRule::new("reduce", "channel_reduce", CoordinationUtilities),
        ClassifierRule::new("transduce", "channel_transduce", CoordinationUtilities),
    ]
};

pub(crate) static CLASSIFIER: Lazy<Classifier<ConcurrencyCategory>> =
    Lazy::new(|| Classifier::new(RULES).expect("valid concurrency keyword table"));

/// Aggregate core.async usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcurrencySummary {
    pub total_patterns: usize,
    pub categories: BTreeMap<String, usize>,
    pub has_async: bool,
    pub complexity_score: u32,
    pub async_intensity: f64,
    pub pattern_types: Vec<String>,
}

impl ConcurrencySummary {
    pub fn from_occurrences(occurrences: &[ConcurrencyOccurrence]) -> Self {
        let tally = Tally::of(occurrences);
        Self {
            total_patterns: tally.total,
            categories: tally.categories,
            has_async: tally.total > 0,
            complexity_score: tally.complexity_score,
            async_intensity: tally.intensity,
            pattern_types: tally.pattern_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::NameFilter;
    use crate::source::SourceText;
    use pretty_assertions::assert_eq;

    const CODE: &str = r#"(defn worker [in out]
  (go-loop []
    (let [v (<! in)]
      (>! out (inc v))
      (recur))))

(defn pick [a b]
  (alts!! [a b (timeout 100)]))

(def c (chan))"#;

    #[test]
    fn test_classifies_core_async_usage() {
        let source = SourceText::new(CODE);
        let found = CLASSIFIER.classify(&source, None);
        let types: Vec<_> = found.iter().map(|o| o.pattern_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "go_loop",
                "channel_take_blocking",
                "channel_put_blocking",
                "alts_blocking_sync",
                "timeout_channel",
                "channel_creation"
            ]
        );
        assert_eq!(found[0].start_line, 2);
        assert_eq!(found[0].end_line, 5);
    }

    #[test]
    fn test_summary_scores() {
        let source = SourceText::new(CODE);
        let summary = ConcurrencySummary::from_occurrences(&CLASSIFIER.classify(&source, None));
        assert_eq!(summary.total_patterns, 6);
        assert!(summary.has_async);
        // go-loop 3, <! 2, >! 2, alts!! 4, timeout 2, chan 2
        assert_eq!(summary.complexity_score, 15);
        assert_eq!(summary.async_intensity, 2.5);
        assert_eq!(summary.categories["channel_io"], 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = ConcurrencySummary::from_occurrences(&[]);
        assert_eq!(summary.total_patterns, 0);
        assert!(!summary.has_async);
        assert_eq!(summary.async_intensity, 0.0);
    }

    #[test]
    fn test_filter_on_pattern_type() {
        let source = SourceText::new(CODE);
        let filter = NameFilter::pattern("channel_").unwrap();
        let found = CLASSIFIER.classify(&source, Some(&filter));
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|o| o.category.is_channel_operation()));
    }
}
