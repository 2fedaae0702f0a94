use serde::{Deserialize, Serialize};

/// Tunable limits and thresholds for the analysis engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum hops followed when expanding transitive namespace dependencies
    pub max_transitive_depth: usize,

    /// Characters kept in idiom code snippets before eliding with "..."
    pub snippet_chars: usize,

    /// Characters kept in navigation previews before eliding with "..."
    pub preview_chars: usize,

    /// Characters sampled after a `cond` head to estimate its branch count
    pub cond_sample_chars: usize,

    /// Characters of a namespace declaration shown in target analysis
    pub declaration_preview_chars: usize,

    /// Destructuring complexity above which a cursor report suggests splitting
    pub complex_destructuring_threshold: usize,

    /// State mutations above which a cursor report suggests transaction boundaries
    pub mutation_threshold: usize,

    /// Threading steps at which a threading chain counts as a strong idiom
    pub high_step_threshold: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_transitive_depth: 3,
            snippet_chars: 100,
            preview_chars: 50,
            cond_sample_chars: 200,
            declaration_preview_chars: 200,
            complex_destructuring_threshold: 5,
            mutation_threshold: 3,
            high_step_threshold: 3,
        }
    }
}

impl AnalyzerConfig {
    /// Config that flags smaller constructs (code review)
    pub fn strict() -> Self {
        Self {
            complex_destructuring_threshold: 3,
            mutation_threshold: 1,
            high_step_threshold: 2,
            ..Default::default()
        }
    }

    /// Config that only flags large constructs (legacy code bases)
    pub fn lenient() -> Self {
        Self {
            complex_destructuring_threshold: 10,
            mutation_threshold: 8,
            high_step_threshold: 5,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_transitive_depth == 0 {
            return Err("max_transitive_depth must be > 0".to_string());
        }

        if self.snippet_chars == 0 || self.preview_chars == 0 {
            return Err("snippet_chars and preview_chars must be > 0".to_string());
        }

        if self.cond_sample_chars == 0 {
            return Err("cond_sample_chars must be > 0".to_string());
        }

        if self.high_step_threshold == 0 {
            return Err("high_step_threshold must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        assert!(AnalyzerConfig::strict().validate().is_ok());
        assert!(AnalyzerConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = AnalyzerConfig {
            max_transitive_depth: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("max_transitive_depth"), "got: {err}");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"mutation_threshold": 7}"#).unwrap();
        assert_eq!(config.mutation_threshold, 7);
        assert_eq!(config.max_transitive_depth, 3);
        assert_eq!(config.snippet_chars, 100);
    }
}
