use anyhow::{Context, Result};
use cljscope_analyzer::AnalyzerConfig;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Source text from a file, or from stdin when the path is `-`
pub fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read source from stdin")?;
        return Ok(buffer);
    }

    fs::read_to_string(path).with_context(|| format!("Failed to read source from {}", path.display()))
}

/// Parse and validate a TOML config; missing keys keep their defaults
pub fn load_config(path: &Path) -> Result<AnalyzerConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AnalyzerConfig =
        toml::from_str(&raw).with_context(|| format!("Invalid TOML in {}", path.display()))?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Invalid config in {}", path.display()))?;

    log::debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let file = config_file("max_transitive_depth = 5\nsnippet_chars = 40\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.max_transitive_depth, 5);
        assert_eq!(config.snippet_chars, 40);
        assert_eq!(config.preview_chars, AnalyzerConfig::default().preview_chars);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let file = config_file("max_transitive_depth = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("max_transitive_depth must be > 0"));
    }

    #[test]
    fn test_missing_source_names_path() {
        let err = read_source(Path::new("/nonexistent/core.clj")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/core.clj"));
    }
}
