//! Configuration file support for p2-sbom.
//!
//! Provides YAML-based configuration through `p2-sbom.config.yml` files,
//! including data structures, file loading, and validation.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use p2_sbom::shared::Result;

pub const CONFIG_FILENAME: &str = "p2-sbom.config.yml";

/// Top-level configuration file schema.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub cache_dir: Option<PathBuf>,
    pub central_search: Option<bool>,
    pub fetch_advisory: Option<bool>,
    pub fetch_clearly_defined: Option<bool>,
    pub process_bundle_classpath: Option<bool>,
    pub verbose: Option<bool>,
    pub requirement_inclusions: Option<Vec<String>>,
    pub requirement_exclusions: Option<Vec<String>>,
    pub expected_missing_artifact_patterns: Option<Vec<String>>,
    pub redirections: Option<Vec<String>>,
    pub xml_output: Option<PathBuf>,
    pub json_output: Option<PathBuf>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(ref redirections) = config.redirections {
        for (i, entry) in redirections.iter().enumerate() {
            if !entry.contains("->") {
                bail!(
                    "Invalid config: redirections[{}] must have the form 'source->target'.\n\n\
                     💡 Hint: e.g. \"https://mirror.example.org/releases->https://download.example.org/releases\"",
                    i
                );
            }
        }
    }
    if let Some(ref patterns) = config.expected_missing_artifact_patterns {
        for (i, pattern) in patterns.iter().enumerate() {
            if pattern.trim().is_empty() {
                bail!(
                    "Invalid config: expected_missing_artifact_patterns[{}] must not be empty.\n\n\
                     💡 Hint: Patterns are regular expressions over 'id:version'.",
                    i
                );
            }
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
cache_dir: /var/cache/p2-sbom
central_search: true
fetch_advisory: false
process_bundle_classpath: true
requirement_inclusions:
  - osgi.os=linux,osgi.arch=x86_64
expected_missing_artifact_patterns:
  - "org\\.example\\..*:.*"
redirections:
  - "https://mirror.example.org/releases->https://download.example.org/releases"
xml_output: out/sbom.xml
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/p2-sbom")));
        assert_eq!(config.central_search, Some(true));
        assert_eq!(config.fetch_advisory, Some(false));
        assert_eq!(config.fetch_clearly_defined, None);
        assert_eq!(config.process_bundle_classpath, Some(true));
        assert_eq!(
            config.requirement_inclusions.as_deref(),
            Some(&["osgi.os=linux,osgi.arch=x86_64".to_string()][..])
        );
        assert_eq!(
            config.expected_missing_artifact_patterns.as_deref(),
            Some(&[r"org\.example\..*:.*".to_string()][..])
        );
        assert_eq!(config.redirections.unwrap().len(), 1);
        assert_eq!(config.xml_output, Some(PathBuf::from("out/sbom.xml")));
        assert!(config.json_output.is_none());
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
verbose: true
fetch_clearly_defined: false
"#,
        )
        .unwrap();

        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_some());
        let config = config.unwrap();
        assert_eq!(config.verbose, Some(true));
        assert_eq!(config.fetch_clearly_defined, Some(false));
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/config.yml"));
        assert!(result.is_err());
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("bad.yml");
        fs::write(&config_path, "invalid: yaml: [[[broken").unwrap();

        let result = load_config_from_path(&config_path);
        assert!(result.is_err());
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_redirection_without_arrow_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
redirections:
  - "https://mirror.example.org/releases"
"#,
        )
        .unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("redirections[0]"));
        assert!(err.contains("source->target"));
    }

    #[test]
    fn test_blank_pattern_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
expected_missing_artifact_patterns:
  - "   "
"#,
        )
        .unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("must not be empty"));
    }

    #[test]
    fn test_unknown_fields_warning() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
verbose: true
unknown_field: true
another_unknown: value
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.unknown_fields.len(), 2);
        assert!(config.unknown_fields.contains_key("unknown_field"));
        assert!(config.unknown_fields.contains_key("another_unknown"));
    }

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert!(config.cache_dir.is_none());
        assert!(config.central_search.is_none());
        assert!(config.redirections.is_none());
        assert!(config.xml_output.is_none());
        assert!(config.unknown_fields.is_empty());
    }
}
