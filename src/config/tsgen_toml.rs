//! Parsing and validation for tsgen.toml configuration files

use crate::build_tool::DEFAULT_BUILD_TOOL;
use crate::error::ConfigError;
use crate::types::{GlobPattern, Label, Location};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main configuration struct for tsgen.toml
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// tsgen metadata
    #[serde(default)]
    pub tsgen: TsgenMeta,

    /// Symbol resolution settings
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// External npm packages
    #[serde(default)]
    pub npm: NpmConfig,

    /// External build tool
    #[serde(default)]
    pub tool: ToolConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                "{} not found, using default configuration",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.tsgen.version != "1" {
            return Err(ConfigError::Validation(format!(
                "Unsupported configuration version '{}'. Expected '1'",
                self.tsgen.version
            )));
        }

        self.exclude_matcher()?;

        for (token, label) in &self.resolve.overrides {
            if Label::parse(label).is_none() {
                return Err(ConfigError::Validation(format!(
                    "Invalid override label '{}' for '{}': expected //<location>:<name>",
                    label, token
                )));
            }
        }

        if self.tool.build_tool.trim().is_empty() {
            return Err(ConfigError::Validation(
                "[tool] build_tool must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Compiles the exclude patterns into a matcher
    pub fn exclude_matcher(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.tsgen.exclude {
            let glob = Glob::new(pattern.as_str()).map_err(|e| {
                ConfigError::Validation(format!(
                    "Invalid exclude glob pattern '{}': {}",
                    pattern.as_str(),
                    e
                ))
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| {
            ConfigError::Validation(format!("Failed to build exclude patterns: {}", e))
        })
    }

    /// Override table with parsed labels
    ///
    /// Entries that fail to parse are skipped; [`Config::parse`] rejects them.
    pub fn override_labels(&self) -> HashMap<String, Label> {
        self.resolve
            .overrides
            .iter()
            .filter_map(|(token, label)| Label::parse(label).map(|label| (token.clone(), label)))
            .collect()
    }
}

/// tsgen metadata section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsgenMeta {
    /// Configuration version (must be "1")
    #[serde(default = "default_version")]
    pub version: String,

    /// Locations to skip entirely
    #[serde(default)]
    pub exclude: Vec<GlobPattern>,
}

fn default_version() -> String {
    "1".to_string()
}

impl Default for TsgenMeta {
    fn default() -> Self {
        Self {
            version: default_version(),
            exclude: Vec::new(),
        }
    }
}

/// What to do when several rules provide the same symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Leave the token unresolved and report every candidate
    #[default]
    Report,
    /// Pick the candidate sharing the longest path prefix with the importer
    Closest,
}

/// Symbol resolution section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default)]
    pub ambiguity: AmbiguityPolicy,

    /// Fail the run when any token is left unresolved
    #[serde(default)]
    pub fail_on_unresolved: bool,

    /// Fail the run when more than this many tokens are unresolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unresolved: Option<usize>,

    /// Token to label mappings applied before the index is consulted
    #[serde(default)]
    pub overrides: IndexMap<String, String>,
}

/// npm packages linked into the workspace
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NpmConfig {
    #[serde(default)]
    pub packages: Vec<String>,

    /// Location of the `npm_link_all_packages` rule
    #[serde(default)]
    pub link_location: Location,
}

/// External build tool section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_build_tool")]
    pub build_tool: String,
}

fn default_build_tool() -> String {
    DEFAULT_BUILD_TOOL.to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            build_tool: default_build_tool(),
        }
    }
}

/// Output configuration section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON Lines format
    Jsonl,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
[tsgen]
version = "1"
exclude = ["**/node_modules/**", "vendor/**"]

[resolve]
ambiguity = "closest"
fail_on_unresolved = true
max_unresolved = 3

[resolve.overrides]
"lodash" = "//third_party:lodash"
"@acme/ui" = "//packages/ui:pkg"

[npm]
packages = ["react", "@types/node"]
link_location = "."

[tool]
build_tool = "bazelisk"

[output]
format = "jsonl"
"#;

    #[test]
    fn test_valid_config_parsing() {
        let config = Config::parse(VALID_CONFIG).unwrap();

        assert_eq!(config.tsgen.version, "1");
        assert_eq!(config.tsgen.exclude.len(), 2);
        assert_eq!(config.resolve.ambiguity, AmbiguityPolicy::Closest);
        assert!(config.resolve.fail_on_unresolved);
        assert_eq!(config.resolve.max_unresolved, Some(3));
        assert_eq!(config.npm.packages, vec!["react", "@types/node"]);
        assert!(config.npm.link_location.is_root());
        assert_eq!(config.tool.build_tool, "bazelisk");
        assert_eq!(config.output.format, OutputFormat::Jsonl);

        let overrides = config.override_labels();
        assert_eq!(
            overrides.get("lodash").map(|l| l.to_string()),
            Some("//third_party:lodash".to_string())
        );
    }

    #[test]
    fn test_default_build_tool_matches_build_tool_default() {
        let tool = crate::build_tool::BuildTool::default();
        assert_eq!(ToolConfig::default().build_tool, tool.program());
        let config = Config::parse("[tool]\n").unwrap();
        assert_eq!(config.tool.build_tool, DEFAULT_BUILD_TOOL);
    }

    #[test]
    fn test_minimal_config() {
        let config = Config::parse("[tsgen]\nversion = \"1\"\n").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tool.build_tool, DEFAULT_BUILD_TOOL);
        assert_eq!(config.resolve.ambiguity, AmbiguityPolicy::Report);
        assert_eq!(config.output.format, OutputFormat::Human);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_version() {
        let result = Config::parse("[tsgen]\nversion = \"2\"\n");
        match result {
            Err(ConfigError::Validation(msg)) => {
                assert!(msg.contains("Unsupported configuration version"))
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_exclude_glob() {
        let result = Config::parse("[tsgen]\nexclude = [\"[unclosed\"]\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_override_label() {
        let config = r#"
[resolve.overrides]
"lodash" = "lodash"
"#;
        match Config::parse(config) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("lodash")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_ambiguity_policy() {
        let result = Config::parse("[resolve]\nambiguity = \"first\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_exclude_matcher() {
        let config = Config::parse("[tsgen]\nexclude = [\"vendor/**\"]\n").unwrap();
        let matcher = config.exclude_matcher().unwrap();
        assert!(matcher.is_match("vendor/lib"));
        assert!(!matcher.is_match("src/lib"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("tsgen.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsgen.toml");
        std::fs::write(&path, "[tool]\nbuild_tool = \"bazelisk\"\n").unwrap();
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.tool.build_tool, "bazelisk");
    }
}
