//! Translator configuration.
//!
//! Read from TOML. [`Config::load`] looks at `$HANA_TRANSLATOR_CONFIG`
//! first, then `hana-translator/config.toml` under the user config
//! directory, and falls back to the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ast::NoteCategory;
use crate::error::{TranslateError, TranslateResult};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "HANA_TRANSLATOR_CONFIG";

/// Main translator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Indent and wrap the output instead of one statement per line
    pub format_output: bool,

    /// Write translation notes into the output as comments
    pub translation_comments: bool,

    /// Drop the default schema from object names
    pub remove_default_schema: bool,

    /// Schema treated as default, `dbo` for SQL Server
    pub default_schema: String,

    /// Note categories counted in the summary
    pub result_summary_filter: Vec<NoteCategory>,

    /// Note categories written into the output
    pub translation_comments_filter: Vec<NoteCategory>,

    /// Patterns of placeholders that stand for identifiers
    pub id_tokens: Vec<String>,

    /// Patterns of placeholders that stand for variables
    pub var_tokens: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format_output: false,
            translation_comments: true,
            remove_default_schema: false,
            default_schema: "dbo".to_string(),
            result_summary_filter: vec![
                NoteCategory::IdentifierFix,
                NoteCategory::IdentifierError,
                NoteCategory::Rendering,
                NoteCategory::RewriteError,
            ],
            translation_comments_filter: vec![
                NoteCategory::IdentifierFix,
                NoteCategory::IdentifierError,
                NoteCategory::Rendering,
                NoteCategory::Rewrite,
                NoteCategory::RewriteError,
            ],
            // Format holes such as {0}, {0:##} or {obj.DocNum}
            id_tokens: vec![r"\{[0-9A-Za-z_,.\-:]+\}".to_string()],
            var_tokens: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> TranslateResult<Self> {
        toml::from_str(text).map_err(|e| TranslateError::Config(e.to_string()))
    }

    /// Read a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> TranslateResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hana-translator").join("config.toml"))
    }

    /// Config from `$HANA_TRANSLATOR_CONFIG`, else the default path if the
    /// file exists, else the defaults.
    pub fn load() -> TranslateResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(path),
            _ => {
                tracing::debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn to_toml(&self) -> TranslateResult<String> {
        toml::to_string_pretty(self).map_err(|e| TranslateError::Config(e.to_string()))
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Indented output
    pub fn pretty(mut self, on: bool) -> Self {
        self.config.format_output = on;
        self
    }

    /// Notes as comments in the output
    pub fn comments(mut self, on: bool) -> Self {
        self.config.translation_comments = on;
        self
    }

    /// Remove the default schema from names
    pub fn remove_default_schema(mut self, on: bool) -> Self {
        self.config.remove_default_schema = on;
        self
    }

    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.config.default_schema = schema.into();
        self
    }

    pub fn summary_filter(mut self, categories: impl IntoIterator<Item = NoteCategory>) -> Self {
        self.config.result_summary_filter = categories.into_iter().collect();
        self
    }

    pub fn comments_filter(mut self, categories: impl IntoIterator<Item = NoteCategory>) -> Self {
        self.config.translation_comments_filter = categories.into_iter().collect();
        self
    }

    /// Add an identifier placeholder pattern
    pub fn id_token(mut self, pattern: impl Into<String>) -> Self {
        self.config.id_tokens.push(pattern.into());
        self
    }

    /// Add a variable placeholder pattern
    pub fn var_token(mut self, pattern: impl Into<String>) -> Self {
        self.config.var_tokens.push(pattern.into());
        self
    }

    /// Drop every placeholder pattern
    pub fn no_tokens(mut self) -> Self {
        self.config.id_tokens.clear();
        self.config.var_tokens.clear();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            format_output = true
            remove_default_schema = true
            result_summary_filter = ["rewrite_error"]
            "#,
        )
        .unwrap();
        assert!(config.format_output);
        assert!(config.remove_default_schema);
        assert_eq!(config.default_schema, "dbo");
        assert_eq!(config.result_summary_filter, vec![NoteCategory::RewriteError]);
        assert_eq!(config.id_tokens.len(), 1);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml("format_output = 3").unwrap_err();
        assert!(matches!(err, TranslateError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .pretty(true)
            .comments(false)
            .remove_default_schema(true)
            .no_tokens()
            .var_token(r"\[TABLE[0-9]+\]")
            .build();
        assert!(config.format_output);
        assert!(!config.translation_comments);
        assert!(config.id_tokens.is_empty());
        assert_eq!(config.var_tokens, vec![r"\[TABLE[0-9]+\]".to_string()]);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::builder().default_schema("sales").build();
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
