//! Run configuration for Documentor.
//!
//! Loaded from a TOML file (`documentor.toml` by default). Every section is
//! optional; missing keys fall back to the defaults below. Command line flags
//! are applied on top by the binary.

use crate::DocumentorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "documentor.toml";

/// Top-level Documentor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentorConfig {
    pub source: SourceConfig,
    pub parser: ParserConfig,
    pub resolver: ResolverConfig,
    pub output: OutputConfig,
}

impl DocumentorConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, DocumentorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DocumentorError> {
        toml::from_str(content).map_err(|e| DocumentorError::Config(e.to_string()))
    }

    /// Load from `path` if given, else from [`DEFAULT_CONFIG_FILE`] when it
    /// exists, else defaults. An explicitly named file must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, DocumentorError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Which files under the source root are documented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Extension of eligible files, without the dot.
    pub extension: String,
    /// Regex matched against the root-relative, `/`-separated path. Matching
    /// files are skipped.
    pub exclude_pattern: String,
    /// Honour `.gitignore` files while walking.
    pub respect_gitignore: bool,
    pub follow_links: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            extension: "php".to_string(),
            exclude_pattern: r"(?i)(^|/)test[^/]*/".to_string(),
            respect_gitignore: false,
            follow_links: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Emit `private` members.
    pub include_private: bool,
    /// Parse worker threads; 0 lets the pool decide.
    pub jobs: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            include_private: true,
            jobs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Regexes for names that live outside the documented tree (the PHP
    /// runtime, vendor packages). Matched against the name without its
    /// leading `\`.
    pub external_patterns: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            external_patterns: vec![
                r"^(Psr|Symfony|Illuminate|Doctrine|PHPUnit|GuzzleHttp|Monolog)\\".to_string(),
                r"^\w*(Exception|Error)$".to_string(),
                r"^(Throwable|Traversable|Iterator|IteratorAggregate|ArrayAccess|Countable|Stringable|JsonSerializable|Serializable|Closure|Generator|WeakMap|stdClass|ArrayObject|SplObjectStorage|SplStack|SplQueue|DateTime|DateTimeImmutable|DateTimeInterface|DateInterval|DateTimeZone|PDO|PDOStatement|Reflection\w*|\w*Iterator)$".to_string(),
                r"^(array|str|mb|preg|json|spl|file|is|ctype)_\w+$".to_string(),
                r"^(count|strlen|sprintf|printf|implode|explode|trim|rtrim|ltrim|substr|strpos|stripos|strtolower|strtoupper|in_array|define|defined|dirname|basename|realpath|intval|floatval|strval|boolval|min|max|abs|round|floor|ceil|time|date|microtime|var_dump|print_r)$".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the JSON deliverables.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let config = DocumentorConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).expect("default config should serialize to TOML");
        let parsed =
            DocumentorConfig::from_toml_str(&toml_str).expect("serialized TOML should parse back");
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_toml_uses_defaults_for_missing_fields() {
        let partial = r#"
[parser]
include_private = false
"#;
        let config = DocumentorConfig::from_toml_str(partial).expect("partial TOML should parse");
        assert!(!config.parser.include_private);
        assert_eq!(config.source.extension, "php");
        assert!(!config.resolver.external_patterns.is_empty());
        assert!(config.output.pretty);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = DocumentorConfig::from_toml_str("[source\nextension=").unwrap_err();
        assert!(matches!(err, DocumentorError::Config(_)));
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let result = DocumentorConfig::load(Path::new("/nonexistent/documentor.toml"));
        assert!(matches!(result, Err(DocumentorError::Io(_))));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result =
            DocumentorConfig::load_or_default(Some(Path::new("/nonexistent/documentor.toml")));
        assert!(result.is_err());
    }
}
