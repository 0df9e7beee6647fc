//! Configuration file loading and parsing.

use crate::catalog::TypeCatalog;
use crate::types::WardenConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// File name looked up inside the project directory.
pub const CONFIG_FILE_NAME: &str = "warden.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error("pipeline name \"{name}\" is invalid, use only alphanumeric characters and underscores")]
    InvalidPipelineName { name: String },

    #[error("pipeline \"{pipeline}\": \"{first}\" and \"{second}\" cannot both be set")]
    ConflictingLists {
        pipeline: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("pipeline \"{pipeline}\", {category}: \"{value}\" is listed more than once")]
    DuplicateEntry {
        pipeline: String,
        category: &'static str,
        value: String,
    },

    #[error("pipeline \"{pipeline}\", {category}: wildcard type needs at least one field")]
    MissingWildcardFields {
        pipeline: String,
        category: &'static str,
    },

    #[error("pipeline \"{pipeline}\", {category}: \"{value}\" is not a valid type name")]
    InvalidTypeName {
        pipeline: String,
        category: &'static str,
        value: String,
    },

    #[error("pipeline \"{pipeline}\", {category}: field \"{value}\" of \"{type_name}\" is not a valid field name")]
    InvalidFieldName {
        pipeline: String,
        category: &'static str,
        type_name: String,
        value: String,
    },

    #[error("pipeline \"{pipeline}\", {category}: unknown type \"{value}\"")]
    UnknownType {
        pipeline: String,
        category: &'static str,
        value: String,
    },

    #[error("pipeline \"{pipeline}\", {category}: type \"{type_name}\" has no field \"{value}\"")]
    UnknownField {
        pipeline: String,
        category: &'static str,
        type_name: String,
        value: String,
    },
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
    catalog: Option<TypeCatalog>,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
            catalog: None,
        }
    }

    /// Check filter lists against a catalog of known types.
    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Load configuration from `warden.yaml`, or defaults when it is absent.
    pub fn load(&self) -> Result<WardenConfig, ConfigError> {
        let config_path = self.base_path.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(WardenConfig::default());
        }
        self.load_file(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<WardenConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        self.parse(&contents)
    }

    /// Parse and validate configuration text.
    pub fn parse(&self, contents: &str) -> Result<WardenConfig, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        let config: WardenConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        config.validate(self.catalog.as_ref())?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("valid env var regex"))
}

/// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for cap in env_var_re().captures_iter(content) {
        let Some(whole) = cap.get(0) else { continue };
        let var_name = &cap[1];

        let value = match std::env::var(var_name) {
            Ok(v) => v,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    })
                }
            },
        };

        result.push_str(&content[last..whole.start()]);
        result.push_str(&value);
        last = whole.end();
    }

    result.push_str(&content[last..]);
    Ok(result)
}
