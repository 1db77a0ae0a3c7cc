//! TOML-based configuration for erdprobe.
//!
//! Supports a config file (erdprobe.toml) with environment variable expansion
//! in output paths.
//!
//! Example configuration:
//! ```toml
//! [probe]
//! not_empty_sentinel = "str_placeholder"
//!
//! [params]
//! string_sentinel = "_for_g_only"
//!
//! [text]
//! table = "t_placeholder"
//! order_by = ["id", "asc", "desc"]
//! limit = [0, 10]
//!
//! [output]
//! sql = "${HOME}/dump.sql"
//! diagram = "/tmp/dump.dot"
//!
//! [sql]
//! dialect = "mysql"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Value synthesis for test expressions.
    pub probe: ProbeSettings,

    /// Parameter object defaults.
    pub params: ParamSettings,

    /// Placeholder values for `${...}` text substitutions.
    pub text: TextSettings,

    /// Output destinations.
    pub output: OutputSettings,

    /// SQL parsing.
    pub sql: SqlSettings,
}

/// Sentinels used by the probe engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Bound when a guard requires a string to differ from `''`.
    pub not_empty_sentinel: String,

    /// Text rendered for a value known only to be non-null.
    pub non_null_marker: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            not_empty_sentinel: "str_placeholder".to_string(),
            non_null_marker: "__non_null__".to_string(),
        }
    }
}

/// Parameter object defaults for INSERT-style statements.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParamSettings {
    /// Assigned to every string field.
    pub string_sentinel: String,
}

impl Default for ParamSettings {
    fn default() -> Self {
        Self {
            string_sentinel: "_for_g_only".to_string(),
        }
    }
}

/// Values bound to `${...}` placeholders by the SQL keyword preceding them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TextSettings {
    /// Table name used after `FROM`.
    pub table: String,

    /// Cycle used after `ORDER BY`: column, ascending, descending.
    pub order_by: Vec<String>,

    /// Cycle used after `LIMIT`.
    pub limit: Vec<i64>,

    /// Cycle used after `OFFSET`.
    pub offset: Vec<i64>,

    /// Predicate used after `HAVING`.
    pub having: String,

    /// Literal used inside `IN (...)`.
    pub in_value: i64,

    /// Placeholder names that always take the last value of the active cycle.
    pub order_keys: Vec<String>,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            table: "t_placeholder".to_string(),
            order_by: vec!["id".to_string(), "asc".to_string(), "desc".to_string()],
            limit: vec![0, 10],
            offset: vec![0, 10],
            having: "1 = 1".to_string(),
            in_value: 1,
            order_keys: vec!["orderType".to_string(), "orderByCreateTime".to_string()],
        }
    }
}

/// Output destinations for the batch run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Rendered SELECT statements, one per line (supports ${ENV_VAR} expansion).
    pub sql: String,

    /// Graphviz diagram (supports ${ENV_VAR} expansion).
    pub diagram: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            sql: "/tmp/dump.sql".to_string(),
            diagram: "/tmp/dump.dot".to_string(),
        }
    }
}

impl OutputSettings {
    /// Get the SQL dump path with environment variables expanded.
    pub fn sql_path(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.sql).map(PathBuf::from)
    }

    /// Get the diagram path with environment variables expanded.
    pub fn diagram_path(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.diagram).map(PathBuf::from)
    }
}

/// SQL dialect used when parsing rendered statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Generic,
    #[default]
    Mysql,
    Postgres,
}

/// SQL parsing settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SqlSettings {
    pub dialect: SqlDialect,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `ERDPROBE_CONFIG`
    /// 2. `./erdprobe.toml`
    /// 3. `~/.config/erdprobe/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("ERDPROBE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("erdprobe.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("erdprobe").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject cycles that could never yield a value.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.text.order_by.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "text.order_by must not be empty".to_string(),
            ));
        }
        if self.text.limit.is_empty() || self.text.offset.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "text.limit and text.offset must not be empty".to_string(),
            ));
        }
        if self.probe.not_empty_sentinel.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "probe.not_empty_sentinel must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
