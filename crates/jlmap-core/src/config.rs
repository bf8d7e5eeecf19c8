//! Configuration loading and validation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Top-level JLMap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "jlmap_bridge=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Reject scripts with unterminated strings or unbalanced brackets
    /// before they reach the engine (default: true).
    #[serde(default = "default_true")]
    pub validate_scripts: bool,

    /// Log every outgoing script at trace level (default: false).
    #[serde(default)]
    pub trace_scripts: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            validate_scripts: true,
            trace_scripts: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Expression the generated script uses to reach the live map
    /// (default: "this.map").
    #[serde(default = "default_map_binding")]
    pub binding: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            binding: default_map_binding(),
        }
    }
}

pub fn default_map_binding() -> String {
    "this.map".into()
}

static BINDING_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").expect("static regex")
});

/// Check that `binding` is a dotted identifier path such as `this.map`.
pub fn check_map_binding(binding: &str) -> crate::error::Result<()> {
    if BINDING_PATH.is_match(binding) {
        return Ok(());
    }
    Err(crate::error::JlMapError::Config(format!(
        "Map binding '{binding}' is not a dotted identifier path"
    )))
}

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    ENV_REF
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .into_owned()
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::JlMapError::Io)?;

        // Substitute ${ENV_VAR} references before parsing
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::JlMapError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file path.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json5")
    }

    pub fn map_binding(&self) -> String {
        self.map
            .as_ref()
            .map(|m| m.binding.clone())
            .unwrap_or_else(default_map_binding)
    }

    pub fn transport(&self) -> TransportConfig {
        self.transport.clone().unwrap_or_default()
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if let Some(map) = &self.map {
            if let Err(crate::error::JlMapError::Config(message)) = check_map_binding(&map.binding) {
                errors.push(message);
            }
        }

        if let Some(logging) = &self.logging {
            if logging.format != "plain" && logging.format != "json" {
                errors.push(format!("Unknown log format '{}'", logging.format));
            }
            if logging.output != "stderr" && logging.output != "stdout" {
                errors.push(format!("Unknown log output '{}'", logging.output));
            }
            if let Some(level) = &logging.level {
                if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                    warnings.push(format!("Unknown log level '{level}', falling back to info"));
                }
            }
        }

        if let Some(transport) = &self.transport {
            if !transport.validate_scripts {
                warnings.push(
                    "Script validation is disabled; malformed scripts will reach the engine"
                        .to_string(),
                );
            }
        }

        (warnings, errors)
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Base directory for JLMap data: `~/.jlmap/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jlmap")
}
