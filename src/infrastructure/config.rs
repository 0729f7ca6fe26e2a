use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming the TOML configuration file.
pub const CONFIG_ENV: &str = "MPY_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub python: PythonConfig,

    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    /// Directories prepended to `sys.path` when the bridge starts.
    #[serde(default)]
    pub sys_path: Vec<String>,

    /// Source executed in the shared namespace right after it is created.
    #[serde(default)]
    pub startup: Option<String>,

    /// `__name__` seen by code running in the shared namespace.
    #[serde(default = "default_namespace_name")]
    pub namespace_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// trace, debug, info, warn or error
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Daily-rolled log file; stderr when unset.
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            sys_path: Vec::new(),
            startup: None,
            namespace_name: default_namespace_name(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::Compact,
            file: None,
        }
    }
}

fn default_namespace_name() -> String { "__mpy__".to_string() }
fn default_level() -> String { "warn".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Load from `$MPY_CONFIG`, falling back to defaults.
    ///
    /// The host cannot act on a config error, so a bad file is reported and
    /// ignored rather than failing the call that triggered initialization.
    pub fn discover() -> (Self, Option<String>) {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => match Self::load(Path::new(&path)) {
                Ok(config) => (config, None),
                Err(problem) => (Self::default(), Some(problem)),
            },
            None => (Self::default(), None),
        }
    }
}
