//! Runtime configuration loaded from `lux.toml`

use crate::error::{CompileError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lux.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub arena: ArenaConfig,
    pub marks: MarksConfig,
    pub format: FormatConfig,
    pub log: LogConfig,
}

/// Capacities of the handle sub-ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub constants: usize,
    pub named_variables: usize,
    pub named_executables: usize,
    pub temp_variables: usize,
    pub temp_executables: usize,
}

impl ArenaConfig {
    /// Slots taken by the built-in constants (0, 1, -1, #PI, #E, #I)
    pub const MIN_CONSTANTS: usize = 6;
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            constants: 64,
            named_variables: 4096,
            named_executables: 2048,
            temp_variables: 4096,
            temp_executables: 8192,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarksConfig {
    /// Maximum number of entries on the mark stack
    pub capacity: usize,
}

impl Default for MarksConfig {
    fn default() -> Self {
        MarksConfig { capacity: 4096 }
    }
}

/// printf-style patterns used for numeric to string conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub integer: String,
    pub float: String,
    /// Applied to each part of a complex value
    pub complex: String,
    /// Applied when text is converted to string
    pub string: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            integer: "%1d".to_string(),
            float: "%.7g".to_string(),
            complex: "%.7g".to_string(),
            string: "%s".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "warn".to_string(),
        }
    }
}

impl LogConfig {
    /// Parsed level; unknown names fall back to `Warn`
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Warn)
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| CompileError::config_error(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the symbol table cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.arena.constants < ArenaConfig::MIN_CONSTANTS {
            return Err(CompileError::config_error(format!(
                "arena.constants = {} leaves no room for the {} built-in constants",
                self.arena.constants,
                ArenaConfig::MIN_CONSTANTS
            )));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io_error(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Loads `path` if given, else `lux.toml` when present, else defaults
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
