use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::{ModuleError, ModuleResult};

pub const ENV_LOG_LEVEL: &str = "TETHER_LOG_LEVEL";
pub const ENV_REPORT_LEAKS: &str = "TETHER_REPORT_LEAKS";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Install a stderr subscriber at this level on init. `None` leaves
    /// logging to the embedding process.
    pub log_level: Option<String>,
    /// Warn at teardown when wrappers are still live.
    pub report_leaks: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            report_leaks: true,
        }
    }
}

impl ModuleConfig {
    pub fn from_toml_str(s: &str) -> ModuleResult<Self> {
        toml::from_str(s).map_err(|e| ModuleError::Config(e.to_string()))
    }

    /// Defaults overridden by `TETHER_LOG_LEVEL` and `TETHER_REPORT_LEAKS`.
    pub fn from_env() -> ModuleResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ModuleResult<Self> {
        let mut config = Self::default();
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            config.log_level = Some(level.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_REPORT_LEAKS) {
            config.report_leaks = parse_bool(&raw).ok_or_else(|| {
                ModuleError::Config(format!("{ENV_REPORT_LEAKS}: not a boolean: {raw:?}"))
            })?;
        }
        config.level()?;
        Ok(config)
    }

    /// The parsed log level, if one is configured.
    pub fn level(&self) -> ModuleResult<Option<Level>> {
        self.log_level
            .as_deref()
            .map(|s| {
                Level::from_str(s).map_err(|_| ModuleError::Config(format!("bad log level: {s:?}")))
            })
            .transpose()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
