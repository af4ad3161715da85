//! Process-level settings read from the environment.
//!
//! Game parameters live in `flexgrid-config.yaml`; these knobs only control
//! how the headless runner hosts the game.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::EngineError;

/// Default location of the game configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "flexgrid-config.yaml";

/// How the runner hosts one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Path of the YAML game configuration.
    pub config_path: PathBuf,
    /// Whether the built-in autopilot steers the tools.
    pub autopilot: bool,
    /// Wall-clock limit; `None` runs until game over or Ctrl+C.
    pub max_real_time: Option<Duration>,
}

impl RunSettings {
    /// Load settings from environment variables.
    ///
    /// Optional variables:
    /// - `FLEXGRID_CONFIG` -- path to the game config (default `flexgrid-config.yaml`)
    /// - `FLEXGRID_AUTOPILOT` -- let the autopilot steer the tools (default `true`)
    /// - `FLEXGRID_MAX_SECONDS` -- wall-clock limit in seconds, 0 = unlimited (default `0`)
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
        let config_path = lookup("FLEXGRID_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

        let autopilot: bool = lookup("FLEXGRID_AUTOPILOT")
            .unwrap_or_else(|| "true".to_owned())
            .parse()
            .map_err(|e| EngineError::Env {
                message: format!("invalid FLEXGRID_AUTOPILOT: {e}"),
            })?;

        let max_seconds: u64 = lookup("FLEXGRID_MAX_SECONDS")
            .unwrap_or_else(|| "0".to_owned())
            .parse()
            .map_err(|e| EngineError::Env {
                message: format!("invalid FLEXGRID_MAX_SECONDS: {e}"),
            })?;

        Ok(Self {
            config_path,
            autopilot,
            max_real_time: (max_seconds > 0).then(|| Duration::from_secs(max_seconds)),
        })
    }
}
