//! Loading session settings from JSON.
//!
//! Missing fields take their defaults. A file that parses but fails
//! validation is rejected with every problem listed.

use std::path::Path;

use ferry_logic::settings::{validate_settings, Settings, SettingsError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid(Vec<SettingsError>),
}

pub fn parse_settings(text: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = serde_json::from_str(text)?;
    let problems = validate_settings(&settings);
    if !problems.is_empty() {
        return Err(ConfigError::Invalid(problems));
    }
    Ok(settings)
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let settings = parse_settings(&text)?;
    log::info!("loaded settings from {}", path.display());
    Ok(settings)
}
