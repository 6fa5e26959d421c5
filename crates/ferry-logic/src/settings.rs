//! Session settings and their validation.

use serde::{Deserialize, Serialize};

/// Tunable values for a ferry session. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds of game time between recorder and scheduler ticks.
    pub tick_interval_secs: f64,
    /// Body missions launch from. Transport targets must orbit it.
    pub home_body: String,
    /// Free capacities below this are ignored; fills closer than this snap to full.
    pub resource_epsilon: f64,
    /// Distance ahead of a space dock at which constructed vessels appear, in meters.
    pub construct_follow_distance_m: f64,
    /// Maximum random phase offset applied to spawned vessels, in radians.
    pub spawn_phase_jitter: f64,
    /// Profile name used when the requested one is blank.
    pub fallback_profile_name: String,
    /// Landed-at locations that count as pre-launch.
    pub launch_sites: Vec<String>,
    /// Seed for spawned vessel ids and placement. Random when unset.
    pub rng_seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1.0,
            home_body: "Kerbin".to_string(),
            resource_epsilon: 0.01,
            construct_follow_distance_m: 100.0,
            spawn_phase_jitter: 0.001,
            fallback_profile_name: "Ferry".to_string(),
            launch_sites: vec!["Runway".to_string(), "LaunchPad".to_string()],
            rng_seed: None,
        }
    }
}

impl Settings {
    pub fn is_launch_site(&self, location: &str) -> bool {
        self.launch_sites.iter().any(|site| site == location)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("tick interval must be positive, got {0}")]
    NonPositiveTick(f64),
    #[error("home body name is empty")]
    EmptyHomeBody,
    #[error("resource epsilon must not be negative, got {0}")]
    NegativeEpsilon(f64),
    #[error("construction follow distance must not be negative, got {0}")]
    NegativeFollowDistance(f64),
    #[error("spawn phase jitter must not be negative, got {0}")]
    NegativeJitter(f64),
    #[error("fallback profile name is empty")]
    EmptyFallbackName,
}

/// Validate settings, returning all errors found.
pub fn validate_settings(settings: &Settings) -> Vec<SettingsError> {
    let mut errors = Vec::new();

    if settings.tick_interval_secs.is_nan() || settings.tick_interval_secs <= 0.0 {
        errors.push(SettingsError::NonPositiveTick(settings.tick_interval_secs));
    }
    if settings.home_body.trim().is_empty() {
        errors.push(SettingsError::EmptyHomeBody);
    }
    if settings.resource_epsilon < 0.0 {
        errors.push(SettingsError::NegativeEpsilon(settings.resource_epsilon));
    }
    if settings.construct_follow_distance_m < 0.0 {
        errors.push(SettingsError::NegativeFollowDistance(
            settings.construct_follow_distance_m,
        ));
    }
    if settings.spawn_phase_jitter < 0.0 {
        errors.push(SettingsError::NegativeJitter(settings.spawn_phase_jitter));
    }
    if settings.fallback_profile_name.trim().is_empty() {
        errors.push(SettingsError::EmptyFallbackName);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&Settings::default()).is_empty());
    }

    #[test]
    fn test_collects_every_error() {
        let settings = Settings {
            tick_interval_secs: 0.0,
            home_body: " ".into(),
            resource_epsilon: -1.0,
            fallback_profile_name: String::new(),
            ..Settings::default()
        };
        let errors = validate_settings(&settings);
        assert_eq!(
            errors,
            vec![
                SettingsError::NonPositiveTick(0.0),
                SettingsError::EmptyHomeBody,
                SettingsError::NegativeEpsilon(-1.0),
                SettingsError::EmptyFallbackName,
            ]
        );
    }

    #[test]
    fn test_nan_tick_is_rejected() {
        let settings = Settings {
            tick_interval_secs: f64::NAN,
            ..Settings::default()
        };
        assert_eq!(validate_settings(&settings).len(), 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "home_body": "Duna" }"#).unwrap();
        assert_eq!(settings.home_body, "Duna");
        assert_eq!(settings.tick_interval_secs, 1.0);
        assert!(settings.is_launch_site("LaunchPad"));
    }
}
