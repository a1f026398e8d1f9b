//! Tunables for drag sessions

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors raised while loading a [`DragConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse drag config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid drag config: {0}")]
    Invalid(String),
}

/// Timing and preview settings shared by every session of a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// How often a session checks that its pointer and source are still alive
    pub liveness_interval_ms: u64,
    /// Duration of the snap-back / fade-out when an overlay is dismissed
    pub dismiss_duration_ms: u64,
    /// Alpha multiplier applied to synthesized previews
    pub preview_alpha: f32,
    /// Render scale of synthesized previews
    pub preview_scale: f32,
    /// Radius, in logical units, of the fade mask around the pointer
    pub fade_radius: f32,
    /// Fraction of the fade radius that stays fully opaque
    pub fade_solid_fraction: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            liveness_interval_ms: 200,
            dismiss_duration_ms: 120,
            preview_alpha: 0.6,
            preview_scale: 2.0,
            fade_radius: 400.0,
            fade_solid_fraction: 0.375,
        }
    }
}

impl DragConfig {
    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: DragConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liveness_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "liveness_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.preview_alpha) {
            return Err(ConfigError::Invalid(format!(
                "preview_alpha must be within 0..=1, got {}",
                self.preview_alpha
            )));
        }
        if self.preview_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "preview_scale must be positive, got {}",
                self.preview_scale
            )));
        }
        if self.fade_radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fade_radius must be positive, got {}",
                self.fade_radius
            )));
        }
        if !(0.0..1.0).contains(&self.fade_solid_fraction) {
            return Err(ConfigError::Invalid(format!(
                "fade_solid_fraction must be within 0..1, got {}",
                self.fade_solid_fraction
            )));
        }
        Ok(())
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }

    pub fn dismiss_duration(&self) -> Duration {
        Duration::from_millis(self.dismiss_duration_ms)
    }
}
