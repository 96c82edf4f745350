//! # Scene Configuration
//!
//! Runtime settings for the scene graph and the frame driver. Loadable from
//! TOML or RON through the [`Config`] trait.
//!
//! ```toml
//! log_level = "debug"
//! max_delta_seconds = 0.1
//! validate_transforms = true
//! log_frame_stats = false
//! ```

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Scene Configuration
///
/// Core behavior of the scene graph and frame driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Default log filter used by [`crate::foundation::logging::init_with_level`]
    pub log_level: String,
    /// Upper bound for the frame delta handed to components, in seconds
    pub max_delta_seconds: f32,
    /// Reject non-finite transform input and NaN opacity instead of storing it
    pub validate_transforms: bool,
    /// Emit a trace line with per-frame update statistics
    pub log_frame_stats: bool,
}

impl SceneConfig {
    /// Create a new scene configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            max_delta_seconds: 0.1,
            validate_transforms: false,
            log_frame_stats: cfg!(debug_assertions),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the frame delta clamp
    pub fn with_max_delta_seconds(mut self, seconds: f32) -> Self {
        self.max_delta_seconds = seconds;
        self
    }

    /// Enable or disable transform input validation
    pub fn with_transform_validation(mut self, enabled: bool) -> Self {
        self.validate_transforms = enabled;
        self
    }

    /// Enable or disable per-frame statistics logging
    pub fn with_frame_stats(mut self, enabled: bool) -> Self {
        self.log_frame_stats = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        if !(self.max_delta_seconds.is_finite() && self.max_delta_seconds > 0.0) {
            return Err(format!(
                "Max delta seconds must be a positive number, got {}",
                self.max_delta_seconds
            ));
        }

        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for SceneConfig {}
