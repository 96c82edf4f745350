//! # Core Module
//!
//! Shared configuration and error types used by the scene graph and the
//! frame driver.

pub mod config;
pub mod error;

pub use config::{Config, ConfigError, SceneConfig};
pub use error::SceneError;
