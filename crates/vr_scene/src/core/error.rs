//! Scene-level errors
//!
//! Structural violations (duplicate component, removing something that is not
//! there) are reported with `bool`/`Option` returns and never reach this type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::scene::EntityId;

/// Errors from fallible scene and driver operations
#[derive(Error, Debug)]
pub enum SceneError {
    /// The entity does not exist (never created or already destroyed)
    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// Only orphan entities can become the active root
    #[error("Entity {0:?} has a parent and cannot be used as the scene root")]
    RootHasParent(EntityId),

    /// Configuration values failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
