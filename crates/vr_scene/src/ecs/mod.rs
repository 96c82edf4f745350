//! Component system
//!
//! Components are behaviors attached to scene entities, stored per entity in
//! a type-indexed registry and driven by the scene's update pass.

pub mod component;
pub mod components;
pub mod registry;

pub use component::{AsAny, Component, ComponentContext};
pub use registry::ComponentRegistry;
