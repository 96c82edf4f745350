//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and transform composition
//! - Frame timing
//! - Logging setup

pub mod logging;
pub mod math;
pub mod time;
