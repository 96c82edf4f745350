//! Per-frame input handed to the scene
//!
//! Buttons and head pose are produced by the native side; this module only
//! defines how they look once they reach the scene graph.

pub mod buttons;
pub mod frame;

pub use buttons::JoyButton;
pub use frame::{FrameInput, HeadPose};
