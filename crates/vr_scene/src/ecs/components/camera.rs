//! Head-tracking follower
//!
//! Copies the frame's head pose into its entity every frame. Anything
//! attached under that entity stays fixed relative to the viewer.

use crate::ecs::{Component, ComponentContext};
use crate::input::FrameInput;

/// Keeps its entity at the viewer's head pose
#[derive(Debug, Clone, Copy)]
pub struct CameraComponent {
    follow_position: bool,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            follow_position: true,
        }
    }
}

impl CameraComponent {
    /// Follow both head position and orientation
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow head orientation only, keeping the entity's own position
    pub fn rotation_only() -> Self {
        Self {
            follow_position: false,
        }
    }
}

impl Component for CameraComponent {
    fn update(&mut self, ctx: &mut ComponentContext<'_>, frame: &FrameInput) {
        ctx.set_rotation(frame.head_pose.orientation);
        if self.follow_position {
            ctx.set_position(frame.head_pose.position);
        }
    }
}
