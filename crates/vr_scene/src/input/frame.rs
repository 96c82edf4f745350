//! Per-frame data passed unmodified to every component

use crate::foundation::math::{Quat, Vec3};

use super::JoyButton;

/// Head-tracking pose for the frame being rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    /// Head position in tracking space
    pub position: Vec3,
    /// Head orientation in tracking space
    pub orientation: Quat,
}

impl Default for HeadPose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
        }
    }
}

/// Read-only information about the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Predicted absolute time this frame will be displayed, in seconds
    ///
    /// Use this rather than reading the system clock so recorded sessions
    /// play back deterministically.
    pub predicted_display_time: f64,
    /// Seconds since the previous frame, clamped by the driver
    pub delta_seconds: f32,
    /// Incremented once for every frame
    pub frame_number: u64,
    /// 0.0 - 1.0 while a swipe is being recognized
    pub swipe_fraction: f32,
    /// Buttons currently held
    pub button_state: JoyButton,
    /// Buttons that went down this frame
    pub button_pressed: JoyButton,
    /// Buttons that went up this frame
    pub button_released: JoyButton,
    /// Head pose for this frame
    pub head_pose: HeadPose,
}

impl FrameInput {
    /// Frame with the given number and delta, everything else default
    pub fn new(frame_number: u64, delta_seconds: f32) -> Self {
        Self {
            frame_number,
            delta_seconds,
            ..Default::default()
        }
    }

    /// Builder pattern: set the head pose
    pub fn with_head_pose(mut self, head_pose: HeadPose) -> Self {
        self.head_pose = head_pose;
        self
    }

    /// Builder pattern: set the held buttons
    pub fn with_buttons(mut self, state: JoyButton, pressed: JoyButton, released: JoyButton) -> Self {
        self.button_state = state;
        self.button_pressed = pressed;
        self.button_released = released;
        self
    }

    /// Whether `button` went down this frame
    pub fn is_pressed(&self, button: JoyButton) -> bool {
        self.button_pressed.intersects(button)
    }

    /// Whether `button` is held
    pub fn is_held(&self, button: JoyButton) -> bool {
        self.button_state.intersects(button)
    }

    /// Whether `button` went up this frame
    pub fn is_released(&self, button: JoyButton) -> bool {
        self.button_released.intersects(button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_queries() {
        let frame = FrameInput::new(3, 0.016).with_buttons(
            JoyButton::A | JoyButton::TOUCH,
            JoyButton::A,
            JoyButton::B,
        );

        assert!(frame.is_held(JoyButton::TOUCH));
        assert!(frame.is_pressed(JoyButton::A));
        assert!(!frame.is_pressed(JoyButton::TOUCH));
        assert!(frame.is_released(JoyButton::B));
        assert_eq!(frame.frame_number, 3);
    }
}
