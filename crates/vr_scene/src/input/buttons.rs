//! Controller and touchpad button bits

use bitflags::bitflags;

bitflags! {
    /// Buttons, touchpad gestures and swipes reported by the headset
    ///
    /// Matches the bit layout of the native frame input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct JoyButton: u32 {
        /// A button
        const A = 1 << 0;
        /// B button
        const B = 1 << 1;
        /// X button
        const X = 1 << 2;
        /// Y button
        const Y = 1 << 3;
        /// Start button
        const START = 1 << 4;
        /// Back button
        const BACK = 1 << 5;
        /// Select button
        const SELECT = 1 << 6;
        /// Menu button
        const MENU = 1 << 7;
        /// Right trigger
        const RIGHT_TRIGGER = 1 << 8;
        /// Left trigger
        const LEFT_TRIGGER = 1 << 9;
        /// D-pad up
        const DPAD_UP = 1 << 10;
        /// D-pad down
        const DPAD_DOWN = 1 << 11;
        /// D-pad left
        const DPAD_LEFT = 1 << 12;
        /// D-pad right
        const DPAD_RIGHT = 1 << 13;
        /// Left stick up
        const LSTICK_UP = 1 << 14;
        /// Left stick down
        const LSTICK_DOWN = 1 << 15;
        /// Left stick left
        const LSTICK_LEFT = 1 << 16;
        /// Left stick right
        const LSTICK_RIGHT = 1 << 17;
        /// Right stick up
        const RSTICK_UP = 1 << 18;
        /// Right stick down
        const RSTICK_DOWN = 1 << 19;
        /// Right stick left
        const RSTICK_LEFT = 1 << 20;
        /// Right stick right
        const RSTICK_RIGHT = 1 << 21;
        /// Touchpad touched
        const TOUCH = 1 << 22;
        /// Swipe up
        const SWIPE_UP = 1 << 23;
        /// Swipe down
        const SWIPE_DOWN = 1 << 24;
        /// Swipe forward
        const SWIPE_FORWARD = 1 << 25;
        /// Swipe back
        const SWIPE_BACK = 1 << 26;
        /// The touch that just ended was a swipe
        const TOUCH_WAS_SWIPE = 1 << 27;
        /// Single tap
        const TOUCH_SINGLE = 1 << 28;
        /// Double tap
        const TOUCH_DOUBLE = 1 << 29;
        /// Long press
        const TOUCH_LONGPRESS = 1 << 30;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_bits_round_trip_through_native_layout() {
        let state = JoyButton::from_bits_truncate((1 << 0) | (1 << 22));

        assert!(state.contains(JoyButton::A));
        assert!(state.contains(JoyButton::TOUCH));
        assert!(!state.contains(JoyButton::B));
    }

    #[test]
    fn test_unknown_bits_are_dropped() {
        let state = JoyButton::from_bits_truncate(1 << 31);
        assert!(state.is_empty());
    }
}
