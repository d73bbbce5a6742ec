//! Maps raw device events onto the small closed set of menu actions.

use sdl2::controller::Button as CButton;
use sdl2::keyboard::Keycode;

/// Button ids shared by the remote device, the joystick fallback and the mouse.
pub const BUTTON_ACTIVATE: u32 = 0;
pub const BUTTON_BACK: u32 = 1;
pub const BUTTON_SETTINGS: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Device-independent input consumed by the menu state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    MoveCursor(i32, i32),
    Step(Direction),
    Activate,
    Back,
    OpenSettings,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawEvent {
    /// Relative pointer motion, already in pixels.
    PointerDelta { dx: i32, dy: i32 },
    /// Absolute axis sample from a motion remote.
    AxisSample { axis: Axis, value: i32 },
    Button(u32),
    Controller(CButton),
    Key(Keycode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration {
    pub center: i32,
    pub divisor: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            center: 128,
            divisor: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InputNormalizer {
    calibration: Calibration,
}

impl InputNormalizer {
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    /// Axis sample to pixel delta. Truncates toward zero.
    fn scale(&self, value: i32) -> i32 {
        let divisor = if self.calibration.divisor == 0 {
            1
        } else {
            self.calibration.divisor
        };
        (value - self.calibration.center) / divisor
    }

    pub fn normalize(&self, event: RawEvent) -> Option<MenuAction> {
        match event {
            RawEvent::PointerDelta { dx, dy } => Some(MenuAction::MoveCursor(dx, dy)),
            RawEvent::AxisSample { axis, value } => {
                let delta = self.scale(value);
                if delta == 0 {
                    return None;
                }
                match axis {
                    Axis::X => Some(MenuAction::MoveCursor(delta, 0)),
                    Axis::Y => Some(MenuAction::MoveCursor(0, delta)),
                }
            }
            RawEvent::Button(BUTTON_ACTIVATE) => Some(MenuAction::Activate),
            RawEvent::Button(BUTTON_BACK) => Some(MenuAction::Back),
            RawEvent::Button(BUTTON_SETTINGS) => Some(MenuAction::OpenSettings),
            RawEvent::Button(_) => None,
            RawEvent::Controller(button) => match button {
                CButton::A => Some(MenuAction::Activate),
                CButton::B => Some(MenuAction::Back),
                CButton::Start => Some(MenuAction::OpenSettings),
                CButton::DPadUp => Some(MenuAction::Step(Direction::Up)),
                CButton::DPadDown => Some(MenuAction::Step(Direction::Down)),
                CButton::DPadLeft => Some(MenuAction::Step(Direction::Left)),
                CButton::DPadRight => Some(MenuAction::Step(Direction::Right)),
                _ => None,
            },
            RawEvent::Key(key) => match key {
                Keycode::Escape => Some(MenuAction::Quit),
                Keycode::Return => Some(MenuAction::Activate),
                Keycode::Backspace => Some(MenuAction::Back),
                Keycode::C => Some(MenuAction::OpenSettings),
                Keycode::Up => Some(MenuAction::Step(Direction::Up)),
                Keycode::Down => Some(MenuAction::Step(Direction::Down)),
                Keycode::Left => Some(MenuAction::Step(Direction::Left)),
                Keycode::Right => Some(MenuAction::Step(Direction::Right)),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_samples_are_centered_and_scaled() {
        let n = InputNormalizer::default();
        assert_eq!(
            n.normalize(RawEvent::AxisSample { axis: Axis::X, value: 178 }),
            Some(MenuAction::MoveCursor(5, 0))
        );
        assert_eq!(
            n.normalize(RawEvent::AxisSample { axis: Axis::Y, value: 100 }),
            Some(MenuAction::MoveCursor(0, -2))
        );
    }

    #[test]
    fn axis_at_rest_produces_nothing() {
        let n = InputNormalizer::default();
        assert_eq!(n.normalize(RawEvent::AxisSample { axis: Axis::X, value: 128 }), None);
        // within one divisor of center truncates to zero
        assert_eq!(n.normalize(RawEvent::AxisSample { axis: Axis::Y, value: 137 }), None);
    }

    #[test]
    fn custom_calibration() {
        let n = InputNormalizer::new(Calibration { center: 0, divisor: 1000 });
        assert_eq!(
            n.normalize(RawEvent::AxisSample { axis: Axis::X, value: -32768 }),
            Some(MenuAction::MoveCursor(-32, 0))
        );
    }

    #[test]
    fn zero_divisor_does_not_panic() {
        let n = InputNormalizer::new(Calibration { center: 0, divisor: 0 });
        assert_eq!(
            n.normalize(RawEvent::AxisSample { axis: Axis::Y, value: 3 }),
            Some(MenuAction::MoveCursor(0, 3))
        );
    }

    #[test]
    fn pointer_delta_passes_through() {
        let n = InputNormalizer::default();
        assert_eq!(
            n.normalize(RawEvent::PointerDelta { dx: -7, dy: 12 }),
            Some(MenuAction::MoveCursor(-7, 12))
        );
    }

    #[test]
    fn designated_buttons() {
        let n = InputNormalizer::default();
        assert_eq!(n.normalize(RawEvent::Button(0)), Some(MenuAction::Activate));
        assert_eq!(n.normalize(RawEvent::Button(1)), Some(MenuAction::Back));
        assert_eq!(n.normalize(RawEvent::Button(4)), Some(MenuAction::OpenSettings));
        assert_eq!(n.normalize(RawEvent::Button(2)), None);
        assert_eq!(n.normalize(RawEvent::Button(99)), None);
    }

    #[test]
    fn keyboard_mapping() {
        let n = InputNormalizer::default();
        assert_eq!(n.normalize(RawEvent::Key(Keycode::Escape)), Some(MenuAction::Quit));
        assert_eq!(
            n.normalize(RawEvent::Key(Keycode::Left)),
            Some(MenuAction::Step(Direction::Left))
        );
        assert_eq!(n.normalize(RawEvent::Key(Keycode::Z)), None);
    }

    #[test]
    fn controller_mapping() {
        let n = InputNormalizer::default();
        assert_eq!(n.normalize(RawEvent::Controller(CButton::A)), Some(MenuAction::Activate));
        assert_eq!(n.normalize(RawEvent::Controller(CButton::Start)), Some(MenuAction::OpenSettings));
        assert_eq!(
            n.normalize(RawEvent::Controller(CButton::DPadDown)),
            Some(MenuAction::Step(Direction::Down))
        );
        assert_eq!(n.normalize(RawEvent::Controller(CButton::Guide)), None);
    }
}
