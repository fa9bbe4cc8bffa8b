//! Input mapping from raw events to semantic actions
//!
//! Maps keyboard input to viewer actions (VR toggle, fullscreen, exit) and
//! translates winit events into the display's pointer and key events.

use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::display::{KeyEvent, PointerEvent};

/// Actions triggered by special keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Enter or leave VR (V key)
    ToggleVr,
    /// Toggle fullscreen mode (F key)
    ToggleFullscreen,
    /// Exit application (Escape)
    Exit,
}

/// Maps raw input events to semantic actions
///
/// Keys without an action are still forwarded to the display's key hooks.
pub struct InputMapper;

impl InputMapper {
    /// Map keyboard input to an action
    ///
    /// Returns `Some(action)` on press of a special key, `None` otherwise
    pub fn map_keyboard(key: KeyCode, state: ElementState) -> Option<InputAction> {
        // Only handle key presses, not releases
        if state != ElementState::Pressed {
            return None;
        }

        match key {
            KeyCode::KeyV => Some(InputAction::ToggleVr),
            KeyCode::KeyF => Some(InputAction::ToggleFullscreen),
            KeyCode::Escape => Some(InputAction::Exit),
            _ => None,
        }
    }

    /// Key event for the display hooks
    pub fn key_event(key: KeyCode) -> KeyEvent {
        KeyEvent {
            code: format!("{:?}", key),
        }
    }

    /// Pointer event for the display hooks at logical position `(x, y)`
    pub fn pointer_event(x: f64, y: f64, button: Option<MouseButton>) -> PointerEvent {
        PointerEvent {
            x,
            y,
            button: button.map(Self::button_index),
        }
    }

    /// Button numbering: 0 left, 1 middle, 2 right, then 3 back, 4 forward
    fn button_index(button: MouseButton) -> u16 {
        match button {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
            MouseButton::Other(n) => n,
        }
    }
}
