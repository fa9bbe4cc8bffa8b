//! VR controller input
//!
//! Binds up to two tracked controllers to pick-and-drag interaction with the
//! pickable objects of a scene.

mod controller_input;

pub use controller_input::{
    indicator_line, ControllerBinding, ControllerEvent, ControllerInputManager, CONTROLLER_SLOTS,
};
