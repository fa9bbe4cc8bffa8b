//! vrview - 3D/VR animation viewer
//!
//! [`display::AnimationDisplay`] is the embeddable component; the remaining
//! modules host it in a native window.

pub mod config;
pub mod display;
pub mod input;
pub mod scene;
pub mod systems;

pub use config::{AppConfig, ConfigError};
pub use display::{AnimationDisplay, InputHooks, KeyEvent, NoHooks, PointerEvent, StatsWidget};
