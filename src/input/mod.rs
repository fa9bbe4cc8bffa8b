//! Input handling module
//!
//! Provides input mapping from raw window events to viewer actions.

mod input_mapper;

pub use input_mapper::{InputAction, InputMapper};
