//! Application systems
//!
//! Pieces of the native host kept out of main.rs.

mod container;
mod render;
mod stats;
mod window;

pub use container::WindowContainer;
pub use render::WindowSurfaceProvider;
pub use stats::FrameStatsLogger;
pub use window::{WindowError, WindowSystem};
