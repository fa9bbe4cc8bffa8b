//! Scene construction utilities
//!
//! This module provides a declarative API for building viewer scenes.

mod scene_builder;

pub use scene_builder::{default_scene, SceneBuilder};
