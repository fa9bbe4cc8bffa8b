//! Core scene types for the vrview viewer
//!
//! This crate provides the scene-graph engine the viewer renders from:
//!
//! - [`Transform`] - Position, rotation, and scale in 3D space
//! - [`SceneGraph`] - Slotmap-keyed node hierarchy with a fixed root
//! - [`Node`] / [`NodeKey`] - A scene object and its generational key
//! - [`Raycaster`] / [`Ray`] - Ray queries against pickable nodes
//! - [`PerspectiveCamera`] - Camera with a cached projection
//! - [`SceneTemplate`] - Loadable/saveable RON scene description

mod transform;
mod graph;
mod raycast;
mod camera;
mod scene;
mod asset_error;

pub use transform::Transform;
pub use graph::{GraphError, Node, NodeFlags, NodeKey, SceneGraph, Shape};
pub use raycast::{Intersection, Ray, Raycaster};
pub use camera::PerspectiveCamera;
pub use scene::{ObjectTemplate, SceneTemplate};
pub use asset_error::AssetError;

// Re-export commonly used math types for convenience
pub use vrview_math::{mat4, Mat4, Quat, Vec3};
