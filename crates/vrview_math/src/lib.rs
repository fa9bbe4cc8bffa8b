//! 3D Mathematics Library
//!
//! Vector, rotation, and matrix types for the vrview viewer.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components
//! - [`Quat`] - Unit quaternion rotation
//! - [`Mat4`] - 4x4 column-major matrix with compose/decompose helpers

mod vec3;
mod quat;
pub mod mat4;

pub use vec3::Vec3;
pub use quat::Quat;
pub use mat4::Mat4;
