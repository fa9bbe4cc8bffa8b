//! Rendering for the vrview viewer
//!
//! ## Key Components
//!
//! - [`viewport::ViewportSizer`] - Measures the host container
//! - [`surface::SurfaceManager`] - Owns the raster and overlay surfaces
//! - [`effects::EffectPipeline`] - Ordered post-processing passes
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`window_surface::WindowRaster`] - Raster surface drawing into a window
//! - [`headless`] - Surfaces that record instead of drawing

pub mod context;
pub mod effects;
pub mod error;
pub mod headless;
pub mod surface;
pub mod viewport;
pub mod window_surface;

pub use error::RenderError;
pub use effects::{
    EffectPass, EffectPipeline, PassKind, ShaderKind, UniformValue, VIGNETTE_DARKNESS, VIGNETTE_OFFSET,
};
pub use surface::{
    ControllerState, DeviceId, GamepadId, Layer, OverlaySurface, RasterSurface, ReferenceSpace,
    SurfaceManager, SurfaceProvider,
};
pub use viewport::{Container, LayerId, LayerKind, Orientation, ViewportMetrics, ViewportSizer};
