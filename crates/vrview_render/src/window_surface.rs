//! Raster surface backed by a window
//!
//! Draws a clear pass in the configured colour each frame. Scene geometry is
//! not rasterized here; the surface exists so the session lifecycle runs
//! against a real swapchain. Shader passes from the effect chain are skipped,
//! and the first skipped pass is logged at debug level.

use winit::dpi::PhysicalSize;

use vrview_core::{PerspectiveCamera, SceneGraph};

use crate::context::RenderContext;
use crate::effects::{EffectPass, PassKind};
use crate::error::RenderError;
use crate::surface::{ControllerState, DeviceId, Layer, RasterSurface, ReferenceSpace};

pub struct WindowRaster {
    context: RenderContext,
    clear_color: wgpu::Color,
    size: (u32, u32),
    pixel_ratio: f64,
    z_index: Option<i32>,
    device_rendering: bool,
    bound_device: Option<DeviceId>,
    reference_space: ReferenceSpace,
    skipped: SkippedPasses,
}

/// Remembers whether a skipped shader pass has been reported
#[derive(Debug, Default)]
struct SkippedPasses {
    reported: bool,
}

impl SkippedPasses {
    /// Returns true when this call logged the skip
    fn note(&mut self, pass: &EffectPass) -> bool {
        let PassKind::Shader(shader) = pass.kind() else {
            return false;
        };
        if self.reported {
            return false;
        }
        log::debug!(
            "Window raster has no shader support; skipping '{}' and later shader passes",
            shader.as_str()
        );
        self.reported = true;
        true
    }
}

impl WindowRaster {
    pub fn new(context: RenderContext, clear_color: [f32; 4]) -> Self {
        let size = (context.size.width, context.size.height);
        Self {
            context,
            clear_color: wgpu::Color {
                r: clear_color[0] as f64,
                g: clear_color[1] as f64,
                b: clear_color[2] as f64,
                a: clear_color[3] as f64,
            },
            size,
            pixel_ratio: 1.0,
            z_index: None,
            device_rendering: false,
            bound_device: None,
            reference_space: ReferenceSpace::default(),
            skipped: SkippedPasses::default(),
        }
    }

    pub fn reference_space(&self) -> ReferenceSpace {
        self.reference_space
    }

    pub fn bound_device(&self) -> Option<DeviceId> {
        self.bound_device
    }

    fn reconfigure(&mut self) {
        let width = (self.size.0 as f64 * self.pixel_ratio).round() as u32;
        let height = (self.size.1 as f64 * self.pixel_ratio).round() as u32;
        self.context.resize(PhysicalSize::new(width, height));
    }
}

impl Layer for WindowRaster {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.reconfigure();
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn attach(&mut self, z_index: i32) {
        self.z_index = Some(z_index);
    }

    fn detach(&mut self) {
        self.z_index = None;
    }

    fn is_attached(&self) -> bool {
        self.z_index.is_some()
    }
}

impl RasterSurface for WindowRaster {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        if (ratio - self.pixel_ratio).abs() > f64::EPSILON {
            self.pixel_ratio = ratio;
            self.reconfigure();
        }
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn render(&mut self, _scene: &SceneGraph, _camera: &PerspectiveCamera) -> Result<(), RenderError> {
        if !self.is_attached() {
            return Ok(());
        }
        match self.context.clear(self.clear_color) {
            Err(RenderError::SurfaceLost) => {
                // reconfigure and skip this frame
                self.reconfigure();
                Ok(())
            }
            other => other,
        }
    }

    fn apply_pass(&mut self, pass: &EffectPass) -> Result<(), RenderError> {
        self.skipped.note(pass);
        Ok(())
    }

    fn controller(&self, _index: usize) -> Option<ControllerState> {
        None
    }

    fn set_device_rendering(&mut self, enabled: bool) {
        self.device_rendering = enabled;
    }

    fn device_rendering(&self) -> bool {
        self.device_rendering
    }

    fn bind_device(&mut self, device: Option<DeviceId>) {
        self.bound_device = device;
    }

    fn set_reference_space(&mut self, space: ReferenceSpace) {
        self.reference_space = space;
    }
}
