//! GPU surface provider
//!
//! Creates the window's raster surface on demand. The overlay has no
//! document layer to draw into on a native window, so it only tracks its
//! size and attachment.

use std::sync::Arc;
use winit::window::Window;

use vrview_render::{
    context::RenderContext,
    headless::{HeadlessOverlay, SharedStats},
    window_surface::WindowRaster,
    OverlaySurface, RasterSurface, RenderError, SurfaceProvider, ViewportMetrics,
};

use crate::config::DisplayConfig;

/// Hands out surfaces bound to the application window
pub struct WindowSurfaceProvider {
    window: Arc<Window>,
    vsync: bool,
    clear_color: [f32; 4],
    overlay_stats: SharedStats,
}

impl WindowSurfaceProvider {
    pub fn new(window: Arc<Window>, vsync: bool, display: &DisplayConfig) -> Self {
        Self {
            window,
            vsync,
            clear_color: display.clear_color,
            overlay_stats: SharedStats::default(),
        }
    }
}

impl SurfaceProvider for WindowSurfaceProvider {
    fn create_raster(&mut self, metrics: &ViewportMetrics) -> Result<Box<dyn RasterSurface>, RenderError> {
        let context = pollster::block_on(RenderContext::with_vsync(self.window.clone(), self.vsync))?;
        log::info!(
            "GPU surface ready ({}x{} physical)",
            context.size.width,
            context.size.height
        );
        let (width, height) = metrics.physical_size();
        log::debug!("Container wants {}x{} physical", width, height);
        Ok(Box::new(WindowRaster::new(context, self.clear_color)))
    }

    fn create_overlay(&mut self, _metrics: &ViewportMetrics) -> Result<Box<dyn OverlaySurface>, RenderError> {
        Ok(Box::new(HeadlessOverlay::new(self.overlay_stats.clone())))
    }
}
