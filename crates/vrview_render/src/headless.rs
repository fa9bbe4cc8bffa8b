//! Headless surfaces
//!
//! Surfaces that track size, attachment and device state without drawing
//! anything. The native host uses [`HeadlessOverlay`] because it has no
//! document layer; tests use the whole set and inspect the shared
//! [`SurfaceStats`] after the surfaces have been boxed away.

use std::cell::RefCell;
use std::rc::Rc;

use vrview_core::{PerspectiveCamera, SceneGraph};

use crate::effects::EffectPass;
use crate::error::RenderError;
use crate::surface::{
    ControllerState, DeviceId, Layer, OverlaySurface, RasterSurface, ReferenceSpace, SurfaceProvider,
};
use crate::viewport::ViewportMetrics;

/// Everything a headless surface records
#[derive(Clone, Debug, Default)]
pub struct SurfaceStats {
    pub size: (u32, u32),
    pub pixel_ratio: f64,
    pub attached: bool,
    pub z_index: Option<i32>,
    pub frames: u64,
    pub passes_applied: u64,
    pub device_rendering: bool,
    pub bound_device: Option<DeviceId>,
    pub reference_space: ReferenceSpace,
    /// Count of device-rendering, binding and reference-space changes
    pub device_changes: u32,
    /// Controllers reported by [`RasterSurface::controller`]
    pub controllers: Vec<ControllerState>,
    /// Error returned by the next render call
    pub fail_next: Option<RenderError>,
}

pub type SharedStats = Rc<RefCell<SurfaceStats>>;

fn set_size(stats: &SharedStats, width: u32, height: u32) {
    stats.borrow_mut().size = (width, height);
}

fn attach(stats: &SharedStats, z_index: i32) {
    let mut s = stats.borrow_mut();
    s.attached = true;
    s.z_index = Some(z_index);
}

fn detach(stats: &SharedStats) {
    let mut s = stats.borrow_mut();
    s.attached = false;
    s.z_index = None;
}

fn render(stats: &SharedStats) -> Result<(), RenderError> {
    let mut s = stats.borrow_mut();
    if let Some(err) = s.fail_next.take() {
        return Err(err);
    }
    s.frames += 1;
    Ok(())
}

/// Raster surface that records instead of drawing
pub struct HeadlessRaster {
    stats: SharedStats,
}

impl HeadlessRaster {
    pub fn new(stats: SharedStats) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> SharedStats {
        Rc::clone(&self.stats)
    }
}

impl Layer for HeadlessRaster {
    fn set_size(&mut self, width: u32, height: u32) {
        set_size(&self.stats, width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.stats.borrow().size
    }

    fn attach(&mut self, z_index: i32) {
        attach(&self.stats, z_index);
    }

    fn detach(&mut self) {
        detach(&self.stats);
    }

    fn is_attached(&self) -> bool {
        self.stats.borrow().attached
    }
}

impl RasterSurface for HeadlessRaster {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.stats.borrow_mut().pixel_ratio = ratio;
    }

    fn pixel_ratio(&self) -> f64 {
        self.stats.borrow().pixel_ratio
    }

    fn render(&mut self, _scene: &SceneGraph, _camera: &PerspectiveCamera) -> Result<(), RenderError> {
        render(&self.stats)
    }

    fn apply_pass(&mut self, _pass: &EffectPass) -> Result<(), RenderError> {
        self.stats.borrow_mut().passes_applied += 1;
        Ok(())
    }

    fn controller(&self, index: usize) -> Option<ControllerState> {
        self.stats
            .borrow()
            .controllers
            .iter()
            .find(|c| c.index == index)
            .copied()
    }

    fn set_device_rendering(&mut self, enabled: bool) {
        let mut s = self.stats.borrow_mut();
        s.device_rendering = enabled;
        s.device_changes += 1;
    }

    fn device_rendering(&self) -> bool {
        self.stats.borrow().device_rendering
    }

    fn bind_device(&mut self, device: Option<DeviceId>) {
        let mut s = self.stats.borrow_mut();
        s.bound_device = device;
        s.device_changes += 1;
    }

    fn set_reference_space(&mut self, space: ReferenceSpace) {
        let mut s = self.stats.borrow_mut();
        s.reference_space = space;
        s.device_changes += 1;
    }
}

/// Overlay surface that only tracks its size and attachment
pub struct HeadlessOverlay {
    stats: SharedStats,
}

impl HeadlessOverlay {
    pub fn new(stats: SharedStats) -> Self {
        Self { stats }
    }
}

impl Layer for HeadlessOverlay {
    fn set_size(&mut self, width: u32, height: u32) {
        set_size(&self.stats, width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.stats.borrow().size
    }

    fn attach(&mut self, z_index: i32) {
        attach(&self.stats, z_index);
    }

    fn detach(&mut self) {
        detach(&self.stats);
    }

    fn is_attached(&self) -> bool {
        self.stats.borrow().attached
    }
}

impl OverlaySurface for HeadlessOverlay {
    fn render(&mut self, _scene: &SceneGraph, _camera: &PerspectiveCamera) -> Result<(), RenderError> {
        render(&self.stats)
    }
}

/// Provider handing out headless surfaces that share their stats with it
#[derive(Default)]
pub struct HeadlessProvider {
    raster: SharedStats,
    overlay: SharedStats,
    created: u32,
}

impl HeadlessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats of the raster surface (created or not)
    pub fn raster_stats(&self) -> SharedStats {
        Rc::clone(&self.raster)
    }

    pub fn overlay_stats(&self) -> SharedStats {
        Rc::clone(&self.overlay)
    }

    /// Number of raster surfaces handed out
    pub fn created(&self) -> u32 {
        self.created
    }
}

impl SurfaceProvider for HeadlessProvider {
    fn create_raster(&mut self, _metrics: &ViewportMetrics) -> Result<Box<dyn RasterSurface>, RenderError> {
        self.created += 1;
        Ok(Box::new(HeadlessRaster::new(Rc::clone(&self.raster))))
    }

    fn create_overlay(&mut self, _metrics: &ViewportMetrics) -> Result<Box<dyn OverlaySurface>, RenderError> {
        Ok(Box::new(HeadlessOverlay::new(Rc::clone(&self.overlay))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrview_math::mat4;

    #[test]
    fn test_controller_lookup_by_index() {
        let stats = SharedStats::default();
        stats.borrow_mut().controllers.push(ControllerState {
            index: 1,
            gamepad: None,
            pose: mat4::IDENTITY,
        });
        let raster = HeadlessRaster::new(Rc::clone(&stats));
        assert!(raster.controller(0).is_none());
        assert_eq!(raster.controller(1).map(|c| c.index), Some(1));
    }

    #[test]
    fn test_device_changes_are_counted() {
        let mut raster = HeadlessRaster::new(SharedStats::default());
        raster.bind_device(Some(DeviceId(4)));
        raster.set_device_rendering(true);
        let stats = raster.stats();
        assert_eq!(stats.borrow().device_changes, 2);
        assert_eq!(stats.borrow().bound_device, Some(DeviceId(4)));
        assert!(raster.device_rendering());
    }
}
