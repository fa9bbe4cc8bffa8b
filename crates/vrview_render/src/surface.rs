//! Render surfaces and their manager
//!
//! The viewer draws every frame twice: the raster surface renders the main
//! scene (optionally through an [`EffectPipeline`]) and the overlay surface
//! renders the overlay scene on top of it with the same camera.
//! [`SurfaceManager`] owns both and keeps them the same size.

use serde::{Deserialize, Serialize};

use vrview_core::{PerspectiveCamera, SceneGraph};
use vrview_math::Mat4;

use crate::effects::{EffectPass, EffectPipeline};
use crate::error::RenderError;
use crate::viewport::{Container, LayerId, LayerKind, ViewportMetrics, ViewportSizer};

/// Stacking order of the raster layer
pub const RASTER_Z_INDEX: i32 = 1;
/// Stacking order of the overlay layer (above the raster)
pub const OVERLAY_Z_INDEX: i32 = 2;

/// Opaque identifier of a VR display or XR device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

/// Opaque identifier of a connected gamepad
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GamepadId(pub u32);

/// Tracking origin used while presenting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpace {
    Local,
    #[default]
    LocalFloor,
    BoundedFloor,
    Unbounded,
}

impl ReferenceSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceSpace::Local => "local",
            ReferenceSpace::LocalFloor => "local-floor",
            ReferenceSpace::BoundedFloor => "bounded-floor",
            ReferenceSpace::Unbounded => "unbounded",
        }
    }
}

/// A tracked controller as reported by the raster surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerState {
    /// Controller slot (0 or 1)
    pub index: usize,
    /// Gamepad backing this controller, if any
    pub gamepad: Option<GamepadId>,
    /// Controller pose in world space
    pub pose: Mat4,
}

/// Common behaviour of every surface placed in the container
pub trait Layer {
    /// Set the drawing size in logical pixels
    fn set_size(&mut self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);
    /// Mark the surface as placed in the container at `z_index`
    fn attach(&mut self, z_index: i32);
    /// Take the surface out of the container; idempotent
    fn detach(&mut self);
    fn is_attached(&self) -> bool;
}

/// The main (WebGL-equivalent) surface
pub trait RasterSurface: Layer {
    fn set_pixel_ratio(&mut self, ratio: f64);
    fn pixel_ratio(&self) -> f64;

    /// Draw `scene` from `camera`
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError>;

    /// Apply a full-screen shader pass to the last render
    fn apply_pass(&mut self, _pass: &EffectPass) -> Result<(), RenderError> {
        Ok(())
    }

    /// Tracked controller in slot `index`, if one is present
    fn controller(&self, index: usize) -> Option<ControllerState>;

    /// Let the bound device drive rendering
    fn set_device_rendering(&mut self, enabled: bool);
    fn device_rendering(&self) -> bool;

    /// Bind the surface to a device, or unbind with `None`
    fn bind_device(&mut self, device: Option<DeviceId>);

    fn set_reference_space(&mut self, space: ReferenceSpace);
}

/// The overlay (CSS3D-equivalent) surface
pub trait OverlaySurface: Layer {
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError>;
}

/// Creates the surfaces on first initialization
pub trait SurfaceProvider {
    fn create_raster(&mut self, metrics: &ViewportMetrics) -> Result<Box<dyn RasterSurface>, RenderError>;
    fn create_overlay(&mut self, metrics: &ViewportMetrics) -> Result<Box<dyn OverlaySurface>, RenderError>;
}

/// Owns the raster and overlay surfaces and the optional effect pipeline
#[derive(Default)]
pub struct SurfaceManager {
    raster: Option<Box<dyn RasterSurface>>,
    overlay: Option<Box<dyn OverlaySurface>>,
    layers: Vec<LayerId>,
    pipeline: Option<EffectPipeline>,
    rendering: bool,
    keyboard_registered: bool,
    frames: u64,
}

impl SurfaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create, size and attach both surfaces
    ///
    /// Returns `Ok(false)` without touching anything when they already exist.
    pub fn ensure_surfaces(
        &mut self,
        container: &mut dyn Container,
        provider: &mut dyn SurfaceProvider,
    ) -> Result<bool, RenderError> {
        if self.has_surfaces() {
            return Ok(false);
        }

        let metrics = ViewportSizer::measure(container);

        let mut raster = provider.create_raster(&metrics)?;
        raster.set_pixel_ratio(metrics.pixel_ratio);
        raster.set_size(metrics.width, metrics.height);

        let mut overlay = provider.create_overlay(&metrics)?;
        overlay.set_size(metrics.width, metrics.height);

        container.clear_children();
        self.layers.clear();
        self.layers.push(container.append_layer(LayerKind::Raster, RASTER_Z_INDEX));
        raster.attach(RASTER_Z_INDEX);
        self.layers.push(container.append_layer(LayerKind::Overlay, OVERLAY_Z_INDEX));
        overlay.attach(OVERLAY_Z_INDEX);

        if !self.keyboard_registered {
            container.register_keyboard_passthrough();
            self.keyboard_registered = true;
        }

        log::info!("Render surfaces created at {}x{} (dpr {})", metrics.width, metrics.height, metrics.pixel_ratio);
        self.raster = Some(raster);
        self.overlay = Some(overlay);
        Ok(true)
    }

    pub fn has_surfaces(&self) -> bool {
        self.raster.is_some() && self.overlay.is_some()
    }

    /// Enable per-frame rendering in [`SurfaceManager::render_tick`]
    pub fn start_rendering(&mut self) {
        self.rendering = true;
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    /// Number of frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render one frame: raster (through the pipeline if built), then overlay
    ///
    /// Returns whether a frame was drawn. Errors are logged, never returned.
    pub fn render_tick(
        &mut self,
        scene: &SceneGraph,
        overlay_scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> bool {
        if !self.rendering {
            return false;
        }
        let (Some(raster), Some(overlay)) = (self.raster.as_mut(), self.overlay.as_mut()) else {
            return false;
        };

        let raster_result = match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.render(&mut **raster, scene, camera),
            None => raster.render(scene, camera),
        };
        if let Err(e) = raster_result {
            log::warn!("Raster render failed: {}", e);
        }
        if let Err(e) = overlay.render(overlay_scene, camera) {
            log::warn!("Overlay render failed: {}", e);
        }

        self.frames += 1;
        true
    }

    /// Resize surfaces, pipeline and camera to the container
    pub fn resize(&mut self, container: &dyn Container, camera: &mut PerspectiveCamera) -> ViewportMetrics {
        let metrics = ViewportSizer::measure(container);

        if let Some(raster) = self.raster.as_mut() {
            raster.set_pixel_ratio(metrics.pixel_ratio);
            raster.set_size(metrics.width, metrics.height);
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_size(metrics.width, metrics.height);
        }
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.set_size(metrics.width, metrics.height);
        }

        camera.aspect = metrics.aspect();
        camera.update_projection_matrix();
        metrics
    }

    /// Build the default effect chain
    ///
    /// Returns `false` when there is no raster surface yet or a pipeline
    /// already exists.
    pub fn add_composer(&mut self) -> bool {
        if self.pipeline.is_some() {
            return false;
        }
        let Some(raster) = self.raster.as_ref() else {
            log::warn!("Effect pipeline requested before surfaces exist");
            return false;
        };
        let (width, height) = raster.size();
        self.pipeline = Some(EffectPipeline::with_default_chain(width, height));
        true
    }

    pub fn pipeline(&self) -> Option<&EffectPipeline> {
        self.pipeline.as_ref()
    }

    pub fn pipeline_mut(&mut self) -> Option<&mut EffectPipeline> {
        self.pipeline.as_mut()
    }

    pub fn raster(&self) -> Option<&dyn RasterSurface> {
        match &self.raster {
            Some(raster) => Some(&**raster),
            None => None,
        }
    }

    pub fn raster_mut(&mut self) -> Option<&mut dyn RasterSurface> {
        match &mut self.raster {
            Some(raster) => Some(&mut **raster),
            None => None,
        }
    }

    pub fn overlay(&self) -> Option<&dyn OverlaySurface> {
        match &self.overlay {
            Some(overlay) => Some(&**overlay),
            None => None,
        }
    }

    /// Detach both surfaces and drop them along with the pipeline
    ///
    /// Safe to call repeatedly and before the surfaces were ever created.
    pub fn teardown(&mut self, container: &mut dyn Container) {
        if let Some(mut raster) = self.raster.take() {
            raster.detach();
        }
        if let Some(mut overlay) = self.overlay.take() {
            overlay.detach();
        }
        for layer in self.layers.drain(..) {
            container.remove_layer(layer);
        }
        self.pipeline = None;
        self.rendering = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessProvider, SurfaceStats};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct TestContainer {
        width: u32,
        height: u32,
        layers: BTreeMap<u32, (LayerKind, i32)>,
        next: u32,
        keyboard: u32,
        stale_children: usize,
    }

    impl Container for TestContainer {
        fn client_width(&self) -> u32 {
            self.width
        }
        fn client_height(&self) -> u32 {
            self.height
        }
        fn device_pixel_ratio(&self) -> f64 {
            1.5
        }
        fn append_layer(&mut self, kind: LayerKind, z_index: i32) -> LayerId {
            self.next += 1;
            self.layers.insert(self.next, (kind, z_index));
            LayerId(self.next)
        }
        fn remove_layer(&mut self, id: LayerId) {
            self.layers.remove(&id.0);
        }
        fn clear_children(&mut self) {
            self.layers.clear();
            self.stale_children = 0;
        }
        fn child_count(&self) -> usize {
            self.layers.len() + self.stale_children
        }
        fn register_keyboard_passthrough(&mut self) {
            self.keyboard += 1;
        }
    }

    fn container(width: u32, height: u32) -> TestContainer {
        TestContainer { width, height, ..Default::default() }
    }

    #[test]
    fn test_ensure_surfaces_is_idempotent() {
        let mut c = container(800, 600);
        c.stale_children = 3;
        let mut provider = HeadlessProvider::new();
        let mut manager = SurfaceManager::new();

        assert!(manager.ensure_surfaces(&mut c, &mut provider).unwrap());
        assert!(!manager.ensure_surfaces(&mut c, &mut provider).unwrap());

        assert_eq!(provider.created(), 1);
        assert_eq!(c.child_count(), 2);
        assert_eq!(c.keyboard, 1);

        let raster = provider.raster_stats();
        let raster = raster.borrow();
        assert_eq!(raster.size, (800, 600));
        assert_eq!(raster.pixel_ratio, 1.5);
        assert_eq!(raster.z_index, Some(RASTER_Z_INDEX));
        assert_eq!(provider.overlay_stats().borrow().z_index, Some(OVERLAY_Z_INDEX));

        let z: Vec<(LayerKind, i32)> = c.layers.values().copied().collect();
        assert_eq!(z, vec![(LayerKind::Raster, 1), (LayerKind::Overlay, 2)]);
    }

    #[test]
    fn test_render_tick_requires_start() {
        let mut c = container(100, 100);
        let mut provider = HeadlessProvider::new();
        let mut manager = SurfaceManager::new();
        manager.ensure_surfaces(&mut c, &mut provider).unwrap();

        let scene = SceneGraph::default();
        let overlay = SceneGraph::default();
        let camera = PerspectiveCamera::default();

        assert!(!manager.render_tick(&scene, &overlay, &camera));
        manager.start_rendering();
        assert!(manager.render_tick(&scene, &overlay, &camera));

        assert_eq!(provider.raster_stats().borrow().frames, 1);
        assert_eq!(provider.overlay_stats().borrow().frames, 1);
    }

    #[test]
    fn test_render_tick_goes_through_pipeline() {
        let mut c = container(100, 100);
        let mut provider = HeadlessProvider::new();
        let mut manager = SurfaceManager::new();
        manager.ensure_surfaces(&mut c, &mut provider).unwrap();
        assert!(manager.add_composer());
        assert!(!manager.add_composer());
        manager.start_rendering();

        let scene = SceneGraph::default();
        manager.render_tick(&scene, &scene, &PerspectiveCamera::default());

        let stats = provider.raster_stats();
        assert_eq!(stats.borrow().frames, 1);
        assert_eq!(stats.borrow().passes_applied, 1);
    }

    #[test]
    fn test_render_errors_do_not_escape() {
        let mut c = container(100, 100);
        let mut provider = HeadlessProvider::new();
        let mut manager = SurfaceManager::new();
        manager.ensure_surfaces(&mut c, &mut provider).unwrap();
        manager.start_rendering();
        provider.raster_stats().borrow_mut().fail_next = Some(RenderError::SurfaceLost);

        let scene = SceneGraph::default();
        assert!(manager.render_tick(&scene, &scene, &PerspectiveCamera::default()));
        assert_eq!(provider.overlay_stats().borrow().frames, 1);
    }

    #[test]
    fn test_resize_keeps_everything_in_step() {
        let mut c = container(100, 100);
        let mut provider = HeadlessProvider::new();
        let mut manager = SurfaceManager::new();
        let mut camera = PerspectiveCamera::default();
        manager.ensure_surfaces(&mut c, &mut provider).unwrap();
        manager.add_composer();

        c.width = 1280;
        c.height = 720;
        let metrics = manager.resize(&c, &mut camera);
        // redundant resize is harmless
        manager.resize(&c, &mut camera);

        assert_eq!((metrics.width, metrics.height), (1280, 720));
        assert_eq!(provider.raster_stats().borrow().size, (1280, 720));
        assert_eq!(provider.overlay_stats().borrow().size, (1280, 720));
        assert_eq!(manager.pipeline().map(|p| p.size()), Some((1280, 720)));
        assert!((camera.aspect - 1280.0 / 720.0).abs() < 0.0001);
    }

    #[test]
    fn test_resize_without_surfaces_updates_camera() {
        let c = container(300, 150);
        let mut manager = SurfaceManager::new();
        let mut camera = PerspectiveCamera::default();
        manager.resize(&c, &mut camera);
        assert!((camera.aspect - 2.0).abs() < 0.0001);
    }

    #[test]
    fn test_teardown() {
        let mut c = container(100, 100);
        let mut provider = HeadlessProvider::new();
        let mut manager = SurfaceManager::new();

        // before creation
        manager.teardown(&mut c);

        manager.ensure_surfaces(&mut c, &mut provider).unwrap();
        manager.add_composer();
        manager.start_rendering();
        manager.teardown(&mut c);
        manager.teardown(&mut c);

        assert!(!manager.has_surfaces());
        assert!(manager.pipeline().is_none());
        assert!(!manager.is_rendering());
        assert_eq!(c.child_count(), 0);
        let raster: SurfaceStats = provider.raster_stats().borrow().clone();
        assert!(!raster.attached);
        assert!(!provider.overlay_stats().borrow().attached);
    }

    #[test]
    fn test_reference_space_names() {
        assert_eq!(ReferenceSpace::default(), ReferenceSpace::LocalFloor);
        assert_eq!(ReferenceSpace::BoundedFloor.as_str(), "bounded-floor");
    }
}
