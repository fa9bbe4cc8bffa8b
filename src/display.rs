//! Animation display
//!
//! [`AnimationDisplay`] wires the viewport, the render surfaces, the effect
//! pipeline, the VR session and controller input together behind the
//! lifecycle a host drives: `init` once, `create_scene`, one
//! `on_animation_frame` per display refresh, `update_view` on resize, and
//! `destroy` once at the end.

use std::path::Path;

use vrview_core::{Node, NodeKey, PerspectiveCamera, SceneGraph, SceneTemplate, Vec3};
use vrview_input::{ControllerEvent, ControllerInputManager};
use vrview_render::{
    Container, Orientation, RenderError, SurfaceManager, SurfaceProvider, UniformValue,
    ViewportMetrics,
};
use vrview_xr::{
    DeviceBackend, DeviceSessionController, SessionError, SessionEvent, SessionNotice, SessionState,
};

use crate::config::AppConfig;

/// Frame timing widget shown next to the display
pub trait StatsWidget {
    /// Add the widget to the host
    fn attach(&mut self);
    /// Start timing a frame
    fn begin(&mut self);
    /// Stop timing a frame
    fn end(&mut self);
    /// Remove the widget from the host
    fn detach(&mut self);
}

/// Pointer position in container pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub button: Option<u16>,
}

/// A key press or release
#[derive(Clone, Debug, PartialEq)]
pub struct KeyEvent {
    pub code: String,
}

/// Pointer and keyboard hooks for viewers built on the display
///
/// Every method does nothing by default.
pub trait InputHooks {
    fn on_mouse_down(&mut self, _event: &PointerEvent) {}
    fn on_mouse_up(&mut self, _event: &PointerEvent) {}
    fn on_mouse_move(&mut self, _event: &PointerEvent) {}
    fn on_context_menu(&mut self, _event: &PointerEvent) {}
    fn on_key_down(&mut self, _event: &KeyEvent) {}
    fn on_key_up(&mut self, _event: &KeyEvent) {}
}

/// Hooks that ignore everything
pub struct NoHooks;

impl InputHooks for NoHooks {}

/// The viewer component
pub struct AnimationDisplay {
    config: AppConfig,
    container: Box<dyn Container>,
    provider: Box<dyn SurfaceProvider>,
    surfaces: SurfaceManager,
    session: DeviceSessionController,
    input: ControllerInputManager,
    hooks: Box<dyn InputHooks>,
    stats: Option<Box<dyn StatsWidget>>,
    stats_attached: bool,
    scene: Option<SceneGraph>,
    overlay_scene: Option<SceneGraph>,
    camera: Option<PerspectiveCamera>,
    /// Pickable objects
    objects: Vec<NodeKey>,
    orientation: Orientation,
    destroyed: bool,
}

impl AnimationDisplay {
    pub fn new(
        container: Box<dyn Container>,
        provider: Box<dyn SurfaceProvider>,
        backend: Box<dyn DeviceBackend>,
        config: AppConfig,
    ) -> Self {
        let session = DeviceSessionController::new(backend, config.vr.to_session_config());
        Self {
            config,
            container,
            provider,
            surfaces: SurfaceManager::new(),
            session,
            input: ControllerInputManager::new(),
            hooks: Box::new(NoHooks),
            stats: None,
            stats_attached: false,
            scene: None,
            overlay_scene: None,
            camera: None,
            objects: Vec::new(),
            orientation: Orientation::Landscape,
            destroyed: false,
        }
    }

    /// Builder: frame timing widget attached by [`AnimationDisplay::create_scene`]
    pub fn with_stats(mut self, stats: Box<dyn StatsWidget>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Builder: pointer and keyboard hooks
    pub fn with_hooks(mut self, hooks: Box<dyn InputHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Create scenes, camera and render surfaces
    ///
    /// Anything that already exists is kept. Displays left presenting by an
    /// earlier run are told to stop. Does nothing after `destroy`.
    pub fn init(&mut self) -> Result<(), RenderError> {
        if self.destroyed {
            log::warn!("init called on a destroyed display; ignoring");
            return Ok(());
        }
        self.ensure_scenes();
        if self.camera.is_none() {
            let cam = &self.config.camera;
            self.camera = Some(
                PerspectiveCamera::new(cam.fov, 1.0, cam.near, cam.far)
                    .with_position(cam.start_position()),
            );
        }

        self.surfaces
            .ensure_surfaces(&mut *self.container, &mut *self.provider)?;
        self.update_view();
        self.session.release_active_displays();
        Ok(())
    }

    fn ensure_scenes(&mut self) {
        if self.scene.is_none() {
            self.scene = Some(SceneGraph::new("Scene"));
        }
        if self.overlay_scene.is_none() {
            self.overlay_scene = Some(SceneGraph::new("Overlay"));
        }
    }

    /// Attach the stats widget and start rendering
    pub fn create_scene(&mut self) {
        if let Some(stats) = self.stats.as_mut() {
            if !self.stats_attached {
                stats.attach();
                self.stats_attached = true;
            }
        }
        self.start_rendering();
    }

    /// Build the default effect chain with the configured vignette
    ///
    /// Returns `false` when the surfaces are missing or a chain exists.
    pub fn add_composer(&mut self) -> bool {
        if !self.surfaces.add_composer() {
            return false;
        }
        let effects = &self.config.effects;
        if let Some(vignette) = self.surfaces.pipeline_mut().and_then(|p| p.pass_mut(1)) {
            vignette.set_uniform("offset", UniformValue::Float(effects.vignette_offset));
            vignette.set_uniform("darkness", UniformValue::Float(effects.vignette_darkness));
        }
        log::info!("Effect pipeline built");
        true
    }

    pub fn start_rendering(&mut self) {
        self.surfaces.start_rendering();
    }

    /// Render one frame
    ///
    /// Returns whether anything was drawn.
    pub fn on_animation_frame(&mut self) -> bool {
        let (Some(scene), Some(overlay_scene), Some(camera)) =
            (self.scene.as_mut(), self.overlay_scene.as_ref(), self.camera.as_ref())
        else {
            return false;
        };

        if self.session.state() == SessionState::Presenting {
            if let Some(raster) = self.surfaces.raster() {
                self.input.sync_poses(scene, raster);
            }
        }

        if let Some(stats) = self.stats.as_mut() {
            stats.begin();
        }
        let drawn = self.surfaces.render_tick(scene, overlay_scene, camera);
        if let Some(stats) = self.stats.as_mut() {
            stats.end();
        }
        drawn
    }

    /// Resize surfaces, pipeline and the display's camera to the container
    pub fn update_view(&mut self) -> ViewportMetrics {
        let metrics = match self.camera.as_mut() {
            Some(camera) => self.surfaces.resize(&*self.container, camera),
            // no camera yet; only the surfaces follow
            None => self
                .surfaces
                .resize(&*self.container, &mut PerspectiveCamera::default()),
        };
        self.record_orientation(&metrics);
        metrics
    }

    /// Resize surfaces and pipeline, fitting `camera` instead of the display's own
    pub fn update_view_with(&mut self, camera: &mut PerspectiveCamera) -> ViewportMetrics {
        let metrics = self.surfaces.resize(&*self.container, camera);
        self.record_orientation(&metrics);
        metrics
    }

    fn record_orientation(&mut self, metrics: &ViewportMetrics) {
        let orientation = metrics.orientation();
        if orientation != self.orientation {
            log::debug!("Viewport is now {}", orientation.as_str());
            self.orientation = orientation;
        }
    }

    /// Start VR discovery, or leave VR when it is active
    pub fn toggle_vr_mode(&mut self) {
        self.session.toggle(self.surfaces.raster_mut());
        self.apply_notices();
    }

    /// Enter presentation on the bound device
    pub fn enter_vr(&mut self) -> Result<(), SessionError> {
        let result = self.session.enter(self.surfaces.raster_mut());
        self.apply_notices();
        result
    }

    pub fn exit_vr(&mut self) {
        self.session.exit(self.surfaces.raster_mut());
        self.apply_notices();
    }

    /// Feed a device answer or notification to the VR session
    pub fn handle_device_event(&mut self, event: SessionEvent) {
        self.session.handle_event(event, self.surfaces.raster_mut());
        self.apply_notices();
    }

    /// Route a controller select event; returns the object picked or released
    pub fn handle_controller_event(&mut self, event: ControllerEvent) -> Option<NodeKey> {
        let scene = self.scene.as_mut()?;
        self.input.handle_event(event, scene, &self.objects)
    }

    /// Name of the current VR state
    pub fn vr_mode(&self) -> &'static str {
        self.session.state().as_str()
    }

    fn apply_notices(&mut self) {
        for notice in self.session.take_notices() {
            match notice {
                SessionNotice::StateChanged { from, to } => {
                    log::debug!("VR mode changed from {} to {}", from.as_str(), to.as_str());
                }
                SessionNotice::RebindControllers => {
                    if let (Some(scene), Some(raster)) = (self.scene.as_mut(), self.surfaces.raster()) {
                        self.input.rebind(scene, raster);
                    }
                }
                SessionNotice::ReleaseControllers => {
                    if let Some(scene) = self.scene.as_mut() {
                        self.input.release_all(scene);
                    }
                }
            }
        }
    }

    /// Add a node under the scene root; pickable nodes join the pick set
    pub fn add_object(&mut self, node: Node) -> NodeKey {
        let pickable = node.is_pickable();
        let scene = self.scene.get_or_insert_with(|| SceneGraph::new("Scene"));
        let key = scene.add(node);
        if pickable {
            self.objects.push(key);
        }
        key
    }

    /// Load a scene file into the display
    ///
    /// Failures are logged and leave the display untouched. Returns the
    /// number of pickable objects added.
    pub fn load_scene<P: AsRef<Path>>(&mut self, path: P) -> usize {
        let path = path.as_ref();
        match SceneTemplate::load(path) {
            Ok(template) => self.load_template(&template),
            Err(e) => {
                log::error!("Failed to load scene '{}': {}", path.display(), e);
                0
            }
        }
    }

    /// Instantiate a scene template into the display
    pub fn load_template(&mut self, template: &SceneTemplate) -> usize {
        let scene = self.scene.get_or_insert_with(|| SceneGraph::new("Scene"));
        let overlay = self.overlay_scene.get_or_insert_with(|| SceneGraph::new("Overlay"));
        let picked = template.instantiate(scene, overlay);
        let added = picked.len();
        self.objects.extend(picked);

        if let (Some([x, y, z]), Some(camera)) = (template.camera_position, self.camera.as_mut()) {
            camera.transform.position = Vec3::new(x, y, z);
        }
        log::info!(
            "Loaded scene '{}' ({} objects, {} pickable)",
            template.name,
            template.objects.len() + template.overlay.len(),
            added
        );
        added
    }

    /// Tear everything down
    ///
    /// Stops VR, releases controllers, detaches the surfaces, clears both
    /// scenes and the camera, and empties the container. Safe to call more
    /// than once and before `init`.
    pub fn destroy(&mut self) {
        self.exit_vr();
        if let Some(scene) = self.scene.as_mut() {
            self.input.release_all(scene);
        }

        self.surfaces.teardown(&mut *self.container);
        if let Some(stats) = self.stats.as_mut() {
            if self.stats_attached {
                stats.detach();
                self.stats_attached = false;
            }
        }

        if let Some(mut scene) = self.scene.take() {
            scene.clear();
        }
        if let Some(mut overlay) = self.overlay_scene.take() {
            overlay.clear();
        }
        self.camera = None;
        self.objects.clear();

        self.container.clear_children();
        if !self.destroyed {
            log::info!("Display destroyed");
        }
        self.destroyed = true;
    }

    pub fn on_mouse_down(&mut self, event: &PointerEvent) {
        self.hooks.on_mouse_down(event);
    }

    pub fn on_mouse_up(&mut self, event: &PointerEvent) {
        self.hooks.on_mouse_up(event);
    }

    pub fn on_mouse_move(&mut self, event: &PointerEvent) {
        self.hooks.on_mouse_move(event);
    }

    pub fn on_context_menu(&mut self, event: &PointerEvent) {
        self.hooks.on_context_menu(event);
    }

    pub fn on_key_down(&mut self, event: &KeyEvent) {
        self.hooks.on_key_down(event);
    }

    pub fn on_key_up(&mut self, event: &KeyEvent) {
        self.hooks.on_key_up(event);
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn container(&self) -> &dyn Container {
        &*self.container
    }

    pub fn surfaces(&self) -> &SurfaceManager {
        &self.surfaces
    }

    pub fn session(&self) -> &DeviceSessionController {
        &self.session
    }

    pub fn input(&self) -> &ControllerInputManager {
        &self.input
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn overlay_scene(&self) -> Option<&SceneGraph> {
        self.overlay_scene.as_ref()
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.camera.as_ref()
    }

    /// Pickable objects
    pub fn objects(&self) -> &[NodeKey] {
        &self.objects
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vrview_render::headless::HeadlessProvider;
    use vrview_render::{LayerId, LayerKind};
    use vrview_xr::UnsupportedBackend;

    #[derive(Default)]
    struct Recorded {
        calls: Vec<&'static str>,
    }

    struct RecordingHooks(Rc<RefCell<Recorded>>);

    impl InputHooks for RecordingHooks {
        fn on_mouse_down(&mut self, _event: &PointerEvent) {
            self.0.borrow_mut().calls.push("mouse_down");
        }

        fn on_key_up(&mut self, _event: &KeyEvent) {
            self.0.borrow_mut().calls.push("key_up");
        }
    }

    struct FixedContainer {
        children: usize,
    }

    impl Container for FixedContainer {
        fn client_width(&self) -> u32 {
            400
        }
        fn client_height(&self) -> u32 {
            800
        }
        fn device_pixel_ratio(&self) -> f64 {
            1.0
        }
        fn append_layer(&mut self, _kind: LayerKind, _z_index: i32) -> LayerId {
            self.children += 1;
            LayerId(self.children as u32)
        }
        fn remove_layer(&mut self, _id: LayerId) {
            self.children = self.children.saturating_sub(1);
        }
        fn clear_children(&mut self) {
            self.children = 0;
        }
        fn child_count(&self) -> usize {
            self.children
        }
        fn register_keyboard_passthrough(&mut self) {}
    }

    fn display() -> AnimationDisplay {
        AnimationDisplay::new(
            Box::new(FixedContainer { children: 0 }),
            Box::new(HeadlessProvider::new()),
            Box::new(UnsupportedBackend::new()),
            AppConfig::default(),
        )
    }

    #[test]
    fn test_hooks_default_to_noop() {
        let mut display = display();
        display.on_mouse_move(&PointerEvent::default());
        display.on_key_down(&KeyEvent { code: "KeyA".into() });
    }

    #[test]
    fn test_hooks_are_forwarded() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut display = display().with_hooks(Box::new(RecordingHooks(Rc::clone(&recorded))));
        display.on_mouse_down(&PointerEvent::default());
        display.on_mouse_up(&PointerEvent::default());
        display.on_key_up(&KeyEvent { code: "KeyV".into() });
        assert_eq!(recorded.borrow().calls, vec!["mouse_down", "key_up"]);
    }

    #[test]
    fn test_portrait_container() {
        let mut display = display();
        display.init().unwrap();
        assert_eq!(display.orientation(), Orientation::Portrait);
        assert!((display.camera().unwrap().aspect - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_camera_starts_at_configured_position() {
        let mut display = display();
        display.init().unwrap();
        let position = display.camera().unwrap().position();
        assert!(position.approx_eq(Vec3::new(0.0, 1.6, 3.0), 0.0001));
    }

    #[test]
    fn test_add_object_tracks_pickables() {
        let mut display = display();
        display.add_object(Node::new("wall"));
        let ball = display.add_object(Node::new("ball").pickable());
        assert_eq!(display.objects(), &[ball]);
        assert_eq!(display.scene().unwrap().len(), 2);
    }

    #[test]
    fn test_composer_uses_configured_vignette() {
        let mut config = AppConfig::default();
        config.effects.vignette_darkness = 1.5;
        let mut display = AnimationDisplay::new(
            Box::new(FixedContainer { children: 0 }),
            Box::new(HeadlessProvider::new()),
            Box::new(UnsupportedBackend::new()),
            config,
        );
        assert!(!display.add_composer());

        display.init().unwrap();
        assert!(display.add_composer());
        assert!(!display.add_composer());

        let pipeline = display.surfaces().pipeline().unwrap();
        assert_eq!(pipeline.passes()[1].uniform("darkness"), Some(UniformValue::Float(1.5)));
        assert_eq!(pipeline.passes()[1].uniform("offset"), Some(UniformValue::Float(0.33)));
    }
}
