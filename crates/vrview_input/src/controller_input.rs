//! Controller bindings and pick/drag handling
//!
//! Each binding owns a controller node in the scene with a short line
//! indicator under it. Picking reparents the nearest hit object under the
//! controller node while keeping its world transform; releasing moves it
//! back under the scene root, again keeping its world transform. The binding
//! only remembers the held object's key; the scene graph owns the object.

use vrview_core::{Node, NodeKey, Ray, Raycaster, SceneGraph, Shape, Transform};
use vrview_math::Vec3;
use vrview_render::{ControllerState, GamepadId, RasterSurface};

/// Number of controller slots
pub const CONTROLLER_SLOTS: usize = 2;

/// Input from a tracked controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    SelectStart(usize),
    SelectEnd(usize),
}

/// A controller bound to the scene
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerBinding {
    pub index: usize,
    pub gamepad: Option<GamepadId>,
    /// Controller node under the scene root
    pub node: NodeKey,
    /// Line indicator under the controller node
    pub indicator: NodeKey,
    selected: Option<NodeKey>,
}

impl ControllerBinding {
    /// The object currently held, if any
    pub fn selected(&self) -> Option<NodeKey> {
        self.selected
    }
}

/// Line from the controller origin one unit forward, grey fading to black
pub fn indicator_line() -> Node {
    Node::new("controller indicator").with_shape(Shape::Line {
        points: vec![Vec3::ZERO, Vec3::FORWARD],
        colors: vec![Vec3::splat(0.5), Vec3::ZERO],
    })
}

/// Owns both controller bindings
#[derive(Default)]
pub struct ControllerInputManager {
    bindings: [Option<ControllerBinding>; CONTROLLER_SLOTS],
    raycaster: Raycaster,
}

impl ControllerInputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binding(&self, index: usize) -> Option<&ControllerBinding> {
        self.bindings.get(index).and_then(|b| b.as_ref())
    }

    /// Number of bound controllers
    pub fn bound_count(&self) -> usize {
        self.bindings.iter().flatten().count()
    }

    /// Release both bindings, then bind whatever the surface reports
    ///
    /// Returns the number of controllers bound.
    pub fn rebind(&mut self, scene: &mut SceneGraph, surface: &dyn RasterSurface) -> usize {
        self.release_all(scene);
        for index in 0..CONTROLLER_SLOTS {
            if let Some(state) = surface.controller(index) {
                self.bind(scene, state);
            }
        }
        log::info!("{} controller(s) bound", self.bound_count());
        self.bound_count()
    }

    fn bind(&mut self, scene: &mut SceneGraph, state: ControllerState) {
        let node = scene.add(
            Node::new(format!("controller {}", state.index))
                .with_transform(Transform::from_matrix(state.pose)),
        );
        let indicator = match scene.add_child(node, indicator_line()) {
            Ok(key) => key,
            Err(e) => {
                log::warn!("Failed to add controller indicator: {}", e);
                return;
            }
        };
        if let Some(slot) = self.bindings.get_mut(state.index) {
            *slot = Some(ControllerBinding {
                index: state.index,
                gamepad: state.gamepad,
                node,
                indicator,
                selected: None,
            });
        }
    }

    /// Drop the binding in `index`, returning any held object to the scene root
    pub fn release(&mut self, index: usize, scene: &mut SceneGraph) {
        let Some(binding) = self.bindings.get_mut(index).and_then(|b| b.take()) else {
            return;
        };
        if let Some(object) = binding.selected {
            if let Err(e) = scene.attach(object, scene.root()) {
                log::warn!("Failed to return held object to the scene: {}", e);
            }
        }
        if let Err(e) = scene.remove(binding.node) {
            log::debug!("Controller node already gone: {}", e);
        }
    }

    pub fn release_all(&mut self, scene: &mut SceneGraph) {
        for index in 0..CONTROLLER_SLOTS {
            self.release(index, scene);
        }
    }

    /// Copy controller poses from the surface onto the controller nodes
    pub fn sync_poses(&self, scene: &mut SceneGraph, surface: &dyn RasterSurface) {
        for binding in self.bindings.iter().flatten() {
            let Some(state) = surface.controller(binding.index) else {
                continue;
            };
            if let Some(node) = scene.get_mut(binding.node) {
                node.transform = Transform::from_matrix(state.pose);
            }
        }
    }

    pub fn handle_event(
        &mut self,
        event: ControllerEvent,
        scene: &mut SceneGraph,
        pickable: &[NodeKey],
    ) -> Option<NodeKey> {
        match event {
            ControllerEvent::SelectStart(index) => self.select_start(index, scene, pickable),
            ControllerEvent::SelectEnd(index) => self.select_end(index, scene),
        }
    }

    /// Pick the nearest object along the controller's forward ray
    ///
    /// The object is reparented under the controller with its world transform
    /// unchanged. Returns the picked object.
    pub fn select_start(
        &mut self,
        index: usize,
        scene: &mut SceneGraph,
        pickable: &[NodeKey],
    ) -> Option<NodeKey> {
        let (node, holding) = {
            let binding = self.binding(index)?;
            (binding.node, binding.selected.is_some())
        };
        if holding {
            return None;
        }

        let held: Vec<NodeKey> = self.bindings.iter().flatten().filter_map(|b| b.selected).collect();
        let candidates: Vec<NodeKey> = pickable
            .iter()
            .copied()
            .filter(|key| !held.contains(key))
            .collect();

        let ray = Ray::from_world_matrix(scene.world_matrix(node));
        let hit = self
            .raycaster
            .intersect_objects(scene, &ray, &candidates)
            .into_iter()
            .next()?;

        if let Err(e) = scene.attach(hit.node, node) {
            log::warn!("Failed to pick object: {}", e);
            return None;
        }
        if let Some(binding) = self.bindings.get_mut(index).and_then(|b| b.as_mut()) {
            binding.selected = Some(hit.node);
        }
        Some(hit.node)
    }

    /// Put the held object back under the scene root, keeping its world transform
    pub fn select_end(&mut self, index: usize, scene: &mut SceneGraph) -> Option<NodeKey> {
        let binding = self.bindings.get_mut(index).and_then(|b| b.as_mut())?;
        let object = binding.selected.take()?;
        if let Err(e) = scene.attach(object, scene.root()) {
            log::warn!("Failed to release object: {}", e);
        }
        Some(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;
    use vrview_math::Quat;
    use vrview_render::headless::{HeadlessRaster, SharedStats};

    const EPSILON: f32 = 0.0001;

    fn surface_with(controllers: Vec<ControllerState>) -> HeadlessRaster {
        let stats = SharedStats::default();
        stats.borrow_mut().controllers = controllers;
        HeadlessRaster::new(stats)
    }

    fn controller_at(index: usize, transform: Transform) -> ControllerState {
        ControllerState {
            index,
            gamepad: Some(GamepadId(index as u32)),
            pose: transform.to_matrix(),
        }
    }

    fn scene_with_target() -> (SceneGraph, NodeKey) {
        let mut scene = SceneGraph::default();
        let target = scene.add(
            Node::new("target")
                .with_transform(Transform {
                    position: Vec3::new(0.3, 1.2, -3.0),
                    rotation: Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalized(), 0.7),
                    scale: Vec3::new(1.0, 2.0, 0.5),
                })
                .with_shape(Shape::Sphere { radius: 0.5 })
                .pickable(),
        );
        (scene, target)
    }

    #[test]
    fn test_rebind_creates_nodes_with_indicator() {
        let (mut scene, _) = scene_with_target();
        let surface = surface_with(vec![
            controller_at(0, Transform::identity()),
            controller_at(1, Transform::from_position(Vec3::X)),
        ]);
        let mut input = ControllerInputManager::new();

        assert_eq!(input.rebind(&mut scene, &surface), 2);
        assert_eq!(scene.len(), 5);

        let binding = input.binding(1).unwrap();
        assert_eq!(binding.gamepad, Some(GamepadId(1)));
        assert_eq!(scene.get(binding.indicator).and_then(|n| n.parent()), Some(binding.node));
        match scene.get(binding.indicator).and_then(|n| n.shape.clone()) {
            Some(Shape::Line { points, colors }) => {
                assert_eq!(points, vec![Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0)]);
                assert_eq!(colors, vec![Vec3::splat(0.5), Vec3::ZERO]);
            }
            other => panic!("Expected indicator line, got {:?}", other),
        }

        // rebinding replaces rather than accumulates
        input.rebind(&mut scene, &surface);
        assert_eq!(scene.len(), 5);
    }

    #[test]
    fn test_pick_and_release_preserves_world_transform() {
        let (mut scene, target) = scene_with_target();
        let before = scene.world_transform(target);

        // controller somewhere off-axis, rotated, aiming at the target
        let origin = Vec3::new(0.3, 1.2, 1.0);
        let surface = surface_with(vec![controller_at(
            0,
            Transform::from_position_rotation(origin, Quat::from_axis_angle(Vec3::Z, FRAC_PI_4)),
        )]);
        let mut input = ControllerInputManager::new();
        input.rebind(&mut scene, &surface);

        let picked = input.select_start(0, &mut scene, &[target]);
        assert_eq!(picked, Some(target));
        let controller = input.binding(0).unwrap().node;
        assert_eq!(scene.get(target).and_then(|n| n.parent()), Some(controller));
        assert!(scene.world_transform(target).approx_eq(&before, EPSILON));

        assert_eq!(input.select_end(0, &mut scene), Some(target));
        assert_eq!(scene.get(target).and_then(|n| n.parent()), Some(scene.root()));
        assert!(input.binding(0).unwrap().selected().is_none());

        let after = scene.world_transform(target);
        assert!(after.approx_eq(&before, EPSILON), "before {:?} after {:?}", before, after);
    }

    #[test]
    fn test_held_object_follows_controller() {
        let (mut scene, target) = scene_with_target();
        let stats = SharedStats::default();
        stats.borrow_mut().controllers =
            vec![controller_at(0, Transform::from_position(Vec3::new(0.3, 1.2, 0.0)))];
        let surface = HeadlessRaster::new(stats.clone());
        let mut input = ControllerInputManager::new();
        input.rebind(&mut scene, &surface);
        input.select_start(0, &mut scene, &[target]).unwrap();

        stats.borrow_mut().controllers[0].pose =
            Transform::from_position(Vec3::new(1.3, 1.2, 0.0)).to_matrix();
        input.sync_poses(&mut scene, &surface);
        input.select_end(0, &mut scene);

        assert!(scene
            .world_position(target)
            .approx_eq(Vec3::new(1.3, 1.2, -3.0), EPSILON));
    }

    #[test]
    fn test_miss_selects_nothing() {
        let (mut scene, target) = scene_with_target();
        // aiming straight up
        let surface = surface_with(vec![controller_at(
            0,
            Transform::from_position_rotation(Vec3::ZERO, Quat::from_axis_angle(Vec3::X, std::f32::consts::FRAC_PI_2)),
        )]);
        let mut input = ControllerInputManager::new();
        input.rebind(&mut scene, &surface);

        assert!(input.select_start(0, &mut scene, &[target]).is_none());
        assert!(input.select_end(0, &mut scene).is_none());
    }

    #[test]
    fn test_unbound_index_is_ignored() {
        let (mut scene, target) = scene_with_target();
        let mut input = ControllerInputManager::new();
        assert!(input
            .handle_event(ControllerEvent::SelectStart(1), &mut scene, &[target])
            .is_none());
        assert!(input.handle_event(ControllerEvent::SelectEnd(5), &mut scene, &[]).is_none());
    }

    #[test]
    fn test_release_returns_held_object() {
        let (mut scene, target) = scene_with_target();
        let before = scene.world_transform(target);
        let surface = surface_with(vec![controller_at(0, Transform::from_position(Vec3::new(0.3, 1.2, 0.0)))]);
        let mut input = ControllerInputManager::new();
        input.rebind(&mut scene, &surface);
        input.select_start(0, &mut scene, &[target]).unwrap();

        input.release_all(&mut scene);

        assert_eq!(input.bound_count(), 0);
        assert!(scene.contains(target));
        assert_eq!(scene.len(), 1);
        assert!(scene.world_transform(target).approx_eq(&before, EPSILON));
    }

    #[test]
    fn test_object_held_by_other_controller_is_skipped() {
        let (mut scene, target) = scene_with_target();
        let surface = surface_with(vec![
            controller_at(0, Transform::from_position(Vec3::new(0.3, 1.2, 0.0))),
            controller_at(1, Transform::from_position(Vec3::new(0.3, 1.2, 0.5))),
        ]);
        let mut input = ControllerInputManager::new();
        input.rebind(&mut scene, &surface);

        assert_eq!(input.select_start(0, &mut scene, &[target]), Some(target));
        assert!(input.select_start(1, &mut scene, &[target]).is_none());
    }
}
