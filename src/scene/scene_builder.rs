//! SceneBuilder - Declarative scene construction
//!
//! Provides a fluent API for building scene templates in code, used for the
//! built-in scene when no scene file is available.

use vrview_core::{ObjectTemplate, SceneTemplate, Shape, Transform, Vec3};

/// Builder for constructing scene templates
///
/// # Example
/// ```ignore
/// let template = SceneBuilder::new("Demo")
///     .add_floor(0.0, 10.0)
///     .add_sphere("ball", Vec3::new(0.0, 1.2, -2.0), 0.3)
///     .with_camera_position(Vec3::new(0.0, 1.6, 3.0))
///     .build();
/// ```
pub struct SceneBuilder {
    template: SceneTemplate,
}

impl SceneBuilder {
    /// Create a new scene builder
    pub fn new(name: &str) -> Self {
        Self {
            template: SceneTemplate::new(name),
        }
    }

    /// Add a thin floor slab with its top at `y`
    ///
    /// The floor is not pickable.
    pub fn add_floor(mut self, y: f32, size: f32) -> Self {
        let thickness = 0.01;
        let floor = ObjectTemplate::new(
            "floor",
            Shape::Cuboid {
                half_extents: Vec3::new(size / 2.0, thickness, size / 2.0),
            },
            Transform::from_position(Vec3::new(0.0, y - thickness, 0.0)),
        )
        .with_color([0.3, 0.3, 0.35, 1.0])
        .not_pickable();
        self.template.add_object(floor);
        self
    }

    /// Add a pickable sphere
    pub fn add_sphere(mut self, name: &str, position: Vec3, radius: f32) -> Self {
        self.template.add_object(ObjectTemplate::new(
            name,
            Shape::Sphere { radius },
            Transform::from_position(position),
        ));
        self
    }

    /// Add a pickable cube
    pub fn add_cube(mut self, name: &str, position: Vec3, size: f32) -> Self {
        self.template.add_object(ObjectTemplate::new(
            name,
            Shape::Cuboid {
                half_extents: Vec3::splat(size / 2.0),
            },
            Transform::from_position(position),
        ));
        self
    }

    /// Add a custom object to the main scene
    pub fn add_object(mut self, object: ObjectTemplate) -> Self {
        self.template.add_object(object);
        self
    }

    /// Add an object to the overlay scene
    pub fn add_overlay(mut self, object: ObjectTemplate) -> Self {
        self.template.overlay.push(object);
        self
    }

    pub fn with_camera_position(mut self, position: Vec3) -> Self {
        self.template.camera_position = Some([position.x, position.y, position.z]);
        self
    }

    /// Build the scene template
    pub fn build(self) -> SceneTemplate {
        self.template
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new("Scene")
    }
}

/// Scene shown when no scene file can be loaded
pub fn default_scene() -> SceneTemplate {
    SceneBuilder::new("Default")
        .add_floor(0.0, 10.0)
        .add_cube("crate", Vec3::new(-0.6, 1.0, -1.5), 0.4)
        .add_sphere("ball", Vec3::new(0.6, 1.2, -1.5), 0.25)
        .with_camera_position(Vec3::new(0.0, 1.6, 1.0))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrview_core::SceneGraph;

    #[test]
    fn test_empty_scene() {
        let template = SceneBuilder::default().build();
        assert_eq!(template.name, "Scene");
        assert!(template.objects.is_empty());
        assert!(template.camera_position.is_none());
    }

    #[test]
    fn test_floor_is_not_pickable() {
        let template = SceneBuilder::new("Test").add_floor(0.0, 4.0).build();
        assert_eq!(template.objects.len(), 1);
        assert!(!template.objects[0].pickable);
        assert_eq!(template.objects[0].name, "floor");
    }

    #[test]
    fn test_default_scene_instantiates() {
        let template = default_scene();
        let mut scene = SceneGraph::new("Scene");
        let mut overlay = SceneGraph::new("Overlay");
        let pickable = template.instantiate(&mut scene, &mut overlay);

        assert_eq!(scene.len(), 3);
        assert_eq!(pickable.len(), 2);
        assert!(overlay.is_empty());
        assert!(scene.find_by_name("ball").is_some());
    }

    #[test]
    fn test_overlay_objects() {
        let label = ObjectTemplate::new(
            "label",
            Shape::Cuboid { half_extents: Vec3::new(0.5, 0.1, 0.01) },
            Transform::from_position(Vec3::new(0.0, 2.0, -2.0)),
        );
        let template = SceneBuilder::new("Test").add_overlay(label).build();
        assert_eq!(template.overlay.len(), 1);
        assert!(template.objects.is_empty());
    }
}
