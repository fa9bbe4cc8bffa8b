//! Scene serialization
//!
//! A [`SceneTemplate`] is a RON description of the objects that populate the
//! main scene and the overlay scene. Instantiating a template adds nodes to
//! existing graphs and reports which of them are pickable.

use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::asset_error::AssetError;
use crate::graph::{Node, NodeKey, SceneGraph, Shape};
use crate::Transform;

fn default_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

fn default_pickable() -> bool {
    true
}

/// A serializable object description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    /// Object name
    pub name: String,
    /// Geometry
    pub shape: Shape,
    /// Placement under the scene root
    #[serde(default)]
    pub transform: Transform,
    /// RGBA colour
    #[serde(default = "default_color")]
    pub color: [f32; 4],
    /// Whether controllers can pick the object
    #[serde(default = "default_pickable")]
    pub pickable: bool,
}

impl ObjectTemplate {
    pub fn new(name: impl Into<String>, shape: Shape, transform: Transform) -> Self {
        Self {
            name: name.into(),
            shape,
            transform,
            color: default_color(),
            pickable: true,
        }
    }

    /// Builder: set the colour
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Builder: exclude from controller picking
    pub fn not_pickable(mut self) -> Self {
        self.pickable = false;
        self
    }

    fn to_node(&self) -> Node {
        let node = Node::new(self.name.clone())
            .with_transform(self.transform)
            .with_shape(self.shape.clone())
            .with_color(self.color);
        if self.pickable {
            node.pickable()
        } else {
            node
        }
    }
}

/// A serializable scene description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTemplate {
    /// Scene name (for display/debugging)
    pub name: String,
    /// Objects for the main (raster) scene
    #[serde(default)]
    pub objects: Vec<ObjectTemplate>,
    /// Objects for the overlay scene
    #[serde(default)]
    pub overlay: Vec<ObjectTemplate>,
    /// Camera start position [x, y, z]
    #[serde(default)]
    pub camera_position: Option<[f32; 3]>,
}

impl SceneTemplate {
    /// Create a new empty template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            overlay: Vec::new(),
            camera_position: None,
        }
    }

    /// Load a template from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let template = Self::from_ron(&contents)?;
        log::debug!(
            "Loaded scene template '{}' from {} ({} objects)",
            template.name,
            path.display(),
            template.objects.len()
        );
        Ok(template)
    }

    /// Parse a template from RON text
    pub fn from_ron(contents: &str) -> Result<Self, AssetError> {
        Ok(ron::from_str(contents)?)
    }

    /// Save the template to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AssetError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Add an object to the main scene
    pub fn add_object(&mut self, object: ObjectTemplate) {
        self.objects.push(object);
    }

    /// Populate `scene` and `overlay` with this template's objects
    ///
    /// Returns the keys of pickable main-scene objects.
    pub fn instantiate(&self, scene: &mut SceneGraph, overlay: &mut SceneGraph) -> Vec<NodeKey> {
        let mut pickable = Vec::new();
        for object in &self.objects {
            let key = scene.add(object.to_node());
            if object.pickable {
                pickable.push(key);
            }
        }
        for object in &self.overlay {
            overlay.add(object.to_node());
        }
        pickable
    }
}
