//! Scene graph
//!
//! A [`SceneGraph`] owns every node in a scene. Nodes form a tree under a
//! single root; each node stores its transform relative to its parent.
//! Other components refer to nodes by [`NodeKey`] only, never by ownership.

use bitflags::bitflags;
use serde::{Serialize, Deserialize};
use slotmap::{new_key_type, SlotMap};
use vrview_math::{mat4, Mat4, Vec3};

use crate::Transform;

new_key_type! {
    /// Generational key to a node in a [`SceneGraph`]
    pub struct NodeKey;
}

bitflags! {
    /// Per-node behaviour flags
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Node is drawn
        const VISIBLE = 1 << 0;
        /// Node takes part in controller ray picking
        const PICKABLE = 1 << 1;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::VISIBLE
    }
}

/// Geometry attached to a node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Sphere centred on the node origin
    Sphere { radius: f32 },
    /// Axis-aligned box (in node space) centred on the node origin
    Cuboid { half_extents: Vec3 },
    /// Polyline with one colour per point; never hit by rays
    Line { points: Vec<Vec3>, colors: Vec<Vec3> },
}

/// A node in the scene graph
#[derive(Clone, Debug)]
pub struct Node {
    /// Display name (not required to be unique)
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Transform,
    /// Optional geometry
    pub shape: Option<Shape>,
    /// Behaviour flags
    pub flags: NodeFlags,
    /// RGBA colour
    pub color: [f32; 4],
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Node {
    /// Create an empty (group) node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            shape: None,
            flags: NodeFlags::default(),
            color: [1.0, 1.0, 1.0, 1.0],
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder: set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder: set the geometry
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Builder: set the colour
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Builder: mark the node as pickable by controller rays
    pub fn pickable(mut self) -> Self {
        self.flags |= NodeFlags::PICKABLE;
        self
    }

    /// Parent node (`None` only for the root)
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Direct children in insertion order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn is_pickable(&self) -> bool {
        self.flags.contains(NodeFlags::PICKABLE)
    }
}

/// Error for invalid graph edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The key does not refer to a live node
    MissingNode,
    /// The root node cannot be moved or removed
    RootImmutable,
    /// The new parent is a descendant of the node
    WouldCycle,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::MissingNode => write!(f, "Node does not exist"),
            GraphError::RootImmutable => write!(f, "The root node cannot be moved or removed"),
            GraphError::WouldCycle => write!(f, "Reparenting would create a cycle"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Tree of nodes under a single root
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new("Scene")
    }
}

impl SceneGraph {
    /// Create a graph containing only a root node
    pub fn new(name: impl Into<String>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(name));
        Self { nodes, root }
    }

    /// The root node key
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of nodes, excluding the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the graph contains only its root
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Iterate over all nodes except the root
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        let root = self.root;
        self.nodes.iter().filter(move |(key, _)| *key != root)
    }

    /// Find the first node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.iter().find(|(_, node)| node.name == name).map(|(key, _)| key)
    }

    /// Add a node under the root
    pub fn add(&mut self, node: Node) -> NodeKey {
        let root = self.root;
        self.insert_under(root, node)
    }

    /// Add a node under `parent`
    pub fn add_child(&mut self, parent: NodeKey, node: Node) -> Result<NodeKey, GraphError> {
        if !self.nodes.contains_key(parent) {
            return Err(GraphError::MissingNode);
        }
        Ok(self.insert_under(parent, node))
    }

    fn insert_under(&mut self, parent: NodeKey, mut node: Node) -> NodeKey {
        node.parent = Some(parent);
        node.children.clear();
        let key = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        key
    }

    /// Remove a node and its whole subtree
    ///
    /// Returns the removed node itself; descendants are dropped.
    pub fn remove(&mut self, key: NodeKey) -> Result<Node, GraphError> {
        if key == self.root {
            return Err(GraphError::RootImmutable);
        }
        if !self.nodes.contains_key(key) {
            return Err(GraphError::MissingNode);
        }

        self.detach_from_parent(key);

        let mut stack: Vec<NodeKey> = self.nodes[key].children.clone();
        while let Some(child) = stack.pop() {
            if let Some(node) = self.nodes.remove(child) {
                stack.extend(node.children);
            }
        }

        self.nodes.remove(key).ok_or(GraphError::MissingNode)
    }

    /// Remove every node except the root
    pub fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|key, _| key == root);
        if let Some(root) = self.nodes.get_mut(root) {
            root.children.clear();
        }
    }

    /// Whether `ancestor` is on the parent chain of `key` (or equal to it)
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(k).and_then(|n| n.parent);
        }
        false
    }

    /// Move `key` under `parent`, keeping its local transform
    ///
    /// The node's world placement changes if the parents' world placements differ.
    pub fn set_parent(&mut self, key: NodeKey, parent: NodeKey) -> Result<(), GraphError> {
        if key == self.root {
            return Err(GraphError::RootImmutable);
        }
        if !self.nodes.contains_key(key) || !self.nodes.contains_key(parent) {
            return Err(GraphError::MissingNode);
        }
        if self.is_ancestor(key, parent) {
            return Err(GraphError::WouldCycle);
        }

        self.detach_from_parent(key);
        self.nodes[key].parent = Some(parent);
        self.nodes[parent].children.push(key);
        Ok(())
    }

    /// Move `key` under `parent`, keeping its world transform
    ///
    /// The local transform becomes `inverse(parent_world) * node_world`.
    pub fn attach(&mut self, key: NodeKey, parent: NodeKey) -> Result<(), GraphError> {
        if !self.nodes.contains_key(key) || !self.nodes.contains_key(parent) {
            return Err(GraphError::MissingNode);
        }
        let node_world = self.world_matrix(key);
        let parent_world = self.world_matrix(parent);

        self.set_parent(key, parent)?;

        let parent_inverse = mat4::inverse(parent_world).unwrap_or(mat4::IDENTITY);
        let local = mat4::mul(parent_inverse, node_world);
        self.nodes[key].transform = Transform::from_matrix(local);
        Ok(())
    }

    /// World matrix of a node (product of the parent chain)
    ///
    /// A missing key yields the identity.
    pub fn world_matrix(&self, key: NodeKey) -> Mat4 {
        let mut m = mat4::IDENTITY;
        let mut current = Some(key);
        while let Some(k) = current {
            match self.nodes.get(k) {
                Some(node) => {
                    m = mat4::mul(node.transform.to_matrix(), m);
                    current = node.parent;
                }
                None => break,
            }
        }
        m
    }

    /// World transform of a node
    pub fn world_transform(&self, key: NodeKey) -> Transform {
        Transform::from_matrix(self.world_matrix(key))
    }

    /// World position of a node
    pub fn world_position(&self, key: NodeKey) -> Vec3 {
        mat4::get_position(self.world_matrix(key))
    }

    fn detach_from_parent(&mut self, key: NodeKey) {
        if let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) {
            if let Some(p) = self.nodes.get_mut(parent) {
                p.children.retain(|c| *c != key);
            }
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrview_math::Quat;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.0001;

    fn positioned(name: &str, pos: Vec3) -> Node {
        Node::new(name).with_transform(Transform::from_position(pos))
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph = SceneGraph::new("test");
        assert!(graph.is_empty());
        assert!(graph.contains(graph.root()));
        assert_eq!(graph.get(graph.root()).unwrap().name, "test");
    }

    #[test]
    fn test_add_and_find() {
        let mut graph = SceneGraph::default();
        let key = graph.add(Node::new("cube"));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.find_by_name("cube"), Some(key));
        assert_eq!(graph.get(key).unwrap().parent(), Some(graph.root()));
    }

    #[test]
    fn test_add_child_missing_parent() {
        let mut graph = SceneGraph::default();
        let key = graph.add(Node::new("a"));
        graph.remove(key).unwrap();
        assert_eq!(graph.add_child(key, Node::new("b")), Err(GraphError::MissingNode));
    }

    #[test]
    fn test_world_matrix_chains_parents() {
        let mut graph = SceneGraph::default();
        let parent = graph.add(positioned("parent", Vec3::new(1.0, 0.0, 0.0)));
        let child = graph.add_child(parent, positioned("child", Vec3::new(0.0, 2.0, 0.0))).unwrap();
        assert!(graph.world_position(child).approx_eq(Vec3::new(1.0, 2.0, 0.0), EPSILON));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut graph = SceneGraph::default();
        let parent = graph.add(Node::new("parent"));
        let child = graph.add_child(parent, Node::new("child")).unwrap();
        let grandchild = graph.add_child(child, Node::new("grandchild")).unwrap();

        let removed = graph.remove(parent).unwrap();
        assert_eq!(removed.name, "parent");
        assert!(!graph.contains(child));
        assert!(!graph.contains(grandchild));
        assert!(graph.is_empty());
        assert!(graph.get(graph.root()).unwrap().children().is_empty());
    }

    #[test]
    fn test_remove_root_fails() {
        let mut graph = SceneGraph::default();
        let root = graph.root();
        assert!(matches!(graph.remove(root), Err(GraphError::RootImmutable)));
    }

    #[test]
    fn test_clear_keeps_root() {
        let mut graph = SceneGraph::default();
        graph.add(Node::new("a"));
        graph.add(Node::new("b"));
        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.contains(graph.root()));
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let mut graph = SceneGraph::default();
        let a = graph.add(Node::new("a"));
        let b = graph.add_child(a, Node::new("b")).unwrap();
        assert_eq!(graph.set_parent(a, b), Err(GraphError::WouldCycle));
        assert_eq!(graph.set_parent(a, a), Err(GraphError::WouldCycle));
    }

    #[test]
    fn test_set_parent_keeps_local_transform() {
        let mut graph = SceneGraph::default();
        let holder = graph.add(positioned("holder", Vec3::new(5.0, 0.0, 0.0)));
        let item = graph.add(positioned("item", Vec3::new(0.0, 1.0, 0.0)));

        graph.set_parent(item, holder).unwrap();
        assert!(graph.world_position(item).approx_eq(Vec3::new(5.0, 1.0, 0.0), EPSILON));
        assert_eq!(graph.get(holder).unwrap().children(), &[item]);
        assert!(graph.get(graph.root()).unwrap().children().iter().all(|c| *c != item));
    }

    #[test]
    fn test_attach_preserves_world_transform() {
        let mut graph = SceneGraph::default();
        let holder = graph.add(Node::new("holder").with_transform(Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(Vec3::Y, FRAC_PI_2),
            scale: Vec3::splat(2.0),
        }));
        let item = graph.add(Node::new("item").with_transform(Transform {
            position: Vec3::new(-4.0, 0.5, 0.0),
            rotation: Quat::from_axis_angle(Vec3::X, 0.3),
            scale: Vec3::ONE,
        }));

        let before = graph.world_transform(item);
        graph.attach(item, holder).unwrap();
        let after = graph.world_transform(item);

        assert!(after.approx_eq(&before, EPSILON), "before {:?}, after {:?}", before, after);
        assert_eq!(graph.get(item).unwrap().parent(), Some(holder));
    }
}
