//! Base node model shared by every scene graph entry

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::math::{Point3, Rotation};
use crate::render::device::GraphicsDevice;
use crate::render::RenderResult;
use crate::scene::bounds::BoundingVolume;
use crate::scene::object::SceneObject;
use crate::tree::Leaf;

/// Process-wide id counter; the first id handed out is 1
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique scene graph id
///
/// Assigned exactly once, at construction, from a single shared counter.
/// Ids are never reused while the process runs and increase in creation
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Draw the next id from the shared counter
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// The raw id value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity, visibility and bounds of a node
#[derive(Debug)]
pub struct NodeBase {
    id: NodeId,
    name: String,
    visible: bool,
    bounds: Option<BoundingVolume>,
    parent: Option<NodeId>,
}

impl NodeBase {
    /// Create a visible, unbounded, unparented base with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            visible: true,
            bounds: None,
            parent: None,
        }
    }

    /// The node's id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the node should be rendered
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the node
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// The node's bounding volume, if any
    pub fn bounds(&self) -> Option<&BoundingVolume> {
        self.bounds.as_ref()
    }

    /// Replace or clear the bounding volume
    pub fn set_bounds(&mut self, bounds: Option<BoundingVolume>) {
        self.bounds = bounds;
    }

    /// True if a bounding volume is set
    pub fn is_bounded(&self) -> bool {
        self.bounds.is_some()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }
}

/// A copy is a new node: it takes a fresh id and starts detached
impl Clone for NodeBase {
    fn clone(&self) -> Self {
        Self {
            id: NodeId::next(),
            name: self.name.clone(),
            visible: self.visible,
            bounds: self.bounds,
            parent: None,
        }
    }
}

impl Leaf for NodeBase {
    type ParentRef = NodeId;

    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Per-frame data handed to behaviours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameContext {
    /// Frame counter of the renderer driving the pass (0 outside a frame)
    pub frame: u64,
}

/// Read-only view of a node's placement handed to behaviours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    /// Node id
    pub id: NodeId,
    /// Node position
    pub position: Point3,
    /// Node rotation
    pub rotation: Rotation,
}

/// Extension point attached to transformable nodes
///
/// Behaviours are applied in attachment order when their node draws, after
/// the node has pushed its matrix and before its own transform is applied.
pub trait Behavior {
    /// Run the behaviour for one draw of its node
    fn apply(&mut self, node: &NodeTransform, frame: &FrameContext);
}

/// Result of asking a node to draw itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The node's compiled list was invoked
    Drawn,
    /// The node is not visible; no device calls were made
    Hidden,
    /// The node has no compiled list; no device calls were made
    NotCompiled,
}

impl DrawOutcome {
    /// True only for [`DrawOutcome::Drawn`]
    pub fn is_drawn(self) -> bool {
        matches!(self, Self::Drawn)
    }
}

/// An entry in the scene hierarchy
///
/// Implemented by every node kind the scene can hold. Transformable nodes
/// expose their [`SceneObject`] so the renderer can read their placement;
/// nodes carrying an enabled flag (lights, fog) report it through
/// [`SceneNode::enabled`].
pub trait SceneNode {
    /// Identity, visibility and bounds
    fn base(&self) -> &NodeBase;

    /// Mutable identity, visibility and bounds
    fn base_mut(&mut self) -> &mut NodeBase;

    /// The transformable part of the node, if it has one
    fn object(&self) -> Option<&SceneObject> {
        None
    }

    /// The transformable part of the node, mutably
    fn object_mut(&mut self) -> Option<&mut SceneObject> {
        None
    }

    /// Enabled flag for extender nodes (lights, fog)
    fn enabled(&self) -> Option<bool> {
        None
    }

    /// Issue the node's device calls for this frame
    ///
    /// Any matrix pushed here must be popped before returning, on every path.
    fn draw(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameContext) -> RenderResult<DrawOutcome>;

    /// Release every device resource the node owns
    fn release(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        match self.object_mut() {
            Some(object) => object.finalize(device),
            None => Ok(()),
        }
    }

    /// The node's id
    fn id(&self) -> NodeId {
        self.base().id()
    }

    /// The node's name
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Whether the node should be rendered
    fn is_visible(&self) -> bool {
        self.base().is_visible()
    }

    /// The node's bounding volume
    fn bounds(&self) -> Option<&BoundingVolume> {
        self.base().bounds()
    }

    /// World position, for transformable nodes
    fn position(&self) -> Option<Point3> {
        self.object().map(SceneObject::position)
    }

    /// World rotation, for transformable nodes
    fn rotation(&self) -> Option<Rotation> {
        self.object().map(SceneObject::rotation)
    }
}

impl PartialEq for dyn SceneNode {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for dyn SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("visible", &self.is_visible())
            .finish()
    }
}
