//! Scene root
//!
//! A [`Scene`] binds a world transform (centre and rotation) to an ordered list
//! of top-level nodes. Drawing resets the device matrix, applies the world
//! transform and then culls and draws each child in insertion order.

use std::fmt;

use crate::foundation::math::{Point3, Rotation};
use crate::render::device::{apply_placement, GraphicsDevice};
use crate::render::renderer::CullRoutine;
use crate::render::{RenderError, RenderResult};
use crate::scene::bounds::{BoundingVolume, Containment};
use crate::scene::node::{DrawOutcome, FrameContext, NodeId, SceneNode};
use crate::tree::{Branch, ChildList, Leaf};

/// What happened to each child during one [`Scene::draw`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameReport {
    /// Children whose list was invoked, in draw order
    pub drawn: Vec<NodeId>,
    /// Children rejected by the cull routine
    pub culled: Vec<NodeId>,
    /// Children that were hidden or had nothing compiled
    pub skipped: Vec<NodeId>,
    /// Children whose draw failed; the frame carried on past them
    pub failed: Vec<(NodeId, RenderError)>,
}

impl FrameReport {
    /// Number of children visited
    pub fn visited(&self) -> usize {
        self.drawn.len() + self.culled.len() + self.skipped.len() + self.failed.len()
    }

    /// True if no child failed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} drawn, {} culled, {} skipped, {} failed",
            self.drawn.len(),
            self.culled.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// Root container of the scene graph
pub struct Scene {
    id: NodeId,
    name: String,
    center: Point3,
    rotation: Rotation,
    nodes: ChildList<Box<dyn SceneNode>>,
}

impl Scene {
    /// Create an empty scene at the origin with no rotation
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_transform(name, Point3::origin(), Rotation::IDENTITY)
    }

    /// Create an empty scene with a world transform
    pub fn with_transform(name: impl Into<String>, center: Point3, rotation: Rotation) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            center,
            rotation,
            nodes: ChildList::new(),
        }
    }

    /// The scene's id (parent id of its top-level nodes)
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The scene's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World translation
    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Move the world
    pub fn set_center(&mut self, center: Point3) {
        self.center = center;
    }

    /// World rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Rotate the world
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Append a node, boxing it
    ///
    /// A node already in the scene is handed back.
    pub fn add_node<N: SceneNode + 'static>(&mut self, node: N) -> Result<usize, Box<dyn SceneNode>> {
        self.add(Box::new(node))
    }

    /// Top-level node with the given id
    pub fn node(&self, id: NodeId) -> Option<&dyn SceneNode> {
        self.nodes.as_slice().iter().find(|node| node.id() == id).map(|node| &**node)
    }

    /// Top-level node with the given id, mutably
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut (dyn SceneNode + 'static)> {
        self.nodes.as_mut_slice().iter_mut().find(|node| node.id() == id).map(|node| &mut **node)
    }

    /// Detach and return the top-level node with the given id
    ///
    /// The node keeps its device resources; release them with
    /// [`SceneNode::release`] or re-add it elsewhere.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Box<dyn SceneNode>> {
        let index = self.nodes.position(|node| node.id() == id)?;
        self.remove_at(index)
    }

    /// Ids of placed nodes overlapping a sphere around `center`
    pub fn nodes_within(&self, center: &Point3, radius: f32) -> RenderResult<Vec<NodeId>> {
        let region = BoundingVolume::sphere(radius)?;
        Ok(self
            .nodes
            .as_slice()
            .iter()
            .filter(|node| region.classify(center, &***node) != Containment::Outside)
            .map(|node| node.id())
            .collect())
    }

    /// Draw the scene through `culler`
    ///
    /// Resets the device matrix, applies the world transform, then visits
    /// every child in insertion order: culled children are skipped (they stay
    /// in the scene), the rest draw themselves. A child whose draw fails is
    /// recorded in the report and the pass continues with its siblings.
    pub fn draw(
        &mut self,
        device: &mut dyn GraphicsDevice,
        culler: &dyn CullRoutine,
        frame: &FrameContext,
    ) -> RenderResult<FrameReport> {
        device.load_identity()?;
        apply_placement(device, &self.center, &self.rotation)?;

        let mut report = FrameReport::default();
        for node in self.nodes.as_mut_slice() {
            let id = node.id();
            if culler.cull(&**node) {
                log::trace!("Culled '{}' ({})", node.name(), id);
                report.culled.push(id);
                continue;
            }
            match node.draw(device, frame) {
                Ok(DrawOutcome::Drawn) => report.drawn.push(id),
                Ok(DrawOutcome::Hidden | DrawOutcome::NotCompiled) => report.skipped.push(id),
                Err(e) => {
                    log::warn!("Failed to draw '{}' ({}): {}", node.name(), id, e);
                    report.failed.push((id, e));
                }
            }
        }

        log::trace!("Scene '{}' frame {}: {}", self.name, frame.frame, report);
        Ok(report)
    }

    /// One diagnostic line per top-level node
    ///
    /// `name:id -> visible`, followed by ` (position,rotation)` for placed
    /// nodes and ` (enabled)` for nodes carrying an enabled flag.
    pub fn traverse(&self) -> Vec<String> {
        self.nodes
            .as_slice()
            .iter()
            .map(|node| {
                let mut line = format!("{}:{} -> {}", node.name(), node.id(), node.is_visible());
                if let Some(object) = node.object() {
                    line.push_str(&format!(" ({},{})", object.position(), object.rotation()));
                }
                if let Some(enabled) = node.enabled() {
                    line.push_str(&format!(" ({})", enabled));
                }
                line
            })
            .collect()
    }

    /// Release every node's device resources and empty the scene
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        let mut first_error = None;
        for mut node in self.nodes.drain() {
            node.base_mut().set_parent(None);
            if let Err(e) = node.release(device) {
                log::warn!("Failed to release '{}': {}", node.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Branch for Scene {
    type Child = Box<dyn SceneNode>;

    fn child_list(&self) -> &ChildList<Box<dyn SceneNode>> {
        &self.nodes
    }

    fn child_list_mut(&mut self) -> &mut ChildList<Box<dyn SceneNode>> {
        &mut self.nodes
    }

    fn adopt(&self, child: &mut Box<dyn SceneNode>) {
        child.base_mut().set_parent(Some(self.id));
    }

    fn disown(&self, child: &mut Box<dyn SceneNode>) {
        child.base_mut().set_parent(None);
    }
}

impl Leaf for Scene {
    type ParentRef = NodeId;

    fn name(&self) -> &str {
        &self.name
    }

    /// The scene is always a root
    fn parent(&self) -> Option<NodeId> {
        None
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("center", &self.center)
            .field("rotation", &self.rotation)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::DeviceCall;
    use crate::render::RecordingDevice;
    use crate::scene::object::SceneObject;

    fn never(_: &dyn SceneNode) -> bool {
        false
    }

    #[test]
    fn test_add_node_sets_parent() {
        let mut scene = Scene::new("world");
        let object = SceneObject::new("a");
        let id = object.id();

        assert_eq!(scene.add_node(object), Ok(0));
        assert_eq!(scene.node(id).and_then(|n| n.base().parent()), Some(scene.id()));

        let removed = scene.remove_node(id).unwrap();
        assert!(removed.base().parent().is_none());
        assert_eq!(scene.count(), 0);
        assert!(scene.remove_node(id).is_none());
    }

    #[test]
    fn test_removed_node_can_be_readded() {
        let mut scene = Scene::new("world");
        let object: Box<dyn SceneNode> = Box::new(SceneObject::new("once"));
        let id = object.id();
        scene.add(object).unwrap();

        let moved = scene.remove_node(id).unwrap();
        scene.add(moved).unwrap();
        let moved_again = scene.remove_node(id).unwrap();
        scene.add_at(0, moved_again).unwrap();

        assert_eq!(scene.count(), 1);
        assert_eq!(scene.children()[0].id(), id);
    }

    #[test]
    fn test_node_mut_lookup() {
        let mut scene = Scene::new("world");
        let object = SceneObject::new("movable");
        let id = object.id();
        scene.add_node(object).unwrap();

        scene.node_mut(id).unwrap().base_mut().set_visible(false);
        assert!(!scene.node(id).unwrap().is_visible());
        assert!(scene.node_mut(NodeId::next()).is_none());
    }

    #[test]
    fn test_identity_transform_emits_no_placement() {
        let mut device = RecordingDevice::new();
        let mut scene = Scene::new("empty");

        let report = scene.draw(&mut device, &never, &FrameContext::default()).unwrap();

        assert_eq!(report.visited(), 0);
        assert_eq!(device.calls(), &[DeviceCall::LoadIdentity]);
    }

    #[test]
    fn test_world_transform_emitted() {
        let mut device = RecordingDevice::new();
        let mut scene = Scene::with_transform(
            "moved",
            Point3::new(0.0, 0.0, -5.0),
            Rotation::from_euler_degrees(0.0, 90.0, 0.0),
        );

        scene.draw(&mut device, &never, &FrameContext::default()).unwrap();

        assert_eq!(device.calls().len(), 5);
        assert!(matches!(device.calls()[1], DeviceCall::Translate(_)));
    }

    #[test]
    fn test_traverse_lines() {
        let mut device = RecordingDevice::new();
        let mut scene = Scene::new("world");
        let object = SceneObject::new("box").placed(Point3::new(1.0, 2.0, 3.0), Rotation::IDENTITY);
        let id = object.id();
        scene.add_node(object).unwrap();
        let fog = crate::scene::fog::Fog::new(
            &mut device,
            crate::render::device::FogMode::Linear,
            0.1,
            1.0..=2.0,
            crate::foundation::math::Color::new(0.0, 0.0, 0.0, 1.0),
        )
        .unwrap();
        let fog_id = fog.id();
        scene.add_node(fog).unwrap();
        device.clear_trace();

        let lines = scene.traverse();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(&format!("box:{} -> true (", id)));
        assert!(lines[0].ends_with(",[0, 0, 0, 0])"));
        assert_eq!(lines[1], format!("fog:{} -> true (true)", fog_id));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_nodes_within() {
        let mut scene = Scene::new("world");
        let near = SceneObject::new("near").placed(Point3::new(1.0, 0.0, 0.0), Rotation::IDENTITY);
        let far = SceneObject::new("far").placed(Point3::new(50.0, 0.0, 0.0), Rotation::IDENTITY);
        let near_id = near.id();
        scene.add_node(near).unwrap();
        scene.add_node(far).unwrap();

        assert_eq!(scene.nodes_within(&Point3::origin(), 5.0).unwrap(), vec![near_id]);
        assert!(matches!(
            scene.nodes_within(&Point3::origin(), -1.0),
            Err(RenderError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_release_empties_scene() {
        let mut device = RecordingDevice::new();
        let mut scene = Scene::new("world");
        let mut object = SceneObject::new("compiled");
        object
            .compile_with(&mut device, crate::render::device::CompileMode::Compile, |_| Ok(()))
            .unwrap();
        scene.add_node(object).unwrap();
        assert_eq!(device.live_lists(), 1);

        scene.release(&mut device).unwrap();

        assert_eq!(scene.count(), 0);
        assert_eq!(device.live_lists(), 0);
    }
}
