//! Transformable scene node
//!
//! A [`SceneObject`] places a compiled draw list in the world. Drawing pushes
//! the device matrix, runs the attached behaviours, applies the node's
//! translation and X/Y/Z rotations, invokes the list and pops the matrix again.

use std::fmt;

use crate::foundation::math::{Point3, Rotation};
use crate::render::device::{apply_placement, CompileMode, GraphicsDevice, ListHandle, MatrixGuard};
use crate::render::{RenderError, RenderResult};
use crate::scene::draw_list::{DrawList, DrawListState};
use crate::scene::node::{Behavior, DrawOutcome, FrameContext, NodeBase, NodeTransform, SceneNode};
use crate::tree::Leaf;

/// Node with a position, a rotation and a compiled draw list
pub struct SceneObject {
    base: NodeBase,
    position: Point3,
    rotation: Rotation,
    draw_list: DrawList,
    behaviors: Vec<Box<dyn Behavior>>,
}

impl SceneObject {
    /// Create an object at the origin with no rotation and no draw list
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: NodeBase::new(name),
            position: Point3::origin(),
            rotation: Rotation::IDENTITY,
            draw_list: DrawList::new(),
            behaviors: Vec::new(),
        }
    }

    /// Create an object that draws an already compiled device list
    pub fn with_list(name: impl Into<String>, list: ListHandle) -> Self {
        Self {
            draw_list: DrawList::from_compiled(list),
            ..Self::new(name)
        }
    }

    /// Builder-style placement
    pub fn placed(mut self, position: Point3, rotation: Rotation) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }

    /// World position
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Move the node
    pub fn set_position(&mut self, position: Point3) {
        self.position = position;
    }

    /// World rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Rotate the node
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Placement snapshot handed to behaviours
    pub fn transform(&self) -> NodeTransform {
        NodeTransform {
            id: self.base.id(),
            position: self.position,
            rotation: self.rotation,
        }
    }

    /// The node's draw list
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Attach a behaviour; behaviours run in attachment order
    pub fn add_behavior(&mut self, behavior: Box<dyn Behavior>) {
        self.behaviors.push(behavior);
    }

    /// Number of attached behaviours
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    /// Open compilation of the node's draw list
    pub fn begin(&mut self, device: &mut dyn GraphicsDevice, mode: CompileMode, delete_old: bool) -> RenderResult<()> {
        self.draw_list.begin(device, mode, delete_old)
    }

    /// Close compilation of the node's draw list
    pub fn end(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.draw_list.end(device)
    }

    /// Compile the node's draw list from the calls made by `record`
    pub fn compile_with<F>(&mut self, device: &mut dyn GraphicsDevice, mode: CompileMode, record: F) -> RenderResult<()>
    where
        F: FnOnce(&mut dyn GraphicsDevice) -> RenderResult<()>,
    {
        self.draw_list.compile_with(device, mode, true, record)
    }

    /// Release the node's draw list
    pub fn finalize(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.draw_list.finalize(device)
    }

    /// Draw the compiled list at the node's placement
    ///
    /// Hidden nodes and nodes without a compiled list make no device calls.
    pub fn draw_compiled(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameContext) -> RenderResult<DrawOutcome> {
        if !self.base.is_visible() {
            return Ok(DrawOutcome::Hidden);
        }
        let list = match (self.draw_list.state(), self.draw_list.compiled()) {
            (DrawListState::Compiling, _) => {
                return Err(RenderError::InvalidState(format!(
                    "'{}' drawn while its list is compiling",
                    self.base.name()
                )));
            }
            (_, Some(list)) => list,
            (_, None) => return Ok(DrawOutcome::NotCompiled),
        };

        let mut guard = MatrixGuard::push(device)?;

        let transform = self.transform();
        for behavior in &mut self.behaviors {
            behavior.apply(&transform, frame);
        }

        apply_placement(&mut *guard, &self.position, &self.rotation)?;
        guard.call_list(list)?;
        Ok(DrawOutcome::Drawn)
    }
}

impl SceneNode for SceneObject {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn object(&self) -> Option<&SceneObject> {
        Some(self)
    }

    fn object_mut(&mut self) -> Option<&mut SceneObject> {
        Some(self)
    }

    fn draw(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameContext) -> RenderResult<DrawOutcome> {
        self.draw_compiled(device, frame)
    }
}

impl fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneObject")
            .field("base", &self.base)
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("draw_list", &self.draw_list)
            .field("behaviors", &self.behaviors.len())
            .finish()
    }
}

impl PartialEq for SceneObject {
    fn eq(&self, other: &Self) -> bool {
        self.base.id() == other.base.id()
    }
}
