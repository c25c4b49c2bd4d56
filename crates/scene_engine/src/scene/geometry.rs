//! Vertex-buffer geometry nodes
//!
//! [`Geometry`] uploads its vertices into a device buffer and compiles a draw
//! list that binds its texture and buffer and draws the vertex array.
//! [`GeometryArray`] groups geometry into one composite mesh whose own list
//! calls every member's draw. [`Terrain`] is geometry built the same way.

use std::rc::Rc;

use crate::render::device::{
    BufferHandle, BufferTarget, ClientState, CompileMode, DataType, GraphicsDevice, Primitive, TextureHandle,
};
use crate::render::{RenderError, RenderResult};
use crate::scene::node::{DrawOutcome, FrameContext, NodeBase, SceneNode};
use crate::scene::object::SceneObject;
use crate::scene::texture::Texture;
use crate::tree::{Branch, ChildList};

/// Components per vertex (x, y, z)
pub const VERTEX_COMPONENTS: usize = 3;

/// Textured vertex-buffer mesh
#[derive(Debug)]
pub struct Geometry {
    object: SceneObject,
    buffer: Option<BufferHandle>,
    target: BufferTarget,
    primitive: Primitive,
    vertex_count: u32,
    texture: Rc<Texture>,
}

impl Geometry {
    /// Upload `vertices` and compile the draw list
    ///
    /// `vertices` holds packed `x, y, z` triples. The texture must still be
    /// live; a finalized texture yields `MissingResource`.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        name: impl Into<String>,
        vertices: &[f32],
        texture: Rc<Texture>,
        primitive: Primitive,
        target: BufferTarget,
    ) -> RenderResult<Self> {
        let name = name.into();
        if vertices.is_empty() || vertices.len() % VERTEX_COMPONENTS != 0 {
            return Err(RenderError::InvalidConfiguration(format!(
                "'{}': vertex data must be a non-empty list of {}-component vertices, got {} floats",
                name,
                VERTEX_COMPONENTS,
                vertices.len()
            )));
        }
        let vertex_count = u32::try_from(vertices.len() / VERTEX_COMPONENTS).map_err(|_| {
            RenderError::InvalidConfiguration(format!("'{}': too many vertices", name))
        })?;
        let texture_handle = texture.require_handle()?;

        let buffer = device.gen_buffer()?;
        let mut geometry = Self {
            object: SceneObject::new(name),
            buffer: Some(buffer),
            target,
            primitive,
            vertex_count,
            texture,
        };

        let built = geometry.upload_and_compile(device, vertices, texture_handle);
        if let Err(e) = built {
            if let Err(cleanup) = geometry.release_buffers(device) {
                log::warn!("Failed to release geometry after build error: {}", cleanup);
            }
            return Err(e);
        }

        log::debug!("Built geometry '{}' ({} vertices, {:?})", geometry.object.name(), vertex_count, primitive);
        Ok(geometry)
    }

    fn upload_and_compile(
        &mut self,
        device: &mut dyn GraphicsDevice,
        vertices: &[f32],
        texture: TextureHandle,
    ) -> RenderResult<()> {
        let buffer = self
            .buffer
            .ok_or_else(|| RenderError::MissingResource(format!("'{}' has no vertex buffer", self.object.name())))?;
        let (target, primitive, vertex_count) = (self.target, self.primitive, self.vertex_count);
        let texture_target = self.texture.target();

        device.bind_buffer(target, buffer)?;
        device.buffer_data(target, bytemuck::cast_slice(vertices))?;

        self.object.compile_with(device, CompileMode::Compile, |d| {
            d.vertex_pointer(VERTEX_COMPONENTS as u32, DataType::Float, 0)?;
            d.bind_texture(texture_target, texture)?;
            d.bind_buffer(target, buffer)?;
            d.enable_client_state(ClientState::VertexArray)?;
            d.draw_arrays(primitive, 0, vertex_count)
        })
    }

    /// Vertex buffer handle, `None` once released
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    /// Buffer binding point
    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Primitive assembled from the vertices
    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// Number of vertices drawn per invocation
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Texture bound while drawing
    pub fn texture(&self) -> &Rc<Texture> {
        &self.texture
    }

    fn release_buffers(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.object.finalize(device)?;
        if let Some(buffer) = self.buffer.take() {
            device.delete_buffer(buffer)?;
        }
        Ok(())
    }
}

impl SceneNode for Geometry {
    fn base(&self) -> &NodeBase {
        self.object.base()
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        self.object.base_mut()
    }

    fn object(&self) -> Option<&SceneObject> {
        Some(&self.object)
    }

    fn object_mut(&mut self) -> Option<&mut SceneObject> {
        Some(&mut self.object)
    }

    fn draw(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameContext) -> RenderResult<DrawOutcome> {
        self.object.draw_compiled(device, frame)
    }

    /// Releases the list and the buffer; the texture too when this geometry
    /// holds its last reference
    fn release(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.release_buffers(device)?;
        if let Some(texture) = Rc::get_mut(&mut self.texture) {
            texture.finalize(device)?;
        }
        Ok(())
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
    }
}

/// Composite mesh made of ordered [`Geometry`] members
#[derive(Debug)]
pub struct GeometryArray {
    object: SceneObject,
    meshes: ChildList<Geometry>,
}

impl GeometryArray {
    /// Create an empty, uncompiled array
    pub fn new(name: impl Into<String>) -> Self {
        Self { object: SceneObject::new(name), meshes: ChildList::new() }
    }

    /// Members in order
    pub fn meshes(&self) -> &[Geometry] {
        self.meshes.as_slice()
    }

    /// Compile the array's list from its members' draws
    ///
    /// Members are recorded with their own placement; a member added later
    /// shows up only after the next compile.
    pub fn compile(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        let meshes = &mut self.meshes;
        self.object.compile_with(device, CompileMode::Compile, |d| {
            let frame = FrameContext::default();
            for mesh in meshes.as_mut_slice() {
                mesh.draw(d, &frame)?;
            }
            Ok(())
        })
    }
}

impl Branch for GeometryArray {
    type Child = Geometry;

    fn child_list(&self) -> &ChildList<Geometry> {
        &self.meshes
    }

    fn child_list_mut(&mut self) -> &mut ChildList<Geometry> {
        &mut self.meshes
    }

    fn adopt(&self, child: &mut Geometry) {
        let parent = self.object.id();
        child.base_mut().set_parent(Some(parent));
    }

    fn disown(&self, child: &mut Geometry) {
        child.base_mut().set_parent(None);
    }
}

impl SceneNode for GeometryArray {
    fn base(&self) -> &NodeBase {
        self.object.base()
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        self.object.base_mut()
    }

    fn object(&self) -> Option<&SceneObject> {
        Some(&self.object)
    }

    fn object_mut(&mut self) -> Option<&mut SceneObject> {
        Some(&mut self.object)
    }

    fn draw(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameContext) -> RenderResult<DrawOutcome> {
        self.object.draw_compiled(device, frame)
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.object.finalize(device)?;
        for mesh in self.meshes.as_mut_slice() {
            SceneNode::release(mesh, device)?;
        }
        Ok(())
    }
}

/// Terrain mesh
#[derive(Debug)]
pub struct Terrain {
    geometry: Geometry,
}

impl Terrain {
    /// Upload and compile a terrain mesh, as [`Geometry::new`]
    pub fn new(
        device: &mut dyn GraphicsDevice,
        name: impl Into<String>,
        vertices: &[f32],
        texture: Rc<Texture>,
        primitive: Primitive,
        target: BufferTarget,
    ) -> RenderResult<Self> {
        Geometry::new(device, name, vertices, texture, primitive, target).map(|geometry| Self { geometry })
    }

    /// The underlying geometry
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

impl SceneNode for Terrain {
    fn base(&self) -> &NodeBase {
        self.geometry.base()
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        self.geometry.base_mut()
    }

    fn object(&self) -> Option<&SceneObject> {
        self.geometry.object()
    }

    fn object_mut(&mut self) -> Option<&mut SceneObject> {
        self.geometry.object_mut()
    }

    fn draw(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameContext) -> RenderResult<DrawOutcome> {
        self.geometry.draw(device, frame)
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.geometry.release(device)
    }
}
