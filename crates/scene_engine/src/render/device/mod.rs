//! # Graphics Device Boundary
//!
//! The scene graph never talks to a graphics API directly. Everything it needs
//! from the GPU side goes through [`GraphicsDevice`]: the fixed-function matrix
//! stack, compiled command lists, light/fog state, textures and vertex buffers.
//!
//! ## Handles
//!
//! Device resources are referred to by opaque [`slotmap`] keys. A device backed
//! by a real API can mint them from its native ids with
//! `KeyData::from_ffi(id).into()`; the [`RecordingDevice`] stores its resources
//! in slot maps directly.
//!
//! ## Matrix discipline
//!
//! The transform stack is shared by every node drawn in a frame. Code that
//! pushes must pop on every exit path, so pushes go through [`MatrixGuard`],
//! which pops when it is dropped.

mod recording;

pub use recording::{DeviceCall, RecordingDevice};

use std::ops::{Deref, DerefMut};

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::foundation::math::{is_origin, Color, Point3, Rotation, Vec3, Vec4};
use crate::render::{RenderError, RenderResult};

new_key_type! {
    /// Handle to a compiled command list
    pub struct ListHandle;
    /// Handle to a device texture object
    pub struct TextureHandle;
    /// Handle to a device vertex buffer
    pub struct BufferHandle;
}

/// How calls issued between `new_list` and `end_list` are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompileMode {
    /// Record only
    #[default]
    Compile,
    /// Record and execute immediately
    CompileAndExecute,
}

/// Which matrix stack subsequent matrix calls affect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixMode {
    /// Model-view stack (the one nodes push and pop)
    ModelView,
    /// Projection stack
    Projection,
}

/// Fixed-function light unit (`0..LightSlot::COUNT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightSlot(u8);

impl LightSlot {
    /// Number of light units a fixed-function device guarantees
    pub const COUNT: u8 = 8;

    /// Create a light slot, failing for units the device does not have
    pub fn new(index: u8) -> RenderResult<Self> {
        if index < Self::COUNT {
            Ok(Self(index))
        } else {
            Err(RenderError::InvalidConfiguration(format!(
                "light slot {} out of range (0..{})",
                index,
                Self::COUNT
            )))
        }
    }

    /// The unit index
    pub fn index(self) -> u8 {
        self.0
    }
}

/// Server-side capabilities toggled with `set_capability`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Global lighting switch
    Lighting,
    /// An individual light unit
    Light(LightSlot),
    /// Fog
    Fog,
    /// Depth testing
    DepthTest,
    /// 2D texturing
    Texture2D,
    /// 3D texturing
    Texture3D,
}

/// Distance attenuation terms for a light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttenuationMode {
    /// Constant term
    Constant,
    /// Linear term
    Linear,
    /// Quadratic term
    Quadratic,
}

/// A single light parameter write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightParam {
    /// Homogeneous light position
    Position(Vec4),
    /// Diffuse colour
    Diffuse(Color),
    /// Ambient colour
    Ambient(Color),
    /// Specular colour
    Specular(Color),
    /// Spot direction
    SpotDirection(Vec3),
    /// Spot exponent
    SpotExponent(f32),
    /// Spot cutoff angle in degrees
    SpotCutoff(f32),
    /// Attenuation term and factor
    Attenuation(AttenuationMode, f32),
}

/// Fog equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FogMode {
    /// Linear between start and end
    Linear,
    /// Exponential
    Exp,
    /// Squared exponential
    Exp2,
}

/// A single fog parameter write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FogParam {
    /// Fog equation
    Mode(FogMode),
    /// Density for the exponential modes
    Density(f32),
    /// Linear fog start distance
    Start(f32),
    /// Linear fog end distance
    End(f32),
    /// Fog colour
    Color(Color),
}

bitflags! {
    /// Buffers cleared at the start of a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        /// Colour buffer
        const COLOR = 0b0001;
        /// Depth buffer
        const DEPTH = 0b0010;
        /// Stencil buffer
        const STENCIL = 0b0100;
    }
}

/// Texture binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// Two-dimensional texture
    Texture2D,
    /// Three-dimensional texture
    Texture3D,
}

/// Texel filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Linear interpolation
    Linear,
    /// Linear interpolation between linearly filtered mip levels
    LinearMipmapLinear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Tile
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

/// Texture parameter write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParam {
    /// Minification filter
    MinFilter(FilterMode),
    /// Magnification filter
    MagFilter(FilterMode),
    /// S coordinate wrap
    WrapS(WrapMode),
    /// T coordinate wrap
    WrapT(WrapMode),
    /// R coordinate wrap (3D textures)
    WrapR(WrapMode),
}

/// Texel layout of uploaded pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PixelFormat {
    /// 8-bit red, green, blue
    Rgb,
    /// 8-bit red, green, blue, alpha
    Rgba,
}

impl PixelFormat {
    /// Bytes (channels) per texel
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Description of a texture image upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureImage {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Depth in texels (1 for 2D textures)
    pub depth: u32,
    /// Texel layout
    pub format: PixelFormat,
    /// Build the full mip chain instead of level 0 only
    pub mipmap: bool,
}

impl TextureImage {
    /// Expected pixel data length in bytes
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize * self.format.channels()
    }
}

/// Buffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferTarget {
    /// Vertex attributes
    #[default]
    Array,
    /// Indices
    ElementArray,
}

/// Component type of vertex data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit float
    Float,
    /// 32-bit signed integer
    Int,
}

/// Client-side array switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Vertex position array
    VertexArray,
}

/// Primitive assembly mode for `draw_arrays`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Primitive {
    /// Independent triangles
    #[default]
    Triangles,
    /// Independent quads
    Quads,
}

impl Primitive {
    /// Vertices consumed per primitive
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Quads => 4,
        }
    }
}

/// The graphics device consumed by the scene graph
///
/// Implementations issue the calls against a real API; errors are surfaced
/// as [`RenderError`] without further interpretation. All calls are
/// synchronous relative to the frame and happen on the thread owning the
/// device context.
pub trait GraphicsDevice {
    /// Duplicate the top of the current matrix stack
    fn push_matrix(&mut self) -> RenderResult<()>;

    /// Discard the top of the current matrix stack
    fn pop_matrix(&mut self) -> RenderResult<()>;

    /// Replace the top of the current matrix stack with the identity
    fn load_identity(&mut self) -> RenderResult<()>;

    /// Post-multiply a translation
    fn translate(&mut self, offset: Vec3) -> RenderResult<()>;

    /// Post-multiply a rotation of `degrees` about `axis`
    fn rotate(&mut self, degrees: f32, axis: Vec3) -> RenderResult<()>;

    /// Select the matrix stack affected by subsequent matrix calls
    fn matrix_mode(&mut self, mode: MatrixMode) -> RenderResult<()>;

    /// Post-multiply a perspective projection (vertical fov in degrees)
    fn perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> RenderResult<()>;

    /// Depth of the current matrix stack (1 when nothing is pushed)
    fn matrix_depth(&self) -> usize;

    /// Allocate a command list handle
    fn gen_list(&mut self) -> RenderResult<ListHandle>;

    /// Open compilation into `list`; subsequent calls are recorded
    fn new_list(&mut self, list: ListHandle, mode: CompileMode) -> RenderResult<()>;

    /// Close the open compilation
    fn end_list(&mut self) -> RenderResult<()>;

    /// Replay a compiled list
    fn call_list(&mut self, list: ListHandle) -> RenderResult<()>;

    /// Release a command list handle
    fn delete_list(&mut self, list: ListHandle) -> RenderResult<()>;

    /// Enable or disable a server-side capability
    fn set_capability(&mut self, capability: Capability, enabled: bool) -> RenderResult<()>;

    /// Write a light parameter
    fn set_light(&mut self, slot: LightSlot, param: LightParam) -> RenderResult<()>;

    /// Write a fog parameter
    fn set_fog(&mut self, param: FogParam) -> RenderResult<()>;

    /// Clear the selected framebuffer planes
    fn clear(&mut self, mask: ClearMask) -> RenderResult<()>;

    /// Set the viewport rectangle
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> RenderResult<()>;

    /// Allocate a texture object
    fn gen_texture(&mut self) -> RenderResult<TextureHandle>;

    /// Bind a texture object to a target
    fn bind_texture(&mut self, target: TextureTarget, texture: TextureHandle) -> RenderResult<()>;

    /// Set a parameter on the texture bound to `target`
    fn tex_parameter(&mut self, target: TextureTarget, param: TextureParam) -> RenderResult<()>;

    /// Upload pixel data to the texture bound to `target`
    fn tex_image(&mut self, target: TextureTarget, image: &TextureImage, data: &[u8]) -> RenderResult<()>;

    /// Release a texture object
    fn delete_texture(&mut self, texture: TextureHandle) -> RenderResult<()>;

    /// Allocate a buffer object
    fn gen_buffer(&mut self) -> RenderResult<BufferHandle>;

    /// Bind a buffer object to a target
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferHandle) -> RenderResult<()>;

    /// Upload data into the buffer bound to `target`
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) -> RenderResult<()>;

    /// Release a buffer object
    fn delete_buffer(&mut self, buffer: BufferHandle) -> RenderResult<()>;

    /// Describe the layout of the bound vertex array
    fn vertex_pointer(&mut self, components: u32, data_type: DataType, stride: u32) -> RenderResult<()>;

    /// Enable a client-side array
    fn enable_client_state(&mut self, state: ClientState) -> RenderResult<()>;

    /// Draw `count` vertices starting at `first`
    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) -> RenderResult<()>;
}

/// Scoped matrix push
///
/// Pushes the current matrix on creation and pops it when dropped, so the
/// stack is balanced on every exit path including early returns through `?`.
/// The guard derefs to the device for the calls made inside the scope.
pub struct MatrixGuard<'a> {
    device: &'a mut dyn GraphicsDevice,
}

impl<'a> MatrixGuard<'a> {
    /// Push the current matrix and return the guard that pops it
    pub fn push(device: &'a mut dyn GraphicsDevice) -> RenderResult<Self> {
        device.push_matrix()?;
        Ok(Self { device })
    }
}

impl<'a> Deref for MatrixGuard<'a> {
    type Target = dyn GraphicsDevice + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.device
    }
}

impl<'a> DerefMut for MatrixGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.device
    }
}

impl Drop for MatrixGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.device.pop_matrix() {
            log::error!("Matrix stack pop failed while leaving scope: {}", e);
        }
    }
}

/// Apply the three ordered axis rotations (X, then Y, then Z)
pub fn apply_rotation(device: &mut dyn GraphicsDevice, rotation: &Rotation) -> RenderResult<()> {
    for (angle, axis) in rotation.axis_steps() {
        device.rotate(angle, axis)?;
    }
    Ok(())
}

/// Apply a placement, skipping the translation for the origin and the
/// rotation for the identity
pub fn apply_placement(device: &mut dyn GraphicsDevice, position: &Point3, rotation: &Rotation) -> RenderResult<()> {
    if !is_origin(position) {
        device.translate(position.coords)?;
    }
    if !rotation.is_identity() {
        apply_rotation(device, rotation)?;
    }
    Ok(())
}
