//! # Renderer
//!
//! Owns the camera roster and the scenes, picks the active camera and drives
//! one frame: the view transform from the active camera, then the scene's
//! cull-and-draw pass.
//!
//! ## Culling
//!
//! The built-in cull routine is [`ViewVolume`], an approximate view-volume
//! test rather than a frustum-plane test. For a node at `distance = node - camera`:
//!
//! 1. depth: `|distance|` must lie in `[near + r, far - r]`
//! 2. vertical: `distance.y` must lie within `±(h + r)` with
//!    `h = |distance| * 2 * tan(view_angle / 2)`
//! 3. horizontal: `distance.x` must lie within `±(aspect * h + r)`
//!
//! `r` is the node's bounding radius (0 when unbounded) and `aspect` is the
//! window's `height / width`. All ranges are inclusive.

use slotmap::SlotMap;

use crate::config::EngineConfig;
use crate::foundation::math::{utils::deg_to_rad, Point3};
use crate::render::device::{apply_rotation, ClearMask, GraphicsDevice, MatrixGuard, MatrixMode};
use crate::render::primitives::{Camera, Frustum};
use crate::render::{RenderError, RenderResult};
use crate::scene::{FrameContext, FrameReport, Scene, SceneKey, SceneNode};

/// Name of the camera used when none is attached
pub const DEFAULT_CAMERA_NAME: &str = "Default Camera";

/// Decides per node whether it is left out of the frame
pub trait CullRoutine {
    /// `true` excludes the node from drawing
    fn cull(&self, node: &dyn SceneNode) -> bool;
}

impl<F> CullRoutine for F
where
    F: Fn(&dyn SceneNode) -> bool,
{
    fn cull(&self, node: &dyn SceneNode) -> bool {
        self(node)
    }
}

/// Window size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Create a viewport; both sides must be non-zero
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfiguration(format!(
                "viewport must be non-empty, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Window aspect ratio as `height / width`
    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width as f32
    }
}

/// The approximate view volume of one camera
#[derive(Debug, Clone, Copy)]
pub struct ViewVolume<'a> {
    camera: &'a Camera,
    aspect: f32,
}

impl<'a> ViewVolume<'a> {
    /// View volume of `camera` in a window with the given `height / width`
    pub fn new(camera: &'a Camera, aspect: f32) -> Self {
        Self { camera, aspect }
    }

    /// Cull test for a point with an optional bounding radius
    pub fn cull_point(&self, position: &Point3, radius: Option<f32>) -> bool {
        let frustum = self.camera.frustum();
        let distance = position - self.camera.position();
        let depth = distance.norm();
        let r = radius.unwrap_or(0.0);

        if !(frustum.near() + r..=frustum.far() - r).contains(&depth) {
            return true;
        }

        let half_height = depth * 2.0 * (deg_to_rad(frustum.view_angle()) / 2.0).tan();
        if !(-half_height - r..=half_height + r).contains(&distance.y) {
            return true;
        }

        let half_width = self.aspect * half_height;
        !(-half_width - r..=half_width + r).contains(&distance.x)
    }
}

impl CullRoutine for ViewVolume<'_> {
    /// Nodes without a position (fog) are never culled
    fn cull(&self, node: &dyn SceneNode) -> bool {
        match node.position() {
            Some(position) => self.cull_point(&position, node.bounds().map(|b| b.radius())),
            None => false,
        }
    }
}

/// Camera roster, scene store and per-frame driver
#[derive(Debug)]
pub struct Renderer {
    viewport: Viewport,
    cameras: Vec<Camera>,
    active: Option<usize>,
    default_camera: Camera,
    scenes: SlotMap<SceneKey, Scene>,
    frame: u64,
}

impl Renderer {
    /// Create a renderer with no cameras and no scenes
    pub fn new(viewport: Viewport) -> Self {
        Self::with_default_camera(viewport, Camera::new(DEFAULT_CAMERA_NAME, Frustum::default()))
    }

    /// Create a renderer with a custom fallback camera
    pub fn with_default_camera(viewport: Viewport, default_camera: Camera) -> Self {
        Self {
            viewport,
            cameras: Vec::new(),
            active: None,
            default_camera,
            scenes: SlotMap::with_key(),
            frame: 0,
        }
    }

    /// Create a renderer from configuration
    pub fn from_config(config: &EngineConfig) -> RenderResult<Self> {
        let viewport = Viewport::new(config.viewport.width, config.viewport.height)?;
        let frustum = Frustum::try_from(config.camera.frustum)?;
        let [x, y, z] = config.camera.position;
        let camera = Camera::new(config.camera.name.clone(), frustum)
            .with_placement(Point3::new(x, y, z), config.camera.rotation);
        Ok(Self::with_default_camera(viewport, camera))
    }

    /// Current window size
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Frames drawn so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Append a camera and return its index
    pub fn attach_camera(&mut self, camera: Camera, make_active: bool) -> usize {
        log::debug!("Attaching camera '{}' (active: {})", camera.name(), make_active);
        self.cameras.push(camera);
        let index = self.cameras.len() - 1;
        if make_active {
            self.active = Some(index);
        }
        index
    }

    /// Remove the first camera named `name`
    ///
    /// Removing the active camera falls back to the default camera.
    pub fn detach_camera(&mut self, name: &str) -> Option<Camera> {
        let index = self.cameras.iter().position(|camera| camera.name() == name)?;
        let camera = self.cameras.remove(index);
        self.active = match self.active {
            Some(active) if active == index => None,
            Some(active) if active > index => Some(active - 1),
            other => other,
        };
        log::debug!("Detached camera '{}'", name);
        Some(camera)
    }

    /// Attached cameras in attachment order
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Camera at `index`
    pub fn camera(&self, index: usize) -> Option<&Camera> {
        self.cameras.get(index)
    }

    /// Camera at `index`, mutably
    pub fn camera_mut(&mut self, index: usize) -> Option<&mut Camera> {
        self.cameras.get_mut(index)
    }

    /// Index of the active camera, `None` while the default camera is in use
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Make the camera at `index` active
    pub fn set_active(&mut self, index: usize) -> RenderResult<()> {
        if index >= self.cameras.len() {
            return Err(RenderError::InvalidState(format!(
                "no camera at index {} ({} attached)",
                index,
                self.cameras.len()
            )));
        }
        self.active = Some(index);
        Ok(())
    }

    /// The active camera, or the default camera when none is active
    pub fn active_camera(&self) -> &Camera {
        self.active.and_then(|index| self.cameras.get(index)).unwrap_or(&self.default_camera)
    }

    /// The active camera, mutably
    pub fn active_camera_mut(&mut self) -> &mut Camera {
        match self.active {
            Some(index) if index < self.cameras.len() => &mut self.cameras[index],
            _ => &mut self.default_camera,
        }
    }

    /// Store a scene and return its key
    pub fn add_scene(&mut self, scene: Scene) -> SceneKey {
        self.scenes.insert(scene)
    }

    /// Scene stored under `key`
    pub fn scene(&self, key: SceneKey) -> Option<&Scene> {
        self.scenes.get(key)
    }

    /// Scene stored under `key`, mutably
    pub fn scene_mut(&mut self, key: SceneKey) -> Option<&mut Scene> {
        self.scenes.get_mut(key)
    }

    /// Take a scene out of the renderer
    pub fn remove_scene(&mut self, key: SceneKey) -> Option<Scene> {
        self.scenes.remove(key)
    }

    /// View volume of the active camera in the current viewport
    pub fn view_volume(&self) -> ViewVolume<'_> {
        ViewVolume::new(self.active_camera(), self.viewport.aspect())
    }

    /// `true` if the active camera cannot see `node`
    pub fn cull(&self, node: &dyn SceneNode) -> bool {
        self.view_volume().cull(node)
    }

    /// Update the viewport and reissue the projection
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<()> {
        self.viewport = Viewport::new(width, height)?;
        let ratio = self.viewport.aspect();
        let frustum = *self.active_camera().frustum();

        device.viewport(0, 0, width, height)?;
        device.matrix_mode(MatrixMode::Projection)?;
        device.load_identity()?;
        device.perspective(frustum.view_angle() / ratio, ratio, frustum.near(), frustum.far())?;
        device.matrix_mode(MatrixMode::ModelView)?;
        device.load_identity()?;
        log::debug!("Viewport resized to {}x{}", width, height);
        Ok(())
    }

    /// Draw the active camera's scene
    ///
    /// Returns `None` without touching the device when the active camera has
    /// no scene or its scene was removed.
    pub fn draw(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<Option<FrameReport>> {
        let Self { viewport, cameras, active, default_camera, scenes, frame } = self;
        let camera = active.and_then(|index| cameras.get(index)).unwrap_or(&*default_camera);

        let Some(key) = camera.scene() else {
            log::trace!("Camera '{}' has no scene", camera.name());
            return Ok(None);
        };
        let Some(scene) = scenes.get_mut(key) else {
            log::warn!("Camera '{}' views a scene that was removed", camera.name());
            return Ok(None);
        };

        *frame += 1;
        let context = FrameContext { frame: *frame };

        let mut guard = MatrixGuard::push(device)?;
        guard.load_identity()?;
        guard.translate(camera.position().coords)?;
        apply_rotation(&mut *guard, &camera.rotation())?;

        let volume = ViewVolume::new(camera, viewport.aspect());
        let report = scene.draw(&mut *guard, &volume, &context)?;
        Ok(Some(report))
    }

    /// Clear colour and depth, then [`draw`](Self::draw)
    pub fn render_frame(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<Option<FrameReport>> {
        device.clear(ClearMask::COLOR | ClearMask::DEPTH)?;
        self.draw(device)
    }
}
