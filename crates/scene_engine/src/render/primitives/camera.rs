//! # Camera
//!
//! A named viewpoint placed in the global coordinate system. The camera only
//! stores values; the renderer turns them into a view transform and uses the
//! frustum for its cull test.

use crate::foundation::math::{Point3, Rotation};
use crate::render::primitives::Frustum;
use crate::scene::SceneKey;

/// Named viewpoint combining a [`Frustum`] with a world position and rotation
///
/// Cameras are attached to and detached from a [`Renderer`](crate::render::Renderer);
/// the camera itself has no notion of being active. A camera may name the
/// scene it views; the renderer draws nothing through a camera without one.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    name: String,
    frustum: Frustum,
    position: Point3,
    rotation: Rotation,
    scene: Option<SceneKey>,
}

impl Camera {
    /// Create a camera at the origin with no rotation and no scene
    pub fn new(name: impl Into<String>, frustum: Frustum) -> Self {
        Self {
            name: name.into(),
            frustum,
            position: Point3::origin(),
            rotation: Rotation::IDENTITY,
            scene: None,
        }
    }

    /// Builder-style placement
    pub fn with_placement(mut self, position: Point3, rotation: Rotation) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }

    /// Builder-style scene association
    pub fn viewing(mut self, scene: SceneKey) -> Self {
        self.scene = Some(scene);
        self
    }

    /// The camera's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The camera's view volume
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Mutable access to the view volume (its setters keep it valid)
    pub fn frustum_mut(&mut self) -> &mut Frustum {
        &mut self.frustum
    }

    /// World position
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Move the camera
    pub fn set_position(&mut self, position: Point3) {
        self.position = position;
        log::trace!("Camera '{}' position updated to: {}", self.name, position);
    }

    /// World rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Rotate the camera
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        log::trace!("Camera '{}' rotation updated to: {}", self.name, rotation);
    }

    /// Scene viewed through this camera
    pub fn scene(&self) -> Option<SceneKey> {
        self.scene
    }

    /// Point the camera at a scene, or at nothing
    pub fn set_scene(&mut self, scene: Option<SceneKey>) {
        self.scene = scene;
    }
}
