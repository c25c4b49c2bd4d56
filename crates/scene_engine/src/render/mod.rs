//! # Rendering System
//!
//! Drives one frame of the retained scene graph through a fixed-function
//! graphics device.
//!
//! ## Architecture
//!
//! - **Device**: the [`GraphicsDevice`] boundary plus the in-memory
//!   [`RecordingDevice`] used for headless runs and tests
//! - **Primitives**: [`Frustum`] and [`Camera`]
//! - **Renderer**: camera roster, active camera selection, the cull test and
//!   the per-frame draw pass
//!
//! ## Frame flow
//!
//! ```text
//! Renderer::draw
//!      ↓  view transform from the active camera
//! Scene::draw
//!      ↓  for each child, in insertion order
//! CullRoutine::cull  →  SceneNode::draw
//! ```

pub mod device;
pub mod primitives;
pub mod renderer;

pub use device::{GraphicsDevice, MatrixGuard, RecordingDevice, ListHandle, TextureHandle, BufferHandle};
pub use primitives::{Camera, Frustum};
pub use renderer::{CullRoutine, Renderer, ViewVolume, Viewport};

use thiserror::Error;

/// Errors raised by the scene graph and its graphics device
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A referenced device or file resource could not be acquired
    ///
    /// Raised when a texture or buffer that a node depends on has been
    /// released, or when a device is handed a handle it never issued.
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// A device call failed
    ///
    /// Carries the name of the failing call and the device's reason. The
    /// scene graph surfaces these unchanged.
    #[error("Device call '{call}' failed: {reason}")]
    Device {
        /// Name of the device call
        call: &'static str,
        /// Device-provided reason
        reason: String,
    },

    /// An operation was invoked in a state that does not allow it
    #[error("Invalid render state: {0}")]
    InvalidState(String),

    /// Construction-time parameters violate an invariant
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl RenderError {
    /// Shorthand for a [`RenderError::Device`] failure
    pub fn device(call: &'static str, reason: impl Into<String>) -> Self {
        Self::Device { call, reason: reason.into() }
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
