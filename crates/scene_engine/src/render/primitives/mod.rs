//! Core primitive types for rendering
//!
//! This module contains the viewpoint types used by the renderer: the
//! [`Frustum`] describing a camera's view volume and the [`Camera`] that
//! places it in the world.

pub mod camera;
pub mod frustum;

// Re-export commonly used types
pub use camera::Camera;
pub use frustum::Frustum;
