//! # Scene Engine
//!
//! A retained-mode scene graph drawn through a fixed-function graphics device.
//!
//! ## Features
//!
//! - **Scene graph**: ordered, id-tagged nodes with visibility and bounds
//! - **Compiled draw lists**: each transformable node replays a precompiled
//!   device command list every frame
//! - **Camera culling**: an approximate view-volume test per top-level node
//! - **Headless device**: [`render::RecordingDevice`] evaluates and records
//!   every device call, for tools and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let mut device = RecordingDevice::new();
//!     let mut renderer = Renderer::new(Viewport::new(800, 600)?);
//!
//!     let mut scene = Scene::new("world");
//!     let mut crate_box = SceneObject::new("box").placed(Point3::new(0.0, 0.0, -20.0), Rotation::IDENTITY);
//!     crate_box.compile_with(&mut device, CompileMode::Compile, |device| {
//!         device.draw_arrays(Primitive::Triangles, 0, 36)
//!     })?;
//!     let _ = scene.add_node(crate_box);
//!
//!     let key = renderer.add_scene(scene);
//!     renderer.attach_camera(Camera::new("main", Frustum::default()).viewing(key), true);
//!
//!     if let Some(report) = renderer.render_frame(&mut device)? {
//!         println!("{}", report);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod tree;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineConfig},
        foundation::math::{Color, Point3, Rotation, Vec3},
        render::{
            device::{CompileMode, Primitive},
            Camera, CullRoutine, Frustum, GraphicsDevice, RecordingDevice, RenderError, RenderResult, Renderer,
            Viewport,
        },
        scene::{
            Behavior, BoundingVolume, DrawOutcome, Fog, FrameContext, FrameReport, Geometry, GeometryArray, Light,
            NodeId, Scene, SceneKey, SceneNode, SceneObject, SpotLight, Terrain, Texture,
        },
        tree::{Branch, Leaf},
    };
}
