//! Scene graph
//!
//! A retained hierarchy of renderable nodes. The [`Scene`] root owns its
//! top-level nodes in insertion order; every node carries a process-unique
//! [`NodeId`], a name, a visibility flag and optional bounds.
//!
//! ## Node kinds
//!
//! ```text
//! SceneNode
//!  ├─ SceneObject         position, rotation, compiled draw list, behaviours
//!  │   ├─ Light / SpotLight
//!  │   ├─ Geometry / Terrain
//!  │   └─ GeometryArray   composite of Geometry
//!  └─ Fog                 enabled flag only
//! ```
//!
//! The renderer owns scenes in a slot map and refers to them by [`SceneKey`].

mod bounds;
mod draw_list;
mod fog;
mod geometry;
mod light;
mod node;
mod object;
mod scene_graph;
mod texture;

#[cfg(test)]
mod scene_tests;

pub use bounds::{BoundingVolume, Containment};
pub use draw_list::{DrawList, DrawListState};
pub use fog::{Fog, FOG_NAME};
pub use geometry::{Geometry, GeometryArray, Terrain, VERTEX_COMPONENTS};
pub use light::{Light, SpotLight, DEFAULT_LIGHT_NAME, DEFAULT_SPOT_LIGHT_NAME};
pub use node::{Behavior, DrawOutcome, FrameContext, NodeBase, NodeId, NodeTransform, SceneNode};
pub use object::SceneObject;
pub use scene_graph::{FrameReport, Scene};
pub use texture::{Texture, DEFAULT_PARAMS};

use slotmap::new_key_type;

new_key_type! {
    /// Key of a scene stored in a [`Renderer`](crate::render::Renderer)
    pub struct SceneKey;
}
