//! Bounding volumes used as cull tolerances and containment proxies

use std::fmt;

use crate::foundation::math::{Point3, Vec3};
use crate::render::{RenderError, RenderResult};
use crate::scene::node::SceneNode;

/// How a node relates to a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// No overlap
    Outside,
    /// Partial overlap
    Intersects,
    /// Completely enclosed
    Inside,
}

/// Simplified spatial proxy of a node
///
/// Volumes are centred on the position they are tested at. A box is axis
/// aligned; its cull radius is half its diagonal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    /// Sphere of the given radius
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Axis-aligned box with full extents
    Box {
        /// Extent along X
        width: f32,
        /// Extent along Y
        height: f32,
        /// Extent along Z
        depth: f32,
    },
}

impl BoundingVolume {
    /// Sphere volume
    ///
    /// A negative or non-finite radius is an invalid configuration.
    pub fn sphere(radius: f32) -> RenderResult<Self> {
        Ok(Self::Sphere { radius: extent("radius", radius)? })
    }

    /// Box volume
    ///
    /// Extents must be finite and non-negative; zero gives a flat box.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> RenderResult<Self> {
        Ok(Self::Box {
            width: extent("width", width)?,
            height: extent("height", height)?,
            depth: extent("depth", depth)?,
        })
    }

    /// Radius of the smallest sphere enclosing the volume
    pub fn radius(&self) -> f32 {
        match *self {
            Self::Sphere { radius } => radius,
            Self::Box { width, height, depth } => Vec3::new(width, height, depth).norm() * 0.5,
        }
    }

    fn half_extents(&self) -> Vec3 {
        match *self {
            Self::Sphere { radius } => Vec3::repeat(radius),
            Self::Box { width, height, depth } => Vec3::new(width, height, depth) * 0.5,
        }
    }

    /// True if `point` lies inside the volume centred at `at`
    pub fn contains_point(&self, at: &Point3, point: &Point3) -> bool {
        let offset = point - at;
        match self {
            Self::Sphere { radius } => offset.norm() <= *radius,
            Self::Box { .. } => {
                let half = self.half_extents();
                offset.x.abs() <= half.x && offset.y.abs() <= half.y && offset.z.abs() <= half.z
            }
        }
    }

    /// True if the volume centred at `at` overlaps `node`
    ///
    /// Bounded nodes are tested as spheres of their cull radius; unbounded
    /// nodes as points. Nodes without a position never intersect.
    pub fn intersects(&self, at: &Point3, node: &dyn SceneNode) -> bool {
        let Some(position) = node.position() else {
            return false;
        };
        let other = node.bounds().map_or(0.0, BoundingVolume::radius);
        match self {
            Self::Sphere { radius } => (position - at).norm() <= radius + other,
            Self::Box { .. } => {
                // Closest point of the box to the node centre
                let half = self.half_extents();
                let offset = position - at;
                let clamped = Vec3::new(
                    offset.x.clamp(-half.x, half.x),
                    offset.y.clamp(-half.y, half.y),
                    offset.z.clamp(-half.z, half.z),
                );
                (offset - clamped).norm() <= other
            }
        }
    }

    /// True if the volume centred at `at` fully encloses `node`
    pub fn contains(&self, at: &Point3, node: &dyn SceneNode) -> bool {
        let Some(position) = node.position() else {
            return false;
        };
        let other = node.bounds().map_or(0.0, BoundingVolume::radius);
        match self {
            Self::Sphere { radius } => (position - at).norm() + other <= *radius,
            Self::Box { .. } => {
                let half = self.half_extents() - Vec3::repeat(other);
                if half.x < 0.0 || half.y < 0.0 || half.z < 0.0 {
                    return false;
                }
                let offset = position - at;
                offset.x.abs() <= half.x && offset.y.abs() <= half.y && offset.z.abs() <= half.z
            }
        }
    }

    /// Classify `node` against the volume centred at `at`
    pub fn classify(&self, at: &Point3, node: &dyn SceneNode) -> Containment {
        if self.contains(at, node) {
            Containment::Inside
        } else if self.intersects(at, node) {
            Containment::Intersects
        } else {
            Containment::Outside
        }
    }
}

fn extent(what: &str, value: f32) -> RenderResult<f32> {
    if !value.is_finite() || value < 0.0 {
        return Err(RenderError::InvalidConfiguration(format!(
            "bounding volume {} must be finite and non-negative, got {}",
            what, value
        )));
    }
    Ok(value)
}

impl fmt::Display for BoundingVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sphere { radius } => write!(f, "sphere(r={})", radius),
            Self::Box { width, height, depth } => write!(f, "box({}x{}x{})", width, height, depth),
        }
    }
}
