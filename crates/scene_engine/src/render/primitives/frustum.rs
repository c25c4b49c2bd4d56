//! Camera view volume parameters

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::render::{RenderError, RenderResult};

/// Default horizontal view angle in degrees
pub const DEFAULT_VIEW_ANGLE: f32 = 90.0;

/// Default distance to the near image plate
pub const DEFAULT_NEAR: f32 = 5.0;

/// Default distance to the far image plate
pub const DEFAULT_FAR: f32 = 60.0;

/// The visual field of a camera
///
/// Defined by the view angle (degrees), the distance to the near image plate
/// and the distance to the far image plate. All three are positive and
/// finite, and `near < far`; construction fails otherwise and the setters keep
/// the invariant.
///
/// The renderer derives the half-extents of the view volume at cull time from
/// the depth of the tested node, so nothing beyond these three values is
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frustum {
    view_angle: f32,
    near: f32,
    far: f32,
}

impl Frustum {
    /// Create a frustum, validating its parameters
    pub fn new(view_angle: f32, near: f32, far: f32) -> RenderResult<Self> {
        Self::validate(view_angle, near, far)?;
        Ok(Self { view_angle, near, far })
    }

    fn validate(view_angle: f32, near: f32, far: f32) -> RenderResult<()> {
        for (label, value) in [("view angle", view_angle), ("near distance", near), ("far distance", far)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(RenderError::InvalidConfiguration(format!(
                    "frustum {} must be positive and finite, got {}",
                    label, value
                )));
            }
        }
        if near >= far {
            return Err(RenderError::InvalidConfiguration(format!(
                "frustum near distance ({}) must be less than far distance ({})",
                near, far
            )));
        }
        Ok(())
    }

    /// View angle in degrees
    pub fn view_angle(&self) -> f32 {
        self.view_angle
    }

    /// Distance to the near image plate
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Distance to the far image plate
    pub fn far(&self) -> f32 {
        self.far
    }

    /// The inclusive range from the near to the far image plate
    pub fn depth_range(&self) -> RangeInclusive<f32> {
        self.near..=self.far
    }

    /// Change the view angle
    pub fn set_view_angle(&mut self, view_angle: f32) -> RenderResult<()> {
        Self::validate(view_angle, self.near, self.far)?;
        self.view_angle = view_angle;
        Ok(())
    }

    /// Move both image plates at once
    pub fn set_depth(&mut self, near: f32, far: f32) -> RenderResult<()> {
        Self::validate(self.view_angle, near, far)?;
        self.near = near;
        self.far = far;
        Ok(())
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self {
            view_angle: DEFAULT_VIEW_ANGLE,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

#[derive(Deserialize)]
struct RawFrustum {
    view_angle: f32,
    near: f32,
    far: f32,
}

impl<'de> Deserialize<'de> for Frustum {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawFrustum::deserialize(deserializer)?;
        Frustum::new(raw.view_angle, raw.near, raw.far).map_err(serde::de::Error::custom)
    }
}
