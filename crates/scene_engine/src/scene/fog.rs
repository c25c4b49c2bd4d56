//! Global fog state as a scene node
//!
//! Fog has no placement; it is an extender node whose enabled flag drives the
//! device fog capability. Enabling repopulates every fog parameter so the
//! device state matches the node even after another node changed it.

use std::ops::RangeInclusive;

use crate::foundation::math::Color;
use crate::render::device::{Capability, FogMode, FogParam, GraphicsDevice};
use crate::render::{RenderError, RenderResult};
use crate::scene::node::{DrawOutcome, FrameContext, NodeBase, SceneNode};

/// Name given to every fog node
pub const FOG_NAME: &str = "fog";

/// Device fog settings
#[derive(Debug)]
pub struct Fog {
    base: NodeBase,
    mode: FogMode,
    density: f32,
    near: f32,
    far: f32,
    color: Color,
    enabled: bool,
}

impl Fog {
    /// Create the fog node and enable it on the device
    pub fn new(
        device: &mut dyn GraphicsDevice,
        mode: FogMode,
        density: f32,
        range: RangeInclusive<f32>,
        color: Color,
    ) -> RenderResult<Self> {
        let (near, far) = range.into_inner();
        validate(density, near, far)?;

        let mut fog = Self {
            base: NodeBase::new(FOG_NAME),
            mode,
            density,
            near,
            far,
            color,
            enabled: false,
        };
        fog.enable(device, true)?;
        Ok(fog)
    }

    /// Enable and repopulate the fog, or disable it
    pub fn enable(&mut self, device: &mut dyn GraphicsDevice, enabled: bool) -> RenderResult<()> {
        if enabled {
            device.set_capability(Capability::Fog, true)?;
            device.set_fog(FogParam::Mode(self.mode))?;
            device.set_fog(FogParam::Density(self.density))?;
            device.set_fog(FogParam::Start(self.near))?;
            device.set_fog(FogParam::End(self.far))?;
            device.set_fog(FogParam::Color(self.color))?;
        } else {
            device.set_capability(Capability::Fog, false)?;
        }
        self.enabled = enabled;
        log::debug!("Fog enabled: {}", enabled);
        Ok(())
    }

    /// Whether fog is switched on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fog equation
    pub fn mode(&self) -> FogMode {
        self.mode
    }

    /// Density used by the exponential modes
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Distance range used by the linear mode
    pub fn range(&self) -> RangeInclusive<f32> {
        self.near..=self.far
    }

    /// Start of the fog range
    pub fn near(&self) -> f32 {
        self.near
    }

    /// End of the fog range
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Fog colour
    pub fn color(&self) -> Color {
        self.color
    }

    /// Change the fog settings; the device is repopulated when enabled
    pub fn configure(
        &mut self,
        device: &mut dyn GraphicsDevice,
        mode: FogMode,
        density: f32,
        range: RangeInclusive<f32>,
        color: Color,
    ) -> RenderResult<()> {
        let (near, far) = range.into_inner();
        validate(density, near, far)?;
        self.mode = mode;
        self.density = density;
        self.near = near;
        self.far = far;
        self.color = color;
        if self.enabled {
            self.enable(device, true)?;
        }
        Ok(())
    }
}

fn validate(density: f32, near: f32, far: f32) -> RenderResult<()> {
    if !density.is_finite() || density < 0.0 {
        return Err(RenderError::InvalidConfiguration(format!("fog density must be non-negative, got {}", density)));
    }
    if !near.is_finite() || !far.is_finite() || near > far {
        return Err(RenderError::InvalidConfiguration(format!("fog range {}..={} is empty", near, far)));
    }
    Ok(())
}

impl SceneNode for Fog {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn enabled(&self) -> Option<bool> {
        Some(self.enabled)
    }

    fn draw(&mut self, _device: &mut dyn GraphicsDevice, _frame: &FrameContext) -> RenderResult<DrawOutcome> {
        Ok(DrawOutcome::NotCompiled)
    }
}
