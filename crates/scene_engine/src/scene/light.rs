//! Light nodes
//!
//! A light is a transformable node bound to one of the device's fixed light
//! slots. Every setter writes through to the device immediately and caches the
//! value only once the device accepted it, so the cached state always mirrors
//! the device.

use crate::foundation::math::{Color, Point3, Rotation, Vec4};
use crate::render::device::{AttenuationMode, Capability, GraphicsDevice, LightParam, LightSlot};
use crate::render::RenderResult;
use crate::scene::node::{DrawOutcome, FrameContext, NodeBase, SceneNode};
use crate::scene::object::SceneObject;

/// Default name of a [`Light`]
pub const DEFAULT_LIGHT_NAME: &str = "light";

/// Default name of a [`SpotLight`]
pub const DEFAULT_SPOT_LIGHT_NAME: &str = "Spotlight";

/// Point light occupying a device light slot
#[derive(Debug)]
pub struct Light {
    object: SceneObject,
    slot: LightSlot,
    enabled: bool,
    diffuse: Option<Color>,
    ambient: Option<Color>,
    specular: Option<Color>,
    attenuation: Option<(AttenuationMode, f32)>,
}

impl Light {
    /// Create a disabled light for `slot`
    ///
    /// Construction makes no device calls.
    pub fn new(slot: LightSlot, name: impl Into<String>) -> Self {
        Self {
            object: SceneObject::new(name),
            slot,
            enabled: false,
            diffuse: None,
            ambient: None,
            specular: None,
            attenuation: None,
        }
    }

    /// Create a disabled light named [`DEFAULT_LIGHT_NAME`]
    pub fn in_slot(slot: LightSlot) -> Self {
        Self::new(slot, DEFAULT_LIGHT_NAME)
    }

    /// Device slot driven by this light
    pub fn slot(&self) -> LightSlot {
        self.slot
    }

    /// Whether the light is switched on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch the light on or off on the device
    pub fn set_enabled(&mut self, device: &mut dyn GraphicsDevice, enabled: bool) -> RenderResult<()> {
        device.set_capability(Capability::Light(self.slot), enabled)?;
        self.enabled = enabled;
        log::debug!("Light '{}' (slot {}) enabled: {}", self.object.name(), self.slot.index(), enabled);
        Ok(())
    }

    /// Light position
    pub fn position(&self) -> Point3 {
        self.object.position()
    }

    /// Move the light and update the device position
    pub fn set_position(&mut self, device: &mut dyn GraphicsDevice, position: Point3) -> RenderResult<()> {
        device.set_light(self.slot, LightParam::Position(Vec4::new(position.x, position.y, position.z, 1.0)))?;
        self.object.set_position(position);
        Ok(())
    }

    /// Light rotation
    pub fn rotation(&self) -> Rotation {
        self.object.rotation()
    }

    /// Rotate the light node (no device call for point lights)
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.object.set_rotation(rotation);
    }

    /// Diffuse colour, if set
    pub fn diffuse_color(&self) -> Option<Color> {
        self.diffuse
    }

    /// Set the diffuse colour
    pub fn set_diffuse_color(&mut self, device: &mut dyn GraphicsDevice, color: Color) -> RenderResult<()> {
        device.set_light(self.slot, LightParam::Diffuse(color))?;
        self.diffuse = Some(color);
        Ok(())
    }

    /// Ambient colour, if set
    pub fn ambient_color(&self) -> Option<Color> {
        self.ambient
    }

    /// Set the ambient colour
    pub fn set_ambient_color(&mut self, device: &mut dyn GraphicsDevice, color: Color) -> RenderResult<()> {
        device.set_light(self.slot, LightParam::Ambient(color))?;
        self.ambient = Some(color);
        Ok(())
    }

    /// Specular colour, if set
    pub fn specular_color(&self) -> Option<Color> {
        self.specular
    }

    /// Set the specular colour
    pub fn set_specular_color(&mut self, device: &mut dyn GraphicsDevice, color: Color) -> RenderResult<()> {
        device.set_light(self.slot, LightParam::Specular(color))?;
        self.specular = Some(color);
        Ok(())
    }

    /// Attenuation factor, if set
    pub fn attenuation(&self) -> Option<f32> {
        self.attenuation.map(|(_, value)| value)
    }

    /// Attenuation mode, if set
    pub fn attenuation_mode(&self) -> Option<AttenuationMode> {
        self.attenuation.map(|(mode, _)| mode)
    }

    /// Set the attenuation factor for `mode`
    pub fn set_attenuation(
        &mut self,
        device: &mut dyn GraphicsDevice,
        mode: AttenuationMode,
        value: f32,
    ) -> RenderResult<()> {
        device.set_light(self.slot, LightParam::Attenuation(mode, value))?;
        self.attenuation = Some((mode, value));
        Ok(())
    }
}

impl SceneNode for Light {
    fn base(&self) -> &NodeBase {
        self.object.base()
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        self.object.base_mut()
    }

    fn object(&self) -> Option<&SceneObject> {
        Some(&self.object)
    }

    fn object_mut(&mut self) -> Option<&mut SceneObject> {
        Some(&mut self.object)
    }

    fn enabled(&self) -> Option<bool> {
        Some(self.enabled)
    }

    fn draw(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameContext) -> RenderResult<DrawOutcome> {
        self.object.draw_compiled(device, frame)
    }
}

/// Directional cone light
///
/// The node rotation doubles as the spot direction.
#[derive(Debug)]
pub struct SpotLight {
    light: Light,
    exponent: Option<f32>,
    cutoff: Option<f32>,
}

impl SpotLight {
    /// Create a disabled spot light for `slot`
    pub fn new(slot: LightSlot, name: impl Into<String>) -> Self {
        Self { light: Light::new(slot, name), exponent: None, cutoff: None }
    }

    /// Create a disabled spot light named [`DEFAULT_SPOT_LIGHT_NAME`]
    pub fn in_slot(slot: LightSlot) -> Self {
        Self::new(slot, DEFAULT_SPOT_LIGHT_NAME)
    }

    /// Shared light state
    pub fn light(&self) -> &Light {
        &self.light
    }

    /// Shared light state, mutably
    pub fn light_mut(&mut self) -> &mut Light {
        &mut self.light
    }

    /// Rotate the light and update the device spot direction
    pub fn set_rotation(&mut self, device: &mut dyn GraphicsDevice, rotation: Rotation) -> RenderResult<()> {
        device.set_light(self.light.slot, LightParam::SpotDirection(rotation.as_vec3()))?;
        self.light.set_rotation(rotation);
        Ok(())
    }

    /// Spot exponent, if set
    pub fn exponent(&self) -> Option<f32> {
        self.exponent
    }

    /// Set the spot exponent
    pub fn set_exponent(&mut self, device: &mut dyn GraphicsDevice, exponent: f32) -> RenderResult<()> {
        device.set_light(self.light.slot, LightParam::SpotExponent(exponent))?;
        self.exponent = Some(exponent);
        Ok(())
    }

    /// Spot cutoff angle, if set
    pub fn cutoff(&self) -> Option<f32> {
        self.cutoff
    }

    /// Set the spot cutoff angle
    pub fn set_cutoff(&mut self, device: &mut dyn GraphicsDevice, cutoff: f32) -> RenderResult<()> {
        device.set_light(self.light.slot, LightParam::SpotCutoff(cutoff))?;
        self.cutoff = Some(cutoff);
        Ok(())
    }
}

impl SceneNode for SpotLight {
    fn base(&self) -> &NodeBase {
        self.light.base()
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        self.light.base_mut()
    }

    fn object(&self) -> Option<&SceneObject> {
        self.light.object()
    }

    fn object_mut(&mut self) -> Option<&mut SceneObject> {
        self.light.object_mut()
    }

    fn enabled(&self) -> Option<bool> {
        self.light.enabled()
    }

    fn draw(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameContext) -> RenderResult<DrawOutcome> {
        self.light.draw(device, frame)
    }
}
