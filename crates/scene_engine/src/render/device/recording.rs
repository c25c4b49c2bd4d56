//! In-memory graphics device
//!
//! [`RecordingDevice`] implements the full [`GraphicsDevice`] contract without a
//! GPU. It keeps a trace of every call it receives, evaluates the matrix stacks
//! with real matrix arithmetic, compiles command lists by recording calls and
//! replays them on `call_list`. Headless tools use it to inspect a frame; the
//! test suite uses it to check call ordering and stack balance.

use std::collections::{HashMap, HashSet};
use std::mem::discriminant;

use slotmap::SlotMap;

use super::{
    BufferHandle, BufferTarget, Capability, ClearMask, ClientState, CompileMode, DataType, FogParam,
    GraphicsDevice, LightParam, LightSlot, ListHandle, MatrixMode, Primitive, TextureHandle, TextureImage,
    TextureParam, TextureTarget,
};
use crate::config::DeviceConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::{RenderError, RenderResult};

/// Fixed-function minimum guaranteed model-view stack depth
const DEFAULT_MAX_MATRIX_DEPTH: usize = 32;

/// Nesting limit for lists that call other lists
const DEFAULT_MAX_LIST_NESTING: usize = 64;

/// One call received through the [`GraphicsDevice`] trait
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DeviceCall {
    PushMatrix,
    PopMatrix,
    LoadIdentity,
    Translate(Vec3),
    Rotate(f32, Vec3),
    MatrixMode(MatrixMode),
    Perspective { fov_y: f32, aspect: f32, near: f32, far: f32 },
    GenList(ListHandle),
    NewList(ListHandle, CompileMode),
    EndList,
    CallList(ListHandle),
    DeleteList(ListHandle),
    SetCapability(Capability, bool),
    SetLight(LightSlot, LightParam),
    SetFog(FogParam),
    Clear(ClearMask),
    Viewport { x: i32, y: i32, width: u32, height: u32 },
    GenTexture(TextureHandle),
    BindTexture(TextureTarget, TextureHandle),
    TexParameter(TextureTarget, TextureParam),
    TexImage(TextureTarget, TextureImage),
    DeleteTexture(TextureHandle),
    GenBuffer(BufferHandle),
    BindBuffer(BufferTarget, BufferHandle),
    BufferData(BufferTarget, usize),
    DeleteBuffer(BufferHandle),
    VertexPointer { components: u32, data_type: DataType, stride: u32 },
    EnableClientState(ClientState),
    DrawArrays { primitive: Primitive, first: u32, count: u32 },
}

#[derive(Debug, Default)]
struct ListRecord {
    commands: Vec<DeviceCall>,
    compiled: bool,
}

#[derive(Debug)]
struct Compilation {
    list: ListHandle,
    mode: CompileMode,
    commands: Vec<DeviceCall>,
}

#[derive(Debug, Default)]
struct TextureRecord {
    image: Option<TextureImage>,
    params: Vec<TextureParam>,
}

/// Headless [`GraphicsDevice`] that records and evaluates every call
#[derive(Debug)]
pub struct RecordingDevice {
    max_matrix_depth: usize,
    max_list_nesting: usize,

    trace: Vec<DeviceCall>,

    mode: MatrixMode,
    modelview: Vec<Mat4>,
    projection: Vec<Mat4>,

    lists: SlotMap<ListHandle, ListRecord>,
    compiling: Option<Compilation>,
    nesting: usize,
    failing_lists: HashSet<ListHandle>,

    textures: SlotMap<TextureHandle, TextureRecord>,
    bound_textures: HashMap<TextureTarget, TextureHandle>,

    buffers: SlotMap<BufferHandle, Vec<u8>>,
    bound_buffers: HashMap<BufferTarget, BufferHandle>,

    capabilities: HashSet<Capability>,
    client_states: HashSet<ClientState>,
    lights: HashMap<LightSlot, Vec<LightParam>>,
    fog: Vec<FogParam>,
    viewport: (i32, i32, u32, u32),
    vertex_layout: Option<(u32, DataType, u32)>,

    clears: usize,
    vertices_drawn: u64,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    /// Create a device with fixed-function default limits
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_MATRIX_DEPTH, DEFAULT_MAX_LIST_NESTING)
    }

    /// Create a device with explicit stack depth and list nesting limits
    pub fn with_limits(max_matrix_depth: usize, max_list_nesting: usize) -> Self {
        Self {
            max_matrix_depth: max_matrix_depth.max(1),
            max_list_nesting,
            trace: Vec::new(),
            mode: MatrixMode::ModelView,
            modelview: vec![Mat4::identity()],
            projection: vec![Mat4::identity()],
            lists: SlotMap::with_key(),
            compiling: None,
            nesting: 0,
            failing_lists: HashSet::new(),
            textures: SlotMap::with_key(),
            bound_textures: HashMap::new(),
            buffers: SlotMap::with_key(),
            bound_buffers: HashMap::new(),
            capabilities: HashSet::new(),
            client_states: HashSet::new(),
            lights: HashMap::new(),
            fog: Vec::new(),
            viewport: (0, 0, 0, 0),
            vertex_layout: None,
            clears: 0,
            vertices_drawn: 0,
        }
    }

    /// Create a device with the limits from configuration
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::with_limits(config.max_matrix_depth, config.max_list_nesting)
    }

    /// Every call received so far, in order
    ///
    /// Calls recorded into a list appear here when they are issued; replays
    /// triggered by `call_list` appear only as the `CallList` entry.
    pub fn calls(&self) -> &[DeviceCall] {
        &self.trace
    }

    /// Forget the call trace (device state is kept)
    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Count traced calls matching a predicate
    pub fn count_calls(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.trace.iter().filter(|call| predicate(call)).count()
    }

    /// Make every future `call_list` of `list` fail
    pub fn fail_list(&mut self, list: ListHandle) {
        self.failing_lists.insert(list);
    }

    /// Top of the model-view stack
    pub fn modelview(&self) -> &Mat4 {
        self.modelview.last().unwrap_or_else(|| unreachable!("model-view stack is never empty"))
    }

    /// Top of the projection stack
    pub fn projection(&self) -> &Mat4 {
        self.projection.last().unwrap_or_else(|| unreachable!("projection stack is never empty"))
    }

    /// Depth of the model-view stack regardless of the current matrix mode
    pub fn modelview_depth(&self) -> usize {
        self.modelview.len()
    }

    /// Number of list handles currently allocated
    pub fn live_lists(&self) -> usize {
        self.lists.len()
    }

    /// Commands compiled into a list, if it exists and was compiled
    pub fn list_commands(&self, list: ListHandle) -> Option<&[DeviceCall]> {
        self.lists
            .get(list)
            .filter(|record| record.compiled)
            .map(|record| record.commands.as_slice())
    }

    /// True while a `new_list` is open
    pub fn is_compiling(&self) -> bool {
        self.compiling.is_some()
    }

    /// Whether a capability is currently enabled
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Current parameters of a light unit (latest write per parameter kind)
    pub fn light_params(&self, slot: LightSlot) -> &[LightParam] {
        self.lights.get(&slot).map_or(&[], Vec::as_slice)
    }

    /// Current fog parameters (latest write per parameter kind)
    pub fn fog_params(&self) -> &[FogParam] {
        &self.fog
    }

    /// Texture bound to a target
    pub fn bound_texture(&self, target: TextureTarget) -> Option<TextureHandle> {
        self.bound_textures.get(&target).copied()
    }

    /// Image uploaded to a texture
    pub fn texture_image(&self, texture: TextureHandle) -> Option<&TextureImage> {
        self.textures.get(texture).and_then(|record| record.image.as_ref())
    }

    /// Parameters set on a texture, in order
    pub fn texture_params(&self, texture: TextureHandle) -> Option<&[TextureParam]> {
        self.textures.get(texture).map(|record| record.params.as_slice())
    }

    /// Number of live texture objects
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Contents of a buffer object
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer).map(Vec::as_slice)
    }

    /// Number of live buffer objects
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Last viewport rectangle as `(x, y, width, height)`
    pub fn current_viewport(&self) -> (i32, i32, u32, u32) {
        self.viewport
    }

    /// Number of `clear` calls executed
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Total vertices submitted through executed `draw_arrays` calls
    pub fn vertices_drawn(&self) -> u64 {
        self.vertices_drawn
    }

    fn stack_mut(&mut self) -> &mut Vec<Mat4> {
        match self.mode {
            MatrixMode::ModelView => &mut self.modelview,
            MatrixMode::Projection => &mut self.projection,
        }
    }

    fn multiply_top(&mut self, matrix: Mat4) {
        if let Some(top) = self.stack_mut().last_mut() {
            *top *= matrix;
        }
    }

    /// Trace a recordable call and either record it, execute it, or both
    fn submit(&mut self, call: DeviceCall) -> RenderResult<()> {
        self.trace.push(call.clone());
        match self.compiling.as_mut() {
            Some(compilation) => {
                compilation.commands.push(call.clone());
                if compilation.mode == CompileMode::CompileAndExecute {
                    self.execute(&call)?;
                }
                Ok(())
            }
            None => self.execute(&call),
        }
    }

    fn execute(&mut self, call: &DeviceCall) -> RenderResult<()> {
        match *call {
            DeviceCall::PushMatrix => {
                let limit = self.max_matrix_depth;
                let stack = self.stack_mut();
                if stack.len() >= limit {
                    return Err(RenderError::device("push_matrix", format!("stack overflow at depth {}", limit)));
                }
                let top = *stack.last().unwrap_or(&Mat4::identity());
                stack.push(top);
            }
            DeviceCall::PopMatrix => {
                let stack = self.stack_mut();
                if stack.len() <= 1 {
                    return Err(RenderError::device("pop_matrix", "stack underflow"));
                }
                stack.pop();
            }
            DeviceCall::LoadIdentity => {
                if let Some(top) = self.stack_mut().last_mut() {
                    *top = Mat4::identity();
                }
            }
            DeviceCall::Translate(offset) => self.multiply_top(Mat4::translation(&offset)),
            DeviceCall::Rotate(degrees, axis) => self.multiply_top(Mat4::rotation_degrees(degrees, &axis)),
            DeviceCall::MatrixMode(mode) => self.mode = mode,
            DeviceCall::Perspective { fov_y, aspect, near, far } => {
                self.multiply_top(Mat4::perspective_degrees(fov_y, aspect, near, far));
            }
            DeviceCall::CallList(list) => self.replay(list)?,
            DeviceCall::SetCapability(capability, enabled) => {
                if enabled {
                    self.capabilities.insert(capability);
                } else {
                    self.capabilities.remove(&capability);
                }
            }
            DeviceCall::SetLight(slot, param) => {
                let params = self.lights.entry(slot).or_default();
                params.retain(|existing| !same_light_param(existing, &param));
                params.push(param);
            }
            DeviceCall::SetFog(param) => {
                self.fog.retain(|existing| discriminant(existing) != discriminant(&param));
                self.fog.push(param);
            }
            DeviceCall::Clear(_) => self.clears += 1,
            DeviceCall::Viewport { x, y, width, height } => self.viewport = (x, y, width, height),
            DeviceCall::BindTexture(target, texture) => {
                if !self.textures.contains_key(texture) {
                    return Err(RenderError::MissingResource(format!("texture {:?} is not a live texture", texture)));
                }
                self.bound_textures.insert(target, texture);
            }
            DeviceCall::TexParameter(target, param) => {
                let record = self
                    .bound_textures
                    .get(&target)
                    .and_then(|texture| self.textures.get_mut(*texture))
                    .ok_or_else(|| RenderError::InvalidState(format!("no texture bound to {:?}", target)))?;
                record.params.push(param);
            }
            DeviceCall::BindBuffer(target, buffer) => {
                if !self.buffers.contains_key(buffer) {
                    return Err(RenderError::MissingResource(format!("buffer {:?} is not a live buffer", buffer)));
                }
                self.bound_buffers.insert(target, buffer);
            }
            DeviceCall::VertexPointer { components, data_type, stride } => {
                self.vertex_layout = Some((components, data_type, stride));
            }
            DeviceCall::EnableClientState(state) => {
                self.client_states.insert(state);
            }
            DeviceCall::DrawArrays { count, .. } => {
                if !self.bound_buffers.contains_key(&BufferTarget::Array) {
                    return Err(RenderError::InvalidState("draw_arrays without a bound array buffer".to_string()));
                }
                if !self.client_states.contains(&ClientState::VertexArray) {
                    return Err(RenderError::InvalidState("draw_arrays with the vertex array disabled".to_string()));
                }
                self.vertices_drawn += u64::from(count);
            }
            ref other => {
                return Err(RenderError::InvalidState(format!("{:?} cannot be replayed", other)));
            }
        }
        Ok(())
    }

    fn replay(&mut self, list: ListHandle) -> RenderResult<()> {
        if self.failing_lists.contains(&list) {
            return Err(RenderError::device("call_list", format!("list {:?} rejected by device", list)));
        }
        let commands = self
            .lists
            .get(list)
            .ok_or_else(|| RenderError::MissingResource(format!("list {:?} is not a live list", list)))?
            .commands
            .clone();
        if self.nesting >= self.max_list_nesting {
            return Err(RenderError::device("call_list", "list nesting limit exceeded"));
        }

        self.nesting += 1;
        let result = commands.iter().try_for_each(|command| self.execute(command));
        self.nesting -= 1;
        result
    }
}

fn same_light_param(a: &LightParam, b: &LightParam) -> bool {
    match (a, b) {
        (LightParam::Attenuation(mode_a, _), LightParam::Attenuation(mode_b, _)) => mode_a == mode_b,
        _ => discriminant(a) == discriminant(b),
    }
}

impl GraphicsDevice for RecordingDevice {
    fn push_matrix(&mut self) -> RenderResult<()> {
        self.submit(DeviceCall::PushMatrix)
    }

    fn pop_matrix(&mut self) -> RenderResult<()> {
        self.submit(DeviceCall::PopMatrix)
    }

    fn load_identity(&mut self) -> RenderResult<()> {
        self.submit(DeviceCall::LoadIdentity)
    }

    fn translate(&mut self, offset: Vec3) -> RenderResult<()> {
        self.submit(DeviceCall::Translate(offset))
    }

    fn rotate(&mut self, degrees: f32, axis: Vec3) -> RenderResult<()> {
        self.submit(DeviceCall::Rotate(degrees, axis))
    }

    fn matrix_mode(&mut self, mode: MatrixMode) -> RenderResult<()> {
        self.submit(DeviceCall::MatrixMode(mode))
    }

    fn perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> RenderResult<()> {
        self.submit(DeviceCall::Perspective { fov_y, aspect, near, far })
    }

    fn matrix_depth(&self) -> usize {
        match self.mode {
            MatrixMode::ModelView => self.modelview.len(),
            MatrixMode::Projection => self.projection.len(),
        }
    }

    fn gen_list(&mut self) -> RenderResult<ListHandle> {
        let list = self.lists.insert(ListRecord::default());
        self.trace.push(DeviceCall::GenList(list));
        Ok(list)
    }

    fn new_list(&mut self, list: ListHandle, mode: CompileMode) -> RenderResult<()> {
        self.trace.push(DeviceCall::NewList(list, mode));
        if self.compiling.is_some() {
            return Err(RenderError::InvalidState("new_list called while another list is open".to_string()));
        }
        if !self.lists.contains_key(list) {
            return Err(RenderError::MissingResource(format!("list {:?} is not a live list", list)));
        }
        self.compiling = Some(Compilation { list, mode, commands: Vec::new() });
        Ok(())
    }

    fn end_list(&mut self) -> RenderResult<()> {
        self.trace.push(DeviceCall::EndList);
        let compilation = self
            .compiling
            .take()
            .ok_or_else(|| RenderError::InvalidState("end_list called with no open list".to_string()))?;
        let record = self
            .lists
            .get_mut(compilation.list)
            .ok_or_else(|| RenderError::MissingResource(format!("list {:?} was deleted while open", compilation.list)))?;
        record.commands = compilation.commands;
        record.compiled = true;
        Ok(())
    }

    fn call_list(&mut self, list: ListHandle) -> RenderResult<()> {
        self.submit(DeviceCall::CallList(list))
    }

    fn delete_list(&mut self, list: ListHandle) -> RenderResult<()> {
        self.trace.push(DeviceCall::DeleteList(list));
        self.failing_lists.remove(&list);
        self.lists
            .remove(list)
            .map(|_| ())
            .ok_or_else(|| RenderError::MissingResource(format!("list {:?} is not a live list", list)))
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) -> RenderResult<()> {
        self.submit(DeviceCall::SetCapability(capability, enabled))
    }

    fn set_light(&mut self, slot: LightSlot, param: LightParam) -> RenderResult<()> {
        self.submit(DeviceCall::SetLight(slot, param))
    }

    fn set_fog(&mut self, param: FogParam) -> RenderResult<()> {
        self.submit(DeviceCall::SetFog(param))
    }

    fn clear(&mut self, mask: ClearMask) -> RenderResult<()> {
        self.submit(DeviceCall::Clear(mask))
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> RenderResult<()> {
        self.submit(DeviceCall::Viewport { x, y, width, height })
    }

    fn gen_texture(&mut self) -> RenderResult<TextureHandle> {
        let texture = self.textures.insert(TextureRecord::default());
        self.trace.push(DeviceCall::GenTexture(texture));
        Ok(texture)
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: TextureHandle) -> RenderResult<()> {
        self.submit(DeviceCall::BindTexture(target, texture))
    }

    fn tex_parameter(&mut self, target: TextureTarget, param: TextureParam) -> RenderResult<()> {
        self.submit(DeviceCall::TexParameter(target, param))
    }

    fn tex_image(&mut self, target: TextureTarget, image: &TextureImage, data: &[u8]) -> RenderResult<()> {
        self.trace.push(DeviceCall::TexImage(target, *image));
        if data.len() != image.byte_len() {
            return Err(RenderError::device(
                "tex_image",
                format!("expected {} bytes of pixel data, got {}", image.byte_len(), data.len()),
            ));
        }
        let record = self
            .bound_textures
            .get(&target)
            .and_then(|texture| self.textures.get_mut(*texture))
            .ok_or_else(|| RenderError::InvalidState(format!("no texture bound to {:?}", target)))?;
        record.image = Some(*image);
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureHandle) -> RenderResult<()> {
        self.trace.push(DeviceCall::DeleteTexture(texture));
        self.bound_textures.retain(|_, bound| *bound != texture);
        self.textures
            .remove(texture)
            .map(|_| ())
            .ok_or_else(|| RenderError::MissingResource(format!("texture {:?} is not a live texture", texture)))
    }

    fn gen_buffer(&mut self) -> RenderResult<BufferHandle> {
        let buffer = self.buffers.insert(Vec::new());
        self.trace.push(DeviceCall::GenBuffer(buffer));
        Ok(buffer)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferHandle) -> RenderResult<()> {
        self.submit(DeviceCall::BindBuffer(target, buffer))
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) -> RenderResult<()> {
        self.trace.push(DeviceCall::BufferData(target, data.len()));
        let contents = self
            .bound_buffers
            .get(&target)
            .and_then(|buffer| self.buffers.get_mut(*buffer))
            .ok_or_else(|| RenderError::InvalidState(format!("no buffer bound to {:?}", target)))?;
        contents.clear();
        contents.extend_from_slice(data);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> RenderResult<()> {
        self.trace.push(DeviceCall::DeleteBuffer(buffer));
        self.bound_buffers.retain(|_, bound| *bound != buffer);
        self.buffers
            .remove(buffer)
            .map(|_| ())
            .ok_or_else(|| RenderError::MissingResource(format!("buffer {:?} is not a live buffer", buffer)))
    }

    fn vertex_pointer(&mut self, components: u32, data_type: DataType, stride: u32) -> RenderResult<()> {
        self.submit(DeviceCall::VertexPointer { components, data_type, stride })
    }

    fn enable_client_state(&mut self, state: ClientState) -> RenderResult<()> {
        self.submit(DeviceCall::EnableClientState(state))
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) -> RenderResult<()> {
        self.submit(DeviceCall::DrawArrays { primitive, first, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::foundation::math::Point3;

    #[test]
    fn test_limits_from_config() {
        let config = DeviceConfig { max_matrix_depth: 2, max_list_nesting: 4 };
        let mut device = RecordingDevice::from_config(&config);

        device.push_matrix().unwrap();
        assert!(matches!(device.push_matrix(), Err(RenderError::Device { call: "push_matrix", .. })));
        assert_eq!(device.matrix_depth(), 2);
    }

    #[test]
    fn test_matrix_stack_push_pop() {
        let mut device = RecordingDevice::new();
        assert_eq!(device.matrix_depth(), 1);

        device.push_matrix().unwrap();
        device.translate(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(device.matrix_depth(), 2);
        let moved = device.modelview().transform_point(&Point3::origin());
        assert_relative_eq!(moved, Point3::new(1.0, 2.0, 3.0));

        device.pop_matrix().unwrap();
        assert_eq!(device.matrix_depth(), 1);
        assert_eq!(*device.modelview(), Mat4::identity());
    }

    #[test]
    fn test_pop_underflow_and_push_overflow() {
        let mut device = RecordingDevice::with_limits(2, 4);
        assert!(matches!(device.pop_matrix(), Err(RenderError::Device { call: "pop_matrix", .. })));

        device.push_matrix().unwrap();
        assert!(matches!(device.push_matrix(), Err(RenderError::Device { call: "push_matrix", .. })));
        assert_eq!(device.matrix_depth(), 2);
    }

    #[test]
    fn test_list_records_then_replays() {
        let mut device = RecordingDevice::new();
        let list = device.gen_list().unwrap();

        device.new_list(list, CompileMode::Compile).unwrap();
        device.translate(Vec3::new(0.0, 5.0, 0.0)).unwrap();
        device.end_list().unwrap();

        // Compilation does not execute
        assert_eq!(*device.modelview(), Mat4::identity());
        assert_eq!(device.list_commands(list).unwrap(), &[DeviceCall::Translate(Vec3::new(0.0, 5.0, 0.0))]);

        device.call_list(list).unwrap();
        let moved = device.modelview().transform_point(&Point3::origin());
        assert_relative_eq!(moved, Point3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_compile_and_execute() {
        let mut device = RecordingDevice::new();
        let list = device.gen_list().unwrap();
        device.new_list(list, CompileMode::CompileAndExecute).unwrap();
        device.translate(Vec3::new(2.0, 0.0, 0.0)).unwrap();
        device.end_list().unwrap();

        let moved = device.modelview().transform_point(&Point3::origin());
        assert_relative_eq!(moved, Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_nested_new_list_rejected() {
        let mut device = RecordingDevice::new();
        let a = device.gen_list().unwrap();
        let b = device.gen_list().unwrap();
        device.new_list(a, CompileMode::Compile).unwrap();
        assert!(matches!(device.new_list(b, CompileMode::Compile), Err(RenderError::InvalidState(_))));
        device.end_list().unwrap();
        assert!(matches!(device.end_list(), Err(RenderError::InvalidState(_))));
    }

    #[test]
    fn test_self_calling_list_hits_nesting_limit() {
        let mut device = RecordingDevice::with_limits(8, 3);
        let list = device.gen_list().unwrap();
        device.new_list(list, CompileMode::Compile).unwrap();
        device.call_list(list).unwrap();
        device.end_list().unwrap();

        assert!(matches!(device.call_list(list), Err(RenderError::Device { call: "call_list", .. })));
    }

    #[test]
    fn test_deleted_list_is_missing() {
        let mut device = RecordingDevice::new();
        let list = device.gen_list().unwrap();
        device.delete_list(list).unwrap();
        assert_eq!(device.live_lists(), 0);
        assert!(matches!(device.call_list(list), Err(RenderError::MissingResource(_))));
        assert!(matches!(device.delete_list(list), Err(RenderError::MissingResource(_))));
    }

    #[test]
    fn test_injected_list_failure() {
        let mut device = RecordingDevice::new();
        let list = device.gen_list().unwrap();
        device.new_list(list, CompileMode::Compile).unwrap();
        device.end_list().unwrap();

        device.fail_list(list);
        assert!(matches!(device.call_list(list), Err(RenderError::Device { .. })));
    }

    #[test]
    fn test_light_params_latest_write_wins() {
        let mut device = RecordingDevice::new();
        let slot = LightSlot::new(0).unwrap();
        device.set_light(slot, LightParam::SpotCutoff(30.0)).unwrap();
        device.set_light(slot, LightParam::SpotCutoff(45.0)).unwrap();
        device.set_light(slot, LightParam::Attenuation(crate::render::device::AttenuationMode::Linear, 0.5)).unwrap();
        device.set_light(slot, LightParam::Attenuation(crate::render::device::AttenuationMode::Constant, 1.0)).unwrap();

        let params = device.light_params(slot);
        assert_eq!(params.len(), 3);
        assert!(params.contains(&LightParam::SpotCutoff(45.0)));
    }

    #[test]
    fn test_buffer_upload_and_draw() {
        let mut device = RecordingDevice::new();
        let buffer = device.gen_buffer().unwrap();
        device.bind_buffer(BufferTarget::Array, buffer).unwrap();
        device.buffer_data(BufferTarget::Array, &[0u8; 36]).unwrap();
        assert_eq!(device.buffer_contents(buffer).unwrap().len(), 36);

        assert!(matches!(
            device.draw_arrays(Primitive::Triangles, 0, 3),
            Err(RenderError::InvalidState(_))
        ));
        device.enable_client_state(ClientState::VertexArray).unwrap();
        device.draw_arrays(Primitive::Triangles, 0, 3).unwrap();
        assert_eq!(device.vertices_drawn(), 3);
    }

    #[test]
    fn test_bind_released_texture_is_missing() {
        let mut device = RecordingDevice::new();
        let texture = device.gen_texture().unwrap();
        device.delete_texture(texture).unwrap();
        assert!(matches!(
            device.bind_texture(TextureTarget::Texture2D, texture),
            Err(RenderError::MissingResource(_))
        ));
    }
}
