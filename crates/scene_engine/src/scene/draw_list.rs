//! Compiled draw-list lifecycle of a transformable node
//!
//! ```text
//! Uninitialized → Compiling → Compiled → (recompile) Compiling → Compiled → Finalized
//! ```
//!
//! A finalized list may be compiled again; `begin` re-acquires a handle.

use crate::render::device::{CompileMode, GraphicsDevice, ListHandle};
use crate::render::{RenderError, RenderResult};

/// Where a draw list is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawListState {
    /// No handle has ever been acquired
    Uninitialized,
    /// Device calls are being recorded into the handle
    Compiling,
    /// The handle holds a complete command list
    Compiled,
    /// The handle was released
    Finalized,
}

/// Owner of one device command list
#[derive(Debug)]
pub struct DrawList {
    handle: Option<ListHandle>,
    state: DrawListState,
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawList {
    /// An empty, uninitialized list
    pub fn new() -> Self {
        Self { handle: None, state: DrawListState::Uninitialized }
    }

    /// Adopt an already compiled device list
    pub fn from_compiled(handle: ListHandle) -> Self {
        Self { handle: Some(handle), state: DrawListState::Compiled }
    }

    /// Current lifecycle state
    pub fn state(&self) -> DrawListState {
        self.state
    }

    /// Device handle, if one is held
    pub fn handle(&self) -> Option<ListHandle> {
        self.handle
    }

    /// Handle ready for invocation, only in the compiled state
    pub fn compiled(&self) -> Option<ListHandle> {
        match self.state {
            DrawListState::Compiled => self.handle,
            _ => None,
        }
    }

    /// Open compilation
    ///
    /// With `delete_old` an existing handle is finalized first and a new one
    /// acquired; without it the existing handle is recompiled in place.
    pub fn begin(&mut self, device: &mut dyn GraphicsDevice, mode: CompileMode, delete_old: bool) -> RenderResult<()> {
        if self.state == DrawListState::Compiling {
            return Err(RenderError::InvalidState("draw list is already compiling".to_string()));
        }
        if delete_old && self.handle.is_some() {
            self.finalize(device)?;
        }

        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                let handle = device.gen_list()?;
                log::debug!("Acquired draw list {:?}", handle);
                self.handle = Some(handle);
                handle
            }
        };

        device.new_list(handle, mode)?;
        self.state = DrawListState::Compiling;
        Ok(())
    }

    /// Close compilation
    pub fn end(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        if self.state != DrawListState::Compiling {
            return Err(RenderError::InvalidState(format!("end() on a draw list that is {:?}", self.state)));
        }
        device.end_list()?;
        self.state = DrawListState::Compiled;
        Ok(())
    }

    /// `begin`, record through `record`, then `end`
    ///
    /// Compilation is closed even when `record` fails; the first error wins.
    pub fn compile_with<F>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        mode: CompileMode,
        delete_old: bool,
        record: F,
    ) -> RenderResult<()>
    where
        F: FnOnce(&mut dyn GraphicsDevice) -> RenderResult<()>,
    {
        self.begin(device, mode, delete_old)?;
        let recorded = record(&mut *device);
        let closed = self.end(device);
        recorded.and(closed)
    }

    /// Release the device handle
    ///
    /// Finalizing a list that holds no handle only updates the state.
    pub fn finalize(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        if self.state == DrawListState::Compiling {
            device.end_list()?;
        }
        if let Some(handle) = self.handle.take() {
            device.delete_list(handle)?;
            log::debug!("Finalized draw list {:?}", handle);
        }
        self.state = DrawListState::Finalized;
        Ok(())
    }
}
