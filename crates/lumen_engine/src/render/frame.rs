//! Per-frame render context
//!
//! [`FrameContext`] is the narrow bundle handed down the render call
//! tree: the GPU device, the matrix stack, and (during an
//! illumination pass) the light the current pass is attributed to.
//! Passing an explicit borrow instead of the whole engine context
//! keeps renderables decoupled from lifecycle state.

use crate::render::device::RenderDevice;
use crate::render::matrix_stack::MatrixStack;
use crate::scene::light_source::LightSource;

/// The light a render pass is currently attributed to
#[derive(Debug, Clone)]
pub struct ActiveLight {
    /// Insertion-order index of the light within its manager
    pub index: usize,
    /// Snapshot of the light's parameters for this pass
    pub light: LightSource,
}

/// Borrowed per-frame rendering state
pub struct FrameContext<'a> {
    /// GPU call surface for this frame
    pub device: &'a mut dyn RenderDevice,
    /// Transform stack for this frame
    pub matrices: &'a mut MatrixStack,
    active_light: Option<ActiveLight>,
}

impl<'a> FrameContext<'a> {
    /// Bundle a device and matrix stack into a frame context
    pub fn new(device: &'a mut dyn RenderDevice, matrices: &'a mut MatrixStack) -> Self {
        Self {
            device,
            matrices,
            active_light: None,
        }
    }

    /// The light of the illumination pass in progress, if any
    ///
    /// Renderables use this to answer "which light am I being rendered
    /// for" when binding per-light shader state.
    pub fn active_light(&self) -> Option<&ActiveLight> {
        self.active_light.as_ref()
    }

    pub(crate) fn set_active_light(&mut self, index: usize, light: LightSource) {
        self.active_light = Some(ActiveLight { index, light });
    }

    pub(crate) fn clear_active_light(&mut self) {
        self.active_light = None;
    }
}
