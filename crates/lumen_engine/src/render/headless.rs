//! Headless reference backend
//!
//! [`HeadlessSurface`] and [`RecordingDevice`] implement the device
//! boundary without any GPU. The device records every call it
//! receives; the surface keeps a shared handle to that call log so
//! tests and demos can assert on the exact stream the engine issued.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::device::{
    BlendFactor, ClearFlags, CompareFunction, DeviceAcquisitionError, DeviceOptions, DrawingSurface,
    GpuErrorCode, PrimitiveMode, RenderDevice,
};

/// One recorded GPU call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)] // variants mirror RenderDevice methods one-to-one
pub enum GpuCall {
    SetClearColor([f32; 4]),
    SetClearDepth(f32),
    Clear(ClearFlags),
    EnableDepthTest(CompareFunction),
    DisableDepthTest,
    EnableBlend(BlendFactor, BlendFactor),
    DisableBlend,
    SetViewport {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    DrawArrays {
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    },
    BindShadowTarget(u32),
    UnbindShadowTarget,
}

type CallLog = Arc<Mutex<Vec<GpuCall>>>;
type ErrorQueue = Arc<Mutex<VecDeque<GpuErrorCode>>>;

/// A drawing surface backed by no window at all
///
/// Hands out [`RecordingDevice`] handles that share this surface's
/// call log, so the surface outlives the device move into the context
/// and can still be inspected afterwards. Clones share the same log.
#[derive(Clone)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    stencil: bool,
    fail_acquisition: bool,
    calls: CallLog,
    errors: ErrorQueue,
}

impl HeadlessSurface {
    /// Create a headless surface of the given pixel size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stencil: false,
            fail_acquisition: false,
            calls: Arc::new(Mutex::new(Vec::new())),
            errors: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Make every `acquire_device` call fail, simulating an
    /// unsupported surface
    pub fn with_acquisition_failure(mut self) -> Self {
        self.fail_acquisition = true;
        self
    }

    /// Report a stencil buffer on acquired devices
    pub fn with_stencil(mut self) -> Self {
        self.stencil = true;
        self
    }

    /// Queue a GPU error for the next `poll_error` on the device
    pub fn inject_gpu_error(&self, code: GpuErrorCode) {
        self.errors.lock().unwrap().push_back(code);
    }

    /// Snapshot of every call recorded so far
    pub fn calls(&self) -> Vec<GpuCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls matching the predicate
    pub fn count_calls(&self, predicate: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    /// Discard the recorded call log
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl DrawingSurface for HeadlessSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn acquire_device(
        &self,
        kind: &str,
        _options: &DeviceOptions,
    ) -> Result<Box<dyn RenderDevice>, DeviceAcquisitionError> {
        if self.fail_acquisition {
            return Err(DeviceAcquisitionError {
                kind: kind.to_string(),
                reason: "headless surface configured to refuse acquisition".to_string(),
            });
        }
        Ok(Box::new(RecordingDevice {
            stencil: self.stencil,
            calls: Arc::clone(&self.calls),
            errors: Arc::clone(&self.errors),
        }))
    }
}

/// Render device that records its call stream
pub struct RecordingDevice {
    stencil: bool,
    calls: CallLog,
    errors: ErrorQueue,
}

impl RecordingDevice {
    fn record(&self, call: GpuCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RenderDevice for RecordingDevice {
    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.record(GpuCall::SetClearColor(color));
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.record(GpuCall::SetClearDepth(depth));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(GpuCall::Clear(flags));
    }

    fn enable_depth_test(&mut self, compare: CompareFunction) {
        self.record(GpuCall::EnableDepthTest(compare));
    }

    fn disable_depth_test(&mut self) {
        self.record(GpuCall::DisableDepthTest);
    }

    fn enable_blend(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(GpuCall::EnableBlend(src, dst));
    }

    fn disable_blend(&mut self) {
        self.record(GpuCall::DisableBlend);
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.record(GpuCall::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        self.record(GpuCall::DrawArrays { mode, first, count });
    }

    fn bind_shadow_target(&mut self, resolution: u32) {
        self.record(GpuCall::BindShadowTarget(resolution));
    }

    fn unbind_shadow_target(&mut self) {
        self.record(GpuCall::UnbindShadowTarget);
    }

    fn poll_error(&mut self) -> Option<GpuErrorCode> {
        self.errors.lock().unwrap().pop_front()
    }

    fn has_stencil(&self) -> bool {
        self.stencil
    }
}
