//! # Rendering System
//!
//! The rendering layer of the engine: the GPU device boundary, the
//! hierarchical matrix stack, the per-frame context handed to
//! renderables, and a headless reference backend used by tests and
//! demos.
//!
//! The engine core is backend-agnostic by construction: everything it
//! draws goes through the [`device::RenderDevice`] trait, acquired
//! from a [`device::DrawingSurface`].

pub mod camera;
pub mod device;
pub mod frame;
pub mod headless;
pub mod matrix_stack;

pub use camera::Camera;
pub use device::{
    BlendFactor, ClearFlags, CompareFunction, DeviceAcquisitionError, DeviceOptions,
    DrawingSurface, GpuErrorCode, PrimitiveMode, RenderDevice,
};
pub use frame::{ActiveLight, FrameContext};
pub use headless::{GpuCall, HeadlessSurface, RecordingDevice};
pub use matrix_stack::{MatrixStack, MatrixStackGuard, StackUnderflowError};
