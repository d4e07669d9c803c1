//! GPU device abstraction
//!
//! The engine core never talks to a graphics API directly. It draws
//! through [`RenderDevice`], an explicit trait covering every GPU call
//! the core and its views need, and acquires that device from a
//! [`DrawingSurface`]. Backends implement both traits; the engine and
//! its tests stay API-agnostic.

use std::fmt;

use thiserror::Error;

bitflags::bitflags! {
    /// Buffers selected by a [`RenderDevice::clear`] call
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        /// Color buffer
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    /// Pass when the incoming depth is strictly less
    Less,
    /// Pass when the incoming depth is less than or equal (engine default)
    LessEqual,
    /// Always pass
    Always,
}

/// Blend factor for source/destination color mixing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    /// Multiply by zero
    Zero,
    /// Multiply by one
    One,
    /// Multiply by the source alpha
    SrcAlpha,
    /// Multiply by one minus the source alpha
    OneMinusSrcAlpha,
}

/// Primitive assembly mode for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    /// Independent triangles
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Independent lines
    Lines,
    /// Points
    Points,
}

/// Opaque GPU error code reported by [`RenderDevice::poll_error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuErrorCode(pub u32);

impl fmt::Display for GpuErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Options passed to [`DrawingSurface::acquire_device`]
///
/// Mirrors the option record a windowing system expects when creating
/// a hardware rendering handle.
#[derive(Debug, Clone)]
pub struct DeviceOptions {
    /// Request an alpha channel in the default framebuffer
    pub alpha: bool,
    /// Request a depth buffer
    pub depth: bool,
    /// Request a stencil buffer
    pub stencil: bool,
    /// Request multisampled antialiasing
    pub antialias: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            alpha: true,
            depth: true,
            stencil: false,
            antialias: true,
        }
    }
}

/// The drawing surface could not produce a rendering device
///
/// Fatal at context construction: there is nothing to render with.
#[derive(Debug, Error)]
#[error("failed to acquire a '{kind}' rendering device: {reason}")]
pub struct DeviceAcquisitionError {
    /// The context-type identifier that was requested
    pub kind: String,
    /// Backend-specific failure description
    pub reason: String,
}

/// A host surface the engine can render into
///
/// The surface knows its current pixel dimensions and can produce a
/// GPU device handle for a given context-type identifier.
pub trait DrawingSurface {
    /// Current surface width in pixels
    fn width(&self) -> u32;

    /// Current surface height in pixels
    fn height(&self) -> u32;

    /// Acquire the GPU rendering device for this surface
    ///
    /// # Errors
    /// [`DeviceAcquisitionError`] when the surface does not support
    /// the requested context type. The engine treats this as fatal.
    fn acquire_device(
        &self,
        kind: &str,
        options: &DeviceOptions,
    ) -> Result<Box<dyn RenderDevice>, DeviceAcquisitionError>;
}

/// The flattened GPU call surface
///
/// Every drawing-API entry point the engine or a view needs, as one
/// explicit trait. Views reach these calls through the context, which
/// delegates here, so a view never holds backend types.
pub trait RenderDevice {
    /// Set the color the color buffer clears to
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Set the value the depth buffer clears to
    fn set_clear_depth(&mut self, depth: f32);

    /// Clear the selected buffers
    fn clear(&mut self, flags: ClearFlags);

    /// Enable depth testing with the given comparison
    fn enable_depth_test(&mut self, compare: CompareFunction);

    /// Disable depth testing
    fn disable_depth_test(&mut self);

    /// Enable blending with the given source/destination factors
    fn enable_blend(&mut self, src: BlendFactor, dst: BlendFactor);

    /// Disable blending
    fn disable_blend(&mut self);

    /// Set the viewport in pixels
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Issue a non-indexed draw call
    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32);

    /// Redirect rendering into a depth-only shadow target of the
    /// given square resolution
    fn bind_shadow_target(&mut self, resolution: u32);

    /// Restore rendering to the default framebuffer
    fn unbind_shadow_target(&mut self);

    /// Take the pending GPU error flag, if any
    ///
    /// Reading the flag clears it, matching hardware error-queue
    /// semantics.
    fn poll_error(&mut self) -> Option<GpuErrorCode>;

    /// Whether the acquired device has a stencil buffer
    fn has_stencil(&self) -> bool;
}
