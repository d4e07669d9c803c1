//! Hierarchical transform stack
//!
//! A stack of (model, view, projection) matrix frames with push/pop
//! discipline. Rendering code pushes a frame, applies temporary
//! transforms, and pops to restore the caller's state; the stack is
//! never empty, so there is always a current frame to read.
//!
//! The inverse view matrix is computed lazily and cached per frame,
//! invalidated by any load or mult of the view matrix.

use std::ops::{Deref, DerefMut};

use thiserror::Error;

use crate::foundation::math::Mat4;

/// Attempted to pop the base frame of the stack
///
/// Programmer error: well-bracketed rendering code can never trigger
/// this. The stack is left unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot pop the base frame of the matrix stack")]
pub struct StackUnderflowError;

#[derive(Debug, Clone)]
struct MatrixFrame {
    model: Mat4,
    view: Mat4,
    projection: Mat4,
    // Lazily computed from `view`; None when stale.
    inverse_view: Option<Mat4>,
}

impl Default for MatrixFrame {
    fn default() -> Self {
        Self {
            model: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            inverse_view: Some(Mat4::identity()),
        }
    }
}

/// Stack of (model, view, projection) matrix frames
///
/// Depth is always at least 1. `push` duplicates the top frame,
/// `pop` removes it, and the `load_*`/`mult_*` operations act on the
/// top frame only.
#[derive(Debug)]
pub struct MatrixStack {
    frames: Vec<MatrixFrame>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    /// Create a stack with a single identity frame
    pub fn new() -> Self {
        Self {
            frames: vec![MatrixFrame::default()],
        }
    }

    fn top(&self) -> &MatrixFrame {
        self.frames.last().expect("matrix stack is never empty")
    }

    fn top_mut(&mut self) -> &mut MatrixFrame {
        self.frames.last_mut().expect("matrix stack is never empty")
    }

    /// Current stack depth (>= 1)
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Duplicate the top frame and make the copy current
    pub fn push(&mut self) {
        let top = self.top().clone();
        self.frames.push(top);
    }

    /// Remove the top frame, restoring the one beneath it
    ///
    /// # Errors
    /// [`StackUnderflowError`] when the stack is at depth 1; the base
    /// frame is never removed and the stack is left unchanged.
    pub fn pop(&mut self) -> Result<(), StackUnderflowError> {
        if self.frames.len() == 1 {
            return Err(StackUnderflowError);
        }
        self.frames.pop();
        Ok(())
    }

    /// Collapse the stack to depth 1, keeping the current top frame
    ///
    /// Called once per frame before camera matrices are reloaded, so
    /// mismatched push/pop in caller code cannot grow the stack
    /// without bound across frames.
    pub fn reset(&mut self) {
        let keep_from = self.frames.len() - 1;
        self.frames.drain(..keep_from);
    }

    /// Push a frame and return a guard that pops it when dropped
    ///
    /// The pop runs on every exit path, including unwinding, so a
    /// panicking render body cannot leak stack depth.
    pub fn scoped(&mut self) -> MatrixStackGuard<'_> {
        self.push();
        MatrixStackGuard { stack: self }
    }

    /// Replace the top frame's model matrix
    pub fn load_model_matrix(&mut self, m: Mat4) {
        self.top_mut().model = m;
    }

    /// Replace the top frame's view matrix
    pub fn load_view_matrix(&mut self, m: Mat4) {
        let top = self.top_mut();
        top.view = m;
        top.inverse_view = None;
    }

    /// Replace the top frame's projection matrix
    pub fn load_projection_matrix(&mut self, m: Mat4) {
        self.top_mut().projection = m;
    }

    /// Right-multiply the top frame's model matrix by `m`
    pub fn mult_model_matrix(&mut self, m: Mat4) {
        let top = self.top_mut();
        top.model *= m;
    }

    /// Right-multiply the top frame's view matrix by `m`
    pub fn mult_view_matrix(&mut self, m: Mat4) {
        let top = self.top_mut();
        top.view *= m;
        top.inverse_view = None;
    }

    /// Right-multiply the top frame's projection matrix by `m`
    pub fn mult_projection_matrix(&mut self, m: Mat4) {
        let top = self.top_mut();
        top.projection *= m;
    }

    /// The top frame's model matrix
    pub fn model_matrix(&self) -> &Mat4 {
        &self.top().model
    }

    /// The top frame's view matrix
    pub fn view_matrix(&self) -> &Mat4 {
        &self.top().view
    }

    /// The top frame's projection matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.top().projection
    }

    /// The inverse of the top frame's view matrix
    ///
    /// Computed on first read after a view change and cached until the
    /// view matrix changes again, so per-object reads within a frame
    /// pay for one inversion.
    pub fn inverse_view_matrix(&mut self) -> Mat4 {
        let top = self.top_mut();
        if let Some(cached) = top.inverse_view {
            return cached;
        }
        let inverse = top
            .view
            .try_inverse()
            .expect("view matrix is a rigid transform and must be invertible");
        top.inverse_view = Some(inverse);
        inverse
    }
}

/// RAII guard returned by [`MatrixStack::scoped`]
///
/// Dereferences to the stack; pops the frame it pushed on drop.
pub struct MatrixStackGuard<'a> {
    stack: &'a mut MatrixStack,
}

impl Deref for MatrixStackGuard<'_> {
    type Target = MatrixStack;

    fn deref(&self) -> &MatrixStack {
        self.stack
    }
}

impl DerefMut for MatrixStackGuard<'_> {
    fn deref_mut(&mut self) -> &mut MatrixStack {
        self.stack
    }
}

impl Drop for MatrixStackGuard<'_> {
    fn drop(&mut self) {
        // The guard pushed this frame; underflow is impossible.
        let _ = self.stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_push_pop_round_trip_restores_top_frame() {
        let mut stack = MatrixStack::new();
        let view = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        stack.load_view_matrix(view);

        stack.push();
        stack.push();
        stack.load_view_matrix(Mat4::new_scaling(4.0));
        stack.mult_model_matrix(Mat4::new_scaling(2.0));
        stack.pop().unwrap();
        stack.pop().unwrap();

        assert_eq!(stack.depth(), 1);
        assert_relative_eq!(*stack.view_matrix(), view);
        assert_relative_eq!(*stack.model_matrix(), Mat4::identity());
    }

    #[test]
    fn test_pop_at_base_underflows_and_leaves_depth_unchanged() {
        let mut stack = MatrixStack::new();
        assert_eq!(stack.pop(), Err(StackUnderflowError));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_reset_collapses_to_depth_one_keeping_top() {
        let mut stack = MatrixStack::new();
        stack.push();
        stack.push();
        let projection = Mat4::new_scaling(0.5);
        stack.load_projection_matrix(projection);

        stack.reset();

        assert_eq!(stack.depth(), 1);
        assert_relative_eq!(*stack.projection_matrix(), projection);
    }

    #[test]
    fn test_load_then_read_returns_exactly_what_was_loaded() {
        let mut stack = MatrixStack::new();
        stack.reset();
        let model = Mat4::new_translation(&Vec3::new(-5.0, 0.0, 9.0));
        stack.load_model_matrix(model);
        assert_eq!(*stack.model_matrix(), model);
    }

    #[test]
    fn test_inverse_view_is_cached_and_invalidated() {
        let mut stack = MatrixStack::new();
        let view = Mat4::new_translation(&Vec3::new(0.0, 3.0, 0.0));
        stack.load_view_matrix(view);

        let inverse = stack.inverse_view_matrix();
        assert_relative_eq!(inverse * view, Mat4::identity(), epsilon = 1e-6);
        // Cached read returns the same value.
        assert_eq!(stack.inverse_view_matrix(), inverse);

        stack.mult_view_matrix(Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)));
        let updated = stack.inverse_view_matrix();
        assert_relative_eq!(
            updated * *stack.view_matrix(),
            Mat4::identity(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_mult_right_multiplies() {
        let mut stack = MatrixStack::new();
        let a = Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0));
        let b = Mat4::new_scaling(2.0);
        stack.load_view_matrix(a);
        stack.mult_view_matrix(b);
        assert_relative_eq!(*stack.view_matrix(), a * b);
    }

    #[test]
    fn test_scoped_guard_pops_on_drop() {
        let mut stack = MatrixStack::new();
        {
            let mut scope = stack.scoped();
            scope.load_model_matrix(Mat4::new_scaling(3.0));
            assert_eq!(scope.depth(), 2);
        }
        assert_eq!(stack.depth(), 1);
        assert_eq!(*stack.model_matrix(), Mat4::identity());
    }

    #[test]
    fn test_scoped_guard_pops_during_unwind() {
        let mut stack = MatrixStack::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut scope = stack.scoped();
            scope.push();
            panic!("render body failed");
        }));
        assert!(result.is_err());
        // The guard's frame was popped; only the inner manual push leaks,
        // which the per-frame reset is designed to absorb.
        stack.reset();
        assert_eq!(stack.depth(), 1);
    }
}
