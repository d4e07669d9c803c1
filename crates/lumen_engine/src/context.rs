//! Rendering context lifecycle
//!
//! [`Context`] is the highest level of operation in the engine. It
//! owns the GPU device acquired from a drawing surface, the matrix
//! stack, the world (and through it the light manager), the active
//! controller/view pair, and the two tick cadences (update and
//! render).
//!
//! # Tick model
//!
//! The host drives the context by calling [`Context::tick`] as often
//! as it likes. Within one call, a due update tick always runs before
//! the render tick. That ordering is a guarantee of the API: render
//! code never observes scene state mid-mutation, because update and
//! render are sequenced on a single logical tick rather than racing on
//! independent timers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use thiserror::Error;

use crate::config::{EngineConfig, Environment};
use crate::foundation::math::Mat4;
use crate::foundation::time::TickClock;
use crate::render::camera::Camera;
use crate::render::device::{
    BlendFactor, CompareFunction, DeviceAcquisitionError, DeviceOptions, DrawingSurface,
    GpuErrorCode, RenderDevice,
};
use crate::render::frame::FrameContext;
use crate::render::matrix_stack::MatrixStack;
use crate::routing::{Controller, RouteSet, RoutingError, View, ViewRegistry};
use crate::scene::World;

/// Context-type identifier passed to the drawing surface
pub const DEVICE_KIND: &str = "lumen3d";

const ROOT_PATH: &str = "/";

/// Process-wide monotonic context identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context-{}", self.0)
    }
}

/// Context-level errors
#[derive(Debug, Error)]
pub enum ContextError {
    /// The drawing surface could not produce a device (fatal at
    /// construction)
    #[error(transparent)]
    DeviceAcquisition(#[from] DeviceAcquisitionError),

    /// Navigation failed; the context is left un-routed
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// The GPU reported an error flag outside production mode
    ///
    /// Advisory diagnostics with fail-fast semantics: it indicates a
    /// GPU state misuse bug that should surface during development.
    #[error("GPU error in {context}: {code}")]
    GpuDiagnostic {
        /// Identity of the reporting context
        context: ContextId,
        /// The polled GPU error code
        code: GpuErrorCode,
    },
}

/// The camera-carrying player record owned by the context
pub struct Player {
    /// The active camera supplying per-frame view/projection matrices
    pub camera: Camera,
}

/// Top-level rendering context
///
/// Created once per drawing surface, explicitly disposed exactly
/// once. Lifecycle: uninitialized → routed (after a successful
/// navigation) → disposed; the render cadence exists exactly while a
/// view is bound.
pub struct Context {
    id: ContextId,
    surface: Box<dyn DrawingSurface>,
    device: Box<dyn RenderDevice>,
    matrix_stack: MatrixStack,
    world: World,
    player: Player,
    routes: RouteSet,
    views: ViewRegistry,
    current_controller: Option<Box<dyn Controller>>,
    current_view: Option<Box<dyn View>>,
    // Always Some from construction until disposal.
    update_clock: Option<TickClock>,
    // Some iff a view is bound.
    render_clock: Option<TickClock>,
    disposed: bool,
    config: EngineConfig,
}

impl Context {
    /// Initialize a context on the given drawing surface
    ///
    /// Acquires the GPU device, applies the default GPU state (clear
    /// color and depth, less-or-equal depth testing, standard alpha
    /// blending), starts the update cadence, and — when a root route
    /// is registered — performs the initial navigation.
    ///
    /// # Errors
    /// [`ContextError::DeviceAcquisition`] when the surface cannot
    /// produce a device; routing errors when the initial navigation
    /// fails; [`ContextError::GpuDiagnostic`] when the fresh device
    /// already reports an error flag (development mode only).
    pub fn initialize(
        surface: Box<dyn DrawingSurface>,
        routes: RouteSet,
        views: ViewRegistry,
        config: EngineConfig,
    ) -> Result<Self, ContextError> {
        let id = ContextId::next();
        log::info!("initializing {id} on a {}x{} surface", surface.width(), surface.height());

        let mut device = surface.acquire_device(DEVICE_KIND, &DeviceOptions::default())?;
        device.set_clear_color(config.clear_color);
        device.set_clear_depth(config.clear_depth);
        device.enable_depth_test(CompareFunction::LessEqual);
        device.enable_blend(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);

        let mut camera = Camera::default();
        camera.set_perspective(
            surface.width(),
            surface.height(),
            std::f32::consts::FRAC_PI_4,
            0.1,
            500.0,
        );

        let mut context = Self {
            id,
            surface,
            device,
            matrix_stack: MatrixStack::new(),
            world: World::new(),
            player: Player { camera },
            routes,
            views,
            current_controller: None,
            current_view: None,
            update_clock: Some(TickClock::new(config.update_interval)),
            render_clock: None,
            disposed: false,
            config,
        };
        context.check_for_render_errors()?;

        if context.routes.is_routed(ROOT_PATH) {
            context.navigate_to(ROOT_PATH)?;
        }
        Ok(context)
    }

    /// This context's process-wide identity
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Whether a render cadence is currently scheduled
    pub fn is_rendering(&self) -> bool {
        self.render_clock.is_some()
    }

    /// Whether this context has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether the acquired device has a stencil buffer
    pub fn has_stencil(&self) -> bool {
        self.device.has_stencil()
    }

    /// The currently bound controller, if navigation has succeeded
    pub fn current_controller(&self) -> Option<&dyn Controller> {
        self.current_controller.as_deref()
    }

    /// Whether a renderable view is currently bound
    pub fn has_view(&self) -> bool {
        self.current_view.is_some()
    }

    /// The world owned by this context
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world owned by this context
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The player record (camera) owned by this context
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable access to the player record
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Navigate to the given route
    ///
    /// The previous scene is torn down before the new controller is
    /// constructed, in this order: stop the render cadence, dispose
    /// the world, reset the camera, clear the controller/view pair
    /// (atomically — a failed route must never leave a stale
    /// renderable view), then dispatch, activate, and bind. The render
    /// cadence restarts once the new view is bound.
    ///
    /// # Errors
    /// [`RoutingError::NotRouted`] for unknown paths;
    /// [`RoutingError::NoRenderableResult`] when the controller
    /// exposes no view key; [`RoutingError::ViewNotFound`] when the
    /// key resolves to nothing. On error the context stays un-routed
    /// and [`Context::update`] becomes a no-op.
    pub fn navigate_to(&mut self, path: &str) -> Result<(), ContextError> {
        log::info!("{}: navigating to '{path}'", self.id);
        self.stop_rendering();

        // Old-world teardown must complete before the new controller
        // exists, so callbacks from the old world can never observe a
        // half-initialized replacement.
        self.world.dispose();
        self.player.camera.reset();
        self.current_controller = None;
        self.current_view = None;

        let mut controller = self.routes.dispatch(path)?;
        controller.activate(&mut self.world, &mut self.player.camera);

        let Some(key) = controller.view_key() else {
            return Err(RoutingError::NoRenderableResult {
                controller: controller.name().to_string(),
            }
            .into());
        };
        let view = self
            .views
            .find(key)
            .ok_or_else(|| RoutingError::ViewNotFound {
                key: key.to_string(),
            })?;

        self.current_controller = Some(controller);
        self.current_view = Some(view);
        if !self.is_rendering() {
            self.start_rendering();
        }
        Ok(())
    }

    /// Advance simulation state by `dt` seconds
    ///
    /// Invokes the controller's update capability first (when it has
    /// one), then the world, with the same elapsed time. A context
    /// with no bound controller does nothing.
    ///
    /// Called automatically from [`Context::tick`]; calling it
    /// directly is useful for constructing deterministic test cases.
    pub fn update(&mut self, dt: f32) {
        let Some(controller) = self.current_controller.as_mut() else {
            return;
        };
        if let Some(updatable) = controller.as_updatable() {
            updatable.update(dt);
        }
        self.world.update(dt);
    }

    /// Run one logical tick at the current instant
    ///
    /// # Errors
    /// Propagates render-tick failures, currently only
    /// [`ContextError::GpuDiagnostic`].
    pub fn tick(&mut self) -> Result<(), ContextError> {
        self.tick_at(Instant::now())
    }

    /// Run one logical tick at an explicit instant
    ///
    /// Due update work always runs before the render tick; see the
    /// module docs for the ordering guarantee. Disposed contexts
    /// ignore ticks entirely.
    ///
    /// # Errors
    /// Propagates render-tick failures.
    pub fn tick_at(&mut self, now: Instant) -> Result<(), ContextError> {
        if self.disposed {
            return Ok(());
        }

        if let Some(clock) = self.update_clock.as_mut() {
            if let Some(dt) = clock.poll(now) {
                self.update(dt);
            }
        }

        let render_due = self
            .render_clock
            .as_mut()
            .is_some_and(|clock| clock.poll(now).is_some());
        if render_due {
            self.render_frame()?;
        }
        Ok(())
    }

    /// Push a matrix frame, run `body`, and pop
    ///
    /// The pop runs on every exit path, including unwinding out of
    /// `body`, so callers cannot leak stack depth.
    pub fn push_matrix<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        self.matrix_stack.push();

        struct PopOnDrop<'a> {
            context: &'a mut Context,
        }
        impl Drop for PopOnDrop<'_> {
            fn drop(&mut self) {
                // push_matrix pushed this frame; underflow is impossible.
                let _ = self.context.matrix_stack.pop();
            }
        }

        let mut guard = PopOnDrop { context: self };
        body(&mut *guard.context)
    }

    /// Permanently dispose of this context
    ///
    /// Stops both cadences; no further tick does any work. Idempotent.
    pub fn dispose(&mut self) {
        if !self.disposed {
            log::info!("disposing {}", self.id);
        }
        self.disposed = true;
        self.render_clock = None;
        self.update_clock = None;
    }

    /// Poll the GPU error flag and fail fast on misuse
    ///
    /// Error checking is slow, so it is skipped entirely in the
    /// production environment.
    ///
    /// # Errors
    /// [`ContextError::GpuDiagnostic`] tagged with this context's
    /// identity and the polled code.
    pub fn check_for_render_errors(&mut self) -> Result<(), ContextError> {
        if self.config.environment == Environment::Production {
            return Ok(());
        }
        if let Some(code) = self.device.poll_error() {
            return Err(ContextError::GpuDiagnostic {
                context: self.id,
                code,
            });
        }
        Ok(())
    }

    // ---- matrix stack delegation ----

    /// Replace the current model matrix
    pub fn load_model_matrix(&mut self, m: Mat4) {
        self.matrix_stack.load_model_matrix(m);
    }

    /// Replace the current view matrix
    pub fn load_view_matrix(&mut self, m: Mat4) {
        self.matrix_stack.load_view_matrix(m);
    }

    /// Replace the current projection matrix
    pub fn load_projection_matrix(&mut self, m: Mat4) {
        self.matrix_stack.load_projection_matrix(m);
    }

    /// Right-multiply the current model matrix
    pub fn mult_model_matrix(&mut self, m: Mat4) {
        self.matrix_stack.mult_model_matrix(m);
    }

    /// Right-multiply the current view matrix
    pub fn mult_view_matrix(&mut self, m: Mat4) {
        self.matrix_stack.mult_view_matrix(m);
    }

    /// Right-multiply the current projection matrix
    pub fn mult_projection_matrix(&mut self, m: Mat4) {
        self.matrix_stack.mult_projection_matrix(m);
    }

    /// The current model matrix
    pub fn model_matrix(&self) -> &Mat4 {
        self.matrix_stack.model_matrix()
    }

    /// The current view matrix
    pub fn view_matrix(&self) -> &Mat4 {
        self.matrix_stack.view_matrix()
    }

    /// The current projection matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        self.matrix_stack.projection_matrix()
    }

    /// The inverse of the current view matrix (cached per change)
    pub fn inverse_view_matrix(&mut self) -> Mat4 {
        self.matrix_stack.inverse_view_matrix()
    }

    // ---- internals ----

    fn start_rendering(&mut self) {
        self.render_clock = Some(TickClock::new(self.config.render_interval));
    }

    fn stop_rendering(&mut self) {
        self.render_clock = None;
    }

    /// One render tick: reload camera matrices, size the viewport,
    /// and delegate to the bound view. A tick that finds no view
    /// tears the render cadence down instead.
    fn render_frame(&mut self) -> Result<(), ContextError> {
        let Some(view) = self.current_view.as_mut() else {
            self.render_clock = None;
            return Ok(());
        };

        // Bound any stack depth leaked by the previous frame, then
        // reload the camera-derived matrices.
        self.matrix_stack.reset();
        self.matrix_stack.load_model_matrix(Mat4::identity());
        self.matrix_stack
            .load_view_matrix(self.player.camera.transformation_matrix());
        self.matrix_stack
            .load_projection_matrix(self.player.camera.projection_matrix());

        self.device
            .set_viewport(0, 0, self.surface.width(), self.surface.height());

        let mut frame = FrameContext::new(self.device.as_mut(), &mut self.matrix_stack);
        view.render(&mut frame, &mut self.world);
        drop(frame);

        self.check_for_render_errors()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.dispose();
    }
}
