//! # Lumen Engine
//!
//! A real-time 3D rendering engine core built around an explicit
//! device boundary.
//!
//! ## Features
//!
//! - **Context Lifecycle**: One [`Context`] per drawing surface, from
//!   device acquisition through explicit disposal
//! - **Deterministic Ticking**: Update and render cadences sequenced
//!   on a single logical tick
//! - **Matrix Stack**: Hierarchical model/view/projection state with
//!   guarded push/pop scoping
//! - **Multi-Pass Lighting**: Per-light illumination passes with
//!   shadow-map refresh, up to [`scene::MAX_LIGHTS`] lights
//! - **Routing**: Paths to controllers, view keys to views, injected
//!   tables instead of globals
//! - **Headless Backend**: A call-recording device for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen_engine::prelude::*;
//!
//! struct IndexController;
//!
//! impl Controller for IndexController {
//!     fn name(&self) -> &str {
//!         "index"
//!     }
//!
//!     fn view_key(&self) -> Option<&str> {
//!         Some("index/show")
//!     }
//! }
//!
//! struct IndexView;
//!
//! impl View for IndexView {
//!     fn render(&mut self, frame: &mut FrameContext<'_>, world: &mut World) {
//!         world.render(frame);
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     lumen_engine::foundation::logging::init();
//!
//!     let mut routes = RouteSet::new();
//!     routes.map("/", || IndexController);
//!     let mut views = ViewRegistry::new();
//!     views.register("index/show", || IndexView);
//!
//!     let surface = HeadlessSurface::new(1280, 720);
//!     let mut context =
//!         Context::initialize(Box::new(surface), routes, views, EngineConfig::default())?;
//!     loop {
//!         context.tick()?;
//!     }
//! }
//! ```

pub mod config;
pub mod foundation;
pub mod plugin;
pub mod render;
pub mod routing;
pub mod scene;

mod context;

pub use config::{EngineConfig, Environment};
pub use context::{Context, ContextError, ContextId, Player, DEVICE_KIND};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{EngineConfig, Environment},
        context::{Context, ContextError, ContextId},
        foundation::math::{Mat4, Vec3, Vec4},
        render::{
            Camera, ClearFlags, DeviceOptions, DrawingSurface, FrameContext, HeadlessSurface,
            MatrixStack, RenderDevice,
        },
        routing::{Controller, RouteSet, RoutingError, Updatable, View, ViewRegistry},
        scene::{LightManager, LightSource, LightType, Renderable, World},
    };
}
