//! Route dispatch: paths to controllers, view keys to views
//!
//! Navigation resolves a path through a [`RouteSet`] to a
//! [`Controller`] (the behavior unit), whose view key is then resolved
//! through a [`ViewRegistry`] to a [`View`] (the renderable unit).
//! Both tables are injected into the context at construction rather
//! than living in process globals.

use std::collections::HashMap;

use thiserror::Error;

use crate::render::camera::Camera;
use crate::render::frame::FrameContext;
use crate::scene::World;

/// Navigation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// No route is registered for the requested path
    #[error("no route registered for '{path}'")]
    NotRouted {
        /// The requested path
        path: String,
    },

    /// The resolved controller produced no renderable view
    #[error("controller '{controller}' did not produce a renderable result")]
    NoRenderableResult {
        /// Name of the offending controller
        controller: String,
    },

    /// The controller's view key resolved to nothing in the registry
    #[error("no view registered under '{key}'")]
    ViewNotFound {
        /// The unresolvable view key
        key: String,
    },
}

/// Optional per-tick update capability for controllers
///
/// Controllers that advance state over time implement this and return
/// themselves from [`Controller::as_updatable`]; absence is a typed
/// `None`, not a runtime probe.
pub trait Updatable {
    /// Advance controller state by `dt` seconds
    fn update(&mut self, dt: f32);
}

/// A behavior unit bound to a route
pub trait Controller {
    /// Short name for diagnostics and error messages
    fn name(&self) -> &str;

    /// Called once when navigation binds this controller
    ///
    /// This is the controller's "action": populate the world, place
    /// the camera, decide which view to show.
    fn activate(&mut self, _world: &mut World, _camera: &mut Camera) {}

    /// Key of the view that renders this controller's scene
    ///
    /// Returning `None` fails the navigation with
    /// [`RoutingError::NoRenderableResult`].
    fn view_key(&self) -> Option<&str>;

    /// The controller's update capability, if it has one
    fn as_updatable(&mut self) -> Option<&mut dyn Updatable> {
        None
    }
}

/// A renderable unit resolved from a view key
pub trait View {
    /// Render the world for one frame
    fn render(&mut self, frame: &mut FrameContext<'_>, world: &mut World);
}

type ControllerFactory = Box<dyn Fn() -> Box<dyn Controller>>;

/// Table mapping navigation paths to controller factories
#[derive(Default)]
pub struct RouteSet {
    routes: HashMap<String, ControllerFactory>,
}

impl RouteSet {
    /// Create an empty route table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route
    pub fn map<C, F>(&mut self, path: impl Into<String>, factory: F)
    where
        C: Controller + 'static,
        F: Fn() -> C + 'static,
    {
        self.routes
            .insert(path.into(), Box::new(move || Box::new(factory())));
    }

    /// Whether a route exists for `path`
    pub fn is_routed(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Construct the controller registered for `path`
    ///
    /// # Errors
    /// [`RoutingError::NotRouted`] for unknown paths.
    pub fn dispatch(&self, path: &str) -> Result<Box<dyn Controller>, RoutingError> {
        let factory = self.routes.get(path).ok_or_else(|| RoutingError::NotRouted {
            path: path.to_string(),
        })?;
        log::debug!("dispatching route '{path}'");
        Ok(factory())
    }
}

type ViewFactory = Box<dyn Fn() -> Box<dyn View>>;

/// Table mapping view keys to view factories
#[derive(Default)]
pub struct ViewRegistry {
    views: HashMap<String, ViewFactory>,
}

impl ViewRegistry {
    /// Create an empty view registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view under `key`
    pub fn register<V, F>(&mut self, key: impl Into<String>, factory: F)
    where
        V: View + 'static,
        F: Fn() -> V + 'static,
    {
        self.views
            .insert(key.into(), Box::new(move || Box::new(factory())));
    }

    /// Construct the view registered under `key`, if any
    pub fn find(&self, key: &str) -> Option<Box<dyn View>> {
        self.views.get(key).map(|factory| factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubController;

    impl Controller for StubController {
        fn name(&self) -> &str {
            "stub"
        }

        fn view_key(&self) -> Option<&str> {
            Some("stub/index")
        }
    }

    struct StubView;

    impl View for StubView {
        fn render(&mut self, _frame: &mut FrameContext<'_>, _world: &mut World) {}
    }

    #[test]
    fn test_dispatch_known_route() {
        let mut routes = RouteSet::new();
        routes.map("/", || StubController);

        assert!(routes.is_routed("/"));
        let controller = routes.dispatch("/").unwrap();
        assert_eq!(controller.name(), "stub");
        assert_eq!(controller.view_key(), Some("stub/index"));
    }

    #[test]
    fn test_dispatch_unknown_route_errors() {
        let routes = RouteSet::new();
        assert_eq!(
            routes.dispatch("/missing").err().map(|e| e.to_string()),
            Some("no route registered for '/missing'".to_string())
        );
    }

    #[test]
    fn test_view_registry_lookup() {
        let mut views = ViewRegistry::new();
        views.register("stub/index", || StubView);

        assert!(views.find("stub/index").is_some());
        assert!(views.find("other").is_none());
    }

    #[test]
    fn test_controllers_are_not_updatable_by_default() {
        let mut controller = StubController;
        assert!(controller.as_updatable().is_none());
    }
}
