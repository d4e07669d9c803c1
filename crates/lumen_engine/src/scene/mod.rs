//! Scene graph: the world, its renderable objects, and its lights
//!
//! The [`World`] is the central hub between simulation and rendering.
//! It owns the ordered renderable list and the [`LightManager`] and
//! sequences a frame as: shadow-map refresh, then one illumination
//! pass per light over the object list.

pub mod light_manager;
pub mod light_source;

pub use light_manager::{LightError, LightManager, MAX_LIGHTS};
pub use light_source::{LightCamera, LightSource, LightType};

use crate::foundation::math::Vec3;
use crate::render::frame::FrameContext;

/// A drawable occupant of the world
///
/// Objects are rendered once per active light per frame and must
/// additively blend per-light contributions. The position and
/// bounding radius feed the scene bounding-sphere estimate that sizes
/// shadow-map projection volumes.
pub trait Renderable {
    /// Draw this object for the current pass
    fn render(&mut self, frame: &mut FrameContext<'_>);

    /// Advance this object's simulation state
    fn update(&mut self, _dt: f32) {}

    /// World-space position of the object's center
    fn position(&self) -> Vec3;

    /// Radius of the smallest sphere enclosing the object
    fn bounding_sphere_radius(&self) -> f32;

    /// Whether the object is rendered into shadow maps
    fn casts_shadow(&self) -> bool {
        true
    }
}

/// The active scene: renderable objects plus their lighting
///
/// Object insertion order is significant — it is the order objects
/// are rendered within every pass.
#[derive(Default)]
pub struct World {
    objects: Vec<Box<dyn Renderable>>,
    light_manager: LightManager,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an object to the render list
    pub fn add_object(&mut self, object: Box<dyn Renderable>) {
        self.objects.push(object);
    }

    /// Remove and return the object at `index`
    pub fn remove_object(&mut self, index: usize) -> Option<Box<dyn Renderable>> {
        if index >= self.objects.len() {
            return None;
        }
        Some(self.objects.remove(index))
    }

    /// Number of objects in the world
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// The world's light manager
    pub fn light_manager(&self) -> &LightManager {
        &self.light_manager
    }

    /// Mutable access to the world's light manager
    pub fn light_manager_mut(&mut self) -> &mut LightManager {
        &mut self.light_manager
    }

    /// Advance every object's simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        for object in &mut self.objects {
            object.update(dt);
        }
    }

    /// Render the world for one frame
    ///
    /// With lighting active: refresh shadow maps, then run the
    /// illumination passes. Without lighting, each object is rendered
    /// exactly once.
    pub fn render(&mut self, frame: &mut FrameContext<'_>) {
        let Self {
            objects,
            light_manager,
        } = self;

        if light_manager.is_enabled() {
            light_manager.update_shadow_maps(frame, objects);
            light_manager.illuminate(frame, objects);
        } else {
            for object in objects.iter_mut() {
                object.render(frame);
            }
        }
    }

    /// Release everything the world owns
    ///
    /// Idempotent; navigation disposes the outgoing world before the
    /// incoming controller is constructed.
    pub fn dispose(&mut self) {
        let objects = self.objects.len();
        let lights = self.light_manager.count();
        if objects > 0 || lights > 0 {
            log::debug!("disposing world: {objects} objects, {lights} lights");
        }
        self.objects.clear();
        self.light_manager.clear();
    }
}
