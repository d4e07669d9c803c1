//! Light manager and multi-pass illumination
//!
//! Owns the ordered light collection for a scene and drives the two
//! lighting algorithms: per-light illumination passes over the
//! renderable list, and shadow-map refresh sized by a scene bounding
//! radius. Insertion order is significant, since it determines each
//! light's per-pass index for the lifetime of the scene.

use thiserror::Error;

use crate::foundation::math::{Vec3, Vec4};
use crate::render::frame::FrameContext;
use crate::scene::light_source::{LightSource, LightType};
use crate::scene::Renderable;

/// Hardware-style cap on simultaneous light sources in a scene
pub const MAX_LIGHTS: usize = 8;

/// Light collection errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LightError {
    /// The scene already holds the maximum number of lights
    #[error("maximum of {max} light sources in a scene has been exceeded; remove some first")]
    CapacityExceeded {
        /// The enforced capacity
        max: usize,
    },

    /// An explicit light index was out of bounds
    #[error("light index {index} is out of range for {count} lights")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// Number of lights currently in the collection
        count: usize,
    },
}

/// Ordered collection of lights driving the illumination pipeline
#[derive(Debug, Default)]
pub struct LightManager {
    lights: Vec<LightSource>,
    // Tri-state: None = "enabled iff non-empty", Some overrides.
    enabled: Option<bool>,
    // Set only while an illumination pass is running.
    current_light: Option<usize>,
    default_light: Option<LightSource>,
}

impl LightManager {
    /// Create an empty light manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a light, assigning it the next per-pass index
    ///
    /// # Errors
    /// [`LightError::CapacityExceeded`] when [`MAX_LIGHTS`] lights are
    /// already present; the collection is unchanged.
    pub fn add(&mut self, light: LightSource) -> Result<(), LightError> {
        if self.lights.len() == MAX_LIGHTS {
            return Err(LightError::CapacityExceeded { max: MAX_LIGHTS });
        }
        self.lights.push(light);
        Ok(())
    }

    /// Remove and return the light at `index`
    ///
    /// When the collection becomes empty the explicit enable override
    /// is cleared, reverting to the "enabled iff non-empty" default.
    pub fn remove(&mut self, index: usize) -> Option<LightSource> {
        if index >= self.lights.len() {
            return None;
        }
        let light = self.lights.remove(index);
        if self.lights.is_empty() {
            self.enabled = None;
        }
        Some(light)
    }

    /// Remove every light and clear the enable override
    pub fn clear(&mut self) {
        self.lights.clear();
        self.enabled = None;
    }

    /// Number of lights in the collection
    pub fn count(&self) -> usize {
        self.lights.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Force lighting on regardless of light count
    pub fn enable(&mut self) {
        self.enabled = Some(true);
    }

    /// Force lighting off regardless of light count
    pub fn disable(&mut self) {
        self.enabled = Some(false);
    }

    /// Whether lighting is active for the scene
    ///
    /// The explicit override wins when set; otherwise lighting is
    /// active exactly when at least one light is present.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(!self.lights.is_empty())
    }

    /// Whether the light at `index` is individually enabled
    ///
    /// Out-of-range indices report `false` rather than an error, so
    /// shader setup can probe all hardware slots uniformly.
    pub fn is_light_enabled(&self, index: usize) -> bool {
        self.lights.get(index).is_some_and(LightSource::is_enabled)
    }

    /// Run one illumination pass per light over `objects`
    ///
    /// For each light in insertion order, every object is rendered
    /// once, in list order; objects additively blend per-light
    /// contributions. The active light is published on the frame so
    /// per-object code can bind per-light state. The current-light
    /// marker is cleared afterwards.
    //
    // TODO: skip objects a light cannot affect (attenuation range
    // test) once renderables expose world-space bounds to the manager.
    pub fn illuminate(&mut self, frame: &mut FrameContext<'_>, objects: &mut [Box<dyn Renderable>]) {
        for index in 0..self.lights.len() {
            self.current_light = Some(index);
            frame.set_active_light(index, self.lights[index].clone());
            for object in objects.iter_mut() {
                object.render(frame);
            }
        }
        self.current_light = None;
        frame.clear_active_light();
    }

    /// Refresh every light's shadow map
    ///
    /// The scene bounding radius is the maximum over all objects of
    /// the object's distance from the origin plus its own bounding
    /// sphere radius, and 0 for an empty list. It is recomputed on
    /// every call, since object positions may have changed since the
    /// previous frame. Every light is asked to refresh, even over an
    /// empty object list.
    pub fn update_shadow_maps(
        &mut self,
        frame: &mut FrameContext<'_>,
        objects: &mut [Box<dyn Renderable>],
    ) {
        let bounding_radius = objects
            .iter()
            .map(|object| object.position().magnitude() + object.bounding_sphere_radius())
            .fold(0.0_f32, f32::max);

        for light in &mut self.lights {
            light.update_shadow_map(frame, bounding_radius, objects);
        }
    }

    /// Resolve a light by explicit index or pass context
    ///
    /// With `Some(index)`, returns that light or
    /// [`LightError::IndexOutOfRange`]. With `None`, returns the light
    /// of the illumination pass in progress, or a lazily created
    /// default light when no pass is active — shader setup paths query
    /// light parameters before the first pass of a frame, including in
    /// scenes with zero lights.
    pub fn light(&mut self, index: Option<usize>) -> Result<&LightSource, LightError> {
        match index {
            Some(index) => self.lights.get(index).ok_or(LightError::IndexOutOfRange {
                index,
                count: self.lights.len(),
            }),
            None => match self.current_light {
                Some(current) => Ok(&self.lights[current]),
                None => Ok(self.default_light.get_or_insert_with(|| {
                    log::debug!("light queried outside an illumination pass; creating default light");
                    LightSource::default()
                })),
            },
        }
    }

    /// The resolved light's type
    pub fn light_type(&mut self, index: Option<usize>) -> Result<LightType, LightError> {
        Ok(self.light(index)?.kind)
    }

    /// The resolved light's direction
    pub fn direction(&mut self, index: Option<usize>) -> Result<Vec3, LightError> {
        Ok(self.light(index)?.camera.direction)
    }

    /// The resolved light's position
    pub fn position(&mut self, index: Option<usize>) -> Result<Vec3, LightError> {
        Ok(self.light(index)?.camera.position)
    }

    /// The resolved light's ambient color
    pub fn ambient_color(&mut self, index: Option<usize>) -> Result<Vec4, LightError> {
        Ok(self.light(index)?.ambient)
    }

    /// The resolved light's diffuse color
    pub fn diffuse_color(&mut self, index: Option<usize>) -> Result<Vec4, LightError> {
        Ok(self.light(index)?.diffuse)
    }

    /// The resolved light's specular color
    pub fn specular_color(&mut self, index: Option<usize>) -> Result<Vec4, LightError> {
        Ok(self.light(index)?.specular)
    }

    /// The resolved light's constant attenuation coefficient
    pub fn constant_attenuation(&mut self, index: Option<usize>) -> Result<f32, LightError> {
        Ok(self.light(index)?.constant_attenuation)
    }

    /// The resolved light's linear attenuation coefficient
    pub fn linear_attenuation(&mut self, index: Option<usize>) -> Result<f32, LightError> {
        Ok(self.light(index)?.linear_attenuation)
    }

    /// The resolved light's quadratic attenuation coefficient
    pub fn quadratic_attenuation(&mut self, index: Option<usize>) -> Result<f32, LightError> {
        Ok(self.light(index)?.quadratic_attenuation)
    }

    /// The resolved light's spot cutoff cosine
    pub fn spot_cos_cutoff(&mut self, index: Option<usize>) -> Result<f32, LightError> {
        Ok(self.light(index)?.spot_cos_cutoff)
    }

    /// The resolved light's spot exponent
    pub fn spot_exponent(&mut self, index: Option<usize>) -> Result<f32, LightError> {
        Ok(self.light(index)?.spot_exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::DeviceOptions;
    use crate::render::headless::HeadlessSurface;
    use crate::render::matrix_stack::MatrixStack;
    use crate::render::DrawingSurface;
    use std::cell::RefCell;
    use std::rc::Rc;

    // Records (light index at render time, render ordinal) per call.
    struct ProbeObject {
        name: &'static str,
        position: Vec3,
        radius: f32,
        observed: Rc<RefCell<Vec<(&'static str, Option<usize>)>>>,
    }

    impl Renderable for ProbeObject {
        fn render(&mut self, frame: &mut FrameContext<'_>) {
            let index = frame.active_light().map(|active| active.index);
            self.observed.borrow_mut().push((self.name, index));
        }

        fn position(&self) -> Vec3 {
            self.position
        }

        fn bounding_sphere_radius(&self) -> f32 {
            self.radius
        }
    }

    fn probe(
        name: &'static str,
        position: Vec3,
        radius: f32,
        observed: &Rc<RefCell<Vec<(&'static str, Option<usize>)>>>,
    ) -> Box<dyn Renderable> {
        Box::new(ProbeObject {
            name,
            position,
            radius,
            observed: Rc::clone(observed),
        })
    }

    fn white() -> Vec4 {
        Vec4::new(1.0, 1.0, 1.0, 1.0)
    }

    fn frame_parts() -> (HeadlessSurface, Box<dyn crate::render::RenderDevice>, MatrixStack) {
        let surface = HeadlessSurface::new(64, 64);
        let device = surface
            .acquire_device("lumen", &DeviceOptions::default())
            .unwrap();
        (surface, device, MatrixStack::new())
    }

    #[test]
    fn test_add_up_to_capacity_then_fail() {
        let mut manager = LightManager::new();
        for _ in 0..MAX_LIGHTS {
            manager.add(LightSource::default()).unwrap();
        }
        assert_eq!(
            manager.add(LightSource::default()),
            Err(LightError::CapacityExceeded { max: MAX_LIGHTS })
        );
        assert_eq!(manager.count(), MAX_LIGHTS);
    }

    #[test]
    fn test_enable_override_and_default() {
        let mut manager = LightManager::new();
        assert!(!manager.is_enabled());

        manager.enable();
        assert!(manager.is_enabled());

        manager.add(LightSource::default()).unwrap();
        manager.disable();
        assert!(!manager.is_enabled());

        // Removing the last light clears the override.
        manager.remove(0);
        assert!(!manager.is_enabled());
        manager.add(LightSource::default()).unwrap();
        assert!(manager.is_enabled());
    }

    #[test]
    fn test_is_light_enabled_out_of_range_is_false() {
        let mut manager = LightManager::new();
        manager.add(LightSource::default()).unwrap();
        assert!(manager.is_light_enabled(0));
        assert!(!manager.is_light_enabled(3));
    }

    #[test]
    fn test_illuminate_renders_each_object_once_per_light_in_order() {
        let mut manager = LightManager::new();
        manager
            .add(LightSource::directional(-Vec3::y(), white()))
            .unwrap();
        manager
            .add(LightSource::point(Vec3::new(2.0, 1.0, 0.0), white(), 0.1))
            .unwrap();

        let observed = Rc::new(RefCell::new(Vec::new()));
        let mut objects = vec![
            probe("a", Vec3::zeros(), 1.0, &observed),
            probe("b", Vec3::zeros(), 1.0, &observed),
        ];

        let (_surface, mut device, mut matrices) = frame_parts();
        let mut frame = FrameContext::new(device.as_mut(), &mut matrices);
        manager.illuminate(&mut frame, &mut objects);

        // Light-major, object-minor nesting.
        assert_eq!(
            *observed.borrow(),
            vec![
                ("a", Some(0)),
                ("b", Some(0)),
                ("a", Some(1)),
                ("b", Some(1)),
            ]
        );
        assert!(frame.active_light().is_none());
    }

    #[test]
    fn test_light_falls_back_to_default_outside_a_pass() {
        let mut manager = LightManager::new();
        let light = manager.light(None).unwrap();
        assert_eq!(light.kind, LightType::Directional);
        // Explicit index into an empty collection is an error.
        assert_eq!(
            manager.light(Some(0)).err(),
            Some(LightError::IndexOutOfRange { index: 0, count: 0 })
        );
    }

    #[test]
    fn test_accessors_delegate_to_resolved_light() {
        let mut manager = LightManager::new();
        manager
            .add(LightSource::point(Vec3::new(1.0, 2.0, 3.0), white(), 0.5))
            .unwrap();

        assert_eq!(manager.position(Some(0)).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(manager.linear_attenuation(Some(0)).unwrap(), 0.5);
        assert_eq!(manager.light_type(Some(0)).unwrap(), LightType::Point);
        assert!(manager.diffuse_color(Some(4)).is_err());
    }

    #[test]
    fn test_update_shadow_maps_empty_scene_still_refreshes_every_light() {
        let mut manager = LightManager::new();
        manager
            .add(LightSource::directional(-Vec3::y(), white()))
            .unwrap();
        manager
            .add(LightSource::directional(-Vec3::x(), white()))
            .unwrap();

        let (surface, mut device, mut matrices) = frame_parts();
        let mut frame = FrameContext::new(device.as_mut(), &mut matrices);
        let mut objects: Vec<Box<dyn Renderable>> = Vec::new();
        manager.update_shadow_maps(&mut frame, &mut objects);

        use crate::render::headless::GpuCall;
        let binds = surface.count_calls(|c| matches!(c, GpuCall::BindShadowTarget(_)));
        assert_eq!(binds, 2);
    }

    #[test]
    fn test_shadow_pass_balances_the_matrix_stack() {
        let mut manager = LightManager::new();
        manager
            .add(LightSource::directional(-Vec3::y(), white()))
            .unwrap();

        let observed = Rc::new(RefCell::new(Vec::new()));
        let mut objects = vec![probe("a", Vec3::new(3.0, 0.0, 0.0), 2.0, &observed)];

        let (_surface, mut device, mut matrices) = frame_parts();
        {
            let mut frame = FrameContext::new(device.as_mut(), &mut matrices);
            manager.update_shadow_maps(&mut frame, &mut objects);
        }
        assert_eq!(matrices.depth(), 1);
    }
}
