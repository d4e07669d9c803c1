//! Light sources

use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};
use crate::render::device::ClearFlags;
use crate::render::frame::FrameContext;
use crate::scene::Renderable;

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
    /// Spot light (like a flashlight)
    Spot,
}

/// Position and orientation of a light in the scene
#[derive(Debug, Clone)]
pub struct LightCamera {
    /// Light position (ignored for purely directional lights)
    pub position: Vec3,
    /// Light direction (ignored for point lights)
    pub direction: Vec3,
}

impl Default for LightCamera {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            direction: -Vec3::z(),
        }
    }
}

/// A single light source
///
/// Carries the full fixed-function-style parameter set: color
/// channels, distance attenuation, spot cone, and the shadow-map
/// settings used when the scene refreshes shadows.
#[derive(Debug, Clone)]
pub struct LightSource {
    /// Light type
    pub kind: LightType,
    /// Whether this light contributes an illumination pass
    pub enabled: bool,
    /// Ambient color contribution
    pub ambient: Vec4,
    /// Diffuse color contribution
    pub diffuse: Vec4,
    /// Specular color contribution
    pub specular: Vec4,
    /// Constant attenuation coefficient
    pub constant_attenuation: f32,
    /// Linear attenuation coefficient
    pub linear_attenuation: f32,
    /// Quadratic attenuation coefficient
    pub quadratic_attenuation: f32,
    /// Cosine of the spot cutoff angle (spot lights only)
    pub spot_cos_cutoff: f32,
    /// Spot falloff exponent (spot lights only)
    pub spot_exponent: f32,
    /// Placement of the light
    pub camera: LightCamera,
    /// Square shadow-map resolution in texels
    pub shadow_resolution: u32,
    /// Whether this light renders a shadow map at all
    pub shadow_caster: bool,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            kind: LightType::Directional,
            enabled: true,
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::new(1.0, 1.0, 1.0, 1.0),
            specular: Vec4::new(1.0, 1.0, 1.0, 1.0),
            constant_attenuation: 1.0,
            linear_attenuation: 0.0,
            quadratic_attenuation: 0.0,
            spot_cos_cutoff: -1.0,
            spot_exponent: 0.0,
            camera: LightCamera::default(),
            shadow_resolution: 1024,
            shadow_caster: true,
        }
    }
}

impl LightSource {
    /// Create a directional light (like sunlight)
    pub fn directional(direction: Vec3, diffuse: Vec4) -> Self {
        Self {
            kind: LightType::Directional,
            diffuse,
            camera: LightCamera {
                position: Vec3::zeros(),
                direction: direction.normalize(),
            },
            ..Self::default()
        }
    }

    /// Create a point light at `position`
    pub fn point(position: Vec3, diffuse: Vec4, linear_attenuation: f32) -> Self {
        Self {
            kind: LightType::Point,
            diffuse,
            linear_attenuation,
            camera: LightCamera {
                position,
                ..LightCamera::default()
            },
            ..Self::default()
        }
    }

    /// Create a spot light at `position` aimed along `direction`
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        diffuse: Vec4,
        cutoff_radians: f32,
        exponent: f32,
    ) -> Self {
        Self {
            kind: LightType::Spot,
            diffuse,
            spot_cos_cutoff: cutoff_radians.cos(),
            spot_exponent: exponent,
            camera: LightCamera {
                position,
                direction: direction.normalize(),
            },
            ..Self::default()
        }
    }

    /// Whether this light contributes an illumination pass
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Re-render this light's shadow map
    ///
    /// The projection volume is sized from `bounding_radius` so the
    /// whole scene fits the map; nothing is cached, since object
    /// positions may have moved since the previous frame. Renders
    /// every shadow-casting object in `objects` into a depth-only
    /// target bracketed by its own matrix frame.
    pub fn update_shadow_map(
        &mut self,
        frame: &mut FrameContext<'_>,
        bounding_radius: f32,
        objects: &mut [Box<dyn Renderable>],
    ) {
        if !self.shadow_caster || !self.enabled {
            return;
        }

        // Degenerate (empty) scenes still get a valid volume.
        let radius = bounding_radius.max(1.0);
        let projection = self.shadow_projection(radius);
        let view = self.shadow_view();

        frame.matrices.push();
        frame.matrices.load_model_matrix(Mat4::identity());
        frame.matrices.load_view_matrix(view);
        frame.matrices.load_projection_matrix(projection);

        frame.device.bind_shadow_target(self.shadow_resolution);
        frame.device.clear(ClearFlags::DEPTH);
        for object in objects.iter_mut() {
            if object.casts_shadow() {
                object.render(frame);
            }
        }
        frame.device.unbind_shadow_target();

        frame
            .matrices
            .pop()
            .expect("shadow pass pops the frame it pushed");
    }

    fn shadow_projection(&self, radius: f32) -> Mat4 {
        match self.kind {
            // Parallel rays: an orthographic box enclosing the scene.
            LightType::Directional => {
                Mat4::new_orthographic(-radius, radius, -radius, radius, -radius, radius)
            }
            // Positional lights: a frustum reaching across the scene.
            LightType::Point | LightType::Spot => {
                let reach = self.camera.position.magnitude() + radius;
                let fov = if self.kind == LightType::Spot && self.spot_cos_cutoff > -1.0 {
                    2.0 * self.spot_cos_cutoff.clamp(-1.0, 1.0).acos()
                } else {
                    std::f32::consts::FRAC_PI_2
                };
                Mat4::new_perspective(1.0, fov, 0.1, reach.max(0.2))
            }
        }
    }

    fn shadow_view(&self) -> Mat4 {
        let eye = self.camera.position;
        let target = eye + self.camera.direction;
        let up = if self.camera.direction.x.abs() < f32::EPSILON
            && self.camera.direction.z.abs() < f32::EPSILON
        {
            // Looking straight up or down; pick a non-parallel up vector.
            Vec3::x()
        } else {
            Vec3::y()
        };
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_constructor_normalizes_direction() {
        let light = LightSource::directional(Vec3::new(0.0, -2.0, 0.0), Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(light.kind, LightType::Directional);
        assert!((light.camera.direction.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_spot_stores_cosine_of_cutoff() {
        let cutoff = std::f32::consts::FRAC_PI_4;
        let light = LightSource::spot(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec4::new(1.0, 1.0, 1.0, 1.0),
            cutoff,
            8.0,
        );
        assert!((light.spot_cos_cutoff - cutoff.cos()).abs() < 1e-6);
        assert_eq!(light.spot_exponent, 8.0);
    }

    #[test]
    fn test_default_light_is_an_enabled_directional() {
        let light = LightSource::default();
        assert_eq!(light.kind, LightType::Directional);
        assert!(light.is_enabled());
    }
}
