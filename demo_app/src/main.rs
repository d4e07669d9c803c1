//! Orbit demo application
//!
//! Drives the engine against the headless backend: a cube orbiting
//! the origin, lit by a directional sun and an orbit-following point
//! light, rendered for a fixed stretch of simulated time. The
//! recorded GPU call stream is summarized at the end.

use std::error::Error;
use std::time::{Duration, Instant};

use lumen_engine::prelude::*;
use lumen_engine::render::{GpuCall, PrimitiveMode};

struct OrbitingCube {
    angle: f32,
    orbit_radius: f32,
}

impl Renderable for OrbitingCube {
    fn render(&mut self, frame: &mut FrameContext<'_>) {
        let mut matrices = frame.matrices.scoped();
        matrices.mult_model_matrix(Mat4::new_translation(&self.position()));
        frame.device.draw_arrays(PrimitiveMode::Triangles, 0, 36);
    }

    fn update(&mut self, dt: f32) {
        self.angle += dt * std::f32::consts::FRAC_PI_2;
    }

    fn position(&self) -> Vec3 {
        Vec3::new(
            self.orbit_radius * self.angle.cos(),
            0.0,
            self.orbit_radius * self.angle.sin(),
        )
    }

    fn bounding_sphere_radius(&self) -> f32 {
        1.0
    }
}

struct OrbitController;

impl Controller for OrbitController {
    fn name(&self) -> &str {
        "orbit"
    }

    fn activate(&mut self, world: &mut World, camera: &mut Camera) {
        world.add_object(Box::new(OrbitingCube {
            angle: 0.0,
            orbit_radius: 4.0,
        }));

        let lights = world.light_manager_mut();
        lights
            .add(LightSource::directional(
                Vec3::new(-0.3, -1.0, -0.2),
                Vec4::new(1.0, 0.95, 0.85, 1.0),
            ))
            .expect("two lights fit well under the capacity limit");
        lights
            .add(LightSource::point(
                Vec3::new(0.0, 3.0, 0.0),
                Vec4::new(0.4, 0.5, 1.0, 1.0),
                0.15,
            ))
            .expect("two lights fit well under the capacity limit");

        camera.look_at(
            Vec3::new(8.0, 6.0, 8.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
        );
    }

    fn view_key(&self) -> Option<&str> {
        Some("orbit/scene")
    }
}

struct SceneView;

impl View for SceneView {
    fn render(&mut self, frame: &mut FrameContext<'_>, world: &mut World) {
        frame.device.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        world.render(frame);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    lumen_engine::foundation::logging::init();
    log::info!("Starting orbit demo...");

    let mut routes = RouteSet::new();
    routes.map("/", || OrbitController);
    let mut views = ViewRegistry::new();
    views.register("orbit/scene", || SceneView);

    let surface = HeadlessSurface::new(1280, 720);
    let mut context = Context::initialize(
        Box::new(surface.clone()),
        routes,
        views,
        EngineConfig::default(),
    )?;
    log::info!("Context {} initialized and routed", context.id());

    // Two simulated seconds at a fixed step, deterministic regardless
    // of wall-clock scheduling.
    let start = Instant::now();
    let step = Duration::from_millis(16);
    for n in 0..125u32 {
        context.tick_at(start + step * n)?;
    }

    let draws = surface.count_calls(|c| matches!(c, GpuCall::DrawArrays { .. }));
    let shadow_passes = surface.count_calls(|c| matches!(c, GpuCall::BindShadowTarget(_)));
    let clears = surface.count_calls(|c| matches!(c, GpuCall::Clear(_)));
    log::info!(
        "Recorded {draws} draw calls, {shadow_passes} shadow passes, {clears} clears"
    );

    context.dispose();
    log::info!("Orbit demo finished");
    Ok(())
}
