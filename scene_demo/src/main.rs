//! Headless scene demo
//!
//! Builds a small world (textured geometry, a grouped mesh, terrain, lights,
//! fog and a field of randomly placed boxes), then flies the camera forward
//! for a few frames on the recording device and logs what each frame drew.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use std::rc::Rc;

use rand::Rng;
use scene_engine::config::{Config, ConfigError, EngineConfig};
use scene_engine::foundation::logging;
use scene_engine::foundation::math::{Color, Point3, Rotation};
use scene_engine::render::device::{AttenuationMode, BufferTarget, CompileMode, FogMode, LightSlot, PixelFormat, Primitive};
use scene_engine::render::{Camera, Frustum, GraphicsDevice, RecordingDevice, RenderError, Renderer};
use scene_engine::scene::{BoundingVolume, Fog, Geometry, GeometryArray, Light, Scene, SceneNode, SceneObject, SpotLight, Terrain, Texture};
use scene_engine::tree::Branch;

const FRAMES: u64 = 6;
const CAMERA_STEP: f32 = -4.0;
const RANDOM_BOXES: usize = 12;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("node '{0}' is already part of the scene")]
    DuplicateNode(String),
}

/// Two triangles forming a unit quad in the XY plane
const QUAD: [f32; 18] = [
    -0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.5, 0.5, 0.0, //
    -0.5, -0.5, 0.0, 0.5, 0.5, 0.0, -0.5, 0.5, 0.0,
];

/// A flat 2x2 ground patch made of quads
const GROUND: [f32; 12] = [-1.0, 0.0, -1.0, 1.0, 0.0, -1.0, 1.0, 0.0, 1.0, -1.0, 0.0, 1.0];

fn load_config() -> Result<EngineConfig, DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn add<N: SceneNode + 'static>(scene: &mut Scene, node: N) -> Result<(), DemoError> {
    scene
        .add_node(node)
        .map(|_| ())
        .map_err(|node| DemoError::DuplicateNode(node.name().to_string()))
}

fn checkerboard() -> Vec<u8> {
    (0..16)
        .flat_map(|i| if (i + i / 4) % 2 == 0 { [255, 255, 255, 255] } else { [40, 40, 40, 255] })
        .collect()
}

fn build_world(device: &mut RecordingDevice) -> Result<Scene, DemoError> {
    let mut scene = Scene::new("demo world");
    let texture = Rc::new(Texture::new_2d(device, 4, 4, PixelFormat::Rgba, true, &checkerboard())?);

    let mut sign = Geometry::new(device, "sign", &QUAD, Rc::clone(&texture), Primitive::Triangles, BufferTarget::Array)?;
    if let Some(object) = sign.object_mut() {
        object.set_position(Point3::new(0.0, 2.0, -15.0));
    }
    sign.base_mut().set_bounds(Some(BoundingVolume::sphere(1.0)?));
    add(&mut scene, sign)?;

    let mut panels = GeometryArray::new("panels");
    for i in 0..3 {
        let mut panel = Geometry::new(
            device,
            format!("panel {}", i),
            &QUAD,
            Rc::clone(&texture),
            Primitive::Triangles,
            BufferTarget::Array,
        )?;
        if let Some(object) = panel.object_mut() {
            object.set_position(Point3::new(i as f32 * 1.5, 0.0, 0.0));
        }
        if let Err(panel) = panels.add(panel) {
            return Err(DemoError::DuplicateNode(panel.name().to_string()));
        }
    }
    panels.compile(device)?;
    if let Some(object) = panels.object_mut() {
        object.set_position(Point3::new(-3.0, 0.0, -25.0));
        object.set_rotation(Rotation::from_euler_degrees(0.0, 30.0, 0.0));
    }
    add(&mut scene, panels)?;

    let mut ground = Terrain::new(device, "ground", &GROUND, Rc::clone(&texture), Primitive::Quads, BufferTarget::Array)?;
    if let Some(object) = ground.object_mut() {
        object.set_position(Point3::new(0.0, -2.0, -20.0));
    }
    ground.base_mut().set_bounds(Some(BoundingVolume::cuboid(2.0, 0.1, 2.0)?));
    add(&mut scene, ground)?;

    let mut light = Light::in_slot(LightSlot::new(0)?);
    light.set_position(device, Point3::new(0.0, 10.0, -10.0))?;
    light.set_diffuse_color(device, Color::new(1.0, 0.95, 0.9, 1.0))?;
    light.set_attenuation(device, AttenuationMode::Linear, 0.05)?;
    light.set_enabled(device, true)?;
    add(&mut scene, light)?;

    let mut spot = SpotLight::in_slot(LightSlot::new(1)?);
    spot.set_rotation(device, Rotation::from_euler_degrees(0.0, -1.0, 0.0))?;
    spot.set_cutoff(device, 25.0)?;
    spot.set_exponent(device, 8.0)?;
    spot.light_mut().set_enabled(device, true)?;
    add(&mut scene, spot)?;

    let fog = Fog::new(device, FogMode::Linear, 0.35, 20.0..=55.0, Color::new(0.6, 0.6, 0.7, 1.0))?;
    add(&mut scene, fog)?;

    let mut rng = rand::thread_rng();
    for i in 0..RANDOM_BOXES {
        let position = Point3::new(rng.gen_range(-30.0..30.0), rng.gen_range(-5.0..5.0), rng.gen_range(-70.0..-5.0));
        let rotation = Rotation::from_euler_degrees(0.0, rng.gen_range(0.0..360.0), 0.0);
        let mut crate_box = SceneObject::new(format!("box {}", i)).placed(position, rotation);
        crate_box.compile_with(device, CompileMode::Compile, |d| {
            d.bind_texture(texture.target(), texture.require_handle()?)?;
            d.draw_arrays(Primitive::Quads, 0, 24)
        })?;
        crate_box.base_mut().set_bounds(Some(BoundingVolume::sphere(0.9)?));
        add(&mut scene, crate_box)?;
    }

    log::info!("Built scene '{}' with {} nodes", scene.name(), scene.count());
    Ok(scene)
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    logging::init_with_level(config.level_filter()?);
    log::info!("Starting scene demo ({}x{})", config.viewport.width, config.viewport.height);

    let mut device = RecordingDevice::from_config(&config.device);
    let mut renderer = Renderer::from_config(&config)?;

    let scene = build_world(&mut device)?;
    let key = renderer.add_scene(scene);

    let frustum = Frustum::try_from(config.camera.frustum)?;
    let camera = Camera::new("fly", frustum).viewing(key);
    let fly = renderer.attach_camera(camera, true);
    renderer.resize(&mut device, config.viewport.width, config.viewport.height)?;

    for _ in 0..FRAMES {
        device.clear_trace();
        match renderer.render_frame(&mut device)? {
            Some(report) => {
                log::info!("Frame {}: {} ({} device calls)", renderer.frame_count(), report, device.calls().len());
                for (id, error) in &report.failed {
                    log::error!("Node {} failed: {}", id, error);
                }
            }
            None => log::warn!("Active camera has no scene"),
        }

        if let Some(camera) = renderer.camera_mut(fly) {
            let position = camera.position();
            camera.set_position(Point3::new(position.x, position.y, position.z + CAMERA_STEP));
        }
    }
    log::info!("Vertices submitted: {}", device.vertices_drawn());

    if let Some(mut scene) = renderer.remove_scene(key) {
        for line in scene.traverse() {
            println!("{}", line);
        }
        scene.release(&mut device)?;
    }
    log::info!(
        "Released scene: {} lists, {} buffers, {} textures still live",
        device.live_lists(),
        device.live_buffers(),
        device.live_textures()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Scene demo failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
