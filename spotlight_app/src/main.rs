//! Spotlight demo
//!
//! A small scene lit by a controllable flashlight model: WASD + mouse fly the
//! camera, arrow keys move the flashlight, keypad keys aim it. Demonstrates
//! the engine's model loading, per-frame uniform updates, and push-constant
//! driven draws.

use torch_engine::foundation::math::Vec3;
use torch_engine::render::{Camera, Window};
use torch_engine::{ModelSpawn, Orientation, Renderer, RendererConfig};

/// Flashlight translation speed in units per second
const MODEL_MOVE_SPEED: f32 = 8.0;
/// Flashlight rotation speed in degrees per second
const MODEL_TURN_SPEED: f32 = 10.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("fatal: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = RendererConfig::from_file_or_default("torchlight.toml")?;

    let mut window = Window::new(
        config.window.width,
        config.window.height,
        &config.window.title,
    )?;

    let mut camera = Camera::new(
        Vec3::new(50.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        -90.0,
        0.0,
        10.0,
        0.5,
    );

    let mut renderer = Renderer::new(&mut window, &config)?;

    renderer.load_model(
        "models/ground.obj",
        ModelSpawn {
            position: Vec3::new(0.0, -20.0, 0.0),
            orientation: Orientation::default(),
            controllable: false,
        },
    )?;

    let flashlight = renderer.load_model(
        "models/flashlight.obj",
        ModelSpawn {
            position: Vec3::zeros(),
            orientation: Orientation::LookAt {
                target: Vec3::new(-1.0, 0.0, 0.0),
            },
            controllable: true,
        },
    )?;

    let mut last_time = window.time() as f32;

    while !window.should_close() {
        window.process_events();

        let now = window.time() as f32;
        let delta_time = now - last_time;
        last_time = now;

        camera.key_control(window.keys(), delta_time);
        camera.mouse_control(window.x_change(), window.y_change());

        renderer.set_lighting(flashlight);
        renderer.update_view(&camera);

        let keys = *window.keys();
        for model in renderer.models_mut() {
            model.key_control(&keys, delta_time, MODEL_MOVE_SPEED, MODEL_TURN_SPEED);
        }

        renderer.draw_frame()?;
    }

    renderer.wait_idle()?;
    log::info!("clean shutdown");
    Ok(())
}
