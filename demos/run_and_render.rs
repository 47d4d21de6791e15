use std::path::PathBuf;

use gym_driving::{DrivingEnv, Env, RenderFrame};
use minifb::{Key, Window, WindowOptions};

fn rgba_to_u32(a: u8, r: u8, g: u8, b: u8) -> u32 {
    // Minifb expects ARGB on most platforms; construct accordingly.
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Optional JSON configuration path as the first argument.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let mut env = DrivingEnv::new(config_path.as_deref())?;
    env.reset(Some(123))?;

    let (width, height) = (env.screen().width as usize, env.screen().height as usize);
    let mut window = Window::new("gym-driving: run_and_render", width, height, WindowOptions::default())?;
    window.set_target_fps(30);

    let mut buffer: Vec<u32> = vec![0; width * height];
    let mut rng = rand::thread_rng();

    // Run until window is closed or Escape pressed
    while window.is_open() && !window.is_key_down(Key::Escape) {
        let action = env.action_space().sample(&mut rng);
        let step = env.step(action)?;
        if step.done() {
            env.reset(None)?;
        }

        if let Some(RenderFrame::Pixels { width, height, data }) = env.render() {
            for (dst, px) in buffer.iter_mut().zip(data.chunks_exact(4)) {
                *dst = rgba_to_u32(px[3], px[0], px[1], px[2]);
            }
            window.update_with_buffer(&buffer, width as usize, height as usize)?;
        }
    }
    Ok(())
}
