//! softraster viewer
//!
//! Opens a window and spins a mesh under keyboard control, or renders a
//! scene headless straight to a PNG.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};
use macroquad::prelude::*;
use softraster::rasterizer::{Camera, FrameDelta, Mesh, Rasterizer, Texture};
use softraster::scene::{load_scene, Scene};
use softraster::VERSION;

/// Distance moved per frame while a movement key is held
const MOVE_STEP: f32 = 0.1;
/// Radians turned per frame while a rotation key is held
const TURN_STEP: f32 = 0.05;

/// CPU scanline rasterizer viewer
#[derive(Parser)]
#[command(name = "softraster")]
#[command(about = "CPU scanline rasterizer", long_about = None)]
struct Args {
    /// Scene file (.ron); the built-in cube scene is used when omitted
    #[arg(short = 's', long)]
    scene: Option<PathBuf>,

    /// Render without a window and write the last frame to --output
    #[arg(long)]
    headless: bool,

    /// PNG path for headless output and screenshots
    #[arg(short = 'o', long, default_value = "frame.png")]
    output: PathBuf,

    /// Frames to render in headless mode, applying the scene spin each frame
    #[arg(short = 'n', long, default_value = "1")]
    frames: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("softraster v{}", VERSION);

    let scene = match &args.scene {
        Some(path) => {
            info!("Loading scene from: {}", path.display());
            load_scene(path).inspect_err(|e| error!("Failed to load scene: {}", e))?
        }
        None => Scene::default(),
    };

    let mesh = scene.build_mesh()?;
    let texture = scene.build_texture().unwrap_or_else(|e| {
        warn!("Failed to load texture: {}, using checkerboard", e);
        Texture::default()
    });
    let raster = Rasterizer::new(scene.width, scene.height, scene.settings.clone()).with_texture(texture);

    if args.headless {
        return render_headless(raster, mesh, &scene, &args);
    }

    let conf = Conf {
        window_title: format!("softraster v{}", VERSION),
        window_width: scene.width as i32,
        window_height: scene.height as i32,
        window_resizable: true,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, run(raster, mesh, scene.camera.clone(), args.output));
    Ok(())
}

fn render_headless(
    mut raster: Rasterizer,
    mut mesh: Mesh,
    scene: &Scene,
    args: &Args,
) -> Result<(), Box<dyn Error>> {
    let frames = args.frames.max(1);
    let mut saved = Ok(());
    let stats = raster.run_frames(&mut mesh, &scene.spin, frames, |fb| saved = fb.save_png(&args.output));
    info!(
        "Rendered {} frame(s): {} of {} primitives drawn, {} pixels written",
        frames, stats.drawn, stats.primitives, stats.pixels_written
    );

    saved.inspect_err(|e| error!("Failed to write {}: {}", args.output.display(), e))?;
    info!("Wrote {}", args.output.display());
    Ok(())
}

/// Map held keys to this frame's movement
fn read_delta() -> FrameDelta {
    let mut delta = FrameDelta::default();
    let axis = |neg: KeyCode, pos: KeyCode| match (is_key_down(neg), is_key_down(pos)) {
        (false, true) => 1.0,
        (true, false) => -1.0,
        _ => 0.0,
    };

    delta.translate[2] = axis(KeyCode::S, KeyCode::W) * MOVE_STEP;
    delta.translate[1] = axis(KeyCode::A, KeyCode::D) * MOVE_STEP;
    delta.rotate[0] = axis(KeyCode::Right, KeyCode::Left) * TURN_STEP;
    delta.rotate[2] = axis(KeyCode::Down, KeyCode::Up) * TURN_STEP;
    delta
}

/// Follow the window size, keeping the lens aspect in step
fn fit_window(raster: &mut Rasterizer, mesh: &mut Mesh, camera: &mut Camera) {
    let (width, height) = (screen_width() as usize, screen_height() as usize);
    let viewport = raster.viewport();
    if width == 0 || height == 0 || (width, height) == (viewport.width, viewport.height) {
        return;
    }
    raster.resize(width, height);
    camera.fit_viewport(width, height);
    mesh.set_camera(camera);
}

async fn run(mut raster: Rasterizer, mut mesh: Mesh, mut camera: Camera, screenshot: PathBuf) {
    info!("W/S A/D move, arrows rotate, P saves {}, Escape quits", screenshot.display());

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        fit_window(&mut raster, &mut mesh, &mut camera);

        raster.render_frame(&mut mesh, &read_delta());
        let save = is_key_pressed(KeyCode::P);

        raster.present(|fb| {
            if save {
                match fb.save_png(&screenshot) {
                    Ok(()) => info!("Saved {}", screenshot.display()),
                    Err(e) => error!("Failed to save {}: {}", screenshot.display(), e),
                }
            }

            let texture = Texture2D::from_rgba8(fb.width() as u16, fb.height() as u16, &fb.to_rgba());
            texture.set_filter(FilterMode::Nearest);

            clear_background(BLACK);
            draw_texture_ex(
                &texture,
                0.0,
                0.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(Vec2::new(screen_width(), screen_height())),
                    ..Default::default()
                },
            );
        });

        next_frame().await;
    }
}
