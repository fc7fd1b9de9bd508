/// Lab3D Terminal - Transform Lab
///
/// Renders a scene as ASCII shading and drives it from the keyboard.
/// Controls:
///   - I/K, J/L, U/O: Rotate the controlled model
///   - F/H, R/Y, T/G: Move it (hold X to scale, Z to move in world space)
///   - Arrows: Turn the camera; W/S, A/D, Q/E: Move it
///   - Tab: Control the next model; 1: Pause light orbits
///   - Esc / Ctrl-C: Quit
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use lab3d_core::{load_scene, KeyState, Scene};
use lab3d_terminal::{AppConfig, TerminalApp};
use nalgebra::Matrix4;

#[derive(Parser, Debug)]
#[command(
    name = "lab3d-terminal",
    about = "Compose world, view and projection matrices and draw them in the terminal."
)]
struct Args {
    /// Scene description file (defaults to the built-in cube lab)
    #[arg(long, value_name = "FILE")]
    scene: Option<PathBuf>,

    /// Target frames per second
    #[arg(long, value_name = "N", default_value_t = 30)]
    fps: u32,

    /// How long a key counts as held after a press when the terminal can't report releases
    #[arg(long, value_name = "MS", default_value_t = 300)]
    hold_ms: u64,

    /// Write log output to this file (the terminal is busy drawing)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Advance this many frames without input, print the matrices and exit
    #[arg(long, value_name = "FRAMES")]
    print_matrices: Option<u32>,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    // Logs would tear through the picture, so they stay off unless asked for
    let default_filter = if log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("installing logger")?;
    Ok(())
}

fn format_matrix(name: &str, m: &Matrix4<f32>) -> String {
    let mut out = format!("{name}:\n");
    for row in m.row_iter() {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:>10.4}")).collect();
        out.push_str(&format!("  [{}]\n", cells.join(" ")));
    }
    out
}

fn print_matrices(mut scene: Scene, frames: u32, fps: u32) {
    let dt = 1.0 / fps.max(1) as f32;
    let keys = KeyState::new();
    for _ in 0..frames {
        scene.update(&keys, dt);
    }

    println!("after {frames} frames of {:.4}s", dt);
    for model in &scene.models {
        print!("{}", format_matrix(&format!("world `{}`", model.name), &model.world_matrix()));
    }
    for light in &scene.lights {
        let p = light.position;
        println!("light `{}`: ({:.4}, {:.4}, {:.4})", light.name, p.x, p.y, p.z);
    }
    print!("{}", format_matrix("view", &scene.camera.view_matrix()));
    print!("{}", format_matrix("projection", &scene.camera.projection_matrix()));
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    if args.fps == 0 {
        bail!("--fps must be at least 1");
    }

    let scene = match &args.scene {
        Some(path) => {
            load_scene(path).with_context(|| format!("loading scene {}", path.display()))?
        }
        None => Scene::default_lab().context("building the built-in lab")?,
    };

    if let Some(frames) = args.print_matrices {
        print_matrices(scene, frames, args.fps);
        return Ok(());
    }

    let config = AppConfig {
        target_fps: args.fps,
        hold: Duration::from_millis(args.hold_ms),
    };
    let mut app = TerminalApp::new(scene, config).context("reading terminal size")?;
    app.run().context("running terminal renderer")?;

    log::info!("exiting");
    Ok(())
}
