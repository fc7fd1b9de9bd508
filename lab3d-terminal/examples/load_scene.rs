/// Example: Load a scene description and render it in the terminal
///
/// Usage: cargo run --example load_scene -- scenes/parallax_lab.scene

use std::env;
use lab3d_core::{load_scene, Scene};
use lab3d_terminal::{AppConfig, TerminalApp};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let scene = match args.get(1) {
        Some(path) => {
            println!("Loading scene file: {path}");
            load_scene(path)?
        }
        None => {
            eprintln!("Usage: {} <scene-file>", args[0]);
            eprintln!("\nNo scene file provided, using the built-in lab...");
            Scene::default_lab()?
        }
    };

    println!(
        "Loaded {} models and {} lights",
        scene.models.len(),
        scene.lights.len()
    );
    println!("Starting terminal renderer (press Esc to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(scene, AppConfig::default())?;
    app.run()?;
    Ok(())
}
