/// SR3D terminal preview
///
/// Controls:
///   - WASD / Arrow Keys: Rotate
///   - E/R: Roll
///   - Space: Toggle auto-spin
///   - F: Toggle wireframe
///   - M: Next model
///   - Q/ESC: Quit
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use sr3d_core::stl;
use sr3d_terminal::{Scene, TerminalApp};

#[derive(Parser, Debug)]
#[command(name = "sr3d-terminal", version, about = "Preview the rasterizer in a true-color terminal")]
struct Args {
    /// Show this STL file first; M still cycles to the built-in cube and phone.
    #[arg(long)]
    stl: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = match &args.stl {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read STL file '{}'", path.display()))?;
            let mesh = stl::parse_stl(&data, stl::DEFAULT_STL_COLOR)
                .with_context(|| format!("failed to parse STL file '{}'", path.display()))?;
            println!("Loaded {} triangles from {}", mesh.triangle_count(), path.display());
            Some(mesh)
        }
        None => None,
    };

    let mut app = TerminalApp::new(Scene::new(loaded)).context("failed to query terminal size")?;
    app.run().context("terminal preview failed")?;
    Ok(())
}
