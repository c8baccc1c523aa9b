use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sr3d_core::{Perspective, RasterMode};
use sr3d_video::{
    config::{DEFAULT_DURATION_SECS, DEFAULT_FPS, DEFAULT_HEIGHT, DEFAULT_WIDTH},
    encode::{default_mp4_config, write_png},
    render_frame, render_video, FfmpegSink, FrameSink, MeshSource, PngSequence, VideoConfig,
};

#[derive(Parser, Debug)]
#[command(name = "sr3d-video", version, about = "Render a tumbling 3D mesh to video")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the whole animation as an MP4 (requires `ffmpeg` on PATH) or a PNG sequence.
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Built-in mesh to animate.
    #[arg(long, value_enum, default_value_t = MeshChoice::Cube)]
    mesh: MeshChoice,

    /// Load the mesh from an STL file instead.
    #[arg(long)]
    stl: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// Length of one full loop, in seconds.
    #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
    duration: u32,

    /// Vertical field of view, in degrees.
    #[arg(long, default_value_t = Perspective::DEFAULT_FOV_DEGREES)]
    fov: f32,

    /// Draw triangle edges only.
    #[arg(long)]
    wireframe: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output MP4 path.
    #[arg(long, default_value = "output_3d.mp4")]
    out: PathBuf,

    /// Write numbered PNG frames into this directory instead of encoding an MP4.
    #[arg(long)]
    png_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MeshChoice {
    Cube,
    Phone,
}

impl SceneArgs {
    fn config(&self) -> VideoConfig {
        VideoConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
            duration_secs: self.duration,
            fov_degrees: self.fov,
            mode: if self.wireframe {
                RasterMode::Wireframe
            } else {
                RasterMode::Filled
            },
            ..VideoConfig::default()
        }
    }

    fn source(&self) -> MeshSource {
        match (&self.stl, self.mesh) {
            (Some(path), _) => MeshSource::Stl(path.clone()),
            (None, MeshChoice::Cube) => MeshSource::Cube,
            (None, MeshChoice::Phone) => MeshSource::Phone,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = args.scene.config();
    cfg.validate()?;
    let mesh = args.scene.source().load()?;

    let target = args.png_dir.clone().unwrap_or_else(|| args.out.clone());
    let mut sink: Box<dyn FrameSink> = match &args.png_dir {
        Some(dir) => Box::new(PngSequence::new(dir)?),
        None => {
            let encode = default_mp4_config(&args.out, cfg.width, cfg.height, cfg.fps);
            Box::new(FfmpegSink::new(encode)?)
        }
    };

    let summary = render_video(&cfg, &mesh, sink.as_mut())
        .with_context(|| format!("failed to render '{}'", target.display()))?;

    tracing::info!(
        frames = summary.frames,
        drawn = summary.triangles_drawn,
        culled = summary.triangles_culled,
        "video saved as {}",
        target.display()
    );
    tracing::info!(
        "duration: {} seconds, {} frames at {} fps",
        cfg.duration_secs,
        summary.frames,
        cfg.fps
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = args.scene.config();
    let mesh = args.scene.source().load()?;

    let fb = render_frame(&cfg, &mesh, args.frame)?;
    write_png(&args.out, &fb)
        .with_context(|| format!("failed to write '{}'", args.out.display()))?;
    tracing::info!("wrote frame {} to {}", args.frame, args.out.display());
    Ok(())
}
