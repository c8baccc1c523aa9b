/// Turns the software rasterizer into videos: a frame loop that animates a
/// mesh, plus sinks that hand finished framebuffers to ffmpeg or PNG files.

pub mod config;
pub mod driver;
pub mod encode;
pub mod error;

pub use config::{MeshSource, VideoConfig};
pub use driver::{render_frame, render_video, FrameLoop, RenderSummary};
pub use encode::{FfmpegSink, FrameSink, PngSequence};
pub use error::{VideoError, VideoResult};
