use sr3d_core::{frame_progress, Framebuffer, Mesh, RenderStats, Renderer};

use crate::config::VideoConfig;
use crate::encode::FrameSink;
use crate::error::VideoResult;

/// Totals over a whole video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames: u32,
    pub triangles_drawn: u64,
    pub triangles_culled: u64,
}

impl RenderSummary {
    fn add(&mut self, stats: RenderStats) {
        self.frames += 1;
        self.triangles_drawn += stats.drawn as u64;
        self.triangles_culled += stats.culled as u64;
    }
}

/// Owns the framebuffer and renderer for one video
pub struct FrameLoop<'a> {
    config: &'a VideoConfig,
    mesh: &'a Mesh,
    renderer: Renderer,
    framebuffer: Framebuffer,
}

impl<'a> FrameLoop<'a> {
    pub fn new(config: &'a VideoConfig, mesh: &'a Mesh) -> VideoResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mesh,
            renderer: Renderer::new(config.lens()),
            framebuffer: Framebuffer::new(config.width as usize, config.height as usize),
        })
    }

    /// Clear and draw frame `index` of the loop, leaving it in the framebuffer
    pub fn draw(&mut self, index: u32) -> RenderStats {
        let progress = frame_progress(index, self.config.total_frames());
        let model = self.config.spin.model_matrix(progress);
        self.framebuffer.clear(self.config.background);
        self.renderer
            .render(self.mesh, &model, &mut self.framebuffer, self.config.mode)
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn into_framebuffer(self) -> Framebuffer {
        self.framebuffer
    }
}

/// Render every frame of the loop into `sink`, then finish it
#[tracing::instrument(skip_all, fields(frames = config.total_frames(), width = config.width, height = config.height))]
pub fn render_video(
    config: &VideoConfig,
    mesh: &Mesh,
    sink: &mut dyn FrameSink,
) -> VideoResult<RenderSummary> {
    let mut frames = FrameLoop::new(config, mesh)?;
    let total = config.total_frames();
    let mut summary = RenderSummary::default();

    tracing::info!(triangles = mesh.triangle_count(), "rendering {total} frames");
    for index in 0..total {
        let stats = frames.draw(index);
        sink.push(frames.framebuffer())?;
        summary.add(stats);

        if index % 10 == 0 {
            tracing::info!("progress: {index}/{total} frames");
        }
    }

    tracing::info!("finalizing video");
    sink.finish()?;
    Ok(summary)
}

/// Render a single frame of the loop
pub fn render_frame(config: &VideoConfig, mesh: &Mesh, index: u32) -> VideoResult<Framebuffer> {
    let mut frames = FrameLoop::new(config, mesh)?;
    let stats = frames.draw(index);
    tracing::debug!(index, drawn = stats.drawn, culled = stats.culled, "rendered frame");
    Ok(frames.into_framebuffer())
}
