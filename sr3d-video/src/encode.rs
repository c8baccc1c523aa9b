use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use sr3d_core::Framebuffer;

use crate::error::{VideoError, VideoResult};

/// Consumer of finished frames, in presentation order
pub trait FrameSink {
    fn push(&mut self, frame: &Framebuffer) -> VideoResult<()>;

    /// Flush and close; no frames may be pushed afterwards
    fn finish(&mut self) -> VideoResult<()>;
}

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> VideoResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VideoError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(VideoError::validation("encode fps must be non-zero"));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            // yuv420p subsamples chroma 2x2.
            return Err(VideoError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

pub fn default_mp4_config(
    out_path: impl Into<PathBuf>,
    width: u32,
    height: u32,
    fps: u32,
) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps,
        out_path: out_path.into(),
        overwrite: true,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> VideoResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn check_frame_size(frame: &Framebuffer, width: u32, height: u32) -> VideoResult<()> {
    if frame.width() != width as usize || frame.height() != height as usize {
        return Err(VideoError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width(),
            frame.height(),
            width,
            height
        )));
    }
    Ok(())
}

/// H.264/MP4 encoding through the system `ffmpeg` binary fed raw RGBA on stdin
pub struct FfmpegSink {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    frames: u64,
}

impl FfmpegSink {
    pub fn new(cfg: EncodeConfig) -> VideoResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(VideoError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(VideoError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "23",
            "-g",
            "10",
            "-bf",
            "1",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            VideoError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VideoError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        tracing::debug!(out = %cfg.out_path.display(), width = cfg.width, height = cfg.height, fps = cfg.fps, "spawned ffmpeg");
        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
            frames: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for FfmpegSink {
    fn push(&mut self, frame: &Framebuffer) -> VideoResult<()> {
        check_frame_size(frame, self.cfg.width, self.cfg.height)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VideoError::encode("ffmpeg encoder is already finalized"));
        };

        stdin.write_all(frame.as_rgba_bytes()).map_err(|e| {
            VideoError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> VideoResult<()> {
        if self.stdin.take().is_none() {
            return Ok(());
        }

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            use std::io::Read as _;
            // Best effort: the exit status below is what decides success.
            let _ = pipe.read_to_string(&mut stderr);
        }
        let status = self.child.wait().map_err(|e| {
            VideoError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !status.success() {
            return Err(VideoError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        tracing::debug!(frames = self.frames, "ffmpeg finished");
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            tracing::warn!("ffmpeg sink dropped without finish(); output may be incomplete");
            let _ = self.child.wait();
        }
    }
}

/// Write one framebuffer as an RGBA PNG
pub fn write_png(path: &Path, frame: &Framebuffer) -> VideoResult<()> {
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        frame.as_rgba_bytes(),
        frame.width() as u32,
        frame.height() as u32,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )?;
    Ok(())
}

/// `frame_00000.png`, `frame_00001.png`, ... in one directory
pub struct PngSequence {
    dir: PathBuf,
    next: u32,
}

impl PngSequence {
    pub fn new(dir: impl Into<PathBuf>) -> VideoResult<Self> {
        let dir = dir.into();
        use anyhow::Context as _;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
        Ok(Self { dir, next: 0 })
    }

    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for PngSequence {
    fn push(&mut self, frame: &Framebuffer) -> VideoResult<()> {
        write_png(&self.frame_path(self.next), frame)?;
        self.next += 1;
        Ok(())
    }

    fn finish(&mut self) -> VideoResult<()> {
        tracing::debug!(dir = %self.dir.display(), frames = self.next, "png sequence written");
        Ok(())
    }
}
