use std::path::PathBuf;

use sr3d_core::{stl, Color, Mesh, Perspective, PhoneSpec, RasterMode, Spin};

use crate::error::{VideoError, VideoResult};

pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_DURATION_SECS: u32 = 5;
pub const DEFAULT_BACKGROUND: Color = Color::rgb(20, 20, 30);

/// Which solid the video shows
#[derive(Clone, Debug, PartialEq)]
pub enum MeshSource {
    Cube,
    Phone,
    Stl(PathBuf),
}

impl MeshSource {
    pub fn load(&self) -> VideoResult<Mesh> {
        match self {
            MeshSource::Cube => Ok(Mesh::cube(2.0)),
            MeshSource::Phone => Ok(Mesh::phone(&PhoneSpec::default())),
            MeshSource::Stl(path) => {
                use anyhow::Context as _;
                let data = std::fs::read(path)
                    .with_context(|| format!("failed to read STL file '{}'", path.display()))?;
                let mesh = stl::parse_stl(&data, stl::DEFAULT_STL_COLOR)?;
                tracing::info!(path = %path.display(), triangles = mesh.triangle_count(), "loaded STL");
                Ok(mesh)
            }
        }
    }
}

/// Everything the frame loop needs besides the mesh
#[derive(Clone, Debug)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_secs: u32,
    pub fov_degrees: f32,
    pub mode: RasterMode,
    pub background: Color,
    pub spin: Spin,
}

impl VideoConfig {
    pub fn validate(&self) -> VideoResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VideoError::validation("width/height must be non-zero"));
        }
        if self.fps == 0 {
            return Err(VideoError::validation("fps must be non-zero"));
        }
        if self.duration_secs == 0 {
            return Err(VideoError::validation("duration must be non-zero"));
        }
        if self.fps.checked_mul(self.duration_secs).is_none() {
            return Err(VideoError::validation(format!(
                "{} fps for {} seconds is too many frames",
                self.fps, self.duration_secs
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(VideoError::validation(format!(
                "field of view must be between 0 and 180 degrees, got {}",
                self.fov_degrees
            )));
        }
        Ok(())
    }

    /// Saturates for configs that `validate` rejects
    pub fn total_frames(&self) -> u32 {
        self.fps.saturating_mul(self.duration_secs)
    }

    pub fn lens(&self) -> Perspective {
        Perspective::new(self.width as usize, self.height as usize)
            .with_fov_degrees(self.fov_degrees)
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            duration_secs: DEFAULT_DURATION_SECS,
            fov_degrees: Perspective::DEFAULT_FOV_DEGREES,
            mode: RasterMode::Filled,
            background: DEFAULT_BACKGROUND,
            spin: Spin::default(),
        }
    }
}
