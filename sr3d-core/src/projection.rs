/// Perspective lens and the NDC-to-pixel mapping
use crate::math::{Mat4, Vec3};

/// Perspective projection parameters.
///
/// The camera sits at the origin looking down -z; model matrices place geometry
/// in front of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Perspective {
    pub const DEFAULT_FOV_DEGREES: f32 = 60.0;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 100.0;

    /// 60 degree lens matching a `width` x `height` viewport
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            fov: Self::DEFAULT_FOV_DEGREES.to_radians(),
            aspect: width as f32 / height as f32,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
        }
    }

    pub fn with_fov_degrees(mut self, degrees: f32) -> Self {
        self.fov = degrees.to_radians();
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }
}

impl Default for Perspective {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// A projected vertex in pixel space; `depth` is the NDC z, unchanged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
    pub depth: f32,
}

/// Map NDC to pixels. Rows grow downward, so NDC y is flipped; coordinates are
/// truncated toward zero.
pub fn ndc_to_screen(ndc: Vec3, width: usize, height: usize) -> ScreenPoint {
    ScreenPoint {
        x: ((ndc.x + 1.0) * 0.5 * width as f32) as i32,
        y: ((1.0 - ndc.y) * 0.5 * height as f32) as i32,
        depth: ndc.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_creation() {
        let lens = Perspective::new(800, 600);
        assert!((lens.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((lens.fov - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        assert_eq!(lens.near, 0.1);
        assert_eq!(lens.far, 100.0);
    }

    #[test]
    fn test_matrix_uses_lens_parameters() {
        let lens = Perspective::new(100, 100).with_fov_degrees(90.0);
        let m = lens.matrix();
        assert!((m.m[0][0] - 1.0).abs() < 1e-6);
        assert!((m.m[1][1] - 1.0).abs() < 1e-6);
        assert_eq!(m.m[3][2], -1.0);
        assert_eq!(m.m[3][3], 0.0);
    }

    #[test]
    fn test_ndc_corners_map_to_pixel_corners() {
        let top_left = ndc_to_screen(Vec3::new(-1.0, 1.0, 0.25), 200, 100);
        assert_eq!((top_left.x, top_left.y), (0, 0));
        assert_eq!(top_left.depth, 0.25);

        let bottom_right = ndc_to_screen(Vec3::new(1.0, -1.0, 0.0), 200, 100);
        assert_eq!((bottom_right.x, bottom_right.y), (200, 100));

        let center = ndc_to_screen(Vec3::new(0.0, 0.0, 0.0), 200, 100);
        assert_eq!((center.x, center.y), (100, 50));
    }
}
