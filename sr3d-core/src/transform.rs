/// Rotation state and the per-frame model matrix
use std::f32::consts::TAU;

use crate::math::{Mat4, Vec3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// `Rz * Ry * Rx`: the object spins about its own X axis first
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::rotation_z(self.z) * Mat4::rotation_y(self.y) * Mat4::rotation_x(self.x)
    }

    /// Rotate first, then move into camera space
    pub fn model_matrix(&self, translation: Vec3) -> Mat4 {
        Mat4::translation(translation.x, translation.y, translation.z) * self.rotation_matrix()
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Turns-per-loop for each axis plus where the object sits in camera space.
///
/// A full animation loop (`progress` 0 to 1) sweeps an angle of 2π, scaled
/// per axis by the rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub rates: Vec3,
    pub translation: Vec3,
}

impl Spin {
    pub fn new(rates: Vec3, translation: Vec3) -> Self {
        Self { rates, translation }
    }

    pub fn rotation_at(&self, progress: f32) -> RotationState {
        let angle = progress * TAU;
        RotationState::new(
            angle * self.rates.x,
            angle * self.rates.y,
            angle * self.rates.z,
        )
    }

    /// `Translation * Rz * Ry * Rx` for `progress` in `[0, 1)`
    pub fn model_matrix(&self, progress: f32) -> Mat4 {
        self.rotation_at(progress).model_matrix(self.translation)
    }
}

impl Default for Spin {
    fn default() -> Self {
        Self::new(Vec3::new(0.7, 1.0, 0.3), Vec3::new(0.0, 0.0, -8.0))
    }
}

/// Fraction of the loop covered by `frame`; `0.0` when there are no frames
pub fn frame_progress(frame: u32, total_frames: u32) -> f32 {
    if total_frames == 0 {
        return 0.0;
    }
    frame as f32 / total_frames as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_close(a: &Mat4, b: &Mat4) {
        for (ra, rb) in a.m.iter().zip(&b.m) {
            for (x, y) in ra.iter().zip(rb) {
                assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
            }
        }
    }

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = RotationState::zero().rotation_matrix();
        assert_mat_close(&matrix, &Mat4::identity());
    }

    #[test]
    fn test_model_matrix_order() {
        let spin = Spin::default();
        let progress = 0.37;
        let angle = progress * TAU;
        let expected = Mat4::translation(0.0, 0.0, -8.0)
            * Mat4::rotation_z(angle * 0.3)
            * Mat4::rotation_y(angle)
            * Mat4::rotation_x(angle * 0.7);
        assert_mat_close(&spin.model_matrix(progress), &expected);

        // Any other order gives a different tumble.
        let reordered = Mat4::translation(0.0, 0.0, -8.0)
            * Mat4::rotation_x(angle * 0.7)
            * Mat4::rotation_y(angle)
            * Mat4::rotation_z(angle * 0.3);
        assert!(reordered
            .m
            .iter()
            .flatten()
            .zip(expected.m.iter().flatten())
            .any(|(a, b)| (a - b).abs() > 1e-3));
    }

    #[test]
    fn test_start_of_loop_only_translates() {
        let m = Spin::default().model_matrix(0.0);
        assert_mat_close(&m, &Mat4::translation(0.0, 0.0, -8.0));
    }

    #[test]
    fn test_frame_progress() {
        assert_eq!(frame_progress(0, 150), 0.0);
        assert!((frame_progress(75, 150) - 0.5).abs() < 1e-6);
        assert!(frame_progress(149, 150) < 1.0);
        assert_eq!(frame_progress(3, 0), 0.0);
    }
}
