/// Triangle rasterizer: model -> projection -> perspective divide -> pixels
use crate::color::Color;
use crate::framebuffer::Framebuffer;
use crate::geometry::Mesh;
use crate::math::{Mat4, Vec3, Vec4};
use crate::projection::{ndc_to_screen, Perspective, ScreenPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterMode {
    #[default]
    Filled,
    Wireframe,
}

impl RasterMode {
    pub fn toggled(self) -> Self {
        match self {
            RasterMode::Filled => RasterMode::Wireframe,
            RasterMode::Wireframe => RasterMode::Filled,
        }
    }
}

/// What happened to one submitted triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleOutcome {
    /// Front-facing; rasterized (it may still have covered no pixel)
    Drawn,
    /// Back-facing after projection; nothing written
    Culled,
}

/// Per-call counters returned by [`Renderer::render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub drawn: usize,
    pub culled: usize,
}

impl RenderStats {
    pub fn submitted(&self) -> usize {
        self.drawn + self.culled
    }

    fn record(&mut self, outcome: TriangleOutcome) {
        match outcome {
            TriangleOutcome::Drawn => self.drawn += 1,
            TriangleOutcome::Culled => self.culled += 1,
        }
    }
}

/// Software rasterizer holding a fixed projection matrix.
///
/// Stateless between calls; the framebuffer is borrowed for one call only.
/// Geometry crossing the near plane is not clipped and projects incorrectly.
#[derive(Debug, Clone)]
pub struct Renderer {
    projection: Mat4,
}

impl Renderer {
    pub fn new(lens: Perspective) -> Self {
        Self {
            projection: lens.matrix(),
        }
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Draw every face of `mesh` in stored order.
    ///
    /// Order only matters for equal-depth ties, where the earlier face wins.
    pub fn render(
        &self,
        mesh: &Mesh,
        model: &Mat4,
        framebuffer: &mut Framebuffer,
        mode: RasterMode,
    ) -> RenderStats {
        let mvp = self.projection * *model;
        let mut stats = RenderStats::default();
        for (v0, v1, v2, color) in mesh.triangles() {
            stats.record(self.draw_triangle(framebuffer, v0, v1, v2, &mvp, color, mode));
        }
        tracing::debug!(drawn = stats.drawn, culled = stats.culled, ?mode, "rendered mesh");
        stats
    }

    /// Transform, cull and rasterize one triangle with the combined
    /// projection x model matrix `mvp`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_triangle(
        &self,
        framebuffer: &mut Framebuffer,
        v0: Vec3,
        v1: Vec3,
        v2: Vec3,
        mvp: &Mat4,
        color: Color,
        mode: RasterMode,
    ) -> TriangleOutcome {
        let [ndc0, ndc1, ndc2] = [v0, v1, v2].map(|v| (*mvp * Vec4::from_point(v)).to_vec3());

        // Counter-clockwise on screen (y up) is front-facing.
        let e1 = ndc1 - ndc0;
        let e2 = ndc2 - ndc0;
        if e1.x * e2.y - e1.y * e2.x < 0.0 {
            return TriangleOutcome::Culled;
        }

        let (w, h) = (framebuffer.width(), framebuffer.height());
        let [p0, p1, p2] = [ndc0, ndc1, ndc2].map(|ndc| ndc_to_screen(ndc, w, h));
        match mode {
            RasterMode::Filled => fill_triangle(framebuffer, p0, p1, p2, color),
            RasterMode::Wireframe => {
                draw_line(framebuffer, p0, p1, color);
                draw_line(framebuffer, p1, p2, color);
                draw_line(framebuffer, p2, p0, color);
            }
        }
        TriangleOutcome::Drawn
    }
}

/// Bresenham line with depth interpolated by progress along the line.
/// Only the part of the segment inside the framebuffer is walked; depth
/// progress is still measured from the unclipped endpoints.
fn draw_line(framebuffer: &mut Framebuffer, a: ScreenPoint, b: ScreenPoint, color: Color) {
    let (w, h) = (framebuffer.width() as i64, framebuffer.height() as i64);
    let (x_start, y_start) = (a.x as i64, a.y as i64);
    let (x_end, y_end) = (b.x as i64, b.y as i64);
    let Some(((x0, y0), (x1, y1))) = clip_segment((x_start, y_start), (x_end, y_end), w, h) else {
        return;
    };

    let total = (x_end - x_start).abs() + (y_end - y_start).abs();
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let (mut x, mut y) = (x0, y0);
    let mut err = dx - dy;
    loop {
        let t = if total == 0 {
            0.5
        } else {
            let walked = (x - x_start).abs() + (y - y_start).abs();
            (walked as f64 / total as f64).min(1.0) as f32
        };
        let depth = a.depth + t * (b.depth - a.depth);
        framebuffer.set_pixel(x as i32, y as i32, depth, color);

        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Liang-Barsky clip of `a -> b` against `[0, w) x [0, h)`.
/// Returns the visible sub-segment, or `None` when nothing of it is on screen.
fn clip_segment(
    a: (i64, i64),
    b: (i64, i64),
    w: i64,
    h: i64,
) -> Option<((i64, i64), (i64, i64))> {
    if w <= 0 || h <= 0 {
        return None;
    }
    let (ax, ay) = (a.0 as f64, a.1 as f64);
    let (dx, dy) = (b.0 as f64 - ax, b.1 as f64 - ay);
    let (x_max, y_max) = ((w - 1) as f64, (h - 1) as f64);

    let mut t_in = 0.0f64;
    let mut t_out = 1.0f64;
    for (p, q) in [(-dx, ax), (dx, x_max - ax), (-dy, ay), (dy, y_max - ay)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t_in = t_in.max(r);
        } else {
            t_out = t_out.min(r);
        }
        if t_in > t_out {
            return None;
        }
    }

    let at = |t: f64| {
        let x = (ax + t * dx).round().clamp(0.0, x_max) as i64;
        let y = (ay + t * dy).round().clamp(0.0, y_max) as i64;
        (x, y)
    };
    // Keep untouched endpoints exact.
    let start = if t_in == 0.0 { a } else { at(t_in) };
    let end = if t_out == 1.0 { b } else { at(t_out) };
    Some((start, end))
}

/// Bounding-box scan with edge functions; accepts either winding
fn fill_triangle(
    framebuffer: &mut Framebuffer,
    p0: ScreenPoint,
    p1: ScreenPoint,
    p2: ScreenPoint,
    color: Color,
) {
    let max_x = framebuffer.width() as i32 - 1;
    let max_y = framebuffer.height() as i32 - 1;
    let x_lo = p0.x.min(p1.x).min(p2.x).max(0);
    let x_hi = p0.x.max(p1.x).max(p2.x).min(max_x);
    let y_lo = p0.y.min(p1.y).min(p2.y).max(0);
    let y_hi = p0.y.max(p1.y).max(p2.y).min(max_y);

    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            let w0 = edge(p0, p1, x, y);
            let w1 = edge(p1, p2, x, y);
            let w2 = edge(p2, p0, x, y);

            let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0)
                || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
            if !inside {
                continue;
            }
            let area = w0 + w1 + w2;
            if area == 0.0 {
                continue;
            }
            // Each edge value weights the vertex opposite to it.
            let depth = (p2.depth as f64 * w0 + p0.depth as f64 * w1 + p1.depth as f64 * w2) / area;
            framebuffer.set_pixel(x, y, depth as f32, color);
        }
    }
}

/// Signed area term of pixel `(x, y)` against edge `a -> b`.
/// Evaluated in f64 so unclipped, far off-screen vertices cannot overflow.
#[inline]
fn edge(a: ScreenPoint, b: ScreenPoint, x: i32, y: i32) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    (b.x as f64 - ax) * (y as f64 - ay) - (b.y as f64 - ay) * (x as f64 - ax)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Color = Color::rgb(20, 20, 30);
    const RED: Color = Color::rgb(255, 0, 0);
    const GREEN: Color = Color::rgb(0, 255, 0);

    fn setup(size: usize) -> (Renderer, Framebuffer) {
        let lens = Perspective::new(size, size).with_fov_degrees(90.0);
        let mut fb = Framebuffer::new(size, size);
        fb.clear(BG);
        (Renderer::new(lens), fb)
    }

    fn painted(fb: &Framebuffer) -> usize {
        fb.pixels().iter().filter(|&&c| c != BG).count()
    }

    const FRONT: [Vec3; 3] = [
        Vec3::new(-1.0, -1.0, -5.0),
        Vec3::new(1.0, -1.0, -5.0),
        Vec3::new(0.0, 1.0, -5.0),
    ];

    #[test]
    fn test_reversed_winding_is_culled() {
        let (renderer, mut fb) = setup(100);
        let mvp = *renderer.projection();
        let [a, b, c] = FRONT;

        let outcome = renderer.draw_triangle(&mut fb, a, c, b, &mvp, RED, RasterMode::Filled);
        assert_eq!(outcome, TriangleOutcome::Culled);
        assert_eq!(painted(&fb), 0);

        let outcome = renderer.draw_triangle(&mut fb, a, b, c, &mvp, RED, RasterMode::Filled);
        assert_eq!(outcome, TriangleOutcome::Drawn);
        assert!(painted(&fb) > 0);
    }

    #[test]
    fn test_wireframe_paints_only_edges() {
        let (renderer, mut fb) = setup(100);
        let mvp = *renderer.projection();
        let [a, b, c] = FRONT;
        renderer.draw_triangle(&mut fb, a, b, c, &mvp, RED, RasterMode::Wireframe);

        // Screen footprint is roughly (40,60) (60,60) (50,40).
        assert_eq!(fb.pixel(50, 53), Some(BG));
        assert!((57..63).any(|y| fb.pixel(50, y) == Some(RED)));
        let mut filled_fb = Framebuffer::new(100, 100);
        filled_fb.clear(BG);
        renderer.draw_triangle(&mut filled_fb, a, b, c, &mvp, RED, RasterMode::Filled);
        assert!(painted(&fb) < painted(&filled_fb));
    }

    #[test]
    fn test_line_depth_runs_from_start_to_end() {
        let mut fb = Framebuffer::new(16, 4);
        let a = ScreenPoint { x: 0, y: 1, depth: -0.5 };
        let b = ScreenPoint { x: 10, y: 1, depth: 0.5 };
        draw_line(&mut fb, a, b, RED);
        assert_eq!(fb.depth(0, 1), Some(-0.5));
        assert!((fb.depth(10, 1).unwrap() - 0.5).abs() < 1e-6);
        assert!((fb.depth(5, 1).unwrap() - 0.0).abs() < 1e-6);
        assert_eq!(fb.pixel(11, 1), Some(Color::BLACK));
    }

    #[test]
    fn test_single_point_line() {
        let mut fb = Framebuffer::new(4, 4);
        let p = ScreenPoint { x: 2, y: 2, depth: 0.0 };
        let q = ScreenPoint { depth: 0.4, ..p };
        draw_line(&mut fb, p, q, RED);
        assert!((fb.depth(2, 2).unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_offscreen_line_is_skipped() {
        let mut fb = Framebuffer::new(4, 4);
        let a = ScreenPoint { x: -100, y: -5, depth: 0.0 };
        let b = ScreenPoint { x: -1, y: 900, depth: 0.0 };
        draw_line(&mut fb, a, b, RED);
        assert!(fb.pixels().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn test_clip_keeps_visible_span_only() {
        // Fully inside: untouched.
        assert_eq!(clip_segment((1, 2), (8, 5), 10, 10), Some(((1, 2), (8, 5))));

        // Far end saturated by the screen mapping.
        let (start, end) = clip_segment((50, 50), (i32::MAX as i64, 50), 100, 100).unwrap();
        assert_eq!(start, (50, 50));
        assert_eq!(end, (99, 50));

        // Crosses the frame diagonally from outside to outside.
        let (start, end) = clip_segment((-10, -10), (110, 110), 100, 100).unwrap();
        assert_eq!(start, (0, 0));
        assert_eq!(end, (99, 99));

        assert_eq!(clip_segment((-5, 3), (-1, 3), 10, 10), None);
        assert_eq!(clip_segment((0, 0), (1, 1), 0, 10), None);
    }

    #[test]
    fn test_clipped_line_keeps_depth_progress() {
        let mut fb = Framebuffer::new(10, 4);
        let a = ScreenPoint { x: -10, y: 1, depth: 0.0 };
        let b = ScreenPoint { x: 10, y: 1, depth: 1.0 };
        draw_line(&mut fb, a, b, RED);
        // Column 0 is halfway along the unclipped line.
        assert!((fb.depth(0, 1).unwrap() - 0.5).abs() < 1e-6);
        assert!((fb.depth(9, 1).unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_wireframe_near_camera_plane_stays_bounded() {
        let (renderer, mut fb) = setup(100);
        let mvp = *renderer.projection();
        let a = Vec3::new(0.0, 0.0, -5.0);
        let b = Vec3::new(1.0, 0.0, -5.0);
        // Projects to a saturated x coordinate far off screen.
        let c = Vec3::new(0.5, 1e-4, -1e-9);

        let started = std::time::Instant::now();
        let outcome = renderer.draw_triangle(&mut fb, a, b, c, &mvp, RED, RasterMode::Wireframe);
        assert_eq!(outcome, TriangleOutcome::Drawn);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(fb.pixel(55, 50), Some(RED));
    }

    #[test]
    fn test_degenerate_triangle_writes_nothing() {
        let mut fb = Framebuffer::new(10, 10);
        let p = |x, y| ScreenPoint { x, y, depth: 0.0 };
        fill_triangle(&mut fb, p(1, 1), p(5, 5), p(8, 8), RED);
        fill_triangle(&mut fb, p(3, 3), p(3, 3), p(3, 3), RED);
        assert!(fb.pixels().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn test_nearer_triangle_wins_regardless_of_order() {
        let near = Mat4::translation(0.0, 0.0, 1.0);
        for near_first in [true, false] {
            let (renderer, mut fb) = setup(64);
            let proj = *renderer.projection();
            let [a, b, c] = FRONT;
            let mut draws = vec![(proj, GREEN), (proj * near, RED)];
            if near_first {
                draws.reverse();
            }
            for (mvp, color) in draws {
                renderer.draw_triangle(&mut fb, a, b, c, &mvp, color, RasterMode::Filled);
            }
            assert_eq!(fb.pixel(32, 34), Some(RED));
        }
    }

    #[test]
    fn test_render_counts_every_face() {
        let (renderer, mut fb) = setup(64);
        let mesh = Mesh::cube(2.0);
        let model = Mat4::translation(0.0, 0.0, -8.0) * Mat4::rotation_y(0.5);
        let stats = renderer.render(&mesh, &model, &mut fb, RasterMode::Wireframe);
        assert_eq!(stats.submitted(), 12);
        assert!(stats.drawn > 0 && stats.culled > 0);
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(RasterMode::default(), RasterMode::Filled);
        assert_eq!(RasterMode::Filled.toggled(), RasterMode::Wireframe);
        assert_eq!(RasterMode::Wireframe.toggled(), RasterMode::Filled);
    }
}
