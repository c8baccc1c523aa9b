/// Color plane plus depth plane with a depth-tested write
use crate::color::Color;

/// Depth value every cell is reset to by [`Framebuffer::clear`]
pub const FAR_DEPTH: f32 = 1.0;

/// Rendering target: a row-major color plane and a same-shape depth plane.
///
/// Depth values are NDC z, nominally in `[-1, 1]`; nothing clamps them.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            pixels: vec![Color::BLACK; size],
            depth: vec![FAR_DEPTH; size],
        }
    }

    /// Fill the color plane with `color` and reset every depth cell to [`FAR_DEPTH`]
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
        self.depth.fill(FAR_DEPTH);
    }

    /// Depth-tested write.
    ///
    /// Out-of-bounds coordinates are ignored. The pixel is replaced only when
    /// `depth` is strictly less than the stored depth, so on ties the earlier
    /// write wins.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, depth: f32, color: Color) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.pixels[idx] = color;
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw color plane, row-major
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Raw depth plane, row-major
    pub fn depths(&self) -> &[f32] {
        &self.depth
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|idx| self.pixels[idx])
    }

    pub fn depth(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|idx| self.depth[idx])
    }

    /// The color plane as `width * height * 4` bytes in RGBA order
    pub fn as_rgba_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}
