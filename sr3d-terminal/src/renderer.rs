/// Half-block presenter: two framebuffer rows per terminal row
use crossterm::{
    cursor,
    style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use sr3d_core::{Color, Framebuffer};
use std::io::Write;

/// Upper half block; foreground paints the top pixel, background the bottom one
pub const HALF_BLOCK: char = '▀';

/// Framebuffer size for a terminal of `cols` x `rows` cells, keeping the last
/// row free for the status line
pub fn framebuffer_size(cols: u16, rows: u16) -> (usize, usize) {
    let usable_rows = rows.saturating_sub(1).max(1) as usize;
    ((cols as usize).max(1), usable_rows * 2)
}

pub fn to_term_color(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// The (upper, lower) pixel pair behind terminal cell `(col, row)`
pub fn cell_colors(framebuffer: &Framebuffer, col: usize, row: usize) -> (Color, Color) {
    let x = col as i32;
    let top = (row * 2) as i32;
    let upper = framebuffer.pixel(x, top).unwrap_or_default();
    let lower = framebuffer.pixel(x, top + 1).unwrap_or_default();
    (upper, lower)
}

/// Writes a framebuffer to the terminal, skipping color escapes that repeat
pub struct HalfBlockPresenter {
    last_fg: Option<Color>,
    last_bg: Option<Color>,
}

impl HalfBlockPresenter {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }

    pub fn draw<W: Write>(&mut self, writer: &mut W, framebuffer: &Framebuffer) -> std::io::Result<()> {
        self.last_fg = None;
        self.last_bg = None;

        let rows = framebuffer.height().div_ceil(2);
        for row in 0..rows {
            writer.queue(cursor::MoveTo(0, row as u16))?;
            for col in 0..framebuffer.width() {
                let (upper, lower) = cell_colors(framebuffer, col, row);
                if self.last_fg != Some(upper) {
                    writer.queue(SetForegroundColor(to_term_color(upper)))?;
                    self.last_fg = Some(upper);
                }
                if self.last_bg != Some(lower) {
                    writer.queue(SetBackgroundColor(to_term_color(lower)))?;
                    self.last_bg = Some(lower);
                }
                writer.queue(Print(HALF_BLOCK))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Default for HalfBlockPresenter {
    fn default() -> Self {
        Self::new()
    }
}
