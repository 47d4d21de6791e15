use crate::core::RenderFrame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

pub const BLACK: Color = Color(0, 0, 0, 255);
pub const WHITE: Color = Color(255, 255, 255, 255);
pub const RED: Color = Color(220, 20, 60, 255);
pub const GREEN: Color = Color(0, 200, 0, 255);
pub const BLUE: Color = Color(0, 120, 255, 255);
pub const DARK_GRAY: Color = Color(90, 90, 90, 255);
pub const ICE_BLUE: Color = Color(200, 230, 255, 255);
pub const SAND: Color = Color(194, 178, 128, 255);

impl Color {
    /// ITU-R BT.601 luma.
    pub fn luma(self) -> u8 {
        let y = 0.299 * self.0 as f32 + 0.587 * self.1 as f32 + 0.114 * self.2 as f32;
        y.round().clamp(0.0, 255.0) as u8
    }
}

/// A minimal RGBA software canvas; this is the rendering surface of the
/// driving environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>, // RGBA
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        };
        canvas.clear(BLACK);
        canvas
    }

    pub fn clear(&mut self, color: Color) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.0, color.1, color.2, color.3]);
        }
    }

    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 { return; }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height { return; }
        let idx = ((y * self.width + x) as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&[color.0, color.1, color.2, color.3]);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height { return None; }
        let idx = ((y * self.width + x) as usize) * 4;
        let p = &self.pixels[idx..idx + 4];
        Some(Color(p[0], p[1], p[2], p[3]))
    }

    /// Draw a filled rectangle with top-left (x, y), width w, height h.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        if w <= 0 || h <= 0 { return; }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        for yy in y0..y1 {
            for xx in x0..x1 {
                self.put_pixel(xx, yy, color);
            }
        }
    }

    /// Integer Bresenham line.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let mut x0 = x0;
        let mut y0 = y0;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x0 += sx; }
            if e2 <= dx { err += dx; y0 += sy; }
        }
    }

    /// Fill a convex polygon given in screen coordinates (scanline, even-odd).
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) {
        if points.len() < 3 { return; }
        let y_min = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min).floor().max(0.0) as i32;
        let y_max = points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max).ceil().min(self.height as f32) as i32;
        let mut crossings = Vec::with_capacity(points.len());
        for y in y_min..y_max {
            let yc = y as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (ax, ay) = points[i];
                let (bx, by) = points[(i + 1) % points.len()];
                if (ay <= yc && by > yc) || (by <= yc && ay > yc) {
                    crossings.push(ax + (yc - ay) / (by - ay) * (bx - ax));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let xs = pair[0].round() as i32;
                let xe = pair[1].round() as i32;
                for x in xs..xe {
                    self.put_pixel(x, y, color);
                }
            }
        }
    }

    /// Closed outline through the given points.
    pub fn draw_polygon(&mut self, points: &[(f32, f32)], color: Color) {
        for i in 0..points.len() {
            let (ax, ay) = points[i];
            let (bx, by) = points[(i + 1) % points.len()];
            self.draw_line(ax.round() as i32, ay.round() as i32, bx.round() as i32, by.round() as i32, color);
        }
    }

    /// Row-major single-channel copy of the canvas.
    pub fn to_grayscale(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(4)
            .map(|p| Color(p[0], p[1], p[2], p[3]).luma())
            .collect()
    }

    pub fn to_render_frame(&self) -> RenderFrame {
        RenderFrame::Pixels { width: self.width, height: self.height, data: self.pixels.clone() }
    }
}
