//! Drawing seam shared by the stimulus sequencer and the games.
//!
//! Everything that paints goes through [`Surface`], which covers only the few
//! 2D operations the crate needs. The browser implementation is
//! `CanvasRenderingContext2d`; [`PixelSurface`] is a small software rasterizer
//! that samples pixel centres so native code can inspect exactly what a frame
//! painted.

use std::f64::consts::TAU;

use web_sys::CanvasRenderingContext2d;

/// Opaque 24-bit colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const RED: Rgb = Rgb(0xff, 0x00, 0x00);
    pub const YELLOW: Rgb = Rgb(0xff, 0xff, 0x00);

    /// CSS hex form, e.g. `#ff0000`.
    pub fn css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Minimal 2D drawing target.
///
/// Transforms follow canvas semantics: `translate`/`rotate` post-multiply the
/// current matrix, `save`/`restore` push and pop it together with the fill colour.
pub trait Surface {
    fn set_fill(&mut self, color: Rgb);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, size_px: f64);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, radians: f64);
}

impl Surface for CanvasRenderingContext2d {
    fn set_fill(&mut self, color: Rgb) {
        self.set_fill_style_str(&color.css());
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64) {
        if r <= 0.0 {
            return;
        }
        self.begin_path();
        self.arc(cx, cy, r, 0.0, TAU).ok();
        self.fill();
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, size_px: f64) {
        self.set_font(&format!("{}px 'Fira Code', monospace", size_px.round()));
        self.set_text_align("center");
        CanvasRenderingContext2d::fill_text(self, text, x, y).ok();
    }

    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn translate(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::translate(self, x, y).ok();
    }

    fn rotate(&mut self, radians: f64) {
        CanvasRenderingContext2d::rotate(self, radians).ok();
    }
}

// --- Software surface --------------------------------------------------------

/// Canvas-style affine matrix: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    fn invert_point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let (dx, dy) = (x - self.e, y - self.f);
        Some(((self.d * dx - self.c * dy) / det, (self.a * dy - self.b * dx) / det))
    }

    fn translated(&self, tx: f64, ty: f64) -> Affine {
        Affine { e: self.a * tx + self.c * ty + self.e, f: self.b * tx + self.d * ty + self.f, ..*self }
    }

    fn rotated(&self, r: f64) -> Affine {
        let (s, c) = r.sin_cos();
        Affine {
            a: self.a * c + self.c * s,
            b: self.b * c + self.d * s,
            c: self.c * c - self.a * s,
            d: self.d * c - self.b * s,
            ..*self
        }
    }

    /// Largest length a unit vector can reach under the linear part.
    fn max_scale(&self) -> f64 {
        (self.a.hypot(self.b)).max(self.c.hypot(self.d))
    }
}

/// Software raster target. Pixels start out `None` (never painted).
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<Option<Rgb>>,
    fill: Rgb,
    transform: Affine,
    stack: Vec<(Affine, Rgb)>,
    texts: Vec<String>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; width as usize * height as usize],
            fill: Rgb::BLACK,
            transform: Affine::IDENTITY,
            stack: Vec::new(),
            texts: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour at `(x, y)`, `None` if never painted or out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn pixels(&self) -> &[Option<Rgb>] {
        &self.pixels
    }

    /// Number of pixels never painted since creation or the last [`clear`](Self::clear).
    pub fn unpainted(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_none()).count()
    }

    /// Text drawn since the last clear, in draw order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Reset every pixel to unpainted and drop recorded text and transform state.
    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = None);
        self.texts.clear();
        self.transform = Affine::IDENTITY;
        self.stack.clear();
    }

    /// Paint every pixel whose centre maps (through the inverse transform) into
    /// the user-space region accepted by `inside`. `corners` bound that region
    /// and give the device-space box that gets scanned.
    fn paint_where<F>(&mut self, corners: [(f64, f64); 4], inside: F)
    where
        F: Fn(f64, f64) -> bool,
    {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for (x, y) in corners {
            let (dx, dy) = self.transform.apply(x, y);
            min_x = min_x.min(dx);
            min_y = min_y.min(dy);
            max_x = max_x.max(dx);
            max_y = max_y.max(dy);
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return;
        }
        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = (max_x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max_y.ceil().max(0.0) as u32).min(self.height);
        let fill = self.fill;
        for py in y0..y1 {
            for px in x0..x1 {
                let Some((ux, uy)) = self.transform.invert_point(px as f64 + 0.5, py as f64 + 0.5)
                else {
                    return;
                };
                if inside(ux, uy) {
                    self.pixels[py as usize * self.width as usize + px as usize] = Some(fill);
                }
            }
        }
    }
}

impl Surface for PixelSurface {
    fn set_fill(&mut self, color: Rgb) {
        self.fill = color;
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        // Canvas accepts negative extents and paints toward the origin.
        let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
        let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
        if w == 0.0 || h == 0.0 {
            return;
        }
        let corners = [(x, y), (x + w, y), (x, y + h), (x + w, y + h)];
        self.paint_where(corners, |ux, uy| ux >= x && ux < x + w && uy >= y && uy < y + h);
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64) {
        if r <= 0.0 {
            return;
        }
        let reach = r * self.transform.max_scale().max(1.0);
        let corners = [
            (cx - reach, cy - reach),
            (cx + reach, cy - reach),
            (cx - reach, cy + reach),
            (cx + reach, cy + reach),
        ];
        let r2 = r * r;
        self.paint_where(corners, |ux, uy| {
            let (dx, dy) = (ux - cx, uy - cy);
            dx * dx + dy * dy <= r2
        });
    }

    fn fill_text(&mut self, text: &str, _x: f64, _y: f64, _size_px: f64) {
        self.texts.push(text.to_string());
    }

    fn save(&mut self) {
        self.stack.push((self.transform, self.fill));
    }

    fn restore(&mut self) {
        if let Some((transform, fill)) = self.stack.pop() {
            self.transform = transform;
            self.fill = fill;
        }
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.transform = self.transform.translated(x, y);
    }

    fn rotate(&mut self, radians: f64) {
        self.transform = self.transform.rotated(radians);
    }
}
