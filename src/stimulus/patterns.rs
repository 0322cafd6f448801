// Pattern drawing primitives used by the stimulation cycle.
// Each one paints the full region it is given; callers never clear first.
use crate::surface::Surface;

use super::schedule::{ColorPair, RotatedKind};

/// Horizontal shift of the grating after `step` flashes: one stripe width per
/// step, wrapped to one period.
pub fn grating_offset(step: u64, stripe: f64) -> f64 {
    (step as f64 * stripe) % (2.0 * stripe)
}

/// Contrast-reversal state of the checkerboard; `true` puts `primary` on cell (0,0).
pub fn checker_inverted(step: u64) -> bool {
    step % 2 == 0
}

fn drawable(w: f64, h: f64, stripe: f64) -> bool {
    w.is_finite() && h.is_finite() && stripe.is_finite() && w > 0.0 && h > 0.0 && stripe > 0.0
}

fn stripes<S: Surface + ?Sized>(s: &mut S, x0: f64, y0: f64, w: f64, h: f64, stripe: f64, offset: f64) {
    let period = 2.0 * stripe;
    let mut x = x0 + offset - period;
    while x < x0 + w {
        s.fill_rect(x, y0, stripe, h);
        x += period;
    }
}

#[allow(clippy::too_many_arguments)]
fn checker_cells<S: Surface + ?Sized>(
    s: &mut S,
    x0: f64,
    y0: f64,
    w: f64,
    h: f64,
    cell: f64,
    invert: bool,
    colors: ColorPair,
) {
    let cols = (w / cell).ceil() as u64;
    let rows = (h / cell).ceil() as u64;
    for cy in 0..rows {
        for cx in 0..cols {
            let even = (cx + cy) % 2 == 0;
            s.set_fill(if even == invert { colors.primary } else { colors.secondary });
            s.fill_rect(x0 + cx as f64 * cell, y0 + cy as f64 * cell, cell, cell);
        }
    }
}

/// Vertical stripes scrolling one stripe width per flash step.
pub fn scrolling_grating<S: Surface + ?Sized>(
    s: &mut S,
    w: f64,
    h: f64,
    stripe: f64,
    step: u64,
    colors: ColorPair,
) {
    if !drawable(w, h, stripe) {
        return;
    }
    s.set_fill(colors.secondary);
    s.fill_rect(0.0, 0.0, w, h);
    s.set_fill(colors.primary);
    stripes(s, 0.0, 0.0, w, h, stripe, grating_offset(step, stripe));
}

/// Checkerboard whose two colours swap every flash step.
pub fn flipping_checkerboard<S: Surface + ?Sized>(
    s: &mut S,
    w: f64,
    h: f64,
    stripe: f64,
    step: u64,
    colors: ColorPair,
) {
    if !drawable(w, h, stripe) {
        return;
    }
    checker_cells(s, 0.0, 0.0, w, h, stripe, checker_inverted(step), colors);
}

/// Whole-canvas binary flicker.
pub fn alternating_flash<S: Surface + ?Sized>(s: &mut S, w: f64, h: f64, step: u64, colors: ColorPair) {
    if !drawable(w, h, 1.0) {
        return;
    }
    s.set_fill(if step % 2 == 0 { colors.primary } else { colors.secondary });
    s.fill_rect(0.0, 0.0, w, h);
}

/// Stripe or checker field rotated about the canvas centre.
///
/// The field is a square with side equal to the canvas diagonal, centred on
/// the rotation origin. Every canvas pixel lies within half a diagonal of the
/// centre, so the square covers the canvas at any angle.
#[allow(clippy::too_many_arguments)]
pub fn rotated_pattern<S: Surface + ?Sized>(
    s: &mut S,
    w: f64,
    h: f64,
    stripe: f64,
    step: u64,
    angle: f64,
    kind: RotatedKind,
    colors: ColorPair,
) {
    if !drawable(w, h, stripe) || !angle.is_finite() {
        return;
    }
    let diag = w.hypot(h);
    let half = diag / 2.0;
    s.save();
    s.translate(w / 2.0, h / 2.0);
    s.rotate(angle);
    match kind {
        RotatedKind::Stripes => {
            s.set_fill(colors.secondary);
            s.fill_rect(-half, -half, diag, diag);
            s.set_fill(colors.primary);
            stripes(s, -half, -half, diag, diag, stripe, grating_offset(step, stripe));
        }
        RotatedKind::Checker => {
            checker_cells(s, -half, -half, diag, diag, stripe, checker_inverted(step), colors);
        }
    }
    s.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::schedule::{BLACK_WHITE, RED_YELLOW};
    use crate::surface::{PixelSurface, Rgb};

    #[test]
    fn test_grating_offset_wraps() {
        assert_eq!(grating_offset(0, 50.0), 0.0);
        assert_eq!(grating_offset(1, 50.0), 50.0);
        assert_eq!(grating_offset(2, 50.0), 0.0);
        assert_eq!(grating_offset(7, 10.0), 10.0);
    }

    #[test]
    fn test_grating_scrolls_one_stripe_per_step() {
        let mut s = PixelSurface::new(40, 4);
        scrolling_grating(&mut s, 40.0, 4.0, 10.0, 0, BLACK_WHITE);
        assert_eq!(s.unpainted(), 0);
        assert_eq!(s.pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(s.pixel(10, 0), Some(Rgb::WHITE));
        assert_eq!(s.pixel(20, 0), Some(Rgb::BLACK));

        scrolling_grating(&mut s, 40.0, 4.0, 10.0, 1, BLACK_WHITE);
        assert_eq!(s.pixel(0, 0), Some(Rgb::WHITE));
        assert_eq!(s.pixel(10, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn test_checkerboard_swaps_each_step() {
        let mut s = PixelSurface::new(20, 20);
        flipping_checkerboard(&mut s, 20.0, 20.0, 10.0, 0, RED_YELLOW);
        assert_eq!(s.pixel(0, 0), Some(Rgb::RED));
        assert_eq!(s.pixel(10, 0), Some(Rgb::YELLOW));
        assert_eq!(s.pixel(10, 10), Some(Rgb::RED));
        flipping_checkerboard(&mut s, 20.0, 20.0, 10.0, 1, RED_YELLOW);
        assert_eq!(s.pixel(0, 0), Some(Rgb::YELLOW));
        assert_eq!(s.pixel(10, 0), Some(Rgb::RED));
    }

    #[test]
    fn test_checkerboard_covers_ragged_edge() {
        let mut s = PixelSurface::new(25, 13);
        flipping_checkerboard(&mut s, 25.0, 13.0, 10.0, 3, BLACK_WHITE);
        assert_eq!(s.unpainted(), 0);
    }

    #[test]
    fn test_flash_alternates() {
        let mut s = PixelSurface::new(3, 3);
        alternating_flash(&mut s, 3.0, 3.0, 4, BLACK_WHITE);
        assert!(s.pixels().iter().all(|p| *p == Some(Rgb::BLACK)));
        alternating_flash(&mut s, 3.0, 3.0, 5, BLACK_WHITE);
        assert!(s.pixels().iter().all(|p| *p == Some(Rgb::WHITE)));
    }

    #[test]
    fn test_rotated_covers_at_awkward_angles() {
        for angle in [0.0, 0.3, std::f64::consts::FRAC_PI_4, 1.0, 2.5, 4.0] {
            for kind in [RotatedKind::Stripes, RotatedKind::Checker] {
                let mut s = PixelSurface::new(64, 24);
                rotated_pattern(&mut s, 64.0, 24.0, 6.0, 1, angle, kind, BLACK_WHITE);
                assert_eq!(s.unpainted(), 0, "angle {angle} {kind:?}");
            }
        }
    }

    #[test]
    fn test_degenerate_sizes_draw_nothing() {
        let mut s = PixelSurface::new(4, 4);
        scrolling_grating(&mut s, 0.0, 4.0, 10.0, 0, BLACK_WHITE);
        flipping_checkerboard(&mut s, -4.0, 4.0, 10.0, 0, BLACK_WHITE);
        alternating_flash(&mut s, 4.0, 0.0, 0, BLACK_WHITE);
        rotated_pattern(&mut s, f64::NAN, 4.0, 10.0, 0, 0.0, RotatedKind::Checker, BLACK_WHITE);
        assert_eq!(s.unpainted(), 16);
    }
}
