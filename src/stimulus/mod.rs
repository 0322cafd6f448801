//! Background stimulus sequencer.
//!
//! Every game paints this backdrop once per frame before its own sprites. The
//! output is a pure function of `(width, height, frame, tier)`: the frame
//! number picks a window of the 30 second [`schedule::CYCLE`], the tier picks
//! stripe size and flicker rate, and the window's [`Pattern`] is drawn.
//! Nothing is stored between calls, so replaying a frame number reproduces the
//! same image and a session can be reproduced exactly.

pub mod acuity;
pub mod patterns;
pub mod schedule;

pub use acuity::{AcuityTier, StimulusParams};
pub use schedule::{ColorPair, CycleWindow, Pattern, RotatedKind, window_at};

use crate::surface::Surface;

/// Nominal animation rate the schedule and flicker periods are defined at.
pub const FPS: u64 = 60;
pub const CYCLE_SECONDS: u64 = 30;
pub const CYCLE_FRAMES: u64 = CYCLE_SECONDS * FPS;

/// Everything needed to paint one backdrop frame (the Moore machine output).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub pattern: Pattern,
    pub colors: ColorPair,
    pub params: StimulusParams,
    /// `floor(frame / flash_period)`.
    pub step: u64,
    /// Rotation in radians, measured from the start of the current cycle so
    /// frames one cycle apart draw identically. Only read by rotated patterns.
    pub angle: f64,
    pub width: f64,
    pub height: f64,
}

impl DrawCommand {
    pub fn plan(width: f64, height: f64, frame: u64, tier: AcuityTier) -> Self {
        let params = StimulusParams::resolve(tier, width, height);
        let window = window_at(frame);
        Self {
            pattern: window.pattern,
            colors: window.colors,
            params,
            step: params.flash_step(frame),
            angle: (frame % CYCLE_FRAMES) as f64 * params.rotation_speed,
            width,
            height,
        }
    }

    pub fn draw<S: Surface + ?Sized>(&self, s: &mut S) {
        let (w, h) = (self.width, self.height);
        let stripe = self.params.stripe_size;
        match self.pattern {
            Pattern::Grating => patterns::scrolling_grating(s, w, h, stripe, self.step, self.colors),
            Pattern::Checkerboard => {
                patterns::flipping_checkerboard(s, w, h, stripe, self.step, self.colors)
            }
            Pattern::Flash => patterns::alternating_flash(s, w, h, self.step, self.colors),
            Pattern::Rotated(kind) => {
                patterns::rotated_pattern(s, w, h, stripe, self.step, self.angle, kind, self.colors)
            }
        }
    }
}

/// Paint the stimulation backdrop for `frame` onto `surface`.
///
/// `width`/`height` are logical pixels (after any device-pixel-ratio scale the
/// caller already applied to the surface transform).
pub fn render_background<S: Surface + ?Sized>(
    surface: &mut S,
    width: f64,
    height: f64,
    frame: u64,
    tier: AcuityTier,
) {
    DrawCommand::plan(width, height, frame, tier).draw(surface);
}
