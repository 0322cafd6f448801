// Stimulation cycle definition: ten contiguous windows covering 30 seconds.
use crate::surface::Rgb;

use super::{CYCLE_FRAMES, FPS};

/// Foreground/background pair a window draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorPair {
    pub primary: Rgb,
    pub secondary: Rgb,
}

pub const BLACK_WHITE: ColorPair = ColorPair { primary: Rgb::BLACK, secondary: Rgb::WHITE };
pub const RED_YELLOW: ColorPair = ColorPair { primary: Rgb::RED, secondary: Rgb::YELLOW };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotatedKind {
    Stripes,
    Checker,
}

/// Drawing mode bound to a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    Grating,
    Checkerboard,
    Flash,
    Rotated(RotatedKind),
}

/// `[start_s, end_s)` slice of the cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleWindow {
    pub start_s: u32,
    pub end_s: u32,
    pub pattern: Pattern,
    pub colors: ColorPair,
}

impl CycleWindow {
    pub fn duration_s(&self) -> u32 {
        self.end_s - self.start_s
    }

    pub fn contains_frame(&self, cycle_frame: u64) -> bool {
        let start = self.start_s as u64 * FPS;
        let end = self.end_s as u64 * FPS;
        (start..end).contains(&cycle_frame)
    }
}

const fn window(start_s: u32, end_s: u32, pattern: Pattern, colors: ColorPair) -> CycleWindow {
    CycleWindow { start_s, end_s, pattern, colors }
}

pub static CYCLE: [CycleWindow; 10] = [
    window(0, 4, Pattern::Grating, BLACK_WHITE),
    window(4, 8, Pattern::Grating, RED_YELLOW),
    window(8, 12, Pattern::Checkerboard, BLACK_WHITE),
    window(12, 16, Pattern::Checkerboard, RED_YELLOW),
    window(16, 19, Pattern::Flash, BLACK_WHITE),
    window(19, 22, Pattern::Flash, RED_YELLOW),
    window(22, 24, Pattern::Rotated(RotatedKind::Stripes), BLACK_WHITE),
    window(24, 26, Pattern::Rotated(RotatedKind::Stripes), RED_YELLOW),
    window(26, 28, Pattern::Rotated(RotatedKind::Checker), BLACK_WHITE),
    window(28, 30, Pattern::Rotated(RotatedKind::Checker), RED_YELLOW),
];

/// Seconds into the current cycle, `[0, 30)`.
pub fn time_in_cycle(frame: u64) -> f64 {
    (frame % CYCLE_FRAMES) as f64 / FPS as f64
}

/// The window active at `frame`. Pure function of `frame mod CYCLE_FRAMES`.
pub fn window_at(frame: u64) -> &'static CycleWindow {
    let cycle_frame = frame % CYCLE_FRAMES;
    CYCLE
        .iter()
        .find(|w| w.contains_frame(cycle_frame))
        // Unreachable while CYCLE covers [0, 30); the last window is the closest match.
        .unwrap_or(&CYCLE[CYCLE.len() - 1])
}
