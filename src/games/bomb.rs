// Bomb defusal: spot the one wire that differs between two panels before the
// fuse burns down.
use log::{debug, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::Settings;
use crate::harness::{CanvasGame, FrameInfo, PointerInput, PointerPhase};
use crate::stimulus::{AcuityTier, render_background};
use crate::surface::{Rgb, Surface};

use super::{GameKind, GamePhase, Palette, START_LIVES, game_rng, scaled_frames};

pub const COLS: usize = 4;
pub const ROWS: usize = 3;
pub const CELLS: usize = COLS * ROWS;
/// Fuse length at speed 1.0.
const FUSE_FRAMES: f64 = 600.0;
/// Fuse burnt by a wrong tap.
pub const WRONG_TAP_PENALTY: u64 = 60;

pub const WIRE_COLORS: [Rgb; 5] = [
    Rgb(0xe5, 0x39, 0x35),
    Rgb(0x1e, 0x88, 0xe5),
    Rgb(0x43, 0xa0, 0x47),
    Rgb(0xfd, 0xd8, 0x35),
    Rgb(0x8e, 0x24, 0xaa),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Panel rectangles for one canvas size: `(x, y, w, h)` per side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelLayout {
    pub left: (f64, f64, f64, f64),
    pub right: (f64, f64, f64, f64),
}

impl PanelLayout {
    pub fn new(width: f64, height: f64) -> Self {
        let pw = width * 0.4;
        let ph = height * 0.5;
        let y = height * 0.25;
        Self { left: (width * 0.06, y, pw, ph), right: (width * 0.54, y, pw, ph) }
    }

    pub fn panel(&self, side: Side) -> (f64, f64, f64, f64) {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Top-left corner and size of `cell` in `side`'s panel.
    pub fn cell_rect(&self, side: Side, cell: usize) -> (f64, f64, f64, f64) {
        let (px, py, pw, ph) = self.panel(side);
        let (cw, ch) = (pw / COLS as f64, ph / ROWS as f64);
        let (col, row) = (cell % COLS, cell / COLS);
        (px + col as f64 * cw, py + row as f64 * ch, cw, ch)
    }

    pub fn cell_at(&self, x: f64, y: f64) -> Option<(Side, usize)> {
        for side in [Side::Left, Side::Right] {
            let (px, py, pw, ph) = self.panel(side);
            if x >= px && x < px + pw && y >= py && y < py + ph {
                let col = (((x - px) / (pw / COLS as f64)) as usize).min(COLS - 1);
                let row = (((y - py) / (ph / ROWS as f64)) as usize).min(ROWS - 1);
                return Some((side, row * COLS + col));
            }
        }
        None
    }
}

pub struct BombGame {
    tier: AcuityTier,
    palette: Palette,
    fuse_frames: u64,
    rng: ChaCha8Rng,
    phase: GamePhase,
    score: u32,
    lives: u32,
    /// Wire colour index per cell of the left panel.
    wires: [usize; CELLS],
    odd_cell: usize,
    odd_color: usize,
    fuse_start: u64,
    fuse_end: u64,
}

impl BombGame {
    pub fn new(settings: &Settings, seed: u64) -> Self {
        let speed = settings.speed(GameKind::Bomb);
        let mut game = Self {
            tier: settings.acuity,
            palette: settings.vision.palette(),
            fuse_frames: scaled_frames(FUSE_FRAMES, speed),
            rng: game_rng(seed),
            phase: GamePhase::Ready,
            score: 0,
            lives: START_LIVES,
            wires: [0; CELLS],
            odd_cell: 0,
            odd_color: 1,
            fuse_start: 0,
            fuse_end: 0,
        };
        game.new_round(0);
        game
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// The cell whose wire differs between the panels.
    pub fn odd_cell(&self) -> usize {
        self.odd_cell
    }

    pub fn fuse_frames(&self) -> u64 {
        self.fuse_frames
    }

    /// Frame at which the current fuse runs out.
    pub fn fuse_end(&self) -> u64 {
        self.fuse_end
    }

    /// Wire colour shown at `cell` on `side`.
    pub fn wire(&self, side: Side, cell: usize) -> Rgb {
        let idx = match side {
            Side::Right if cell == self.odd_cell => self.odd_color,
            _ => self.wires[cell % CELLS],
        };
        WIRE_COLORS[idx]
    }

    fn new_round(&mut self, frame: u64) {
        for w in self.wires.iter_mut() {
            *w = self.rng.random_range(0..WIRE_COLORS.len());
        }
        self.odd_cell = self.rng.random_range(0..CELLS);
        let shift = self.rng.random_range(1..WIRE_COLORS.len());
        self.odd_color = (self.wires[self.odd_cell] + shift) % WIRE_COLORS.len();
        self.fuse_start = frame;
        self.fuse_end = frame + self.fuse_frames;
        debug!("bomb: round at frame {frame}, odd cell {}", self.odd_cell);
    }

    fn start(&mut self, frame: u64) {
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.lives = START_LIVES;
        self.new_round(frame);
        info!("bomb: start at frame {frame}");
    }

    fn update(&mut self, frame: u64) {
        if self.phase != GamePhase::Playing || frame < self.fuse_end {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.phase = GamePhase::Over;
            info!("bomb: over with score {}", self.score);
        } else {
            debug!("bomb: fuse ran out, {} lives left", self.lives);
            self.new_round(frame);
        }
    }

    fn draw(&self, s: &mut dyn Surface, info: &FrameInfo) {
        let layout = PanelLayout::new(info.width, info.height);
        for side in [Side::Left, Side::Right] {
            let (px, py, pw, ph) = layout.panel(side);
            let pad = (pw.min(ph) * 0.03).max(2.0);
            s.set_fill(self.palette.plate);
            s.fill_rect(px - pad, py - pad, pw + 2.0 * pad, ph + 2.0 * pad);
            for cell in 0..CELLS {
                let (cx, cy, cw, ch) = layout.cell_rect(side, cell);
                s.set_fill(self.wire(side, cell));
                s.fill_rect(cx + cw * 0.15, cy + ch * 0.35, cw * 0.7, ch * 0.3);
            }
        }

        // Fuse bar across the bottom.
        if self.phase == GamePhase::Playing {
            let total = (self.fuse_end.saturating_sub(self.fuse_start)).max(1) as f64;
            let left = self.fuse_end.saturating_sub(info.frame) as f64;
            let frac = (left / total).clamp(0.0, 1.0);
            let bar_h = info.height * 0.04;
            let y = info.height * 0.85;
            s.set_fill(self.palette.plate);
            s.fill_rect(info.width * 0.1, y, info.width * 0.8, bar_h);
            s.set_fill(self.palette.sprite);
            s.fill_rect(info.width * 0.1, y, info.width * 0.8 * frac, bar_h);
        }

        let text_px = (info.height * 0.05).max(12.0);
        s.set_fill(self.palette.plate);
        s.fill_rect(0.0, 0.0, info.width, text_px * 1.6);
        s.set_fill(self.palette.text);
        s.fill_text(
            &format!("Defused: {}   Lives: {}", self.score, self.lives),
            info.width / 2.0,
            text_px * 1.2,
            text_px,
        );
        let banner = match self.phase {
            GamePhase::Ready => Some("Find the different wire - tap to start"),
            GamePhase::Over => Some("Boom! Tap to play again"),
            GamePhase::Playing => None,
        };
        if let Some(msg) = banner {
            s.fill_text(msg, info.width / 2.0, info.height * 0.15, text_px * 1.2);
        }
    }
}

impl CanvasGame for BombGame {
    fn frame(&mut self, surface: &mut dyn Surface, info: &FrameInfo) {
        self.update(info.frame);
        render_background(surface, info.width, info.height, info.frame, self.tier);
        self.draw(surface, info);
    }

    fn pointer(&mut self, input: PointerInput, info: &FrameInfo) {
        if input.phase != PointerPhase::Down {
            return;
        }
        match self.phase {
            GamePhase::Ready | GamePhase::Over => self.start(info.frame),
            GamePhase::Playing => {
                let layout = PanelLayout::new(info.width, info.height);
                let Some((_, cell)) = layout.cell_at(input.x, input.y) else { return };
                if cell == self.odd_cell {
                    self.score += 1;
                    self.new_round(info.frame);
                } else {
                    self.fuse_end = self.fuse_end.saturating_sub(WRONG_TAP_PENALTY).max(info.frame);
                    debug!("bomb: wrong wire {cell}, fuse ends at {}", self.fuse_end);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_cell_differs() {
        let mut g = BombGame::new(&Settings::default(), 42);
        for round in 0..50 {
            g.new_round(round);
            let diffs: Vec<usize> = (0..CELLS)
                .filter(|&c| g.wire(Side::Left, c) != g.wire(Side::Right, c))
                .collect();
            assert_eq!(diffs, vec![g.odd_cell()]);
        }
    }

    #[test]
    fn test_cell_at_maps_both_panels() {
        let l = PanelLayout::new(1000.0, 600.0);
        // Left panel x 60..460, y 150..450; cells 100x100.
        assert_eq!(l.cell_at(61.0, 151.0), Some((Side::Left, 0)));
        assert_eq!(l.cell_at(459.0, 449.0), Some((Side::Left, CELLS - 1)));
        assert_eq!(l.cell_at(545.0, 260.0), Some((Side::Right, COLS)));
        assert_eq!(l.cell_at(500.0, 300.0), None);
        assert_eq!(l.cell_at(100.0, 100.0), None);
    }

    #[test]
    fn test_cell_rect_round_trips_through_cell_at() {
        let l = PanelLayout::new(800.0, 600.0);
        for side in [Side::Left, Side::Right] {
            for cell in 0..CELLS {
                let (x, y, w, h) = l.cell_rect(side, cell);
                assert_eq!(l.cell_at(x + w / 2.0, y + h / 2.0), Some((side, cell)));
            }
        }
    }

    #[test]
    fn test_fuse_scales_with_speed() {
        let mut s = Settings::default();
        s.set_speed(GameKind::Bomb, 0.5);
        assert_eq!(BombGame::new(&s, 0).fuse_frames(), 1200);
    }
}
