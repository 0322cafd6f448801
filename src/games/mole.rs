// Whack-a-mole over the stimulus backdrop.
// 3x3 holes in the centred square; one mole up at a time.
use log::{debug, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::Settings;
use crate::harness::{CanvasGame, FrameInfo, PointerInput, PointerPhase};
use crate::stimulus::{AcuityTier, render_background};
use crate::surface::Surface;

use super::{GameKind, GamePhase, Palette, START_LIVES, game_rng, scaled_frames};

pub const GRID: usize = 3;
pub const HOLES: usize = GRID * GRID;
/// Frames a mole stays up at speed 1.0.
const VISIBLE_FRAMES: f64 = 90.0;
/// Frames between moles at speed 1.0.
const GAP_FRAMES: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveMole {
    hole: usize,
    until_frame: u64,
}

/// Hole positions for one canvas size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoleLayout {
    pub centers: [(f64, f64); HOLES],
    pub radius: f64,
}

impl HoleLayout {
    pub fn new(width: f64, height: f64) -> Self {
        let side = width.min(height).max(0.0) * 0.8;
        let cell = side / GRID as f64;
        let x0 = (width - side) / 2.0;
        let y0 = (height - side) / 2.0;
        let mut centers = [(0.0, 0.0); HOLES];
        for (i, c) in centers.iter_mut().enumerate() {
            let (col, row) = (i % GRID, i / GRID);
            *c = (x0 + (col as f64 + 0.5) * cell, y0 + (row as f64 + 0.5) * cell);
        }
        Self { centers, radius: cell * 0.35 }
    }

    pub fn hole_at(&self, x: f64, y: f64) -> Option<usize> {
        let r2 = self.radius * self.radius;
        self.centers.iter().position(|&(cx, cy)| {
            let (dx, dy) = (x - cx, y - cy);
            dx * dx + dy * dy <= r2
        })
    }
}

pub struct MoleGame {
    tier: AcuityTier,
    palette: Palette,
    visible_frames: u64,
    gap_frames: u64,
    rng: ChaCha8Rng,
    phase: GamePhase,
    score: u32,
    lives: u32,
    active: Option<ActiveMole>,
    last_hole: Option<usize>,
    next_spawn_frame: u64,
}

impl MoleGame {
    pub fn new(settings: &Settings, seed: u64) -> Self {
        let speed = settings.speed(GameKind::Mole);
        Self {
            tier: settings.acuity,
            palette: settings.vision.palette(),
            visible_frames: scaled_frames(VISIBLE_FRAMES, speed),
            gap_frames: scaled_frames(GAP_FRAMES, speed),
            rng: game_rng(seed),
            phase: GamePhase::Ready,
            score: 0,
            lives: START_LIVES,
            active: None,
            last_hole: None,
            next_spawn_frame: 0,
        }
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

    /// Hole with a mole currently up.
    pub fn active_hole(&self) -> Option<usize> {
        self.active.map(|m| m.hole)
    }

    pub fn visible_frames(&self) -> u64 {
        self.visible_frames
    }

    pub fn gap_frames(&self) -> u64 {
        self.gap_frames
    }

    fn start(&mut self, frame: u64) {
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.lives = START_LIVES;
        self.active = None;
        self.next_spawn_frame = frame + self.gap_frames;
        info!("mole: start at frame {frame}");
    }

    fn spawn(&mut self, frame: u64) {
        // Never the same hole twice in a row.
        let hole = match self.last_hole {
            None => self.rng.random_range(0..HOLES),
            Some(last) => {
                let hole = self.rng.random_range(0..HOLES - 1);
                if hole >= last { hole + 1 } else { hole }
            }
        };
        self.active = Some(ActiveMole { hole, until_frame: frame + self.visible_frames });
        self.last_hole = Some(hole);
        debug!("mole: up at hole {hole}, frame {frame}");
    }

    fn update(&mut self, frame: u64) {
        if self.phase != GamePhase::Playing {
            return;
        }
        if let Some(mole) = self.active {
            if frame >= mole.until_frame {
                self.active = None;
                self.lives = self.lives.saturating_sub(1);
                self.next_spawn_frame = frame + self.gap_frames;
                if self.lives == 0 {
                    self.phase = GamePhase::Over;
                    info!("mole: over with score {}", self.score);
                }
            }
        } else if frame >= self.next_spawn_frame {
            self.spawn(frame);
        }
    }

    fn draw(&self, s: &mut dyn Surface, info: &FrameInfo) {
        let layout = HoleLayout::new(info.width, info.height);
        for (i, &(cx, cy)) in layout.centers.iter().enumerate() {
            s.set_fill(self.palette.plate);
            s.fill_circle(cx, cy, layout.radius * 1.15);
            if self.active_hole() == Some(i) {
                s.set_fill(self.palette.sprite);
                s.fill_circle(cx, cy, layout.radius);
                s.set_fill(self.palette.accent);
                s.fill_circle(cx, cy - layout.radius * 0.3, layout.radius * 0.25);
            }
        }
        let text_px = (info.height * 0.05).max(12.0);
        s.set_fill(self.palette.plate);
        s.fill_rect(0.0, 0.0, info.width, text_px * 1.6);
        s.set_fill(self.palette.text);
        s.fill_text(
            &format!("Score: {}   Lives: {}", self.score, self.lives),
            info.width / 2.0,
            text_px * 1.2,
            text_px,
        );
        let banner = match self.phase {
            GamePhase::Ready => Some("Tap to start"),
            GamePhase::Over => Some("Game over - tap to play again"),
            GamePhase::Playing => None,
        };
        if let Some(msg) = banner {
            s.fill_text(msg, info.width / 2.0, info.height / 2.0, text_px * 1.4);
        }
    }
}

impl CanvasGame for MoleGame {
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
                let Some(mole) = self.active else { return };
                let layout = HoleLayout::new(info.width, info.height);
                if layout.hole_at(input.x, input.y) == Some(mole.hole) {
                    self.score += 1;
                    self.active = None;
                    self.next_spawn_frame = info.frame + self.gap_frames;
                    debug!("mole: hit hole {} (score {})", mole.hole, self.score);
                }
            }
        }
    }
}
