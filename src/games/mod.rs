//! Mini-games that run inside the canvas harness.
//!
//! Each game paints the stimulus backdrop first, then its own sprites, and does
//! its own pointer hit testing. Shared pieces live here: the game catalogue,
//! vision mode palettes, the play phase, the playlist and RNG seeding.

pub mod bomb;
pub mod mole;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::config::Settings;
use crate::surface::Rgb;

pub use bomb::BombGame;
pub use mole::MoleGame;

/// Lives every game starts with.
pub const START_LIVES: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    /// Whack-a-mole.
    Mole,
    /// Bomb defusal spot-the-difference.
    Bomb,
}

impl GameKind {
    pub fn all() -> impl Iterator<Item = GameKind> {
        GameKind::iter()
    }
}

/// How sprites are coloured. Stereo uses an anaglyph red/cyan palette for
/// viewing through filter glasses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum VisionMode {
    #[default]
    Visual,
    Stereo,
}

/// Sprite colours for one vision mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Plate drawn under sprites so they stay readable over the flicker.
    pub plate: Rgb,
    pub sprite: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
}

impl VisionMode {
    pub fn palette(self) -> Palette {
        match self {
            VisionMode::Visual => Palette {
                plate: Rgb(0x22, 0x22, 0x22),
                sprite: Rgb(0x8b, 0x5a, 0x2b),
                accent: Rgb(0x4c, 0xaf, 0x50),
                text: Rgb(0xff, 0xd1, 0x66),
            },
            VisionMode::Stereo => Palette {
                plate: Rgb(0x10, 0x10, 0x10),
                sprite: Rgb(0xff, 0x30, 0x30),
                accent: Rgb(0x00, 0xe5, 0xff),
                text: Rgb(0xff, 0xff, 0xff),
            },
        }
    }
}

/// Play state shared by every game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the first tap.
    Ready,
    Playing,
    /// Out of lives; a tap starts over.
    Over,
}

/// Order games are offered in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playlist {
    order: Vec<GameKind>,
}

impl Playlist {
    /// The custom playlist if one is set, otherwise every game.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.playlist.is_empty() {
            Self { order: GameKind::all().collect() }
        } else {
            Self { order: settings.playlist.clone() }
        }
    }

    pub fn kinds(&self) -> &[GameKind] {
        &self.order
    }

    pub fn first(&self) -> GameKind {
        self.order.first().copied().unwrap_or(GameKind::Mole)
    }

    /// Entry after `current`, wrapping around. A game not on the list restarts it.
    pub fn next_after(&self, current: GameKind) -> GameKind {
        match self.order.iter().position(|k| *k == current) {
            Some(i) => self.order[(i + 1) % self.order.len()],
            None => self.first(),
        }
    }
}

/// Seed for a fresh game session.
pub fn session_seed() -> u64 {
    #[cfg(feature = "rng")]
    {
        let mut buf = [0u8; 8];
        if getrandom::getrandom(&mut buf).is_ok() {
            return u64::from_le_bytes(buf);
        }
    }
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| (p.now() * 1000.0) as u64)
        .unwrap_or(0x5eed_cafe)
}

pub(crate) fn game_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `base` frames scaled by a speed multiplier; faster means fewer frames.
pub(crate) fn scaled_frames(base: f64, speed: f64) -> u64 {
    ((base / speed).round() as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(GameKind::Mole.to_string(), "mole");
        assert_eq!("bomb".parse::<GameKind>().unwrap(), GameKind::Bomb);
        assert!("tetris".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_vision_mode_parse() {
        assert_eq!("stereo".parse::<VisionMode>().unwrap(), VisionMode::Stereo);
        assert_eq!(VisionMode::default(), VisionMode::Visual);
        assert_ne!(VisionMode::Visual.palette(), VisionMode::Stereo.palette());
    }

    #[test]
    fn test_playlist_defaults_to_all() {
        let p = Playlist::from_settings(&Settings::default());
        assert_eq!(p.kinds(), &[GameKind::Mole, GameKind::Bomb]);
        assert_eq!(p.next_after(GameKind::Mole), GameKind::Bomb);
        assert_eq!(p.next_after(GameKind::Bomb), GameKind::Mole);
    }

    #[test]
    fn test_playlist_custom_order_and_missing_entry() {
        let mut s = Settings::default();
        s.playlist = vec![GameKind::Bomb];
        let p = Playlist::from_settings(&s);
        assert_eq!(p.first(), GameKind::Bomb);
        assert_eq!(p.next_after(GameKind::Bomb), GameKind::Bomb);
        assert_eq!(p.next_after(GameKind::Mole), GameKind::Bomb);
    }

    #[test]
    fn test_scaled_frames() {
        assert_eq!(scaled_frames(90.0, 1.0), 90);
        assert_eq!(scaled_frames(90.0, 2.0), 45);
        assert_eq!(scaled_frames(90.0, 0.25), 360);
        assert_eq!(scaled_frames(0.0, 1.0), 1);
    }
}
