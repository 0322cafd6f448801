//! Player settings and the storage they come from.
//!
//! Games never read storage themselves. The host builds a [`Settings`] from a
//! [`ConfigProvider`] once and hands it to the game at construction, so the
//! backing store (browser `localStorage`, an in-memory map in tests) can be
//! swapped without touching game logic.

use std::collections::HashMap;
use std::fmt;

use log::warn;

use crate::games::{GameKind, VisionMode};
use crate::stimulus::AcuityTier;

/// Recognized storage keys.
pub mod keys {
    use crate::games::GameKind;

    pub const VISUAL_ACUITY: &str = "visualAcuity";
    pub const VISION_TYPE: &str = "visionType";
    pub const CUSTOM_PLAYLIST: &str = "customPlaylist";
    pub const SPEED_PREFIX: &str = "speed.";

    /// Per-game speed multiplier key, e.g. `speed.mole`.
    pub fn speed(kind: GameKind) -> String {
        format!("{SPEED_PREFIX}{kind}")
    }
}

pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 3.0;
pub const DEFAULT_SPEED: f64 = 1.0;

#[derive(Debug)]
pub enum ConfigError {
    /// The backing store could not be opened (no window, storage disabled).
    Unavailable(String),
    /// The store refused a write (quota, private mode).
    Rejected { key: String, reason: String },
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Unavailable(why) => write!(f, "settings storage unavailable: {why}"),
            ConfigError::Rejected { key, reason } => write!(f, "could not store '{key}': {reason}"),
            ConfigError::Json(e) => write!(f, "malformed settings json: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// String key-value store holding player settings.
pub trait ConfigProvider {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// Browser `localStorage`.
pub struct LocalStorageConfig {
    storage: web_sys::Storage,
}

impl LocalStorageConfig {
    pub fn open() -> Result<Self, ConfigError> {
        let win = web_sys::window().ok_or_else(|| ConfigError::Unavailable("no window".into()))?;
        let storage = win
            .local_storage()
            .map_err(|e| ConfigError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| ConfigError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

impl ConfigProvider for LocalStorageConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.storage.set_item(key, value).map_err(|e| ConfigError::Rejected {
            key: key.to_string(),
            reason: format!("{e:?}"),
        })
    }
}

/// In-memory store; used natively and when browser storage is unavailable.
#[derive(Clone, Debug, Default)]
pub struct MemoryConfig {
    values: HashMap<String, String>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigProvider for MemoryConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed view of every recognized key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    pub acuity: AcuityTier,
    pub vision: VisionMode,
    /// Custom game order; empty means "all games in declaration order".
    pub playlist: Vec<GameKind>,
    speeds: HashMap<GameKind, f64>,
}

impl Settings {
    /// Read every key. Missing or malformed values fall back to defaults (and
    /// are logged), so this never fails.
    pub fn load(store: &dyn ConfigProvider) -> Self {
        let mut settings = Settings::default();

        if let Some(raw) = store.get(keys::VISUAL_ACUITY) {
            settings.acuity = raw.trim().parse().unwrap_or_else(|_| {
                let fallback = AcuityTier::default();
                warn!("unrecognized {} '{}', using {}", keys::VISUAL_ACUITY, raw, fallback);
                fallback
            });
        }

        if let Some(raw) = store.get(keys::VISION_TYPE) {
            settings.vision = raw.trim().parse().unwrap_or_else(|_| {
                warn!("unrecognized {} '{}', using visual", keys::VISION_TYPE, raw);
                VisionMode::default()
            });
        }

        if let Some(raw) = store.get(keys::CUSTOM_PLAYLIST) {
            match parse_playlist(&raw) {
                Ok(list) => settings.playlist = list,
                Err(e) => warn!("ignoring {}: {}", keys::CUSTOM_PLAYLIST, e),
            }
        }

        for kind in GameKind::all() {
            let key = keys::speed(kind);
            let Some(raw) = store.get(&key) else { continue };
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => {
                    settings.speeds.insert(kind, v.clamp(MIN_SPEED, MAX_SPEED));
                }
                _ => warn!("ignoring {key} '{raw}', using {DEFAULT_SPEED}"),
            }
        }

        settings
    }

    /// Write every key back to `store`.
    pub fn store(&self, store: &mut dyn ConfigProvider) -> Result<(), ConfigError> {
        store.set(keys::VISUAL_ACUITY, &self.acuity.to_string())?;
        store.set(keys::VISION_TYPE, &self.vision.to_string())?;
        let names: Vec<String> = self.playlist.iter().map(ToString::to_string).collect();
        store.set(keys::CUSTOM_PLAYLIST, &serde_json::to_string(&names)?)?;
        for (kind, speed) in &self.speeds {
            store.set(&keys::speed(*kind), &speed.to_string())?;
        }
        Ok(())
    }

    /// Speed multiplier for `kind`, within `[MIN_SPEED, MAX_SPEED]`.
    pub fn speed(&self, kind: GameKind) -> f64 {
        self.speeds.get(&kind).copied().unwrap_or(DEFAULT_SPEED)
    }

    pub fn set_speed(&mut self, kind: GameKind, speed: f64) {
        let speed = if speed.is_finite() { speed } else { DEFAULT_SPEED };
        self.speeds.insert(kind, speed.clamp(MIN_SPEED, MAX_SPEED));
    }
}

/// JSON array of game names. Unknown names are dropped with a warning.
fn parse_playlist(raw: &str) -> Result<Vec<GameKind>, ConfigError> {
    let names: Vec<String> = serde_json::from_str(raw)?;
    Ok(names
        .iter()
        .filter_map(|name| match name.parse::<GameKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                warn!("unknown game '{name}' in playlist");
                None
            }
        })
        .collect())
}
