//! Vision Trainer core crate.
//!
//! Children's vision-training mini-games for amblyopia / strabismus therapy.
//! Every game runs inside the shared canvas [`harness`] and paints the
//! flickering [`stimulus`] backdrop under its sprites. Player settings come in
//! through [`config`], never straight from storage.

use std::cell::RefCell;

use log::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

pub mod config;
pub mod games;
pub mod harness;
pub mod stimulus;
pub mod surface;

use config::{ConfigProvider, LocalStorageConfig, MemoryConfig, Settings};
use games::{BombGame, GameKind, MoleGame, Playlist};
use harness::HarnessHandle;
use stimulus::AcuityTier;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    {
        // A second init (hot reload) returns Err; the first logger stays.
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

thread_local! {
    static ACTIVE_GAME: RefCell<Option<HarnessHandle>> = const { RefCell::new(None) };
}

/// Draw one stimulus backdrop frame from JS. Unknown tiers use the default.
#[wasm_bindgen(js_name = renderBackground)]
pub fn render_background_js(
    ctx: &CanvasRenderingContext2d,
    width: f64,
    height: f64,
    frame: f64,
    tier: &str,
) {
    let frame = if frame.is_finite() && frame > 0.0 { frame as u64 } else { 0 };
    let mut ctx = ctx.clone();
    stimulus::render_background(&mut ctx, width, height, frame, AcuityTier::parse_or_default(tier));
}

fn load_settings() -> Settings {
    match LocalStorageConfig::open() {
        Ok(store) => Settings::load(&store),
        Err(e) => {
            warn!("{e}; using defaults");
            Settings::load(&MemoryConfig::new())
        }
    }
}

/// Start `kind` (`"mole"`, `"bomb"`) on the canvas with id `canvas_id`,
/// replacing any game already running.
#[wasm_bindgen]
pub fn start_game(kind: &str, canvas_id: &str) -> Result<(), JsValue> {
    let kind: GameKind = kind
        .parse()
        .map_err(|_| JsValue::from_str(&format!("unknown game '{kind}'")))?;
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = doc
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("canvas '{canvas_id}' not found")))?
        .dyn_into()?;

    stop_game();
    let settings = load_settings();
    let seed = games::session_seed();
    info!("starting {kind} (acuity {}, vision {})", settings.acuity, settings.vision);
    let handle = match kind {
        GameKind::Mole => harness::run(canvas, MoleGame::new(&settings, seed))?,
        GameKind::Bomb => harness::run(canvas, BombGame::new(&settings, seed))?,
    };
    ACTIVE_GAME.with(|slot| slot.replace(Some(handle)));
    Ok(())
}

/// Stop the running game, if any.
#[wasm_bindgen]
pub fn stop_game() {
    if let Some(handle) = ACTIVE_GAME.with(|slot| slot.borrow_mut().take()) {
        handle.stop();
    }
}

#[wasm_bindgen]
pub fn set_paused(paused: bool) {
    ACTIVE_GAME.with(|slot| {
        if let Some(handle) = slot.borrow().as_ref() {
            handle.set_paused(paused);
        }
    });
}

/// Name of the game after `current` in the player's playlist.
#[wasm_bindgen]
pub fn next_game(current: &str) -> String {
    let playlist = Playlist::from_settings(&load_settings());
    let next = match current.parse::<GameKind>() {
        Ok(kind) => playlist.next_after(kind),
        Err(_) => playlist.first(),
    };
    next.to_string()
}

/// Persist a visual acuity tier chosen in the host UI.
#[wasm_bindgen]
pub fn set_visual_acuity(tier: &str) -> Result<(), JsValue> {
    let mut store = LocalStorageConfig::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let tier = AcuityTier::parse_or_default(tier);
    store
        .set(config::keys::VISUAL_ACUITY, &tier.to_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
