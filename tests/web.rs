#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use vision_trainer::stimulus::{AcuityTier, render_background};

wasm_bindgen_test_configure!(run_in_browser);

fn make_canvas(id: &str, w: u32, h: u32) -> HtmlCanvasElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .unwrap()
        .dyn_into()
        .unwrap();
    canvas.set_id(id);
    canvas.set_width(w);
    canvas.set_height(h);
    document.body().unwrap().append_child(&canvas).unwrap();
    canvas
}

fn context(canvas: &HtmlCanvasElement) -> CanvasRenderingContext2d {
    canvas.get_context("2d").unwrap().unwrap().dyn_into().unwrap()
}

fn rgb_at(ctx: &CanvasRenderingContext2d, x: f64, y: f64) -> [u8; 3] {
    let data = ctx.get_image_data(x, y, 1.0, 1.0).unwrap().data();
    [data[0], data[1], data[2]]
}

#[wasm_bindgen_test]
fn backdrop_paints_on_a_real_canvas() {
    let canvas = make_canvas("backdrop", 80, 60);
    let mut ctx = context(&canvas);

    render_background(&mut ctx, 80.0, 60.0, 0, AcuityTier::Moderate);
    assert_eq!(rgb_at(&ctx, 5.0, 5.0), [0, 0, 0]);

    // Flash window: black, then white one period later.
    render_background(&mut ctx, 80.0, 60.0, 960, AcuityTier::Moderate);
    assert_eq!(rgb_at(&ctx, 40.0, 30.0), [0, 0, 0]);
    render_background(&mut ctx, 80.0, 60.0, 990, AcuityTier::Moderate);
    assert_eq!(rgb_at(&ctx, 40.0, 30.0), [255, 255, 255]);
}

#[wasm_bindgen_test]
fn exported_renderer_accepts_raw_tier_strings() {
    let canvas = make_canvas("exported", 40, 30);
    let ctx = context(&canvas);
    vision_trainer::render_background_js(&ctx, 40.0, 30.0, 990.0, "not a tier");
    assert_eq!(rgb_at(&ctx, 20.0, 15.0), [255, 255, 255]);
}

#[wasm_bindgen_test]
fn unknown_game_is_rejected() {
    make_canvas("reject", 40, 30);
    assert!(vision_trainer::start_game("chess", "reject").is_err());
    assert!(vision_trainer::start_game("mole", "missing-canvas").is_err());
}

#[wasm_bindgen_test]
fn start_and_stop_a_game() {
    make_canvas("play", 120, 90);
    vision_trainer::start_game("bomb", "play").unwrap();
    vision_trainer::set_paused(true);
    vision_trainer::set_paused(false);
    vision_trainer::start_game("mole", "play").unwrap();
    vision_trainer::stop_game();
    vision_trainer::stop_game();
}

#[wasm_bindgen_test]
fn next_game_cycles_the_default_playlist() {
    assert_eq!(vision_trainer::next_game("mole"), "bomb");
    assert_eq!(vision_trainer::next_game("bomb"), "mole");
    assert_eq!(vision_trainer::next_game("???"), "mole");
}
