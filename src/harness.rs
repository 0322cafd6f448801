//! Canvas game harness.
//!
//! Owns everything every game used to repeat for itself: high-DPI canvas
//! sizing, the `requestAnimationFrame` loop, the frame counter, play/pause/stop
//! and pointer wiring. A game only implements [`CanvasGame`].

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, PointerEvent, window};

use crate::surface::Surface;

/// Per-frame context handed to a game.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    /// Monotonic frame counter, +1 per played frame.
    pub frame: u64,
    /// Logical (CSS pixel) canvas size.
    pub width: f64,
    pub height: f64,
    /// `requestAnimationFrame` timestamp.
    pub now_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Leave,
}

/// Pointer event in logical canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub x: f64,
    pub y: f64,
}

pub trait CanvasGame {
    /// Advance and draw one frame. Called once per animation tick while playing.
    fn frame(&mut self, surface: &mut dyn Surface, info: &FrameInfo);
    /// Handle a pointer event. `info` describes the most recent frame.
    fn pointer(&mut self, input: PointerInput, info: &FrameInfo);
}

// --- Frame clock --------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Play this frame number.
    Run(u64),
    /// Paused; keep the loop alive without drawing.
    Hold,
    /// Stopped; tear the loop down.
    Stop,
}

/// Frame counter plus play/pause/stop flags.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    next_frame: u64,
    paused: bool,
    stopped: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> Tick {
        if self.stopped {
            return Tick::Stop;
        }
        if self.paused {
            return Tick::Hold;
        }
        let frame = self.next_frame;
        self.next_frame += 1;
        Tick::Run(frame)
    }

    /// Last frame handed out (0 before the first tick).
    pub fn current(&self) -> u64 {
        self.next_frame.saturating_sub(1)
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

// --- DPI layout ---------------------------------------------------------------

/// Backing-store size for a canvas shown at `css_width x css_height`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DpiLayout {
    pub css_width: f64,
    pub css_height: f64,
    pub dpr: f64,
}

impl DpiLayout {
    /// Layout from the canvas' laid-out client size. An element that has not
    /// been laid out yet (client size 0) keeps its attribute size at 1x.
    pub fn measure(client_w: i32, client_h: i32, attr_w: u32, attr_h: u32, dpr: f64) -> Self {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        if client_w <= 0 || client_h <= 0 {
            return Self { css_width: attr_w as f64, css_height: attr_h as f64, dpr: 1.0 };
        }
        Self { css_width: client_w as f64, css_height: client_h as f64, dpr }
    }

    pub fn backing_width(&self) -> u32 {
        (self.css_width * self.dpr).round().max(1.0) as u32
    }

    pub fn backing_height(&self) -> u32 {
        (self.css_height * self.dpr).round().max(1.0) as u32
    }
}

/// The sizing view of a canvas element.
pub trait CanvasBox {
    /// Laid-out size in CSS pixels.
    fn client_size(&self) -> (i32, i32);
    /// `width`/`height` attributes, i.e. the backing store.
    fn attr_size(&self) -> (u32, u32);
    fn set_attr_size(&mut self, width: u32, height: u32);
    /// Fix the displayed size so it no longer follows the attributes.
    fn pin_css_size(&mut self, width: f64, height: f64);
}

impl CanvasBox for HtmlCanvasElement {
    fn client_size(&self) -> (i32, i32) {
        (self.client_width(), self.client_height())
    }

    fn attr_size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn set_attr_size(&mut self, width: u32, height: u32) {
        self.set_width(width);
        self.set_height(height);
    }

    fn pin_css_size(&mut self, width: f64, height: f64) {
        let style = self.style();
        style.set_property("width", &format!("{width}px")).ok();
        style.set_property("height", &format!("{height}px")).ok();
    }
}

/// Bring `canvas`'s backing store in line with its displayed size. Returns the
/// new layout when anything changed, `None` when `current` still holds.
///
/// An unstyled canvas reports its attribute size as its client size, so the
/// CSS size is pinned before the attributes grow.
pub fn resize_canvas<C: CanvasBox + ?Sized>(
    canvas: &mut C,
    current: Option<DpiLayout>,
    dpr: f64,
) -> Option<DpiLayout> {
    let (client_w, client_h) = canvas.client_size();
    let (attr_w, attr_h) = canvas.attr_size();
    let layout = DpiLayout::measure(client_w, client_h, attr_w, attr_h, dpr);
    if current == Some(layout) {
        return None;
    }
    canvas.pin_css_size(layout.css_width, layout.css_height);
    canvas.set_attr_size(layout.backing_width(), layout.backing_height());
    Some(layout)
}

// --- Browser runtime ----------------------------------------------------------

/// Control surface for a running harness.
#[derive(Clone)]
pub struct HarnessHandle {
    clock: Rc<RefCell<FrameClock>>,
}

impl HarnessHandle {
    /// Stop after the current frame; listeners are detached on the next tick.
    pub fn stop(&self) {
        self.clock.borrow_mut().stop();
    }

    pub fn set_paused(&self, paused: bool) {
        self.clock.borrow_mut().set_paused(paused);
    }

    pub fn is_running(&self) -> bool {
        !self.clock.borrow().is_stopped()
    }

    pub fn frame(&self) -> u64 {
        self.clock.borrow().current()
    }
}

type PointerClosure = Closure<dyn FnMut(PointerEvent)>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

struct Runtime<G: CanvasGame> {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    game: G,
    clock: Rc<RefCell<FrameClock>>,
    layout: Option<DpiLayout>,
    last: FrameInfo,
    listeners: Vec<(&'static str, PointerClosure)>,
}

impl<G: CanvasGame> Runtime<G> {
    fn sync_size(&mut self) {
        let dpr = window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
        let Some(layout) = resize_canvas(&mut self.canvas, self.layout, dpr) else {
            return;
        };
        debug!(
            "canvas {}x{} css @{}x -> {}x{}",
            layout.css_width,
            layout.css_height,
            layout.dpr,
            layout.backing_width(),
            layout.backing_height()
        );
        // Resizing the backing store resets the context state, transform included.
        self.ctx.set_transform(layout.dpr, 0.0, 0.0, layout.dpr, 0.0, 0.0).ok();
        self.layout = Some(layout);
    }

    /// Returns whether the loop should keep running.
    fn on_animation_frame(&mut self, now_ms: f64) -> bool {
        let tick = self.clock.borrow_mut().tick();
        match tick {
            Tick::Stop => {
                self.detach();
                info!("harness stopped at frame {}", self.last.frame);
                false
            }
            Tick::Hold => true,
            Tick::Run(frame) => {
                self.sync_size();
                let (width, height) = self
                    .layout
                    .map(|l| (l.css_width, l.css_height))
                    .unwrap_or((self.canvas.width() as f64, self.canvas.height() as f64));
                self.last = FrameInfo { frame, width, height, now_ms };
                let info = self.last;
                self.game.frame(&mut self.ctx, &info);
                true
            }
        }
    }

    fn on_pointer(&mut self, phase: PointerPhase, evt: &PointerEvent) {
        {
            let clock = self.clock.borrow();
            if clock.is_stopped() || clock.is_paused() {
                return;
            }
        }
        // offset_x/offset_y are already canvas-local CSS pixels.
        let input = PointerInput { phase, x: evt.offset_x() as f64, y: evt.offset_y() as f64 };
        let info = self.last;
        self.game.pointer(input, &info);
    }

    fn detach(&mut self) {
        for (name, closure) in self.listeners.drain(..) {
            self.canvas
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .ok();
        }
    }
}

/// Start `game` on `canvas`. The loop runs until [`HarnessHandle::stop`].
pub fn run<G: CanvasGame + 'static>(
    canvas: HtmlCanvasElement,
    game: G,
) -> Result<HarnessHandle, JsValue> {
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    let clock = Rc::new(RefCell::new(FrameClock::new()));
    let width = canvas.width() as f64;
    let height = canvas.height() as f64;
    let runtime = Rc::new(RefCell::new(Runtime {
        canvas: canvas.clone(),
        ctx,
        game,
        clock: clock.clone(),
        layout: None,
        last: FrameInfo { frame: 0, width, height, now_ms: 0.0 },
        listeners: Vec::new(),
    }));

    // Pointer listeners
    for (name, phase) in [
        ("pointerdown", PointerPhase::Down),
        ("pointermove", PointerPhase::Move),
        ("pointerup", PointerPhase::Up),
        ("pointerleave", PointerPhase::Leave),
    ] {
        let rt = runtime.clone();
        let closure = Closure::wrap(Box::new(move |evt: PointerEvent| {
            if phase == PointerPhase::Down {
                evt.prevent_default();
            }
            if let Ok(mut rt) = rt.try_borrow_mut() {
                rt.on_pointer(phase, &evt);
            }
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        runtime.borrow_mut().listeners.push((name, closure));
    }

    // Animation loop
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    let rt = runtime.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        let keep_going = rt.borrow_mut().on_animation_frame(ts);
        if !keep_going {
            // Drops this closure and, with it, the last reference to the runtime.
            let _ = f.borrow_mut().take();
            return;
        }
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    if let Some(cb) = g.borrow().as_ref() {
        win.request_animation_frame(cb.as_ref().unchecked_ref())?;
    }

    info!("harness started on #{}", canvas.id());
    Ok(HarnessHandle { clock })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_counts_from_zero() {
        let mut c = FrameClock::new();
        assert_eq!(c.tick(), Tick::Run(0));
        assert_eq!(c.tick(), Tick::Run(1));
        assert_eq!(c.current(), 1);
    }

    #[test]
    fn test_pause_holds_the_counter() {
        let mut c = FrameClock::new();
        c.tick();
        c.set_paused(true);
        assert_eq!(c.tick(), Tick::Hold);
        assert_eq!(c.tick(), Tick::Hold);
        c.set_paused(false);
        assert_eq!(c.tick(), Tick::Run(1));
    }

    #[test]
    fn test_stop_wins_over_pause() {
        let mut c = FrameClock::new();
        c.set_paused(true);
        c.stop();
        assert_eq!(c.tick(), Tick::Stop);
        assert!(c.is_stopped());
    }

    #[test]
    fn test_layout_scales_backing_store() {
        let l = DpiLayout::measure(400, 300, 640, 480, 2.0);
        assert_eq!((l.css_width, l.css_height), (400.0, 300.0));
        assert_eq!((l.backing_width(), l.backing_height()), (800, 600));
        let l = DpiLayout::measure(333, 100, 0, 0, 1.5);
        assert_eq!(l.backing_width(), 500);
    }

    #[test]
    fn test_layout_before_layout_pass_uses_attributes() {
        let l = DpiLayout::measure(0, 0, 640, 480, 3.0);
        assert_eq!((l.css_width, l.css_height, l.dpr), (640.0, 480.0, 1.0));
        assert_eq!(l.backing_width(), 640);
    }

    #[test]
    fn test_layout_rejects_bad_dpr() {
        assert_eq!(DpiLayout::measure(10, 10, 0, 0, f64::NAN).dpr, 1.0);
        assert_eq!(DpiLayout::measure(10, 10, 0, 0, 0.0).dpr, 1.0);
    }

    /// An element with no stylesheet size: it displays at its pinned CSS size
    /// if one is set, otherwise at its attribute size.
    struct UnstyledCanvas {
        attr: (u32, u32),
        pinned: Option<(f64, f64)>,
        resizes: u32,
    }

    impl CanvasBox for UnstyledCanvas {
        fn client_size(&self) -> (i32, i32) {
            match self.pinned {
                Some((w, h)) => (w as i32, h as i32),
                None => (self.attr.0 as i32, self.attr.1 as i32),
            }
        }

        fn attr_size(&self) -> (u32, u32) {
            self.attr
        }

        fn set_attr_size(&mut self, width: u32, height: u32) {
            self.attr = (width, height);
            self.resizes += 1;
        }

        fn pin_css_size(&mut self, width: f64, height: f64) {
            self.pinned = Some((width, height));
        }
    }

    #[test]
    fn test_unstyled_canvas_settles_on_hidpi() {
        let mut canvas = UnstyledCanvas { attr: (400, 300), pinned: None, resizes: 0 };
        let mut layout = None;
        for _ in 0..6 {
            if let Some(next) = resize_canvas(&mut canvas, layout, 2.0) {
                layout = Some(next);
            }
        }
        let layout = layout.unwrap();
        assert_eq!((layout.css_width, layout.css_height), (400.0, 300.0));
        assert_eq!(canvas.attr, (800, 600));
        assert_eq!(canvas.resizes, 1);
    }

    #[test]
    fn test_resize_follows_dpr_change() {
        let mut canvas = UnstyledCanvas { attr: (200, 100), pinned: None, resizes: 0 };
        let first = resize_canvas(&mut canvas, None, 1.0);
        assert_eq!(canvas.attr, (200, 100));
        assert!(resize_canvas(&mut canvas, first, 1.0).is_none());
        let second = resize_canvas(&mut canvas, first, 3.0).unwrap();
        assert_eq!((second.css_width, second.css_height), (200.0, 100.0));
        assert_eq!(canvas.attr, (600, 300));
        assert!(resize_canvas(&mut canvas, Some(second), 3.0).is_none());
    }
}
