//! Platform collaborators.
//!
//! The deck never talks to a windowing system, an input stack, or a media
//! backend directly. It talks to the traits in this module; the embedder
//! supplies implementations backed by whatever the platform offers. The
//! browser-shaped semantics the bridge depends on (device-ordered gamepad
//! lists, bounding rects, pointer-move side channels, pixel-ratio change
//! subscriptions) are documented on each trait method.
//!
//! [`HeadlessInput`] and [`HeadlessSurface`] are complete in-memory
//! implementations: cheap clonable handles over shared state, so an embedder
//! (or a test) can keep one handle to feed synthetic devices and hand the
//! other to the deck.

use std::cell::RefCell;
use std::rc::Rc;

/// One button on a gamepad, as reported by the device snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GamepadButton {
    pub pressed: bool,
    pub touched: bool,
    /// Analog amount in `0.0..=1.0`; digital buttons report 0.0 or 1.0.
    pub value: f64,
}

/// Ephemeral snapshot of one connected gamepad, re-read every frame.
#[derive(Clone, Debug, Default)]
pub struct GamepadSnapshot {
    pub id: String,
    pub buttons: Vec<GamepadButton>,
    /// Axis values, typically in `-1.0..=1.0`.
    pub axes: Vec<f64>,
}

/// Source of input-device snapshots.
pub trait InputSource {
    /// Current gamepads in device order. Disconnected slots are `None`;
    /// callers must not assume the first slot is occupied.
    fn gamepads(&mut self) -> Vec<Option<GamepadSnapshot>>;
}

/// Client-space bounding rectangle of a surface element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// A surface's client rect plus its backing-store resolution in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceView {
    pub rect: Rect,
    pub width: u32,
    pub height: u32,
}

/// Events delivered by the surface's side channels, drained once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceEvent {
    /// Pointer moved; coordinates are in client space (pre-normalization).
    PointerMoved { client_x: f64, client_y: f64 },
    /// The device pixel ratio crossed a watched threshold.
    PixelRatioChanged(f64),
}

#[derive(Debug)]
pub enum SurfaceError {
    /// No surface element with the requested id.
    UnknownElement(String),
}

impl core::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SurfaceError::UnknownElement(id) => write!(f, "no surface element with id {id:?}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// The window/surface side of the platform.
pub trait Surface {
    /// Inner width/height of the hosting window.
    fn window_inner_size(&self) -> (f64, f64);

    /// View of the primary surface.
    fn view(&self) -> SurfaceView;

    /// View of the surface element with the given id.
    fn view_by_id(&self, id: &str) -> Result<SurfaceView, SurfaceError>;

    /// Set the primary surface's backing-store resolution in pixels.
    fn set_backing_size(&mut self, width: u32, height: u32);

    fn device_pixel_ratio(&self) -> f64;

    /// Current horizontal/vertical scroll offsets.
    fn scroll_offset(&self) -> (f64, f64);

    /// Apply a CSS cursor name to the primary surface.
    fn set_cursor(&mut self, name: &str);

    /// Register a one-shot watch: deliver [`SurfaceEvent::PixelRatioChanged`]
    /// once the ratio moves away from `ratio` in either direction. The watch
    /// is consumed when it fires; the subscriber re-registers with the new
    /// ratio.
    fn watch_pixel_ratio(&mut self, ratio: f64);

    /// Drain events gathered since the last call.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;
}

/// In-memory [`InputSource`]. Clones share state.
#[derive(Clone, Default)]
pub struct HeadlessInput {
    pads: Rc<RefCell<Vec<Option<GamepadSnapshot>>>>,
}

impl HeadlessInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the device list returned by subsequent snapshots.
    pub fn set_gamepads(&self, pads: Vec<Option<GamepadSnapshot>>) {
        *self.pads.borrow_mut() = pads;
    }
}

impl InputSource for HeadlessInput {
    fn gamepads(&mut self) -> Vec<Option<GamepadSnapshot>> {
        self.pads.borrow().clone()
    }
}

struct HeadlessSurfaceState {
    id: String,
    window: (f64, f64),
    view: SurfaceView,
    pixel_ratio: f64,
    scroll: (f64, f64),
    cursor: String,
    /// Thresholds registered via `watch_pixel_ratio`, newest last.
    watches: Vec<f64>,
    pending: Vec<SurfaceEvent>,
}

/// In-memory [`Surface`] with a single element. Clones share state.
#[derive(Clone)]
pub struct HeadlessSurface {
    state: Rc<RefCell<HeadlessSurfaceState>>,
}

impl HeadlessSurface {
    pub fn new(id: &str, view: SurfaceView) -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadlessSurfaceState {
                id: id.to_string(),
                window: (view.rect.width(), view.rect.height()),
                view,
                pixel_ratio: 1.0,
                scroll: (0.0, 0.0),
                cursor: "default".to_string(),
                watches: Vec::new(),
                pending: Vec::new(),
            })),
        }
    }

    pub fn set_window_inner_size(&self, width: f64, height: f64) {
        self.state.borrow_mut().window = (width, height);
    }

    pub fn set_scroll_offset(&self, x: f64, y: f64) {
        self.state.borrow_mut().scroll = (x, y);
    }

    /// Queue a pointer-move event for the next drain.
    pub fn push_pointer(&self, client_x: f64, client_y: f64) {
        self.state
            .borrow_mut()
            .pending
            .push(SurfaceEvent::PointerMoved { client_x, client_y });
    }

    /// Change the pixel ratio, firing (and consuming) any registered watches.
    pub fn set_pixel_ratio(&self, ratio: f64) {
        let mut s = self.state.borrow_mut();
        s.pixel_ratio = ratio;
        if !s.watches.is_empty() {
            s.watches.clear();
            s.pending.push(SurfaceEvent::PixelRatioChanged(ratio));
        }
    }

    pub fn cursor(&self) -> String {
        self.state.borrow().cursor.clone()
    }

    pub fn backing_size(&self) -> (u32, u32) {
        let s = self.state.borrow();
        (s.view.width, s.view.height)
    }

    /// Thresholds currently watched, newest last.
    pub fn watched_ratios(&self) -> Vec<f64> {
        self.state.borrow().watches.clone()
    }
}

impl Surface for HeadlessSurface {
    fn window_inner_size(&self) -> (f64, f64) {
        self.state.borrow().window
    }

    fn view(&self) -> SurfaceView {
        self.state.borrow().view
    }

    fn view_by_id(&self, id: &str) -> Result<SurfaceView, SurfaceError> {
        let s = self.state.borrow();
        if s.id == id {
            Ok(s.view)
        } else {
            Err(SurfaceError::UnknownElement(id.to_string()))
        }
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        let mut s = self.state.borrow_mut();
        s.view.width = width;
        s.view.height = height;
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().pixel_ratio
    }

    fn scroll_offset(&self) -> (f64, f64) {
        self.state.borrow().scroll
    }

    fn set_cursor(&mut self, name: &str) {
        self.state.borrow_mut().cursor = name.to_string();
    }

    fn watch_pixel_ratio(&mut self, ratio: f64) {
        self.state.borrow_mut().watches.push(ratio);
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> SurfaceView {
        SurfaceView {
            rect: Rect { left: 0.0, top: 0.0, right: 320.0, bottom: 240.0 },
            width: 320,
            height: 240,
        }
    }

    #[test]
    fn headless_surface_resolves_only_its_own_id() {
        let surface = HeadlessSurface::new("canvas-1", view());
        assert!(surface.view_by_id("canvas-1").is_ok());
        assert!(matches!(
            surface.view_by_id("other"),
            Err(SurfaceError::UnknownElement(_))
        ));
    }

    #[test]
    fn pixel_ratio_watch_is_one_shot() {
        let handle = HeadlessSurface::new("canvas-1", view());
        let mut surface = handle.clone();

        surface.watch_pixel_ratio(1.0);
        handle.set_pixel_ratio(2.0);
        assert_eq!(
            surface.poll_events(),
            vec![SurfaceEvent::PixelRatioChanged(2.0)]
        );

        // Watch consumed: a further change without re-registration is silent.
        handle.set_pixel_ratio(1.5);
        assert!(surface.poll_events().is_empty());
    }

    #[test]
    fn shared_handles_see_the_same_devices() {
        let handle = HeadlessInput::new();
        let mut source = handle.clone();
        assert!(source.gamepads().is_empty());

        handle.set_gamepads(vec![None, Some(GamepadSnapshot::default())]);
        let pads = source.gamepads();
        assert_eq!(pads.len(), 2);
        assert!(pads[0].is_none());
        assert!(pads[1].is_some());
    }
}
