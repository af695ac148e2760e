//! In-memory collaborators that record every call.
//!
//! Each mock keeps a list of call strings such as `"show"` or
//! `"draw_hints 3 A"` that tests assert against.
#![allow(missing_docs)]

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
    },
};

use ax_query::{Point, Rect};
use config::HintStyle;
use hints::Hint;
use navmode::{Key, MenuItem};
use parking_lot::Mutex;

use crate::{
    CursorAction, Error, Result,
    deps::{EventTap, GridStep, GridSurface, HotkeyApi, Overlay, Pointer},
};

#[derive(Clone, Default)]
struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    fn push(&self, s: impl Into<String>) {
        self.0.lock().push(s.into());
    }
    fn all(&self) -> Vec<String> {
        self.0.lock().clone()
    }
    fn clear(&self) {
        self.0.lock().clear();
    }
}

// ---- Overlay ----

#[derive(Clone, Default)]
pub struct MockOverlay {
    calls: Calls,
    labels: Arc<Mutex<Vec<String>>>,
    visible: Arc<AtomicBool>,
    fail_draw: Arc<AtomicBool>,
}

impl MockOverlay {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn calls(&self) -> Vec<String> {
        self.calls.all()
    }
    pub fn calls_contains(&self, s: &str) -> bool {
        self.calls.all().iter().any(|c| c == s)
    }
    pub fn clear_calls(&self) {
        self.calls.clear();
    }
    /// Labels passed to the most recent `draw_hints`.
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().clone()
    }
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
    pub fn set_fail_draw(&self, v: bool) {
        self.fail_draw.store(v, Ordering::SeqCst);
    }
}

impl Overlay for MockOverlay {
    fn resize_to_active_screen(&self) {
        self.calls.push("resize");
    }

    fn draw_hints(&self, hints: &[Hint], typed: &str, _style: &HintStyle) -> Result<()> {
        if self.fail_draw.load(Ordering::SeqCst) {
            return Err(Error::Overlay("draw failed".into()));
        }
        *self.labels.lock() = hints.iter().map(|h| h.label.clone()).collect();
        self.calls.push(format!("draw_hints {} {}", hints.len(), typed).trim_end().to_string());
        Ok(())
    }

    fn draw_menu(&self, items: &[MenuItem], _style: &HintStyle) -> Result<()> {
        if self.fail_draw.load(Ordering::SeqCst) {
            return Err(Error::Overlay("draw failed".into()));
        }
        self.calls.push(format!("draw_menu {}", items.len()));
        Ok(())
    }

    fn draw_highlight(&self, rect: Rect, color: &str, width: u32) {
        self.calls.push(format!(
            "highlight {} {} {} {} {} {}",
            rect.min_x(),
            rect.min_y(),
            rect.width(),
            rect.height(),
            color,
            width
        ));
    }

    fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
        self.calls.push("show");
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        self.calls.push("hide");
    }

    fn clear(&self) {
        self.labels.lock().clear();
        self.calls.push("clear");
    }
}

// ---- Event tap ----

#[derive(Clone, Default)]
pub struct MockEventTap {
    enabled: Arc<AtomicBool>,
    toggles: Arc<AtomicUsize>,
}

impl MockEventTap {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
    /// Number of enable and disable calls so far.
    pub fn toggles(&self) -> usize {
        self.toggles.load(Ordering::SeqCst)
    }
}

impl EventTap for MockEventTap {
    fn enable(&self) {
        self.toggles.fetch_add(1, Ordering::SeqCst);
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.toggles.fetch_add(1, Ordering::SeqCst);
        self.enabled.store(false, Ordering::SeqCst);
    }
}

// ---- Hotkeys ----

#[derive(Clone)]
pub struct MockHotkeyApi {
    next_id: Arc<AtomicU32>,
    registered: Arc<Mutex<BTreeMap<u32, String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl Default for MockHotkeyApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHotkeyApi {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicU32::new(1000)),
            registered: Arc::new(Mutex::new(BTreeMap::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }
    /// Registered chords, sorted.
    pub fn registered(&self) -> Vec<String> {
        let mut v: Vec<String> = self.registered.lock().values().cloned().collect();
        v.sort();
        v
    }
    /// Id assigned to `chord`, if registered.
    pub fn id_of(&self, chord: &str) -> Option<u32> {
        self.registered
            .lock()
            .iter()
            .find(|(_, c)| c.as_str() == chord)
            .map(|(id, _)| *id)
    }
    /// Make registration of `chord` fail.
    pub fn fail_chord(&self, chord: &str) {
        self.failing.lock().insert(chord.to_string());
    }
}

impl HotkeyApi for MockHotkeyApi {
    fn register(&self, chord: &str) -> Result<u32> {
        if self.failing.lock().contains(chord) {
            return Err(Error::Hotkey(format!("cannot register {chord}")));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.registered.lock().insert(id, chord.to_string());
        Ok(id)
    }

    fn unregister(&self, id: u32) -> Result<()> {
        self.registered
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::Hotkey(format!("unknown id {id}")))
    }
}

// ---- Pointer ----

#[derive(Clone)]
pub struct MockPointer {
    calls: Calls,
    position: Arc<Mutex<Point>>,
    screen: Arc<Mutex<Rect>>,
}

impl Default for MockPointer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPointer {
    /// Pointer at (100, 100) on a single 1440x900 screen.
    pub fn new() -> Self {
        Self {
            calls: Calls::default(),
            position: Arc::new(Mutex::new(Point::new(100, 100))),
            screen: Arc::new(Mutex::new(Rect::new(0, 0, 1440, 900))),
        }
    }
    pub fn calls(&self) -> Vec<String> {
        self.calls.all()
    }
    pub fn calls_contains(&self, s: &str) -> bool {
        self.calls.all().iter().any(|c| c == s)
    }
    pub fn set_position(&self, p: Point) {
        *self.position.lock() = p;
    }
    pub fn set_screen(&self, r: Rect) {
        *self.screen.lock() = r;
    }
}

impl Pointer for MockPointer {
    fn position(&self) -> Point {
        *self.position.lock()
    }

    fn active_screen(&self) -> Rect {
        *self.screen.lock()
    }

    fn move_to(&self, p: Point) {
        *self.position.lock() = p;
        self.calls.push(format!("move {} {}", p.x, p.y));
    }

    fn perform(&self, action: CursorAction, at: Point) -> bool {
        self.calls.push(format!("{} {} {}", action, at.x, at.y));
        true
    }

    fn scroll(&self, at: Point, dx: i32, dy: i32) -> bool {
        self.calls.push(format!("scroll {} {} at {} {}", dx, dy, at.x, at.y));
        true
    }
}

// ---- Grid ----

/// Grid that selects `target` once it has seen `keys_needed` keys.
#[derive(Clone)]
pub struct MockGrid {
    calls: Calls,
    seen: Arc<AtomicUsize>,
    keys_needed: usize,
    target: Point,
    fail_show: Arc<AtomicBool>,
}

impl MockGrid {
    pub fn new(keys_needed: usize, target: Point) -> Self {
        Self {
            calls: Calls::default(),
            seen: Arc::new(AtomicUsize::new(0)),
            keys_needed,
            target,
            fail_show: Arc::new(AtomicBool::new(false)),
        }
    }
    pub fn calls(&self) -> Vec<String> {
        self.calls.all()
    }
    pub fn set_fail_show(&self, v: bool) {
        self.fail_show.store(v, Ordering::SeqCst);
    }
}

impl Default for MockGrid {
    fn default() -> Self {
        Self::new(2, Point::new(500, 500))
    }
}

impl GridSurface for MockGrid {
    fn show(&self, screen: Rect, _grid: &config::Grid) -> Result<()> {
        if self.fail_show.load(Ordering::SeqCst) {
            return Err(Error::Overlay("grid unavailable".into()));
        }
        self.seen.store(0, Ordering::SeqCst);
        self.calls
            .push(format!("show {}x{}", screen.width(), screen.height()));
        Ok(())
    }

    fn handle_key(&self, key: Key) -> GridStep {
        let Key::Char(c) = key else {
            return GridStep::Ignored;
        };
        self.calls.push(format!("key {c}"));
        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.keys_needed {
            GridStep::Done(self.target)
        } else {
            GridStep::Pending
        }
    }

    fn hide(&self) {
        self.calls.push("hide");
    }
}
