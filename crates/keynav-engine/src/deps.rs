//! Platform collaborators the engine drives.
//!
//! Rendering, keystroke capture, global hotkeys, the pointer and the grid UI
//! live outside this crate. The engine only sees these traits; the daemon
//! wires in native implementations and tests use [`crate::mock`].

use ax_query::{Point, Rect};
use config::HintStyle;
use hints::Hint;
use navmode::{Key, MenuItem};

use crate::{CursorAction, Result};

// ---- Overlay ----

/// The transparent window that hints, menus and highlights are drawn into.
///
/// Coordinates are local to the active screen.
pub trait Overlay: Send + Sync {
    /// Move and size the overlay to cover the screen under the pointer,
    /// returning once the window has been resized.
    fn resize_to_active_screen(&self);
    /// Draw hint labels; `typed` is the prefix already entered.
    fn draw_hints(&self, hints: &[Hint], typed: &str, style: &HintStyle) -> Result<()>;
    /// Draw the action menu. Menu items carry no pointer arrow.
    fn draw_menu(&self, items: &[MenuItem], style: &HintStyle) -> Result<()>;
    /// Outline `rect`.
    fn draw_highlight(&self, rect: Rect, color: &str, width: u32);
    /// Make the overlay visible.
    fn show(&self);
    /// Hide the overlay.
    fn hide(&self);
    /// Remove everything drawn.
    fn clear(&self);
}

// ---- Local keystroke capture ----

/// Keystroke capture while a mode is active. Captured keys reach the engine
/// through [`crate::Engine::handle_key`].
pub trait EventTap: Send + Sync {
    fn enable(&self);
    fn disable(&self);
}

// ---- Hotkey API abstraction ----

/// Global hotkey registration.
pub trait HotkeyApi: Send + Sync {
    /// Register `chord` and return the id reported when it fires.
    fn register(&self, chord: &str) -> Result<u32>;
    fn unregister(&self, id: u32) -> Result<()>;
}

// ---- Pointer ----

/// Mouse pointer and screen geometry.
pub trait Pointer: Send + Sync {
    /// Current pointer position in global coordinates.
    fn position(&self) -> Point;
    /// Bounds of the screen containing the pointer.
    fn active_screen(&self) -> Rect;
    fn move_to(&self, p: Point);
    /// Synthesize a button event at `at`.
    fn perform(&self, action: CursorAction, at: Point) -> bool;
    /// Scroll whatever is under `at`.
    fn scroll(&self, at: Point, dx: i32, dy: i32) -> bool;
}

// ---- Grid ----

/// Result of feeding a key to the grid surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStep {
    /// The key narrowed the selection; keep going.
    Pending,
    /// A point was selected.
    Done(Point),
    /// The key means nothing to the grid.
    Ignored,
}

/// The grid overlay. It owns the keyboard while grid mode is active.
pub trait GridSurface: Send + Sync {
    /// Lay out and show the grid over `screen`.
    fn show(&self, screen: Rect, grid: &config::Grid) -> Result<()>;
    fn handle_key(&self, key: Key) -> GridStep;
    fn hide(&self);
}
