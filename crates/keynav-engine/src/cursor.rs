//! Pointer actions at the cursor and cursor-position restore.

use std::{fmt, str::FromStr};

use ax_query::{Point, Rect};
use tracing::debug;

use crate::Error;

/// A button event synthesized at the current pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CursorAction {
    LeftClick,
    RightClick,
    MiddleClick,
    MouseDown,
    MouseUp,
}

impl CursorAction {
    /// Every action, in command-name order.
    pub const ALL: [Self; 5] = [
        Self::LeftClick,
        Self::RightClick,
        Self::MiddleClick,
        Self::MouseDown,
        Self::MouseUp,
    ];

    /// Name used by the `action` command.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LeftClick => "left_click",
            Self::RightClick => "right_click",
            Self::MiddleClick => "middle_click",
            Self::MouseDown => "mouse_down",
            Self::MouseUp => "mouse_up",
        }
    }
}

impl fmt::Display for CursorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CursorAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| Error::Msg(format!("unknown action: {s}")))
    }
}

/// Map `initial`, captured on screen `from`, onto screen `to`.
///
/// The position keeps its relative offset within the screen. When the screen
/// did not change, or either rectangle is degenerate, `initial` is returned.
pub fn restore_position(initial: Point, from: Rect, to: Rect) -> Point {
    if from == to || from.is_empty() || to.is_empty() {
        return initial;
    }
    let rx = f64::from(initial.x - from.min_x()) / f64::from(from.width());
    let ry = f64::from(initial.y - from.min_y()) / f64::from(from.height());
    let rx = rx.clamp(0.0, 1.0);
    let ry = ry.clamp(0.0, 1.0);
    let x = to.min_x() + (rx * f64::from(to.width())).round() as i32;
    let y = to.min_y() + (ry * f64::from(to.height())).round() as i32;
    Point::new(
        x.clamp(to.min_x(), to.max_x() - 1),
        y.clamp(to.min_y(), to.max_y() - 1),
    )
}

/// Pointer position captured when a mode was activated.
#[derive(Debug, Default)]
pub(crate) struct CursorMemory {
    saved: Option<(Point, Rect)>,
    skip_once: bool,
}

impl CursorMemory {
    pub(crate) fn capture(&mut self, at: Point, screen: Rect) {
        debug!("captured cursor at {:?}", at);
        self.saved = Some((at, screen));
    }

    /// Leave the pointer where it ends up after the next exit.
    pub(crate) fn skip_next_restore(&mut self) {
        self.skip_once = true;
    }

    /// Take the saved position out without restoring it.
    pub(crate) fn hold(&mut self) -> Option<(Point, Rect)> {
        self.skip_once = false;
        self.saved.take()
    }

    /// Consume the saved position. Returns the point to move to, if any.
    pub(crate) fn take(&mut self, enabled: bool, current_screen: Rect) -> Option<Point> {
        let saved = self.saved.take();
        let skip = std::mem::take(&mut self.skip_once);
        if !enabled || skip {
            return None;
        }
        let (at, screen) = saved?;
        Some(restore_position(at, screen, current_screen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_screen_keeps_position() {
        let s = Rect::new(0, 0, 1440, 900);
        assert_eq!(restore_position(Point::new(10, 20), s, s), Point::new(10, 20));
        assert_eq!(
            restore_position(Point::new(10, 20), Rect::default(), s),
            Point::new(10, 20)
        );
    }

    #[test]
    fn maps_proportionally_onto_new_screen() {
        let from = Rect::new(0, 0, 1000, 500);
        let to = Rect::new(1000, 0, 2000, 1000);
        assert_eq!(
            restore_position(Point::new(500, 250), from, to),
            Point::new(2000, 500)
        );
        // out-of-screen positions are clamped
        assert_eq!(
            restore_position(Point::new(5000, -10), from, to),
            Point::new(2999, 0)
        );
    }

    #[test]
    fn memory_honours_skip_and_setting() {
        let s = Rect::new(0, 0, 100, 100);
        let mut m = CursorMemory::default();
        m.capture(Point::new(5, 5), s);
        assert_eq!(m.take(false, s), None);
        m.capture(Point::new(5, 5), s);
        m.skip_next_restore();
        assert_eq!(m.take(true, s), None);
        m.capture(Point::new(5, 5), s);
        assert_eq!(m.take(true, s), Some(Point::new(5, 5)));
        assert_eq!(m.take(true, s), None);
    }

    #[test]
    fn held_position_is_not_restored() {
        let s = Rect::new(0, 0, 100, 100);
        let mut m = CursorMemory::default();
        m.capture(Point::new(7, 8), s);
        m.skip_next_restore();
        assert_eq!(m.hold(), Some((Point::new(7, 8), s)));
        assert_eq!(m.take(true, s), None);
        m.capture(Point::new(1, 2), s);
        assert_eq!(m.take(true, s), Some(Point::new(1, 2)));
    }

    #[test]
    fn parses_action_names() {
        assert_eq!("mouse_down".parse::<CursorAction>().unwrap(), CursorAction::MouseDown);
        assert!("double_click".parse::<CursorAction>().is_err());
    }
}
