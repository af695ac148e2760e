use crate::Key;

/// Scroll distances in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSteps {
    /// One `h`/`j`/`k`/`l` press.
    pub step: i32,
    /// Ctrl-D / Ctrl-U.
    pub half_page: i32,
    /// `gg` / `G`; large enough to reach either end.
    pub full: i32,
}

impl Default for ScrollSteps {
    fn default() -> Self {
        Self {
            step: 50,
            half_page: 500,
            full: 1_000_000,
        }
    }
}

/// A scroll command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ScrollOp {
    Up,
    Down,
    Left,
    Right,
    HalfUp,
    HalfDown,
    Top,
    Bottom,
}

impl ScrollOp {
    /// Wheel delta `(dx, dy)`. Up and left are positive.
    pub fn delta(self, steps: &ScrollSteps) -> (i32, i32) {
        match self {
            Self::Up => (0, steps.step),
            Self::Down => (0, -steps.step),
            Self::Left => (steps.step, 0),
            Self::Right => (-steps.step, 0),
            Self::HalfUp => (0, steps.half_page),
            Self::HalfDown => (0, -steps.half_page),
            Self::Top => (0, steps.full),
            Self::Bottom => (0, -steps.full),
        }
    }
}

/// Outcome of one key in scroll mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollKey {
    /// Perform a scroll.
    Op(ScrollOp),
    /// First half of `gg`; wait for the next key.
    Pending,
    /// Pick a different scroll target.
    Retarget,
    /// Not a scroll key.
    Ignored,
}

/// Vim-style key parser. Holds the pending `g` between presses.
#[derive(Debug, Clone, Default)]
pub struct ScrollKeys {
    pending_g: bool,
}

impl ScrollKeys {
    /// True while a lone `g` waits for its partner.
    pub fn is_pending(&self) -> bool {
        self.pending_g
    }

    /// Forget any pending `g`.
    pub fn reset(&mut self) {
        self.pending_g = false;
    }

    /// Parse one key. Any key other than a second `g` clears the pending `g`.
    pub fn parse(&mut self, key: Key) -> ScrollKey {
        let pending = std::mem::take(&mut self.pending_g);
        match key {
            Key::Char('g') if pending => ScrollKey::Op(ScrollOp::Top),
            Key::Char('g') => {
                self.pending_g = true;
                ScrollKey::Pending
            }
            Key::Char('G') => ScrollKey::Op(ScrollOp::Bottom),
            Key::Char('j') => ScrollKey::Op(ScrollOp::Down),
            Key::Char('k') => ScrollKey::Op(ScrollOp::Up),
            Key::Char('h') => ScrollKey::Op(ScrollOp::Left),
            Key::Char('l') => ScrollKey::Op(ScrollOp::Right),
            Key::Ctrl('d') => ScrollKey::Op(ScrollOp::HalfDown),
            Key::Ctrl('u') => ScrollKey::Op(ScrollOp::HalfUp),
            Key::Tab => ScrollKey::Retarget,
            _ => ScrollKey::Ignored,
        }
    }
}
