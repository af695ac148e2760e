use std::fmt;

/// A key delivered by the event tap while a mode is active.
///
/// The tap reports keys as the characters they produce, so control chords
/// arrive as ASCII control bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `\x1b`
    Escape,
    /// `\t`
    Tab,
    /// Delete (`\x7f`) or Ctrl-H.
    Backspace,
    /// `\r` or `\n`
    Enter,
    /// A control chord, stored as its lower-case letter (`\x04` is `Ctrl('d')`).
    Ctrl(char),
    /// Any other single character.
    Char(char),
}

impl Key {
    /// Parse the character string reported for one key press. Empty and
    /// multi-character strings yield `None`.
    pub fn parse(event: &str) -> Option<Self> {
        let mut chars = event.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return match event {
                "escape" => Some(Self::Escape),
                "tab" => Some(Self::Tab),
                "backspace" | "delete" => Some(Self::Backspace),
                "enter" | "return" => Some(Self::Enter),
                _ => None,
            };
        };
        Some(match c {
            '\x1b' => Self::Escape,
            '\t' => Self::Tab,
            '\x7f' | '\x08' => Self::Backspace,
            '\r' | '\n' => Self::Enter,
            '\x01'..='\x1a' => Self::Ctrl((b'a' + (c as u8 - 1)) as char),
            c => Self::Char(c),
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Escape => write!(f, "esc"),
            Self::Tab => write!(f, "tab"),
            Self::Backspace => write!(f, "backspace"),
            Self::Enter => write!(f, "enter"),
            Self::Ctrl(c) => write!(f, "ctrl+{c}"),
            Self::Char(c) => write!(f, "{c}"),
        }
    }
}
