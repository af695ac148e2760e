use std::{fmt, str::FromStr};

use ax_query::{ClickKind, Point};

use crate::NavmodeError;

/// Horizontal advance per label character in the action menu.
const MENU_CHAR_WIDTH: f64 = 7.0;
/// Padding drawn around each menu label.
const MENU_PADDING: f64 = 6.0;
/// Gap between adjacent menu labels.
const MENU_GAP: f64 = 8.0;

/// What happens to the element behind a resolved hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ClickAction {
    Left,
    Right,
    Double,
    Middle,
    /// Move the pointer to the element centre without clicking.
    Move,
}

impl ClickAction {
    /// Every action, in menu order.
    pub const ALL: [ClickAction; 5] = [
        ClickAction::Left,
        ClickAction::Right,
        ClickAction::Double,
        ClickAction::Middle,
        ClickAction::Move,
    ];

    /// Wire and config name of the action.
    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "left_click",
            Self::Right => "right_click",
            Self::Double => "double_click",
            Self::Middle => "middle_click",
            Self::Move => "move_mouse",
        }
    }

    /// Word shown in the action menu.
    pub fn menu_word(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Double => "double",
            Self::Middle => "middle",
            Self::Move => "go to",
        }
    }

    /// The click this action performs, if any.
    pub fn click_kind(self) -> Option<ClickKind> {
        match self {
            Self::Left => Some(ClickKind::Left),
            Self::Right => Some(ClickKind::Right),
            Self::Double => Some(ClickKind::Double),
            Self::Middle => Some(ClickKind::Middle),
            Self::Move => None,
        }
    }
}

impl fmt::Display for ClickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClickAction {
    type Err = NavmodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "left_click" | "left" => Ok(Self::Left),
            "right_click" | "right" => Ok(Self::Right),
            "double_click" | "double" => Ok(Self::Double),
            "middle_click" | "middle" => Ok(Self::Middle),
            "move_mouse" | "move" => Ok(Self::Move),
            other => Err(NavmodeError::UnknownAction(other.to_string())),
        }
    }
}

/// Keys that pick an action once a hint is selected in action mode.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct ActionKeys {
    pub left: char,
    pub right: char,
    pub double: char,
    pub middle: char,
    pub move_to: char,
}

impl Default for ActionKeys {
    fn default() -> Self {
        Self {
            left: 'l',
            right: 'r',
            double: 'd',
            middle: 'm',
            move_to: 'g',
        }
    }
}

impl ActionKeys {
    /// Key bound to `action`.
    pub fn key_for(&self, action: ClickAction) -> char {
        match action {
            ClickAction::Left => self.left,
            ClickAction::Right => self.right,
            ClickAction::Double => self.double,
            ClickAction::Middle => self.middle,
            ClickAction::Move => self.move_to,
        }
    }

    /// Action bound to `key`, compared case-insensitively.
    pub fn action_for(&self, key: char) -> Option<ClickAction> {
        let key = key.to_ascii_lowercase();
        ClickAction::ALL
            .into_iter()
            .find(|a| self.key_for(*a).to_ascii_lowercase() == key)
    }
}

/// One entry of the action menu drawn next to a selected hint.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    /// Action picked by this entry.
    pub action: ClickAction,
    /// Text such as `[l]eft`.
    pub label: String,
    /// Top-left corner of the label.
    pub position: Point,
}

/// Bracket the action key inside the menu word, or prefix it when the word
/// does not start with the key.
fn menu_label(action: ClickAction, key: char) -> String {
    let word = action.menu_word();
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.eq_ignore_ascii_case(&key) => format!("[{first}]{}", chars.as_str()),
        _ => format!("[{key}] {word}"),
    }
}

/// Lay the action menu out in a row starting at `origin`.
pub fn action_menu(origin: Point, keys: &ActionKeys) -> Vec<MenuItem> {
    let mut x = f64::from(origin.x);
    ClickAction::ALL
        .into_iter()
        .map(|action| {
            let label = menu_label(action, keys.key_for(action));
            let item = MenuItem {
                action,
                position: Point::new(x.round() as i32, origin.y),
                label,
            };
            x += item.label.chars().count() as f64 * MENU_CHAR_WIDTH + MENU_PADDING + MENU_GAP;
            item
        })
        .collect()
}
