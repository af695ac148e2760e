// Defaults and constants for configuration sections

pub(crate) const HINT_CHARACTERS: &str = "asdfghjkl";

pub(crate) const CLICKABLE_ROLES: &[&str] = &[
    "AXButton",
    "AXComboBox",
    "AXCheckBox",
    "AXRadioButton",
    "AXLink",
    "AXPopUpButton",
    "AXTextField",
    "AXSlider",
    "AXTabButton",
    "AXSwitch",
    "AXDisclosureTriangle",
    "AXTextArea",
    "AXMenuButton",
    "AXMenuItem",
    "AXCell",
    "AXRow",
];

pub(crate) const MENUBAR_TARGETS: &[&str] = &[
    "com.apple.TextInputMenuAgent",
    "com.apple.controlcenter",
    "com.apple.systemuiserver",
];

pub(crate) const BINDINGS: &[(&str, &str)] = &[
    ("Cmd+Shift+Space", "hints"),
    ("Cmd+Shift+G", "grid"),
    ("Cmd+Shift+S", "action scroll"),
];

pub(crate) const MAX_DEPTH: usize = 12;
pub(crate) const WEB_MAX_DEPTH: usize = 25;

// Hint style
pub(crate) const HINT_FONT_SIZE: u32 = 12;
pub(crate) const HINT_FONT_FAMILY: &str = "SF Mono";
pub(crate) const HINT_BORDER_RADIUS: u32 = 4;
pub(crate) const HINT_PADDING: u32 = 4;
pub(crate) const HINT_BORDER_WIDTH: u32 = 1;
pub(crate) const HINT_OPACITY: f64 = 0.95;
pub(crate) const HINT_BG: &str = "#FFD700";
pub(crate) const HINT_FG: &str = "#000000";
pub(crate) const HINT_MATCHED_FG: &str = "#737373";
pub(crate) const HINT_BORDER: &str = "#000000";

pub(crate) const GRID_CHARACTERS: &str = "abcdefghijklmnpqrstuvwxyz";
/// The subgrid is always 3x3.
pub(crate) const SUBGRID_KEYS_REQUIRED: usize = 9;

pub(crate) const SCROLL_STEP: i32 = 50;
pub(crate) const SCROLL_STEP_HALF: i32 = 500;
pub(crate) const SCROLL_STEP_FULL: i32 = 1_000_000;
pub(crate) const SCROLL_HIGHLIGHT: &str = "#FF0000";
pub(crate) const SCROLL_HIGHLIGHT_WIDTH: u32 = 2;

pub(crate) const ACTION_HIGHLIGHT: &str = "#00FF00";
pub(crate) const ACTION_HIGHLIGHT_WIDTH: u32 = 3;

pub(crate) const LOG_LEVEL: &str = "info";
pub(crate) const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub(crate) const CHORD_MODIFIERS: &[&str] = &["Cmd", "Ctrl", "Alt", "Shift", "Option"];

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
