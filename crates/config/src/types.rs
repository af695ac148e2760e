use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::defaults::{self, strings};

/// Complete daemon configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub general: General,
    pub hotkeys: Hotkeys,
    pub hints: Hints,
    pub additional_ax_support: AxSupport,
    pub grid: Grid,
    pub scroll: Scroll,
    pub action: Action,
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct General {
    /// Bundle ids for which activation is refused and hotkeys are released.
    pub excluded_apps: Vec<String>,
    /// Put the pointer back where it was after an action.
    pub restore_cursor_position: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hotkeys {
    /// Chord (`Cmd+Shift+Space`) to action (`hints`, `exec open -a Terminal`).
    /// A user table replaces the defaults wholesale.
    pub bindings: BTreeMap<String, String>,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            bindings: defaults::BINDINGS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Extra clickable roles for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub bundle_id: String,
    pub additional_clickable_roles: Vec<String>,
    pub ignore_clickable_check: bool,
}

/// How hint labels are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HintStyle {
    pub font_size: u32,
    pub font_family: String,
    pub border_radius: u32,
    pub padding: u32,
    pub border_width: u32,
    pub opacity: f64,
    pub background_color: String,
    pub text_color: String,
    pub matched_text_color: String,
    pub border_color: String,
}

impl Default for HintStyle {
    fn default() -> Self {
        Self {
            font_size: defaults::HINT_FONT_SIZE,
            font_family: defaults::HINT_FONT_FAMILY.to_string(),
            border_radius: defaults::HINT_BORDER_RADIUS,
            padding: defaults::HINT_PADDING,
            border_width: defaults::HINT_BORDER_WIDTH,
            opacity: defaults::HINT_OPACITY,
            background_color: defaults::HINT_BG.to_string(),
            text_color: defaults::HINT_FG.to_string(),
            matched_text_color: defaults::HINT_MATCHED_FG.to_string(),
            border_color: defaults::HINT_BORDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hints {
    pub enabled: bool,
    pub hint_characters: String,
    pub clickable_roles: Vec<String>,
    pub ignore_clickable_check: bool,
    pub app_configs: Vec<AppConfig>,
    pub include_menubar_hints: bool,
    pub additional_menubar_hints_targets: Vec<String>,
    pub include_dock_hints: bool,
    /// Depth budget for native applications.
    pub max_depth: usize,
    /// Depth budget for Electron, Chromium and Firefox hosts.
    pub web_max_depth: usize,
    /// Build element trees with the bounded parallel walker.
    pub concurrent_build: bool,
    pub style: HintStyle,
}

impl Default for Hints {
    fn default() -> Self {
        Self {
            enabled: true,
            hint_characters: defaults::HINT_CHARACTERS.to_string(),
            clickable_roles: strings(defaults::CLICKABLE_ROLES),
            ignore_clickable_check: false,
            app_configs: Vec::new(),
            include_menubar_hints: false,
            additional_menubar_hints_targets: strings(defaults::MENUBAR_TARGETS),
            include_dock_hints: false,
            max_depth: defaults::MAX_DEPTH,
            web_max_depth: defaults::WEB_MAX_DEPTH,
            concurrent_build: false,
            style: HintStyle::default(),
        }
    }
}

/// Accessibility switches for web-rendered hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AxSupport {
    pub enable: bool,
    pub additional_electron_bundles: Vec<String>,
    pub additional_chromium_bundles: Vec<String>,
    pub additional_firefox_bundles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Grid {
    pub enabled: bool,
    pub characters: String,
    pub subgrid_enabled: bool,
    /// Keys for the 3x3 subgrid; empty means reuse `characters`.
    pub sublayer_keys: String,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            enabled: true,
            characters: defaults::GRID_CHARACTERS.to_string(),
            subgrid_enabled: true,
            sublayer_keys: defaults::GRID_CHARACTERS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scroll {
    pub scroll_step: i32,
    pub scroll_step_half: i32,
    pub scroll_step_full: i32,
    pub highlight_scroll_area: bool,
    pub highlight_color: String,
    pub highlight_width: u32,
}

impl Default for Scroll {
    fn default() -> Self {
        Self {
            scroll_step: defaults::SCROLL_STEP,
            scroll_step_half: defaults::SCROLL_STEP_HALF,
            scroll_step_full: defaults::SCROLL_STEP_FULL,
            highlight_scroll_area: true,
            highlight_color: defaults::SCROLL_HIGHLIGHT.to_string(),
            highlight_width: defaults::SCROLL_HIGHLIGHT_WIDTH,
        }
    }
}

/// Action menu bindings and highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Action {
    pub left_click_key: String,
    pub right_click_key: String,
    pub double_click_key: String,
    pub middle_click_key: String,
    pub move_mouse_key: String,
    pub highlight_color: String,
    pub highlight_width: u32,
}

impl Default for Action {
    fn default() -> Self {
        Self {
            left_click_key: "l".into(),
            right_click_key: "r".into(),
            double_click_key: "d".into(),
            middle_click_key: "m".into(),
            move_mouse_key: "g".into(),
            highlight_color: defaults::ACTION_HIGHLIGHT.to_string(),
            highlight_width: defaults::ACTION_HIGHLIGHT_WIDTH,
        }
    }
}

impl Action {
    /// The five action keys in menu order: left, right, double, middle, move.
    pub fn keys(&self) -> [(&'static str, &str); 5] {
        [
            ("action.left_click_key", &self.left_click_key),
            ("action.right_click_key", &self.right_click_key),
            ("action.double_click_key", &self.double_click_key),
            ("action.middle_click_key", &self.middle_click_key),
            ("action.move_mouse_key", &self.move_mouse_key),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub log_level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            log_level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

/// Roles treated as clickable for one application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppRoles {
    /// Sorted, de-duplicated role names.
    pub roles: Vec<String>,
    /// Treat any enabled, non-empty element as clickable.
    pub ignore_clickable_check: bool,
}

impl Config {
    /// True when `bundle_id` is listed in `general.excluded_apps`, compared
    /// case-insensitively after trimming.
    pub fn is_app_excluded(&self, bundle_id: &str) -> bool {
        let id = bundle_id.trim().to_lowercase();
        if id.is_empty() {
            return false;
        }
        self.general
            .excluded_apps
            .iter()
            .any(|a| a.trim().to_lowercase() == id)
    }

    /// Clickable roles for `bundle_id`: the configured set merged with the
    /// application's extras, plus menubar and dock item roles when those hint
    /// sources are on.
    pub fn clickable_roles_for(&self, bundle_id: &str) -> AppRoles {
        let mut roles: Vec<String> = self
            .hints
            .clickable_roles
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        let mut ignore = self.hints.ignore_clickable_check;
        if let Some(app) = self.hints.app_configs.iter().find(|a| a.bundle_id == bundle_id) {
            roles.extend(
                app.additional_clickable_roles
                    .iter()
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty()),
            );
            ignore |= app.ignore_clickable_check;
        }
        if self.hints.include_menubar_hints {
            roles.push("AXMenuBarItem".into());
        }
        if self.hints.include_dock_hints {
            roles.push("AXDockItem".into());
        }
        roles.sort();
        roles.dedup();
        AppRoles {
            roles,
            ignore_clickable_check: ignore,
        }
    }

    /// The configuration as JSON, for the `config` IPC command.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
