use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Config, Error, Result, defaults};

/// `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$")
        .expect("hex color regex must compile")
});

fn check_color(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid(format!("{field} cannot be empty")));
    }
    if !HEX_COLOR.is_match(value) {
        return Err(Error::invalid(format!(
            "{field} has invalid hex color format: {value} (expected #RGB, #RRGGBB, or #RRGGBBAA)"
        )));
    }
    Ok(())
}

fn check_non_empty(items: &[String], field: &str) -> Result<()> {
    if items.iter().any(|s| s.trim().is_empty()) {
        return Err(Error::invalid(format!("{field} cannot contain empty values")));
    }
    Ok(())
}

/// Check a hint or grid alphabet: at least two characters, no whitespace, no
/// case-insensitive duplicates.
fn check_alphabet(chars: &str, field: &str) -> Result<()> {
    if chars.trim().is_empty() {
        return Err(Error::invalid(format!("{field} cannot be empty")));
    }
    let mut seen = HashSet::new();
    for c in chars.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            return Err(Error::invalid(format!("{field} cannot contain whitespace")));
        }
        if !seen.insert(c) {
            return Err(Error::invalid(format!("{field} contains duplicate character '{c}'")));
        }
    }
    if seen.len() < 2 {
        return Err(Error::invalid(format!("{field} must contain at least 2 characters")));
    }
    Ok(())
}

/// Validate a chord such as `Cmd+Shift+Space`: zero or more known modifiers
/// followed by a non-empty key.
pub fn validate_chord(chord: &str) -> Result<()> {
    let parts: Vec<&str> = chord.split('+').map(str::trim).collect();
    let Some((key, mods)) = parts.split_last() else {
        return Err(Error::invalid(format!("invalid hotkey format: {chord}")));
    };
    if let Some(m) = mods.iter().find(|m| !defaults::CHORD_MODIFIERS.contains(m)) {
        return Err(Error::invalid(format!(
            "hotkey has invalid modifier '{m}' in: {chord} (valid: {})",
            defaults::CHORD_MODIFIERS.join(", ")
        )));
    }
    if key.is_empty() {
        return Err(Error::invalid(format!("hotkey has empty key in: {chord}")));
    }
    Ok(())
}

impl Config {
    /// Check every section, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if !self.hints.enabled && !self.grid.enabled {
            return Err(Error::invalid(
                "at least one mode must be enabled: hints.enabled or grid.enabled",
            ));
        }
        self.validate_hints()?;
        self.validate_hotkeys()?;
        self.validate_grid()?;
        self.validate_scroll()?;
        self.validate_action()?;
        if !defaults::LOG_LEVELS.contains(&self.logging.log_level.as_str()) {
            return Err(Error::invalid(format!(
                "logging.log_level must be one of: {}",
                defaults::LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_hints(&self) -> Result<()> {
        let h = &self.hints;
        check_alphabet(&h.hint_characters, "hints.hint_characters")?;
        check_non_empty(&h.clickable_roles, "hints.clickable_roles")?;
        check_non_empty(
            &h.additional_menubar_hints_targets,
            "hints.additional_menubar_hints_targets",
        )?;
        if h.max_depth == 0 || h.web_max_depth == 0 {
            return Err(Error::invalid("hints.max_depth and hints.web_max_depth must be at least 1"));
        }
        for (i, app) in h.app_configs.iter().enumerate() {
            if app.bundle_id.trim().is_empty() {
                return Err(Error::invalid(format!(
                    "hints.app_configs[{i}].bundle_id cannot be empty"
                )));
            }
            check_non_empty(
                &app.additional_clickable_roles,
                &format!("hints.app_configs[{i}].additional_clickable_roles"),
            )?;
        }
        let s = &h.style;
        if !(0.0..=1.0).contains(&s.opacity) {
            return Err(Error::invalid("hints.style.opacity must be between 0 and 1"));
        }
        if !(6..=72).contains(&s.font_size) {
            return Err(Error::invalid("hints.style.font_size must be between 6 and 72"));
        }
        check_color(&s.background_color, "hints.style.background_color")?;
        check_color(&s.text_color, "hints.style.text_color")?;
        check_color(&s.matched_text_color, "hints.style.matched_text_color")?;
        check_color(&s.border_color, "hints.style.border_color")?;

        let ax = &self.additional_ax_support;
        check_non_empty(
            &ax.additional_electron_bundles,
            "additional_ax_support.additional_electron_bundles",
        )?;
        check_non_empty(
            &ax.additional_chromium_bundles,
            "additional_ax_support.additional_chromium_bundles",
        )?;
        check_non_empty(
            &ax.additional_firefox_bundles,
            "additional_ax_support.additional_firefox_bundles",
        )
    }

    fn validate_hotkeys(&self) -> Result<()> {
        for (chord, action) in &self.hotkeys.bindings {
            if chord.trim().is_empty() {
                return Err(Error::invalid("hotkeys.bindings contains an empty key"));
            }
            validate_chord(chord)?;
            if action.trim().is_empty() {
                return Err(Error::invalid(format!("hotkeys.bindings[{chord}] cannot be empty")));
            }
        }
        Ok(())
    }

    fn validate_grid(&self) -> Result<()> {
        let g = &self.grid;
        check_alphabet(&g.characters, "grid.characters")?;
        if g.subgrid_enabled {
            let keys = match g.sublayer_keys.trim() {
                "" => g.characters.as_str(),
                k => k,
            };
            if keys.chars().count() < defaults::SUBGRID_KEYS_REQUIRED {
                return Err(Error::invalid(format!(
                    "grid.sublayer_keys must contain at least {} characters for 3x3 subgrid selection",
                    defaults::SUBGRID_KEYS_REQUIRED
                )));
            }
        }
        Ok(())
    }

    fn validate_scroll(&self) -> Result<()> {
        let s = &self.scroll;
        for (value, field) in [
            (s.scroll_step, "scroll.scroll_step"),
            (s.scroll_step_half, "scroll.scroll_step_half"),
            (s.scroll_step_full, "scroll.scroll_step_full"),
        ] {
            if value < 1 {
                return Err(Error::invalid(format!("{field} must be at least 1")));
            }
        }
        if s.highlight_width < 1 {
            return Err(Error::invalid("scroll.highlight_width must be at least 1"));
        }
        check_color(&s.highlight_color, "scroll.highlight_color")
    }

    fn validate_action(&self) -> Result<()> {
        let a = &self.action;
        if a.highlight_width < 1 {
            return Err(Error::invalid("action.highlight_width must be at least 1"));
        }
        check_color(&a.highlight_color, "action.highlight_color")?;
        let mut seen = HashSet::new();
        for (field, key) in a.keys() {
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(Error::invalid(format!("{field} must be a single character")));
            };
            if c.is_whitespace() {
                return Err(Error::invalid(format!("{field} cannot be whitespace")));
            }
            if !seen.insert(c.to_ascii_lowercase()) {
                return Err(Error::invalid(format!("{field} duplicates another action key")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(cfg: &Config) -> String {
        match cfg.validate() {
            Err(Error::Validation { message, .. }) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn needs_one_mode() {
        let mut cfg = Config::default();
        cfg.hints.enabled = false;
        cfg.grid.enabled = false;
        assert!(invalid(&cfg).contains("at least one mode"));
    }

    #[test]
    fn hint_alphabet_rules() {
        let mut cfg = Config::default();
        cfg.hints.hint_characters = "a".into();
        assert!(invalid(&cfg).contains("at least 2"));
        cfg.hints.hint_characters = "asA".into();
        assert!(invalid(&cfg).contains("duplicate"));
        cfg.hints.hint_characters = "  ".into();
        assert!(invalid(&cfg).contains("cannot be empty"));
    }

    #[test]
    fn colors_and_steps() {
        let mut cfg = Config::default();
        cfg.scroll.highlight_color = "red".into();
        assert!(invalid(&cfg).contains("scroll.highlight_color"));
        cfg.scroll.highlight_color = "#f00".into();
        cfg.scroll.scroll_step = 0;
        assert!(invalid(&cfg).contains("scroll.scroll_step must be"));
    }

    #[test]
    fn action_keys_single_and_distinct() {
        let mut cfg = Config::default();
        cfg.action.move_mouse_key = "L".into();
        assert!(invalid(&cfg).contains("duplicates"));
        cfg.action.move_mouse_key = "go".into();
        assert!(invalid(&cfg).contains("single character"));
    }

    #[test]
    fn chords() {
        validate_chord("Cmd+Shift+Space").unwrap();
        validate_chord("F1").unwrap();
        assert!(validate_chord("Hyper+K").is_err());
        assert!(validate_chord("Cmd+").is_err());
        let mut cfg = Config::default();
        cfg.hotkeys.bindings.insert("Cmd+J".into(), " ".into());
        assert!(invalid(&cfg).contains("hotkeys.bindings[Cmd+J]"));
    }

    #[test]
    fn app_configs_need_bundle_ids() {
        let mut cfg = Config::default();
        cfg.hints.app_configs.push(crate::AppConfig::default());
        assert!(invalid(&cfg).contains("app_configs[0].bundle_id"));
    }

    #[test]
    fn log_level() {
        let mut cfg = Config::default();
        cfg.logging.log_level = "loud".into();
        assert!(invalid(&cfg).contains("log_level"));
        cfg.logging.log_level = "trace".into();
        cfg.validate().unwrap();
    }
}
