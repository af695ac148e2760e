//! Role tables and the runtime clickable-role registry.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::ElementInfo;

/// Roles that are never interactive. Their subtrees are not expanded.
pub static NON_INTERACTIVE_ROLES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["AXStaticText", "AXImage", "AXHeading"].into_iter().collect());

/// Interactive roles that are treated as leaves: their children are not
/// visited, and an empty-size instance is dropped outright.
pub static INTERACTIVE_LEAF_ROLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
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
    ]
    .into_iter()
    .collect()
});

/// Roles considered clickable when no configuration overrides them.
pub const DEFAULT_CLICKABLE_ROLES: &[&str] = &[
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

/// Whether the subtree below an element of `role` should be skipped.
pub fn is_terminal_role(role: &str) -> bool {
    NON_INTERACTIVE_ROLES.contains(role) || INTERACTIVE_LEAF_ROLES.contains(role)
}

/// Whether `role` is an interactive leaf.
pub fn is_interactive_leaf(role: &str) -> bool {
    INTERACTIVE_LEAF_ROLES.contains(role)
}

#[derive(Debug, Clone)]
struct RoleSet {
    clickable: HashSet<String>,
    ignore_clickable_check: bool,
}

/// Clickable roles in effect for the focused application.
///
/// Configuration installs the global roles at startup; on each focus change the
/// engine merges in per-application extras with [`RoleRegistry::set`].
#[derive(Debug)]
pub struct RoleRegistry {
    roles: RwLock<RoleSet>,
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CLICKABLE_ROLES.iter().copied())
    }
}

impl RoleRegistry {
    /// Registry containing exactly `roles`.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: RwLock::new(RoleSet {
                clickable: roles.into_iter().map(Into::into).collect(),
                ignore_clickable_check: false,
            }),
        }
    }

    /// Replace the role set. With `ignore_clickable_check`, every enabled
    /// element with a non-empty size is treated as clickable regardless of role.
    pub fn set<I, S>(&self, roles: I, ignore_clickable_check: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut w = self.roles.write();
        w.clickable = roles.into_iter().map(Into::into).collect();
        w.ignore_clickable_check = ignore_clickable_check;
    }

    /// Whether `role` is registered as clickable.
    pub fn contains(&self, role: &str) -> bool {
        self.roles.read().clickable.contains(role)
    }

    /// Sorted snapshot of the registered roles.
    pub fn roles(&self) -> Vec<String> {
        let mut v: Vec<String> = self.roles.read().clickable.iter().cloned().collect();
        v.sort();
        v
    }

    /// Whether an element with this snapshot is an enabled clickable element.
    pub fn is_clickable(&self, info: &ElementInfo) -> bool {
        if !info.enabled {
            return false;
        }
        let r = self.roles.read();
        if r.ignore_clickable_check {
            return !info.size.is_empty();
        }
        r.clickable.contains(info.role.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(role: &str, enabled: bool) -> ElementInfo {
        ElementInfo {
            role: role.into(),
            enabled,
            size: crate::Size::new(10, 10),
            ..ElementInfo::default()
        }
    }

    #[test]
    fn disabled_elements_are_never_clickable() {
        let reg = RoleRegistry::default();
        assert!(reg.is_clickable(&info("AXButton", true)));
        assert!(!reg.is_clickable(&info("AXButton", false)));
        assert!(!reg.is_clickable(&info("AXGroup", true)));
    }

    #[test]
    fn set_replaces_roles_and_honours_ignore_flag() {
        let reg = RoleRegistry::default();
        reg.set(["AXGroup"], false);
        assert!(reg.is_clickable(&info("AXGroup", true)));
        assert!(!reg.is_clickable(&info("AXButton", true)));
        reg.set(Vec::<String>::new(), true);
        assert!(reg.is_clickable(&info("AXWhatever", true)));
        assert!(!reg.is_clickable(&info("AXWhatever", false)));
        let empty = ElementInfo {
            size: crate::Size::default(),
            ..info("AXWhatever", true)
        };
        assert!(!reg.is_clickable(&empty));
    }

    #[test]
    fn terminal_roles() {
        assert!(is_terminal_role("AXStaticText"));
        assert!(is_terminal_role("AXButton"));
        assert!(!is_terminal_role("AXGroup"));
        assert!(is_interactive_leaf("AXMenuItem"));
        assert!(!is_interactive_leaf("AXImage"));
    }
}
