//! Host application classes and their accessibility switches.
//!
//! Electron and browser engines only publish a full accessibility tree after
//! a specific attribute is set on their application element, and their trees
//! are much taller than native ones. Callers classify the focused bundle and
//! choose a depth budget from the class.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::AxBackend;

/// Attribute enabling accessibility in Electron applications.
pub const ELECTRON_ATTRIBUTE: &str = "AXManualAccessibility";

/// Attribute enabling the enhanced tree in Chromium and Firefox.
pub const ENHANCED_UI_ATTRIBUTE: &str = "AXEnhancedUserInterface";

/// Depth budget for native applications.
pub const NATIVE_DEPTH: usize = 12;

/// Depth budget for script-rendered applications.
pub const WEB_DEPTH: usize = 25;

const KNOWN_ELECTRON: &[&str] = &[
    "com.microsoft.VSCode",
    "com.exafunction.windsurf",
    "com.tinyspeck.slackmacgap",
    "com.spotify.client",
    "md.obsidian",
];

const KNOWN_CHROMIUM: &[&str] = &[
    "net.imput.helium",
    "com.google.Chrome",
    "com.brave.Browser",
    "company.thebrowser.Browser",
];

const KNOWN_FIREFOX: &[&str] = &["org.mozilla.firefox", "app.zen-browser.zen"];

/// Rendering technology of a host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostClass {
    /// Native toolkit.
    Native,
    /// Electron shell.
    Electron,
    /// Chromium-based browser.
    Chromium,
    /// Gecko-based browser.
    Firefox,
}

impl HostClass {
    /// Tree depth budget appropriate for the class.
    pub const fn max_depth(self) -> usize {
        match self {
            Self::Native => NATIVE_DEPTH,
            Self::Electron | Self::Chromium | Self::Firefox => WEB_DEPTH,
        }
    }

    /// Attribute that must be set to expose the full tree, if any.
    pub const fn attribute(self) -> Option<&'static str> {
        match self {
            Self::Native => None,
            Self::Electron => Some(ELECTRON_ATTRIBUTE),
            Self::Chromium | Self::Firefox => Some(ENHANCED_UI_ATTRIBUTE),
        }
    }
}

/// User-supplied bundle identifiers added to the built-in lists.
///
/// An entry ending in `*` matches any bundle with that prefix. Matching is
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostBundles {
    /// Extra Electron bundles.
    pub electron: Vec<String>,
    /// Extra Chromium bundles.
    pub chromium: Vec<String>,
    /// Extra Firefox bundles.
    pub firefox: Vec<String>,
}

fn matches_any<S: AsRef<str>>(bundle: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| {
        let p = p.as_ref().trim().to_lowercase();
        if p.is_empty() {
            return false;
        }
        match p.strip_suffix('*') {
            Some(prefix) => bundle.starts_with(prefix),
            None => bundle == p,
        }
    })
}

/// Classify a bundle identifier.
pub fn classify(bundle_id: &str, extra: &HostBundles) -> HostClass {
    let b = bundle_id.trim().to_lowercase();
    if b.is_empty() {
        return HostClass::Native;
    }
    if matches_any(&b, &extra.electron) || matches_any(&b, KNOWN_ELECTRON) {
        HostClass::Electron
    } else if matches_any(&b, &extra.chromium) || matches_any(&b, KNOWN_CHROMIUM) {
        HostClass::Chromium
    } else if matches_any(&b, &extra.firefox) || matches_any(&b, KNOWN_FIREFOX) {
        HostClass::Firefox
    } else {
        HostClass::Native
    }
}

/// Tracks which processes already had their accessibility switch flipped.
#[derive(Debug, Default)]
pub struct HostSupport {
    enabled: Mutex<HashMap<HostClass, HashSet<i32>>>,
}

impl HostSupport {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the accessibility switch for `class` is set on `pid`.
    ///
    /// Returns true when the switch is on, either from an earlier call or
    /// because it was just set. Native hosts need nothing and return true.
    pub fn ensure(&self, backend: &dyn AxBackend, class: HostClass, pid: i32) -> bool {
        let Some(attr) = class.attribute() else {
            return true;
        };
        if pid <= 0 {
            debug!("no pid for {:?} host", class);
            return false;
        }
        if self
            .enabled
            .lock()
            .get(&class)
            .is_some_and(|s| s.contains(&pid))
        {
            return true;
        }
        if !backend.set_application_attribute(pid, attr, true) {
            warn!("failed to enable {} for pid {}", attr, pid);
            return false;
        }
        debug!("enabled {} for pid {}", attr, pid);
        self.enabled.lock().entry(class).or_default().insert(pid);
        true
    }

    /// Whether `pid` is recorded as enabled for `class`.
    pub fn is_enabled(&self, class: HostClass, pid: i32) -> bool {
        self.enabled
            .lock()
            .get(&class)
            .is_some_and(|s| s.contains(&pid))
    }

    /// Forget `pid`, e.g. after the process exits.
    pub fn clear(&self, pid: i32) {
        for set in self.enabled.lock().values_mut() {
            set.remove(&pid);
        }
    }

    /// Forget every process.
    pub fn reset_all(&self) {
        self.enabled.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAx;

    #[test]
    fn classification() {
        let extra = HostBundles {
            electron: vec!["com.example.*".into()],
            ..HostBundles::default()
        };
        assert_eq!(classify("com.microsoft.vscode", &extra), HostClass::Electron);
        assert_eq!(classify("com.example.editor", &extra), HostClass::Electron);
        assert_eq!(classify(" com.google.Chrome ", &extra), HostClass::Chromium);
        assert_eq!(classify("org.mozilla.firefox", &extra), HostClass::Firefox);
        assert_eq!(classify("com.apple.finder", &extra), HostClass::Native);
        assert_eq!(classify("", &extra), HostClass::Native);
        assert_eq!(HostClass::Native.max_depth(), 12);
        assert_eq!(HostClass::Firefox.max_depth(), 25);
    }

    #[test]
    fn ensure_sets_attribute_once() {
        let ax = MockAx::new();
        let support = HostSupport::new();
        assert!(support.ensure(&ax, HostClass::Electron, 42));
        assert!(support.ensure(&ax, HostClass::Electron, 42));
        assert_eq!(ax.log().count("set_app_attr 42 AXManualAccessibility"), 1);
        assert!(support.is_enabled(HostClass::Electron, 42));
        support.clear(42);
        assert!(!support.is_enabled(HostClass::Electron, 42));
        assert!(support.ensure(&ax, HostClass::Native, 1));
        assert!(!support.ensure(&ax, HostClass::Chromium, 0));
    }

    #[test]
    fn ensure_reports_failure() {
        let ax = MockAx::new();
        ax.fail_set_attribute(true);
        let support = HostSupport::new();
        assert!(!support.ensure(&ax, HostClass::Chromium, 7));
        assert!(!support.is_enabled(HostClass::Chromium, 7));
    }
}
