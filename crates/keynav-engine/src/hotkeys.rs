use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use config::Config;
use tracing::{debug, trace, warn};

use crate::deps::HotkeyApi;

/// Threshold for warning about slow binding updates that may cause key drops
const BIND_UPDATE_WARN_MS: u64 = 10;

/// Bindings from `config` that should be registered: trimmed, non-empty,
/// and not pointing at a mode that configuration disables.
pub fn desired_bindings(config: &Config) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (chord, action) in &config.hotkeys.bindings {
        let (chord, action) = (chord.trim(), action.trim());
        if chord.is_empty() || action.is_empty() {
            continue;
        }
        let mode = action.split_whitespace().next().unwrap_or_default();
        let disabled = match mode {
            "hints" => !config.hints.enabled,
            "grid" => !config.grid.enabled,
            _ => false,
        };
        if disabled {
            debug!("skipping hotkey {} for disabled mode {}", chord, mode);
            continue;
        }
        out.push((chord.to_string(), action.to_string()));
    }
    out
}

/// Registered global hotkeys and the actions they trigger.
pub struct HotkeyRegistry {
    api: Arc<dyn HotkeyApi>,
    /// Registration id → chord.
    id_map: HashMap<u32, String>,
    /// Chord → registration id.
    inv_map: HashMap<String, u32>,
    /// Chord → action string.
    actions: HashMap<String, String>,
    last_bound: HashSet<String>,
}

impl HotkeyRegistry {
    /// Empty registry over `api`.
    pub fn new(api: Arc<dyn HotkeyApi>) -> Self {
        Self {
            api,
            id_map: HashMap::new(),
            inv_map: HashMap::new(),
            actions: HashMap::new(),
            last_bound: HashSet::new(),
        }
    }

    /// Bring registrations in line with `bindings` (chord, action).
    ///
    /// Unchanged chords stay registered; removed chords are unregistered
    /// before new ones are added. A chord that fails to register is logged
    /// and left out; the rest proceed. Returns true if the chord set changed.
    pub fn update_bindings(&mut self, bindings: Vec<(String, String)>) -> bool {
        let start = Instant::now();
        let desired: HashSet<String> = bindings.iter().map(|(c, _)| c.clone()).collect();
        self.actions = bindings.into_iter().collect();

        if self.last_bound == desired {
            trace!("Bindings unchanged, skipping update");
            return false;
        }

        let added: Vec<String> = desired.difference(&self.last_bound).cloned().collect();
        let removed: Vec<String> = self.last_bound.difference(&desired).cloned().collect();
        if !added.is_empty() {
            debug!("Adding hotkeys: {:?}", added);
        }
        if !removed.is_empty() {
            debug!("Removing hotkeys: {:?}", removed);
        }

        for chord in &removed {
            if let Some(id) = self.inv_map.remove(chord) {
                if let Err(e) = self.api.unregister(id) {
                    warn!("failed to unregister hotkey {}: {}", chord, e);
                }
                self.id_map.remove(&id);
                trace!("Unregistered hotkey: {} (id {})", chord, id);
            }
        }

        let mut bound: HashSet<String> = desired.intersection(&self.last_bound).cloned().collect();
        for chord in added {
            match self.api.register(&chord) {
                Ok(id) => {
                    self.id_map.insert(id, chord.clone());
                    self.inv_map.insert(chord.clone(), id);
                    trace!("Registered hotkey: {} with id {}", chord, id);
                    bound.insert(chord);
                }
                Err(e) => warn!("failed to register hotkey {}: {}", chord, e),
            }
        }

        let elapsed = start.elapsed();
        debug!(
            "Binding update completed in {:?}: {} hotkeys active",
            elapsed,
            bound.len()
        );
        if elapsed > Duration::from_millis(BIND_UPDATE_WARN_MS) {
            warn!("Binding update took {:?}, may cause key drops", elapsed);
        }
        self.last_bound = bound;
        true
    }

    /// Release every registration.
    pub fn unregister_all(&mut self) {
        if self.last_bound.is_empty() {
            return;
        }
        debug!("unregistering {} hotkeys", self.last_bound.len());
        let actions = std::mem::take(&mut self.actions);
        self.update_bindings(Vec::new());
        self.actions = actions;
    }

    /// True when at least one chord is registered.
    pub fn is_registered(&self) -> bool {
        !self.inv_map.is_empty()
    }

    /// Resolve a registration id to (chord, action).
    pub fn resolve(&self, id: u32) -> Option<(String, String)> {
        let chord = self.id_map.get(&id)?;
        let action = self.actions.get(chord)?;
        Some((chord.clone(), action.clone()))
    }

    /// Snapshot registered bindings as sorted (chord, action) pairs.
    pub fn bindings_snapshot(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .inv_map
            .keys()
            .filter_map(|c| self.actions.get(c).map(|a| (c.clone(), a.clone())))
            .collect();
        pairs.sort();
        pairs
    }

    pub(crate) fn id_for_chord(&self, chord: &str) -> Option<u32> {
        self.inv_map.get(chord).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHotkeyApi;

    fn pairs(p: &[(&str, &str)]) -> Vec<(String, String)> {
        p.iter().map(|(c, a)| (c.to_string(), a.to_string())).collect()
    }

    #[test]
    fn incremental_update() {
        let api = Arc::new(MockHotkeyApi::new());
        let mut reg = HotkeyRegistry::new(api.clone());
        assert!(reg.update_bindings(pairs(&[("Cmd+A", "hints"), ("Cmd+B", "grid")])));
        let a = reg.id_for_chord("Cmd+A").unwrap();
        assert!(!reg.update_bindings(pairs(&[("Cmd+A", "hints"), ("Cmd+B", "grid")])));

        assert!(reg.update_bindings(pairs(&[("Cmd+A", "idle"), ("Cmd+C", "exec true")])));
        // kept chords keep their id but pick up the new action
        assert_eq!(reg.id_for_chord("Cmd+A"), Some(a));
        assert_eq!(reg.resolve(a), Some(("Cmd+A".into(), "idle".into())));
        assert!(reg.id_for_chord("Cmd+B").is_none());
        assert_eq!(api.registered(), vec!["Cmd+A", "Cmd+C"]);
        assert_eq!(
            reg.bindings_snapshot(),
            pairs(&[("Cmd+A", "idle"), ("Cmd+C", "exec true")])
        );
    }

    #[test]
    fn failed_registration_does_not_abort_the_rest() {
        let api = Arc::new(MockHotkeyApi::new());
        api.fail_chord("Cmd+Bad");
        let mut reg = HotkeyRegistry::new(api.clone());
        reg.update_bindings(pairs(&[("Cmd+Bad", "hints"), ("Cmd+Good", "grid")]));
        assert_eq!(api.registered(), vec!["Cmd+Good"]);
        assert!(reg.is_registered());
        reg.unregister_all();
        assert!(!reg.is_registered());
        assert!(api.registered().is_empty());
    }

    #[test]
    fn disabled_modes_are_skipped() {
        let mut cfg = Config::default();
        cfg.hotkeys.bindings.clear();
        cfg.hotkeys.bindings.insert("Cmd+H".into(), " hints actions ".into());
        cfg.hotkeys.bindings.insert("Cmd+G".into(), "grid".into());
        cfg.hotkeys.bindings.insert("Cmd+E".into(), "  ".into());
        cfg.grid.enabled = false;
        assert_eq!(desired_bindings(&cfg), pairs(&[("Cmd+H", "hints actions")]));
    }
}
