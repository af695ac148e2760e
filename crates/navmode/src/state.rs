use hints::{Hint, HintCollection, InputOutcome};
use tracing::{debug, trace};

use crate::{
    ActionKeys, ClickAction, Key, MenuItem, NavmodeError, ScrollKey, ScrollKeys, ScrollOp,
    action_menu,
};

/// Vertical gap between a selected hint's anchor and its action menu.
const MENU_OFFSET_Y: i32 = 20;

/// Which flavour of hint mode is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintVariant {
    /// Resolving a hint performs this action immediately.
    Direct(ClickAction),
    /// Resolving a hint opens the action menu. Tab returns to direct hints
    /// with the carried action.
    Actions(ClickAction),
    /// Hints label scrollable areas; resolving one enters scroll mode.
    ScrollSelect,
}

/// What scroll mode scrolls.
#[derive(Debug, Clone)]
pub enum ScrollTarget {
    /// Whatever is under the pointer.
    Cursor,
    /// An element picked from scroll-select hints.
    Element(Hint),
}

/// The interaction mode.
#[derive(Debug, Clone, Default)]
pub enum Mode {
    /// Nothing active; keys are not captured.
    #[default]
    Idle,
    /// Hints are drawn and typed keys filter them.
    Hint(HintVariant),
    /// A hint was selected in action mode and the menu is open.
    ActionPending(Hint),
    /// Vim-style keys scroll the target.
    Scroll(ScrollTarget),
    /// The grid surface owns the keyboard.
    Grid,
}

impl Mode {
    /// Short name reported over IPC.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Hint(HintVariant::ScrollSelect) => "scroll",
            Self::Hint(_) | Self::ActionPending(_) => "hints",
            Self::Scroll(_) => "scroll",
            Self::Grid => "grid",
        }
    }

    /// True for every mode except [`Mode::Idle`].
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Result of handling a key press
#[derive(Debug)]
#[allow(missing_docs)]
pub enum ModeResponse {
    /// Key consumed with no visible effect
    Ok,
    /// Leave the current mode
    Exit,
    /// The typed prefix changed; redraw the filtered hints
    Redraw,
    /// Perform `action` on the hint's element, then leave the mode
    Invoke { action: ClickAction, hint: Hint },
    /// Draw the action menu for the selected hint
    ShowActionMenu { hint: Hint, items: Vec<MenuItem> },
    /// The selection was dropped; redraw every hint
    BackToHints,
    /// Tear down and activate hints again with a new variant
    Reactivate(HintVariant),
    /// Scroll mode was entered; `target` is `None` when scrolling at the pointer
    EnterScroll { target: Option<Hint> },
    /// Scroll the current target
    Scroll(ScrollOp),
    /// Replace the scroll target via scroll-select hints
    Retarget,
    /// Forward the key to the grid surface
    Grid(Key),
}

/// Mode plus the transient state each mode needs.
#[derive(Debug, Default)]
pub struct State {
    mode: Mode,
    hints: Option<HintCollection>,
    /// Tab target of the action menu, kept while a menu is open.
    menu_return: Option<ClickAction>,
    scroll_keys: ScrollKeys,
    action_keys: ActionKeys,
}

impl State {
    /// Idle state with the given action bindings.
    pub fn new(action_keys: ActionKeys) -> Self {
        Self {
            action_keys,
            ..Self::default()
        }
    }

    /// Current mode.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// True when any mode other than idle is active.
    pub fn is_active(&self) -> bool {
        self.mode.is_active()
    }

    /// Hints on screen, if hint mode is active.
    pub fn hints(&self) -> Option<&HintCollection> {
        self.hints.as_ref()
    }

    /// Hints matching the typed prefix.
    pub fn visible_hints(&self) -> Vec<Hint> {
        self.hints
            .as_ref()
            .map(|c| c.filtered().cloned().collect())
            .unwrap_or_default()
    }

    /// The hint whose action menu is open.
    pub fn selected(&self) -> Option<&Hint> {
        match &self.mode {
            Mode::ActionPending(h) => Some(h),
            _ => None,
        }
    }

    /// Replace the action bindings.
    pub fn set_action_keys(&mut self, keys: ActionKeys) {
        self.action_keys = keys;
    }

    /// Start hint mode over `hints`.
    pub fn enter_hints(
        &mut self,
        variant: HintVariant,
        hints: HintCollection,
    ) -> Result<(), NavmodeError> {
        if hints.is_empty() {
            return Err(NavmodeError::NoHints);
        }
        debug!("entering hint mode {:?} with {} hints", variant, hints.len());
        self.hints = Some(hints);
        self.mode = Mode::Hint(variant);
        Ok(())
    }

    /// Start scroll mode.
    pub fn enter_scroll(&mut self, target: ScrollTarget) {
        self.hints = None;
        self.scroll_keys.reset();
        self.mode = Mode::Scroll(target);
    }

    /// Start grid mode.
    pub fn enter_grid(&mut self) {
        self.hints = None;
        self.mode = Mode::Grid;
    }

    /// Drop hints, selection and any pending scroll key. The mode itself is
    /// left alone so the caller can tear down the display first.
    pub fn clear_selection(&mut self) {
        self.hints = None;
        self.scroll_keys.reset();
        if let Mode::ActionPending(_) = self.mode {
            self.mode = Mode::Hint(self.actions_variant());
        }
    }

    /// Return to idle.
    pub fn reset(&mut self) {
        self.clear_selection();
        self.menu_return = None;
        self.mode = Mode::Idle;
    }

    /// The action-menu variant an open menu backs out to.
    fn actions_variant(&self) -> HintVariant {
        HintVariant::Actions(self.menu_return.unwrap_or(ClickAction::Left))
    }

    /// Process a key press in the current mode.
    pub fn handle_key(&mut self, key: Key) -> Result<ModeResponse, NavmodeError> {
        trace!("key {} in {}", key, self.mode.name());
        if key == Key::Escape {
            return Ok(if self.is_active() {
                ModeResponse::Exit
            } else {
                ModeResponse::Ok
            });
        }
        match self.mode.clone() {
            Mode::Idle => Ok(ModeResponse::Ok),
            Mode::Hint(variant) => self.handle_hint(variant, key),
            Mode::ActionPending(hint) => self.handle_action_pending(hint, key),
            Mode::Scroll(_) => Ok(self.handle_scroll(key)),
            Mode::Grid => Ok(ModeResponse::Grid(key)),
        }
    }

    fn handle_hint(&mut self, variant: HintVariant, key: Key) -> Result<ModeResponse, NavmodeError> {
        match key {
            Key::Tab => return Ok(self.handle_tab(variant)),
            Key::Backspace => {
                let Some(c) = self.hints.as_mut() else {
                    return Ok(ModeResponse::Ok);
                };
                c.backspace();
                return Ok(ModeResponse::Redraw);
            }
            _ => {}
        }
        let Key::Char(ch) = key else {
            return Ok(ModeResponse::Ok);
        };
        let Some(c) = self.hints.as_mut() else {
            return Err(NavmodeError::NoHints);
        };
        match c.handle_input(ch) {
            InputOutcome::Resolved(hint) => Ok(self.resolve(variant, hint)),
            InputOutcome::Filtered { .. } | InputOutcome::Reset => Ok(ModeResponse::Redraw),
            InputOutcome::Ignored => Ok(ModeResponse::Ok),
        }
    }

    fn handle_tab(&mut self, variant: HintVariant) -> ModeResponse {
        match variant {
            HintVariant::Direct(action) => ModeResponse::Reactivate(HintVariant::Actions(action)),
            HintVariant::Actions(back) => ModeResponse::Reactivate(HintVariant::Direct(back)),
            HintVariant::ScrollSelect => {
                self.enter_scroll(ScrollTarget::Cursor);
                ModeResponse::EnterScroll { target: None }
            }
        }
    }

    fn resolve(&mut self, variant: HintVariant, hint: Hint) -> ModeResponse {
        debug!("hint {} selected for {:?}", hint.label, variant);
        match variant {
            HintVariant::Direct(action) => ModeResponse::Invoke { action, hint },
            HintVariant::Actions(back) => {
                self.menu_return = Some(back);
                let origin = hint.anchor.offset(0, MENU_OFFSET_Y);
                let items = action_menu(origin, &self.action_keys);
                self.mode = Mode::ActionPending(hint.clone());
                ModeResponse::ShowActionMenu { hint, items }
            }
            HintVariant::ScrollSelect => {
                self.enter_scroll(ScrollTarget::Element(hint.clone()));
                ModeResponse::EnterScroll { target: Some(hint) }
            }
        }
    }

    fn handle_action_pending(&mut self, hint: Hint, key: Key) -> Result<ModeResponse, NavmodeError> {
        match key {
            Key::Backspace => {
                if let Some(c) = self.hints.as_mut() {
                    c.reset();
                }
                self.mode = Mode::Hint(self.actions_variant());
                Ok(ModeResponse::BackToHints)
            }
            Key::Char(ch) => match self.action_keys.action_for(ch) {
                Some(action) => Ok(ModeResponse::Invoke { action, hint }),
                None => Ok(ModeResponse::Ok),
            },
            _ => Ok(ModeResponse::Ok),
        }
    }

    fn handle_scroll(&mut self, key: Key) -> ModeResponse {
        match self.scroll_keys.parse(key) {
            ScrollKey::Op(op) => ModeResponse::Scroll(op),
            ScrollKey::Retarget => ModeResponse::Retarget,
            ScrollKey::Pending | ScrollKey::Ignored => ModeResponse::Ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use ax_query::{Candidate, mock::MockElement};
    use hints::HintGenerator;

    use super::*;

    fn collection(n: usize) -> HintCollection {
        let cands = (0..n)
            .map(|i| {
                let el = MockElement::new(i as u64, "AXButton", (i as i32 * 40, 0, 30, 20))
                    .title(&format!("b{i}"))
                    .into_element();
                let info = el.info().unwrap();
                Candidate::new(el, info)
            })
            .collect();
        let g = HintGenerator::new("asd").unwrap();
        HintCollection::new(g.generate(cands).unwrap(), g.alphabet())
    }

    fn press(s: &mut State, keys: &str) -> ModeResponse {
        let mut last = ModeResponse::Ok;
        for c in keys.chars() {
            last = s.handle_key(Key::parse(&c.to_string()).unwrap()).unwrap();
        }
        last
    }

    #[test]
    fn escape_only_exits_active_modes() {
        let mut s = State::default();
        match press(&mut s, "\x1b") {
            ModeResponse::Ok => {}
            other => panic!("{:?}", other),
        }
        s.enter_grid();
        match press(&mut s, "\x1b") {
            ModeResponse::Exit => {}
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn direct_hint_invokes_action() {
        let mut s = State::default();
        s.enter_hints(HintVariant::Direct(ClickAction::Right), collection(5))
            .unwrap();
        match press(&mut s, "s") {
            ModeResponse::Redraw => {}
            other => panic!("{:?}", other),
        }
        assert_eq!(s.visible_hints().len(), 2);
        match press(&mut s, "a") {
            ModeResponse::Invoke { action, hint } => {
                assert_eq!(action, ClickAction::Right);
                assert_eq!(hint.label, "SA");
            }
            other => panic!("{:?}", other),
        }
        assert_eq!(s.mode().name(), "hints");
        s.reset();
        assert!(!s.is_active());
        assert!(s.hints().is_none());
    }

    #[test]
    fn action_mode_menu_and_backspace() {
        let mut s = State::default();
        s.enter_hints(HintVariant::Actions(ClickAction::Left), collection(3))
            .unwrap();
        match press(&mut s, "d") {
            ModeResponse::ShowActionMenu { hint, items } => {
                assert_eq!(hint.label, "D");
                assert_eq!(items.len(), 5);
                assert_eq!(items[0].position.y, hint.anchor.y + MENU_OFFSET_Y);
            }
            other => panic!("{:?}", other),
        }
        assert_eq!(s.selected().map(|h| h.label.as_str()), Some("D"));
        // keys outside the action set do nothing
        assert!(matches!(press(&mut s, "x"), ModeResponse::Ok));
        match press(&mut s, "\x7f") {
            ModeResponse::BackToHints => {}
            other => panic!("{:?}", other),
        }
        assert!(s.selected().is_none());
        assert!(matches!(
            s.mode(),
            Mode::Hint(HintVariant::Actions(ClickAction::Left))
        ));
        assert_eq!(s.hints().unwrap().input(), "");
        press(&mut s, "a");
        match press(&mut s, "g") {
            ModeResponse::Invoke { action, hint } => {
                assert_eq!(action, ClickAction::Move);
                assert_eq!(hint.label, "A");
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn tab_toggles_hint_variants() {
        let mut s = State::default();
        s.enter_hints(HintVariant::Direct(ClickAction::Left), collection(3))
            .unwrap();
        assert!(matches!(
            press(&mut s, "\t"),
            ModeResponse::Reactivate(HintVariant::Actions(ClickAction::Left))
        ));
        s.enter_hints(HintVariant::Actions(ClickAction::Left), collection(3))
            .unwrap();
        assert!(matches!(
            press(&mut s, "\t"),
            ModeResponse::Reactivate(HintVariant::Direct(ClickAction::Left))
        ));
    }

    #[test]
    fn tab_round_trip_keeps_the_direct_action() {
        let mut s = State::default();
        s.enter_hints(HintVariant::Direct(ClickAction::Right), collection(3))
            .unwrap();
        let ModeResponse::Reactivate(menu) = press(&mut s, "\t") else {
            panic!("tab should switch variants");
        };
        assert_eq!(menu, HintVariant::Actions(ClickAction::Right));
        s.reset();
        s.enter_hints(menu, collection(3)).unwrap();

        // opening and closing the menu does not lose the action
        press(&mut s, "a");
        assert!(matches!(press(&mut s, "\x7f"), ModeResponse::BackToHints));
        assert_eq!(s.mode().name(), "hints");
        assert!(matches!(
            press(&mut s, "\t"),
            ModeResponse::Reactivate(HintVariant::Direct(ClickAction::Right))
        ));
    }

    #[test]
    fn scroll_select_then_scroll() {
        let mut s = State::default();
        s.enter_hints(HintVariant::ScrollSelect, collection(2)).unwrap();
        assert_eq!(s.mode().name(), "scroll");
        match press(&mut s, "s") {
            ModeResponse::EnterScroll { target: Some(h) } => assert_eq!(h.label, "S"),
            other => panic!("{:?}", other),
        }
        assert!(matches!(s.mode(), Mode::Scroll(ScrollTarget::Element(_))));
        assert!(matches!(press(&mut s, "g"), ModeResponse::Ok));
        assert!(matches!(press(&mut s, "g"), ModeResponse::Scroll(ScrollOp::Top)));
        assert!(matches!(press(&mut s, "\x04"), ModeResponse::Scroll(ScrollOp::HalfDown)));
        assert!(matches!(press(&mut s, "\t"), ModeResponse::Retarget));
    }

    #[test]
    fn tab_in_scroll_select_scrolls_at_cursor() {
        let mut s = State::default();
        s.enter_hints(HintVariant::ScrollSelect, collection(2)).unwrap();
        match press(&mut s, "\t") {
            ModeResponse::EnterScroll { target: None } => {}
            other => panic!("{:?}", other),
        }
        assert!(matches!(s.mode(), Mode::Scroll(ScrollTarget::Cursor)));
        assert!(s.hints().is_none());
    }

    #[test]
    fn grid_forwards_keys_and_empty_hints_rejected() {
        let mut s = State::default();
        s.enter_grid();
        assert!(matches!(press(&mut s, "q"), ModeResponse::Grid(Key::Char('q'))));
        let empty = HintCollection::new(Vec::new(), &['A', 'S']);
        assert!(matches!(
            s.enter_hints(HintVariant::Actions(ClickAction::Left), empty),
            Err(NavmodeError::NoHints)
        ));
    }
}
