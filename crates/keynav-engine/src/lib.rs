//! Keynav Engine
//!
//! The engine turns commands, hotkeys and captured keystrokes into mode
//! transitions and side effects:
//! - activates hint, scroll and grid modes and tears them down again
//! - routes captured keys through the [`navmode`] state machine
//! - performs clicks, pointer moves and scrolls
//! - keeps global hotkeys in line with configuration and the focused app
//! - runs `exec` bindings through the user's shell
//!
//! Rendering, keystroke capture, hotkey registration and the pointer are
//! collaborators behind the traits in [`deps`]. [`mock`] provides recording
//! implementations for tests.
use std::{
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

mod action;
mod cursor;
pub mod deps;
mod error;
mod focus;
pub mod hotkeys;
pub mod mock;
pub mod shell;

// Timing constants for warning thresholds
const KEY_PROC_WARN_MS: u64 = 5;
const ACTIVATION_WARN_MS: u64 = 250;

use ax_query::{
    AxBackend, Candidate, CollectOptions, HostBundles, HostClass, HostSupport, InfoCache, Rect,
    RoleRegistry, classify, clickable_candidates, restrict_to_screen, scrollable_candidates,
};
use config::{Config, LoadedConfig};
use futures::FutureExt;
use hints::{Hint, HintCollection, HintGenerator};
use keynav_protocol::{Command, Response, StatusData};
use navmode::{
    ActionKeys, ClickAction, HintVariant, Key, MenuItem, Mode, ModeResponse, ScrollOp,
    ScrollSteps, ScrollTarget, State,
};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

pub use action::HotkeyAction;
pub use cursor::{CursorAction, restore_position};
pub use deps::{EventTap, GridStep, GridSurface, HotkeyApi, Overlay, Pointer};
pub use error::{Error, Result};
pub use focus::{FocusEvent, FocusWatchers};
pub use shell::{COMMAND_TIMEOUT, ShellOutcome};

use cursor::CursorMemory;
use hotkeys::{HotkeyRegistry, desired_bindings};

/// Handles to the platform collaborators.
#[derive(Clone)]
#[allow(missing_docs)]
pub struct Collaborators {
    pub ax: Arc<dyn AxBackend>,
    pub overlay: Arc<dyn Overlay>,
    pub tap: Arc<dyn EventTap>,
    pub hotkeys: Arc<dyn HotkeyApi>,
    pub pointer: Arc<dyn Pointer>,
    pub grid: Arc<dyn GridSurface>,
}

/// Outcome of a successful hint or grid activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The mode is now active.
    Entered,
    /// The focused application is excluded; the engine stays idle.
    Excluded,
    /// Nothing eligible was on screen; the engine stays idle.
    NothingFound,
}

impl Activation {
    /// Reply text for the IPC caller, given the mode that was requested.
    pub fn message(self, mode: &str) -> String {
        match self {
            Self::Entered => format!("{mode} mode activated"),
            Self::Excluded => "focused application is excluded; mode unchanged".to_string(),
            Self::NothingFound => "no elements found; mode unchanged".to_string(),
        }
    }
}

/// The focused application, as far as the accessibility API can tell.
#[derive(Debug, Default)]
struct Focused {
    bundle: Option<String>,
    pid: Option<i32>,
}

fn action_keys(cfg: &config::Action) -> ActionKeys {
    let d = ActionKeys::default();
    let first = |s: &str, fallback: char| s.trim().chars().next().unwrap_or(fallback);
    ActionKeys {
        left: first(&cfg.left_click_key, d.left),
        right: first(&cfg.right_click_key, d.right),
        double: first(&cfg.double_click_key, d.double),
        middle: first(&cfg.middle_click_key, d.middle),
        move_to: first(&cfg.move_mouse_key, d.move_to),
    }
}

fn scroll_steps(cfg: &config::Scroll) -> ScrollSteps {
    ScrollSteps {
        step: cfg.scroll_step,
        half_page: cfg.scroll_step_half,
        full: cfg.scroll_step_full,
    }
}

fn host_bundles(cfg: &config::AxSupport) -> HostBundles {
    HostBundles {
        electron: cfg.additional_electron_bundles.clone(),
        chromium: cfg.additional_chromium_bundles.clone(),
        firefox: cfg.additional_firefox_bundles.clone(),
    }
}

/// Translate a global rectangle into coordinates local to `screen`.
fn localize(r: Rect, screen: Rect) -> Rect {
    Rect::new(
        r.min_x().saturating_sub(screen.min_x()),
        r.min_y().saturating_sub(screen.min_y()),
        r.width(),
        r.height(),
    )
}

fn panic_message(p: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Engine coordinates mode state, overlay, hotkeys and command dispatch.
///
/// Construct via [`Engine::new`], call [`Engine::install`] once inside the
/// runtime, then feed it commands ([`Engine::handle_command`]), captured keys
/// ([`Engine::handle_key`]) and hotkey events ([`Engine::dispatch_hotkey`]).
#[derive(Clone)]
pub struct Engine {
    deps: Collaborators,
    /// Active configuration and where it came from.
    config: Arc<RwLock<LoadedConfig>>,
    /// Mode state. Held for the whole of an activation, so activations never
    /// interleave.
    state: Arc<tokio::sync::Mutex<State>>,
    enabled: Arc<AtomicBool>,
    cache: InfoCache,
    roles: Arc<RoleRegistry>,
    host: Arc<HostSupport>,
    hotkeys: Arc<RwLock<HotkeyRegistry>>,
    focus: FocusWatchers,
    /// Set when a hotkey refresh was requested while a mode was active.
    pending_hotkey_refresh: Arc<AtomicBool>,
    cursor: Arc<Mutex<CursorMemory>>,
}

impl Engine {
    /// Create an enabled engine in idle mode.
    pub fn new(deps: Collaborators, loaded: LoadedConfig) -> Self {
        let state = State::new(action_keys(&loaded.config.action));
        let roles = RoleRegistry::default();
        let app_roles = loaded.config.clickable_roles_for("");
        roles.set(app_roles.roles, app_roles.ignore_clickable_check);
        Self {
            hotkeys: Arc::new(RwLock::new(HotkeyRegistry::new(deps.hotkeys.clone()))),
            deps,
            config: Arc::new(RwLock::new(loaded)),
            state: Arc::new(tokio::sync::Mutex::new(state)),
            enabled: Arc::new(AtomicBool::new(true)),
            cache: InfoCache::default(),
            roles: Arc::new(roles),
            host: Arc::new(HostSupport::new()),
            focus: FocusWatchers::new(),
            pending_hotkey_refresh: Arc::new(AtomicBool::new(false)),
            cursor: Arc::new(Mutex::new(CursorMemory::default())),
        }
    }

    /// Subscribe to focus changes and register the configured hotkeys.
    ///
    /// Must be called from within a tokio runtime; focus callbacks are
    /// spawned onto it.
    pub fn install(&self) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Msg(format!("no runtime for focus watcher: {e}")))?;
        let engine = self.clone();
        self.focus.subscribe(move |ev| {
            let engine = engine.clone();
            let ev = ev.clone();
            handle.spawn(async move { engine.on_focus_changed(ev).await });
        });
        self.refresh_hotkeys_now();
        info!("engine installed");
        Ok(())
    }

    /// Registry the platform focus watcher notifies.
    pub fn focus_watchers(&self) -> &FocusWatchers {
        &self.focus
    }

    /// The attribute cache shared by every activation.
    pub fn cache(&self) -> &InfoCache {
        &self.cache
    }

    /// A copy of the active configuration.
    pub fn config(&self) -> Config {
        self.config.read().config.clone()
    }

    /// Install a new configuration. Any active mode is exited first.
    pub async fn set_config(&self, loaded: LoadedConfig) {
        let mut st = self.state.lock().await;
        self.exit_locked(&mut st);
        st.set_action_keys(action_keys(&loaded.config.action));
        let app_roles = loaded.config.clickable_roles_for("");
        self.roles
            .set(app_roles.roles, app_roles.ignore_clickable_check);
        info!("configuration replaced from {}", loaded.source());
        *self.config.write() = loaded;
        self.refresh_hotkeys_now();
    }

    /// Whether activations are accepted.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Accept activations again. Returns false if already enabled.
    pub async fn enable(&self) -> bool {
        if self.enabled.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("keynav enabled");
        self.request_hotkey_refresh().await;
        true
    }

    /// Leave any mode and refuse activations. Returns false if already disabled.
    pub async fn disable(&self) -> bool {
        if !self.enabled.swap(false, Ordering::SeqCst) {
            return false;
        }
        let mut st = self.state.lock().await;
        self.exit_locked(&mut st);
        self.refresh_hotkeys_now();
        info!("keynav disabled");
        true
    }

    /// Current mode.
    pub async fn mode(&self) -> Mode {
        self.state.lock().await.mode().clone()
    }

    /// Name of the current mode as reported by `status`.
    pub async fn mode_name(&self) -> &'static str {
        self.state.lock().await.mode().name()
    }

    /// Leave the current mode, if any.
    pub async fn exit(&self) {
        let mut st = self.state.lock().await;
        self.exit_locked(&mut st);
    }

    /// Tear down for process exit: leave the mode, release hotkeys and forget
    /// host accessibility switches.
    pub async fn shutdown(&self) {
        let mut st = self.state.lock().await;
        self.exit_locked(&mut st);
        self.hotkeys.write().unregister_all();
        self.host.reset_all();
        info!("engine shut down");
    }

    fn focused(&self) -> Focused {
        let Some(app) = self.deps.ax.focused_application() else {
            return Focused::default();
        };
        Focused {
            bundle: app.bundle_id(),
            pid: app.info().map(|i| i.pid),
        }
    }

    fn guard(&self, mode: &'static str, enabled: bool) -> Result<()> {
        if !self.is_enabled() {
            return Err(Error::NotRunning);
        }
        if !enabled {
            return Err(Error::ModeDisabled(mode));
        }
        Ok(())
    }

    // ---- Activation ----

    /// Run the hint activation sequence for `variant`.
    ///
    /// Returns [`Activation::Excluded`] or [`Activation::NothingFound`]
    /// without changing mode when the focused application is excluded or
    /// nothing eligible is on screen. Any failure leaves the engine idle.
    pub async fn activate_hints(&self, variant: HintVariant) -> Result<Activation> {
        let mut st = self.state.lock().await;
        self.activate_hints_locked(&mut st, variant).await
    }

    async fn activate_hints_locked(
        &self,
        st: &mut State,
        variant: HintVariant,
    ) -> Result<Activation> {
        let start = Instant::now();
        let cfg = self.config();
        self.guard("hints", cfg.hints.enabled)?;
        let focused = self.focused();
        if let Some(b) = &focused.bundle
            && cfg.is_app_excluded(b)
        {
            info!("hint mode ignored: {} is excluded", b);
            return Ok(Activation::Excluded);
        }

        // Switching variants mid-session keeps the position saved at the
        // first activation and must not restore it in between.
        let carried = if st.is_active() {
            self.cursor.lock().hold()
        } else {
            None
        };
        self.exit_locked(st);
        self.deps.overlay.resize_to_active_screen();

        let bundle = focused.bundle.as_deref().unwrap_or_default();
        let app_roles = cfg.clickable_roles_for(bundle);
        self.roles
            .set(app_roles.roles, app_roles.ignore_clickable_check);
        let depth = self.prepare_host(&cfg, &focused);

        let screen = self.deps.pointer.active_screen();
        let origin = carried.unwrap_or_else(|| (self.deps.pointer.position(), screen));
        self.cache.advance_epoch();

        let candidates = match self.collect(variant, &cfg, depth).await {
            Ok(c) => restrict_to_screen(c, screen),
            Err(e) => {
                error!("failed to collect elements: {}", e);
                return Err(e);
            }
        };
        if candidates.is_empty() {
            warn!("no elements found for {:?}", variant);
            return Ok(Activation::NothingFound);
        }

        let generator = HintGenerator::new(&cfg.hints.hint_characters)?;
        let mut hints = match generator.generate(candidates) {
            Ok(h) => h,
            Err(e) => {
                error!("failed to generate hints: {}", e);
                return Err(e.into());
            }
        };
        for h in &mut hints {
            h.anchor = h.anchor.offset(-screen.min_x(), -screen.min_y());
        }
        let collection = HintCollection::new(hints, generator.alphabet());
        if let Err(e) = self
            .deps
            .overlay
            .draw_hints(collection.hints(), "", &cfg.hints.style)
        {
            error!("failed to draw hints: {}", e);
            self.deps.overlay.clear();
            return Err(e);
        }
        let count = collection.len();
        st.enter_hints(variant, collection)?;
        if cfg.general.restore_cursor_position {
            self.cursor.lock().capture(origin.0, origin.1);
        }
        self.deps.tap.enable();
        self.deps.overlay.show();

        let elapsed = start.elapsed();
        info!(hints = count, "hint mode activated in {:?}", elapsed);
        if elapsed > Duration::from_millis(ACTIVATION_WARN_MS) {
            warn!("hint activation took {:?}", elapsed);
        }
        Ok(Activation::Entered)
    }

    /// Flip host accessibility switches for the focused app and pick a depth.
    fn prepare_host(&self, cfg: &Config, focused: &Focused) -> usize {
        let class = focused
            .bundle
            .as_deref()
            .map(|b| classify(b, &host_bundles(&cfg.additional_ax_support)))
            .unwrap_or(HostClass::Native);
        if cfg.additional_ax_support.enable
            && let Some(pid) = focused.pid
        {
            self.host.ensure(self.deps.ax.as_ref(), class, pid);
        }
        match class {
            HostClass::Native => cfg.hints.max_depth,
            _ => cfg.hints.web_max_depth,
        }
    }

    async fn collect(
        &self,
        variant: HintVariant,
        cfg: &Config,
        depth: usize,
    ) -> Result<Vec<Candidate>> {
        let ax = self.deps.ax.clone();
        let roles = self.roles.clone();
        let cache = self.cache.clone();
        let opts = CollectOptions {
            max_depth: depth,
            concurrent: cfg.hints.concurrent_build,
            include_menubar: cfg.hints.include_menubar_hints,
            menubar_targets: cfg.hints.additional_menubar_hints_targets.clone(),
            include_dock: cfg.hints.include_dock_hints,
        };
        let scrollable = variant == HintVariant::ScrollSelect;
        let found = tokio::task::spawn_blocking(move || {
            if scrollable {
                scrollable_candidates(ax.as_ref(), &cache)
            } else {
                clickable_candidates(ax.as_ref(), &roles, &cache, &opts)
            }
        })
        .await
        .map_err(|e| Error::Msg(format!("collection task failed: {e}")))?;
        Ok(found?)
    }

    /// Show the grid surface and hand it the keyboard.
    pub async fn activate_grid(&self) -> Result<Activation> {
        let mut st = self.state.lock().await;
        let cfg = self.config();
        self.guard("grid", cfg.grid.enabled)?;
        if let Some(b) = self.focused().bundle
            && cfg.is_app_excluded(&b)
        {
            info!("grid mode ignored: {} is excluded", b);
            return Ok(Activation::Excluded);
        }
        self.exit_locked(&mut st);
        self.deps.overlay.resize_to_active_screen();
        let screen = self.deps.pointer.active_screen();
        if let Err(e) = self.deps.grid.show(screen, &cfg.grid) {
            error!("failed to show grid: {}", e);
            return Err(e);
        }
        st.enter_grid();
        self.deps.tap.enable();
        info!("grid mode activated");
        Ok(Activation::Entered)
    }

    /// Enter scroll mode at the pointer without picking a target.
    pub async fn start_interactive_scroll(&self) -> Result<()> {
        if !self.is_enabled() {
            return Err(Error::NotRunning);
        }
        let mut st = self.state.lock().await;
        self.cursor.lock().skip_next_restore();
        self.exit_locked(&mut st);
        self.deps.overlay.resize_to_active_screen();
        self.highlight_scroll_area(None);
        self.deps.tap.enable();
        st.enter_scroll(ScrollTarget::Cursor);
        info!("interactive scroll activated");
        Ok(())
    }

    // ---- Exit ----

    /// Exit sequence. Mode state is cleared before the overlay is torn down.
    fn exit_locked(&self, st: &mut State) {
        if !st.is_active() {
            return;
        }
        let name = st.mode().name();
        let was_grid = matches!(st.mode(), Mode::Grid);
        let was_scrolling = matches!(st.mode(), Mode::Scroll(_));

        st.clear_selection();
        self.deps.overlay.clear();
        self.deps.overlay.hide();
        if was_grid {
            self.deps.grid.hide();
        }
        self.deps.tap.disable();
        st.reset();

        let restore = self.config.read().config.general.restore_cursor_position;
        let target = {
            let mut mem = self.cursor.lock();
            if was_scrolling {
                mem.skip_next_restore();
            }
            mem.take(restore, self.deps.pointer.active_screen())
        };
        if let Some(p) = target {
            debug!("restoring cursor to {:?}", p);
            self.deps.pointer.move_to(p);
        }
        info!("exited {} mode", name);

        if self.pending_hotkey_refresh.swap(false, Ordering::SeqCst) {
            debug!("applying deferred hotkey refresh");
            self.refresh_hotkeys_now();
        }
    }

    // ---- Keys ----

    /// Route one captured keystroke to the active mode.
    ///
    /// `event` is either the raw character (`"a"`, `"\x1b"`, `"\x04"`) or a
    /// key name such as `"escape"`. Keys are ignored while idle.
    pub async fn handle_key(&self, event: &str) {
        let Some(key) = Key::parse(event) else {
            trace!("unrecognised key event {:?}", event);
            return;
        };
        let start = Instant::now();
        let mut st = self.state.lock().await;
        if !st.is_active() {
            trace!("key {} while idle", key);
            return;
        }
        match st.handle_key(key) {
            Ok(resp) => self.apply(&mut st, resp).await,
            Err(e) => {
                error!("key handling failed: {}", e);
                self.exit_locked(&mut st);
            }
        }
        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(KEY_PROC_WARN_MS) {
            warn!("Key processing took {:?} for {}", elapsed, key);
        } else {
            trace!("key {} handled in {:?}", key, elapsed);
        }
    }

    async fn apply(&self, st: &mut State, resp: ModeResponse) {
        match resp {
            ModeResponse::Ok => {}
            ModeResponse::Exit => self.exit_locked(st),
            ModeResponse::Redraw | ModeResponse::BackToHints => self.redraw_hints(st),
            ModeResponse::Invoke { action, hint } => {
                self.invoke(action, &hint);
                self.exit_locked(st);
            }
            ModeResponse::ShowActionMenu { hint, items } => self.show_action_menu(&hint, &items),
            ModeResponse::Reactivate(variant) => {
                if let Err(e) = self.activate_hints_locked(st, variant).await {
                    error!("failed to switch to {:?}: {}", variant, e);
                }
            }
            ModeResponse::EnterScroll { target } => self.highlight_scroll_area(target.as_ref()),
            ModeResponse::Scroll(op) => self.scroll(st, op),
            ModeResponse::Retarget => {
                if let Err(e) = self
                    .activate_hints_locked(st, HintVariant::ScrollSelect)
                    .await
                {
                    error!("failed to select a new scroll target: {}", e);
                }
            }
            ModeResponse::Grid(key) => match self.deps.grid.handle_key(key) {
                GridStep::Done(p) => {
                    info!("grid selected {:?}", p);
                    self.deps.pointer.move_to(p);
                    self.cursor.lock().skip_next_restore();
                    self.exit_locked(st);
                }
                GridStep::Pending => trace!("grid narrowed by {}", key),
                GridStep::Ignored => trace!("grid ignored {}", key),
            },
        }
    }

    fn redraw_hints(&self, st: &State) {
        let typed = st
            .hints()
            .map(|c| c.input().to_string())
            .unwrap_or_default();
        let visible = st.visible_hints();
        let style = self.config.read().config.hints.style.clone();
        self.deps.overlay.clear();
        if let Err(e) = self.deps.overlay.draw_hints(&visible, &typed, &style) {
            error!("failed to redraw hints: {}", e);
        }
    }

    /// Perform `action` on the hint's element. Failure is logged; the caller
    /// exits the mode either way.
    fn invoke(&self, action: ClickAction, hint: &Hint) {
        let ok = match action.click_kind() {
            Some(kind) => hint.element.click(kind),
            None => {
                self.cursor.lock().skip_next_restore();
                hint.element.move_mouse_to()
            }
        };
        if ok {
            info!(label = %hint.label, "performed {}", action);
        } else {
            warn!(label = %hint.label, "{} failed on {}", action, hint.info.role);
        }
    }

    fn show_action_menu(&self, hint: &Hint, items: &[MenuItem]) {
        let (style, color, width) = {
            let cfg = self.config.read();
            (
                cfg.config.hints.style.clone(),
                cfg.config.action.highlight_color.clone(),
                cfg.config.action.highlight_width,
            )
        };
        self.deps.overlay.clear();
        let target = Rect::new(
            hint.anchor.x.saturating_sub(hint.size.width / 2),
            hint.anchor.y.saturating_sub(hint.size.height / 2),
            hint.size.width,
            hint.size.height,
        );
        self.deps.overlay.draw_highlight(target, &color, width);
        if let Err(e) = self.deps.overlay.draw_menu(items, &style) {
            error!("failed to draw action menu: {}", e);
        }
    }

    /// Move to the scroll target, if any, and outline the area being scrolled.
    fn highlight_scroll_area(&self, target: Option<&Hint>) {
        let scroll = self.config.read().config.scroll.clone();
        let screen = self.deps.pointer.active_screen();
        self.deps.overlay.clear();
        let area = match target {
            Some(h) => {
                if !h.element.move_mouse_to() {
                    warn!("failed to move to scroll target {}", h.label);
                }
                let bounds = h.element.scroll_bounds().unwrap_or_else(|| h.info.rect());
                localize(bounds, screen)
            }
            None => Rect::new(0, 0, screen.width(), screen.height()),
        };
        if scroll.highlight_scroll_area {
            self.deps
                .overlay
                .draw_highlight(area, &scroll.highlight_color, scroll.highlight_width);
            self.deps.overlay.show();
        } else {
            self.deps.overlay.hide();
        }
        info!("scroll mode: j/k/h/l, ctrl-d/u, gg/G, tab to retarget, esc to exit");
    }

    fn scroll(&self, st: &State, op: ScrollOp) {
        let steps = scroll_steps(&self.config.read().config.scroll);
        let (dx, dy) = op.delta(&steps);
        let ok = match st.mode() {
            Mode::Scroll(ScrollTarget::Element(h)) => h.element.scroll_by(dx, dy),
            _ => {
                let at = self.deps.pointer.position();
                self.deps.pointer.scroll(at, dx, dy)
            }
        };
        if ok {
            debug!("scrolled {:?} by ({}, {})", op, dx, dy);
        } else {
            error!("scroll {:?} failed", op);
        }
    }

    // ---- Hotkeys ----

    fn refresh_hotkeys_now(&self) {
        let desired = {
            let cfg = self.config.read();
            if !self.is_enabled() {
                None
            } else {
                match self.focused().bundle {
                    Some(b) if cfg.config.is_app_excluded(&b) => {
                        info!("{} is excluded; releasing hotkeys", b);
                        None
                    }
                    _ => Some(desired_bindings(&cfg.config)),
                }
            }
        };
        let mut reg = self.hotkeys.write();
        match desired {
            Some(bindings) => {
                reg.update_bindings(bindings);
            }
            None => reg.unregister_all(),
        }
    }

    /// Bring hotkeys in line with configuration and the focused application.
    /// While a mode is active the refresh is deferred until it exits.
    pub async fn request_hotkey_refresh(&self) {
        let st = self.state.lock().await;
        if st.is_active() {
            debug!("mode active; deferring hotkey refresh");
            self.pending_hotkey_refresh.store(true, Ordering::SeqCst);
            return;
        }
        self.refresh_hotkeys_now();
    }

    /// Currently registered (chord, action) pairs.
    pub fn hotkey_bindings(&self) -> Vec<(String, String)> {
        self.hotkeys.read().bindings_snapshot()
    }

    /// Run the action bound to hotkey `id` on its own task.
    ///
    /// A panic in the handler is caught and logged. Returns `None` for ids
    /// that are not registered.
    pub fn dispatch_hotkey(&self, id: u32) -> Option<JoinHandle<()>> {
        let Some((chord, action)) = self.hotkeys.read().resolve(id) else {
            warn!("hotkey id {} is not registered", id);
            return None;
        };
        let engine = self.clone();
        Some(tokio::spawn(async move {
            let run = AssertUnwindSafe(engine.run_hotkey_action(&chord, &action));
            match run.catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(chord = %chord, "hotkey action failed: {}", e),
                Err(p) => error!(chord = %chord, "panic in hotkey handler: {}", panic_message(&*p)),
            }
        }))
    }

    /// Execute one binding's action string.
    pub async fn run_hotkey_action(&self, chord: &str, action: &str) -> Result<()> {
        info!(chord, action, "hotkey triggered");
        match HotkeyAction::parse(action)? {
            HotkeyAction::Exec(cmd) => {
                let out = shell::run_shell(cmd, COMMAND_TIMEOUT).await?;
                if out.success() {
                    info!(output = %out.output, "hotkey command succeeded");
                    Ok(())
                } else if out.timed_out {
                    error!(output = %out.output, "hotkey command timed out");
                    Err(Error::Msg(format!(
                        "command timed out after {:?}",
                        COMMAND_TIMEOUT
                    )))
                } else {
                    error!(code = ?out.code, output = %out.output, "hotkey command failed");
                    Err(Error::Msg(format!("command exited with {:?}", out.code)))
                }
            }
            HotkeyAction::Internal(cmd) => {
                let resp = self.handle_command(&cmd).await;
                if resp.success {
                    Ok(())
                } else {
                    Err(Error::Msg(resp.message))
                }
            }
        }
    }

    /// React to an application focus change: enable host accessibility
    /// support and refresh hotkeys.
    pub async fn on_focus_changed(&self, ev: FocusEvent) {
        debug!(bundle = ?ev.bundle_id, pid = ?ev.pid, "application focus changed");
        let (enabled, bundles) = {
            let cfg = self.config.read();
            (
                cfg.config.additional_ax_support.enable,
                host_bundles(&cfg.config.additional_ax_support),
            )
        };
        if enabled
            && let (Some(b), Some(pid)) = (ev.bundle_id.as_deref(), ev.pid)
        {
            let class = classify(b, &bundles);
            if class != HostClass::Native {
                self.host.ensure(self.deps.ax.as_ref(), class, pid);
            }
        }
        self.request_hotkey_refresh().await;
    }

    // ---- Commands ----

    /// Execute one command from the IPC bus or a hotkey binding.
    pub async fn handle_command(&self, cmd: &Command) -> Response {
        info!(action = %cmd.action, args = %cmd.args.join(", "), "handling command");
        match cmd.action.as_str() {
            "ping" => Response::ok("pong"),
            "start" => {
                if self.enable().await {
                    Response::ok("keynav started")
                } else {
                    Response::fail("keynav is already running")
                }
            }
            "stop" => {
                if self.disable().await {
                    Response::ok("keynav stopped")
                } else {
                    Response::fail("keynav is already stopped")
                }
            }
            "hints" => self.command_hints(&cmd.args).await,
            "grid" => match self.activate_grid().await {
                Ok(a) => Response::ok(a.message("grid")),
                Err(e) => Response::fail(e.to_string()),
            },
            "action" => self.command_action(&cmd.args).await,
            "idle" => {
                if !self.is_enabled() {
                    return Response::fail(Error::NotRunning.to_string());
                }
                self.exit().await;
                Response::ok("mode set to idle")
            }
            "status" => {
                let source = self.config.read().source();
                let status = StatusData {
                    enabled: self.is_enabled(),
                    mode: self.mode_name().await.to_string(),
                    config: source,
                };
                match serde_json::to_value(status) {
                    Ok(v) => Response::with_data(v),
                    Err(e) => Response::fail(e.to_string()),
                }
            }
            "config" => match self.config().to_json() {
                serde_json::Value::Null => Response::fail("config unavailable"),
                v => Response::with_data(v),
            },
            other => Response::fail(format!("unknown command: {other}")),
        }
    }

    async fn command_hints(&self, args: &[String]) -> Response {
        let variant = match args.first().map(String::as_str) {
            None => HintVariant::Direct(ClickAction::Left),
            Some("actions") => HintVariant::Actions(ClickAction::Left),
            Some("scroll") => HintVariant::ScrollSelect,
            Some(verb) => match verb.parse::<ClickAction>() {
                Ok(a) => HintVariant::Direct(a),
                Err(e) => return Response::fail(e.to_string()),
            },
        };
        match self.activate_hints(variant).await {
            Ok(a) => Response::ok(a.message("hint")),
            Err(e) => Response::fail(e.to_string()),
        }
    }

    async fn command_action(&self, args: &[String]) -> Response {
        if !self.is_enabled() {
            return Response::fail(Error::NotRunning.to_string());
        }
        if args.is_empty() {
            return Response::fail("no action specified");
        }
        let at = self.deps.pointer.position();
        for param in args {
            if param == "scroll" {
                return match self.start_interactive_scroll().await {
                    Ok(()) => Response::ok("scroll mode activated"),
                    Err(e) => Response::fail(e.to_string()),
                };
            }
            let Ok(action) = param.parse::<CursorAction>() else {
                return Response::fail(format!("unknown action: {param}"));
            };
            if !self.deps.pointer.perform(action, at) {
                return Response::fail(format!("action failed: {action} at {},{}", at.x, at.y));
            }
        }
        Response::ok("action performed at cursor")
    }
}
