//! In-memory accessibility trees for tests.
//!
//! [`MockElement`] describes a node and its children; [`MockElement::into_element`]
//! turns the description into live [`Element`] handles that share an
//! [`ActionLog`] recording every action and release.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use parking_lot::Mutex;

use crate::{AxBackend, ClickKind, Element, ElementId, ElementInfo, NativeElement, Point, Rect, Size};

/// Shared record of calls made against mock elements.
#[derive(Clone, Default)]
pub struct ActionLog {
    calls: Arc<Mutex<Vec<String>>>,
    info_queries: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl ActionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn note(&self, s: String) {
        self.calls.lock().push(s);
    }

    /// Every recorded call in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Whether `s` was recorded.
    pub fn contains(&self, s: &str) -> bool {
        self.calls.lock().iter().any(|c| c == s)
    }

    /// How many times `s` was recorded.
    pub fn count(&self, s: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == s).count()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Number of attribute reads that reached a mock element.
    pub fn info_queries(&self) -> usize {
        self.info_queries.load(Ordering::SeqCst)
    }

    /// Number of native references released.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Builder describing one mock node.
#[derive(Clone)]
pub struct MockElement {
    id: u64,
    info: ElementInfo,
    has_info: bool,
    scrollable: bool,
    failing: bool,
    bundle: Option<String>,
    delay: Option<Duration>,
    children: Vec<MockElement>,
}

impl MockElement {
    /// An enabled node with the given identity, role and `(x, y, w, h)` frame.
    pub fn new(id: u64, role: &str, frame: (i32, i32, i32, i32)) -> Self {
        let (x, y, w, h) = frame;
        Self {
            id,
            info: ElementInfo {
                position: Point::new(x, y),
                size: Size::new(w, h),
                role: role.to_string(),
                enabled: true,
                pid: 1,
                ..ElementInfo::default()
            },
            has_info: true,
            scrollable: false,
            failing: false,
            bundle: None,
            delay: None,
            children: Vec::new(),
        }
    }

    /// Set the title.
    pub fn title(mut self, title: &str) -> Self {
        self.info.title = title.to_string();
        self
    }

    /// Mark as disabled.
    pub fn disabled(mut self) -> Self {
        self.info.enabled = false;
        self
    }

    /// Report scrollable content.
    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    /// Make attribute reads fail.
    pub fn without_info(mut self) -> Self {
        self.has_info = false;
        self
    }

    /// Make every action report failure.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Set the owning bundle identifier.
    pub fn bundle(mut self, bundle: &str) -> Self {
        self.bundle = Some(bundle.to_string());
        self
    }

    /// Set the owning process id.
    pub fn pid(mut self, pid: i32) -> Self {
        self.info.pid = pid;
        self
    }

    /// Sleep this long in attribute and child reads.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append a child.
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Materialise the tree with a fresh log.
    pub fn into_element(self) -> Element {
        self.into_element_logged(&ActionLog::new())
    }

    /// Materialise the tree, recording into `log`.
    pub fn into_element_logged(self, log: &ActionLog) -> Element {
        let children = self
            .children
            .into_iter()
            .map(|c| c.into_element_logged(log))
            .collect();
        Element::new(MockNode {
            id: ElementId(self.id),
            info: self.info,
            has_info: self.has_info,
            scrollable: self.scrollable,
            failing: self.failing,
            bundle: self.bundle,
            delay: self.delay,
            children,
            log: log.clone(),
        })
    }
}

struct MockNode {
    id: ElementId,
    info: ElementInfo,
    has_info: bool,
    scrollable: bool,
    failing: bool,
    bundle: Option<String>,
    delay: Option<Duration>,
    children: Vec<Element>,
    log: ActionLog,
}

impl MockNode {
    fn pause(&self) {
        if let Some(d) = self.delay {
            thread::sleep(d);
        }
    }

    fn act(&self, what: String) -> bool {
        self.log.note(what);
        !self.failing
    }
}

impl NativeElement for MockNode {
    fn id(&self) -> ElementId {
        self.id
    }

    fn info(&self) -> Option<ElementInfo> {
        self.pause();
        self.log.info_queries.fetch_add(1, Ordering::SeqCst);
        self.has_info.then(|| self.info.clone())
    }

    fn children(&self, _visible_only: bool) -> Vec<Element> {
        self.pause();
        self.children.clone()
    }

    fn click(&self, kind: ClickKind) -> bool {
        self.act(format!("{} {}", kind.name(), self.info.title))
    }

    fn move_mouse_to(&self) -> bool {
        self.act(format!("move {}", self.info.title))
    }

    fn set_focus(&self) -> bool {
        self.act(format!("focus {}", self.info.title))
    }

    fn scroll_by(&self, dx: i32, dy: i32) -> bool {
        self.act(format!("scroll {dx} {dy} {}", self.info.title))
    }

    fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    fn scroll_bounds(&self) -> Option<Rect> {
        self.scrollable.then(|| self.info.rect())
    }

    fn bundle_id(&self) -> Option<String> {
        self.bundle.clone()
    }

    fn bool_attribute(&self, _name: &str) -> Option<bool> {
        None
    }

    fn set_bool_attribute(&self, name: &str, value: bool) -> bool {
        self.act(format!("set {name}={value} {}", self.info.title))
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.log.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock platform backend.
#[derive(Clone)]
pub struct MockAx {
    log: ActionLog,
    trusted: Arc<AtomicBool>,
    fail_set_attribute: Arc<AtomicBool>,
    window: Arc<Mutex<Option<Element>>>,
    menu_bar: Arc<Mutex<Option<Element>>>,
    focused_app: Arc<Mutex<Option<Element>>>,
    at_point: Arc<Mutex<Option<Element>>>,
    apps: Arc<Mutex<HashMap<String, Element>>>,
}

impl Default for MockAx {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAx {
    /// A trusted backend with no windows or applications.
    pub fn new() -> Self {
        Self {
            log: ActionLog::new(),
            trusted: Arc::new(AtomicBool::new(true)),
            fail_set_attribute: Arc::new(AtomicBool::new(false)),
            window: Arc::new(Mutex::new(None)),
            menu_bar: Arc::new(Mutex::new(None)),
            focused_app: Arc::new(Mutex::new(None)),
            at_point: Arc::new(Mutex::new(None)),
            apps: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Log shared by every element this backend materialises.
    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Builder form of [`set_window`](Self::set_window).
    pub fn with_window(self, window: MockElement) -> Self {
        self.set_window(Some(window));
        self
    }

    /// Builder form of [`set_menu_bar`](Self::set_menu_bar).
    pub fn with_menu_bar(self, bar: MockElement) -> Self {
        self.set_menu_bar(Some(bar));
        self
    }

    /// Builder form of [`set_focused_app`](Self::set_focused_app).
    pub fn with_focused_app(self, app: MockElement) -> Self {
        self.set_focused_app(Some(app));
        self
    }

    /// Register a running application under `bundle_id`.
    pub fn with_app(self, bundle_id: &str, app: MockElement) -> Self {
        let el = app.into_element_logged(&self.log);
        self.apps.lock().insert(bundle_id.to_string(), el);
        self
    }

    /// Replace the frontmost window.
    pub fn set_window(&self, window: Option<MockElement>) {
        *self.window.lock() = window.map(|w| w.into_element_logged(&self.log));
    }

    /// Replace the focused application's menu bar.
    pub fn set_menu_bar(&self, bar: Option<MockElement>) {
        *self.menu_bar.lock() = bar.map(|b| b.into_element_logged(&self.log));
    }

    /// Replace the focused application.
    pub fn set_focused_app(&self, app: Option<MockElement>) {
        *self.focused_app.lock() = app.map(|a| a.into_element_logged(&self.log));
    }

    /// Element returned by every point lookup.
    pub fn set_element_at(&self, el: Option<MockElement>) {
        *self.at_point.lock() = el.map(|e| e.into_element_logged(&self.log));
    }

    /// Toggle the accessibility permission.
    pub fn set_trusted(&self, v: bool) {
        self.trusted.store(v, Ordering::SeqCst);
    }

    /// Make application attribute writes fail.
    pub fn fail_set_attribute(&self, v: bool) {
        self.fail_set_attribute.store(v, Ordering::SeqCst);
    }
}

impl AxBackend for MockAx {
    fn is_trusted(&self) -> bool {
        self.trusted.load(Ordering::SeqCst)
    }

    fn focused_application(&self) -> Option<Element> {
        self.focused_app.lock().clone()
    }

    fn application_by_pid(&self, pid: i32) -> Option<Element> {
        let focused = self.focused_app.lock().clone();
        focused
            .into_iter()
            .chain(self.apps.lock().values().cloned())
            .find(|a| a.info().is_some_and(|i| i.pid == pid))
    }

    fn application_by_bundle_id(&self, bundle_id: &str) -> Option<Element> {
        self.apps.lock().get(bundle_id).cloned()
    }

    fn frontmost_window(&self) -> Option<Element> {
        self.window.lock().clone()
    }

    fn element_at(&self, _point: Point) -> Option<Element> {
        self.at_point.lock().clone()
    }

    fn menu_bar(&self) -> Option<Element> {
        self.menu_bar.lock().clone()
    }

    fn set_application_attribute(&self, pid: i32, name: &str, _value: bool) -> bool {
        self.log.note(format!("set_app_attr {pid} {name}"));
        !self.fail_set_attribute.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_release_once_when_last_clone_drops() {
        let log = ActionLog::new();
        let root = MockElement::new(1, "AXWindow", (0, 0, 10, 10))
            .child(MockElement::new(2, "AXButton", (0, 0, 5, 5)))
            .into_element_logged(&log);
        let kids = root.children();
        let copy = root.clone();
        drop(root);
        assert_eq!(log.releases(), 0);
        drop(copy);
        assert_eq!(log.releases(), 1);
        drop(kids);
        assert_eq!(log.releases(), 2);
    }

    #[test]
    fn actions_are_recorded() {
        let log = ActionLog::new();
        let el = MockElement::new(1, "AXButton", (0, 0, 5, 5))
            .title("Go")
            .into_element_logged(&log);
        assert!(el.click(ClickKind::Right));
        assert!(el.move_mouse_to());
        assert!(log.contains("right_click Go"));
        assert!(log.contains("move Go"));
        let bad = MockElement::new(2, "AXButton", (0, 0, 5, 5))
            .failing()
            .into_element();
        assert!(!bad.click(ClickKind::Left));
    }
}
