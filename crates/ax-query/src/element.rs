//! Element handles and the attribute snapshots read from them.

use std::{fmt, sync::Arc};

use tracing::{debug, trace};

use crate::{InfoCache, Point, Rect, RoleRegistry, Size};

/// Identity of one native accessibility node as reported by the binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Immutable snapshot of the attributes the engine reads from an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementInfo {
    /// Top-left corner in screen coordinates.
    pub position: Point,
    /// Extent of the element.
    pub size: Size,
    /// Title attribute, empty when absent.
    pub title: String,
    /// Accessibility role, e.g. `AXButton`.
    pub role: String,
    /// Localised role description.
    pub role_description: String,
    /// Whether the element accepts interaction.
    pub enabled: bool,
    /// Whether the element has keyboard focus.
    pub focused: bool,
    /// Owning process id.
    pub pid: i32,
}

impl ElementInfo {
    /// Bounding rectangle of the element.
    pub const fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    /// Centre of the bounding rectangle.
    pub const fn center(&self) -> Point {
        self.rect().center()
    }
}

/// Pointer click variants an element can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickKind {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Two primary clicks in quick succession.
    Double,
    /// Middle button.
    Middle,
}

impl ClickKind {
    /// Stable lowercase name used in logs and commands.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left_click",
            Self::Right => "right_click",
            Self::Double => "double_click",
            Self::Middle => "middle_click",
        }
    }
}

/// Capability surface of one native accessibility node.
///
/// An implementation owns exactly one native reference. The reference is
/// released in the implementation's `Drop`, which runs once when the last
/// [`Element`] sharing it goes away. Every query may fail; failures are
/// reported as `None`, `false` or an empty list and never panic.
pub trait NativeElement: Send + Sync {
    /// Identity used for attribute caching.
    fn id(&self) -> ElementId;

    /// Read the attribute snapshot.
    fn info(&self) -> Option<ElementInfo>;

    /// Enumerate child handles. `visible_only` restricts virtualising
    /// containers to their on-screen rows.
    fn children(&self, visible_only: bool) -> Vec<Element>;

    /// Deliver a click at the element's centre.
    fn click(&self, kind: ClickKind) -> bool;

    /// Move the pointer to the element's centre without clicking.
    fn move_mouse_to(&self) -> bool;

    /// Give the element keyboard focus.
    fn set_focus(&self) -> bool;

    /// Scroll the element's content by the given deltas.
    fn scroll_by(&self, dx: i32, dy: i32) -> bool;

    /// Whether the element exposes scrollable content.
    fn is_scrollable(&self) -> bool;

    /// Visible bounds of the scrollable area, if any.
    fn scroll_bounds(&self) -> Option<Rect>;

    /// Bundle identifier of the owning application.
    fn bundle_id(&self) -> Option<String>;

    /// Read a named boolean attribute.
    fn bool_attribute(&self, name: &str) -> Option<bool>;

    /// Write a named boolean attribute.
    fn set_bool_attribute(&self, name: &str, value: bool) -> bool;
}

/// Shared handle to a native accessibility node.
///
/// Cloning shares the native reference; it is released once, when the last
/// clone is dropped. Handles fetched for a single query are dropped at the end
/// of that scope, while handles retained in a tree or hint live as long as
/// their owner.
#[derive(Clone)]
pub struct Element {
    /// The native node.
    inner: Arc<dyn NativeElement>,
}

impl Element {
    /// Wrap a native node.
    pub fn new(native: impl NativeElement + 'static) -> Self {
        Self {
            inner: Arc::new(native),
        }
    }

    /// Identity of the node.
    pub fn id(&self) -> ElementId {
        self.inner.id()
    }

    /// Read attributes directly from the binding, bypassing the cache.
    pub fn info(&self) -> Option<ElementInfo> {
        self.inner.info()
    }

    /// Read attributes through `cache`, populating it on a miss.
    pub fn cached_info(&self, cache: &InfoCache) -> Option<ElementInfo> {
        let id = self.id();
        if let Some(info) = cache.get(id) {
            return Some(info);
        }
        let info = self.inner.info()?;
        cache.set(id, info.clone());
        Some(info)
    }

    /// Visible children of the node; an empty list when the query fails.
    pub fn children(&self) -> Vec<Self> {
        self.inner.children(true)
    }

    /// All children, including off-screen rows of virtualising containers.
    pub fn all_children(&self) -> Vec<Self> {
        self.inner.children(false)
    }

    /// Click the element.
    pub fn click(&self, kind: ClickKind) -> bool {
        let ok = self.inner.click(kind);
        if !ok {
            debug!(id = %self.id(), kind = kind.name(), "element click failed");
        }
        ok
    }

    /// Move the pointer onto the element.
    pub fn move_mouse_to(&self) -> bool {
        self.inner.move_mouse_to()
    }

    /// Focus the element.
    pub fn set_focus(&self) -> bool {
        self.inner.set_focus()
    }

    /// Scroll the element's content.
    pub fn scroll_by(&self, dx: i32, dy: i32) -> bool {
        self.inner.scroll_by(dx, dy)
    }

    /// Whether the element reports scrollable content.
    pub fn is_scrollable(&self) -> bool {
        self.inner.is_scrollable()
    }

    /// Bounds of the scrollable area.
    pub fn scroll_bounds(&self) -> Option<Rect> {
        self.inner.scroll_bounds()
    }

    /// Bundle identifier of the owning application.
    pub fn bundle_id(&self) -> Option<String> {
        self.inner.bundle_id().filter(|b| !b.is_empty())
    }

    /// Read a named boolean attribute.
    pub fn bool_attribute(&self, name: &str) -> Option<bool> {
        self.inner.bool_attribute(name)
    }

    /// Write a named boolean attribute.
    pub fn set_bool_attribute(&self, name: &str, value: bool) -> bool {
        self.inner.set_bool_attribute(name, value)
    }

    /// Whether the element is an enabled instance of a clickable role.
    ///
    /// Attributes are read through `cache`, so checks made during the same
    /// pass as a tree build do not re-query the binding.
    pub fn is_clickable(&self, roles: &RoleRegistry, cache: &InfoCache) -> bool {
        let Some(info) = self.cached_info(cache) else {
            return false;
        };
        let clickable = roles.is_clickable(&info);
        if clickable {
            trace!(role = %info.role, title = %info.title, "clickable");
        }
        clickable
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.id())
    }
}

/// An element selected by a query, together with the snapshot that admitted it.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Handle to the element.
    pub element: Element,
    /// Attributes captured during the query.
    pub info: ElementInfo,
}

impl Candidate {
    /// Pair an element with its snapshot.
    pub fn new(element: Element, info: ElementInfo) -> Self {
        Self { element, info }
    }

    /// Bounding rectangle of the candidate.
    pub const fn rect(&self) -> Rect {
        self.info.rect()
    }
}
