//! Entry points into the platform accessibility binding.

use crate::{Element, Point};

/// Root-level lookups provided by the platform accessibility API.
///
/// Implementations wrap the native binding; tests use [`crate::mock::MockAx`].
pub trait AxBackend: Send + Sync {
    /// Whether the process holds accessibility permission.
    fn is_trusted(&self) -> bool;

    /// Application element of the focused application.
    fn focused_application(&self) -> Option<Element>;

    /// Application element for a process id.
    fn application_by_pid(&self, pid: i32) -> Option<Element>;

    /// Application element for a running bundle identifier.
    fn application_by_bundle_id(&self, bundle_id: &str) -> Option<Element>;

    /// Frontmost window of the focused application.
    fn frontmost_window(&self) -> Option<Element>;

    /// Topmost element under a screen point.
    fn element_at(&self, point: Point) -> Option<Element>;

    /// Menu bar of the focused application.
    fn menu_bar(&self) -> Option<Element>;

    /// Set a boolean attribute on the application element of `pid`.
    fn set_application_attribute(&self, pid: i32, name: &str, value: bool) -> bool;
}
