//! Candidate collection for the interaction modes.
//!
//! These are the queries the engine runs when a mode is activated: build a
//! filtered tree for the frontmost window and pick out the elements that can
//! receive a click or a scroll.

use tracing::{debug, info, warn};

use crate::{
    AxBackend, Candidate, Element, Error, InfoCache, Rect, Result, RoleRegistry, Tree,
    TreeOptions, build_tree, build_tree_concurrent,
};

/// Elements narrower or shorter than this are not hint targets.
pub const MIN_ELEMENT_SIDE: i32 = 10;

/// Slack around the window rectangle for the visibility test.
pub const WINDOW_PADDING: i32 = 200;

/// Minimum side for menu bar and Dock items.
pub const MIN_BAR_ITEM_SIDE: i32 = 6;

/// Depth used for menu bar and Dock trees.
pub const BAR_DEPTH: usize = 8;

/// Depth used for scrollable-area discovery.
pub const SCROLL_DEPTH: usize = 5;

/// Bundle identifier of the Dock.
pub const DOCK_BUNDLE_ID: &str = "com.apple.dock";

/// Parameters for [`clickable_candidates`].
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Depth budget for the frontmost window.
    pub max_depth: usize,
    /// Use the concurrent tree builder.
    pub concurrent: bool,
    /// Add items from the focused application's menu bar.
    pub include_menubar: bool,
    /// Bundles whose status items are added alongside the menu bar.
    pub menubar_targets: Vec<String>,
    /// Add Dock items.
    pub include_dock: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_depth: crate::host::NATIVE_DEPTH,
            concurrent: false,
            include_menubar: false,
            menubar_targets: Vec::new(),
            include_dock: false,
        }
    }
}

fn build(root: &Element, opts: &TreeOptions, concurrent: bool) -> Result<Tree> {
    if concurrent {
        build_tree_concurrent(root, opts)
    } else {
        build_tree(root, opts)
    }
}

fn candidates<'a>(nodes: impl IntoIterator<Item = &'a crate::TreeNode>) -> Vec<Candidate> {
    nodes
        .into_iter()
        .map(|n| Candidate::new(n.element.clone(), n.info.clone()))
        .collect()
}

fn window_predicate(
    window: Rect,
    min_side: i32,
) -> impl Fn(&crate::ElementInfo) -> bool + Send + Sync + 'static {
    let visible = window.expand(WINDOW_PADDING);
    move |i| i.size.width >= min_side && i.size.height >= min_side && i.rect().overlaps(&visible)
}

/// Clickable elements of the frontmost window, optionally followed by menu
/// bar, status item and Dock elements.
///
/// Fails when there is no frontmost window or its attributes cannot be read.
/// Failures in the supplementary sources are logged and skipped.
pub fn clickable_candidates(
    ax: &dyn AxBackend,
    roles: &RoleRegistry,
    cache: &InfoCache,
    opts: &CollectOptions,
) -> Result<Vec<Candidate>> {
    let window = ax.frontmost_window().ok_or(Error::NoFrontmostWindow)?;
    let root = window
        .cached_info(cache)
        .ok_or_else(|| Error::RootInfo(window.id()))?;
    let tree_opts = TreeOptions::with_cache(cache.clone())
        .max_depth(opts.max_depth)
        .filter(window_predicate(root.rect(), MIN_ELEMENT_SIDE));
    let tree = build(&window, &tree_opts, opts.concurrent)?;
    let mut out = candidates(tree.find_clickable(roles, cache));
    info!("found {} clickable elements", out.len());

    if opts.include_menubar {
        match ax.menu_bar() {
            Some(bar) => extend_from(&mut out, "menubar", &bar, roles, cache),
            None => debug!("focused application has no menu bar"),
        }
        for bundle in &opts.menubar_targets {
            match ax.application_by_bundle_id(bundle) {
                Some(app) => extend_from(&mut out, bundle, &app, roles, cache),
                None => warn!("failed to get menubar elements for {}", bundle),
            }
        }
    }
    if opts.include_dock {
        match ax.application_by_bundle_id(DOCK_BUNDLE_ID) {
            Some(dock) => extend_from(&mut out, "dock", &dock, roles, cache),
            None => warn!("failed to get dock elements"),
        }
    }
    Ok(out)
}

fn extend_from(
    out: &mut Vec<Candidate>,
    source: &str,
    root: &Element,
    roles: &RoleRegistry,
    cache: &InfoCache,
) {
    let opts = TreeOptions::with_cache(cache.clone())
        .max_depth(BAR_DEPTH)
        .include_out_of_bounds(true)
        .filter(|i| i.size.width >= MIN_BAR_ITEM_SIDE && i.size.height >= MIN_BAR_ITEM_SIDE);
    match build_tree(root, &opts) {
        Ok(tree) => {
            let extra = candidates(tree.find_clickable(roles, cache));
            debug!("included {} {} elements", extra.len(), source);
            out.extend(extra);
        }
        Err(e) => warn!("failed to get {} elements: {}", source, e),
    }
}

/// Scrollable areas of the frontmost window.
pub fn scrollable_candidates(ax: &dyn AxBackend, cache: &InfoCache) -> Result<Vec<Candidate>> {
    let window = ax.frontmost_window().ok_or(Error::NoFrontmostWindow)?;
    let root = window
        .cached_info(cache)
        .ok_or_else(|| Error::RootInfo(window.id()))?;
    let visible = root.rect().expand(WINDOW_PADDING);
    let opts = TreeOptions::with_cache(cache.clone())
        .max_depth(SCROLL_DEPTH)
        .filter(move |i| i.rect().overlaps(&visible));
    let tree = build_tree(&window, &opts)?;
    let out = candidates(tree.find_scrollable());
    info!("found {} scrollable elements", out.len());
    Ok(out)
}

/// Drop candidates that do not overlap `screen`.
pub fn restrict_to_screen(candidates: Vec<Candidate>, screen: Rect) -> Vec<Candidate> {
    let before = candidates.len();
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.rect().overlaps(&screen))
        .collect();
    if kept.len() != before {
        debug!("dropped {} off-screen candidates", before - kept.len());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAx, MockElement};

    fn window() -> MockElement {
        MockElement::new(1, "AXWindow", (100, 100, 800, 600))
            .child(MockElement::new(2, "AXButton", (120, 120, 40, 20)).title("ok"))
            .child(MockElement::new(3, "AXButton", (130, 130, 8, 8)).title("tiny"))
            .child(
                MockElement::new(4, "AXScrollArea", (100, 200, 800, 500))
                    .scrollable()
                    .child(MockElement::new(5, "AXLink", (150, 250, 60, 20)).title("link")),
            )
    }

    fn titles(c: &[Candidate]) -> Vec<&str> {
        c.iter().map(|c| c.info.title.as_str()).collect()
    }

    #[test]
    fn clickable_filters_small_elements() {
        let ax = MockAx::new().with_window(window());
        let cache = InfoCache::default();
        let got = clickable_candidates(&ax, &RoleRegistry::default(), &cache, &CollectOptions::default())
            .unwrap();
        assert_eq!(titles(&got), vec!["ok", "link"]);
    }

    #[test]
    fn concurrent_collection_finds_the_same_elements() {
        let ax = MockAx::new().with_window(window());
        let cache = InfoCache::default();
        let opts = CollectOptions {
            concurrent: true,
            ..CollectOptions::default()
        };
        let mut got: Vec<String> = clickable_candidates(&ax, &RoleRegistry::default(), &cache, &opts)
            .unwrap()
            .into_iter()
            .map(|c| c.info.title)
            .collect();
        got.sort();
        assert_eq!(got, vec!["link".to_string(), "ok".to_string()]);
    }

    #[test]
    fn missing_window_is_an_error() {
        let ax = MockAx::new();
        let err = clickable_candidates(&ax, &RoleRegistry::default(), &InfoCache::default(), &CollectOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoFrontmostWindow));
        assert!(scrollable_candidates(&ax, &InfoCache::default()).is_err());
    }

    #[test]
    fn supplementary_sources_are_appended() {
        let bar = MockElement::new(50, "AXMenuBar", (0, 0, 1440, 24))
            .child(MockElement::new(51, "AXMenuBarItem", (0, 0, 40, 24)).title("File"));
        let dock = MockElement::new(60, "AXApplication", (0, 0, 0, 0))
            .child(MockElement::new(61, "AXButton", (500, 860, 48, 48)).title("Finder"));
        let ax = MockAx::new()
            .with_window(window())
            .with_menu_bar(bar)
            .with_app(DOCK_BUNDLE_ID, dock);
        let roles = RoleRegistry::default();
        roles.set(
            crate::roles::DEFAULT_CLICKABLE_ROLES
                .iter()
                .copied()
                .chain(["AXMenuBarItem"]),
            false,
        );
        let opts = CollectOptions {
            include_menubar: true,
            menubar_targets: vec!["com.example.missing".into()],
            include_dock: true,
            ..CollectOptions::default()
        };
        let got = clickable_candidates(&ax, &roles, &InfoCache::default(), &opts).unwrap();
        assert_eq!(titles(&got), vec!["ok", "link", "File", "Finder"]);
    }

    #[test]
    fn scrollable_areas() {
        let ax = MockAx::new().with_window(window());
        let got = scrollable_candidates(&ax, &InfoCache::default()).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].info.role, "AXScrollArea");
    }

    #[test]
    fn off_screen_candidates_are_dropped() {
        let ax = MockAx::new().with_window(window());
        let got = clickable_candidates(&ax, &RoleRegistry::default(), &InfoCache::default(), &CollectOptions::default())
            .unwrap();
        let kept = restrict_to_screen(got, Rect::new(0, 0, 140, 140));
        assert_eq!(titles(&kept), vec!["ok"]);
    }
}
