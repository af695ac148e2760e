//! Bounded expansion of an accessibility subtree.
//!
//! Both entry points apply the same rules:
//!
//! - depth is counted in levels, the root being level zero; a node is expanded
//!   only when its children would still be inside `max_depth` levels;
//! - nodes with a non-interactive or interactive-leaf role are not expanded;
//! - large containers visit only a sampled subset of their children
//!   (see [`crate::sampling`]);
//! - unless out-of-bounds inclusion is requested, a child is dropped together
//!   with its subtree when its rectangle does not overlap the root's. An
//!   element reporting no size skips that test, except interactive leaves,
//!   which are dropped because they cannot be targeted;
//! - the inclusion predicate runs last and excluding a node excludes its
//!   subtree.
//!
//! [`build_tree_concurrent`] fans child visits out onto scoped worker threads
//! capped by a token gate. Node ids and child order then depend on
//! scheduling, but the set of admitted elements matches the sequential build.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, Scope},
    time::{Duration, Instant},
};

use crossbeam_channel::{self as chan, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    Element, ElementInfo, Error, InfoCache, Rect, Result,
    roles::{is_interactive_leaf, is_terminal_role},
    sampling::child_indices,
};

/// Warn when a single build exceeds this many milliseconds.
pub const BUILD_WARN_MS: u64 = 250;

/// Default depth budget, in levels including the root.
pub const DEFAULT_MAX_DEPTH: usize = 12;

/// Default cap on concurrently running child visits.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Index of a node within its [`Tree`].
pub type NodeId = usize;

/// Caller-supplied inclusion predicate.
pub type Filter = Arc<dyn Fn(&ElementInfo) -> bool + Send + Sync>;

/// Options controlling a tree build.
#[derive(Clone)]
pub struct TreeOptions {
    /// Number of levels to materialise, including the root. Values below one
    /// are treated as one.
    pub max_depth: usize,
    /// Inclusion predicate applied after spatial filtering.
    pub filter: Option<Filter>,
    /// Keep children that lie outside the root's rectangle.
    pub include_out_of_bounds: bool,
    /// Attribute cache consulted for every visited element.
    pub cache: InfoCache,
    /// Maximum number of concurrently running worker visits.
    pub max_parallel: usize,
    /// Deepest level whose children may be fanned out.
    pub parallel_depth: usize,
    /// Minimum number of visited children before fanning out.
    pub parallel_threshold: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            filter: None,
            include_out_of_bounds: false,
            cache: InfoCache::default(),
            max_parallel: DEFAULT_MAX_PARALLEL,
            parallel_depth: 4,
            parallel_threshold: 8,
        }
    }
}

impl TreeOptions {
    /// Options that share `cache`.
    pub fn with_cache(cache: InfoCache) -> Self {
        Self {
            cache,
            ..Self::default()
        }
    }

    /// Set the depth budget.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the inclusion predicate.
    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&ElementInfo) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(f));
        self
    }

    /// Keep or drop children outside the root's rectangle.
    pub fn include_out_of_bounds(mut self, yes: bool) -> Self {
        self.include_out_of_bounds = yes;
        self
    }
}

impl fmt::Debug for TreeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeOptions")
            .field("max_depth", &self.max_depth)
            .field("filter", &self.filter.is_some())
            .field("include_out_of_bounds", &self.include_out_of_bounds)
            .field("max_parallel", &self.max_parallel)
            .finish_non_exhaustive()
    }
}

/// One admitted element.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Index of this node.
    pub id: NodeId,
    /// Retained handle; released when the tree is dropped.
    pub element: Element,
    /// Snapshot captured when the node was admitted.
    pub info: ElementInfo,
    /// Parent index, `None` for the root.
    pub parent: Option<NodeId>,
    /// Child indices in insertion order.
    pub children: Vec<NodeId>,
    /// Level below the root.
    pub depth: usize,
}

/// Counters gathered during a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Children whose attributes were requested.
    pub visited: usize,
    /// Visited children rejected by attribute failure, bounds or predicate.
    pub skipped: usize,
    /// Children never visited because of container sampling.
    pub sampled_out: usize,
    /// Highest number of simultaneously running worker visits.
    pub peak_inflight: usize,
    /// Wall time of the build.
    pub elapsed: Duration,
}

/// Arena-backed tree of admitted elements. Index [`Tree::ROOT`] is the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    stats: BuildStats,
}

impl Tree {
    /// Index of the root node.
    pub const ROOT: NodeId = 0;

    fn with_root(element: Element, info: ElementInfo) -> Self {
        Self {
            nodes: vec![TreeNode {
                id: Self::ROOT,
                element,
                info,
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
            stats: BuildStats::default(),
        }
    }

    fn push(&mut self, element: Element, info: ElementInfo, parent: NodeId, depth: usize) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            id,
            element,
            info,
            parent: Some(parent),
            children: Vec::new(),
            depth,
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// The root node.
    pub fn root(&self) -> &TreeNode {
        &self.nodes[Self::ROOT]
    }

    /// Node by index.
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|c| self.nodes.get(*c))
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)?.parent.and_then(|p| self.nodes.get(p))
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Counters from the build that produced this tree.
    pub fn stats(&self) -> BuildStats {
        self.stats
    }
}

/// Shared admission rules and counters.
struct Walk<'a> {
    opts: &'a TreeOptions,
    bounds: Rect,
    visited: AtomicUsize,
    skipped: AtomicUsize,
    sampled_out: AtomicUsize,
}

impl<'a> Walk<'a> {
    fn new(opts: &'a TreeOptions, bounds: Rect) -> Self {
        Self {
            opts,
            bounds,
            visited: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            sampled_out: AtomicUsize::new(0),
        }
    }

    fn should_expand(&self, role: &str, depth: usize) -> bool {
        depth + 1 < self.opts.max_depth.max(1) && !is_terminal_role(role)
    }

    /// Indices of `count` children of a `role` node that will be visited.
    fn select(&self, role: &str, count: usize) -> Vec<usize> {
        let idx = child_indices(role, count);
        self.sampled_out
            .fetch_add(count - idx.len(), Ordering::Relaxed);
        idx
    }

    fn admit(&self, child: &Element) -> Option<ElementInfo> {
        self.visited.fetch_add(1, Ordering::Relaxed);
        let admitted = child
            .cached_info(&self.opts.cache)
            .filter(|info| self.in_bounds(info))
            .filter(|info| self.opts.filter.as_ref().is_none_or(|f| f(info)));
        if admitted.is_none() {
            self.skipped.fetch_add(1, Ordering::Relaxed);
        }
        admitted
    }

    fn in_bounds(&self, info: &ElementInfo) -> bool {
        if self.opts.include_out_of_bounds {
            return true;
        }
        let rect = info.rect();
        if rect.is_empty() {
            return !is_interactive_leaf(&info.role);
        }
        rect.overlaps(&self.bounds)
    }

    fn finish(&self, tree: &mut Tree, started: Instant, peak_inflight: usize, label: &str) {
        tree.stats = BuildStats {
            visited: self.visited.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            sampled_out: self.sampled_out.load(Ordering::Relaxed),
            peak_inflight,
            elapsed: started.elapsed(),
        };
        let s = tree.stats;
        if s.elapsed > Duration::from_millis(BUILD_WARN_MS) {
            warn!(
                "{} tree build took {:?} for {} nodes ({} visited, {} skipped)",
                label,
                s.elapsed,
                tree.len(),
                s.visited,
                s.skipped
            );
        } else {
            debug!(
                "{} tree build completed in {:?} for {} nodes ({} visited, {} skipped, {} sampled out)",
                label,
                s.elapsed,
                tree.len(),
                s.visited,
                s.skipped,
                s.sampled_out
            );
        }
    }
}

fn root_snapshot(root: &Element, opts: &TreeOptions) -> Result<ElementInfo> {
    root.cached_info(&opts.cache)
        .ok_or_else(|| Error::RootInfo(root.id()))
}

/// Expand `root` depth-first on the calling thread.
///
/// Fails only when the root's own attributes cannot be read.
pub fn build_tree(root: &Element, opts: &TreeOptions) -> Result<Tree> {
    let started = Instant::now();
    let info = root_snapshot(root, opts)?;
    let walk = Walk::new(opts, info.rect());
    let mut tree = Tree::with_root(root.clone(), info);
    expand_sequential(&mut tree, &walk, Tree::ROOT);
    walk.finish(&mut tree, started, 0, "sequential");
    Ok(tree)
}

fn expand_sequential(tree: &mut Tree, walk: &Walk<'_>, id: NodeId) {
    let node = &tree.nodes[id];
    if !walk.should_expand(&node.info.role, node.depth) {
        return;
    }
    let depth = node.depth + 1;
    let role = node.info.role.clone();
    let kids = node.element.children();
    for i in walk.select(&role, kids.len()) {
        let child = &kids[i];
        if let Some(info) = walk.admit(child) {
            let cid = tree.push(child.clone(), info, id, depth);
            expand_sequential(tree, walk, cid);
        }
    }
}

/// Counting gate over worker slots.
struct Gate {
    tx: Sender<()>,
    rx: Receiver<()>,
    inflight: AtomicUsize,
    peak: AtomicUsize,
}

impl Gate {
    fn new(slots: usize) -> Self {
        let (tx, rx) = chan::bounded(slots.max(1));
        for _ in 0..slots {
            let _ = tx.try_send(());
        }
        Self {
            tx,
            rx,
            inflight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Take a free slot without waiting.
    fn try_acquire(&self) -> Option<Permit<'_>> {
        self.rx.try_recv().ok()?;
        let cur = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        let mut prev = self.peak.load(Ordering::Relaxed);
        while cur > prev {
            match self
                .peak
                .compare_exchange(prev, cur, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(p) => prev = p,
            }
        }
        Some(Permit { gate: self })
    }
}

/// A held worker slot, returned to the gate on drop.
struct Permit<'a> {
    gate: &'a Gate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.inflight.fetch_sub(1, Ordering::SeqCst);
        let _ = self.gate.tx.send(());
    }
}

struct Shared<'a> {
    tree: Mutex<Tree>,
    walk: Walk<'a>,
    gate: Gate,
}

/// Expand `root` with bounded fan-out across worker threads.
///
/// Children of nodes at level `parallel_depth` or shallower are visited on
/// scoped threads when at least `parallel_threshold` of them are selected and
/// a worker slot is free; otherwise the visit runs inline. The call returns
/// once every visit has finished.
pub fn build_tree_concurrent(root: &Element, opts: &TreeOptions) -> Result<Tree> {
    let started = Instant::now();
    let info = root_snapshot(root, opts)?;
    let shared = Shared {
        walk: Walk::new(opts, info.rect()),
        tree: Mutex::new(Tree::with_root(root.clone(), info.clone())),
        gate: Gate::new(opts.max_parallel),
    };
    thread::scope(|s| {
        expand_concurrent(s, &shared, Tree::ROOT, root, &info.role, 0);
    });
    let Shared { tree, walk, gate } = shared;
    let mut tree = tree.into_inner();
    walk.finish(&mut tree, started, gate.peak.load(Ordering::SeqCst), "concurrent");
    Ok(tree)
}

fn expand_concurrent<'scope, 'env>(
    s: &'scope Scope<'scope, 'env>,
    shared: &'env Shared<'env>,
    id: NodeId,
    element: &Element,
    role: &str,
    depth: usize,
) {
    if !shared.walk.should_expand(role, depth) {
        return;
    }
    let kids = element.children();
    let picked = shared.walk.select(role, kids.len());
    let opts = shared.walk.opts;
    let fan_out = depth <= opts.parallel_depth && picked.len() >= opts.parallel_threshold;
    for i in picked {
        let child = kids[i].clone();
        match fan_out.then(|| shared.gate.try_acquire()).flatten() {
            Some(permit) => {
                s.spawn(move || {
                    let _permit = permit;
                    visit_concurrent(s, shared, id, child, depth + 1);
                });
            }
            None => visit_concurrent(s, shared, id, child, depth + 1),
        }
    }
}

fn visit_concurrent<'scope, 'env>(
    s: &'scope Scope<'scope, 'env>,
    shared: &'env Shared<'env>,
    parent: NodeId,
    child: Element,
    depth: usize,
) {
    let Some(info) = shared.walk.admit(&child) else {
        return;
    };
    let role = info.role.clone();
    let id = shared.tree.lock().push(child.clone(), info, parent, depth);
    expand_concurrent(s, shared, id, &child, &role, depth);
}
