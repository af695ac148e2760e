//! Accessibility query engine.
//!
//! Turns a platform accessibility tree of arbitrary size into a short list of
//! interactive candidates within an interactive latency budget:
//!
//! - [`Element`] is a shared handle to one native node; the native reference
//!   is released once, when the last handle drops.
//! - [`InfoCache`] keeps attribute snapshots for a short TTL so the several
//!   passes of one activation do not re-query the binding.
//! - [`build_tree`] and [`build_tree_concurrent`] expand a root into a
//!   [`Tree`] under depth, spatial, sampling and predicate bounds.
//! - [`Tree`] searches and [`Query`] select matching nodes in pre-order.
//! - [`collect`] runs the queries used by the interaction modes.
//!
//! The native binding sits behind [`NativeElement`] and [`AxBackend`]; the
//! [`mock`] module provides in-memory implementations.

mod backend;
mod cache;
pub mod collect;
mod element;
mod error;
mod geom;
pub mod host;
pub mod mock;
pub mod roles;
pub mod sampling;
mod search;
mod tree;

pub use backend::AxBackend;
pub use cache::{DEFAULT_TTL, InfoCache, Sweeper};
pub use collect::{CollectOptions, clickable_candidates, restrict_to_screen, scrollable_candidates};
pub use element::{Candidate, ClickKind, Element, ElementId, ElementInfo, NativeElement};
pub use error::{Error, Result};
pub use geom::{Point, Rect, Size};
pub use host::{HostBundles, HostClass, HostSupport, classify};
pub use roles::RoleRegistry;
pub use search::{DEFAULT_MAX_RESULTS, PreOrder, Query, QueryBuilder};
pub use tree::{
    BuildStats, DEFAULT_MAX_DEPTH, Filter, NodeId, Tree, TreeNode, TreeOptions, build_tree,
    build_tree_concurrent,
};
