//! Child selection for very large containers.
//!
//! Lists, tables and outlines can expose thousands of rows. Enumerating all of
//! them is slow and almost every row is either off-screen or a copy of the same
//! template, so for those roles only the head, the tail and a periodic sample
//! of the middle are visited. Every other role visits all of its children.

use std::collections::BTreeSet;

/// Roles whose children are sampled instead of visited exhaustively.
pub const LARGE_CONTAINER_ROLES: &[&str] = &["AXList", "AXTable", "AXOutline"];

/// Containers with at most this many children are visited in full.
pub const FULL_VISIT_LIMIT: usize = 50;

/// Upper bound of the medium tier.
const MEDIUM_LIMIT: usize = 1000;

/// Head, tail and minimum stride for one size tier.
#[derive(Debug, Clone, Copy)]
struct Tier {
    head: usize,
    tail: usize,
    min_stride: usize,
}

const MEDIUM: Tier = Tier {
    head: 30,
    tail: 20,
    min_stride: 10,
};

const HUGE: Tier = Tier {
    head: 20,
    tail: 20,
    min_stride: 100,
};

/// True when `role` is subject to sampling.
pub fn is_large_container(role: &str) -> bool {
    LARGE_CONTAINER_ROLES.contains(&role)
}

/// Indices of the children to visit for a container with `count` children.
///
/// The result is strictly ascending and free of duplicates. For sampled
/// containers it always contains `0` and `count - 1`.
pub fn child_indices(role: &str, count: usize) -> Vec<usize> {
    if !is_large_container(role) || count <= FULL_VISIT_LIMIT {
        return (0..count).collect();
    }
    let tier = if count <= MEDIUM_LIMIT { MEDIUM } else { HUGE };
    sample(count, tier)
}

fn sample(count: usize, tier: Tier) -> Vec<usize> {
    let stride = tier.min_stride.max(count / 20);
    let head_end = tier.head.min(count);
    let tail_start = count.saturating_sub(tier.tail).max(head_end);

    let mut picked: BTreeSet<usize> = (0..head_end).collect();
    picked.extend((head_end..tail_start).step_by(stride));
    picked.extend(tail_start..count);
    picked.into_iter().collect()
}
