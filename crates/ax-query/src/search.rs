//! Read-only searches over a built [`Tree`].
//!
//! Every search is a full pre-order walk from the root and returns matches in
//! traversal order.

use crate::{InfoCache, RoleRegistry, Tree, TreeNode};

/// Default cap on [`Query`] results.
pub const DEFAULT_MAX_RESULTS: usize = 100;

impl Tree {
    /// Pre-order iterator over every node, root first.
    pub fn walk(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![Self::ROOT],
        }
    }

    /// Nodes matching `pred`, in pre-order.
    pub fn find_all<F>(&self, mut pred: F) -> Vec<&TreeNode>
    where
        F: FnMut(&TreeNode) -> bool,
    {
        self.walk().filter(|n| pred(n)).collect()
    }

    /// Enabled nodes whose role is registered as clickable.
    pub fn find_clickable(&self, roles: &RoleRegistry, cache: &InfoCache) -> Vec<&TreeNode> {
        self.find_all(|n| n.element.is_clickable(roles, cache))
    }

    /// Nodes that report scrollable content.
    pub fn find_scrollable(&self) -> Vec<&TreeNode> {
        self.find_all(|n| n.element.is_scrollable())
    }

    /// Nodes whose role equals `role`.
    pub fn find_by_role(&self, role: &str) -> Vec<&TreeNode> {
        self.find_all(|n| n.info.role == role)
    }

    /// Nodes whose title equals `title`.
    pub fn find_by_title(&self, title: &str) -> Vec<&TreeNode> {
        self.find_all(|n| n.info.title == title)
    }

    /// Nodes matching a composed [`Query`], capped at its result limit.
    pub fn query(&self, q: &Query, roles: &RoleRegistry, cache: &InfoCache) -> Vec<&TreeNode> {
        self.walk()
            .filter(|n| q.matches(n, roles, cache))
            .take(q.max_results)
            .collect()
    }
}

/// Pre-order traversal of a [`Tree`].
pub struct PreOrder<'a> {
    tree: &'a Tree,
    stack: Vec<usize>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id)?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Conjunction of node predicates.
#[derive(Debug, Clone)]
pub struct Query {
    role: Option<String>,
    title: Option<String>,
    title_contains: Option<String>,
    enabled: Option<bool>,
    clickable: bool,
    scrollable: bool,
    min_width: i32,
    min_height: i32,
    max_results: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            role: None,
            title: None,
            title_contains: None,
            enabled: None,
            clickable: false,
            scrollable: false,
            min_width: 0,
            min_height: 0,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Query {
    /// Start an empty query matching every node.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    fn matches(&self, n: &TreeNode, roles: &RoleRegistry, cache: &InfoCache) -> bool {
        let i = &n.info;
        if self.role.as_deref().is_some_and(|r| r != i.role) {
            return false;
        }
        if self.title.as_deref().is_some_and(|t| t != i.title) {
            return false;
        }
        if let Some(needle) = &self.title_contains
            && !i.title.to_lowercase().contains(needle.as_str())
        {
            return false;
        }
        if self.enabled.is_some_and(|e| e != i.enabled) {
            return false;
        }
        if i.size.width < self.min_width || i.size.height < self.min_height {
            return false;
        }
        if self.clickable && !n.element.is_clickable(roles, cache) {
            return false;
        }
        !self.scrollable || n.element.is_scrollable()
    }
}

/// Builder for [`Query`].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    q: Query,
}

impl QueryBuilder {
    /// Require an exact role.
    pub fn role(mut self, role: &str) -> Self {
        self.q.role = Some(role.to_string());
        self
    }

    /// Require an exact title.
    pub fn title(mut self, title: &str) -> Self {
        self.q.title = Some(title.to_string());
        self
    }

    /// Require a case-insensitive title substring.
    pub fn title_contains(mut self, needle: &str) -> Self {
        self.q.title_contains = Some(needle.to_lowercase());
        self
    }

    /// Require a particular enabled state.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.q.enabled = Some(enabled);
        self
    }

    /// Require clickability.
    pub fn clickable(mut self) -> Self {
        self.q.clickable = true;
        self
    }

    /// Require scrollable content.
    pub fn scrollable(mut self) -> Self {
        self.q.scrollable = true;
        self
    }

    /// Require a minimum size.
    pub fn min_size(mut self, width: i32, height: i32) -> Self {
        self.q.min_width = width;
        self.q.min_height = height;
        self
    }

    /// Cap the number of results.
    pub fn max_results(mut self, n: usize) -> Self {
        self.q.max_results = n;
        self
    }

    /// Finish the query.
    pub fn build(self) -> Query {
        self.q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TreeOptions, build_tree, mock::MockElement};

    fn sample_tree() -> Tree {
        let root = MockElement::new(1, "AXWindow", (0, 0, 800, 600))
            .child(
                MockElement::new(2, "AXGroup", (0, 0, 400, 600))
                    .child(MockElement::new(3, "AXButton", (10, 10, 40, 20)).title("Save"))
                    .child(
                        MockElement::new(4, "AXButton", (60, 10, 40, 20))
                            .title("Cancel")
                            .disabled(),
                    ),
            )
            .child(
                MockElement::new(5, "AXScrollArea", (400, 0, 400, 600))
                    .scrollable()
                    .child(MockElement::new(6, "AXLink", (410, 10, 4, 4)).title("save as")),
            )
            .into_element();
        build_tree(&root, &TreeOptions::default()).unwrap()
    }

    #[test]
    fn walk_is_pre_order() {
        let t = sample_tree();
        let ids: Vec<u64> = t.walk().map(|n| n.element.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn named_searches() {
        let t = sample_tree();
        let cache = InfoCache::default();
        let roles = RoleRegistry::default();
        let clickable: Vec<&str> = t
            .find_clickable(&roles, &cache)
            .iter()
            .map(|n| n.info.title.as_str())
            .collect();
        assert_eq!(clickable, vec!["Save", "save as"]);
        assert_eq!(t.find_scrollable().len(), 1);
        assert_eq!(t.find_by_role("AXButton").len(), 2);
        assert_eq!(t.find_by_title("Cancel").len(), 1);
        assert!(t.find_by_title("cancel").is_empty());
    }

    #[test]
    fn composed_query() {
        let t = sample_tree();
        let cache = InfoCache::default();
        let roles = RoleRegistry::default();
        let q = Query::builder().title_contains("SAVE").build();
        assert_eq!(t.query(&q, &roles, &cache).len(), 2);
        let q = Query::builder()
            .title_contains("save")
            .clickable()
            .min_size(10, 10)
            .build();
        let hits = t.query(&q, &roles, &cache);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].info.title, "Save");
        let q = Query::builder().max_results(2).build();
        assert_eq!(t.query(&q, &roles, &cache).len(), 2);
        let q = Query::builder().role("AXButton").enabled(false).build();
        assert_eq!(t.query(&q, &roles, &cache)[0].info.title, "Cancel");
    }
}
