use std::time::Duration;

use ax_query::{
    InfoCache, RoleRegistry, TreeOptions, build_tree, build_tree_concurrent,
    mock::{ActionLog, MockElement},
};

fn form() -> MockElement {
    let mut group = MockElement::new(2, "AXGroup", (0, 0, 600, 400));
    for i in 0..20u64 {
        let x = 10 + (i as i32 % 5) * 100;
        let y = 10 + (i as i32 / 5) * 50;
        group = group.child(MockElement::new(100 + i, "AXButton", (x, y, 80, 30)).title(&format!("b{i}")));
    }
    MockElement::new(1, "AXWindow", (0, 0, 600, 400))
        .child(group)
        .child(MockElement::new(3, "AXStaticText", (0, 380, 600, 20)))
}

#[test]
fn second_build_is_served_from_cache() {
    let log = ActionLog::new();
    let root = form().into_element_logged(&log);
    let cache = InfoCache::default();
    let opts = TreeOptions::with_cache(cache.clone());

    let first = build_tree(&root, &opts).unwrap();
    let cold = log.info_queries();
    assert_eq!(cold, first.len());

    let second = build_tree(&root, &opts).unwrap();
    assert_eq!(second.len(), first.len());
    assert_eq!(log.info_queries(), cold);

    cache.advance_epoch();
    let _third = build_tree(&root, &opts).unwrap();
    assert_eq!(log.info_queries(), cold * 2);
}

#[test]
fn clickability_checks_reuse_build_snapshots() {
    let log = ActionLog::new();
    let root = form().into_element_logged(&log);
    let cache = InfoCache::default();
    let tree = build_tree(&root, &TreeOptions::with_cache(cache.clone())).unwrap();
    let after_build = log.info_queries();
    let hits = tree.find_clickable(&RoleRegistry::default(), &cache);
    assert_eq!(hits.len(), 20);
    assert_eq!(log.info_queries(), after_build);
}

#[test]
fn dropping_the_tree_releases_every_retained_handle() {
    let log = ActionLog::new();
    let root = form().into_element_logged(&log);
    let tree = build_tree(&root, &TreeOptions::default()).unwrap();
    drop(root);
    assert_eq!(log.releases(), 0);
    drop(tree);
    // window, group, 20 buttons and the static text
    assert_eq!(log.releases(), 23);
}

#[test]
fn concurrent_build_is_bounded_and_complete() {
    let mut window = MockElement::new(1, "AXWindow", (0, 0, 1000, 1000));
    for g in 0..8u64 {
        let mut group = MockElement::new(10 + g, "AXGroup", (0, 0, 1000, 1000))
            .delay(Duration::from_millis(2));
        for b in 0..8u64 {
            group = group.child(
                MockElement::new(1000 + g * 10 + b, "AXButton", (5, 5, 30, 30))
                    .delay(Duration::from_millis(2)),
            );
        }
        window = window.child(group);
    }
    let root = window.into_element();
    let opts = TreeOptions {
        max_parallel: 3,
        ..TreeOptions::default()
    };
    let tree = build_tree_concurrent(&root, &opts).unwrap();
    assert_eq!(tree.len(), 1 + 8 + 64);
    let stats = tree.stats();
    assert!(stats.peak_inflight >= 1);
    assert!(stats.peak_inflight <= 3);
    assert_eq!(stats.visited, 72);
    assert_eq!(stats.skipped, 0);
}
