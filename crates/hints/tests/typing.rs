use ax_query::{
    Candidate, InfoCache, RoleRegistry, TreeOptions, build_tree,
    mock::{ActionLog, MockElement},
};
use hints::{HintCollection, HintGenerator, InputOutcome};

fn toolbar(count: u64) -> MockElement {
    let mut bar = MockElement::new(1, "AXWindow", (0, 0, 2000, 2000));
    for i in 0..count {
        let x = (i % 40) as i32 * 50;
        let y = (i / 40) as i32 * 40;
        bar = bar.child(MockElement::new(10 + i, "AXButton", (x, y, 40, 30)).title(&format!("b{i}")));
    }
    bar
}

#[test]
fn every_label_resolves_to_its_own_element() {
    let log = ActionLog::new();
    let root = toolbar(100).into_element_logged(&log);
    let cache = InfoCache::default();
    let tree = build_tree(&root, &TreeOptions::with_cache(cache.clone())).unwrap();
    let cands: Vec<Candidate> = tree
        .find_clickable(&RoleRegistry::default(), &cache)
        .into_iter()
        .map(|n| Candidate::new(n.element.clone(), n.info.clone()))
        .collect();
    assert_eq!(cands.len(), 100);

    let g = HintGenerator::default();
    let mut coll = HintCollection::new(g.generate(cands).unwrap(), g.alphabet());
    let labels: Vec<String> = coll.hints().iter().map(|h| h.label.clone()).collect();
    assert!(labels.iter().all(|l| l.len() == 3));

    for label in labels {
        let mut last = None;
        for ch in label.to_lowercase().chars() {
            last = Some(coll.handle_input(ch));
        }
        match last {
            Some(InputOutcome::Resolved(h)) => {
                assert_eq!(h.label, label);
                assert!(h.element.click(ax_query::ClickKind::Left));
            }
            other => panic!("label {label} did not resolve: {other:?}"),
        }
        coll.reset();
    }
    assert_eq!(log.calls().len(), 100);
}
