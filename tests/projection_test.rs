//! Projection tests: flatten order, expansion invariants, round-trips.

use listtree::util::testing::{init_test_setup, OutlineFixture};
use listtree::{describe_all_levels, describe_shown, ListTreeSource};
use rstest::{fixture, rstest};

#[fixture]
fn sample_forest() -> ListTreeSource<&'static str> {
    init_test_setup();
    let mut source = ListTreeSource::new();
    source.append(vec!["A", "C"], None);
    source.append(vec!["B"], Some(&"A"));
    source.append(vec!["D", "E"], Some(&"B"));
    source.reload();
    source
}

fn shown_values(source: &ListTreeSource<&'static str>) -> Vec<&'static str> {
    source.items().iter().map(|n| n.value).collect()
}

// ============================================================
// Reference scenario
// ============================================================

#[rstest]
fn given_collapsed_forest_when_reloading_then_only_roots_show(
    sample_forest: ListTreeSource<&'static str>,
) {
    assert_eq!(shown_values(&sample_forest), vec!["A", "C"]);
}

#[rstest]
fn given_collapsed_forest_when_expanding_a_then_only_its_children_appear(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    sample_forest.toggle_expand(&"A");
    // B's own children stay hidden until B is expanded too.
    assert_eq!(shown_values(&sample_forest), vec!["A", "B", "C"]);

    sample_forest.toggle_expand(&"B");
    assert_eq!(shown_values(&sample_forest), vec!["A", "B", "D", "E", "C"]);
}

#[rstest]
fn given_expanded_node_when_toggling_again_then_it_collapses(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    sample_forest.toggle_expand(&"A");
    sample_forest.toggle_expand(&"A");
    assert_eq!(shown_values(&sample_forest), vec!["A", "C"]);
}

// ============================================================
// Invariants
// ============================================================

#[rstest]
fn given_collapsed_node_when_projecting_then_no_descendant_appears(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    sample_forest.expand_all();
    sample_forest.toggle_expand(&"B"); // collapse B again
    let shown = shown_values(&sample_forest);
    assert!(!shown.contains(&"D"));
    assert!(!shown.contains(&"E"));
    assert_eq!(shown, vec!["A", "B", "C"]);
}

#[rstest]
fn given_expanded_node_when_projecting_then_children_immediately_follow(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    sample_forest.expand_all();
    let shown = shown_values(&sample_forest);

    let b_pos = shown.iter().position(|&v| v == "B").unwrap();
    assert_eq!(&shown[b_pos + 1..b_pos + 3], &["D", "E"]);

    // Later siblings of B come after B's whole subtree.
    let c_pos = shown.iter().position(|&v| v == "C").unwrap();
    assert!(c_pos > b_pos + 2);
}

#[rstest]
fn given_expanded_leaf_when_reloading_then_it_behaves_like_a_collapsed_leaf(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    let idx = sample_forest.lookup(&"C").unwrap();
    sample_forest.get_node_mut(idx).unwrap().expanded = true;
    sample_forest.reload();

    assert_eq!(shown_values(&sample_forest), vec!["A", "C"]);
    // The flag itself is preserved verbatim.
    assert!(sample_forest.get_node(idx).unwrap().expanded);
}

#[rstest]
fn given_fully_expanded_forest_when_projecting_then_it_matches_the_full_flatten(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    sample_forest.expand_all();
    // Round-trip: the fully expanded projection is the depth-first flatten of
    // the backing forest, so folding it back by (parent, order) reproduces
    // the original structure.
    assert_eq!(describe_shown(&sample_forest), describe_all_levels(&sample_forest));
}

#[rstest]
fn given_projection_when_rebuilding_nested_structure_then_it_round_trips(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    sample_forest.expand_all();

    // Group the flat rows back into parent -> children lists.
    let mut rebuilt: Vec<(Option<&str>, &str)> = Vec::new();
    for node in sample_forest.items() {
        let parent = node
            .parent
            .and_then(|p| sample_forest.get_node(p))
            .map(|p| p.value);
        rebuilt.push((parent, node.value));
    }

    assert_eq!(
        rebuilt,
        vec![
            (None, "A"),
            (Some("A"), "B"),
            (Some("B"), "D"),
            (Some("B"), "E"),
            (None, "C"),
        ]
    );
}

// ============================================================
// Batch expansion
// ============================================================

#[rstest]
fn given_subtree_batch_expand_then_every_descendant_opens(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    sample_forest.set_subtree_expanded(&"A", true);
    assert_eq!(shown_values(&sample_forest), vec!["A", "B", "D", "E", "C"]);

    sample_forest.set_subtree_expanded(&"A", false);
    assert_eq!(shown_values(&sample_forest), vec!["A", "C"]);
}

#[rstest]
fn given_expand_all_then_collapse_all_round_trips_to_roots(
    mut sample_forest: ListTreeSource<&'static str>,
) {
    sample_forest.expand_all();
    assert_eq!(sample_forest.items().len(), 5);

    sample_forest.collapse_all();
    assert_eq!(shown_values(&sample_forest), vec!["A", "C"]);
}

// ============================================================
// Deep nesting (iterative traversal)
// ============================================================

#[rstest]
fn given_very_deep_chain_when_expanding_all_then_traversal_stays_iterative() {
    init_test_setup();
    let fixture = OutlineFixture::chain(20_000);
    let mut source: ListTreeSource<String> = ListTreeSource::new();
    fixture.populate(&mut source);

    assert_eq!(source.len(), 20_000);
    assert_eq!(source.items().len(), 1); // collapsed: the single root

    source.expand_all();
    assert_eq!(source.items().len(), 20_000);

    let deepest = source.items().last().unwrap().level;
    assert_eq!(deepest, 19_999);

    // Deleting the root walks and frees the whole chain without recursion.
    source.delete(&["0".to_string()]);
    assert!(source.is_empty());
}
