//! End-to-end tree scenarios through the public API.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use arbre::config::LayoutConfig;
use arbre::models::{InitialData, LinkRecord, Person, PersonId, Sex, Side};
use arbre::tree::{assign_ranks, compute_visible, pack_rows, FamilyIndex, TreeState, UnionKey};
use serde_json::json;

fn id(raw: i64) -> PersonId {
    PersonId::new(raw).unwrap()
}

fn ids(raw: &[i64]) -> BTreeSet<PersonId> {
    raw.iter().map(|&r| id(r)).collect()
}

/// Root, parents and paternal grandparents, with mixed id encodings.
fn five_person_payload() -> InitialData {
    serde_json::from_value(json!({
        "people": [
            {"id": 1, "name": "Root", "sex": "M"},
            {"id": "2", "name": "Father", "sex": "M"},
            {"id": 3, "name": "Mother", "sex": "F"},
            {"id": 4, "name": "Grandpa", "sex": "M"},
            {"id": 5, "name": "Grandma", "sex": "F"}
        ],
        "links": [
            {"child": "1", "father": 2, "mother": "3"},
            {"child": 2, "father": 4, "mother": 5}
        ],
        "rootId": "1"
    }))
    .unwrap()
}

fn node_ids(state: &mut TreeState) -> BTreeSet<PersonId> {
    state
        .render(&LayoutConfig::default(), true)
        .nodes
        .iter()
        .map(|n| n.id)
        .collect()
}

#[test]
fn test_union_key_ignores_parent_order() {
    for (f, m) in [(2, 3), (17, 4), (1, 1000)] {
        assert_eq!(
            UnionKey::new(Some(id(f)), Some(id(m))),
            UnionKey::new(Some(id(m)), Some(id(f)))
        );
    }
}

#[test]
fn test_merge_is_idempotent() {
    let data = five_person_payload();
    let mut once = TreeState::from_initial(&data, None, 3).unwrap();
    let mut twice = TreeState::from_initial(&data, None, 3).unwrap();
    let stats = twice.merge(&data.dataset);
    assert_eq!(stats.people_added, 0);

    assert_eq!(once.index().person_count(), twice.index().person_count());
    assert_eq!(once.index().union_count(), twice.index().union_count());
    assert_eq!(node_ids(&mut once), node_ids(&mut twice));
}

#[test]
fn test_three_generation_ranks() {
    let mut index = FamilyIndex::new();
    for raw in 1..=7 {
        index.add_person(Person::new(id(raw), format!("P{raw}"), Sex::Unknown));
    }
    index.ingest_link(&LinkRecord::new(id(1), Some(id(2)), Some(id(3))));
    index.ingest_link(&LinkRecord::new(id(2), Some(id(4)), Some(id(5))));
    index.ingest_link(&LinkRecord::new(id(3), Some(id(6)), Some(id(7))));

    let ranks = assign_ranks(&index, &ids(&[1, 2, 3, 4, 5, 6, 7]), id(1));
    assert_eq!(ranks[&id(1)], 0);
    assert_eq!((ranks[&id(2)], ranks[&id(3)]), (-1, -1));
    for raw in 4..=7 {
        assert_eq!(ranks[&id(raw)], -2);
    }
}

#[test]
fn test_spouse_reachable_only_by_marriage_shares_rank() {
    // A (2) is the focus's father; B (9) is married to A with child 8.
    let mut index = FamilyIndex::new();
    for raw in [1, 2, 8, 9] {
        index.add_person(Person::new(id(raw), format!("P{raw}"), Sex::Unknown));
    }
    index.ingest_link(&LinkRecord::new(id(1), Some(id(2)), None));
    index.ingest_link(&LinkRecord::new(id(8), Some(id(2)), Some(id(9))));

    let ranks = assign_ranks(&index, &ids(&[1, 2, 8, 9]), id(1));
    assert_eq!(ranks[&id(2)], -1);
    assert_eq!(ranks[&id(9)], -1);
}

/// Four generations with two married siblings and a married grandchild.
fn extended_family() -> FamilyIndex {
    let mut index = FamilyIndex::new();
    let people = [
        (1, Sex::Male),
        (2, Sex::Male),
        (3, Sex::Female),
        (4, Sex::Male),
        (5, Sex::Female),
        (6, Sex::Male),
        (7, Sex::Female),
        (8, Sex::Female),
        (20, Sex::Male),
        (21, Sex::Male),
        (22, Sex::Female),
        (30, Sex::Female),
        (31, Sex::Male),
        (32, Sex::Female),
        (40, Sex::Female),
        (41, Sex::Male),
    ];
    for (raw, sex) in people {
        index.add_person(Person::new(id(raw), format!("P{raw}"), sex));
    }
    let links = [
        (1, 2, 3),
        (8, 2, 3),
        (2, 4, 5),
        (3, 6, 7),
        (21, 20, 8),
        (22, 20, 8),
        (31, 1, 30),
        (32, 1, 30),
        (41, 31, 40),
    ];
    for (child, father, mother) in links {
        index.ingest_link(&LinkRecord::new(id(child), Some(id(father)), Some(id(mother))));
    }
    index
}

#[test]
fn test_layout_invariants_on_extended_family() {
    let index = extended_family();
    let style = LayoutConfig::default();
    let mut expanded = ids(&[1, 2, 3, 4, 5, 8, 31]);
    let mut auto = false;
    let graph = compute_visible(&index, id(1), 3, &HashMap::new(), &mut expanded, &mut auto);
    for raw in [20, 21, 22, 30, 31, 32, 40, 41] {
        assert!(graph.contains(id(raw)), "missing {raw}");
    }

    let ranks = assign_ranks(&index, &graph.visible, id(1));
    assert_eq!(ranks[&id(20)], 0);
    assert_eq!(ranks[&id(41)], 2);
    let packed = pack_rows(&index, &ranks, id(1), &style);

    // Spouses sit side by side, husband on the left.
    let mut pairs = 0;
    for union in index.unions() {
        let (Some(father), Some(mother)) = (union.father, union.mother) else {
            continue;
        };
        if !graph.contains(father) || !graph.contains(mother) || ranks[&father] != ranks[&mother] {
            continue;
        }
        let gap = packed.positions[&mother].x - packed.positions[&father].x;
        assert!(
            (gap - (style.node_width + style.spouse_gap)).abs() < 1e-6,
            "union {father}+{mother} gap {gap}"
        );
        pairs += 1;
    }
    assert_eq!(pairs, 5);

    // Clusters never overlap within a row.
    for (rank, clusters) in &packed.rows {
        let mut sorted: Vec<_> = clusters.iter().collect();
        sorted.sort_by(|a, b| a.centre().total_cmp(&b.centre()));
        for pair in sorted.windows(2) {
            let distance = pair[1].centre() - pair[0].centre();
            let minimum = pair[0].width / 2.0 + pair[1].width / 2.0 + style.h_gap;
            assert!(distance >= minimum - 1e-6, "overlap in row {rank}");
        }
    }

    // Every node lands on its row.
    let row_height = style.node_height + style.v_gap;
    let rows: BTreeMap<PersonId, f64> = packed.positions.iter().map(|(&k, p)| (k, p.y)).collect();
    for (person, y) in rows {
        assert_eq!(y, f64::from(ranks[&person]) * row_height);
    }
}

#[test]
fn test_five_person_scenario() {
    let mut state = TreeState::from_initial(&five_person_payload(), None, 3).unwrap();
    let layout = state.render(&LayoutConfig::default(), true);

    let shown: BTreeSet<PersonId> = layout.nodes.iter().map(|n| n.id).collect();
    assert_eq!(shown, ids(&[1, 2, 3, 4, 5]));

    let ranks: BTreeMap<i64, i32> = layout.nodes.iter().map(|n| (n.id.get(), n.rank)).collect();
    assert_eq!(
        ranks,
        BTreeMap::from([(1, 0), (2, -1), (3, -1), (4, -2), (5, -2)])
    );

    let couples: BTreeSet<(Option<PersonId>, Option<PersonId>)> = layout
        .connectors
        .iter()
        .map(|c| (c.father, c.mother))
        .collect();
    assert_eq!(layout.connectors.len(), 2);
    assert!(couples.contains(&(Some(id(2)), Some(id(3)))));
    assert!(couples.contains(&(Some(id(4)), Some(id(5)))));
    for connector in &layout.connectors {
        // Two parent drops and the marriage line.
        assert_eq!(connector.marriage.len(), 3);
        assert_eq!(connector.children.len(), 1);
    }
}

#[test]
fn test_grandparent_click_switches_lineage() {
    let mut state = TreeState::from_initial(&five_person_payload(), None, 3).unwrap();
    let layout = state.render(&LayoutConfig::default(), true);
    assert_eq!(layout.node(id(4)).unwrap().switch, Some(Side::Father));

    let effect = state.click(id(4)).unwrap();
    assert!(!effect.refocused);
    assert_eq!(state.lineage(id(2)), Some(Side::Father));
    assert_eq!(state.focus(), id(1));
}

#[test]
fn test_second_click_on_recorded_switch_refocuses() {
    let mut state = TreeState::from_initial(&five_person_payload(), None, 3).unwrap();
    state.render(&LayoutConfig::default(), true);
    assert!(!state.click(id(4)).unwrap().refocused);

    let layout = state.render(&LayoutConfig::default(), false);
    assert_eq!(layout.node(id(4)).unwrap().switch, Some(Side::Father));
    let effect = state.click(id(4)).unwrap();
    assert!(effect.refocused);
    assert_eq!(effect.switched, None);
    assert_eq!(state.focus(), id(4));
}

#[test]
fn test_frontier_parent_click_switches_lineage() {
    let mut state = TreeState::from_initial(&five_person_payload(), None, 2).unwrap();
    let layout = state.render(&LayoutConfig::default(), true);
    assert!(layout.node(id(4)).is_none());

    state.click(id(3)).unwrap();
    assert_eq!(state.lineage(id(1)), Some(Side::Mother));
    assert_eq!(state.focus(), id(1));

    state.set_depth(3);
    let layout = state.render(&LayoutConfig::default(), false);
    assert!(layout.node(id(3)).unwrap().trunk);
    assert!(!layout.node(id(2)).unwrap().trunk);
}

#[test]
fn test_click_elsewhere_refocuses() {
    let mut data = five_person_payload();
    data.dataset.links.push(LinkRecord::new(id(6), Some(id(1)), None));
    data.dataset
        .people
        .push(serde_json::from_value(json!({"id": 6, "name": "Child"})).unwrap());
    let mut state = TreeState::from_initial(&data, None, 3).unwrap();
    let layout = state.render(&LayoutConfig::default(), true);
    assert!(layout.node(id(6)).is_some());

    let effect = state.click(id(6)).unwrap();
    assert!(effect.refocused);
    assert_eq!(state.focus(), id(6));
    let layout = state.render(&LayoutConfig::default(), false);
    assert!(layout.node(id(6)).unwrap().focus);
    assert_eq!(layout.node(id(1)).unwrap().rank, -1);
}

#[test]
fn test_missing_and_unknown_focus() {
    let mut data = five_person_payload();
    data.root_id = serde_json::Value::Null;
    assert!(TreeState::from_initial(&data, None, 3).is_err());
    assert!(TreeState::from_initial(&data, Some(id(77)), 3).is_err());
    assert!(TreeState::from_initial(&data, Some(id(4)), 3).is_ok());
}
