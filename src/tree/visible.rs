//! Visible-subgraph computation: trunk selection and descendant closure.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::models::{PersonId, Side};

use super::index::FamilyIndex;

/// Upper bound on descendant-closure rounds; cyclic data stops here.
const CLOSURE_ROUNDS: usize = 64;

/// A node whose click switches the lineage preference of `child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineageSwitch {
    pub child: PersonId,
    pub side: Side,
}

/// Result of [`compute_visible`].
#[derive(Debug, Clone, Default)]
pub struct VisibleGraph {
    pub visible: BTreeSet<PersonId>,
    /// Direct-ancestor chain from the focus upwards, focus first.
    pub trunk: Vec<PersonId>,
    pub switches: BTreeMap<PersonId, LineageSwitch>,
}

impl VisibleGraph {
    pub fn contains(&self, id: PersonId) -> bool {
        self.visible.contains(&id)
    }

    pub fn is_trunk(&self, id: PersonId) -> bool {
        self.trunk.contains(&id)
    }
}

/// Computes the set of drawn persons around `focus`.
///
/// `auto_expand` is the one-shot flag: when set, focus, parents and
/// grandparents are added to `expanded` and the flag is cleared.
pub fn compute_visible(
    index: &FamilyIndex,
    focus: PersonId,
    depth: usize,
    lineage: &HashMap<PersonId, Side>,
    expanded: &mut BTreeSet<PersonId>,
    auto_expand: &mut bool,
) -> VisibleGraph {
    let mut graph = VisibleGraph::default();
    graph.visible.insert(focus);
    graph.trunk.push(focus);

    let steps = depth.saturating_sub(1);
    let mut current = focus;
    for level in 0..steps {
        let parents = index.visible_parents(current);
        if parents.father.is_none() && parents.mother.is_none() {
            break;
        }
        graph.visible.extend(parents.iter());

        let remaining = steps - level - 1;
        let side = choose_side(index, current, remaining, lineage);
        let last_step = level + 1 == steps;
        for candidate in [Side::Father, Side::Mother] {
            let Some(parent) = parents.get(candidate) else {
                continue;
            };
            if candidate != side || last_step {
                graph.switches.insert(
                    parent,
                    LineageSwitch {
                        child: current,
                        side: candidate,
                    },
                );
            }
        }

        match parents.get(side) {
            Some(next) if !graph.trunk.contains(&next) => {
                graph.trunk.push(next);
                current = next;
            }
            _ => break,
        }
    }

    if *auto_expand {
        expanded.insert(focus);
        for parent in index.visible_parents(focus).iter() {
            expanded.insert(parent);
            expanded.extend(index.visible_parents(parent).iter());
        }
        *auto_expand = false;
    }

    close_descendants(index, expanded, &mut graph.visible);
    graph
}

/// Picks the parent that continues the trunk from `child`.
///
/// Priority: explicit lineage choice, the only known side, the side with
/// strictly more ancestors within `remaining` generations, the father.
fn choose_side(
    index: &FamilyIndex,
    child: PersonId,
    remaining: usize,
    lineage: &HashMap<PersonId, Side>,
) -> Side {
    let parents = index.visible_parents(child);
    if let Some(&side) = lineage.get(&child) {
        if parents.get(side).is_some() {
            return side;
        }
    }
    match (parents.father, parents.mother) {
        (Some(_), None) => Side::Father,
        (None, Some(_)) => Side::Mother,
        (Some(father), Some(mother)) => {
            let paternal = count_ancestors(index, father, remaining);
            let maternal = count_ancestors(index, mother, remaining);
            if maternal > paternal {
                Side::Mother
            } else {
                Side::Father
            }
        }
        (None, None) => Side::Father,
    }
}

/// Distinct non-hidden ancestors of `start` within `generations`.
pub fn count_ancestors(index: &FamilyIndex, start: PersonId, generations: usize) -> usize {
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([(start, 0usize)]);
    while let Some((id, gen)) = queue.pop_front() {
        if gen >= generations {
            continue;
        }
        for parent in index.visible_parents(id).iter() {
            if seen.insert(parent) {
                queue.push_back((parent, gen + 1));
            }
        }
    }
    seen.len() - 1
}

fn close_descendants(
    index: &FamilyIndex,
    expanded: &BTreeSet<PersonId>,
    visible: &mut BTreeSet<PersonId>,
) {
    for round in 0..CLOSURE_ROUNDS {
        let mut changed = false;
        let sources: Vec<PersonId> = visible
            .iter()
            .copied()
            .filter(|id| expanded.contains(id) && !index.is_hidden(*id))
            .collect();
        for parent in sources {
            for child in index.children(parent) {
                if index.is_hidden(child) {
                    continue;
                }
                changed |= visible.insert(child);
                if let Some(co_parent) = index.parents(child).other(parent) {
                    if !index.is_hidden(co_parent) {
                        changed |= visible.insert(co_parent);
                    }
                }
            }
        }
        if !changed {
            return;
        }
        if round + 1 == CLOSURE_ROUNDS {
            tracing::debug!("Descendant closure hit its round limit");
        }
    }
}
