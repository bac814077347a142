//! Generation ranks relative to the focus person.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::models::PersonId;

use super::index::FamilyIndex;

/// Relaxation steps allowed per visible node before giving up.
const STEPS_PER_NODE: usize = 16;

/// Assigns every visible id a rank: 0 for the focus, negative upwards.
///
/// Parents move up (`rank - 1`) and children down (`rank + 1`) whenever
/// that extends their current rank; the other parent of each child is
/// pinned to the rank of the parent being processed so couples share a
/// row. Ids the relaxation never reaches get rank 0.
pub fn assign_ranks(
    index: &FamilyIndex,
    visible: &BTreeSet<PersonId>,
    focus: PersonId,
) -> BTreeMap<PersonId, i32> {
    let mut ranks: BTreeMap<PersonId, i32> = BTreeMap::new();
    let mut queue = VecDeque::new();
    if visible.contains(&focus) {
        ranks.insert(focus, 0);
        queue.push_back(focus);
    }

    let budget = visible.len().saturating_mul(STEPS_PER_NODE) + 64;
    let mut steps = 0usize;
    while let Some(id) = queue.pop_front() {
        steps += 1;
        if steps > budget {
            tracing::debug!(budget, "Rank relaxation hit its step limit");
            break;
        }
        let rank = ranks[&id];

        for parent in index.parents(id).iter().filter(|p| visible.contains(p)) {
            let wanted = rank - 1;
            if ranks.get(&parent).map_or(true, |&current| wanted < current) {
                ranks.insert(parent, wanted);
                queue.push_back(parent);
            }
        }

        for child in index.children(id).filter(|c| visible.contains(c)) {
            let wanted = rank + 1;
            if ranks.get(&child).map_or(true, |&current| wanted > current) {
                ranks.insert(child, wanted);
                queue.push_back(child);
            }
            if let Some(co_parent) = index.parents(child).other(id) {
                if visible.contains(&co_parent) && ranks.get(&co_parent) != Some(&rank) {
                    ranks.insert(co_parent, rank);
                    queue.push_back(co_parent);
                }
            }
        }
    }

    for &id in visible {
        ranks.entry(id).or_insert(0);
    }
    ranks
}
