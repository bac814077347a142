//! Row packing: spouse clusters, barycentric placement and separation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::LayoutConfig;
use crate::models::{PersonId, Sex};

use super::index::{FamilyIndex, UnionKey};

/// Extra placement sweeps after the initial outward pass.
const SWEEPS: usize = 4;

/// Position of one node: `x` is the box centre, `y` its top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A packed layout unit: one person or a spouse pair, left to right.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub members: Vec<PersonId>,
    pub width: f64,
    pub x: Option<f64>,
}

impl Cluster {
    pub fn centre(&self) -> f64 {
        self.x.unwrap_or(0.0)
    }
}

/// Output of [`pack_rows`].
#[derive(Debug, Clone, Default)]
pub struct PackedRows {
    pub positions: BTreeMap<PersonId, Position>,
    /// Clusters per rank, ordered left to right.
    pub rows: BTreeMap<i32, Vec<Cluster>>,
}

/// Lays out every ranked id. The focus cluster ends up centred on x = 0.
pub fn pack_rows(
    index: &FamilyIndex,
    ranks: &BTreeMap<PersonId, i32>,
    focus: PersonId,
    style: &LayoutConfig,
) -> PackedRows {
    let mut packer = Packer {
        index,
        ranks,
        style,
        rows: build_clusters(index, ranks, style),
        node_x: BTreeMap::new(),
    };
    if packer.rows.is_empty() {
        return PackedRows::default();
    }

    let min_rank = *packer.rows.keys().next().unwrap_or(&0);
    let max_rank = *packer.rows.keys().next_back().unwrap_or(&0);

    packer.place_origin_row(focus);
    for rank in (min_rank..0).rev() {
        packer.place_row(rank, rank + 1);
    }
    for rank in 1..=max_rank {
        packer.place_row(rank, rank - 1);
    }
    for _ in 0..SWEEPS {
        if min_rank < 0 {
            packer.place_row(0, -1);
            packer.recentre(focus);
        }
        for rank in 1..=max_rank {
            packer.place_row(rank, rank - 1);
        }
        for rank in (min_rank..0).rev() {
            packer.place_row(rank, rank + 1);
        }
    }

    let row_height = style.node_height + style.v_gap;
    let positions = packer
        .node_x
        .iter()
        .map(|(&id, &x)| {
            let rank = ranks.get(&id).copied().unwrap_or(0);
            (
                id,
                Position {
                    x,
                    y: f64::from(rank) * row_height,
                },
            )
        })
        .collect();

    PackedRows {
        positions,
        rows: packer.rows,
    }
}

struct Packer<'a> {
    index: &'a FamilyIndex,
    ranks: &'a BTreeMap<PersonId, i32>,
    style: &'a LayoutConfig,
    rows: BTreeMap<i32, Vec<Cluster>>,
    node_x: BTreeMap<PersonId, f64>,
}

impl Packer<'_> {
    /// Rank 0: sibling groups packed left to right, then shifted so the
    /// focus cluster sits at the origin.
    fn place_origin_row(&mut self, focus: PersonId) {
        let Some(mut clusters) = self.rows.remove(&0) else {
            return;
        };
        let focus_union = self.index.child_union(focus);
        let group = |cluster: &Cluster| -> (u8, Option<UnionKey>, PersonId) {
            let first = cluster.members[0];
            let unions: Vec<Option<UnionKey>> = cluster
                .members
                .iter()
                .map(|&m| self.index.child_union(m))
                .collect();
            let near = cluster.members.contains(&focus)
                || (focus_union.is_some() && unions.contains(&focus_union));
            (u8::from(!near), unions[0], first)
        };
        clusters.sort_by_key(|c| group(c));

        let mut x = 0.0;
        let mut origin = 0.0;
        for i in 0..clusters.len() {
            if i > 0 {
                x += self.separation(&clusters[i - 1], &clusters[i]);
            }
            clusters[i].x = Some(x);
            if clusters[i].members.contains(&focus) {
                origin = x;
            }
        }
        for cluster in &mut clusters {
            cluster.x = cluster.x.map(|x| x - origin);
        }
        self.commit(0, clusters);
    }

    /// Shifts every placed row so the focus cluster sits at x = 0.
    fn recentre(&mut self, focus: PersonId) {
        let Some(origin) = self
            .rows
            .get(&0)
            .and_then(|row| row.iter().find(|c| c.members.contains(&focus)))
            .and_then(|c| c.x)
        else {
            return;
        };
        if origin == 0.0 {
            return;
        }
        for cluster in self.rows.values_mut().flatten() {
            cluster.x = cluster.x.map(|x| x - origin);
        }
        for x in self.node_x.values_mut() {
            *x -= origin;
        }
    }

    /// Places one row against the already positioned `reference` row.
    fn place_row(&mut self, rank: i32, reference: i32) {
        let Some(clusters) = self.rows.remove(&rank) else {
            return;
        };
        let descending = reference < rank;

        let mut desired: Vec<Option<f64>> = clusters
            .iter()
            .map(|c| self.barycentre(c, reference, descending))
            .collect();

        if descending {
            self.group_siblings(&clusters, &mut desired, reference);
        }

        // Clusters without any anchor keep their previous spot or queue up
        // to the right of everything anchored.
        let mut order: Vec<usize> = (0..clusters.len()).collect();
        order.sort_by(|&a, &b| {
            let key = |i: usize| desired[i].or(clusters[i].x);
            match (key(a), key(b)) {
                (Some(xa), Some(xb)) => xa.partial_cmp(&xb).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| clusters[a].members[0].cmp(&clusters[b].members[0]))
        });

        let mut slots: Vec<Option<Cluster>> = clusters.into_iter().map(Some).collect();
        let mut sorted: Vec<Cluster> = Vec::with_capacity(slots.len());
        let mut targets: Vec<f64> = Vec::with_capacity(slots.len());
        for &i in &order {
            let Some(cluster) = slots[i].take() else {
                continue;
            };
            let target = match desired[i].or(cluster.x) {
                Some(x) => x,
                None => match (sorted.last(), targets.last()) {
                    (Some(prev), Some(&px)) => px + self.separation(prev, &cluster),
                    _ => 0.0,
                },
            };
            targets.push(target);
            sorted.push(cluster);
        }

        let widths: Vec<f64> = sorted.iter().map(|c| c.width).collect();
        let xs = separate(&targets, &widths, self.style.h_gap);
        for (cluster, x) in sorted.iter_mut().zip(xs) {
            cluster.x = Some(x);
        }
        self.commit(rank, sorted);
    }

    /// Mean x of neighbours in the reference row (parents when
    /// descending, children when ascending).
    fn barycentre(&self, cluster: &Cluster, reference: i32, descending: bool) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &member in &cluster.members {
            let neighbours: Vec<PersonId> = if descending {
                self.index.parents(member).iter().collect()
            } else {
                self.index.children(member).collect()
            };
            for n in neighbours {
                if self.ranks.get(&n) != Some(&reference) {
                    continue;
                }
                if let Some(&x) = self.node_x.get(&n) {
                    sum += x;
                    count += 1;
                }
            }
        }
        (count > 0).then(|| sum / count as f64)
    }

    /// Pulls clusters of children sharing one union into a tight group
    /// centred under the union's midpoint.
    fn group_siblings(&self, clusters: &[Cluster], desired: &mut [Option<f64>], reference: i32) {
        let mut groups: BTreeMap<UnionKey, Vec<usize>> = BTreeMap::new();
        for (i, cluster) in clusters.iter().enumerate() {
            let key = cluster.members.iter().find_map(|&m| {
                let key = self.index.child_union(m)?;
                self.union_midpoint(&key, reference).map(|_| key)
            });
            if let Some(key) = key {
                groups.entry(key).or_default().push(i);
            }
        }

        for (key, mut members) in groups {
            let Some(mid) = self.union_midpoint(&key, reference) else {
                continue;
            };
            members.sort_by(|&a, &b| {
                let xa = desired[a].unwrap_or(mid);
                let xb = desired[b].unwrap_or(mid);
                xa.partial_cmp(&xb)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| clusters[a].members[0].cmp(&clusters[b].members[0]))
            });
            let total: f64 = members.iter().map(|&i| clusters[i].width).sum::<f64>()
                + self.style.h_gap * (members.len().saturating_sub(1)) as f64;
            let mut left = mid - total / 2.0;
            for i in members {
                desired[i] = Some(left + clusters[i].width / 2.0);
                left += clusters[i].width + self.style.h_gap;
            }
        }
    }

    fn union_midpoint(&self, key: &UnionKey, reference: i32) -> Option<f64> {
        let xs: Vec<f64> = key
            .members()
            .filter(|p| self.ranks.get(p) == Some(&reference))
            .filter_map(|p| self.node_x.get(&p).copied())
            .collect();
        (!xs.is_empty()).then(|| xs.iter().sum::<f64>() / xs.len() as f64)
    }

    fn separation(&self, a: &Cluster, b: &Cluster) -> f64 {
        a.width / 2.0 + b.width / 2.0 + self.style.h_gap
    }

    fn commit(&mut self, rank: i32, clusters: Vec<Cluster>) {
        let offset = (self.style.node_width + self.style.spouse_gap) / 2.0;
        for cluster in &clusters {
            let centre = cluster.centre();
            match cluster.members.as_slice() {
                [single] => {
                    self.node_x.insert(*single, centre);
                }
                [left, right] => {
                    self.node_x.insert(*left, centre - offset);
                    self.node_x.insert(*right, centre + offset);
                }
                _ => {}
            }
        }
        self.rows.insert(rank, clusters);
    }
}

/// Groups each row into spouse pairs and singletons.
fn build_clusters(
    index: &FamilyIndex,
    ranks: &BTreeMap<PersonId, i32>,
    style: &LayoutConfig,
) -> BTreeMap<i32, Vec<Cluster>> {
    let mut by_rank: BTreeMap<i32, BTreeSet<PersonId>> = BTreeMap::new();
    for (&id, &rank) in ranks {
        by_rank.entry(rank).or_default().insert(id);
    }

    let pair_width = style.node_width * 2.0 + style.spouse_gap;
    let mut rows = BTreeMap::new();
    for (rank, ids) in by_rank {
        let mut paired: BTreeSet<PersonId> = BTreeSet::new();
        let mut clusters = Vec::new();
        for union in index.unions() {
            let (Some(father), Some(mother)) = (union.father, union.mother) else {
                continue;
            };
            if !ids.contains(&father) || !ids.contains(&mother) {
                continue;
            }
            if paired.contains(&father) || paired.contains(&mother) {
                continue;
            }
            let (left, right) = spouse_order(index, father, mother);
            paired.insert(father);
            paired.insert(mother);
            clusters.push(Cluster {
                members: vec![left, right],
                width: pair_width,
                x: None,
            });
        }
        for id in ids.iter().filter(|id| !paired.contains(id)) {
            clusters.push(Cluster {
                members: vec![*id],
                width: style.node_width,
                x: None,
            });
        }
        rows.insert(rank, clusters);
    }
    rows
}

/// Male left, female right; otherwise ascending id.
fn spouse_order(index: &FamilyIndex, a: PersonId, b: PersonId) -> (PersonId, PersonId) {
    let sex = |id| index.person(id).map_or(Sex::Unknown, |p| p.sex);
    match (sex(a), sex(b)) {
        (Sex::Male, Sex::Female) => (a, b),
        (Sex::Female, Sex::Male) => (b, a),
        _ if a <= b => (a, b),
        _ => (b, a),
    }
}

/// Resolves overlaps while staying close to `targets`.
///
/// A forward pass pushes clusters right, a backward pass pushes them left;
/// their midpoint spreads the displacement to both sides, and a final
/// forward pass restores the minimum separation.
fn separate(targets: &[f64], widths: &[f64], gap: f64) -> Vec<f64> {
    let n = targets.len();
    let sep = |i: usize| widths[i] / 2.0 + widths[i + 1] / 2.0 + gap;

    let mut forward = targets.to_vec();
    for i in 1..n {
        forward[i] = forward[i].max(forward[i - 1] + sep(i - 1));
    }
    let mut backward = targets.to_vec();
    for i in (0..n.saturating_sub(1)).rev() {
        backward[i] = backward[i].min(backward[i + 1] - sep(i));
    }

    let mut xs: Vec<f64> = forward
        .iter()
        .zip(&backward)
        .map(|(f, b)| (f + b) / 2.0)
        .collect();
    for i in 1..n {
        xs[i] = xs[i].max(xs[i - 1] + sep(i - 1));
    }
    xs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkRecord, Person};

    fn id(raw: i64) -> PersonId {
        PersonId::new(raw).unwrap()
    }

    #[test]
    fn test_separate_keeps_minimum_distance() {
        let xs = separate(&[0.0, 0.0, 0.0], &[100.0, 100.0, 100.0], 10.0);
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] >= 110.0 - 1e-9);
        }
        // Displacement is spread around the shared target.
        assert!(xs[0] < 0.0 && xs[2] > 0.0);
    }

    #[test]
    fn test_separate_leaves_spaced_targets_alone() {
        let xs = separate(&[-500.0, 0.0, 500.0], &[100.0, 100.0, 100.0], 10.0);
        assert_eq!(xs, vec![-500.0, 0.0, 500.0]);
    }

    #[test]
    fn test_spouse_order_by_sex_then_id() {
        let mut index = FamilyIndex::new();
        index.add_person(Person::new(id(1), "Wife", Sex::Female));
        index.add_person(Person::new(id(2), "Husband", Sex::Male));
        index.add_person(Person::new(id(3), "A", Sex::Unknown));
        index.add_person(Person::new(id(4), "B", Sex::Unknown));
        assert_eq!(spouse_order(&index, id(1), id(2)), (id(2), id(1)));
        assert_eq!(spouse_order(&index, id(4), id(3)), (id(3), id(4)));
    }

    #[test]
    fn test_siblings_grouped_under_parents() {
        let mut index = FamilyIndex::new();
        index.add_person(Person::new(id(2), "Father", Sex::Male));
        index.add_person(Person::new(id(3), "Mother", Sex::Female));
        for child in [10, 11, 12] {
            index.add_person(Person::new(id(child), "Child", Sex::Unknown));
            index.ingest_link(&LinkRecord::new(id(child), Some(id(2)), Some(id(3))));
        }
        let ranks: BTreeMap<PersonId, i32> = [(2, -1), (3, -1), (10, 0), (11, 0), (12, 0)]
            .into_iter()
            .map(|(raw, rank)| (id(raw), rank))
            .collect();
        let style = LayoutConfig::default();
        let packed = pack_rows(&index, &ranks, id(10), &style);
        let father = packed.positions[&id(2)].x;
        let mother = packed.positions[&id(3)].x;
        let mid = (father + mother) / 2.0;
        let children: Vec<f64> = [10, 11, 12].iter().map(|&c| packed.positions[&id(c)].x).collect();
        let centre = children.iter().sum::<f64>() / 3.0;
        assert!((centre - mid).abs() < style.node_width);
        assert!((mother - father - (style.node_width + style.spouse_gap)).abs() < 1e-6);
    }

    /// Half-siblings of the focus follow their shared parent's side.
    #[test]
    fn test_focus_row_follows_parents_order() {
        let mut index = FamilyIndex::new();
        index.add_person(Person::new(id(20), "Father", Sex::Male));
        index.add_person(Person::new(id(21), "Mother", Sex::Female));
        let links = [(1, None, Some(21)), (2, Some(20), None), (3, Some(20), Some(21))];
        for (child, father, mother) in links {
            index.add_person(Person::new(id(child), "Child", Sex::Unknown));
            index.ingest_link(&LinkRecord::new(id(child), father.map(id), mother.map(id)));
        }
        let ranks: BTreeMap<PersonId, i32> = [(1, 0), (2, 0), (3, 0), (20, -1), (21, -1)]
            .into_iter()
            .map(|(raw, rank)| (id(raw), rank))
            .collect();
        let style = LayoutConfig::default();
        let packed = pack_rows(&index, &ranks, id(1), &style);
        let x = |raw: i64| packed.positions[&id(raw)].x;

        assert!(x(20) < x(21));
        assert!(x(2) < x(3) && x(3) < x(1), "row order {} {} {}", x(2), x(3), x(1));
        assert!(x(1).abs() < 1e-9);
    }
}
