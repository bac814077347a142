//! Orthogonal marriage and descent connectors.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::LayoutConfig;
use crate::models::{Path, PersonId, Point, UnionConnector};

use super::index::{FamilyIndex, Union};
use super::packing::Position;

/// Builds one connector per union that has a drawn, expanded parent.
pub fn build_connectors(
    index: &FamilyIndex,
    visible: &BTreeSet<PersonId>,
    expanded: &BTreeSet<PersonId>,
    ranks: &BTreeMap<PersonId, i32>,
    positions: &BTreeMap<PersonId, Position>,
    style: &LayoutConfig,
) -> Vec<UnionConnector> {
    let shown = |id: &PersonId| {
        visible.contains(id) && !index.is_hidden(*id) && positions.contains_key(id)
    };

    index
        .unions()
        .filter_map(|union| {
            let parents: Vec<PersonId> = union.parents().filter(|p| shown(p)).collect();
            if parents.is_empty() || !parents.iter().any(|p| expanded.contains(p)) {
                return None;
            }
            Some(route_union(index, union, &parents, &shown, ranks, positions, style))
        })
        .collect()
}

fn route_union(
    index: &FamilyIndex,
    union: &Union,
    parents: &[PersonId],
    shown: &impl Fn(&PersonId) -> bool,
    ranks: &BTreeMap<PersonId, i32>,
    positions: &BTreeMap<PersonId, Position>,
    style: &LayoutConfig,
) -> UnionConnector {
    let anchors: Vec<Position> = parents.iter().map(|p| positions[p]).collect();
    let marriage_y = anchors
        .iter()
        .map(|a| a.y + style.node_height)
        .fold(f64::MIN, f64::max)
        + style.marriage_drop;

    let mut marriage: Vec<Path> = anchors
        .iter()
        .map(|a| {
            let mut path = Vec::new();
            push_point(&mut path, Point::new(a.x, a.y + style.node_height));
            push_point(&mut path, Point::new(a.x, marriage_y));
            path
        })
        .collect();
    if let [a, b] = anchors.as_slice() {
        marriage.push(vec![
            Point::new(a.x.min(b.x), marriage_y),
            Point::new(a.x.max(b.x), marriage_y),
        ]);
    }
    let stem_x = anchors.iter().map(|a| a.x).sum::<f64>() / anchors.len() as f64;

    let parent_rank = ranks.get(&parents[0]).copied().unwrap_or(0);
    let drawn: Vec<PersonId> = union
        .children
        .iter()
        .copied()
        .filter(|c| shown(c) && index.child_union(*c) == Some(union.key))
        .collect();
    let next_row: Vec<PersonId> = drawn
        .iter()
        .copied()
        .filter(|c| ranks.get(c) == Some(&(parent_rank + 1)))
        .collect();
    let children = if next_row.is_empty() { drawn } else { next_row };

    let descent = descent_paths(stem_x, marriage_y, &children, positions, style);

    UnionConnector {
        father: union.father,
        mother: union.mother,
        marriage,
        descent,
        children,
    }
}

fn descent_paths(
    stem_x: f64,
    from_y: f64,
    children: &[PersonId],
    positions: &BTreeMap<PersonId, Position>,
    style: &LayoutConfig,
) -> Vec<Path> {
    let tops: Vec<Point> = children
        .iter()
        .map(|c| {
            let p = positions[c];
            Point::new(p.x, p.y)
        })
        .collect();
    let Some(min_top) = tops.iter().map(|t| t.y).reduce(f64::min) else {
        return Vec::new();
    };
    let bus_y = min_top - style.bus_rise;

    if let [only] = tops.as_slice() {
        let mut elbow = Vec::new();
        push_point(&mut elbow, Point::new(stem_x, from_y));
        push_point(&mut elbow, Point::new(stem_x, bus_y));
        push_point(&mut elbow, Point::new(only.x, bus_y));
        push_point(&mut elbow, Point::new(only.x, only.y));
        return vec![elbow];
    }

    let left = tops.iter().map(|t| t.x).fold(stem_x, f64::min);
    let right = tops.iter().map(|t| t.x).fold(stem_x, f64::max);
    let mut paths = vec![
        vec![Point::new(stem_x, from_y), Point::new(stem_x, bus_y)],
        vec![Point::new(left, bus_y), Point::new(right, bus_y)],
    ];
    for top in tops {
        paths.push(vec![Point::new(top.x, bus_y), top]);
    }
    paths
}

/// Appends `point` unless it repeats the previous one, and drops the
/// middle of collinear runs.
fn push_point(points: &mut Vec<Point>, point: Point) {
    const EPS: f64 = 0.01;
    let same = |a: &Point, b: &Point| (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS;
    if points.last().is_some_and(|last| same(last, &point)) {
        return;
    }
    if let [.., a, b] = points.as_slice() {
        let vertical = (a.x - b.x).abs() < EPS && (b.x - point.x).abs() < EPS;
        let horizontal = (a.y - b.y).abs() < EPS && (b.y - point.y).abs() < EPS;
        if vertical || horizontal {
            points.pop();
        }
    }
    points.push(point);
}
