//! Family tree state and the render pipeline.
//!
//! A render runs four stages over the [`FamilyIndex`]: the visible
//! subgraph around the focus, generation ranks, row packing and connector
//! routing. [`TreeState`] holds the interaction state that feeds them.

mod connectors;
mod index;
mod interaction;
mod packing;
mod rank;
mod visible;

use std::collections::{BTreeMap, BTreeSet, HashMap};

pub use connectors::build_connectors;
pub use index::{FamilyIndex, MergeStats, Parents, Union, UnionKey};
pub use interaction::{
    profile_url, rewrite_focus_path, ClickEffect, Drawer, FetchRequest, CLICK_FETCH_GENERATIONS,
};
pub use packing::{pack_rows, Cluster, PackedRows, Position};
pub use rank::assign_ranks;
pub use visible::{compute_visible, count_ancestors, LineageSwitch, VisibleGraph};

use crate::config::LayoutConfig;
use crate::error::AppError;
use crate::models::{Bounds, Dataset, InitialData, PersonId, PositionedNode, Side, TreeLayout};

/// Mutable session state of one tree view.
#[derive(Debug, Clone)]
pub struct TreeState {
    index: FamilyIndex,
    focus: PersonId,
    selection: Option<PersonId>,
    depth: usize,
    expanded: BTreeSet<PersonId>,
    lineage: HashMap<PersonId, Side>,
    auto_expand: bool,
    /// Switch targets of the most recent visible computation.
    switches: BTreeMap<PersonId, LineageSwitch>,
    lazy_expand: bool,
    profile_base: String,
    drawer: Drawer,
}

impl TreeState {
    pub fn new(index: FamilyIndex, focus: PersonId, depth: usize) -> Self {
        Self {
            index,
            focus,
            selection: None,
            depth: depth.max(1),
            expanded: BTreeSet::new(),
            lineage: HashMap::new(),
            auto_expand: true,
            switches: BTreeMap::new(),
            lazy_expand: true,
            profile_base: String::new(),
            drawer: Drawer {
                enabled: true,
                ..Drawer::default()
            },
        }
    }

    /// Builds the state from a host payload. `focus` overrides its root id.
    pub fn from_initial(
        data: &InitialData,
        focus: Option<PersonId>,
        depth: usize,
    ) -> Result<Self, AppError> {
        let mut index = FamilyIndex::new();
        index.merge_dataset(&data.dataset);
        let focus = focus.or_else(|| data.root()).ok_or(AppError::MissingFocus)?;
        if index.person(focus).is_none() {
            return Err(AppError::UnknownPerson(focus));
        }
        let mut state = Self::new(index, focus, depth);
        state.lazy_expand = !data.disable_expand;
        state.profile_base = data.profile_base.clone();
        Ok(state)
    }

    pub fn index(&self) -> &FamilyIndex {
        &self.index
    }

    pub fn focus(&self) -> PersonId {
        self.focus
    }

    pub fn selection(&self) -> Option<PersonId> {
        self.selection
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth.max(1);
    }

    pub fn expanded(&self) -> &BTreeSet<PersonId> {
        &self.expanded
    }

    pub fn lineage(&self, child: PersonId) -> Option<Side> {
        self.lineage.get(&child).copied()
    }

    pub fn drawer(&self) -> Drawer {
        self.drawer
    }

    pub fn lazy_expand(&self) -> bool {
        self.lazy_expand
    }

    pub fn set_lazy_expand(&mut self, enabled: bool) {
        self.lazy_expand = enabled;
    }

    pub fn profile_base(&self) -> &str {
        &self.profile_base
    }

    pub fn set_profile_base(&mut self, base: impl Into<String>) {
        self.profile_base = base.into();
    }

    /// Moves the focus and resets per-focus state.
    pub fn set_focus(&mut self, id: PersonId) -> Result<(), AppError> {
        if self.index.person(id).is_none() {
            return Err(AppError::UnknownPerson(id));
        }
        self.refocus(id);
        Ok(())
    }

    pub(crate) fn refocus(&mut self, id: PersonId) {
        tracing::debug!(from = %self.focus, to = %id, "Refocus");
        self.focus = id;
        self.expanded.clear();
        self.lineage.clear();
        self.switches.clear();
        self.auto_expand = true;
    }

    pub fn merge(&mut self, dataset: &Dataset) -> MergeStats {
        self.index.merge_dataset(dataset)
    }

    pub fn mark_parentless(&mut self, id: PersonId) {
        self.index.mark_parentless(id);
    }

    /// Recomputes the visible subgraph and remembers its switch targets.
    pub fn compute_visible(&mut self) -> VisibleGraph {
        let graph = compute_visible(
            &self.index,
            self.focus,
            self.depth,
            &self.lineage,
            &mut self.expanded,
            &mut self.auto_expand,
        );
        self.switches = graph.switches.clone();
        graph
    }

    /// Runs the whole pipeline and returns a drawable layout.
    pub fn render(&mut self, style: &LayoutConfig, refit: bool) -> TreeLayout {
        let graph = self.compute_visible();
        let ranks = assign_ranks(&self.index, &graph.visible, self.focus);
        let packed = pack_rows(&self.index, &ranks, self.focus, style);
        let connectors = build_connectors(
            &self.index,
            &graph.visible,
            &self.expanded,
            &ranks,
            &packed.positions,
            style,
        );

        let nodes: Vec<PositionedNode> = graph
            .visible
            .iter()
            .filter_map(|&id| {
                let person = self.index.person(id)?;
                let position = packed.positions.get(&id)?;
                Some(PositionedNode {
                    id,
                    name: person.name.clone(),
                    sex: person.sex,
                    birth: person.birth.clone(),
                    death: person.death.clone(),
                    rank: ranks.get(&id).copied().unwrap_or(0),
                    x: position.x,
                    y: position.y,
                    width: style.node_width,
                    height: style.node_height,
                    focus: id == self.focus,
                    selected: self.selection == Some(id),
                    trunk: graph.is_trunk(id),
                    expanded: self.expanded.contains(&id),
                    expandable: self.is_expandable(id),
                    switch: graph.switches.get(&id).map(|s| s.side),
                    profile_url: profile_url(&self.profile_base, id),
                })
            })
            .collect();

        let bounds = bounds_of(&nodes);
        tracing::debug!(
            focus = %self.focus,
            nodes = nodes.len(),
            connectors = connectors.len(),
            "Rendered tree"
        );

        TreeLayout {
            focus: self.focus,
            selection: self.selection,
            nodes,
            connectors,
            bounds,
            refit,
        }
    }
}

fn bounds_of(nodes: &[PositionedNode]) -> Bounds {
    let mut iter = nodes.iter();
    let Some(first) = iter.next() else {
        return Bounds::default();
    };
    let edges = |n: &PositionedNode| {
        (
            n.x - n.width / 2.0,
            n.y,
            n.x + n.width / 2.0,
            n.y + n.height,
        )
    };
    let (min_x, min_y, max_x, max_y) = edges(first);
    let mut bounds = Bounds {
        min_x,
        min_y,
        max_x,
        max_y,
    };
    for node in iter {
        let (min_x, min_y, max_x, max_y) = edges(node);
        bounds.min_x = bounds.min_x.min(min_x);
        bounds.min_y = bounds.min_y.min(min_y);
        bounds.max_x = bounds.max_x.max(max_x);
        bounds.max_y = bounds.max_y.max(max_y);
    }
    bounds
}
