//! Rendered tree layout handed to the drawing surface.

use serde::{Deserialize, Serialize};

use super::{PersonId, Sex};

/// Which parent continues a lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Father,
    Mother,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Father => "father",
            Side::Mother => "mother",
        }
    }
}

/// A point in abstract drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned polyline.
pub type Path = Vec<Point>;

/// A visible person with its computed box.
///
/// `x` is the horizontal centre of the box, `y` its top edge.
#[derive(Debug, Clone, Serialize)]
pub struct PositionedNode {
    pub id: PersonId,
    pub name: String,
    pub sex: Sex,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death: Option<String>,
    pub rank: i32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub focus: bool,
    pub selected: bool,
    pub trunk: bool,
    pub expanded: bool,
    pub expandable: bool,
    /// Side recorded when this node is clicked as a lineage switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

/// Orthogonal connector paths for one union.
#[derive(Debug, Clone, Serialize)]
pub struct UnionConnector {
    pub father: Option<PersonId>,
    pub mother: Option<PersonId>,
    /// Parent drops to the marriage level plus the marriage line.
    pub marriage: Vec<Path>,
    /// Stem, bus and per-child drops; empty when no child is shown.
    pub descent: Vec<Path>,
    /// Children reached by the descent paths.
    pub children: Vec<PersonId>,
}

/// Bounding box of all node boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Complete output of one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct TreeLayout {
    pub focus: PersonId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<PersonId>,
    pub nodes: Vec<PositionedNode>,
    pub connectors: Vec<UnionConnector>,
    pub bounds: Bounds,
    /// Whether the surface should re-fit its viewport to `bounds`.
    pub refit: bool,
}

impl TreeLayout {
    /// Placeholder published before the first render.
    pub fn empty(focus: PersonId) -> Self {
        Self {
            focus,
            selection: None,
            nodes: Vec::new(),
            connectors: Vec::new(),
            bounds: Bounds::default(),
            refit: true,
        }
    }

    pub fn node(&self, id: PersonId) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
