//! Snap functionality for aligning dragged blocks to the grid and to
//! alignment guides from other blocks.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::grid;

/// Distance under which a block edge snaps onto a guide.
pub const GUIDELINE_OFFSET: f64 = 5.0;

/// Snap mode for aligning blocks to grid or other blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapMode {
    /// No snapping.
    None,
    /// Snap to grid intersections.
    #[default]
    Grid,
    /// Snap to other blocks' edges and centers.
    Guides,
    /// Guides first, grid for any axis no guide caught.
    All,
}

impl SnapMode {
    /// Cycle to the next snap mode.
    pub fn next(self) -> Self {
        match self {
            SnapMode::None => SnapMode::Grid,
            SnapMode::Grid => SnapMode::Guides,
            SnapMode::Guides => SnapMode::All,
            SnapMode::All => SnapMode::None,
        }
    }

    /// Check if grid snapping is enabled.
    pub fn snaps_to_grid(self) -> bool {
        matches!(self, SnapMode::Grid | SnapMode::All)
    }

    /// Check if guide snapping is enabled.
    pub fn snaps_to_guides(self) -> bool {
        matches!(self, SnapMode::Guides | SnapMode::All)
    }

    /// Check if any snapping is enabled.
    pub fn is_enabled(self) -> bool {
        self != SnapMode::None
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_point_to_grid(point: Point, unit: f64) -> SnapResult {
    SnapResult {
        point: grid::grid_coordinates(point, unit),
        snapped_x: true,
        snapped_y: true,
    }
}

/// Guide line orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// A vertical line at some x.
    Vertical,
    /// A horizontal line at some y.
    Horizontal,
}

/// Which edge of the dragged block lines up with a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideEdge {
    Start,
    Center,
    End,
}

/// A coordinate of the dragged block that can trigger snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnappingEdge {
    pub position: f64,
    /// Offset from this edge back to the block's origin.
    pub offset: f64,
    pub edge: GuideEdge,
}

/// An active alignment guide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    /// Coordinate of the guide line (x for vertical, y for horizontal).
    pub position: f64,
    /// Offset from the guide to the block origin once snapped.
    pub offset: f64,
    pub orientation: Orientation,
    pub edge: GuideEdge,
}

/// Coordinates a dragged block can align with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideStops {
    /// Candidate x positions.
    pub vertical: Vec<f64>,
    /// Candidate y positions.
    pub horizontal: Vec<f64>,
}

impl GuideStops {
    /// Stage borders and center, then the edges and center of every other
    /// block.
    pub fn collect(stage: Rect, others: impl IntoIterator<Item = Rect>) -> Self {
        let center = stage.center();
        let mut stops = Self {
            vertical: vec![stage.x0, center.x, stage.x1],
            horizontal: vec![stage.y0, center.y, stage.y1],
        };
        for rect in others {
            let center = rect.center();
            stops.vertical.extend([rect.x0, rect.x1, center.x]);
            stops.horizontal.extend([rect.y0, rect.y1, center.y]);
        }
        stops
    }
}

/// Start, center and end edges of `rect` on each axis.
pub fn snapping_edges(rect: Rect) -> ([SnappingEdge; 3], [SnappingEdge; 3]) {
    let edges = |start: f64, len: f64| {
        [
            SnappingEdge {
                position: start,
                offset: 0.0,
                edge: GuideEdge::Start,
            },
            SnappingEdge {
                position: start + len / 2.0,
                offset: -len / 2.0,
                edge: GuideEdge::Center,
            },
            SnappingEdge {
                position: start + len,
                offset: -len,
                edge: GuideEdge::End,
            },
        ]
    };
    (
        edges(rect.x0, rect.width()),
        edges(rect.y0, rect.height()),
    )
}

/// Closest guide per orientation whose distance to a block edge is below
/// `threshold`.
pub fn find_guides(stops: &GuideStops, rect: Rect, threshold: f64) -> Vec<Guide> {
    let (vertical_edges, horizontal_edges) = snapping_edges(rect);

    let closest = |lines: &[f64], edges: &[SnappingEdge], orientation: Orientation| {
        let mut best: Option<(Guide, f64)> = None;
        for &line in lines {
            for edge in edges {
                let diff = (line - edge.position).abs();
                if diff < threshold && best.is_none_or(|(_, min)| diff < min) {
                    let guide = Guide {
                        position: line,
                        offset: edge.offset,
                        orientation,
                        edge: edge.edge,
                    };
                    best = Some((guide, diff));
                }
            }
        }
        best.map(|(guide, _)| guide)
    };

    [
        closest(stops.vertical.as_slice(), &vertical_edges[..], Orientation::Vertical),
        closest(
            stops.horizontal.as_slice(),
            &horizontal_edges[..],
            Orientation::Horizontal,
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Move `origin` onto the given guides.
pub fn apply_guides(origin: Point, guides: &[Guide]) -> SnapResult {
    let mut result = SnapResult::none(origin);
    for guide in guides {
        match guide.orientation {
            Orientation::Vertical => {
                result.point.x = guide.position + guide.offset;
                result.snapped_x = true;
            }
            Orientation::Horizontal => {
                result.point.y = guide.position + guide.offset;
                result.snapped_y = true;
            }
        }
    }
    result
}

/// Snapped origin of a dragged block together with the guides to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSnap {
    pub result: SnapResult,
    pub guides: Vec<Guide>,
}

impl DragSnap {
    /// Translation from the unsnapped to the snapped origin.
    pub fn delta(&self, origin: Point) -> Vec2 {
        self.result.point - origin
    }
}

/// Snap the origin of a dragged block occupying `rect`.
pub fn snap_block(
    rect: Rect,
    stops: &GuideStops,
    mode: SnapMode,
    unit: f64,
    threshold: f64,
) -> DragSnap {
    let origin = rect.origin();
    let mut snap = DragSnap {
        result: SnapResult::none(origin),
        guides: Vec::new(),
    };

    if mode.snaps_to_guides() {
        snap.guides = find_guides(stops, rect, threshold);
        snap.result = apply_guides(origin, &snap.guides);
    }

    if mode.snaps_to_grid() {
        let grid = snap_point_to_grid(origin, unit);
        if !snap.result.snapped_x {
            snap.result.point.x = grid.point.x;
            snap.result.snapped_x = true;
        }
        if !snap.result.snapped_y {
            snap.result.point.y = grid.point.y;
            snap.result.snapped_y = true;
        }
    }

    snap
}
