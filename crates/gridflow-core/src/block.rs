//! Blocks placed on the canvas and the connections between them.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anchor::Side;

/// Unique identifier for blocks.
pub type BlockId = Uuid;

/// What a block draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Rectangle,
    Text { text: String },
    /// Freeform line through world-space control points.
    Line { points: Vec<Point> },
}

/// A directed link from one block's side to another block's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from: BlockId,
    pub to: BlockId,
    pub from_side: Side,
    pub to_side: Side,
}

/// A positioned, sized shape on the diagram surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) id: BlockId,
    /// Top-left corner.
    pub origin: Point,
    pub size: Size,
    pub kind: BlockKind,
    /// Outgoing connections (this block is the source).
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Block {
    /// Create a new block with a fresh id.
    pub fn new(origin: Point, size: Size, kind: BlockKind) -> Self {
        Self::reconstruct(Uuid::new_v4(), origin, size, kind)
    }

    /// Reconstruct a block with a known id.
    pub(crate) fn reconstruct(id: BlockId, origin: Point, size: Size, kind: BlockKind) -> Self {
        Self {
            id,
            origin,
            size,
            kind,
            connections: Vec::new(),
        }
    }

    /// Create a rectangle block.
    pub fn rectangle(rect: Rect) -> Self {
        Self::new(rect.origin(), rect.size(), BlockKind::Rectangle)
    }

    /// Create a text block.
    pub fn text(origin: Point, size: Size, text: impl Into<String>) -> Self {
        Self::new(origin, size, BlockKind::Text { text: text.into() })
    }

    /// Create a line block; its frame is the bounding box of the points.
    pub fn line(points: Vec<Point>) -> Self {
        let frame = bounding_box(&points).unwrap_or_default();
        Self::new(frame.origin(), frame.size(), BlockKind::Line { points })
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// World-space rectangle used for spatial queries and routing.
    ///
    /// Line blocks use the bounding box of their points and have no
    /// rectangle with fewer than two points.
    pub fn rect(&self) -> Option<Rect> {
        match &self.kind {
            BlockKind::Line { points } if points.len() < 2 => None,
            BlockKind::Line { points } => bounding_box(points),
            _ => Some(Rect::from_origin_size(self.origin, self.size)),
        }
    }

    /// Center of [`Block::rect`].
    pub fn center(&self) -> Option<Point> {
        self.rect().map(|r| r.center())
    }

    /// Move the block so its rectangle starts at `origin`.
    pub fn translate_to(&mut self, origin: Point) {
        let current = self.rect().map(|r| r.origin()).unwrap_or(self.origin);
        self.translate(origin - current);
    }

    /// Move the block by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        self.origin += delta;
        if let BlockKind::Line { points } = &mut self.kind {
            for point in points.iter_mut() {
                *point += delta;
            }
        }
    }

    /// Outgoing connection to `to`, if any.
    pub fn connection_to(&self, to: BlockId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.to == to)
    }
}

/// Smallest rectangle containing all points.
pub fn bounding_box(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |rect, p| rect.union_pt(*p)),
    )
}
