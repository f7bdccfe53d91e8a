//! Block sides and the attachment points connectors use on them.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Default distance between an anchor and its on-screen handle.
pub const ANCHOR_PADDING: f64 = 20.0;

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// The other axis.
    pub fn cross(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Component of a point along this axis.
    pub fn of(self, point: Point) -> f64 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }
}

/// One side of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// All sides, in handle drawing order.
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// The side facing this one.
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }

    /// Axis a connector travels along when leaving this side.
    pub fn axis(self) -> Axis {
        match self {
            Side::Left | Side::Right => Axis::X,
            Side::Top | Side::Bottom => Axis::Y,
        }
    }

    /// Whether the side is `left` or `right`.
    pub fn is_horizontal(self) -> bool {
        self.axis() == Axis::X
    }

    /// Sign of the outward direction along [`Side::axis`].
    pub fn sign(self) -> f64 {
        match self {
            Side::Left | Side::Top => -1.0,
            Side::Right | Side::Bottom => 1.0,
        }
    }

    /// Unit outward normal.
    pub fn normal(self) -> Vec2 {
        match self {
            Side::Left => Vec2::new(-1.0, 0.0),
            Side::Right => Vec2::new(1.0, 0.0),
            Side::Top => Vec2::new(0.0, -1.0),
            Side::Bottom => Vec2::new(0.0, 1.0),
        }
    }
}

/// Midpoint of the given side of `rect`.
pub fn anchor_point(rect: Rect, side: Side) -> Point {
    let center = rect.center();
    match side {
        Side::Left => Point::new(rect.x0, center.y),
        Side::Right => Point::new(rect.x1, center.y),
        Side::Top => Point::new(center.x, rect.y0),
        Side::Bottom => Point::new(center.x, rect.y1),
    }
}

/// Anchor point pushed outward by `padding`, where the handle is drawn.
pub fn handle_position(rect: Rect, side: Side, padding: f64) -> Point {
    anchor_point(rect, side) + side.normal() * padding
}

/// A connection handle shown around a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorHandle {
    pub side: Side,
    /// Attachment point on the block boundary.
    pub anchor: Point,
    /// Where the handle is drawn.
    pub position: Point,
}

impl AnchorHandle {
    /// Handle hit radius in world units.
    pub const RADIUS: f64 = 8.0;

    /// Check if a point is within the handle's hit area.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.position.distance(point) <= Self::RADIUS + tolerance
    }
}

/// Handles for all four sides of `rect`.
pub fn anchor_handles(rect: Rect, padding: f64) -> [AnchorHandle; 4] {
    Side::ALL.map(|side| AnchorHandle {
        side,
        anchor: anchor_point(rect, side),
        position: handle_position(rect, side, padding),
    })
}

/// Find the handle under `point`, if any.
pub fn hit_test_handles(rect: Rect, padding: f64, point: Point, tolerance: f64) -> Option<Side> {
    anchor_handles(rect, padding)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.side)
}
