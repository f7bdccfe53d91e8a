//! Orthogonal connector routing between two block sides.
//!
//! The router works in an axis frame: `main` is the axis the source side
//! faces along, `cross` the other one. Horizontal (`left`/`right`) and
//! vertical (`top`/`bottom`) pairs therefore share a single implementation.
//!
//! Facing pairs (`right → left`, `left → right`, `bottom → top`,
//! `top → bottom`) produce either a single-bend step when the rectangles are
//! at least two grid units apart, or a six-point detour around both
//! rectangles otherwise. Any other pairing falls back to a single bend one
//! grid unit out of the source side.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::anchor::{Axis, Side, anchor_point};
use crate::grid::GridConfig;
use crate::spatial::Spatial;

const EPSILON: f64 = 1e-9;

/// Which branch of the router produced a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Facing sides with enough clearance: one bend.
    Step,
    /// Facing sides too close, overlapping or reversed: route around.
    Detour,
    /// Non-facing sides: one bend along the source side's normal.
    Fallback,
}

/// Cross-axis line a detour travels along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    /// Before both rectangles (above, or left of, them).
    Before,
    /// After both rectangles (below, or right of, them).
    After,
    /// Through the gap between the two rectangles.
    Between,
}

/// Rectilinear polyline from a source anchor to a target anchor. Always
/// holds at least four points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedPath {
    points: Vec<Point>,
    kind: RouteKind,
}

impl RoutedPath {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    /// The source anchor.
    pub fn start(&self) -> Point {
        self.points[0]
    }

    /// The target anchor.
    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Flat `[x0, y0, x1, y1, ...]` form consumed by 2D hosts.
    pub fn to_flat(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    /// Check that every segment is horizontal or vertical.
    ///
    /// Zero-length segments share both coordinates and are accepted.
    pub fn is_rectilinear(&self) -> bool {
        self.points
            .windows(2)
            .all(|pair| pair[0].x == pair[1].x || pair[0].y == pair[1].y)
    }

    /// Total polyline length.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

/// Route a connector between two rectangles.
///
/// The first point is always the anchor of `from_side` on `from`, the last
/// the anchor of `to_side` on `to`. Degenerate rectangles are accepted.
pub fn route(from: Rect, from_side: Side, to: Rect, to_side: Side, unit: f64) -> RoutedPath {
    let from = from.abs();
    let to = to.abs();
    let source = anchor_point(from, from_side);
    let target = anchor_point(to, to_side);

    if to_side != from_side.opposite() {
        log::debug!("route {from_side:?} -> {to_side:?}: fallback");
        return step(Frame::new(from_side), source, target, unit, RouteKind::Fallback);
    }

    let frame = Frame::new(from_side);
    let distance = frame.sign * (frame.main(target) - frame.main(source));

    if distance >= 2.0 * unit - EPSILON {
        log::debug!("route {from_side:?} -> {to_side:?}: step, clearance {distance}");
        step(frame, source, target, unit, RouteKind::Step)
    } else {
        detour(frame, from, to, source, target, unit)
    }
}

/// Route between two spatial items on the given grid.
///
/// Returns `None` when either side has no rectangle.
pub fn route_between(
    from: &impl Spatial,
    from_side: Side,
    to: &impl Spatial,
    to_side: Side,
    grid: &GridConfig,
) -> Option<RoutedPath> {
    Some(route(from.rect()?, from_side, to.rect()?, to_side, grid.unit()))
}

/// Axis frame aligned with the source side.
#[derive(Debug, Clone, Copy)]
struct Frame {
    axis: Axis,
    /// Outward direction of the source side along `axis`.
    sign: f64,
}

impl Frame {
    fn new(side: Side) -> Self {
        Self {
            axis: side.axis(),
            sign: side.sign(),
        }
    }

    fn main(self, p: Point) -> f64 {
        self.axis.of(p)
    }

    fn cross(self, p: Point) -> f64 {
        self.axis.cross().of(p)
    }

    fn point(self, main: f64, cross: f64) -> Point {
        match self.axis {
            Axis::X => Point::new(main, cross),
            Axis::Y => Point::new(cross, main),
        }
    }

    fn main_range(self, rect: Rect) -> (f64, f64) {
        match self.axis {
            Axis::X => (rect.x0, rect.x1),
            Axis::Y => (rect.y0, rect.y1),
        }
    }

    fn cross_range(self, rect: Rect) -> (f64, f64) {
        match self.axis {
            Axis::X => (rect.y0, rect.y1),
            Axis::Y => (rect.x0, rect.x1),
        }
    }
}

/// Leave the source by one unit, turn to the target's cross coordinate,
/// then run straight into the target.
fn step(frame: Frame, source: Point, target: Point, unit: f64, kind: RouteKind) -> RoutedPath {
    let bend = frame.main(source) + frame.sign * unit;
    RoutedPath {
        points: vec![
            source,
            frame.point(bend, frame.cross(source)),
            frame.point(bend, frame.cross(target)),
            target,
        ],
        kind,
    }
}

fn detour(
    frame: Frame,
    from: Rect,
    to: Rect,
    source: Point,
    target: Point,
    unit: f64,
) -> RoutedPath {
    let (lane, cross) = pick_lane(frame, from, to, source, target, unit);

    let exit = match lane {
        Lane::Between => frame.main(source) + frame.sign * unit,
        Lane::Before | Lane::After => {
            let (to_min, to_max) = frame.main_range(to);
            if frame.sign > 0.0 {
                (frame.main(source) + unit).max(to_max + unit)
            } else {
                (frame.main(source) - unit).min(to_min - unit)
            }
        }
    };
    let approach = frame.main(target) - frame.sign * unit;

    log::debug!("route detour: lane {lane:?} at {cross}, exit {exit}, approach {approach}");

    RoutedPath {
        points: vec![
            source,
            frame.point(exit, frame.cross(source)),
            frame.point(exit, cross),
            frame.point(approach, cross),
            frame.point(approach, frame.cross(target)),
            target,
        ],
        kind: RouteKind::Detour,
    }
}

/// Choose the cross-axis line for a detour.
///
/// The default lane passes before both rectangles when the target's center
/// lies before the source's center, after them otherwise. Another candidate
/// replaces it only if it is strictly cheaper, measured as the sum of the
/// cross-axis distances from both anchors to the lane.
fn pick_lane(
    frame: Frame,
    from: Rect,
    to: Rect,
    source: Point,
    target: Point,
    unit: f64,
) -> (Lane, f64) {
    let (f0, f1) = frame.cross_range(from);
    let (t0, t1) = frame.cross_range(to);

    let before = (Lane::Before, f0.min(t0) - unit);
    let after = (Lane::After, f1.max(t1) + unit);
    let between = if t0 - f1 >= 2.0 * unit {
        Some((Lane::Between, (f1 + t0) / 2.0))
    } else if f0 - t1 >= 2.0 * unit {
        Some((Lane::Between, (t1 + f0) / 2.0))
    } else {
        None
    };

    let cost = |c: f64| (frame.cross(source) - c).abs() + (frame.cross(target) - c).abs();

    let default = if frame.cross(to.center()) < frame.cross(from.center()) {
        before
    } else {
        after
    };

    [Some(before), Some(after), between]
        .into_iter()
        .flatten()
        .fold(default, |best, candidate| {
            if cost(candidate.1) < cost(best.1) - EPSILON {
                candidate
            } else {
                best
            }
        })
}
