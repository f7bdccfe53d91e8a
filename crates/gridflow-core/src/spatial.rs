//! Nearest-neighbor queries over blocks.
//!
//! All queries are linear scans over the candidate set. Candidates without a
//! rectangle (degenerate line blocks) never match. When several candidates
//! share the minimal distance the first one in iteration order wins.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::anchor::{Axis, Side};
use crate::block::Block;

/// Anything that occupies a rectangle on the canvas.
pub trait Spatial {
    fn rect(&self) -> Option<Rect>;
}

impl Spatial for Rect {
    fn rect(&self) -> Option<Rect> {
        Some(*self)
    }
}

impl Spatial for Block {
    fn rect(&self) -> Option<Rect> {
        Block::rect(self)
    }
}

impl<T: Spatial + ?Sized> Spatial for &T {
    fn rect(&self) -> Option<Rect> {
        (**self).rect()
    }
}

/// Direction along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Decreasing coordinate (left / up).
    Negative,
    /// Increasing coordinate (right / down).
    Positive,
}

/// Candidate whose center is closest to the reference's center.
pub fn nearest_by_center<'a, T: Spatial>(
    reference: &impl Spatial,
    candidates: impl IntoIterator<Item = &'a T>,
) -> Option<&'a T>
where
    T: 'a,
{
    let origin = reference.rect()?.center();
    min_by_distance(candidates, |rect| Some(origin.distance(rect.center())))
}

/// Candidate whose center is closest to the reference's center along `axis`.
///
/// With a `direction`, only candidates whose center lies strictly before
/// (`Negative`) or after (`Positive`) the reference's center qualify.
pub fn nearest_on_axis<'a, T: Spatial>(
    reference: &impl Spatial,
    candidates: impl IntoIterator<Item = &'a T>,
    axis: Axis,
    direction: Option<Direction>,
) -> Option<&'a T>
where
    T: 'a,
{
    let origin = axis.of(reference.rect()?.center());
    min_by_distance(candidates, |rect| {
        let delta = axis.of(rect.center()) - origin;
        let qualifies = match direction {
            None => true,
            Some(Direction::Negative) => delta < 0.0,
            Some(Direction::Positive) => delta > 0.0,
        };
        qualifies.then_some(delta.abs())
    })
}

/// Closest candidate lying entirely beyond the reference's `side` edge and
/// overlapping it on the other axis. Distance is the edge-to-edge gap.
pub fn nearest_in_direction<'a, T: Spatial>(
    reference: &impl Spatial,
    candidates: impl IntoIterator<Item = &'a T>,
    side: Side,
) -> Option<&'a T>
where
    T: 'a,
{
    let origin = reference.rect()?;
    min_by_distance(candidates, |rect| directional_gap(origin, rect, side))
}

/// Gap between `reference`'s `side` edge and `candidate`, if the candidate
/// lies beyond that edge and overlaps on the other axis.
pub fn directional_gap(reference: Rect, candidate: Rect, side: Side) -> Option<f64> {
    let overlaps_y = reference.y0 <= candidate.y1 && candidate.y0 <= reference.y1;
    let overlaps_x = reference.x0 <= candidate.x1 && candidate.x0 <= reference.x1;
    match side {
        Side::Right if overlaps_y && candidate.x0 >= reference.x1 => {
            Some(candidate.x0 - reference.x1)
        }
        Side::Left if overlaps_y && candidate.x1 <= reference.x0 => {
            Some(reference.x0 - candidate.x1)
        }
        Side::Bottom if overlaps_x && candidate.y0 >= reference.y1 => {
            Some(candidate.y0 - reference.y1)
        }
        Side::Top if overlaps_x && candidate.y1 <= reference.y0 => {
            Some(reference.y0 - candidate.y1)
        }
        _ => None,
    }
}

fn min_by_distance<'a, T, F>(
    candidates: impl IntoIterator<Item = &'a T>,
    distance: F,
) -> Option<&'a T>
where
    T: Spatial + 'a,
    F: Fn(Rect) -> Option<f64>,
{
    let mut best: Option<(&'a T, f64)> = None;
    for candidate in candidates {
        let Some(d) = candidate.rect().and_then(&distance) else {
            continue;
        };
        if best.is_none_or(|(_, min)| d < min) {
            best = Some((candidate, d));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Check if two rectangles touch or overlap (edges inclusive).
pub fn rects_intersect(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Check if a point lies inside a rectangle or on its boundary.
pub fn point_in_rect(point: Point, rect: Rect) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Check if a point lies strictly outside a rectangle.
pub fn point_outside_rect(point: Point, rect: Rect) -> bool {
    !point_in_rect(point, rect)
}
