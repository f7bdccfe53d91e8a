//! Connector drawing: rounded polyline plus a filled arrowhead.
//!
//! The drawing is a pure function of the routed points and a
//! [`ConnectorStyle`]. It is expressed as canvas-style [`PathCommand`]s so
//! hosts with a native `arcTo` can replay it directly; [`ConnectorDrawing`]
//! also converts it to kurbo paths.

use std::f64::consts::PI;

use gridflow_core::GridConfig;
use kurbo::{BezPath, Cap, Join, Point, Stroke, Vec2};
use peniko::Color;

/// Below this cross product two consecutive segments count as collinear.
const COLLINEAR_EPSILON: f64 = 0.01;

/// Default arrowhead length.
pub const ARROW_LENGTH: f64 = 5.0;
/// Default arrowhead width.
pub const ARROW_WIDTH: f64 = 10.0;
/// Default connector stroke width.
pub const CONNECTOR_STROKE_WIDTH: f64 = 2.0;

/// Visual settings for connectors.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorStyle {
    /// Radius of the rounded joints.
    pub corner_radius: f64,
    pub arrow_length: f64,
    pub arrow_width: f64,
    pub stroke_width: f64,
    /// Stroke color, also used to fill the arrowhead.
    pub stroke: Color,
}

impl Default for ConnectorStyle {
    fn default() -> Self {
        Self::for_grid(&GridConfig::default())
    }
}

impl ConnectorStyle {
    /// Style with joints rounded to half a grid unit.
    pub fn for_grid(grid: &GridConfig) -> Self {
        Self {
            corner_radius: grid.unit() / 2.0,
            arrow_length: ARROW_LENGTH,
            arrow_width: ARROW_WIDTH,
            stroke_width: CONNECTOR_STROKE_WIDTH,
            stroke: Color::from_rgba8(156, 163, 175, 255),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.stroke = color;
        self
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius;
        self
    }
}

/// One canvas-style path command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Tangent arc from the current point towards `corner`, ending at `to`.
    ArcTo { corner: Point, to: Point, radius: f64 },
}

/// Everything needed to draw one connector.
#[derive(Debug, Clone)]
pub struct ConnectorDrawing {
    pub commands: Vec<PathCommand>,
    /// Triangle tip first, then the two base corners.
    pub arrowhead: Option<[Point; 3]>,
    pub color: Color,
    pub stroke_width: f64,
}

impl ConnectorDrawing {
    /// Check if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Stroke settings for the connector line.
    pub fn stroke(&self) -> Stroke {
        Stroke::new(self.stroke_width)
            .with_caps(Cap::Round)
            .with_join(Join::Round)
    }

    /// The connector line as a kurbo path.
    pub fn stroke_path(&self) -> BezPath {
        commands_to_path(&self.commands)
    }

    /// The closed arrowhead triangle.
    pub fn arrowhead_path(&self) -> Option<BezPath> {
        let [tip, left, right] = self.arrowhead?;
        let mut path = BezPath::new();
        path.move_to(tip);
        path.line_to(left);
        path.line_to(right);
        path.close_path();
        Some(path)
    }
}

/// Build the drawing for a routed connector.
pub fn draw_connector(points: &[Point], style: &ConnectorStyle) -> ConnectorDrawing {
    ConnectorDrawing {
        commands: rounded_path(points, style.corner_radius),
        arrowhead: arrowhead(points, style.arrow_length, style.arrow_width),
        color: style.stroke,
        stroke_width: style.stroke_width,
    }
}

/// Path commands for a polyline with rounded joints.
///
/// Collinear joints (including zero-length segments) become plain line
/// segments. At a real turn the line stops short of the joint by the
/// effective radius, which never exceeds half of the shorter adjacent
/// segment, and an arc connects both sides.
pub fn rounded_path(points: &[Point], radius: f64) -> Vec<PathCommand> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    if points.len() < 2 {
        return Vec::new();
    }

    let mut commands = vec![PathCommand::MoveTo(first)];
    for triple in points.windows(3) {
        let (prev, curr, next) = (triple[0], triple[1], triple[2]);
        let incoming = curr - prev;
        let outgoing = next - curr;
        let cross = incoming.cross(outgoing);
        let dot = incoming.dot(outgoing);

        if cross.abs() <= COLLINEAR_EPSILON && dot >= 0.0 {
            commands.push(PathCommand::LineTo(curr));
            continue;
        }

        let back = prev - curr;
        let ahead = next - curr;
        let r = radius.min(back.hypot().min(ahead.hypot()) / 2.0).max(0.0);
        commands.push(PathCommand::LineTo(curr + unit(back) * r));
        commands.push(PathCommand::ArcTo {
            corner: curr,
            to: curr + unit(ahead) * r,
            radius: r,
        });
    }
    commands.push(PathCommand::LineTo(last));
    commands
}

/// Arrowhead triangle at the end of the polyline, pointing along the last
/// segment. `None` for a zero-length last segment or a non-positive size.
pub fn arrowhead(points: &[Point], length: f64, width: f64) -> Option<[Point; 3]> {
    if length <= 0.0 || width <= 0.0 {
        return None;
    }
    let [.., prev, end] = points else {
        return None;
    };
    let direction = *end - *prev;
    let len = direction.hypot();
    if len == 0.0 {
        return None;
    }
    let dir = direction / len;
    let perp = Vec2::new(-dir.y, dir.x);
    let base = *end - dir * length;
    Some([*end, base + perp * (width / 2.0), base - perp * (width / 2.0)])
}

/// Replay path commands into a kurbo path; arcs become single cubics.
pub fn commands_to_path(commands: &[PathCommand]) -> BezPath {
    let mut path = BezPath::new();
    let mut current = Point::ZERO;
    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                path.move_to(p);
                current = p;
            }
            PathCommand::LineTo(p) => {
                path.line_to(p);
                current = p;
            }
            PathCommand::ArcTo { corner, to, radius } => {
                append_tangent_arc(&mut path, current, corner, to, radius);
                current = to;
            }
        }
    }
    path
}

/// Cubic approximation of the arc tangent to `start → corner` at `start`
/// and to `corner → end` at `end`.
fn append_tangent_arc(path: &mut BezPath, start: Point, corner: Point, end: Point, radius: f64) {
    let to_corner = corner - start;
    let from_corner = end - corner;
    let tangent = to_corner.hypot();
    if radius <= 0.0 || tangent == 0.0 || from_corner.hypot() == 0.0 {
        path.line_to(corner);
        path.line_to(end);
        return;
    }

    // Angle between the two legs at the corner, and the arc sweep
    let legs = (start - corner).angle() - (end - corner).angle();
    let interior = legs.abs().rem_euclid(2.0 * PI);
    let interior = if interior > PI { 2.0 * PI - interior } else { interior };
    let sweep = PI - interior;

    let arc_radius = tangent * (interior / 2.0).tan();
    let handle = arc_radius * 4.0 / 3.0 * (sweep / 4.0).tan();

    path.curve_to(
        start + unit(to_corner) * handle,
        end + unit(corner - end) * handle,
        end,
    );
}

fn unit(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len == 0.0 { Vec2::ZERO } else { v / len }
}
