//! Grid quantization and viewport grid-line generation.
//!
//! Positions and sizes of blocks are snapped to multiples of the grid unit
//! (`step + gap`). The visual grid is generated per redraw from the unscaled
//! viewport rectangle; lines outside the viewport are clipped by the host
//! through a single clip rectangle rather than culled one by one.

use kurbo::{Line, Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default visual cell size between two grid dots.
pub const STEP_SIZE: u32 = 34;
/// Default gap between two grid cells.
pub const GAP_SIZE: u32 = 6;
/// Length of the dash that renders as a grid dot.
pub const DASH_SIZE: f64 = 0.1;
/// Stroke width of a grid line (round caps turn the short dash into a dot).
pub const GRID_STROKE_WIDTH: f64 = 4.0;

/// Grid configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("Grid unit must be a positive integer (step {step} + gap {gap})")]
    InvalidUnit { step: u32, gap: u32 },
}

/// Result type for grid configuration.
pub type GridResult<T> = Result<T, GridError>;

/// Grid dimensions for one diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell size in world units.
    pub step: u32,
    /// Gap between cells in world units.
    pub gap: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            step: STEP_SIZE,
            gap: GAP_SIZE,
        }
    }
}

impl GridConfig {
    /// Create a validated grid configuration.
    pub fn new(step: u32, gap: u32) -> GridResult<Self> {
        let config = Self { step, gap };
        config.validate()?;
        Ok(config)
    }

    /// Check that the grid unit is a positive integer.
    pub fn validate(&self) -> GridResult<()> {
        match self.step.checked_add(self.gap) {
            Some(unit) if unit > 0 => Ok(()),
            _ => Err(GridError::InvalidUnit {
                step: self.step,
                gap: self.gap,
            }),
        }
    }

    /// The grid unit (`step + gap`) in world units.
    pub fn unit(&self) -> f64 {
        f64::from(self.step) + f64::from(self.gap)
    }

    /// Dash pattern for the dotted grid: one dot per unit.
    pub fn dash(&self) -> [f64; 2] {
        [DASH_SIZE, self.unit() - DASH_SIZE]
    }

    /// Dash offset that centers dots inside the gaps between cells.
    pub fn dash_offset(&self) -> f64 {
        f64::from(self.gap) + DASH_SIZE / 2.0
    }

    /// Snap a scalar to this grid.
    pub fn snap(&self, value: f64) -> f64 {
        snap_to_grid(value, self.unit())
    }

    /// Snap a point to this grid.
    pub fn snap_point(&self, point: Point) -> Point {
        grid_coordinates(point, self.unit())
    }

    /// Snap a rectangle to this grid.
    pub fn snap_rect(&self, rect: Rect) -> Rect {
        snap_rect(rect, self.unit())
    }
}

/// Round a value to the nearest multiple of `unit`.
pub fn snap_to_grid(value: f64, unit: f64) -> f64 {
    (value / unit).round() * unit
}

/// Snap both coordinates of a point independently.
pub fn grid_coordinates(point: Point, unit: f64) -> Point {
    Point::new(snap_to_grid(point.x, unit), snap_to_grid(point.y, unit))
}

/// Snap origin and size of a rectangle independently.
pub fn snap_rect(rect: Rect, unit: f64) -> Rect {
    let origin = grid_coordinates(rect.origin(), unit);
    Rect::from_origin_size(
        origin,
        (
            snap_to_grid(rect.width(), unit),
            snap_to_grid(rect.height(), unit),
        ),
    )
}

/// Density reduction factor for grid lines at small zoom scales.
pub fn zoom_step(scale: f64) -> u32 {
    if scale < 0.2 {
        4
    } else if scale < 0.4 {
        2
    } else {
        1
    }
}

/// One grid line, positioned at `origin` with a flat `[x0, y0, x1, y1]`
/// extent relative to that origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub origin: Point,
    pub points: [f64; 4],
}

impl GridLine {
    /// The line in world coordinates.
    pub fn line(&self) -> Line {
        let [x0, y0, x1, y1] = self.points;
        Line::new(
            (self.origin.x + x0, self.origin.y + y0),
            (self.origin.x + x1, self.origin.y + y1),
        )
    }
}

/// Grid lines covering one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLines {
    /// Clip region for this redraw (the viewport itself).
    pub clip: Rect,
    /// Zoom step the lines were generated with.
    pub zoom_step: u32,
    /// Distance between two consecutive lines.
    pub spacing: f64,
    pub vertical: Vec<GridLine>,
    pub horizontal: Vec<GridLine>,
}

impl GridLines {
    /// Check if no line was generated.
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }
}

/// Generate the grid lines needed to cover `viewport` (unscaled world
/// coordinates) at the given zoom `scale`.
///
/// The covered area starts on a grid-aligned coordinate at or before the
/// viewport's top-left corner and extends one spacing past its bottom-right
/// corner so panning never shows a seam.
pub fn grid_lines(viewport: Rect, scale: f64, grid: &GridConfig) -> GridLines {
    let viewport = viewport.abs();
    let step = zoom_step(scale);
    let spacing = grid.unit() * f64::from(step);

    let mut lines = GridLines {
        clip: viewport,
        zoom_step: step,
        spacing,
        vertical: Vec::new(),
        horizontal: Vec::new(),
    };

    if spacing <= 0.0 || viewport.width() <= 0.0 || viewport.height() <= 0.0 {
        return lines;
    }

    let x0 = (viewport.x0 / spacing).floor() * spacing;
    let y0 = (viewport.y0 / spacing).floor() * spacing;
    let width = viewport.x1 + spacing - x0;
    let height = viewport.y1 + spacing - y0;

    let x_count = (width / spacing).round() as usize;
    let y_count = (height / spacing).round() as usize;

    lines.vertical = (0..=x_count)
        .map(|i| GridLine {
            origin: Point::new(x0 + i as f64 * spacing, y0),
            points: [0.0, 0.0, 0.0, height],
        })
        .collect();
    lines.horizontal = (0..=y_count)
        .map(|i| GridLine {
            origin: Point::new(x0, y0 + i as f64 * spacing),
            points: [0.0, 0.0, width, 0.0],
        })
        .collect();

    log::trace!(
        "grid: {} vertical / {} horizontal lines, spacing {}",
        lines.vertical.len(),
        lines.horizontal.len(),
        spacing
    );

    lines
}
