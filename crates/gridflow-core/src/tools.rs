//! Tool system: the active tool and the pointer interaction state machine.
//!
//! Handlers take world-space pointer positions plus an explicit
//! [`InputContext`] and report what should change as
//! [`InteractionOutcome`] values. They never mutate the block store; the
//! host applies the outcomes.

use std::mem;

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::anchor::{self, Side};
use crate::block::{Block, BlockId, Connection};
use crate::config::DiagramConfig;
use crate::snap::{self, Guide, GuideStops, SnapMode};
use crate::store::{BlockStore, RoutedConnector};

/// Placeholder content of a freshly placed text block.
pub const DEFAULT_TEXT: &str = "Text";

/// Extra hit distance around connection handles.
pub const HANDLE_HIT_TOLERANCE: f64 = 2.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pointer,
    Hand,
    Rectangle,
    Text,
    Line,
}

/// Toolbar state passed into every pointer handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolState {
    pub tool: ToolKind,
    pub snap_mode: SnapMode,
    /// Ctrl/meta held: pressing on empty space always starts a box selection.
    #[serde(skip)]
    pub modifier: bool,
}

impl ToolState {
    pub fn new(tool: ToolKind) -> Self {
        Self {
            tool,
            ..Self::default()
        }
    }
}

/// Pointer position in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub world: Point,
    pub screen: Point,
}

impl Pointer {
    pub fn new(world: Point, screen: Point) -> Self {
        Self { world, screen }
    }
}

/// Everything a pointer handler reads.
#[derive(Debug, Clone, Copy)]
pub struct InputContext<'a> {
    pub tools: &'a ToolState,
    pub store: &'a BlockStore,
    pub config: &'a DiagramConfig,
    /// The single selected block; only it shows connection handles.
    pub selected: Option<BlockId>,
    /// Visible world rectangle; its borders and center are guide stops.
    pub viewport: Rect,
}

/// Change requested by an interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    /// Add a new block to the store.
    CreateBlock(Block),
    /// Move a block so its rectangle starts at `origin`.
    MoveBlock {
        id: BlockId,
        origin: Point,
        /// Alignment guides to show while dragging.
        guides: Vec<Guide>,
    },
    /// Replace the selection.
    Select(Vec<BlockId>),
    /// Pan the camera by a screen-space delta.
    Pan(Vec2),
    /// Show the connector a hovered handle would create; `None` clears it.
    PreviewConnector(Option<RoutedConnector>),
    /// Store a new connection.
    Connect(Connection),
}

/// State of a pointer interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interaction {
    /// Waiting for input.
    #[default]
    Idle,
    /// Pointer resting on a connection handle of the selected block.
    Hovering { id: BlockId, side: Side },
    /// Rubber-band selection.
    Selecting { start: Point, current: Point },
    /// Dragging a block; `grab` is the pointer offset from the block origin.
    Dragging { id: BlockId, grab: Vec2, size: Size },
    /// Drawing a rectangle between two corners.
    DrawingRect { start: Point, current: Point },
    /// Drawing a line through four control points.
    DrawingLine { points: [Point; 4] },
    /// Panning the camera with the hand tool.
    Panning { last: Point },
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an interaction is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, Interaction::Idle | Interaction::Hovering { .. })
    }

    /// Handle under the pointer, if any.
    pub fn hovered_handle(&self) -> Option<(BlockId, Side)> {
        match *self {
            Interaction::Hovering { id, side } => Some((id, side)),
            _ => None,
        }
    }

    /// Abort the current interaction.
    pub fn cancel(&mut self) {
        *self = Interaction::Idle;
    }

    /// Current rubber-band rectangle.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self {
            Interaction::Selecting { start, current } => Some(Rect::from_points(*start, *current)),
            _ => None,
        }
    }

    /// Current rectangle being drawn.
    pub fn drawn_rect(&self) -> Option<Rect> {
        match self {
            Interaction::DrawingRect { start, current } => {
                Some(Rect::from_points(*start, *current))
            }
            _ => None,
        }
    }

    /// Control points of the line being drawn.
    pub fn line_preview(&self) -> Option<&[Point; 4]> {
        match self {
            Interaction::DrawingLine { points } => Some(points),
            _ => None,
        }
    }

    /// Handle a pointer press.
    pub fn pointer_down(
        &mut self,
        ctx: &InputContext<'_>,
        pointer: Pointer,
    ) -> Option<InteractionOutcome> {
        let tools = ctx.tools;
        let grid = &ctx.config.grid;
        let world = pointer.world;
        *self = Interaction::Idle;

        if tools.tool == ToolKind::Hand {
            *self = Interaction::Panning {
                last: pointer.screen,
            };
            return None;
        }

        if tools.tool == ToolKind::Pointer {
            if let Some((id, side)) = handle_under(ctx, world) {
                return handle_connector(ctx, id, side)
                    .map(|connector| InteractionOutcome::Connect(connector.connection));
            }
        }

        if let Some(block) = ctx.store.block_at(world) {
            if tools.tool != ToolKind::Pointer {
                return None;
            }
            let rect = block.rect()?;
            *self = Interaction::Dragging {
                id: block.id(),
                grab: world - rect.origin(),
                size: rect.size(),
            };
            return Some(InteractionOutcome::Select(vec![block.id()]));
        }

        if tools.modifier || tools.tool == ToolKind::Pointer {
            *self = Interaction::Selecting {
                start: world,
                current: world,
            };
            return Some(InteractionOutcome::Select(Vec::new()));
        }

        match tools.tool {
            ToolKind::Rectangle => {
                let start = grid.snap_point(world);
                *self = Interaction::DrawingRect {
                    start,
                    current: start,
                };
                None
            }
            ToolKind::Line => {
                *self = Interaction::DrawingLine { points: [world; 4] };
                None
            }
            ToolKind::Text => {
                let block = Block::text(
                    grid.snap_point(world),
                    ctx.config.default_block_size,
                    DEFAULT_TEXT,
                );
                log::debug!("placing text block {}", block.id());
                Some(InteractionOutcome::CreateBlock(block))
            }
            ToolKind::Pointer | ToolKind::Hand => None,
        }
    }

    /// Handle pointer motion.
    pub fn pointer_move(
        &mut self,
        ctx: &InputContext<'_>,
        pointer: Pointer,
    ) -> Option<InteractionOutcome> {
        let snap_mode = ctx.tools.snap_mode;
        match self {
            Interaction::Idle | Interaction::Hovering { .. } => self.hover(ctx, pointer.world),
            Interaction::Selecting { current, .. } => {
                *current = pointer.world;
                None
            }
            Interaction::Dragging { id, grab, size } => {
                let origin = pointer.world - *grab;
                let drag = drag_snap(ctx, *id, Rect::from_origin_size(origin, *size));
                Some(InteractionOutcome::MoveBlock {
                    id: *id,
                    origin: drag.result.point,
                    guides: drag.guides,
                })
            }
            Interaction::DrawingRect { current, .. } => {
                *current = corner(ctx, snap_mode, pointer.world);
                None
            }
            Interaction::DrawingLine { points } => {
                spread_line(points, pointer.world);
                None
            }
            Interaction::Panning { last } => {
                let delta = pointer.screen - *last;
                *last = pointer.screen;
                Some(InteractionOutcome::Pan(delta))
            }
        }
    }

    /// Handle a pointer release, finishing the interaction.
    pub fn pointer_up(
        &mut self,
        ctx: &InputContext<'_>,
        pointer: Pointer,
    ) -> Option<InteractionOutcome> {
        let snap_mode = ctx.tools.snap_mode;
        match mem::take(self) {
            Interaction::Idle | Interaction::Hovering { .. } | Interaction::Panning { .. } => None,
            Interaction::Selecting { start, .. } => {
                let selection = Rect::from_points(start, pointer.world);
                Some(InteractionOutcome::Select(ctx.store.blocks_in_rect(selection)))
            }
            Interaction::Dragging { id, grab, size } => {
                let origin = pointer.world - grab;
                let drag = drag_snap(ctx, id, Rect::from_origin_size(origin, size));
                Some(InteractionOutcome::MoveBlock {
                    id,
                    origin: drag.result.point,
                    guides: Vec::new(),
                })
            }
            Interaction::DrawingRect { start, .. } => {
                let rect = Rect::from_points(start, corner(ctx, snap_mode, pointer.world));
                if rect.area() > 0.0 {
                    Some(InteractionOutcome::CreateBlock(Block::rectangle(rect)))
                } else {
                    log::trace!("discarding empty rectangle at {start:?}");
                    None
                }
            }
            Interaction::DrawingLine { mut points } => {
                spread_line(&mut points, pointer.world);
                if points[0] == points[3] {
                    return None;
                }
                Some(InteractionOutcome::CreateBlock(Block::line(points.to_vec())))
            }
        }
    }

    /// Track the handle under a resting pointer and report preview changes.
    fn hover(&mut self, ctx: &InputContext<'_>, point: Point) -> Option<InteractionOutcome> {
        let hit = if ctx.tools.tool == ToolKind::Pointer {
            handle_under(ctx, point)
        } else {
            None
        };
        if hit == self.hovered_handle() {
            return None;
        }
        *self = match hit {
            Some((id, side)) => Interaction::Hovering { id, side },
            None => Interaction::Idle,
        };
        let preview = hit.and_then(|(id, side)| handle_connector(ctx, id, side));
        Some(InteractionOutcome::PreviewConnector(preview))
    }
}

/// Connection handle of the selected block under `point`.
fn handle_under(ctx: &InputContext<'_>, point: Point) -> Option<(BlockId, Side)> {
    let id = ctx.selected?;
    let rect = ctx.store.rect(id)?;
    let side = anchor::hit_test_handles(
        rect,
        ctx.config.anchor_padding,
        point,
        HANDLE_HIT_TOLERANCE,
    )?;
    Some((id, side))
}

/// Connector from a handle to the nearest block in its direction, entering
/// that block from the opposite side.
fn handle_connector(ctx: &InputContext<'_>, id: BlockId, side: Side) -> Option<RoutedConnector> {
    let target = ctx.store.nearest_in_direction(id, side)?;
    let connection = Connection {
        from: id,
        to: target.id(),
        from_side: side,
        to_side: side.opposite(),
    };
    let path = ctx.store.route(&connection, &ctx.config.grid)?;
    Some(RoutedConnector { connection, path })
}

/// Snap a dragged block against the grid and the other blocks.
fn drag_snap(ctx: &InputContext<'_>, id: BlockId, rect: Rect) -> snap::DragSnap {
    let others = ctx
        .store
        .iter()
        .filter(|b| b.id() != id)
        .filter_map(Block::rect);
    let stops = GuideStops::collect(ctx.viewport, others);
    snap::snap_block(
        rect,
        &stops,
        ctx.tools.snap_mode,
        ctx.config.unit(),
        ctx.config.guideline_offset,
    )
}

fn corner(ctx: &InputContext<'_>, mode: SnapMode, point: Point) -> Point {
    if mode.snaps_to_grid() {
        ctx.config.grid.snap_point(point)
    } else {
        point
    }
}

/// Spread the control points evenly from the first point to `end`.
fn spread_line(points: &mut [Point; 4], end: Point) {
    let start = points[0];
    let delta = end - start;
    points[1] = start + delta / 3.0;
    points[2] = start + delta * 2.0 / 3.0;
    points[3] = end;
}
