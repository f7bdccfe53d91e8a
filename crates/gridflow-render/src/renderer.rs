//! Renderer trait abstraction and a command-recording implementation.

use gridflow_core::anchor::{ANCHOR_PADDING, AnchorHandle, anchor_handles};
use gridflow_core::grid::{self, GRID_STROKE_WIDTH, GridConfig, GridLines};
use gridflow_core::{BlockId, BlockStore, Camera};
use kurbo::{Affine, BezPath, Cap, Circle, Join, Rect, Shape, Size, Stroke};
use peniko::Color;

use crate::connector::{ConnectorStyle, draw_connector};

/// Stroke width of solid grid lines.
const GRID_LINE_WIDTH: f64 = 0.5;

/// Drawn radius of a connection handle.
const HANDLE_RADIUS: f64 = 5.0;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// No grid.
    None,
    /// One dot per grid intersection.
    #[default]
    Dots,
    /// Full grid lines.
    Lines,
}

impl GridStyle {
    /// Cycle to the next grid style.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Dots,
            GridStyle::Dots => GridStyle::Lines,
            GridStyle::Lines => GridStyle::None,
        }
    }

    /// Get display name for this grid style.
    pub fn name(self) -> &'static str {
        match self {
            GridStyle::None => "None",
            GridStyle::Dots => "Dots",
            GridStyle::Lines => "Lines",
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// Blocks and connections to draw.
    pub store: &'a BlockStore,
    /// Stage transform.
    pub camera: &'a Camera,
    /// Container size in screen pixels.
    pub container: Size,
    pub grid: GridConfig,
    pub grid_style: GridStyle,
    pub grid_color: Color,
    pub connector_style: ConnectorStyle,
    /// Block whose connection handles are shown.
    pub selected: Option<BlockId>,
    pub anchor_padding: f64,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(store: &'a BlockStore, camera: &'a Camera, container: Size) -> Self {
        let grid = GridConfig::default();
        Self {
            store,
            camera,
            container,
            grid,
            grid_style: GridStyle::default(),
            grid_color: Color::from_rgba8(209, 213, 219, 255),
            connector_style: ConnectorStyle::for_grid(&grid),
            selected: None,
            anchor_padding: ANCHOR_PADDING,
        }
    }

    /// Show connection handles around `id`, `padding` outside its sides.
    pub fn with_selection(mut self, id: BlockId, padding: f64) -> Self {
        self.selected = Some(id);
        self.anchor_padding = padding;
        self
    }

    /// Set the grid configuration; connector corners follow the new unit.
    pub fn with_grid_config(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self.connector_style.corner_radius = grid.unit() / 2.0;
        self
    }

    /// Set the grid style.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    /// Set the grid color.
    pub fn with_grid_color(mut self, color: Color) -> Self {
        self.grid_color = color;
        self
    }

    /// Set the connector style.
    pub fn with_connector_style(mut self, style: ConnectorStyle) -> Self {
        self.connector_style = style;
        self
    }

    /// World-to-screen transform for this frame.
    pub fn transform(&self) -> Affine {
        self.camera.transform()
    }

    /// Unscaled world rectangle visible this frame.
    pub fn view_rect(&self) -> Rect {
        self.camera.view_rect(self.container)
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Build the drawing commands for a frame.
    ///
    /// This method is called once per frame and should prepare all drawing commands.
    fn build_scene(&mut self, ctx: &RenderContext);
}

/// One recorded drawing operation, in world coordinates.
#[derive(Debug, Clone)]
pub enum DrawItem {
    /// Restrict the following grid items to a rectangle.
    Clip(Rect),
    Stroke {
        path: BezPath,
        style: Stroke,
        color: Color,
    },
    Fill {
        path: BezPath,
        color: Color,
    },
}

/// Renderer that records draw items for a host to replay.
#[derive(Debug, Default)]
pub struct CommandRenderer {
    items: Vec<DrawItem>,
    transform: Affine,
}

impl CommandRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items recorded by the last frame.
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    /// Transform the items must be drawn with.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    fn push_grid(&mut self, ctx: &RenderContext) {
        if ctx.grid_style == GridStyle::None {
            return;
        }
        let lines = grid::grid_lines(ctx.view_rect(), ctx.camera.zoom, &ctx.grid);
        if lines.is_empty() {
            return;
        }
        self.items.push(DrawItem::Clip(lines.clip));

        match ctx.grid_style {
            GridStyle::Dots => {
                let style = Stroke::new(GRID_STROKE_WIDTH)
                    .with_caps(Cap::Round)
                    .with_join(Join::Round)
                    .with_dashes(ctx.grid.dash_offset(), dot_dashes(&ctx.grid, &lines));
                self.push_lines(&lines, false, style, ctx.grid_color);
            }
            GridStyle::Lines => {
                self.push_lines(&lines, true, Stroke::new(GRID_LINE_WIDTH), ctx.grid_color);
            }
            GridStyle::None => {}
        }
    }

    fn push_lines(&mut self, lines: &GridLines, horizontal: bool, style: Stroke, color: Color) {
        let mut path = BezPath::new();
        let mut add = |line: kurbo::Line| {
            path.move_to(line.p0);
            path.line_to(line.p1);
        };
        lines.vertical.iter().for_each(|l| add(l.line()));
        if horizontal {
            lines.horizontal.iter().for_each(|l| add(l.line()));
        }
        self.items.push(DrawItem::Stroke { path, style, color });
    }

    fn push_connectors(&mut self, ctx: &RenderContext) {
        for connector in ctx.store.connectors(&ctx.grid) {
            let drawing = draw_connector(connector.path.points(), &ctx.connector_style);
            if drawing.is_empty() {
                continue;
            }
            self.items.push(DrawItem::Stroke {
                path: drawing.stroke_path(),
                style: drawing.stroke(),
                color: drawing.color,
            });
            if let Some(head) = drawing.arrowhead_path() {
                self.items.push(DrawItem::Fill {
                    path: head,
                    color: drawing.color,
                });
            }
        }
    }

    fn push_handles(&mut self, ctx: &RenderContext) {
        let Some(rect) = ctx.selected.and_then(|id| ctx.store.rect(id)) else {
            return;
        };
        for AnchorHandle { position, .. } in anchor_handles(rect, ctx.anchor_padding) {
            let path = Circle::new(position, HANDLE_RADIUS).to_path(0.1);
            self.items.push(DrawItem::Fill {
                path: path.clone(),
                color: Color::from_rgba8(219, 234, 254, 255),
            });
            self.items.push(DrawItem::Stroke {
                path,
                style: Stroke::new(1.0),
                color: Color::from_rgba8(107, 114, 128, 255),
            });
        }
    }
}

/// Dash pattern putting one dot per grid spacing along a line.
fn dot_dashes(grid: &GridConfig, lines: &GridLines) -> [f64; 2] {
    let [dot, _] = grid.dash();
    [dot, lines.spacing - dot]
}

impl Renderer for CommandRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.items.clear();
        self.transform = ctx.transform();
        self.push_grid(ctx);
        self.push_connectors(ctx);
        self.push_handles(ctx);
        log::trace!("frame recorded {} draw items", self.items.len());
    }
}

impl DrawItem {
    /// Bounds of the item's geometry.
    pub fn bounds(&self) -> Rect {
        match self {
            DrawItem::Clip(rect) => *rect,
            DrawItem::Stroke { path, .. } | DrawItem::Fill { path, .. } => path.bounding_box(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_style_cycle() {
        let mut style = GridStyle::default();
        assert_eq!(style, GridStyle::Dots);
        for _ in 0..3 {
            style = style.next();
        }
        assert_eq!(style, GridStyle::Dots);
        assert_eq!(GridStyle::Lines.name(), "Lines");
    }

    #[test]
    fn test_empty_store_draws_grid_only() {
        let store = BlockStore::new();
        let camera = Camera::new();
        let ctx = RenderContext::new(&store, &camera, Size::new(800.0, 600.0));
        let mut renderer = CommandRenderer::new();
        renderer.build_scene(&ctx);

        let items = renderer.items();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            items[0],
            DrawItem::Clip(rect) if rect == Rect::new(0.0, 0.0, 800.0, 600.0)
        ));
        let DrawItem::Stroke { style, .. } = &items[1] else {
            panic!("expected grid stroke");
        };
        assert_eq!(style.width, GRID_STROKE_WIDTH);
        assert_eq!(style.dash_pattern.len(), 2);
        assert!((style.dash_pattern[0] - 0.1).abs() < 1e-9);
        assert!((style.dash_pattern[1] - 39.9).abs() < 1e-9);
        assert_eq!(style.dash_offset, ctx.grid.dash_offset());
    }

    #[test]
    fn test_no_grid() {
        let store = BlockStore::new();
        let camera = Camera::new();
        let ctx = RenderContext::new(&store, &camera, Size::new(800.0, 600.0))
            .with_grid(GridStyle::None);
        let mut renderer = CommandRenderer::new();
        renderer.build_scene(&ctx);
        assert!(renderer.items().is_empty());
    }

    #[test]
    fn test_selection_draws_handles() {
        let mut store = BlockStore::new();
        let id = store
            .insert(gridflow_core::Block::rectangle(Rect::new(0.0, 0.0, 80.0, 80.0)))
            .unwrap();
        let camera = Camera::new();
        let ctx = RenderContext::new(&store, &camera, Size::new(400.0, 400.0))
            .with_grid(GridStyle::None)
            .with_selection(id, ANCHOR_PADDING);
        let mut renderer = CommandRenderer::new();
        renderer.build_scene(&ctx);

        let items = renderer.items();
        assert_eq!(items.len(), 8);
        // Right handle is centered one padding outside the right anchor
        let right = items[2].bounds();
        assert!((right.center().x - 100.0).abs() < 1e-6);
        assert!((right.center().y - 40.0).abs() < 1e-6);
        assert!(matches!(items[2], DrawItem::Fill { .. }));
        assert!(matches!(items[3], DrawItem::Stroke { .. }));
    }

    #[test]
    fn test_grid_config_updates_corner_radius() {
        let store = BlockStore::new();
        let camera = Camera::new();
        let grid = GridConfig::new(14, 6).unwrap();
        let ctx = RenderContext::new(&store, &camera, Size::new(10.0, 10.0)).with_grid_config(grid);
        assert_eq!(ctx.connector_style.corner_radius, 10.0);
    }
}
