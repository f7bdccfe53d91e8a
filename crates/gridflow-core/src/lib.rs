//! Gridflow Core Library
//!
//! Geometric layout core for the gridflow diagram canvas: grid snapping,
//! spatial queries, block anchors and orthogonal connector routing.

pub mod anchor;
pub mod block;
pub mod camera;
pub mod config;
pub mod grid;
pub mod routing;
pub mod snap;
pub mod spatial;
pub mod store;
pub mod tools;

pub use anchor::{ANCHOR_PADDING, AnchorHandle, Axis, Side, anchor_point, handle_position};
pub use block::{Block, BlockId, BlockKind, Connection};
pub use camera::Camera;
pub use config::{ConfigError, DiagramConfig};
pub use grid::{GridConfig, GridError, GridLine, GridLines, grid_lines, snap_to_grid, zoom_step};
pub use routing::{RouteKind, RoutedPath, route, route_between};
pub use snap::{Guide, SnapMode, SnapResult};
pub use spatial::{Direction, Spatial, nearest_by_center, nearest_in_direction, nearest_on_axis};
pub use store::{BlockStore, RoutedConnector, StoreError, StoreResult};
pub use tools::{InputContext, Interaction, InteractionOutcome, Pointer, ToolKind, ToolState};
