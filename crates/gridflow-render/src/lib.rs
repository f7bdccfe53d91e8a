//! Gridflow Render Library
//!
//! Connector path rendering and frame building for gridflow.
//! Frames are recorded as backend-neutral draw items a host replays.

pub mod connector;
mod renderer;

pub use connector::{
    ConnectorDrawing, ConnectorStyle, PathCommand, arrowhead, commands_to_path, draw_connector,
    rounded_path,
};
pub use renderer::{CommandRenderer, DrawItem, GridStyle, RenderContext, Renderer};
