//! Per-diagram configuration.

use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anchor::ANCHOR_PADDING;
use crate::grid::{GridConfig, GridError};
use crate::snap::GUIDELINE_OFFSET;

/// Number of grid units along each side of a freshly created block.
pub const DEFAULT_BLOCK_UNITS: f64 = 5.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {field} must be non-negative")]
    Negative { field: &'static str },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Layout settings for one diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub grid: GridConfig,
    /// Distance between an anchor and its handle.
    pub anchor_padding: f64,
    /// Alignment guide snapping distance.
    pub guideline_offset: f64,
    /// Size of blocks created by a single click.
    pub default_block_size: Size,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        let grid = GridConfig::default();
        let side = grid.unit() * DEFAULT_BLOCK_UNITS;
        Self {
            grid,
            anchor_padding: ANCHOR_PADDING,
            guideline_offset: GUIDELINE_OFFSET,
            default_block_size: Size::new(side, side),
        }
    }
}

impl DiagramConfig {
    /// Parse a possibly partial JSON document; missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.grid.validate()?;
        let fields = [
            ("anchor_padding", self.anchor_padding),
            ("guideline_offset", self.guideline_offset),
            ("default_block_size.width", self.default_block_size.width),
            ("default_block_size.height", self.default_block_size.height),
        ];
        for (field, value) in fields {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::Negative { field });
            }
        }
        Ok(())
    }

    /// The grid unit in world units.
    pub fn unit(&self) -> f64 {
        self.grid.unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiagramConfig::default();
        assert_eq!(config.unit(), 40.0);
        assert_eq!(config.anchor_padding, 20.0);
        assert_eq!(config.guideline_offset, 5.0);
        assert_eq!(config.default_block_size, Size::new(200.0, 200.0));
    }

    #[test]
    fn test_partial_json() {
        let config =
            DiagramConfig::from_json(r#"{"grid": {"step": 14}, "anchor_padding": 12}"#).unwrap();
        assert_eq!(config.grid, GridConfig { step: 14, gap: 6 });
        assert_eq!(config.anchor_padding, 12.0);
        assert_eq!(config.guideline_offset, 5.0);
    }

    #[test]
    fn test_invalid_grid() {
        let err = DiagramConfig::from_json(r#"{"grid": {"step": 0, "gap": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Grid(GridError::InvalidUnit { .. })));
    }

    #[test]
    fn test_negative_padding() {
        let err = DiagramConfig::from_json(r#"{"anchor_padding": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Negative { field: "anchor_padding" }));
    }

    #[test]
    fn test_malformed_json() {
        let err = DiagramConfig::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
