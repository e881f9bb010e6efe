//! Prefix-tree index configuration types.
//!
//! Defines configuration for creating and persisting prefix-tree indexes.
//! The grid type (and so the token alphabet), world bounds and max levels
//! are persisted with the index, since tokens cannot be decoded or compared
//! without them.

use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Grid subdivision scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    /// Four children per cell (quadrants).
    Quad,
    /// Thirty-two children per cell, base-32 geohash. Geodetic only.
    Geohash,
}

impl GridType {
    /// Hard ceiling on tree depth for this grid.
    pub fn max_levels_possible(self) -> u8 {
        match self {
            GridType::Quad => 50,
            GridType::Geohash => 24,
        }
    }

    /// Children per cell.
    pub fn fan_out(self) -> usize {
        match self {
            GridType::Quad => 4,
            GridType::Geohash => 32,
        }
    }
}

impl std::fmt::Display for GridType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridType::Quad => write!(f, "quad"),
            GridType::Geohash => write!(f, "geohash"),
        }
    }
}

/// Configuration for the prefix tree and its indexing precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrefixTreeConfig {
    /// Grid subdivision scheme.
    /// Default: quad
    pub grid_type: GridType,

    /// Maximum tree depth (1..=grid ceiling). Higher = finer cells, more terms.
    /// Default: 12
    pub max_levels: u8,

    /// Fraction of a shape's size tolerated as indexing error, in [0, 0.5].
    /// 0 indexes every shape down to `max_levels`.
    /// Default: 0.025
    pub dist_err_pct: f64,
}

impl Default for PrefixTreeConfig {
    fn default() -> Self {
        Self {
            grid_type: GridType::Quad,
            max_levels: 12,
            dist_err_pct: 0.025,
        }
    }
}

impl PrefixTreeConfig {
    /// Largest accepted `dist_err_pct`.
    pub const MAX_DIST_ERR_PCT: f64 = 0.5;

    pub fn with_grid_type(mut self, grid_type: GridType) -> Self {
        self.grid_type = grid_type;
        self
    }

    pub fn with_max_levels(mut self, max_levels: u8) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn with_dist_err_pct(mut self, dist_err_pct: f64) -> Self {
        self.dist_err_pct = dist_err_pct;
        self
    }

    /// Reject out-of-range values. Nothing is clamped.
    pub fn validate(&self, ctx: &SpatialContext) -> Result<()> {
        let ceiling = self.grid_type.max_levels_possible();
        if self.max_levels < 1 || self.max_levels > ceiling {
            return Err(SpatialError::config(format!(
                "max_levels must be in 1..={} for {} grid, got {}",
                ceiling, self.grid_type, self.max_levels
            )));
        }
        validate_dist_err_pct(self.dist_err_pct)?;
        if self.grid_type == GridType::Geohash && !ctx.is_geo() {
            return Err(SpatialError::config(
                "geohash grid requires a geodetic context",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_dist_err_pct(value: f64) -> Result<()> {
    if !(0.0..=PrefixTreeConfig::MAX_DIST_ERR_PCT).contains(&value) {
        return Err(SpatialError::config(format!(
            "dist_err_pct must be in [0, {}], got {}",
            PrefixTreeConfig::MAX_DIST_ERR_PCT,
            value
        )));
    }
    Ok(())
}

/// Persisted form of a [`SpatialContext`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Geodetic (longitude/latitude with dateline wrap).
    pub geo: bool,

    /// World bounds `[min_x, max_x, min_y, max_y]`; required when not geodetic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<[f64; 4]>,
}

impl ContextConfig {
    pub fn geo() -> Self {
        Self {
            geo: true,
            world: None,
        }
    }

    pub fn cartesian(world: [f64; 4]) -> Self {
        Self {
            geo: false,
            world: Some(world),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::geo()
    }
}

/// Configuration for creating a prefix-tree index.
///
/// Used when building a new index from a batch of documents.
#[derive(Debug, Clone)]
pub struct SpatialCreateConfig {
    /// Name of the indexed field (e.g., "location").
    pub field: Arc<str>,

    /// Tree configuration.
    pub tree: PrefixTreeConfig,

    /// Context configuration.
    pub context: ContextConfig,
}

impl SpatialCreateConfig {
    /// Create a config for `field` with the default tree on a geodetic context.
    pub fn new(field: impl Into<Arc<str>>) -> Self {
        Self {
            field: field.into(),
            tree: PrefixTreeConfig::default(),
            context: ContextConfig::default(),
        }
    }

    pub fn with_tree_config(mut self, tree: PrefixTreeConfig) -> Self {
        self.tree = tree;
        self
    }

    pub fn with_context_config(mut self, context: ContextConfig) -> Self {
        self.context = context;
        self
    }
}

/// Runtime configuration for a prefix-tree index.
///
/// Stored in the index root manifest and used for query execution.
/// Uses `String` instead of `Arc<str>` for serde compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Field that was indexed.
    pub field: String,

    /// Tree configuration used at build time.
    pub tree: PrefixTreeConfig,

    /// Context used at build time.
    pub context: ContextConfig,

    /// Version of the index format.
    pub format_version: u32,
}

impl SpatialConfig {
    /// Current format version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Create from a create config.
    pub fn from_create_config(create: &SpatialCreateConfig) -> Self {
        Self {
            field: create.field.to_string(),
            tree: create.tree,
            context: create.context,
            format_version: Self::CURRENT_VERSION,
        }
    }
}
