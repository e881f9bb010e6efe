//! Prefix tree grids.
//!
//! The tree is a pure function from a cell path to a [`GridCell`]: children
//! are produced by regular subdivision on demand, in a fixed symbol order,
//! so two passes over the same shape always produce the same cells.

mod cell;
mod geohash;
mod quad;

pub use cell::GridCell;

use crate::config::{GridType, PrefixTreeConfig};
use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use crate::shape::Rectangle;
use crate::token::{CellCodec, CellPath};

/// Grid over a context's world bounds, bounded by `max_levels`.
#[derive(Debug, Clone)]
pub struct PrefixTree {
    grid: GridType,
    max_levels: u8,
    world: Rectangle,
    codec: CellCodec,
}

impl PrefixTree {
    /// Build a tree after validating `config` against `ctx`.
    pub fn new(config: &PrefixTreeConfig, ctx: &SpatialContext) -> Result<Self> {
        config.validate(ctx)?;
        Ok(Self {
            grid: config.grid_type,
            max_levels: config.max_levels,
            world: ctx.world_bounds(),
            codec: CellCodec::new(config.grid_type, config.max_levels),
        })
    }

    pub fn grid_type(&self) -> GridType {
        self.grid
    }

    pub fn max_levels(&self) -> u8 {
        self.max_levels
    }

    pub fn codec(&self) -> &CellCodec {
        &self.codec
    }

    /// The root cell (level 0, empty token) covering the whole world.
    pub fn world_cell(&self) -> GridCell {
        GridCell::new(CellPath::root(), String::new(), self.world)
    }

    /// Children of `cell` in symbol order; empty at `max_levels`.
    pub fn subdivide(&self, cell: &GridCell) -> Vec<GridCell> {
        if cell.level() >= self.max_levels {
            return Vec::new();
        }
        let fan_out = match self.grid {
            GridType::Quad => quad::FAN_OUT,
            GridType::Geohash => geohash::FAN_OUT,
        };
        (0..fan_out).map(|i| self.child(cell, i)).collect()
    }

    fn child(&self, cell: &GridCell, index: u8) -> GridCell {
        let region = match self.grid {
            GridType::Quad => quad::child_region(cell.region(), index),
            GridType::Geohash => geohash::child_region(cell.region(), cell.level(), index),
        };
        let mut token = String::with_capacity(cell.token().len() + 1);
        token.push_str(cell.token());
        if let Some(symbol) = self.codec.alphabet().symbol(index) {
            token.push(char::from(symbol));
        }
        GridCell::new(cell.path().child(index), token, region)
    }

    /// The single cell at `level` holding `(x, y)`.
    ///
    /// Descends with half-open child selection, so a point on a split line
    /// lands in exactly one child.
    pub fn cell_for_point(&self, x: f64, y: f64, level: u8) -> GridCell {
        let mut cell = self.world_cell();
        for _ in 0..level.min(self.max_levels) {
            let index = match self.grid {
                GridType::Quad => quad::child_index_for(cell.region(), x, y),
                GridType::Geohash => geohash::child_index_for(cell.region(), cell.level(), x, y),
            };
            cell = self.child(&cell, index);
        }
        cell
    }

    /// Rebuild a cell from an externally supplied token.
    pub fn cell_from_token(&self, token: &str) -> Result<GridCell> {
        let path = self.codec.decode(token)?;
        let mut cell = self.world_cell();
        for &index in path.indices() {
            cell = self.child(&cell, index);
        }
        if cell.token() != token {
            return Err(SpatialError::Internal(format!(
                "token {:?} rebuilt as {:?}",
                token,
                cell.token()
            )));
        }
        Ok(cell)
    }

    /// Cell width and height at `level`.
    pub fn cell_dimensions(&self, level: u8) -> (f64, f64) {
        match self.grid {
            GridType::Quad => quad::dimensions(&self.world, level),
            GridType::Geohash => geohash::dimensions(level),
        }
    }

    /// First level whose cells are narrower or shorter than `dist`;
    /// `max_levels` when no level is, or when `dist` is zero.
    pub fn level_for_distance(&self, dist: f64) -> u8 {
        if dist <= 0.0 {
            return self.max_levels;
        }
        (1..=self.max_levels)
            .find(|&level| {
                let (w, h) = self.cell_dimensions(level);
                w < dist || h < dist
            })
            .unwrap_or(self.max_levels)
    }
}
