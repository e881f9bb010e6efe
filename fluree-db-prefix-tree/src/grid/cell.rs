//! Grid cell: one node of the implicit prefix tree.

use crate::context::SpatialContext;
use crate::shape::{Rectangle, Shape, SpatialRelation};
use crate::token::{CellPath, CellTerm};

/// A node of the prefix tree, computed on demand and never stored.
///
/// Only the token leaves the strategy, as an index term.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    path: CellPath,
    token: String,
    region: Rectangle,
}

impl GridCell {
    pub(crate) fn new(path: CellPath, token: String, region: Rectangle) -> Self {
        Self {
            path,
            token,
            region,
        }
    }

    pub fn path(&self) -> &CellPath {
        &self.path
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn level(&self) -> u8 {
        self.path.level()
    }

    /// Bounding region of the cell.
    pub fn region(&self) -> &Rectangle {
        &self.region
    }

    /// Relation of this cell to `shape`: `Within` means the shape covers
    /// the cell, `Contains` that the cell holds the whole shape.
    pub fn relate(&self, shape: &Shape, ctx: &SpatialContext) -> SpatialRelation {
        shape.relate_rectangle(&self.region, ctx).transpose()
    }

    pub fn is_leaf(&self, max_level: u8) -> bool {
        self.level() == max_level
    }

    pub fn term(&self, leaf: bool) -> CellTerm {
        CellTerm::new(self.token.as_str(), leaf)
    }
}
