//! Shape arena.
//!
//! Stores every distinct indexed shape once, together with its cell terms and
//! the metadata the snapshot needs for the bbox prefilter. Documents refer to
//! shapes by `u32` handle; identical shapes share a handle and are only
//! decomposed once.

use crate::shape::{Point, Rectangle, Shape, ShapeKind};
use crate::strategy::RecursivePrefixTreeStrategy;
use rustc_hash::FxHashMap;

/// Precomputed per-shape metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMetadata {
    pub kind: ShapeKind,

    /// Bounding box (may cross the dateline on a geodetic context).
    pub bbox: Rectangle,

    pub center: Point,

    pub has_area: bool,

    /// Level at which indexing stopped refining.
    pub detail_level: u8,

    /// Number of cell terms emitted.
    pub term_count: usize,
}

/// Entry in the shape arena.
#[derive(Debug, Clone)]
pub struct ArenaEntry {
    /// Handle (index into arena).
    pub handle: u32,

    /// The shape, kept for exact re-checks.
    pub shape: Shape,

    /// Cell terms, sorted.
    pub terms: Vec<String>,

    pub metadata: ShapeMetadata,
}

/// Append-only shape store, deduplicated by shape equality.
#[derive(Debug, Default)]
pub struct ShapeArena {
    /// All entries in handle order.
    entries: Vec<ArenaEntry>,

    /// Shape -> handle for deduplication.
    index: FxHashMap<Shape, u32>,
}

impl ShapeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of an already stored shape.
    pub fn handle_of(&self, shape: &Shape) -> Option<u32> {
        self.index.get(shape).copied()
    }

    /// Add a shape, decomposing it with `strategy` unless an equal shape is
    /// already stored. Returns the handle and whether the shape was new.
    pub fn add(&mut self, shape: Shape, strategy: &RecursivePrefixTreeStrategy) -> (u32, bool) {
        if let Some(handle) = self.handle_of(&shape) {
            return (handle, false);
        }

        let terms = strategy.index_term_strings(&shape);
        let metadata = ShapeMetadata {
            kind: shape.kind(),
            bbox: shape.bounding_box(),
            center: shape.center(),
            has_area: shape.has_area(),
            detail_level: strategy.detail_level(&shape, strategy.dist_err_pct()),
            term_count: terms.len(),
        };

        let handle = self.entries.len() as u32;
        self.index.insert(shape.clone(), handle);
        self.entries.push(ArenaEntry {
            handle,
            shape,
            terms,
            metadata,
        });
        (handle, true)
    }

    pub fn get(&self, handle: u32) -> Option<&ArenaEntry> {
        self.entries.get(handle as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArenaEntry> {
        self.entries.iter()
    }
}
