//! Spatial index builder.
//!
//! Builds a prefix-tree index from per-document shapes. The builder:
//! 1. Accepts `(doc_id, shape)` records, either as shapes or as text
//! 2. Decomposes each distinct shape into cell terms (see [`ShapeArena`])
//! 3. Feeds `(term, doc_id)` entries to a [`TermIndexBuilder`]
//! 4. Produces a queryable [`SpatialIndexSnapshot`] with its root manifest
//!
//! # Usage
//!
//! ```ignore
//! let config = SpatialCreateConfig::new("location");
//! let mut builder = SpatialIndexBuilder::new(config)?;
//!
//! builder.add_wkt(1, "POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))");
//! builder.add_wkt(2, "ENVELOPE(-10, 10, 20, -20)");
//!
//! let result = builder.build();
//! let snapshot = result.snapshot;
//! ```

use crate::arena::ShapeArena;
use crate::config::{SpatialConfig, SpatialCreateConfig};
use crate::context::SpatialContext;
use crate::error::Result;
use crate::shape::{Shape, ShapeKind, SpatialRelation};
use crate::snapshot::{SpatialIndexRoot, SpatialIndexSnapshot};
use crate::strategy::RecursivePrefixTreeStrategy;
use crate::term_index::TermIndexBuilder;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Statistics collected during index building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of records processed.
    pub records_processed: u64,

    /// Number of documents whose shape was indexed.
    pub shapes_added: u64,

    /// Number of records skipped (parse errors, duplicates, out of bounds).
    pub records_skipped: u64,

    /// Total (term, doc) entries generated.
    pub term_entries: u64,

    /// Number of distinct documents.
    pub distinct_docs: u64,

    pub point_count: u64,
    pub rectangle_count: u64,
    pub circle_count: u64,
    pub polygon_count: u64,
}

/// Builder for prefix-tree spatial indexes.
///
/// One shape per document. Shapes are validated by the context factories;
/// records that fail are skipped and counted so batch ingestion continues.
pub struct SpatialIndexBuilder {
    /// Configuration used for building.
    config: SpatialCreateConfig,

    strategy: RecursivePrefixTreeStrategy,

    /// Distinct shapes and their terms.
    arena: ShapeArena,

    /// Accumulated term entries.
    terms: TermIndexBuilder,

    /// doc_id -> arena handle.
    docs: FxHashMap<u64, u32>,

    /// Build statistics.
    stats: BuildStats,
}

impl SpatialIndexBuilder {
    /// Create a builder, validating the tree config against its context.
    pub fn new(config: SpatialCreateConfig) -> Result<Self> {
        let ctx = Arc::new(SpatialContext::from_config(&config.context)?);
        let strategy = RecursivePrefixTreeStrategy::new(ctx, &config.tree)?;
        Ok(Self {
            config,
            strategy,
            arena: ShapeArena::new(),
            terms: TermIndexBuilder::new(),
            docs: FxHashMap::default(),
            stats: BuildStats::default(),
        })
    }

    pub fn config(&self) -> &SpatialCreateConfig {
        &self.config
    }

    /// Context that shapes for this index must be made with.
    pub fn context(&self) -> &SpatialContext {
        self.strategy.context()
    }

    pub fn strategy(&self) -> &RecursivePrefixTreeStrategy {
        &self.strategy
    }

    /// Get current build statistics.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Add a shape for `doc_id`.
    ///
    /// Returns `false` when the record is skipped: the document already has a
    /// shape, or the shape lies outside the context's world bounds.
    pub fn add_shape(&mut self, doc_id: u64, shape: Shape) -> bool {
        self.stats.records_processed += 1;

        if self.docs.contains_key(&doc_id) {
            self.stats.records_skipped += 1;
            tracing::debug!(doc_id, "Document already has a shape");
            return false;
        }

        let ctx = self.strategy.context();
        let bbox = shape.bounding_box();
        if ctx.world_bounds().relate_rectangle(&bbox, ctx) != SpatialRelation::Contains {
            self.stats.records_skipped += 1;
            tracing::debug!(doc_id, bbox = %bbox, "Shape outside world bounds");
            return false;
        }

        match shape.kind() {
            ShapeKind::Point => self.stats.point_count += 1,
            ShapeKind::Rectangle => self.stats.rectangle_count += 1,
            ShapeKind::Circle => self.stats.circle_count += 1,
            ShapeKind::Polygon => self.stats.polygon_count += 1,
        }

        // Equal shapes are decomposed once
        let (handle, _) = self.arena.add(shape, &self.strategy);
        if let Some(entry) = self.arena.get(handle) {
            self.terms.add_document(doc_id, entry.terms.iter().cloned());
            self.stats.term_entries += entry.terms.len() as u64;
        }
        self.docs.insert(doc_id, handle);
        self.stats.shapes_added += 1;
        true
    }

    /// Read a shape from text (WKT, `ENVELOPE`, `BUFFER`) and add it.
    ///
    /// Parse and validation errors are logged and counted in
    /// `stats.records_skipped`, not propagated.
    pub fn add_wkt(&mut self, doc_id: u64, text: &str) -> bool {
        match self.strategy.context().read_shape(text) {
            Ok(shape) => self.add_shape(doc_id, shape),
            Err(e) => {
                self.stats.records_processed += 1;
                self.stats.records_skipped += 1;
                tracing::debug!(doc_id, error = %e, "Failed to read shape");
                false
            }
        }
    }

    /// Number of (term, doc) entries accumulated (before dedup).
    pub fn entry_count(&self) -> usize {
        self.terms.len()
    }

    /// Number of distinct shapes.
    pub fn shape_count(&self) -> usize {
        self.arena.len()
    }

    /// Finish building.
    pub fn build(mut self) -> BuildResult {
        self.stats.distinct_docs = self.docs.len() as u64;

        let term_index = self.terms.build();
        let root = SpatialIndexRoot {
            version: SpatialIndexRoot::CURRENT_VERSION,
            config: SpatialConfig::from_create_config(&self.config),
            term_index: term_index.manifest(),
            shape_count: self.arena.len() as u64,
        };

        tracing::debug!(
            field = %self.config.field,
            docs = self.stats.distinct_docs,
            shapes = root.shape_count,
            terms = root.term_index.distinct_terms,
            skipped = self.stats.records_skipped,
            "built prefix-tree index"
        );

        BuildResult {
            snapshot: SpatialIndexSnapshot::new(
                root,
                self.strategy,
                term_index,
                self.arena,
                self.docs,
            ),
            stats: self.stats,
        }
    }
}

/// Result of building a spatial index.
pub struct BuildResult {
    /// Queryable index.
    pub snapshot: SpatialIndexSnapshot,

    /// Build statistics.
    pub stats: BuildStats,
}

impl BuildResult {
    pub fn root(&self) -> &SpatialIndexRoot {
        self.snapshot.root()
    }

    pub fn into_snapshot(self) -> SpatialIndexSnapshot {
        self.snapshot
    }
}
