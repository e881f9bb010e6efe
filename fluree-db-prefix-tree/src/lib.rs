//! Recursive prefix-tree spatial indexing for Fluree DB.
//!
//! This crate turns shapes into cell terms that an inverted index can store,
//! and turns spatial predicates into boolean term queries over those cells.
//! It supports:
//!
//! - **Quad and geohash grids** over a geodetic or cartesian world
//! - **Points, rectangles, circles and polygons**, read from WKT or the
//!   `ENVELOPE`/`BUFFER` extensions
//! - **Intersects, IsWithin, Contains and IsDisjointTo** queries, with an
//!   exact re-check wherever the grid only approximates
//!
//! # Architecture
//!
//! A shape is decomposed by walking the grid from the root. Every cell the
//! shape touches yields a token (one symbol per level); cells the shape
//! covers, or that sit at the shape's detail level, carry a trailing `+`
//! leaf marker and end the walk. Because a child's token extends its
//! parent's, "any cell under X" is a single prefix range in a sorted term
//! dictionary.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     SpatialIndexSnapshot                      │
//! ├───────────────────────────────────────────────────────────────┤
//! │   term_index (term -> doc)   │   arena (shape + metadata)     │
//! └───────────────────────────────────────────────────────────────┘
//!                 │                             │
//!   SpatialArgs ──► strategy tree walk          │
//!                 │                             │
//!                 ▼                             │
//!         TermQuery (Term / Prefix / And / Or / Not)
//!                 │                             │
//!                 ▼                             │
//!         candidate docs                        │
//!                 │                             │
//!                 ▼                             │
//!         BBox prefilter ◄──────────────────────┘
//!                 │
//!                 ▼
//!         Exact re-check (inexact filters only)
//!                 │
//!                 ▼
//!         Query results
//! ```
//!
//! # Modules
//!
//! - [`config`]: Tree, context and index configuration types
//! - [`context`]: World bounds, shape factories and shape reading
//! - [`shape`]: Shape variants and the relation between two shapes
//! - [`token`]: Cell alphabets, token encode/decode, leaf marker
//! - [`grid`]: Quad and geohash prefix trees
//! - [`strategy`]: Indexing walk and query compilation
//! - [`term_index`]: Sorted in-memory term dictionary
//! - [`arena`]: Deduplicated shape storage
//! - [`builder`]: Index builder
//! - [`snapshot`]: Query execution over a built index
//! - [`provider`]: Provider trait for embedded and remote modes
//! - [`error`]: Error types

pub mod arena;
pub mod config;
pub mod context;
pub mod error;
pub mod grid;
pub mod shape;
pub mod strategy;
pub mod term_index;
pub mod token;

mod builder;
mod provider;
mod snapshot;

// Re-export key types
pub use arena::{ArenaEntry, ShapeArena, ShapeMetadata};
pub use builder::{BuildResult, BuildStats, SpatialIndexBuilder};
pub use config::{ContextConfig, GridType, PrefixTreeConfig, SpatialConfig, SpatialCreateConfig};
pub use context::SpatialContext;
pub use error::{Result, SpatialError};
pub use grid::{GridCell, PrefixTree};
pub use provider::{EmbeddedSpatialProvider, SpatialIndexProvider};
pub use shape::{Circle, Point, Polygon, Rectangle, Shape, ShapeKind, SpatialRelation};
pub use snapshot::{QueryStats, SearchOptions, SearchResults, SpatialIndexRoot, SpatialIndexSnapshot};
pub use strategy::{
    RecursivePrefixTreeStrategy, SpatialArgs, SpatialFilter, SpatialOperation, TermQuery, Visit,
};
pub use term_index::{DocSet, TermIndex, TermIndexBuilder, TermSource};
pub use token::{CellCodec, CellPath, CellTerm, LEAF_MARKER};
