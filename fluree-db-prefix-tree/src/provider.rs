//! Spatial index provider trait.
//!
//! The boundary between the strategy and whatever executes term queries.
//! Callers hand over a shape or a query and collect the result; the tree
//! walk behind it is synchronous and CPU-bound.
//!
//! The trait is async so a remote term engine can sit behind it. The
//! embedded implementation wraps an in-memory [`SpatialIndexSnapshot`].

use crate::config::SpatialConfig;
use crate::error::Result;
use crate::shape::Shape;
use crate::snapshot::{SearchOptions, SearchResults, SpatialIndexSnapshot};
use crate::strategy::SpatialArgs;
use async_trait::async_trait;
use std::sync::Arc;

/// Spatial index provider trait.
#[async_trait]
pub trait SpatialIndexProvider: Send + Sync {
    /// Indexed field name.
    fn field(&self) -> &str;

    /// Configuration the index was built with.
    fn config(&self) -> &SpatialConfig;

    /// Terms a document with `shape` would be indexed under, sorted.
    async fn index_terms(&self, shape: &Shape) -> Result<Vec<String>>;

    /// Run a spatial query.
    async fn query(&self, args: &SpatialArgs, options: SearchOptions) -> Result<SearchResults>;

    /// Run a query given in text form, e.g. `Intersects(POINT(1 2))`.
    async fn query_text(&self, text: &str, options: SearchOptions) -> Result<SearchResults>;

    /// Whether any document matches.
    async fn exists(&self, args: &SpatialArgs) -> Result<bool>;
}

/// Provider over an in-process snapshot.
#[derive(Clone)]
pub struct EmbeddedSpatialProvider {
    snapshot: Arc<SpatialIndexSnapshot>,
}

impl EmbeddedSpatialProvider {
    pub fn new(snapshot: SpatialIndexSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn from_arc(snapshot: Arc<SpatialIndexSnapshot>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &SpatialIndexSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl SpatialIndexProvider for EmbeddedSpatialProvider {
    fn field(&self) -> &str {
        &self.snapshot.config().field
    }

    fn config(&self) -> &SpatialConfig {
        self.snapshot.config()
    }

    async fn index_terms(&self, shape: &Shape) -> Result<Vec<String>> {
        Ok(self.snapshot.strategy().index_term_strings(shape))
    }

    async fn query(&self, args: &SpatialArgs, options: SearchOptions) -> Result<SearchResults> {
        self.snapshot.query(args, options)
    }

    async fn query_text(&self, text: &str, options: SearchOptions) -> Result<SearchResults> {
        let args = SpatialArgs::parse(text, self.snapshot.context())?;
        self.snapshot.query(&args, options)
    }

    async fn exists(&self, args: &SpatialArgs) -> Result<bool> {
        self.snapshot.exists(args)
    }
}
