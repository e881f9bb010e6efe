//! Spatial index snapshot.
//!
//! A built, immutable index: the term index, the shape arena, and the root
//! manifest. Query execution:
//!
//! ```text
//! SpatialArgs -> SpatialFilter (tree walk)
//!             -> candidates (term index lookups)
//!             -> bbox prefilter
//!             -> exact re-check (unless the filter is exact or skipped)
//!             -> doc ids, ascending
//! ```

use crate::arena::{ArenaEntry, ShapeArena};
use crate::config::SpatialConfig;
use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use crate::shape::SpatialRelation;
use crate::strategy::{RecursivePrefixTreeStrategy, SpatialArgs, SpatialFilter, SpatialOperation};
use crate::term_index::{TermIndex, TermIndexManifest};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-query options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Stop after this many results.
    pub limit: Option<usize>,

    /// Run the exact re-check on inexact filters.
    pub recheck: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: None,
            recheck: true,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the exact re-check. Results of an inexact filter are then an
    /// over-approximation, flagged by [`SearchResults::approximate`].
    pub fn without_recheck(mut self) -> Self {
        self.recheck = false;
        self
    }
}

/// Matching documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Document ids, ascending.
    pub doc_ids: Vec<u64>,

    /// True when the results may contain false positives (never false
    /// negatives): the filter was inexact and the re-check was skipped.
    pub approximate: bool,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }
}

/// Statistics from a spatial query execution.
#[derive(Debug, Clone, Default)]
pub struct QueryStats {
    /// Detail level of the query walk.
    pub detail_level: u8,

    /// Grid cells visited while compiling the filter.
    pub cells_visited: usize,

    /// Term and prefix clauses in the compiled query.
    pub clauses: usize,

    /// Documents matched by the term query.
    pub candidates: usize,

    /// Number of candidates that passed bbox prefilter.
    pub passed_bbox: usize,

    /// Number of exact predicate checks performed.
    pub exact_checks: usize,

    /// Number of results returned.
    pub result_count: usize,
}

impl QueryStats {
    /// Compute the selectivity ratio: result_count / candidates.
    ///
    /// Lower is better (more candidates were filtered out).
    pub fn selectivity(&self) -> f64 {
        if self.candidates == 0 {
            0.0
        } else {
            self.result_count as f64 / self.candidates as f64
        }
    }

    /// Compute the bbox prefilter efficiency: passed_bbox / candidates.
    ///
    /// Lower is better (bbox rejected more candidates).
    pub fn bbox_efficiency(&self) -> f64 {
        if self.candidates == 0 {
            0.0
        } else {
            self.passed_bbox as f64 / self.candidates as f64
        }
    }

    /// Compute the exact check efficiency: result_count / exact_checks.
    ///
    /// Higher is better (more exact checks resulted in matches).
    pub fn exact_check_efficiency(&self) -> f64 {
        if self.exact_checks == 0 {
            0.0
        } else {
            self.result_count as f64 / self.exact_checks as f64
        }
    }
}

/// Root manifest for a prefix-tree index.
///
/// Carries the grid type (and so the token alphabet), max levels, and world
/// bounds, which are needed to read tokens written by another process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialIndexRoot {
    /// Format version.
    pub version: u32,

    /// Configuration used to build this index.
    pub config: SpatialConfig,

    /// Term index summary.
    pub term_index: TermIndexManifest,

    /// Total number of distinct shapes.
    pub shape_count: u64,
}

impl SpatialIndexRoot {
    /// Current format version.
    pub const CURRENT_VERSION: u32 = 1;

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SpatialError::FormatError(format!("root serialization failed: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let root: SpatialIndexRoot = serde_json::from_str(json)
            .map_err(|e| SpatialError::FormatError(format!("invalid root manifest: {}", e)))?;
        if root.version > Self::CURRENT_VERSION {
            return Err(SpatialError::FormatError(format!(
                "unsupported root version {} (max {})",
                root.version,
                Self::CURRENT_VERSION
            )));
        }
        Ok(root)
    }

    /// Rebuild the strategy the index was built with.
    pub fn open_strategy(&self) -> Result<RecursivePrefixTreeStrategy> {
        let ctx = Arc::new(SpatialContext::from_config(&self.config.context)?);
        RecursivePrefixTreeStrategy::new(ctx, &self.config.tree)
    }
}

/// A queryable prefix-tree index.
pub struct SpatialIndexSnapshot {
    /// The root manifest.
    root: SpatialIndexRoot,

    strategy: RecursivePrefixTreeStrategy,

    term_index: TermIndex,

    /// Distinct shapes, for the prefilter and re-check.
    arena: ShapeArena,

    /// doc_id -> arena handle.
    docs: FxHashMap<u64, u32>,
}

impl SpatialIndexSnapshot {
    pub(crate) fn new(
        root: SpatialIndexRoot,
        strategy: RecursivePrefixTreeStrategy,
        term_index: TermIndex,
        arena: ShapeArena,
        docs: FxHashMap<u64, u32>,
    ) -> Self {
        Self {
            root,
            strategy,
            term_index,
            arena,
            docs,
        }
    }

    pub fn root(&self) -> &SpatialIndexRoot {
        &self.root
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.root.config
    }

    pub fn strategy(&self) -> &RecursivePrefixTreeStrategy {
        &self.strategy
    }

    pub fn context(&self) -> &SpatialContext {
        self.strategy.context()
    }

    pub fn term_index(&self) -> &TermIndex {
        &self.term_index
    }

    pub fn arena(&self) -> &ShapeArena {
        &self.arena
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    /// The stored shape entry for a document.
    pub fn entry_for_doc(&self, doc_id: u64) -> Option<&ArenaEntry> {
        self.docs.get(&doc_id).and_then(|&h| self.arena.get(h))
    }

    /// Compile `args` without executing.
    pub fn filter(&self, args: &SpatialArgs) -> Result<SpatialFilter> {
        self.strategy.make_filter(args)
    }

    /// Run a spatial query.
    pub fn query(&self, args: &SpatialArgs, options: SearchOptions) -> Result<SearchResults> {
        self.query_with_stats(args, options).map(|(results, _)| results)
    }

    /// Whether any document matches. Stops at the first match.
    pub fn exists(&self, args: &SpatialArgs) -> Result<bool> {
        let results = self.query(args, SearchOptions::default().with_limit(1))?;
        Ok(!results.is_empty())
    }

    /// Run a spatial query and return execution statistics.
    pub fn query_with_stats(
        &self,
        args: &SpatialArgs,
        options: SearchOptions,
    ) -> Result<(SearchResults, QueryStats)> {
        let _span = tracing::debug_span!("spatial_query", operation = %args.operation).entered();

        let filter = self.strategy.make_filter(args)?;
        let mut stats = QueryStats {
            detail_level: filter.detail_level(),
            cells_visited: filter.cells_visited(),
            clauses: filter.query().clause_count(),
            ..Default::default()
        };

        let mut candidates: Vec<u64> = filter.candidates(&self.term_index).into_iter().collect();
        candidates.sort_unstable();
        stats.candidates = candidates.len();

        let ctx = self.strategy.context();
        let query_bbox = args.shape.bounding_box();
        let check = options.recheck && !filter.is_exact();
        let mut results = SearchResults {
            doc_ids: Vec::new(),
            approximate: !filter.is_exact() && !options.recheck,
        };

        for doc_id in candidates {
            if options.limit.is_some_and(|lim| results.doc_ids.len() >= lim) {
                break;
            }

            let entry = self.entry_for_doc(doc_id).ok_or_else(|| {
                SpatialError::Internal(format!("no shape for indexed doc {}", doc_id))
            })?;

            // Disjoint bboxes rule out every operation but disjoint,
            // and settle disjoint without an exact check
            let bbox_disjoint =
                entry.metadata.bbox.relate_rectangle(&query_bbox, ctx) == SpatialRelation::Disjoint;
            if args.operation == SpatialOperation::IsDisjointTo {
                stats.passed_bbox += 1;
                if bbox_disjoint {
                    results.doc_ids.push(doc_id);
                    continue;
                }
            } else if bbox_disjoint {
                continue;
            } else {
                stats.passed_bbox += 1;
            }

            if check {
                stats.exact_checks += 1;
                if !filter.recheck(&entry.shape) {
                    continue;
                }
            }
            results.doc_ids.push(doc_id);
        }

        stats.result_count = results.doc_ids.len();
        tracing::debug!(
            candidates = stats.candidates,
            passed_bbox = stats.passed_bbox,
            exact_checks = stats.exact_checks,
            results = stats.result_count,
            approximate = results.approximate,
            "spatial query complete"
        );
        Ok((results, stats))
    }
}
