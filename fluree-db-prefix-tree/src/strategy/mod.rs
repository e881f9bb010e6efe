//! Recursive prefix-tree strategy.
//!
//! Indexing walks the grid from the root and emits a term for every cell
//! the shape touches:
//!
//! ```text
//! cell vs shape        term          then
//! ------------------   -----------   ---------------
//! DISJOINT             (none)        prune
//! WITHIN (covered)     token+        stop
//! at detail level      token+        stop
//! CONTAINS/INTERSECTS  token         descend
//! ```
//!
//! Points skip the walk and descend a single chain of cells.
//!
//! Queries walk the same grid against the query shape and compile to a
//! [`TermQuery`]. Results are never missing a true match; where the grid
//! can only approximate, the filter reports itself inexact and candidates
//! are re-checked against real geometry.

mod args;
mod query;

pub use args::{SpatialArgs, SpatialOperation};
pub use query::{SpatialFilter, TermQuery};

use crate::config::{validate_dist_err_pct, PrefixTreeConfig};
use crate::context::SpatialContext;
use crate::error::Result;
use crate::grid::{GridCell, PrefixTree};
use crate::shape::{Point, Shape, SpatialRelation};
use crate::token::{leaf_term, CellTerm};
use query::{sorted_contains, sorted_has_prefix};
use std::ops::ControlFlow;
use std::sync::Arc;

/// What the walk does after visiting a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Visit the cell's children (unless at the detail level).
    Descend,
    /// Do not visit below this cell.
    Skip,
}

/// Prefix-tree indexing and query strategy.
///
/// Cheap to clone and safe to share across threads; every operation is a
/// pure function of its inputs.
#[derive(Debug, Clone)]
pub struct RecursivePrefixTreeStrategy {
    ctx: Arc<SpatialContext>,
    tree: PrefixTree,
    dist_err_pct: f64,
}

/// Clauses gathered by one intersects-style query walk.
#[derive(Debug, Default)]
struct IntersectsWalk {
    /// Every non-disjoint clause.
    clauses: Vec<TermQuery>,
    /// Clauses whose matches certainly intersect the query.
    certain: Vec<TermQuery>,
    /// Prefixes of visited cells disjoint from the query.
    exclusions: Vec<TermQuery>,
    uncertain: bool,
    cells_visited: usize,
}

impl RecursivePrefixTreeStrategy {
    pub fn new(ctx: Arc<SpatialContext>, config: &PrefixTreeConfig) -> Result<Self> {
        let tree = PrefixTree::new(config, &ctx)?;
        Ok(Self {
            ctx,
            tree,
            dist_err_pct: config.dist_err_pct,
        })
    }

    pub fn context(&self) -> &Arc<SpatialContext> {
        &self.ctx
    }

    pub fn tree(&self) -> &PrefixTree {
        &self.tree
    }

    pub fn dist_err_pct(&self) -> f64 {
        self.dist_err_pct
    }

    /// Grid level at which `shape` stops being refined.
    ///
    /// The tolerated error is `dist_err_pct` of the distance from the bbox
    /// center to its far corner. Points, and a zero percentage, use the
    /// tree's max levels.
    pub fn detail_level(&self, shape: &Shape, dist_err_pct: f64) -> u8 {
        if dist_err_pct <= 0.0 || matches!(shape, Shape::Point(_)) {
            return self.tree.max_levels();
        }
        let bbox = shape.bounding_box();
        let center = bbox.center();
        let y = if center.y() >= 0.0 {
            bbox.max_y()
        } else {
            bbox.min_y()
        };
        let corner = Point::new_unchecked(bbox.max_x(), y);
        let dist = self.ctx.distance(&center, &corner) * dist_err_pct;
        self.tree.level_for_distance(dist)
    }

    /// Depth-first walk over cells, root first, children in symbol order.
    ///
    /// Every visited cell is passed to `visitor` with its relation to
    /// `shape`, disjoint cells included. Children are only visited when the
    /// visitor answers [`Visit::Descend`] and the cell is above
    /// `detail_level`. A `Break` ends the walk at once.
    pub fn visit_cells<F>(&self, shape: &Shape, detail_level: u8, mut visitor: F) -> ControlFlow<()>
    where
        F: FnMut(&GridCell, SpatialRelation) -> ControlFlow<(), Visit>,
    {
        let mut stack = vec![self.tree.world_cell()];
        while let Some(cell) = stack.pop() {
            let relation = cell.relate(shape, &self.ctx);
            match visitor(&cell, relation) {
                ControlFlow::Break(()) => return ControlFlow::Break(()),
                ControlFlow::Continue(Visit::Descend) if cell.level() < detail_level => {
                    stack.extend(self.tree.subdivide(&cell).into_iter().rev());
                }
                ControlFlow::Continue(_) => {}
            }
        }
        ControlFlow::Continue(())
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    /// Cell terms for `shape`, in token order.
    pub fn index_terms(&self, shape: &Shape) -> Vec<CellTerm> {
        let detail = self.detail_level(shape, self.dist_err_pct);

        if let Shape::Point(p) = shape {
            let terms: Vec<CellTerm> = (1..=detail)
                .map(|level| {
                    self.tree
                        .cell_for_point(p.x(), p.y(), level)
                        .term(level == detail)
                })
                .collect();
            tracing::trace!(detail_level = detail, terms = terms.len(), "indexed point");
            return terms;
        }

        let mut terms = Vec::new();
        let _ = self.visit_cells(shape, detail, |cell, relation| {
            let visit = match relation {
                SpatialRelation::Disjoint => Visit::Skip,
                SpatialRelation::Within => {
                    terms.push(cell.term(true));
                    Visit::Skip
                }
                _ if cell.level() >= detail => {
                    terms.push(cell.term(true));
                    Visit::Skip
                }
                _ => {
                    if cell.level() > 0 {
                        terms.push(cell.term(false));
                    }
                    Visit::Descend
                }
            };
            ControlFlow::Continue(visit)
        });
        terms.sort();
        terms.dedup();

        tracing::trace!(
            kind = ?shape.kind(),
            detail_level = detail,
            terms = terms.len(),
            "indexed shape"
        );
        terms
    }

    /// Index terms as strings, ready for a term index.
    pub fn index_term_strings(&self, shape: &Shape) -> Vec<String> {
        self.index_terms(shape).iter().map(CellTerm::to_term).collect()
    }

    // ========================================================================
    // Querying
    // ========================================================================

    /// Compile `args` into a filter.
    pub fn make_filter(&self, args: &SpatialArgs) -> Result<SpatialFilter> {
        let dist_err_pct = match args.dist_err_pct {
            Some(pct) => {
                validate_dist_err_pct(pct)?;
                pct
            }
            None => self.dist_err_pct,
        };
        let shape = &args.shape;
        let detail = self.detail_level(shape, dist_err_pct);

        let (query, exact, cells_visited) = match args.operation {
            SpatialOperation::Intersects => {
                let walk = self.walk_intersects(shape, detail);
                (TermQuery::or(walk.clauses), !walk.uncertain, walk.cells_visited)
            }
            SpatialOperation::IsDisjointTo => {
                let walk = self.walk_intersects(shape, detail);
                let query = TermQuery::and(vec![
                    TermQuery::All,
                    TermQuery::negate(TermQuery::or(walk.certain)),
                ]);
                (query, !walk.uncertain, walk.cells_visited)
            }
            SpatialOperation::IsWithin => {
                let walk = self.walk_intersects(shape, detail);
                let query = if walk.exclusions.is_empty() {
                    TermQuery::or(walk.clauses)
                } else {
                    TermQuery::and(vec![
                        TermQuery::or(walk.clauses),
                        TermQuery::negate(TermQuery::or(walk.exclusions)),
                    ])
                };
                (query, false, walk.cells_visited)
            }
            SpatialOperation::Contains => {
                let mut cells_visited = 0;
                let bbox = shape.bounding_box();
                let query = match shape {
                    Shape::Point(p) => {
                        cells_visited = detail as usize + 1;
                        self.contains_point_clause(p, detail)
                    }
                    // Collapsed onto a single point
                    _ if bbox.width() == 0.0 && bbox.height() == 0.0 => {
                        cells_visited = detail as usize + 1;
                        self.contains_point_clause(&bbox.center(), detail)
                    }
                    _ => self.contains_clause(
                        &self.tree.world_cell(),
                        shape,
                        detail,
                        &mut cells_visited,
                    ),
                };
                (query, false, cells_visited)
            }
        };

        tracing::debug!(
            operation = %args.operation,
            detail_level = detail,
            cells_visited,
            clauses = query.clause_count(),
            exact,
            "built spatial filter"
        );

        Ok(SpatialFilter::new(
            args.operation,
            shape.clone(),
            Arc::clone(&self.ctx),
            query,
            exact,
            detail,
            cells_visited,
        ))
    }

    fn walk_intersects(&self, shape: &Shape, detail: u8) -> IntersectsWalk {
        let mut walk = IntersectsWalk::default();
        let _ = self.visit_cells(shape, detail, |cell, relation| {
            walk.cells_visited += 1;
            let visit = match relation {
                SpatialRelation::Disjoint => {
                    walk.exclusions.push(TermQuery::Prefix(cell.token().to_string()));
                    Visit::Skip
                }
                SpatialRelation::Within => {
                    let clause = TermQuery::Prefix(cell.token().to_string());
                    walk.certain.push(clause.clone());
                    walk.clauses.push(clause);
                    Visit::Skip
                }
                _ if cell.level() >= detail => {
                    walk.clauses.push(TermQuery::Prefix(cell.token().to_string()));
                    walk.uncertain = true;
                    Visit::Skip
                }
                _ => {
                    // A leaf at a partial cell may stop short of the query,
                    // except at the root, where a leaf means the whole world.
                    let clause = TermQuery::Term(leaf_term(cell.token(), true));
                    if cell.level() == 0 {
                        walk.certain.push(clause.clone());
                    } else {
                        walk.uncertain = true;
                    }
                    walk.clauses.push(clause);
                    Visit::Descend
                }
            };
            ControlFlow::Continue(visit)
        });
        walk
    }

    /// Documents that may contain `shape` within `cell`: a leaf here, or a
    /// match in every child the shape reaches. Recursion depth is bounded
    /// by the detail level.
    fn contains_clause(
        &self,
        cell: &GridCell,
        shape: &Shape,
        detail: u8,
        cells_visited: &mut usize,
    ) -> TermQuery {
        *cells_visited += 1;
        if cell.level() >= detail {
            return TermQuery::Prefix(cell.token().to_string());
        }

        let mut required = Vec::new();
        for child in self.tree.subdivide(cell) {
            if child.relate(shape, &self.ctx) == SpatialRelation::Disjoint {
                *cells_visited += 1;
                continue;
            }
            required.push(self.contains_clause(&child, shape, detail, cells_visited));
        }

        TermQuery::or(vec![
            TermQuery::Term(leaf_term(cell.token(), true)),
            TermQuery::and(required),
        ])
    }

    /// [`contains_clause`](Self::contains_clause) along the single chain of
    /// cells an indexed point follows. A point on a split line belongs to
    /// one child only, so requiring every touching child would miss it.
    fn contains_point_clause(&self, point: &Point, detail: u8) -> TermQuery {
        let cell = self.tree.cell_for_point(point.x(), point.y(), detail);
        let token = cell.token();
        let mut query = TermQuery::Prefix(token.to_string());
        for level in (0..cell.level() as usize).rev() {
            query = TermQuery::Or(vec![
                TermQuery::Term(leaf_term(&token[..level], true)),
                query,
            ]);
        }
        query
    }

    /// Whether a document with `sorted_terms` may intersect `shape`.
    ///
    /// Same answer as an intersects filter, but stops at the first
    /// matching cell instead of compiling the whole query.
    pub fn intersects_doc_terms(&self, shape: &Shape, sorted_terms: &[String]) -> bool {
        let detail = self.detail_level(shape, self.dist_err_pct);
        self.visit_cells(shape, detail, |cell, relation| {
            let hit = match relation {
                SpatialRelation::Disjoint => return ControlFlow::Continue(Visit::Skip),
                SpatialRelation::Within => sorted_has_prefix(sorted_terms, cell.token()),
                _ if cell.level() >= detail => sorted_has_prefix(sorted_terms, cell.token()),
                _ => {
                    if sorted_contains(sorted_terms, &leaf_term(cell.token(), true)) {
                        return ControlFlow::Break(());
                    }
                    return ControlFlow::Continue(Visit::Descend);
                }
            };
            if hit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(Visit::Skip)
            }
        })
        .is_break()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridType;

    fn strategy(max_levels: u8, dist_err_pct: f64) -> RecursivePrefixTreeStrategy {
        let config = PrefixTreeConfig::default()
            .with_max_levels(max_levels)
            .with_dist_err_pct(dist_err_pct);
        RecursivePrefixTreeStrategy::new(Arc::new(SpatialContext::geo()), &config).unwrap()
    }

    #[test]
    fn test_point_emits_single_chain() {
        let s = strategy(3, 0.0);
        let point: Shape = s.context().make_point(10.0, 10.0).unwrap().into();
        let terms = s.index_terms(&point);

        assert_eq!(terms.len(), 3);
        for (i, term) in terms.iter().enumerate() {
            assert_eq!(term.level() as usize, i + 1);
            assert_eq!(term.is_leaf(), i == 2);
        }
        assert!(terms[1].token().starts_with(terms[0].token()));
        assert!(terms[2].token().starts_with(terms[1].token()));
    }

    #[test]
    fn test_world_rectangle_emits_root_only() {
        let s = strategy(6, 0.0);
        let world: Shape = s.context().world_bounds().into();
        let terms = s.index_term_strings(&world);
        assert_eq!(terms, vec!["+".to_string()]);
    }

    #[test]
    fn test_covered_cells_are_leaves() {
        let s = strategy(4, 0.0);
        // Exactly the top-right quadrant
        let quadrant: Shape = s
            .context()
            .make_rectangle(0.0, 180.0, 0.0, 90.0)
            .unwrap()
            .into();
        let terms = s.index_term_strings(&quadrant);
        assert!(terms.contains(&"B+".to_string()));
        // Neighbours touch the closed boundary and are partial
        assert!(terms.contains(&"A".to_string()));
        assert!(!terms.iter().any(|t| t.starts_with("B") && t != "B+"));
    }

    #[test]
    fn test_terms_are_sorted_and_unique() {
        let s = strategy(5, 0.0);
        let circle: Shape = s.context().make_circle(20.0, -10.0, 15.0).unwrap().into();
        let terms = s.index_term_strings(&circle);
        assert!(terms.windows(2).all(|w| w[0] < w[1]));
        for term in &terms {
            s.tree().codec().parse_term(term).unwrap();
        }
    }

    #[test]
    fn test_detail_level_from_dist_err_pct() {
        let s = strategy(12, 0.025);
        let world: Shape = s.context().world_bounds().into();
        // 0.025 * hypot(180, 90) ~ 5.03; level 6 cells are 5.625 x 2.8125
        assert_eq!(s.detail_level(&world, 0.025), 6);
        let point: Shape = s.context().make_point(1.0, 1.0).unwrap().into();
        assert_eq!(s.detail_level(&point, 0.025), 12);
        assert_eq!(s.detail_level(&world, 0.0), 12);
    }

    #[test]
    fn test_visit_cells_break_stops_walk() {
        let s = strategy(8, 0.0);
        let rect: Shape = s
            .context()
            .make_rectangle(-50.0, 50.0, -20.0, 20.0)
            .unwrap()
            .into();
        let mut visited = 0;
        let flow = s.visit_cells(&rect, 8, |_, _| {
            visited += 1;
            if visited == 5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(Visit::Descend)
            }
        });
        assert!(flow.is_break());
        assert_eq!(visited, 5);
    }

    #[test]
    fn test_intersects_filter_is_exact_for_world_query() {
        let s = strategy(4, 0.0);
        let world: Shape = s.context().world_bounds().into();
        let filter = s
            .make_filter(&SpatialArgs::new(SpatialOperation::Intersects, world))
            .unwrap();
        assert!(filter.is_exact());
        assert_eq!(filter.query(), &TermQuery::Prefix(String::new()));
    }

    #[test]
    fn test_contains_and_within_are_never_exact() {
        let s = strategy(3, 0.0);
        let rect: Shape = s
            .context()
            .make_rectangle(10.0, 20.0, 10.0, 20.0)
            .unwrap()
            .into();
        for op in [SpatialOperation::Contains, SpatialOperation::IsWithin] {
            let filter = s.make_filter(&SpatialArgs::new(op, rect.clone())).unwrap();
            assert!(!filter.is_exact());
        }
    }

    #[test]
    fn test_contains_point_on_split_line() {
        let s = strategy(4, 0.0);
        let ctx = s.context().clone();
        // (0, 0) lies on both level-1 split lines
        let point: Shape = ctx.make_point(0.0, 0.0).unwrap().into();
        let filter = s
            .make_filter(&SpatialArgs::new(SpatialOperation::Contains, point.clone()))
            .unwrap();
        assert_eq!(filter.cells_visited(), 5);

        let docs: Vec<Shape> = vec![
            point,
            ctx.make_rectangle(-1.0, 1.0, -1.0, 1.0).unwrap().into(),
            ctx.make_rectangle(0.0, 1.0, 0.0, 1.0).unwrap().into(),
        ];
        for doc in &docs {
            assert!(filter.matches_terms(&s.index_term_strings(doc)), "{:?}", doc);
        }
    }

    #[test]
    fn test_contains_collapsed_rectangle_on_split_line() {
        let s = strategy(4, 0.0);
        let ctx = s.context().clone();
        let query: Shape = ctx.make_rectangle(0.0, 0.0, 0.0, 0.0).unwrap().into();
        let filter = s
            .make_filter(&SpatialArgs::new(SpatialOperation::Contains, query.clone()))
            .unwrap();
        assert_eq!(filter.cells_visited(), 5);

        let docs: Vec<Shape> = vec![
            ctx.make_point(0.0, 0.0).unwrap().into(),
            query,
            ctx.make_rectangle(-1.0, 1.0, -1.0, 1.0).unwrap().into(),
        ];
        for doc in &docs {
            assert!(filter.matches_terms(&s.index_term_strings(doc)), "{:?}", doc);
            assert!(filter.recheck(doc), "{:?}", doc);
        }
    }

    #[test]
    fn test_make_filter_rejects_bad_dist_err_pct() {
        let s = strategy(3, 0.0);
        let point: Shape = s.context().make_point(1.0, 1.0).unwrap().into();
        let args = SpatialArgs::new(SpatialOperation::Intersects, point).with_dist_err_pct(0.9);
        assert!(s.make_filter(&args).is_err());
    }

    #[test]
    fn test_intersects_doc_terms_agrees_with_filter() {
        let s = strategy(5, 0.0);
        let ctx = s.context().clone();
        let docs: Vec<Shape> = vec![
            ctx.make_point(10.0, 10.0).unwrap().into(),
            ctx.make_rectangle(-100.0, -80.0, 30.0, 40.0).unwrap().into(),
            ctx.make_circle(120.0, -45.0, 10.0).unwrap().into(),
        ];
        let query: Shape = ctx.make_rectangle(0.0, 30.0, 0.0, 30.0).unwrap().into();
        let filter = s
            .make_filter(&SpatialArgs::new(SpatialOperation::Intersects, query.clone()))
            .unwrap();

        for doc in &docs {
            let terms = s.index_term_strings(doc);
            assert_eq!(
                s.intersects_doc_terms(&query, &terms),
                filter.matches_terms(&terms)
            );
        }
    }

    #[test]
    fn test_geohash_strategy_indexes_point() {
        let config = PrefixTreeConfig::default()
            .with_grid_type(GridType::Geohash)
            .with_max_levels(5);
        let s = RecursivePrefixTreeStrategy::new(Arc::new(SpatialContext::geo()), &config).unwrap();
        let point: Shape = s.context().make_point(-5.6, 42.6).unwrap().into();
        let terms = s.index_term_strings(&point);
        assert_eq!(terms, vec!["e", "ez", "ezs", "ezs4", "ezs42+"]);
    }
}
