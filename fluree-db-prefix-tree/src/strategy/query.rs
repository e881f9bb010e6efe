//! Compiled spatial queries.
//!
//! A [`TermQuery`] is a boolean tree over exact-term and term-prefix
//! clauses, the primitives a term index answers directly. A
//! [`SpatialFilter`] pairs it with the query shape for the exact re-check.

use super::args::SpatialOperation;
use crate::context::SpatialContext;
use crate::shape::{Shape, SpatialRelation};
use crate::term_index::{DocSet, TermSource};
use std::sync::Arc;

/// Boolean query over cell terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermQuery {
    /// Every indexed document.
    All,
    /// No document.
    None,
    /// Documents with exactly this term.
    Term(String),
    /// Documents with any term starting with this prefix.
    Prefix(String),
    And(Vec<TermQuery>),
    Or(Vec<TermQuery>),
    Not(Box<TermQuery>),
}

impl TermQuery {
    /// Disjunction; collapses empty and single-clause input.
    pub fn or(mut clauses: Vec<TermQuery>) -> TermQuery {
        match clauses.len() {
            0 => TermQuery::None,
            1 => clauses.remove(0),
            _ => TermQuery::Or(clauses),
        }
    }

    /// Conjunction; collapses empty and single-clause input.
    pub fn and(mut clauses: Vec<TermQuery>) -> TermQuery {
        match clauses.len() {
            0 => TermQuery::All,
            1 => clauses.remove(0),
            _ => TermQuery::And(clauses),
        }
    }

    pub fn negate(query: TermQuery) -> TermQuery {
        TermQuery::Not(Box::new(query))
    }

    /// Number of term and prefix leaves.
    pub fn clause_count(&self) -> usize {
        match self {
            TermQuery::All | TermQuery::None => 0,
            TermQuery::Term(_) | TermQuery::Prefix(_) => 1,
            TermQuery::And(qs) | TermQuery::Or(qs) => qs.iter().map(|q| q.clause_count()).sum(),
            TermQuery::Not(q) => q.clause_count(),
        }
    }

    /// Run against a term source.
    pub fn evaluate<S: TermSource + ?Sized>(&self, source: &S) -> DocSet {
        match self {
            TermQuery::All => source.all_docs(),
            TermQuery::None => DocSet::default(),
            TermQuery::Term(t) => source.docs_for_term(t),
            TermQuery::Prefix(p) => source.docs_for_prefix(p),
            TermQuery::And(qs) => {
                let mut iter = qs.iter();
                let mut acc = match iter.next() {
                    Some(q) => q.evaluate(source),
                    None => return source.all_docs(),
                };
                for q in iter {
                    if acc.is_empty() {
                        break;
                    }
                    let next = q.evaluate(source);
                    acc.retain(|doc| next.contains(doc));
                }
                acc
            }
            TermQuery::Or(qs) => {
                let mut acc = DocSet::default();
                for q in qs {
                    acc.extend(q.evaluate(source));
                }
                acc
            }
            TermQuery::Not(q) => {
                let excluded = q.evaluate(source);
                let mut all = source.all_docs();
                all.retain(|doc| !excluded.contains(doc));
                all
            }
        }
    }

    /// Match one document's terms, given sorted.
    pub fn matches_sorted(&self, terms: &[String]) -> bool {
        match self {
            TermQuery::All => true,
            TermQuery::None => false,
            TermQuery::Term(t) => sorted_contains(terms, t),
            TermQuery::Prefix(p) => sorted_has_prefix(terms, p),
            TermQuery::And(qs) => qs.iter().all(|q| q.matches_sorted(terms)),
            TermQuery::Or(qs) => qs.iter().any(|q| q.matches_sorted(terms)),
            TermQuery::Not(q) => !q.matches_sorted(terms),
        }
    }
}

impl std::fmt::Display for TermQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermQuery::All => write!(f, "*:*"),
            TermQuery::None => write!(f, "-*:*"),
            TermQuery::Term(t) => write!(f, "{:?}", t),
            TermQuery::Prefix(p) => write!(f, "{:?}*", p),
            TermQuery::And(qs) => write_joined(f, qs, "AND"),
            TermQuery::Or(qs) => write_joined(f, qs, "OR"),
            TermQuery::Not(q) => write!(f, "NOT {}", q),
        }
    }
}

fn write_joined(f: &mut std::fmt::Formatter<'_>, qs: &[TermQuery], op: &str) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, q) in qs.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", q)?;
    }
    write!(f, ")")
}

pub(crate) fn sorted_contains(terms: &[String], term: &str) -> bool {
    terms.binary_search_by(|t| t.as_str().cmp(term)).is_ok()
}

pub(crate) fn sorted_has_prefix(terms: &[String], prefix: &str) -> bool {
    let start = terms.partition_point(|t| t.as_str() < prefix);
    terms.get(start).is_some_and(|t| t.starts_with(prefix))
}

/// A compiled query plus what is needed to re-check candidates exactly.
#[derive(Debug, Clone)]
pub struct SpatialFilter {
    operation: SpatialOperation,
    shape: Shape,
    ctx: Arc<SpatialContext>,
    query: TermQuery,
    exact: bool,
    detail_level: u8,
    cells_visited: usize,
}

impl SpatialFilter {
    pub(crate) fn new(
        operation: SpatialOperation,
        shape: Shape,
        ctx: Arc<SpatialContext>,
        query: TermQuery,
        exact: bool,
        detail_level: u8,
        cells_visited: usize,
    ) -> Self {
        Self {
            operation,
            shape,
            ctx,
            query,
            exact,
            detail_level,
            cells_visited,
        }
    }

    pub fn operation(&self) -> SpatialOperation {
        self.operation
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn query(&self) -> &TermQuery {
        &self.query
    }

    /// True when the term query alone returns exactly the right documents.
    ///
    /// When false, term matches are a superset and candidates must go
    /// through [`recheck`](Self::recheck) to drop false positives.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn detail_level(&self) -> u8 {
        self.detail_level
    }

    pub fn cells_visited(&self) -> usize {
        self.cells_visited
    }

    /// Term-level match for one document's sorted terms.
    pub fn matches_terms(&self, sorted_terms: &[String]) -> bool {
        self.query.matches_sorted(sorted_terms)
    }

    /// Candidate ids from a term source, before any re-check.
    pub fn candidates<S: TermSource + ?Sized>(&self, source: &S) -> DocSet {
        self.query.evaluate(source)
    }

    /// Exact predicate against the candidate's real geometry.
    pub fn recheck(&self, candidate: &Shape) -> bool {
        let ctx = self.ctx.as_ref();
        match self.operation {
            SpatialOperation::Intersects => {
                candidate.relate(&self.shape, ctx) != SpatialRelation::Disjoint
            }
            SpatialOperation::IsWithin => {
                self.shape.relate(candidate, ctx) == SpatialRelation::Contains
            }
            SpatialOperation::Contains => {
                candidate.relate(&self.shape, ctx) == SpatialRelation::Contains
            }
            SpatialOperation::IsDisjointTo => {
                candidate.relate(&self.shape, ctx) == SpatialRelation::Disjoint
            }
        }
    }
}
