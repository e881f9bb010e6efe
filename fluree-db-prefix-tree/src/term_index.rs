//! Sorted term index.
//!
//! Maps cell terms to document ids, standing in for a search engine's term
//! dictionary and postings. Entries are sorted by `(term, doc_id)`, so:
//! - an exact term is one contiguous run
//! - every term under a token prefix is one contiguous run (tokens are
//!   prefix-ordered, and the leaf marker sorts below every symbol)
//!
//! Both lookups are `partition_point` range scans.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Set of matching document ids.
pub type DocSet = FxHashSet<u64>;

/// Term-matching primitives a compiled spatial query runs against.
pub trait TermSource {
    /// Documents indexed with exactly `term`.
    fn docs_for_term(&self, term: &str) -> DocSet;

    /// Documents indexed with any term starting with `prefix`.
    fn docs_for_prefix(&self, prefix: &str) -> DocSet;

    /// Every indexed document.
    fn all_docs(&self) -> DocSet;
}

/// A single entry in the term index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermEntry {
    /// Cell term (token plus optional leaf marker).
    pub term: String,

    /// Document that emitted the term.
    pub doc_id: u64,
}

impl TermEntry {
    pub fn new(term: impl Into<String>, doc_id: u64) -> Self {
        Self {
            term: term.into(),
            doc_id,
        }
    }

    /// Compare for index ordering: (term, doc_id).
    pub fn cmp_index(&self, other: &Self) -> Ordering {
        match self.term.cmp(&other.term) {
            Ordering::Equal => self.doc_id.cmp(&other.doc_id),
            ord => ord,
        }
    }
}

/// Summary counts for a built term index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermIndexManifest {
    /// Total (term, doc) entries.
    pub total_entries: u64,

    /// Distinct terms.
    pub distinct_terms: u64,

    /// Documents with at least one term.
    pub doc_count: u64,
}

/// Builder for a [`TermIndex`].
#[derive(Debug, Default)]
pub struct TermIndexBuilder {
    /// Accumulated entries (unsorted).
    entries: Vec<TermEntry>,
}

impl TermIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Entries can be added in any order; they are sorted
    /// and deduplicated by [`build`](Self::build).
    pub fn push(&mut self, entry: TermEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = TermEntry>) {
        self.entries.extend(entries);
    }

    /// Add every term of one document.
    pub fn add_document<I, S>(&mut self, doc_id: u64, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .extend(terms.into_iter().map(|t| TermEntry::new(t, doc_id)));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(mut self) -> TermIndex {
        self.entries.sort_by(|a, b| a.cmp_index(b));
        self.entries.dedup();

        let mut docs: Vec<u64> = self.entries.iter().map(|e| e.doc_id).collect();
        docs.sort_unstable();
        docs.dedup();

        TermIndex {
            entries: self.entries,
            docs,
        }
    }
}

/// Immutable sorted term index.
#[derive(Debug, Clone, Default)]
pub struct TermIndex {
    /// Entries in index order.
    entries: Vec<TermEntry>,

    /// Distinct document ids, ascending.
    docs: Vec<u64>,
}

impl TermIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermEntry> {
        self.entries.iter()
    }

    pub fn manifest(&self) -> TermIndexManifest {
        let mut distinct_terms = 0u64;
        let mut last: Option<&str> = None;
        for entry in &self.entries {
            if last != Some(entry.term.as_str()) {
                distinct_terms += 1;
                last = Some(entry.term.as_str());
            }
        }
        TermIndexManifest {
            total_entries: self.entries.len() as u64,
            distinct_terms,
            doc_count: self.docs.len() as u64,
        }
    }

    /// Entries for exactly `term`.
    pub fn scan_term(&self, term: &str) -> &[TermEntry] {
        let start = self.entries.partition_point(|e| e.term.as_str() < term);
        let len = self.entries[start..].partition_point(|e| e.term == term);
        &self.entries[start..start + len]
    }

    /// Entries for every term starting with `prefix`.
    pub fn scan_prefix(&self, prefix: &str) -> &[TermEntry] {
        let start = self.entries.partition_point(|e| e.term.as_str() < prefix);
        let len = self.entries[start..].partition_point(|e| e.term.starts_with(prefix));
        &self.entries[start..start + len]
    }
}

impl TermSource for TermIndex {
    fn docs_for_term(&self, term: &str) -> DocSet {
        self.scan_term(term).iter().map(|e| e.doc_id).collect()
    }

    fn docs_for_prefix(&self, prefix: &str) -> DocSet {
        self.scan_prefix(prefix).iter().map(|e| e.doc_id).collect()
    }

    fn all_docs(&self) -> DocSet {
        self.docs.iter().copied().collect()
    }
}
