//! Cell token encoding.
//!
//! A cell is identified by its root-to-cell path of child indices. The
//! token is that path written with one alphabet symbol per level, so a
//! parent token is always a strict prefix of its children's tokens. Both
//! alphabets are ASCII-sorted, so byte order of equal-length tokens follows
//! subdivision order.
//!
//! Indexed terms are tokens optionally followed by [`LEAF_MARKER`], meaning
//! indexing stopped at that cell. `'+'` sorts below every alphabet symbol,
//! so `"AB+"` lands directly after `"AB"` and before `"ABA"`.

use crate::config::GridType;
use crate::error::{Result, SpatialError};

/// Suffix marking a leaf term.
pub const LEAF_MARKER: char = '+';

const LEAF_BYTE: u8 = b'+';

/// Quad alphabet: top-left, top-right, bottom-left, bottom-right.
pub const QUAD_ALPHABET: &[u8] = b"ABCD";

/// Base-32 geohash alphabet.
pub const GEOHASH_ALPHABET: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Per-level symbol set for a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alphabet {
    symbols: &'static [u8],
}

impl Alphabet {
    pub fn for_grid(grid: GridType) -> Self {
        let symbols = match grid {
            GridType::Quad => QUAD_ALPHABET,
            GridType::Geohash => GEOHASH_ALPHABET,
        };
        Self { symbols }
    }

    pub fn symbols(&self) -> &'static [u8] {
        self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol for a child index.
    pub fn symbol(&self, index: u8) -> Option<u8> {
        self.symbols.get(index as usize).copied()
    }

    /// Child index for a symbol.
    pub fn index_of(&self, symbol: u8) -> Option<u8> {
        // Sorted alphabet, so binary search is valid.
        self.symbols.binary_search(&symbol).ok().map(|i| i as u8)
    }
}

/// Root-to-cell sequence of child indices. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPath(Vec<u8>);

impl CellPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_indices(indices: Vec<u8>) -> Self {
        Self(indices)
    }

    /// Depth of the cell; the root is level 0.
    pub fn level(&self) -> u8 {
        self.0.len() as u8
    }

    pub fn indices(&self) -> &[u8] {
        &self.0
    }

    pub fn child(&self, index: u8) -> Self {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    pub fn is_ancestor_of(&self, other: &CellPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }
}

/// Encoder/decoder between [`CellPath`] and token strings for one grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellCodec {
    alphabet: Alphabet,
    max_levels: u8,
}

impl CellCodec {
    pub fn new(grid: GridType, max_levels: u8) -> Self {
        Self {
            alphabet: Alphabet::for_grid(grid),
            max_levels,
        }
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn max_levels(&self) -> u8 {
        self.max_levels
    }

    /// Encode a path as a token.
    pub fn encode(&self, path: &CellPath) -> Result<String> {
        if path.level() > self.max_levels {
            return Err(SpatialError::decode(format!(
                "path level {} exceeds max levels {}",
                path.level(),
                self.max_levels
            )));
        }
        path.indices()
            .iter()
            .map(|&i| {
                self.alphabet.symbol(i).map(char::from).ok_or_else(|| {
                    SpatialError::decode(format!(
                        "child index {} outside alphabet of {}",
                        i,
                        self.alphabet.len()
                    ))
                })
            })
            .collect()
    }

    /// Decode a bare token (no leaf marker).
    pub fn decode(&self, token: &str) -> Result<CellPath> {
        let bytes = token.as_bytes();
        if bytes.len() > self.max_levels as usize {
            return Err(SpatialError::decode(format!(
                "token {:?} longer than max levels {}",
                token, self.max_levels
            )));
        }
        bytes
            .iter()
            .enumerate()
            .map(|(pos, &b)| {
                if b == LEAF_BYTE {
                    return Err(SpatialError::decode(format!(
                        "misplaced leaf marker at {} in {:?}",
                        pos, token
                    )));
                }
                self.alphabet.index_of(b).ok_or_else(|| {
                    SpatialError::decode(format!(
                        "symbol {:?} at {} not in alphabet",
                        char::from(b),
                        pos
                    ))
                })
            })
            .collect::<Result<Vec<u8>>>()
            .map(CellPath)
    }

    /// Parse an indexed term: a token with an optional trailing leaf marker.
    pub fn parse_term(&self, term: &str) -> Result<CellTerm> {
        let (token, leaf) = match term.strip_suffix(LEAF_MARKER) {
            Some(token) => (token, true),
            None => (term, false),
        };
        self.decode(token)?;
        if token.is_empty() && !leaf {
            return Err(SpatialError::decode("empty term"));
        }
        Ok(CellTerm::new(token, leaf))
    }
}

/// A cell token plus its leaf flag, as emitted by indexing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellTerm {
    token: String,
    leaf: bool,
}

impl CellTerm {
    pub fn new(token: impl Into<String>, leaf: bool) -> Self {
        Self {
            token: token.into(),
            leaf,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn level(&self) -> u8 {
        self.token.len() as u8
    }

    /// The term string handed to the term index.
    pub fn to_term(&self) -> String {
        leaf_term(&self.token, self.leaf)
    }
}

impl std::fmt::Display for CellTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)?;
        if self.leaf {
            write!(f, "{}", LEAF_MARKER)?;
        }
        Ok(())
    }
}

pub(crate) fn leaf_term(token: &str, leaf: bool) -> String {
    let mut term = String::with_capacity(token.len() + 1);
    term.push_str(token);
    if leaf {
        term.push(LEAF_MARKER);
    }
    term
}
