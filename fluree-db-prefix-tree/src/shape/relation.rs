//! Spatial relation between two shapes.

use serde::{Deserialize, Serialize};

/// The relationship of one shape to another, as seen from the first shape.
///
/// Exactly one relation holds for any ordered pair. `Contains`/`Within` are
/// inverses of each other; `Intersects`/`Disjoint` are symmetric. Two equal
/// shapes report `Contains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialRelation {
    /// The first shape is entirely inside the second.
    Within,
    /// The first shape entirely covers the second.
    Contains,
    /// No common point.
    Disjoint,
    /// Overlap without containment in either direction.
    Intersects,
}

impl SpatialRelation {
    /// The relation seen from the other shape.
    pub fn transpose(self) -> Self {
        match self {
            SpatialRelation::Within => SpatialRelation::Contains,
            SpatialRelation::Contains => SpatialRelation::Within,
            other => other,
        }
    }

    /// True for every relation except `Disjoint`.
    pub fn intersects(self) -> bool {
        self != SpatialRelation::Disjoint
    }
}

impl std::fmt::Display for SpatialRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SpatialRelation::Within => "WITHIN",
            SpatialRelation::Contains => "CONTAINS",
            SpatialRelation::Disjoint => "DISJOINT",
            SpatialRelation::Intersects => "INTERSECTS",
        };
        f.write_str(s)
    }
}
