//! Point shape.

use super::{canonical_bits, Rectangle, SpatialRelation};
use crate::context::SpatialContext;
use std::hash::{Hash, Hasher};

/// A 2D point. In a geodetic context `x` is longitude and `y` latitude.
///
/// Construct via [`SpatialContext::make_point`](crate::SpatialContext::make_point),
/// which validates the coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub(crate) fn new_unchecked(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// X coordinate (longitude on a geodetic context).
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate (latitude on a geodetic context).
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Two points are either the same point or disjoint.
    pub fn relate_point(&self, other: &Point) -> SpatialRelation {
        if self == other {
            SpatialRelation::Contains
        } else {
            SpatialRelation::Disjoint
        }
    }

    /// A rectangle collapsed onto this point is the same point set, so the
    /// relation is `Contains` both ways.
    pub fn relate_rectangle(&self, rect: &Rectangle, ctx: &SpatialContext) -> SpatialRelation {
        match rect.relate_point(self, ctx) {
            SpatialRelation::Disjoint => SpatialRelation::Disjoint,
            _ if rect.width() == 0.0 && rect.height() == 0.0 => SpatialRelation::Contains,
            _ => SpatialRelation::Within,
        }
    }

    pub(crate) fn to_geo(self) -> geo_types::Point<f64> {
        geo_types::Point::new(self.x, self.y)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_bits(self.x).hash(state);
        canonical_bits(self.y).hash(state);
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "POINT({} {})", self.x, self.y)
    }
}
