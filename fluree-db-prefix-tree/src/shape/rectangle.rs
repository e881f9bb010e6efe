//! Axis-aligned rectangle shape, with dateline wrap on geodetic contexts.

use super::{canonical_bits, Point, SpatialRelation};
use crate::context::SpatialContext;
use std::hash::{Hash, Hasher};

/// Full longitude span in degrees.
pub(crate) const LON_SPAN: f64 = 360.0;

/// Axis-aligned rectangle.
///
/// On a geodetic context `min_x > max_x` means the rectangle crosses the
/// dateline: it covers `[min_x, 180]` and `[-180, max_x]`. The y range is
/// never inverted.
#[derive(Debug, Clone, Copy)]
pub struct Rectangle {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Rectangle {
    pub(crate) fn new_unchecked(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    /// True when the x range wraps across the dateline.
    pub fn crosses_dateline(&self) -> bool {
        self.min_x > self.max_x
    }

    /// Width along x, accounting for dateline wrap.
    pub fn width(&self) -> f64 {
        if self.crosses_dateline() {
            self.max_x + LON_SPAN - self.min_x
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// False for degenerate (zero width or height) rectangles.
    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Center point; for a wrapping rectangle the center lies on the wrapped span.
    pub fn center(&self) -> Point {
        let mut x = self.min_x + self.width() / 2.0;
        if x > LON_SPAN / 2.0 {
            x -= LON_SPAN;
        }
        Point::new_unchecked(x, (self.min_y + self.max_y) / 2.0)
    }

    /// True when `x` lies in the (possibly wrapping) x range.
    pub fn contains_x(&self, x: f64, ctx: &SpatialContext) -> bool {
        if ctx.is_geo() {
            let width = self.width();
            width >= LON_SPAN || (x - self.min_x).rem_euclid(LON_SPAN) <= width
        } else {
            self.min_x <= x && x <= self.max_x
        }
    }

    /// Closed containment test for a coordinate.
    pub fn contains_xy(&self, x: f64, y: f64, ctx: &SpatialContext) -> bool {
        self.min_y <= y && y <= self.max_y && self.contains_x(x, ctx)
    }

    pub fn relate_point(&self, point: &Point, ctx: &SpatialContext) -> SpatialRelation {
        if self.contains_xy(point.x(), point.y(), ctx) {
            SpatialRelation::Contains
        } else {
            SpatialRelation::Disjoint
        }
    }

    pub fn relate_rectangle(&self, other: &Rectangle, ctx: &SpatialContext) -> SpatialRelation {
        let y_rel = relate_range(self.min_y, self.max_y, other.min_y, other.max_y);
        if y_rel == SpatialRelation::Disjoint {
            return SpatialRelation::Disjoint;
        }

        let x_rel = if ctx.is_geo() {
            relate_lon_range(self, other)
        } else {
            relate_range(self.min_x, self.max_x, other.min_x, other.max_x)
        };
        if x_rel == SpatialRelation::Disjoint {
            return SpatialRelation::Disjoint;
        }

        if x_rel == y_rel {
            return x_rel;
        }
        // One axis equal: the other axis decides.
        if self.min_x == other.min_x && self.max_x == other.max_x {
            return y_rel;
        }
        if self.min_y == other.min_y && self.max_y == other.max_y {
            return x_rel;
        }
        SpatialRelation::Intersects
    }

    /// Split a dateline-crossing rectangle into its two non-wrapping parts.
    pub(crate) fn split_at_dateline(&self) -> (Rectangle, Option<Rectangle>) {
        if self.crosses_dateline() {
            (
                Rectangle::new_unchecked(self.min_x, LON_SPAN / 2.0, self.min_y, self.max_y),
                Some(Rectangle::new_unchecked(
                    -LON_SPAN / 2.0,
                    self.max_x,
                    self.min_y,
                    self.max_y,
                )),
            )
        } else {
            (*self, None)
        }
    }
}

/// Relate two closed 1D ranges.
fn relate_range(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> SpatialRelation {
    if b_min > a_max || b_max < a_min {
        SpatialRelation::Disjoint
    } else if a_min <= b_min && b_max <= a_max {
        SpatialRelation::Contains
    } else if b_min <= a_min && a_max <= b_max {
        SpatialRelation::Within
    } else {
        SpatialRelation::Intersects
    }
}

/// Relate two longitude ranges on the circle, where -180 and 180 coincide.
fn relate_lon_range(a: &Rectangle, b: &Rectangle) -> SpatialRelation {
    let (a_width, b_width) = (a.width(), b.width());
    if a_width >= LON_SPAN {
        return SpatialRelation::Contains;
    }
    if b_width >= LON_SPAN {
        return SpatialRelation::Within;
    }

    // Offsets of each range start from the other's start, in [0, 360).
    let b_from_a = (b.min_x - a.min_x).rem_euclid(LON_SPAN);
    let a_from_b = (a.min_x - b.min_x).rem_euclid(LON_SPAN);

    if b_from_a + b_width <= a_width {
        SpatialRelation::Contains
    } else if a_from_b + a_width <= b_width {
        SpatialRelation::Within
    } else if b_from_a <= a_width || a_from_b <= b_width {
        SpatialRelation::Intersects
    } else {
        SpatialRelation::Disjoint
    }
}

impl PartialEq for Rectangle {
    fn eq(&self, other: &Self) -> bool {
        self.min_x == other.min_x
            && self.max_x == other.max_x
            && self.min_y == other.min_y
            && self.max_y == other.max_y
    }
}

impl Eq for Rectangle {}

impl Hash for Rectangle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_bits(self.min_x).hash(state);
        canonical_bits(self.max_x).hash(state);
        canonical_bits(self.min_y).hash(state);
        canonical_bits(self.max_y).hash(state);
    }
}

impl std::fmt::Display for Rectangle {
    /// Spatial4j envelope order: minX, maxX, maxY, minY.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ENVELOPE({}, {}, {}, {})",
            self.min_x, self.max_x, self.max_y, self.min_y
        )
    }
}
