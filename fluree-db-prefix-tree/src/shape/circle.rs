//! Circle shape.
//!
//! Circles are planar in coordinate units. On a geodetic context the x
//! distance between two longitudes is taken the short way around the
//! dateline, so a circle near 180 reaches into negative longitudes.

use super::{canonical_bits, Point, Polygon, Rectangle, SpatialRelation};
use crate::context::SpatialContext;
use std::hash::{Hash, Hasher};

/// Circle given by center and radius (radius >= 0).
#[derive(Debug, Clone, Copy)]
pub struct Circle {
    center: Point,
    radius: f64,
    bbox: Rectangle,
}

impl Circle {
    pub(crate) fn new_unchecked(center: Point, radius: f64, ctx: &SpatialContext) -> Self {
        Self {
            center,
            radius,
            bbox: bounding_box(center, radius, ctx),
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn bounding_box(&self) -> Rectangle {
        self.bbox
    }

    pub fn has_area(&self) -> bool {
        self.radius > 0.0
    }

    pub fn relate_point(&self, point: &Point, ctx: &SpatialContext) -> SpatialRelation {
        if ctx.distance(&self.center, point) <= self.radius {
            SpatialRelation::Contains
        } else {
            SpatialRelation::Disjoint
        }
    }

    pub fn relate_rectangle(&self, rect: &Rectangle, ctx: &SpatialContext) -> SpatialRelation {
        if self.bbox.relate_rectangle(rect, ctx) == SpatialRelation::Disjoint {
            return SpatialRelation::Disjoint;
        }

        let (cx, cy) = (self.center.x(), self.center.y());

        // Nearest point of the rectangle
        let near_dy = if rect.min_y() <= cy && cy <= rect.max_y() {
            0.0
        } else {
            (cy - rect.min_y()).abs().min((cy - rect.max_y()).abs())
        };
        let near_dx = if rect.contains_x(cx, ctx) {
            0.0
        } else {
            ctx.x_delta(cx, rect.min_x())
                .min(ctx.x_delta(cx, rect.max_x()))
        };
        if near_dx.hypot(near_dy) > self.radius {
            return SpatialRelation::Disjoint;
        }

        // Farthest point of the rectangle
        let far_dy = (cy - rect.min_y()).abs().max((cy - rect.max_y()).abs());
        let far_dx = if ctx.is_geo() && rect.contains_x(ctx.normalize_x(cx + 180.0), ctx) {
            180.0
        } else {
            ctx.x_delta(cx, rect.min_x())
                .max(ctx.x_delta(cx, rect.max_x()))
        };
        if far_dx.hypot(far_dy) <= self.radius {
            return SpatialRelation::Contains;
        }

        if rect.relate_rectangle(&self.bbox, ctx) == SpatialRelation::Contains {
            return SpatialRelation::Within;
        }
        SpatialRelation::Intersects
    }

    pub fn relate_circle(&self, other: &Circle, ctx: &SpatialContext) -> SpatialRelation {
        let d = ctx.distance(&self.center, &other.center);
        if d > self.radius + other.radius {
            SpatialRelation::Disjoint
        } else if d + other.radius <= self.radius {
            SpatialRelation::Contains
        } else if d + self.radius <= other.radius {
            SpatialRelation::Within
        } else {
            SpatialRelation::Intersects
        }
    }

    /// Relate against a delegate polygon.
    ///
    /// Polygons never cross the dateline, so on a geodetic context the disk
    /// is also tested from its copies shifted by a full turn. Each polygon
    /// part must fit inside a single copy to be contained.
    pub fn relate_polygon(&self, polygon: &Polygon, ctx: &SpatialContext) -> SpatialRelation {
        if self.bbox.relate_rectangle(&polygon.bounding_box(), ctx) == SpatialRelation::Disjoint {
            return SpatialRelation::Disjoint;
        }

        let cy = self.center.y();
        let centers = self.wrapped_center_xs(ctx);

        let touches = centers.iter().any(|&cx| {
            polygon.contains_xy(cx, cy) || polygon.boundary_distance(cx, cy) <= self.radius
        });
        if !touches {
            return SpatialRelation::Disjoint;
        }

        // A disk is convex: holding every vertex means holding every edge.
        let holds_part = |part: &geo_types::Polygon<f64>| {
            centers.iter().any(|&cx| {
                std::iter::once(part.exterior())
                    .chain(part.interiors())
                    .flat_map(|ring| ring.coords())
                    .all(|c| (c.x - cx).hypot(c.y - cy) <= self.radius)
            })
        };
        if polygon.geometry().0.iter().all(holds_part) {
            return SpatialRelation::Contains;
        }

        // A disk spilling over the dateline cannot sit inside one polygon.
        let cx = self.center.x();
        if !self.bbox.crosses_dateline()
            && polygon.contains_xy(cx, cy)
            && polygon.boundary_distance(cx, cy) >= self.radius
        {
            return SpatialRelation::Within;
        }
        SpatialRelation::Intersects
    }

    fn wrapped_center_xs(&self, ctx: &SpatialContext) -> Vec<f64> {
        let cx = self.center.x();
        if ctx.is_geo() {
            vec![cx, cx - 360.0, cx + 360.0]
        } else {
            vec![cx]
        }
    }
}

/// Bounding box clipped to the world on both axes; wraps instead on a
/// geodetic context.
fn bounding_box(center: Point, radius: f64, ctx: &SpatialContext) -> Rectangle {
    let world = ctx.world_bounds();
    let min_y = (center.y() - radius).max(world.min_y());
    let max_y = (center.y() + radius).min(world.max_y());

    if ctx.is_geo() {
        if radius >= 180.0 {
            return Rectangle::new_unchecked(-180.0, 180.0, min_y, max_y);
        }
        let min_x = ctx.normalize_x(center.x() - radius);
        let max_x = ctx.normalize_x(center.x() + radius);
        Rectangle::new_unchecked(min_x, max_x, min_y, max_y)
    } else {
        let min_x = (center.x() - radius).max(world.min_x());
        let max_x = (center.x() + radius).min(world.max_x());
        Rectangle::new_unchecked(min_x, max_x, min_y, max_y)
    }
}

impl PartialEq for Circle {
    fn eq(&self, other: &Self) -> bool {
        self.center == other.center && self.radius == other.radius
    }
}

impl Eq for Circle {}

impl Hash for Circle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.center.hash(state);
        canonical_bits(self.radius).hash(state);
    }
}

impl std::fmt::Display for Circle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BUFFER({}, {})", self.center, self.radius)
    }
}
