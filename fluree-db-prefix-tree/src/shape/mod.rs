//! Shape model.
//!
//! A closed set of immutable shape variants. Points, rectangles and circles
//! are computed here; polygons delegate exact algebra to the `geo` crate.
//! Every relate is evaluated against a [`SpatialContext`], which decides
//! whether longitudes wrap at the dateline.

mod circle;
mod point;
mod polygon;
mod rectangle;
mod relation;

pub use circle::Circle;
pub use point::Point;
pub use polygon::Polygon;
pub use rectangle::Rectangle;
pub use relation::SpatialRelation;

use crate::context::SpatialContext;

/// Kind discriminator, useful for statistics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Point,
    Rectangle,
    Circle,
    Polygon,
}

/// A geometric value that can be indexed or queried.
///
/// Shapes are equal when they are the same variant with the same defining
/// coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Point(Point),
    Rectangle(Rectangle),
    Circle(Circle),
    Polygon(Polygon),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point(_) => ShapeKind::Point,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Relationship of `self` to `other`.
    pub fn relate(&self, other: &Shape, ctx: &SpatialContext) -> SpatialRelation {
        match (self, other) {
            (Shape::Point(a), Shape::Point(b)) => a.relate_point(b),
            (Shape::Point(p), Shape::Rectangle(r)) => p.relate_rectangle(r, ctx),
            (Shape::Point(_), _) => other.relate(self, ctx).transpose(),

            (Shape::Rectangle(r), Shape::Point(p)) => r.relate_point(p, ctx),
            (Shape::Rectangle(a), Shape::Rectangle(b)) => a.relate_rectangle(b, ctx),
            (Shape::Rectangle(r), Shape::Circle(c)) => c.relate_rectangle(r, ctx).transpose(),
            (Shape::Rectangle(r), Shape::Polygon(p)) => p.relate_rectangle(r, ctx).transpose(),

            (Shape::Circle(c), Shape::Point(p)) => c.relate_point(p, ctx),
            (Shape::Circle(c), Shape::Rectangle(r)) => c.relate_rectangle(r, ctx),
            (Shape::Circle(a), Shape::Circle(b)) => a.relate_circle(b, ctx),
            (Shape::Circle(c), Shape::Polygon(p)) => c.relate_polygon(p, ctx),

            (Shape::Polygon(p), Shape::Point(pt)) => p.relate_point(pt),
            (Shape::Polygon(p), Shape::Rectangle(r)) => p.relate_rectangle(r, ctx),
            (Shape::Polygon(p), Shape::Circle(c)) => c.relate_polygon(p, ctx).transpose(),
            (Shape::Polygon(a), Shape::Polygon(b)) => a.relate_polygon(b, ctx),
        }
    }

    /// Relationship of `self` to a rectangle region (e.g. a grid cell).
    pub fn relate_rectangle(&self, rect: &Rectangle, ctx: &SpatialContext) -> SpatialRelation {
        match self {
            Shape::Point(p) => p.relate_rectangle(rect, ctx),
            Shape::Rectangle(r) => r.relate_rectangle(rect, ctx),
            Shape::Circle(c) => c.relate_rectangle(rect, ctx),
            Shape::Polygon(p) => p.relate_rectangle(rect, ctx),
        }
    }

    pub fn bounding_box(&self) -> Rectangle {
        match self {
            Shape::Point(p) => Rectangle::new_unchecked(p.x(), p.x(), p.y(), p.y()),
            Shape::Rectangle(r) => *r,
            Shape::Circle(c) => c.bounding_box(),
            Shape::Polygon(p) => p.bounding_box(),
        }
    }

    /// False for points and other zero-area shapes.
    pub fn has_area(&self) -> bool {
        match self {
            Shape::Point(_) => false,
            Shape::Rectangle(r) => r.has_area(),
            Shape::Circle(c) => c.has_area(),
            Shape::Polygon(p) => p.has_area(),
        }
    }

    pub fn center(&self) -> Point {
        match self {
            Shape::Point(p) => *p,
            Shape::Rectangle(r) => r.center(),
            Shape::Circle(c) => c.center(),
            Shape::Polygon(p) => p.center(),
        }
    }
}

impl From<Point> for Shape {
    fn from(p: Point) -> Self {
        Shape::Point(p)
    }
}

impl From<Rectangle> for Shape {
    fn from(r: Rectangle) -> Self {
        Shape::Rectangle(r)
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Shape::Polygon(p)
    }
}

/// Bits for hashing, with `-0.0` folded onto `0.0` to agree with `==`.
pub(crate) fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

/// Planar distance from a coordinate to a segment.
pub(crate) fn segment_distance(x: f64, y: f64, line: geo_types::Line<f64>) -> f64 {
    let (x1, y1) = (line.start.x, line.start.y);
    let (dx, dy) = (line.end.x - x1, line.end.y - y1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((x - x1) * dx + (y - y1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    (x - (x1 + t * dx)).hypot(y - (y1 + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_relate_is_antisymmetric() {
        let ctx = SpatialContext::geo();
        let shapes: Vec<Shape> = vec![
            ctx.make_point(1.0, 1.0).unwrap().into(),
            ctx.make_rectangle(0.0, 10.0, 0.0, 10.0).unwrap().into(),
            ctx.make_rectangle(5.0, 20.0, 5.0, 20.0).unwrap().into(),
            ctx.make_circle(2.0, 2.0, 1.0).unwrap().into(),
            ctx.read_shape("POLYGON((-5 -5, 30 -5, 30 30, -5 30, -5 -5))")
                .unwrap(),
        ];

        for a in &shapes {
            for b in &shapes {
                let ab = a.relate(b, &ctx);
                let ba = b.relate(a, &ctx);
                if a == b {
                    assert_eq!(ab, SpatialRelation::Contains);
                } else {
                    assert_eq!(ab, ba.transpose(), "{:?} vs {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_point_relations() {
        let ctx = SpatialContext::geo();
        let p: Shape = ctx.make_point(5.0, 5.0).unwrap().into();
        let rect: Shape = ctx.make_rectangle(0.0, 10.0, 0.0, 10.0).unwrap().into();
        let far: Shape = ctx.make_point(50.0, 5.0).unwrap().into();

        assert_eq!(p.relate(&rect, &ctx), SpatialRelation::Within);
        assert_eq!(rect.relate(&p, &ctx), SpatialRelation::Contains);
        assert_eq!(p.relate(&far, &ctx), SpatialRelation::Disjoint);
        assert!(!p.has_area());
        assert!(rect.has_area());
    }

    #[test]
    fn test_point_vs_degenerate_rectangle() {
        let ctx = SpatialContext::geo();
        let p: Shape = ctx.make_point(5.0, 5.0).unwrap().into();
        let same: Shape = ctx.make_rectangle(5.0, 5.0, 5.0, 5.0).unwrap().into();
        let segment: Shape = ctx.make_rectangle(5.0, 5.0, 0.0, 10.0).unwrap().into();
        let elsewhere: Shape = ctx.make_rectangle(6.0, 6.0, 5.0, 5.0).unwrap().into();

        assert_eq!(p.relate(&same, &ctx), SpatialRelation::Contains);
        assert_eq!(same.relate(&p, &ctx), SpatialRelation::Contains);
        assert_eq!(p.relate_rectangle(&same.bounding_box(), &ctx), SpatialRelation::Contains);

        assert_eq!(p.relate(&segment, &ctx), SpatialRelation::Within);
        assert_eq!(segment.relate(&p, &ctx), SpatialRelation::Contains);
        assert_eq!(p.relate(&elsewhere, &ctx), SpatialRelation::Disjoint);
    }

    #[test]
    fn test_bounding_box_and_center() {
        let ctx = SpatialContext::geo();
        let circle: Shape = ctx.make_circle(10.0, 20.0, 5.0).unwrap().into();
        let bbox = circle.bounding_box();
        assert_eq!(bbox.min_x(), 5.0);
        assert_eq!(bbox.max_x(), 15.0);
        assert_eq!(bbox.min_y(), 15.0);
        assert_eq!(bbox.max_y(), 25.0);
        assert_eq!(circle.center(), ctx.make_point(10.0, 20.0).unwrap());
    }

    #[test]
    fn test_equality_and_hash_by_coordinates() {
        let ctx = SpatialContext::geo();
        let a: Shape = ctx.make_rectangle(0.0, 1.0, 0.0, 1.0).unwrap().into();
        let b: Shape = ctx.read_shape("ENVELOPE(0, 1, 1, 0)").unwrap();
        let zero: Shape = ctx.make_point(0.0, 0.0).unwrap().into();
        let neg_zero: Shape = ctx.make_point(-0.0, 0.0).unwrap().into();

        assert_eq!(a, b);
        assert_eq!(zero, neg_zero);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        set.insert(zero);
        set.insert(neg_zero);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_segment_distance() {
        let line = geo_types::Line::new(
            geo_types::Coord { x: 0.0, y: 0.0 },
            geo_types::Coord { x: 10.0, y: 0.0 },
        );
        assert_eq!(segment_distance(5.0, 3.0, line), 3.0);
        assert_eq!(segment_distance(-4.0, 3.0, line), 5.0);
    }
}
