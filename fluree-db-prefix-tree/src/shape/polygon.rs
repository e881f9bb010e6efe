//! Polygon shape backed by the `geo` crate.
//!
//! Exact polygon algebra (point-in-polygon, DE-9IM relate) is delegated to
//! `geo`; this module only adapts its answers to [`SpatialRelation`].
//! Polygons must not cross the dateline; wrapping rectangles are split
//! before being handed to the delegate.

use super::{canonical_bits, segment_distance, Point, Rectangle, SpatialRelation};
use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use geo::{Area, BoundingRect, Centroid, Intersects, Relate};
use geo_types::{Coord, Line, MultiPolygon};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Polygonal shape (one or more polygons, with holes).
///
/// The delegate geometry sits behind an `Arc`, so clones are cheap and the
/// shape can be shared across threads.
#[derive(Debug, Clone)]
pub struct Polygon {
    geom: Arc<MultiPolygon<f64>>,
    bbox: Rectangle,
    area: f64,
}

impl Polygon {
    /// Wrap an already validated delegate geometry.
    pub(crate) fn from_geo(geom: MultiPolygon<f64>) -> Result<Self> {
        let rect = geom
            .bounding_rect()
            .ok_or_else(|| SpatialError::invalid_shape("empty polygon"))?;
        let bbox = Rectangle::new_unchecked(rect.min().x, rect.max().x, rect.min().y, rect.max().y);
        let area = geom.unsigned_area();
        Ok(Self {
            geom: Arc::new(geom),
            bbox,
            area,
        })
    }

    /// The delegate geometry.
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geom
    }

    pub fn bounding_box(&self) -> Rectangle {
        self.bbox
    }

    pub fn has_area(&self) -> bool {
        self.area > 0.0
    }

    /// Centroid, falling back to the bbox center for degenerate input.
    pub fn center(&self) -> Point {
        match self.geom.centroid() {
            Some(c) => Point::new_unchecked(c.x(), c.y()),
            None => self.bbox.center(),
        }
    }

    /// Closed point-in-polygon test.
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.geom.intersects(&geo_types::Point::new(x, y))
    }

    /// Planar distance from a coordinate to the nearest ring segment.
    pub fn boundary_distance(&self, x: f64, y: f64) -> f64 {
        self.rings()
            .flat_map(|ring| ring.lines())
            .map(|line| segment_distance(x, y, line))
            .fold(f64::INFINITY, f64::min)
    }

    /// Every ring vertex, exterior and interior.
    pub fn vertices(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.rings().flat_map(|ring| ring.coords().map(|c| (c.x, c.y)))
    }

    fn rings(&self) -> impl Iterator<Item = &geo_types::LineString<f64>> + '_ {
        self.geom
            .0
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors().iter()))
    }

    pub fn relate_point(&self, point: &Point) -> SpatialRelation {
        if self.geom.intersects(&point.to_geo()) {
            SpatialRelation::Contains
        } else {
            SpatialRelation::Disjoint
        }
    }

    pub fn relate_rectangle(&self, rect: &Rectangle, ctx: &SpatialContext) -> SpatialRelation {
        if self.bbox.relate_rectangle(rect, ctx) == SpatialRelation::Disjoint {
            return SpatialRelation::Disjoint;
        }

        let (first, second) = rect.split_at_dateline();
        if second.is_none() && !first.has_area() {
            // Degenerate rectangle: relate as a point or a segment.
            let min = Coord {
                x: first.min_x(),
                y: first.min_y(),
            };
            let max = Coord {
                x: first.max_x(),
                y: first.max_y(),
            };
            if min == max {
                return self.relate_point(&Point::new_unchecked(min.x, min.y));
            }
            return relation_from_matrix(self.geom.relate(&Line::new(min, max)));
        }

        let parts: Vec<geo_types::Polygon<f64>> = std::iter::once(first)
            .chain(second)
            .map(rectangle_to_geo)
            .collect();
        relation_from_matrix(self.geom.relate(&MultiPolygon::new(parts)))
    }

    pub fn relate_polygon(&self, other: &Polygon, ctx: &SpatialContext) -> SpatialRelation {
        if self.bbox.relate_rectangle(&other.bbox, ctx) == SpatialRelation::Disjoint {
            return SpatialRelation::Disjoint;
        }
        relation_from_matrix(self.geom.relate(other.geom.as_ref()))
    }
}

fn rectangle_to_geo(rect: Rectangle) -> geo_types::Polygon<f64> {
    geo_types::Rect::new(
        Coord {
            x: rect.min_x(),
            y: rect.min_y(),
        },
        Coord {
            x: rect.max_x(),
            y: rect.max_y(),
        },
    )
    .to_polygon()
}

/// Collapse a DE-9IM matrix into a [`SpatialRelation`]. Equal geometries
/// satisfy both contains and within; `Contains` wins.
fn relation_from_matrix(matrix: geo::relate::IntersectionMatrix) -> SpatialRelation {
    if !matrix.is_intersects() {
        SpatialRelation::Disjoint
    } else if matrix.is_contains() {
        SpatialRelation::Contains
    } else if matrix.is_within() {
        SpatialRelation::Within
    } else {
        SpatialRelation::Intersects
    }
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.geom, &other.geom) || self.geom == other.geom
    }
}

impl Eq for Polygon {}

impl Hash for Polygon {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (x, y) in self.vertices() {
            canonical_bits(x).hash(state);
            canonical_bits(y).hash(state);
        }
    }
}
