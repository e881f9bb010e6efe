//! Spatial context: world bounds, geodetic flag, and shape factories.
//!
//! A [`SpatialContext`] is immutable once built and is shared by reference
//! (or behind an `Arc`) by every indexing and query operation. All shape
//! construction goes through it so coordinates are validated once, at the
//! boundary.

use crate::config::ContextConfig;
use crate::error::{Result, SpatialError};
use crate::shape::{Circle, Point, Polygon, Rectangle, Shape, SpatialRelation};
use geo_types::{Geometry, MultiPolygon};

const GEO_WORLD: [f64; 4] = [-180.0, 180.0, -90.0, 90.0];

/// World bounds plus shape factories.
///
/// A geodetic context (`is_geo`) treats x as longitude in `[-180, 180]` and
/// y as latitude in `[-90, 90]`; longitudes wrap at the dateline. A
/// cartesian context has arbitrary finite bounds and no wrap.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialContext {
    geo: bool,
    world: Rectangle,
}

impl SpatialContext {
    /// The geodetic (longitude/latitude) context.
    pub fn geo() -> Self {
        let [min_x, max_x, min_y, max_y] = GEO_WORLD;
        Self {
            geo: true,
            world: Rectangle::new_unchecked(min_x, max_x, min_y, max_y),
        }
    }

    /// A flat context with the given world bounds.
    pub fn cartesian(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Self> {
        if ![min_x, max_x, min_y, max_y].iter().all(|v| v.is_finite()) {
            return Err(SpatialError::config("world bounds must be finite"));
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(SpatialError::config(format!(
                "world bounds must have positive extent, got x [{}, {}] y [{}, {}]",
                min_x, max_x, min_y, max_y
            )));
        }
        Ok(Self {
            geo: false,
            world: Rectangle::new_unchecked(min_x, max_x, min_y, max_y),
        })
    }

    /// Rebuild a context from its persisted configuration.
    pub fn from_config(config: &ContextConfig) -> Result<Self> {
        match (config.geo, config.world) {
            (true, None) => Ok(Self::geo()),
            (true, Some(world)) if world == GEO_WORLD => Ok(Self::geo()),
            (true, Some(world)) => Err(SpatialError::config(format!(
                "geodetic context has fixed world bounds, got {:?}",
                world
            ))),
            (false, Some([min_x, max_x, min_y, max_y])) => {
                Self::cartesian(min_x, max_x, min_y, max_y)
            }
            (false, None) => Err(SpatialError::config(
                "cartesian context requires world bounds",
            )),
        }
    }

    pub fn to_config(&self) -> ContextConfig {
        if self.geo {
            ContextConfig::geo()
        } else {
            ContextConfig::cartesian([
                self.world.min_x(),
                self.world.max_x(),
                self.world.min_y(),
                self.world.max_y(),
            ])
        }
    }

    pub fn is_geo(&self) -> bool {
        self.geo
    }

    pub fn world_bounds(&self) -> Rectangle {
        self.world
    }

    // ========================================================================
    // Factories
    // ========================================================================

    pub fn make_point(&self, x: f64, y: f64) -> Result<Point> {
        self.check_xy(x, y)?;
        Ok(Point::new_unchecked(x, y))
    }

    /// Build a rectangle. On a geodetic context `min_x > max_x` denotes a
    /// rectangle crossing the dateline; elsewhere it is an error.
    pub fn make_rectangle(&self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Rectangle> {
        self.check_xy(min_x, min_y)?;
        self.check_xy(max_x, max_y)?;
        if min_y > max_y {
            return Err(SpatialError::invalid_shape(format!(
                "min_y {} > max_y {}",
                min_y, max_y
            )));
        }
        if min_x > max_x && !self.geo {
            return Err(SpatialError::invalid_shape(format!(
                "min_x {} > max_x {}",
                min_x, max_x
            )));
        }
        Ok(Rectangle::new_unchecked(min_x, max_x, min_y, max_y))
    }

    pub fn make_circle(&self, x: f64, y: f64, radius: f64) -> Result<Circle> {
        let center = self.make_point(x, y)?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(SpatialError::invalid_shape(format!(
                "circle radius must be finite and >= 0, got {}",
                radius
            )));
        }
        Ok(Circle::new_unchecked(center, radius, self))
    }

    /// Wrap a delegate multipolygon after validating every vertex.
    pub fn make_polygon(&self, geom: MultiPolygon<f64>) -> Result<Polygon> {
        let mut vertices = 0usize;
        for poly in &geom.0 {
            for coord in std::iter::once(poly.exterior())
                .chain(poly.interiors())
                .flat_map(|ring| ring.coords())
            {
                self.check_xy(coord.x, coord.y)?;
                vertices += 1;
            }
            if poly.exterior().0.len() < 4 {
                return Err(SpatialError::invalid_shape(
                    "polygon exterior ring needs at least 4 coordinates",
                ));
            }
        }
        if vertices == 0 {
            return Err(SpatialError::invalid_shape("empty polygon"));
        }
        Polygon::from_geo(geom)
    }

    fn check_xy(&self, x: f64, y: f64) -> Result<()> {
        if !x.is_finite() || !y.is_finite() {
            return Err(SpatialError::invalid_shape(format!(
                "non-finite coordinate ({}, {})",
                x, y
            )));
        }
        let w = &self.world;
        if x < w.min_x() || x > w.max_x() || y < w.min_y() || y > w.max_y() {
            return Err(SpatialError::invalid_shape(format!(
                "coordinate ({}, {}) outside world bounds {}",
                x, y, w
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Read a shape from WKT, or the `ENVELOPE(minX, maxX, maxY, minY)` and
    /// `BUFFER(POINT(x y), d)` extensions.
    pub fn read_shape(&self, text: &str) -> Result<Shape> {
        let text = text.trim();
        if let Some(body) = strip_function(text, "ENVELOPE") {
            let v = parse_numbers(body, 4)?;
            return Ok(self.make_rectangle(v[0], v[1], v[3], v[2])?.into());
        }
        if let Some(body) = strip_function(text, "BUFFER") {
            let (point, distance) = body
                .rsplit_once(',')
                .ok_or_else(|| SpatialError::WktParse(format!("malformed BUFFER: {}", text)))?;
            let distance = parse_numbers(distance, 1)?[0];
            return match self.read_shape(point)? {
                Shape::Point(p) => Ok(self.make_circle(p.x(), p.y(), distance)?.into()),
                other => Err(SpatialError::UnsupportedShape(format!(
                    "BUFFER of {:?}",
                    other.kind()
                ))),
            };
        }

        match parse_wkt(text)? {
            Geometry::Point(p) => Ok(self.make_point(p.x(), p.y())?.into()),
            Geometry::Rect(r) => Ok(self
                .make_rectangle(r.min().x, r.max().x, r.min().y, r.max().y)?
                .into()),
            Geometry::Polygon(p) => Ok(self.make_polygon(MultiPolygon::new(vec![p]))?.into()),
            Geometry::MultiPolygon(mp) => Ok(self.make_polygon(mp)?.into()),
            other => Err(SpatialError::UnsupportedShape(geometry_name(&other).to_string())),
        }
    }

    // ========================================================================
    // Geometry helpers
    // ========================================================================

    /// Relationship of `a` to `b` in this context.
    pub fn relate(&self, a: &Shape, b: &Shape) -> SpatialRelation {
        a.relate(b, self)
    }

    /// Planar distance in coordinate units, taking the short way around the
    /// dateline on a geodetic context.
    pub fn distance(&self, a: &Point, b: &Point) -> f64 {
        self.x_delta(a.x(), b.x()).hypot(a.y() - b.y())
    }

    /// Absolute x separation, wrap-aware on a geodetic context.
    pub fn x_delta(&self, a: f64, b: f64) -> f64 {
        let d = (a - b).abs();
        if self.geo {
            let d = d % 360.0;
            d.min(360.0 - d)
        } else {
            d
        }
    }

    /// Bring a longitude back into `[-180, 180]`. Identity on cartesian contexts.
    pub fn normalize_x(&self, x: f64) -> f64 {
        if !self.geo || (-180.0..=180.0).contains(&x) {
            x
        } else {
            (x + 180.0).rem_euclid(360.0) - 180.0
        }
    }
}

/// Parse WKT into a `geo_types` geometry.
fn parse_wkt(wkt: &str) -> Result<Geometry<f64>> {
    use std::str::FromStr;
    wkt::Wkt::from_str(wkt)
        .map_err(|e| SpatialError::WktParse(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| SpatialError::WktParse(format!("{:?}", e)))
        })
}

fn geometry_name(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// `NAME( body )` → `body`, case-insensitive on the name.
fn strip_function<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let head = text.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    text[name.len()..]
        .trim_start()
        .strip_prefix('(')?
        .trim_end()
        .strip_suffix(')')
}

fn parse_numbers(body: &str, expected: usize) -> Result<Vec<f64>> {
    let values = body
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .map_err(|e| SpatialError::WktParse(format!("bad number {:?}: {}", s.trim(), e)))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != expected {
        return Err(SpatialError::WktParse(format!(
            "expected {} numbers, got {}",
            expected,
            values.len()
        )));
    }
    Ok(values)
}
