use anyhow::{anyhow, bail, Result};
use log::warn;
use serde_json::json;

/// A longitude/latitude pair (`x` = longitude, `y` = latitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn squared_distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.squared_distance(other).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn extend(&mut self, p: &Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// A polygon with one exterior ring and any number of holes.
/// Rings are stored as open or closed coordinate lists; both are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self { exterior, holes }
    }

    pub fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for p in &self.exterior {
            bbox.extend(p);
        }
        bbox
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        ring_contains(&self.exterior, p) && !self.holes.iter().any(|hole| ring_contains(hole, p))
    }

    /// Area-weighted centroid of the exterior ring, falling back to the
    /// vertex mean for degenerate rings.
    pub fn centroid(&self) -> Option<Point> {
        let ring = &self.exterior;
        if ring.is_empty() {
            return None;
        }
        let mut area = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            let cross = a.x * b.y - b.x * a.y;
            area += cross;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        if area.abs() < f64::EPSILON {
            let n = ring.len() as f64;
            let sx: f64 = ring.iter().map(|p| p.x).sum();
            let sy: f64 = ring.iter().map(|p| p.y).sum();
            return Some(Point::new(sx / n, sy / n));
        }
        area *= 0.5;
        Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
    }
}

// Even-odd ray casting.
fn ring_contains(ring: &[Point], p: &Point) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    MultiPoint(Vec<Point>),
    LineString(Vec<Point>),
    MultiLineString(Vec<Vec<Point>>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Point::new(x, y))
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(p) => !p.is_finite(),
            Geometry::MultiPoint(points) | Geometry::LineString(points) => points.is_empty(),
            Geometry::MultiLineString(lines) => lines.iter().all(Vec::is_empty),
            Geometry::Polygon(poly) => poly.exterior.is_empty(),
            Geometry::MultiPolygon(polys) => polys.iter().all(|p| p.exterior.is_empty()),
        }
    }

    /// The point used when a geometry has to be evaluated as a location.
    pub fn representative_point(&self) -> Option<Point> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::MultiPoint(points) | Geometry::LineString(points) => vertex_mean(points.iter()),
            Geometry::MultiLineString(lines) => vertex_mean(lines.iter().flatten()),
            Geometry::Polygon(poly) => poly.centroid(),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .max_by(|a, b| {
                    ring_area(&a.exterior)
                        .partial_cmp(&ring_area(&b.exterior))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .and_then(|p| p.centroid()),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            Geometry::Point(p) => {
                let mut bbox = BoundingBox::empty();
                bbox.extend(p);
                bbox
            }
            Geometry::MultiPoint(points) | Geometry::LineString(points) => {
                let mut bbox = BoundingBox::empty();
                points.iter().for_each(|p| bbox.extend(p));
                bbox
            }
            Geometry::MultiLineString(lines) => {
                let mut bbox = BoundingBox::empty();
                lines.iter().flatten().for_each(|p| bbox.extend(p));
                bbox
            }
            Geometry::Polygon(poly) => poly.bbox(),
            Geometry::MultiPolygon(polys) => {
                let mut bbox = BoundingBox::empty();
                for poly in polys {
                    bbox.merge(&poly.bbox());
                }
                bbox
            }
        }
    }

    /// Strict containment of a point. Points only contain themselves and
    /// lines contain nothing.
    pub fn contains_point(&self, p: &Point) -> bool {
        match self {
            Geometry::Point(q) => q == p,
            Geometry::MultiPoint(points) => points.contains(p),
            Geometry::LineString(_) | Geometry::MultiLineString(_) => false,
            Geometry::Polygon(poly) => poly.contains_point(p),
            Geometry::MultiPolygon(polys) => polys.iter().any(|poly| poly.contains_point(p)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    pub fn to_geojson(&self) -> serde_json::Value {
        match self {
            Geometry::Point(p) => json!({"type": "Point", "coordinates": [p.x, p.y]}),
            Geometry::MultiPoint(points) => json!({"type": "MultiPoint", "coordinates": positions(points)}),
            Geometry::LineString(points) => json!({"type": "LineString", "coordinates": positions(points)}),
            Geometry::MultiLineString(lines) => json!({
                "type": "MultiLineString",
                "coordinates": lines.iter().map(|l| positions(l)).collect::<Vec<_>>(),
            }),
            Geometry::Polygon(poly) => json!({"type": "Polygon", "coordinates": polygon_coords(poly)}),
            Geometry::MultiPolygon(polys) => json!({
                "type": "MultiPolygon",
                "coordinates": polys.iter().map(polygon_coords).collect::<Vec<_>>(),
            }),
        }
    }

    /// Parse a GeoJSON geometry object. `null` geometries and geometry
    /// collections yield `Ok(None)`.
    pub fn from_geojson(value: &serde_json::Value) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }
        let kind = value["type"]
            .as_str()
            .ok_or_else(|| anyhow!("GeoJSON geometry is missing a type"))?;
        let coords = &value["coordinates"];
        let geometry = match kind {
            "Point" => {
                let arr = coords.as_array().map(Vec::as_slice).unwrap_or(&[]);
                if arr.is_empty() {
                    return Ok(None);
                }
                Geometry::Point(parse_position(coords)?)
            }
            "MultiPoint" => Geometry::MultiPoint(parse_ring(coords)?),
            "LineString" => Geometry::LineString(parse_ring(coords)?),
            "MultiLineString" => {
                let lines = coords
                    .as_array()
                    .ok_or_else(|| anyhow!("MultiLineString coordinates must be an array"))?
                    .iter()
                    .map(parse_ring)
                    .collect::<Result<Vec<_>>>()?;
                Geometry::MultiLineString(lines)
            }
            "Polygon" => Geometry::Polygon(parse_polygon(coords)?),
            "GeometryCollection" => {
                warn!("Loading a GeometryCollection as missing geometry");
                return Ok(None);
            }
            "MultiPolygon" => {
                let polys = coords
                    .as_array()
                    .ok_or_else(|| anyhow!("MultiPolygon coordinates must be an array"))?
                    .iter()
                    .map(parse_polygon)
                    .collect::<Result<Vec<_>>>()?;
                Geometry::MultiPolygon(polys)
            }
            other => bail!("Unsupported GeoJSON geometry type: {}", other),
        };
        Ok(Some(geometry))
    }
}

fn ring_area(ring: &[Point]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        area += a.x * b.y - b.x * a.y;
    }
    (area * 0.5).abs()
}

fn vertex_mean<'a>(points: impl Iterator<Item = &'a Point>) -> Option<Point> {
    let (n, sx, sy) = points.fold((0usize, 0.0, 0.0), |(n, sx, sy), p| (n + 1, sx + p.x, sy + p.y));
    (n > 0).then(|| Point::new(sx / n as f64, sy / n as f64))
}

fn positions(points: &[Point]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

fn polygon_coords(poly: &Polygon) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(&poly.exterior)
        .chain(poly.holes.iter())
        .map(|ring| ring.iter().map(|p| [p.x, p.y]).collect())
        .collect()
}

fn parse_position(value: &serde_json::Value) -> Result<Point> {
    let arr = value
        .as_array()
        .ok_or_else(|| anyhow!("GeoJSON position must be an array"))?;
    if arr.len() < 2 {
        bail!("GeoJSON position needs at least two coordinates");
    }
    let x = arr[0].as_f64().ok_or_else(|| anyhow!("Non-numeric longitude"))?;
    let y = arr[1].as_f64().ok_or_else(|| anyhow!("Non-numeric latitude"))?;
    Ok(Point::new(x, y))
}

fn parse_ring(value: &serde_json::Value) -> Result<Vec<Point>> {
    value
        .as_array()
        .ok_or_else(|| anyhow!("GeoJSON ring must be an array"))?
        .iter()
        .map(parse_position)
        .collect()
}

fn parse_polygon(value: &serde_json::Value) -> Result<Polygon> {
    let rings = value
        .as_array()
        .ok_or_else(|| anyhow!("Polygon coordinates must be an array"))?;
    let mut parsed = rings.iter().map(parse_ring).collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        return Ok(Polygon::new(Vec::new(), Vec::new()));
    }
    let exterior = parsed.remove(0);
    Ok(Polygon::new(exterior, parsed))
}
