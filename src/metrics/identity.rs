use super::{metric_frame, SpatialFunction};
use crate::frame::SociomeDataFrame;
use crate::types::{Geometry, Point, Value};
use anyhow::{bail, Result};

/// Copies a column across two frames whose rows share geometry.
pub struct SpatialIdentityFunction {
    entries: Vec<(Geometry, Value)>,
}

impl SpatialIdentityFunction {
    pub fn new(source: &SociomeDataFrame, metric_col: &str) -> Result<Self> {
        let values = source.require_column(metric_col)?;
        let entries = source
            .geometry
            .iter()
            .zip(values)
            .filter_map(|(g, v)| g.clone().map(|g| (g, v.clone())))
            .collect();
        Ok(Self { entries })
    }

    fn lookup(&self, geometry: &Geometry) -> Value {
        self.entries
            .iter()
            .find(|(g, _)| g == geometry)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null)
    }
}

impl SpatialFunction for SpatialIdentityFunction {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn query(&self, _point: &Point) -> Result<Value> {
        bail!("Identity functions are only defined on frames sharing geometry with the source")
    }

    fn eval(&self, target: &SociomeDataFrame) -> Result<SociomeDataFrame> {
        let index = PointIndex::new(&self.entries);
        let values = target
            .geometry
            .iter()
            .map(|g| match g {
                Some(Geometry::Point(p)) => index.get(p).map(|i| self.entries[i].1.clone()).unwrap_or(Value::Null),
                Some(other) => self.lookup(other),
                None => Value::Null,
            })
            .collect();
        metric_frame(target, values)
    }
}

/// Exact-coordinate lookup for point geometries.
struct PointIndex(std::collections::HashMap<(u64, u64), usize>);

impl PointIndex {
    fn new(entries: &[(Geometry, Value)]) -> Self {
        let mut map = std::collections::HashMap::with_capacity(entries.len());
        for (i, (g, _)) in entries.iter().enumerate() {
            if let Geometry::Point(p) = g {
                map.entry(Self::key(p)).or_insert(i);
            }
        }
        Self(map)
    }

    fn key(p: &Point) -> (u64, u64) {
        // Normalise -0.0 so it matches 0.0.
        ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
    }

    fn get(&self, p: &Point) -> Option<usize> {
        self.0.get(&Self::key(p)).copied()
    }
}
