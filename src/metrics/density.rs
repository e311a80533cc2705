use super::{source_points, SpatialFunction};
use crate::frame::SociomeDataFrame;
use crate::spatial::{KdTree, METERS_PER_DEGREE};
use crate::types::{Point, Value};
use anyhow::{bail, Result};

pub const DEFAULT_RADIUS_M: f64 = 1000.0;

/// Number of source points within a fixed radius of a location.
pub struct SpatialDensityFunction {
    tree: KdTree,
    bandwidth: f64,
}

impl SpatialDensityFunction {
    /// `radius_m` is converted to degrees with a flat metres-per-degree
    /// factor, so the neighbourhood is a circle in coordinate space.
    pub fn new(source: &SociomeDataFrame, radius_m: f64) -> Result<Self> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            bail!("Density radius must be a positive number of metres, got {}", radius_m);
        }
        let (points, _) = source_points(source);
        Ok(Self {
            tree: KdTree::new(points),
            bandwidth: radius_m / METERS_PER_DEGREE,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

impl SpatialFunction for SpatialDensityFunction {
    fn name(&self) -> &'static str {
        "density"
    }

    fn query(&self, point: &Point) -> Result<Value> {
        Ok(Value::Number(self.tree.within_radius(point, self.bandwidth).len() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::points;

    #[test]
    fn counts_points_inside_radius() {
        let stores = points(&[(0.0, 0.0), (0.005, 0.0), (0.02, 0.0)]);
        let f = SpatialDensityFunction::new(&stores, DEFAULT_RADIUS_M).unwrap();
        assert_eq!(f.query(&Point::new(0.0, 0.0)).unwrap(), Value::Number(2.0));
        assert_eq!(f.query(&Point::new(1.0, 1.0)).unwrap(), Value::Number(0.0));
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert!(SpatialDensityFunction::new(&SociomeDataFrame::new(), 0.0).is_err());
    }
}
