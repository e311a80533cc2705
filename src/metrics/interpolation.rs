use super::{source_points, SpatialFunction};
use crate::frame::SociomeDataFrame;
use crate::spatial::KdTree;
use crate::types::{Point, Value};
use anyhow::{bail, Result};
use log::debug;

#[derive(Debug, Clone, Copy)]
pub struct InterpolationParams {
    /// Kernel smoothing, in squared degrees.
    pub sigma2: f64,
    /// Kernel weight below which neighbours are ignored.
    pub precision: f64,
}

impl Default for InterpolationParams {
    fn default() -> Self {
        Self {
            sigma2: 8e-3,
            precision: 1e-6,
        }
    }
}

/// Gaussian-kernel interpolation of a measurement sampled at points.
///
/// The value at `x` is `Σ exp(-‖p − x‖² / sigma2) · f(p)` over the sample
/// points `p` within `-ln(precision) · sigma2` of `x`. The sum is not
/// normalised by the kernel mass. Locations with no sample point in range
/// are `Null`.
pub struct SpatialInterpolationFunction {
    tree: KdTree,
    values: Vec<f64>,
    sigma2: f64,
    bandwidth: f64,
}

impl SpatialInterpolationFunction {
    pub fn new(source: &SociomeDataFrame, metric_col: &str, params: InterpolationParams) -> Result<Self> {
        if !(params.sigma2 > 0.0) {
            bail!("sigma2 must be positive, got {}", params.sigma2);
        }
        if !(params.precision > 0.0 && params.precision < 1.0) {
            bail!("precision must lie in (0, 1), got {}", params.precision);
        }

        let column = source.numeric_column(metric_col)?;
        let (all_points, rows) = source_points(source);

        // Samples without a numeric measurement are left out of the kernel.
        let mut points = Vec::with_capacity(all_points.len());
        let mut values = Vec::with_capacity(all_points.len());
        for (p, row) in all_points.into_iter().zip(rows) {
            if column[row].is_finite() {
                points.push(p);
                values.push(column[row]);
            }
        }
        debug!("Interpolating '{}' from {} samples", metric_col, points.len());

        Ok(Self {
            tree: KdTree::new(points),
            values,
            sigma2: params.sigma2,
            bandwidth: -params.precision.ln() * params.sigma2,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

impl SpatialFunction for SpatialInterpolationFunction {
    fn name(&self) -> &'static str {
        "interpolate"
    }

    fn query(&self, point: &Point) -> Result<Value> {
        let neighbours = self.tree.within_radius(point, self.bandwidth);
        if neighbours.is_empty() {
            return Ok(Value::Null);
        }
        let total: f64 = neighbours
            .iter()
            .map(|&i| (-self.tree.point(i).squared_distance(point) / self.sigma2).exp() * self.values[i])
            .sum();
        Ok(Value::Number(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::points;

    fn sensors() -> SociomeDataFrame {
        let mut frame = points(&[(0.0, 0.0), (0.05, 0.0), (5.0, 5.0)]);
        frame
            .set_column("pm25", vec![Value::from(10.0), Value::from(20.0), Value::Null])
            .unwrap();
        frame
    }

    #[test]
    fn kernel_sum_at_sample_point() {
        let f = SpatialInterpolationFunction::new(&sensors(), "pm25", InterpolationParams::default()).unwrap();
        let value = f.query(&Point::new(0.0, 0.0)).unwrap().as_f64().unwrap();
        let expected = 10.0 + 20.0 * (-0.0025f64 / 8e-3).exp();
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn far_locations_and_missing_samples_are_null() {
        let f = SpatialInterpolationFunction::new(&sensors(), "pm25", InterpolationParams::default()).unwrap();
        // The only sample near (5, 5) has no measurement.
        assert_eq!(f.query(&Point::new(5.0, 5.0)).unwrap(), Value::Null);
        assert!((f.bandwidth() - 13.815510557964274 * 8e-3).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_parameters() {
        let params = InterpolationParams {
            sigma2: 0.0,
            ..InterpolationParams::default()
        };
        assert!(SpatialInterpolationFunction::new(&sensors(), "pm25", params).is_err());
    }
}
