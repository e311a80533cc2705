//! Spatial functions: socio-environmental metrics defined at every
//! longitude/latitude, e.g. the distance to the nearest park or the number
//! of liquor stores within a kilometre.
//!
//! Every function can be evaluated against any `SociomeDataFrame`; the
//! result is a frame with the target geometry and a `metric` column.

pub mod density;
pub mod identity;
pub mod interpolation;
pub mod nearest;
pub mod subdivision;

pub use density::SpatialDensityFunction;
pub use identity::SpatialIdentityFunction;
pub use interpolation::{InterpolationParams, SpatialInterpolationFunction};
pub use nearest::SpatialVoronoiFunction;
pub use subdivision::SpatialSubdivisionFunction;

use crate::frame::SociomeDataFrame;
use crate::performance::parallel_map;
use crate::types::{Point, Value};
use anyhow::Result;

pub trait SpatialFunction: Sync {
    fn name(&self) -> &'static str;

    /// Value of the function at a single point.
    fn query(&self, point: &Point) -> Result<Value>;

    /// Evaluate the function at every row of `target`.
    fn eval(&self, target: &SociomeDataFrame) -> Result<SociomeDataFrame> {
        let points = target.representative_points();
        let values = parallel_map(&points, |p| match p {
            Some(p) => self.query(p),
            None => Ok(Value::Null),
        })?;
        metric_frame(target, values)
    }
}

/// Frame with the target's geometry and the evaluated `metric` column.
pub fn metric_frame(target: &SociomeDataFrame, values: Vec<Value>) -> Result<SociomeDataFrame> {
    let mut out = target.geometry_frame();
    out.set_column(SociomeDataFrame::METRIC_KEY, values)?;
    Ok(out)
}

/// Locations of the rows of `source` that have geometry, together with the
/// row each location came from.
pub(crate) fn source_points(source: &SociomeDataFrame) -> (Vec<Point>, Vec<usize>) {
    let mut points = Vec::with_capacity(source.len());
    let mut rows = Vec::with_capacity(source.len());
    for (row, p) in source.representative_points().into_iter().enumerate() {
        if let Some(p) = p.filter(Point::is_finite) {
            points.push(p);
            rows.push(row);
        }
    }
    (points, rows)
}
