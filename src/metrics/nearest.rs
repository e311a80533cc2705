use super::{source_points, SpatialFunction};
use crate::frame::SociomeDataFrame;
use crate::spatial::{geodesic_distance, KdTree};
use crate::types::{Point, Value};
use anyhow::Result;
use log::debug;

/// Distance in metres to the nearest point of a source dataset, i.e. the
/// value of the Voronoi cell a location falls into.
pub struct SpatialVoronoiFunction {
    tree: KdTree,
}

impl SpatialVoronoiFunction {
    pub fn new(source: &SociomeDataFrame) -> Self {
        let (points, _) = source_points(source);
        debug!("Voronoi function over {} source points", points.len());
        Self {
            tree: KdTree::new(points),
        }
    }
}

impl SpatialFunction for SpatialVoronoiFunction {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn query(&self, point: &Point) -> Result<Value> {
        Ok(match self.tree.nearest(point) {
            Some((idx, _)) => Value::Number(geodesic_distance(point, &self.tree.point(idx))),
            None => Value::Null,
        })
    }
}
