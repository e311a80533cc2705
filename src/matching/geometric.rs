use super::{add_column, combine_rows};
use crate::frame::SociomeDataFrame;
use crate::metrics::source_points;
use crate::performance::Timer;
use crate::spatial::KdTree;
use crate::types::Value;
use anyhow::{bail, Result};
use log::info;

pub const DEFAULT_DISTANCE_THRESH: f64 = 1e-4;
pub const INDEX_RIGHT: &str = "index_right";

/// Joins each row of one frame to the nearest row of another, provided the
/// two are within `distance_thresh` (coordinate units; 1e-4 degrees is the
/// fourth decimal place). Rows without a partner are dropped.
#[derive(Debug, Clone)]
pub struct GeometricMatcher {
    pub distance_thresh: f64,
}

impl Default for GeometricMatcher {
    fn default() -> Self {
        Self {
            distance_thresh: DEFAULT_DISTANCE_THRESH,
        }
    }
}

impl GeometricMatcher {
    pub fn new(distance_thresh: f64) -> Result<Self> {
        if !(distance_thresh.is_finite() && distance_thresh >= 0.0) {
            bail!("Distance threshold must be a non-negative number, got {}", distance_thresh);
        }
        Ok(Self { distance_thresh })
    }

    pub fn match_frames(&self, left: &SociomeDataFrame, right: &SociomeDataFrame) -> Result<SociomeDataFrame> {
        let timer = Timer::new("[GeometricMatcher] match");
        let (points, rows) = source_points(right);
        let tree = KdTree::new(points);

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        for (row, p) in left.representative_points().into_iter().enumerate() {
            let Some(p) = p else { continue };
            if let Some((idx, dist)) = tree.nearest(&p) {
                if dist <= self.distance_thresh {
                    left_rows.push(row);
                    right_rows.push(rows[idx]);
                }
            }
        }
        info!(
            "[GeometricMatcher] Matched {} of {} rows within {}",
            left_rows.len(),
            left.len(),
            self.distance_thresh
        );

        let mut out = combine_rows(left, &left_rows, right, &right_rows)?;
        add_column(
            &mut out,
            INDEX_RIGHT.to_string(),
            right_rows.iter().map(|&r| Value::Number(r as f64)).collect(),
        )?;
        timer.finish();
        Ok(out)
    }
}
