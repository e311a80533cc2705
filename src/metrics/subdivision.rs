use super::{metric_frame, SpatialFunction};
use crate::frame::SociomeDataFrame;
use crate::types::{Point, Value};
use anyhow::{bail, Result};
use std::collections::HashMap;

/// Extends an aggregate defined per subdivision (a tract, a zip code) to
/// every location carrying that subdivision.
pub struct SpatialSubdivisionFunction {
    subdivision: String,
    lookup: HashMap<String, Value>,
}

impl SpatialSubdivisionFunction {
    /// `subdivision_right` names the key column in `source`; it defaults to
    /// `subdivision`, the key column on the frames being evaluated.
    pub fn new(
        source: &SociomeDataFrame,
        subdivision: &str,
        agg: &str,
        subdivision_right: Option<&str>,
    ) -> Result<Self> {
        let right = subdivision_right.unwrap_or(subdivision);
        let keys = source.require_column(right)?;
        let values = source.require_column(agg)?;

        let mut lookup = HashMap::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            if let Some(k) = key.key_string() {
                lookup.entry(k).or_insert_with(|| value.clone());
            }
        }
        Ok(Self {
            subdivision: subdivision.to_string(),
            lookup,
        })
    }
}

impl SpatialFunction for SpatialSubdivisionFunction {
    fn name(&self) -> &'static str {
        "subdivision"
    }

    fn query(&self, _point: &Point) -> Result<Value> {
        bail!("Subdivision functions are only defined on frames carrying the subdivision column")
    }

    fn eval(&self, target: &SociomeDataFrame) -> Result<SociomeDataFrame> {
        let keys = target.require_column(&self.subdivision)?;
        let values = keys
            .iter()
            .map(|k| {
                k.key_string()
                    .and_then(|k| self.lookup.get(&k).cloned())
                    .unwrap_or(Value::Null)
            })
            .collect();
        metric_frame(target, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::points;

    #[test]
    fn maps_tract_aggregate_to_locations() {
        let mut acs = SociomeDataFrame::from_geometry(vec![None, None]);
        acs.set_column("GEOID", vec!["a".into(), "b".into()]).unwrap();
        acs.set_column("poverty", vec![Value::from(0.1), Value::from(0.4)]).unwrap();

        let mut homes = points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        homes.set_column("tract", vec!["b".into(), Value::Null, "a".into()]).unwrap();

        let f = SpatialSubdivisionFunction::new(&acs, "tract", "poverty", Some("GEOID")).unwrap();
        assert!(f.query(&Point::new(0.0, 0.0)).is_err());
        let out = f.eval(&homes).unwrap();
        assert_eq!(
            out.column("metric").unwrap(),
            &[Value::from(0.4), Value::Null, Value::from(0.1)]
        );
    }
}
