use super::SociomeDataFrame;
use crate::performance::Timer;
use crate::spatial::RegionIndex;
use crate::types::Value;
use anyhow::{bail, Result};
use log::{debug, info};
use std::collections::HashMap;

impl SociomeDataFrame {
    /// Append columns from a frame with the same geometry, row for row.
    /// `columns` maps source column names to the names they get here.
    pub fn merge_on_geometry(&mut self, other: &SociomeDataFrame, columns: &[(&str, &str)]) -> Result<&mut Self> {
        info!("[SociomeDataFrame] Augmenting data: {:?}", columns);
        if other.len() != self.len() {
            bail!(
                "Cannot merge on geometry: frames have {} and {} rows",
                self.len(),
                other.len()
            );
        }
        for (src, dst) in columns {
            let values = other.require_column(src)?.to_vec();
            self.set_column(*dst, values)?;
        }
        Ok(self)
    }

    /// Left spatial join: every row gets the `key` value of the first region
    /// in `regions` whose polygon contains the row's location, stored as
    /// column `name`. Rows outside every region get `Null`.
    pub fn add_subdivision(&mut self, regions: &SociomeDataFrame, name: &str, key: &str) -> Result<&mut Self> {
        let timer = Timer::new(format!("[SociomeDataFrame] subdivision '{}'", name));
        info!("[SociomeDataFrame] Adding a subdivision {}", name);

        let keys = regions.require_column(key)?;
        let index = RegionIndex::new(&regions.geometry);

        let mut assigned = 0usize;
        let values: Vec<Value> = self
            .representative_points()
            .iter()
            .map(|p| match p.and_then(|p| index.locate(&regions.geometry, &p)) {
                Some(region) => {
                    assigned += 1;
                    keys[region].clone()
                }
                None => Value::Null,
            })
            .collect();

        debug!("{} of {} rows fell inside a region", assigned, self.len());
        self.set_column(name, values)?;
        if !self.subdivisions.iter().any(|s| s == name) {
            self.subdivisions.push(name.to_string());
        }

        timer.finish();
        Ok(self)
    }

    /// Left attribute join of data indexed by a subdivision (for example a
    /// census tract table keyed by GEOID). The first row of `other` with a
    /// matching `right_on` value supplies each row's columns.
    pub fn merge_on_subdivision(
        &mut self,
        other: &SociomeDataFrame,
        subdivision: &str,
        right_on: &str,
        columns: &[(&str, &str)],
    ) -> Result<&mut Self> {
        info!("[SociomeDataFrame] Linking data to subdivision {}", subdivision);

        let left_keys = self.require_column(subdivision)?;
        let right_keys = other.require_column(right_on)?;

        let mut lookup: HashMap<String, usize> = HashMap::with_capacity(right_keys.len());
        for (row, key) in right_keys.iter().enumerate() {
            if let Some(k) = key.key_string() {
                lookup.entry(k).or_insert(row);
            }
        }

        let matched: Vec<Option<usize>> = left_keys
            .iter()
            .map(|k| k.key_string().and_then(|k| lookup.get(&k).copied()))
            .collect();

        for (src, dst) in columns {
            let source = other.require_column(src)?;
            let values = matched
                .iter()
                .map(|m| m.map(|row| source[row].clone()).unwrap_or(Value::Null))
                .collect();
            self.set_column(*dst, values)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, Point, Polygon};

    fn tracts() -> SociomeDataFrame {
        let square = |x: f64| {
            Some(Geometry::Polygon(Polygon::new(
                vec![
                    Point::new(x, 0.0),
                    Point::new(x + 1.0, 0.0),
                    Point::new(x + 1.0, 1.0),
                    Point::new(x, 1.0),
                    Point::new(x, 0.0),
                ],
                Vec::new(),
            )))
        };
        let mut regions = SociomeDataFrame::from_geometry(vec![square(0.0), square(1.0)]);
        regions
            .set_column("GEOID", vec!["17031000100".into(), "17031000200".into()])
            .unwrap();
        regions
    }

    fn addresses() -> SociomeDataFrame {
        SociomeDataFrame::from_geometry(vec![
            Some(Geometry::point(0.5, 0.5)),
            Some(Geometry::point(1.5, 0.5)),
            Some(Geometry::point(5.0, 5.0)),
        ])
    }

    #[test]
    fn add_subdivision_assigns_containing_region() {
        let mut frame = addresses();
        frame.add_subdivision(&tracts(), "tract", "GEOID").unwrap();
        assert_eq!(
            frame.column("tract").unwrap(),
            &[Value::from("17031000100"), Value::from("17031000200"), Value::Null]
        );
        assert_eq!(frame.subdivisions, vec!["tract".to_string()]);
    }

    #[test]
    fn merge_on_subdivision_is_a_left_join() {
        let mut frame = addresses();
        frame.add_subdivision(&tracts(), "tract", "GEOID").unwrap();

        let mut acs = SociomeDataFrame::from_geometry(vec![None, None]);
        acs.set_column("GEOID", vec!["17031000200".into(), "17031000100".into()]).unwrap();
        acs.set_column("SE_A1006_2", vec![Value::from(7.0), Value::from(3.0)]).unwrap();

        frame
            .merge_on_subdivision(&acs, "tract", "GEOID", &[("SE_A1006_2", "metric")])
            .unwrap();
        assert_eq!(
            frame.column("metric").unwrap(),
            &[Value::from(3.0), Value::from(7.0), Value::Null]
        );
    }

    #[test]
    fn merge_on_geometry_requires_equal_lengths() {
        let mut frame = addresses();
        let mut other = addresses();
        other.fill_column("income", Value::from(10.0)).unwrap();
        frame.merge_on_geometry(&other, &[("income", "median_income")]).unwrap();
        assert_eq!(frame.column("median_income").unwrap().len(), 3);

        let short = SociomeDataFrame::from_geometry(vec![None]);
        assert!(frame.merge_on_geometry(&short, &[]).is_err());
    }
}
