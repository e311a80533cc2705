//! `SociomeDataFrame`: a table of locations with geometry, named value
//! columns, and the list of subdivision columns assigned so far.
//!
//! Loaders live in `crate::parser`, renderers in `crate::visualization`;
//! this module owns the in-memory layout and the joins between frames.

pub mod join;

use crate::metrics::SpatialFunction;
use crate::performance::Timer;
use crate::types::{Geometry, Point, Value};
use anyhow::{anyhow, bail, Result};
use log::{info, warn};
use rand::seq::index;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct SociomeDataFrame {
    pub geometry: Vec<Option<Geometry>>,
    columns: Vec<Column>,
    pub subdivisions: Vec<String>,
    pub crs: Option<u32>,
}

impl SociomeDataFrame {
    pub const PRIMARY_SUBDIVISION: &'static str = "SUBD";
    pub const LOCATIONS_KEY: &'static str = "LOCATIONS";
    pub const METRIC_KEY: &'static str = "metric";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_geometry(geometry: Vec<Option<Geometry>>) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn require_column(&self, name: &str) -> Result<&[Value]> {
        self.column(name).ok_or_else(|| {
            anyhow!(
                "Column '{}' not found (available: {})",
                name,
                self.column_names().join(", ")
            )
        })
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).and_then(|values| values.get(row))
    }

    /// Insert or replace a column. The column must have one value per row.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            bail!(
                "Column '{}' has {} values but the frame has {} rows",
                name,
                values.len(),
                self.len()
            );
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                warn!("Replacing existing column '{}'", name);
                existing.values = values;
            }
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Set a column to the same value on every row.
    pub fn fill_column(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let values = vec![value; self.len()];
        self.set_column(name, values)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        self.subdivisions.retain(|s| s != name);
        Some(self.columns.remove(pos))
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if self.has_column(to) {
            bail!("Cannot rename '{}' to '{}': target column exists", from, to);
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == from)
            .ok_or_else(|| anyhow!("Column '{}' not found", from))?;
        column.name = to.to_string();
        for s in self.subdivisions.iter_mut().filter(|s| s.as_str() == from) {
            *s = to.to_string();
        }
        Ok(())
    }

    /// Column values as floats; missing or non-numeric cells become NaN.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let values = self.require_column(name)?;
        if values.iter().any(|v| matches!(v, Value::Text(s) if s.trim().parse::<f64>().is_err())) {
            bail!("Column '{}' is not numeric", name);
        }
        Ok(values.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect())
    }

    /// The point each row is evaluated at, `None` for rows without geometry.
    pub fn representative_points(&self) -> Vec<Option<Point>> {
        self.geometry
            .iter()
            .map(|g| g.as_ref().and_then(Geometry::representative_point))
            .collect()
    }

    pub fn geometry_frame(&self) -> Self {
        Self {
            geometry: self.geometry.clone(),
            columns: Vec::new(),
            subdivisions: Vec::new(),
            crs: self.crs,
        }
    }

    /// Projection onto the named columns; geometry is always kept.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let values = self.require_column(name)?;
            columns.push(Column {
                name: name.to_string(),
                values: values.to_vec(),
            });
        }
        Ok(Self {
            geometry: self.geometry.clone(),
            subdivisions: self
                .subdivisions
                .iter()
                .filter(|s| names.contains(&s.as_str()))
                .cloned()
                .collect(),
            columns,
            crs: self.crs,
        })
    }

    /// Rows at the given indices, in the given order.
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            geometry: rows.iter().map(|&i| self.geometry[i].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: rows.iter().map(|&i| c.values[i].clone()).collect(),
                })
                .collect(),
            subdivisions: self.subdivisions.clone(),
            crs: self.crs,
        }
    }

    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(usize, &Self) -> bool,
    {
        let rows: Vec<usize> = (0..self.len()).filter(|&i| keep(i, self)).collect();
        self.take(&rows)
    }

    /// Only keep rows whose geometry is present and non-empty.
    pub fn drop_missing_geometry(&mut self) -> usize {
        let before = self.len();
        let rows: Vec<usize> = (0..before)
            .filter(|&i| matches!(&self.geometry[i], Some(g) if !g.is_empty()))
            .collect();
        if rows.len() != before {
            *self = self.take(&rows);
        }
        before - self.len()
    }

    /// Random sample of `round(fraction * len)` rows without replacement.
    pub fn sample(&self, fraction: f64) -> Result<Self> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            bail!("Sampling rate must be in (0, 1], got {}", fraction);
        }
        if fraction >= 1.0 {
            return Ok(self.clone());
        }
        let amount = ((self.len() as f64) * fraction).round() as usize;
        let mut rows = index::sample(&mut rand::thread_rng(), self.len(), amount).into_vec();
        rows.sort_unstable();
        Ok(self.take(&rows))
    }

    /// Evaluate a spatial function over this frame and store the result as
    /// column `name`.
    pub fn add_metric_to_data(&mut self, metric: &dyn SpatialFunction, name: &str) -> Result<&mut Self> {
        let timer = Timer::new(format!("[SociomeDataFrame] metric '{}'", name));
        info!("[SociomeDataFrame] Adding metric {} ({})", name, metric.name());
        let evaluated = metric.eval(self)?;
        let values = evaluated.require_column(Self::METRIC_KEY)?.to_vec();
        self.set_column(name, values)?;
        timer.finish();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> SociomeDataFrame {
        let mut frame = SociomeDataFrame::from_geometry(vec![
            Some(Geometry::point(0.0, 0.0)),
            None,
            Some(Geometry::point(2.0, 2.0)),
        ]);
        frame
            .set_column("a", vec![Value::from(1.0), Value::from(2.0), Value::Null])
            .unwrap();
        frame
            .set_column("name", vec!["x".into(), "y".into(), "z".into()])
            .unwrap();
        frame
    }

    #[test]
    fn set_column_checks_length() {
        let mut f = frame();
        assert!(f.set_column("b", vec![Value::Null]).is_err());
    }

    #[test]
    fn select_unknown_column_fails() {
        let f = frame();
        assert!(f.select(&["missing"]).is_err());
        let projected = f.select(&["a"]).unwrap();
        assert_eq!(projected.column_names(), vec!["a"]);
        assert_eq!(projected.len(), 3);
    }

    #[test]
    fn drop_missing_geometry_keeps_columns_aligned() {
        let mut f = frame();
        assert_eq!(f.drop_missing_geometry(), 1);
        assert_eq!(f.len(), 2);
        assert_eq!(f.column("name").unwrap(), &[Value::from("x"), Value::from("z")]);
    }

    #[test]
    fn numeric_column_maps_missing_to_nan() {
        let f = frame();
        let a = f.numeric_column("a").unwrap();
        assert_eq!(a[0], 1.0);
        assert!(a[2].is_nan());
        assert!(f.numeric_column("name").is_err());
    }

    #[test]
    fn sample_rejects_bad_fraction_and_sizes_output() {
        let f = frame();
        assert!(f.sample(0.0).is_err());
        assert!(f.sample(1.5).is_err());
        assert_eq!(f.sample(1.0).unwrap().len(), 3);
        assert_eq!(f.sample(0.34).unwrap().len(), 1);
    }

    #[test]
    fn rename_tracks_subdivisions() {
        let mut f = frame();
        f.subdivisions.push("name".into());
        f.rename_column("name", "tract").unwrap();
        assert_eq!(f.subdivisions, vec!["tract".to_string()]);
        assert!(f.rename_column("a", "tract").is_err());
    }
}
