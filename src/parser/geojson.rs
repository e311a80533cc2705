//! GeoJSON FeatureCollection reading and writing.
//!
//! Frames are saved with a `sociome` foreign member holding the
//! subdivision list and CRS, so a saved file reloads with the same state.

use super::common::EPSG_WGS84;
use crate::frame::SociomeDataFrame;
use crate::performance::Timer;
use crate::types::{Geometry, Value};
use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SociomeMember {
    #[serde(default)]
    subdivisions: Vec<String>,
    #[serde(default)]
    crs: Option<u32>,
    /// Column order; properties objects do not keep it.
    #[serde(default)]
    columns: Vec<String>,
}

impl SociomeDataFrame {
    /// Load a frame previously written by `to_file` (or any GeoJSON
    /// FeatureCollection). `nrows` limits how many features are read.
    pub fn from_save_file<P: AsRef<Path>>(path: P, nrows: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let timer = Timer::new("[SociomeDataFrame] from_save_file");
        info!("[SociomeDataFrame] Loading Sociome Object From = {}", path.display());

        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let document: serde_json::Value =
            serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))?;
        let frame = Self::from_geojson_value(&document, nrows)?;

        timer.finish();
        Ok(frame)
    }

    pub fn from_geojson_value(document: &serde_json::Value, nrows: Option<usize>) -> Result<Self> {
        if document["type"].as_str() != Some("FeatureCollection") {
            bail!("Expected a GeoJSON FeatureCollection");
        }
        let features = document["features"]
            .as_array()
            .ok_or_else(|| anyhow!("FeatureCollection has no features array"))?;
        let limit = nrows.unwrap_or(features.len()).min(features.len());

        let mut geometry = Vec::with_capacity(limit);
        let mut names: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut columns: Vec<Vec<Value>> = Vec::new();

        for (row, feature) in features.iter().take(limit).enumerate() {
            geometry.push(Geometry::from_geojson(&feature["geometry"]).with_context(|| format!("feature {}", row))?);

            if let Some(props) = feature["properties"].as_object() {
                for (key, value) in props {
                    let col = *positions.entry(key.clone()).or_insert_with(|| {
                        names.push(key.clone());
                        columns.push(vec![Value::Null; row]);
                        columns.len() - 1
                    });
                    columns[col].push(Value::from_json(value));
                }
            }
            // Pad columns this feature did not mention.
            for values in columns.iter_mut() {
                if values.len() < row + 1 {
                    values.push(Value::Null);
                }
            }
        }

        let member: SociomeMember = match document.get("sociome") {
            Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
                warn!("Ignoring malformed sociome member: {}", e);
                SociomeMember::default()
            }),
            None => SociomeMember::default(),
        };

        let mut loaded: Vec<(String, Vec<Value>)> = names.into_iter().zip(columns).collect();
        if !member.columns.is_empty() {
            let rank = |name: &str| member.columns.iter().position(|c| c == name).unwrap_or(usize::MAX);
            loaded.sort_by_key(|(name, _)| rank(name));
        }

        let mut frame = Self::from_geometry(geometry);
        for (name, values) in loaded {
            frame.set_column(name, values)?;
        }
        frame.subdivisions = member
            .subdivisions
            .into_iter()
            .filter(|s| frame.has_column(s))
            .collect();
        frame.crs = member.crs.or(Some(EPSG_WGS84));
        Ok(frame)
    }

    pub fn to_geojson_value(&self) -> serde_json::Value {
        let features: Vec<serde_json::Value> = (0..self.len())
            .map(|row| {
                let properties: serde_json::Map<String, serde_json::Value> = self
                    .columns()
                    .iter()
                    .map(|c| (c.name.clone(), c.values[row].to_json()))
                    .collect();
                json!({
                    "type": "Feature",
                    "geometry": self.geometry[row].as_ref().map(Geometry::to_geojson),
                    "properties": properties,
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
            "sociome": SociomeMember {
                subdivisions: self.subdivisions.clone(),
                crs: self.crs,
                columns: self.column_names().into_iter().map(String::from).collect(),
            },
        })
    }

    /// Save the frame as a GeoJSON FeatureCollection.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let timer = Timer::new("[SociomeDataFrame] to_file");
        info!("[SociomeDataFrame] Saving SociomeDataFrame to File = {}", path.display());

        let text = serde_json::to_string(&self.to_geojson_value())?;
        std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;

        timer.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_properties_are_padded() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}, "properties": {"a": 1}},
                {"type": "Feature", "geometry": null, "properties": {"b": "x"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [3.0, 4.0]}, "properties": {}}
            ]
        });
        let frame = SociomeDataFrame::from_geojson_value(&doc, None).unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.column("a").unwrap(), &[Value::from(1.0), Value::Null, Value::Null]);
        assert_eq!(frame.column("b").unwrap(), &[Value::Null, Value::from("x"), Value::Null]);
        assert!(frame.geometry[1].is_none());
    }

    #[test]
    fn nrows_limits_features() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"a": 1}},
                {"type": "Feature", "geometry": null, "properties": {"a": 2}}
            ]
        });
        let frame = SociomeDataFrame::from_geojson_value(&doc, Some(1)).unwrap();
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn mixed_geometry_collections_load() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}, "properties": {"id": 1}},
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [2.0, 2.0]]}, "properties": {"id": 2}},
                {"type": "Feature", "geometry": {"type": "MultiPoint", "coordinates": [[5.0, 5.0], [7.0, 5.0]]}, "properties": {"id": 3}},
                {"type": "Feature", "geometry": {"type": "MultiLineString", "coordinates": [[[0.0, 0.0], [0.0, 4.0]]]}, "properties": {"id": 4}},
                {"type": "Feature", "geometry": {"type": "GeometryCollection", "geometries": []}, "properties": {"id": 5}}
            ]
        });
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.geojson");
        std::fs::write(&path, doc.to_string()).unwrap();

        let frame = SociomeDataFrame::from_save_file(&path, None).unwrap();
        assert_eq!(frame.len(), 5);
        let reps: Vec<_> = frame.representative_points();
        assert_eq!(reps[1], Some(crate::types::Point::new(1.0, 1.0)));
        assert_eq!(reps[2], Some(crate::types::Point::new(6.0, 5.0)));
        assert_eq!(reps[3], Some(crate::types::Point::new(0.0, 2.0)));
        assert!(frame.geometry[4].is_none());

        frame.to_file(&path).unwrap();
        let reloaded = SociomeDataFrame::from_save_file(&path, None).unwrap();
        assert_eq!(reloaded.geometry[..4], frame.geometry[..4]);
    }

    #[test]
    fn rejects_non_collections() {
        assert!(SociomeDataFrame::from_geojson_value(&json!({"type": "Feature"}), None).is_err());
    }
}
