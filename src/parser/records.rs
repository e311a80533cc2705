use super::common::{is_valid_latitude, is_valid_longitude, EPSG_WGS84};
use crate::frame::SociomeDataFrame;
use crate::performance::Timer;
use crate::types::{Geometry, Value};
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

/// How to find the longitude and latitude of a JSON record.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    /// Two top-level attributes, e.g. `{"lon": .., "lat": ..}`.
    ByAttribute { lon: String, lat: String },
    /// A nested object with `longitude` and `latitude` fields, as in
    /// Socrata-style `{"location": {"latitude": "41.8", "longitude": "-87.6"}}`.
    ByLocationDict { key: String },
}

impl Accessor {
    pub fn by_attribute(lon: &str, lat: &str) -> Self {
        Accessor::ByAttribute {
            lon: lon.to_string(),
            lat: lat.to_string(),
        }
    }

    pub fn by_location_dict(key: &str) -> Self {
        Accessor::ByLocationDict { key: key.to_string() }
    }

    /// `(longitude, latitude)` for a record, if both are present and numeric.
    pub fn locate(&self, record: &serde_json::Map<String, serde_json::Value>) -> Option<(f64, f64)> {
        let (lon, lat) = match self {
            Accessor::ByAttribute { lon, lat } => (record.get(lon)?, record.get(lat)?),
            Accessor::ByLocationDict { key } => {
                let location = record.get(key)?.as_object()?;
                (location.get("longitude")?, location.get("latitude")?)
            }
        };
        Some((json_number(lon)?, json_number(lat)?))
    }

    fn nested_key(&self) -> Option<&str> {
        match self {
            Accessor::ByLocationDict { key } => Some(key),
            _ => None,
        }
    }
}

fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl SociomeDataFrame {
    /// Load a JSON array of records, placing each at the point the accessor
    /// finds. Records without a usable location are dropped.
    pub fn from_json<P: AsRef<Path>>(path: P, accessor: &Accessor) -> Result<Self> {
        let path = path.as_ref();
        let timer = Timer::new("[SociomeDataFrame] from_json");
        info!("[SociomeDataFrame] Loading Sociome Object From JSON File = {}", path.display());

        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let document: serde_json::Value =
            serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))?;
        let frame = Self::from_json_records(&document, accessor)?;

        timer.finish();
        Ok(frame)
    }

    pub fn from_json_records(document: &serde_json::Value, accessor: &Accessor) -> Result<Self> {
        let records = document
            .as_array()
            .ok_or_else(|| anyhow!("Expected a JSON array of records"))?;

        let mut geometry = Vec::with_capacity(records.len());
        let mut names: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut columns: Vec<Vec<Value>> = Vec::new();
        let mut dropped = 0usize;

        for record in records {
            let Some(object) = record.as_object() else {
                dropped += 1;
                continue;
            };
            let Some((lon, lat)) = accessor
                .locate(object)
                .filter(|(lon, lat)| is_valid_longitude(*lon) && is_valid_latitude(*lat))
            else {
                dropped += 1;
                continue;
            };

            let row = geometry.len();
            geometry.push(Some(Geometry::point(lon, lat)));
            for (key, value) in object {
                if accessor.nested_key() == Some(key.as_str()) {
                    continue;
                }
                let col = *positions.entry(key.clone()).or_insert_with(|| {
                    names.push(key.clone());
                    columns.push(vec![Value::Null; row]);
                    columns.len() - 1
                });
                columns[col].push(Value::from_json(value));
            }
            for values in columns.iter_mut() {
                if values.len() < row + 1 {
                    values.push(Value::Null);
                }
            }
        }

        if dropped > 0 {
            debug!("Dropped {} records without a usable location", dropped);
        }

        let mut frame = Self::from_geometry(geometry);
        for (name, values) in names.into_iter().zip(columns) {
            frame.set_column(name, values)?;
        }
        frame.crs = Some(EPSG_WGS84);
        frame.fill_column(Self::LOCATIONS_KEY, Value::Number(1.0))?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn location_dict_accessor_reads_string_coordinates() {
        let doc = json!([
            {"name": "Clinic A", "location": {"latitude": "41.85", "longitude": "-87.62"}},
            {"name": "Clinic B", "location": {"latitude": null, "longitude": "-87.60"}},
            {"name": "Clinic C"}
        ]);
        let frame = SociomeDataFrame::from_json_records(&doc, &Accessor::by_location_dict("location")).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.geometry[0], Some(Geometry::point(-87.62, 41.85)));
        assert_eq!(frame.column("name").unwrap(), &[Value::from("Clinic A")]);
        assert!(!frame.has_column("location"));
        assert_eq!(frame.column("LOCATIONS").unwrap(), &[Value::from(1.0)]);
    }

    #[test]
    fn attribute_accessor_keeps_coordinate_columns() {
        let doc = json!([
            {"x": -87.6, "y": 41.8, "kind": "park"},
            {"x": -87.7, "y": 141.8, "kind": "bad"}
        ]);
        let frame = SociomeDataFrame::from_json_records(&doc, &Accessor::by_attribute("x", "y")).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.column("kind").unwrap(), &[Value::from("park")]);
        assert_eq!(frame.column("x").unwrap(), &[Value::from(-87.6)]);
    }

    #[test]
    fn rejects_non_array_documents() {
        assert!(SociomeDataFrame::from_json_records(&json!({"a": 1}), &Accessor::by_attribute("x", "y")).is_err());
    }
}
