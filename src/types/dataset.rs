use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// On-disk format a dataset was loaded from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    GeoJson,
    JsonRecords,
    ArcGis,
    Derived,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::GeoJson => write!(f, "geojson"),
            SourceFormat::JsonRecords => write!(f, "json"),
            SourceFormat::ArcGis => write!(f, "arcgis"),
            SourceFormat::Derived => write!(f, "derived"),
        }
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "geojson" => Ok(SourceFormat::GeoJson),
            "json" => Ok(SourceFormat::JsonRecords),
            "arcgis" => Ok(SourceFormat::ArcGis),
            "derived" => Ok(SourceFormat::Derived),
            _ => Err(anyhow::anyhow!("Unknown source format: {}", s)),
        }
    }
}

/// Catalog entry describing a dataset the toolkit has produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: String,
    pub name: String,
    pub source_path: Option<String>,
    pub format: SourceFormat,
    pub content_hash: Option<String>,
    pub row_count: usize,
    pub crs: Option<u32>,
    pub subdivisions: Vec<String>,
    pub columns: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl DatasetRecord {
    pub fn new(name: String, format: SourceFormat) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            source_path: None,
            format,
            content_hash: None,
            row_count: 0,
            crs: None,
            subdivisions: Vec::new(),
            columns: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Describe a frame that is about to be written to `path`.
    pub fn describe(name: String, format: SourceFormat, frame: &crate::frame::SociomeDataFrame) -> Self {
        let mut record = Self::new(name, format);
        record.row_count = frame.len();
        record.crs = frame.crs;
        record.subdivisions = frame.subdivisions.clone();
        record.columns = frame.column_names().into_iter().map(String::from).collect();
        record
    }

    pub fn with_path(mut self, path: String) -> Self {
        self.source_path = Some(path);
        self
    }

    pub fn with_hash(mut self, hash: String) -> Self {
        self.content_hash = Some(hash);
        self
    }
}

/// A recorded fit of the geospatial linear model against a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRun {
    pub id: String,
    pub dataset_id: Option<String>,
    pub target: String,
    pub explanatory: Vec<String>,
    pub stats: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ModelRun {
    pub fn new(target: String, explanatory: Vec<String>, stats: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            dataset_id: None,
            target,
            explanatory,
            stats,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn with_dataset(mut self, dataset_id: String) -> Self {
        self.dataset_id = Some(dataset_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn source_format_round_trips_through_display() {
        for format in [SourceFormat::GeoJson, SourceFormat::JsonRecords, SourceFormat::ArcGis, SourceFormat::Derived] {
            assert_eq!(SourceFormat::from_str(&format.to_string()).unwrap(), format);
        }
        assert!(SourceFormat::from_str("shapefile").is_err());
    }
}
