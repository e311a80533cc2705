pub mod arcgis;
pub mod common;
pub mod geojson;
pub mod records;

use crate::frame::SociomeDataFrame;
use crate::types::{DatasetRecord, SourceFormat};
use anyhow::{anyhow, Result};
use std::path::Path;

pub use common::*;
pub use records::Accessor;

pub struct DatasetParser {
    pub path: String,
    pub format: SourceFormat,
}

impl DatasetParser {
    pub fn new<P: AsRef<Path>>(path: P, format: Option<SourceFormat>) -> Result<Self> {
        let path_ref = path.as_ref();
        let format = match format {
            Some(f) => f,
            None => detect_format(path_ref)?,
        };
        Ok(Self {
            path: path_ref.to_string_lossy().to_string(),
            format,
        })
    }

    /// Load the dataset. JSON record files need an accessor; the other
    /// formats ignore it.
    pub fn load(&self, nrows: Option<usize>, accessor: Option<&Accessor>) -> Result<SociomeDataFrame> {
        match self.format {
            SourceFormat::GeoJson | SourceFormat::Derived => SociomeDataFrame::from_save_file(&self.path, nrows),
            SourceFormat::ArcGis => SociomeDataFrame::from_arcgis_file(&self.path, nrows),
            SourceFormat::JsonRecords => {
                let accessor = accessor
                    .ok_or_else(|| anyhow!("JSON record files need --lon/--lat or --location-key"))?;
                let mut frame = SociomeDataFrame::from_json(&self.path, accessor)?;
                if let Some(n) = nrows {
                    let rows: Vec<usize> = (0..n.min(frame.len())).collect();
                    frame = frame.take(&rows);
                }
                Ok(frame)
            }
        }
    }

    /// Catalog entry for a frame loaded by this parser.
    pub fn create_dataset_record(&self, name: String, frame: &SociomeDataFrame) -> Result<DatasetRecord> {
        let hash = calculate_file_hash(&self.path)?;
        Ok(DatasetRecord::describe(name, self.format, frame)
            .with_path(self.path.clone())
            .with_hash(hash))
    }
}

/// Guess the format from the file extension.
pub fn detect_format(path: &Path) -> Result<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "geojson" => Ok(SourceFormat::GeoJson),
        "json" => Ok(SourceFormat::JsonRecords),
        "csv" => Ok(SourceFormat::ArcGis),
        _ => Err(anyhow!(
            "Cannot infer the format of {}; pass --format explicitly",
            path.display()
        )),
    }
}
