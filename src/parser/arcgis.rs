//! ArcGIS address-point CSV exports (e.g. the Cook County address file).

use super::common::{is_valid_latitude, is_valid_longitude, EPSG_NAD83};
use crate::frame::SociomeDataFrame;
use crate::performance::Timer;
use crate::types::{Geometry, Value};
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::path::Path;

pub const ARCGIS_ADDRESS_L1: &str = "ADDRDELIV";
pub const ARCGIS_CITY: &str = "Post_Comm";
pub const ARCGIS_STATE: &str = "State";
pub const ARCGIS_BASIC_ZIP: &str = "Post_Code";
pub const ARCGIS_STREET_ABBREV: &str = "LSt_Type";
pub const ARCGIS_STREET_DIR: &str = "LSt_PreDir";
pub const ARCGIS_LAT: &str = "Lat";
pub const ARCGIS_LONG: &str = "Long";

/// Columns kept from an ArcGIS export.
pub const ARCGIS_PROJ: [&str; 8] = [
    ARCGIS_LAT,
    ARCGIS_LONG,
    ARCGIS_ADDRESS_L1,
    ARCGIS_CITY,
    ARCGIS_STATE,
    ARCGIS_BASIC_ZIP,
    ARCGIS_STREET_ABBREV,
    ARCGIS_STREET_DIR,
];

/// Fields concatenated into the searchable address string, in order.
pub const ARCGIS_ADDRESS_FIELDS: [&str; 6] = [
    ARCGIS_ADDRESS_L1,
    ARCGIS_CITY,
    ARCGIS_STATE,
    ARCGIS_BASIC_ZIP,
    ARCGIS_STREET_ABBREV,
    ARCGIS_STREET_DIR,
];

impl SociomeDataFrame {
    /// Load an ArcGIS address CSV. Rows with out-of-range or missing
    /// coordinates are dropped; the zip code becomes a subdivision.
    pub fn from_arcgis_file<P: AsRef<Path>>(path: P, nrows: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let timer = Timer::new("[SociomeDataFrame] from_arcgis_file");
        info!("[SociomeDataFrame] Loading Sociome Object From ARCGIS File = {}", path.display());

        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let frame = Self::from_arcgis_reader(reader, nrows)?;

        timer.finish();
        Ok(frame)
    }

    pub fn from_arcgis_reader<R: std::io::Read>(mut reader: csv::Reader<R>, nrows: Option<usize>) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let indices = ARCGIS_PROJ
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h.trim() == *name)
                    .ok_or_else(|| anyhow!("ArcGIS file is missing column '{}'", name))
            })
            .collect::<Result<Vec<_>>>()?;
        let (lat_idx, lon_idx) = (indices[0], indices[1]);

        let mut geometry = Vec::new();
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); ARCGIS_PROJ.len()];
        let mut dropped = 0usize;

        for (read, record) in reader.records().enumerate() {
            if nrows.is_some_and(|n| read >= n) {
                break;
            }
            let record = record.with_context(|| format!("Malformed CSV record {}", read + 1))?;
            let coord = |idx: usize| record.get(idx).and_then(|s| s.trim().parse::<f64>().ok());
            let (lat, lon) = match (coord(lat_idx), coord(lon_idx)) {
                (Some(lat), Some(lon)) if is_valid_latitude(lat) && is_valid_longitude(lon) => (lat, lon),
                _ => {
                    dropped += 1;
                    continue;
                }
            };

            geometry.push(Some(Geometry::point(lon, lat)));
            for (col, &idx) in indices.iter().enumerate() {
                columns[col].push(record.get(idx).map(Value::from_csv_field).unwrap_or(Value::Null));
            }
        }
        if dropped > 0 {
            debug!("Dropped {} address rows with invalid coordinates", dropped);
        }

        let mut frame = Self::from_geometry(geometry);
        for (name, values) in ARCGIS_PROJ.iter().zip(columns) {
            frame.set_column(*name, values)?;
        }
        frame.crs = Some(EPSG_NAD83);
        frame.fill_column(Self::LOCATIONS_KEY, Value::Number(1.0))?;
        frame.subdivisions.push(ARCGIS_BASIC_ZIP.to_string());
        Ok(frame)
    }
}

/// The space-joined address fields of one row of an ArcGIS frame.
pub fn address_string(frame: &SociomeDataFrame, row: usize) -> String {
    ARCGIS_ADDRESS_FIELDS
        .iter()
        .map(|field| frame.value(row, field).map(|v| v.to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
OBJECTID,Lat,Long,ADDRDELIV,Post_Comm,State,Post_Code,LSt_Type,LSt_PreDir,Extra
1,41.8569,-87.6244,1801 S MICHIGAN,CHICAGO,IL,60616,AVE,S,x
2,941.0,-87.6,BAD ROW,CHICAGO,IL,60616,ST,N,x
3,,-87.6,NO LAT,CHICAGO,IL,60616,ST,N,x
4,41.9,-87.65,200 W MADISON,CHICAGO,IL,60606,ST,W,x
5,41.9,-187.65,BAD LONG,CHICAGO,IL,60606,ST,W,x
6,-33.86,151.21,1 MACQUARIE,SYDNEY,NSW,2000,ST,E,x
";

    fn load(nrows: Option<usize>) -> SociomeDataFrame {
        let reader = csv::ReaderBuilder::new().from_reader(SAMPLE.as_bytes());
        SociomeDataFrame::from_arcgis_reader(reader, nrows).unwrap()
    }

    #[test]
    fn keeps_projection_and_drops_invalid_rows() {
        let frame = load(None);
        assert_eq!(frame.len(), 3);
        assert!(!frame.has_column("Extra"));
        assert_eq!(frame.crs, Some(EPSG_NAD83));
        assert_eq!(frame.subdivisions, vec![ARCGIS_BASIC_ZIP.to_string()]);
        assert_eq!(frame.geometry[0], Some(Geometry::point(-87.6244, 41.8569)));
        assert_eq!(address_string(&frame, 0), "1801 S MICHIGAN CHICAGO IL 60616 AVE S");
    }

    #[test]
    fn longitude_bounds_are_plus_minus_180() {
        let frame = load(None);
        let streets: Vec<String> = frame
            .column(ARCGIS_ADDRESS_L1)
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert!(!streets.contains(&"BAD LONG".to_string()));
        // Longitudes past 90 are still valid.
        assert_eq!(frame.geometry[2], Some(Geometry::point(151.21, -33.86)));
    }

    #[test]
    fn nrows_counts_raw_records() {
        assert_eq!(load(Some(2)).len(), 1);
    }

    #[test]
    fn missing_projection_column_is_an_error() {
        let reader = csv::ReaderBuilder::new().from_reader("Lat,Long\n1,2\n".as_bytes());
        assert!(SociomeDataFrame::from_arcgis_reader(reader, None).is_err());
    }
}
