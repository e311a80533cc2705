use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

/// EPSG code of NAD83, the datum ArcGIS address points are published in.
pub const EPSG_NAD83: u32 = 4269;
/// EPSG code of WGS-84, the GeoJSON default.
pub const EPSG_WGS84: u32 = 4326;

pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub fn calculate_file_hash<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(calculate_hash(&data))
}

pub fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && lat.abs() <= 90.0
}

pub fn is_valid_longitude(lon: f64) -> bool {
    lon.is_finite() && lon.abs() <= 180.0
}
