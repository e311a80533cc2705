pub mod database;
pub mod link;
pub mod load;
pub mod matching;
pub mod metric;
pub mod model;
pub mod render;
pub mod subdivide;

use crate::database::open_database;
use crate::frame::SociomeDataFrame;
use crate::parser::{calculate_file_hash, Accessor, DatasetParser};
use crate::types::{DatasetRecord, SourceFormat};
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sociome")]
#[command(about = "Integrate and analyse geocoded socio-environmental datasets")]
#[command(version)]
pub struct Cli {
    #[arg(long, env = "SOCIOME_CATALOG", default_value = "sociome.db")]
    #[arg(help = "Path to the SQLite dataset catalog")]
    pub catalog: PathBuf,

    #[arg(short, long)]
    #[arg(help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// How to read a dataset from disk.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct InputArgs {
    #[arg(long, value_enum)]
    #[arg(help = "Input format (detected from the extension when omitted)")]
    pub format: Option<FormatArg>,

    #[arg(long)]
    #[arg(help = "Read at most this many rows")]
    pub nrows: Option<usize>,

    #[arg(long, requires = "lat")]
    #[arg(help = "Longitude attribute of JSON records")]
    pub lon: Option<String>,

    #[arg(long, requires = "lon")]
    #[arg(help = "Latitude attribute of JSON records")]
    pub lat: Option<String>,

    #[arg(long, conflicts_with_all = ["lon", "lat"])]
    #[arg(help = "Attribute of JSON records holding a {longitude, latitude} object")]
    pub location_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Geojson,
    Json,
    Arcgis,
}

impl From<FormatArg> for SourceFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Geojson => SourceFormat::GeoJson,
            FormatArg::Json => SourceFormat::JsonRecords,
            FormatArg::Arcgis => SourceFormat::ArcGis,
        }
    }
}

impl InputArgs {
    pub fn accessor(&self) -> Option<Accessor> {
        match (&self.lon, &self.lat, &self.location_key) {
            (Some(lon), Some(lat), _) => Some(Accessor::by_attribute(lon, lat)),
            (_, _, Some(key)) => Some(Accessor::by_location_dict(key)),
            _ => None,
        }
    }

    pub fn parser(&self, path: &Path) -> Result<DatasetParser> {
        DatasetParser::new(path, self.format.map(SourceFormat::from))
    }

    pub fn load(&self, path: &Path) -> Result<SociomeDataFrame> {
        self.parser(path)?.load(self.nrows, self.accessor().as_ref())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Load a GeoJSON, JSON-records or ArcGIS file and save it as GeoJSON")]
    Load {
        #[arg(short, long)]
        #[arg(help = "Input dataset")]
        input: PathBuf,

        #[command(flatten)]
        source: InputArgs,

        #[arg(short, long)]
        #[arg(help = "Output GeoJSON file")]
        output: PathBuf,

        #[arg(long)]
        #[arg(help = "Catalog name (defaults to the output file stem)")]
        name: Option<String>,
    },

    #[command(about = "Tag each row with the key of the region polygon containing it")]
    Subdivide {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        #[arg(help = "GeoJSON file of region polygons")]
        regions: PathBuf,

        #[arg(long)]
        #[arg(help = "Name of the new subdivision column")]
        name: String,

        #[arg(long)]
        #[arg(help = "Key attribute of the regions")]
        key: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    #[command(about = "Copy columns from another dataset, by row position or by subdivision key")]
    Link {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        #[arg(help = "Dataset to copy columns from")]
        other: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        #[arg(help = "Columns to copy, as SRC or SRC=DST")]
        columns: Vec<String>,

        #[arg(long)]
        #[arg(help = "Join on this subdivision column instead of by row position")]
        subdivision: Option<String>,

        #[arg(long, requires = "subdivision")]
        #[arg(help = "Key column in the other dataset (defaults to the subdivision name)")]
        right_on: Option<String>,

        #[arg(short, long)]
        output: PathBuf,
    },

    #[command(about = "Evaluate a spatial function from a source dataset at every row")]
    Metric {
        #[arg(short, long)]
        #[arg(help = "Dataset receiving the metric")]
        input: PathBuf,

        #[arg(long)]
        #[arg(help = "Dataset the metric is computed from")]
        source: PathBuf,

        #[command(flatten)]
        source_args: InputArgs,

        #[arg(long, value_enum)]
        kind: metric::MetricKind,

        #[arg(long)]
        #[arg(help = "Name of the new column")]
        name: String,

        #[arg(long)]
        #[arg(help = "Source column (identity, interpolation, subdivision)")]
        column: Option<String>,

        #[arg(long)]
        #[arg(help = "Subdivision column (subdivision)")]
        subdivision: Option<String>,

        #[arg(long)]
        #[arg(help = "Subdivision key column in the source, if named differently")]
        subdivision_right: Option<String>,

        #[arg(long, default_value_t = crate::metrics::density::DEFAULT_RADIUS_M)]
        #[arg(help = "Radius in meters (density)")]
        radius: f64,

        #[arg(long)]
        #[arg(help = "Kernel smoothing in squared degrees (interpolation)")]
        sigma2: Option<f64>,

        #[arg(long)]
        #[arg(help = "Kernel cutoff weight (interpolation)")]
        precision: Option<f64>,

        #[arg(short, long)]
        output: PathBuf,
    },

    #[command(about = "Fit a ridge regression of one column on others")]
    Model {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        target: String,

        #[arg(long, value_delimiter = ',', required = true)]
        explanatory: Vec<String>,

        #[arg(long, default_value_t = crate::ml::DEFAULT_ALPHA)]
        alpha: f64,

        #[arg(long, default_value = "prediction")]
        prediction: String,

        #[arg(long, default_value = "residual")]
        residual: String,

        #[arg(short, long)]
        #[arg(help = "GeoJSON file for predictions and residuals")]
        output: PathBuf,

        #[arg(long)]
        #[arg(help = "Write fit statistics as JSON")]
        stats: Option<PathBuf>,
    },

    #[command(about = "Join two datasets by location or by address similarity")]
    Match {
        #[arg(long)]
        left: PathBuf,

        #[arg(long)]
        right: PathBuf,

        #[command(flatten)]
        right_args: InputArgs,

        #[arg(long, value_enum, default_value = "geometric")]
        mode: matching::MatchMode,

        #[arg(long, default_value_t = crate::matching::geometric::DEFAULT_DISTANCE_THRESH)]
        #[arg(help = "Maximum coordinate distance (geometric)")]
        distance: f64,

        #[arg(long, value_delimiter = ',')]
        #[arg(help = "Address attributes of the left dataset (address)")]
        left_address: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        #[arg(help = "Address attributes of the right dataset (address)")]
        right_address: Vec<String>,

        #[arg(long = "exact", value_delimiter = ',')]
        #[arg(help = "Blocking conditions as LEFT=RIGHT (address)")]
        exact: Vec<String>,

        #[arg(long, default_value_t = 0)]
        min_score: u8,

        #[arg(short, long)]
        output: PathBuf,
    },

    #[command(about = "Look up the closest address in an ArcGIS address file")]
    FindAddress {
        #[arg(short, long)]
        #[arg(help = "ArcGIS address CSV or a GeoJSON saved from one")]
        input: PathBuf,

        #[arg(long)]
        address: String,

        #[arg(long)]
        zip: Option<String>,
    },

    #[command(about = "Render columns as an SVG map or a kepler.gl page")]
    Render {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, value_delimiter = ',', default_value = "LOCATIONS")]
        columns: Vec<String>,

        #[arg(long, value_enum, default_value = "svg")]
        format: render::RenderFormat,

        #[arg(long, default_value_t = 1.0)]
        sampling_rate: f64,

        #[arg(short, long)]
        output: PathBuf,
    },

    #[command(about = "Dataset catalog operations")]
    Catalog {
        #[arg(long)]
        #[arg(help = "Initialize catalog schema")]
        init: bool,

        #[arg(long)]
        #[arg(help = "Show catalog statistics")]
        stats: bool,

        #[arg(long)]
        #[arg(help = "List catalogued datasets")]
        list: bool,

        #[arg(long)]
        #[arg(help = "Find datasets whose name contains this text")]
        search: Option<String>,

        #[arg(long)]
        #[arg(help = "Find datasets carrying this column")]
        column: Option<String>,

        #[arg(long)]
        #[arg(help = "Export catalog to JSON file")]
        export: Option<PathBuf>,

        #[arg(long)]
        #[arg(help = "Import catalog from JSON file")]
        import: Option<PathBuf>,
    },
}

/// Split `SRC=DST` (or bare `SRC`) column mappings.
pub fn parse_mappings(mappings: &[String]) -> Result<Vec<(String, String)>> {
    mappings
        .iter()
        .map(|mapping| match mapping.split_once('=') {
            Some((src, dst)) if !src.is_empty() && !dst.is_empty() => Ok((src.to_string(), dst.to_string())),
            Some(_) => Err(anyhow!("Malformed column mapping: {}", mapping)),
            None if !mapping.is_empty() => Ok((mapping.clone(), mapping.clone())),
            None => bail!("Empty column mapping"),
        })
        .collect()
}

pub(crate) fn as_strs(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}

fn default_name(output: &Path) -> String {
    output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string())
}

/// Save a derived frame and record it in the catalog.
pub fn save_and_register(
    catalog: &Path,
    frame: &SociomeDataFrame,
    output: &Path,
    name: Option<&str>,
) -> Result<DatasetRecord> {
    frame.to_file(output)?;
    let name = name.map(String::from).unwrap_or_else(|| default_name(output));
    let record = DatasetRecord::describe(name, SourceFormat::Derived, frame)
        .with_path(output.to_string_lossy().to_string())
        .with_hash(calculate_file_hash(output)?);

    let db = open_database(catalog)?;
    record.insert(db.connection())?;
    info!("Catalogued {} ({} rows) as {}", record.name, record.row_count, record.id);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mappings_accept_bare_and_renamed_columns() {
        let mappings = vec!["pm25".to_string(), "zcta=zip".to_string()];
        assert_eq!(
            parse_mappings(&mappings).unwrap(),
            vec![("pm25".into(), "pm25".into()), ("zcta".into(), "zip".into())]
        );
        assert!(parse_mappings(&["=x".to_string()]).is_err());
    }

    #[test]
    fn cli_parses_catalog_from_flag() {
        let cli = Cli::try_parse_from(["sociome", "--catalog", "x.db", "catalog", "--stats"]).unwrap();
        assert_eq!(cli.catalog, PathBuf::from("x.db"));
        assert!(matches!(cli.command, Commands::Catalog { stats: true, .. }));
    }
}
