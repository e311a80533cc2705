//! End-to-end use of the library: load, subdivide, link, add metrics,
//! model, render and catalogue.

use serde_json::json;
use sociome::database::{open_database, DatasetQueries, ModelRunQueries};
use sociome::metrics::{SpatialDensityFunction, SpatialInterpolationFunction, InterpolationParams};
use sociome::parser::{Accessor, DatasetParser};
use sociome::types::{ModelRun, SourceFormat, Value};
use sociome::{GeospatialLinearModel, SociomeDataFrame};
use std::path::Path;
use tempfile::TempDir;

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> serde_json::Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
    })
}

fn write_fixtures(dir: &Path) {
    let regions = json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": square(-88.0, 41.7, -87.7, 42.0), "properties": {"zip": 60601}},
            {"type": "Feature", "geometry": square(-87.7, 41.7, -87.4, 42.0), "properties": {"zip": 60616}},
        ]
    });
    std::fs::write(dir.join("regions.geojson"), regions.to_string()).unwrap();

    let clinics = json!([
        {"name": "a", "lon": -87.90, "lat": 41.80, "visits": 120},
        {"name": "b", "lon": -87.85, "lat": 41.85, "visits": 150},
        {"name": "c", "lon": -87.80, "lat": 41.90, "visits": 90},
        {"name": "d", "lon": -87.60, "lat": 41.80, "visits": 300},
        {"name": "e", "lon": -87.55, "lat": 41.85, "visits": 280},
        {"name": "f", "lon": -87.50, "lat": 41.90, "visits": 310},
        {"name": "no location", "visits": 5},
    ]);
    std::fs::write(dir.join("clinics.json"), clinics.to_string()).unwrap();
}

fn zip_table() -> SociomeDataFrame {
    let mut table = SociomeDataFrame::from_geometry(vec![None, None]);
    table
        .set_column("zip_code", vec![Value::from("60601"), Value::from("60616")])
        .unwrap();
    table
        .set_column("median_income", vec![Value::from(52_000.0), Value::from(31_000.0)])
        .unwrap();
    table
}

#[test]
fn exposure_profile_pipeline() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    let parser = DatasetParser::new(dir.path().join("clinics.json"), None).unwrap();
    assert_eq!(parser.format, SourceFormat::JsonRecords);
    let accessor = Accessor::by_attribute("lon", "lat");
    let mut clinics = parser.load(None, Some(&accessor)).unwrap();
    assert_eq!(clinics.len(), 6);
    assert!(clinics
        .column(SociomeDataFrame::LOCATIONS_KEY)
        .unwrap()
        .iter()
        .all(|v| v.as_f64() == Some(1.0)));

    let regions = SociomeDataFrame::from_save_file(dir.path().join("regions.geojson"), None).unwrap();
    clinics.add_subdivision(&regions, "zip", "zip").unwrap();
    assert_eq!(clinics.subdivisions, vec!["zip".to_string()]);

    clinics
        .merge_on_subdivision(&zip_table(), "zip", "zip_code", &[("median_income", "income")])
        .unwrap();
    let income = clinics.numeric_column("income").unwrap();
    assert_eq!(&income[..3], &[52_000.0; 3]);
    assert_eq!(&income[3..], &[31_000.0; 3]);

    let density = SpatialDensityFunction::new(&clinics, 10_000.0).unwrap();
    clinics.add_metric_to_data(&density, "clinic_density").unwrap();
    let interpolation =
        SpatialInterpolationFunction::new(&clinics, "visits", InterpolationParams::default()).unwrap();
    clinics.add_metric_to_data(&interpolation, "visits_smooth").unwrap();
    assert!(clinics
        .numeric_column("clinic_density")
        .unwrap()
        .iter()
        .all(|d| *d >= 1.0));

    // Saved frames reload with the same columns, subdivisions and CRS.
    let saved = dir.path().join("profile.geojson");
    clinics.to_file(&saved).unwrap();
    let reloaded = SociomeDataFrame::from_save_file(&saved, None).unwrap();
    assert_eq!(reloaded.len(), clinics.len());
    assert_eq!(reloaded.column_names(), clinics.column_names());
    assert_eq!(reloaded.subdivisions, clinics.subdivisions);
    assert_eq!(reloaded.crs, clinics.crs);

    let mut model = GeospatialLinearModel::new("visits", &["income", "clinic_density"]);
    let fitted = model.fit(&reloaded, "prediction", "residual").unwrap();
    assert_eq!(fitted.len(), 6);
    let stats = model.stats.as_ref().unwrap();
    assert!(stats.r2 > 0.8, "r2 = {}", stats.r2);

    reloaded
        .to_svg_file(dir.path().join("map.svg"), &["visits", "income"], 1.0)
        .unwrap();
    reloaded
        .to_kepler_html(dir.path().join("map.html"), &["visits"], 0.5)
        .unwrap();
    let svg = std::fs::read_to_string(dir.path().join("map.svg")).unwrap();
    assert_eq!(svg.matches("<circle").count(), 12);
    assert!(dir.path().join("map.html").exists());

    let db = open_database(dir.path().join("catalog.db")).unwrap();
    let record = parser.create_dataset_record("clinics".into(), &clinics).unwrap();
    record.insert(db.connection()).unwrap();
    ModelRun::new(
        "visits".into(),
        vec!["income".into(), "clinic_density".into()],
        serde_json::to_value(stats).unwrap(),
    )
    .with_dataset(record.id.clone())
    .insert(db.connection())
    .unwrap();

    let found = DatasetQueries::search_by_column(db.connection(), "income").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].content_hash.as_ref().map(String::len), Some(64));
    let runs = ModelRunQueries::get_by_dataset(db.connection(), &record.id).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].explanatory, vec!["income", "clinic_density"]);
}

#[test]
fn sample_keeps_requested_share() {
    let frame = SociomeDataFrame::from_geometry(
        (0..100)
            .map(|i| Some(sociome::types::Geometry::point(i as f64 * 0.001, 41.8)))
            .collect(),
    );
    assert_eq!(frame.sample(0.25).unwrap().len(), 25);
    assert_eq!(frame.sample(1.0).unwrap().len(), 100);
    assert!(frame.sample(0.0).is_err());
}
