use super::{as_strs, save_and_register};
use crate::database::{open_database, DatasetQueries};
use crate::frame::SociomeDataFrame;
use crate::ml::GeospatialLinearModel;
use crate::parser::calculate_file_hash;
use crate::types::ModelRun;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

#[allow(clippy::too_many_arguments)]
pub fn run(
    catalog: &Path,
    input: &Path,
    target: &str,
    explanatory: &[String],
    alpha: f64,
    prediction: &str,
    residual: &str,
    output: &Path,
    stats_path: Option<&Path>,
) -> Result<()> {
    let frame = SociomeDataFrame::from_save_file(input, None)?;
    let mut model = GeospatialLinearModel::new(target, &as_strs(explanatory)).with_alpha(alpha);
    let fitted = model.fit(&frame, prediction, residual)?;
    let stats = model
        .stats
        .as_ref()
        .context("Model produced no statistics")?;

    println!("Model: {} ~ {}", target, explanatory.join(" + "));
    println!("==================");
    println!("IC:  {:.4}", stats.ic);
    println!("MSE: {:.4}", stats.mse);
    println!("R2:  {:.4}", stats.r2);
    println!("Intercept: {:.4}", stats.intercept);
    println!("Effects (ascending |coefficient|):");
    for row in &stats.effects_table {
        println!("  {:<24} {:>10.4}", row.variable, row.coefficient);
    }
    println!("IC table (ascending |IC|):");
    for row in &stats.ic_table {
        println!("  {:<24} {:>10.4}", row.variable, row.ic);
    }

    let stats_json = serde_json::to_value(stats)?;
    if let Some(path) = stats_path {
        std::fs::write(path, serde_json::to_string_pretty(&stats_json)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Fit statistics written to {}", path.display());
    }

    save_and_register(catalog, &fitted, output, None)?;

    // Attach the run to the input dataset when the catalog already knows it.
    let db = open_database(catalog)?;
    let conn = db.connection();
    let input_hash = calculate_file_hash(input)?;
    let mut run = ModelRun::new(target.to_string(), explanatory.to_vec(), stats_json);
    let known = DatasetQueries::get_all(conn)?
        .into_iter()
        .find(|d| d.content_hash.as_deref() == Some(input_hash.as_str()));
    if let Some(dataset) = known {
        run = run.with_dataset(dataset.id);
    }
    run.insert(conn)?;
    info!("Recorded model run {}", run.id);
    Ok(())
}
