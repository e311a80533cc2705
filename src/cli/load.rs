use super::InputArgs;
use crate::database::open_database;
use anyhow::Result;
use log::info;
use std::path::Path;

pub fn run(catalog: &Path, input: &Path, source: &InputArgs, output: &Path, name: Option<&str>) -> Result<()> {
    let parser = source.parser(input)?;
    let frame = parser.load(source.nrows, source.accessor().as_ref())?;
    info!("Loaded {} rows ({} format)", frame.len(), parser.format);

    frame.to_file(output)?;

    let name = name
        .map(String::from)
        .unwrap_or_else(|| super::default_name(output));
    let record = parser.create_dataset_record(name, &frame)?;
    let db = open_database(catalog)?;
    record.insert(db.connection())?;

    println!("Loaded {} rows from {}", frame.len(), input.display());
    println!("Columns: {}", frame.column_names().join(", "));
    if !frame.subdivisions.is_empty() {
        println!("Subdivisions: {}", frame.subdivisions.join(", "));
    }
    println!("Saved to {} (catalog id {})", output.display(), record.id);
    Ok(())
}
