use crate::database::{catalog_stats, export_catalog, import_catalog, open_database, CatalogExport, DatasetQueries};
use crate::types::DatasetRecord;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

pub fn init(db_path: &Path) -> Result<()> {
    open_database(db_path)?;
    info!("Catalog schema initialized successfully");
    Ok(())
}

pub fn stats(db_path: &Path) -> Result<()> {
    let db = open_database(db_path)?;
    let stats = catalog_stats(db.connection())?;

    println!("Catalog Statistics:");
    println!("==================");
    let mut formats: Vec<_> = stats.by_format.iter().collect();
    formats.sort();
    for (format, count) in formats {
        println!("{}: {}", format, count);
    }
    println!("==================");
    println!("Total datasets: {}", stats.datasets);
    println!("Total rows: {}", stats.total_rows);
    println!("Total model runs: {}", stats.model_runs);
    Ok(())
}

fn print_records(records: &[DatasetRecord]) {
    if records.is_empty() {
        println!("No datasets found");
        return;
    }
    for record in records {
        println!(
            "{}  {:<24} {:<8} {:>8} rows  {}",
            record.id,
            record.name,
            record.format,
            record.row_count,
            record.source_path.as_deref().unwrap_or("-")
        );
    }
}

pub fn list(db_path: &Path) -> Result<()> {
    let db = open_database(db_path)?;
    print_records(&DatasetQueries::get_all(db.connection())?);
    Ok(())
}

pub fn search(db_path: &Path, name: Option<&str>, column: Option<&str>) -> Result<()> {
    let db = open_database(db_path)?;
    let conn = db.connection();
    let mut records = match name {
        Some(pattern) => DatasetQueries::get_by_name_pattern(conn, pattern)?,
        None => DatasetQueries::get_all(conn)?,
    };
    if let Some(column) = column {
        let ids: Vec<String> = DatasetQueries::search_by_column(conn, column)?
            .into_iter()
            .map(|r| r.id)
            .collect();
        records.retain(|r| ids.contains(&r.id));
    }
    print_records(&records);
    Ok(())
}

pub fn export(db_path: &Path, export_path: &Path) -> Result<()> {
    let db = open_database(db_path)?;
    let export = export_catalog(db.connection())?;
    std::fs::write(export_path, serde_json::to_string_pretty(&export)?)
        .with_context(|| format!("Failed to write {}", export_path.display()))?;
    info!(
        "Exported {} datasets and {} model runs to {}",
        export.datasets.len(),
        export.model_runs.len(),
        export_path.display()
    );
    Ok(())
}

pub fn import(db_path: &Path, import_path: &Path) -> Result<()> {
    let db = open_database(db_path)?;
    let text = std::fs::read_to_string(import_path)
        .with_context(|| format!("Failed to read {}", import_path.display()))?;
    let export: CatalogExport = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a catalog export", import_path.display()))?;
    let (datasets, runs) = import_catalog(db.connection(), &export)?;
    info!(
        "Imported {} datasets and {} model runs from {}",
        datasets,
        runs,
        import_path.display()
    );
    Ok(())
}
