use crate::types::{DatasetRecord, ModelRun};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DATASET_COLUMNS: &str =
    "id, name, source_path, format, content_hash, row_count, crs, subdivisions, columns, created_at";

pub struct DatasetQueries;

impl DatasetQueries {
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<DatasetRecord>> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM datasets WHERE id = ?1", DATASET_COLUMNS))?;
        let record = stmt.query_row([id], |row| DatasetRecord::from_row(row)).optional()?;
        Ok(record)
    }

    /// Most recent dataset carrying exactly this name.
    pub fn get_latest_by_name(conn: &Connection, name: &str) -> Result<Option<DatasetRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM datasets WHERE name = ?1 ORDER BY created_at DESC LIMIT 1",
            DATASET_COLUMNS
        ))?;
        let record = stmt.query_row([name], |row| DatasetRecord::from_row(row)).optional()?;
        Ok(record)
    }

    pub fn get_by_name_pattern(conn: &Connection, pattern: &str) -> Result<Vec<DatasetRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM datasets WHERE name LIKE ?1 ORDER BY name",
            DATASET_COLUMNS
        ))?;
        let rows = stmt.query_map([format!("%{}%", pattern)], |row| DatasetRecord::from_row(row))?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Datasets that carry a column with exactly this name.
    pub fn search_by_column(conn: &Connection, column: &str) -> Result<Vec<DatasetRecord>> {
        let needle = serde_json::to_string(column)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM datasets WHERE columns LIKE ?1 ESCAPE '\\' ORDER BY name",
            DATASET_COLUMNS
        ))?;
        let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let rows = stmt.query_map([format!("%{}%", escaped)], |row| DatasetRecord::from_row(row))?;

        let mut records = Vec::new();
        for record in rows {
            let record = record?;
            if record.columns.iter().any(|c| c == column) {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn get_all(conn: &Connection) -> Result<Vec<DatasetRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM datasets ORDER BY format, name",
            DATASET_COLUMNS
        ))?;
        let rows = stmt.query_map([], |row| DatasetRecord::from_row(row))?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn count_by_format(conn: &Connection) -> Result<HashMap<String, i64>> {
        let mut stmt = conn.prepare("SELECT format, COUNT(*) as count FROM datasets GROUP BY format")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>("format")?, row.get::<_, i64>("count")?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (format, count) = row?;
            counts.insert(format, count);
        }
        Ok(counts)
    }
}

pub struct ModelRunQueries;

impl ModelRunQueries {
    pub fn get_by_dataset(conn: &Connection, dataset_id: &str) -> Result<Vec<ModelRun>> {
        let mut stmt = conn.prepare(
            "SELECT id, dataset_id, target, explanatory, stats, created_at
             FROM model_runs WHERE dataset_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([dataset_id], |row| ModelRun::from_row(row))?;

        let mut runs = Vec::new();
        for run in rows {
            runs.push(run?);
        }
        Ok(runs)
    }

    pub fn get_all(conn: &Connection) -> Result<Vec<ModelRun>> {
        let mut stmt = conn.prepare(
            "SELECT id, dataset_id, target, explanatory, stats, created_at
             FROM model_runs ORDER BY created_at",
        )?;
        let rows = stmt.query_map([], |row| ModelRun::from_row(row))?;

        let mut runs = Vec::new();
        for run in rows {
            runs.push(run?);
        }
        Ok(runs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub datasets: i64,
    pub model_runs: i64,
    pub total_rows: i64,
    pub by_format: HashMap<String, i64>,
}

pub fn catalog_stats(conn: &Connection) -> Result<CatalogStats> {
    let datasets: i64 = conn.query_row("SELECT COUNT(*) FROM datasets", [], |row| row.get(0))?;
    let model_runs: i64 = conn.query_row("SELECT COUNT(*) FROM model_runs", [], |row| row.get(0))?;
    let total_rows: i64 =
        conn.query_row("SELECT COALESCE(SUM(row_count), 0) FROM datasets", [], |row| row.get(0))?;
    Ok(CatalogStats {
        datasets,
        model_runs,
        total_rows,
        by_format: DatasetQueries::count_by_format(conn)?,
    })
}

/// Whole-catalog snapshot used for JSON export and import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogExport {
    pub datasets: Vec<DatasetRecord>,
    pub model_runs: Vec<ModelRun>,
}

pub fn export_catalog(conn: &Connection) -> Result<CatalogExport> {
    Ok(CatalogExport {
        datasets: DatasetQueries::get_all(conn)?,
        model_runs: ModelRunQueries::get_all(conn)?,
    })
}

/// Insert every entry of `export` whose id is not already present. Returns
/// the number of datasets and model runs added.
pub fn import_catalog(conn: &Connection, export: &CatalogExport) -> Result<(usize, usize)> {
    let mut datasets = 0;
    for record in &export.datasets {
        if DatasetQueries::get_by_id(conn, &record.id)?.is_none() {
            record
                .insert(conn)
                .with_context(|| format!("Failed to import dataset {}", record.name))?;
            datasets += 1;
        }
    }

    let mut runs = 0;
    for run in &export.model_runs {
        let exists: Option<String> = conn
            .query_row("SELECT id FROM model_runs WHERE id = ?1", [&run.id], |row| row.get(0))
            .optional()?;
        if exists.is_none() {
            run.insert(conn)
                .with_context(|| format!("Failed to import model run {}", run.id))?;
            runs += 1;
        }
    }
    Ok((datasets, runs))
}
