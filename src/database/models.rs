use crate::types::{DatasetRecord, ModelRun, SourceFormat};
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::str::FromStr;

fn text_error(column: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(0, column.to_string(), Type::Text)
}

fn timestamp(row: &Row, column: &str) -> Result<chrono::DateTime<chrono::Utc>, rusqlite::Error> {
    let raw: String = row.get(column)?;
    chrono::DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&chrono::Utc))
        .map_err(|_| text_error(column))
}

fn string_list(row: &Row, column: &str) -> Result<Vec<String>, rusqlite::Error> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|_| text_error(column))
}

impl DatasetRecord {
    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        let format: String = row.get("format")?;
        let row_count: i64 = row.get("row_count")?;
        let crs: Option<i64> = row.get("crs")?;

        Ok(DatasetRecord {
            id: row.get("id")?,
            name: row.get("name")?,
            source_path: row.get("source_path")?,
            format: SourceFormat::from_str(&format).map_err(|_| text_error("format"))?,
            content_hash: row.get("content_hash")?,
            row_count: row_count.max(0) as usize,
            crs: crs.map(|c| c as u32),
            subdivisions: string_list(row, "subdivisions")?,
            columns: string_list(row, "columns")?,
            created_at: timestamp(row, "created_at")?,
        })
    }

    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO datasets (id, name, source_path, format, content_hash, row_count, crs, subdivisions, columns, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                &self.id,
                &self.name,
                &self.source_path,
                &self.format.to_string(),
                &self.content_hash,
                self.row_count as i64,
                self.crs.map(i64::from),
                serde_json::to_string(&self.subdivisions)?,
                serde_json::to_string(&self.columns)?,
                &self.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl ModelRun {
    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        let stats: String = row.get("stats")?;
        Ok(ModelRun {
            id: row.get("id")?,
            dataset_id: row.get("dataset_id")?,
            target: row.get("target")?,
            explanatory: string_list(row, "explanatory")?,
            stats: serde_json::from_str(&stats).map_err(|_| text_error("stats"))?,
            created_at: timestamp(row, "created_at")?,
        })
    }

    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO model_runs (id, dataset_id, target, explanatory, stats, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &self.id,
                &self.dataset_id,
                &self.target,
                serde_json::to_string(&self.explanatory)?,
                serde_json::to_string(&self.stats)?,
                &self.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
