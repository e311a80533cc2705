use anyhow::Result;
use rusqlite::Connection;

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS datasets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            source_path TEXT,
            format TEXT NOT NULL,
            content_hash TEXT,
            row_count INTEGER NOT NULL,
            crs INTEGER,
            subdivisions TEXT NOT NULL,
            columns TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS model_runs (
            id TEXT PRIMARY KEY,
            dataset_id TEXT,
            target TEXT NOT NULL,
            explanatory TEXT NOT NULL,
            stats TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (dataset_id) REFERENCES datasets(id)
        )",
        [],
    )?;

    conn.execute("CREATE INDEX IF NOT EXISTS idx_datasets_name ON datasets(name)", [])?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_datasets_format ON datasets(format)", [])?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_datasets_hash ON datasets(content_hash)", [])?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_model_runs_dataset ON model_runs(dataset_id)", [])?;

    Ok(())
}
