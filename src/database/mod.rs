//! SQLite catalog of the datasets and model runs the toolkit has produced.

pub mod models;
pub mod schema;
pub mod queries;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub use queries::*;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog {}", path.display()))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self { conn })
    }

    /// Catalog that lives only as long as this handle.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self { conn })
    }

    pub fn init_schema(&self) -> Result<()> {
        schema::create_tables(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub fn open_database<P: AsRef<Path>>(path: P) -> Result<Database> {
    let db = Database::new(path)?;
    db.init_schema()?;
    Ok(db)
}
