//! Relational catalog of loaded repositories
//!
//! Maps `(repo_url, tool_chain)` to the vector table that holds its commits.

use crate::error::CatalogError;
use crate::git::repo_url_to_table_name;
use crate::toolchain::ToolChainKind;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub const CATALOG_TABLE: &str = "time_machine_catalog";

const CREATE_CATALOG_SQL: &str = "CREATE TABLE IF NOT EXISTS time_machine_catalog (
    repo_url   TEXT NOT NULL,
    table_name TEXT NOT NULL,
    tool_chain TEXT NOT NULL,
    PRIMARY KEY (repo_url, tool_chain)
)";

/// One catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub repo_url: String,
    pub table_name: String,
    pub tool_chain: String,
}

pub struct Catalog {
    conn: Mutex<Connection>,
}

impl Catalog {
    /// Open (or create) the catalog database at `path`
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::OpenFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| CatalogError::OpenFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!("Opened catalog at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory().map_err(|e| CatalogError::OpenFailed {
            path: ":memory:".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, CatalogError> {
        conn.execute_batch(CREATE_CATALOG_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn.lock().map_err(|_| CatalogError::LockPoisoned)
    }

    /// Replace the entry for `(repo_url, tool_chain)` and return its table name
    pub fn record(&self, repo_url: &str, tool_chain: ToolChainKind) -> Result<String, CatalogError> {
        let table_name = repo_url_to_table_name(repo_url, tool_chain.as_str());

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM time_machine_catalog WHERE repo_url = ?1 AND tool_chain = ?2",
            params![repo_url, tool_chain.as_str()],
        )?;
        tx.execute(
            "INSERT INTO time_machine_catalog (repo_url, table_name, tool_chain) VALUES (?1, ?2, ?3)",
            params![repo_url, table_name, tool_chain.as_str()],
        )?;
        tx.commit()?;

        tracing::info!(
            repo_url = %repo_url,
            tool_chain = %tool_chain,
            table = %table_name,
            "Recorded catalog entry"
        );
        Ok(table_name)
    }

    /// `repo_url -> table_name` for one tool chain; empty when the catalog
    /// table does not exist
    pub fn read(&self, tool_chain: ToolChainKind) -> Result<BTreeMap<String, String>, CatalogError> {
        let conn = self.lock()?;
        if !Self::catalog_table_exists(&conn)? {
            return Ok(BTreeMap::new());
        }

        let mut stmt = conn.prepare(
            "SELECT repo_url, table_name FROM time_machine_catalog WHERE tool_chain = ?1",
        )?;
        let rows = stmt.query_map([tool_chain.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = BTreeMap::new();
        for row in rows {
            let (repo_url, table_name) = row?;
            map.insert(repo_url, table_name);
        }
        Ok(map)
    }

    /// Table holding `repo_url` for `tool_chain`
    pub fn lookup(&self, repo_url: &str, tool_chain: ToolChainKind) -> Result<String, CatalogError> {
        let conn = self.lock()?;
        let found = if Self::catalog_table_exists(&conn)? {
            conn.query_row(
                "SELECT table_name FROM time_machine_catalog WHERE repo_url = ?1 AND tool_chain = ?2",
                params![repo_url, tool_chain.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?
        } else {
            None
        };

        found.ok_or_else(|| CatalogError::EntryNotFound {
            repo_url: repo_url.to_string(),
            tool_chain: tool_chain.to_string(),
        })
    }

    /// Every row, ordered by tool chain then repository
    pub fn entries(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let conn = self.lock()?;
        if !Self::catalog_table_exists(&conn)? {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
            "SELECT repo_url, table_name, tool_chain FROM time_machine_catalog
             ORDER BY tool_chain, repo_url",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(CatalogEntry {
                    repo_url: row.get(0)?,
                    table_name: row.get(1)?,
                    tool_chain: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn catalog_table_exists(conn: &Connection) -> Result<bool, CatalogError> {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [CATALOG_TABLE],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
