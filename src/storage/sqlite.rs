//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the LinkStore trait.

use crate::state::LinkStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LinkStore, StorageError, StorageResult};
use crate::storage::{Link, NewLink};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const LINK_COLUMNS: &str = "id, provider, url, status, added_at, updated_at";

/// SQLite link frontier backend
pub struct SqliteLinkStore {
    conn: Connection,
}

impl SqliteLinkStore {
    /// Opens or creates a link store at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteLinkStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn get_link(&self, id: i64) -> StorageResult<Option<Link>> {
        let sql = format!("SELECT {} FROM links WHERE id = ?1", LINK_COLUMNS);
        let link = self
            .conn
            .query_row(&sql, params![id], link_from_row)
            .optional()?;
        Ok(link)
    }
}

/// Maps a `links` row onto a Link
fn link_from_row(row: &Row<'_>) -> rusqlite::Result<Link> {
    let status: String = row.get(3)?;
    let status = LinkStatus::from_db_string(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            Box::new(StorageError::UnknownStatus(status.clone())),
        )
    })?;

    Ok(Link {
        id: row.get(0)?,
        provider: row.get(1)?,
        url: row.get(2)?,
        status,
        added_at: parse_timestamp(row, 4)?,
        updated_at: parse_timestamp(row, 5)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl LinkStore for SqliteLinkStore {
    fn add_if_new(&mut self, link: NewLink) -> StorageResult<Option<Link>> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO links (provider, url, status, added_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![link.provider, link.url, link.status.to_db_string(), now],
        )?;

        if inserted == 0 {
            return Ok(None);
        }

        self.get_link(self.conn.last_insert_rowid())
    }

    fn change_status(&mut self, id: i64, status: LinkStatus) -> StorageResult<()> {
        let current = self
            .get_link(id)?
            .ok_or(StorageError::LinkNotFound(id))?
            .status;

        if !current.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                from: current,
                to: status,
            });
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE links SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, id],
        )?;
        Ok(())
    }

    fn find_by_provider_and_status(
        &self,
        provider: &str,
        status: LinkStatus,
        limit: usize,
    ) -> StorageResult<Vec<Link>> {
        let sql = format!(
            "SELECT {} FROM links WHERE provider = ?1 AND status = ?2 LIMIT ?3",
            LINK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let links = stmt
            .query_map(
                params![provider, status.to_db_string(), limit],
                link_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn count_by_provider_and_status(
        &self,
        provider: &str,
        status: LinkStatus,
    ) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM links WHERE provider = ?1 AND status = ?2",
            params![provider, status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_by_provider(&self, provider: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM links WHERE provider = ?1",
            params![provider],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn delete_all(&mut self, provider: &str) -> StorageResult<u64> {
        let deleted = self
            .conn
            .execute("DELETE FROM links WHERE provider = ?1", params![provider])?;
        Ok(deleted as u64)
    }
}
