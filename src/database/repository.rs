/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API over the subtitle store,
 * abstracting away the SQL details.
 */

use anyhow::Result;
use chrono::Utc;
use log::{debug, info};
use rusqlite::{params, Connection, Row};
use std::path::Path;

use super::connection::{DatabaseConnection, DatabaseStats};
use super::models::{MediaRecord, SubtitleRecord};
use crate::segment::Segment;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

const SUBTITLE_COLUMNS: &str = "media_path, language, seq_num, start_time, end_time, text, confidence";

fn subtitle_from_row(row: &Row) -> rusqlite::Result<SubtitleRecord> {
    Ok(SubtitleRecord {
        media_path: row.get(0)?,
        language: row.get(1)?,
        seq_num: row.get::<_, i64>(2)? as usize,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        text: row.get(5)?,
        confidence: row.get(6)?,
    })
}

/// Escape LIKE wildcards so the query matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open the database at `path`, or at the default location
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let db = match path {
            Some(path) => DatabaseConnection::new(path)?,
            None => DatabaseConnection::new(DatabaseConnection::default_database_path()?)?,
        };
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    /// Replace the stored subtitles of `media_path` in `language`
    pub async fn store_subtitles(&self, media_path: &str, language: &str, segments: &[Segment]) -> Result<usize> {
        let records: Vec<SubtitleRecord> = segments
            .iter()
            .map(|segment| SubtitleRecord::from_segment(media_path, language, segment))
            .collect();
        let media_path = media_path.to_string();
        let language = language.to_string();
        let now = Utc::now().to_rfc3339();

        let stored = self
            .db
            .transaction_async(move |tx| {
                tx.execute(
                    "INSERT INTO media (path, processed_at) VALUES (?1, ?2)
                     ON CONFLICT(path) DO UPDATE SET processed_at = excluded.processed_at",
                    params![media_path, now],
                )?;
                tx.execute(
                    "DELETE FROM subtitles WHERE media_path = ?1 AND language = ?2",
                    params![media_path, language],
                )?;

                let mut stmt = tx.prepare(
                    "INSERT INTO subtitles (media_path, language, seq_num, start_time, end_time, text, confidence, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;
                for record in &records {
                    stmt.execute(params![
                        record.media_path,
                        record.language,
                        record.seq_num as i64,
                        record.start_time,
                        record.end_time,
                        record.text,
                        record.confidence,
                        now,
                    ])?;
                }

                Ok(records.len())
            })
            .await?;

        info!("Stored {} subtitles", stored);
        Ok(stored)
    }

    /// Subtitles of one input, optionally restricted to a language, in order
    pub async fn get_subtitles(&self, media_path: &str, language: Option<&str>) -> Result<Vec<SubtitleRecord>> {
        let media_path = media_path.to_string();
        let language = language.map(str::to_string);

        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    "SELECT {} FROM subtitles WHERE media_path = ?1 AND (?2 IS NULL OR language = ?2)
                     ORDER BY language, seq_num",
                    SUBTITLE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![media_path, language], subtitle_from_row)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    /// Subtitles whose text contains `query`, optionally within one input
    pub async fn search_subtitles(&self, query: &str, media_path: Option<&str>) -> Result<Vec<SubtitleRecord>> {
        let pattern = like_pattern(query);
        let media_path = media_path.map(str::to_string);

        let found = self
            .db
            .execute_async(move |conn| {
                let sql = format!(
                    "SELECT {} FROM subtitles
                     WHERE text LIKE ?1 ESCAPE '\\' AND (?2 IS NULL OR media_path = ?2)
                     ORDER BY media_path, language, start_time",
                    SUBTITLE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![pattern, media_path], subtitle_from_row)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;

        debug!("Found {} subtitles matching '{}'", found.len(), query);
        Ok(found)
    }

    /// Every processed input, most recent first
    pub async fn processed_media(&self) -> Result<Vec<MediaRecord>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare("SELECT path, processed_at FROM media ORDER BY processed_at DESC, path")?;
                let rows = stmt.query_map([], |row| {
                    Ok(MediaRecord {
                        path: row.get(0)?,
                        processed_at: row.get(1)?,
                    })
                })?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    /// Number of stored subtitles for one input, all languages
    pub async fn subtitle_count(&self, media_path: &str) -> Result<usize> {
        let media_path = media_path.to_string();

        self.db
            .execute_async(move |conn| Self::count_sync(conn, &media_path))
            .await
    }

    fn count_sync(conn: &Connection, media_path: &str) -> Result<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subtitles WHERE media_path = ?1",
            [media_path],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Remove an input and all of its subtitles
    pub async fn delete_media(&self, media_path: &str) -> Result<bool> {
        let media_path = media_path.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM media WHERE path = ?1", [media_path])?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.db.stats()
    }
}
