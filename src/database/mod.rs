/*!
 * Database module for persistent storage of processed subtitles.
 *
 * This module provides SQLite-based persistence for:
 * - Processed inputs and when they were last run
 * - Final subtitle sequences per input and language, searchable by text
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use models::{MediaRecord, SubtitleRecord};
pub use repository::Repository;
