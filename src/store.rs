//src/store.rs
use crate::sync::AppState;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const DB_FILE_NAME: &str = "workout_sheets.sqlite";
const APP_DATA_DIR: &str = "workout-sheets";
const DATA_ENV_VAR: &str = "WORKOUT_SHEETS_DATA_DIR";

/// The single slot holding the whole application state.
pub const STATE_KEY: &str = "mi-fitness-v10";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Gets the path to the SQLite database file.
pub fn get_db_path() -> Result<PathBuf, Error> {
    let data_dir = match std::env::var(DATA_ENV_VAR).ok() {
        Some(path_str) => PathBuf::from(path_str),
        None => dirs::data_dir().ok_or(Error::DataDir)?.join(APP_DATA_DIR),
    };
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }
    Ok(data_dir.join(DB_FILE_NAME))
}

/// Key/value persistence of [`AppState`] as a JSON blob.
pub struct StateStore {
    conn: Connection,
}

impl StateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// Returns the stored blob as-is, if any.
    pub fn load_raw(&self) -> Result<Option<String>, Error> {
        let raw = self
            .conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![STATE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw)
    }

    /// Restores the saved state. Anything unreadable is discarded and the
    /// default two-empty-sheet state is returned in its place.
    pub fn load(&self) -> Result<AppState, Error> {
        let Some(raw) = self.load_raw()? else {
            debug!("No saved state found, starting with empty sheets");
            return Ok(AppState::default());
        };
        match serde_json::from_str::<AppState>(&raw) {
            Ok(state) if state.is_well_formed() => Ok(state),
            Ok(_) => {
                warn!("Saved state has an unexpected sheet layout, starting with empty sheets");
                Ok(AppState::default())
            }
            Err(e) => {
                warn!("Failed to load saved state: {}", e);
                Ok(AppState::default())
            }
        }
    }

    pub fn save(&self, state: &AppState) -> Result<(), Error> {
        self.save_raw(&serde_json::to_string(state)?)
    }

    /// Overwrites the slot with an arbitrary blob.
    pub fn save_raw(&self, value: &str) -> Result<(), Error> {
        self.conn.execute(
            "INSERT INTO app_state (key, value, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, saved_at = excluded.saved_at",
            params![STATE_KEY, value, Utc::now()],
        )?;
        Ok(())
    }

    pub fn saved_at(&self) -> Result<Option<DateTime<Utc>>, Error> {
        let saved_at = self
            .conn
            .query_row(
                "SELECT saved_at FROM app_state WHERE key = ?1",
                params![STATE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(saved_at)
    }

    pub fn clear(&self) -> Result<(), Error> {
        self.conn
            .execute("DELETE FROM app_state WHERE key = ?1", params![STATE_KEY])?;
        Ok(())
    }
}
