use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// One finished duel as stored locally.
#[derive(Debug, Clone, Serialize)]
pub struct DuelRecord {
    pub opponent: String,
    pub level: u8,
    pub score: u32,
    pub total_rounds: u32,
    pub timestamp: DateTime<Local>,
}

/// Database of finished duels, kept under the XDG state dir.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("wattquiz_duels.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS duels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                opponent TEXT NOT NULL,
                level INTEGER NOT NULL,
                score INTEGER NOT NULL,
                total_rounds INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_duels_level ON duels(level)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record(&self, duel: &DuelRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO duels (opponent, level, score, total_rounds, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                duel.opponent,
                duel.level,
                duel.score,
                duel.total_rounds,
                duel.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Most recent duels first.
    pub fn recent(&self, limit: usize) -> Result<Vec<DuelRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT opponent, level, score, total_rounds, timestamp
            FROM duels
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit], |row| {
            let timestamp_str: String = row.get(4)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        4,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(DuelRecord {
                opponent: row.get(0)?,
                level: row.get(1)?,
                score: row.get(2)?,
                total_rounds: row.get(3)?,
                timestamp,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    pub fn best_score(&self, level: u8) -> Result<Option<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT MAX(score) FROM duels WHERE level = ?1")?;

        let best: Option<u32> = stmt.query_row([level], |row| row.get(0))?;
        Ok(best)
    }

    pub fn duel_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM duels", [], |row| row.get(0))
    }
}

/// Append a finished duel to the CSV result log next to the config file.
pub fn append_result_log(record: &DuelRecord) -> io::Result<()> {
    if let Some(log_path) = AppDirs::log_path() {
        append_result_log_to(record, &log_path)?;
    }
    Ok(())
}

pub fn append_result_log_to(record: &DuelRecord, log_path: &Path) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // If the log doesn't exist yet, we need to emit a header
    let needs_header = !log_path.exists();

    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(log_file);

    writer
        .serialize(record)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writer.flush()
}
