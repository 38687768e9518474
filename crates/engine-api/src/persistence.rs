//! SQLite storage for reigns: the live-game table holds a version-tagged
//! snapshot payload, finished reigns land in an append-only ledger with
//! their settlement. The engine itself never sees this layer; it reads
//! and writes the bare snapshot shape.

use std::fmt;
use std::path::Path;

use contracts::{GameConfig, GameSnapshot, ReignSummary, SCHEMA_VERSION_V1};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedGame {
    pub config: GameConfig,
    pub snapshot: GameSnapshot,
}

/// One finished reign as listed by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedGameRecord {
    pub game_id: String,
    pub summary: ReignSummary,
    pub seed: String,
}

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    UnsupportedSchema(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
            Self::UnsupportedSchema(version) => {
                write!(f, "unsupported persisted schema version: {version}")
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

#[derive(Debug)]
pub struct SqliteGameStore {
    conn: Connection,
}

impl SqliteGameStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    /// Upsert the live state of a reign. Called after every resolved
    /// turn; last write wins per game_id.
    pub fn save_game(
        &mut self,
        game_id: &str,
        config: &GameConfig,
        snapshot: &GameSnapshot,
    ) -> Result<(), PersistenceError> {
        let payload = PersistedGame {
            config: config.clone(),
            snapshot: snapshot.clone(),
        };
        let payload_json = serde_json::to_string(&payload)?;
        self.conn.execute(
            "INSERT INTO games (game_id, schema_version, seed, turn, payload_json, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(game_id) DO UPDATE SET
                 schema_version = excluded.schema_version,
                 turn = excluded.turn,
                 payload_json = excluded.payload_json,
                 updated_at = excluded.updated_at",
            params![
                game_id,
                SCHEMA_VERSION_V1,
                config.seed.to_string(),
                i64::try_from(snapshot.turn).unwrap_or(i64::MAX),
                payload_json,
                turn_stamp(snapshot.turn),
            ],
        )?;
        Ok(())
    }

    /// Load a saved reign, failing closed on a schema version this build
    /// does not understand.
    pub fn load_game(&self, game_id: &str) -> Result<Option<PersistedGame>, PersistenceError> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT schema_version, payload_json FROM games WHERE game_id = ?1",
                params![game_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((version, _)) if version != SCHEMA_VERSION_V1 => {
                Err(PersistenceError::UnsupportedSchema(version))
            }
            Some((_, payload)) => Ok(Some(serde_json::from_str::<PersistedGame>(&payload)?)),
            None => Ok(None),
        }
    }

    /// Record a settled reign. Replays of the same settlement are
    /// ignored rather than duplicated.
    pub fn record_completed(
        &mut self,
        game_id: &str,
        config: &GameConfig,
        summary: &ReignSummary,
    ) -> Result<(), PersistenceError> {
        let summary_json = serde_json::to_string(summary)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO completed_games (
                game_id,
                schema_version,
                seed,
                turns_survived,
                prestige,
                summary_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                game_id,
                SCHEMA_VERSION_V1,
                config.seed.to_string(),
                i64::try_from(summary.turns_survived).unwrap_or(i64::MAX),
                summary.prestige,
                summary_json,
            ],
        )?;
        Ok(())
    }

    /// Finished reigns, highest prestige first.
    pub fn list_completed(&self, limit: usize) -> Result<Vec<CompletedGameRecord>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT game_id, seed, summary_json
             FROM completed_games
             ORDER BY prestige DESC, game_id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (game_id, seed, summary_json) = row?;
            records.push(CompletedGameRecord {
                game_id,
                seed,
                summary: serde_json::from_str(&summary_json)?,
            });
        }
        Ok(records)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS games (
                game_id TEXT PRIMARY KEY,
                schema_version TEXT NOT NULL,
                seed TEXT NOT NULL,
                turn INTEGER NOT NULL,
                payload_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS completed_games (
                game_id TEXT PRIMARY KEY,
                schema_version TEXT NOT NULL,
                seed TEXT NOT NULL,
                turns_survived INTEGER NOT NULL,
                prestige INTEGER NOT NULL,
                summary_json TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

fn turn_stamp(turn: u64) -> String {
    format!("turn-{turn:06}")
}

#[cfg(test)]
mod tests {
    use contracts::{EndingId, LegacyTraitId};
    use engine_core::catalog::InMemoryCatalog;
    use engine_core::engine::DecisionEngine;

    use super::*;

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();

        std::env::temp_dir().join(format!("kingdom_store_{name}_{nanos}.sqlite"))
    }

    fn cleanup(path: &std::path::Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
    }

    #[test]
    fn save_and_load_round_trips_a_reign() {
        let db_path = temp_db_path("round_trip");
        let mut store = SqliteGameStore::open(&db_path).expect("open store");

        let config = GameConfig {
            seed: 99,
            ..GameConfig::default()
        };
        let engine = DecisionEngine::new(
            config.clone(),
            Box::new(InMemoryCatalog::default_catalog()),
            Vec::new(),
        );
        let snapshot = engine.snapshot();

        store.save_game("game-99", &config, &snapshot).expect("save");
        let loaded = store.load_game("game-99").expect("load").expect("present");
        assert_eq!(loaded.snapshot, snapshot);
        assert_eq!(loaded.config.seed, 99);

        assert!(store.load_game("game-unknown").expect("load").is_none());
        cleanup(&db_path);
    }

    #[test]
    fn save_overwrites_and_completed_records_do_not_duplicate() {
        let db_path = temp_db_path("upsert");
        let mut store = SqliteGameStore::open(&db_path).expect("open store");

        let config = GameConfig::default();
        let engine = DecisionEngine::new(
            config.clone(),
            Box::new(InMemoryCatalog::default_catalog()),
            Vec::new(),
        );
        let snapshot = engine.snapshot();
        store.save_game("game-1", &config, &snapshot).expect("save");
        store.save_game("game-1", &config, &snapshot).expect("save again");

        let summary = ReignSummary {
            ending: EndingId::LongReign,
            legacy: LegacyTraitId::Steward,
            prestige: 310,
            turns_survived: 120,
        };
        store
            .record_completed("game-1", &config, &summary)
            .expect("record");
        store
            .record_completed("game-1", &config, &summary)
            .expect("record again");

        let completed = store.list_completed(10).expect("list");
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].summary, summary);
        cleanup(&db_path);
    }

    #[test]
    fn completed_games_sort_by_prestige() {
        let db_path = temp_db_path("ranking");
        let mut store = SqliteGameStore::open(&db_path).expect("open store");

        let config = GameConfig::default();
        for (game_id, prestige) in [("game-a", 40), ("game-b", 200), ("game-c", 90)] {
            let summary = ReignSummary {
                ending: EndingId::QuietAbdication,
                legacy: LegacyTraitId::Steward,
                prestige,
                turns_survived: 20,
            };
            store
                .record_completed(game_id, &config, &summary)
                .expect("record");
        }

        let completed = store.list_completed(2).expect("list");
        let ids: Vec<&str> = completed.iter().map(|r| r.game_id.as_str()).collect();
        assert_eq!(ids, vec!["game-b", "game-c"]);
        cleanup(&db_path);
    }
}
