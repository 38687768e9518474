//! In-process facade over the decision engine: game lifecycle, optional
//! SQLite autosave, settlement records, and the HTTP surface.

mod persistence;
mod server;

use std::path::Path;

use contracts::{
    ChoiceSide, DailyChallenge, GameConfig, GameSnapshot, ReignSummary, ResourceKind,
    TurnResolution,
};
use engine_core::catalog::InMemoryCatalog;
use engine_core::daily;
use engine_core::engine::{DecisionEngine, EngineError, PendingEvent, TurnPhase};

pub use persistence::{CompletedGameRecord, PersistedGame, PersistenceError, SqliteGameStore};
pub use server::{serve, ServerError};

/// One live reign plus its optional backing store. Single-writer, like
/// the engine it wraps.
#[derive(Debug)]
pub struct GameApi {
    engine: DecisionEngine,
    game_id: String,
    store: Option<SqliteGameStore>,
    last_persistence_error: Option<String>,
}

impl GameApi {
    pub fn from_config(config: GameConfig) -> Self {
        let game_id = game_id_for_seed(config.seed);
        let engine = DecisionEngine::new(
            config,
            Box::new(InMemoryCatalog::default_catalog()),
            Vec::new(),
        );
        Self {
            engine,
            game_id,
            store: None,
            last_persistence_error: None,
        }
    }

    /// A reign set up from the shared daily challenge: seeded rng,
    /// derived era and baseline, and the day's modifier hook active.
    pub fn from_daily_challenge(challenge: &DailyChallenge) -> Self {
        let engine =
            daily::engine_for_challenge(challenge, Box::new(InMemoryCatalog::default_catalog()));
        Self {
            game_id: format!("daily-{}", challenge.date_key),
            engine,
            store: None,
            last_persistence_error: None,
        }
    }

    /// Resume a saved reign from a store, if one is present under this
    /// game_id.
    pub fn resume(
        path: impl AsRef<Path>,
        game_id: &str,
    ) -> Result<Option<Self>, PersistenceError> {
        let store = SqliteGameStore::open(path)?;
        let Some(persisted) = store.load_game(game_id)? else {
            return Ok(None);
        };
        let engine = DecisionEngine::restore(
            persisted.config,
            Box::new(InMemoryCatalog::default_catalog()),
            Vec::new(),
            &persisted.snapshot,
        );
        Ok(Some(Self {
            engine,
            game_id: game_id.to_string(),
            store: Some(store),
            last_persistence_error: None,
        }))
    }

    pub fn attach_sqlite_store(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let mut store = SqliteGameStore::open(path)?;
        store.save_game(&self.game_id, self.engine.config(), &self.engine.snapshot())?;
        self.store = Some(store);
        Ok(())
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn config(&self) -> &GameConfig {
        self.engine.config()
    }

    pub fn phase(&self) -> TurnPhase {
        self.engine.phase()
    }

    pub fn pending(&self) -> Option<&PendingEvent> {
        self.engine.pending()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.engine.snapshot()
    }

    pub fn turn_log(&self) -> &[TurnResolution] {
        self.engine.turn_log()
    }

    /// Persistence is best-effort: a failed autosave is reported here
    /// rather than failing the turn that triggered it.
    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    pub fn draw_event(&mut self) -> Result<PendingEvent, EngineError> {
        self.engine.draw_event()
    }

    pub fn preview(&self, side: ChoiceSide) -> Result<Vec<(ResourceKind, i64)>, EngineError> {
        self.engine.preview(side)
    }

    pub fn choose(&mut self, side: ChoiceSide) -> Result<TurnResolution, EngineError> {
        let resolution = self.engine.choose(side)?;
        self.autosave();
        Ok(resolution)
    }

    pub fn force_priority_event(&mut self, event_id: &str) -> Result<(), EngineError> {
        self.engine.force_priority_event(event_id)
    }

    pub fn abdicate(&mut self) -> Result<(), EngineError> {
        self.engine.abdicate()?;
        self.autosave();
        Ok(())
    }

    /// Settle the reign and, when a store is attached, record the
    /// settlement for the completed-games ledger.
    pub fn conclude(&mut self) -> Result<ReignSummary, EngineError> {
        let summary = self.engine.conclude()?;
        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.record_completed(
                &self.game_id,
                self.engine.config(),
                &summary,
            ) {
                self.last_persistence_error = Some(err.to_string());
            }
        }
        Ok(summary)
    }

    pub fn autoplay(&mut self, max_turns: u64) -> Result<ReignSummary, EngineError> {
        let summary = self.engine.autoplay(max_turns)?;
        self.autosave();
        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.record_completed(
                &self.game_id,
                self.engine.config(),
                &summary,
            ) {
                self.last_persistence_error = Some(err.to_string());
            }
        }
        Ok(summary)
    }

    fn autosave(&mut self) {
        let snapshot = self.engine.snapshot();
        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.save_game(&self.game_id, self.engine.config(), &snapshot) {
                self.last_persistence_error = Some(err.to_string());
            }
        }
    }
}

fn game_id_for_seed(seed: u64) -> String {
    format!("game-{seed:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();

        std::env::temp_dir().join(format!("kingdom_api_{name}_{nanos}.sqlite"))
    }

    fn cleanup(path: &std::path::Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
    }

    #[test]
    fn plays_a_turn_through_the_facade() {
        let mut api = GameApi::from_config(GameConfig::default());
        let pending = api.draw_event().expect("draw");
        let deltas = api.preview(ChoiceSide::Left).expect("preview");
        assert!(!pending.event.event_id.is_empty());
        assert!(!deltas.is_empty() || pending.event.left.effects.is_empty());

        let resolution = api.choose(ChoiceSide::Left).expect("choose");
        assert_eq!(resolution.turn, 1);
    }

    #[test]
    fn autosaves_and_resumes_through_sqlite() {
        let db_path = temp_db_path("resume");
        let config = GameConfig {
            seed: 1234,
            ..GameConfig::default()
        };
        let game_id;
        {
            let mut api = GameApi::from_config(config);
            api.attach_sqlite_store(&db_path).expect("attach");
            game_id = api.game_id().to_string();
            for _ in 0..3 {
                api.draw_event().expect("draw");
                api.choose(ChoiceSide::Right).expect("choose");
            }
        }

        let resumed = GameApi::resume(&db_path, &game_id)
            .expect("open")
            .expect("saved game present");
        assert_eq!(resumed.snapshot().turn, 4);
        assert!(GameApi::resume(&db_path, "game-missing").expect("open").is_none());
        cleanup(&db_path);
    }

    #[test]
    fn completed_reigns_land_in_the_ledger() {
        let db_path = temp_db_path("ledger");
        let mut api = GameApi::from_config(GameConfig {
            seed: 77,
            ..GameConfig::default()
        });
        api.attach_sqlite_store(&db_path).expect("attach");
        let summary = api.autoplay(300).expect("autoplay");
        assert!(api.last_persistence_error().is_none());

        let store = SqliteGameStore::open(&db_path).expect("open");
        let completed = store.list_completed(5).expect("list");
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].summary, summary);
        cleanup(&db_path);
    }

    #[test]
    fn daily_games_share_an_id_per_date() {
        let challenge = engine_core::daily::challenge_for_date(2026, 5, 2);
        let api = GameApi::from_daily_challenge(&challenge);
        assert_eq!(api.game_id(), "daily-2026-05-02");
    }
}
