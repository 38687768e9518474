//! Snapshot conversion. The engine reads and writes the bare state
//! shape; version-tagging and storage belong to the persistence layer.

use contracts::{GameConfig, GameSnapshot, SCHEMA_VERSION_V1};

use super::{DecisionEngine, GameState, TurnPhase};
use crate::catalog::EventCatalog;
use crate::modifier::SelectionModifier;
use crate::rng::{mix_seed, SplitMix64};

impl GameState {
    pub fn to_snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            turn: self.turn,
            era: self.era,
            resources: *self.ledger.resources(),
            flags: self.flags.iter().cloned().collect(),
            history: self.history.clone(),
            triggered_queue: self.triggered_queue.iter().cloned().collect(),
            priority_queue: self.priority_queue.iter().cloned().collect(),
            characters: self.characters.clone(),
            terminal_reason: self.terminal,
        }
    }

    pub fn from_snapshot(snapshot: &GameSnapshot) -> Self {
        Self {
            turn: snapshot.turn,
            era: snapshot.era,
            ledger: crate::ledger::ResourceLedger::new(snapshot.resources),
            flags: snapshot.flags.iter().cloned().collect(),
            history: snapshot.history.clone(),
            triggered_queue: snapshot.triggered_queue.iter().cloned().collect(),
            priority_queue: snapshot.priority_queue.iter().cloned().collect(),
            characters: snapshot.characters.clone(),
            terminal: snapshot.terminal_reason,
        }
    }
}

impl DecisionEngine {
    pub fn snapshot(&self) -> GameSnapshot {
        self.state.to_snapshot()
    }

    /// Rebuild an engine around a saved state. The random stream is
    /// reseeded from the config seed mixed with the saved turn, so a
    /// restored game is deterministic per (seed, turn) rather than a
    /// bit-exact continuation of the interrupted stream.
    pub fn restore(
        config: GameConfig,
        catalog: Box<dyn EventCatalog>,
        modifiers: Vec<Box<dyn SelectionModifier>>,
        snapshot: &GameSnapshot,
    ) -> Self {
        let state = GameState::from_snapshot(snapshot);
        let phase = if state.is_terminal() {
            TurnPhase::Terminal
        } else {
            TurnPhase::AwaitingChoice
        };
        let rng = Box::new(SplitMix64::from_seed(mix_seed(config.seed, state.turn)));
        Self {
            config,
            state,
            catalog,
            rng,
            modifiers,
            phase,
            pending: None,
            turn_log: Vec::new(),
        }
    }
}
