//! Turn Controller: owns one reign's state and drives the
//! draw / preview / choose cycle until a terminal reason lands.
//!
//! The engine is single-writer and synchronous. One `DecisionEngine`
//! owns one `GameState` exclusively; all randomness flows through the
//! injected [`RandomSource`], never ambient state. Terminal is
//! absorbing: a finished reign accepts no further choices, and a fresh
//! engine must be constructed to play again.

mod snapshot;
#[cfg(test)]
mod tests;
mod turn;

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use contracts::{
    CharacterState, Era, EventDef, GameConfig, SelectionTier, TerminalReason, TurnResolution,
};

use crate::catalog::EventCatalog;
use crate::ledger::ResourceLedger;
use crate::modifier::SelectionModifier;
use crate::rng::{RandomSource, SplitMix64};

/// How many turns a reign spends in each era before history moves on.
pub const TURNS_PER_ERA: u64 = 25;

/// Era reached after `turn` turns from `starting` era. Caps at the last
/// era; history does not wrap around.
pub fn era_for_turn(starting: Era, turn: u64) -> Era {
    let index = starting.index() + turn.saturating_sub(1) / TURNS_PER_ERA;
    let capped = index.min(Era::ALL.len() as u64 - 1) as usize;
    Era::ALL[capped]
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// The complete mutable state of one reign. Mirrors the persisted
/// snapshot shape field for field; the snapshot module converts between
/// the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// Monotonic, starts at 1.
    pub turn: u64,
    pub era: Era,
    pub ledger: ResourceLedger,
    pub flags: BTreeSet<String>,
    /// Append-only record of played event ids, in play order.
    pub history: Vec<String>,
    /// FIFO of event ids enqueued by resolved choices.
    pub triggered_queue: VecDeque<String>,
    /// FIFO of externally forced event ids; conditions are bypassed.
    pub priority_queue: VecDeque<String>,
    pub characters: BTreeMap<String, CharacterState>,
    pub terminal: Option<TerminalReason>,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            turn: 1,
            era: config.starting_era,
            ledger: ResourceLedger::new(config.starting_resources),
            flags: config.starting_flags.iter().cloned().collect(),
            history: Vec::new(),
            triggered_queue: VecDeque::new(),
            priority_queue: VecDeque::new(),
            characters: BTreeMap::new(),
            terminal: None,
        }
    }

    pub fn played(&self, event_id: &str) -> bool {
        self.history.iter().any(|id| id == event_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }
}

// ---------------------------------------------------------------------------
// Phases, pending card, errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingChoice,
    Resolving,
    Terminal,
}

/// The drawn card currently awaiting a choice. At most one per turn;
/// resolving it consumes it, which is the commit idempotency guard.
#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub event: EventDef,
    pub tier: SelectionTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The reign already hit a terminal reason; no further turns.
    GameComplete,
    /// The weighted pool came back empty; recoverable, not a crash.
    NoEventAvailable,
    /// Preview or choose called with no drawn card outstanding.
    NoPendingEvent,
    /// Conclusion requested while the reign is still in progress.
    GameInProgress,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameComplete => write!(f, "game already reached a terminal state"),
            Self::NoEventAvailable => write!(f, "no eligible event available this turn"),
            Self::NoPendingEvent => write!(f, "no drawn event awaiting a choice"),
            Self::GameInProgress => write!(f, "game has not reached a terminal state"),
        }
    }
}

impl std::error::Error for EngineError {}

// ---------------------------------------------------------------------------
// DecisionEngine
// ---------------------------------------------------------------------------

/// One reign's controller, constructed with its collaborators and owning
/// them for the reign's lifetime.
#[derive(Debug)]
pub struct DecisionEngine {
    config: GameConfig,
    state: GameState,
    catalog: Box<dyn EventCatalog>,
    rng: Box<dyn RandomSource>,
    modifiers: Vec<Box<dyn SelectionModifier>>,
    phase: TurnPhase,
    pending: Option<PendingEvent>,
    turn_log: Vec<TurnResolution>,
}

impl DecisionEngine {
    /// Seeds the random source from the config's seed.
    pub fn new(
        config: GameConfig,
        catalog: Box<dyn EventCatalog>,
        modifiers: Vec<Box<dyn SelectionModifier>>,
    ) -> Self {
        let rng = Box::new(SplitMix64::from_seed(config.seed));
        Self::with_random_source(config, catalog, rng, modifiers)
    }

    pub fn with_random_source(
        config: GameConfig,
        catalog: Box<dyn EventCatalog>,
        rng: Box<dyn RandomSource>,
        modifiers: Vec<Box<dyn SelectionModifier>>,
    ) -> Self {
        let state = GameState::new(&config);
        Self {
            config,
            state,
            catalog,
            rng,
            modifiers,
            phase: TurnPhase::AwaitingChoice,
            pending: None,
            turn_log: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn pending(&self) -> Option<&PendingEvent> {
        self.pending.as_ref()
    }

    /// Everything resolved so far, in turn order.
    pub fn turn_log(&self) -> &[TurnResolution] {
        &self.turn_log
    }
}
