//! v1 cross-boundary contracts for the decision engine, API, persistence,
//! and CLI: resources, events, endings, legacy traits, and snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod serde_u64_string;

pub const SCHEMA_VERSION_V1: &str = "1.0";

// ---------------------------------------------------------------------------
// Eras and resources
// ---------------------------------------------------------------------------

/// Coarse historical phase gating which events and endings are eligible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Founding,
    Expansion,
    GoldenAge,
    Twilight,
}

impl Era {
    pub const ALL: [Era; 4] = [Era::Founding, Era::Expansion, Era::GoldenAge, Era::Twilight];

    /// Zero-based position in the historical sequence.
    pub fn index(self) -> u64 {
        match self {
            Era::Founding => 0,
            Era::Expansion => 1,
            Era::GoldenAge => 2,
            Era::Twilight => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Gold,
    Happiness,
    Military,
    Faith,
}

/// Fixed order in which resources are examined for boundary crossings.
/// The first resource found at an extreme wins; earlier entries shadow
/// later ones when several cross in the same pass.
pub const RESOURCE_CHECK_ORDER: [ResourceKind; 4] = [
    ResourceKind::Gold,
    ResourceKind::Happiness,
    ResourceKind::Military,
    ResourceKind::Faith,
];

/// The four bounded kingdom resources, each held in [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceSet {
    pub gold: i64,
    pub happiness: i64,
    pub military: i64,
    pub faith: i64,
}

impl ResourceSet {
    pub fn uniform(value: i64) -> Self {
        Self {
            gold: value,
            happiness: value,
            military: value,
            faith: value,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Gold => self.gold,
            ResourceKind::Happiness => self.happiness,
            ResourceKind::Military => self.military,
            ResourceKind::Faith => self.faith,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, value: i64) {
        match kind {
            ResourceKind::Gold => self.gold = value,
            ResourceKind::Happiness => self.happiness = value,
            ResourceKind::Military => self.military = value,
            ResourceKind::Faith => self.faith = value,
        }
    }

    pub fn clamped(mut self) -> Self {
        for kind in RESOURCE_CHECK_ORDER {
            self.set(kind, self.get(kind).clamp(0, 100));
        }
        self
    }
}

impl Default for ResourceSet {
    fn default() -> Self {
        Self::uniform(50)
    }
}

// ---------------------------------------------------------------------------
// Catalog data: events, choices, conditions
// ---------------------------------------------------------------------------

/// Inclusive integer delta range applied to one resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceEffect {
    pub resource: ResourceKind,
    pub min: i64,
    pub max: i64,
}

impl ResourceEffect {
    pub fn fixed(resource: ResourceKind, delta: i64) -> Self {
        Self {
            resource,
            min: delta,
            max: delta,
        }
    }

    /// Midpoint of the range, used for non-committal previews. Widened
    /// so ranges touching the integer extremes stay exact.
    pub fn midpoint(&self) -> i64 {
        ((self.min as i128 + self.max as i128) / 2) as i64
    }
}

/// Eligibility predicate over game state. Variants form a closed set and
/// combine with short-circuit AND semantics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionDef {
    FlagSet { flag: String },
    FlagAbsent { flag: String },
    ResourceAtLeast { resource: ResourceKind, value: i64 },
    ResourceAtMost { resource: ResourceKind, value: i64 },
    TurnAtLeast { turn: u64 },
    TurnAtMost { turn: u64 },
    RelationshipAtLeast { character_id: String, value: i64 },
    EraIs { era: Era },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Era-driven plot cards; weight scales with a turn/era difficulty curve.
    Story,
    /// General court-and-kingdom cards.
    Kingdom,
    /// Cards bound to a named character.
    Character,
    /// Cards that may re-enter the pool after being played.
    Recurring,
}

impl EventCategory {
    pub fn is_repeatable(self) -> bool {
        matches!(self, EventCategory::Recurring)
    }
}

/// One of an event's two resolvable branches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceDef {
    pub text: String,
    #[serde(default)]
    pub effects: Vec<ResourceEffect>,
    #[serde(default)]
    pub triggered_events: Vec<String>,
    #[serde(default)]
    pub set_flags: Vec<String>,
    #[serde(default)]
    pub relationship_delta: i64,
}

/// A narrative card. Immutable catalog data, never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDef {
    pub event_id: String,
    pub era: Era,
    pub category: EventCategory,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
    pub base_weight: i64,
    #[serde(default)]
    pub priority_bonus: i64,
    #[serde(default)]
    pub rare: bool,
    #[serde(default)]
    pub character_id: Option<String>,
    /// Designated sequel consulted by the chain selection tier.
    #[serde(default)]
    pub chain_next: Option<String>,
    pub left: ChoiceDef,
    pub right: ChoiceDef,
}

impl EventDef {
    pub fn choice(&self, side: ChoiceSide) -> &ChoiceDef {
        match side {
            ChoiceSide::Left => &self.left,
            ChoiceSide::Right => &self.right,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceSide {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// Per-character interaction record; created on first interaction and
/// never deleted within a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CharacterState {
    pub interaction_count: u64,
    pub relationship_level: i64,
    pub last_interaction_turn: u64,
}

// ---------------------------------------------------------------------------
// Terminal reasons, endings, legacy traits
// ---------------------------------------------------------------------------

/// Named cause of a game ending via a resource boundary crossing, one
/// low-extreme and one high-extreme reason per resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    Bankruptcy,
    InflationCrisis,
    Revolution,
    Laziness,
    Invasion,
    MilitaryCoup,
    Chaos,
    Theocracy,
}

impl TerminalReason {
    /// The resource whose extreme produced this reason.
    pub fn resource(self) -> ResourceKind {
        match self {
            Self::Bankruptcy | Self::InflationCrisis => ResourceKind::Gold,
            Self::Revolution | Self::Laziness => ResourceKind::Happiness,
            Self::Invasion | Self::MilitaryCoup => ResourceKind::Military,
            Self::Chaos | Self::Theocracy => ResourceKind::Faith,
        }
    }
}

/// Closed set of narrative outcomes. Paired endings mirror the eight
/// terminal reasons; the rest are reached through the narrative cascade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EndingId {
    BankruptKingdom,
    InflationRuin,
    PeoplesUprising,
    IdleDecadence,
    ConqueredRealm,
    GeneralsThrone,
    GodlessRuin,
    PriestsDominion,
    Betrayed,
    ProphecyFulfilled,
    LongReign,
    BalancedRule,
    GoldenProsperity,
    MilitaryConquest,
    DivineMandate,
    QuietAbdication,
    None,
}

impl EndingId {
    pub fn is_victory(self) -> bool {
        matches!(
            self,
            Self::ProphecyFulfilled
                | Self::LongReign
                | Self::BalancedRule
                | Self::GoldenProsperity
                | Self::MilitaryConquest
                | Self::DivineMandate
        )
    }

    /// Fixed prestige constant contributed by this ending.
    pub fn prestige_bonus(self) -> i64 {
        match self {
            Self::LongReign => 60,
            Self::BalancedRule => 50,
            Self::ProphecyFulfilled => 55,
            Self::GoldenProsperity | Self::MilitaryConquest | Self::DivineMandate => 45,
            Self::Betrayed => 20,
            Self::BankruptKingdom
            | Self::InflationRuin
            | Self::PeoplesUprising
            | Self::IdleDecadence
            | Self::ConqueredRealm
            | Self::GeneralsThrone
            | Self::GodlessRuin
            | Self::PriestsDominion => 15,
            Self::QuietAbdication => 10,
            Self::None => 0,
        }
    }
}

/// Hereditary modifier carried into the next game instance. Each trait
/// carries starting-resource deltas and flags seeded into the next reign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LegacyTraitId {
    UsurperBlood,
    ProphetHeir,
    Pauper,
    Merchant,
    Tyrant,
    Beloved,
    Pacifist,
    Warlord,
    Heretic,
    Zealot,
    Steward,
}

impl LegacyTraitId {
    /// Resource deltas applied to the next game's starting baseline.
    pub fn starting_deltas(self) -> ResourceSet {
        let mut deltas = ResourceSet::uniform(0);
        match self {
            Self::UsurperBlood => {
                deltas.military = 5;
                deltas.happiness = -5;
            }
            Self::ProphetHeir => deltas.faith = 10,
            Self::Pauper => deltas.gold = -10,
            Self::Merchant => deltas.gold = 10,
            Self::Tyrant => deltas.happiness = -10,
            Self::Beloved => deltas.happiness = 10,
            Self::Pacifist => deltas.military = -10,
            Self::Warlord => deltas.military = 10,
            Self::Heretic => deltas.faith = -10,
            Self::Zealot => deltas.faith = 10,
            Self::Steward => {}
        }
        deltas
    }

    /// Flags seeded into the next game's starting state.
    pub fn starting_flags(self) -> Vec<String> {
        match self {
            Self::UsurperBlood => vec!["legacy:usurper".to_string()],
            Self::ProphetHeir => vec!["legacy:prophecy".to_string()],
            Self::Pauper => vec!["legacy:debt".to_string()],
            Self::Steward => vec!["legacy:steady".to_string()],
            _ => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables and starting baseline for one game instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    pub schema_version: String,
    #[serde(with = "serde_u64_string")]
    pub seed: u64,
    pub starting_era: Era,
    pub starting_resources: ResourceSet,
    #[serde(default)]
    pub starting_flags: Vec<String>,
    /// Base probability the rare tier fires, before modifier scaling.
    pub rare_event_chance: f64,
    /// Weight multiplier for events whose character was met before.
    pub familiarity_bonus: f64,
    /// Extra multiplier once `neglect_turns` have passed since the last
    /// interaction with the event's character.
    pub neglect_bonus: f64,
    pub neglect_turns: u64,
    /// Positive floor applied to every computed event weight.
    pub min_event_weight: f64,
    pub long_reign_turns: u64,
    pub balance_band_low: i64,
    pub balance_band_high: i64,
    pub neutral_min_turns: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            seed: 1337,
            starting_era: Era::Founding,
            starting_resources: ResourceSet::default(),
            starting_flags: Vec::new(),
            rare_event_chance: 0.08,
            familiarity_bonus: 1.5,
            neglect_bonus: 1.3,
            neglect_turns: 10,
            min_event_weight: 0.05,
            long_reign_turns: 100,
            balance_band_low: 40,
            balance_band_high: 60,
            neutral_min_turns: 8,
        }
    }
}

impl GameConfig {
    /// Fresh config for the reign after `legacy`, carrying its deltas and
    /// flags onto the default baseline.
    pub fn for_next_reign(seed: u64, legacy: LegacyTraitId) -> Self {
        let mut config = Self {
            seed,
            ..Self::default()
        };
        let deltas = legacy.starting_deltas();
        for kind in RESOURCE_CHECK_ORDER {
            let value = config.starting_resources.get(kind) + deltas.get(kind);
            config.starting_resources.set(kind, value.clamp(1, 99));
        }
        config.starting_flags = legacy.starting_flags();
        config
    }
}

// ---------------------------------------------------------------------------
// Turn results and snapshots
// ---------------------------------------------------------------------------

/// Realized outcome of one resource effect draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedEffect {
    pub resource: ResourceKind,
    pub delta_applied: i64,
    pub new_value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationshipChange {
    pub character_id: String,
    pub delta: i64,
    pub new_level: i64,
}

/// Which selection tier produced an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionTier {
    ForcedPriority,
    Triggered,
    Chain,
    Rare,
    Weighted,
}

/// Everything that changed while resolving one choice. Returned to the
/// caller instead of broadcast through callbacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnResolution {
    pub turn: u64,
    pub event_id: String,
    pub side: ChoiceSide,
    pub tier: SelectionTier,
    pub applied: Vec<AppliedEffect>,
    pub flags_set: Vec<String>,
    pub triggered_enqueued: Vec<String>,
    pub relationship_change: Option<RelationshipChange>,
    pub terminal: Option<TerminalReason>,
}

/// Persisted game-state schema. The storage wrapper (version tag, table
/// layout) is owned by the persistence collaborator, not the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub schema_version: String,
    pub turn: u64,
    pub era: Era,
    pub resources: ResourceSet,
    pub flags: Vec<String>,
    pub history: Vec<String>,
    pub triggered_queue: Vec<String>,
    pub priority_queue: Vec<String>,
    pub characters: BTreeMap<String, CharacterState>,
    pub terminal_reason: Option<TerminalReason>,
}

impl fmt::Display for GameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "turn={} era={:?} gold={} happiness={} military={} faith={} terminal={:?}",
            self.turn,
            self.era,
            self.resources.gold,
            self.resources.happiness,
            self.resources.military,
            self.resources.faith,
            self.terminal_reason
        )
    }
}

/// Meta-progression summary computed once per finished game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReignSummary {
    pub ending: EndingId,
    pub legacy: LegacyTraitId,
    pub prestige: i64,
    pub turns_survived: u64,
}

// ---------------------------------------------------------------------------
// Daily challenge
// ---------------------------------------------------------------------------

/// Selection-modifier variant active for a daily challenge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DailyModifier {
    /// Rare tier fires at double odds.
    RareTales,
    /// Gold never drops below 5.
    GoldenFloor,
    /// Positive faith deltas gain a 25% bonus.
    ZealousBlessing,
}

/// Deterministic daily-challenge setup derived from a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyChallenge {
    pub date_key: String,
    #[serde(with = "serde_u64_string")]
    pub seed: u64,
    pub era: Era,
    pub starting_resources: ResourceSet,
    pub modifier: DailyModifier,
}

// ---------------------------------------------------------------------------
// API error envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    GameNotFound,
    InvalidChoice,
    GameComplete,
    NoEventAvailable,
    InvalidQuery,
    ContractVersionUnsupported,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_set_round_trips() {
        let resources = ResourceSet {
            gold: 12,
            happiness: 95,
            military: 0,
            faith: 50,
        };
        let encoded = serde_json::to_string(&resources).expect("serialize");
        let decoded: ResourceSet = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(resources, decoded);
    }

    #[test]
    fn effect_midpoint_is_exact_at_the_extremes() {
        let effect = ResourceEffect {
            resource: ResourceKind::Gold,
            min: -10,
            max: 20,
        };
        assert_eq!(effect.midpoint(), 5);

        let huge = ResourceEffect::fixed(ResourceKind::Gold, i64::MAX);
        assert_eq!(huge.midpoint(), i64::MAX);

        let wide = ResourceEffect {
            resource: ResourceKind::Gold,
            min: i64::MIN,
            max: i64::MAX,
        };
        assert_eq!(wide.midpoint(), 0);
    }

    #[test]
    fn condition_defs_use_tagged_representation() {
        let condition = ConditionDef::ResourceAtLeast {
            resource: ResourceKind::Gold,
            value: 30,
        };
        let encoded = serde_json::to_value(&condition).expect("serialize");
        assert_eq!(
            encoded.get("type").and_then(serde_json::Value::as_str),
            Some("resource_at_least")
        );
    }

    #[test]
    fn game_config_for_next_reign_applies_legacy() {
        let config = GameConfig::for_next_reign(42, LegacyTraitId::Warlord);
        assert_eq!(config.starting_resources.military, 60);
        assert_eq!(config.starting_resources.gold, 50);

        let pauper = GameConfig::for_next_reign(42, LegacyTraitId::Pauper);
        assert_eq!(pauper.starting_resources.gold, 40);
        assert!(pauper.starting_flags.contains(&"legacy:debt".to_string()));
    }

    #[test]
    fn terminal_reasons_map_to_their_resource() {
        assert_eq!(TerminalReason::Bankruptcy.resource(), ResourceKind::Gold);
        assert_eq!(TerminalReason::Theocracy.resource(), ResourceKind::Faith);
        assert_eq!(
            TerminalReason::MilitaryCoup.resource(),
            ResourceKind::Military
        );
    }
}
