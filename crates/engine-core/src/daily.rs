//! Daily challenge derivation. Everything about the challenge — seed,
//! era, starting resources, active modifier — is a pure function of the
//! calendar date, so every player of a given day faces the same reign.

use contracts::{DailyChallenge, DailyModifier, Era, GameConfig, ResourceKind, ResourceSet};

use crate::catalog::EventCatalog;
use crate::engine::DecisionEngine;
use crate::modifier::{PositiveDeltaBonus, RareOddsBoost, ResourceFloor, SelectionModifier};
use crate::rng::{seed_for_date, RandomSource, SplitMix64};

const MODIFIERS: [DailyModifier; 3] = [
    DailyModifier::RareTales,
    DailyModifier::GoldenFloor,
    DailyModifier::ZealousBlessing,
];

/// Derive the challenge for a calendar date. Two calls with the same
/// date agree on every field.
pub fn challenge_for_date(year: u32, month: u32, day: u32) -> DailyChallenge {
    let seed = seed_for_date(year, month, day);
    let mut rng = SplitMix64::from_seed(seed);

    let era = Era::ALL[rng.next_int_in_range(0, Era::ALL.len() as i64 - 1) as usize];
    let mut starting_resources = ResourceSet::default();
    for resource in contracts::RESOURCE_CHECK_ORDER {
        starting_resources.set(resource, rng.next_int_in_range(35, 65));
    }
    let modifier = MODIFIERS[rng.next_int_in_range(0, MODIFIERS.len() as i64 - 1) as usize];

    DailyChallenge {
        date_key: format!("{year:04}-{month:02}-{day:02}"),
        seed,
        era,
        starting_resources,
        modifier,
    }
}

/// The selection/ledger hook a daily modifier stands for.
pub fn modifier_hook(modifier: DailyModifier) -> Box<dyn SelectionModifier> {
    match modifier {
        DailyModifier::RareTales => Box::new(RareOddsBoost { multiplier: 2.0 }),
        DailyModifier::GoldenFloor => Box::new(ResourceFloor {
            resource: ResourceKind::Gold,
            floor: 5,
        }),
        DailyModifier::ZealousBlessing => Box::new(PositiveDeltaBonus {
            resource: ResourceKind::Faith,
            percent: 25,
        }),
    }
}

/// Spin up an engine for a derived challenge.
pub fn engine_for_challenge(
    challenge: &DailyChallenge,
    catalog: Box<dyn EventCatalog>,
) -> DecisionEngine {
    let config = GameConfig {
        seed: challenge.seed,
        starting_era: challenge.era,
        starting_resources: challenge.starting_resources,
        ..GameConfig::default()
    };
    DecisionEngine::new(config, catalog, vec![modifier_hook(challenge.modifier)])
}
