//! Ending Resolver. Two entry points: a resource extreme maps straight
//! to its paired ending, while reigns that end narratively (flags,
//! abdication) run a fixed-precedence cascade.

use contracts::{EndingId, GameConfig, ResourceKind, TerminalReason};

use crate::engine::GameState;

/// Flag arcs that override every other ending, highest precedence first.
const FLAG_ENDINGS: [(&str, EndingId); 2] = [
    ("flag:prophecy_fulfilled", EndingId::ProphecyFulfilled),
    ("flag:betrayal", EndingId::Betrayed),
];

/// Resource level at or above which a dominance victory fires.
const DOMINANCE_THRESHOLD: i64 = 80;

/// Direct pairing used when a resource hit an extreme. The narrative
/// cascade never runs on this path.
pub fn ending_for_reason(reason: TerminalReason) -> EndingId {
    match reason {
        TerminalReason::Bankruptcy => EndingId::BankruptKingdom,
        TerminalReason::InflationCrisis => EndingId::InflationRuin,
        TerminalReason::Revolution => EndingId::PeoplesUprising,
        TerminalReason::Laziness => EndingId::IdleDecadence,
        TerminalReason::Invasion => EndingId::ConqueredRealm,
        TerminalReason::MilitaryCoup => EndingId::GeneralsThrone,
        TerminalReason::Chaos => EndingId::GodlessRuin,
        TerminalReason::Theocracy => EndingId::PriestsDominion,
    }
}

/// Cascade for reigns that end without a resource extreme:
/// flags, then long reign, then balance, then dominance, then neutral.
pub fn narrative_ending(state: &GameState, config: &GameConfig) -> EndingId {
    for (flag, ending) in FLAG_ENDINGS {
        if state.flags.contains(flag) {
            return ending;
        }
    }

    if state.turn >= config.long_reign_turns {
        return EndingId::LongReign;
    }

    let resources = state.ledger.resources();
    let in_band = |value: i64| value >= config.balance_band_low && value <= config.balance_band_high;
    if in_band(resources.gold)
        && in_band(resources.happiness)
        && in_band(resources.military)
        && in_band(resources.faith)
    {
        return EndingId::BalancedRule;
    }

    // Dominance victories, fixed priority so at most one fires.
    for (resource, ending) in [
        (ResourceKind::Gold, EndingId::GoldenProsperity),
        (ResourceKind::Military, EndingId::MilitaryConquest),
        (ResourceKind::Faith, EndingId::DivineMandate),
    ] {
        if resources.get(resource) >= DOMINANCE_THRESHOLD {
            return ending;
        }
    }

    if state.turn > config.neutral_min_turns {
        EndingId::QuietAbdication
    } else {
        EndingId::None
    }
}
