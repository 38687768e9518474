//! Legacy trait derivation and the prestige formula. Both are pure
//! functions of the terminal state; calling either twice on the same
//! state yields the same result.

use contracts::{EndingId, LegacyTraitId, ResourceKind, RESOURCE_CHECK_ORDER};

use crate::engine::GameState;

const LOW_TRAIT_THRESHOLD: i64 = 20;
const HIGH_TRAIT_THRESHOLD: i64 = 80;

/// Prestige granted per held special flag at the end of a reign.
const FLAG_BONUSES: [(&str, i64); 2] = [("flag:prophecy_fulfilled", 15), ("flag:betrayal", 5)];

const PRESTIGE_MINIMUM: i64 = 10;

fn extreme_trait(resource: ResourceKind, low: bool) -> LegacyTraitId {
    match (resource, low) {
        (ResourceKind::Gold, true) => LegacyTraitId::Pauper,
        (ResourceKind::Gold, false) => LegacyTraitId::Merchant,
        (ResourceKind::Happiness, true) => LegacyTraitId::Tyrant,
        (ResourceKind::Happiness, false) => LegacyTraitId::Beloved,
        (ResourceKind::Military, true) => LegacyTraitId::Pacifist,
        (ResourceKind::Military, false) => LegacyTraitId::Warlord,
        (ResourceKind::Faith, true) => LegacyTraitId::Heretic,
        (ResourceKind::Faith, false) => LegacyTraitId::Zealot,
    }
}

/// Same cascade shape as the Ending Resolver: flag overrides, then
/// resource extremes in the fixed check order (low before high), then
/// the balanced default.
pub fn legacy_trait_for(state: &GameState) -> LegacyTraitId {
    if state.flags.contains("flag:betrayal") {
        return LegacyTraitId::UsurperBlood;
    }
    if state.flags.contains("flag:prophecy_fulfilled") {
        return LegacyTraitId::ProphetHeir;
    }

    let resources = state.ledger.resources();
    for resource in RESOURCE_CHECK_ORDER {
        let value = resources.get(resource);
        if value <= LOW_TRAIT_THRESHOLD {
            return extreme_trait(resource, true);
        }
        if value >= HIGH_TRAIT_THRESHOLD {
            return extreme_trait(resource, false);
        }
    }

    LegacyTraitId::Steward
}

/// `2×turns + round(30×balance) + ending bonus + 10×era index +
/// character bonuses + flag bonuses`, floored at the minimum award.
pub fn prestige_points(state: &GameState, ending: EndingId) -> i64 {
    let mut points = 2 * state.turn as i64;
    points += (30.0 * state.ledger.balance_score()).round() as i64;
    points += ending.prestige_bonus();
    points += 10 * state.era.index() as i64;

    for character in state.characters.values() {
        if character.interaction_count >= 5 {
            points += 5;
        }
        if character.relationship_level >= 50 {
            points += 5;
        }
    }

    for (flag, bonus) in FLAG_BONUSES {
        if state.flags.contains(flag) {
            points += bonus;
        }
    }

    points.max(PRESTIGE_MINIMUM)
}

#[cfg(test)]
mod tests {
    use contracts::{CharacterState, GameConfig, ResourceSet};

    use super::*;
    use crate::ledger::ResourceLedger;

    fn state_with(resources: ResourceSet, turn: u64) -> GameState {
        let mut state = GameState::new(&GameConfig::default());
        state.ledger = ResourceLedger::new(resources);
        state.turn = turn;
        state
    }

    #[test]
    fn betrayal_flag_outranks_resource_traits() {
        let mut resources = ResourceSet::uniform(50);
        resources.gold = 5;
        let mut state = state_with(resources, 20);
        state.flags.insert("flag:betrayal".to_string());
        assert_eq!(legacy_trait_for(&state), LegacyTraitId::UsurperBlood);
    }

    #[test]
    fn first_extreme_in_check_order_wins() {
        let mut resources = ResourceSet::uniform(50);
        resources.happiness = 10;
        resources.faith = 95;
        let state = state_with(resources, 20);
        assert_eq!(legacy_trait_for(&state), LegacyTraitId::Tyrant);
    }

    #[test]
    fn balanced_reign_leaves_a_steward() {
        let state = state_with(ResourceSet::uniform(50), 20);
        assert_eq!(legacy_trait_for(&state), LegacyTraitId::Steward);
    }

    #[test]
    fn prestige_formula_components_add_up() {
        // turn 40, perfect balance, founding era, no characters or flags:
        // 80 + 30 + bonus.
        let state = state_with(ResourceSet::uniform(50), 40);
        assert_eq!(
            prestige_points(&state, EndingId::BalancedRule),
            80 + 30 + 50
        );
    }

    #[test]
    fn character_and_flag_bonuses_stack() {
        let mut state = state_with(ResourceSet::uniform(50), 10);
        state.characters.insert(
            "char:chancellor".to_string(),
            CharacterState {
                interaction_count: 6,
                relationship_level: 60,
                last_interaction_turn: 9,
            },
        );
        state.flags.insert("flag:prophecy_fulfilled".to_string());
        // 20 + 30 + 55 + 0 + (5 + 5) + 15
        assert_eq!(
            prestige_points(&state, EndingId::ProphecyFulfilled),
            20 + 30 + 55 + 10 + 15
        );
    }

    #[test]
    fn prestige_never_drops_below_minimum() {
        let mut resources = ResourceSet::uniform(0);
        resources.gold = 0;
        let state = state_with(resources, 1);
        assert!(prestige_points(&state, EndingId::None) >= 10);
    }

    #[test]
    fn derivation_is_pure() {
        let state = state_with(ResourceSet::uniform(50), 33);
        assert_eq!(legacy_trait_for(&state), legacy_trait_for(&state));
        assert_eq!(
            prestige_points(&state, EndingId::LongReign),
            prestige_points(&state, EndingId::LongReign)
        );
    }
}
