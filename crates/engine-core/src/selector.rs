//! Five-tier event selection. Tiers are consulted in a fixed order and
//! the first usable candidate wins: forced-priority, triggered, chain,
//! rare, then the weighted pool.
//!
//! Unknown event ids at any tier mean "not found, fall through"; they
//! never abort selection. An empty weighted pool is the only way
//! selection comes back empty, and it is a reported condition for the
//! caller, not a failure here.

use contracts::{EventDef, GameConfig, SelectionTier};

use crate::catalog::EventCatalog;
use crate::condition;
use crate::engine::GameState;
use crate::modifier::{combined_rare_odds, SelectionModifier};
use crate::rng::RandomSource;

#[derive(Debug, Clone)]
pub struct SelectedEvent {
    pub event: EventDef,
    pub tier: SelectionTier,
}

/// Pick the next event for the current turn.
///
/// Dequeues from the priority and triggered queues as a side effect; a
/// dequeued id that fails lookup (or, for the triggered tier, its
/// conditions) is consumed, never re-queued.
pub fn select_next(
    state: &mut GameState,
    catalog: &dyn EventCatalog,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
    modifiers: &[Box<dyn SelectionModifier>],
) -> Option<SelectedEvent> {
    // Tier 1: forced priority. Conditions are deliberately NOT checked;
    // the producer of this queue vouches for eligibility.
    if let Some(event_id) = state.priority_queue.pop_front() {
        if let Some(event) = catalog.get_by_id(&event_id) {
            return Some(SelectedEvent {
                event: event.clone(),
                tier: SelectionTier::ForcedPriority,
            });
        }
    }

    // Tier 2: triggered. Conditions must hold now.
    if let Some(event_id) = state.triggered_queue.pop_front() {
        if let Some(event) = catalog.get_by_id(&event_id) {
            if condition::evaluate(&event.conditions, state) {
                return Some(SelectedEvent {
                    event: event.clone(),
                    tier: SelectionTier::Triggered,
                });
            }
        }
    }

    // Tier 3: chain. The sequel the catalog designates for the most
    // recently played event.
    if let Some(last_id) = state.history.last() {
        if let Some(event) = catalog.chain_event_for(last_id) {
            if condition::evaluate(&event.conditions, state) {
                return Some(SelectedEvent {
                    event: event.clone(),
                    tier: SelectionTier::Chain,
                });
            }
        }
    }

    // Tier 4: rare. One odds roll, then a uniform pick among eligible
    // unplayed rare events of the era.
    let rare_chance = config.rare_event_chance * combined_rare_odds(modifiers);
    if rng.next_float01() < rare_chance {
        let pool: Vec<&EventDef> = catalog
            .rare_events_for_era(state.era)
            .into_iter()
            .filter(|event| {
                !state.played(&event.event_id) && condition::evaluate(&event.conditions, state)
            })
            .collect();
        if !pool.is_empty() {
            let pick = rng.next_int_in_range(0, pool.len() as i64 - 1) as usize;
            return Some(SelectedEvent {
                event: pool[pick].clone(),
                tier: SelectionTier::Rare,
            });
        }
    }

    // Tier 5: weighted pool.
    let mut pool: Vec<(f64, &EventDef)> = catalog
        .events_for_era(state.era)
        .into_iter()
        .filter(|event| {
            !event.rare
                && (event.category.is_repeatable() || !state.played(&event.event_id))
                && condition::evaluate(&event.conditions, state)
        })
        .map(|event| (event_weight(event, state, config), event))
        .collect();
    if pool.is_empty() {
        return None;
    }

    // Descending by weight; sort_by is stable, so equal weights keep
    // catalog author order.
    pool.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let total: f64 = pool.iter().map(|(weight, _)| weight).sum();
    let draw = rng.next_float01() * total;
    let mut cumulative = 0.0;
    for (weight, event) in &pool {
        cumulative += weight;
        if cumulative >= draw {
            return Some(SelectedEvent {
                event: (*event).clone(),
                tier: SelectionTier::Weighted,
            });
        }
    }

    // Floating-point drift left the draw unclaimed: take the heaviest
    // entry deterministically.
    Some(SelectedEvent {
        event: pool[0].1.clone(),
        tier: SelectionTier::Weighted,
    })
}

/// Final weight for one weighted-tier candidate.
pub fn event_weight(event: &EventDef, state: &GameState, config: &GameConfig) -> f64 {
    let mut weight = (event.base_weight + event.priority_bonus) as f64;

    if let Some(character_id) = &event.character_id {
        if let Some(character) = state.characters.get(character_id) {
            weight *= config.familiarity_bonus;
            if state.turn.saturating_sub(character.last_interaction_turn) > config.neglect_turns {
                weight *= config.neglect_bonus;
            }
        }
    }

    if event.category == contracts::EventCategory::Story {
        weight *= story_multiplier(state);
    }

    weight.max(config.min_event_weight)
}

/// Difficulty curve for story cards: grows with era and elapsed turns,
/// capped so late-game story cards never fully crowd out the pool.
pub fn story_multiplier(state: &GameState) -> f64 {
    (1.0 + 0.25 * state.era.index() as f64 + state.turn as f64 / 200.0).min(2.5)
}

#[cfg(test)]
mod tests {
    use contracts::{
        CharacterState, ChoiceDef, ConditionDef, Era, EventCategory, ResourceKind,
    };

    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::rng::SplitMix64;

    fn blank_choice() -> ChoiceDef {
        ChoiceDef {
            text: "choice".to_string(),
            effects: Vec::new(),
            triggered_events: Vec::new(),
            set_flags: Vec::new(),
            relationship_delta: 0,
        }
    }

    fn plain_event(event_id: &str, base_weight: i64) -> EventDef {
        EventDef {
            event_id: event_id.to_string(),
            era: Era::Founding,
            category: EventCategory::Kingdom,
            conditions: Vec::new(),
            base_weight,
            priority_bonus: 0,
            rare: false,
            character_id: None,
            chain_next: None,
            left: blank_choice(),
            right: blank_choice(),
        }
    }

    fn fresh_state() -> GameState {
        GameState::new(&GameConfig::default())
    }

    #[test]
    fn priority_queue_bypasses_conditions() {
        let mut gated = plain_event("ev:gated", 10);
        gated.conditions = vec![ConditionDef::ResourceAtLeast {
            resource: ResourceKind::Gold,
            value: 99,
        }];
        let catalog = InMemoryCatalog::new(vec![gated, plain_event("ev:other", 10)]).unwrap();

        let mut state = fresh_state();
        state.priority_queue.push_back("ev:gated".to_string());
        let mut rng = SplitMix64::from_seed(7);

        let selected =
            select_next(&mut state, &catalog, &GameConfig::default(), &mut rng, &[]).unwrap();
        assert_eq!(selected.event.event_id, "ev:gated");
        assert_eq!(selected.tier, SelectionTier::ForcedPriority);
        assert!(state.priority_queue.is_empty());
    }

    #[test]
    fn unknown_priority_id_is_consumed_and_falls_through() {
        let catalog = InMemoryCatalog::new(vec![plain_event("ev:only", 10)]).unwrap();
        let mut state = fresh_state();
        state.priority_queue.push_back("ev:ghost".to_string());
        let mut rng = SplitMix64::from_seed(1);

        let selected =
            select_next(&mut state, &catalog, &GameConfig::default(), &mut rng, &[]).unwrap();
        assert_eq!(selected.event.event_id, "ev:only");
        assert!(state.priority_queue.is_empty());
    }

    #[test]
    fn triggered_event_requires_conditions_and_is_not_requeued() {
        let mut gated = plain_event("ev:gated", 10);
        gated.conditions = vec![ConditionDef::FlagSet {
            flag: "flag:missing".to_string(),
        }];
        let catalog = InMemoryCatalog::new(vec![gated, plain_event("ev:fallback", 10)]).unwrap();

        let mut state = fresh_state();
        state.triggered_queue.push_back("ev:gated".to_string());
        let mut rng = SplitMix64::from_seed(3);

        let selected =
            select_next(&mut state, &catalog, &GameConfig::default(), &mut rng, &[]).unwrap();
        assert_eq!(selected.event.event_id, "ev:fallback");
        assert_eq!(selected.tier, SelectionTier::Weighted);
        assert!(state.triggered_queue.is_empty());
    }

    #[test]
    fn chain_tier_follows_last_played_event() {
        let mut opener = plain_event("ev:opener", 10);
        opener.chain_next = Some("ev:sequel".to_string());
        let catalog =
            InMemoryCatalog::new(vec![opener, plain_event("ev:sequel", 1)]).unwrap();

        let mut state = fresh_state();
        state.history.push("ev:opener".to_string());
        let mut rng = SplitMix64::from_seed(11);

        let selected =
            select_next(&mut state, &catalog, &GameConfig::default(), &mut rng, &[]).unwrap();
        assert_eq!(selected.event.event_id, "ev:sequel");
        assert_eq!(selected.tier, SelectionTier::Chain);
    }

    #[test]
    fn weighted_pool_excludes_played_non_repeatable_events() {
        let mut recurring = plain_event("ev:recurring", 10);
        recurring.category = EventCategory::Recurring;
        let catalog =
            InMemoryCatalog::new(vec![plain_event("ev:once", 10), recurring]).unwrap();

        let mut state = fresh_state();
        state.history.push("ev:once".to_string());
        state.history.push("ev:recurring".to_string());
        let mut rng = SplitMix64::from_seed(5);
        let config = GameConfig {
            rare_event_chance: 0.0,
            ..GameConfig::default()
        };

        for _ in 0..8 {
            // ev:recurring has no chain, so tier 5 must always land on it.
            let selected = select_next(&mut state, &catalog, &config, &mut rng, &[]).unwrap();
            assert_eq!(selected.event.event_id, "ev:recurring");
        }
    }

    #[test]
    fn empty_weighted_pool_reports_no_event() {
        let catalog = InMemoryCatalog::new(vec![plain_event("ev:once", 10)]).unwrap();
        let mut state = fresh_state();
        state.history.push("ev:once".to_string());
        let mut rng = SplitMix64::from_seed(5);
        let config = GameConfig {
            rare_event_chance: 0.0,
            ..GameConfig::default()
        };

        assert!(select_next(&mut state, &catalog, &config, &mut rng, &[]).is_none());
    }

    #[test]
    fn familiarity_and_neglect_scale_character_weights() {
        let config = GameConfig::default();
        let mut event = plain_event("ev:court", 20);
        event.character_id = Some("char:advisor".to_string());

        let mut state = fresh_state();
        assert_eq!(event_weight(&event, &state, &config), 20.0);

        state.characters.insert(
            "char:advisor".to_string(),
            CharacterState {
                interaction_count: 1,
                relationship_level: 0,
                last_interaction_turn: 1,
            },
        );
        state.turn = 5;
        assert_eq!(event_weight(&event, &state, &config), 20.0 * 1.5);

        state.turn = 40;
        assert_eq!(event_weight(&event, &state, &config), 20.0 * 1.5 * 1.3);
    }

    #[test]
    fn story_multiplier_grows_and_caps() {
        let mut state = fresh_state();
        state.turn = 1;
        assert!(story_multiplier(&state) > 1.0);
        state.era = Era::Twilight;
        state.turn = 1000;
        assert_eq!(story_multiplier(&state), 2.5);
    }

    #[test]
    fn weighted_draw_is_deterministic_for_a_seed() {
        let catalog = InMemoryCatalog::default_catalog();
        let config = GameConfig::default();

        let mut first = Vec::new();
        let mut second = Vec::new();
        for out in [&mut first, &mut second] {
            let mut state = fresh_state();
            let mut rng = SplitMix64::from_seed(config.seed);
            for _ in 0..10 {
                let selected =
                    select_next(&mut state, &catalog, &config, &mut rng, &[]).unwrap();
                state.history.push(selected.event.event_id.clone());
                out.push(selected.event.event_id);
            }
        }
        assert_eq!(first, second);
    }
}
