use contracts::{
    ChoiceDef, ChoiceSide, EndingId, Era, EventCategory, EventDef, GameConfig, ResourceEffect,
    ResourceKind, SelectionTier, TerminalReason,
};

use super::*;
use crate::catalog::InMemoryCatalog;

fn choice_with(effects: Vec<ResourceEffect>) -> ChoiceDef {
    ChoiceDef {
        text: "choice".to_string(),
        effects,
        triggered_events: Vec::new(),
        set_flags: Vec::new(),
        relationship_delta: 0,
    }
}

fn event(event_id: &str, left: ChoiceDef, right: ChoiceDef) -> EventDef {
    EventDef {
        event_id: event_id.to_string(),
        era: Era::Founding,
        category: EventCategory::Recurring,
        conditions: Vec::new(),
        base_weight: 10,
        priority_bonus: 0,
        rare: false,
        character_id: None,
        chain_next: None,
        left,
        right,
    }
}

fn engine_with(events: Vec<EventDef>, seed: u64) -> DecisionEngine {
    let catalog = Box::new(InMemoryCatalog::new(events).unwrap());
    let config = GameConfig {
        seed,
        rare_event_chance: 0.0,
        ..GameConfig::default()
    };
    DecisionEngine::new(config, catalog, Vec::new())
}

fn steady_event() -> EventDef {
    event(
        "ev:steady",
        choice_with(vec![ResourceEffect::fixed(ResourceKind::Gold, 1)]),
        choice_with(vec![ResourceEffect::fixed(ResourceKind::Gold, -1)]),
    )
}

#[test]
fn turn_counter_starts_at_one_and_advances() {
    let mut engine = engine_with(vec![steady_event()], 42);
    assert_eq!(engine.state().turn, 1);

    engine.draw_event().unwrap();
    let resolution = engine.choose(ChoiceSide::Left).unwrap();
    assert_eq!(resolution.turn, 1);
    assert_eq!(engine.state().turn, 2);
    assert_eq!(engine.phase(), TurnPhase::AwaitingChoice);
}

#[test]
fn draw_is_idempotent_until_committed() {
    let mut engine = engine_with(vec![steady_event()], 42);
    let first = engine.draw_event().unwrap();
    let second = engine.draw_event().unwrap();
    assert_eq!(first.event.event_id, second.event.event_id);
    assert_eq!(engine.turn_log().len(), 0);
}

#[test]
fn second_commit_of_the_same_card_is_rejected() {
    let mut engine = engine_with(vec![steady_event()], 42);
    engine.draw_event().unwrap();
    engine.choose(ChoiceSide::Left).unwrap();
    assert_eq!(
        engine.choose(ChoiceSide::Left),
        Err(EngineError::NoPendingEvent)
    );
}

#[test]
fn preview_never_mutates_resources() {
    let mut engine = engine_with(vec![steady_event()], 42);
    engine.draw_event().unwrap();
    let before = *engine.state().ledger.resources();
    for _ in 0..10 {
        engine.preview(ChoiceSide::Left).unwrap();
        engine.preview(ChoiceSide::Right).unwrap();
    }
    assert_eq!(*engine.state().ledger.resources(), before);
}

#[test]
fn gold_collapse_ends_in_bankruptcy() {
    let ruin = event(
        "ev:ruin",
        choice_with(vec![ResourceEffect::fixed(ResourceKind::Gold, -100)]),
        choice_with(Vec::new()),
    );
    let mut engine = engine_with(vec![ruin], 7);

    engine.draw_event().unwrap();
    let resolution = engine.choose(ChoiceSide::Left).unwrap();
    assert_eq!(resolution.terminal, Some(TerminalReason::Bankruptcy));
    assert_eq!(engine.phase(), TurnPhase::Terminal);

    let summary = engine.conclude().unwrap();
    assert_eq!(summary.ending, EndingId::BankruptKingdom);
    assert!(!summary.ending.is_victory());
}

#[test]
fn terminal_is_absorbing() {
    let ruin = event(
        "ev:ruin",
        choice_with(vec![ResourceEffect::fixed(ResourceKind::Gold, -100)]),
        choice_with(Vec::new()),
    );
    let mut engine = engine_with(vec![ruin], 7);
    engine.draw_event().unwrap();
    engine.choose(ChoiceSide::Left).unwrap();

    assert_eq!(engine.draw_event().unwrap_err(), EngineError::GameComplete);
    assert_eq!(
        engine.choose(ChoiceSide::Right).unwrap_err(),
        EngineError::GameComplete
    );
    assert_eq!(engine.abdicate().unwrap_err(), EngineError::GameComplete);
}

#[test]
fn conclude_requires_a_finished_reign() {
    let engine = engine_with(vec![steady_event()], 42);
    assert_eq!(engine.conclude().unwrap_err(), EngineError::GameInProgress);
}

#[test]
fn forced_priority_event_is_drawn_next() {
    let mut gated = event("ev:gated", choice_with(Vec::new()), choice_with(Vec::new()));
    gated.conditions = vec![contracts::ConditionDef::TurnAtLeast { turn: 999 }];
    let mut engine = engine_with(vec![steady_event(), gated], 42);

    engine.force_priority_event("ev:gated").unwrap();
    let pending = engine.draw_event().unwrap();
    assert_eq!(pending.event.event_id, "ev:gated");
    assert_eq!(pending.tier, SelectionTier::ForcedPriority);
}

#[test]
fn triggered_events_queue_from_choices() {
    let mut opener = event("ev:opener", choice_with(Vec::new()), choice_with(Vec::new()));
    opener.left.triggered_events = vec!["ev:payoff".to_string()];
    let payoff = event("ev:payoff", choice_with(Vec::new()), choice_with(Vec::new()));
    let mut engine = engine_with(vec![opener, payoff], 42);

    engine.force_priority_event("ev:opener").unwrap();
    engine.draw_event().unwrap();
    let resolution = engine.choose(ChoiceSide::Left).unwrap();
    assert_eq!(resolution.triggered_enqueued, vec!["ev:payoff".to_string()]);

    let pending = engine.draw_event().unwrap();
    assert_eq!(pending.event.event_id, "ev:payoff");
    assert_eq!(pending.tier, SelectionTier::Triggered);
}

#[test]
fn character_interactions_are_recorded() {
    let mut court = event("ev:court", choice_with(Vec::new()), choice_with(Vec::new()));
    court.character_id = Some("char:advisor".to_string());
    court.left.relationship_delta = 7;
    let mut engine = engine_with(vec![court], 42);

    engine.draw_event().unwrap();
    let resolution = engine.choose(ChoiceSide::Left).unwrap();

    let change = resolution.relationship_change.unwrap();
    assert_eq!(change.character_id, "char:advisor");
    assert_eq!(change.new_level, 7);

    let character = engine.state().characters.get("char:advisor").unwrap();
    assert_eq!(character.interaction_count, 1);
    assert_eq!(character.last_interaction_turn, 1);
}

#[test]
fn era_advances_every_twenty_five_turns() {
    assert_eq!(era_for_turn(Era::Founding, 1), Era::Founding);
    assert_eq!(era_for_turn(Era::Founding, 25), Era::Founding);
    assert_eq!(era_for_turn(Era::Founding, 26), Era::Expansion);
    assert_eq!(era_for_turn(Era::Founding, 51), Era::GoldenAge);
    assert_eq!(era_for_turn(Era::Founding, 76), Era::Twilight);
    assert_eq!(era_for_turn(Era::Founding, 500), Era::Twilight);
    assert_eq!(era_for_turn(Era::Expansion, 76), Era::Twilight);
}

#[test]
fn abdication_settles_through_the_narrative_cascade() {
    let mut engine = engine_with(vec![steady_event()], 42);
    engine.abdicate().unwrap();
    let summary = engine.conclude().unwrap();
    // All resources still sit at 50, squarely inside the balance band.
    assert_eq!(summary.ending, EndingId::BalancedRule);
    assert_eq!(summary.turns_survived, 1);
}

#[test]
fn autoplay_is_deterministic_per_seed() {
    let catalog = || Box::new(InMemoryCatalog::default_catalog());
    let config = GameConfig {
        seed: 0xFEED,
        ..GameConfig::default()
    };

    let mut a = DecisionEngine::new(config.clone(), catalog(), Vec::new());
    let mut b = DecisionEngine::new(config, catalog(), Vec::new());

    let summary_a = a.autoplay(200).unwrap();
    let summary_b = b.autoplay(200).unwrap();
    assert_eq!(summary_a, summary_b);

    let ids_a: Vec<&str> = a.turn_log().iter().map(|r| r.event_id.as_str()).collect();
    let ids_b: Vec<&str> = b.turn_log().iter().map(|r| r.event_id.as_str()).collect();
    assert_eq!(ids_a, ids_b);
    assert_eq!(a.turn_log(), b.turn_log());
}

#[test]
fn snapshot_round_trip_preserves_state() {
    let mut engine = engine_with(vec![steady_event()], 42);
    for _ in 0..5 {
        engine.draw_event().unwrap();
        engine.choose(ChoiceSide::Left).unwrap();
    }

    let snapshot = engine.snapshot();
    let restored = GameState::from_snapshot(&snapshot);
    assert_eq!(&restored, engine.state());
    assert_eq!(restored.to_snapshot(), snapshot);
}

#[test]
fn restored_engine_keeps_playing() {
    let mut engine = engine_with(vec![steady_event()], 42);
    engine.draw_event().unwrap();
    engine.choose(ChoiceSide::Left).unwrap();
    let snapshot = engine.snapshot();

    let catalog = Box::new(InMemoryCatalog::new(vec![steady_event()]).unwrap());
    let mut restored = DecisionEngine::restore(
        engine.config().clone(),
        catalog,
        Vec::new(),
        &snapshot,
    );
    assert_eq!(restored.state().turn, 2);
    restored.draw_event().unwrap();
    restored.choose(ChoiceSide::Right).unwrap();
    assert_eq!(restored.state().turn, 3);
}
