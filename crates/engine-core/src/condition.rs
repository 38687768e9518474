//! Pure eligibility evaluation: the logical AND of an event's conditions
//! against current game state. Missing data fails closed (predicate =
//! false) rather than raising; an empty condition list is always true.

use contracts::ConditionDef;

use crate::engine::GameState;

pub fn evaluate(conditions: &[ConditionDef], state: &GameState) -> bool {
    conditions
        .iter()
        .all(|condition| evaluate_one(condition, state))
}

fn evaluate_one(condition: &ConditionDef, state: &GameState) -> bool {
    match condition {
        ConditionDef::FlagSet { flag } => state.flags.contains(flag),
        ConditionDef::FlagAbsent { flag } => !state.flags.contains(flag),
        ConditionDef::ResourceAtLeast { resource, value } => {
            state.ledger.resources().get(*resource) >= *value
        }
        ConditionDef::ResourceAtMost { resource, value } => {
            state.ledger.resources().get(*resource) <= *value
        }
        ConditionDef::TurnAtLeast { turn } => state.turn >= *turn,
        ConditionDef::TurnAtMost { turn } => state.turn <= *turn,
        ConditionDef::RelationshipAtLeast {
            character_id,
            value,
        } => state
            .characters
            .get(character_id)
            .map(|character| character.relationship_level >= *value)
            .unwrap_or(false),
        ConditionDef::EraIs { era } => state.era == *era,
    }
}
