//! One turn of play: draw a card, preview either side as often as
//! wanted, commit exactly one choice, settle the consequences.

use contracts::{ChoiceSide, ReignSummary, RelationshipChange, ResourceKind, TurnResolution};

use super::{era_for_turn, DecisionEngine, EngineError, PendingEvent, TurnPhase};
use crate::{ending, legacy, selector};

impl DecisionEngine {
    /// Draw the card for the current turn. Idempotent while a card is
    /// outstanding: re-drawing returns the same pending card rather than
    /// consuming more selection randomness.
    pub fn draw_event(&mut self) -> Result<PendingEvent, EngineError> {
        if self.phase == TurnPhase::Terminal {
            return Err(EngineError::GameComplete);
        }
        if let Some(pending) = &self.pending {
            return Ok(pending.clone());
        }

        let selected = selector::select_next(
            &mut self.state,
            self.catalog.as_ref(),
            &self.config,
            self.rng.as_mut(),
            &self.modifiers,
        )
        .ok_or(EngineError::NoEventAvailable)?;

        let pending = PendingEvent {
            event: selected.event,
            tier: selected.tier,
        };
        self.pending = Some(pending.clone());
        Ok(pending)
    }

    /// Midpoint deltas for one side of the pending card. Callable any
    /// number of times; never touches committed state.
    pub fn preview(&self, side: ChoiceSide) -> Result<Vec<(ResourceKind, i64)>, EngineError> {
        if self.phase == TurnPhase::Terminal {
            return Err(EngineError::GameComplete);
        }
        let pending = self.pending.as_ref().ok_or(EngineError::NoPendingEvent)?;
        Ok(pending
            .event
            .choice(side)
            .effects
            .iter()
            .map(|effect| (effect.resource, self.state.ledger.preview_effect(effect)))
            .collect())
    }

    /// Commit one side of the pending card. Taking the pending card is
    /// the idempotency guard: a second commit for the same drawn card
    /// fails with `NoPendingEvent` instead of reapplying effects.
    pub fn choose(&mut self, side: ChoiceSide) -> Result<TurnResolution, EngineError> {
        if self.phase == TurnPhase::Terminal {
            return Err(EngineError::GameComplete);
        }
        let pending = self.pending.take().ok_or(EngineError::NoPendingEvent)?;
        self.phase = TurnPhase::Resolving;

        let event = pending.event;
        let choice = event.choice(side).clone();

        let mut applied = Vec::with_capacity(choice.effects.len());
        for effect in &choice.effects {
            applied.push(
                self.state
                    .ledger
                    .apply(effect, self.rng.as_mut(), &self.modifiers),
            );
        }

        self.state.history.push(event.event_id.clone());
        for triggered in &choice.triggered_events {
            self.state.triggered_queue.push_back(triggered.clone());
        }
        for flag in &choice.set_flags {
            self.state.flags.insert(flag.clone());
        }

        let relationship_change = event.character_id.as_ref().map(|character_id| {
            let character = self.state.characters.entry(character_id.clone()).or_default();
            character.interaction_count += 1;
            character.last_interaction_turn = self.state.turn;
            character.relationship_level += choice.relationship_delta;
            RelationshipChange {
                character_id: character_id.clone(),
                delta: choice.relationship_delta,
                new_level: character.relationship_level,
            }
        });

        let terminal = self.state.ledger.check_terminal();
        let resolution = TurnResolution {
            turn: self.state.turn,
            event_id: event.event_id,
            side,
            tier: pending.tier,
            applied,
            flags_set: choice.set_flags,
            triggered_enqueued: choice.triggered_events,
            relationship_change,
            terminal,
        };
        self.turn_log.push(resolution.clone());

        match terminal {
            Some(reason) => {
                self.state.terminal = Some(reason);
                self.phase = TurnPhase::Terminal;
            }
            None => {
                self.state.turn += 1;
                self.state.era = era_for_turn(self.config.starting_era, self.state.turn);
                self.phase = TurnPhase::AwaitingChoice;
            }
        }
        Ok(resolution)
    }

    /// Queue an externally forced event. The caller vouches for its
    /// eligibility; the selector will not re-check conditions.
    pub fn force_priority_event(&mut self, event_id: &str) -> Result<(), EngineError> {
        if self.phase == TurnPhase::Terminal {
            return Err(EngineError::GameComplete);
        }
        self.state.priority_queue.push_back(event_id.to_string());
        Ok(())
    }

    /// End the reign voluntarily, without a resource extreme. The
    /// narrative ending cascade decides what the history books say.
    pub fn abdicate(&mut self) -> Result<(), EngineError> {
        if self.phase == TurnPhase::Terminal {
            return Err(EngineError::GameComplete);
        }
        self.pending = None;
        self.phase = TurnPhase::Terminal;
        Ok(())
    }

    /// Settle a finished reign: ending, legacy trait, prestige.
    pub fn conclude(&self) -> Result<ReignSummary, EngineError> {
        if self.phase != TurnPhase::Terminal {
            return Err(EngineError::GameInProgress);
        }
        let ending = match self.state.terminal {
            Some(reason) => ending::ending_for_reason(reason),
            None => ending::narrative_ending(&self.state, &self.config),
        };
        Ok(ReignSummary {
            ending,
            legacy: legacy::legacy_trait_for(&self.state),
            prestige: legacy::prestige_points(&self.state, ending),
            turns_survived: self.state.turn,
        })
    }

    /// Scripted playthrough: draw and commit seed-driven choices until a
    /// terminal reason lands or `max_turns` have been played, then
    /// settle the reign. Fully deterministic for a given seed.
    pub fn autoplay(&mut self, max_turns: u64) -> Result<ReignSummary, EngineError> {
        let mut played = 0;
        while self.phase != TurnPhase::Terminal && played < max_turns {
            match self.draw_event() {
                Ok(_) => {}
                Err(EngineError::NoEventAvailable) => break,
                Err(err) => return Err(err),
            }
            let side = if self.rng.next_float01() < 0.5 {
                ChoiceSide::Left
            } else {
                ChoiceSide::Right
            };
            self.choose(side)?;
            played += 1;
        }
        if self.phase != TurnPhase::Terminal {
            self.abdicate()?;
        }
        self.conclude()
    }
}
