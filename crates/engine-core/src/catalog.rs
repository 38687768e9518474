//! Event catalog: the query surface the engine consumes, an in-memory
//! implementation with eager content validation, and the built-in card
//! set used by the CLI and tests.
//!
//! Malformed content (an effect range with min > max, duplicate ids) is a
//! load-time error; the engine never sees an invalid catalog.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{
    ChoiceDef, ConditionDef, Era, EventCategory, EventDef, ResourceEffect, ResourceKind,
};

// ---------------------------------------------------------------------------
// Query interface
// ---------------------------------------------------------------------------

pub trait EventCatalog: fmt::Debug + Send + Sync {
    fn get_by_id(&self, event_id: &str) -> Option<&EventDef>;
    fn events_for_era(&self, era: Era) -> Vec<&EventDef>;
    /// Designated sequel of the most recently played event, if any.
    fn chain_event_for(&self, last_id: &str) -> Option<&EventDef>;
    fn rare_events_for_era(&self, era: Era) -> Vec<&EventDef>;
}

// ---------------------------------------------------------------------------
// Load-time validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    DuplicateEventId(String),
    InvalidEffectRange {
        event_id: String,
        resource: ResourceKind,
        min: i64,
        max: i64,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEventId(event_id) => {
                write!(f, "duplicate event_id: {event_id}")
            }
            Self::InvalidEffectRange {
                event_id,
                resource,
                min,
                max,
            } => write!(
                f,
                "event {event_id}: effect range for {resource:?} has min {min} > max {max}"
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

// ---------------------------------------------------------------------------
// InMemoryCatalog
// ---------------------------------------------------------------------------

/// Catalog backed by a vector in author order (the order tie-broken
/// selections fall back to) with id and era indexes.
#[derive(Debug)]
pub struct InMemoryCatalog {
    events: Vec<EventDef>,
    by_id: BTreeMap<String, usize>,
    by_era: BTreeMap<Era, Vec<usize>>,
}

impl InMemoryCatalog {
    pub fn new(events: Vec<EventDef>) -> Result<Self, CatalogError> {
        for event in &events {
            for choice in [&event.left, &event.right] {
                for effect in &choice.effects {
                    if effect.min > effect.max {
                        return Err(CatalogError::InvalidEffectRange {
                            event_id: event.event_id.clone(),
                            resource: effect.resource,
                            min: effect.min,
                            max: effect.max,
                        });
                    }
                }
            }
        }

        let mut catalog = Self {
            events: Vec::with_capacity(events.len()),
            by_id: BTreeMap::new(),
            by_era: BTreeMap::new(),
        };
        for event in events {
            if catalog.by_id.contains_key(&event.event_id) {
                return Err(CatalogError::DuplicateEventId(event.event_id));
            }
            let index = catalog.events.len();
            catalog.by_id.insert(event.event_id.clone(), index);
            catalog.by_era.entry(event.era).or_default().push(index);
            catalog.events.push(event);
        }
        Ok(catalog)
    }

    pub fn events(&self) -> &[EventDef] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventCatalog for InMemoryCatalog {
    fn get_by_id(&self, event_id: &str) -> Option<&EventDef> {
        self.by_id.get(event_id).map(|&index| &self.events[index])
    }

    fn events_for_era(&self, era: Era) -> Vec<&EventDef> {
        self.by_era
            .get(&era)
            .map(|indexes| indexes.iter().map(|&index| &self.events[index]).collect())
            .unwrap_or_default()
    }

    fn chain_event_for(&self, last_id: &str) -> Option<&EventDef> {
        let successor = self.get_by_id(last_id)?.chain_next.as_deref()?;
        self.get_by_id(successor)
    }

    fn rare_events_for_era(&self, era: Era) -> Vec<&EventDef> {
        self.events_for_era(era)
            .into_iter()
            .filter(|event| event.rare)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Built-in card set
// ---------------------------------------------------------------------------

fn effect(resource: ResourceKind, min: i64, max: i64) -> ResourceEffect {
    ResourceEffect { resource, min, max }
}

fn choice(text: &str, effects: Vec<ResourceEffect>) -> ChoiceDef {
    ChoiceDef {
        text: text.to_string(),
        effects,
        triggered_events: Vec::new(),
        set_flags: Vec::new(),
        relationship_delta: 0,
    }
}

fn card(
    event_id: &str,
    era: Era,
    category: EventCategory,
    base_weight: i64,
    left: ChoiceDef,
    right: ChoiceDef,
) -> EventDef {
    EventDef {
        event_id: event_id.to_string(),
        era,
        category,
        conditions: Vec::new(),
        base_weight,
        priority_bonus: 0,
        rare: false,
        character_id: None,
        chain_next: None,
        left,
        right,
    }
}

impl InMemoryCatalog {
    /// The built-in card set: every era carries kingdom, recurring, story,
    /// character, and rare cards, with one chain and two flag arcs.
    pub fn default_catalog() -> Self {
        use ResourceKind::{Faith, Gold, Happiness, Military};

        let events = vec![
            // -- Founding ----------------------------------------------------
            card(
                "ev:harvest_tithe",
                Era::Founding,
                EventCategory::Kingdom,
                40,
                choice(
                    "Collect the full tithe",
                    vec![effect(Gold, 8, 14), effect(Happiness, -10, -5)],
                ),
                choice(
                    "Waive it this season",
                    vec![effect(Gold, -9, -4), effect(Happiness, 4, 9)],
                ),
            ),
            card(
                "ev:village_festival",
                Era::Founding,
                EventCategory::Recurring,
                30,
                choice(
                    "Fund the festival",
                    vec![effect(Gold, -8, -4), effect(Happiness, 5, 12)],
                ),
                choice(
                    "The treasury stays shut",
                    vec![effect(Gold, 2, 4), effect(Happiness, -8, -3)],
                ),
            ),
            EventDef {
                chain_next: Some("ev:border_ultimatum".to_string()),
                ..card(
                    "ev:border_skirmish",
                    Era::Founding,
                    EventCategory::Kingdom,
                    35,
                    choice(
                        "Reinforce the watchtowers",
                        vec![effect(Gold, -7, -3), effect(Military, 5, 10)],
                    ),
                    choice(
                        "Ignore the raiders",
                        vec![effect(Military, -9, -4), effect(Happiness, -4, -1)],
                    ),
                )
            },
            card(
                "ev:border_ultimatum",
                Era::Founding,
                EventCategory::Kingdom,
                6,
                choice(
                    "March on the raiders' camp",
                    vec![effect(Military, -6, 6), effect(Happiness, 2, 6)],
                ),
                choice(
                    "Buy them off",
                    vec![effect(Gold, -12, -8), effect(Military, 1, 3)],
                ),
            ),
            EventDef {
                character_id: Some("char:chancellor".to_string()),
                ..card(
                    "ev:chancellors_audit",
                    Era::Founding,
                    EventCategory::Character,
                    30,
                    ChoiceDef {
                        relationship_delta: 6,
                        ..choice(
                            "Trust the chancellor's figures",
                            vec![effect(Gold, 3, 8)],
                        )
                    },
                    ChoiceDef {
                        relationship_delta: -12,
                        set_flags: vec!["flag:chancellor_grudge".to_string()],
                        triggered_events: vec!["ev:chancellors_revenge".to_string()],
                        ..choice(
                            "Audit him publicly",
                            vec![effect(Gold, -2, 2), effect(Happiness, 2, 5)],
                        )
                    },
                )
            },
            EventDef {
                character_id: Some("char:chancellor".to_string()),
                conditions: vec![ConditionDef::FlagSet {
                    flag: "flag:chancellor_grudge".to_string(),
                }],
                ..card(
                    "ev:chancellors_revenge",
                    Era::Founding,
                    EventCategory::Character,
                    8,
                    choice(
                        "Let the courts handle it",
                        vec![effect(Gold, -10, -5), effect(Happiness, -6, -2)],
                    ),
                    ChoiceDef {
                        set_flags: vec!["flag:betrayal".to_string()],
                        relationship_delta: -20,
                        ..choice(
                            "Banish him without trial",
                            vec![effect(Happiness, -12, -6), effect(Faith, -6, -2)],
                        )
                    },
                )
            },
            EventDef {
                rare: true,
                ..card(
                    "ev:wandering_prophet",
                    Era::Founding,
                    EventCategory::Kingdom,
                    10,
                    ChoiceDef {
                        set_flags: vec!["flag:prophecy_spoken".to_string()],
                        triggered_events: vec!["ev:prophecy_test".to_string()],
                        ..choice(
                            "Grant the prophet an audience",
                            vec![effect(Faith, 6, 12), effect(Gold, -3, -1)],
                        )
                    },
                    choice(
                        "Turn the vagrant away",
                        vec![effect(Faith, -8, -3), effect(Happiness, 1, 3)],
                    ),
                )
            },
            EventDef {
                conditions: vec![ConditionDef::FlagSet {
                    flag: "flag:prophecy_spoken".to_string(),
                }],
                ..card(
                    "ev:prophecy_test",
                    Era::Founding,
                    EventCategory::Kingdom,
                    6,
                    ChoiceDef {
                        set_flags: vec!["flag:prophecy_fulfilled".to_string()],
                        ..choice(
                            "Build the shrine the vision demands",
                            vec![effect(Gold, -14, -8), effect(Faith, 10, 18)],
                        )
                    },
                    choice(
                        "Dismiss the prophecy",
                        vec![effect(Faith, -10, -5), effect(Gold, 2, 5)],
                    ),
                )
            },
            EventDef {
                priority_bonus: 10,
                ..card(
                    "ev:founding_charter",
                    Era::Founding,
                    EventCategory::Story,
                    25,
                    choice(
                        "A charter of free burghers",
                        vec![effect(Happiness, 6, 10), effect(Gold, -5, -2)],
                    ),
                    choice(
                        "A charter of crown monopolies",
                        vec![effect(Gold, 6, 10), effect(Happiness, -6, -3)],
                    ),
                )
            },
            // -- Expansion ---------------------------------------------------
            card(
                "ev:trade_charter",
                Era::Expansion,
                EventCategory::Kingdom,
                35,
                choice(
                    "License the merchant league",
                    vec![effect(Gold, 6, 12), effect(Faith, -4, -1)],
                ),
                choice(
                    "Keep trade in crown hands",
                    vec![effect(Gold, -3, 3), effect(Happiness, -4, -1)],
                ),
            ),
            card(
                "ev:market_day",
                Era::Expansion,
                EventCategory::Recurring,
                28,
                choice(
                    "Lower the stall fees",
                    vec![effect(Gold, -4, -1), effect(Happiness, 3, 7)],
                ),
                choice(
                    "Double the stall fees",
                    vec![effect(Gold, 3, 7), effect(Happiness, -6, -2)],
                ),
            ),
            EventDef {
                character_id: Some("char:general".to_string()),
                ..card(
                    "ev:generals_parade",
                    Era::Expansion,
                    EventCategory::Character,
                    30,
                    ChoiceDef {
                        relationship_delta: 10,
                        ..choice(
                            "Fund a triumphal parade",
                            vec![effect(Gold, -8, -4), effect(Military, 5, 9)],
                        )
                    },
                    ChoiceDef {
                        relationship_delta: -10,
                        ..choice(
                            "Parades win no wars",
                            vec![effect(Military, -5, -2), effect(Gold, 1, 3)],
                        )
                    },
                )
            },
            EventDef {
                conditions: vec![ConditionDef::ResourceAtMost {
                    resource: Military,
                    value: 35,
                }],
                ..card(
                    "ev:garrison_mutiny",
                    Era::Expansion,
                    EventCategory::Kingdom,
                    20,
                    choice(
                        "Pay the back wages",
                        vec![effect(Gold, -10, -6), effect(Military, 6, 10)],
                    ),
                    choice(
                        "Hang the ringleaders",
                        vec![effect(Military, -4, 2), effect(Happiness, -8, -4)],
                    ),
                )
            },
            EventDef {
                rare: true,
                ..card(
                    "ev:gilded_reliquary",
                    Era::Expansion,
                    EventCategory::Kingdom,
                    10,
                    choice(
                        "Enshrine the relic",
                        vec![effect(Faith, 8, 14), effect(Gold, -6, -3)],
                    ),
                    choice(
                        "Sell it to the highest bidder",
                        vec![effect(Gold, 10, 16), effect(Faith, -10, -5)],
                    ),
                )
            },
            EventDef {
                priority_bonus: 10,
                ..card(
                    "ev:roads_of_empire",
                    Era::Expansion,
                    EventCategory::Story,
                    25,
                    choice(
                        "Roads for the legions",
                        vec![effect(Military, 5, 9), effect(Gold, -8, -4)],
                    ),
                    choice(
                        "Roads for the caravans",
                        vec![effect(Gold, 5, 9), effect(Military, -3, -1)],
                    ),
                )
            },
            // -- Golden age --------------------------------------------------
            card(
                "ev:grand_tournament",
                Era::GoldenAge,
                EventCategory::Kingdom,
                30,
                choice(
                    "Host the tournament",
                    vec![
                        effect(Gold, -9, -5),
                        effect(Happiness, 6, 11),
                        effect(Military, 2, 5),
                    ],
                ),
                choice(
                    "Cancel the spectacle",
                    vec![effect(Gold, 3, 6), effect(Happiness, -7, -3)],
                ),
            ),
            EventDef {
                character_id: Some("char:high_priestess".to_string()),
                ..card(
                    "ev:priestess_blessing",
                    Era::GoldenAge,
                    EventCategory::Character,
                    30,
                    ChoiceDef {
                        relationship_delta: 8,
                        ..choice(
                            "Kneel for the blessing",
                            vec![effect(Faith, 5, 10), effect(Happiness, 2, 5)],
                        )
                    },
                    ChoiceDef {
                        relationship_delta: -8,
                        ..choice(
                            "The crown kneels to no one",
                            vec![effect(Faith, -8, -4), effect(Military, 2, 4)],
                        )
                    },
                )
            },
            EventDef {
                conditions: vec![ConditionDef::TurnAtLeast { turn: 40 }],
                priority_bonus: 12,
                ..card(
                    "ev:golden_jubilee",
                    Era::GoldenAge,
                    EventCategory::Story,
                    25,
                    choice(
                        "A jubilee for the people",
                        vec![effect(Gold, -10, -6), effect(Happiness, 8, 14)],
                    ),
                    choice(
                        "A jubilee for the court",
                        vec![effect(Gold, -5, -2), effect(Faith, 3, 6), effect(Happiness, -4, -1)],
                    ),
                )
            },
            EventDef {
                rare: true,
                ..card(
                    "ev:comet_omen",
                    Era::GoldenAge,
                    EventCategory::Kingdom,
                    10,
                    choice(
                        "Declare it a holy sign",
                        vec![effect(Faith, 7, 13), effect(Happiness, -3, 3)],
                    ),
                    choice(
                        "Commission the astronomers",
                        vec![effect(Gold, -6, -3), effect(Faith, -7, -3), effect(Happiness, 3, 6)],
                    ),
                )
            },
            card(
                "ev:silk_embassy",
                Era::GoldenAge,
                EventCategory::Recurring,
                26,
                choice(
                    "Shower the envoys with gifts",
                    vec![effect(Gold, -7, -3), effect(Happiness, 2, 5), effect(Military, 1, 3)],
                ),
                choice(
                    "Receive them plainly",
                    vec![effect(Gold, 1, 3), effect(Happiness, -3, -1)],
                ),
            ),
            // -- Twilight ----------------------------------------------------
            card(
                "ev:failing_harvest",
                Era::Twilight,
                EventCategory::Kingdom,
                35,
                choice(
                    "Open the granaries",
                    vec![effect(Gold, -8, -4), effect(Happiness, 5, 9)],
                ),
                choice(
                    "Ration by decree",
                    vec![effect(Happiness, -9, -4), effect(Military, 2, 4)],
                ),
            ),
            EventDef {
                priority_bonus: 10,
                ..card(
                    "ev:old_rivals_return",
                    Era::Twilight,
                    EventCategory::Story,
                    30,
                    choice(
                        "Meet them in the field",
                        vec![effect(Military, -8, 8), effect(Happiness, 2, 5)],
                    ),
                    choice(
                        "Sue for peace",
                        vec![effect(Gold, -10, -6), effect(Military, -4, -1), effect(Happiness, 1, 4)],
                    ),
                )
            },
            card(
                "ev:last_crusade",
                Era::Twilight,
                EventCategory::Kingdom,
                25,
                choice(
                    "Bless the crusade",
                    vec![effect(Faith, 8, 14), effect(Military, -7, -3), effect(Gold, -6, -3)],
                ),
                choice(
                    "Forbid it",
                    vec![effect(Faith, -9, -5), effect(Military, 3, 6)],
                ),
            ),
            EventDef {
                rare: true,
                character_id: Some("char:spymaster".to_string()),
                ..card(
                    "ev:spymasters_ledger",
                    Era::Twilight,
                    EventCategory::Character,
                    10,
                    ChoiceDef {
                        relationship_delta: 6,
                        ..choice(
                            "Pay for every name in it",
                            vec![effect(Gold, -9, -5), effect(Military, 4, 8)],
                        )
                    },
                    ChoiceDef {
                        relationship_delta: -15,
                        set_flags: vec!["flag:betrayal".to_string()],
                        ..choice(
                            "Burn the ledger and its keeper",
                            vec![effect(Happiness, -6, -2), effect(Faith, -4, -1)],
                        )
                    },
                )
            },
            card(
                "ev:winter_court",
                Era::Twilight,
                EventCategory::Recurring,
                26,
                choice(
                    "Keep the hearths of the poor lit",
                    vec![effect(Gold, -6, -3), effect(Happiness, 4, 8)],
                ),
                choice(
                    "The court winters alone",
                    vec![effect(Gold, 2, 4), effect(Happiness, -5, -2), effect(Faith, -2, 0)],
                ),
            ),
        ];

        // Built-in content is validated like any other load.
        match Self::new(events) {
            Ok(catalog) => catalog,
            Err(err) => unreachable!("built-in catalog failed validation: {err}"),
        }
    }
}
