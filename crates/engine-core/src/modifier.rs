//! Selection-modifier hooks contributed by external "special ability"
//! collaborators. The ledger and selector consult these as pure queries;
//! an empty modifier set means every hook answers with its default.

use std::fmt;

use contracts::ResourceKind;

pub trait SelectionModifier: fmt::Debug + Send + Sync {
    /// Scale applied to the rare tier's base odds.
    fn rare_odds_multiplier(&self) -> f64 {
        1.0
    }

    /// Minimum the named resource may be clamped down to, if any.
    fn resource_floor(&self, _resource: ResourceKind) -> Option<i64> {
        None
    }

    /// Percentage bonus added to positive deltas of the named resource.
    fn positive_delta_bonus_percent(&self, _resource: ResourceKind) -> i64 {
        0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RareOddsBoost {
    pub multiplier: f64,
}

impl SelectionModifier for RareOddsBoost {
    fn rare_odds_multiplier(&self) -> f64 {
        self.multiplier
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceFloor {
    pub resource: ResourceKind,
    pub floor: i64,
}

impl SelectionModifier for ResourceFloor {
    fn resource_floor(&self, resource: ResourceKind) -> Option<i64> {
        (resource == self.resource).then_some(self.floor)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PositiveDeltaBonus {
    pub resource: ResourceKind,
    pub percent: i64,
}

impl SelectionModifier for PositiveDeltaBonus {
    fn positive_delta_bonus_percent(&self, resource: ResourceKind) -> i64 {
        if resource == self.resource {
            self.percent
        } else {
            0
        }
    }
}

/// Combined rare-odds scale across a modifier set.
pub fn combined_rare_odds(modifiers: &[Box<dyn SelectionModifier>]) -> f64 {
    modifiers
        .iter()
        .map(|modifier| modifier.rare_odds_multiplier())
        .product()
}

/// Highest floor any modifier grants for the resource, if any.
pub fn combined_floor(modifiers: &[Box<dyn SelectionModifier>], resource: ResourceKind) -> Option<i64> {
    modifiers
        .iter()
        .filter_map(|modifier| modifier.resource_floor(resource))
        .max()
}

/// Summed positive-delta bonus percentage for the resource.
pub fn combined_positive_bonus(
    modifiers: &[Box<dyn SelectionModifier>],
    resource: ResourceKind,
) -> i64 {
    modifiers
        .iter()
        .map(|modifier| modifier.positive_delta_bonus_percent(resource))
        .sum()
}
