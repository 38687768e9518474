//! Resource ledger: owns the four bounded kingdom resources, applies
//! effect ranges, and reports boundary crossings in a fixed check order.

use contracts::{
    AppliedEffect, ResourceEffect, ResourceKind, ResourceSet, TerminalReason,
    RESOURCE_CHECK_ORDER,
};

use crate::modifier::{combined_floor, combined_positive_bonus, SelectionModifier};
use crate::rng::RandomSource;

/// Reason table: one low-extreme and one high-extreme reason per resource.
fn reason_for_extreme(resource: ResourceKind, low: bool) -> TerminalReason {
    match (resource, low) {
        (ResourceKind::Gold, true) => TerminalReason::Bankruptcy,
        (ResourceKind::Gold, false) => TerminalReason::InflationCrisis,
        (ResourceKind::Happiness, true) => TerminalReason::Revolution,
        (ResourceKind::Happiness, false) => TerminalReason::Laziness,
        (ResourceKind::Military, true) => TerminalReason::Invasion,
        (ResourceKind::Military, false) => TerminalReason::MilitaryCoup,
        (ResourceKind::Faith, true) => TerminalReason::Chaos,
        (ResourceKind::Faith, false) => TerminalReason::Theocracy,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLedger {
    resources: ResourceSet,
}

impl ResourceLedger {
    pub fn new(baseline: ResourceSet) -> Self {
        Self {
            resources: baseline.clamped(),
        }
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    /// Draw a delta uniformly from the effect's inclusive range, scale
    /// positive draws by any modifier bonus, add it to the named resource,
    /// clamp to [0, 100] (respecting modifier floors), and report the
    /// realized delta and new value. The only mutation path for resources.
    pub fn apply(
        &mut self,
        effect: &ResourceEffect,
        rng: &mut dyn RandomSource,
        modifiers: &[Box<dyn SelectionModifier>],
    ) -> AppliedEffect {
        let mut delta = rng.next_int_in_range(effect.min, effect.max);
        if delta > 0 {
            let bonus_percent = combined_positive_bonus(modifiers, effect.resource);
            delta = delta.saturating_add(delta.saturating_mul(bonus_percent) / 100);
        }

        // Saturating: a catalog may carry deltas far beyond the value
        // range, and the clamp must still land in [0, 100].
        let before = self.resources.get(effect.resource);
        let mut after = before.saturating_add(delta).clamp(0, 100);
        if let Some(floor) = combined_floor(modifiers, effect.resource) {
            after = after.max(floor.clamp(0, 100));
        }
        self.resources.set(effect.resource, after);

        AppliedEffect {
            resource: effect.resource,
            delta_applied: after - before,
            new_value: after,
        }
    }

    /// First resource at exactly 0 or 100, walked in the fixed check
    /// order, yields the terminal reason. None while all four sit
    /// strictly inside (0, 100).
    pub fn check_terminal(&self) -> Option<TerminalReason> {
        for resource in RESOURCE_CHECK_ORDER {
            let value = self.resources.get(resource);
            if value <= 0 {
                return Some(reason_for_extreme(resource, true));
            }
            if value >= 100 {
                return Some(reason_for_extreme(resource, false));
            }
        }
        None
    }

    /// Midpoint of the effect range for UI preview. Never touches
    /// committed state; callable any number of times between commits.
    pub fn preview_effect(&self, effect: &ResourceEffect) -> i64 {
        effect.midpoint()
    }

    /// Symmetry measure in [0, 1]: 1.0 when every resource sits at the
    /// midpoint, falling linearly as any drifts toward an extreme.
    pub fn balance_score(&self) -> f64 {
        let total_deviation: i64 = RESOURCE_CHECK_ORDER
            .iter()
            .map(|resource| (self.resources.get(*resource) - 50).abs())
            .sum();
        1.0 - total_deviation as f64 / 200.0
    }
}
