//! Damage-formula collaborator boundary
//!
//! The engine treats the closed-form damage and speed math as a black box
//! behind [`DamageModel`]: potency plus combined buff effects in, an expected
//! damage distribution out; base cast/recast seconds plus haste in, effective
//! seconds out. [`FlatScalingModel`] is the deterministic reference
//! implementation used by the CLI and the test suite.

use cadence_types::{AttackCategory, SpeedBasis};

use crate::buffs::CombinedEffects;

/// Expected damage distribution for one hit (or one DoT tick).
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct DamageResult {
    pub expected: f64,
    pub std_dev: f64,
}

impl DamageResult {
    /// Scale both moments, e.g. for fight-end proration.
    pub fn scaled(self, rate: f64) -> Self {
        Self {
            expected: self.expected * rate,
            std_dev: self.std_dev * rate,
        }
    }
}

/// External damage/speed formula collaborator.
///
/// Implementations must be pure: same inputs, same outputs, no interior
/// state. The engine never inspects anything beyond these methods.
pub trait DamageModel: Send + Sync {
    /// Damage distribution for `potency` under the given combined effects.
    fn expected_damage(
        &self,
        potency: f64,
        category: AttackCategory,
        effects: &CombinedEffects,
    ) -> DamageResult;

    /// Effective cast/recast seconds for a base duration under haste.
    /// A [`SpeedBasis::None`] duration is returned unchanged.
    fn effective_seconds(&self, base: f64, basis: SpeedBasis, haste: f64) -> f64;

    /// Combine multiple haste percentages into one aggregate value.
    fn combine_haste(&self, sources: &[f64]) -> f64;

    /// Effective auto-attack interval for a base weapon delay under haste.
    fn auto_attack_delay(&self, base: f64, haste: f64) -> f64;
}

/// Linear reference model: damage scales linearly with potency, damage%
/// multiplies, crit/direct-hit contribute their expected value, haste is a
/// straight percentage reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatScalingModel {
    /// Damage per point of potency before multipliers.
    pub damage_per_potency: f64,
    /// Base critical-hit chance (0..1).
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    /// Base direct-hit chance (0..1).
    pub dhit_chance: f64,
    pub dhit_multiplier: f64,
}

impl Default for FlatScalingModel {
    fn default() -> Self {
        Self {
            damage_per_potency: 10.0,
            crit_chance: 0.25,
            crit_multiplier: 1.5,
            dhit_chance: 0.25,
            dhit_multiplier: 1.25,
        }
    }
}

impl FlatScalingModel {
    /// A model with no random rolls at all; damage is exactly
    /// `potency * damage_per_potency * damage_multiplier`.
    pub fn rollless() -> Self {
        Self {
            damage_per_potency: 10.0,
            crit_chance: 0.0,
            crit_multiplier: 1.0,
            dhit_chance: 0.0,
            dhit_multiplier: 1.0,
        }
    }
}

/// First and second moments of a two-outcome roll multiplier.
fn roll_moments(chance: f64, multiplier: f64) -> (f64, f64) {
    let mean = 1.0 + chance * (multiplier - 1.0);
    let mean_sq = (1.0 - chance) + chance * multiplier * multiplier;
    (mean, mean_sq)
}

impl DamageModel for FlatScalingModel {
    fn expected_damage(
        &self,
        potency: f64,
        _category: AttackCategory,
        effects: &CombinedEffects,
    ) -> DamageResult {
        let base = potency * self.damage_per_potency * effects.damage_multiplier;

        let crit_chance = if effects.force_crit {
            1.0
        } else {
            (self.crit_chance + effects.crit_chance_bonus).clamp(0.0, 1.0)
        };
        let dhit_chance = if effects.force_dhit {
            1.0
        } else {
            (self.dhit_chance + effects.dhit_chance_bonus).clamp(0.0, 1.0)
        };

        let (crit_mean, crit_mean_sq) = roll_moments(crit_chance, self.crit_multiplier);
        let (dhit_mean, dhit_mean_sq) = roll_moments(dhit_chance, self.dhit_multiplier);

        let expected = base * crit_mean * dhit_mean;
        // Crit and direct-hit rolls are independent.
        let variance =
            base * base * (crit_mean_sq * dhit_mean_sq - (crit_mean * dhit_mean).powi(2));

        DamageResult {
            expected,
            std_dev: variance.max(0.0).sqrt(),
        }
    }

    fn effective_seconds(&self, base: f64, basis: SpeedBasis, haste: f64) -> f64 {
        if basis.is_scaled() {
            (base * (100.0 - haste) / 100.0).max(0.0)
        } else {
            base
        }
    }

    fn combine_haste(&self, sources: &[f64]) -> f64 {
        sources.iter().sum()
    }

    fn auto_attack_delay(&self, base: f64, haste: f64) -> f64 {
        (base * (100.0 - haste) / 100.0).max(0.0)
    }
}
