//! Buff definitions
//!
//! A [`Buff`] bundles its passive effect set with optional capability hooks.
//! Hooks are option-typed slots dispatched "if present, invoke" — there is no
//! inheritance hierarchy behind them. All hook closures receive a
//! [`BuffController`] so they can remove the invoking buff, remove any other
//! active buff, or adjust stack counts.

use std::fmt;
use std::sync::Arc;

use crate::ability::Ability;
use crate::buffs::BuffController;
use crate::formula::{DamageModel, DamageResult};

/// Arbitrary stat-modifier function applied to the combined effect values.
pub type StatModifier = Arc<dyn Fn(&mut CombinedEffects) + Send + Sync>;

/// Transform applied to an ability (pre-cast or pre-snapshot).
pub type AbilityTransform =
    Arc<dyn Fn(&mut BuffController<'_>, Ability) -> Ability + Send + Sync>;

/// Transform applied to a computed damage distribution.
pub type DamageTransform =
    Arc<dyn Fn(&mut BuffController<'_>, DamageResult) -> DamageResult + Send + Sync>;

/// Predicate restricting which abilities a buff applies to.
pub type AppliesPredicate = Arc<dyn Fn(&Ability) -> bool + Send + Sync>;

/// Passive effect set of a buff.
#[derive(Clone, Default)]
pub struct BuffEffects {
    /// Fractional damage increase (0.05 = +5%).
    pub damage_increase: Option<f64>,
    /// Additive critical-hit chance increase (0..1).
    pub crit_chance_increase: Option<f64>,
    /// Additive direct-hit chance increase (0..1).
    pub dhit_chance_increase: Option<f64>,
    pub force_crit: bool,
    pub force_dhit: bool,
    /// Haste percentage (20.0 = 20% faster).
    pub haste: Option<f64>,
    /// Arbitrary stat-modifier function, applied after the declarative
    /// fields are combined.
    pub modify_stats: Option<StatModifier>,
}

impl BuffEffects {
    /// Plain damage% buff.
    pub fn damage(increase: f64) -> Self {
        Self {
            damage_increase: Some(increase),
            ..Default::default()
        }
    }

    /// Plain haste buff.
    pub fn haste(percent: f64) -> Self {
        Self {
            haste: Some(percent),
            ..Default::default()
        }
    }

    /// True when any snapshot-evaluated field is present.
    pub fn snapshot_relevant(&self) -> bool {
        self.damage_increase.is_some()
            || self.crit_chance_increase.is_some()
            || self.dhit_chance_increase.is_some()
            || self.force_crit
            || self.force_dhit
            || self.modify_stats.is_some()
    }
}

impl fmt::Debug for BuffEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuffEffects")
            .field("damage_increase", &self.damage_increase)
            .field("crit_chance_increase", &self.crit_chance_increase)
            .field("dhit_chance_increase", &self.dhit_chance_increase)
            .field("force_crit", &self.force_crit)
            .field("force_dhit", &self.force_dhit)
            .field("haste", &self.haste)
            .field("modify_stats", &self.modify_stats.is_some())
            .finish()
    }
}

/// Optional capability hooks of a buff.
#[derive(Clone, Default)]
pub struct BuffHooks {
    /// Applied once, immediately, before cast/GCD length is computed
    /// (e.g. zeroing a cast time).
    pub before_cast: Option<AbilityTransform>,
    /// Applied once, right before the damage snapshot
    /// (e.g. one-shot potency boosts).
    pub before_snapshot: Option<AbilityTransform>,
    /// Applied to the computed damage distribution.
    pub modify_damage: Option<DamageTransform>,
    /// Restricts which abilities the buff applies to at all.
    pub applies_to: Option<AppliesPredicate>,
}

impl fmt::Debug for BuffHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuffHooks")
            .field("before_cast", &self.before_cast.is_some())
            .field("before_snapshot", &self.before_snapshot.is_some())
            .field("modify_damage", &self.modify_damage.is_some())
            .field("applies_to", &self.applies_to.is_some())
            .finish()
    }
}

/// Recurrence data carried by party buffs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartySchedule {
    /// Seconds between automatic windows.
    pub cooldown: f64,
    /// Pull-relative start time of the first window, if scheduled
    /// automatically rather than driven by rotation code.
    pub start_time: Option<f64>,
}

/// Personal vs. party scope of a buff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffScope {
    Personal,
    Party,
}

/// One buff definition.
#[derive(Debug, Clone, Default)]
pub struct Buff {
    pub name: String,
    /// Window length in seconds. `None` = indefinite.
    pub duration: Option<f64>,
    pub effects: BuffEffects,
    pub hooks: BuffHooks,
    /// Stable status id; falls back to name-based identity when absent.
    pub status_id: Option<u32>,
    /// Initial stack count for stacked buffs.
    pub stacks: Option<u32>,
    /// Present on party buffs; carries the recurrence schedule.
    pub party: Option<PartySchedule>,
}

impl Buff {
    /// A personal buff with the given duration and effects.
    pub fn personal(name: &str, duration: f64, effects: BuffEffects) -> Self {
        Self {
            name: name.to_string(),
            duration: Some(duration),
            effects,
            ..Default::default()
        }
    }

    /// A recurring party buff.
    pub fn party(name: &str, duration: f64, effects: BuffEffects, schedule: PartySchedule) -> Self {
        Self {
            name: name.to_string(),
            duration: Some(duration),
            effects,
            party: Some(schedule),
            ..Default::default()
        }
    }

    pub fn scope(&self) -> BuffScope {
        if self.party.is_some() {
            BuffScope::Party
        } else {
            BuffScope::Personal
        }
    }

    /// Identity: status id when both sides carry one, name otherwise.
    pub fn same_buff(&self, other: &Buff) -> bool {
        match (self.status_id, other.status_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name,
        }
    }

    /// Whether this buff applies to `ability` at all.
    pub fn applies_to(&self, ability: &Ability) -> bool {
        match &self.hooks.applies_to {
            Some(pred) => pred(ability),
            None => true,
        }
    }

    /// Relevant to the cast-start evaluation point: haste determines
    /// cast/recast length, which is fixed once casting begins.
    pub fn relevant_at_start(&self) -> bool {
        self.effects.haste.is_some() || self.hooks.before_cast.is_some()
    }

    /// Relevant to the snapshot evaluation point. A buff with neither
    /// start-relevant nor snapshot-relevant content falls back to
    /// snapshot-relevant.
    pub fn relevant_at_snapshot(&self) -> bool {
        if self.effects.snapshot_relevant()
            || self.hooks.before_snapshot.is_some()
            || self.hooks.modify_damage.is_some()
        {
            return true;
        }
        !self.relevant_at_start()
    }
}

/// Allocator for synthetic status ids, owned by the kit-construction
/// context rather than any process-wide state.
#[derive(Debug, Clone)]
pub struct StatusIdAllocator {
    next: u32,
}

impl StatusIdAllocator {
    /// Synthetic ids start high to stay clear of catalog ids.
    pub fn new() -> Self {
        Self { next: 0x1000_0000 }
    }

    /// Fill in `status_id` if the buff lacks one.
    pub fn assign(&mut self, mut buff: Buff) -> Buff {
        if buff.status_id.is_none() {
            buff.status_id = Some(self.next);
            self.next += 1;
        }
        buff
    }
}

impl Default for StatusIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Combined effect values used by one ability use.
///
/// Haste comes from the cast-start evaluation; every other field comes from
/// the snapshot evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedEffects {
    /// Product of all `1 + damage_increase` factors.
    pub damage_multiplier: f64,
    pub crit_chance_bonus: f64,
    pub dhit_chance_bonus: f64,
    pub force_crit: bool,
    pub force_dhit: bool,
    /// Aggregate haste percentage from the cast-start buff set.
    pub haste: f64,
}

impl Default for CombinedEffects {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            crit_chance_bonus: 0.0,
            dhit_chance_bonus: 0.0,
            force_crit: false,
            force_dhit: false,
            haste: 0.0,
        }
    }
}

/// Fold two buff sets into the combined effect values for one use.
///
/// `start` is the cast-start set (haste only); `snapshot` contributes
/// everything else. Stat-modifier functions run last, in buff order.
pub fn combine_effects(
    start: &[Buff],
    snapshot: &[Buff],
    model: &dyn DamageModel,
) -> CombinedEffects {
    let haste_sources: Vec<f64> = start.iter().filter_map(|b| b.effects.haste).collect();

    let mut combined = CombinedEffects {
        haste: model.combine_haste(&haste_sources),
        ..Default::default()
    };

    for buff in snapshot {
        let effects = &buff.effects;
        if let Some(increase) = effects.damage_increase {
            combined.damage_multiplier *= 1.0 + increase;
        }
        if let Some(increase) = effects.crit_chance_increase {
            combined.crit_chance_bonus += increase;
        }
        if let Some(increase) = effects.dhit_chance_increase {
            combined.dhit_chance_bonus += increase;
        }
        combined.force_crit |= effects.force_crit;
        combined.force_dhit |= effects.force_dhit;
    }

    for buff in snapshot {
        if let Some(modify) = &buff.effects.modify_stats {
            modify(&mut combined);
        }
    }

    combined
}
