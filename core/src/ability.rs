//! Ability descriptors
//!
//! An [`Ability`] is an immutable value describing one usable action: its
//! classification (GCD / oGCD / auto-attack), potency, timing overrides,
//! cooldown descriptor, combo declarations, and the buffs it activates.
//! Transformations (combo overrides, buff hooks) always produce new values;
//! the canonical descriptor is never mutated in place.

use cadence_types::{AttackCategory, SpeedBasis};

use crate::buffs::Buff;

/// Base recast for GCD abilities without an explicit recast.
pub const DEFAULT_GCD: f64 = 2.5;

/// Ability classification on the global-cooldown axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbilityKind {
    /// Rolls the global cooldown.
    #[default]
    Gcd,
    /// Weaveable between GCDs; only occupies its animation lock.
    OffGcd,
    /// Fired automatically by the timeline, never used directly.
    AutoAttack,
}

/// Cooldown descriptor for an ability (or shared-cooldown group).
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownDescriptor {
    /// Cooldown duration in seconds (per charge).
    pub duration: f64,
    /// Number of charges. One for simple cooldowns.
    pub charges: u32,
    /// Speed stat that shortens this cooldown, if any.
    pub speed_basis: SpeedBasis,
    /// Stable id of the ability whose cooldown state this ability shares.
    pub shares_cooldown_with: Option<u32>,
}

impl CooldownDescriptor {
    /// A plain single-charge cooldown.
    pub fn simple(duration: f64) -> Self {
        Self {
            duration,
            charges: 1,
            speed_basis: SpeedBasis::None,
            shares_cooldown_with: None,
        }
    }

    /// A charge-based cooldown.
    pub fn charges(duration: f64, charges: u32) -> Self {
        Self {
            duration,
            charges,
            speed_basis: SpeedBasis::None,
            shares_cooldown_with: None,
        }
    }
}

/// Damage-over-time payload attached to an ability.
///
/// Keyed by `id` (the DoT definition, not the applying ability), so two
/// abilities applying the same DoT overwrite each other's ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct DotDescriptor {
    /// DoT definition id.
    pub id: u32,
    /// Nominal duration in seconds.
    pub duration: f64,
    /// Potency of each tick.
    pub tick_potency: f64,
}

/// Combo key every declaration belongs to unless it names another.
pub const DEFAULT_COMBO_KEY: &str = "all";

/// Transition behavior of one combo declaration.
#[derive(Debug, Clone)]
pub enum ComboBehavior {
    /// This ability opens the combo chain for its key.
    Start,
    /// This ability continues a chain if the key's last-matched ability is
    /// one of `combo_from`; otherwise it falls through to the break rule.
    Continue { combo_from: Vec<Ability> },
    /// Clears the key's tracker.
    Break,
    /// Leaves the key's tracker untouched.
    NoBreak,
}

/// Field overrides merged onto an ability when its combo condition holds.
#[derive(Debug, Clone, Default)]
pub struct ComboOverrides {
    /// Elevated combo potency.
    pub potency: Option<f64>,
    /// Replacement buff-activation list.
    pub activates: Option<Vec<Buff>>,
}

impl ComboOverrides {
    /// Merge these overrides onto `ability`.
    pub fn apply(&self, ability: &mut Ability) {
        if let Some(potency) = self.potency {
            ability.potency = Some(potency);
        }
        if let Some(activates) = &self.activates {
            ability.activates = activates.clone();
        }
    }
}

/// One combo declaration on an ability.
#[derive(Debug, Clone)]
pub struct ComboDeclaration {
    /// Combo key this declaration addresses.
    pub key: String,
    pub behavior: ComboBehavior,
    /// Overrides merged when the combo condition is satisfied.
    pub overrides: ComboOverrides,
}

impl ComboDeclaration {
    /// Declaration for the default ("all") key.
    pub fn default_key(behavior: ComboBehavior) -> Self {
        Self {
            key: DEFAULT_COMBO_KEY.to_string(),
            behavior,
            overrides: ComboOverrides::default(),
        }
    }

    /// Declaration for a named key.
    pub fn keyed(key: &str, behavior: ComboBehavior) -> Self {
        Self {
            key: key.to_string(),
            behavior,
            overrides: ComboOverrides::default(),
        }
    }
}

/// One usable combat action.
#[derive(Debug, Clone, Default)]
pub struct Ability {
    /// Stable id. Abilities without ids cannot participate in identity
    /// comparisons (combo predecessors, shared cooldowns).
    pub id: Option<u32>,
    pub name: String,
    pub kind: AbilityKind,
    pub category: AttackCategory,
    /// Damage potency. `None` marks a non-damaging action.
    pub potency: Option<f64>,
    /// Base cast time in seconds; `None` for instant abilities.
    pub cast_time: Option<f64>,
    /// Base GCD recast in seconds. Only meaningful for [`AbilityKind::Gcd`].
    pub gcd_recast: f64,
    /// When set, cast/recast skip the speed formula entirely.
    pub fixed_gcd: bool,
    /// Speed stat that shortens this ability's cast/recast.
    pub speed_basis: SpeedBasis,
    /// Animation lock override in seconds.
    pub animation_lock: Option<f64>,
    /// Snapshot-to-application delay override in seconds.
    pub application_delay: Option<f64>,
    pub cooldown: Option<CooldownDescriptor>,
    pub combos: Vec<ComboDeclaration>,
    /// Buffs this ability activates on use.
    pub activates: Vec<Buff>,
    pub dot: Option<DotDescriptor>,
}

impl Ability {
    /// A GCD skeleton with the default recast.
    pub fn gcd(id: u32, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            kind: AbilityKind::Gcd,
            gcd_recast: DEFAULT_GCD,
            ..Default::default()
        }
    }

    /// An oGCD skeleton.
    pub fn ogcd(id: u32, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            kind: AbilityKind::OffGcd,
            category: AttackCategory::Ability,
            ..Default::default()
        }
    }

    pub fn is_gcd(&self) -> bool {
        matches!(self.kind, AbilityKind::Gcd)
    }

    /// Whether this ability produces direct damage.
    pub fn is_damaging(&self) -> bool {
        self.potency.is_some()
    }
}

/// Identity comparison between two abilities.
///
/// Ids are the only identity; when both sides lack one the comparison is
/// ambiguous: it is logged and resolves false rather than guessing.
pub fn abilities_equal(a: &Ability, b: &Ability) -> bool {
    match (a.id, b.id) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        (None, None) => {
            tracing::warn!(
                left = %a.name,
                right = %b.name,
                "ambiguous ability equality: neither side has an id, resolving false"
            );
            false
        }
        _ => false,
    }
}
