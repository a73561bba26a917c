//! Shared configuration types for Cadence
//!
//! This crate contains serializable policy and settings types that are shared
//! between the simulation engine (cadence-core) and front-ends. No engine
//! logic lives here.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Timeline Policies
// ─────────────────────────────────────────────────────────────────────────────

/// How the fight-length boundary interacts with a GCD that straddles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoffMode {
    /// Fight ends exactly at the nominal total time. A GCD whose recast
    /// window straddles the boundary has its damage scaled by the fraction
    /// of the recast that falls before the boundary.
    #[default]
    ProrateGcd,
    /// Same boundary, but the scaling fraction is the portion of the
    /// cast-start-to-application span that falls before the boundary.
    ProrateApplication,
    /// The effective fight end is extended just far enough for the final
    /// in-flight GCD (and oGCDs weaved before the next would-be GCD) to
    /// land at full value.
    LaxGcd,
    /// A GCD that would not fully complete before the nominal boundary is
    /// dropped entirely; its would-be start time becomes the effective end.
    StrictGcd,
}

/// Policy for computing each cycle's effective length against timeline drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleLengthMode {
    /// Cycles continually re-snap to absolute multiples of the cycle time
    /// measured from time zero.
    #[default]
    AlignAbsolute,
    /// Same re-snapping, but measured from the recorded start of cycle 0.
    AlignToFirst,
    /// Every cycle gets the full nominal length; drift is tolerated.
    FullDuration,
}

/// What happens when an ability is used before its cooldown is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CooldownMode {
    /// Proceed silently.
    None,
    /// Log and proceed.
    #[default]
    Warn,
    /// Fail the run.
    Reject,
    /// Advance the clock to the ability's ready time, then proceed.
    Delay,
}

// ─────────────────────────────────────────────────────────────────────────────
// Ability Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Attack category passed through to the damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttackCategory {
    #[default]
    Weaponskill,
    Spell,
    Ability,
    AutoAttack,
}

/// Which speed stat (if any) scales a cast/recast or cooldown duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeedBasis {
    /// Fixed duration, unaffected by haste.
    #[default]
    None,
    SpellSpeed,
    SkillSpeed,
}

impl SpeedBasis {
    /// Returns true if durations on this basis shorten under haste.
    pub fn is_scaled(&self) -> bool {
        !matches!(self, SpeedBasis::None)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Simulation Settings
// ─────────────────────────────────────────────────────────────────────────────

fn default_cycle_time() -> f64 {
    120.0
}

fn default_total_time() -> f64 {
    510.0
}

fn default_auto_attack_delay() -> f64 {
    3.0
}

fn default_auto_attack_potency() -> f64 {
    90.0
}

fn default_true() -> bool {
    true
}

/// Settings for one simulated encounter.
///
/// Everything here is plain data so front-ends can persist and edit it;
/// the engine is constructed from a value of this type plus a damage model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Nominal length of one rotation cycle in seconds.
    pub cycle_time: f64,
    /// Nominal fight length in seconds.
    pub total_time: f64,
    /// Whether auto-attacks interleave with ability usage.
    pub use_autos: bool,
    /// Base seconds between auto-attacks (scaled by haste at fire time).
    pub auto_attack_delay: f64,
    /// Potency of each auto-attack.
    pub auto_attack_potency: f64,
    /// Fight-end boundary policy.
    pub cutoff_mode: CutoffMode,
    /// Cycle-length alignment policy.
    pub cycle_length_mode: CycleLengthMode,
    /// Cooldown enforcement policy.
    pub cooldown_mode: CooldownMode,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            cycle_time: default_cycle_time(),
            total_time: default_total_time(),
            use_autos: default_true(),
            auto_attack_delay: default_auto_attack_delay(),
            auto_attack_potency: default_auto_attack_potency(),
            cutoff_mode: CutoffMode::default(),
            cycle_length_mode: CycleLengthMode::default(),
            cooldown_mode: CooldownMode::default(),
        }
    }
}
