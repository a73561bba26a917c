//! Simulation output records
//!
//! The processor emits an ordered list of [`SimRecord`]s: ability uses plus
//! textual markers (cycle boundaries, special annotations). Ordering is
//! strictly chronological by use time, ties broken by call order.

use hashbrown::HashMap;

use crate::ability::Ability;
use crate::buffs::{Buff, BuffUsage, CombinedEffects};
use crate::formula::DamageResult;

/// One DoT application carried by an ability use.
#[derive(Debug, Clone, PartialEq)]
pub struct DotApplication {
    /// DoT definition id (not the applying ability's id).
    pub id: u32,
    /// Tick count of an uninterrupted full-duration application.
    pub full_duration_ticks: u32,
    /// Damage of one tick, snapshot at application.
    pub per_tick: DamageResult,
    /// Actual tick count, fixed when the DoT is overwritten or the
    /// simulation finalizes. `None` while still in flight.
    pub tick_count: Option<u32>,
}

impl DotApplication {
    /// Total expected DoT damage once the tick count is fixed.
    pub fn total_expected(&self) -> f64 {
        self.tick_count.unwrap_or(0) as f64 * self.per_tick.expected
    }
}

/// Record of one resolved ability use.
#[derive(Debug, Clone)]
pub struct UsedAbility {
    /// The ability as used, after combo overrides and buff transforms.
    pub ability: Ability,
    /// Absolute use (cast-start) time.
    pub used_at: f64,
    /// Buffs that affected this use: start-relevant buffs from the
    /// cast-start set plus snapshot-relevant buffs from the snapshot set.
    pub buffs: Vec<Buff>,
    /// Combined effect values: haste from cast start, the rest from
    /// snapshot.
    pub combined: CombinedEffects,
    /// Direct damage distribution; `None` for non-damaging actions.
    pub direct: Option<DamageResult>,
    pub dot: Option<DotApplication>,
    /// Effective cast time in seconds (zero for instants).
    pub cast_time: f64,
    /// Snapshot instant relative to cast start.
    pub snapshot_from_start: f64,
    /// Application instant relative to cast start.
    pub app_delay_from_start: f64,
    /// Effective animation-lock span from cast start.
    pub lock_time: f64,
    /// Span used for fight-end proration under the active cutoff mode.
    pub total_time_taken: f64,
    /// Fraction of the use that fell before the fight boundary, set by
    /// finalization when less than one.
    pub partial_rate: Option<f64>,
    /// Optional per-job gauge data attached by rotation code.
    pub gauge: Option<HashMap<String, f64>>,
}

impl UsedAbility {
    /// Absolute application instant.
    pub fn application_time(&self) -> f64 {
        self.used_at + self.app_delay_from_start
    }

    /// Expected damage contribution after proration and DoT truncation.
    pub fn final_expected_damage(&self) -> f64 {
        let rate = self.partial_rate.unwrap_or(1.0);
        let direct = self.direct.map(|d| d.expected * rate).unwrap_or(0.0);
        let dot = self.dot.as_ref().map(|d| d.total_expected()).unwrap_or(0.0);
        direct + dot
    }
}

/// One entry of the simulation output.
#[derive(Debug, Clone)]
pub enum SimRecord {
    Ability(Box<UsedAbility>),
    /// Textual marker (cycle boundaries, annotations).
    Marker { time: f64, label: String },
}

impl SimRecord {
    pub fn time(&self) -> f64 {
        match self {
            SimRecord::Ability(used) => used.used_at,
            SimRecord::Marker { time, .. } => *time,
        }
    }

    pub fn as_ability(&self) -> Option<&UsedAbility> {
        match self {
            SimRecord::Ability(used) => Some(used),
            SimRecord::Marker { .. } => None,
        }
    }
}

/// Bookkeeping for one rotation cycle.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CycleInfo {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

/// Finalized output of one simulated encounter.
#[derive(Debug)]
pub struct SimulationResult {
    /// Chronological records, ties broken by call order.
    pub records: Vec<SimRecord>,
    pub cycles: Vec<CycleInfo>,
    /// Effective fight duration used for all proration and the DPS figure.
    pub finalized_time_basis: f64,
    /// Complete buff activation history.
    pub buff_history: Vec<BuffUsage>,
    /// Total expected damage with combined deviation.
    pub total_damage: DamageResult,
    pub dps: f64,
}
