//! Cooldown state tracking
//!
//! Each tracked cooldown stores a single "capped at" instant: the time at
//! which the ability returns to full charges. All readiness and charge
//! queries derive from that one value, so shifting the whole timeline
//! (pre-pull renormalization) is a single pass over the map.

use hashbrown::{HashMap, HashSet};

use cadence_types::CooldownMode;

use crate::ability::{Ability, CooldownDescriptor};
use crate::error::{MAX_COOLDOWN_SHARE_HOPS, SimError};

/// A point in time expressed both absolutely and relative to the query time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CooldownTimes {
    pub absolute: f64,
    pub relative: f64,
}

/// Cooldown status of one ability at a specific time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CooldownStatus {
    /// At least one charge available.
    pub ready_to_use: bool,
    /// When the next charge is (or was) available.
    pub ready_at: CooldownTimes,
    /// All charges available.
    pub capped: bool,
    /// When the ability returns to full charges.
    pub capped_at: CooldownTimes,
    pub current_charges: u32,
}

/// Identity of a cooldown group: the owning ability's id, or its name when
/// no id exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CooldownKey {
    Id(u32),
    Name(String),
}

impl CooldownKey {
    fn of(ability: &Ability) -> Self {
        match ability.id {
            Some(id) => CooldownKey::Id(id),
            None => CooldownKey::Name(ability.name.clone()),
        }
    }
}

/// Tracks capped-at state per canonical cooldown key.
#[derive(Debug)]
pub struct CooldownTracker {
    mode: CooldownMode,
    capped_at: HashMap<CooldownKey, f64>,
    /// Descriptors learned from every ability seen, for shared-cooldown
    /// chain resolution.
    descriptors: HashMap<CooldownKey, CooldownDescriptor>,
}

impl CooldownTracker {
    pub fn new(mode: CooldownMode) -> Self {
        Self {
            mode,
            capped_at: HashMap::new(),
            descriptors: HashMap::new(),
        }
    }

    pub fn mode(&self) -> CooldownMode {
        self.mode
    }

    /// Learn an ability's cooldown descriptor so shared chains can resolve
    /// through it later.
    pub fn register(&mut self, ability: &Ability) {
        if let Some(cd) = &ability.cooldown {
            self.descriptors
                .entry(CooldownKey::of(ability))
                .or_insert_with(|| cd.clone());
        }
    }

    /// Apply the enforcement policy for using `ability` at `at`.
    ///
    /// Returns `Some(ready_at)` when the `delay` policy requires the caller
    /// to advance the clock before proceeding; the tracker itself never
    /// moves time.
    pub fn enforce(&self, ability: &Ability, at: f64) -> Result<Option<f64>, SimError> {
        if ability.cooldown.is_none() {
            return Ok(None);
        }
        let status = self.status_of_at(ability, at)?;
        if status.ready_to_use {
            return Ok(None);
        }
        match self.mode {
            CooldownMode::None => Ok(None),
            CooldownMode::Warn => {
                tracing::warn!(
                    ability = %ability.name,
                    at,
                    ready_at = status.ready_at.absolute,
                    "ability used before cooldown ready"
                );
                Ok(None)
            }
            CooldownMode::Reject => Err(SimError::CooldownNotReady {
                name: ability.name.clone(),
                ready_at: status.ready_at.absolute,
                at,
            }),
            CooldownMode::Delay => Ok(Some(status.ready_at.absolute)),
        }
    }

    /// Record a use of `ability` at `now`, consuming one charge.
    ///
    /// `cd_time_override` substitutes the resolved cooldown duration, e.g.
    /// a haste-adjusted value for speed-scaled cooldowns.
    pub fn register_use(
        &mut self,
        ability: &Ability,
        now: f64,
        cd_time_override: Option<f64>,
    ) -> Result<(), SimError> {
        if ability.cooldown.is_none() {
            return Ok(());
        }
        self.register(ability);
        let (key, descriptor) = self.canonical(ability)?;
        let cd_time = cd_time_override.unwrap_or(descriptor.duration);

        let status = self.status_of_at(ability, now)?;
        let base = if status.capped {
            now
        } else {
            status.capped_at.absolute
        };
        self.capped_at.insert(key, base + cd_time);
        Ok(())
    }

    /// Enforcement followed by registration, for standalone use. The `delay`
    /// policy degrades to proceeding: only the processor can move the clock.
    pub fn use_ability(
        &mut self,
        ability: &Ability,
        now: f64,
        cd_time_override: Option<f64>,
    ) -> Result<(), SimError> {
        if ability.cooldown.is_none() {
            return Ok(());
        }
        self.register(ability);
        self.enforce(ability, now)?;
        self.register_use(ability, now, cd_time_override)
    }

    /// Readiness of `ability` at `when`.
    pub fn can_use(&self, ability: &Ability, when: f64) -> Result<bool, SimError> {
        Ok(self.status_of_at(ability, when)?.ready_to_use)
    }

    /// Full cooldown status of `ability` at `now`.
    pub fn status_of_at(&self, ability: &Ability, now: f64) -> Result<CooldownStatus, SimError> {
        let (key, descriptor) = self.canonical(ability)?;
        let max_charges = descriptor.charges.max(1);
        let cd_time = descriptor.duration;

        let capped_at = self.capped_at.get(&key).copied();
        let capped_at = match capped_at {
            Some(t) if t > now => t,
            // Untracked or elapsed: fully capped.
            _ => {
                return Ok(CooldownStatus {
                    ready_to_use: true,
                    ready_at: CooldownTimes {
                        absolute: now,
                        relative: 0.0,
                    },
                    capped: true,
                    capped_at: CooldownTimes {
                        absolute: now,
                        relative: 0.0,
                    },
                    current_charges: max_charges,
                });
            }
        };

        let time_until_cap = capped_at - now;

        if cd_time <= 0.0 {
            tracing::warn!(ability = %ability.name, "non-positive cooldown duration");
            return Ok(CooldownStatus {
                ready_to_use: true,
                ready_at: CooldownTimes {
                    absolute: now,
                    relative: 0.0,
                },
                capped: true,
                capped_at: CooldownTimes {
                    absolute: now,
                    relative: 0.0,
                },
                current_charges: max_charges,
            });
        }

        if max_charges == 1 {
            // Simplified single-charge form: ready iff capped.
            return Ok(CooldownStatus {
                ready_to_use: false,
                ready_at: CooldownTimes {
                    absolute: capped_at,
                    relative: time_until_cap,
                },
                capped: false,
                capped_at: CooldownTimes {
                    absolute: capped_at,
                    relative: time_until_cap,
                },
                current_charges: 0,
            });
        }

        // Walk increments of the cooldown duration up to the cap: each full
        // increment still outstanding is one missing charge.
        let mut missing = 0u32;
        let mut walked = 0.0;
        while walked < time_until_cap {
            missing += 1;
            walked += cd_time;
        }
        let current_charges = max_charges.saturating_sub(missing);
        let ready_to_use = current_charges >= 1;

        let ready_at = if ready_to_use {
            CooldownTimes {
                absolute: now,
                relative: 0.0,
            }
        } else {
            let mut remainder = time_until_cap % cd_time;
            if remainder == 0.0 {
                remainder = cd_time;
            }
            CooldownTimes {
                absolute: now + remainder,
                relative: remainder,
            }
        };

        Ok(CooldownStatus {
            ready_to_use,
            ready_at,
            capped: false,
            capped_at: CooldownTimes {
                absolute: capped_at,
                relative: time_until_cap,
            },
            current_charges,
        })
    }

    /// Shift the stored capped-at of `ability` by `delta` (negative
    /// shortens the remaining cooldown). No-op when untracked.
    pub fn modify_cooldown(&mut self, ability: &Ability, delta: f64) -> Result<(), SimError> {
        let (key, _) = self.canonical(ability)?;
        if let Some(capped_at) = self.capped_at.get_mut(&key) {
            *capped_at += delta;
        }
        Ok(())
    }

    /// Shift every tracked capped-at by `delta`, for whole-timeline
    /// renormalization.
    pub fn time_shift(&mut self, delta: f64) {
        for capped_at in self.capped_at.values_mut() {
            *capped_at += delta;
        }
    }

    /// Resolve the canonical cooldown key for `ability`, following shared-
    /// cooldown references through the descriptor registry. The chain is
    /// cycle-checked and bounded; a reference to an ability the tracker has
    /// never seen terminates the chain at that id.
    fn canonical(
        &self,
        ability: &Ability,
    ) -> Result<(CooldownKey, CooldownDescriptor), SimError> {
        let descriptor = ability
            .cooldown
            .clone()
            .unwrap_or_else(|| CooldownDescriptor::simple(0.0));

        let mut key = CooldownKey::of(ability);
        let mut descriptor = descriptor;
        let mut visited: HashSet<CooldownKey> = HashSet::new();
        visited.insert(key.clone());

        let mut hops = 0;
        while let Some(target) = descriptor.shares_cooldown_with {
            hops += 1;
            if hops > MAX_COOLDOWN_SHARE_HOPS {
                return Err(SimError::CooldownShareTooDeep {
                    id: ability.id.unwrap_or(0),
                });
            }
            let target_key = CooldownKey::Id(target);
            if !visited.insert(target_key.clone()) {
                return Err(SimError::CircularCooldownShare { id: target });
            }
            key = target_key;
            match self.descriptors.get(&key) {
                Some(owner) => descriptor = owner.clone(),
                None => {
                    // Unknown owner: keep the inherited descriptor for the
                    // charge math, the id is still the canonical key.
                    descriptor.shares_cooldown_with = None;
                }
            }
        }

        Ok((key, descriptor))
    }
}
