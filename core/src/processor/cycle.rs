//! Cycle-scoped view of the processor
//!
//! A [`CycleContext`] is handed to cycle bodies by `one_cycle` /
//! `remaining_cycles`. It delegates the use-family operations and adds
//! cycle-relative time helpers, reading the (possibly retimed) cycle start
//! from the open `CycleInfo` so pre-pull renormalization mid-cycle stays
//! consistent.

use crate::ability::Ability;
use crate::buffs::Buff;
use crate::error::SimError;

use super::processor::{AbilityUseResult, CycleProcessor};

/// Mutable view of the processor scoped to the currently open cycle.
pub struct CycleContext<'a> {
    processor: &'a mut CycleProcessor,
    effective_length: f64,
}

impl<'a> CycleContext<'a> {
    pub(super) fn new(processor: &'a mut CycleProcessor, effective_length: f64) -> Self {
        Self {
            processor,
            effective_length,
        }
    }

    /// Absolute start time of this cycle.
    pub fn cycle_start(&self) -> f64 {
        self.processor
            .open_cycle
            .as_ref()
            .expect("context exists only while a cycle is open")
            .start
    }

    /// Effective length of this cycle under the alignment policy.
    pub fn effective_length(&self) -> f64 {
        self.effective_length
    }

    /// Seconds left in this cycle.
    pub fn remaining_cycle_time(&self) -> f64 {
        (self.cycle_start() + self.effective_length - self.processor.current_time()).max(0.0)
    }

    /// Escape hatch to the full processor API.
    pub fn processor(&mut self) -> &mut CycleProcessor {
        self.processor
    }

    pub fn current_time(&self) -> f64 {
        self.processor.current_time()
    }

    pub fn use_ability(&mut self, ability: &Ability) -> Result<AbilityUseResult, SimError> {
        self.processor.use_ability(ability)
    }

    pub fn use_gcd(&mut self, ability: &Ability) -> Result<AbilityUseResult, SimError> {
        self.processor.use_gcd(ability)
    }

    pub fn use_ogcd(&mut self, ability: &Ability) -> Result<AbilityUseResult, SimError> {
        self.processor.use_ogcd(ability)
    }

    /// Advance to a cycle-relative instant, autos firing.
    pub fn use_until_relative(&mut self, offset: f64) -> Result<(), SimError> {
        let target = self.cycle_start() + offset;
        self.processor.use_until(target)
    }

    /// Advance to the end of this cycle's effective length.
    pub fn use_until_end(&mut self) -> Result<(), SimError> {
        self.use_until_relative(self.effective_length)
    }

    pub fn activate_buff(&mut self, buff: &Buff) {
        self.processor.activate_buff(buff);
    }

    pub fn remove_buff(&mut self, buff: &Buff) {
        self.processor.remove_buff(buff);
    }
}
