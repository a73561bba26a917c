//! The cycle processor state machine
//!
//! One instance owns all mutable state for one simulated encounter: the
//! clock, the record list, the cooldown tracker, the combo trackers, the
//! buff timeline, and the DoT overlap map. Instances are single-owner and
//! single-pass; a fresh instance per run is the engine's substitute for
//! thread safety.

use hashbrown::HashMap;

use cadence_types::{AttackCategory, CutoffMode, CycleLengthMode, SimulationSettings};

use crate::ability::{Ability, AbilityKind};
use crate::buffs::{Buff, BuffTimeline, combine_effects};
use crate::combo::ComboTracker;
use crate::cooldowns::CooldownTracker;
use crate::error::SimError;
use crate::formula::DamageModel;
use crate::records::{CycleInfo, DotApplication, SimRecord, SimulationResult, UsedAbility};

use super::cycle::CycleContext;

/// How long before cast completion a spell snapshots, in seconds.
pub const CAST_SNAPSHOT_PRE: f64 = 0.5;
/// Snapshot-to-application delay when the ability declares none.
pub const STANDARD_APPLICATION_DELAY: f64 = 0.6;
/// Animation lock when the ability declares none.
pub const STANDARD_ANIMATION_LOCK: f64 = 0.6;
/// Extra lock after a cast completes.
pub const CASTER_TAX: f64 = 0.1;
/// DoT ticks land on this grid, measured from each application instant.
pub const DOT_TICK_INTERVAL: f64 = 3.0;

/// Classification of one `use` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbilityUseResult {
    /// Used and fully inside the fight.
    Full,
    /// Used, but straddling the fight boundary; carries the before-boundary
    /// fraction.
    Partial(f64),
    /// Not used (out of time or dropped by the cutoff policy).
    None,
}

/// Deterministic discrete-event timeline driver for one encounter.
pub struct CycleProcessor {
    settings: SimulationSettings,
    model: Box<dyn DamageModel>,

    current_time: f64,
    next_gcd_time: f64,
    next_auto_time: f64,
    combat_started: bool,
    /// Set by the first damaging record, consumed at the end of that use.
    pending_prepull_shift: Option<f64>,
    /// Start time of the first GCD rejected under strict-gcd.
    hard_cutoff_gcd_time: Option<f64>,

    records: Vec<SimRecord>,
    cycles: Vec<CycleInfo>,
    pub(super) open_cycle: Option<CycleInfo>,
    first_cycle_start: Option<f64>,

    cooldowns: CooldownTracker,
    combos: ComboTracker,
    buffs: BuffTimeline,
    /// DoT definition id -> record index of its most recent application.
    dot_index: HashMap<u32, usize>,

    auto_ability: Ability,
}

impl CycleProcessor {
    pub fn new(settings: SimulationSettings, model: Box<dyn DamageModel>) -> Self {
        let auto_ability = Ability {
            name: "Auto Attack".to_string(),
            kind: AbilityKind::AutoAttack,
            category: AttackCategory::AutoAttack,
            potency: Some(settings.auto_attack_potency),
            ..Default::default()
        };
        let cooldowns = CooldownTracker::new(settings.cooldown_mode);
        Self {
            settings,
            model,
            current_time: 0.0,
            next_gcd_time: 0.0,
            next_auto_time: 0.0,
            combat_started: false,
            pending_prepull_shift: None,
            hard_cutoff_gcd_time: None,
            records: Vec::new(),
            cycles: Vec::new(),
            open_cycle: None,
            first_cycle_start: None,
            cooldowns,
            combos: ComboTracker::new(),
            buffs: BuffTimeline::new(),
            dot_index: HashMap::new(),
            auto_ability,
        }
    }

    /// Register the automatically-recurring party buffs for this run.
    pub fn with_party_buffs(mut self, buffs: Vec<Buff>) -> Self {
        self.buffs.register_party_buffs(buffs);
        self
    }

    // ─── Probes ─────────────────────────────────────────────────────────────

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn next_gcd_time(&self) -> f64 {
        self.next_gcd_time
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn records(&self) -> &[SimRecord] {
        &self.records
    }

    pub fn cycles(&self) -> &[CycleInfo] {
        &self.cycles
    }

    /// Seconds left before the nominal fight end.
    pub fn remaining_time(&self) -> f64 {
        (self.settings.total_time - self.current_time).max(0.0)
    }

    /// Seconds of GCD-startable time left; the caller-visible terminal
    /// condition.
    pub fn remaining_gcd_time(&self) -> f64 {
        (self.gcd_gate_end() - self.next_gcd_time).max(0.0)
    }

    /// Whole nominal cycles that still fit in the remaining GCD time.
    pub fn remaining_cycle_count(&self) -> u32 {
        if self.settings.cycle_time <= 0.0 {
            return 0;
        }
        (self.remaining_gcd_time() / self.settings.cycle_time).floor() as u32
    }

    /// Cooldown status of `ability` at the current time.
    pub fn cooldown_status(
        &self,
        ability: &Ability,
    ) -> Result<crate::cooldowns::CooldownStatus, SimError> {
        self.cooldowns.status_of_at(ability, self.current_time)
    }

    /// Readiness of `ability` at the time it would actually execute.
    pub fn can_use(&self, ability: &Ability) -> Result<bool, SimError> {
        self.cooldowns.can_use(ability, self.execution_time(ability))
    }

    /// Shift a stored cooldown by `delta` (negative shortens it).
    pub fn modify_cooldown(&mut self, ability: &Ability, delta: f64) -> Result<(), SimError> {
        self.cooldowns.modify_cooldown(ability, delta)
    }

    /// Buffs active right now.
    pub fn active_buffs(&mut self) -> Vec<Buff> {
        let now = self.current_time;
        self.buffs.active_at(now)
    }

    // ─── Buff activation ────────────────────────────────────────────────────

    pub fn activate_buff(&mut self, buff: &Buff) {
        let now = self.current_time;
        self.buffs.activate(buff, now);
    }

    pub fn activate_buff_with_delay(&mut self, buff: &Buff, delay: f64) {
        let start = self.current_time + delay;
        self.buffs.activate(buff, start);
    }

    /// Explicitly end a buff early.
    pub fn remove_buff(&mut self, buff: &Buff) {
        let now = self.current_time;
        self.buffs.remove(buff, now);
    }

    // ─── Record annotations ─────────────────────────────────────────────────

    /// Append a textual marker at the current time.
    pub fn add_special(&mut self, label: &str) {
        self.records.push(SimRecord::Marker {
            time: self.current_time,
            label: label.to_string(),
        });
    }

    /// Attach per-job gauge data to the most recent ability record.
    pub fn attach_gauge(&mut self, gauge: HashMap<String, f64>) {
        if let Some(SimRecord::Ability(used)) = self
            .records
            .iter_mut()
            .rev()
            .find(|r| matches!(r, SimRecord::Ability(_)))
        {
            used.gauge = Some(gauge);
        }
    }

    // ─── Clock ──────────────────────────────────────────────────────────────

    /// Advance the clock monotonically. While in steady combat, any
    /// auto-attack due before `target` fires during the advance unless
    /// paused, in which case its due time is pushed back by the same delta
    /// so casts neither suppress nor duplicate auto-attacks.
    pub fn advance_to(&mut self, target: f64, pause_autos: bool) -> Result<(), SimError> {
        if target < self.current_time {
            return Err(SimError::TimeRewindAttempted {
                now: self.current_time,
                target,
            });
        }
        let delta = target - self.current_time;
        if self.combat_started && self.settings.use_autos {
            if pause_autos {
                self.next_auto_time += delta;
            } else {
                while self.next_auto_time <= target {
                    let fire_at = self.next_auto_time;
                    let delay = self.record_auto_attack(fire_at);
                    if delay <= 0.0 {
                        tracing::warn!("non-positive auto-attack delay, disabling autos");
                        self.next_auto_time = f64::INFINITY;
                        break;
                    }
                    self.next_auto_time = fire_at + delay;
                }
            }
        }
        self.current_time = target;
        Ok(())
    }

    /// Advance to `t` (capped at the nominal fight end), autos firing.
    pub fn use_until(&mut self, t: f64) -> Result<(), SimError> {
        let target = t.min(self.settings.total_time).max(self.current_time);
        self.advance_to(target, false)
    }

    // ─── Ability use ────────────────────────────────────────────────────────

    /// Use `ability`, expected to be a GCD.
    pub fn use_gcd(&mut self, ability: &Ability) -> Result<AbilityUseResult, SimError> {
        if !ability.is_gcd() {
            tracing::warn!(ability = %ability.name, "use_gcd called with a non-GCD ability");
        }
        self.use_ability(ability)
    }

    /// Use `ability`, expected to be an oGCD.
    pub fn use_ogcd(&mut self, ability: &Ability) -> Result<AbilityUseResult, SimError> {
        if ability.is_gcd() {
            tracing::warn!(ability = %ability.name, "use_ogcd called with a GCD ability");
        }
        self.use_ability(ability)
    }

    /// Repeatedly use `ability` while `condition` holds and time remains.
    pub fn use_while(
        &mut self,
        ability: &Ability,
        mut condition: impl FnMut(&CycleProcessor) -> bool,
    ) -> Result<(), SimError> {
        loop {
            if !condition(self) {
                return Ok(());
            }
            let before_time = self.current_time;
            let before_len = self.records.len();
            if matches!(self.use_ability(ability)?, AbilityUseResult::None) {
                return Ok(());
            }
            if self.current_time <= before_time && self.records.len() == before_len {
                tracing::warn!(ability = %ability.name, "use_while made no progress, stopping");
                return Ok(());
            }
        }
    }

    /// The core transition: drive one ability use end-to-end.
    pub fn use_ability(&mut self, ability: &Ability) -> Result<AbilityUseResult, SimError> {
        // 1. Combo resolution; the only pre-use override point.
        let mut ability = self.combos.resolve(ability);

        if matches!(ability.kind, AbilityKind::AutoAttack) {
            tracing::warn!(ability = %ability.name, "auto-attacks fire from the timeline, not use()");
            return Ok(AbilityUseResult::None);
        }
        let is_gcd = ability.is_gcd();

        // 2. Remaining-time gate (and the strict-gcd drop check).
        if is_gcd {
            if self.remaining_gcd_time() <= 0.0 {
                return Ok(AbilityUseResult::None);
            }
            if self.settings.cutoff_mode == CutoffMode::StrictGcd
                && self.strict_gcd_rejected(&ability)
            {
                return Ok(AbilityUseResult::None);
            }
        } else if self.current_time >= self.ogcd_gate_end() {
            return Ok(AbilityUseResult::None);
        }

        // 3. Cooldown readiness at the time the ability will execute;
        //    the delay policy advances the clock to the ready time here.
        if ability.cooldown.is_some() {
            self.cooldowns.register(&ability);
            let exec_time = self.execution_time(&ability);
            if let Some(ready_at) = self.cooldowns.enforce(&ability, exec_time)? {
                self.advance_to(ready_at, false)?;
            }
        }

        // 4. Advance to the GCD boundary; due auto-attacks fire.
        let exec_time = self.execution_time(&ability);
        if exec_time > self.current_time {
            self.advance_to(exec_time, false)?;
        }
        let mut used_at = self.current_time;

        // 5. Cast-start buff evaluation: the haste-relevant point.
        let start_buffs = self.buffs_applying_at(used_at, &ability);
        ability = self
            .buffs
            .fold_before_cast(used_at, &start_buffs, ability);
        let haste_sources: Vec<f64> =
            start_buffs.iter().filter_map(|b| b.effects.haste).collect();
        let haste = self.model.combine_haste(&haste_sources);

        // 6. Effective GCD/cast lengths from the speed formula.
        let gcd_length = if is_gcd {
            if ability.fixed_gcd {
                ability.gcd_recast
            } else {
                self.model
                    .effective_seconds(ability.gcd_recast, ability.speed_basis, haste)
            }
        } else {
            0.0
        };
        let cast_time = match ability.cast_time {
            Some(base) if !ability.fixed_gcd => {
                self.model
                    .effective_seconds(base, ability.speed_basis, haste)
            }
            Some(base) => base,
            None => 0.0,
        };

        // 7. Register the cooldown usage, haste-adjusted when the
        //    descriptor scales with speed.
        if let Some(cd) = &ability.cooldown {
            let cd_override = cd
                .speed_basis
                .is_scaled()
                .then(|| self.model.effective_seconds(cd.duration, cd.speed_basis, haste));
            self.cooldowns.register_use(&ability, used_at, cd_override)?;
        }

        // 8-9. Advance to the snapshot instant (autos pause mid-cast) and
        //      evaluate the snapshot buff set.
        let snapshot_delay = (cast_time - CAST_SNAPSHOT_PRE).max(0.0);
        self.advance_to(used_at + snapshot_delay, true)?;
        let snapshot_time = self.current_time;
        let snap_buffs = self.buffs_applying_at(snapshot_time, &ability);
        ability = self
            .buffs
            .fold_before_snapshot(snapshot_time, &snap_buffs, ability);

        let combined = combine_effects(&start_buffs, &snap_buffs, self.model.as_ref());

        // 10. Damage formula plus post-damage hooks.
        let mut direct = ability
            .potency
            .map(|p| self.model.expected_damage(p, ability.category, &combined));
        if let Some(damage) = direct {
            direct = Some(
                self.buffs
                    .fold_modify_damage(snapshot_time, &snap_buffs, damage),
            );
        }
        let dot = ability.dot.as_ref().map(|d| DotApplication {
            id: d.id,
            full_duration_ticks: (d.duration / DOT_TICK_INTERVAL).floor() as u32,
            per_tick: self
                .model
                .expected_damage(d.tick_potency, ability.category, &combined),
            tick_count: None,
        });

        // 11. Application instant relative to cast start.
        let app_delay = ability
            .application_delay
            .unwrap_or(STANDARD_APPLICATION_DELAY);
        let app_delay_from_start = snapshot_delay + app_delay;

        // 12. Emit the record and update DoT overlap bookkeeping.
        let lock = ability.animation_lock.unwrap_or(STANDARD_ANIMATION_LOCK);
        let lock_time = if ability.cast_time.is_some() {
            (cast_time + CASTER_TAX).max(lock)
        } else {
            lock
        };
        let total_time_taken = match self.settings.cutoff_mode {
            CutoffMode::ProrateApplication => app_delay_from_start,
            _ => {
                if is_gcd {
                    gcd_length
                } else {
                    lock_time
                }
            }
        };

        let buffs_for_record = record_buff_set(&start_buffs, &snap_buffs);
        let first_damaging = !self.combat_started && ability.is_damaging();

        let record = UsedAbility {
            ability: ability.clone(),
            used_at,
            buffs: buffs_for_record,
            combined,
            direct,
            dot,
            cast_time,
            snapshot_from_start: snapshot_delay,
            app_delay_from_start,
            lock_time,
            total_time_taken,
            partial_rate: None,
            gauge: None,
        };
        if let Some(dot) = &record.dot {
            self.finalize_overwritten_dot(dot.id, used_at + app_delay_from_start);
            self.dot_index.insert(dot.id, self.records.len());
        }
        self.records.push(SimRecord::Ability(Box::new(record)));

        if first_damaging {
            // The first damaging application defines the pull instant.
            self.pending_prepull_shift = Some(-(used_at + app_delay_from_start));
        }

        // 13. Schedule activated buffs, delayed into the remaining lock.
        let lock_end = used_at + lock_time;
        let buff_delay = app_delay
            .min((lock_end - self.current_time).max(0.0))
            .max(0.0);
        for buff in ability.activates.clone() {
            let start = self.current_time + buff_delay;
            self.buffs.activate(&buff, start);
        }

        // 14. Advance to the end of the effective animation lock.
        self.advance_to(lock_end.max(self.current_time), false)?;
        if is_gcd {
            self.next_gcd_time = (used_at + gcd_length).max(lock_end);
        } else {
            // This is how oGCD weaving clips into the next GCD window.
            self.next_gcd_time = self.next_gcd_time.max(lock_end);
        }

        // 15. Pre-pull retiming, exactly once.
        if let Some(shift) = self.pending_prepull_shift.take() {
            self.apply_prepull_shift(shift);
            used_at += shift;
        }

        // 16. Classification.
        Ok(self.classify_use(used_at, total_time_taken))
    }

    /// Run one cycle: start/end markers, effective-length computation per
    /// the alignment policy, and a `CycleInfo` entry.
    pub fn one_cycle(&mut self, mut body: impl FnMut(&mut CycleContext<'_>)) {
        let start = self.current_time;
        let index = self.cycles.len();
        if self.first_cycle_start.is_none() {
            self.first_cycle_start = Some(start);
        }
        self.records.push(SimRecord::Marker {
            time: start,
            label: "-- Start of Cycle --".to_string(),
        });
        let effective_length = self.effective_cycle_length(index, start);
        self.open_cycle = Some(CycleInfo {
            index,
            start,
            end: start,
        });

        let mut ctx = CycleContext::new(self, effective_length);
        body(&mut ctx);

        self.records.push(SimRecord::Marker {
            time: self.current_time,
            label: "-- End of Cycle --".to_string(),
        });
        let mut info = self.open_cycle.take().expect("cycle is open");
        info.end = self.current_time;
        self.cycles.push(info);
    }

    /// Run cycles until no GCD time remains.
    pub fn remaining_cycles(&mut self, mut body: impl FnMut(&mut CycleContext<'_>)) {
        while self.remaining_gcd_time() > 0.0 {
            let before_time = self.current_time;
            let before_len = self.records.len();
            self.one_cycle(&mut body);
            // Markers alone mean the body did nothing; bail out rather
            // than spin.
            if self.current_time <= before_time && self.records.len() == before_len + 2 {
                tracing::warn!("cycle body made no progress, stopping");
                break;
            }
        }
    }

    /// Finalize the run: fix outstanding DoT tick counts, apply fight-end
    /// proration, and aggregate the damage total.
    pub fn finalize(mut self) -> SimulationResult {
        let total_time = self.settings.total_time;
        let finalized_time_basis = match self.settings.cutoff_mode {
            CutoffMode::ProrateGcd | CutoffMode::ProrateApplication => total_time,
            CutoffMode::LaxGcd => total_time.max(self.next_gcd_time),
            CutoffMode::StrictGcd => self.hard_cutoff_gcd_time.unwrap_or(total_time),
        };

        // Still-active DoTs truncate at the earlier of now and fight end.
        let dot_end = self.current_time.min(total_time);
        let outstanding: Vec<usize> = self.dot_index.values().copied().collect();
        for index in outstanding {
            if let SimRecord::Ability(used) = &mut self.records[index]
                && let Some(dot) = &mut used.dot
                && dot.tick_count.is_none()
            {
                let applied_at = used.used_at + used.app_delay_from_start;
                let elapsed = ((dot_end - applied_at) / DOT_TICK_INTERVAL).floor().max(0.0) as u32;
                dot.tick_count = Some(elapsed.min(dot.full_duration_ticks));
            }
        }

        if matches!(
            self.settings.cutoff_mode,
            CutoffMode::ProrateGcd | CutoffMode::ProrateApplication
        ) {
            for record in &mut self.records {
                let SimRecord::Ability(used) = record else {
                    continue;
                };
                if used.used_at >= total_time {
                    used.partial_rate = Some(0.0);
                } else if used.total_time_taken > 0.0
                    && used.used_at + used.total_time_taken > total_time
                {
                    let rate = (total_time - used.used_at) / used.total_time_taken;
                    used.partial_rate = Some(rate.clamp(0.0, 1.0));
                }
            }
        }

        let mut expected = 0.0;
        let mut variance = 0.0;
        for record in &self.records {
            let Some(used) = record.as_ability() else {
                continue;
            };
            let rate = used.partial_rate.unwrap_or(1.0);
            if let Some(direct) = used.direct {
                expected += direct.expected * rate;
                variance += (direct.std_dev * rate).powi(2);
            }
            if let Some(dot) = &used.dot {
                let ticks = dot.tick_count.unwrap_or(0) as f64;
                expected += ticks * dot.per_tick.expected;
                variance += ticks * dot.per_tick.std_dev.powi(2);
            }
        }
        let dps = if finalized_time_basis > 0.0 {
            expected / finalized_time_basis
        } else {
            0.0
        };

        SimulationResult {
            records: self.records,
            cycles: self.cycles,
            finalized_time_basis,
            buff_history: self.buffs.into_history(),
            total_damage: crate::formula::DamageResult {
                expected,
                std_dev: variance.max(0.0).sqrt(),
            },
            dps,
        }
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn effective_cycle_length(&self, index: usize, start: f64) -> f64 {
        let cycle_time = self.settings.cycle_time;
        match self.settings.cycle_length_mode {
            CycleLengthMode::FullDuration => cycle_time,
            CycleLengthMode::AlignAbsolute => cycle_time - (start - index as f64 * cycle_time),
            CycleLengthMode::AlignToFirst => {
                let base = self.first_cycle_start.unwrap_or(start);
                cycle_time - ((start - base) - index as f64 * cycle_time)
            }
        }
    }

    fn execution_time(&self, ability: &Ability) -> f64 {
        if ability.is_gcd() {
            self.next_gcd_time.max(self.current_time)
        } else {
            self.current_time
        }
    }

    fn gcd_gate_end(&self) -> f64 {
        match self.settings.cutoff_mode {
            CutoffMode::StrictGcd => self
                .hard_cutoff_gcd_time
                .unwrap_or(self.settings.total_time),
            _ => self.settings.total_time,
        }
    }

    fn ogcd_gate_end(&self) -> f64 {
        match self.settings.cutoff_mode {
            CutoffMode::StrictGcd => self
                .hard_cutoff_gcd_time
                .unwrap_or(self.settings.total_time),
            CutoffMode::LaxGcd => self.settings.total_time.max(self.next_gcd_time),
            _ => self.settings.total_time,
        }
    }

    /// Strict-gcd drop check: a GCD whose recast window (or cast, if
    /// longer) would not complete before the nominal boundary is rejected,
    /// and its would-be start becomes the hard boundary for everything
    /// after it. Haste is probed at the would-be start without moving the
    /// clock.
    fn strict_gcd_rejected(&mut self, ability: &Ability) -> bool {
        let start = self.next_gcd_time.max(self.current_time);
        let probe_buffs = self.buffs_applying_at(start, ability);
        let haste_sources: Vec<f64> =
            probe_buffs.iter().filter_map(|b| b.effects.haste).collect();
        let haste = self.model.combine_haste(&haste_sources);

        let recast = if ability.fixed_gcd {
            ability.gcd_recast
        } else {
            self.model
                .effective_seconds(ability.gcd_recast, ability.speed_basis, haste)
        };
        let cast = match ability.cast_time {
            Some(base) if !ability.fixed_gcd => {
                self.model
                    .effective_seconds(base, ability.speed_basis, haste)
            }
            Some(base) => base,
            None => 0.0,
        };

        if start + recast.max(cast) > self.settings.total_time {
            if self.hard_cutoff_gcd_time.is_none() {
                self.hard_cutoff_gcd_time = Some(start);
            }
            true
        } else {
            false
        }
    }

    fn classify_use(&self, used_at: f64, total_time_taken: f64) -> AbilityUseResult {
        match self.settings.cutoff_mode {
            CutoffMode::ProrateGcd | CutoffMode::ProrateApplication => {
                let total = self.settings.total_time;
                if total_time_taken > 0.0 && used_at + total_time_taken > total {
                    let rate = ((total - used_at) / total_time_taken).clamp(0.0, 1.0);
                    AbilityUseResult::Partial(rate)
                } else {
                    AbilityUseResult::Full
                }
            }
            _ => AbilityUseResult::Full,
        }
    }

    fn buffs_applying_at(&mut self, t: f64, ability: &Ability) -> Vec<Buff> {
        self.buffs
            .active_at(t)
            .into_iter()
            .filter(|b| b.applies_to(ability))
            .collect()
    }

    /// Fix the previous application of `dot_id` when it is overwritten:
    /// ticks actually delivered are those whose 3-second boundaries (from
    /// the previous application instant) elapsed before the new one.
    fn finalize_overwritten_dot(&mut self, dot_id: u32, new_application: f64) {
        let Some(&index) = self.dot_index.get(&dot_id) else {
            return;
        };
        if let SimRecord::Ability(previous) = &mut self.records[index]
            && let Some(dot) = &mut previous.dot
            && dot.tick_count.is_none()
        {
            let applied_at = previous.used_at + previous.app_delay_from_start;
            let elapsed = ((new_application - applied_at) / DOT_TICK_INTERVAL)
                .floor()
                .max(0.0) as u32;
            dot.tick_count = Some(elapsed.min(dot.full_duration_ticks));
        }
    }

    /// Record one auto-attack at `fire_at`; returns the next swing delay,
    /// haste-adjusted at fire time.
    fn record_auto_attack(&mut self, fire_at: f64) -> f64 {
        let ability = self.auto_ability.clone();
        let active = self.buffs_applying_at(fire_at, &ability);
        let combined = combine_effects(&active, &active, self.model.as_ref());
        let direct = self.model.expected_damage(
            self.settings.auto_attack_potency,
            AttackCategory::AutoAttack,
            &combined,
        );

        self.records.push(SimRecord::Ability(Box::new(UsedAbility {
            ability,
            used_at: fire_at,
            buffs: active,
            combined,
            direct: Some(direct),
            dot: None,
            cast_time: 0.0,
            snapshot_from_start: 0.0,
            app_delay_from_start: STANDARD_APPLICATION_DELAY,
            lock_time: 0.0,
            total_time_taken: STANDARD_APPLICATION_DELAY,
            partial_rate: None,
            gauge: None,
        })));

        self.model
            .auto_attack_delay(self.settings.auto_attack_delay, combined.haste)
    }

    /// Renormalize the entire timeline so the first damaging application
    /// lands at time zero, then open combat: auto-attacks begin and
    /// scheduled party buffs get their pull-relative windows.
    fn apply_prepull_shift(&mut self, shift: f64) {
        for record in &mut self.records {
            match record {
                SimRecord::Ability(used) => used.used_at += shift,
                SimRecord::Marker { time, .. } => *time += shift,
            }
        }
        self.current_time += shift;
        self.next_gcd_time += shift;
        self.cooldowns.time_shift(shift);
        self.buffs.time_shift(shift);
        if let Some(cycle) = &mut self.open_cycle {
            cycle.start += shift;
            cycle.end += shift;
        }
        for cycle in &mut self.cycles {
            cycle.start += shift;
            cycle.end += shift;
        }
        if let Some(first) = &mut self.first_cycle_start {
            *first += shift;
        }

        self.combat_started = true;
        self.next_auto_time = self.current_time.max(0.0);
        self.buffs.schedule_at_pull();
    }
}

/// Union of start-relevant buffs from the cast-start set and
/// snapshot-relevant buffs from the snapshot set, deduplicated in
/// first-seen order.
fn record_buff_set(start: &[Buff], snapshot: &[Buff]) -> Vec<Buff> {
    let mut out: Vec<Buff> = Vec::new();
    for buff in start.iter().filter(|b| b.relevant_at_start()) {
        if !out.iter().any(|b| b.same_buff(buff)) {
            out.push(buff.clone());
        }
    }
    for buff in snapshot.iter().filter(|b| b.relevant_at_snapshot()) {
        if !out.iter().any(|b| b.same_buff(buff)) {
            out.push(buff.clone());
        }
    }
    out
}
