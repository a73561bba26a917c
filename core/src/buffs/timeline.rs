//! Buff activation timeline
//!
//! A buff becomes active via an explicit [`BuffUsage`] window pushed onto an
//! append-only history list. Queries at time T return buffs whose
//! `[start, end)` window contains T and which have not been force-ended.
//!
//! Automatically-recurring party buffs (cooldown + scheduled start, not
//! manually driven) are re-windowed lazily: on every query, an elapsed window
//! is given a successor starting `cooldown` after its previous start. This is
//! pull-based recurrence, not a push-based scheduled event.

use crate::buffs::{Buff, BuffHooks};
use crate::ability::Ability;
use crate::formula::DamageResult;

/// One activation window of a buff.
#[derive(Debug, Clone)]
pub struct BuffUsage {
    pub buff: Buff,
    pub start: f64,
    /// Exclusive window end. Infinite for indefinite buffs.
    pub end: f64,
    /// Set when the window was ended early by an explicit removal.
    pub force_end: bool,
    /// Live stack count, when the buff stacks.
    pub stacks: Option<u32>,
}

impl BuffUsage {
    /// Half-open window membership.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Append-only buff activation history plus the recurring party-buff roster.
#[derive(Debug, Default)]
pub struct BuffTimeline {
    usages: Vec<BuffUsage>,
    recurring: Vec<Buff>,
}

impl BuffTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the party buffs that recur automatically. Buffs without a
    /// party schedule are ignored.
    pub fn register_party_buffs(&mut self, buffs: Vec<Buff>) {
        for buff in buffs {
            if buff.party.is_some() {
                self.recurring.push(buff);
            } else {
                tracing::warn!(buff = %buff.name, "ignoring non-party buff in party roster");
            }
        }
    }

    /// Open an activation window at `start`. An overlapping window of the
    /// same buff is truncated at the new start rather than left to double up.
    pub fn activate(&mut self, buff: &Buff, start: f64) {
        let end = start + buff.duration.unwrap_or(f64::INFINITY);
        debug_assert!(end > start, "buff window must have positive length");

        if let Some(existing) = self.active_usage_mut(buff, start) {
            existing.end = start;
        }
        self.usages.push(BuffUsage {
            buff: buff.clone(),
            start,
            end,
            force_end: false,
            stacks: buff.stacks,
        });
    }

    /// End the active window of `buff` at `t` and mark it force-ended.
    /// No-op when the buff is not active.
    pub fn remove(&mut self, buff: &Buff, t: f64) {
        if let Some(usage) = self.active_usage_mut(buff, t) {
            usage.end = t;
            usage.force_end = true;
        }
    }

    /// Adjust the stack count of the active window of `buff`. Stacks
    /// reaching zero force-end the window.
    pub fn adjust_stacks(&mut self, buff: &Buff, t: f64, delta: i64) {
        if let Some(usage) = self.active_usage_mut(buff, t) {
            let current = usage.stacks.or(usage.buff.stacks).unwrap_or(1) as i64;
            let next = (current + delta).max(0) as u32;
            usage.stacks = Some(next);
            if next == 0 {
                usage.end = t;
                usage.force_end = true;
            }
        }
    }

    /// Stack count of the active window of `buff` at `t`.
    pub fn stacks_of(&self, buff: &Buff, t: f64) -> Option<u32> {
        self.usages
            .iter()
            .rev()
            .find(|u| u.buff.same_buff(buff) && u.contains(t))
            .and_then(|u| u.stacks.or(u.buff.stacks))
    }

    /// All buffs active at `t`, in activation order.
    pub fn active_at(&mut self, t: f64) -> Vec<Buff> {
        self.recheck_recurring(t);
        self.usages
            .iter()
            .filter(|u| u.contains(t))
            .map(|u| u.buff.clone())
            .collect()
    }

    /// Open the first windows of scheduled party buffs. Called once when the
    /// pull instant is fixed; buffs already activated manually keep their
    /// (shifted) windows.
    pub fn schedule_at_pull(&mut self) {
        let scheduled: Vec<Buff> = self
            .recurring
            .iter()
            .filter(|b| {
                b.party.and_then(|p| p.start_time).is_some()
                    && !self.usages.iter().any(|u| u.buff.same_buff(b))
            })
            .cloned()
            .collect();
        for buff in scheduled {
            let start = buff.party.and_then(|p| p.start_time).unwrap_or(0.0);
            self.activate(&buff, start);
        }
    }

    /// Shift every recorded window when the timeline is renormalized.
    pub fn time_shift(&mut self, delta: f64) {
        for usage in &mut self.usages {
            usage.start += delta;
            if usage.end.is_finite() {
                usage.end += delta;
            }
        }
    }

    pub fn history(&self) -> &[BuffUsage] {
        &self.usages
    }

    pub fn into_history(self) -> Vec<BuffUsage> {
        self.usages
    }

    /// Fold an ability through the pre-cast transforms of `buffs`.
    pub fn fold_before_cast(&mut self, now: f64, buffs: &[Buff], ability: Ability) -> Ability {
        self.fold_ability(now, buffs, ability, |hooks| hooks.before_cast.clone())
    }

    /// Fold an ability through the pre-snapshot transforms of `buffs`.
    pub fn fold_before_snapshot(&mut self, now: f64, buffs: &[Buff], ability: Ability) -> Ability {
        self.fold_ability(now, buffs, ability, |hooks| hooks.before_snapshot.clone())
    }

    /// Fold a damage distribution through the post-damage transforms of
    /// `buffs`.
    pub fn fold_modify_damage(
        &mut self,
        now: f64,
        buffs: &[Buff],
        mut damage: DamageResult,
    ) -> DamageResult {
        for buff in buffs {
            if let Some(hook) = buff.hooks.modify_damage.clone() {
                let mut controller = BuffController {
                    timeline: &mut *self,
                    now,
                    invoking: buff.clone(),
                };
                damage = hook(&mut controller, damage);
            }
        }
        damage
    }

    fn fold_ability(
        &mut self,
        now: f64,
        buffs: &[Buff],
        mut ability: Ability,
        select: impl Fn(&BuffHooks) -> Option<crate::buffs::AbilityTransform>,
    ) -> Ability {
        for buff in buffs {
            if let Some(hook) = select(&buff.hooks)
                && buff.applies_to(&ability)
            {
                let mut controller = BuffController {
                    timeline: &mut *self,
                    now,
                    invoking: buff.clone(),
                };
                ability = hook(&mut controller, ability);
            }
        }
        ability
    }

    fn active_usage_mut(&mut self, buff: &Buff, t: f64) -> Option<&mut BuffUsage> {
        self.usages
            .iter_mut()
            .rev()
            .find(|u| u.buff.same_buff(buff) && u.contains(t))
    }

    /// Lazily re-window recurring party buffs whose current window has
    /// fully elapsed by `t`.
    fn recheck_recurring(&mut self, t: f64) {
        for i in 0..self.recurring.len() {
            let buff = self.recurring[i].clone();
            let Some(schedule) = buff.party else { continue };
            if schedule.cooldown <= 0.0 {
                continue;
            }
            loop {
                let Some(latest) = self
                    .usages
                    .iter()
                    .rev()
                    .find(|u| u.buff.same_buff(&buff))
                else {
                    break;
                };
                if latest.end > t {
                    break;
                }
                let next_start = latest.start + schedule.cooldown;
                self.activate(&buff, next_start);
                if next_start > t {
                    break;
                }
            }
        }
    }
}

/// Handle given to buff hooks, able to remove the invoking buff, remove any
/// other active buff, or adjust stack counts.
pub struct BuffController<'a> {
    pub(crate) timeline: &'a mut BuffTimeline,
    pub(crate) now: f64,
    pub(crate) invoking: Buff,
}

impl BuffController<'_> {
    /// Remove the buff whose hook is currently running.
    pub fn remove_self(&mut self) {
        let invoking = self.invoking.clone();
        self.timeline.remove(&invoking, self.now);
    }

    /// Remove any active buff.
    pub fn remove_buff(&mut self, buff: &Buff) {
        self.timeline.remove(buff, self.now);
    }

    pub fn add_stacks(&mut self, count: u32) {
        let invoking = self.invoking.clone();
        self.timeline.adjust_stacks(&invoking, self.now, count as i64);
    }

    /// Subtract stacks from the invoking buff; reaching zero removes it.
    pub fn subtract_stacks(&mut self, count: u32) {
        let invoking = self.invoking.clone();
        self.timeline
            .adjust_stacks(&invoking, self.now, -(count as i64));
    }

    pub fn current_stacks(&self) -> Option<u32> {
        self.timeline.stacks_of(&self.invoking, self.now)
    }
}
