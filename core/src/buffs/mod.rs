//! Buff / effect engine
//!
//! This module provides:
//! - **Definitions**: buff effect sets plus optional capability hooks
//! - **Timeline**: append-only activation windows with `[start, end)`
//!   membership queries and lazy recurrence for scheduled party buffs
//! - **Controller**: the handle hooks use to remove buffs or adjust stacks
//!
//! The one invariant that shapes everything here is the dual evaluation
//! point: haste is read from the cast-start buff set (cast/recast length is
//! fixed once casting begins), every other effect from the snapshot set.

mod definition;
mod timeline;


pub use definition::{
    AbilityTransform, AppliesPredicate, Buff, BuffEffects, BuffHooks, BuffScope, CombinedEffects,
    DamageTransform, PartySchedule, StatModifier, StatusIdAllocator, combine_effects,
};
pub use timeline::{BuffController, BuffTimeline, BuffUsage};
