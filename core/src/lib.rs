pub mod ability;
pub mod buffs;
pub mod combo;
pub mod cooldowns;
pub mod error;
pub mod formula;
pub mod processor;
pub mod records;

// Re-exports for convenience
pub use ability::{
    Ability, AbilityKind, ComboBehavior, ComboDeclaration, ComboOverrides, CooldownDescriptor,
    DEFAULT_COMBO_KEY, DEFAULT_GCD, DotDescriptor, abilities_equal,
};
pub use buffs::{
    Buff, BuffController, BuffEffects, BuffHooks, BuffScope, BuffTimeline, BuffUsage,
    CombinedEffects, PartySchedule, StatusIdAllocator, combine_effects,
};
pub use cadence_types::{
    AttackCategory, CooldownMode, CutoffMode, CycleLengthMode, SimulationSettings, SpeedBasis,
};
pub use combo::{ComboTracker, complete_combo_data};
pub use cooldowns::{CooldownStatus, CooldownTimes, CooldownTracker};
pub use error::SimError;
pub use formula::{DamageModel, DamageResult, FlatScalingModel};
pub use processor::{
    AbilityUseResult, CASTER_TAX, CAST_SNAPSHOT_PRE, CycleContext, CycleProcessor,
    DOT_TICK_INTERVAL, STANDARD_ANIMATION_LOCK, STANDARD_APPLICATION_DELAY,
};
pub use records::{CycleInfo, DotApplication, SimRecord, SimulationResult, UsedAbility};
