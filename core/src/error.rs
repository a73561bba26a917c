//! Error types for the simulation engine
//!
//! Structural and timeline-invariant violations abort the run; data-authoring
//! problems (ambiguous ability equality, combo continuity mismatches) are
//! logged at the point of detection and the simulation proceeds.

use thiserror::Error;

/// Maximum hops followed when resolving a shared-cooldown chain.
pub const MAX_COOLDOWN_SHARE_HOPS: usize = 10;

/// Fatal simulation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// An ability was used before its cooldown was ready while the
    /// enforcement policy was `reject`.
    #[error("ability '{name}' not ready until {ready_at:.3}s (attempted at {at:.3}s)")]
    CooldownNotReady { name: String, ready_at: f64, at: f64 },

    /// A shared-cooldown chain revisited an ability it already passed
    /// through. Always a descriptor bug.
    #[error("circular cooldown share chain through ability id {id}")]
    CircularCooldownShare { id: u32 },

    /// A shared-cooldown chain exceeded the hop limit.
    #[error("cooldown share chain starting at ability id {id} exceeds {MAX_COOLDOWN_SHARE_HOPS} hops")]
    CooldownShareTooDeep { id: u32 },

    /// The caller asked the clock to move backwards. Always a caller bug.
    #[error("cannot rewind simulation clock from {now:.3}s to {target:.3}s")]
    TimeRewindAttempted { now: f64, target: f64 },
}
