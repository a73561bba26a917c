//! Cooldown tracking
//!
//! Charge-based and simple cooldown state per ability (or shared-cooldown
//! group), answering readiness queries at arbitrary times.

mod tracker;


pub use tracker::{CooldownStatus, CooldownTimes, CooldownTracker};
