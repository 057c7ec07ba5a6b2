//! Gatehouse Registry - tracked-member state and join-rate signals
//!
//! The registry is the single owner of per-member lifecycle state. All
//! mutation goes through its operations; iteration for mutation purposes
//! snapshots keys first, so a sweep never mutates the map mid-iteration.
//!
//! Time never comes from the ambient clock inside the registry: every
//! operation takes `now` from the caller, which makes the whole crate
//! deterministic under test (see [`clock::ManualClock`]).

#![deny(unsafe_code)]

pub mod clock;
pub mod raid;
pub mod registry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use raid::RaidDetector;
pub use registry::{MemberRegistry, TrackingOffsets};
