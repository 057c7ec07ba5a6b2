//! Gatehouse Types - Core types for membership lifecycle tracking
//!
//! Gatehouse tracks members of an online community through a verification
//! lifecycle and escalates members who stay unverified past configured
//! deadlines. This crate holds the domain types shared by the registry and
//! the daemon.
//!
//! ## Architectural Boundaries
//!
//! - **gatehouse-types** owns: member identity, the lifecycle record and
//!   its state, inbound events, outbound actions
//! - **gatehouse-registry** owns: the tracked-member map, transitions,
//!   pruning, join-rate queries
//! - **gatehouse-daemon** owns: the escalation sweep, event ingestion, and
//!   the actuator boundary
//!
//! ## Key Concepts
//!
//! - **MemberRecord**: Per-member mutable state (deadlines, lifecycle state)
//! - **GateEvent**: External lifecycle signal (join, depart, marker change)
//! - **GateAction**: Domain action emitted for the external actuator
//! - **Retention**: Grace window keeping resolved records around for audit

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod actions;
pub mod errors;
pub mod events;
pub mod ids;
pub mod member;

// Re-export main types
pub use actions::{
    ActionEnvelope, ActionSeverity, ActionSource, GateAction, RemovalReason,
};
pub use errors::RegistryError;
pub use events::{GateEvent, RosterEntry, RosterMarker};
pub use ids::MemberId;
pub use member::{MemberRecord, MemberState};
