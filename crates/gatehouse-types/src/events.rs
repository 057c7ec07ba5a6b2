//! Inbound lifecycle events
//!
//! The platform-integration layer translates raw chat-platform signals
//! (gateway events, role diffs) into these events before handing them to
//! the ingestor. Marker changes arrive already diffed: the ingestor sees
//! "gained the verified marker", not two role lists.

use crate::MemberId;
use serde::{Deserialize, Serialize};

/// External lifecycle signal about a single member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GateEvent {
    /// Member joined the community
    MemberJoined {
        member_id: MemberId,
        display_name: String,
    },

    /// Member departed (left, kicked, or banned — indistinguishable here)
    MemberDeparted {
        member_id: MemberId,
    },

    /// Member gained the verified marker
    VerifiedMarkerGained {
        member_id: MemberId,
    },

    /// Member lost the verified marker
    VerifiedMarkerLost {
        member_id: MemberId,
    },

    /// Member gained the unverified marker without holding it before
    UnverifiedMarkerGained {
        member_id: MemberId,
        display_name: String,
    },
}

impl GateEvent {
    /// The member this event concerns
    pub fn member_id(&self) -> &MemberId {
        match self {
            GateEvent::MemberJoined { member_id, .. }
            | GateEvent::MemberDeparted { member_id }
            | GateEvent::VerifiedMarkerGained { member_id }
            | GateEvent::VerifiedMarkerLost { member_id }
            | GateEvent::UnverifiedMarkerGained { member_id, .. } => member_id,
        }
    }
}

/// Marker observed on a member during startup reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterMarker {
    /// Holding the unverified marker
    Unverified,
    /// Holding the warning marker (was warned before a restart)
    Warned,
}

/// One externally-observed member in the startup roster scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub member_id: MemberId,
    pub display_name: String,
    pub marker: RosterMarker,
}

impl RosterEntry {
    pub fn new(
        member_id: MemberId,
        display_name: impl Into<String>,
        marker: RosterMarker,
    ) -> Self {
        Self {
            member_id,
            display_name: display_name.into(),
            marker,
        }
    }
}
