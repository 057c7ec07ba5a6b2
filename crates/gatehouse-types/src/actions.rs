//! Outbound domain actions
//!
//! Actions are the daemon's only output: requests for the external
//! actuator to notify, mutate markers, or remove members. The registry
//! transition is applied first; actuation is best-effort enforcement and
//! never rolls state back.

use crate::MemberId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a removal was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Warned member ran past the remove deadline without verifying
    VerificationTimeout,
    /// Swept up by a raid-window purge
    RaidCleanup,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalReason::VerificationTimeout => write!(f, "verification-timeout"),
            RemovalReason::RaidCleanup => write!(f, "raid-cleanup"),
        }
    }
}

/// Domain action for the external actuator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateAction {
    /// Warn an unverified member that removal is coming
    WarnMember {
        member_id: MemberId,
    },

    /// Request removal of a member from the community
    RemoveMember {
        member_id: MemberId,
        reason: RemovalReason,
    },

    /// Join rate crossed the raid threshold
    RaidDetected {
        /// Joins counted inside the window at trigger time
        count: u32,
        /// Window width, seconds
        window_secs: u64,
    },

    /// Member completed verification; clear any warning marker
    VerificationCompleted {
        member_id: MemberId,
    },
}

/// Where an action originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSource {
    /// Periodic escalation sweep
    Sweeper,
    /// Event ingestion path
    Ingestor,
    /// Raid detection check
    RaidWatch,
}

/// Action severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSeverity {
    /// Informational action
    Info,
    /// Warning action
    Warning,
    /// Critical action requiring operator attention
    Critical,
}

/// Envelope wrapping every emitted action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// Unique action ID
    pub id: Uuid,

    /// Emission timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Component that emitted the action
    pub source: ActionSource,

    /// Severity inferred from the action
    pub severity: ActionSeverity,

    /// The actual action
    pub action: GateAction,
}

impl ActionEnvelope {
    /// Create a new envelope, inferring severity from the action
    pub fn new(
        action: GateAction,
        source: ActionSource,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            source,
            severity: Self::infer_severity(&action),
            action,
        }
    }

    /// Infer severity from the action type
    fn infer_severity(action: &GateAction) -> ActionSeverity {
        match action {
            GateAction::RaidDetected { .. } => ActionSeverity::Critical,

            GateAction::WarnMember { .. } | GateAction::RemoveMember { .. } => {
                ActionSeverity::Warning
            }

            GateAction::VerificationCompleted { .. } => ActionSeverity::Info,
        }
    }
}
