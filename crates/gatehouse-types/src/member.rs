//! Member record and lifecycle state
//!
//! A MemberRecord is created when a member is first observed as unverified
//! and destroyed only by the pruning sweep, once resolved and past its
//! retention expiry.

use crate::MemberId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberState {
    /// Joined (or lost the verified marker) and not yet verified
    Unverified,

    /// Warned after the warn deadline elapsed, still unverified
    Warned,

    /// Completed verification; kept until retention expires
    Verified,

    /// Departed or was removed; kept until retention expires
    Removed,
}

impl MemberState {
    /// Resolved states carry a retention expiry and are eligible for pruning.
    pub fn is_resolved(&self) -> bool {
        matches!(self, MemberState::Verified | MemberState::Removed)
    }

    /// States still subject to escalation deadlines.
    pub fn is_pending(&self) -> bool {
        matches!(self, MemberState::Unverified | MemberState::Warned)
    }
}

/// Per-member mutable tracking state
///
/// The display name is a snapshot at record-creation time; it is never
/// refreshed if the member renames themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Stable member identifier (also the registry key)
    pub identity: MemberId,

    /// Display name snapshot at entry time
    pub display_name: String,

    /// When the record entered (or re-entered) tracking
    pub joined_at: DateTime<Utc>,

    /// When an unverified member gets warned
    pub warn_deadline: DateTime<Utc>,

    /// When a warned member gets removal requested
    pub remove_deadline: DateTime<Utc>,

    /// Set only once the record resolves (verified or removed);
    /// None while unverified/warned
    pub retention_expiry: Option<DateTime<Utc>>,

    /// Current lifecycle state
    pub state: MemberState,
}

impl MemberRecord {
    /// Create a fresh record in the Unverified state
    pub fn new(
        identity: MemberId,
        display_name: impl Into<String>,
        joined_at: DateTime<Utc>,
        warn_deadline: DateTime<Utc>,
        remove_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
            joined_at,
            warn_deadline,
            remove_deadline,
            retention_expiry: None,
            state: MemberState::Unverified,
        }
    }

    /// Reset an existing record to Unverified with fresh timestamps
    /// (re-entry case: the member lost a verified/unverified marker
    /// externally). The display-name snapshot is kept.
    pub fn reset(
        &mut self,
        joined_at: DateTime<Utc>,
        warn_deadline: DateTime<Utc>,
        remove_deadline: DateTime<Utc>,
    ) {
        self.joined_at = joined_at;
        self.warn_deadline = warn_deadline;
        self.remove_deadline = remove_deadline;
        self.retention_expiry = None;
        self.state = MemberState::Unverified;
    }

    /// Resolve the record into Verified or Removed, starting retention.
    pub fn resolve(&mut self, state: MemberState, retention_expiry: DateTime<Utc>) {
        debug_assert!(state.is_resolved());
        self.state = state;
        self.retention_expiry = Some(retention_expiry);
    }

    /// Age of the record at `now`, in whole seconds
    pub fn join_age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.joined_at).num_seconds()
    }

    /// Whether the pruning sweep may delete this record at `now`
    pub fn prunable_at(&self, now: DateTime<Utc>) -> bool {
        self.state.is_resolved()
            && self.retention_expiry.map_or(false, |expiry| expiry <= now)
    }
}
