//! In-memory tracked-member registry
//!
//! Owns the identity → record map and enforces the lifecycle transitions.
//! Records are deleted only by [`MemberRegistry::prune`], after resolution
//! plus the retention window, so operators keep a grace period to audit
//! recently-resolved members.

use chrono::{DateTime, Duration, Utc};
use gatehouse_types::{MemberId, MemberRecord, MemberState, RegistryError};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Deadline offsets applied when a record enters (or re-enters) tracking
///
/// Configuration is expected to keep `remove > warn`; the registry does
/// not enforce it. With an inverted configuration the sweep warns on the
/// tick where both deadlines have passed and requests removal one tick
/// later.
#[derive(Debug, Clone, Copy)]
pub struct TrackingOffsets {
    /// Joined → warn deadline
    pub warn: Duration,

    /// Joined → removal deadline
    pub remove: Duration,

    /// Resolution → record deletion
    pub retention: Duration,
}

impl TrackingOffsets {
    /// Build offsets from whole-second configuration values
    pub fn from_secs(warn: u64, remove: u64, retention: u64) -> Self {
        Self {
            warn: Duration::seconds(warn as i64),
            remove: Duration::seconds(remove as i64),
            retention: Duration::seconds(retention as i64),
        }
    }
}

/// The tracked-member registry
///
/// All operations are keyed by [`MemberId`] and take `now` from the
/// caller. The map lives behind a single `RwLock`, so event ingestion and
/// the periodic sweep serialize their mutations through it.
#[derive(Debug)]
pub struct MemberRegistry {
    members: RwLock<HashMap<MemberId, MemberRecord>>,
    offsets: TrackingOffsets,
}

impl MemberRegistry {
    /// Create an empty registry with the given deadline offsets
    pub fn new(offsets: TrackingOffsets) -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
            offsets,
        }
    }

    /// The offsets this registry computes deadlines from
    pub fn offsets(&self) -> TrackingOffsets {
        self.offsets
    }

    /// Start (or restart) tracking a member as Unverified.
    ///
    /// Creates a record if absent. If the identity is already tracked the
    /// record is reset in place: fresh `joined_at` and deadlines computed
    /// from `now`, state back to Unverified, retention cleared. The
    /// display-name snapshot of an existing record is kept.
    pub async fn add_or_reset(
        &self,
        identity: MemberId,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        let warn_deadline = now + self.offsets.warn;
        let remove_deadline = now + self.offsets.remove;

        let mut members = self.members.write().await;
        match members.entry(identity) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                tracing::info!(member_id = %record.identity, name = %record.display_name, "Reset to unverified");
                record.reset(now, warn_deadline, remove_deadline);
            }
            Entry::Vacant(entry) => {
                let record = MemberRecord::new(
                    entry.key().clone(),
                    display_name,
                    now,
                    warn_deadline,
                    remove_deadline,
                );
                tracing::info!(member_id = %record.identity, name = %record.display_name, "Added");
                entry.insert(record);
            }
        }
    }

    /// Mark a member as warned.
    ///
    /// Normally called on an Unverified record. A record in any other
    /// state is overwritten anyway; the transition is deliberately not
    /// guarded.
    pub async fn mark_warned(&self, identity: &MemberId) -> RegistryResult<()> {
        let mut members = self.members.write().await;
        let record = members
            .get_mut(identity)
            .ok_or_else(|| RegistryError::NotFound(identity.clone()))?;

        if record.state != MemberState::Unverified {
            tracing::debug!(
                member_id = %identity,
                state = ?record.state,
                "Warning a record not in Unverified"
            );
        }
        tracing::info!(member_id = %identity, name = %record.display_name, "Warned");
        record.state = MemberState::Warned;
        Ok(())
    }

    /// Mark a member as verified and start its retention window
    pub async fn mark_verified(
        &self,
        identity: &MemberId,
        now: DateTime<Utc>,
    ) -> RegistryResult<()> {
        let mut members = self.members.write().await;
        let record = members
            .get_mut(identity)
            .ok_or_else(|| RegistryError::NotFound(identity.clone()))?;

        tracing::info!(member_id = %identity, name = %record.display_name, "Verified");
        record.resolve(MemberState::Verified, now + self.offsets.retention);
        Ok(())
    }

    /// Mark a member as removed and start its retention window.
    ///
    /// Used both for voluntary departure and for enforced removal; the
    /// registry does not distinguish.
    pub async fn mark_removed(
        &self,
        identity: &MemberId,
        now: DateTime<Utc>,
    ) -> RegistryResult<()> {
        let mut members = self.members.write().await;
        let record = members
            .get_mut(identity)
            .ok_or_else(|| RegistryError::NotFound(identity.clone()))?;

        tracing::info!(member_id = %identity, name = %record.display_name, "Set removed");
        record.resolve(MemberState::Removed, now + self.offsets.retention);
        Ok(())
    }

    /// Delete every resolved record whose retention has expired.
    ///
    /// Keys are snapshotted before deletion so the map is never mutated
    /// while iterating it. Returns the deleted identities.
    pub async fn prune(&self, now: DateTime<Utc>) -> Vec<MemberId> {
        let mut members = self.members.write().await;

        let expired: Vec<MemberId> = members
            .iter()
            .filter(|(_, record)| record.prunable_at(now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(record) = members.remove(id) {
                tracing::info!(member_id = %id, name = %record.display_name, "Deleted");
            }
        }
        expired
    }

    /// Count records whose join time falls inside `window` of `now`,
    /// regardless of state. O(n) scan; n is bounded by community size.
    pub async fn count_joins_within(&self, window: Duration, now: DateTime<Utc>) -> u32 {
        let members = self.members.read().await;
        members
            .values()
            .filter(|record| now - record.joined_at < window)
            .count() as u32
    }

    /// Identities whose join age at `now` lies strictly between `min_age`
    /// and `max_age`. Backs the raid-cleanup purge.
    pub async fn joined_between(
        &self,
        min_age: Duration,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Vec<MemberId> {
        let members = self.members.read().await;
        members
            .values()
            .filter(|record| {
                let age = now - record.joined_at;
                age > min_age && age < max_age
            })
            .map(|record| record.identity.clone())
            .collect()
    }

    /// Look up a single record
    pub async fn lookup(&self, identity: &MemberId) -> RegistryResult<MemberRecord> {
        let members = self.members.read().await;
        members
            .get(identity)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(identity.clone()))
    }

    /// Snapshot of all tracked identities, stable against later mutation
    pub async fn member_ids(&self) -> Vec<MemberId> {
        let members = self.members.read().await;
        members.keys().cloned().collect()
    }

    /// Snapshot of all records, ordered by join time (roster view)
    pub async fn snapshot(&self) -> Vec<MemberRecord> {
        let members = self.members.read().await;
        let mut records: Vec<MemberRecord> = members.values().cloned().collect();
        records.sort_by_key(|record| record.joined_at);
        records
    }

    /// Number of tracked records
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_offsets() -> TrackingOffsets {
        TrackingOffsets::from_secs(300, 600, 3600)
    }

    fn registry() -> MemberRegistry {
        MemberRegistry::new(test_offsets())
    }

    #[tokio::test]
    async fn add_creates_unverified_record_with_deadlines() {
        let reg = registry();
        let now = Utc::now();
        reg.add_or_reset(MemberId::new("a"), "alice", now).await;

        let record = reg.lookup(&MemberId::new("a")).await.unwrap();
        assert_eq!(record.state, MemberState::Unverified);
        assert_eq!(record.joined_at, now);
        assert_eq!(record.warn_deadline, now + Duration::seconds(300));
        assert_eq!(record.remove_deadline, now + Duration::seconds(600));
        assert!(record.retention_expiry.is_none());
    }

    #[tokio::test]
    async fn add_or_reset_never_duplicates() {
        let reg = registry();
        let now = Utc::now();
        reg.add_or_reset(MemberId::new("a"), "alice", now).await;
        reg.add_or_reset(MemberId::new("a"), "alice-renamed", now + Duration::seconds(50))
            .await;

        assert_eq!(reg.len().await, 1);
        // Display name is a creation-time snapshot, not refreshed on reset
        let record = reg.lookup(&MemberId::new("a")).await.unwrap();
        assert_eq!(record.display_name, "alice");
        assert_eq!(record.joined_at, now + Duration::seconds(50));
    }

    #[tokio::test]
    async fn verify_then_reset_round_trip() {
        let reg = registry();
        let id = MemberId::new("a");
        let t0 = Utc::now();

        reg.add_or_reset(id.clone(), "alice", t0).await;
        reg.mark_verified(&id, t0 + Duration::seconds(10)).await.unwrap();

        let record = reg.lookup(&id).await.unwrap();
        assert_eq!(record.state, MemberState::Verified);
        assert_eq!(
            record.retention_expiry,
            Some(t0 + Duration::seconds(10) + Duration::seconds(3600))
        );

        // Re-entry (e.g. verified marker stripped): deadlines recomputed
        // from the reset time, prior verification discarded
        let t1 = t0 + Duration::seconds(100);
        reg.add_or_reset(id.clone(), "alice", t1).await;
        let record = reg.lookup(&id).await.unwrap();
        assert_eq!(record.state, MemberState::Unverified);
        assert!(record.retention_expiry.is_none());
        assert_eq!(record.warn_deadline, t1 + Duration::seconds(300));
    }

    #[tokio::test]
    async fn retention_expiry_set_iff_resolved() {
        let reg = registry();
        let now = Utc::now();
        for (id, name) in [("u", "unver"), ("w", "warned"), ("v", "ver"), ("r", "rem")] {
            reg.add_or_reset(MemberId::new(id), name, now).await;
        }
        reg.mark_warned(&MemberId::new("w")).await.unwrap();
        reg.mark_verified(&MemberId::new("v"), now).await.unwrap();
        reg.mark_removed(&MemberId::new("r"), now).await.unwrap();

        for record in reg.snapshot().await {
            assert_eq!(
                record.retention_expiry.is_some(),
                record.state.is_resolved(),
                "invariant violated for {:?}",
                record.state
            );
        }
    }

    #[tokio::test]
    async fn prune_only_deletes_expired_resolved_records() {
        let reg = registry();
        let now = Utc::now();
        reg.add_or_reset(MemberId::new("pending"), "p", now).await;
        reg.add_or_reset(MemberId::new("warned"), "w", now).await;
        reg.mark_warned(&MemberId::new("warned")).await.unwrap();
        reg.add_or_reset(MemberId::new("verified"), "v", now).await;
        reg.mark_verified(&MemberId::new("verified"), now).await.unwrap();

        // Far future: pending/warned survive no matter what
        let far = now + Duration::days(365);
        let deleted = reg.prune(far).await;
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0], MemberId::new("verified"));
        assert_eq!(reg.len().await, 2);

        // Idempotent: second prune with no intervening mutation is a no-op
        let deleted = reg.prune(far).await;
        assert!(deleted.is_empty());
        assert_eq!(reg.len().await, 2);
    }

    #[tokio::test]
    async fn prune_boundary_is_inclusive_at_expiry() {
        let reg = registry();
        let t0 = Utc::now();
        let id = MemberId::new("a");
        reg.add_or_reset(id.clone(), "alice", t0).await;
        reg.mark_verified(&id, t0).await.unwrap();

        assert!(reg.prune(t0 + Duration::seconds(3599)).await.is_empty());
        assert_eq!(reg.prune(t0 + Duration::seconds(3600)).await.len(), 1);
        assert!(reg.lookup(&id).await.is_err());
    }

    #[tokio::test]
    async fn count_joins_within_ignores_state() {
        let reg = registry();
        let t0 = Utc::now();
        reg.add_or_reset(MemberId::new("a"), "a", t0).await;
        reg.add_or_reset(MemberId::new("b"), "b", t0 + Duration::seconds(30)).await;
        reg.mark_verified(&MemberId::new("a"), t0 + Duration::seconds(40))
            .await
            .unwrap();

        let now = t0 + Duration::seconds(50);
        assert_eq!(reg.count_joins_within(Duration::seconds(60), now).await, 2);
        // Window edge is exclusive: a join exactly window-old is outside
        assert_eq!(reg.count_joins_within(Duration::seconds(50), now).await, 1);
        assert_eq!(reg.count_joins_within(Duration::seconds(10), now).await, 0);
    }

    #[tokio::test]
    async fn joined_between_uses_strict_age_bounds() {
        let reg = registry();
        let t0 = Utc::now();
        reg.add_or_reset(MemberId::new("old"), "o", t0).await;
        reg.add_or_reset(MemberId::new("mid"), "m", t0 + Duration::seconds(30)).await;
        reg.add_or_reset(MemberId::new("new"), "n", t0 + Duration::seconds(55)).await;

        let now = t0 + Duration::seconds(60);
        // Ages: old=60, mid=30, new=5; select ages in (10, 45)
        let hits = reg
            .joined_between(Duration::seconds(10), Duration::seconds(45), now)
            .await;
        assert_eq!(hits, vec![MemberId::new("mid")]);
    }

    #[tokio::test]
    async fn operations_on_unknown_identity_fail() {
        let reg = registry();
        let now = Utc::now();
        let ghost = MemberId::new("ghost");

        assert!(matches!(
            reg.mark_warned(&ghost).await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            reg.mark_verified(&ghost, now).await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            reg.mark_removed(&ghost, now).await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(reg.lookup(&ghost).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_is_ordered_by_join_time() {
        let reg = registry();
        let t0 = Utc::now();
        reg.add_or_reset(MemberId::new("late"), "l", t0 + Duration::seconds(20)).await;
        reg.add_or_reset(MemberId::new("early"), "e", t0).await;

        let roster = reg.snapshot().await;
        assert_eq!(roster[0].identity, MemberId::new("early"));
        assert_eq!(roster[1].identity, MemberId::new("late"));
    }
}
