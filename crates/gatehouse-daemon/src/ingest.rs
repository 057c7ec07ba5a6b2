//! Event ingestion
//!
//! Translates external lifecycle events into registry operations and raid
//! checks. The platform-integration layer (out of scope here) feeds this
//! from its gateway connection and performs the actions that come back.

use gatehouse_registry::{Clock, MemberRegistry, RaidDetector};
use gatehouse_types::{
    ActionEnvelope, ActionSource, GateAction, GateEvent, RosterEntry, RosterMarker,
};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::DaemonResult;

/// Maps external lifecycle signals to registry operations
pub struct EventIngestor {
    registry: Arc<MemberRegistry>,
    raid: RaidDetector,
    clock: Arc<dyn Clock>,
    action_tx: broadcast::Sender<ActionEnvelope>,
}

impl EventIngestor {
    /// Create a new ingestor
    pub fn new(
        registry: Arc<MemberRegistry>,
        raid: RaidDetector,
        clock: Arc<dyn Clock>,
        action_tx: broadcast::Sender<ActionEnvelope>,
    ) -> Self {
        Self {
            registry,
            raid,
            clock,
            action_tx,
        }
    }

    /// Handle one lifecycle event.
    ///
    /// Returns the envelopes emitted for this event (also sent on the
    /// action channel). `NotFound` from the registry surfaces to the
    /// caller; the daemon loop logs it and moves on.
    pub async fn handle(&self, event: GateEvent) -> DaemonResult<Vec<ActionEnvelope>> {
        let now = self.clock.now();
        let mut emitted = Vec::new();

        match event {
            GateEvent::MemberJoined {
                member_id,
                display_name,
            } => {
                self.registry
                    .add_or_reset(member_id, display_name, now)
                    .await;

                if let Some(action) = self.raid.check(&self.registry, now).await {
                    emitted.push(self.emit(action, ActionSource::RaidWatch));
                }
            }

            GateEvent::MemberDeparted { member_id } => {
                self.registry.mark_removed(&member_id, now).await?;
            }

            GateEvent::VerifiedMarkerGained { member_id } => {
                self.registry.mark_verified(&member_id, now).await?;
                // The actuator clears the external warning marker on this
                emitted.push(self.emit(
                    GateAction::VerificationCompleted { member_id },
                    ActionSource::Ingestor,
                ));
            }

            GateEvent::VerifiedMarkerLost { member_id } => {
                // No-op by itself: re-tracking starts when the unverified
                // marker is granted back
                tracing::debug!(member_id = %member_id, "Verified marker lost");
            }

            GateEvent::UnverifiedMarkerGained {
                member_id,
                display_name,
            } => {
                self.registry
                    .add_or_reset(member_id, display_name, now)
                    .await;
            }
        }

        Ok(emitted)
    }

    /// Startup reconciliation: rebuild the registry from the externally
    /// observed roster after a restart (tracking state is in-memory only).
    pub async fn reconcile(&self, roster: Vec<RosterEntry>) -> DaemonResult<()> {
        let now = self.clock.now();
        let count = roster.len();

        for entry in roster {
            self.registry
                .add_or_reset(entry.member_id.clone(), entry.display_name, now)
                .await;

            if entry.marker == RosterMarker::Warned {
                self.registry.mark_warned(&entry.member_id).await?;
            }
        }

        tracing::info!(count = count, "Startup roster reconciled");
        Ok(())
    }

    fn emit(&self, action: GateAction, source: ActionSource) -> ActionEnvelope {
        let envelope = ActionEnvelope::new(action, source, self.clock.now());
        let _ = self.action_tx.send(envelope.clone());
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use gatehouse_registry::{ManualClock, TrackingOffsets};
    use gatehouse_types::{MemberId, MemberState, RegistryError};

    use crate::error::DaemonError;

    fn harness() -> (EventIngestor, Arc<MemberRegistry>, Arc<ManualClock>) {
        let registry = Arc::new(MemberRegistry::new(TrackingOffsets::from_secs(
            300, 600, 3600,
        )));
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let (action_tx, _rx) = broadcast::channel(100);
        let ingestor = EventIngestor::new(
            registry.clone(),
            RaidDetector::new(60, 5),
            clock.clone(),
            action_tx,
        );
        (ingestor, registry, clock)
    }

    fn joined(id: &str) -> GateEvent {
        GateEvent::MemberJoined {
            member_id: MemberId::new(id),
            display_name: id.to_string(),
        }
    }

    #[tokio::test]
    async fn join_starts_tracking() {
        let (ingestor, registry, _clock) = harness();
        let emitted = ingestor.handle(joined("a")).await.unwrap();
        assert!(emitted.is_empty());

        let record = registry.lookup(&MemberId::new("a")).await.unwrap();
        assert_eq!(record.state, MemberState::Unverified);
    }

    #[tokio::test]
    async fn join_burst_triggers_raid_check() {
        let (ingestor, _registry, clock) = harness();

        for i in 0..4 {
            assert!(ingestor.handle(joined(&format!("m-{i}"))).await.unwrap().is_empty());
            clock.advance(Duration::seconds(10));
        }

        let emitted = ingestor.handle(joined("m-4")).await.unwrap();
        assert_eq!(emitted.len(), 1);
        assert_eq!(
            emitted[0].action,
            GateAction::RaidDetected {
                count: 5,
                window_secs: 60
            }
        );
    }

    #[tokio::test]
    async fn departure_marks_removed() {
        let (ingestor, registry, clock) = harness();
        ingestor.handle(joined("a")).await.unwrap();

        clock.advance(Duration::seconds(30));
        ingestor
            .handle(GateEvent::MemberDeparted {
                member_id: MemberId::new("a"),
            })
            .await
            .unwrap();

        let record = registry.lookup(&MemberId::new("a")).await.unwrap();
        assert_eq!(record.state, MemberState::Removed);
        assert!(record.retention_expiry.is_some());
    }

    #[tokio::test]
    async fn departure_of_untracked_member_surfaces_not_found() {
        let (ingestor, _registry, _clock) = harness();
        let result = ingestor
            .handle(GateEvent::MemberDeparted {
                member_id: MemberId::new("ghost"),
            })
            .await;
        assert!(matches!(
            result,
            Err(DaemonError::Registry(RegistryError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn verification_resolves_and_emits_completion() {
        let (ingestor, registry, _clock) = harness();
        ingestor.handle(joined("a")).await.unwrap();

        let emitted = ingestor
            .handle(GateEvent::VerifiedMarkerGained {
                member_id: MemberId::new("a"),
            })
            .await
            .unwrap();

        assert_eq!(
            emitted[0].action,
            GateAction::VerificationCompleted {
                member_id: MemberId::new("a")
            }
        );
        let record = registry.lookup(&MemberId::new("a")).await.unwrap();
        assert_eq!(record.state, MemberState::Verified);
    }

    #[tokio::test]
    async fn losing_verified_marker_alone_changes_nothing() {
        let (ingestor, registry, _clock) = harness();
        ingestor
            .handle(GateEvent::VerifiedMarkerLost {
                member_id: MemberId::new("a"),
            })
            .await
            .unwrap();
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn unverified_marker_restarts_tracking_of_verified_member() {
        let (ingestor, registry, clock) = harness();
        let t0 = clock.now();
        ingestor.handle(joined("a")).await.unwrap();
        ingestor
            .handle(GateEvent::VerifiedMarkerGained {
                member_id: MemberId::new("a"),
            })
            .await
            .unwrap();

        clock.advance(Duration::seconds(120));
        ingestor
            .handle(GateEvent::UnverifiedMarkerGained {
                member_id: MemberId::new("a"),
                display_name: "a".to_string(),
            })
            .await
            .unwrap();

        let record = registry.lookup(&MemberId::new("a")).await.unwrap();
        assert_eq!(record.state, MemberState::Unverified);
        assert_eq!(record.joined_at, t0 + Duration::seconds(120));
        assert!(record.retention_expiry.is_none());
    }

    #[tokio::test]
    async fn reconcile_restores_unverified_and_warned() {
        let (ingestor, registry, _clock) = harness();
        ingestor
            .reconcile(vec![
                RosterEntry::new(MemberId::new("u"), "u", RosterMarker::Unverified),
                RosterEntry::new(MemberId::new("w"), "w", RosterMarker::Warned),
            ])
            .await
            .unwrap();

        assert_eq!(
            registry.lookup(&MemberId::new("u")).await.unwrap().state,
            MemberState::Unverified
        );
        assert_eq!(
            registry.lookup(&MemberId::new("w")).await.unwrap().state,
            MemberState::Warned
        );
    }
}
