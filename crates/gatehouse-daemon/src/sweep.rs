//! Escalation sweep loop
//!
//! The sweeper polls the registry on a fixed period. Each tick prunes
//! expired records, then walks the survivors and emits warn/remove actions
//! for elapsed deadlines. Ticks run sequentially inside one task, so a
//! slow tick delays the next rather than overlapping it.

use crate::config::SweepConfig;
use gatehouse_registry::{Clock, MemberRegistry};
use gatehouse_types::{
    ActionEnvelope, ActionSource, GateAction, MemberState, RemovalReason,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::{interval, Duration};

/// Periodic escalation sweeper
pub struct Sweeper {
    config: SweepConfig,
    registry: Arc<MemberRegistry>,
    clock: Arc<dyn Clock>,
    action_tx: broadcast::Sender<ActionEnvelope>,
    sweep_tx: mpsc::Sender<()>,
    running: Arc<RwLock<bool>>,
}

impl Sweeper {
    /// Create a new sweeper
    pub fn new(
        config: SweepConfig,
        registry: Arc<MemberRegistry>,
        clock: Arc<dyn Clock>,
        action_tx: broadcast::Sender<ActionEnvelope>,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (sweep_tx, sweep_rx) = mpsc::channel(10);

        let sweeper = Arc::new(Self {
            config,
            registry,
            clock,
            action_tx,
            sweep_tx,
            running: Arc::new(RwLock::new(false)),
        });

        (sweeper, sweep_rx)
    }

    /// Trigger an immediate sweep
    pub async fn trigger_sweep(&self) {
        let _ = self.sweep_tx.send(()).await;
    }

    /// Start the sweep loop
    pub async fn start(self: Arc<Self>, mut sweep_rx: mpsc::Receiver<()>) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }

        tracing::info!(period_secs = self.config.period_secs, "Sweeper started");

        let mut ticker = interval(Duration::from_secs(self.config.period_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                Some(_) = sweep_rx.recv() => {
                    self.tick().await;
                }
                else => break,
            }

            let running = self.running.read().await;
            if !*running {
                break;
            }
        }

        tracing::info!("Sweeper stopped");
    }

    /// Stop the sweep loop
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    /// Run one sweep across all tracked records.
    ///
    /// Returns the emitted envelopes (they are also sent on the action
    /// channel). For identical registry state and identical `now` the
    /// returned action set is identical; only its order follows map
    /// iteration.
    pub async fn tick(&self) -> Vec<ActionEnvelope> {
        let now = self.clock.now();
        let mut emitted = Vec::new();

        let pruned = self.registry.prune(now).await;
        if !pruned.is_empty() {
            tracing::debug!(count = pruned.len(), "Pruned expired records");
        }

        // Snapshot identities; each record is re-read under the lock so a
        // concurrent event between prune and here is still seen.
        for id in self.registry.member_ids().await {
            let record = match self.registry.lookup(&id).await {
                Ok(record) => record,
                // Deleted between snapshot and lookup
                Err(_) => continue,
            };

            if record.state == MemberState::Unverified && now >= record.warn_deadline {
                // Emit first, then transition. The warned record is not
                // re-evaluated against the remove deadline this tick.
                emitted.push(self.emit(GateAction::WarnMember {
                    member_id: id.clone(),
                }));
                if let Err(e) = self.registry.mark_warned(&id).await {
                    tracing::warn!(member_id = %id, error = %e, "Warn transition failed");
                }
                continue;
            }

            if record.state == MemberState::Warned && now >= record.remove_deadline {
                // Only requests removal. The Removed transition comes from
                // the departure event once the actuator has acted.
                emitted.push(self.emit(GateAction::RemoveMember {
                    member_id: id.clone(),
                    reason: RemovalReason::VerificationTimeout,
                }));
            }
        }

        emitted
    }

    fn emit(&self, action: GateAction) -> ActionEnvelope {
        let envelope = ActionEnvelope::new(action, ActionSource::Sweeper, self.clock.now());
        let _ = self.action_tx.send(envelope.clone());
        envelope
    }
}
