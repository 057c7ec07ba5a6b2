//! Daemon wiring and lifecycle

use crate::actuator::{spawn_dispatcher, Actuator};
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::ingest::EventIngestor;
use crate::sweep::Sweeper;
use chrono::Duration;
use gatehouse_registry::{Clock, MemberRegistry, RaidDetector, SystemClock, TrackingOffsets};
use gatehouse_types::{ActionEnvelope, ActionSource, GateAction, RemovalReason};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Gatehouse daemon: registry, sweeper, ingestor, action channel
pub struct Daemon {
    config: DaemonConfig,
    registry: Arc<MemberRegistry>,
    clock: Arc<dyn Clock>,
    ingestor: EventIngestor,
    action_tx: broadcast::Sender<ActionEnvelope>,
}

impl Daemon {
    /// Create a daemon on the system clock
    pub fn new(config: DaemonConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a daemon with a specific clock (tests use a manual one)
    pub fn with_clock(config: DaemonConfig, clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(MemberRegistry::new(TrackingOffsets::from_secs(
            config.tracking.warn_offset_secs,
            config.tracking.remove_offset_secs,
            config.tracking.retention_secs,
        )));

        let (action_tx, _) = broadcast::channel(1000);

        let ingestor = EventIngestor::new(
            registry.clone(),
            RaidDetector::new(config.raid.window_secs, config.raid.threshold),
            clock.clone(),
            action_tx.clone(),
        );

        Self {
            config,
            registry,
            clock,
            ingestor,
            action_tx,
        }
    }

    /// The tracked-member registry
    pub fn registry(&self) -> &Arc<MemberRegistry> {
        &self.registry
    }

    /// The event ingestor the platform layer feeds
    pub fn ingestor(&self) -> &EventIngestor {
        &self.ingestor
    }

    /// Subscribe to the emitted-action stream
    pub fn subscribe(&self) -> broadcast::Receiver<ActionEnvelope> {
        self.action_tx.subscribe()
    }

    /// Emit removal requests for every member whose join age falls
    /// strictly between `start_age_secs` and `end_age_secs` (raid
    /// cleanup). Ages count backwards from now, so "purge 30 to 60"
    /// targets joins between 30 and 60 seconds ago.
    ///
    /// Only requests removal; registry state changes when the departure
    /// events come back from the platform.
    pub async fn purge_join_window(
        &self,
        start_age_secs: u64,
        end_age_secs: u64,
    ) -> DaemonResult<Vec<ActionEnvelope>> {
        if start_age_secs >= end_age_secs {
            return Err(DaemonError::InvalidPurgeWindow {
                start_secs: start_age_secs,
                end_secs: end_age_secs,
            });
        }

        let now = self.clock.now();
        let targets = self
            .registry
            .joined_between(
                Duration::seconds(start_age_secs as i64),
                Duration::seconds(end_age_secs as i64),
                now,
            )
            .await;

        tracing::warn!(
            count = targets.len(),
            start_age_secs,
            end_age_secs,
            "Purging raid join window"
        );

        let mut emitted = Vec::with_capacity(targets.len());
        for member_id in targets {
            let envelope = ActionEnvelope::new(
                GateAction::RemoveMember {
                    member_id,
                    reason: RemovalReason::RaidCleanup,
                },
                ActionSource::Ingestor,
                now,
            );
            let _ = self.action_tx.send(envelope.clone());
            emitted.push(envelope);
        }
        Ok(emitted)
    }

    /// Run until shutdown: sweep loop plus action dispatch.
    pub async fn run(self, actuator: Arc<dyn Actuator>) -> DaemonResult<()> {
        tracing::info!(
            warn_offset_secs = self.config.tracking.warn_offset_secs,
            remove_offset_secs = self.config.tracking.remove_offset_secs,
            retention_secs = self.config.tracking.retention_secs,
            raid_window_secs = self.config.raid.window_secs,
            raid_threshold = self.config.raid.threshold,
            sweep_period_secs = self.config.sweep.period_secs,
            "Gatehouse daemon starting"
        );

        let dispatcher = spawn_dispatcher(self.action_tx.subscribe(), actuator);

        let (sweeper, sweep_rx) = Sweeper::new(
            self.config.sweep.clone(),
            self.registry.clone(),
            self.clock.clone(),
            self.action_tx.clone(),
        );
        let sweep_handle = tokio::spawn({
            let sweeper = sweeper.clone();
            async move {
                sweeper.start(sweep_rx).await;
            }
        });

        shutdown_signal().await;
        tracing::info!("Gatehouse daemon shutting down");

        sweeper.stop().await;
        sweeper.trigger_sweep().await;
        let _ = sweep_handle.await;

        // The ingestor still holds a sender, so the channel never closes
        // on its own; cut the dispatcher off once the sweep has drained.
        dispatcher.abort();

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
