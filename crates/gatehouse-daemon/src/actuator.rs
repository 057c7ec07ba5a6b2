//! Actuator boundary
//!
//! Emitted actions are intents; the actuator is what touches the outside
//! world (messages, marker mutations, kicks). Delivery happens off the
//! registry lock, from a dedicated dispatch task, and failures are logged
//! and dropped: the registry transition already reflects the decision and
//! is never rolled back.

use crate::error::ActuatorError;
use async_trait::async_trait;
use gatehouse_types::ActionEnvelope;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Boundary for performing emitted actions against the chat platform
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Perform one action. Slow and fallible by nature.
    async fn deliver(&self, envelope: &ActionEnvelope) -> Result<(), ActuatorError>;
}

/// Actuator that logs every intent and performs nothing.
///
/// Stands in where no platform integration is wired up; also useful as a
/// dry-run mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActuator;

#[async_trait]
impl Actuator for TracingActuator {
    async fn deliver(&self, envelope: &ActionEnvelope) -> Result<(), ActuatorError> {
        tracing::info!(
            action_id = %envelope.id,
            source = ?envelope.source,
            severity = ?envelope.severity,
            action = ?envelope.action,
            "Action emitted"
        );
        Ok(())
    }
}

/// Spawn the dispatch task draining the action channel into the actuator
pub fn spawn_dispatcher(
    mut action_rx: broadcast::Receiver<ActionEnvelope>,
    actuator: Arc<dyn Actuator>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match action_rx.recv().await {
                Ok(envelope) => {
                    if let Err(e) = actuator.deliver(&envelope).await {
                        tracing::error!(
                            action_id = %envelope.id,
                            action = ?envelope.action,
                            error = %e,
                            "Action delivery failed"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Action dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
