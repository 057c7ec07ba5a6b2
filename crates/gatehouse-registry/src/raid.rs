//! Sliding-window raid detection
//!
//! A raid is a burst of joins within a short window, suspected coordinated
//! abuse. The detector is a stateless derivation over the registry: after
//! each join the ingestor asks for the windowed join count and compares it
//! against the threshold.
//!
//! There is deliberately no cooldown: every join that keeps the count at
//! or above the threshold re-triggers the alert, so a sustained raid keeps
//! paging until it stops.

use crate::registry::MemberRegistry;
use chrono::{DateTime, Duration, Utc};
use gatehouse_types::GateAction;

/// Join-rate threshold check over a sliding window
#[derive(Debug, Clone, Copy)]
pub struct RaidDetector {
    window: Duration,
    window_secs: u64,
    threshold: u32,
}

impl RaidDetector {
    /// Create a detector for `threshold` joins inside `window_secs` seconds
    pub fn new(window_secs: u64, threshold: u32) -> Self {
        Self {
            window: Duration::seconds(window_secs as i64),
            window_secs,
            threshold,
        }
    }

    /// Check the join rate after a join event.
    ///
    /// Returns a `RaidDetected` action when the windowed count has reached
    /// the threshold; re-arms immediately.
    pub async fn check(
        &self,
        registry: &MemberRegistry,
        now: DateTime<Utc>,
    ) -> Option<GateAction> {
        let count = registry.count_joins_within(self.window, now).await;
        if count >= self.threshold {
            tracing::warn!(
                count = count,
                window_secs = self.window_secs,
                threshold = self.threshold,
                "Raid detected"
            );
            Some(GateAction::RaidDetected {
                count,
                window_secs: self.window_secs,
            })
        } else {
            None
        }
    }
}
