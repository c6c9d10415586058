//! # Expiry Sweeper
//!
//! Background task that periodically drops expired tokens from the store.
//! Only spawned when a sweep interval is configured; without it the
//! collection grows for the life of the deployment.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tollgate_core::Clock;
use tollgate_store::TokenStore;

use crate::middleware::metrics;

/// Spawn a sweeper that runs every `every`. The first sweep happens one
/// full interval after spawning.
pub fn spawn_sweeper(store: TokenStore, clock: Arc<dyn Clock>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(&store, clock.as_ref()).await;
        }
    })
}

/// Run one sweep, logging rather than propagating failures so the task
/// keeps running through transient store outages.
pub async fn sweep_once(store: &TokenStore, clock: &dyn Clock) -> usize {
    match store.sweep_expired(clock.now_millis()).await {
        Ok(removed) => {
            metrics::record_stored(store.len());
            removed
        }
        Err(err) => {
            tracing::error!(error = %err, "expired token sweep failed");
            0
        }
    }
}
