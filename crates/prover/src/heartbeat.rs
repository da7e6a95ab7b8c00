//! Guardian heartbeat loop (4.5 "Guardian heartbeat"): reports the latest
//! known L1/L2 heights to a central health endpoint on a fixed interval.
//! Failures are logged and never interrupt the main event loop.

use serde::Serialize;
use state_tracker::StateTracker;
use tokio::sync::watch;

#[derive(Debug, Serialize)]
struct Heartbeat {
    latest_l1_block: u64,
    latest_l2_block: u64,
}

pub async fn run(
    endpoint: String,
    interval: std::time::Duration,
    tracker: StateTracker,
    mut stop_receiver: watch::Receiver<bool>,
) {
    let client = reqwest::Client::new();
    let mut timer = tokio::time::interval(interval);

    while !*stop_receiver.borrow_and_update() {
        tokio::select! {
            _ = timer.tick() => {}
            _ = stop_receiver.changed() => break,
        }

        let body = Heartbeat {
            latest_l1_block: tracker.l1_head().number,
            latest_l2_block: tracker.l2_head().number,
        };

        if let Err(err) = client.post(&endpoint).json(&body).send().await {
            tracing::warn!(%err, "guardian heartbeat failed, will retry next tick");
        }
    }

    tracing::info!("stop signal received, guardian heartbeat loop shutting down");
}
