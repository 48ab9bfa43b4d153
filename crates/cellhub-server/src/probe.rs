//! Periodic liveness probe of the companion backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::companion::CompanionClient;

/// Default interval between probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Last known backend status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// No probe has completed yet.
    #[default]
    Unknown,
    Online,
    Offline,
}

/// Background probe task and its status channel.
pub struct StatusProbe {
    rx: watch::Receiver<ProbeStatus>,
    task: JoinHandle<()>,
}

impl StatusProbe {
    /// Start probing now and then every `interval`.
    pub fn spawn(client: CompanionClient, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(ProbeStatus::Unknown);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let status = match client.ping().await {
                    Ok(ping) => {
                        tracing::debug!("Companion {} is {}", client.base_url(), ping.status);
                        ProbeStatus::Online
                    }
                    Err(e) => {
                        tracing::debug!("Companion {} unreachable: {}", client.base_url(), e);
                        ProbeStatus::Offline
                    }
                };
                tx.send_if_modified(|current| {
                    if *current != status {
                        tracing::info!("Companion status changed to {:?}", status);
                        *current = status;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        Self { rx, task }
    }

    /// Current status.
    pub fn status(&self) -> ProbeStatus {
        *self.rx.borrow()
    }

    /// A receiver that observes status changes.
    pub fn subscribe(&self) -> watch::Receiver<ProbeStatus> {
        self.rx.clone()
    }

    /// Stop probing.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}
