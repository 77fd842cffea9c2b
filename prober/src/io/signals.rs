//! Operator-initiated shutdown.
//!
//! SIGINT/SIGTERM flip a watch flag that the round driver samples between
//! rounds. In-flight tasks are never cancelled. If the process is still
//! running `grace` after the signal, it exits forcefully.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::exit_codes;

/// Sending half of the shutdown flag.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half of the shutdown flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested. Never resolves if the trigger is
    /// dropped without firing.
    pub async fn requested(&mut self) {
        if self.rx.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Spawn the signal listener.
pub fn listen_for_signals(trigger: ShutdownTrigger, grace: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        warn!("shutting down gracefully, finishing the current round");
        trigger.trigger();

        tokio::time::sleep(grace).await;
        error!("could not shut down gracefully in time, forcefully shutting down");
        std::process::exit(exit_codes::INVALID);
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(err) => {
            warn!(err = %err, "cannot listen for SIGTERM, only SIGINT stops the run");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_is_observed_by_all_receivers() {
        let (trigger, shutdown) = shutdown_channel();
        let mut other = shutdown.clone();
        assert!(!shutdown.is_requested());
        trigger.trigger();
        assert!(shutdown.is_requested());
        other.requested().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_trigger_never_resolves() {
        let (trigger, mut shutdown) = shutdown_channel();
        drop(trigger);
        let waited = tokio::time::timeout(Duration::from_secs(1), shutdown.requested()).await;
        assert!(waited.is_err());
    }
}
