//! Connectivity monitor
//!
//! Checks the remote gateway on an interval and replays the sync queue when
//! it becomes reachable: once at startup if the remote is already online,
//! and once on every offline → online transition. Staying online does not
//! trigger further drains.
//!
//! A reconnection drain runs as its own task. Dropping the monitor's future
//! (on shutdown) does not cancel it; [`ConnectivityMonitor::wait_for_drain`]
//! waits for it to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use erpsync_core::ports::IRemoteGateway;

use crate::orchestrator::SyncOrchestrator;
use crate::replay::{DrainMode, DrainOutcome};
use crate::SyncError;

type DrainTask = JoinHandle<Result<DrainOutcome, SyncError>>;

/// What one check observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// First check succeeded, or the remote came back after being offline
    CameOnline,
    /// First check failed, or the remote stopped answering
    WentOffline,
    /// Same state as the previous check
    Unchanged,
}

/// Watches remote reachability and drains the queue on reconnection
pub struct ConnectivityMonitor {
    gateway: Arc<dyn IRemoteGateway>,
    orchestrator: Arc<SyncOrchestrator>,
    interval: Duration,
    /// `None` until the first check
    last_online: Mutex<Option<bool>>,
    /// Reconnection drain not yet awaited to completion
    drain_task: Mutex<Option<DrainTask>>,
}

impl ConnectivityMonitor {
    pub fn new(
        gateway: Arc<dyn IRemoteGateway>,
        orchestrator: Arc<SyncOrchestrator>,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            orchestrator,
            interval,
            last_online: Mutex::new(None),
            drain_task: Mutex::new(None),
        }
    }

    /// Last observed state, `None` before the first check
    pub async fn is_online(&self) -> Option<bool> {
        *self.last_online.lock().await
    }

    /// Checks once and drains the queue if the remote just came online
    pub async fn check_once(&self) -> ConnectivityEvent {
        let online = self.gateway.is_reachable().await;

        let event = {
            let mut last = self.last_online.lock().await;
            let event = match (*last, online) {
                (Some(true), true) | (Some(false), false) => ConnectivityEvent::Unchanged,
                (_, true) => ConnectivityEvent::CameOnline,
                (_, false) => ConnectivityEvent::WentOffline,
            };
            *last = Some(online);
            event
        };

        match event {
            ConnectivityEvent::CameOnline => {
                info!("Remote ERP reachable, replaying sync queue");
                let mut slot = self.drain_task.lock().await;
                let orchestrator = Arc::clone(&self.orchestrator);
                let task = slot.insert(tokio::spawn(async move {
                    orchestrator.attempt_queue_drain(DrainMode::Automatic).await
                }));
                // Awaited through the slot so a dropped check leaves the
                // handle for wait_for_drain
                let result = task.await;
                *slot = None;
                log_drain_result(result);
            }
            ConnectivityEvent::WentOffline => {
                warn!("Remote ERP unreachable, mutations will be queued");
            }
            ConnectivityEvent::Unchanged => {}
        }

        event
    }

    /// Waits up to `grace` for a reconnection drain left running
    ///
    /// Returns false if the drain was still running when `grace` elapsed; it
    /// is then aborted, and its claimed item becomes replayable once the
    /// claim expires.
    pub async fn wait_for_drain(&self, grace: Duration) -> bool {
        let mut slot = self.drain_task.lock().await;
        let Some(task) = slot.as_mut() else {
            return true;
        };

        info!("Waiting for the running queue drain to finish");
        match tokio::time::timeout(grace, &mut *task).await {
            Ok(result) => {
                *slot = None;
                log_drain_result(result);
                true
            }
            Err(_) => {
                task.abort();
                *slot = None;
                warn!(
                    grace_secs = grace.as_secs(),
                    "Queue drain still running, aborted"
                );
                false
            }
        }
    }

    /// Checks forever at the configured interval
    ///
    /// The first check runs immediately. Stop the monitor by dropping the
    /// future (e.g. from a `tokio::select!` on a shutdown signal), then call
    /// [`wait_for_drain`](Self::wait_for_drain).
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Connectivity monitor started"
        );

        // interval() panics on a zero period
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(100)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.check_once().await;
        }
    }
}

fn log_drain_result(result: Result<Result<DrainOutcome, SyncError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(DrainOutcome::Completed(report))) => {
            info!(
                committed = report.committed,
                failed = report.failed,
                parked = report.parked,
                skipped = report.skipped,
                contended = report.contended,
                "Reconnection drain finished"
            );
        }
        Ok(Ok(DrainOutcome::AlreadyRunning)) => {
            info!("Queue drain already in progress");
        }
        Ok(Err(e)) => warn!(error = %e, "Reconnection drain failed"),
        Err(e) => warn!(error = %e, "Reconnection drain task failed"),
    }
}
