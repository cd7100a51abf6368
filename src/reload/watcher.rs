//! Long-lived reload loop.
//!
//! # State Transitions
//! ```text
//! Idle → WaitingForSignal   run() starts
//! WaitingForSignal → Reloading   trigger delivered an event
//! Reloading → WaitingForSignal   reload finished (applied, unchanged or failed)
//! WaitingForSignal → Idle   trigger closed or shutdown broadcast
//! ```
//!
//! A failed reload never ends the loop. The current state is published on
//! a watch channel; see [`SignalWatcher::subscribe_state`].

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::controller::{ReloadController, ReloadOutcome};
use super::trigger::ReloadTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    WaitingForSignal,
    Reloading,
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub events: u64,
    pub applied: u64,
    pub unchanged: u64,
    pub failed: u64,
}

/// Runs a [`ReloadController`] once per event from a [`ReloadTrigger`].
pub struct SignalWatcher<T> {
    controller: ReloadController<T>,
    trigger: Box<dyn ReloadTrigger>,
    state_tx: watch::Sender<WatchState>,
    summary: WatchSummary,
}

impl<T> SignalWatcher<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(controller: ReloadController<T>, trigger: Box<dyn ReloadTrigger>) -> Self {
        let (state_tx, _) = watch::channel(WatchState::Idle);
        Self {
            controller,
            trigger,
            state_tx,
            summary: WatchSummary::default(),
        }
    }

    pub fn state(&self) -> WatchState {
        *self.state_tx.borrow()
    }

    /// Follow state transitions after the watcher has been moved into
    /// [`run`](Self::run) or [`spawn`](Self::spawn). The receiver keeps the
    /// final `Idle` once the loop has exited.
    pub fn subscribe_state(&self) -> watch::Receiver<WatchState> {
        self.state_tx.subscribe()
    }

    /// Run until the trigger closes or `shutdown` fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> WatchSummary {
        tracing::info!(
            trigger = %self.trigger.describe(),
            source = self.controller.source_name(),
            key = %self.controller.key(),
            "Reload watcher starting"
        );

        loop {
            self.transition(WatchState::WaitingForSignal);

            let event = tokio::select! {
                event = self.trigger.next_event() => event,
                _ = shutdown.recv() => {
                    tracing::info!("Reload watcher received shutdown signal, exiting loop");
                    break;
                }
            };

            let Some(event) = event else {
                tracing::warn!("Reload trigger closed, watcher exiting");
                break;
            };

            self.transition(WatchState::Reloading);
            self.summary.events += 1;
            tracing::info!(event = ?event, "Received request to reload config");

            match self.controller.reload_once().await {
                Ok(ReloadOutcome::Applied { .. }) => self.summary.applied += 1,
                Ok(ReloadOutcome::Unchanged { .. }) => self.summary.unchanged += 1,
                Err(e) => {
                    self.summary.failed += 1;
                    tracing::error!(
                        error = %e,
                        kind = %e.kind(),
                        "Failed to reload config. Keeping current configuration."
                    );
                }
            }
        }

        self.transition(WatchState::Idle);
        tracing::info!(
            events = self.summary.events,
            applied = self.summary.applied,
            unchanged = self.summary.unchanged,
            failed = self.summary.failed,
            "Reload watcher stopped"
        );
        self.summary
    }

    /// Run the loop on its own task.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<WatchSummary> {
        tokio::spawn(self.run(shutdown))
    }

    fn transition(&self, next: WatchState) {
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            tracing::trace!(from = ?*state, to = ?next, "Watcher state change");
            *state = next;
            true
        });
    }
}
