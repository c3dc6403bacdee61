use std::{sync::Arc, time::Duration};

use alloy_primitives::Address;
use async_trait::async_trait;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError, Receiver, Sender},
        oneshot,
    },
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, trace, warn};

use crate::config::SafeConfig;

/// Connected wallet provider as reported by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub name: String,
    pub account: Option<Address>,
    /// Execution-layer address of `account`, once the provider knows it.
    pub internal_account: Option<Address>,
    pub network: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("provider unavailable: {0}")]
pub struct ProviderUnavailable(pub String);

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ProviderInfoSource: Send + Sync + 'static {
    async fn provider_info(&self) -> Result<ProviderInfo, ProviderUnavailable>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The wallet switched away from the network it was connected with.
    NetworkChanged { expected: u64, actual: u64 },
    /// Account or network changed, provider state should be fetched again.
    Refetch { provider: String },
}

struct RunningWatch {
    handle: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

/// Periodically compares the connected provider with the one it was started for.
pub struct ProviderWatcher {
    period: Duration,
    running: Option<RunningWatch>,
}

impl ProviderWatcher {
    pub fn new(period: Duration) -> Self {
        Self { period, running: None }
    }

    /// Watcher polling every `provider_watch_interval_ms` of `config`.
    pub fn from_config(config: &SafeConfig) -> Self {
        Self::new(config.provider_watch_interval())
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts watching `current`, stopping any earlier watch. Events arrive on the returned
    /// receiver, which closes once the watch ends.
    pub fn start<S>(&mut self, source: Arc<S>, current: ProviderInfo) -> Receiver<ProviderEvent>
    where
        S: ProviderInfoSource + ?Sized,
    {
        self.stop();

        let (events_tx, events_rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(watch(self.period, source, current, events_tx, stop_rx));

        self.running = Some(RunningWatch { handle, stop: stop_tx });
        events_rx
    }

    pub fn stop(&mut self) {
        if let Some(RunningWatch { handle, stop }) = self.running.take() {
            if stop.send(()).is_err() {
                trace!(target: "safe::watcher", "Watch already finished");
            }
            drop(handle);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }
}

impl Drop for ProviderWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn watch<S>(
    period: Duration,
    source: Arc<S>,
    current: ProviderInfo,
    events: Sender<ProviderEvent>,
    mut stop: oneshot::Receiver<()>,
) where
    S: ProviderInfoSource + ?Sized,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last: Option<ProviderInfo> = None;

    loop {
        tokio::select! {
            _ = &mut stop => {
                debug!(target: "safe::watcher", provider = %current.name, "Provider watch stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        if last.as_ref().is_some_and(|info| info.internal_account.is_some()) {
            debug!(target: "safe::watcher", provider = %current.name, "Execution-layer account known, ending watch");
            return;
        }

        let info = match source.provider_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!(target: "safe::watcher", provider = %current.name, error = %e, "Failed to read provider info");
                continue;
            }
        };

        let network_changed = current.network != info.network;
        if network_changed {
            let event = ProviderEvent::NetworkChanged { expected: current.network, actual: info.network };
            if !emit(&events, event) {
                return;
            }
        }

        if network_changed || current.account != info.account {
            let event = ProviderEvent::Refetch { provider: current.name.clone() };
            if !emit(&events, event) {
                return;
            }
        }

        last = Some(info);
    }
}

/// Sends `event`, dropping it if the receiver lags. Returns false once the receiver is gone.
fn emit(events: &Sender<ProviderEvent>, event: ProviderEvent) -> bool {
    match events.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            warn!(target: "safe::watcher", ?event, "Event channel full, dropping event");
            true
        }
        Err(TrySendError::Closed(_)) => {
            debug!(target: "safe::watcher", "Event receiver dropped, ending watch");
            false
        }
    }
}
