use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::LocationSample;

use super::loop_worker::sampling_loop;
use super::provider::LocationProvider;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Starts location subscriptions against one provider.
#[derive(Clone)]
pub struct LocationSampler {
    provider: Arc<dyn LocationProvider>,
    interval: Duration,
}

impl LocationSampler {
    pub fn new(provider: Arc<dyn LocationProvider>, interval: Duration) -> Self {
        Self { provider, interval }
    }

    /// Spawn the sampling loop. Must be called inside a tokio runtime.
    pub fn subscribe(&self) -> LocationSubscription {
        let cancel_token = CancellationToken::new();
        let (tx, rx) = watch::channel(None);

        let handle = tokio::spawn(sampling_loop(
            Arc::clone(&self.provider),
            self.interval,
            tx,
            cancel_token.clone(),
        ));

        info!("Location sampling started every {:?}", self.interval);
        LocationSubscription {
            rx,
            cancel_token,
            handle: Some(handle),
        }
    }
}

/// A live location feed. Dropping it cancels the feed.
pub struct LocationSubscription {
    rx: watch::Receiver<Option<LocationSample>>,
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LocationSubscription {
    pub fn latest(&self) -> Option<LocationSample> {
        *self.rx.borrow()
    }

    /// Wait for the next fix. `None` once the feed has ended.
    pub async fn next_sample(&mut self) -> Option<LocationSample> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(sample) = *self.rx.borrow_and_update() {
                return Some(sample);
            }
        }
    }

    /// False once the loop has exited, either cancelled or because location was refused.
    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Cancel the feed and wait for the provider to be released.
    pub async fn unsubscribe(mut self) -> Result<()> {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("location sampling task failed to join")?;
        }
        info!("Location sampling stopped");
        Ok(())
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
