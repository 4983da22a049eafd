use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::LocationSample;

use super::provider::{LocationError, LocationProvider};

// Sampling runs every few seconds for the whole time the desk is open.
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub async fn sampling_loop(
    provider: Arc<dyn LocationProvider>,
    interval: Duration,
    tx: watch::Sender<Option<LocationSample>>,
    cancel_token: CancellationToken,
) {
    match open_provider(&provider).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            log_warn!("{err}; continuing without location");
            return;
        }
        Err(err) => {
            log_error!("location provider open failed: {err:?}");
            return;
        }
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("location sampling shutting down");
                break;
            }
            _ = ticker.tick() => {
                match sample_once(&provider).await {
                    Ok(Ok(sample)) => {
                        tx.send_replace(Some(sample));
                    }
                    Ok(Err(LocationError::PermissionDenied)) => {
                        log_warn!("location permission revoked; clearing last sample");
                        tx.send_replace(None);
                        break;
                    }
                    Ok(Err(err)) => log_warn!("{err}; keeping previous sample"),
                    Err(err) => log_error!("location sample failed: {err:?}"),
                }
            }
        }
    }

    provider.close();
}

async fn open_provider(provider: &Arc<dyn LocationProvider>) -> Result<Result<(), LocationError>> {
    let provider = Arc::clone(provider);
    tokio::task::spawn_blocking(move || provider.open())
        .await
        .context("location open worker join failed")
}

async fn sample_once(
    provider: &Arc<dyn LocationProvider>,
) -> Result<Result<LocationSample, LocationError>> {
    let provider = Arc::clone(provider);
    let fix = tokio::task::spawn_blocking(move || provider.current_position())
        .await
        .context("location sample worker join failed")?;

    Ok(fix.and_then(|fix| {
        if !fix.coordinates.is_valid() {
            return Err(LocationError::Unavailable(format!(
                "discarding out-of-range fix {:?}",
                fix.coordinates
            )));
        }
        Ok(LocationSample {
            coordinates: fix.coordinates,
            accuracy_meters: fix.accuracy_meters,
            sampled_at: Utc::now(),
        })
    }))
}
