/// Periodic market status publisher
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::session::MarketScheduleCalculator;
use crate::error::{FeiraError, Result};
use crate::types::MarketStatus;

/// Recomputes the market status every `period` and publishes it on a watch channel
pub struct CountdownTicker {
    rx: watch::Receiver<MarketStatus>,
    stop: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl CountdownTicker {
    /// Must be called inside a tokio runtime
    pub fn spawn(calculator: Arc<MarketScheduleCalculator>, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(FeiraError::InvalidParameter(
                "Ticker period must be positive".to_string(),
            ));
        }

        let initial = calculator.current_status();
        let (tx, rx) = watch::channel(initial);
        let stop = Arc::new(Notify::new());
        let stop_signal = Arc::clone(&stop);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut was_open = initial.is_open;

            loop {
                tokio::select! {
                    _ = stop_signal.notified() => {
                        debug!("Countdown ticker stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        let status = calculator.current_status();

                        if status.is_open != was_open {
                            if status.is_open {
                                info!("Market opened - closes in {}", status.remaining);
                            } else {
                                info!("Market closed - next opening in {}", status.remaining);
                            }
                            was_open = status.is_open;
                        }

                        if tx.send(status).is_err() {
                            debug!("All countdown receivers dropped");
                            break;
                        }
                    }
                }
            }
        });

        Ok(CountdownTicker { rx, stop, handle })
    }

    pub fn subscribe(&self) -> watch::Receiver<MarketStatus> {
        self.rx.clone()
    }

    pub fn latest(&self) -> MarketStatus {
        *self.rx.borrow()
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(self) -> Result<()> {
        self.stop.notify_one();
        self.handle
            .await
            .map_err(|e| FeiraError::TickerStopped(e.to_string()))
    }
}
