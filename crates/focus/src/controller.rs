//! Async driver that feeds a [`FocusTimer`] one tick per period.
//!
//! A background tick task exists only while the timer is running. Pausing,
//! resetting, exiting, completing and dropping the controller all cancel it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{FocusError, FocusPhase, FocusSession, FocusSnapshot, FocusTimer};

const TICK_PERIOD: Duration = Duration::from_secs(1);

struct Inner {
    timer: FocusTimer,
    ticker: Option<CancellationToken>,
}

impl Inner {
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

pub struct FocusController {
    inner: Arc<Mutex<Inner>>,
    updates: Arc<watch::Sender<FocusSnapshot>>,
    shutdown: CancellationToken,
    period: Duration,
}

impl FocusController {
    pub fn new(timer: FocusTimer) -> Self {
        Self::with_period(timer, TICK_PERIOD)
    }

    pub fn with_period(timer: FocusTimer, period: Duration) -> Self {
        let (updates, _) = watch::channel(timer.snapshot());
        Self {
            inner: Arc::new(Mutex::new(Inner {
                timer,
                ticker: None,
            })),
            updates: Arc::new(updates),
            shutdown: CancellationToken::new(),
            period,
        }
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FocusSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> FocusSnapshot {
        self.inner.lock().await.timer.snapshot()
    }

    /// Whether a tick task is currently live.
    pub async fn is_ticking(&self) -> bool {
        self.inner
            .lock()
            .await
            .ticker
            .as_ref()
            .is_some_and(|ticker| !ticker.is_cancelled())
    }

    pub async fn enter_focus(&self, task_id: impl Into<String>) -> Result<(), FocusError> {
        let mut inner = self.inner.lock().await;
        inner.timer.enter_focus(task_id)?;
        self.publish(&inner.timer);
        Ok(())
    }

    pub async fn toggle(&self) -> Result<FocusPhase, FocusError> {
        let mut inner = self.inner.lock().await;
        let phase = inner.timer.toggle()?;

        match phase {
            FocusPhase::Running => {
                let ticker = self.shutdown.child_token();
                inner.ticker = Some(ticker.clone());
                self.spawn_ticker(ticker);
            }
            _ => inner.stop_ticker(),
        }

        self.publish(&inner.timer);
        Ok(phase)
    }

    pub async fn reset(&self) -> Result<(), FocusError> {
        let mut inner = self.inner.lock().await;
        inner.timer.reset()?;
        inner.stop_ticker();
        self.publish(&inner.timer);
        Ok(())
    }

    pub async fn exit(&self) -> Option<FocusSession> {
        let mut inner = self.inner.lock().await;
        inner.stop_ticker();
        let session = inner.timer.exit();
        self.publish(&inner.timer);
        session
    }

    fn publish(&self, timer: &FocusTimer) {
        self.updates.send_replace(timer.snapshot());
    }

    fn spawn_ticker(&self, ticker: CancellationToken) {
        let inner = Arc::clone(&self.inner);
        let updates = Arc::clone(&self.updates);
        let period = self.period;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let mut guard = inner.lock().await;
                // Cancellation happens under the lock, so re-check before ticking.
                if ticker.is_cancelled() {
                    break;
                }

                let phase = guard.timer.tick();
                updates.send_replace(guard.timer.snapshot());

                match phase {
                    Ok(FocusPhase::Running) => {}
                    Ok(_) => {
                        info!(task = ?guard.timer.task_id(), "focus session completed");
                        guard.stop_ticker();
                        break;
                    }
                    Err(error) => {
                        debug!(%error, "focus ticker stopping");
                        guard.stop_ticker();
                        break;
                    }
                }
            }
        });
    }
}

impl Drop for FocusController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Render seconds as `m:ss`.
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
