use crate::domain::session::value_object::seconds_until;
use crate::ports::clock_port::Clock;
use crate::telemetry;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// One-second ticker publishing the held token's remaining seconds.
///
/// Runs only while a token is held: `start` replaces any running ticker,
/// `stop` aborts it and publishes `None`, and the ticker ends by itself after
/// publishing 0.
pub struct CountdownTimer {
    tx: Arc<watch::Sender<Option<i64>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CountdownTimer {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<i64>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<i64> {
        *self.tx.borrow()
    }

    /// Must be called from within a Tokio runtime.
    pub fn start(&self, expires_at: DateTime<Utc>, clock: Arc<dyn Clock>) {
        let tx = Arc::clone(&self.tx);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let remaining = seconds_until(expires_at, clock.now());
                tx.send_replace(Some(remaining));
                telemetry::record_token_seconds(remaining);
                if remaining == 0 {
                    debug!("confirmation token countdown reached zero");
                    break;
                }
            }
        });
        if let Some(previous) = self.task.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        self.tx.send_replace(None);
        telemetry::record_token_seconds(0);
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn publishes_remaining_seconds_and_stops_on_request() {
        let clock = clock();
        let timer = CountdownTimer::new();
        let mut rx = timer.subscribe();

        timer.start(clock.now() + ChronoDuration::seconds(60), clock.clone());
        time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), Some(60));
        assert!(timer.is_running());

        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(timer.latest(), None);
    }

    #[tokio::test]
    async fn finishes_after_publishing_zero() {
        let clock = clock();
        let timer = CountdownTimer::new();
        let mut rx = timer.subscribe();

        timer.start(clock.now() - ChronoDuration::seconds(5), clock.clone());
        time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), Some(0));

        for _ in 0..50 {
            if !timer.is_running() {
                break;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!timer.is_running());
    }

    #[tokio::test]
    async fn restart_replaces_previous_ticker() {
        let clock = clock();
        let timer = CountdownTimer::new();
        let mut rx = timer.subscribe();

        timer.start(clock.now() + ChronoDuration::seconds(60), clock.clone());
        timer.start(clock.now() + ChronoDuration::seconds(30), clock.clone());
        time::timeout(Duration::from_secs(2), async {
            loop {
                rx.changed().await.unwrap();
                if *rx.borrow() == Some(30) {
                    break;
                }
            }
        })
        .await
        .unwrap();
        timer.stop();
    }
}
