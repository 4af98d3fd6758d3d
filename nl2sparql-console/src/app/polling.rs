use crate::config::{ConsoleSettings, MAX_LOG_LIMIT, MAX_PERF_WINDOW_MINUTES};
use crate::domain::activity::{LogRecord, PerfSnapshot};
use crate::ports::remote_port::{RemoteResult, RemoteServicePort};
use crate::telemetry::{self, outcome};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 16;

/// Latest successful fetch of one feed. Replaced wholesale; failures leave
/// the previous value in place.
pub struct SnapshotStore<T> {
    snapshot: RwLock<Option<T>>,
    version: AtomicU64,
    failures: AtomicU64,
}

impl<T: Clone> SnapshotStore<T> {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
            version: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn get(&self) -> Option<T> {
        self.snapshot.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    fn replace(&self, value: T) {
        *self.snapshot.write() = Some(value);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: Clone> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One fetch of a polled feed; independent of any timer.
#[async_trait]
pub trait Poller: Send + Sync {
    fn feed(&self) -> &'static str;
    async fn poll_once(&self) -> RemoteResult<()>;
}

pub struct LogPoller {
    remote: Arc<dyn RemoteServicePort>,
    limit: AtomicUsize,
    store: SnapshotStore<Vec<LogRecord>>,
}

impl LogPoller {
    pub fn new(remote: Arc<dyn RemoteServicePort>, limit: usize) -> Self {
        Self {
            remote,
            limit: AtomicUsize::new(limit.clamp(1, MAX_LOG_LIMIT)),
            store: SnapshotStore::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit.load(Ordering::SeqCst)
    }

    pub fn set_limit(&self, limit: usize) {
        self.limit.store(limit.clamp(1, MAX_LOG_LIMIT), Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.store.get().unwrap_or_default()
    }

    pub fn store(&self) -> &SnapshotStore<Vec<LogRecord>> {
        &self.store
    }
}

#[async_trait]
impl Poller for LogPoller {
    fn feed(&self) -> &'static str {
        "logs"
    }

    async fn poll_once(&self) -> RemoteResult<()> {
        match self.remote.recent_logs(self.limit()).await {
            Ok(logs) => {
                self.store.replace(logs.items);
                Ok(())
            }
            Err(err) => {
                self.store.record_failure();
                Err(err)
            }
        }
    }
}

pub struct PerfPoller {
    remote: Arc<dyn RemoteServicePort>,
    window_minutes: AtomicU32,
    store: SnapshotStore<PerfSnapshot>,
}

impl PerfPoller {
    pub fn new(remote: Arc<dyn RemoteServicePort>, window_minutes: u32) -> Self {
        Self {
            remote,
            window_minutes: AtomicU32::new(window_minutes.clamp(1, MAX_PERF_WINDOW_MINUTES)),
            store: SnapshotStore::new(),
        }
    }

    pub fn window_minutes(&self) -> u32 {
        self.window_minutes.load(Ordering::SeqCst)
    }

    pub fn set_window_minutes(&self, minutes: u32) {
        self.window_minutes
            .store(minutes.clamp(1, MAX_PERF_WINDOW_MINUTES), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Option<PerfSnapshot> {
        self.store.get()
    }

    pub fn store(&self) -> &SnapshotStore<PerfSnapshot> {
        &self.store
    }
}

#[async_trait]
impl Poller for PerfPoller {
    fn feed(&self) -> &'static str {
        "perf"
    }

    async fn poll_once(&self) -> RemoteResult<()> {
        match self.remote.perf(self.window_minutes()).await {
            Ok(snapshot) => {
                self.store.replace(snapshot);
                Ok(())
            }
            Err(err) => {
                self.store.record_failure();
                Err(err)
            }
        }
    }
}

#[derive(Clone)]
pub struct PollHandle {
    feed: &'static str,
    tx: mpsc::Sender<PollCommand>,
}

impl PollHandle {
    /// Runs one extra fetch through the worker, outside the schedule.
    pub fn notify_refresh(&self, reason: &'static str) {
        if let Err(err) = self.tx.try_send(PollCommand::Trigger(reason)) {
            debug!(feed = self.feed, %reason, %err, "poll trigger queue full");
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(PollCommand::Shutdown).await;
    }
}

enum PollCommand {
    Trigger(&'static str),
    Shutdown,
}

/// Spawns a worker that fetches immediately, then every `interval`, plus on
/// demand. The worker ends on shutdown or when every handle is dropped.
pub fn spawn_poll_task(poller: Arc<dyn Poller>, interval: Duration) -> (PollHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let feed = poller.feed();
    let handle = PollHandle { feed, tx };
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let worker = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                cmd = rx.recv() => {
                    match cmd {
                        Some(PollCommand::Trigger(reason)) => run_poll(poller.as_ref(), reason).await,
                        Some(PollCommand::Shutdown) | None => {
                            info!(feed, "poll worker stopped");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => run_poll(poller.as_ref(), "scheduled").await,
            }
        }
    });
    (handle, worker)
}

async fn run_poll(poller: &dyn Poller, reason: &'static str) {
    let feed = poller.feed();
    match poller.poll_once().await {
        Ok(()) => {
            telemetry::record_poll(feed, reason, outcome::SUCCESS);
            debug!(feed, reason, "poll completed");
        }
        Err(err) => {
            telemetry::record_poll(feed, reason, outcome::REMOTE_FAILURE);
            warn!(feed, reason, %err, "poll failed; keeping previous snapshot");
        }
    }
}

/// The activity-log and performance workers, started and torn down together.
pub struct PollingLoops {
    logs: Arc<LogPoller>,
    perf: Arc<PerfPoller>,
    log_handle: PollHandle,
    perf_handle: PollHandle,
    workers: Vec<JoinHandle<()>>,
}

impl PollingLoops {
    /// Must be called from within a Tokio runtime.
    pub fn start(remote: Arc<dyn RemoteServicePort>, settings: &ConsoleSettings) -> Self {
        let logs = Arc::new(LogPoller::new(Arc::clone(&remote), settings.log_limit));
        let perf = Arc::new(PerfPoller::new(remote, settings.perf_window_minutes));
        let (log_handle, log_worker) = spawn_poll_task(logs.clone(), settings.poll_interval);
        let (perf_handle, perf_worker) = spawn_poll_task(perf.clone(), settings.poll_interval);
        info!(
            interval_ms = settings.poll_interval.as_millis() as u64,
            log_limit = settings.log_limit,
            perf_window = settings.perf_window_minutes,
            "polling loops started"
        );
        Self {
            logs,
            perf,
            log_handle,
            perf_handle,
            workers: vec![log_worker, perf_worker],
        }
    }

    pub fn logs(&self) -> &LogPoller {
        &self.logs
    }

    pub fn perf(&self) -> &PerfPoller {
        &self.perf
    }

    pub fn log_refresh(&self) -> PollHandle {
        self.log_handle.clone()
    }

    pub fn set_log_limit(&self, limit: usize) {
        self.logs.set_limit(limit);
        self.log_handle.notify_refresh("limit_changed");
    }

    pub fn set_perf_window(&self, minutes: u32) {
        self.perf.set_window_minutes(minutes);
        self.perf_handle.notify_refresh("window_changed");
    }

    pub async fn shutdown(self) {
        self.log_handle.shutdown().await;
        self.perf_handle.shutdown().await;
        for worker in self.workers {
            if let Err(err) = worker.await {
                warn!(%err, "poll worker ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{log_record, server_error, wait_until, FakeRemote};
    use crate::domain::activity::LogStatus;
    use crate::ports::remote_port::RecentLogs;

    fn applied_logs() -> RecentLogs {
        RecentLogs {
            items: vec![log_record(LogStatus::Applied, Some("DELETE DATA {}"))],
        }
    }

    #[tokio::test]
    async fn failed_poll_keeps_previous_snapshot() {
        let remote = Arc::new(FakeRemote::new());
        remote.logs.push(Ok(applied_logs()));
        remote.logs.push(Err(server_error("recent_logs")));
        let poller = LogPoller::new(remote.clone(), 20);

        poller.poll_once().await.unwrap();
        assert!(poller.poll_once().await.is_err());

        assert_eq!(poller.records(), applied_logs().items);
        assert_eq!(poller.store().version(), 1);
        assert_eq!(poller.store().failures(), 1);
        assert_eq!(remote.arguments("recent_logs"), vec!["20", "20"]);
    }

    #[tokio::test]
    async fn limits_stay_within_backend_bounds() {
        let remote = Arc::new(FakeRemote::new());
        remote.logs.repeat(Ok(RecentLogs::default()));
        let logs = LogPoller::new(remote.clone(), 0);
        assert_eq!(logs.limit(), 1);

        logs.set_limit(1000);
        assert_eq!(logs.limit(), MAX_LOG_LIMIT);
        logs.poll_once().await.unwrap();
        assert_eq!(remote.arguments("recent_logs"), vec!["500"]);

        let perf = PerfPoller::new(remote, 10_000);
        assert_eq!(perf.window_minutes(), MAX_PERF_WINDOW_MINUTES);
        perf.set_window_minutes(0);
        assert_eq!(perf.window_minutes(), 1);
    }

    #[tokio::test]
    async fn perf_poll_uses_configured_window() {
        let remote = Arc::new(FakeRemote::new());
        remote.perf.repeat(Ok(PerfSnapshot {
            window_minutes: 180,
            ..PerfSnapshot::default()
        }));
        let poller = PerfPoller::new(remote.clone(), 60);
        poller.set_window_minutes(180);

        poller.poll_once().await.unwrap();

        assert_eq!(remote.arguments("perf"), vec!["180"]);
        assert_eq!(poller.snapshot().map(|s| s.window_minutes), Some(180));
    }

    #[tokio::test]
    async fn worker_ticks_immediately_and_on_trigger() {
        let remote = Arc::new(FakeRemote::new());
        remote.logs.repeat(Ok(applied_logs()));
        let poller = Arc::new(LogPoller::new(remote.clone(), 10));
        let (handle, worker) = spawn_poll_task(poller.clone(), Duration::from_secs(3600));

        wait_until(|| remote.count("recent_logs") == 1).await;
        handle.notify_refresh("test");
        wait_until(|| remote.count("recent_logs") == 2).await;
        assert_eq!(poller.records().len(), 1);

        handle.shutdown().await;
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn worker_stops_when_handles_are_dropped() {
        let remote = Arc::new(FakeRemote::new());
        remote.logs.repeat(Ok(RecentLogs::default()));
        let poller = Arc::new(LogPoller::new(remote.clone(), 10));
        let (handle, worker) = spawn_poll_task(poller, Duration::from_secs(3600));

        wait_until(|| remote.count("recent_logs") == 1).await;
        drop(handle);
        time::timeout(Duration::from_secs(2), worker)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn loops_adjust_limits_and_shut_down_together() {
        let remote = Arc::new(FakeRemote::new());
        remote.logs.repeat(Ok(applied_logs()));
        remote.perf.repeat(Err(server_error("perf")));
        let settings = ConsoleSettings {
            poll_interval: Duration::from_secs(3600),
            ..ConsoleSettings::default()
        };
        let loops = PollingLoops::start(remote.clone(), &settings);

        wait_until(|| remote.count("recent_logs") == 1 && remote.count("perf") == 1).await;
        loops.set_log_limit(50);
        wait_until(|| remote.count("recent_logs") == 2).await;
        assert_eq!(remote.arguments("recent_logs").last().map(String::as_str), Some("50"));
        assert!(loops.perf().snapshot().is_none());
        assert_eq!(loops.perf().store().failures(), 1);

        time::timeout(Duration::from_secs(2), loops.shutdown())
            .await
            .unwrap();
    }
}
