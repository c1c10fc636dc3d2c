use nexis_dash::client::{BatchSource, FetchError};
use nexis_dash::poller::{safe_lock, DashboardState, Poller};
use nexis_dash::types::{NodeStats, RawBatch};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stub source with a controllable delay and failure switch, plus counters
/// for asserting the overlap policy.
#[derive(Clone)]
struct StubSource {
    delay: Duration,
    fail: Arc<AtomicBool>,
    height: Arc<AtomicU64>,
    started: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl StubSource {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail: Arc::new(AtomicBool::new(false)),
            height: Arc::new(AtomicU64::new(1)),
            started: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn parse_error() -> FetchError {
        FetchError::Parse {
            endpoint: "/api/stats",
            source: serde_json::from_str::<serde_json::Value>("not json").unwrap_err(),
        }
    }
}

impl BatchSource for StubSource {
    fn fetch_batch(&self) -> impl Future<Output = Result<RawBatch, FetchError>> + Send {
        let stub = self.clone();
        async move {
            stub.started.fetch_add(1, Ordering::SeqCst);
            let now = stub.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            stub.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(stub.delay).await;
            stub.in_flight.fetch_sub(1, Ordering::SeqCst);

            if stub.fail.load(Ordering::SeqCst) {
                Err(Self::parse_error())
            } else {
                Ok(RawBatch {
                    stats: NodeStats {
                        height: stub.height.load(Ordering::SeqCst),
                        ..NodeStats::default()
                    },
                    ..RawBatch::default()
                })
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn in_flight_cycle_suppresses_timer_firings() {
    // Fetch takes 12s against a 5s interval: the ticks at t=5 and t=10 must
    // not start new fetches.
    let stub = StubSource::new(Duration::from_secs(12));
    let state = Arc::new(Mutex::new(DashboardState::default()));
    let poller = Poller::new(stub.clone(), Duration::from_secs(5), Arc::clone(&state));

    let handle = tokio::spawn(poller.run());

    tokio::time::sleep(Duration::from_secs(1)).await; // t=1
    assert_eq!(stub.started.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(10)).await; // t=11, past two ticks
    assert_eq!(stub.started.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(5)).await; // t=16: cycle done at 12, tick at 15
    assert_eq!(stub.started.load(Ordering::SeqCst), 2);
    assert_eq!(stub.max_in_flight.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn cycles_never_overlap_even_when_fetch_is_slow() {
    let stub = StubSource::new(Duration::from_secs(30));
    let state = Arc::new(Mutex::new(DashboardState::default()));
    let poller = Poller::new(stub.clone(), Duration::from_secs(1), Arc::clone(&state));

    let handle = tokio::spawn(poller.run());
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(stub.max_in_flight.load(Ordering::SeqCst), 1);
    // Roughly one cycle per 30s of virtual time, never one per tick.
    assert!(stub.started.load(Ordering::SeqCst) <= 5);

    handle.abort();
}

#[tokio::test]
async fn failed_batch_leaves_snapshot_unchanged() {
    let stub = StubSource::new(Duration::ZERO);
    let state = Arc::new(Mutex::new(DashboardState::default()));
    let poller = Poller::new(stub.clone(), Duration::from_secs(5), Arc::clone(&state));

    stub.height.store(7, Ordering::SeqCst);
    poller.run_cycle().await;
    let good = safe_lock(&state).snapshot.clone().unwrap();
    assert_eq!(good.stats.height, 7);

    // A later failing cycle must not touch the published snapshot.
    stub.fail.store(true, Ordering::SeqCst);
    stub.height.store(9, Ordering::SeqCst);
    poller.run_cycle().await;

    let state_guard = safe_lock(&state);
    assert_eq!(state_guard.snapshot.as_ref().unwrap(), &good);
    assert_eq!(state_guard.cycles_completed, 1);
    assert!(state_guard.last_error.is_some());
}

#[tokio::test]
async fn next_tick_is_the_retry_mechanism() {
    let stub = StubSource::new(Duration::ZERO);
    let state = Arc::new(Mutex::new(DashboardState::default()));
    let poller = Poller::new(stub.clone(), Duration::from_secs(5), Arc::clone(&state));

    stub.fail.store(true, Ordering::SeqCst);
    poller.run_cycle().await;
    assert!(safe_lock(&state).snapshot.is_none());
    assert!(safe_lock(&state).last_error.is_some());

    // The next scheduled cycle succeeds and clears the error.
    stub.fail.store(false, Ordering::SeqCst);
    stub.height.store(3, Ordering::SeqCst);
    poller.run_cycle().await;

    let state_guard = safe_lock(&state);
    assert_eq!(state_guard.snapshot.as_ref().unwrap().stats.height, 3);
    assert!(state_guard.last_error.is_none());
    assert!(state_guard.last_updated.is_some());
}

#[tokio::test]
async fn load_series_carries_across_cycles() {
    let stub = StubSource::new(Duration::ZERO);
    let state = Arc::new(Mutex::new(DashboardState::default()));
    let poller = Poller::new(stub.clone(), Duration::from_secs(5), Arc::clone(&state));

    for _ in 0..3 {
        poller.run_cycle().await;
    }

    let state_guard = safe_lock(&state);
    assert_eq!(state_guard.cycles_completed, 3);
    assert_eq!(
        state_guard.snapshot.as_ref().unwrap().load_series.len(),
        3
    );
}

#[tokio::test]
async fn error_message_names_the_failing_endpoint() {
    let stub = StubSource::new(Duration::ZERO);
    stub.fail.store(true, Ordering::SeqCst);
    let state = Arc::new(Mutex::new(DashboardState::default()));
    let poller = Poller::new(stub, Duration::from_secs(5), Arc::clone(&state));

    poller.run_cycle().await;
    let error = safe_lock(&state).last_error.clone().unwrap();
    assert!(error.contains("/api/stats"), "unexpected error: {error}");
}
