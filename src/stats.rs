use {super::*, dashmap::DashMap, parking_lot::Mutex};

/// Sliding window over (time, difficulty) samples used for hashrate
/// estimation.
const HASH_RATE_WINDOW: Duration = Duration::from_secs(600);

fn prune(samples: &mut VecDeque<(Instant, f64)>, now: Instant) {
    while let Some((when, _)) = samples.front() {
        if now.duration_since(*when) > HASH_RATE_WINDOW {
            samples.pop_front();
        } else {
            break;
        }
    }
}

fn windowed_hash_rate(samples: &Mutex<VecDeque<(Instant, f64)>>) -> HashRate {
    let mut samples = samples.lock();
    prune(&mut samples, Instant::now());
    let total: f64 = samples.iter().map(|(_, difficulty)| difficulty).sum();
    HashRate::estimate(total, HASH_RATE_WINDOW)
}

/// Per-worker record. Multiple concurrent connections may authorize the same
/// worker name; the record stays active while at least one of them is alive
/// and is never destroyed during the process lifetime.
pub(crate) struct WorkerStats {
    valid: AtomicU64,
    invalid: AtomicU64,
    stale: AtomicU64,
    connections: AtomicU64,
    active: AtomicBool,
    connected_at: u64,
    last_share: Mutex<Option<u64>>,
    samples: Mutex<VecDeque<(Instant, f64)>>,
}

impl WorkerStats {
    fn new() -> Self {
        Self {
            valid: AtomicU64::new(0),
            invalid: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            connections: AtomicU64::new(0),
            active: AtomicBool::new(false),
            connected_at: unix_now(),
            last_share: Mutex::new(None),
            samples: Mutex::new(VecDeque::new()),
        }
    }

    fn attach(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Relaxed);
    }

    fn detach(&self) {
        let previous = self.connections.fetch_sub(1, Ordering::Relaxed);
        if previous <= 1 {
            self.active.store(false, Ordering::Relaxed);
        }
    }

    fn record_valid(&self, difficulty: f64) {
        self.valid.fetch_add(1, Ordering::Relaxed);
        *self.last_share.lock() = Some(unix_now());

        let mut samples = self.samples.lock();
        let now = Instant::now();
        prune(&mut samples, now);
        samples.push_back((now, difficulty));
    }

    fn record_invalid(&self) {
        self.invalid.fetch_add(1, Ordering::Relaxed);
    }

    fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub(crate) fn hash_rate(&self) -> HashRate {
        windowed_hash_rate(&self.samples)
    }

    fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            shares: ShareCounts {
                valid: self.valid.load(Ordering::Relaxed),
                invalid: self.invalid.load(Ordering::Relaxed),
                stale: self.stale.load(Ordering::Relaxed),
            },
            hashrate: self.hash_rate().0,
            last_share_time: *self.last_share.lock(),
            connection_time: self.connected_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShareCounts {
    pub valid: u64,
    pub invalid: u64,
    pub stale: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerSnapshot {
    pub shares: ShareCounts,
    pub hashrate: f64,
    pub last_share_time: Option<u64>,
    pub connection_time: u64,
}

/// Read-only pool summary consumed by the statistics dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub hashrate: f64,
    pub total_shares: u64,
    pub valid_shares: u64,
    pub invalid_shares: u64,
    pub stale_shares: u64,
    pub blocks_found: u64,
    pub connected_miners: u64,
    pub uptime_seconds: u64,
}

/// Process-wide statistics store. Owns every worker record; connections and
/// the validator talk to it through methods, never through shared fields.
pub(crate) struct Stats {
    started: Instant,
    valid: AtomicU64,
    invalid: AtomicU64,
    stale: AtomicU64,
    blocks_found: AtomicU64,
    blocks_rejected: AtomicU64,
    connections: AtomicU64,
    samples: Mutex<VecDeque<(Instant, f64)>>,
    workers: DashMap<String, Arc<WorkerStats>>,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self {
            started: Instant::now(),
            valid: AtomicU64::new(0),
            invalid: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            blocks_found: AtomicU64::new(0),
            blocks_rejected: AtomicU64::new(0),
            connections: AtomicU64::new(0),
            samples: Mutex::new(VecDeque::new()),
            workers: DashMap::new(),
        }
    }

    pub(crate) fn connection_opened(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_closed(&self) {
        self.connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn total_connections(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    pub(crate) fn worker_connected(&self, workername: &str) -> Arc<WorkerStats> {
        let worker = self
            .workers
            .entry(workername.to_string())
            .or_insert_with(|| Arc::new(WorkerStats::new()))
            .clone();
        worker.attach();
        worker
    }

    pub(crate) fn worker_disconnected(&self, workername: &str) {
        if let Some(worker) = self.workers.get(workername) {
            worker.detach();
        }
    }

    pub(crate) fn record_valid(&self, worker: &WorkerStats, difficulty: f64) {
        self.valid.fetch_add(1, Ordering::Relaxed);
        worker.record_valid(difficulty);

        let mut samples = self.samples.lock();
        let now = Instant::now();
        prune(&mut samples, now);
        samples.push_back((now, difficulty));
    }

    pub(crate) fn record_invalid(&self, worker: Option<&WorkerStats>) {
        self.invalid.fetch_add(1, Ordering::Relaxed);
        if let Some(worker) = worker {
            worker.record_invalid();
        }
    }

    pub(crate) fn record_stale(&self, worker: Option<&WorkerStats>) {
        self.stale.fetch_add(1, Ordering::Relaxed);
        if let Some(worker) = worker {
            worker.record_stale();
        }
    }

    pub(crate) fn add_block_found(&self) {
        self.blocks_found.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_block_rejected(&self) {
        self.blocks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn blocks_found(&self) -> u64 {
        self.blocks_found.load(Ordering::Relaxed)
    }

    pub(crate) fn blocks_rejected(&self) -> u64 {
        self.blocks_rejected.load(Ordering::Relaxed)
    }

    pub(crate) fn hash_rate(&self) -> HashRate {
        windowed_hash_rate(&self.samples)
    }

    pub(crate) fn snapshot(&self) -> PoolSnapshot {
        let valid = self.valid.load(Ordering::Relaxed);
        let invalid = self.invalid.load(Ordering::Relaxed);
        let stale = self.stale.load(Ordering::Relaxed);

        PoolSnapshot {
            hashrate: self.hash_rate().0,
            total_shares: valid + invalid + stale,
            valid_shares: valid,
            invalid_shares: invalid,
            stale_shares: stale,
            blocks_found: self.blocks_found(),
            connected_miners: self
                .workers
                .iter()
                .filter(|worker| worker.is_active())
                .count() as u64,
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }

    pub(crate) fn worker_snapshots(&self) -> BTreeMap<String, WorkerSnapshot> {
        self.workers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::hashrate::HASHES_PER_DIFF_1};

    #[test]
    fn fresh_stats_are_zero() {
        let stats = Stats::new();
        let snapshot = stats.snapshot();

        assert_eq!(snapshot.total_shares, 0);
        assert_eq!(snapshot.valid_shares, 0);
        assert_eq!(snapshot.blocks_found, 0);
        assert_eq!(snapshot.connected_miners, 0);
        assert_eq!(snapshot.hashrate, 0.0);
    }

    #[test]
    fn share_counters_split_by_classification() {
        let stats = Stats::new();
        let worker = stats.worker_connected("worker.1");

        stats.record_valid(&worker, 10.0);
        stats.record_valid(&worker, 10.0);
        stats.record_invalid(Some(&worker));
        stats.record_stale(Some(&worker));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.valid_shares, 2);
        assert_eq!(snapshot.invalid_shares, 1);
        assert_eq!(snapshot.stale_shares, 1);
        assert_eq!(snapshot.total_shares, 4);

        let workers = stats.worker_snapshots();
        let worker = &workers["worker.1"];
        assert_eq!(worker.shares.valid, 2);
        assert_eq!(worker.shares.invalid, 1);
        assert_eq!(worker.shares.stale, 1);
        assert!(worker.last_share_time.is_some());
    }

    #[test]
    fn hashrate_reflects_window_samples() {
        let stats = Stats::new();
        let worker = stats.worker_connected("worker.1");

        stats.record_valid(&worker, 600.0);

        // One diff-600 share in a 600 s window is one diff-unit per second.
        let rate = stats.hash_rate();
        assert_eq!(rate.0, HASHES_PER_DIFF_1 as f64);
        assert_eq!(worker.hash_rate().0, HASHES_PER_DIFF_1 as f64);
    }

    #[test]
    fn worker_stays_active_while_any_connection_remains() {
        let stats = Stats::new();

        let first = stats.worker_connected("worker.1");
        let _second = stats.worker_connected("worker.1");
        assert!(first.is_active());
        assert_eq!(stats.snapshot().connected_miners, 1);

        stats.worker_disconnected("worker.1");
        assert!(first.is_active(), "one connection still references it");

        stats.worker_disconnected("worker.1");
        assert!(!first.is_active());
        assert_eq!(stats.snapshot().connected_miners, 0);
    }

    #[test]
    fn worker_record_survives_disconnect() {
        let stats = Stats::new();
        let worker = stats.worker_connected("worker.1");
        stats.record_valid(&worker, 1.0);
        stats.worker_disconnected("worker.1");

        let workers = stats.worker_snapshots();
        assert_eq!(workers["worker.1"].shares.valid, 1);
    }

    #[test]
    fn block_counters() {
        let stats = Stats::new();
        stats.add_block_found();
        stats.add_block_rejected();
        stats.add_block_found();

        assert_eq!(stats.blocks_found(), 2);
        assert_eq!(stats.blocks_rejected(), 1);
        assert_eq!(stats.snapshot().blocks_found, 2);
    }

    #[test]
    fn connection_counter() {
        let stats = Stats::new();
        stats.connection_opened();
        stats.connection_opened();
        assert_eq!(stats.total_connections(), 2);
        stats.connection_closed();
        assert_eq!(stats.total_connections(), 1);
    }

    #[test]
    fn prune_drops_expired_samples() {
        let mut samples = VecDeque::new();
        let now = Instant::now();
        samples.push_back((now - Duration::from_secs(700), 5.0));
        samples.push_back((now - Duration::from_secs(10), 7.0));

        prune(&mut samples, now);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].1, 7.0);
    }

    #[test]
    fn snapshot_serializes_with_expected_fields() {
        let stats = Stats::new();
        let value = serde_json::to_value(stats.snapshot()).unwrap();

        for field in [
            "hashrate",
            "total_shares",
            "valid_shares",
            "invalid_shares",
            "stale_shares",
            "blocks_found",
            "connected_miners",
            "uptime_seconds",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }
}
