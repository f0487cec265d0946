use crate::metrics::snapshot::MetricsSnapshot;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct MetricsCollector {
    refreshes_started: Arc<AtomicU64>,
    refreshes_total: Arc<AtomicU64>,
    refreshes_success: Arc<AtomicU64>,
    server_errors: Arc<AtomicU64>,
    connection_errors: Arc<AtomicU64>,
    stats_success: Arc<AtomicU64>,
    stats_failed: Arc<AtomicU64>,
    total_response_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            refreshes_started: Arc::new(AtomicU64::new(0)),
            refreshes_total: Arc::new(AtomicU64::new(0)),
            refreshes_success: Arc::new(AtomicU64::new(0)),
            server_errors: Arc::new(AtomicU64::new(0)),
            connection_errors: Arc::new(AtomicU64::new(0)),
            stats_success: Arc::new(AtomicU64::new(0)),
            stats_failed: Arc::new(AtomicU64::new(0)),
            total_response_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Instant::now()),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counted before any I/O; `refreshes_total` only moves once a cycle ends.
    pub fn record_started(&self) {
        self.refreshes_started.fetch_add(1, Ordering::SeqCst);
    }

    fn record_attempt(&self, duration: Duration) {
        self.refreshes_total.fetch_add(1, Ordering::SeqCst);
        self.total_response_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn record_success(&self, duration: Duration) {
        self.record_attempt(duration);
        self.refreshes_success.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_server_error(&self, duration: Duration) {
        self.record_attempt(duration);
        self.server_errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_connection_error(&self, duration: Duration) {
        self.record_attempt(duration);
        self.connection_errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_stats(&self, ok: bool) {
        if ok {
            self.stats_success.fetch_add(1, Ordering::SeqCst);
        } else {
            self.stats_failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.refreshes_total.load(Ordering::SeqCst);
        let success = self.refreshes_success.load(Ordering::SeqCst);
        let total_time = self.total_response_time_ms.load(Ordering::SeqCst);

        let success_rate = if total > 0 {
            (success as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let avg_response_time_ms = if total > 0 { total_time / total } else { 0 };

        MetricsSnapshot {
            refreshes_started: self.refreshes_started.load(Ordering::SeqCst),
            refreshes_total: total,
            refreshes_success: success,
            server_errors: self.server_errors.load(Ordering::SeqCst),
            connection_errors: self.connection_errors.load(Ordering::SeqCst),
            stats_success: self.stats_success.load(Ordering::SeqCst),
            stats_failed: self.stats_failed.load(Ordering::SeqCst),
            success_rate,
            avg_response_time_ms,
            elapsed_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }
}
