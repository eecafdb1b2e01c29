/// Request and rewrite counters
use crate::conn::MatchSource;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collector shared by all connections
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Total number of requests handled by the gateway
    pub total_requests: Arc<AtomicU64>,
    /// Requests rewritten by a host rule
    pub host_rewrites: Arc<AtomicU64>,
    /// Requests rewritten by a path rule
    pub path_rewrites: Arc<AtomicU64>,
    /// Requests rewritten through the tracking cookie
    pub cookie_rewrites: Arc<AtomicU64>,
    /// Requests passed on without rewriting
    pub passthrough: Arc<AtomicU64>,
    /// Requests refused with an error page
    pub rejected: Arc<AtomicU64>,
    /// Number of upstream errors
    pub upstream_errors: Arc<AtomicU64>,
    /// Total processing time in microseconds
    pub total_processing_time_us: Arc<AtomicU64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_requests: Arc::new(AtomicU64::new(0)),
            host_rewrites: Arc::new(AtomicU64::new(0)),
            path_rewrites: Arc::new(AtomicU64::new(0)),
            cookie_rewrites: Arc::new(AtomicU64::new(0)),
            passthrough: Arc::new(AtomicU64::new(0)),
            rejected: Arc::new(AtomicU64::new(0)),
            upstream_errors: Arc::new(AtomicU64::new(0)),
            total_processing_time_us: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a finished request
    pub fn record_request(&self, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record which lookup rewrote a request
    pub fn record_rewrite(&self, source: MatchSource) {
        let counter = match source {
            MatchSource::Host => &self.host_rewrites,
            MatchSource::Path => &self.path_rewrites,
            MatchSource::Cookie => &self.cookie_rewrites,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_passthrough(&self) {
        self.passthrough.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let total_time_us = self.total_processing_time_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            host_rewrites: self.host_rewrites.load(Ordering::Relaxed),
            path_rewrites: self.path_rewrites.load(Ordering::Relaxed),
            cookie_rewrites: self.cookie_rewrites.load(Ordering::Relaxed),
            passthrough: self.passthrough.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
            average_processing_time_ms: if total > 0 {
                (total_time_us as f64 / total as f64) / 1000.0
            } else {
                0.0
            },
        }
    }
}

/// Snapshot of current metrics, served by the healthcheck listener
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub host_rewrites: u64,
    pub path_rewrites: u64,
    pub cookie_rewrites: u64,
    pub passthrough: u64,
    pub rejected: u64,
    pub upstream_errors: u64,
    pub average_processing_time_ms: f64,
}

impl MetricsSnapshot {
    pub fn rewrites(&self) -> u64 {
        self.host_rewrites + self.path_rewrites + self.cookie_rewrites
    }
}

/// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
