use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct GuardMetrics {
    passed: AtomicU64,
    failed: AtomicU64,
    bypassed: AtomicU64,
    fallbacks: AtomicU64,
    specialized_runs: AtomicU64,
}

impl GuardMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&self) {
        self.passed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_specialized_run(&self) {
        self.specialized_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GuardMetricsSnapshot {
        GuardMetricsSnapshot {
            guards_passed: self.passed.load(Ordering::Relaxed),
            guards_failed: self.failed.load(Ordering::Relaxed),
            guards_bypassed: self.bypassed.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            specialized_runs: self.specialized_runs.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardMetricsSnapshot {
    pub guards_passed: u64,
    pub guards_failed: u64,
    pub guards_bypassed: u64,
    pub fallbacks: u64,
    pub specialized_runs: u64,
}
