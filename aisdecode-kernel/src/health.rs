use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::store::FusionStore;
use crate::subscribers::SubscriberRegistry;

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub sentences_received: u64,
    pub duplicates_dropped: u64,
    pub decode_errors: u64,
    pub merges: u64,
    pub publishes: u64,
    pub vessels_tracked: u32,
    pub vessels_complete: u32,
    pub sessions_connected: u32,
    pub memory_usage_mb: f32,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    duplicates: AtomicU64,
    decode_errors: AtomicU64,
    merges: AtomicU64,
    publishes: AtomicU64,
}

/// Compteurs du pipeline, partagés entre les tâches d'ingestion et le cycle.
#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    counters: Arc<Counters>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn record_received(&self) {
        self.counters.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_merge(&self) {
        self.counters.merges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish(&self) {
        self.counters.publishes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_health(&self, store: &FusionStore, subscribers: &SubscriberRegistry) -> KernelHealth {
        let c = &self.counters;
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            sentences_received: c.received.load(Ordering::Relaxed),
            duplicates_dropped: c.duplicates.load(Ordering::Relaxed),
            decode_errors: c.decode_errors.load(Ordering::Relaxed),
            merges: c.merges.load(Ordering::Relaxed),
            publishes: c.publishes.load(Ordering::Relaxed),
            vessels_tracked: store.len() as u32,
            vessels_complete: store.filter_complete().len() as u32,
            sessions_connected: subscribers.len() as u32,
            memory_usage_mb: get_memory_usage_mb(),
        }
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok());
            if let Some(kb) = rss_kb {
                return kb as f32 / 1024.0;
            }
        }
    }
    0.0
}
