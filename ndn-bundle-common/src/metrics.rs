//! Metrics collection for the bundle library.
//!
//! Lightweight atomic counters and gauges, aggregated per process and shared
//! across validators and faces.

use std::sync::atomic::{AtomicU64, Ordering};

/* ---------------------------------------------------------------- *
 * Simple Counter
 * ---------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

impl Clone for Counter {
    fn clone(&self) -> Self {
        let c = Counter::new();
        c.value.store(self.value.load(Ordering::Relaxed), Ordering::Relaxed);
        c
    }
}

/* ---------------------------------------------------------------- *
 * Gauge
 * ---------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Clone for Gauge {
    fn clone(&self) -> Self {
        let g = Gauge::new();
        g.value.store(self.value.load(Ordering::Relaxed), Ordering::Relaxed);
        g
    }
}

/* ---------------------------------------------------------------- *
 * Aggregate metrics for the bundle subsystem
 * ---------------------------------------------------------------- */

#[derive(Debug, Default, Clone)]
pub struct BundleMetrics {
    // Certificate cache
    pub cache_hits: Counter,
    pub cache_misses: Counter,
    pub cache_inserts: Counter,
    pub cache_evictions: Counter,
    pub cache_size: Gauge,

    // Bundle consumer
    pub bundle_interests_sent: Counter,
    pub bundle_segments_received: Counter,
    pub bundle_fallbacks: Counter,

    // Direct certificate fetch
    pub cert_interests_sent: Counter,
    pub cert_retries: Counter,

    // Validation outcomes
    pub validations_succeeded: Counter,
    pub validations_failed: Counter,
}

impl BundleMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}
