// src/metrics.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct Metrics {
    pub snapshots_total: AtomicU64,
    pub entries_rejected: AtomicU64,
    pub crossed_books: AtomicU64,
    pub pub_depth: AtomicU64,
    pub pub_bbo: AtomicU64,

    // ultra-cheap latency "histogram" for one aggregation pass (us buckets)
    pub agg_lat_b0: AtomicU64,
    pub agg_lat_b1: AtomicU64,
    pub agg_lat_b2: AtomicU64,
    pub agg_lat_b3: AtomicU64,
    pub agg_lat_b4: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc_snapshots(&self) {
        self.snapshots_total.fetch_add(1, Ordering::Relaxed);
    }
    #[inline]
    pub fn inc_rejected(&self) {
        self.entries_rejected.fetch_add(1, Ordering::Relaxed);
    }
    #[inline]
    pub fn inc_crossed(&self) {
        self.crossed_books.fetch_add(1, Ordering::Relaxed);
    }
    #[inline]
    pub fn inc_pub_depth(&self) {
        self.pub_depth.fetch_add(1, Ordering::Relaxed);
    }
    #[inline]
    pub fn inc_pub_bbo(&self) {
        self.pub_bbo.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_aggregation(&self, dur: Duration) {
        let us = dur.as_micros() as u64;
        // buckets: <10us, <25us, <50us, <100us, >=100us
        if us < 10 {
            self.agg_lat_b0.fetch_add(1, Ordering::Relaxed);
        } else if us < 25 {
            self.agg_lat_b1.fetch_add(1, Ordering::Relaxed);
        } else if us < 50 {
            self.agg_lat_b2.fetch_add(1, Ordering::Relaxed);
        } else if us < 100 {
            self.agg_lat_b3.fetch_add(1, Ordering::Relaxed);
        } else {
            self.agg_lat_b4.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn prometheus_text(&self) -> String {
        // NOTE: totals can stay Relaxed; prom scrape consistency isn't transactional anyway.
        let snaps = self.snapshots_total.load(Ordering::Relaxed);
        let rej = self.entries_rejected.load(Ordering::Relaxed);
        let crossed = self.crossed_books.load(Ordering::Relaxed);
        let pd = self.pub_depth.load(Ordering::Relaxed);
        let pb = self.pub_bbo.load(Ordering::Relaxed);

        let b0 = self.agg_lat_b0.load(Ordering::Relaxed);
        let b1 = self.agg_lat_b1.load(Ordering::Relaxed);
        let b2 = self.agg_lat_b2.load(Ordering::Relaxed);
        let b3 = self.agg_lat_b3.load(Ordering::Relaxed);
        let b4 = self.agg_lat_b4.load(Ordering::Relaxed);

        format!(
            "\
# TYPE depthline_snapshots_total counter
depthline_snapshots_total {snaps}
# TYPE depthline_entries_rejected_total counter
depthline_entries_rejected_total {rej}
# TYPE depthline_crossed_books_total counter
depthline_crossed_books_total {crossed}
# TYPE depthline_publish_depth_total counter
depthline_publish_depth_total {pd}
# TYPE depthline_publish_bbo_total counter
depthline_publish_bbo_total {pb}
# TYPE depthline_aggregation_latency_bucket counter
depthline_aggregation_latency_bucket{{le=\"10\"}} {b0}
depthline_aggregation_latency_bucket{{le=\"25\"}} {b1}
depthline_aggregation_latency_bucket{{le=\"50\"}} {b2}
depthline_aggregation_latency_bucket{{le=\"100\"}} {b3}
depthline_aggregation_latency_bucket{{le=\"+Inf\"}} {b4}
"
        )
    }
}
