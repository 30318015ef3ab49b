// src/feed.rs
//! Seeded mock market data.
//!
//! Generates the same shape of data the original trading view refreshed every
//! second: N bids stacked below a random-walking base price, N asks above it,
//! and one-minute OHLCV candles. Prices and quantities are rounded to the
//! symbol policy's precisions so downstream validation always passes.

use crate::depth::OrderEntry;
use crate::policy::SymbolPolicy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// One OHLCV candle on a one-minute grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candle {
    pub time_ms: u64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// A freshly generated book snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub bids: Vec<OrderEntry>,
    pub asks: Vec<OrderEntry>,
    pub update_id: u64,
}

pub struct MockFeed {
    policy: SymbolPolicy,
    levels: usize,
    base_price: f64,
    update_id: u64,
    rng: StdRng,
}

impl MockFeed {
    pub fn new(policy: SymbolPolicy, levels: usize, base_price: f64, seed: u64) -> Self {
        MockFeed {
            policy,
            levels,
            base_price,
            update_id: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn decimal(&self, v: f64, precision: u32) -> Decimal {
        Decimal::from_f64(v)
            .unwrap_or(Decimal::ZERO)
            .round_dp(precision)
            .max(Decimal::ZERO)
    }

    /// Generate the next book snapshot: `levels` bids at
    /// `base * (1 - 0.1%*i - rand*0.2%)` and asks mirrored above, quantities
    /// uniform in `0.001..5.001`.
    pub fn next_snapshot(&mut self) -> Snapshot {
        // Drift the base a little so consecutive snapshots move.
        let drift: f64 = self.rng.gen_range(-0.0005..0.0005);
        self.base_price *= 1.0 + drift;
        self.update_id += 1;

        let mut bids = Vec::with_capacity(self.levels);
        let mut asks = Vec::with_capacity(self.levels);

        for i in 0..self.levels {
            let off = (i + 1) as f64 * 0.001;
            let jitter: f64 = self.rng.gen_range(0.0..0.002);
            let bid_px = self.base_price * (1.0 - off - jitter);
            let jitter: f64 = self.rng.gen_range(0.0..0.002);
            let ask_px = self.base_price * (1.0 + off + jitter);

            let bid_qty: f64 = self.rng.gen_range(0.001..5.001);
            let ask_qty: f64 = self.rng.gen_range(0.001..5.001);

            bids.push(OrderEntry::new(
                self.decimal(bid_px, self.policy.price_precision),
                self.decimal(bid_qty, self.policy.quantity_precision),
            ));
            asks.push(OrderEntry::new(
                self.decimal(ask_px, self.policy.price_precision),
                self.decimal(ask_qty, self.policy.quantity_precision),
            ));
        }

        Snapshot {
            bids,
            asks,
            update_id: self.update_id,
        }
    }

    /// Generate `n` historical candles ending at `now_ms`, one per minute,
    /// random-walking the feed's base price.
    pub fn candles(&mut self, n: usize, now_ms: u64) -> Vec<Candle> {
        let mut out = Vec::with_capacity(n);
        let mut current = self.base_price;
        let pp = self.policy.price_precision;

        for i in 0..n {
            let open = current;
            let high = open * (1.0 + self.rng.gen_range(0.0..0.02));
            let low = open * (1.0 - self.rng.gen_range(0.0..0.02));
            let close = open * (1.0 + self.rng.gen_range(-0.005..0.005));
            let volume: f64 = self.rng.gen_range(10.0..110.0);
            let time_ms = now_ms.saturating_sub(((n - i) as u64) * 60_000);

            out.push(Candle {
                time_ms,
                open: self.decimal(open, pp),
                high: self.decimal(high, pp),
                low: self.decimal(low, pp),
                close: self.decimal(close, pp),
                volume: self.decimal(volume, self.policy.quantity_precision),
            });

            current = close;
        }

        out
    }
}
