// src/depth.rs
//! Cumulative depth aggregation.
//!
//! Converts unsorted (price, quantity) resting orders into the depth-point
//! series a depth chart draws: bids sorted descending, asks ascending, each
//! point carrying the running quantity sum at or better than its price.
//!
//! The aggregator assumes upstream validation already happened; it does not
//! re-validate, and parse failures only surface when constructing entries
//! from strings. Same-price levels are kept as distinct points and the sort
//! is stable, so equal prices preserve their input order.

use crate::decimal::MathError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

/// One resting order: immutable once read, no identity beyond its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl OrderEntry {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        OrderEntry { price, quantity }
    }

    /// Build an entry from decimal strings, propagating parse failures.
    pub fn from_strs(price: &str, quantity: &str) -> Result<Self, MathError> {
        Ok(OrderEntry {
            price: crate::decimal::parse(price)?,
            quantity: crate::decimal::parse(quantity)?,
        })
    }
}

/// One point of the depth series: `cumulative` is the quantity resting at or
/// better than `price` on its side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthPoint {
    pub price: Decimal,
    pub quantity: Decimal,
    pub cumulative: Decimal,
}

/// Both sides of an aggregated snapshot. The sides cumulate independently
/// and are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthProfile {
    pub bids: Vec<DepthPoint>,
    pub asks: Vec<DepthPoint>,
}

/// One display row of the order-book ladder: depth percentage is relative to
/// the larger side's total, for bar rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LadderRow {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub cumulative: Decimal,
    pub depth_percentage: Decimal,
}

/// Sort one side best-first and emit its cumulative depth series.
///
/// Empty input yields empty output. Single pass after an O(n log n) stable
/// sort.
pub fn cumulative_depth(entries: &[OrderEntry], side: Side) -> Vec<DepthPoint> {
    let mut sorted: Vec<&OrderEntry> = entries.iter().collect();
    match side {
        Side::Bid => sorted.sort_by(|a, b| b.price.cmp(&a.price)),
        Side::Ask => sorted.sort_by(|a, b| a.price.cmp(&b.price)),
    }

    let mut running = Decimal::ZERO;
    sorted
        .into_iter()
        .map(|e| {
            running += e.quantity;
            DepthPoint {
                price: e.price,
                quantity: e.quantity,
                cumulative: running,
            }
        })
        .collect()
}

/// Aggregate both sides of a snapshot.
pub fn aggregate(bids: &[OrderEntry], asks: &[OrderEntry]) -> DepthProfile {
    DepthProfile {
        bids: cumulative_depth(bids, Side::Bid),
        asks: cumulative_depth(asks, Side::Ask),
    }
}

/// Aggregate and keep only the top `depth` levels per side. `depth == 0`
/// means full depth. Truncation happens after sorting, so the kept levels
/// are always the best ones.
pub fn aggregate_top(bids: &[OrderEntry], asks: &[OrderEntry], depth: usize) -> DepthProfile {
    let mut profile = aggregate(bids, asks);
    if depth != 0 {
        profile.bids.truncate(depth);
        profile.asks.truncate(depth);
    }
    profile
}

/// Flatten a profile into ladder rows with per-row depth percentages,
/// asks first (worst to best is the caller's rendering concern).
pub fn ladder(profile: &DepthProfile) -> Vec<LadderRow> {
    let max_cumulative = profile
        .bids
        .last()
        .map(|p| p.cumulative)
        .unwrap_or(Decimal::ZERO)
        .max(
            profile
                .asks
                .last()
                .map(|p| p.cumulative)
                .unwrap_or(Decimal::ZERO),
        );

    let row = |side: Side, p: &DepthPoint| LadderRow {
        side,
        price: p.price,
        quantity: p.quantity,
        cumulative: p.cumulative,
        depth_percentage: if max_cumulative.is_zero() {
            Decimal::ZERO
        } else {
            p.cumulative / max_cumulative * Decimal::ONE_HUNDRED
        },
    };

    let mut rows = Vec::with_capacity(profile.bids.len() + profile.asks.len());
    rows.extend(profile.asks.iter().map(|p| row(Side::Ask, p)));
    rows.extend(profile.bids.iter().map(|p| row(Side::Bid, p)));
    rows
}
