// src/book.rs
//! L2 price-level book state for the serving layer.
//!
//! The book keys price levels by `Decimal`, so the server never round-trips
//! prices through floats between the feed and the aggregator. It tracks best
//! bid/ask so publishers can skip frames when the top of book did not move.
//!
//! ## Example
//!
//! ```rust
//! use depthline::book::OrderBook;
//! use depthline::depth::{OrderEntry, Side};
//! use rust_decimal_macros::dec;
//!
//! let mut book = OrderBook::new();
//! book.apply_level(Side::Bid, dec!(100), dec!(2));
//! book.apply_level(Side::Ask, dec!(101), dec!(3));
//!
//! let bbo = book.bbo();
//! assert_eq!(bbo.bid_px, Some(dec!(100)));
//! assert_eq!(bbo.ask_qty, dec!(3));
//! assert_eq!(book.levels(Side::Bid, 0), vec![OrderEntry::new(dec!(100), dec!(2))]);
//! ```

use crate::depth::{OrderEntry, Side};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Bbo {
    pub bid_px: Option<Decimal>,
    pub bid_qty: Decimal,
    pub ask_px: Option<Decimal>,
    pub ask_qty: Decimal,
}

#[derive(Default)]
pub struct OrderBook {
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
    last_update_id: u64,
}

impl OrderBook {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn last_update_id(&self) -> u64 {
        self.last_update_id
    }

    #[inline]
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.best_bid = None;
        self.best_ask = None;
    }

    #[inline]
    pub fn bbo(&self) -> Bbo {
        Bbo {
            bid_px: self.best_bid,
            bid_qty: self
                .best_bid
                .and_then(|p| self.bids.get(&p).copied())
                .unwrap_or(Decimal::ZERO),
            ask_px: self.best_ask,
            ask_qty: self
                .best_ask
                .and_then(|p| self.asks.get(&p).copied())
                .unwrap_or(Decimal::ZERO),
        }
    }

    #[inline]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid, self.best_ask) {
            (Some(b), Some(a)) => b >= a,
            _ => false,
        }
    }

    #[inline]
    fn recompute_best(&mut self, side: Side) {
        match side {
            Side::Bid => self.best_bid = self.bids.keys().next_back().copied(),
            Side::Ask => self.best_ask = self.asks.keys().next().copied(),
        }
    }

    /// Upsert one price level; a zero quantity removes the level. Returns
    /// whether the best bid/offer changed.
    pub fn apply_level(&mut self, side: Side, price: Decimal, qty: Decimal) -> bool {
        let prev = self.bbo();

        let map = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        if qty.is_zero() {
            map.remove(&price);
        } else {
            map.insert(price, qty);
        }
        self.recompute_best(side);

        self.bbo() != prev
    }

    /// Replace the whole book with a fresh snapshot. Entries with zero
    /// quantity are dropped. Returns whether the best bid/offer changed.
    pub fn replace(&mut self, bids: &[OrderEntry], asks: &[OrderEntry], update_id: u64) -> bool {
        let prev = self.bbo();

        self.clear();
        for e in bids {
            if !e.quantity.is_zero() {
                self.bids.insert(e.price, e.quantity);
            }
        }
        for e in asks {
            if !e.quantity.is_zero() {
                self.asks.insert(e.price, e.quantity);
            }
        }
        self.recompute_best(Side::Bid);
        self.recompute_best(Side::Ask);
        self.last_update_id = update_id;

        self.bbo() != prev
    }

    /// Top `depth` levels, best first. `depth == 0` means all levels.
    pub fn levels(&self, side: Side, depth: usize) -> Vec<OrderEntry> {
        let n = match side {
            Side::Bid => self.bids.len(),
            Side::Ask => self.asks.len(),
        };
        let take_n = if depth == 0 { n } else { depth.min(n) };
        let mut out = Vec::with_capacity(take_n);

        match side {
            Side::Bid => {
                for (&px, &qty) in self.bids.iter().rev().take(take_n) {
                    out.push(OrderEntry::new(px, qty));
                }
            }
            Side::Ask => {
                for (&px, &qty) in self.asks.iter().take(take_n) {
                    out.push(OrderEntry::new(px, qty));
                }
            }
        }

        out
    }
}

impl OrderBook {
    pub fn assert_invariants(&self) {
        // 1) best pointers must match the trees
        let exp_best_bid = self.bids.keys().next_back().copied();
        let exp_best_ask = self.asks.keys().next().copied();
        assert_eq!(self.best_bid, exp_best_bid, "best_bid mismatch");
        assert_eq!(self.best_ask, exp_best_ask, "best_ask mismatch");

        // 2) no zero-qty levels
        assert!(self.bids.values().all(|q| !q.is_zero()), "zero bid level");
        assert!(self.asks.values().all(|q| !q.is_zero()), "zero ask level");

        // Note: crossed books can transiently occur while a mock snapshot is
        // being applied level by level; they are surfaced via is_crossed(),
        // not treated as corruption.
    }
}
