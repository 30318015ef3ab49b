// src/analytics.rs
//! Derived display metrics over raw or aggregated order data.
//!
//! Everything here is a pure function of its inputs. Metrics with a
//! documented zero-denominator fallback (`percentage_change`, `vwap`) return
//! zero instead of failing; `slippage` has no such fallback and fails with
//! `DivisionByZero` like raw division does.

use crate::decimal::MathError;
use crate::depth::OrderEntry;
use rust_decimal::Decimal;
use serde::Serialize;

/// Best-ask minus best-bid, with the percentage relative to the best bid.
/// `{0, 0}` when either side is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Spread {
    pub value: Decimal,
    pub percentage: Decimal,
}

pub fn spread(bids: &[OrderEntry], asks: &[OrderEntry]) -> Spread {
    let best_bid = bids.iter().map(|e| e.price).max();
    let best_ask = asks.iter().map(|e| e.price).min();

    match (best_bid, best_ask) {
        (Some(bid), Some(ask)) if !bid.is_zero() => {
            let value = ask - bid;
            Spread {
                value,
                percentage: value / bid * Decimal::ONE_HUNDRED,
            }
        }
        _ => Spread::default(),
    }
}

/// `(current - previous) / previous * 100`; zero when `previous` is zero.
/// The fallback is deliberate: a change against nothing renders as flat,
/// not as an error.
pub fn percentage_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    (current - previous) / previous * Decimal::ONE_HUNDRED
}

/// Volume-weighted average price: `sum(p*q) / sum(q)`. Zero for empty input
/// or zero total quantity.
pub fn vwap(orders: &[OrderEntry]) -> Decimal {
    let mut total_value = Decimal::ZERO;
    let mut total_quantity = Decimal::ZERO;

    for o in orders {
        total_value += o.price * o.quantity;
        total_quantity += o.quantity;
    }

    if total_quantity.is_zero() {
        return Decimal::ZERO;
    }
    total_value / total_quantity
}

/// Notional amount of a trade.
pub fn amount(price: Decimal, quantity: Decimal) -> Decimal {
    price * quantity
}

pub fn fee(amount: Decimal, fee_rate: Decimal) -> Decimal {
    amount * fee_rate
}

/// Amount actually received after the fee.
pub fn net_amount(amount: Decimal, fee_rate: Decimal) -> Decimal {
    amount - fee(amount, fee_rate)
}

/// `|expected - actual| / expected * 100`.
///
/// Fails when `expected` is zero: unlike `percentage_change` there is no
/// sensible flat rendering for slippage against a zero reference.
pub fn slippage(expected: Decimal, actual: Decimal) -> Result<Decimal, MathError> {
    if expected.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(((expected - actual) / expected).abs() * Decimal::ONE_HUNDRED)
}
