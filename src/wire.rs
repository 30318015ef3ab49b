// src/wire.rs
//! JSON frame encoding for WebSocket/HTTP distribution.
//!
//! Frames render decimals as strings at the symbol policy's precisions, so
//! clients never see binary-float artifacts. Encoded frames are `Bytes` and
//! cheap to fan out to many subscribers.

use bytes::Bytes;
use serde::Serialize;

use crate::analytics::Spread;
use crate::book::Bbo;
use crate::decimal;
use crate::depth::{DepthPoint, DepthProfile};
use crate::feed::Candle;
use crate::policy::SymbolPolicy;

#[derive(Serialize)]
struct WireLevel {
    price: String,
    quantity: String,
    cumulative: String,
}

#[derive(Serialize)]
struct WireSpread {
    value: String,
    percentage: String,
}

#[derive(Serialize)]
struct DepthFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    symbol: &'a str,
    ts_ms: u64,
    bids: Vec<WireLevel>,
    asks: Vec<WireLevel>,
    spread: WireSpread,
}

#[derive(Serialize)]
struct BboFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    symbol: &'a str,
    ts_ms: u64,
    bid_px: Option<String>,
    bid_qty: String,
    ask_px: Option<String>,
    ask_qty: String,
}

#[derive(Serialize)]
struct CandlesFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    symbol: &'a str,
    candles: &'a [Candle],
}

fn wire_levels(points: &[DepthPoint], policy: &SymbolPolicy) -> Vec<WireLevel> {
    points
        .iter()
        .map(|p| WireLevel {
            price: decimal::format(p.price, policy.price_precision),
            quantity: decimal::format(p.quantity, policy.quantity_precision),
            cumulative: decimal::format(p.cumulative, policy.quantity_precision),
        })
        .collect()
}

#[inline]
fn to_bytes<T: Serialize>(frame: &T) -> Bytes {
    // These frames are plain string/number structs; serialization cannot fail.
    serde_json::to_vec(frame).map(Bytes::from).unwrap_or_default()
}

pub fn encode_depth(
    symbol: &str,
    ts_ms: u64,
    profile: &DepthProfile,
    spread: &Spread,
    policy: &SymbolPolicy,
) -> Bytes {
    to_bytes(&DepthFrame {
        kind: "depth",
        symbol,
        ts_ms,
        bids: wire_levels(&profile.bids, policy),
        asks: wire_levels(&profile.asks, policy),
        spread: WireSpread {
            value: decimal::format(spread.value, policy.price_precision),
            percentage: decimal::format(spread.percentage, 2),
        },
    })
}

pub fn encode_bbo(symbol: &str, ts_ms: u64, bbo: &Bbo, policy: &SymbolPolicy) -> Bytes {
    to_bytes(&BboFrame {
        kind: "bbo",
        symbol,
        ts_ms,
        bid_px: bbo.bid_px.map(|p| decimal::format(p, policy.price_precision)),
        bid_qty: decimal::format(bbo.bid_qty, policy.quantity_precision),
        ask_px: bbo.ask_px.map(|p| decimal::format(p, policy.price_precision)),
        ask_qty: decimal::format(bbo.ask_qty, policy.quantity_precision),
    })
}

pub fn encode_candles(symbol: &str, candles: &[Candle]) -> Bytes {
    to_bytes(&CandlesFrame {
        kind: "candles",
        symbol,
        candles,
    })
}
