use std::fs;

use anyhow::{Context, Result};
use serde::Deserialize;

use depthline::analytics;
use depthline::depth::OrderEntry;

#[derive(Deserialize)]
struct RawEntry {
    price: String,
    quantity: String,
}

#[derive(Deserialize)]
struct RawBook {
    bids: Vec<RawEntry>,
    asks: Vec<RawEntry>,
}

fn parse(raw: &[RawEntry]) -> Vec<OrderEntry> {
    raw.iter()
        .filter_map(|e| OrderEntry::from_strs(&e.price, &e.quantity).ok())
        .collect()
}

fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "data/raw.json".to_string());
    let raw = fs::read_to_string(&path).with_context(|| format!("open {path}"))?;
    let book: RawBook = serde_json::from_str(&raw).with_context(|| format!("parse {path}"))?;

    let bids = parse(&book.bids);
    let asks = parse(&book.asks);
    let dropped = book.bids.len() + book.asks.len() - bids.len() - asks.len();

    let spread = analytics::spread(&bids, &asks);
    let mut all = bids.clone();
    all.extend(asks.iter().cloned());

    println!("bids={}", bids.len());
    println!("asks={}", asks.len());
    println!("unparsable={}", dropped);
    println!("best_bid={:?}", bids.iter().map(|e| e.price).max());
    println!("best_ask={:?}", asks.iter().map(|e| e.price).min());
    println!("spread={} ({}%)", spread.value, spread.percentage);
    println!("vwap={}", analytics::vwap(&all));
    Ok(())
}
