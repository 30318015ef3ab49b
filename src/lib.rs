//! # Depthline - Decimal-Safe Order Book Depth Aggregation
//!
//! This crate provides the reusable core of a trading-view demo: decimal-safe
//! arithmetic over price/quantity strings, input validation against per-symbol
//! policies, cumulative depth aggregation for depth charts, and the derived
//! display metrics (spread, VWAP, fees, slippage) built on top of them.
//!
//! ## Architecture
//!
//! The crate consists of several key components:
//! - **Decimal**: High-precision arithmetic wrapper over fixed-point decimals
//! - **Policy**: Per-symbol price/quantity validation rules
//! - **Depth**: Cumulative depth-point aggregation for bid and ask sides
//! - **Analytics**: Spread, percentage change, VWAP, fee and slippage math
//! - **Book**: L2 price-level book state for the serving layer
//! - **Feed**: Seeded mock market data generator
//! - **Wallet**: Capability-trait wallet session contract
//! - **Wire**: JSON frame encoding for WebSocket distribution
//!
//! Every core function is a pure, synchronous computation over its inputs:
//! no I/O, no shared mutable state, no locking required from any caller.
//!
//! ## Example
//!
//! ```rust
//! use depthline::{
//!     analytics,
//!     depth::{self, OrderEntry},
//! };
//!
//! let bids = vec![
//!     OrderEntry::from_strs("100", "2").unwrap(),
//!     OrderEntry::from_strs("101", "1").unwrap(),
//! ];
//! let asks = vec![OrderEntry::from_strs("102", "3").unwrap()];
//!
//! let profile = depth::aggregate(&bids, &asks);
//! assert_eq!(profile.bids[0].price.to_string(), "101");
//! assert_eq!(profile.bids[1].cumulative.to_string(), "3");
//!
//! let spread = analytics::spread(&bids, &asks);
//! assert_eq!(spread.value.to_string(), "1");
//! ```
pub mod analytics;
pub mod book;
pub mod decimal;
pub mod depth;
pub mod feed;
pub mod policy;
pub mod wallet;
pub mod wire;
