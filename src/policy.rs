// src/policy.rs
//! Per-symbol price/quantity validation policies.
//!
//! Validation never panics and never returns `Err`: the outcome is a value
//! (`Validation`) the caller can render or ignore. Unparsable input fails
//! closed with a generic format error; range checks are inclusive on both
//! bounds and name the violated bound.

use crate::decimal;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which input field a validation verdict refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Price,
    Quantity,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Price => write!(f, "price"),
            Field::Quantity => write!(f, "quantity"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("invalid {field} format")]
    Malformed { field: Field },

    #[error("{field} must not be lower than {min}")]
    BelowMin { field: Field, min: Decimal },

    #[error("{field} must not be higher than {max}")]
    AboveMax { field: Field, max: Decimal },
}

/// Outcome of validating one candidate input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(ValidationError),
}

impl Validation {
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Validation::Valid => None,
            Validation::Invalid(e) => Some(e),
        }
    }
}

/// Trading rules for one symbol. Loaded from JSON config in the server, or
/// built in code; `Default` carries the demo's BTC/USDT rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPolicy {
    pub symbol: String,
    pub price_precision: u32,
    pub quantity_precision: u32,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub min_quantity: Decimal,
    pub max_quantity: Decimal,
}

impl Default for SymbolPolicy {
    fn default() -> Self {
        SymbolPolicy {
            symbol: "BTC/USDT".to_owned(),
            price_precision: 2,
            quantity_precision: 6,
            min_price: dec!(0.01),
            max_price: dec!(1000000),
            min_quantity: dec!(0.000001),
            max_quantity: dec!(1000000),
        }
    }
}

impl SymbolPolicy {
    pub fn validate_price(&self, price: &str) -> Validation {
        check_range(price, Field::Price, self.min_price, self.max_price)
    }

    pub fn validate_quantity(&self, quantity: &str) -> Validation {
        check_range(quantity, Field::Quantity, self.min_quantity, self.max_quantity)
    }

    /// Validate one (price, quantity) pair; the first failing field wins.
    pub fn validate_entry(&self, price: &str, quantity: &str) -> Validation {
        match self.validate_price(price) {
            Validation::Valid => self.validate_quantity(quantity),
            invalid => invalid,
        }
    }
}

fn check_range(input: &str, field: Field, min: Decimal, max: Decimal) -> Validation {
    let value = match decimal::parse(input) {
        Ok(v) => v,
        Err(_) => return Validation::Invalid(ValidationError::Malformed { field }),
    };

    if value < min {
        return Validation::Invalid(ValidationError::BelowMin { field, min });
    }
    if value > max {
        return Validation::Invalid(ValidationError::AboveMax { field, max });
    }

    Validation::Valid
}
