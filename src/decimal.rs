// src/decimal.rs
//! High-precision arithmetic over decimal strings.
//!
//! All price/quantity math in this crate goes through `rust_decimal::Decimal`
//! (128-bit fixed point), never through `f64`, so values like `0.1 + 0.2`
//! stay exact. The string-level functions here mirror the calculator-style
//! surface the UI consumes: decimal strings in, normalized decimal strings
//! out.
//!
//! Inputs must be plain decimal notation (`"123"`, `"-0.5"`, `"1.000001"`).
//! Scientific notation is rejected as malformed.

use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("not a valid decimal number: {0:?}")]
    Malformed(String),
}

/// Parse a plain decimal string. Fails closed on anything `Decimal` cannot
/// represent exactly (overflow, scientific notation, garbage).
pub fn parse(s: &str) -> Result<Decimal, MathError> {
    Decimal::from_str(s.trim()).map_err(|_| MathError::Malformed(s.to_owned()))
}

pub fn add(a: &str, b: &str) -> Result<String, MathError> {
    Ok(render(parse(a)? + parse(b)?))
}

pub fn subtract(a: &str, b: &str) -> Result<String, MathError> {
    Ok(render(parse(a)? - parse(b)?))
}

pub fn multiply(a: &str, b: &str) -> Result<String, MathError> {
    Ok(render(parse(a)? * parse(b)?))
}

/// Division fails loudly on a zero divisor; there is no display fallback at
/// this level.
pub fn divide(a: &str, b: &str) -> Result<String, MathError> {
    let num = parse(a)?;
    let den = parse(b)?;
    if den.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(render(num / den))
}

/// Sign of `a - b` as an `Ordering`.
pub fn compare(a: &str, b: &str) -> Result<Ordering, MathError> {
    Ok(parse(a)?.cmp(&parse(b)?))
}

/// Render a decimal with the scale it happens to carry, trailing zeros
/// trimmed (`1.50` -> `1.5`, `15.00` -> `15`).
pub fn render(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Round to exactly `precision` fractional digits, midpoint away from zero,
/// zero-padded. `format(1.005, 2)` -> `"1.01"`, `format(1.5, 2)` -> `"1.50"`.
pub fn format(value: Decimal, precision: u32) -> String {
    let rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", precision as usize, rounded)
}
