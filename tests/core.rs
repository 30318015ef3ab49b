//! Concrete scenarios for the arithmetic, validation, depth and analytics
//! layers.

use depthline::analytics;
use depthline::decimal::{self, MathError};
use depthline::depth::{self, OrderEntry, Side};
use depthline::policy::{SymbolPolicy, Validation, ValidationError};
use rust_decimal_macros::dec;
use std::cmp::Ordering;

fn entries(pairs: &[(&str, &str)]) -> Vec<OrderEntry> {
    pairs
        .iter()
        .map(|(p, q)| OrderEntry::from_strs(p, q).unwrap())
        .collect()
}

#[test]
fn arithmetic_is_decimal_safe() {
    assert_eq!(decimal::add("0.1", "0.2").unwrap(), "0.3");
    assert_eq!(decimal::subtract("1", "0.9").unwrap(), "0.1");
    assert_eq!(decimal::multiply("1.5", "2").unwrap(), "3");
    assert_eq!(decimal::divide("1", "8").unwrap(), "0.125");
    assert_eq!(decimal::compare("2", "10").unwrap(), Ordering::Less);
    assert_eq!(decimal::compare("3.00", "3").unwrap(), Ordering::Equal);
}

#[test]
fn divide_rejects_zero_divisor() {
    assert_eq!(decimal::divide("42", "0").unwrap_err(), MathError::DivisionByZero);
    assert_eq!(decimal::divide("42", "0.0000").unwrap_err(), MathError::DivisionByZero);
}

#[test]
fn malformed_input_is_reported_with_the_offender() {
    match decimal::parse("12,5") {
        Err(MathError::Malformed(s)) => assert_eq!(s, "12,5"),
        other => panic!("expected malformed error, got {other:?}"),
    }
}

#[test]
fn format_rounds_midpoint_away_from_zero_and_pads() {
    assert_eq!(decimal::format(dec!(1.005), 2), "1.01");
    assert_eq!(decimal::format(dec!(-1.005), 2), "-1.01");
    assert_eq!(decimal::format(dec!(1.5), 2), "1.50");
    assert_eq!(decimal::format(dec!(15), 0), "15");
}

#[test]
fn price_below_minimum_is_invalid_with_bound_message() {
    let policy = SymbolPolicy::default(); // min_price = 0.01
    let v = policy.validate_price("0.001");
    assert!(!v.is_valid());
    let err = v.error().unwrap();
    assert_eq!(
        err,
        &ValidationError::BelowMin {
            field: depthline::policy::Field::Price,
            min: dec!(0.01),
        }
    );
    assert_eq!(err.to_string(), "price must not be lower than 0.01");
}

#[test]
fn bounds_are_inclusive() {
    let policy = SymbolPolicy::default();
    assert!(policy.validate_price("0.01").is_valid());
    assert!(policy.validate_price("1000000").is_valid());
    assert!(!policy.validate_price("1000000.01").is_valid());
    assert!(policy.validate_quantity("0.000001").is_valid());
    assert!(!policy.validate_quantity("0.0000001").is_valid());
}

#[test]
fn unparsable_input_fails_closed() {
    let policy = SymbolPolicy::default();
    for bad in ["", "abc", "1e5", "1.2.3", "NaN"] {
        let v = policy.validate_price(bad);
        assert_eq!(
            v,
            Validation::Invalid(ValidationError::Malformed {
                field: depthline::policy::Field::Price
            }),
            "{bad:?} should be rejected as malformed"
        );
    }
}

#[test]
fn spec_scenario_depth_and_spread() {
    let bids = entries(&[("100", "2"), ("101", "1")]);
    let asks = entries(&[("102", "3")]);

    let profile = depth::aggregate(&bids, &asks);
    assert_eq!(profile.bids[0].price, dec!(101));
    assert_eq!(profile.bids[0].cumulative, dec!(1));
    assert_eq!(profile.bids[1].price, dec!(100));
    assert_eq!(profile.bids[1].cumulative, dec!(3));
    assert_eq!(profile.asks[0].cumulative, dec!(3));

    let spread = analytics::spread(&bids, &asks);
    assert_eq!(spread.value, dec!(1));
    assert_eq!(decimal::format(spread.percentage, 2), "0.99");
}

#[test]
fn equal_price_levels_stay_separate_in_input_order() {
    let bids = entries(&[("100", "1"), ("100", "2"), ("100", "3")]);
    let points = depth::cumulative_depth(&bids, Side::Bid);
    let quantities: Vec<_> = points.iter().map(|p| p.quantity).collect();
    assert_eq!(quantities, vec![dec!(1), dec!(2), dec!(3)]);
    assert_eq!(points.last().unwrap().cumulative, dec!(6));
}

#[test]
fn empty_sides_mean_empty_output_and_zero_spread() {
    let asks = entries(&[("102", "3")]);

    let profile = depth::aggregate(&[], &asks);
    assert!(profile.bids.is_empty());
    assert_eq!(profile.asks.len(), 1);

    let spread = analytics::spread(&[], &asks);
    assert_eq!(spread.value, dec!(0));
    assert_eq!(spread.percentage, dec!(0));
}

#[test]
fn top_depth_keeps_the_best_levels() {
    let bids = entries(&[("98", "1"), ("100", "1"), ("99", "1")]);
    let profile = depth::aggregate_top(&bids, &[], 2);
    let prices: Vec<_> = profile.bids.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![dec!(100), dec!(99)]);
}

#[test]
fn ladder_percentages_scale_to_the_larger_side() {
    let bids = entries(&[("100", "1")]);
    let asks = entries(&[("101", "4")]);
    let rows = depth::ladder(&depth::aggregate(&bids, &asks));

    let ask_row = rows.iter().find(|r| r.side == Side::Ask).unwrap();
    let bid_row = rows.iter().find(|r| r.side == Side::Bid).unwrap();
    assert_eq!(ask_row.depth_percentage, dec!(100));
    assert_eq!(bid_row.depth_percentage, dec!(25));
}

#[test]
fn vwap_spec_scenario() {
    let orders = entries(&[("10", "2"), ("20", "2")]);
    assert_eq!(decimal::render(analytics::vwap(&orders)), "15");
}

#[test]
fn vwap_falls_back_to_zero() {
    assert_eq!(analytics::vwap(&[]), dec!(0));
    let zero_qty = entries(&[("10", "0"), ("20", "0")]);
    assert_eq!(analytics::vwap(&zero_qty), dec!(0));
}

#[test]
fn percentage_change_with_zero_previous_is_flat() {
    assert_eq!(analytics::percentage_change(dec!(110), dec!(100)), dec!(10));
    assert_eq!(analytics::percentage_change(dec!(5), dec!(0)), dec!(0));
}

#[test]
fn fee_and_net_amount() {
    let amount = analytics::amount(dec!(50000), dec!(0.002));
    assert_eq!(amount, dec!(100));
    assert_eq!(analytics::fee(amount, dec!(0.001)), dec!(0.1));
    assert_eq!(analytics::net_amount(amount, dec!(0.001)), dec!(99.9));
}

#[test]
fn slippage_fails_on_zero_expected_price() {
    assert_eq!(analytics::slippage(dec!(100), dec!(99)).unwrap(), dec!(1));
    assert_eq!(analytics::slippage(dec!(100), dec!(101)).unwrap(), dec!(1));
    assert_eq!(
        analytics::slippage(dec!(0), dec!(1)).unwrap_err(),
        MathError::DivisionByZero
    );
}
