//! Pure display projections. Everything upstream works on unrounded `f64`;
//! rounding to cents happens here and nowhere else.

use std::fmt;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::factors::{Factor, FactorSet, Severity};
use crate::domain::fare::FareBreakdown;
use crate::domain::trip::Currency;

pub const MONEY_DECIMALS: u32 = 2;

/// Rounds half away from zero to two decimals.
pub fn round_money(value: f64) -> f64 {
    round_to(value, MONEY_DECIMALS)
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|decimal| decimal.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|decimal| decimal.to_f64())
        .unwrap_or(value)
}

pub fn format_money(value: f64, currency: Currency) -> String {
    format!("{}{:.2}", currency.symbol(), round_money(value))
}

/// Copy of the breakdown with every amount rounded for presentation.
pub fn rounded_breakdown(fare: &FareBreakdown) -> FareBreakdown {
    FareBreakdown {
        base_fare: round_money(fare.base_fare),
        distance_fare: round_money(fare.distance_fare),
        time_fare: round_money(fare.time_fare),
        raw_fare: round_money(fare.raw_fare),
        adjusted_fare: round_money(fare.adjusted_fare),
        total_fare: round_money(fare.total_fare),
        ..fare.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorBadge {
    pub label: String,
    pub severity: Severity,
}

impl FactorBadge {
    pub fn for_factor<C: fmt::Display>(factor: &Factor<C>) -> Self {
        Self {
            label: format!("{} ({:.2}x)", humanize(&factor.condition.to_string()), factor.modifier),
            severity: factor.severity(),
        }
    }
}

/// Badges in traffic, weather, time, demand order.
pub fn factor_badges(factors: &FactorSet) -> [FactorBadge; 4] {
    [
        FactorBadge::for_factor(&factors.traffic),
        FactorBadge::for_factor(&factors.weather),
        FactorBadge::for_factor(&factors.time),
        FactorBadge::for_factor(&factors.demand),
    ]
}

/// `morning_rush` -> `Morning rush`.
fn humanize(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
