//! Derived metrics computed from resolved amounts.
//!
//! Every derivation fails closed: an empty input, a non-numeric input or a
//! zero denominator yields the empty string and a log line, never an error.

use dart_core::{DartError, FinancialMetrics, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

/// Decimal places kept in ratios.
const RATIO_DECIMALS: u32 = 4;

/// Magnitude from which ratios render in exponent form, e.g. `"1e+17"`.
const EXPONENT_FROM: f64 = 1e16;

/// Magnitude below which non-zero ratios render in exponent form.
const EXPONENT_BELOW: f64 = 1e-4;

/// Debt ratio in percent: `debt_total / capital_total × 100`, rounded to four
/// decimal places with ties to even.
///
/// The quotient is computed in `f64` and the rounding is applied to its
/// exact binary value, so `1 / 3200 × 100 = 0.03125` becomes `"0.0312"`.
/// Integral results keep one decimal place, so a ratio of exactly fifty
/// percent renders as `"50.0"`. Ratios of `1e16` and above use exponent
/// form with a signed two-digit exponent, e.g. `"1e+17"`.
#[must_use]
pub fn debt_ratio(debt_total: &str, capital_total: &str) -> String {
    fail_closed("debt_ratio", debt_total, capital_total, || {
        let debt = parse_amount(debt_total)?;
        let capital = parse_amount(capital_total)?;
        if capital == 0 {
            return Err(DartError::InvalidParameter(
                "capital total is zero".to_string(),
            ));
        }
        let rounded = round_ratio(debt as f64 / capital as f64 * 100.0)?;
        Ok(format_float(rounded))
    })
}

/// Net worth: `asset_total − debt_total`.
#[must_use]
pub fn net_worth(asset_total: &str, debt_total: &str) -> String {
    difference("net_worth", asset_total, debt_total)
}

/// Quick assets: `current_assets − inventories`.
#[must_use]
pub fn quick_assets(current_assets: &str, inventories: &str) -> String {
    difference("quick_assets", current_assets, inventories)
}

/// Net working capital: `current_assets − current_liabilities`.
#[must_use]
pub fn net_working_capital(current_assets: &str, current_liabilities: &str) -> String {
    difference("net_working_capital", current_assets, current_liabilities)
}

/// Fills every derived metric of `metrics` from its resolved base metrics.
pub fn apply(metrics: &mut FinancialMetrics) {
    metrics.financial_debt_ratio = debt_ratio(&metrics.debt_total, &metrics.capital_total);
    metrics.net_worth = net_worth(&metrics.asset_total, &metrics.debt_total);
    metrics.quick_asset = quick_assets(&metrics.current_asset, &metrics.inventories_asset);
    metrics.net_working_capital =
        net_working_capital(&metrics.current_asset, &metrics.current_liabilities);
}

fn difference(name: &'static str, minuend: &str, subtrahend: &str) -> String {
    fail_closed(name, minuend, subtrahend, || {
        let a = parse_amount(minuend)?;
        let b = parse_amount(subtrahend)?;
        a.checked_sub(b)
            .map(|v| v.to_string())
            .ok_or_else(|| DartError::InvalidParameter(format!("{a} - {b} overflows")))
    })
}

fn fail_closed(
    name: &'static str,
    lhs: &str,
    rhs: &str,
    compute: impl FnOnce() -> Result<String>,
) -> String {
    if lhs.is_empty() || rhs.is_empty() {
        debug!(metric = name, lhs, rhs, "Missing input, leaving derived metric empty");
        return String::new();
    }

    match compute() {
        Ok(value) => value,
        Err(e) => {
            warn!(metric = name, lhs, rhs, error = %e, "Failed to derive metric");
            String::new()
        }
    }
}

fn parse_amount(value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| DartError::Parse(format!("Invalid amount {value:?}: {e}")))
}

/// Rounds to [`RATIO_DECIMALS`] places, ties to even.
fn round_ratio(value: f64) -> Result<f64> {
    // Every f64 this large is already integral.
    if !value.is_finite() || value.abs() >= EXPONENT_FROM {
        return Ok(value);
    }
    let exact = Decimal::from_f64_retain(value)
        .ok_or_else(|| DartError::Parse(format!("{value} is not representable")))?;
    exact
        .round_dp_with_strategy(RATIO_DECIMALS, RoundingStrategy::MidpointNearestEven)
        .to_string()
        .parse::<f64>()
        .map_err(|e| DartError::Parse(e.to_string()))
}

/// Shortest round-trip rendering with at least one decimal place, switching
/// to `1e+17` style outside `[1e-4, 1e16)`.
fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let magnitude = value.abs();
    if magnitude >= EXPONENT_FROM || (magnitude != 0.0 && magnitude < EXPONENT_BELOW) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or_default();
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exponent.abs())
            }
            None => formatted,
        };
    }

    let formatted = value.to_string();
    if formatted.contains('.') {
        formatted
    } else {
        format!("{formatted}.0")
    }
}
