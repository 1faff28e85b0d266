//! Currency conversion and deterministic number formatting for display.
use crate::core::currency::{Currency, FxRateTable};

/// Symbol for a currency code, `$` for anything unrecognized.
pub fn currency_symbol(code: &str) -> &'static str {
    code.parse::<Currency>().map_or("$", |c| c.symbol())
}

/// Converts a USD amount into `target` using the rate table.
pub fn convert(value_usd: f64, target: &str, rates: &FxRateTable) -> f64 {
    value_usd * rates.rate(target)
}

/// Renders a USD amount in `target` with a K/M/B magnitude suffix.
///
/// Zero (or a non-finite value) renders as the bare symbol followed by `0`, so
/// "no data" stays distinguishable from a small amount like `$0.40`.
pub fn format_currency(value_usd: f64, target: &str, rates: &FxRateTable) -> String {
    let prefix = currency_symbol(target);
    if !value_usd.is_finite() || value_usd == 0.0 {
        return format!("{prefix}0");
    }

    let converted = convert(value_usd, target, rates);
    let abs_value = converted.abs();

    // Step up while the rounded figure would read 1000.00 or more at this scale.
    let mut level = 0;
    while level + 1 < MAGNITUDES.len() && round_cents(abs_value / MAGNITUDES[level].0) >= 1000.0 {
        level += 1;
    }
    let (scale, suffix) = MAGNITUDES[level];
    format!("{prefix}{:.2}{suffix}", converted / scale)
}

const MAGNITUDES: [(f64, &str); 4] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B")];

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Renders a coin amount. BTC and ETH are shown as whole units, anything else
/// with two decimals.
pub fn format_quantity(amount: f64, asset_code: &str) -> String {
    if !amount.is_finite() || amount == 0.0 {
        return "0".to_string();
    }

    match asset_code {
        "BTC" | "ETH" => format!("{} {asset_code}", group_thousands(&format!("{amount:.0}"))),
        _ => format!("{} {asset_code}", group_thousands(&format!("{amount:.2}"))),
    }
}

/// Whole-unit count with thousands separators, e.g. `12,345`.
pub fn format_count(amount: f64) -> String {
    if !amount.is_finite() {
        return "0".to_string();
    }
    group_thousands(&format!("{amount:.0}"))
}

pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}%")
}

/// Inserts `,` between groups of three digits in the integer part of an already
/// formatted number.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(idx) => unsigned.split_at(idx),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}{frac_part}")
}
