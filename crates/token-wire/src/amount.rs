//! Conversion between human-readable token amounts and base units.
//!
//! The token program only ever sees integer base units. A mint with 9
//! decimals represents `1.5` tokens as `1_500_000_000`. Conversion is done
//! with integer arithmetic on the decimal text so that no float rounding
//! can creep into an amount that ends up on chain.

use crate::error::WireError;

fn overflow(amount: impl std::fmt::Display) -> WireError {
    WireError::Encoding(format!("amount {amount} exceeds u64::MAX base units"))
}

/// Convert a whole number of tokens to base units.
pub fn whole_tokens_to_base_units(whole: u64, decimals: u8) -> Result<u64, WireError> {
    if whole == 0 {
        return Ok(0);
    }
    10u64
        .checked_pow(decimals as u32)
        .and_then(|scale| whole.checked_mul(scale))
        .ok_or_else(|| overflow(format_args!("{whole}e{decimals}")))
}

/// Parse a decimal string such as `"12.5"` into base units.
///
/// Works on the digits directly, so any decimals value the mint allows is
/// accepted. Rejects signs, exponents, empty input, more fraction digits
/// than the mint supports and anything that would not fit in a u64.
pub fn ui_amount_to_base_units(ui_amount: &str, decimals: u8) -> Result<u64, WireError> {
    let text = ui_amount.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(WireError::Encoding(format!(
            "invalid token amount {ui_amount:?}"
        )));
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(WireError::Encoding(format!(
            "invalid token amount {ui_amount:?}"
        )));
    }
    if fraction.len() > decimals as usize {
        return Err(WireError::Encoding(format!(
            "{ui_amount:?} has more than {decimals} fraction digits"
        )));
    }

    // Base units are the whole digits followed by the fraction padded out
    // to `decimals` places.
    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(decimals as usize - fraction.len()));

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(0);
    }
    significant.parse::<u64>().map_err(|_| overflow(format_args!("{ui_amount:?}")))
}

/// Render base units as a decimal string without trailing zeros.
pub fn base_units_to_ui_string(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let digits = format!("{amount:0>width$}", width = decimals as usize + 1);
    let (whole, fraction) = digits.split_at(digits.len() - decimals as usize);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}
