//! Decimal string formatting for token amounts
//!
//! Rate limits are stored in the manifest as decimal strings whose
//! fractional part has exactly as many digits as the token has decimals
//! on that chain (e.g. `"1.500000"` for 1.5 tokens with 6 decimals).

use alloy::primitives::U256;

use crate::error::NttError;

/// Format a raw integer amount as a decimal string with `decimals` fractional digits.
///
/// Zero is always `"0."` followed by `decimals` zeros. Amounts smaller than
/// one whole token are left-padded so the integer part is `"0"`.
pub fn format_number(raw: U256, decimals: u8) -> String {
    let decimals = decimals as usize;
    if raw.is_zero() {
        return format!("0.{}", "0".repeat(decimals));
    }

    let digits = raw.to_string();
    let digits = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
    format!("{}.{}", int_part, frac_part)
}

/// Check that `s` has exactly one `.` followed by exactly `decimals` characters.
///
/// This is a shape check only: the integer part is not validated.
pub fn check_number_formatting(s: &str, decimals: u8) -> bool {
    let mut parts = s.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(frac), None) => frac.len() == decimals as usize,
        _ => false,
    }
}

/// Convert a well-formed decimal string back to its raw integer amount.
///
/// The decimal point is stripped, so the caller must have checked the
/// fractional digit count with [`check_number_formatting`] first.
pub fn parse_decimal_string(s: &str) -> Result<U256, NttError> {
    let digits: String = s.chars().filter(|c| *c != '.').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(NttError::InvalidAmount(s.to_string()));
    }
    U256::from_str_radix(&digits, 10).map_err(|_| NttError::InvalidAmount(s.to_string()))
}

/// Whether a decimal string denotes zero
pub fn is_zero_amount(s: &str) -> bool {
    s.chars().filter(|c| *c != '.').all(|c| c == '0')
}

/// Scale an amount between decimal precisions (truncating when reducing)
pub fn scale_amount(amount: U256, from_decimals: u8, to_decimals: u8) -> U256 {
    if from_decimals == to_decimals {
        amount
    } else if from_decimals < to_decimals {
        amount * U256::from(10u64).pow(U256::from(to_decimals - from_decimals))
    } else {
        amount / U256::from(10u64).pow(U256::from(from_decimals - to_decimals))
    }
}
