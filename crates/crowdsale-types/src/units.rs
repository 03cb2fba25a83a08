//! Amount types and unit conversion.
//!
//! Value and token amounts are unsigned integers in the smallest unit
//! (wei for native value, base units for tokens). Human-readable amounts
//! go through [`rust_decimal::Decimal`] so that `0.98765 ether` converts to
//! wei exactly.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::{constants, Result, SaleError};

/// Smallest-unit amount of native value or tokens.
pub type Amount = u128;

/// Tokens minted per smallest unit of contributed value.
pub type Rate = u128;

/// Convert a whole/fractional ether amount into wei.
///
/// # Errors
/// Returns `InvalidConfig` for negative values, values with more than
/// 18 fractional digits, or values that don't fit the decimal range.
pub fn ether(value: Decimal) -> Result<Amount> {
    to_base_units(value, constants::ETHER_DECIMALS)
}

/// Convert wei into a human-readable ether amount.
///
/// # Errors
/// Returns `ArithmeticOverflow` when `wei` exceeds the decimal mantissa.
pub fn to_ether(wei: Amount) -> Result<Decimal> {
    from_base_units(wei, constants::ETHER_DECIMALS)
}

/// Convert a human-readable amount into base units with `decimals` places.
///
/// # Errors
/// See [`ether`].
pub fn to_base_units(value: Decimal, decimals: u32) -> Result<Amount> {
    if decimals > constants::MAX_DECIMALS {
        return Err(SaleError::InvalidConfig(format!(
            "at most {} decimals supported, got {decimals}",
            constants::MAX_DECIMALS
        )));
    }
    if value.is_sign_negative() {
        return Err(SaleError::InvalidConfig(format!(
            "amount must not be negative: {value}"
        )));
    }
    let scale = Decimal::from_i128_with_scale(10_i128.pow(decimals), 0);
    let scaled = value
        .checked_mul(scale)
        .ok_or(SaleError::ArithmeticOverflow("to_base_units"))?;
    if scaled.fract() != Decimal::ZERO {
        return Err(SaleError::InvalidConfig(format!(
            "amount {value} has more than {decimals} fractional digits"
        )));
    }
    scaled
        .to_u128()
        .ok_or(SaleError::ArithmeticOverflow("to_base_units"))
}

/// Convert base units with `decimals` places into a human-readable amount.
///
/// # Errors
/// Returns `ArithmeticOverflow` when `amount` exceeds the decimal mantissa.
pub fn from_base_units(amount: Amount, decimals: u32) -> Result<Decimal> {
    let signed =
        i128::try_from(amount).map_err(|_| SaleError::ArithmeticOverflow("from_base_units"))?;
    Decimal::try_from_i128_with_scale(signed, decimals)
        .map(|d| d.normalize())
        .map_err(|_| SaleError::ArithmeticOverflow("from_base_units"))
}

/// `amount * numerator / denominator` with checked arithmetic, truncating.
///
/// # Errors
/// Returns `ArithmeticOverflow` on overflow or a zero denominator.
pub fn mul_div(
    amount: Amount,
    numerator: Amount,
    denominator: Amount,
    ctx: &'static str,
) -> Result<Amount> {
    if denominator == 0 {
        return Err(SaleError::ArithmeticOverflow(ctx));
    }
    amount
        .checked_mul(numerator)
        .map(|v| v / denominator)
        .ok_or(SaleError::ArithmeticOverflow(ctx))
}
