//! Full-width integer helpers.
//!
//! Amounts are `u128`, but products like `rate * base_points * making`
//! routinely exceed 128 bits before the final division. Every such
//! computation goes through a 256-bit intermediate and fails loudly rather
//! than wrapping.

use alloy_primitives::U256;

use crate::{Amount, FusionError, Result};

/// Rounding direction for [`mul_div`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Truncate toward zero.
    Floor,
    /// Round any non-zero remainder up.
    Ceil,
}

/// `a * b / denominator` with a 256-bit intermediate.
///
/// # Errors
/// - `DivisionByZero` if `denominator == 0`
/// - `ArithmeticOverflow` if the quotient does not fit in `u128`
pub fn mul_div(
    a: Amount,
    b: Amount,
    denominator: Amount,
    rounding: Rounding,
    context: &'static str,
) -> Result<Amount> {
    div_u256(
        U256::from(a) * U256::from(b),
        U256::from(denominator),
        rounding,
        context,
    )
}

/// Divide two 256-bit values and narrow the quotient back to `u128`.
pub fn div_u256(
    numerator: U256,
    denominator: U256,
    rounding: Rounding,
    context: &'static str,
) -> Result<Amount> {
    if denominator.is_zero() {
        return Err(FusionError::DivisionByZero { context });
    }
    let (mut quotient, remainder) = numerator.div_rem(denominator);
    if rounding == Rounding::Ceil && !remainder.is_zero() {
        quotient = quotient
            .checked_add(U256::from(1u8))
            .ok_or(FusionError::ArithmeticOverflow { context })?;
    }
    Amount::try_from(quotient).map_err(|_| FusionError::ArithmeticOverflow { context })
}

/// Checked product of several factors in 256 bits.
pub fn checked_product(factors: &[Amount], context: &'static str) -> Result<U256> {
    factors.iter().try_fold(U256::from(1u8), |acc, &f| {
        acc.checked_mul(U256::from(f))
            .ok_or(FusionError::ArithmeticOverflow { context })
    })
}
