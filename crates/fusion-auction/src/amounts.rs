//! Auction-adjusted fill amounts.
//!
//! A positive rate bump makes the taker pay more for the same making amount
//! (or receive less making amount for the same taking amount). Taking
//! amounts round up and making amounts round down, so rounding never works
//! against the maker.

use fusion_types::constants::RATE_BUMP_BASIS;
use fusion_types::math::{Rounding, checked_product, div_u256, mul_div};
use fusion_types::{Amount, Order, Result};

fn bumped_basis(rate_bump: u64) -> Result<Amount> {
    Amount::from(RATE_BUMP_BASIS)
        .checked_add(Amount::from(rate_bump))
        .ok_or(fusion_types::FusionError::ArithmeticOverflow {
            context: "rate bump basis",
        })
}

/// `amount * (BASIS + rate_bump) / BASIS`, truncating.
pub fn apply_rate_bump(amount: Amount, rate_bump: u64) -> Result<Amount> {
    mul_div(
        amount,
        bumped_basis(rate_bump)?,
        Amount::from(RATE_BUMP_BASIS),
        Rounding::Floor,
        "apply rate bump",
    )
}

/// `amount * BASIS / (BASIS + rate_bump)`, truncating. Inverse direction of
/// [`apply_rate_bump`].
pub fn remove_rate_bump(amount: Amount, rate_bump: u64) -> Result<Amount> {
    mul_div(
        amount,
        Amount::from(RATE_BUMP_BASIS),
        bumped_basis(rate_bump)?,
        Rounding::Floor,
        "remove rate bump",
    )
}

/// Taking amount owed for `making_amount` of `order` under `rate_bump`.
///
/// `ceil(order.taking * making * (BASIS + bump) / (order.making * BASIS))`
pub fn get_taking_amount(order: &Order, making_amount: Amount, rate_bump: u64) -> Result<Amount> {
    let numerator = checked_product(
        &[order.taking_amount, making_amount, bumped_basis(rate_bump)?],
        "taking amount",
    )?;
    let denominator = checked_product(
        &[order.making_amount, Amount::from(RATE_BUMP_BASIS)],
        "taking amount",
    )?;
    div_u256(numerator, denominator, Rounding::Ceil, "taking amount")
}

/// Making amount released for `taking_amount` of `order` under `rate_bump`.
///
/// `floor(order.making * taking * BASIS / (order.taking * (BASIS + bump)))`
pub fn get_making_amount(order: &Order, taking_amount: Amount, rate_bump: u64) -> Result<Amount> {
    let numerator = checked_product(
        &[order.making_amount, taking_amount, Amount::from(RATE_BUMP_BASIS)],
        "making amount",
    )?;
    let denominator = checked_product(
        &[order.taking_amount, bumped_basis(rate_bump)?],
        "making amount",
    )?;
    div_u256(numerator, denominator, Rounding::Floor, "making amount")
}
