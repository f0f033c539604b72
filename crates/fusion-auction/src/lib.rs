//! # fusion-auction
//!
//! **Pure Dutch-auction pricing for fusion orders.**
//!
//! - **Zero side effects**: no ledgers, no clocks; time is an argument
//! - **Deterministic output**: same inputs → same bump, same amounts
//! - **No silent overflow**: every product runs through a 256-bit
//!   intermediate and fails with `ArithmeticOverflow` instead of wrapping

pub mod amounts;
pub mod curve;

pub use amounts::{apply_rate_bump, get_making_amount, get_taking_amount, remove_rate_bump};
pub use curve::compute_rate_bump;

use fusion_types::{Amount, AuctionDetails, Order, Result, Timestamp};

/// Which side of the order a fill amount is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillSide {
    Making,
    Taking,
}

/// Auction-adjusted counter amount for a fill at `now`.
///
/// For a making-denominated fill returns the taking amount owed; for a
/// taking-denominated fill returns the making amount released. Also returns
/// the rate bump that was applied.
pub fn quote_fill(
    order: &Order,
    details: &AuctionDetails,
    side: FillSide,
    amount: Amount,
    now: Timestamp,
) -> Result<(Amount, u64)> {
    let rate_bump = compute_rate_bump(now, details);
    let counter = match side {
        FillSide::Making => get_taking_amount(order, amount, rate_bump)?,
        FillSide::Taking => get_making_amount(order, amount, rate_bump)?,
    };
    tracing::trace!(
        ?side,
        amount,
        counter,
        rate_bump,
        now,
        "Auction quote"
    );
    Ok((counter, rate_bump))
}
