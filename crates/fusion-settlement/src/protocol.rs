//! Order-filling primitive.
//!
//! Tracks how much of each order is left and moves the two legs of a fill.
//! A fill is split in two around the resolver's own work:
//!
//! 1. [`LimitOrderProtocol::open_fill`]: pre-hook quote, threshold check,
//!    remaining check, maker asset maker → resolver, post-hook.
//! 2. [`LimitOrderProtocol::close_fill`]: taker asset resolver → maker.
//!
//! Chained settlements open every link first and close them in reverse, so
//! the resolver can pay earlier makers with what later makers released.
//! Both legs pull tokens with the protocol address as spender.

use std::collections::HashMap;

use fusion_auction::FillSide;
use fusion_ledger::Ledgers;
use fusion_types::{Address, Amount, FusionError, Order, OrderHash, Result, TakerTraits, Timestamp};

use crate::chain::ChainLink;
use crate::extension::{PostFill, Quote, SettlementExtension};
use crate::receipt::FillReceipt;
use crate::whitelist::{WhitelistGate, WhitelistOracle};

/// Everything a fill needs besides mutable state.
#[derive(Debug)]
pub struct FillContext<'a, W> {
    pub extension: &'a SettlementExtension,
    pub gate: &'a WhitelistGate<W>,
    pub resolver: Address,
    pub now: Timestamp,
}

/// Remaining-amount table and token legs for fills.
#[derive(Debug, Clone)]
pub struct LimitOrderProtocol {
    address: Address,
    /// Remaining making amount per order; absent means untouched.
    remaining: HashMap<OrderHash, Amount>,
}

impl LimitOrderProtocol {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            remaining: HashMap::new(),
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Making amount still fillable on `order`.
    pub fn remaining(&self, order: &Order) -> Result<Amount> {
        Ok(self.remaining_by_hash(&order.hash()?, order))
    }

    fn remaining_by_hash(&self, hash: &OrderHash, order: &Order) -> Amount {
        self.remaining
            .get(hash)
            .copied()
            .unwrap_or(order.making_amount)
    }

    fn consume(&mut self, hash: OrderHash, order: &Order, making: Amount) -> Result<()> {
        let remaining = self.remaining_by_hash(&hash, order);
        let left = remaining
            .checked_sub(making)
            .ok_or(FusionError::OrderRemainingExceeded {
                order_hash: hash,
                requested: making,
                remaining,
            })?;
        self.remaining.insert(hash, left);
        Ok(())
    }

    /// First half of a fill. Returns the receipt the second half settles.
    pub fn open_fill<W: WhitelistOracle>(
        &mut self,
        ctx: &FillContext<'_, W>,
        ledgers: &mut Ledgers,
        link: &ChainLink,
    ) -> Result<FillReceipt> {
        let order = &link.order;
        let order_hash = order.hash()?;
        let side = if link.taker_traits.is_making_amount {
            FillSide::Making
        } else {
            FillSide::Taking
        };

        let quote = ctx.extension.quote(order, side, link.amount, ctx.now)?;
        if quote.making_amount == 0 || quote.taking_amount == 0 {
            return Err(FusionError::ZeroFillAmount(order_hash));
        }
        check_threshold(&link.taker_traits, &quote)?;
        self.consume(order_hash, order, quote.making_amount)?;

        ledgers.tokens.transfer_from(
            order.maker_asset,
            self.address,
            order.maker,
            ctx.resolver,
            quote.making_amount,
        )?;

        let fees = ctx.extension.post_interaction(
            ctx.gate,
            ledgers,
            &PostFill {
                order,
                resolver: ctx.resolver,
                making_amount: quote.making_amount,
                taking_amount: quote.taking_amount,
                now: ctx.now,
            },
        )?;

        tracing::debug!(
            order = %order_hash,
            maker = %order.maker,
            making = quote.making_amount,
            taking = quote.taking_amount,
            rate_bump = quote.rate_bump,
            resolver_fee = fees.resolver_fee,
            integrator_fee = fees.integrator_fee,
            "Fill opened"
        );

        Ok(FillReceipt {
            order_hash,
            maker: order.maker,
            maker_asset: order.maker_asset,
            taker_asset: order.taker_asset,
            making_amount: quote.making_amount,
            taking_amount: quote.taking_amount,
            rate_bump: quote.rate_bump,
            resolver_fee: fees.resolver_fee,
            integrator_fee: fees.integrator_fee,
        })
    }

    /// Second half of a fill: pay the maker.
    pub fn close_fill(&self, ledgers: &mut Ledgers, resolver: Address, fill: &FillReceipt) -> Result<()> {
        ledgers.tokens.transfer_from(
            fill.taker_asset,
            self.address,
            resolver,
            fill.maker,
            fill.taking_amount,
        )?;
        tracing::debug!(order = %fill.order_hash, taking = fill.taking_amount, "Fill closed");
        Ok(())
    }
}

/// Making mode caps what the taker pays; taking mode floors what the taker
/// receives. A zero threshold disables the cap.
pub fn check_threshold(traits: &TakerTraits, quote: &Quote) -> Result<()> {
    if traits.is_making_amount {
        if traits.threshold != 0 && quote.taking_amount > traits.threshold {
            return Err(FusionError::TakingAmountTooHigh {
                taking: quote.taking_amount,
                threshold: traits.threshold,
            });
        }
    } else if quote.making_amount < traits.threshold {
        return Err(FusionError::MakingAmountTooLow {
            making: quote.making_amount,
            threshold: traits.threshold,
        });
    }
    Ok(())
}
