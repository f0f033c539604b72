//! Settlement extension: the two hooks the order-filling primitive calls.
//!
//! - **Pre-hook** ([`SettlementExtension::quote`]): decode the auction from
//!   the order extension and price the fill at the current rate bump. Pure.
//! - **Post-hook** ([`SettlementExtension::post_interaction`]): gate the
//!   resolver, then charge the order's fee.
//!
//! Fees, one per order depending on its fee kind:
//!
//! ```text
//! kind 1  resolver fee   = max(1, floor(rate × order_fee_base_points × making / order.making))
//!         charged against the resolver's credit
//! kind 2  integrator fee = floor(taking × rate / integrator_fee_base)
//!         taker asset, resolver → integrator, spent under the resolver's
//!         allowance to the settlement address
//! ```

use fusion_auction::{FillSide, quote_fill};
use fusion_ledger::{FeeChargerAccess, Ledgers};
use fusion_types::math::{Rounding, mul_div};
use fusion_types::{
    Address, Amount, FeeSpec, FusionError, Order, Result, SettlementConfig, Timestamp,
};

use crate::whitelist::{WhitelistGate, WhitelistOracle};

/// Amounts for one fill after the pre-hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub making_amount: Amount,
    pub taking_amount: Amount,
    pub rate_bump: u64,
}

/// Fees charged by the post-hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChargedFees {
    pub resolver_fee: Amount,
    pub integrator_fee: Amount,
}

/// What the post-hook sees of a fill that has already moved the maker leg.
#[derive(Debug, Clone, Copy)]
pub struct PostFill<'a> {
    pub order: &'a Order,
    pub resolver: Address,
    pub making_amount: Amount,
    pub taking_amount: Amount,
    pub now: Timestamp,
}

/// Hook implementation bound to one deployment's addresses and fee bases.
/// Holds the only fee-charging capability of the credit ledger.
#[derive(Debug)]
pub struct SettlementExtension {
    address: Address,
    order_fee_base_points: Amount,
    integrator_fee_base: Amount,
    charger: FeeChargerAccess,
}

impl SettlementExtension {
    #[must_use]
    pub fn new(config: &SettlementConfig, charger: FeeChargerAccess) -> Self {
        Self {
            address: config.settlement_address,
            order_fee_base_points: config.order_fee_base_points,
            integrator_fee_base: config.integrator_fee_base,
            charger,
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Pre-hook: price a fill of `amount` (in `side` units) at `now`.
    pub fn quote(&self, order: &Order, side: FillSide, amount: Amount, now: Timestamp) -> Result<Quote> {
        let details = match side {
            FillSide::Making => order.extension.making_auction(self.address)?,
            FillSide::Taking => order.extension.taking_auction(self.address)?,
        };
        let (counter, rate_bump) = quote_fill(order, &details, side, amount, now)?;
        let (making_amount, taking_amount) = match side {
            FillSide::Making => (amount, counter),
            FillSide::Taking => (counter, amount),
        };
        Ok(Quote {
            making_amount,
            taking_amount,
            rate_bump,
        })
    }

    /// Post-hook: whitelist check, then the order's fee.
    ///
    /// # Errors
    /// - `ResolverIsNotWhitelisted` before anything is charged
    /// - `NotEnoughCredit` if a resolver fee exceeds available credit
    /// - token errors if the resolver cannot pay an integrator fee
    pub fn post_interaction<W: WhitelistOracle>(
        &self,
        gate: &WhitelistGate<W>,
        ledgers: &mut Ledgers,
        fill: &PostFill<'_>,
    ) -> Result<ChargedFees> {
        let data = fill.order.extension.post_interaction_data(self.address)?;
        gate.check_access(
            fill.resolver,
            &data.whitelist_data,
            Timestamp::from(data.auction_start_time),
            fill.now,
        )?;

        let mut fees = ChargedFees::default();
        match data.fee {
            FeeSpec::None => {}
            FeeSpec::ResolverFee { rate } => {
                fees.resolver_fee =
                    self.resolver_fee(rate, fill.making_amount, fill.order.making_amount)?;
                ledgers
                    .credits
                    .charge_fee(&self.charger, fill.resolver, fees.resolver_fee)?;
            }
            FeeSpec::IntegratorFee { integrator, rate } => {
                fees.integrator_fee = self.integrator_fee(rate, fill.taking_amount)?;
                ledgers.tokens.transfer_from(
                    fill.order.taker_asset,
                    self.address,
                    fill.resolver,
                    integrator,
                    fees.integrator_fee,
                )?;
            }
        }
        Ok(fees)
    }

    /// Credit fee for filling `making_amount` of an order of
    /// `order_making_amount`. Never zero when `rate` is non-zero.
    pub fn resolver_fee(
        &self,
        rate: u32,
        making_amount: Amount,
        order_making_amount: Amount,
    ) -> Result<Amount> {
        if rate == 0 {
            return Ok(0);
        }
        let full = Amount::from(rate)
            .checked_mul(self.order_fee_base_points)
            .ok_or(FusionError::ArithmeticOverflow {
                context: "resolver fee",
            })?;
        let fee = mul_div(
            full,
            making_amount,
            order_making_amount,
            Rounding::Floor,
            "resolver fee",
        )?;
        Ok(fee.max(1))
    }

    /// Integrator share of `taking_amount`, in the taker asset.
    pub fn integrator_fee(&self, rate: u32, taking_amount: Amount) -> Result<Amount> {
        mul_div(
            taking_amount,
            Amount::from(rate),
            self.integrator_fee_base,
            Rounding::Floor,
            "integrator fee",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whitelist::StaticWhitelist;
    use fusion_types::constants::WHITELIST_DATA_LEN;
    use fusion_types::{AuctionDetails, OrderExtension, PostInteractionData};

    const ETHER: Amount = 1_000_000_000_000_000_000;
    const TAG: [u8; WHITELIST_DATA_LEN] = [7; WHITELIST_DATA_LEN];
    const START: u32 = 10_000;

    fn resolver() -> Address {
        Address::repeat_byte(0x7e)
    }

    /// Fresh ledgers, `credit` deposited for the resolver, and the
    /// extension holding the ledger's fee charger.
    fn setup(credit: Amount) -> (SettlementExtension, Ledgers) {
        let (mut ledgers, access) = Ledgers::new();
        ledgers
            .credits
            .increase_available_credit(&access.fee_bank, resolver(), credit)
            .unwrap();
        (SettlementExtension::new(&SettlementConfig::default(), access.charger), ledgers)
    }

    fn ext() -> SettlementExtension {
        setup(0).0
    }

    fn order(fee: FeeSpec) -> Order {
        let cfg = SettlementConfig::default();
        let auction = AuctionDetails::new(START, 1_800, 1_000_000, Vec::new()).unwrap();
        let post = PostInteractionData {
            fee,
            auction_start_time: START,
            whitelist_data: TAG,
        };
        Order {
            salt: 1,
            maker: Address::repeat_byte(0xa1),
            maker_asset: Address::repeat_byte(0xda),
            taker_asset: Address::repeat_byte(0xee),
            making_amount: 100 * ETHER,
            taking_amount: ETHER / 10,
            extension: OrderExtension::build(cfg.settlement_address, &auction, &post).unwrap(),
        }
    }

    fn gate(delay: u64) -> WhitelistGate<StaticWhitelist> {
        WhitelistGate::new(StaticWhitelist::new().allow(TAG, resolver(), delay))
    }

    #[test]
    fn quote_applies_bump_at_start() {
        let o = order(FeeSpec::None);
        let q = ext().quote(&o, FillSide::Making, 100 * ETHER, u64::from(START)).unwrap();
        assert_eq!(q.rate_bump, 1_000_000);
        assert_eq!(q.taking_amount, 11 * ETHER / 100);

        let q = ext().quote(&o, FillSide::Taking, 11 * ETHER / 100, u64::from(START)).unwrap();
        assert_eq!(q.making_amount, 100 * ETHER);
    }

    #[test]
    fn quote_rejects_foreign_extension() {
        let mut o = order(FeeSpec::None);
        o.extension.making_amount_data[0] ^= 0xff;
        let err = ext().quote(&o, FillSide::Making, ETHER, 0).unwrap_err();
        assert!(matches!(err, FusionError::InvalidExtension { .. }));
    }

    #[test]
    fn resolver_fee_is_proportional_and_floored_at_one() {
        let e = ext();
        assert_eq!(e.resolver_fee(100, 100 * ETHER, 100 * ETHER).unwrap(), 100 * 1_000_000_000_000_000);
        assert_eq!(e.resolver_fee(100, 40 * ETHER, 100 * ETHER).unwrap(), 40 * 1_000_000_000_000_000);
        // 1e15 * 1 / 1e20 rounds to zero; the floor keeps it at one.
        assert_eq!(e.resolver_fee(1, 1, 100 * ETHER).unwrap(), 1);
        assert_eq!(e.resolver_fee(0, 100 * ETHER, 100 * ETHER).unwrap(), 0);
    }

    #[test]
    fn integrator_fee_uses_taking_amount() {
        // 1% of 0.1 WETH
        assert_eq!(ext().integrator_fee(10_000_000, ETHER / 10).unwrap(), ETHER / 1_000);
    }

    #[test]
    fn post_hook_rejects_before_charging() {
        let (e, mut ledgers) = setup(ETHER);
        let o = order(FeeSpec::ResolverFee { rate: 100 });
        let fill = PostFill {
            order: &o,
            resolver: resolver(),
            making_amount: 100 * ETHER,
            taking_amount: ETHER / 10,
            now: u64::from(START) + 59,
        };
        let err = e.post_interaction(&gate(60), &mut ledgers, &fill).unwrap_err();
        assert!(matches!(err, FusionError::ResolverIsNotWhitelisted { .. }));
        assert_eq!(ledgers.credits.available_credit(resolver()), ETHER);
    }

    #[test]
    fn post_hook_charges_credit() {
        let (e, mut ledgers) = setup(ETHER);
        let o = order(FeeSpec::ResolverFee { rate: 100 });
        let fill = PostFill {
            order: &o,
            resolver: resolver(),
            making_amount: 100 * ETHER,
            taking_amount: ETHER / 10,
            now: u64::from(START),
        };
        let fees = e.post_interaction(&gate(0), &mut ledgers, &fill).unwrap();
        assert_eq!(fees.resolver_fee, ETHER / 10);
        assert_eq!(fees.integrator_fee, 0);
        assert_eq!(ledgers.credits.available_credit(resolver()), 9 * ETHER / 10);
    }

    #[test]
    fn post_hook_without_credit_fails() {
        let (e, mut ledgers) = setup(0);
        let o = order(FeeSpec::ResolverFee { rate: 1 });
        let fill = PostFill {
            order: &o,
            resolver: resolver(),
            making_amount: 1,
            taking_amount: 1,
            now: u64::from(START),
        };
        let err = e.post_interaction(&gate(0), &mut ledgers, &fill).unwrap_err();
        assert_eq!(
            err,
            FusionError::NotEnoughCredit {
                account: resolver(),
                needed: 1,
                available: 0,
            }
        );
    }

    #[test]
    fn integrator_fee_leaves_credit_alone() {
        let (e, mut ledgers) = setup(ETHER);
        let integrator = Address::repeat_byte(0x1d);
        let weth = Address::repeat_byte(0xee);
        ledgers.tokens.mint(weth, resolver(), ETHER).unwrap();
        ledgers.tokens.approve(weth, resolver(), e.address(), Amount::MAX);

        let o = order(FeeSpec::IntegratorFee {
            integrator,
            rate: 1_000_000,
        });
        let fill = PostFill {
            order: &o,
            resolver: resolver(),
            making_amount: 100 * ETHER,
            taking_amount: ETHER / 10,
            now: u64::from(START),
        };
        let fees = e.post_interaction(&gate(0), &mut ledgers, &fill).unwrap();
        assert_eq!(fees.resolver_fee, 0);
        assert_eq!(fees.integrator_fee, ETHER / 10_000);
        assert_eq!(ledgers.tokens.balance_of(weth, integrator), ETHER / 10_000);
        assert_eq!(ledgers.credits.available_credit(resolver()), ETHER);
    }

    #[test]
    fn integrator_fee_needs_settlement_allowance() {
        let (e, mut ledgers) = setup(0);
        let weth = Address::repeat_byte(0xee);
        let lop = SettlementConfig::default().limit_order_protocol;
        ledgers.tokens.mint(weth, resolver(), ETHER).unwrap();
        // An allowance to the order-filling protocol does not cover fees.
        ledgers.tokens.approve(weth, resolver(), lop, Amount::MAX);

        let o = order(FeeSpec::IntegratorFee {
            integrator: Address::repeat_byte(0x1d),
            rate: 1_000_000,
        });
        let fill = PostFill {
            order: &o,
            resolver: resolver(),
            making_amount: 100 * ETHER,
            taking_amount: ETHER / 10,
            now: u64::from(START),
        };
        let err = e.post_interaction(&gate(0), &mut ledgers, &fill).unwrap_err();
        assert!(matches!(err, FusionError::InsufficientAllowance { .. }));
    }
}
