//! Shared fixtures for the settlement integration tests.

#![allow(dead_code)]

use fusion_settlement::{
    ChainLink, ManualClock, SettlementChain, SettlementEngine, SettlementReceipt, StaticWhitelist,
};
use fusion_types::constants::WHITELIST_DATA_LEN;
use fusion_types::{
    Address, Amount, AuctionDetails, FeeSpec, Order, OrderExtension, PostInteractionData,
    ResolverCall, Result, SettlementConfig, TakerTraits,
};

pub const ETHER: Amount = 1_000_000_000_000_000_000;
/// Auction start used by every order.
pub const T0: u32 = 1_700_000_000;
pub const TAG: [u8; WHITELIST_DATA_LEN] = [0x42; WHITELIST_DATA_LEN];

pub const DAI: Address = Address::repeat_byte(0xda);
pub const WETH: Address = Address::repeat_byte(0xee);
pub const USDC: Address = Address::repeat_byte(0xcc);

pub const RESOLVER: Address = Address::repeat_byte(0x7e);
pub const RESOLVER_OWNER: Address = Address::repeat_byte(0x0a);
pub const ALICE: Address = Address::repeat_byte(0xa1);
pub const BOB: Address = Address::repeat_byte(0xb0);
pub const CAROL: Address = Address::repeat_byte(0xc0);
pub const INTEGRATOR: Address = Address::repeat_byte(0x1d);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An engine with one registered resolver, approved to the protocol for
/// the three swap tokens, and a manual clock at `T0`.
pub struct Harness {
    pub engine: SettlementEngine<StaticWhitelist, ManualClock>,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_whitelist(StaticWhitelist::new().allow(TAG, RESOLVER, 0))
    }

    pub fn with_whitelist(whitelist: StaticWhitelist) -> Self {
        init_tracing();
        let clock = ManualClock::new(u64::from(T0));
        let mut engine =
            SettlementEngine::new(SettlementConfig::default(), whitelist, clock.clone()).unwrap();
        engine.register_resolver(RESOLVER, RESOLVER_OWNER).unwrap();
        let lop = engine.config().limit_order_protocol;
        for token in [DAI, WETH, USDC] {
            engine
                .resolver_approve(RESOLVER_OWNER, RESOLVER, token, lop)
                .unwrap();
        }
        Self { engine, clock }
    }

    pub fn lop(&self) -> Address {
        self.engine.config().limit_order_protocol
    }

    pub fn fee_token(&self) -> Address {
        self.engine.config().fee_bank.fee_token
    }

    pub fn fee_bank(&self) -> Address {
        self.engine.config().fee_bank.address
    }

    /// Approve the settlement address to pull integrator fees from the
    /// resolver.
    pub fn approve_settlement(&mut self, tokens: &[Address]) {
        let settlement = self.engine.config().settlement_address;
        for &token in tokens {
            self.engine
                .resolver_approve(RESOLVER_OWNER, RESOLVER, token, settlement)
                .unwrap();
        }
    }

    /// Set the clock `seconds` after the auction start.
    pub fn at(&self, seconds: u64) {
        self.clock.set(u64::from(T0) + seconds);
    }

    /// Mint fee token to the resolver owner and deposit it as the
    /// resolver's credit.
    pub fn fund_credit(&mut self, amount: Amount) {
        let token = self.fee_token();
        let bank = self.fee_bank();
        self.engine.mint(token, RESOLVER_OWNER, amount).unwrap();
        self.engine.approve(RESOLVER_OWNER, token, bank, Amount::MAX);
        self.engine
            .deposit_for(RESOLVER_OWNER, RESOLVER, amount)
            .unwrap();
    }

    /// Give `maker` the making amount and approve the protocol.
    pub fn fund_maker(&mut self, order: &Order) {
        self.engine
            .mint(order.maker_asset, order.maker, order.making_amount)
            .unwrap();
        let lop = self.lop();
        self.engine
            .approve(order.maker, order.maker_asset, lop, Amount::MAX);
    }

    pub fn settle(&mut self, links: Vec<ChainLink>, calls: Vec<ResolverCall>) -> Result<SettlementReceipt> {
        let calldata = chain(links, calls).encode()?;
        self.engine
            .settle_orders(RESOLVER_OWNER, RESOLVER, &calldata)
    }

    pub fn balance(&self, token: Address, holder: Address) -> Amount {
        self.engine.balance_of(token, holder)
    }

    pub fn credit(&self) -> Amount {
        self.engine.available_credit(RESOLVER)
    }
}

pub fn chain(links: Vec<ChainLink>, calls: Vec<ResolverCall>) -> SettlementChain {
    SettlementChain {
        resolver: RESOLVER,
        links,
        calls,
    }
}

/// An auction with no bump at all.
pub fn flat_auction() -> AuctionDetails {
    AuctionDetails::flat(T0, 1_800)
}

/// An auction starting at a 10% bump, decaying linearly to zero over 1800s.
pub fn decaying_auction() -> AuctionDetails {
    AuctionDetails::new(T0, 1_800, 1_000_000, Vec::new()).unwrap()
}

pub fn order(
    salt: u64,
    maker: Address,
    (maker_asset, making_amount): (Address, Amount),
    (taker_asset, taking_amount): (Address, Amount),
    auction: &AuctionDetails,
    fee: FeeSpec,
) -> Order {
    let post = PostInteractionData {
        fee,
        auction_start_time: T0,
        whitelist_data: TAG,
    };
    Order {
        salt,
        maker,
        maker_asset,
        taker_asset,
        making_amount,
        taking_amount,
        extension: OrderExtension::build(
            SettlementConfig::default().settlement_address,
            auction,
            &post,
        )
        .unwrap(),
    }
}

/// Fill `amount` making units of `order`.
pub fn fill(order: &Order, amount: Amount) -> ChainLink {
    ChainLink {
        order: order.clone(),
        amount,
        taker_traits: TakerTraits::making(0),
    }
}
