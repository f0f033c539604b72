//! The settlement engine: owns every ledger and runs each operation as one
//! all-or-nothing transaction.
//!
//! ## Settlement flow
//!
//! ```text
//! settle_orders(caller, resolver, calldata)
//!   ├─ owner check, chain decode            (no state touched yet)
//!   └─ transaction
//!        ├─ apply permits                   (with-permits variant only)
//!        ├─ for each link, outermost first: open fill
//!        │     quote → threshold → remaining → maker leg → post-hook
//!        ├─ resolver calls                  (innermost leg)
//!        └─ for each link, innermost first: close fill (taker leg)
//! ```
//!
//! Any error at any step restores the state captured when the transaction
//! began: token balances, allowances, permit nonces, credit, deposits and
//! remaining amounts.

use std::collections::HashMap;

use fusion_auction::FillSide;
use fusion_ledger::{FeeBank, Ledgers, atomically};
use fusion_types::{
    Address, Amount, FusionError, Order, PermitBatch, Result, SettlementConfig, Timestamp,
    constants,
};

use crate::chain::SettlementChain;
use crate::clock::{Clock, SystemClock};
use crate::extension::{Quote, SettlementExtension};
use crate::protocol::{FillContext, LimitOrderProtocol};
use crate::receipt::{FillReceipt, SettlementReceipt};
use crate::resolver::Resolver;
use crate::whitelist::{WhitelistGate, WhitelistOracle};

/// Everything a transaction may change.
#[derive(Debug, Clone)]
struct EngineState {
    ledgers: Ledgers,
    fee_bank: FeeBank,
    protocol: LimitOrderProtocol,
}

/// Run `f` as one transaction, logging rollbacks.
fn transact<T>(
    state: &mut EngineState,
    operation: &'static str,
    f: impl FnOnce(&mut EngineState) -> Result<T>,
) -> Result<T> {
    atomically(state, f).inspect_err(|error| {
        tracing::warn!(operation, %error, "Transaction rolled back");
    })
}

/// Settlement engine instance.
pub struct SettlementEngine<W, C = SystemClock> {
    config: SettlementConfig,
    extension: SettlementExtension,
    gate: WhitelistGate<W>,
    clock: C,
    resolvers: HashMap<Address, Resolver>,
    state: EngineState,
}

impl<W: WhitelistOracle, C: Clock> SettlementEngine<W, C> {
    /// Validate `config` and start with empty ledgers.
    pub fn new(config: SettlementConfig, oracle: W, clock: C) -> Result<Self> {
        config.validate()?;
        let (ledgers, access) = Ledgers::new();
        let fee_bank = FeeBank::new(config.fee_bank.clone(), access.fee_bank);
        let protocol = LimitOrderProtocol::new(config.limit_order_protocol);

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            settlement = %config.settlement_address,
            protocol = %config.limit_order_protocol,
            fee_bank = %config.fee_bank.address,
            fee_token = %config.fee_bank.fee_token,
            max_chain_depth = config.max_chain_depth,
            "Settlement engine started"
        );

        Ok(Self {
            extension: SettlementExtension::new(&config, access.charger),
            config,
            gate: WhitelistGate::new(oracle),
            clock,
            resolvers: HashMap::new(),
            state: EngineState {
                ledgers,
                fee_bank,
                protocol,
            },
        })
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    #[must_use]
    pub fn whitelist(&self) -> &WhitelistGate<W> {
        &self.gate
    }

    #[must_use]
    pub fn balance_of(&self, token: Address, holder: Address) -> Amount {
        self.state.ledgers.tokens.balance_of(token, holder)
    }

    #[must_use]
    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> Amount {
        self.state.ledgers.tokens.allowance(token, owner, spender)
    }

    #[must_use]
    pub fn permit_nonce(&self, token: Address, owner: Address) -> u64 {
        self.state.ledgers.tokens.nonce(token, owner)
    }

    #[must_use]
    pub fn total_supply(&self, token: Address) -> Amount {
        self.state.ledgers.tokens.total_supply(token)
    }

    /// Fee token recorded as deposited for `account`.
    #[must_use]
    pub fn account_deposits(&self, account: Address) -> Amount {
        self.state.fee_bank.account_deposits(account)
    }

    /// Fee credit `account` can still spend on settlements.
    #[must_use]
    pub fn available_credit(&self, account: Address) -> Amount {
        self.state.ledgers.credits.available_credit(account)
    }

    #[must_use]
    pub fn fee_bank(&self) -> &FeeBank {
        &self.state.fee_bank
    }

    /// Making amount still fillable on `order`.
    pub fn remaining(&self, order: &Order) -> Result<Amount> {
        self.state.protocol.remaining(order)
    }

    #[must_use]
    pub fn resolver(&self, address: Address) -> Option<&Resolver> {
        self.resolvers.get(&address)
    }

    /// Price a fill at the current time without executing it.
    pub fn quote(&self, order: &Order, side: FillSide, amount: Amount) -> Result<Quote> {
        self.extension.quote(order, side, amount, self.clock.now())
    }

    // -----------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------

    /// Fund `to` with new supply.
    pub fn mint(&mut self, token: Address, to: Address, amount: Amount) -> Result<()> {
        transact(&mut self.state, "mint", |s| s.ledgers.tokens.mint(token, to, amount))
    }

    /// `caller` sets `spender`'s allowance over its `token`.
    pub fn approve(&mut self, caller: Address, token: Address, spender: Address, amount: Amount) {
        self.state.ledgers.tokens.approve(token, caller, spender, amount);
    }

    /// `caller` sends `amount` of its `token` to `to`.
    pub fn transfer(&mut self, caller: Address, token: Address, to: Address, amount: Amount) -> Result<()> {
        transact(&mut self.state, "transfer", |s| {
            s.ledgers.tokens.transfer(token, caller, to, amount)
        })
    }

    // -----------------------------------------------------------------
    // Fee bank
    // -----------------------------------------------------------------

    pub fn deposit(&mut self, caller: Address, amount: Amount) -> Result<Amount> {
        transact(&mut self.state, "deposit", |s| {
            s.fee_bank.deposit(&mut s.ledgers, caller, amount)
        })
    }

    pub fn deposit_for(&mut self, caller: Address, beneficiary: Address, amount: Amount) -> Result<Amount> {
        transact(&mut self.state, "deposit_for", |s| {
            s.fee_bank.deposit_for(&mut s.ledgers, caller, beneficiary, amount)
        })
    }

    /// Deposit authorised by a signed permit payload over the fee token.
    pub fn deposit_with_permit(&mut self, caller: Address, amount: Amount, permit: &[u8]) -> Result<Amount> {
        let now = self.clock.now();
        transact(&mut self.state, "deposit_with_permit", |s| {
            s.fee_bank
                .deposit_with_permit(&mut s.ledgers, caller, amount, permit, now)
        })
    }

    pub fn deposit_for_with_permit(
        &mut self,
        caller: Address,
        beneficiary: Address,
        amount: Amount,
        permit: &[u8],
    ) -> Result<Amount> {
        let now = self.clock.now();
        transact(&mut self.state, "deposit_for_with_permit", |s| {
            s.fee_bank.deposit_for_with_permit(
                &mut s.ledgers,
                caller,
                beneficiary,
                amount,
                permit,
                now,
            )
        })
    }

    pub fn withdraw(&mut self, caller: Address, amount: Amount) -> Result<Amount> {
        transact(&mut self.state, "withdraw", |s| {
            s.fee_bank.withdraw(&mut s.ledgers, caller, amount)
        })
    }

    pub fn withdraw_to(&mut self, caller: Address, recipient: Address, amount: Amount) -> Result<Amount> {
        transact(&mut self.state, "withdraw_to", |s| {
            s.fee_bank.withdraw_to(&mut s.ledgers, caller, recipient, amount)
        })
    }

    /// Owner-only sweep of consumed fees.
    pub fn gather_fees(&mut self, caller: Address, accounts: &[Address]) -> Result<Amount> {
        transact(&mut self.state, "gather_fees", |s| {
            s.fee_bank.gather_fees(&mut s.ledgers, caller, accounts)
        })
    }

    // -----------------------------------------------------------------
    // Resolvers
    // -----------------------------------------------------------------

    /// Register a resolver account controlled by `owner`.
    pub fn register_resolver(&mut self, address: Address, owner: Address) -> Result<()> {
        let contracts = [
            self.config.settlement_address,
            self.config.limit_order_protocol,
            self.config.fee_bank.address,
        ];
        if address.is_zero() || contracts.contains(&address) || self.resolvers.contains_key(&address) {
            return Err(FusionError::Configuration(format!(
                "resolver address {address} unavailable"
            )));
        }
        self.resolvers.insert(address, Resolver::new(address, owner));
        tracing::info!(resolver = %address, %owner, "Resolver registered");
        Ok(())
    }

    fn owned_resolver(&self, caller: Address, address: Address) -> Result<Resolver> {
        let resolver = *self
            .resolvers
            .get(&address)
            .ok_or(FusionError::UnknownResolver(address))?;
        resolver.ensure_owner(caller)?;
        Ok(resolver)
    }

    /// Owner grants `spender` an unlimited allowance over the resolver's
    /// `token`.
    pub fn resolver_approve(
        &mut self,
        caller: Address,
        resolver: Address,
        token: Address,
        spender: Address,
    ) -> Result<()> {
        let resolver = self.owned_resolver(caller, resolver)?;
        resolver.approve(&mut self.state.ledgers.tokens, token, spender);
        Ok(())
    }

    /// Settle a chain of orders through `resolver`.
    pub fn settle_orders(
        &mut self,
        caller: Address,
        resolver: Address,
        calldata: &[u8],
    ) -> Result<SettlementReceipt> {
        self.settle(caller, resolver, calldata, &PermitBatch::default())
    }

    /// Apply a packed permit batch, then settle as
    /// [`settle_orders`](Self::settle_orders). Permits and fills share one
    /// transaction.
    pub fn settle_orders_with_permits(
        &mut self,
        caller: Address,
        resolver: Address,
        calldata: &[u8],
        permit_flags: u32,
        permit_blob: &[u8],
    ) -> Result<SettlementReceipt> {
        let permits = PermitBatch::decode(permit_flags, permit_blob)?;
        self.settle(caller, resolver, calldata, &permits)
    }

    fn settle(
        &mut self,
        caller: Address,
        resolver: Address,
        calldata: &[u8],
        permits: &PermitBatch,
    ) -> Result<SettlementReceipt> {
        let resolver = self.owned_resolver(caller, resolver)?;
        let chain = SettlementChain::decode(resolver.address, calldata, self.config.max_chain_depth)?;
        let now = self.clock.now();
        let spender = self.config.limit_order_protocol;
        let ctx = FillContext {
            extension: &self.extension,
            gate: &self.gate,
            resolver: resolver.address,
            now,
        };

        let fills = transact(&mut self.state, "settle_orders", |s| {
            for permit in &permits.permits {
                s.ledgers.tokens.apply_permit(permit, spender, now)?;
            }
            execute_chain(s, &ctx, &resolver, &chain)
        })?;

        let receipt = SettlementReceipt::new(resolver.address, now, fills);
        tracing::info!(
            receipt = %receipt.id,
            resolver = %resolver.address,
            fills = receipt.fills.len(),
            permits = permits.permits.len(),
            resolver_fee = receipt.total_resolver_fee(),
            "Settlement committed"
        );
        Ok(receipt)
    }
}

/// Open every link, run the innermost calls, then close links in reverse.
fn execute_chain<W: WhitelistOracle>(
    state: &mut EngineState,
    ctx: &FillContext<'_, W>,
    resolver: &Resolver,
    chain: &SettlementChain,
) -> Result<Vec<FillReceipt>> {
    let mut fills = Vec::with_capacity(chain.links.len());
    for link in &chain.links {
        fills.push(state.protocol.open_fill(ctx, &mut state.ledgers, link)?);
    }
    resolver.execute(&mut state.ledgers.tokens, &chain.calls)?;
    for fill in fills.iter().rev() {
        state
            .protocol
            .close_fill(&mut state.ledgers, resolver.address, fill)?;
    }
    Ok(fills)
}
