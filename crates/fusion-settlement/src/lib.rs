//! # fusion-settlement
//!
//! **Atomic settlement of Dutch-auction orders by whitelisted resolvers.**
//!
//! ## Architecture
//!
//! - [`whitelist`]: `WhitelistGate` over a pluggable `WhitelistOracle`
//! - [`extension`]: pre-hook pricing and post-hook gating / fee charging
//! - [`protocol`]: remaining amounts and the two token legs of a fill
//! - [`chain`]: nested resolver calldata decoded into a flat chain
//! - [`resolver`]: owner-controlled resolver accounts and their calls
//! - [`engine`]: `SettlementEngine`, owner of all state; every operation is
//!   a snapshot/restore transaction
//! - [`receipt`]: what a committed settlement returns
//! - [`clock`]: wall and manual time sources
//!
//! ## Guarantees
//!
//! 1. A settlement either commits every fill in its chain or changes
//!    nothing.
//! 2. A resolver is gated before any fee is charged.
//! 3. Fee credit never goes negative; a fee that would overdraw it aborts
//!    the settlement with `NotEnoughCredit`.
//! 4. A non-zero resolver fee rate always charges at least one unit of
//!    credit.

pub mod chain;
pub mod clock;
pub mod engine;
pub mod extension;
pub mod protocol;
pub mod receipt;
pub mod resolver;
pub mod whitelist;

pub use chain::{ChainLink, SettlementChain};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::SettlementEngine;
pub use extension::{ChargedFees, Quote, SettlementExtension};
pub use receipt::{FillReceipt, SettlementReceipt};
pub use resolver::Resolver;
pub use whitelist::{StaticWhitelist, WhitelistGate, WhitelistOracle, resolver_tag};

pub use fusion_auction::FillSide;
