//! # fusion-types
//!
//! Shared types, codecs, errors, and configuration for the **fusion**
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`Amount`], [`Timestamp`], [`OrderHash`]
//! - **Order model**: [`Order`], [`TakerTraits`], [`FillOrderArgs`]
//! - **Extension data**: [`AuctionDetails`], [`AuctionPoint`], [`FeeSpec`],
//!   [`PostInteractionData`], [`OrderExtension`]
//! - **Resolver payloads**: [`ResolverInteraction`], [`ResolverCall`]
//! - **Permits**: [`Permit`], [`PermitKind`], [`PermitBatch`]
//! - **Configuration**: [`SettlementConfig`], [`FeeBankConfig`]
//! - **Errors**: [`FusionError`] with `FU_ERR_` prefix codes
//! - **Math**: 256-bit intermediate [`math::mul_div`]
//! - **Constants**: system-wide limits and defaults

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod extension;
pub mod ids;
pub mod interaction;
pub mod math;
pub mod order;
pub mod permit;

// Re-export all primary types at crate root for ergonomic imports:
//   use fusion_types::{Order, FeeSpec, FusionError, ...};

pub use config::*;
pub use error::*;
pub use extension::*;
pub use ids::*;
pub use interaction::*;
pub use order::*;
pub use permit::*;

// Constants, codec and math are accessed via their module paths
// (not re-exported to avoid name collisions).
