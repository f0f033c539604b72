//! System-wide constants for the settlement engine.

use crate::{Address, Amount};

/// Fixed-point basis for rate bumps: a bump of `RATE_BUMP_BASIS` doubles
/// the taking amount.
pub const RATE_BUMP_BASIS: u64 = 10_000_000;

/// Largest value a 3-byte rate bump field can carry.
pub const MAX_RATE_BUMP: u32 = (1 << 24) - 1;

/// Largest value a 3-byte auction duration field can carry.
pub const MAX_AUCTION_DURATION: u32 = (1 << 24) - 1;

/// Default credit units charged per unit of resolver fee rate on a full fill.
pub const DEFAULT_ORDER_FEE_BASE_POINTS: Amount = 1_000_000_000_000_000;

/// Default denominator for integrator fee rates.
pub const DEFAULT_INTEGRATOR_FEE_BASE: Amount = 1_000_000_000;

/// Default bound on the number of nested fills in one settlement.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 16;

/// Length of the opaque whitelist tag carried in the post-interaction data.
pub const WHITELIST_DATA_LEN: usize = 10;

/// Length of a compressed permit payload.
pub const PERMIT_PAYLOAD_LEN: usize = 16 + 4 + 32 + 64;

/// Maximum number of permits in one permit batch (one nibble is the count,
/// seven nibbles select kinds).
pub const MAX_PERMITS_PER_BATCH: usize = 7;

/// Canonical address of the permit2 allowance router.
pub const PERMIT2_ADDRESS: Address = Address::new([0x22; 20]);

/// Domain tag mixed into every permit digest.
pub const PERMIT_DOMAIN: &[u8] = b"fusion-settle/permit/v1";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "FusionSettle";
