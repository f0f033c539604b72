//! Resolver whitelist gate.
//!
//! Each order names an auction start time and an opaque 10-byte whitelist
//! tag. An oracle maps `(resolver, tag)` to the number of seconds after the
//! auction start at which that resolver is unlocked. A resolver the oracle
//! does not know is never allowed.
//!
//! ```text
//! allowed  ⇔  now ≥ auction_start + delay(resolver, tag)
//! ```
//!
//! The gate runs in the post-hook before any fee is charged, so a rejected
//! resolver leaves credit untouched.

use std::collections::HashMap;

use fusion_types::constants::WHITELIST_DATA_LEN;
use fusion_types::{Address, FusionError, Result, Timestamp};

/// Source of per-resolver unlock delays.
pub trait WhitelistOracle {
    /// Seconds after auction start at which `resolver` may settle orders
    /// carrying `whitelist_data`, or `None` if it never may.
    fn resolver_delay(&self, resolver: Address, whitelist_data: &[u8; WHITELIST_DATA_LEN])
    -> Option<u64>;
}

/// Low 10 bytes of an address, the form resolvers take in whitelist tables.
#[must_use]
pub fn resolver_tag(resolver: Address) -> [u8; WHITELIST_DATA_LEN] {
    let mut tag = [0u8; WHITELIST_DATA_LEN];
    tag.copy_from_slice(&resolver.as_slice()[20 - WHITELIST_DATA_LEN..]);
    tag
}

/// Fixed table of delays keyed by `(whitelist tag, resolver tag)`, with an
/// optional delay after which anyone may settle. A listed resolver gets the
/// earlier of its own delay and the public one.
#[derive(Debug, Clone, Default)]
pub struct StaticWhitelist {
    delays: HashMap<([u8; WHITELIST_DATA_LEN], [u8; WHITELIST_DATA_LEN]), u64>,
    public_delay: Option<u64>,
}

impl StaticWhitelist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlock `resolver` on orders tagged `whitelist_data` after `delay`
    /// seconds.
    #[must_use]
    pub fn allow(
        mut self,
        whitelist_data: [u8; WHITELIST_DATA_LEN],
        resolver: Address,
        delay: u64,
    ) -> Self {
        self.delays
            .insert((whitelist_data, resolver_tag(resolver)), delay);
        self
    }

    /// Unlock every resolver after `delay` seconds.
    #[must_use]
    pub fn public_after(mut self, delay: u64) -> Self {
        self.public_delay = Some(delay);
        self
    }
}

impl WhitelistOracle for StaticWhitelist {
    fn resolver_delay(
        &self,
        resolver: Address,
        whitelist_data: &[u8; WHITELIST_DATA_LEN],
    ) -> Option<u64> {
        let listed = self
            .delays
            .get(&(*whitelist_data, resolver_tag(resolver)))
            .copied();
        match (listed, self.public_delay) {
            (Some(own), Some(public)) => Some(own.min(public)),
            (own, public) => own.or(public),
        }
    }
}

/// Evaluates resolver access against an oracle.
#[derive(Debug, Clone)]
pub struct WhitelistGate<W> {
    oracle: W,
}

impl<W: WhitelistOracle> WhitelistGate<W> {
    pub fn new(oracle: W) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &W {
        &self.oracle
    }

    /// First instant at which `resolver` may settle, if ever.
    pub fn allowed_from(
        &self,
        resolver: Address,
        whitelist_data: &[u8; WHITELIST_DATA_LEN],
        auction_start: Timestamp,
    ) -> Option<Timestamp> {
        self.oracle
            .resolver_delay(resolver, whitelist_data)
            .map(|delay| auction_start.saturating_add(delay))
    }

    /// # Errors
    /// `ResolverIsNotWhitelisted` if `now` is before the resolver's cutoff
    /// or the oracle does not know the resolver.
    pub fn check_access(
        &self,
        resolver: Address,
        whitelist_data: &[u8; WHITELIST_DATA_LEN],
        auction_start: Timestamp,
        now: Timestamp,
    ) -> Result<()> {
        let allowed_from = self.allowed_from(resolver, whitelist_data, auction_start);
        match allowed_from {
            Some(cutoff) if now >= cutoff => Ok(()),
            _ => {
                tracing::warn!(
                    %resolver,
                    auction_start,
                    ?allowed_from,
                    now,
                    "Resolver rejected by whitelist"
                );
                Err(FusionError::ResolverIsNotWhitelisted {
                    resolver,
                    allowed_from,
                    now,
                })
            }
        }
    }
}
