//! Settlement receipts.
//!
//! A committed settlement returns one [`SettlementReceipt`] listing every
//! fill in chain order (outermost first). Failed settlements produce no
//! receipt: the error is the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use fusion_types::{Address, Amount, OrderHash, Timestamp};

/// One filled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReceipt {
    pub order_hash: OrderHash,
    pub maker: Address,
    pub maker_asset: Address,
    pub taker_asset: Address,
    pub making_amount: Amount,
    pub taking_amount: Amount,
    pub rate_bump: u64,
    /// Charged against the resolver's fee bank credit.
    pub resolver_fee: Amount,
    /// Paid to the integrator in the taker asset.
    pub integrator_fee: Amount,
}

/// Proof of a committed settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub id: Uuid,
    pub resolver: Address,
    pub settled_at: DateTime<Utc>,
    pub fills: Vec<FillReceipt>,
}

impl SettlementReceipt {
    #[must_use]
    pub fn new(resolver: Address, now: Timestamp, fills: Vec<FillReceipt>) -> Self {
        let settled_at = i64::try_from(now)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_default();
        Self {
            id: Uuid::now_v7(),
            resolver,
            settled_at,
            fills,
        }
    }

    /// Sum of resolver fees across all fills.
    #[must_use]
    pub fn total_resolver_fee(&self) -> Amount {
        self.fills.iter().map(|f| f.resolver_fee).sum()
    }

    /// SHA-256 over the resolver and every fill's hash and amounts.
    /// Independent of the receipt id and timestamp.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut h = Sha256::new();
        h.update(self.resolver.as_slice());
        for fill in &self.fills {
            h.update(fill.order_hash.as_bytes());
            h.update(fill.making_amount.to_be_bytes());
            h.update(fill.taking_amount.to_be_bytes());
            h.update(fill.resolver_fee.to_be_bytes());
            h.update(fill.integrator_fee.to_be_bytes());
        }
        h.finalize().into()
    }

    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}
