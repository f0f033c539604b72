//! # fusion-ledger
//!
//! **Balances the settlement engine moves and charges.**
//!
//! ## Architecture
//!
//! - [`TokenLedger`]: balances, allowances and permit nonces per token
//! - [`CreditLedger`]: per-resolver fee credit; mutated only through the
//!   [`FeeBankAccess`] and [`FeeChargerAccess`] capabilities
//! - [`FeeBank`]: fee token custody, deposits, withdrawals, fee sweeping
//! - [`Checkpoint`] / [`atomically`]: snapshot and restore so that a failed
//!   settlement leaves no trace
//!
//! State is plain owned data. Nothing here is global; each engine instance
//! owns its own ledgers, so independent scenarios never share balances.

pub mod checkpoint;
pub mod credit;
pub mod fee_bank;
pub mod permits;
pub mod token_ledger;

pub use checkpoint::{Checkpoint, atomically};
pub use credit::{CreditAccess, CreditLedger, FeeBankAccess, FeeChargerAccess};
pub use fee_bank::FeeBank;
pub use permits::{PermitSigner, verify_permit};
pub use token_ledger::TokenLedger;

/// The token and credit ledgers a settlement mutates together.
#[derive(Debug, Clone)]
pub struct Ledgers {
    pub tokens: TokenLedger,
    pub credits: CreditLedger,
}

impl Ledgers {
    /// Empty ledgers plus the capabilities for the credit ledger.
    #[must_use]
    pub fn new() -> (Self, CreditAccess) {
        let (credits, access) = CreditLedger::new();
        (
            Self {
                tokens: TokenLedger::new(),
                credits,
            },
            access,
        )
    }
}
