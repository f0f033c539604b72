//! Resolver accounts.
//!
//! A resolver is an address controlled by an owner. Only the owner may
//! start settlements through it or change its approvals. On the innermost
//! leg of a chain the resolver runs its own token calls, with itself as
//! the acting account.

use fusion_ledger::TokenLedger;
use fusion_types::{Address, Amount, FusionError, ResolverCall, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    pub address: Address,
    pub owner: Address,
}

impl Resolver {
    #[must_use]
    pub fn new(address: Address, owner: Address) -> Self {
        Self { address, owner }
    }

    /// # Errors
    /// `OnlyOwner` for any caller but the owner.
    pub fn ensure_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(FusionError::OnlyOwner { caller });
        }
        Ok(())
    }

    /// Grant `spender` an unlimited allowance over the resolver's `token`.
    pub fn approve(&self, tokens: &mut TokenLedger, token: Address, spender: Address) {
        tokens.approve(token, self.address, spender, Amount::MAX);
        tracing::debug!(resolver = %self.address, %token, %spender, "Resolver approval");
    }

    /// Run the innermost calls in order. The first failure aborts.
    pub fn execute(&self, tokens: &mut TokenLedger, calls: &[ResolverCall]) -> Result<()> {
        for call in calls {
            match *call {
                ResolverCall::Transfer { token, to, amount } => {
                    tokens.transfer(token, self.address, to, amount)?;
                }
                ResolverCall::TransferFrom {
                    token,
                    from,
                    to,
                    amount,
                } => {
                    tokens.transfer_from(token, self.address, from, to, amount)?;
                }
                ResolverCall::Approve {
                    token,
                    spender,
                    amount,
                } => {
                    tokens.approve(token, self.address, spender, amount);
                }
            }
        }
        if !calls.is_empty() {
            tracing::debug!(resolver = %self.address, calls = calls.len(), "Resolver calls executed");
        }
        Ok(())
    }
}
