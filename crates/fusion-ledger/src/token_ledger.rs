//! In-memory multi-token ledger.
//!
//! Stands in for the ERC-20 contracts the settlement engine talks to:
//! balances per (token, holder), allowances per (token, owner, spender),
//! and permit nonces per (token, owner). An allowance of `Amount::MAX` is
//! treated as infinite and never drawn down.

use std::collections::HashMap;

use fusion_types::constants::PERMIT2_ADDRESS;
use fusion_types::{Address, Amount, FusionError, Permit, PermitKind, Result, Timestamp};

use crate::permits::verify_permit;

/// Balances, allowances and permit nonces for every token.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    balances: HashMap<(Address, Address), Amount>,
    supplies: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address, Address), Amount>,
    nonces: HashMap<(Address, Address), u64>,
}

impl TokenLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new supply out of thin air (test and genesis funding).
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the token's total supply would exceed
    /// `Amount::MAX`. Every balance is bounded by the supply, so no
    /// balance can overflow afterwards.
    pub fn mint(&mut self, token: Address, to: Address, amount: Amount) -> Result<()> {
        let supply = self
            .total_supply(token)
            .checked_add(amount)
            .ok_or(FusionError::ArithmeticOverflow { context: "mint" })?;
        self.supplies.insert(token, supply);
        *self.balances.entry((token, to)).or_default() += amount;
        Ok(())
    }

    #[must_use]
    pub fn balance_of(&self, token: Address, holder: Address) -> Amount {
        self.balances.get(&(token, holder)).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(0)
    }

    /// Next permit nonce for `owner` on `token`.
    #[must_use]
    pub fn nonce(&self, token: Address, owner: Address) -> u64 {
        self.nonces.get(&(token, owner)).copied().unwrap_or(0)
    }

    /// Sum of all balances of a token.
    #[must_use]
    pub fn total_supply(&self, token: Address) -> Amount {
        self.supplies.get(&token).copied().unwrap_or(0)
    }

    /// Set `spender`'s allowance over `owner`'s tokens.
    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: Amount) {
        self.allowances.insert((token, owner, spender), amount);
    }

    /// Move tokens held by `from`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` holds less than `amount`.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(FusionError::InsufficientBalance {
                token,
                holder: from,
                needed: amount,
                available,
            });
        }
        if amount == 0 || from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(FusionError::ArithmeticOverflow { context: "transfer" })?;
        self.balances.insert((token, from), available - amount);
        self.balances.insert((token, to), credited);
        Ok(())
    }

    /// Move tokens held by `from` on behalf of `spender`.
    ///
    /// # Errors
    /// - `InsufficientAllowance` if `spender` is not authorised for `amount`
    /// - `InsufficientBalance` if `from` holds less than `amount`
    pub fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if spender != from {
            self.spend_allowance(token, from, spender, amount)?;
        }
        self.transfer(token, from, to, amount)
    }

    fn spend_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<()> {
        let available = self.allowance(token, owner, spender);
        if available < amount {
            return Err(FusionError::InsufficientAllowance {
                token,
                owner,
                spender,
                needed: amount,
                available,
            });
        }
        if available != Amount::MAX {
            self.allowances
                .insert((token, owner, spender), available - amount);
        }
        Ok(())
    }

    /// Verify a signed permit and grant `spender` the permitted allowance.
    ///
    /// `Erc2612` permits set the allowance directly. `Permit2` permits draw
    /// the amount out of the owner's allowance to the permit2 router and
    /// add it to `spender`'s allowance.
    pub fn apply_permit(&mut self, permit: &Permit, spender: Address, now: Timestamp) -> Result<()> {
        let nonce = self.nonce(permit.token, permit.owner);
        verify_permit(permit, spender, nonce, now)?;
        self.nonces.insert((permit.token, permit.owner), nonce + 1);

        match permit.kind {
            PermitKind::Erc2612 => {
                self.approve(permit.token, permit.owner, spender, permit.amount);
            }
            PermitKind::Permit2 => {
                self.spend_allowance(permit.token, permit.owner, PERMIT2_ADDRESS, permit.amount)?;
                let granted = self
                    .allowance(permit.token, permit.owner, spender)
                    .saturating_add(permit.amount);
                self.approve(permit.token, permit.owner, spender, granted);
            }
        }

        tracing::debug!(
            token = %permit.token,
            owner = %permit.owner,
            %spender,
            amount = permit.amount,
            kind = ?permit.kind,
            "Permit applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permits::PermitSigner;

    const TOKEN: Address = Address::repeat_byte(0xda);

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    #[test]
    fn mint_and_transfer() {
        let mut tl = TokenLedger::new();
        tl.mint(TOKEN, alice(), 100).unwrap();
        tl.transfer(TOKEN, alice(), bob(), 40).unwrap();
        assert_eq!(tl.balance_of(TOKEN, alice()), 60);
        assert_eq!(tl.balance_of(TOKEN, bob()), 40);
        assert_eq!(tl.total_supply(TOKEN), 100);
    }

    #[test]
    fn mint_past_supply_cap_rejected() {
        let mut tl = TokenLedger::new();
        tl.mint(TOKEN, alice(), Amount::MAX).unwrap();
        let err = tl.mint(TOKEN, bob(), 1).unwrap_err();
        assert_eq!(err, FusionError::ArithmeticOverflow { context: "mint" });
        assert_eq!(tl.balance_of(TOKEN, bob()), 0);
        assert_eq!(tl.total_supply(TOKEN), Amount::MAX);
    }

    #[test]
    fn transfer_insufficient_balance() {
        let mut tl = TokenLedger::new();
        tl.mint(TOKEN, alice(), 10).unwrap();
        let err = tl.transfer(TOKEN, alice(), bob(), 11).unwrap_err();
        assert!(matches!(err, FusionError::InsufficientBalance { needed: 11, available: 10, .. }));
        assert_eq!(tl.balance_of(TOKEN, alice()), 10);
    }

    #[test]
    fn transfer_from_draws_down_allowance() {
        let mut tl = TokenLedger::new();
        let spender = Address::repeat_byte(0x5e);
        tl.mint(TOKEN, alice(), 100).unwrap();
        tl.approve(TOKEN, alice(), spender, 50);
        tl.transfer_from(TOKEN, spender, alice(), bob(), 30).unwrap();
        assert_eq!(tl.allowance(TOKEN, alice(), spender), 20);

        let err = tl.transfer_from(TOKEN, spender, alice(), bob(), 30).unwrap_err();
        assert!(matches!(err, FusionError::InsufficientAllowance { needed: 30, available: 20, .. }));
    }

    #[test]
    fn infinite_allowance_is_not_drawn_down() {
        let mut tl = TokenLedger::new();
        let spender = Address::repeat_byte(0x5e);
        tl.mint(TOKEN, alice(), 100).unwrap();
        tl.approve(TOKEN, alice(), spender, Amount::MAX);
        tl.transfer_from(TOKEN, spender, alice(), bob(), 30).unwrap();
        assert_eq!(tl.allowance(TOKEN, alice(), spender), Amount::MAX);
    }

    #[test]
    fn erc2612_permit_sets_allowance_and_bumps_nonce() {
        let signer = PermitSigner::from_seed([1; 32]);
        let owner = signer.address();
        let spender = Address::repeat_byte(0x5e);
        let mut tl = TokenLedger::new();

        let permit = signer.sign(PermitKind::Erc2612, TOKEN, spender, 70, 1_000, 0);
        tl.apply_permit(&permit, spender, 999).unwrap();
        assert_eq!(tl.allowance(TOKEN, owner, spender), 70);
        assert_eq!(tl.nonce(TOKEN, owner), 1);

        // Replaying the same permit fails: nonce moved on.
        let err = tl.apply_permit(&permit, spender, 999).unwrap_err();
        assert!(matches!(err, FusionError::InvalidPermitSignature { .. }));
    }

    #[test]
    fn permit2_requires_router_allowance() {
        let signer = PermitSigner::from_seed([2; 32]);
        let owner = signer.address();
        let spender = Address::repeat_byte(0x5e);
        let mut tl = TokenLedger::new();

        let permit = signer.sign(PermitKind::Permit2, TOKEN, spender, 70, 1_000, 0);
        let err = tl.apply_permit(&permit, spender, 0).unwrap_err();
        assert!(matches!(err, FusionError::InsufficientAllowance { .. }));

        let mut tl = TokenLedger::new();
        tl.approve(TOKEN, owner, PERMIT2_ADDRESS, 100);
        tl.apply_permit(&permit, spender, 0).unwrap();
        assert_eq!(tl.allowance(TOKEN, owner, PERMIT2_ADDRESS), 30);
        assert_eq!(tl.allowance(TOKEN, owner, spender), 70);
    }

    #[test]
    fn permit_for_other_spender_rejected() {
        let signer = PermitSigner::from_seed([3; 32]);
        let mut tl = TokenLedger::new();
        let permit = signer.sign(PermitKind::Erc2612, TOKEN, Address::repeat_byte(1), 5, 10, 0);
        let err = tl.apply_permit(&permit, Address::repeat_byte(2), 0).unwrap_err();
        assert!(matches!(err, FusionError::InvalidPermitSignature { .. }));
    }
}
