//! Resolver credit ledger.
//!
//! Credit is the fee budget a resolver has pre-funded through the fee bank.
//! Settlement fees are charged against it; it never goes negative.
//!
//! Every mutation presents a capability minted together with the ledger by
//! [`CreditLedger::new`]:
//!
//! - [`FeeBankAccess`]: top credit up on deposit, draw it down on withdrawal
//! - [`FeeChargerAccess`]: charge settlement fees
//!
//! Neither is `Clone`, so each ledger has exactly one holder per role. A
//! token minted for a different ledger is rejected with `OnlyFeeBankAccess`
//! or `OnlyFeeCharger`.

use std::collections::HashMap;

use uuid::Uuid;

use fusion_types::{Address, Amount, FusionError, Result};

/// Capability to increase or decrease available credit.
#[derive(Debug, PartialEq, Eq)]
pub struct FeeBankAccess {
    ledger_id: Uuid,
}

/// Capability to charge settlement fees against available credit.
#[derive(Debug, PartialEq, Eq)]
pub struct FeeChargerAccess {
    ledger_id: Uuid,
}

/// The two capabilities issued with a [`CreditLedger`].
#[derive(Debug)]
pub struct CreditAccess {
    pub fee_bank: FeeBankAccess,
    pub charger: FeeChargerAccess,
}

/// Per-resolver available credit.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    id: Uuid,
    credits: HashMap<Address, Amount>,
}

impl CreditLedger {
    /// A fresh, empty ledger and the capabilities bound to it.
    #[must_use]
    pub fn new() -> (Self, CreditAccess) {
        let id = Uuid::now_v7();
        (
            Self {
                id,
                credits: HashMap::new(),
            },
            CreditAccess {
                fee_bank: FeeBankAccess { ledger_id: id },
                charger: FeeChargerAccess { ledger_id: id },
            },
        )
    }

    #[must_use]
    pub fn available_credit(&self, account: Address) -> Amount {
        self.credits.get(&account).copied().unwrap_or(0)
    }

    fn authorize(&self, access: &FeeBankAccess) -> Result<()> {
        if access.ledger_id != self.id {
            return Err(FusionError::OnlyFeeBankAccess);
        }
        Ok(())
    }

    /// Add `amount` to `account`'s credit. Returns the new credit.
    pub fn increase_available_credit(
        &mut self,
        access: &FeeBankAccess,
        account: Address,
        amount: Amount,
    ) -> Result<Amount> {
        self.authorize(access)?;
        let credit = self
            .available_credit(account)
            .checked_add(amount)
            .ok_or(FusionError::ArithmeticOverflow {
                context: "increase credit",
            })?;
        self.credits.insert(account, credit);
        Ok(credit)
    }

    /// Remove `amount` from `account`'s credit. Returns the new credit.
    ///
    /// # Errors
    /// - `OnlyFeeBankAccess` for a foreign capability
    /// - `CreditUnderflow` if the account holds less than `amount`
    pub fn decrease_available_credit(
        &mut self,
        access: &FeeBankAccess,
        account: Address,
        amount: Amount,
    ) -> Result<Amount> {
        self.authorize(access)?;
        let available = self.available_credit(account);
        let credit = available
            .checked_sub(amount)
            .ok_or(FusionError::CreditUnderflow {
                account,
                needed: amount,
                available,
            })?;
        self.credits.insert(account, credit);
        Ok(credit)
    }

    /// Charge a settlement fee against `resolver`'s credit.
    ///
    /// # Errors
    /// - `OnlyFeeCharger` if `access` was issued by another ledger
    /// - `NotEnoughCredit` if the fee exceeds the available credit; the
    ///   ledger is left untouched
    pub fn charge_fee(
        &mut self,
        access: &FeeChargerAccess,
        resolver: Address,
        fee: Amount,
    ) -> Result<Amount> {
        if access.ledger_id != self.id {
            return Err(FusionError::OnlyFeeCharger);
        }
        let available = self.available_credit(resolver);
        let credit = available
            .checked_sub(fee)
            .ok_or(FusionError::NotEnoughCredit {
                account: resolver,
                needed: fee,
                available,
            })?;
        self.credits.insert(resolver, credit);
        tracing::debug!(%resolver, fee, credit, "Settlement fee charged");
        Ok(credit)
    }
}
