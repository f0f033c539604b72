//! Fee bank: custody of the fee token and the only writer of credit.
//!
//! Every unit of fee token deposited raises the beneficiary's deposit record
//! and available credit by one unit; every unit withdrawn lowers both.
//! Settlement fees lower credit alone, so `deposit - credit` is the amount
//! consumed by fees and not yet swept. [`FeeBank::gather_fees`] sweeps it to
//! the owner and closes the gap.
//!
//! ```text
//!   deposit(x)       deposits += x   credit += x   token: caller → bank
//!   charge_fee(f)                    credit -= f
//!   gather_fees      deposits  = credit            token: bank → owner
//!   withdraw(x)      deposits -= x   credit -= x   token: bank → recipient
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use fusion_types::{
    Address, Amount, FeeBankConfig, FusionError, Permit, PermitKind, Result, Timestamp,
};

use crate::Ledgers;
use crate::credit::FeeBankAccess;

/// Fee token custody plus per-account deposit records.
///
/// Snapshots of the bank share its credit capability; they never mint a
/// second one.
#[derive(Debug, Clone)]
pub struct FeeBank {
    config: FeeBankConfig,
    deposits: HashMap<Address, Amount>,
    access: Arc<FeeBankAccess>,
}

impl FeeBank {
    /// A bank holding the credit capability issued by the ledger it will
    /// write to.
    #[must_use]
    pub fn new(config: FeeBankConfig, access: FeeBankAccess) -> Self {
        Self {
            config,
            deposits: HashMap::new(),
            access: Arc::new(access),
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.config.address
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.config.owner
    }

    #[must_use]
    pub fn fee_token(&self) -> Address {
        self.config.fee_token
    }

    /// Fee token recorded as deposited on behalf of `account`.
    #[must_use]
    pub fn account_deposits(&self, account: Address) -> Amount {
        self.deposits.get(&account).copied().unwrap_or(0)
    }

    /// Deposit `amount` of the caller's fee token for the caller.
    pub fn deposit(&mut self, ledgers: &mut Ledgers, caller: Address, amount: Amount) -> Result<Amount> {
        self.deposit_for(ledgers, caller, caller, amount)
    }

    /// Deposit `amount` of the caller's fee token, crediting `beneficiary`.
    /// Returns the beneficiary's new available credit.
    ///
    /// # Errors
    /// `InsufficientAllowance` / `InsufficientBalance` from the token pull.
    pub fn deposit_for(
        &mut self,
        ledgers: &mut Ledgers,
        caller: Address,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<Amount> {
        ledgers.tokens.transfer_from(
            self.config.fee_token,
            self.config.address,
            caller,
            self.config.address,
            amount,
        )?;
        let deposited = self
            .account_deposits(beneficiary)
            .checked_add(amount)
            .ok_or(FusionError::ArithmeticOverflow { context: "deposit" })?;
        self.deposits.insert(beneficiary, deposited);
        let credit =
            ledgers
                .credits
                .increase_available_credit(&self.access, beneficiary, amount)?;

        tracing::info!(
            %caller,
            %beneficiary,
            amount,
            deposited,
            credit,
            "Fee bank deposit"
        );
        Ok(credit)
    }

    /// [`deposit`](Self::deposit) authorised by a signed permit payload
    /// instead of a prior approval.
    pub fn deposit_with_permit(
        &mut self,
        ledgers: &mut Ledgers,
        caller: Address,
        amount: Amount,
        permit: &[u8],
        now: Timestamp,
    ) -> Result<Amount> {
        self.deposit_for_with_permit(ledgers, caller, caller, amount, permit, now)
    }

    /// [`deposit_for`](Self::deposit_for) authorised by a signed permit
    /// payload. The permit is read as the caller's grant over the fee
    /// token to the bank.
    pub fn deposit_for_with_permit(
        &mut self,
        ledgers: &mut Ledgers,
        caller: Address,
        beneficiary: Address,
        amount: Amount,
        permit: &[u8],
        now: Timestamp,
    ) -> Result<Amount> {
        let permit = Permit::decode(PermitKind::Erc2612, caller, self.config.fee_token, permit)?;
        ledgers.tokens.apply_permit(&permit, self.config.address, now)?;
        self.deposit_for(ledgers, caller, beneficiary, amount)
    }

    /// Withdraw `amount` of the caller's credit to the caller.
    pub fn withdraw(&mut self, ledgers: &mut Ledgers, caller: Address, amount: Amount) -> Result<Amount> {
        self.withdraw_to(ledgers, caller, caller, amount)
    }

    /// Withdraw `amount` of the caller's credit, paying `recipient`.
    /// Returns the caller's remaining credit.
    ///
    /// # Errors
    /// `CreditUnderflow` if `amount` exceeds the caller's available credit.
    /// Nothing is changed in that case.
    pub fn withdraw_to(
        &mut self,
        ledgers: &mut Ledgers,
        caller: Address,
        recipient: Address,
        amount: Amount,
    ) -> Result<Amount> {
        let credit = ledgers
            .credits
            .decrease_available_credit(&self.access, caller, amount)?;
        let available = self.account_deposits(caller);
        // Credit never exceeds deposits, so this only fires on a corrupted
        // ledger.
        let deposited = available
            .checked_sub(amount)
            .ok_or(FusionError::DepositUnderflow {
                account: caller,
                needed: amount,
                available,
            })?;
        self.deposits.insert(caller, deposited);
        ledgers.tokens.transfer(
            self.config.fee_token,
            self.config.address,
            recipient,
            amount,
        )?;

        tracing::info!(
            %caller,
            %recipient,
            amount,
            deposited,
            credit,
            "Fee bank withdrawal"
        );
        Ok(credit)
    }

    /// Sweep fees consumed by settlement from `accounts` to the owner.
    /// Returns the total swept. Calling it again without intervening fee
    /// charges sweeps zero.
    ///
    /// # Errors
    /// `OnlyOwner` if `caller` is not the bank owner.
    pub fn gather_fees(
        &mut self,
        ledgers: &mut Ledgers,
        caller: Address,
        accounts: &[Address],
    ) -> Result<Amount> {
        if caller != self.config.owner {
            return Err(FusionError::OnlyOwner { caller });
        }

        let mut total: Amount = 0;
        for &account in accounts {
            let deposited = self.account_deposits(account);
            let credit = ledgers.credits.available_credit(account);
            let owed = deposited.checked_sub(credit).ok_or_else(|| {
                FusionError::Internal(format!(
                    "credit {credit} exceeds deposits {deposited} for {account}"
                ))
            })?;
            if owed == 0 {
                continue;
            }
            self.deposits.insert(account, credit);
            total = total
                .checked_add(owed)
                .ok_or(FusionError::ArithmeticOverflow { context: "gather fees" })?;
            tracing::debug!(%account, owed, "Fees gathered from account");
        }

        ledgers.tokens.transfer(
            self.config.fee_token,
            self.config.address,
            self.config.owner,
            total,
        )?;
        tracing::info!(
            owner = %self.config.owner,
            accounts = accounts.len(),
            total,
            "Fees gathered"
        );
        Ok(total)
    }
}
