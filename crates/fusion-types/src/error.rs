//! Error types for the fusion settlement engine.
//!
//! All errors use the `FU_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order, extension and calldata errors
//! - 2xx: Token ledger errors
//! - 3xx: Credit / fee bank errors
//! - 4xx: Permit errors
//! - 5xx: Whitelist, resolver and chain errors
//! - 6xx: Arithmetic errors
//! - 9xx: General / internal errors
//!
//! Every variant aborts the enclosing transaction. Nothing in the engine
//! recovers locally; callers branch on the variant and retry with new
//! parameters.

use thiserror::Error;

use crate::{Address, Amount, OrderHash};

/// Central error enum for all settlement operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FusionError {
    // =================================================================
    // Order / Extension / Calldata Errors (1xx)
    // =================================================================
    /// A byte payload could not be decoded.
    #[error("FU_ERR_100: Malformed {context}: {reason}")]
    MalformedCalldata {
        context: &'static str,
        reason: String,
    },

    /// The order extension is structurally valid but unusable.
    #[error("FU_ERR_101: Invalid extension: {reason}")]
    InvalidExtension { reason: String },

    /// The encoded auction details violate the curve invariants.
    #[error("FU_ERR_102: Invalid auction details: {reason}")]
    InvalidAuctionDetails { reason: String },

    /// A fill asked for more than the order has left.
    #[error("FU_ERR_103: Order {order_hash} remaining {remaining}, requested {requested}")]
    OrderRemainingExceeded {
        order_hash: OrderHash,
        requested: Amount,
        remaining: Amount,
    },

    /// Making-mode fill would cost the taker more than the threshold.
    #[error("FU_ERR_104: Taking amount too high: {taking} > threshold {threshold}")]
    TakingAmountTooHigh { taking: Amount, threshold: Amount },

    /// Taking-mode fill would return the taker less than the threshold.
    #[error("FU_ERR_105: Making amount too low: {making} < threshold {threshold}")]
    MakingAmountTooLow { making: Amount, threshold: Amount },

    /// A fill resolved to zero on either side.
    #[error("FU_ERR_106: Zero fill amount for order {0}")]
    ZeroFillAmount(OrderHash),

    // =================================================================
    // Token Ledger Errors (2xx)
    // =================================================================
    /// The holder does not own enough of the token.
    #[error("FU_ERR_200: Insufficient balance of {token} for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        needed: Amount,
        available: Amount,
    },

    /// The spender has not been authorised for enough of the token.
    #[error("FU_ERR_201: Insufficient allowance of {token} from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        needed: Amount,
        available: Amount,
    },

    // =================================================================
    // Credit / Fee Bank Errors (3xx)
    // =================================================================
    /// A settlement fee exceeds the resolver's pre-funded credit.
    #[error("FU_ERR_300: Not enough credit for {account}: need {needed}, have {available}")]
    NotEnoughCredit {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    /// A fee bank debit would drive the credit balance below zero.
    #[error("FU_ERR_301: Credit underflow for {account}: need {needed}, have {available}")]
    CreditUnderflow {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    /// A fee bank debit would drive the deposit record below zero.
    #[error("FU_ERR_302: Deposit underflow for {account}: need {needed}, have {available}")]
    DepositUnderflow {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    /// The credit ledger was mutated through a capability it did not issue.
    #[error("FU_ERR_303: Only the fee bank may change available credit")]
    OnlyFeeBankAccess,

    /// A settlement fee was charged through a capability the credit ledger
    /// did not issue.
    #[error("FU_ERR_305: Only the settlement extension may charge fees")]
    OnlyFeeCharger,

    /// A privileged operation was called by someone other than the owner.
    #[error("FU_ERR_304: Caller {caller} is not the owner")]
    OnlyOwner { caller: Address },

    // =================================================================
    // Permit Errors (4xx)
    // =================================================================
    /// The permit signature does not verify against its digest.
    #[error("FU_ERR_400: Invalid permit signature for owner {owner}")]
    InvalidPermitSignature { owner: Address },

    /// The permit deadline has passed.
    #[error("FU_ERR_401: Permit expired at {deadline}, now {now}")]
    PermitExpired { deadline: u64, now: u64 },

    /// The permit's verifying key does not belong to the stated owner.
    #[error("FU_ERR_402: Permit signer {signer} does not match owner {owner}")]
    PermitOwnerMismatch { signer: Address, owner: Address },

    // =================================================================
    // Whitelist / Resolver / Chain Errors (5xx)
    // =================================================================
    /// The resolver is not yet (or never) allowed to settle this order.
    #[error("FU_ERR_500: Resolver {resolver} is not whitelisted until {allowed_from:?}, now {now}")]
    ResolverIsNotWhitelisted {
        resolver: Address,
        allowed_from: Option<u64>,
        now: u64,
    },

    /// An interaction payload names a resolver other than the one settling.
    #[error("FU_ERR_501: Interaction targets {target}, chain initiated by {resolver}")]
    ForeignResolverInteraction { target: Address, resolver: Address },

    /// The chain of nested fills is longer than the configured bound.
    #[error("FU_ERR_502: Settlement chain deeper than {max_depth}")]
    ChainTooDeep { max_depth: usize },

    /// The resolver address is unknown to the engine.
    #[error("FU_ERR_503: Unknown resolver {0}")]
    UnknownResolver(Address),

    // =================================================================
    // Arithmetic Errors (6xx)
    // =================================================================
    /// A result does not fit the 128-bit amount type.
    #[error("FU_ERR_600: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    /// Division by a zero denominator.
    #[error("FU_ERR_601: Division by zero in {context}")]
    DivisionByZero { context: &'static str },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FU_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("FU_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("FU_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl FusionError {
    /// Shorthand for a [`FusionError::MalformedCalldata`].
    pub fn malformed(context: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedCalldata {
            context,
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FusionError>;

impl From<serde_json::Error> for FusionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
