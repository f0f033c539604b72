//! Permit signature verification and signing.
//!
//! Permits are signed with ed25519 over [`Permit::signing_digest`]. The
//! owner address must be the one derived from the verifying key, so a
//! permit cannot grant an allowance over someone else's tokens.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use fusion_types::{
    Address, Amount, FusionError, Permit, PermitKind, Result, Timestamp, address_from_public_key,
};

/// Check deadline, owner binding and signature of `permit` for `spender`
/// at the owner's current `nonce`.
///
/// # Errors
/// - `PermitExpired` if `now` is past the deadline
/// - `PermitOwnerMismatch` if the key does not derive the owner address
/// - `InvalidPermitSignature` if the signature does not verify
pub fn verify_permit(permit: &Permit, spender: Address, nonce: u64, now: Timestamp) -> Result<()> {
    let deadline = Timestamp::from(permit.deadline);
    if now > deadline {
        return Err(FusionError::PermitExpired { deadline, now });
    }

    let signer = address_from_public_key(&permit.public_key);
    if signer != permit.owner {
        return Err(FusionError::PermitOwnerMismatch {
            signer,
            owner: permit.owner,
        });
    }

    let invalid = || FusionError::InvalidPermitSignature {
        owner: permit.owner,
    };
    let key = VerifyingKey::from_bytes(&permit.public_key).map_err(|_| invalid())?;
    let signature = Signature::from_bytes(&permit.signature);
    key.verify_strict(&permit.digest(spender, nonce), &signature)
        .map_err(|_| invalid())
}

/// Holds an owner's signing key and produces permits for it.
#[derive(Debug, Clone)]
pub struct PermitSigner {
    key: SigningKey,
}

impl PermitSigner {
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(&seed))
    }

    #[must_use]
    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Address owned by this key.
    #[must_use]
    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key())
    }

    /// Sign a permit granting `spender` `amount` of `token`.
    ///
    /// `nonce` must be the owner's nonce for `token` at the time the permit
    /// is applied.
    #[must_use]
    pub fn sign(
        &self,
        kind: PermitKind,
        token: Address,
        spender: Address,
        amount: Amount,
        deadline: u32,
        nonce: u64,
    ) -> Permit {
        let owner = self.address();
        let digest =
            Permit::signing_digest(kind, token, owner, spender, amount, deadline, nonce);
        Permit {
            kind,
            owner,
            token,
            amount,
            deadline,
            public_key: self.public_key(),
            signature: self.key.sign(&digest).to_bytes(),
        }
    }
}

/// Random signer for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl PermitSigner {
    #[must_use]
    pub fn random() -> Self {
        Self::new(SigningKey::generate(&mut rand::rngs::OsRng))
    }
}
