//! Signed transfer authorizations and the packed permit batch.
//!
//! A permit lets a token owner grant an allowance without a prior approve
//! transaction. The spender is not carried in the payload: it is implied by
//! where the permit is submitted (the order-filling protocol for settlement
//! batches, the fee bank for permit deposits).
//!
//! ```text
//! payload (116B): [16B amount][4B deadline][32B verifying key][64B signature]
//! batch flags:    u32, nibble 0 = count (≤ 7), nibble i+1 = kind of permit i
//! batch blob:     count × [20B owner][20B token][payload]
//! ```

use sha2::{Digest, Sha256};

use crate::codec::{ByteReader, ByteWriter};
use crate::constants::{MAX_PERMITS_PER_BATCH, PERMIT_DOMAIN};
use crate::{Address, Amount, FusionError, Result};

/// Which authorization path a permit uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermitKind {
    /// Allowance granted directly on the token.
    Erc2612,
    /// Allowance routed through the permit2 contract, which the owner must
    /// already have approved.
    Permit2,
}

impl PermitKind {
    fn from_nibble(n: u32) -> Result<Self> {
        match n {
            0 => Ok(Self::Erc2612),
            1 => Ok(Self::Permit2),
            other => Err(FusionError::malformed(
                "permit batch",
                format!("unknown permit kind {other}"),
            )),
        }
    }

    fn nibble(self) -> u32 {
        match self {
            Self::Erc2612 => 0,
            Self::Permit2 => 1,
        }
    }
}

/// A signed allowance grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permit {
    pub kind: PermitKind,
    pub owner: Address,
    pub token: Address,
    pub amount: Amount,
    /// Unix seconds after which the permit is void.
    pub deadline: u32,
    /// ed25519 verifying key of the owner.
    pub public_key: [u8; 32],
    pub signature: [u8; 64],
}

impl Permit {
    /// Digest the owner signs. Commits to everything that determines the
    /// resulting allowance plus the owner's current nonce for the token.
    #[must_use]
    pub fn signing_digest(
        kind: PermitKind,
        token: Address,
        owner: Address,
        spender: Address,
        amount: Amount,
        deadline: u32,
        nonce: u64,
    ) -> [u8; 32] {
        let mut h = Sha256::new();
        h.update(PERMIT_DOMAIN);
        h.update([u8::from(kind == PermitKind::Permit2)]);
        h.update(token.as_slice());
        h.update(owner.as_slice());
        h.update(spender.as_slice());
        h.update(amount.to_be_bytes());
        h.update(deadline.to_be_bytes());
        h.update(nonce.to_be_bytes());
        h.finalize().into()
    }

    /// Digest for this permit when submitted to `spender`.
    #[must_use]
    pub fn digest(&self, spender: Address, nonce: u64) -> [u8; 32] {
        Self::signing_digest(
            self.kind,
            self.token,
            self.owner,
            spender,
            self.amount,
            self.deadline,
            nonce,
        )
    }

    /// Compressed payload without owner/token.
    #[must_use]
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_u128(self.amount)
            .put_u32(self.deadline)
            .put_bytes(&self.public_key)
            .put_bytes(&self.signature);
        w.into_bytes()
    }

    fn decode_payload(
        kind: PermitKind,
        owner: Address,
        token: Address,
        r: &mut ByteReader<'_>,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            owner,
            token,
            amount: r.read_u128()?,
            deadline: r.read_u32()?,
            public_key: r.read_array()?,
            signature: r.read_array()?,
        })
    }

    /// Decode a standalone payload (fee bank permit deposits).
    pub fn decode(kind: PermitKind, owner: Address, token: Address, bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes, "permit");
        let permit = Self::decode_payload(kind, owner, token, &mut r)?;
        r.finish()?;
        Ok(permit)
    }
}

/// Permits applied ahead of a settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermitBatch {
    pub permits: Vec<Permit>,
}

impl PermitBatch {
    pub fn decode(flags: u32, blob: &[u8]) -> Result<Self> {
        let count = (flags & 0xf) as usize;
        if count > MAX_PERMITS_PER_BATCH {
            return Err(FusionError::malformed(
                "permit batch",
                format!("count {count} exceeds {MAX_PERMITS_PER_BATCH}"),
            ));
        }
        let mut r = ByteReader::new(blob, "permit batch");
        let mut permits = Vec::with_capacity(count);
        for i in 0..count {
            let kind = PermitKind::from_nibble((flags >> (4 * (i + 1))) & 0xf)?;
            let owner = r.read_address()?;
            let token = r.read_address()?;
            permits.push(Permit::decode_payload(kind, owner, token, &mut r)?);
        }
        r.finish()?;
        Ok(Self { permits })
    }

    /// Packed flags word and blob.
    pub fn encode(&self) -> Result<(u32, Vec<u8>)> {
        if self.permits.len() > MAX_PERMITS_PER_BATCH {
            return Err(FusionError::malformed(
                "permit batch",
                format!("{} permits exceed {MAX_PERMITS_PER_BATCH}", self.permits.len()),
            ));
        }
        // Bounded by MAX_PERMITS_PER_BATCH above.
        let mut flags = self.permits.len() as u32;
        let mut w = ByteWriter::new();
        for (i, permit) in self.permits.iter().enumerate() {
            flags |= permit.kind.nibble() << (4 * (i + 1));
            w.put_address(&permit.owner)
                .put_address(&permit.token)
                .put_bytes(&permit.encode_payload());
        }
        Ok((flags, w.into_bytes()))
    }
}
