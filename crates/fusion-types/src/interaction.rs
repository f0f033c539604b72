//! Resolver interaction payloads.
//!
//! ```text
//! interaction:     [20B resolver][1B isInnermost][next-step bytes]
//! next (outer):    encoded FillOrderArgs of the next chain link
//! next (innermost):[1B count] ([20B token][1B op][args])*
//!     op 0 transfer(to 20B, amount 16B)
//!     op 1 transferFrom(from 20B, to 20B, amount 16B)
//!     op 2 approve(spender 20B, amount 16B)
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::{ByteReader, ByteWriter};
use crate::{Address, Amount, FillOrderArgs, FusionError, Result};

/// Decoded taker interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverInteraction {
    pub resolver: Address,
    /// Deepest link: run `data` as resolver calls instead of another fill.
    pub innermost: bool,
    pub data: Vec<u8>,
}

impl ResolverInteraction {
    /// Interaction that chains into another fill.
    pub fn chain(resolver: Address, next: &FillOrderArgs) -> Result<Self> {
        Ok(Self {
            resolver,
            innermost: false,
            data: next.encode()?,
        })
    }

    /// Interaction that terminates the chain with resolver calls.
    pub fn innermost(resolver: Address, calls: &[ResolverCall]) -> Result<Self> {
        Ok(Self {
            resolver,
            innermost: true,
            data: ResolverCall::encode_all(calls)?,
        })
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_address(&self.resolver)
            .put_bool(self.innermost)
            .put_bytes(&self.data);
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes, "resolver interaction");
        Ok(Self {
            resolver: r.read_address()?,
            innermost: r.read_bool()?,
            data: r.rest().to_vec(),
        })
    }
}

/// Token operation executed by the resolver on the innermost leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolverCall {
    Transfer {
        token: Address,
        to: Address,
        amount: Amount,
    },
    TransferFrom {
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    },
    Approve {
        token: Address,
        spender: Address,
        amount: Amount,
    },
}

impl ResolverCall {
    #[must_use]
    pub fn token(&self) -> Address {
        match self {
            Self::Transfer { token, .. }
            | Self::TransferFrom { token, .. }
            | Self::Approve { token, .. } => *token,
        }
    }

    pub fn encode_all(calls: &[Self]) -> Result<Vec<u8>> {
        let count = u8::try_from(calls.len())
            .map_err(|_| FusionError::malformed("resolver calls", "more than 255 calls"))?;
        let mut w = ByteWriter::new();
        w.put_u8(count);
        for call in calls {
            match *call {
                Self::Transfer { token, to, amount } => {
                    w.put_address(&token).put_u8(0).put_address(&to).put_u128(amount);
                }
                Self::TransferFrom {
                    token,
                    from,
                    to,
                    amount,
                } => {
                    w.put_address(&token)
                        .put_u8(1)
                        .put_address(&from)
                        .put_address(&to)
                        .put_u128(amount);
                }
                Self::Approve {
                    token,
                    spender,
                    amount,
                } => {
                    w.put_address(&token)
                        .put_u8(2)
                        .put_address(&spender)
                        .put_u128(amount);
                }
            }
        }
        Ok(w.into_bytes())
    }

    /// Decode a call list. An empty payload means no calls.
    pub fn decode_all(bytes: &[u8]) -> Result<Vec<Self>> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let mut r = ByteReader::new(bytes, "resolver calls");
        let count = r.read_u8()?;
        let mut calls = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let token = r.read_address()?;
            let call = match r.read_u8()? {
                0 => Self::Transfer {
                    token,
                    to: r.read_address()?,
                    amount: r.read_u128()?,
                },
                1 => Self::TransferFrom {
                    token,
                    from: r.read_address()?,
                    to: r.read_address()?,
                    amount: r.read_u128()?,
                },
                2 => Self::Approve {
                    token,
                    spender: r.read_address()?,
                    amount: r.read_u128()?,
                },
                op => {
                    return Err(FusionError::malformed(
                        "resolver calls",
                        format!("unknown op {op}"),
                    ));
                }
            };
            calls.push(call);
        }
        r.finish()?;
        Ok(calls)
    }
}
