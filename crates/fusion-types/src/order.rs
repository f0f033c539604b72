//! Order model and fill calldata.
//!
//! Orders are signed off-chain by makers; signature checking belongs to the
//! order-filling collaborator and is not modelled here. What the settlement
//! engine needs is the economic content of the order, its extension, and
//! the taker's fill instructions.

use serde::{Deserialize, Serialize};

use crate::codec::{ByteReader, ByteWriter};
use crate::{Address, Amount, OrderExtension, OrderHash, Result};

/// A maker's limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Maker-chosen uniqueness salt.
    pub salt: u64,
    pub maker: Address,
    /// Asset the maker gives.
    pub maker_asset: Address,
    /// Asset the maker receives.
    pub taker_asset: Address,
    pub making_amount: Amount,
    pub taking_amount: Amount,
    pub extension: OrderExtension,
}

impl Order {
    /// Content hash over the canonical encoding.
    pub fn hash(&self) -> Result<OrderHash> {
        let mut w = ByteWriter::new();
        self.encode_into(&mut w)?;
        Ok(OrderHash::digest(&w.into_bytes()))
    }

    pub fn encode_into(&self, w: &mut ByteWriter) -> Result<()> {
        w.put_u64(self.salt)
            .put_address(&self.maker)
            .put_address(&self.maker_asset)
            .put_address(&self.taker_asset)
            .put_u128(self.making_amount)
            .put_u128(self.taking_amount);
        self.extension.encode_into(w)
    }

    pub fn decode_from(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            salt: r.read_u64()?,
            maker: r.read_address()?,
            maker_asset: r.read_address()?,
            taker_asset: r.read_address()?,
            making_amount: r.read_u128()?,
            taking_amount: r.read_u128()?,
            extension: OrderExtension::decode_from(r)?,
        })
    }
}

/// Taker-side fill options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakerTraits {
    /// `true`: the fill amount is in making units; `false`: taking units.
    pub is_making_amount: bool,
    /// Making mode: maximum taking amount. Taking mode: minimum making
    /// amount. Zero disables the check.
    pub threshold: Amount,
}

impl TakerTraits {
    #[must_use]
    pub fn making(threshold: Amount) -> Self {
        Self {
            is_making_amount: true,
            threshold,
        }
    }

    #[must_use]
    pub fn taking(threshold: Amount) -> Self {
        Self {
            is_making_amount: false,
            threshold,
        }
    }
}

/// Calldata for one fill: the order, how much, and the taker interaction
/// that runs between the two token legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOrderArgs {
    pub order: Order,
    pub amount: Amount,
    pub taker_traits: TakerTraits,
    /// Encoded [`crate::ResolverInteraction`].
    pub interaction: Vec<u8>,
}

impl FillOrderArgs {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = ByteWriter::new();
        self.order.encode_into(&mut w)?;
        w.put_u128(self.amount)
            .put_bool(self.taker_traits.is_making_amount)
            .put_u128(self.taker_traits.threshold);
        w.put_bytes_u32(&self.interaction, "fill order args")?;
        Ok(w.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes, "fill order args");
        let order = Order::decode_from(&mut r)?;
        let amount = r.read_u128()?;
        let taker_traits = TakerTraits {
            is_making_amount: r.read_bool()?,
            threshold: r.read_u128()?,
        };
        let interaction = r.read_bytes_u32()?.to_vec();
        r.finish()?;
        Ok(Self {
            order,
            amount,
            taker_traits,
            interaction,
        })
    }
}
