//! Order extension data consumed by the settlement extension.
//!
//! ## Layout
//!
//! ```text
//! making/taking amount data:
//!   [20B settlement][4B startTime][3B duration][3B initialRateBump]
//!   [(3B rateBump, 2B delta)]*
//!
//! post-interaction data:
//!   [20B settlement][1B feeKind]
//!     feeKind 1: [4B resolverFeeRate]
//!     feeKind 2: [20B integrator][4B integratorFeeRate]
//!   [4B auctionStartTime][10B whitelistData][2B reserved]
//! ```
//!
//! Point deltas are measured from the previous point (the first from
//! `startTime`). Decoding accumulates them into cumulative offsets so the
//! curve never has to think about deltas.

use serde::{Deserialize, Serialize};

use crate::codec::{ByteReader, ByteWriter};
use crate::constants::{MAX_AUCTION_DURATION, MAX_RATE_BUMP, WHITELIST_DATA_LEN};
use crate::{Address, FusionError, Result, Timestamp};

// ---------------------------------------------------------------------------
// Auction details
// ---------------------------------------------------------------------------

/// One breakpoint of the piecewise-linear rate-bump curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionPoint {
    /// Rate bump at this point, in `RATE_BUMP_BASIS` units.
    pub rate_bump: u32,
    /// Seconds after the auction start.
    pub offset: u32,
}

/// Immutable per-order Dutch auction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionDetails {
    pub start_time: u32,
    pub duration: u32,
    pub initial_rate_bump: u32,
    /// Strictly increasing in `offset`.
    pub points: Vec<AuctionPoint>,
}

impl AuctionDetails {
    /// Build and validate auction details.
    ///
    /// # Errors
    /// Returns `InvalidAuctionDetails` if a field overflows its wire width
    /// or the point offsets are not strictly increasing.
    pub fn new(
        start_time: u32,
        duration: u32,
        initial_rate_bump: u32,
        points: Vec<AuctionPoint>,
    ) -> Result<Self> {
        let details = Self {
            start_time,
            duration,
            initial_rate_bump,
            points,
        };
        details.validate()?;
        Ok(details)
    }

    /// A flat auction: no bump at any time.
    #[must_use]
    pub fn flat(start_time: u32, duration: u32) -> Self {
        Self {
            start_time,
            duration,
            initial_rate_bump: 0,
            points: Vec::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| FusionError::InvalidAuctionDetails { reason };
        if self.duration > MAX_AUCTION_DURATION {
            return Err(invalid(format!("duration {} exceeds 24 bits", self.duration)));
        }
        if self.initial_rate_bump > MAX_RATE_BUMP {
            return Err(invalid(format!(
                "initial rate bump {} exceeds 24 bits",
                self.initial_rate_bump
            )));
        }
        let mut prev = 0u32;
        for (i, point) in self.points.iter().enumerate() {
            if point.rate_bump > MAX_RATE_BUMP {
                return Err(invalid(format!("point {i} rate bump exceeds 24 bits")));
            }
            if point.offset <= prev {
                return Err(invalid(format!(
                    "point {i} offset {} not after {prev}",
                    point.offset
                )));
            }
            if point.offset - prev > u32::from(u16::MAX) {
                return Err(invalid(format!("point {i} delta exceeds 16 bits")));
            }
            prev = point.offset;
        }
        Ok(())
    }

    /// End of the auction: the bump is zero from here on.
    #[must_use]
    pub fn end_time(&self) -> Timestamp {
        Timestamp::from(self.start_time) + Timestamp::from(self.duration)
    }

    /// Decode the packed auction details (without the settlement prefix).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes, "auction details");
        let start_time = r.read_u32()?;
        let duration = r.read_u24()?;
        let initial_rate_bump = r.read_u24()?;

        if r.remaining() % 5 != 0 {
            return Err(FusionError::malformed(
                "auction details",
                format!("{} point bytes is not a multiple of 5", r.remaining()),
            ));
        }

        let mut points = Vec::with_capacity(r.remaining() / 5);
        let mut offset = 0u32;
        while !r.is_empty() {
            let rate_bump = r.read_u24()?;
            let delta = r.read_u16()?;
            if delta == 0 {
                return Err(FusionError::InvalidAuctionDetails {
                    reason: format!("point {} has zero delta", points.len()),
                });
            }
            offset += u32::from(delta);
            points.push(AuctionPoint { rate_bump, offset });
        }

        Self::new(start_time, duration, initial_rate_bump, points)
    }

    /// Encode to the packed wire format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let mut w = ByteWriter::new();
        w.put_u32(self.start_time)
            .put_u24(self.duration)
            .put_u24(self.initial_rate_bump);
        let mut prev = 0u32;
        for point in &self.points {
            // validate() bounds every delta to 16 bits
            let delta = u16::try_from(point.offset - prev)
                .map_err(|_| FusionError::Internal("validated delta overflowed".into()))?;
            w.put_u24(point.rate_bump).put_u16(delta);
            prev = point.offset;
        }
        Ok(w.into_bytes())
    }
}

// ---------------------------------------------------------------------------
// Fee spec
// ---------------------------------------------------------------------------

/// Per-order fee configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeSpec {
    None,
    /// Resolver fee charged against fee bank credit.
    ResolverFee { rate: u32 },
    /// Integrator fee paid by the resolver in the taker asset. Credit is
    /// not charged.
    IntegratorFee { integrator: Address, rate: u32 },
}

impl FeeSpec {
    /// Wire discriminant.
    #[must_use]
    pub fn kind(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::ResolverFee { .. } => 1,
            Self::IntegratorFee { .. } => 2,
        }
    }

    /// Fee rate, zero for [`FeeSpec::None`].
    #[must_use]
    pub fn rate(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::ResolverFee { rate } | Self::IntegratorFee { rate, .. } => *rate,
        }
    }

    #[must_use]
    pub fn integrator(&self) -> Option<Address> {
        match self {
            Self::IntegratorFee { integrator, .. } => Some(*integrator),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Post-interaction data
// ---------------------------------------------------------------------------

/// Decoded post-interaction segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInteractionData {
    pub fee: FeeSpec,
    pub auction_start_time: u32,
    /// Opaque whitelist oracle tag.
    pub whitelist_data: [u8; WHITELIST_DATA_LEN],
}

impl PostInteractionData {
    /// Decode the packed segment (without the settlement prefix).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes, "post-interaction data");
        let fee = match r.read_u8()? {
            0 => FeeSpec::None,
            1 => FeeSpec::ResolverFee {
                rate: r.read_u32()?,
            },
            2 => {
                let integrator = r.read_address()?;
                FeeSpec::IntegratorFee {
                    integrator,
                    rate: r.read_u32()?,
                }
            }
            other => {
                return Err(FusionError::InvalidExtension {
                    reason: format!("unknown fee kind {other}"),
                });
            }
        };
        let auction_start_time = r.read_u32()?;
        let whitelist_data = r.read_array::<WHITELIST_DATA_LEN>()?;
        let _reserved = r.read_u16()?;
        r.finish()?;
        Ok(Self {
            fee,
            auction_start_time,
            whitelist_data,
        })
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_u8(self.fee.kind());
        match self.fee {
            FeeSpec::None => {}
            FeeSpec::ResolverFee { rate } => {
                w.put_u32(rate);
            }
            FeeSpec::IntegratorFee { integrator, rate } => {
                w.put_address(&integrator).put_u32(rate);
            }
        }
        w.put_u32(self.auction_start_time)
            .put_bytes(&self.whitelist_data)
            .put_u16(0);
        w.into_bytes()
    }
}

// ---------------------------------------------------------------------------
// Order extension
// ---------------------------------------------------------------------------

/// The three extension segments an order carries. Each starts with the
/// 20-byte address of the settlement extension that interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExtension {
    pub making_amount_data: Vec<u8>,
    pub taking_amount_data: Vec<u8>,
    pub post_interaction: Vec<u8>,
}

impl OrderExtension {
    /// Assemble an extension routed to `settlement`.
    pub fn build(
        settlement: Address,
        auction: &AuctionDetails,
        post: &PostInteractionData,
    ) -> Result<Self> {
        let auction_bytes = auction.encode()?;
        let with_prefix = |body: &[u8]| {
            let mut w = ByteWriter::new();
            w.put_address(&settlement).put_bytes(body);
            w.into_bytes()
        };
        Ok(Self {
            making_amount_data: with_prefix(&auction_bytes),
            taking_amount_data: with_prefix(&auction_bytes),
            post_interaction: with_prefix(&post.encode()),
        })
    }

    /// Strip and check the settlement prefix of one segment.
    fn routed<'a>(segment: &'a [u8], settlement: Address, name: &str) -> Result<&'a [u8]> {
        let mut r = ByteReader::new(segment, "extension segment");
        let target = r.read_address()?;
        if target != settlement {
            return Err(FusionError::InvalidExtension {
                reason: format!("{name} routed to {target}, expected {settlement}"),
            });
        }
        Ok(r.rest())
    }

    /// Auction details used when the fill is specified in making units.
    pub fn making_auction(&self, settlement: Address) -> Result<AuctionDetails> {
        AuctionDetails::decode(Self::routed(
            &self.making_amount_data,
            settlement,
            "making amount data",
        )?)
    }

    /// Auction details used when the fill is specified in taking units.
    pub fn taking_auction(&self, settlement: Address) -> Result<AuctionDetails> {
        AuctionDetails::decode(Self::routed(
            &self.taking_amount_data,
            settlement,
            "taking amount data",
        )?)
    }

    pub fn post_interaction_data(&self, settlement: Address) -> Result<PostInteractionData> {
        PostInteractionData::decode(Self::routed(
            &self.post_interaction,
            settlement,
            "post interaction",
        )?)
    }

    pub fn encode_into(&self, w: &mut ByteWriter) -> Result<()> {
        w.put_bytes_u16(&self.making_amount_data, "extension")?;
        w.put_bytes_u16(&self.taking_amount_data, "extension")?;
        w.put_bytes_u16(&self.post_interaction, "extension")?;
        Ok(())
    }

    pub fn decode_from(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            making_amount_data: r.read_bytes_u16()?.to_vec(),
            taking_amount_data: r.read_bytes_u16()?.to_vec(),
            post_interaction: r.read_bytes_u16()?.to_vec(),
        })
    }
}
