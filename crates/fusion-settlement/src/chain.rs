//! Decoded settlement chains.
//!
//! On the wire a chain is nested: each fill's taker interaction carries the
//! next fill's calldata, and the deepest one carries the resolver's calls.
//! Decoding walks that nesting once, up front, into a flat list so that
//! execution is a loop over links rather than recursion:
//!
//! ```text
//! FillOrderArgs(A) ─ interaction ─▶ FillOrderArgs(B) ─ interaction ─▶ … ─▶ [calls]
//!          ⇣ decode
//! SettlementChain { links: [A, B, …], calls }
//! ```
//!
//! Every interaction must name the resolver that started the chain, and
//! the number of links is bounded.

use fusion_types::{
    Address, Amount, FillOrderArgs, FusionError, Order, ResolverCall, ResolverInteraction,
    Result, TakerTraits,
};

/// One fill in a chain, without its interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub order: Order,
    pub amount: Amount,
    pub taker_traits: TakerTraits,
}

/// Fills in nesting order (outermost first) plus the innermost calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementChain {
    pub resolver: Address,
    pub links: Vec<ChainLink>,
    pub calls: Vec<ResolverCall>,
}

impl SettlementChain {
    /// Walk nested calldata for a chain started by `resolver`.
    ///
    /// # Errors
    /// - `MalformedCalldata` on any undecodable level
    /// - `ForeignResolverInteraction` if a level names another resolver
    /// - `ChainTooDeep` past `max_depth` links
    pub fn decode(resolver: Address, calldata: &[u8], max_depth: usize) -> Result<Self> {
        let mut links = Vec::new();
        let mut next = calldata.to_vec();
        loop {
            if links.len() >= max_depth {
                return Err(FusionError::ChainTooDeep { max_depth });
            }
            let args = FillOrderArgs::decode(&next)?;
            let interaction = ResolverInteraction::decode(&args.interaction)?;
            if interaction.resolver != resolver {
                return Err(FusionError::ForeignResolverInteraction {
                    target: interaction.resolver,
                    resolver,
                });
            }
            links.push(ChainLink {
                order: args.order,
                amount: args.amount,
                taker_traits: args.taker_traits,
            });
            if interaction.innermost {
                let calls = ResolverCall::decode_all(&interaction.data)?;
                return Ok(Self {
                    resolver,
                    links,
                    calls,
                });
            }
            next = interaction.data;
        }
    }

    /// Nest the chain back into calldata, innermost first.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let Some((last, outer)) = self.links.split_last() else {
            return Err(FusionError::malformed("settlement chain", "no links"));
        };
        let mut interaction = ResolverInteraction::innermost(self.resolver, &self.calls)?;
        let mut args = link_args(last, &interaction);
        for link in outer.iter().rev() {
            interaction = ResolverInteraction::chain(self.resolver, &args)?;
            args = link_args(link, &interaction);
        }
        args.encode()
    }
}

fn link_args(link: &ChainLink, interaction: &ResolverInteraction) -> FillOrderArgs {
    FillOrderArgs {
        order: link.order.clone(),
        amount: link.amount,
        taker_traits: link.taker_traits,
        interaction: interaction.encode(),
    }
}
