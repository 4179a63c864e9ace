// ----- standard library imports
// ----- extra library imports
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
// ----- local imports
use crate::error::{Error, Result};

// ----- end imports

/// 0.5%
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuery {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    /// net of the protocol fee
    pub amount: u64,
    pub slippage_bps: u16,
    /// bypass any cache on the routing service side
    pub force_fetch: bool,
    pub user: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuote {
    pub route_id: String,
    pub net_amount_in: u64,
    pub amount_out: u64,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// trust the routing service ordering, best first
    #[default]
    First,
    /// highest output, then fewest instructions, then earliest candidate.
    /// A no-op for single-candidate route finders such as Jupiter.
    MaxOutput,
}

impl SelectionPolicy {
    pub fn pick(&self, candidates: Option<Vec<RouteQuote>>) -> Result<RouteQuote> {
        let mut candidates = candidates.unwrap_or_default();
        if candidates.is_empty() {
            return Err(Error::NoRouteFound);
        }
        let idx = match self {
            SelectionPolicy::First => 0,
            SelectionPolicy::MaxOutput => candidates
                .iter()
                .enumerate()
                // max_by_key keeps the last maximum, reverse the index to favour the first
                .max_by_key(|(idx, quote)| {
                    (
                        quote.amount_out,
                        std::cmp::Reverse(quote.instructions.len()),
                        std::cmp::Reverse(*idx),
                    )
                })
                .map(|(idx, _)| idx)
                .unwrap_or_default(),
        };
        Ok(candidates.swap_remove(idx))
    }
}
