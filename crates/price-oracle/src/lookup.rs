use tracing::{debug, trace};

use crate::address::Address;
use crate::cache::{Observations, PriceCache};
use crate::error::Error;
use crate::token::TokenRegistry;
use crate::types::observation::{PriceObservation, RateResult};

/// How an in-range block is matched against recorded observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundaryRule {
    /// Use the latest observation recorded strictly before the block. An
    /// observation recorded at exactly the requested block is skipped.
    #[default]
    StrictlyBefore,
    /// Use the latest observation recorded at or before the block.
    AtOrBefore,
}

impl BoundaryRule {
    fn accepts(self, observed: u64, requested: u64) -> bool {
        match self {
            BoundaryRule::StrictlyBefore => observed < requested,
            BoundaryRule::AtOrBefore => observed <= requested,
        }
    }
}

/// Outcome of selecting an observation from a token's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// No observation exists for the token.
    Empty,
    /// The block is inside the recorded range but nothing matched. Only
    /// possible if the history violates the block ordering.
    Unmatched,
    Found(&'a PriceObservation),
}

/// Pick the observation applicable to `block` from a chain's list.
///
/// The token's observations are taken in list order and assumed ascending
/// by block. No block means the latest observation; blocks past either end
/// of the history reuse the nearest recorded price.
pub fn select_observation<'a>(
    observations: &'a [PriceObservation],
    token: &Address,
    block: Option<u64>,
    rule: BoundaryRule,
) -> Selection<'a> {
    let history: Vec<&PriceObservation> = observations
        .iter()
        .filter(|observation| observation.token == *token)
        .collect();

    let (Some(&earliest), Some(&latest)) = (history.first(), history.last()) else {
        return Selection::Empty;
    };

    let Some(block) = block else {
        return Selection::Found(latest);
    };

    if block > latest.block {
        trace!(%token, block, latest = latest.block, "extrapolating latest price forward");
        return Selection::Found(latest);
    }

    // Nothing can precede the earliest observation, so it also covers a
    // request at exactly its block.
    if block <= earliest.block {
        trace!(%token, block, earliest = earliest.block, "extrapolating earliest price backward");
        return Selection::Found(earliest);
    }

    history
        .iter()
        .rev()
        .find(|observation| rule.accepts(observation.block, block))
        .map_or(Selection::Unmatched, |&observation| Selection::Found(observation))
}

/// Resolves the applicable rate for a configured token from the cached history.
pub struct LookupPolicy {
    registry: TokenRegistry,
    cache: PriceCache,
    rule: BoundaryRule,
}

impl LookupPolicy {
    pub fn new(registry: TokenRegistry, cache: PriceCache) -> Self {
        Self {
            registry,
            cache,
            rule: BoundaryRule::default(),
        }
    }

    pub fn with_boundary_rule(mut self, rule: BoundaryRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// The chain's full observation list, reloaded first if stale.
    pub async fn observations(&self, chain_id: u64) -> Result<Observations, Error> {
        self.cache.get_observations(chain_id).await
    }

    /// Resolve the rate for `token` at `block`, or the latest rate when no block is given.
    pub async fn resolve(
        &self,
        chain_id: u64,
        token: &Address,
        block: Option<u64>,
    ) -> Result<RateResult, Error> {
        let descriptor = self.registry.lookup(chain_id, token)?;
        let observations = self.cache.get_observations(chain_id).await?;

        match select_observation(&observations, token, block, self.rule) {
            Selection::Found(observation) => {
                debug!(
                    chain_id,
                    token = %token.to_checksum(),
                    requested = ?block,
                    observed = observation.block,
                    price = %observation.price,
                    "resolved price"
                );
                Ok(RateResult::new(observation, descriptor.decimals))
            }
            Selection::Empty => Err(Error::NoPricesFound {
                chain_id,
                token: *token,
            }),
            Selection::Unmatched => Err(Error::PriceNotFound {
                chain_id,
                token: *token,
                block: block.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Price;

    fn token(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn obs(token: Address, block: u64, price: &str) -> PriceObservation {
        PriceObservation::new(token, block, price.parse::<Price>().unwrap())
    }

    fn price_of(selection: Selection<'_>) -> String {
        match selection {
            Selection::Found(observation) => observation.price.to_string(),
            other => panic!("expected a price, got {other:?}"),
        }
    }

    fn history() -> Vec<PriceObservation> {
        let aaa = token(0xaa);
        let other = token(0xbb);
        vec![
            obs(other, 50, "99"),
            obs(aaa, 100, "2.00000000"),
            obs(other, 150, "98"),
            obs(aaa, 200, "3.00000000"),
        ]
    }

    #[test]
    fn test_worked_example() {
        let list = history();
        let aaa = token(0xaa);
        let strict = BoundaryRule::StrictlyBefore;

        assert_eq!(price_of(select_observation(&list, &aaa, Some(150), strict)), "2");
        assert_eq!(price_of(select_observation(&list, &aaa, Some(50), strict)), "2");
        assert_eq!(price_of(select_observation(&list, &aaa, Some(250), strict)), "3");
        assert_eq!(price_of(select_observation(&list, &aaa, Some(100), strict)), "2");
        assert_eq!(price_of(select_observation(&list, &aaa, None, strict)), "3");
    }

    #[test]
    fn test_exact_block_skipped_by_default() {
        let aaa = token(0xaa);
        let list = vec![obs(aaa, 100, "2"), obs(aaa, 150, "2.5"), obs(aaa, 200, "3")];

        assert_eq!(
            price_of(select_observation(&list, &aaa, Some(150), BoundaryRule::StrictlyBefore)),
            "2"
        );
        assert_eq!(
            price_of(select_observation(&list, &aaa, Some(150), BoundaryRule::AtOrBefore)),
            "2.5"
        );
        // The latest block is in range, so the rule applies there too.
        assert_eq!(
            price_of(select_observation(&list, &aaa, Some(200), BoundaryRule::StrictlyBefore)),
            "2.5"
        );
    }

    #[test]
    fn test_extrapolation_bounds() {
        let list = history();
        let aaa = token(0xaa);
        let rule = BoundaryRule::StrictlyBefore;

        let current = price_of(select_observation(&list, &aaa, None, rule));
        let forward = price_of(select_observation(&list, &aaa, Some(201), rule));
        assert_eq!(forward, current);

        let backward = price_of(select_observation(&list, &aaa, Some(99), rule));
        assert_eq!(backward, "2");
    }

    #[test]
    fn test_token_without_history_is_empty() {
        let list = history();
        assert_eq!(
            select_observation(&list, &token(0xcc), Some(10), BoundaryRule::StrictlyBefore),
            Selection::Empty
        );
        assert_eq!(
            select_observation(&[], &token(0xaa), None, BoundaryRule::AtOrBefore),
            Selection::Empty
        );
    }
}
