use std::collections::HashMap;

use crate::address::Address;
use crate::error::{ConfigError, Error};
use crate::types::config::{ChainConfig, TokenDescriptor};

/// Configured tokens per chain, keyed by normalised address.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    chains: HashMap<u64, HashMap<Address, TokenDescriptor>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from chain configuration, rejecting duplicate chains and tokens.
    pub fn from_chains(chains: &[ChainConfig]) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for chain in chains {
            if registry.chains.contains_key(&chain.chain_id) {
                return Err(ConfigError::DuplicateChain(chain.chain_id));
            }
            let mut tokens = HashMap::with_capacity(chain.tokens.len());
            for token in &chain.tokens {
                if tokens.insert(token.address, token.clone()).is_some() {
                    return Err(ConfigError::DuplicateToken {
                        chain_id: chain.chain_id,
                        address: token.address,
                    });
                }
            }
            registry.chains.insert(chain.chain_id, tokens);
        }
        Ok(registry)
    }

    /// Add or replace a token on a chain.
    pub fn insert(&mut self, chain_id: u64, token: TokenDescriptor) {
        self.chains
            .entry(chain_id)
            .or_default()
            .insert(token.address, token);
    }

    /// Look up a configured token. An unconfigured chain has no tokens, so
    /// it fails the same way as an unconfigured token.
    pub fn lookup(&self, chain_id: u64, address: &Address) -> Result<&TokenDescriptor, Error> {
        self.chains
            .get(&chain_id)
            .and_then(|tokens| tokens.get(address))
            .ok_or(Error::UnknownToken {
                chain_id,
                address: *address,
            })
    }
}
