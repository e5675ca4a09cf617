use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, StoreError};
use crate::store::PriceStore;
use crate::types::observation::PriceObservation;

/// A chain's observation list, shared between the cache and its readers.
pub type Observations = Arc<[PriceObservation]>;

type ReloadResult = Result<Observations, Arc<StoreError>>;
type SharedReload = Shared<BoxFuture<'static, ReloadResult>>;

/// One chain's cached observations, pending or resolved.
struct CacheEntry {
    last_updated_at: Instant,
    generation: u64,
    observations: SharedReload,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<u64, CacheEntry>,
    next_generation: u64,
}

/// Per-chain cache of recorded observations, reloaded from a [`PriceStore`]
/// once an entry is older than the refresh interval.
///
/// A reload is published in the cache before it is awaited, so callers that
/// arrive while it is in flight share its result (or its error) instead of
/// issuing their own. A failed reload leaves the chain without an entry and
/// the next call retries.
pub struct PriceCache {
    store: Arc<dyn PriceStore>,
    update_every: Duration,
    state: Mutex<CacheState>,
}

impl PriceCache {
    pub fn new(store: Arc<dyn PriceStore>, update_every: Duration) -> Self {
        Self {
            store,
            update_every,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Return the chain's observations, reloading them first if absent or stale.
    pub async fn get_observations(&self, chain_id: u64) -> Result<Observations, Error> {
        let (generation, reload) = self.current_or_reload(chain_id).await;

        match reload.await {
            Ok(observations) => Ok(observations),
            Err(err) => {
                let mut state = self.state.lock().await;
                if state
                    .entries
                    .get(&chain_id)
                    .is_some_and(|entry| entry.generation == generation)
                {
                    state.entries.remove(&chain_id);
                }
                Err(Error::Store(err))
            }
        }
    }

    /// Chains that currently hold an entry, pending or resolved.
    pub async fn cached_chains(&self) -> Vec<u64> {
        let state = self.state.lock().await;
        let mut chains: Vec<u64> = state.entries.keys().copied().collect();
        chains.sort_unstable();
        chains
    }

    async fn current_or_reload(&self, chain_id: u64) -> (u64, SharedReload) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let fresh = state.entries.get(&chain_id).and_then(|entry| {
            let age = now.duration_since(entry.last_updated_at);
            (age <= self.update_every).then(|| (entry.generation, entry.observations.clone()))
        });
        if let Some(current) = fresh {
            return current;
        }

        if state.entries.contains_key(&chain_id) {
            debug!(chain_id, "cached prices are stale");
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        let reload = self.reload(chain_id);
        state.entries.insert(
            chain_id,
            CacheEntry {
                last_updated_at: now,
                generation,
                observations: reload.clone(),
            },
        );
        (generation, reload)
    }

    fn reload(&self, chain_id: u64) -> SharedReload {
        let store = Arc::clone(&self.store);
        async move {
            let started = Instant::now();
            debug!(chain_id, "reloading price observations");
            match store.load(chain_id).await {
                Ok(observations) => {
                    info!(
                        chain_id,
                        count = observations.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "loaded price observations"
                    );
                    Ok(Observations::from(observations))
                }
                Err(err) => {
                    warn!(chain_id, error = %err, "failed to load price observations");
                    Err(Arc::new(err))
                }
            }
        }
        .boxed()
        .shared()
    }
}
