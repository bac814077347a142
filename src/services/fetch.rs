//! Deduplicated lazy ancestor fetches.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::PersonId;
use crate::source::AncestorSource;
use crate::tree::TreeState;

/// Cache key for one `(person, generations)` request.
pub fn fetch_key(person: PersonId, gens: u32) -> String {
    format!("{person}:{gens}")
}

#[derive(Debug, Default)]
struct Ledger {
    attempted: HashSet<String>,
    in_flight: HashSet<String>,
}

/// Issues each ancestor request at most once and merges the answers.
///
/// Failed requests are remembered like successful ones and never retried.
pub struct AncestorFetcher<S> {
    source: Arc<S>,
    ledger: Mutex<Ledger>,
}

impl<S: AncestorSource> AncestorFetcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Whether `(person, gens)` was already requested or is in flight.
    pub async fn is_known(&self, person: PersonId, gens: u32) -> bool {
        let key = fetch_key(person, gens);
        let ledger = self.ledger.lock().await;
        ledger.attempted.contains(&key) || ledger.in_flight.contains(&key)
    }

    /// Fetches and merges the ancestors of `person`.
    ///
    /// Returns `true` when a response was merged. Returns `false` without
    /// a request when the key is cached or in flight, or when the person
    /// is already confirmed parentless; also `false` when the request
    /// fails.
    pub async fn fetch_ancestors(&self, tree: &Mutex<TreeState>, person: PersonId, gens: u32) -> bool {
        if tree.lock().await.index().is_parentless(person) {
            return false;
        }

        let key = fetch_key(person, gens);
        {
            let mut ledger = self.ledger.lock().await;
            if ledger.attempted.contains(&key) || !ledger.in_flight.insert(key.clone()) {
                tracing::debug!(%key, "Skipping ancestor fetch");
                return false;
            }
        }

        let result = self.source.expand(person, gens).await;

        {
            let mut ledger = self.ledger.lock().await;
            ledger.in_flight.remove(&key);
            ledger.attempted.insert(key);
        }

        match result {
            Ok(dataset) => {
                let mut state = tree.lock().await;
                let stats = state.merge(&dataset);
                if !dataset.has_parent_link(person) {
                    state.mark_parentless(person);
                }
                tracing::debug!(
                    %person,
                    gens,
                    people_added = stats.people_added,
                    "Merged ancestors"
                );
                true
            }
            Err(err) => {
                tracing::warn!(%person, gens, error = %err, "Ancestor fetch failed");
                false
            }
        }
    }
}
