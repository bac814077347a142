use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Dataset, PersonId};

/// Returns the ancestors of a person, up to `gens` generations.
///
/// The response is any subset of people and parentage links around
/// `person`; the caller merges it into its index. An empty dataset means
/// nothing more is known.
#[async_trait]
pub trait AncestorSource: Send + Sync {
    async fn expand(&self, person: PersonId, gens: u32) -> Result<Dataset, AppError>;
}
