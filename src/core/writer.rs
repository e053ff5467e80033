use chrono::{DateTime, Utc};

use crate::models::{CanonicalPair, NewMatch, WingmanMatch};
use crate::services::{MatchStore, StoreError};

/// Result of a match write
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    /// A new pending row was inserted
    Created(WingmanMatch),
    /// The pair already had a pending row; that row is returned unchanged
    AlreadyExists(WingmanMatch),
}

impl WriteOutcome {
    pub fn into_match(self) -> WingmanMatch {
        match self {
            WriteOutcome::Created(m) | WriteOutcome::AlreadyExists(m) => m,
        }
    }
}

/// Insert a pending match for `pair`, or return the pending row that won a concurrent insert
///
/// A unique violation on the canonical pair is the only error recovered
/// here. `Ok(None)` means the violation happened but the winning row is no
/// longer pending, so there is nothing to return.
pub async fn write_match<S>(
    store: &S,
    pair: CanonicalPair,
    now: DateTime<Utc>,
) -> Result<Option<WriteOutcome>, StoreError>
where
    S: MatchStore + ?Sized,
{
    match store.create_match(NewMatch { pair, created_at: now }).await {
        Ok(created) => {
            tracing::info!("Created wingman match {} for pair {}", created.id, pair);
            Ok(Some(WriteOutcome::Created(created)))
        }
        Err(StoreError::DuplicatePair(pair)) => {
            tracing::info!("Pending match already exists for pair {}, fetching it", pair);
            let existing = store.find_pending_for_pair(pair).await?;
            Ok(existing.map(WriteOutcome::AlreadyExists))
        }
        Err(e) => Err(e),
    }
}
