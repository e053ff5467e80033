use uuid::Uuid;

use crate::services::{ProfileStore, StoreError};

/// Make sure a profile row exists for `user_id`, creating a default one if missing
///
/// Idempotent. Returns `true` only on the call that created the row.
pub async fn ensure_profile<S>(store: &S, user_id: Uuid) -> Result<bool, StoreError>
where
    S: ProfileStore + ?Sized,
{
    let created = store.ensure_profile(user_id).await?;
    if created {
        tracing::info!("Created default profile for user {}", user_id);
    }
    Ok(created)
}

/// Ensure both participants of a match have profile rows before the match is written
pub async fn ensure_participants<S>(store: &S, a: Uuid, b: Uuid) -> Result<(), StoreError>
where
    S: ProfileStore + ?Sized,
{
    ensure_profile(store, a).await?;
    ensure_profile(store, b).await?;
    Ok(())
}
