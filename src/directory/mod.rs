//! Capabilities of the external kitchen and user directories.
//!
//! The orchestrators only see these traits; `http` talks to the live services
//! and `memory` backs tests and `AppState::fake`.

pub mod http;
pub mod memory;

use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{sync::Semaphore, task::JoinSet};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KitchenInfo {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPreference {
    pub cuisine_type: String,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
}

#[async_trait]
pub trait KitchenDirectory: Send + Sync {
    async fn validate_kitchen_id(&self, id: Uuid) -> ServiceResult<()>;
    async fn get_kitchen_by_id(&self, id: Uuid) -> ServiceResult<KitchenInfo>;
    async fn get_kitchen_ids_by_cuisine_type(&self, cuisine: &str) -> ServiceResult<Vec<Uuid>>;
    /// Unknown ids are left out of the map.
    async fn get_kitchen_names(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn validate_user_id(&self, id: Uuid) -> ServiceResult<()>;
    async fn get_profile(&self, id: Uuid) -> ServiceResult<UserProfile>;
    async fn get_user_preference(&self, id: Uuid) -> ServiceResult<UserPreference>;
    /// Unknown ids are left out of the map.
    async fn get_usernames(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>>;
}

/// Looks a name up in a batch result, treating an absent id as NotFound.
pub fn resolve_name(
    names: &HashMap<Uuid, String>,
    entity: &'static str,
    id: Uuid,
) -> ServiceResult<String> {
    names
        .get(&id)
        .cloned()
        .ok_or_else(|| ServiceError::not_found(entity, id))
}

/// Runs one lookup per distinct id with at most `concurrency` in flight.
///
/// The first failure aborts the remaining lookups.
pub async fn bounded_lookup<F, Fut>(
    ids: &[Uuid],
    concurrency: usize,
    fetch: F,
) -> ServiceResult<HashMap<Uuid, String>>
where
    F: Fn(Uuid) -> Fut,
    Fut: Future<Output = ServiceResult<Option<String>>> + Send + 'static,
{
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for id in unique {
        let permits = Arc::clone(&permits);
        let lookup = fetch(id);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ServiceError::upstream("directory", e))?;
            lookup.await.map(|name| (id, name))
        });
    }

    let mut names = HashMap::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (id, name) = joined.map_err(|e| ServiceError::upstream("directory", e))??;
        if let Some(name) = name {
            names.insert(id, name);
        }
    }
    Ok(names)
}
