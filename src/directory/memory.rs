use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        RwLock,
    },
};

use async_trait::async_trait;
use uuid::Uuid;

use super::{KitchenDirectory, KitchenInfo, UserDirectory, UserPreference, UserProfile};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
struct Kitchen {
    name: String,
    cuisine_type: String,
}

/// Kitchen directory held in memory.
#[derive(Default)]
pub struct InMemoryKitchenDirectory {
    kitchens: RwLock<HashMap<Uuid, Kitchen>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryKitchenDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kitchen(self, id: Uuid, name: &str, cuisine_type: &str) -> Self {
        self.insert(id, name, cuisine_type);
        self
    }

    pub fn insert(&self, id: Uuid, name: &str, cuisine_type: &str) {
        let kitchen = Kitchen {
            name: name.into(),
            cuisine_type: cuisine_type.into(),
        };
        if let Ok(mut kitchens) = self.kitchens.write() {
            kitchens.insert(id, kitchen);
        }
    }

    /// Makes every subsequent call fail as if the peer were down.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ServiceResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::upstream("kitchen directory", "unavailable"));
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<Uuid, Kitchen>) -> T) -> ServiceResult<T> {
        self.kitchens
            .read()
            .map(|k| f(&*k))
            .map_err(|e| ServiceError::upstream("kitchen directory", e))
    }
}

#[async_trait]
impl KitchenDirectory for InMemoryKitchenDirectory {
    async fn validate_kitchen_id(&self, id: Uuid) -> ServiceResult<()> {
        self.get_kitchen_by_id(id).await.map(|_| ())
    }

    async fn get_kitchen_by_id(&self, id: Uuid) -> ServiceResult<KitchenInfo> {
        self.enter()?;
        self.read(|k| k.get(&id).cloned())?
            .map(|k| KitchenInfo { id, name: k.name })
            .ok_or_else(|| ServiceError::not_found("kitchen", id))
    }

    async fn get_kitchen_ids_by_cuisine_type(&self, cuisine: &str) -> ServiceResult<Vec<Uuid>> {
        self.enter()?;
        self.read(|k| {
            let mut ids: Vec<Uuid> = k
                .iter()
                .filter(|(_, kitchen)| kitchen.cuisine_type.eq_ignore_ascii_case(cuisine))
                .map(|(id, _)| *id)
                .collect();
            ids.sort_unstable();
            ids
        })
    }

    async fn get_kitchen_names(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>> {
        self.enter()?;
        self.read(|k| {
            ids.iter()
                .filter_map(|id| k.get(id).map(|kitchen| (*id, kitchen.name.clone())))
                .collect()
        })
    }
}

#[derive(Debug, Clone)]
struct User {
    username: String,
    preference: UserPreference,
}

/// User directory held in memory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, id: Uuid, username: &str) -> Self {
        self.insert(id, username, UserPreference::default());
        self
    }

    pub fn with_preference(self, id: Uuid, username: &str, preference: UserPreference) -> Self {
        self.insert(id, username, preference);
        self
    }

    pub fn insert(&self, id: Uuid, username: &str, preference: UserPreference) {
        let user = User {
            username: username.into(),
            preference,
        };
        if let Ok(mut users) = self.users.write() {
            users.insert(id, user);
        }
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ServiceResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::upstream("user directory", "unavailable"));
        }
        Ok(())
    }

    fn find(&self, id: Uuid) -> ServiceResult<User> {
        self.users
            .read()
            .map_err(|e| ServiceError::upstream("user directory", e))?
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("user", id))
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn validate_user_id(&self, id: Uuid) -> ServiceResult<()> {
        self.enter()?;
        self.find(id).map(|_| ())
    }

    async fn get_profile(&self, id: Uuid) -> ServiceResult<UserProfile> {
        self.enter()?;
        self.find(id).map(|u| UserProfile {
            id,
            username: u.username,
        })
    }

    async fn get_user_preference(&self, id: Uuid) -> ServiceResult<UserPreference> {
        self.enter()?;
        self.find(id).map(|u| u.preference)
    }

    async fn get_usernames(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>> {
        self.enter()?;
        let users = self
            .users
            .read()
            .map_err(|e| ServiceError::upstream("user directory", e))?;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|u| (*id, u.username.clone())))
            .collect())
    }
}
