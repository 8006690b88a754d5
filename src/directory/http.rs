use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    bounded_lookup, KitchenDirectory, KitchenInfo, UserDirectory, UserPreference, UserProfile,
};
use crate::config::DirectoryConfig;
use crate::error::{ServiceError, ServiceResult};

const KITCHEN_SERVICE: &str = "kitchen directory";
const USER_SERVICE: &str = "user directory";

#[derive(Serialize)]
struct LookupRequest<'a> {
    ids: &'a [Uuid],
}

#[derive(Deserialize)]
struct KitchenIds {
    ids: Vec<Uuid>,
}

/// JSON-over-HTTP transport shared by both directory clients.
#[derive(Clone)]
struct Endpoint {
    client: Client,
    base_url: String,
    service: &'static str,
}

impl Endpoint {
    fn new(client: Client, base_url: &str, service: &'static str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET returning `None` on 404.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ServiceResult<Option<T>> {
        let res = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| ServiceError::upstream(self.service, e))?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = res
            .error_for_status()
            .map_err(|e| ServiceError::upstream(self.service, e))?;
        res.json::<T>()
            .await
            .map(Some)
            .map_err(|e| ServiceError::upstream(self.service, e))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        entity: &'static str,
        id: Uuid,
    ) -> ServiceResult<T> {
        self.get_optional(path, &[])
            .await?
            .ok_or_else(|| ServiceError::not_found(entity, id))
    }

    async fn exists(&self, path: &str) -> ServiceResult<bool> {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ServiceError::upstream(self.service, e))?;
        match res.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(ServiceError::upstream(
                self.service,
                format!("unexpected status {s}"),
            )),
        }
    }

    async fn lookup(&self, path: &str, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>> {
        self.client
            .post(self.url(path))
            .json(&LookupRequest { ids })
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| ServiceError::upstream(self.service, e))?
            .json::<HashMap<Uuid, String>>()
            .await
            .map_err(|e| ServiceError::upstream(self.service, e))
    }
}

#[derive(Clone)]
pub struct HttpKitchenDirectory {
    endpoint: Endpoint,
    batch_lookup: bool,
    concurrency: usize,
}

impl HttpKitchenDirectory {
    pub fn new(client: Client, cfg: &DirectoryConfig) -> Self {
        Self {
            endpoint: Endpoint::new(client, &cfg.kitchen_url, KITCHEN_SERVICE),
            batch_lookup: cfg.batch_lookup,
            concurrency: cfg.enrich_concurrency,
        }
    }
}

#[async_trait]
impl KitchenDirectory for HttpKitchenDirectory {
    #[instrument(skip(self))]
    async fn validate_kitchen_id(&self, id: Uuid) -> ServiceResult<()> {
        if self.endpoint.exists(&format!("/kitchens/{id}")).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("kitchen", id))
        }
    }

    #[instrument(skip(self))]
    async fn get_kitchen_by_id(&self, id: Uuid) -> ServiceResult<KitchenInfo> {
        self.endpoint
            .get(&format!("/kitchens/{id}"), "kitchen", id)
            .await
    }

    #[instrument(skip(self))]
    async fn get_kitchen_ids_by_cuisine_type(&self, cuisine: &str) -> ServiceResult<Vec<Uuid>> {
        let ids = self
            .endpoint
            .get_optional::<KitchenIds>("/kitchens", &[("cuisine_type", cuisine)])
            .await?
            .map(|k| k.ids)
            .unwrap_or_default();
        debug!(count = ids.len(), "kitchens matched cuisine");
        Ok(ids)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_kitchen_names(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        if self.batch_lookup {
            return self.endpoint.lookup("/kitchens/lookup", ids).await;
        }
        let this = self.clone();
        bounded_lookup(ids, self.concurrency, move |id| {
            let this = this.clone();
            async move {
                match this.get_kitchen_by_id(id).await {
                    Ok(k) => Ok(Some(k.name)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}

#[derive(Clone)]
pub struct HttpUserDirectory {
    endpoint: Endpoint,
    batch_lookup: bool,
    concurrency: usize,
}

impl HttpUserDirectory {
    pub fn new(client: Client, cfg: &DirectoryConfig) -> Self {
        Self {
            endpoint: Endpoint::new(client, &cfg.user_url, USER_SERVICE),
            batch_lookup: cfg.batch_lookup,
            concurrency: cfg.enrich_concurrency,
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    #[instrument(skip(self))]
    async fn validate_user_id(&self, id: Uuid) -> ServiceResult<()> {
        if self.endpoint.exists(&format!("/users/{id}")).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("user", id))
        }
    }

    #[instrument(skip(self))]
    async fn get_profile(&self, id: Uuid) -> ServiceResult<UserProfile> {
        self.endpoint.get(&format!("/users/{id}"), "user", id).await
    }

    #[instrument(skip(self))]
    async fn get_user_preference(&self, id: Uuid) -> ServiceResult<UserPreference> {
        self.endpoint
            .get(&format!("/users/{id}/preferences"), "user preference", id)
            .await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_usernames(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        if self.batch_lookup {
            return self.endpoint.lookup("/users/lookup", ids).await;
        }
        let this = self.clone();
        bounded_lookup(ids, self.concurrency, move |id| {
            let this = this.clone();
            async move {
                match this.get_profile(id).await {
                    Ok(p) => Ok(Some(p.username)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}
