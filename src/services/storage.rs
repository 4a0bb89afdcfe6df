use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use crate::models::{DemoSettings, VitalsResult};
use crate::services::UserProfile;

/// Keys used by [`StorageService`]
pub mod keys {
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const USER_DATA: &str = "user_data";
    pub const VITALS_CACHE: &str = "vitals_cache";
    pub const SETTINGS: &str = "app_settings";

    pub const ALL: [&str; 4] = [AUTH_TOKEN, USER_DATA, VITALS_CACHE, SETTINGS];
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: String);

    async fn remove(&self, key: &str);

    async fn clear(&self);
}

/// In-memory store; contents are lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.entries.write().await.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Typed cache of auth, user, vitals and settings data.
///
/// Encoding and decoding failures are logged and treated as a missing value.
pub struct StorageService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StorageService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn store_auth_token(&self, token: &str) {
        self.store.set(keys::AUTH_TOKEN, token.to_string()).await;
    }

    pub async fn auth_token(&self) -> Option<String> {
        self.store.get(keys::AUTH_TOKEN).await
    }

    pub async fn remove_auth_token(&self) {
        self.store.remove(keys::AUTH_TOKEN).await;
    }

    pub async fn store_user_data(&self, user: &UserProfile) {
        self.put_json(keys::USER_DATA, user).await;
    }

    pub async fn user_data(&self) -> Option<UserProfile> {
        self.get_json(keys::USER_DATA).await
    }

    pub async fn store_vitals_cache(&self, vitals: &[VitalsResult]) {
        self.put_json(keys::VITALS_CACHE, vitals).await;
    }

    pub async fn vitals_cache(&self) -> Option<Vec<VitalsResult>> {
        self.get_json(keys::VITALS_CACHE).await
    }

    /// Prepend `vitals` to the cached history
    pub async fn push_vitals(&self, vitals: VitalsResult) {
        let mut cached = self.vitals_cache().await.unwrap_or_default();
        cached.insert(0, vitals);
        self.store_vitals_cache(&cached).await;
    }

    pub async fn store_settings(&self, settings: &DemoSettings) {
        self.put_json(keys::SETTINGS, settings).await;
    }

    pub async fn settings(&self) -> Option<DemoSettings> {
        self.get_json(keys::SETTINGS).await
    }

    /// Remove every key this service owns
    pub async fn clear_all(&self) {
        for key in keys::ALL {
            self.store.remove(key).await;
        }
    }

    async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match encode(value) {
            Ok(json) => self.store.set(key, json).await,
            Err(error) => warn!(key, %error, "failed to store value"),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, %error, "failed to read stored value");
                None
            }
        }
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    Ok(serde_json::to_string(value)?)
}
