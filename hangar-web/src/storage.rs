//! `localStorage`-backed profile storage.
use hangar_engine::{HeroScoringWeights, ProfileSnapshot, ProfileStorage};
use serde::Serialize;
use serde::de::DeserializeOwned;

const PROFILE_PREFIX: &str = "hangar.profile.";
const WEIGHTS_KEY: &str = "hangar.weights";

#[derive(Debug, thiserror::Error)]
pub enum WebStorageError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The string key/value surface of the Web Storage API.
pub trait KeyValueStore {
    /// # Errors
    ///
    /// Returns an error if the backend refuses the read.
    fn get(&self, key: &str) -> Result<Option<String>, WebStorageError>;

    /// # Errors
    ///
    /// Returns an error if the backend refuses the write (quota, privacy mode).
    fn set(&self, key: &str, value: &str) -> Result<(), WebStorageError>;

    /// # Errors
    ///
    /// Returns an error if the backend refuses the removal.
    fn remove(&self, key: &str) -> Result<(), WebStorageError>;
}

impl KeyValueStore for web_sys::Storage {
    fn get(&self, key: &str) -> Result<Option<String>, WebStorageError> {
        self.get_item(key)
            .map_err(|e| WebStorageError::Storage(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WebStorageError> {
        self.set_item(key, value)
            .map_err(|e| WebStorageError::Storage(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), WebStorageError> {
        self.remove_item(key)
            .map_err(|e| WebStorageError::Storage(format!("{e:?}")))
    }
}

/// Profile storage over any [`KeyValueStore`], JSON encoded.
pub struct LocalProfileStorage<B = web_sys::Storage> {
    backend: B,
}

impl LocalProfileStorage<web_sys::Storage> {
    /// Open the page's `localStorage`.
    ///
    /// # Errors
    ///
    /// Returns an error outside a window context or when storage is disabled.
    pub fn from_window() -> Result<Self, WebStorageError> {
        let storage = web_sys::window()
            .ok_or_else(|| WebStorageError::Storage("no window".to_string()))?
            .local_storage()
            .map_err(|e| WebStorageError::Storage(format!("{e:?}")))?
            .ok_or_else(|| WebStorageError::Storage("localStorage unavailable".to_string()))?;
        Ok(Self::new(storage))
    }
}

impl<B: KeyValueStore> LocalProfileStorage<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    fn profile_key(name: &str) -> String {
        format!("{PROFILE_PREFIX}{name}")
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), WebStorageError> {
        let json = serde_json::to_string(value)?;
        self.backend.set(key, &json)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, WebStorageError> {
        self.backend
            .get(key)?
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(WebStorageError::from)
    }
}

impl<B: KeyValueStore> ProfileStorage for LocalProfileStorage<B> {
    type Error = WebStorageError;

    fn save_profile(&self, name: &str, profile: &ProfileSnapshot) -> Result<(), Self::Error> {
        self.write(&Self::profile_key(name), profile)
    }

    fn load_profile(&self, name: &str) -> Result<Option<ProfileSnapshot>, Self::Error> {
        self.read(&Self::profile_key(name))
    }

    fn delete_profile(&self, name: &str) -> Result<(), Self::Error> {
        self.backend.remove(&Self::profile_key(name))
    }

    fn save_weights(&self, weights: &HeroScoringWeights) -> Result<(), Self::Error> {
        self.write(WEIGHTS_KEY, weights)
    }

    fn load_weights(&self) -> Result<Option<HeroScoringWeights>, Self::Error> {
        self.read(WEIGHTS_KEY)
    }
}
