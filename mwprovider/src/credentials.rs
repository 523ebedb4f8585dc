//! Secure in-memory API-key storage shared by backend adapters.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{BackendError, BackendId};

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

/// Mutex-guarded key store. Keys never leave the store; callers borrow them
/// through [`BackendCredentialStore::with_api_key`] so copies are not left
/// behind in caller-owned strings unless explicitly requested.
#[derive(Default)]
pub struct BackendCredentialStore {
    keys: Mutex<HashMap<BackendId, SecretString>>,
}

impl BackendCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_key(
        &self,
        backend_id: BackendId,
        api_key: impl Into<String>,
    ) -> Result<(), BackendError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(BackendError::authentication(
                "API key must not be empty",
            ));
        }

        self.lock()?.insert(backend_id, SecretString::new(api_key));
        Ok(())
    }

    pub fn with_api_key<T>(
        &self,
        backend_id: BackendId,
        reader: impl FnOnce(&str) -> T,
    ) -> Result<Option<T>, BackendError> {
        let keys = self.lock()?;
        Ok(keys.get(&backend_id).map(|key| reader(key.expose())))
    }

    pub fn clear(&self, backend_id: BackendId) -> Result<bool, BackendError> {
        Ok(self.lock()?.remove(&backend_id).is_some())
    }

    pub fn contains(&self, backend_id: BackendId) -> Result<bool, BackendError> {
        Ok(self.lock()?.contains_key(&backend_id))
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<BackendId, SecretString>>, BackendError> {
        self.keys
            .lock()
            .map_err(|_| BackendError::unknown("credential store mutex poisoned"))
    }
}

impl std::fmt::Debug for BackendCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BackendCredentialStore([REDACTED])")
    }
}
