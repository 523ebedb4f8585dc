//! Chat backend facade trait and backend registry.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{BackendError, BackendId, TurnRequest, TurnResponse};

pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One request/response cycle against a backend. Implementations never retry
/// internally; a failed turn fails the whole invocation.
pub trait ChatBackend: Send + Sync {
    fn id(&self) -> BackendId;

    fn send<'a>(
        &'a self,
        request: TurnRequest,
    ) -> BackendFuture<'a, Result<TurnResponse, BackendError>>;

    /// Lightweight availability check. `false` means unreachable or refused,
    /// never a panic or error.
    fn probe<'a>(&'a self) -> BackendFuture<'a, bool>;
}

impl std::fmt::Debug for dyn ChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBackend").field("id", &self.id()).finish()
    }
}

#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendId, Arc<dyn ChatBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<B>(&mut self, backend: B)
    where
        B: ChatBackend + 'static,
    {
        self.backends.insert(backend.id(), Arc::new(backend));
    }

    pub fn get(&self, backend_id: BackendId) -> Option<Arc<dyn ChatBackend>> {
        self.backends.get(&backend_id).map(Arc::clone)
    }

    pub fn remove(&mut self, backend_id: BackendId) -> Option<Arc<dyn ChatBackend>> {
        self.backends.remove(&backend_id)
    }

    pub fn contains(&self, backend_id: BackendId) -> bool {
        self.backends.contains_key(&backend_id)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
