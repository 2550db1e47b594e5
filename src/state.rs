//! Application state shared across REST handlers.

use std::collections::HashMap;
use std::sync::Arc;

use mediavault_core::ResourceService;
use mediavault_storage::StorageBackend;
use mediavault_types::ResourceKind;

/// One [`ResourceService`] per resource kind plus the shared backend.
#[derive(Clone)]
pub struct AppState {
    services: Arc<HashMap<ResourceKind, Arc<ResourceService>>>,
    backend: Arc<dyn StorageBackend>,
    api_key: Option<Arc<str>>,
}

impl AppState {
    /// Builds the per-kind services over a shared backend.
    ///
    /// All kinds currently run with the default (passthrough) media
    /// capabilities; a deployment with real codecs installs them here.
    pub fn new(backend: Arc<dyn StorageBackend>, api_key: Option<String>) -> Self {
        let services = ResourceKind::ALL
            .iter()
            .map(|kind| {
                (
                    *kind,
                    Arc::new(ResourceService::new(*kind, backend.clone())),
                )
            })
            .collect();

        Self {
            services: Arc::new(services),
            backend,
            api_key: api_key.map(Into::into),
        }
    }

    pub fn service(&self, kind: ResourceKind) -> &ResourceService {
        self.services
            .get(&kind)
            .expect("a service exists for every kind")
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}
