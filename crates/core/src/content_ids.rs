//! Content-id allocation and tracking.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use mediavault_id::ResourceId;
use mediavault_storage::StorageBackend;
use mediavault_types::ResourceKind;
use parking_lot::Mutex;

use crate::{ServiceError, ServiceResult};

/// Ids 1..=9 are preferred; allocation never goes past this bound.
pub const MAX_CONTENT_IDS: u32 = 99;

/// Tracks the in-use content ids of each resource for one resource kind.
///
/// Content ids are small positive integers unique only within their owning
/// resource, and they are *reused* after release: allocation always returns
/// the minimum excludant over `1..=99`, which keeps ids human-short and
/// filesystem-path-friendly. The per-resource set is hydrated on first touch
/// from the persisted `basic_meta.content_ids` (empty when the resource or
/// its metadata is absent).
///
/// A single internal mutex serializes all operations; the workload is not
/// contended enough to warrant sharding.
pub struct ContentIdManager {
    kind: ResourceKind,
    backend: Arc<dyn StorageBackend>,
    ids: Mutex<HashMap<(String, ResourceId), BTreeSet<u32>>>,
}

impl ContentIdManager {
    pub fn new(kind: ResourceKind, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            kind,
            backend,
            ids: Mutex::new(HashMap::new()),
        }
    }

    fn with_content_ids<T>(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        f: impl FnOnce(&mut BTreeSet<u32>) -> T,
    ) -> ServiceResult<T> {
        let key = (user_id.to_owned(), *resource_id);
        let mut ids = self.ids.lock();

        if !ids.contains_key(&key) {
            let persisted = self
                .backend
                .load_metadata(user_id, self.kind, resource_id)?
                .and_then(|meta| meta.basic_meta)
                .map(|basic| basic.content_ids.into_iter().collect())
                .unwrap_or_default();
            ids.insert(key.clone(), persisted);
        }

        let set = ids.get_mut(&key).expect("hydrated above");
        Ok(f(set))
    }

    /// Allocates the smallest unused id in `1..=9`, falling back to the
    /// smallest unused id in `1..=99`.
    ///
    /// # Errors
    ///
    /// Fails with a capacity error when the resource already holds
    /// [`MAX_CONTENT_IDS`] live content items.
    pub fn generate(&self, user_id: &str, resource_id: &ResourceId) -> ServiceResult<u32> {
        self.with_content_ids(user_id, resource_id, |set| {
            let next = (1..=MAX_CONTENT_IDS).find(|candidate| !set.contains(candidate));
            match next {
                Some(id) => {
                    set.insert(id);
                    Ok(id)
                }
                None => Err(ServiceError::validation(
                    "Resource content capacity exhausted.",
                    format!("resource '{resource_id}' already holds {MAX_CONTENT_IDS} content items"),
                )),
            }
        })?
    }

    /// Discards an id. Idempotent; an unhydrated resource has nothing to
    /// release.
    pub fn release(&self, user_id: &str, resource_id: &ResourceId, content_id: u32) {
        let key = (user_id.to_owned(), *resource_id);
        let mut ids = self.ids.lock();
        if let Some(set) = ids.get_mut(&key) {
            set.remove(&content_id);
        }
    }

    /// Drops the whole per-resource set, e.g. after resource deletion.
    pub fn forget_resource(&self, user_id: &str, resource_id: &ResourceId) {
        let key = (user_id.to_owned(), *resource_id);
        self.ids.lock().remove(&key);
    }

    pub fn exists(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> ServiceResult<bool> {
        self.with_content_ids(user_id, resource_id, |set| set.contains(&content_id))
    }

    /// Returns the live ids in ascending order.
    pub fn list(&self, user_id: &str, resource_id: &ResourceId) -> ServiceResult<Vec<u32>> {
        self.with_content_ids(user_id, resource_id, |set| set.iter().copied().collect())
    }
}
