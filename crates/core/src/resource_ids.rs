//! Resource-id allocation and tracking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mediavault_id::ResourceId;
use mediavault_storage::StorageBackend;
use mediavault_types::ResourceKind;
use parking_lot::Mutex;

use crate::ServiceResult;

/// Tracks the set of live resource ids per user for one resource kind.
///
/// The per-user set is hydrated once, on first touch, from the backend's
/// listing primitive; afterwards it is maintained write-through by
/// [`generate`](Self::generate) and [`release`](Self::release). The cache is
/// a uniqueness-enforcement layer scoped to the process lifetime — the
/// backend stays authoritative and a restart rebuilds everything from it.
///
/// All operations are serialized on an internal mutex, independent of the
/// resource service's per-user lock: the manager is consulted from call
/// sites before the service lock is held in some paths.
pub struct ResourceIdManager {
    kind: ResourceKind,
    backend: Arc<dyn StorageBackend>,
    ids: Mutex<HashMap<String, HashSet<ResourceId>>>,
}

impl ResourceIdManager {
    pub fn new(kind: ResourceKind, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            kind,
            backend,
            ids: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` against the user's hydrated id set.
    fn with_user_ids<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut HashSet<ResourceId>) -> T,
    ) -> ServiceResult<T> {
        let mut ids = self.ids.lock();

        if !ids.contains_key(user_id) {
            let listed = self.backend.list_resource_ids(user_id, self.kind)?;
            ids.insert(user_id.to_owned(), listed.into_iter().collect());
        }

        let set = ids.get_mut(user_id).expect("hydrated above");
        Ok(f(set))
    }

    /// Mints a new sortable id, records it and returns it.
    ///
    /// The id is unique against every id the cache has seen for this user;
    /// ULID collisions are treated as negligible and not handled.
    pub fn generate(&self, user_id: &str) -> ServiceResult<ResourceId> {
        self.with_user_ids(user_id, |set| {
            let id = ResourceId::generate();
            set.insert(id);
            id
        })
    }

    /// Forgets an id. Idempotent: releasing an unknown id is a no-op, and a
    /// user that was never hydrated has nothing to release.
    pub fn release(&self, user_id: &str, resource_id: &ResourceId) {
        let mut ids = self.ids.lock();
        if let Some(set) = ids.get_mut(user_id) {
            set.remove(resource_id);
        }
    }

    pub fn exists(&self, user_id: &str, resource_id: &ResourceId) -> ServiceResult<bool> {
        self.with_user_ids(user_id, |set| set.contains(resource_id))
    }

    /// Returns the user's ids in ascending (creation) order.
    pub fn list(&self, user_id: &str) -> ServiceResult<Vec<ResourceId>> {
        self.with_user_ids(user_id, |set| {
            let mut ids: Vec<ResourceId> = set.iter().copied().collect();
            ids.sort();
            ids
        })
    }

    pub fn count(&self, user_id: &str) -> ServiceResult<usize> {
        self.with_user_ids(user_id, |set| set.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediavault_storage::MemoryStorageBackend;
    use mediavault_types::ResourceMeta;

    const USER: &str = "user-1";

    fn manager() -> (Arc<MemoryStorageBackend>, ResourceIdManager) {
        let backend = Arc::new(MemoryStorageBackend::new());
        let manager = ResourceIdManager::new(ResourceKind::Books, backend.clone());
        (backend, manager)
    }

    #[test]
    fn test_generate_is_visible_immediately() {
        let (_backend, manager) = manager();

        let id = manager.generate(USER).unwrap();

        assert!(manager.exists(USER, &id).unwrap());
        assert_eq!(manager.count(USER).unwrap(), 1);
        assert_eq!(manager.list(USER).unwrap(), vec![id]);
    }

    #[test]
    fn test_generate_never_repeats() {
        let (_backend, manager) = manager();

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let id = manager.generate(USER).unwrap();
            assert!(!manager.list(USER).unwrap().is_empty());
            assert!(seen.insert(id), "generated id already listed");
        }
        assert_eq!(manager.count(USER).unwrap(), 50);
    }

    #[test]
    fn test_release_is_idempotent() {
        let (_backend, manager) = manager();
        let id = manager.generate(USER).unwrap();

        manager.release(USER, &id);
        assert!(!manager.exists(USER, &id).unwrap());

        manager.release(USER, &id);
        assert_eq!(manager.count(USER).unwrap(), 0);
    }

    #[test]
    fn test_hydrates_from_backend_listing() {
        let (backend, manager) = manager();

        let id = ResourceId::generate();
        backend
            .save_metadata(USER, ResourceKind::Books, &id, &ResourceMeta::new(None, None))
            .unwrap();

        assert!(manager.exists(USER, &id).unwrap());
        assert_eq!(manager.list(USER).unwrap(), vec![id]);
    }

    #[test]
    fn test_state_rebuilds_from_filesystem_backend() {
        use mediavault_storage::LocalStorageBackend;

        let temp = tempfile::TempDir::new().unwrap();
        let backend = Arc::new(LocalStorageBackend::new(temp.path().join("vault")).unwrap());

        let first = ResourceIdManager::new(ResourceKind::Books, backend.clone());
        let id = first.generate(USER).unwrap();
        backend
            .save_metadata(USER, ResourceKind::Books, &id, &ResourceMeta::new(None, None))
            .unwrap();

        // A fresh manager (fresh process) rebuilds its view from the
        // backend's listing primitive alone.
        let second = ResourceIdManager::new(ResourceKind::Books, backend);
        assert!(second.exists(USER, &id).unwrap());
        assert_eq!(second.list(USER).unwrap(), vec![id]);
    }

    #[test]
    fn test_users_are_isolated() {
        let (_backend, manager) = manager();

        let id = manager.generate("alice").unwrap();

        assert!(!manager.exists("bob", &id).unwrap());
        assert_eq!(manager.count("bob").unwrap(), 0);
    }

    #[test]
    fn test_list_is_sorted() {
        let (_backend, manager) = manager();

        for _ in 0..5 {
            manager.generate(USER).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let listed = manager.list(USER).unwrap();
        let mut sorted = listed.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
    }
}
