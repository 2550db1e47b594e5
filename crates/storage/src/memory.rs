//! In-memory storage backend.
//!
//! Non-persistent, DashMap-backed implementation of the storage contract.
//! Used by the test suites and suitable for embedded/demo setups; all data
//! is lost when the process exits.

use dashmap::DashMap;
use mediavault_id::ResourceId;
use mediavault_types::{ResourceKind, ResourceMeta, ThumbnailSize};

use crate::{StorageBackend, StorageResult};

type ResourceKey = (String, ResourceKind, ResourceId);

/// In-memory implementation of [`StorageBackend`].
#[derive(Default)]
pub struct MemoryStorageBackend {
    metadata: DashMap<ResourceKey, ResourceMeta>,
    contents: DashMap<(String, ResourceKind, ResourceId, u32), Vec<u8>>,
    thumbnails: DashMap<(String, ResourceKind, ResourceId, ThumbnailSize), Vec<u8>>,
    profiles: DashMap<String, serde_json::Value>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorageBackend {
    fn list_resource_ids(
        &self,
        user_id: &str,
        kind: ResourceKind,
    ) -> StorageResult<Vec<ResourceId>> {
        Ok(self
            .metadata
            .iter()
            .filter(|entry| {
                let (user, entry_kind, _) = entry.key();
                user == user_id && *entry_kind == kind
            })
            .map(|entry| entry.key().2)
            .collect())
    }

    fn load_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<Option<ResourceMeta>> {
        let key = (user_id.to_owned(), kind, *resource_id);
        Ok(self.metadata.get(&key).map(|entry| entry.value().clone()))
    }

    fn save_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        metadata: &ResourceMeta,
    ) -> StorageResult<()> {
        self.metadata
            .insert((user_id.to_owned(), kind, *resource_id), metadata.clone());
        Ok(())
    }

    fn delete_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<bool> {
        let key = (user_id.to_owned(), kind, *resource_id);
        Ok(self.metadata.remove(&key).is_some())
    }

    fn load_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> StorageResult<Option<Vec<u8>>> {
        let key = (user_id.to_owned(), kind, *resource_id, content_id);
        Ok(self.contents.get(&key).map(|entry| entry.value().clone()))
    }

    fn save_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
        data: &[u8],
    ) -> StorageResult<()> {
        self.contents.insert(
            (user_id.to_owned(), kind, *resource_id, content_id),
            data.to_vec(),
        );
        Ok(())
    }

    fn delete_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> StorageResult<bool> {
        let key = (user_id.to_owned(), kind, *resource_id, content_id);
        Ok(self.contents.remove(&key).is_some())
    }

    fn load_thumbnail(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
    ) -> StorageResult<Option<Vec<u8>>> {
        let key = (user_id.to_owned(), kind, *resource_id, size);
        Ok(self.thumbnails.get(&key).map(|entry| entry.value().clone()))
    }

    fn save_thumbnail(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
        data: &[u8],
    ) -> StorageResult<()> {
        self.thumbnails.insert(
            (user_id.to_owned(), kind, *resource_id, size),
            data.to_vec(),
        );
        Ok(())
    }

    fn thumbnail_exists(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
    ) -> StorageResult<bool> {
        let key = (user_id.to_owned(), kind, *resource_id, size);
        Ok(self.thumbnails.contains_key(&key))
    }

    fn delete_resource(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<bool> {
        let key = (user_id.to_owned(), kind, *resource_id);
        let existed = self.metadata.remove(&key).is_some();

        self.contents.retain(|(user, entry_kind, id, _), _| {
            !(user == user_id && *entry_kind == kind && id == resource_id)
        });
        self.thumbnails.retain(|(user, entry_kind, id, _), _| {
            !(user == user_id && *entry_kind == kind && id == resource_id)
        });

        Ok(existed)
    }

    fn load_user_profile(&self, user_id: &str) -> StorageResult<Option<serde_json::Value>> {
        Ok(self.profiles.get(user_id).map(|entry| entry.value().clone()))
    }

    fn save_user_profile(&self, user_id: &str, profile: &serde_json::Value) -> StorageResult<()> {
        self.profiles.insert(user_id.to_owned(), profile.clone());
        Ok(())
    }
}
