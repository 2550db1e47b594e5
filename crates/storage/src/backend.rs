//! The storage-backend contract.

use crate::StorageResult;
use mediavault_id::ResourceId;
use mediavault_types::{ResourceKind, ResourceMeta, ThumbnailSize};

/// Durable persistence keyed by `(user, kind, resource_id[, content_id])`.
///
/// All mutating operations are expected to be called under the owning user's
/// service lock; the contract itself only requires that
/// [`list_resource_ids`](StorageBackend::list_resource_ids) be safe to call
/// concurrently with writers (callers treat the result as a snapshot).
pub trait StorageBackend: Send + Sync {
    /// Enumerates every resource of `kind` with a persisted metadata record.
    ///
    /// Used to hydrate the resource-id cache. May race with writers; the
    /// result is a snapshot, not a consistent view.
    fn list_resource_ids(&self, user_id: &str, kind: ResourceKind)
        -> StorageResult<Vec<ResourceId>>;

    fn load_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<Option<ResourceMeta>>;

    fn save_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        metadata: &ResourceMeta,
    ) -> StorageResult<()>;

    /// Removes only the metadata record. Returns `false` when absent.
    fn delete_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<bool>;

    fn load_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> StorageResult<Option<Vec<u8>>>;

    fn save_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
        data: &[u8],
    ) -> StorageResult<()>;

    /// Removes one content blob. Returns `false` when absent.
    fn delete_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> StorageResult<bool>;

    fn load_thumbnail(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
    ) -> StorageResult<Option<Vec<u8>>>;

    fn save_thumbnail(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
        data: &[u8],
    ) -> StorageResult<()>;

    fn thumbnail_exists(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
    ) -> StorageResult<bool>;

    /// Removes the entire resource tree (metadata, contents, thumbnails) as a
    /// unit. Returns `false` when the resource does not exist; no
    /// partial-deletion API is exposed.
    fn delete_resource(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<bool>;

    fn load_user_profile(&self, user_id: &str) -> StorageResult<Option<serde_json::Value>>;

    fn save_user_profile(&self, user_id: &str, profile: &serde_json::Value) -> StorageResult<()>;
}
