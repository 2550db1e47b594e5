//! Filesystem storage backend.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use mediavault_id::ResourceId;
use mediavault_types::{ResourceKind, ResourceMeta, ThumbnailSize};

use crate::{StorageBackend, StorageError, StorageResult};

const METADATA_FILE: &str = "metadata.json";
const PROFILE_FILE: &str = "profile.json";

/// Stores each resource as a small directory tree under a per-user,
/// per-kind, sharded layout (see the crate docs for the full picture).
///
/// The backend is stateless: every operation derives its paths from the
/// storage root. The root directory is created eagerly at construction so
/// later operations only ever create per-resource subtrees.
#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    root: PathBuf,
}

impl LocalStorageBackend {
    /// Creates a backend rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRoot` when the path exists but is not a
    /// directory, or `StorageError::DirCreation` when it cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        if root.exists() && !root.is_dir() {
            return Err(StorageError::InvalidRoot(format!(
                "path is not a directory: {}",
                root.display()
            )));
        }

        fs::create_dir_all(&root).map_err(StorageError::DirCreation)?;

        Ok(Self { root })
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.root.join(user_id)
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join(PROFILE_FILE)
    }

    fn kind_dir(&self, user_id: &str, kind: ResourceKind) -> PathBuf {
        self.user_dir(user_id).join(kind.as_str())
    }

    fn resource_dir(&self, user_id: &str, kind: ResourceKind, id: &ResourceId) -> PathBuf {
        id.sharded_dir(&self.kind_dir(user_id, kind))
    }

    fn metadata_path(&self, user_id: &str, kind: ResourceKind, id: &ResourceId) -> PathBuf {
        self.resource_dir(user_id, kind, id).join(METADATA_FILE)
    }

    fn content_path(
        &self,
        user_id: &str,
        kind: ResourceKind,
        id: &ResourceId,
        content_id: u32,
    ) -> PathBuf {
        self.resource_dir(user_id, kind, id)
            .join(format!("content_{content_id}"))
    }

    fn thumbnail_path(
        &self,
        user_id: &str,
        kind: ResourceKind,
        id: &ResourceId,
        size: ThumbnailSize,
    ) -> PathBuf {
        self.resource_dir(user_id, kind, id)
            .join(format!("thumbnail_{}.webp", size.as_str()))
    }

    fn read_optional(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        if !path.exists() {
            return Ok(None);
        }
        fs::read(path).map(Some).map_err(StorageError::FileRead)
    }

    fn write_in_resource_dir(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StorageError::DirCreation)?;
        }
        fs::write(path, data).map_err(StorageError::FileWrite)
    }

    fn delete_optional(&self, path: &Path) -> StorageResult<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path).map_err(StorageError::FileDelete)?;
        Ok(true)
    }

    /// Records the latest mutation time for `kind` in the user's profile.
    ///
    /// Best-effort: a failed stamp must not fail the resource write it
    /// piggybacks on.
    fn stamp_user_activity(&self, user_id: &str, kind: ResourceKind) {
        let result = (|| -> StorageResult<()> {
            let mut profile = self
                .load_user_profile(user_id)?
                .unwrap_or_else(|| serde_json::json!({}));

            if !profile.is_object() {
                profile = serde_json::json!({});
            }
            let resources = profile
                .as_object_mut()
                .expect("profile is an object")
                .entry("resources")
                .or_insert_with(|| serde_json::json!({}));
            if let Some(map) = resources.as_object_mut() {
                map.insert(
                    kind.as_str().to_owned(),
                    serde_json::Value::String(Utc::now().to_rfc3339()),
                );
            }

            self.save_user_profile(user_id, &profile)
        })();

        if let Err(e) = result {
            tracing::warn!(user = user_id, kind = %kind, "failed to stamp user activity: {e}");
        }
    }
}

impl StorageBackend for LocalStorageBackend {
    fn list_resource_ids(
        &self,
        user_id: &str,
        kind: ResourceKind,
    ) -> StorageResult<Vec<ResourceId>> {
        let kind_dir = self.kind_dir(user_id, kind);
        if !kind_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();

        let shards = fs::read_dir(&kind_dir).map_err(StorageError::FileRead)?;
        for shard in shards.flatten() {
            let shard_path = shard.path();
            if !shard_path.is_dir() {
                continue;
            }

            let entries = match fs::read_dir(&shard_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for entry in entries.flatten() {
                let dir = entry.path();
                if !dir.is_dir() || !dir.join(METADATA_FILE).is_file() {
                    continue;
                }

                let name = entry.file_name();
                match name.to_str().map(ResourceId::parse) {
                    Some(Ok(id)) => ids.push(id),
                    _ => {
                        tracing::warn!(
                            "skipping non-canonical resource directory: {}",
                            dir.display()
                        );
                    }
                }
            }
        }

        Ok(ids)
    }

    fn load_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<Option<ResourceMeta>> {
        let path = self.metadata_path(user_id, kind, resource_id);
        match self.read_optional(&path)? {
            Some(bytes) => {
                let meta =
                    serde_json::from_slice(&bytes).map_err(StorageError::Deserialization)?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    fn save_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        metadata: &ResourceMeta,
    ) -> StorageResult<()> {
        let json =
            serde_json::to_string_pretty(metadata).map_err(StorageError::Serialization)?;
        let path = self.metadata_path(user_id, kind, resource_id);
        self.write_in_resource_dir(&path, json.as_bytes())?;
        self.stamp_user_activity(user_id, kind);
        Ok(())
    }

    fn delete_metadata(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<bool> {
        let path = self.metadata_path(user_id, kind, resource_id);
        self.delete_optional(&path)
    }

    fn load_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> StorageResult<Option<Vec<u8>>> {
        let path = self.content_path(user_id, kind, resource_id, content_id);
        self.read_optional(&path)
    }

    fn save_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
        data: &[u8],
    ) -> StorageResult<()> {
        let path = self.content_path(user_id, kind, resource_id, content_id);
        self.write_in_resource_dir(&path, data)
    }

    fn delete_content(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> StorageResult<bool> {
        let path = self.content_path(user_id, kind, resource_id, content_id);
        self.delete_optional(&path)
    }

    fn load_thumbnail(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
    ) -> StorageResult<Option<Vec<u8>>> {
        let path = self.thumbnail_path(user_id, kind, resource_id, size);
        self.read_optional(&path)
    }

    fn save_thumbnail(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
        data: &[u8],
    ) -> StorageResult<()> {
        let path = self.thumbnail_path(user_id, kind, resource_id, size);
        self.write_in_resource_dir(&path, data)
    }

    fn thumbnail_exists(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
        size: ThumbnailSize,
    ) -> StorageResult<bool> {
        Ok(self
            .thumbnail_path(user_id, kind, resource_id, size)
            .is_file())
    }

    fn delete_resource(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &ResourceId,
    ) -> StorageResult<bool> {
        let dir = self.resource_dir(user_id, kind, resource_id);
        if !dir.is_dir() {
            tracing::warn!("resource directory not found: {}", dir.display());
            return Ok(false);
        }

        fs::remove_dir_all(&dir).map_err(StorageError::FileDelete)?;
        self.stamp_user_activity(user_id, kind);
        tracing::info!("resource deleted: {}", dir.display());
        Ok(true)
    }

    fn load_user_profile(&self, user_id: &str) -> StorageResult<Option<serde_json::Value>> {
        let path = self.profile_path(user_id);
        match self.read_optional(&path)? {
            Some(bytes) => {
                let profile =
                    serde_json::from_slice(&bytes).map_err(StorageError::Deserialization)?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    fn save_user_profile(&self, user_id: &str, profile: &serde_json::Value) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(profile).map_err(StorageError::Serialization)?;
        let path = self.profile_path(user_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StorageError::DirCreation)?;
        }
        fs::write(&path, json.as_bytes()).map_err(StorageError::FileWrite)
    }
}
