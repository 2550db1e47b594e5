//! The resource lifecycle orchestrator.
//!
//! One [`ResourceService`] instance serves one resource kind. It composes the
//! storage backend, the two id managers, the per-user lock map and the
//! kind's media capabilities, and exposes every lifecycle operation of the
//! REST surface as a plain method returning [`ServiceResult`].
//!
//! Every operation resolves to an already-authenticated `user_id`, acquires
//! that user's lock for its entire duration, validates identifiers against
//! the id managers, reads/mutates the metadata record and persists through
//! the backend. Failed persistence is compensated by releasing freshly
//! allocated ids (and removing partially written blobs) before the error is
//! returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mediavault_id::ResourceId;
use mediavault_storage::StorageBackend;
use mediavault_types::{
    mime_for_extension, sanitize_filename, BasicMeta, ContentMeta, DetailMeta, ResourceKind,
    ResourceMeta, SortField, SortOrder, ThumbnailSize, IMAGE_MIMETYPES,
};
use sha2::{Digest, Sha256};

use crate::{
    ContentIdManager, KindCapabilities, ResourceIdManager, ServiceError, ServiceResult, UserLocks,
};

/// A file received from the transport layer (multipart upload).
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Inputs for resource creation. At least one of `detail`/`content` must be
/// present.
#[derive(Debug, Default)]
pub struct NewResource {
    pub detail: Option<DetailMeta>,
    pub content: Option<UploadFile>,
    pub thumbnail: Option<UploadFile>,
}

/// Result of a successful resource creation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CreatedResource {
    pub resource_id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceSummary {
    pub resource_count: usize,
    pub content_count: usize,
}

/// One row of a resource listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceRecord {
    pub id: ResourceId,
    pub basic_meta: Option<BasicMeta>,
    pub detail_meta: Option<DetailMeta>,
}

/// A sorted, optionally paginated resource listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceList {
    pub resources: Vec<ResourceRecord>,
    pub total_items: usize,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Listing parameters, already parsed into their vocabularies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub order: SortOrder,
    pub sort: SortField,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ContentList {
    pub content_ids: Vec<u32>,
    pub contents: Vec<ContentMeta>,
}

/// Bytes plus the headers the transport needs to serve them.
#[derive(Debug, Clone)]
pub struct ContentPayload {
    pub bytes: Vec<u8>,
    pub mimetype: String,
    pub filename: String,
}

/// An upload that passed format validation.
struct ValidUpload {
    filename: String,
    mimetype: String,
    bytes: Vec<u8>,
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn json_f64(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Lifecycle operations for one resource kind.
pub struct ResourceService {
    kind: ResourceKind,
    backend: Arc<dyn StorageBackend>,
    resource_ids: ResourceIdManager,
    content_ids: ContentIdManager,
    locks: UserLocks,
    caps: KindCapabilities,
}

impl ResourceService {
    /// Creates a service with passthrough media capabilities.
    pub fn new(kind: ResourceKind, backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_capabilities(kind, backend, KindCapabilities::default())
    }

    pub fn with_capabilities(
        kind: ResourceKind,
        backend: Arc<dyn StorageBackend>,
        caps: KindCapabilities,
    ) -> Self {
        Self {
            kind,
            resource_ids: ResourceIdManager::new(kind, backend.clone()),
            content_ids: ContentIdManager::new(kind, backend.clone()),
            locks: UserLocks::new(),
            caps,
            backend,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn ensure_resource(&self, user_id: &str, resource_id: &ResourceId) -> ServiceResult<()> {
        if self.resource_ids.exists(user_id, resource_id)? {
            Ok(())
        } else {
            Err(ServiceError::not_found(
                "Resource not found.",
                format!("resource id '{resource_id}' not found"),
            ))
        }
    }

    fn ensure_content(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> ServiceResult<()> {
        if self.content_ids.exists(user_id, resource_id, content_id)? {
            Ok(())
        } else {
            Err(ServiceError::not_found(
                "Content not found.",
                format!("content id '{content_id}' not found for resource '{resource_id}'"),
            ))
        }
    }

    fn load_meta_required(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
    ) -> ServiceResult<ResourceMeta> {
        self.backend
            .load_metadata(user_id, self.kind, resource_id)?
            .ok_or_else(|| {
                ServiceError::not_found(
                    "Resource not found.",
                    format!("metadata of resource '{resource_id}' not found"),
                )
            })
    }

    /// Checks filename, extension and MIME type of an upload.
    fn validate_upload(&self, file: UploadFile, allowed: &[&str]) -> ServiceResult<ValidUpload> {
        let raw_name = file.filename.as_deref().ok_or_else(|| {
            ServiceError::validation(
                "Invalid content file format.",
                "upload carries no filename",
            )
        })?;

        let filename = sanitize_filename(raw_name).ok_or_else(|| {
            ServiceError::validation(
                "Invalid content file format.",
                format!("invalid filename '{raw_name}'"),
            )
        })?;

        let extension = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_owned(),
            _ => {
                return Err(ServiceError::validation(
                    "Invalid content file format.",
                    format!("filename '{filename}' has no extension"),
                ))
            }
        };

        // Magic bytes first, extension as fallback for signature-less formats.
        let mimetype = infer::get(&file.bytes)
            .map(|kind| kind.mime_type().to_owned())
            .or_else(|| mime_for_extension(&extension).map(str::to_owned))
            .ok_or_else(|| {
                ServiceError::validation(
                    "Invalid content file format.",
                    format!("could not determine the content type of '{filename}'"),
                )
            })?;

        if !allowed.contains(&mimetype.as_str()) {
            return Err(ServiceError::validation(
                "Invalid content file format.",
                format!("content type '{mimetype}' is not allowed for {}", self.kind),
            ));
        }

        Ok(ValidUpload {
            filename,
            mimetype,
            bytes: file.bytes,
        })
    }

    /// Saves the original thumbnail and derives the sized variants.
    ///
    /// The original must persist; derived sizes are regenerated on demand, so
    /// their failures only warn.
    fn store_thumbnail(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        bytes: &[u8],
    ) -> ServiceResult<()> {
        self.backend.save_thumbnail(
            user_id,
            self.kind,
            resource_id,
            ThumbnailSize::Original,
            bytes,
        )?;

        for size in ThumbnailSize::ALL {
            let Some((width, height)) = size.dimensions() else {
                continue;
            };
            match self.caps.thumbnailer.scale(bytes.to_vec(), width, height) {
                Ok(scaled) => {
                    if let Err(e) =
                        self.backend
                            .save_thumbnail(user_id, self.kind, resource_id, size, &scaled)
                    {
                        tracing::warn!(%resource_id, size = %size, "failed to store derived thumbnail: {e}");
                    }
                }
                Err(e) => {
                    tracing::warn!(%resource_id, size = %size, "failed to derive thumbnail: {e}");
                }
            }
        }

        Ok(())
    }

    /// Resource count plus total live content count for one user.
    pub fn summary(&self, user_id: &str) -> ServiceResult<ResourceSummary> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        let ids = self.resource_ids.list(user_id)?;
        let mut content_count = 0;
        for id in &ids {
            content_count += self.content_ids.list(user_id, id)?.len();
        }

        Ok(ResourceSummary {
            resource_count: ids.len(),
            content_count,
        })
    }

    /// The raw resource-id list, in creation order.
    pub fn ids(&self, user_id: &str) -> ServiceResult<Vec<ResourceId>> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.resource_ids.list(user_id)
    }

    /// Sorted, optionally paginated resource listing.
    pub fn list(&self, user_id: &str, query: ListQuery) -> ServiceResult<ResourceList> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        if query.page.is_some() != query.per_page.is_some() {
            return Err(ServiceError::validation(
                "Invalid pagination parameters.",
                "page and per_page must be provided together",
            ));
        }

        let total_items = self.resource_ids.count(user_id)?;

        let mut records = Vec::new();
        for id in self.resource_ids.list(user_id)? {
            match self.backend.load_metadata(user_id, self.kind, &id)? {
                Some(meta) => records.push(ResourceRecord {
                    id,
                    basic_meta: meta.basic_meta,
                    detail_meta: meta.detail_meta,
                }),
                None => tracing::warn!(%id, "resource registered but metadata missing; skipped"),
            }
        }

        sort_records(&mut records, query.sort, query.order);

        if let (Some(page), Some(per_page)) = (query.page, query.per_page) {
            if page < 1 || per_page < 1 {
                return Err(ServiceError::validation(
                    "Invalid pagination parameters.",
                    "page and per_page must be positive integers",
                ));
            }

            let start = (page as usize - 1).saturating_mul(per_page as usize);
            if start >= total_items {
                return Err(ServiceError::validation(
                    "Requested page is out of range.",
                    format!("page {page} exceeds the total number of items: {total_items}"),
                ));
            }

            let end = (start + per_page as usize).min(records.len());
            records = records[start.min(records.len())..end].to_vec();
        }

        Ok(ResourceList {
            resources: records,
            total_items,
            page: query.page,
            per_page: query.per_page,
        })
    }

    /// Creates a resource from metadata and/or an initial content upload.
    ///
    /// Allocation is saga-shaped: ids are allocated first, persistence is
    /// attempted, and every allocated id is released again (and partial
    /// writes removed) when persistence fails.
    pub fn create(&self, user_id: &str, new: NewResource) -> ServiceResult<CreatedResource> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        let NewResource {
            detail,
            content,
            thumbnail,
        } = new;

        if detail.is_none() && content.is_none() {
            return Err(ServiceError::validation(
                "Either metadata or a content file is required.",
                "neither detail metadata nor a content file was provided",
            ));
        }

        let thumbnail = thumbnail
            .map(|file| self.validate_upload(file, IMAGE_MIMETYPES))
            .transpose()?;

        let resource_id = self.resource_ids.generate(user_id)?;

        let mut content_id = None;
        let mut content_meta = None;
        let mut content_bytes = None;

        if let Some(file) = content {
            let upload = match self.validate_upload(file, self.kind.allowed_mimetypes()) {
                Ok(upload) => upload,
                Err(e) => {
                    self.resource_ids.release(user_id, &resource_id);
                    return Err(e);
                }
            };

            let cid = match self.content_ids.generate(user_id, &resource_id) {
                Ok(cid) => cid,
                Err(e) => {
                    self.resource_ids.release(user_id, &resource_id);
                    return Err(e);
                }
            };

            content_meta = Some(ContentMeta::new(
                cid,
                Some(upload.filename),
                upload.mimetype,
                content_hash(&upload.bytes),
                None,
                Some(upload.bytes.len() as u64),
            ));
            content_bytes = Some(upload.bytes);
            content_id = Some(cid);
        }

        let meta = ResourceMeta::new(detail, content_meta);

        let persisted = (|| -> ServiceResult<()> {
            if let (Some(cid), Some(bytes)) = (content_id, content_bytes.as_deref()) {
                self.backend
                    .save_content(user_id, self.kind, &resource_id, cid, bytes)?;
            }
            self.backend
                .save_metadata(user_id, self.kind, &resource_id, &meta)?;
            Ok(())
        })();

        if let Err(e) = persisted {
            if let Err(cleanup) = self.backend.delete_resource(user_id, self.kind, &resource_id)
            {
                tracing::warn!(%resource_id, "rollback of partially created resource failed: {cleanup}");
            }
            if let Some(cid) = content_id {
                self.content_ids.release(user_id, &resource_id, cid);
            }
            self.resource_ids.release(user_id, &resource_id);
            return Err(e);
        }

        if let Some(upload) = thumbnail {
            // Thumbnails are decoration; their failure never undoes a create.
            if let Err(e) = self.store_thumbnail(user_id, &resource_id, &upload.bytes) {
                tracing::warn!(%resource_id, "failed to store thumbnail on create: {e}");
            }
        }

        tracing::info!(kind = %self.kind, %resource_id, "resource created");

        Ok(CreatedResource {
            resource_id,
            content_id,
        })
    }

    /// Fetches the full metadata record.
    pub fn get_meta(&self, user_id: &str, resource_id: &ResourceId) -> ServiceResult<ResourceMeta> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;
        self.load_meta_required(user_id, resource_id)
    }

    /// Shallow-merges `detail` into the resource's `detail_meta`.
    pub fn update_detail(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        detail: DetailMeta,
    ) -> ServiceResult<()> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;
        let mut meta = self.load_meta_required(user_id, resource_id)?;

        let live = self.content_ids.list(user_id, resource_id)?;
        meta.apply_update(Some(detail), None, &live)?;

        self.backend
            .save_metadata(user_id, self.kind, resource_id, &meta)?;
        Ok(())
    }

    /// Deletes the whole resource and releases its ids.
    pub fn delete(&self, user_id: &str, resource_id: &ResourceId) -> ServiceResult<()> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;

        let deleted = self
            .backend
            .delete_resource(user_id, self.kind, resource_id)?;
        if !deleted {
            // Manager/backend drift: the tree is already gone. Releasing the
            // id below restores the "visible iff persisted" invariant.
            tracing::warn!(%resource_id, "resource tree was already absent on delete");
        }

        self.resource_ids.release(user_id, resource_id);
        self.content_ids.forget_resource(user_id, resource_id);

        tracing::info!(kind = %self.kind, %resource_id, "resource deleted");
        Ok(())
    }

    /// Live content ids plus their metadata entries.
    pub fn content_list(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
    ) -> ServiceResult<ContentList> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;

        let content_ids = self.content_ids.list(user_id, resource_id)?;
        if content_ids.is_empty() {
            return Ok(ContentList {
                content_ids,
                contents: Vec::new(),
            });
        }

        let meta = self.load_meta_required(user_id, resource_id)?;
        let contents = meta
            .basic_meta
            .map(|basic| basic.contents)
            .unwrap_or_default();

        Ok(ContentList {
            content_ids,
            contents,
        })
    }

    /// Attaches a new content item, rejecting duplicates by hash.
    pub fn add_content(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        file: UploadFile,
    ) -> ServiceResult<u32> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;
        let upload = self.validate_upload(file, self.kind.allowed_mimetypes())?;
        let mut meta = self.load_meta_required(user_id, resource_id)?;

        let hash = content_hash(&upload.bytes);
        let duplicate = meta
            .basic_meta
            .as_ref()
            .is_some_and(|basic| basic.contents.iter().any(|content| content.hash == hash));
        if duplicate {
            return Err(ServiceError::duplicate(
                "The uploaded content is identical to the existing content.",
                "duplicate content detected; no new content added",
            ));
        }

        let content_id = self.content_ids.generate(user_id, resource_id)?;

        let result = (|| -> ServiceResult<()> {
            let content_meta = ContentMeta::new(
                content_id,
                Some(upload.filename.clone()),
                upload.mimetype.clone(),
                hash.clone(),
                None,
                Some(upload.bytes.len() as u64),
            );
            let live = self.content_ids.list(user_id, resource_id)?;
            meta.apply_update(None, Some((content_id, Some(content_meta))), &live)?;

            // Blob first so the record never points at missing bytes.
            self.backend
                .save_content(user_id, self.kind, resource_id, content_id, &upload.bytes)?;

            if let Err(e) = self
                .backend
                .save_metadata(user_id, self.kind, resource_id, &meta)
            {
                if let Err(cleanup) =
                    self.backend
                        .delete_content(user_id, self.kind, resource_id, content_id)
                {
                    tracing::warn!(%resource_id, content_id, "rollback of orphaned content blob failed: {cleanup}");
                }
                return Err(e.into());
            }
            Ok(())
        })();

        if let Err(e) = result {
            self.content_ids.release(user_id, resource_id, content_id);
            return Err(e);
        }

        tracing::info!(kind = %self.kind, %resource_id, content_id, "content added");
        Ok(content_id)
    }

    /// Fetches one content item, optionally converted to another format.
    pub fn fetch_content(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        content_id: u32,
        target_format: Option<&str>,
    ) -> ServiceResult<ContentPayload> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;
        self.ensure_content(user_id, resource_id, content_id)?;

        let bytes = self
            .backend
            .load_content(user_id, self.kind, resource_id, content_id)?
            .ok_or_else(|| {
                ServiceError::not_found(
                    "Content not found.",
                    format!("content blob {content_id} missing for resource '{resource_id}'"),
                )
            })?;

        let meta = self.load_meta_required(user_id, resource_id)?;
        let content_meta = meta.content(content_id).ok_or_else(|| {
            ServiceError::not_found(
                "Content not found.",
                format!("content id {content_id} is missing from the resource metadata"),
            )
        })?;

        let mut mimetype = content_meta.mimetype.clone();
        let mut data = bytes;

        if let Some(format) = target_format {
            let target = mime_for_extension(format).ok_or_else(|| {
                ServiceError::validation(
                    "Unsupported format requested.",
                    format!("unknown target format '{format}'"),
                )
            })?;
            if target != mimetype {
                data = self.caps.converter.convert(data, &mimetype, target)?;
                mimetype = target.to_owned();
            }
        }

        Ok(ContentPayload {
            bytes: data,
            mimetype,
            filename: content_meta.filename.clone(),
        })
    }

    /// Replaces an existing content item in place, rejecting duplicates.
    pub fn update_content(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        content_id: u32,
        file: UploadFile,
    ) -> ServiceResult<()> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;
        self.ensure_content(user_id, resource_id, content_id)?;

        let upload = self.validate_upload(file, self.kind.allowed_mimetypes())?;
        let mut meta = self.load_meta_required(user_id, resource_id)?;

        let hash = content_hash(&upload.bytes);
        let duplicate = meta
            .basic_meta
            .as_ref()
            .is_some_and(|basic| basic.contents.iter().any(|content| content.hash == hash));
        if duplicate {
            return Err(ServiceError::duplicate(
                "The uploaded content is identical to the existing content.",
                "duplicate content detected; nothing replaced",
            ));
        }

        let content_meta = ContentMeta::new(
            content_id,
            Some(upload.filename),
            upload.mimetype,
            hash,
            None,
            Some(upload.bytes.len() as u64),
        );
        let live = self.content_ids.list(user_id, resource_id)?;
        meta.apply_update(None, Some((content_id, Some(content_meta))), &live)?;

        self.backend
            .save_content(user_id, self.kind, resource_id, content_id, &upload.bytes)?;
        self.backend
            .save_metadata(user_id, self.kind, resource_id, &meta)?;

        tracing::info!(kind = %self.kind, %resource_id, content_id, "content replaced");
        Ok(())
    }

    /// Removes one content item: metadata entry, blob and id.
    pub fn delete_content(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        content_id: u32,
    ) -> ServiceResult<()> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;
        self.ensure_content(user_id, resource_id, content_id)?;

        let mut meta = self.load_meta_required(user_id, resource_id)?;
        if meta.content(content_id).is_none() {
            return Err(ServiceError::not_found(
                "Content not found.",
                format!("content id {content_id} is missing from the resource metadata"),
            ));
        }

        // The id is released only after the record is durably updated, so a
        // failed save leaves the manager and metadata in agreement.
        let live: Vec<u32> = self
            .content_ids
            .list(user_id, resource_id)?
            .into_iter()
            .filter(|id| *id != content_id)
            .collect();
        meta.apply_update(None, Some((content_id, None)), &live)?;

        self.backend
            .save_metadata(user_id, self.kind, resource_id, &meta)?;
        self.content_ids.release(user_id, resource_id, content_id);

        if !self
            .backend
            .delete_content(user_id, self.kind, resource_id, content_id)?
        {
            tracing::warn!(%resource_id, content_id, "content blob was already absent on delete");
        }

        tracing::info!(kind = %self.kind, %resource_id, content_id, "content deleted");
        Ok(())
    }

    /// Fetches a thumbnail, deriving and caching sized variants from the
    /// original on first request.
    pub fn thumbnail(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        size: ThumbnailSize,
    ) -> ServiceResult<Vec<u8>> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;

        if let Some(bytes) = self
            .backend
            .load_thumbnail(user_id, self.kind, resource_id, size)?
        {
            return Ok(bytes);
        }

        if let Some((width, height)) = size.dimensions() {
            if let Some(original) = self.backend.load_thumbnail(
                user_id,
                self.kind,
                resource_id,
                ThumbnailSize::Original,
            )? {
                match self.caps.thumbnailer.scale(original, width, height) {
                    Ok(scaled) => {
                        if let Err(e) = self
                            .backend
                            .save_thumbnail(user_id, self.kind, resource_id, size, &scaled)
                        {
                            tracing::warn!(%resource_id, size = %size, "failed to cache derived thumbnail: {e}");
                        }
                        return Ok(scaled);
                    }
                    Err(e) => {
                        tracing::warn!(%resource_id, size = %size, "thumbnail derivation failed: {e}");
                    }
                }
            }
        }

        Err(ServiceError::not_found(
            "Thumbnail not found.",
            format!("no thumbnail available for resource '{resource_id}' with size '{size}'"),
        ))
    }

    /// Replaces the resource thumbnail (original plus derived sizes).
    pub fn set_thumbnail(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        file: UploadFile,
    ) -> ServiceResult<()> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;
        let upload = self.validate_upload(file, IMAGE_MIMETYPES)?;
        self.store_thumbnail(user_id, resource_id, &upload.bytes)
    }

    /// Rotates the original thumbnail by `angle` degrees and regenerates the
    /// derived sizes.
    pub fn rotate_thumbnail(
        &self,
        user_id: &str,
        resource_id: &ResourceId,
        angle: i32,
    ) -> ServiceResult<()> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;

        let original = self
            .backend
            .load_thumbnail(user_id, self.kind, resource_id, ThumbnailSize::Original)?
            .ok_or_else(|| {
                ServiceError::not_found(
                    "Thumbnail not found.",
                    "no original thumbnail available to rotate",
                )
            })?;

        let rotated = self.caps.thumbnailer.rotate(original, angle)?;
        self.store_thumbnail(user_id, resource_id, &rotated)
    }

    /// Resolves the stored GPS EXIF coordinates to an address. Images only.
    pub fn address(&self, user_id: &str, resource_id: &ResourceId) -> ServiceResult<String> {
        if !self.kind.is_image() {
            return Err(ServiceError::unsupported(
                "Address lookup is only available for images.",
                format!("resource kind '{}' carries no GPS EXIF data", self.kind),
            ));
        }

        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock();

        self.ensure_resource(user_id, resource_id)?;
        let meta = self.load_meta_required(user_id, resource_id)?;

        let extra = meta
            .basic_meta
            .as_ref()
            .and_then(|basic| basic.extra_info.as_ref());

        // A previously resolved address short-circuits the lookup.
        if let Some(address) = extra
            .and_then(|extra| extra.get("location"))
            .and_then(|location| location.get("address_string"))
            .and_then(|value| value.as_str())
        {
            return Ok(address.to_owned());
        }

        let exif = extra.and_then(|extra| extra.get("exif"));
        let latitude = exif
            .and_then(|exif| exif.get("GPSLatitude"))
            .and_then(json_f64);
        let longitude = exif
            .and_then(|exif| exif.get("GPSLongitude"))
            .and_then(json_f64);

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(ServiceError::not_found(
                "No GPS data found.",
                "EXIF metadata does not contain GPS coordinates",
            ));
        };

        self.caps
            .geocoder
            .reverse(latitude, longitude)
            .ok_or_else(|| {
                ServiceError::not_found(
                    "Address could not be resolved.",
                    format!("no address found for ({latitude}, {longitude})"),
                )
            })
    }
}

fn sort_records(records: &mut [ResourceRecord], field: SortField, order: SortOrder) {
    fn basic_time(
        record: &ResourceRecord,
        pick: impl Fn(&BasicMeta) -> DateTime<Utc>,
    ) -> DateTime<Utc> {
        record
            .basic_meta
            .as_ref()
            .map(pick)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn detail_string(record: &ResourceRecord, key: &str) -> String {
        record
            .detail_meta
            .as_ref()
            .and_then(|detail| detail.get(key))
            .and_then(|value| value.as_str())
            .unwrap_or("")
            .to_owned()
    }

    match field {
        // Ids are creation-ordered, so this is the default chronology.
        SortField::Id => records.sort_by_key(|record| record.id),
        SortField::CreatedAt => {
            records.sort_by_key(|record| basic_time(record, |basic| basic.created_at))
        }
        SortField::UpdatedAt => {
            records.sort_by_key(|record| basic_time(record, |basic| basic.updated_at))
        }
        SortField::Filename => records.sort_by_key(|record| {
            record
                .basic_meta
                .as_ref()
                .and_then(|basic| basic.contents.first())
                .map(|content| content.filename.clone())
                .unwrap_or_default()
        }),
        SortField::Size => records.sort_by_key(|record| {
            record
                .basic_meta
                .as_ref()
                .and_then(|basic| basic.contents.first())
                .and_then(|content| content.size)
                .unwrap_or(0)
        }),
        SortField::SortingString => {
            records.sort_by_key(|record| detail_string(record, "sorting_string"))
        }
        SortField::SortingDate => records.sort_by_key(|record| {
            DateTime::parse_from_rfc3339(&detail_string(record, "sorting_date"))
                .map(|parsed| parsed.with_timezone(&Utc))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        }),
    }

    if order.is_descending() {
        records.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediavault_storage::{MemoryStorageBackend, StorageError, StorageResult};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    const USER: &str = "user-1";

    fn detail(pairs: &[(&str, &str)]) -> DetailMeta {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), json!(v)))
            .collect()
    }

    fn pdf_upload(name: &str, tail: &[u8]) -> UploadFile {
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.extend_from_slice(tail);
        UploadFile {
            filename: Some(name.to_owned()),
            bytes,
        }
    }

    fn png_upload(name: &str) -> UploadFile {
        UploadFile {
            filename: Some(name.to_owned()),
            bytes: vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3],
        }
    }

    fn service(kind: ResourceKind) -> ResourceService {
        ResourceService::new(kind, Arc::new(MemoryStorageBackend::new()))
    }

    #[test]
    fn test_create_detail_only() {
        let service = service(ResourceKind::Books);

        let created = service
            .create(
                USER,
                NewResource {
                    detail: Some(detail(&[("title", "A")])),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(created.content_id.is_none());

        let meta = service.get_meta(USER, &created.resource_id).unwrap();
        assert_eq!(meta.detail_meta.unwrap()["title"], json!("A"));
        assert!(meta.basic_meta.unwrap().content_ids.is_empty());
    }

    #[test]
    fn test_create_requires_detail_or_content() {
        let service = service(ResourceKind::Books);

        let result = service.create(USER, NewResource::default());
        assert!(matches!(result, Err(ServiceError::Validation { .. })));
        assert_eq!(service.ids(USER).unwrap().len(), 0);
    }

    #[test]
    fn test_create_with_content_allocates_id_one() {
        let service = service(ResourceKind::Books);

        let created = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("book.pdf", b"alpha")),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(created.content_id, Some(1));

        let meta = service.get_meta(USER, &created.resource_id).unwrap();
        let basic = meta.basic_meta.unwrap();
        assert_eq!(basic.content_ids, vec![1]);
        assert_eq!(basic.contents[0].filename, "book.pdf");
        assert_eq!(basic.contents[0].mimetype, "application/pdf");
        assert_eq!(basic.contents[0].hash.len(), 64);
    }

    #[test]
    fn test_create_rejects_wrong_mimetype_and_rolls_back() {
        let service = service(ResourceKind::Music);

        let result = service.create(
            USER,
            NewResource {
                content: Some(pdf_upload("book.pdf", b"alpha")),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(ServiceError::Validation { .. })));
        assert_eq!(service.ids(USER).unwrap().len(), 0);
    }

    #[test]
    fn test_duplicate_content_add_keeps_single_id() {
        let service = service(ResourceKind::Books);

        let created = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("book.pdf", b"same-bytes")),
                    ..Default::default()
                },
            )
            .unwrap();
        let id = created.resource_id;

        let result = service.add_content(USER, &id, pdf_upload("copy.pdf", b"same-bytes"));
        assert!(matches!(result, Err(ServiceError::DuplicateContent { .. })));

        let contents = service.content_list(USER, &id).unwrap();
        assert_eq!(contents.content_ids, vec![1]);
    }

    #[test]
    fn test_add_content_allocates_mex_id() {
        let service = service(ResourceKind::Books);

        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("a.pdf", b"a")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        assert_eq!(service.add_content(USER, &id, pdf_upload("b.pdf", b"b")).unwrap(), 2);
        assert_eq!(service.add_content(USER, &id, pdf_upload("c.pdf", b"c")).unwrap(), 3);

        service.delete_content(USER, &id, 2).unwrap();
        assert_eq!(service.add_content(USER, &id, pdf_upload("d.pdf", b"d")).unwrap(), 2);
    }

    #[test]
    fn test_fetch_content_round_trip() {
        let service = service(ResourceKind::Books);
        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("book.pdf", b"payload")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        let payload = service.fetch_content(USER, &id, 1, None).unwrap();
        assert_eq!(payload.mimetype, "application/pdf");
        assert_eq!(payload.filename, "book.pdf");
        assert!(payload.bytes.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn test_fetch_content_unknown_ids() {
        let service = service(ResourceKind::Books);
        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("book.pdf", b"payload")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        let missing_content = service.fetch_content(USER, &id, 7, None);
        assert!(matches!(missing_content, Err(ServiceError::NotFound { .. })));

        let missing_resource = service.fetch_content(USER, &ResourceId::generate(), 1, None);
        assert!(matches!(missing_resource, Err(ServiceError::NotFound { .. })));
    }

    #[test]
    fn test_fetch_content_conversion_requires_capability() {
        let service = service(ResourceKind::Images);
        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(png_upload("photo.png")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        // Identity conversion passes through.
        let same = service.fetch_content(USER, &id, 1, Some("png")).unwrap();
        assert_eq!(same.mimetype, "image/png");

        // The passthrough converter refuses real conversions.
        let other = service.fetch_content(USER, &id, 1, Some("webp"));
        assert!(matches!(other, Err(ServiceError::Validation { .. })));

        let unknown = service.fetch_content(USER, &id, 1, Some("doc2"));
        assert!(matches!(unknown, Err(ServiceError::Validation { .. })));
    }

    #[test]
    fn test_update_content_replaces_and_rejects_duplicates() {
        let service = service(ResourceKind::Books);
        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("v1.pdf", b"one")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        service
            .update_content(USER, &id, 1, pdf_upload("v2.pdf", b"two"))
            .unwrap();

        let payload = service.fetch_content(USER, &id, 1, None).unwrap();
        assert_eq!(payload.filename, "v2.pdf");

        let duplicate = service.update_content(USER, &id, 1, pdf_upload("v2.pdf", b"two"));
        assert!(matches!(duplicate, Err(ServiceError::DuplicateContent { .. })));
    }

    #[test]
    fn test_delete_content_updates_metadata() {
        let service = service(ResourceKind::Books);
        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("a.pdf", b"a")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;
        service.add_content(USER, &id, pdf_upload("b.pdf", b"b")).unwrap();

        service.delete_content(USER, &id, 1).unwrap();

        let meta = service.get_meta(USER, &id).unwrap();
        let basic = meta.basic_meta.unwrap();
        assert_eq!(basic.content_ids, vec![2]);
        assert_eq!(basic.contents.len(), 1);
        assert_eq!(basic.contents[0].id, 2);

        let gone = service.fetch_content(USER, &id, 1, None);
        assert!(matches!(gone, Err(ServiceError::NotFound { .. })));
    }

    #[test]
    fn test_delete_resource() {
        let service = service(ResourceKind::Books);
        let id = service
            .create(
                USER,
                NewResource {
                    detail: Some(detail(&[("title", "A")])),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        service.delete(USER, &id).unwrap();

        assert!(service.ids(USER).unwrap().is_empty());
        let gone = service.get_meta(USER, &id);
        assert!(matches!(gone, Err(ServiceError::NotFound { .. })));

        let again = service.delete(USER, &id);
        assert!(matches!(again, Err(ServiceError::NotFound { .. })));
    }

    #[test]
    fn test_update_detail_merges() {
        let service = service(ResourceKind::Books);
        let id = service
            .create(
                USER,
                NewResource {
                    detail: Some(detail(&[("title", "A"), ("author", "X")])),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        service
            .update_detail(USER, &id, detail(&[("title", "B")]))
            .unwrap();

        let meta = service.get_meta(USER, &id).unwrap();
        let detail_meta = meta.detail_meta.unwrap();
        assert_eq!(detail_meta["title"], json!("B"));
        assert_eq!(detail_meta["author"], json!("X"));
    }

    #[test]
    fn test_summary_counts_resources_and_contents() {
        let service = service(ResourceKind::Books);

        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("a.pdf", b"a")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;
        service.add_content(USER, &id, pdf_upload("b.pdf", b"b")).unwrap();
        service
            .create(
                USER,
                NewResource {
                    detail: Some(detail(&[("title", "B")])),
                    ..Default::default()
                },
            )
            .unwrap();

        let summary = service.summary(USER).unwrap();
        assert_eq!(summary.resource_count, 2);
        assert_eq!(summary.content_count, 2);
    }

    #[test]
    fn test_list_pagination_window() {
        let service = service(ResourceKind::Books);

        let mut created = Vec::new();
        for i in 0..5 {
            created.push(
                service
                    .create(
                        USER,
                        NewResource {
                            detail: Some(detail(&[("title", &format!("t{i}"))])),
                            ..Default::default()
                        },
                    )
                    .unwrap()
                    .resource_id,
            );
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let query = ListQuery {
            page: Some(2),
            per_page: Some(2),
            order: SortOrder::Asc,
            sort: SortField::Id,
        };
        let listing = service.list(USER, query).unwrap();

        assert_eq!(listing.total_items, 5);
        assert_eq!(listing.page, Some(2));
        assert_eq!(listing.per_page, Some(2));
        assert_eq!(listing.resources.len(), 2);
        assert_eq!(listing.resources[0].id, created[2]);
        assert_eq!(listing.resources[1].id, created[3]);
    }

    #[test]
    fn test_list_pagination_out_of_range() {
        let service = service(ResourceKind::Books);
        service
            .create(
                USER,
                NewResource {
                    detail: Some(detail(&[("title", "A")])),
                    ..Default::default()
                },
            )
            .unwrap();

        let query = ListQuery {
            page: Some(9),
            per_page: Some(10),
            ..Default::default()
        };
        assert!(matches!(
            service.list(USER, query),
            Err(ServiceError::Validation { .. })
        ));

        let half = ListQuery {
            page: Some(1),
            per_page: None,
            ..Default::default()
        };
        assert!(matches!(
            service.list(USER, half),
            Err(ServiceError::Validation { .. })
        ));
    }

    #[test]
    fn test_list_default_order_is_descending() {
        let service = service(ResourceKind::Books);

        let mut created = Vec::new();
        for i in 0..3 {
            created.push(
                service
                    .create(
                        USER,
                        NewResource {
                            detail: Some(detail(&[("title", &format!("t{i}"))])),
                            ..Default::default()
                        },
                    )
                    .unwrap()
                    .resource_id,
            );
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let listing = service.list(USER, ListQuery::default()).unwrap();
        assert_eq!(listing.resources[0].id, created[2]);
        assert_eq!(listing.resources[2].id, created[0]);
    }

    #[test]
    fn test_list_sorts_by_detail_string() {
        let service = service(ResourceKind::Books);

        for title in ["banana", "apple", "cherry"] {
            service
                .create(
                    USER,
                    NewResource {
                        detail: Some(detail(&[("sorting_string", title)])),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        let query = ListQuery {
            order: SortOrder::Asc,
            sort: SortField::SortingString,
            ..Default::default()
        };
        let listing = service.list(USER, query).unwrap();
        let titles: Vec<String> = listing
            .resources
            .iter()
            .map(|record| {
                record.detail_meta.as_ref().unwrap()["sorting_string"]
                    .as_str()
                    .unwrap()
                    .to_owned()
            })
            .collect();

        assert_eq!(titles, vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn test_thumbnail_lifecycle() {
        let service = service(ResourceKind::Books);
        let id = service
            .create(
                USER,
                NewResource {
                    detail: Some(detail(&[("title", "A")])),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        let missing = service.thumbnail(USER, &id, ThumbnailSize::Medium);
        assert!(matches!(missing, Err(ServiceError::NotFound { .. })));

        service.set_thumbnail(USER, &id, png_upload("cover.png")).unwrap();

        // Derived sizes come from the original via the (passthrough) renderer.
        let medium = service.thumbnail(USER, &id, ThumbnailSize::Medium).unwrap();
        let original = service.thumbnail(USER, &id, ThumbnailSize::Original).unwrap();
        assert_eq!(medium, original);

        service.rotate_thumbnail(USER, &id, 90).unwrap();
        assert!(service.thumbnail(USER, &id, ThumbnailSize::Large).is_ok());
    }

    #[test]
    fn test_set_thumbnail_rejects_non_image() {
        let service = service(ResourceKind::Books);
        let id = service
            .create(
                USER,
                NewResource {
                    detail: Some(detail(&[("title", "A")])),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        let result = service.set_thumbnail(USER, &id, pdf_upload("not-an-image.pdf", b"x"));
        assert!(matches!(result, Err(ServiceError::Validation { .. })));
    }

    #[test]
    fn test_address_unsupported_for_non_images() {
        let service = service(ResourceKind::Books);
        let result = service.address(USER, &ResourceId::generate());
        assert!(matches!(result, Err(ServiceError::Unsupported { .. })));
    }

    struct FixedGeocoder;

    impl crate::Geocoder for FixedGeocoder {
        fn reverse(&self, latitude: f64, longitude: f64) -> Option<String> {
            Some(format!("somewhere near ({latitude}, {longitude})"))
        }
    }

    #[test]
    fn test_address_resolves_from_exif() {
        let backend = Arc::new(MemoryStorageBackend::new());
        let caps = KindCapabilities::default().with_geocoder(Arc::new(FixedGeocoder));
        let service =
            ResourceService::with_capabilities(ResourceKind::Images, backend.clone(), caps);

        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(png_upload("photo.png")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        // No GPS data yet.
        let no_gps = service.address(USER, &id);
        assert!(matches!(no_gps, Err(ServiceError::NotFound { .. })));

        // Plant GPS EXIF in the record the way an extractor would.
        let mut meta = backend
            .load_metadata(USER, ResourceKind::Images, &id)
            .unwrap()
            .unwrap();
        let mut extra = mediavault_types::ExtraInfo::new();
        extra.insert(
            "exif".into(),
            json!({"GPSLatitude": 35.68, "GPSLongitude": 139.76}),
        );
        meta.basic_meta.as_mut().unwrap().extra_info = Some(extra);
        backend
            .save_metadata(USER, ResourceKind::Images, &id, &meta)
            .unwrap();

        let address = service.address(USER, &id).unwrap();
        assert!(address.contains("35.68"));
    }

    #[test]
    fn test_address_prefers_stored_location() {
        let backend = Arc::new(MemoryStorageBackend::new());
        let service = ResourceService::new(ResourceKind::Images, backend.clone());

        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(png_upload("photo.png")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        let mut meta = backend
            .load_metadata(USER, ResourceKind::Images, &id)
            .unwrap()
            .unwrap();
        let mut extra = mediavault_types::ExtraInfo::new();
        extra.insert("location".into(), json!({"address_string": "1 Main St"}));
        meta.basic_meta.as_mut().unwrap().extra_info = Some(extra);
        backend
            .save_metadata(USER, ResourceKind::Images, &id, &meta)
            .unwrap();

        assert_eq!(service.address(USER, &id).unwrap(), "1 Main St");
    }

    /// Backend wrapper that fails metadata saves on demand.
    struct FlakyBackend {
        inner: MemoryStorageBackend,
        fail_metadata_saves: AtomicBool,
    }

    impl FlakyBackend {
        fn new() -> Self {
            Self {
                inner: MemoryStorageBackend::new(),
                fail_metadata_saves: AtomicBool::new(false),
            }
        }

        fn fail_saves(&self, fail: bool) {
            self.fail_metadata_saves.store(fail, Ordering::SeqCst);
        }

        fn broken() -> StorageError {
            StorageError::FileWrite(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    impl StorageBackend for FlakyBackend {
        fn list_resource_ids(
            &self,
            user_id: &str,
            kind: ResourceKind,
        ) -> StorageResult<Vec<ResourceId>> {
            self.inner.list_resource_ids(user_id, kind)
        }

        fn load_metadata(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
        ) -> StorageResult<Option<ResourceMeta>> {
            self.inner.load_metadata(user_id, kind, resource_id)
        }

        fn save_metadata(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
            metadata: &ResourceMeta,
        ) -> StorageResult<()> {
            if self.fail_metadata_saves.load(Ordering::SeqCst) {
                return Err(Self::broken());
            }
            self.inner.save_metadata(user_id, kind, resource_id, metadata)
        }

        fn delete_metadata(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
        ) -> StorageResult<bool> {
            self.inner.delete_metadata(user_id, kind, resource_id)
        }

        fn load_content(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
            content_id: u32,
        ) -> StorageResult<Option<Vec<u8>>> {
            self.inner.load_content(user_id, kind, resource_id, content_id)
        }

        fn save_content(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
            content_id: u32,
            data: &[u8],
        ) -> StorageResult<()> {
            self.inner
                .save_content(user_id, kind, resource_id, content_id, data)
        }

        fn delete_content(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
            content_id: u32,
        ) -> StorageResult<bool> {
            self.inner.delete_content(user_id, kind, resource_id, content_id)
        }

        fn load_thumbnail(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
            size: ThumbnailSize,
        ) -> StorageResult<Option<Vec<u8>>> {
            self.inner.load_thumbnail(user_id, kind, resource_id, size)
        }

        fn save_thumbnail(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
            size: ThumbnailSize,
            data: &[u8],
        ) -> StorageResult<()> {
            self.inner
                .save_thumbnail(user_id, kind, resource_id, size, data)
        }

        fn thumbnail_exists(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
            size: ThumbnailSize,
        ) -> StorageResult<bool> {
            self.inner.thumbnail_exists(user_id, kind, resource_id, size)
        }

        fn delete_resource(
            &self,
            user_id: &str,
            kind: ResourceKind,
            resource_id: &ResourceId,
        ) -> StorageResult<bool> {
            self.inner.delete_resource(user_id, kind, resource_id)
        }

        fn load_user_profile(&self, user_id: &str) -> StorageResult<Option<serde_json::Value>> {
            self.inner.load_user_profile(user_id)
        }

        fn save_user_profile(
            &self,
            user_id: &str,
            profile: &serde_json::Value,
        ) -> StorageResult<()> {
            self.inner.save_user_profile(user_id, profile)
        }
    }

    #[test]
    fn test_create_rolls_back_ids_on_save_failure() {
        let backend = Arc::new(FlakyBackend::new());
        let service = ResourceService::new(ResourceKind::Books, backend.clone());

        backend.fail_saves(true);
        let result = service.create(
            USER,
            NewResource {
                content: Some(pdf_upload("book.pdf", b"alpha")),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(ServiceError::Storage(_))));
        assert!(service.ids(USER).unwrap().is_empty());

        // The manager state is clean, so the next create succeeds normally.
        backend.fail_saves(false);
        let created = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("book.pdf", b"alpha")),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(created.content_id, Some(1));
    }

    #[test]
    fn test_add_content_rolls_back_id_on_save_failure() {
        let backend = Arc::new(FlakyBackend::new());
        let service = ResourceService::new(ResourceKind::Books, backend.clone());

        let id = service
            .create(
                USER,
                NewResource {
                    content: Some(pdf_upload("a.pdf", b"a")),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        backend.fail_saves(true);
        let result = service.add_content(USER, &id, pdf_upload("b.pdf", b"b"));
        assert!(matches!(result, Err(ServiceError::Storage(_))));

        backend.fail_saves(false);
        // Id 2 was released and is handed out again.
        assert_eq!(service.add_content(USER, &id, pdf_upload("b.pdf", b"b")).unwrap(), 2);
        assert_eq!(service.content_list(USER, &id).unwrap().content_ids, vec![1, 2]);
    }

    #[test]
    fn test_cross_user_isolation() {
        let service = service(ResourceKind::Books);

        let alice = service
            .create(
                "alice",
                NewResource {
                    detail: Some(detail(&[("title", "A")])),
                    ..Default::default()
                },
            )
            .unwrap()
            .resource_id;

        let bob_view = service.get_meta("bob", &alice);
        assert!(matches!(bob_view, Err(ServiceError::NotFound { .. })));
        assert!(service.ids("bob").unwrap().is_empty());
    }
}
