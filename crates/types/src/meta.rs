//! Resource metadata records and the pure construction/merge logic.
//!
//! A resource is described by one durable [`ResourceMeta`] record:
//!
//! - `basic_meta` is system-owned and never directly user-editable. It carries
//!   the timestamps, the set of live content ids and the per-content metadata
//!   entries, plus an open `extra_info` map for enrichment data (EXIF,
//!   geolocation).
//! - `detail_meta` is user-owned free-form JSON, merged shallowly on update.
//!
//! Invariant: `basic_meta.content_ids` always equals the set of `id` fields in
//! `basic_meta.contents`. Mutations go through [`ResourceMeta::apply_update`],
//! which reassigns `content_ids` from the caller-supplied live view (the
//! content-id manager's state) on every edit.

use chrono::{DateTime, Utc};

/// Free-form user-editable metadata (shallow-merged on update).
pub type DetailMeta = serde_json::Map<String, serde_json::Value>;

/// Open enrichment map (EXIF tags, geolocation, ...).
pub type ExtraInfo = serde_json::Map<String, serde_json::Value>;

/// Placeholder used when an upload carries no usable filename.
pub const UNKNOWN_FILENAME: &str = "unknown";

/// Errors from the pure metadata model.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// The record exists but has no `basic_meta` section to update.
    #[error("resource metadata has no basic_meta section")]
    MissingBasicMeta,
}

/// Metadata for one uploaded binary variant within a resource.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContentMeta {
    /// Content id, unique within the owning resource.
    pub id: u32,

    /// Original (sanitised) filename of the upload.
    pub filename: String,

    /// Detected MIME type of the content.
    pub mimetype: String,

    /// SHA-256 hex digest of the content bytes.
    ///
    /// Doubles as the intra-resource dedup key: no two contents of one
    /// resource may share a hash.
    pub hash: String,

    /// Size of the content in bytes, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// UTC timestamp when the content was first attached.
    pub created_at: DateTime<Utc>,

    /// UTC timestamp of the last replacement of this content.
    pub updated_at: DateTime<Utc>,

    /// Content-specific enrichment data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<ExtraInfo>,
}

impl ContentMeta {
    /// Creates metadata for a freshly uploaded content item.
    ///
    /// `created_at == updated_at == now`. A missing filename falls back to
    /// [`UNKNOWN_FILENAME`].
    pub fn new(
        id: u32,
        filename: Option<String>,
        mimetype: impl Into<String>,
        hash: impl Into<String>,
        extra_info: Option<ExtraInfo>,
        size: Option<u64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            filename: filename.unwrap_or_else(|| UNKNOWN_FILENAME.to_owned()),
            mimetype: mimetype.into(),
            hash: hash.into(),
            size,
            created_at: now,
            updated_at: now,
            extra_info,
        }
    }
}

/// System-owned metadata common to all resource kinds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BasicMeta {
    /// UTC timestamp when the resource was created.
    pub created_at: DateTime<Utc>,

    /// UTC timestamp of the last metadata-affecting mutation.
    ///
    /// Advances monotonically: every [`ResourceMeta::apply_update`] stamps it.
    pub updated_at: DateTime<Utc>,

    /// Live content ids, kept in step with `contents`.
    #[serde(default)]
    pub content_ids: Vec<u32>,

    /// One entry per live content id.
    #[serde(default)]
    pub contents: Vec<ContentMeta>,

    /// Resource-level enrichment data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<ExtraInfo>,

    /// Reserved relation list; no mutation path touches it yet.
    #[serde(default)]
    pub child_resource_ids: Vec<String>,

    /// Reserved relation list; no mutation path touches it yet.
    #[serde(default)]
    pub parent_resource_ids: Vec<String>,
}

/// The durable record for one resource.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResourceMeta {
    /// System-owned metadata; absent only in corrupt records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_meta: Option<BasicMeta>,

    /// User-owned free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_meta: Option<DetailMeta>,
}

impl ResourceMeta {
    /// Creates the record for a brand-new resource.
    ///
    /// Both timestamps are set to now. When an initial content entry is given
    /// it seeds `content_ids`/`contents`, and its `extra_info` (if any) is
    /// mirrored into the resource-level `extra_info` so enrichment lookups
    /// (for example reverse geocoding) work from the resource record alone.
    pub fn new(detail_meta: Option<DetailMeta>, content: Option<ContentMeta>) -> Self {
        let now = Utc::now();
        let mut basic = BasicMeta {
            created_at: now,
            updated_at: now,
            content_ids: Vec::new(),
            contents: Vec::new(),
            extra_info: None,
            child_resource_ids: Vec::new(),
            parent_resource_ids: Vec::new(),
        };

        if let Some(content) = content {
            basic.content_ids.push(content.id);
            basic.extra_info = content.extra_info.clone();
            basic.contents.push(content);
        }

        Self {
            basic_meta: Some(basic),
            detail_meta,
        }
    }

    /// Applies an update to an existing record.
    ///
    /// - `content_change = Some((id, Some(meta)))` replaces (or appends) the
    ///   content entry with that id; `Some((id, None))` removes it.
    /// - `detail_meta` keys are shallow-merged into the existing map
    ///   (created if absent).
    /// - `content_ids` is reassigned from `live_content_ids`, the content-id
    ///   manager's authoritative view, which reconciles any drift between the
    ///   manager and this record.
    /// - `updated_at` always advances.
    ///
    /// Fails with [`MetaError::MissingBasicMeta`] when the record has no
    /// `basic_meta` section.
    pub fn apply_update(
        &mut self,
        detail_meta: Option<DetailMeta>,
        content_change: Option<(u32, Option<ContentMeta>)>,
        live_content_ids: &[u32],
    ) -> Result<(), MetaError> {
        let basic = self.basic_meta.as_mut().ok_or(MetaError::MissingBasicMeta)?;

        if let Some((content_id, replacement)) = content_change {
            basic.contents.retain(|content| content.id != content_id);
            if let Some(replacement) = replacement {
                basic.contents.push(replacement);
            }
        }

        if let Some(incoming) = detail_meta {
            match self.detail_meta.as_mut() {
                Some(existing) => {
                    for (key, value) in incoming {
                        existing.insert(key, value);
                    }
                }
                None => self.detail_meta = Some(incoming),
            }
        }

        basic.content_ids = live_content_ids.to_vec();
        basic.updated_at = Utc::now();

        Ok(())
    }

    /// Returns the content entry with the given id, if present.
    pub fn content(&self, content_id: u32) -> Option<&ContentMeta> {
        self.basic_meta
            .as_ref()?
            .contents
            .iter()
            .find(|content| content.id == content_id)
    }
}

/// Strips any path components from an uploaded filename and rejects names
/// that are empty or purely dots after trimming.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .trim()
        .to_owned();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        return None;
    }

    Some(name)
}
