//! # MediaVault Core
//!
//! The resource lifecycle engine: identity allocation, per-user concurrency
//! control and the [`ResourceService`] orchestrator that ties the metadata
//! model to the storage backend.
//!
//! **No API concerns**: authentication, HTTP routing and response envelopes
//! belong to the `mediavault` binary crate.
//!
//! # Consistency model
//!
//! The storage backend is the single source of truth. The id managers are
//! per-process read-through caches hydrated lazily from the backend; a
//! restart reconstructs all of their state from
//! [`StorageBackend::list_resource_ids`](mediavault_storage::StorageBackend::list_resource_ids)
//! and the metadata records. All operations for one user are serialized by a
//! per-user mutex held for the whole operation, so a content-add racing a
//! content-delete on the same resource is never interleaved at the metadata
//! level. There are no internal retries: a backend failure propagates to the
//! caller after compensating id releases (allocate, attempt persist,
//! deallocate on failure).

pub mod content_ids;
pub mod error;
pub mod locks;
pub mod media;
pub mod resource_ids;
pub mod service;

pub use content_ids::ContentIdManager;
pub use error::{ServiceError, ServiceResult};
pub use locks::UserLocks;
pub use media::{
    ContentConverter, Geocoder, KindCapabilities, MediaError, NoGeocoder, PassthroughConverter,
    PassthroughRenderer, ThumbnailRenderer,
};
pub use resource_ids::ResourceIdManager;
pub use service::{
    ContentList, ContentPayload, CreatedResource, ListQuery, NewResource, ResourceList,
    ResourceRecord, ResourceService, ResourceSummary, UploadFile,
};
