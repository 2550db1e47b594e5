//! # MediaVault Storage
//!
//! Durable persistence for resource metadata, content blobs and thumbnails.
//!
//! The [`StorageBackend`] trait is the single authority for all vault state:
//! the in-memory id caches in `mediavault-core` are hydrated from it and a
//! process restart must be able to reconstruct everything purely from
//! [`StorageBackend::list_resource_ids`] and the metadata records.
//!
//! # Storage Layout (local backend)
//!
//! ```text
//! <root>/                          # storage root
//! └── <user_id>/                   # one tree per tenant
//!     ├── profile.json             # user profile record
//!     └── <kind>/                  # books / videos / music / documents / images
//!         └── <shard>/             # two trailing id characters
//!             └── <resource_id>/
//!                 ├── metadata.json
//!                 ├── content_<content_id>
//!                 └── thumbnail_<size>.webp
//! ```
//!
//! # Failure contract
//!
//! Absence is not an error: `load_*` operations return `Ok(None)` and the
//! delete operations return `Ok(false)` when the target does not exist. Only
//! real I/O or (de)serialisation failures surface as [`StorageError`].

mod backend;
mod local;
mod memory;

pub use backend::StorageBackend;
pub use local::LocalStorageBackend;
pub use memory::MemoryStorageBackend;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage root: {0}")]
    InvalidRoot(String),
    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete file: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize metadata: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize metadata: {0}")]
    Deserialization(serde_json::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
