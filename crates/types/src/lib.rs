//! # MediaVault Types
//!
//! Shared data model for the MediaVault resource store.
//!
//! This crate contains pure data definitions and construction/merge logic:
//! - The resource metadata records ([`ResourceMeta`], [`BasicMeta`],
//!   [`ContentMeta`]) persisted by the storage layer
//! - The resource-kind vocabulary ([`ResourceKind`]) with its per-kind
//!   MIME allow-lists
//! - List-query vocabulary ([`SortField`], [`SortOrder`]) and thumbnail
//!   sizing ([`ThumbnailSize`])
//!
//! **No I/O**: everything here is deterministic apart from timestamping with
//! the wall clock. Storage, locking and HTTP concerns live in the other
//! crates.

pub mod kind;
pub mod meta;
pub mod query;

pub use kind::{mime_for_extension, ResourceKind, UnknownKind, IMAGE_MIMETYPES};
pub use meta::{
    sanitize_filename, BasicMeta, ContentMeta, DetailMeta, ExtraInfo, MetaError, ResourceMeta,
    UNKNOWN_FILENAME,
};
pub use query::{InvalidParameter, SortField, SortOrder, ThumbnailSize};
