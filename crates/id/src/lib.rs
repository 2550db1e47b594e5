//! Resource identifiers and sharded-path utilities.
//!
//! MediaVault stores resources under sharded directories derived from the
//! resource id. Ids are ULIDs in their *canonical* textual form: **26
//! uppercase Crockford base32 characters**. ULIDs are time-prefixed, so the
//! canonical strings sort lexicographically by creation order, which makes
//! id-ordered listings creation-ordered for free.
//!
//! This crate provides:
//! - A wrapper type ([`ResourceId`]) that *guarantees* the canonical format
//!   once constructed.
//! - Shared sharding logic to derive resource directory locations from an
//!   identifier.
//!
//! ## Canonical id form
//! - Length: 26
//! - Characters: Crockford base32 (`0-9`, `A-Z` excluding `I`, `L`, `O`, `U`)
//! - Example: `01HV4Z2WQXKJNM8GPQY6VBKC3D`
//!
//! Non-canonical values (lowercase, wrong length, excluded letters) are
//! rejected. Use [`ResourceId::parse`] to validate externally supplied
//! identifiers (CLI/API inputs).
//!
//! ## Sharded directory layout
//! For a canonical id `u`, resources live under `parent_dir/<u[24..26]>/<u>/`.
//! The shard comes from the *last* two characters — the random tail of the
//! ULID — because the leading characters are all timestamp and every id
//! minted in the same epoch window would land in one shard.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ulid::Ulid;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;

const CANONICAL_LEN: usize = 26;
const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// A resource identifier in canonical ULID form.
///
/// Once constructed, the contained id is guaranteed to be canonical. Use this
/// wrapper whenever you are:
/// - Accepting an id string from outside the core (API path segments), or
/// - Deriving a sharded storage path for a resource, or
/// - Minting a fresh identifier during resource creation.
///
/// # Ordering
/// `ResourceId` orders by the underlying ULID, i.e. by creation time (with
/// the random tail as a tiebreaker), and that order matches the lexicographic
/// order of the canonical strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(Ulid);

impl ResourceId {
    /// Mints a new identifier.
    ///
    /// Suitable for allocating a fresh id during resource creation. Ids
    /// minted in different milliseconds are strictly creation-ordered;
    /// within one millisecond the random tail decides.
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Validates and parses an id string that must already be canonical.
    ///
    /// This does **not** normalise other accepted ULID spellings (lowercase
    /// is valid Crockford but not canonical here). Callers must provide the
    /// canonical representation.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> IdResult<Self> {
        if !Self::is_canonical(input) {
            return Err(IdError::InvalidInput(format!(
                "resource id must be 26 uppercase Crockford base32 characters, got: '{}'",
                input
            )));
        }

        let ulid = Ulid::from_string(input).map_err(|e| {
            IdError::InvalidInput(format!("resource id '{}' is not a valid ULID: {}", input, e))
        })?;

        Ok(Self(ulid))
    }

    /// Returns true if `input` is in canonical id form.
    ///
    /// Purely syntactic: exactly 26 bytes, all from the uppercase Crockford
    /// alphabet. Fast enough for pre-validation of path segments.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == CANONICAL_LEN && input.bytes().all(|b| CROCKFORD.contains(&b))
    }

    /// Returns `parent_dir/<shard>/<id>/` where `<shard>` is the last two
    /// characters of the canonical form.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.to_string();
        let shard = &canonical[CANONICAL_LEN - 2..];
        parent_dir.join(shard).join(&canonical)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceId::parse(s)
    }
}

impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}
