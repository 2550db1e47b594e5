//! Service-level error taxonomy.
//!
//! Every failure carries both a user-facing `message` (safe to return in the
//! response envelope) and a developer-facing `detail`. The REST layer maps
//! the variants onto HTTP status codes:
//!
//! | variant            | status | envelope status |
//! |--------------------|--------|-----------------|
//! | `Validation`       | 400    | error           |
//! | `NotFound`         | 404    | error           |
//! | `DuplicateContent` | 400    | warning         |
//! | `Storage`          | 500    | error           |
//! | `Unsupported`      | 501    | error           |

use mediavault_storage::StorageError;
use mediavault_types::MetaError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Bad or missing identifiers, malformed input, unsupported formats,
    /// out-of-range pagination.
    #[error("{message}")]
    Validation { message: String, detail: String },

    /// Unknown resource or content id.
    #[error("{message}")]
    NotFound { message: String, detail: String },

    /// A content upload whose hash collides with an existing content of the
    /// same resource. Surfaced as a warning, not a hard error.
    #[error("{message}")]
    DuplicateContent { message: String, detail: String },

    /// Backend I/O failure.
    #[error("storage backend failure: {0}")]
    Storage(#[from] StorageError),

    /// Operation not implemented for this resource kind.
    #[error("{message}")]
    Unsupported { message: String, detail: String },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn not_found(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn duplicate(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DuplicateContent {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// User-facing message for the response envelope.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::NotFound { message, .. }
            | Self::DuplicateContent { message, .. }
            | Self::Unsupported { message, .. } => message.clone(),
            Self::Storage(_) => "Storage backend failure.".to_owned(),
        }
    }

    /// Developer-facing detail for the response envelope's `error` field.
    pub fn detail(&self) -> String {
        match self {
            Self::Validation { detail, .. }
            | Self::NotFound { detail, .. }
            | Self::DuplicateContent { detail, .. }
            | Self::Unsupported { detail, .. } => detail.clone(),
            Self::Storage(e) => e.to_string(),
        }
    }
}

impl From<MetaError> for ServiceError {
    fn from(e: MetaError) -> Self {
        match e {
            MetaError::MissingBasicMeta => ServiceError::not_found(
                "Resource metadata not found.",
                "resource record has no basic_meta section",
            ),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
