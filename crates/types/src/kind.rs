//! Resource-kind vocabulary.
//!
//! Every resource in the vault belongs to exactly one kind. The kind decides
//! which upload MIME types are accepted and which media capabilities
//! (conversion, thumbnail extraction) apply.

use std::fmt;
use std::str::FromStr;

/// MIME types accepted for book and document uploads.
const DOCUMENT_MIMETYPES: &[&str] = &[
    "text/plain",
    "application/pdf",
    "application/epub+zip",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "application/vnd.ms-xpsdocument",
    "application/x-cbz",
    "application/x-fictionbook+xml",
    "application/x-mobipocket-ebook",
];

/// MIME types accepted for image uploads (and all thumbnail uploads).
pub const IMAGE_MIMETYPES: &[&str] = &[
    "image/heic",
    "image/jpeg",
    "image/png",
    "image/webp",
];

const AUDIO_MIMETYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/flac",
    "audio/mp4",
    "audio/x-m4a",
    "audio/aac",
    "audio/ogg",
    "audio/opus",
    "audio/midi",
    "audio/x-aiff",
    "audio/ape",
    "audio/x-wavpack",
    "audio/x-musepack",
];

const VIDEO_MIMETYPES: &[&str] = &[
    "video/quicktime",
    "video/mp4",
    "video/x-msvideo",
    "video/webm",
    "video/x-matroska",
];

/// File-extension to MIME-type table used when magic-byte sniffing fails
/// (plain text and some container formats carry no usable signature).
const EXTENSION_MIMETYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("pdf", "application/pdf"),
    ("epub", "application/epub+zip"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("doc", "application/msword"),
    ("xps", "application/vnd.ms-xpsdocument"),
    ("cbz", "application/x-cbz"),
    ("fb2", "application/x-fictionbook+xml"),
    ("mobi", "application/x-mobipocket-ebook"),
    ("heic", "image/heic"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("m4a", "audio/x-m4a"),
    ("m4p", "audio/mp4"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/opus"),
    ("mid", "audio/midi"),
    ("midi", "audio/midi"),
    ("aiff", "audio/x-aiff"),
    ("ape", "audio/ape"),
    ("wv", "audio/x-wavpack"),
    ("mpc", "audio/x-musepack"),
    ("mov", "video/quicktime"),
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
];

/// Looks up the MIME type for a file extension (lowercase, without the dot).
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    let wanted = extension.to_ascii_lowercase();
    EXTENSION_MIMETYPES
        .iter()
        .find(|(ext, _)| *ext == wanted)
        .map(|(_, mime)| *mime)
}

/// The five top-level resource categories served by the vault.
///
/// Kinds serialise as their lowercase plural route segment (`books`,
/// `videos`, ...), matching both the REST paths and the on-disk directory
/// names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Books,
    Videos,
    Music,
    Documents,
    Images,
}

impl ResourceKind {
    /// All kinds, in route-registration order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Books,
        ResourceKind::Videos,
        ResourceKind::Music,
        ResourceKind::Documents,
        ResourceKind::Images,
    ];

    /// The route segment / directory name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Books => "books",
            ResourceKind::Videos => "videos",
            ResourceKind::Music => "music",
            ResourceKind::Documents => "documents",
            ResourceKind::Images => "images",
        }
    }

    /// MIME types accepted for content uploads of this kind.
    ///
    /// Books and documents share the document set.
    pub fn allowed_mimetypes(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Books | ResourceKind::Documents => DOCUMENT_MIMETYPES,
            ResourceKind::Images => IMAGE_MIMETYPES,
            ResourceKind::Music => AUDIO_MIMETYPES,
            ResourceKind::Videos => VIDEO_MIMETYPES,
        }
    }

    /// Whether `mimetype` is acceptable as content for this kind.
    pub fn accepts_mimetype(&self, mimetype: &str) -> bool {
        self.allowed_mimetypes().contains(&mimetype)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ResourceKind::Images)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "books" => Ok(ResourceKind::Books),
            "videos" => Ok(ResourceKind::Videos),
            "music" => Ok(ResourceKind::Music),
            "documents" => Ok(ResourceKind::Documents),
            "images" => Ok(ResourceKind::Images),
            other => Err(UnknownKind(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unknown resource-kind segment.
#[derive(Debug, thiserror::Error)]
#[error("unknown resource kind: '{0}'")]
pub struct UnknownKind(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_kinds() {
        for kind in ResourceKind::ALL {
            let parsed: ResourceKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("movies".parse::<ResourceKind>().is_err());
        assert!("Books".parse::<ResourceKind>().is_err());
        assert!("".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ResourceKind::Books).unwrap();
        assert_eq!(json, "\"books\"");
        let parsed: ResourceKind = serde_json::from_str("\"images\"").unwrap();
        assert_eq!(parsed, ResourceKind::Images);
    }

    #[test]
    fn test_books_and_documents_share_mimetypes() {
        assert_eq!(
            ResourceKind::Books.allowed_mimetypes(),
            ResourceKind::Documents.allowed_mimetypes()
        );
    }

    #[test]
    fn test_accepts_mimetype() {
        assert!(ResourceKind::Images.accepts_mimetype("image/png"));
        assert!(!ResourceKind::Images.accepts_mimetype("video/mp4"));
        assert!(ResourceKind::Books.accepts_mimetype("application/pdf"));
        assert!(!ResourceKind::Music.accepts_mimetype("application/pdf"));
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("pdf"), Some("application/pdf"));
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("exe"), None);
    }
}
