//! Media capability seams.
//!
//! Format conversion, thumbnail pixel work and reverse geocoding are
//! external collaborators: the core treats each as a pure function behind a
//! trait and ships passthrough/no-op implementations. A resource kind is a
//! capability set — the service dispatches through the [`KindCapabilities`]
//! injected at construction instead of subclass hook methods.

use std::sync::Arc;

/// Errors from media collaborators.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("unsupported media operation: {0}")]
    Unsupported(String),
    #[error("media processing failed: {0}")]
    Failed(String),
}

/// Format conversion: `(bytes, source mimetype, target mimetype) -> bytes`.
pub trait ContentConverter: Send + Sync {
    fn convert(
        &self,
        data: Vec<u8>,
        source_mimetype: &str,
        target_mimetype: &str,
    ) -> Result<Vec<u8>, MediaError>;
}

/// Thumbnail pixel operations: `(bytes, target size) -> bytes` and rotation.
pub trait ThumbnailRenderer: Send + Sync {
    fn scale(&self, data: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, MediaError>;

    fn rotate(&self, data: Vec<u8>, angle: i32) -> Result<Vec<u8>, MediaError>;
}

/// Optional reverse-geocoding lookup.
pub trait Geocoder: Send + Sync {
    /// Resolves coordinates to a human-readable address, `None` when the
    /// lookup is unavailable or yields nothing.
    fn reverse(&self, latitude: f64, longitude: f64) -> Option<String>;
}

/// Converter that only accepts identity conversions.
pub struct PassthroughConverter;

impl ContentConverter for PassthroughConverter {
    fn convert(
        &self,
        data: Vec<u8>,
        source_mimetype: &str,
        target_mimetype: &str,
    ) -> Result<Vec<u8>, MediaError> {
        if source_mimetype == target_mimetype {
            Ok(data)
        } else {
            Err(MediaError::Unsupported(format!(
                "conversion from '{source_mimetype}' to '{target_mimetype}' is not available for this resource kind"
            )))
        }
    }
}

/// Renderer that returns its input unchanged for both scaling and rotation.
pub struct PassthroughRenderer;

impl ThumbnailRenderer for PassthroughRenderer {
    fn scale(&self, data: Vec<u8>, _width: u32, _height: u32) -> Result<Vec<u8>, MediaError> {
        Ok(data)
    }

    fn rotate(&self, data: Vec<u8>, _angle: i32) -> Result<Vec<u8>, MediaError> {
        Ok(data)
    }
}

/// Geocoder that never resolves anything.
pub struct NoGeocoder;

impl Geocoder for NoGeocoder {
    fn reverse(&self, _latitude: f64, _longitude: f64) -> Option<String> {
        None
    }
}

impl From<MediaError> for crate::ServiceError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Unsupported(detail) => {
                crate::ServiceError::validation("Unsupported format conversion.", detail)
            }
            MediaError::Failed(detail) => {
                crate::ServiceError::validation("Media processing failed.", detail)
            }
        }
    }
}

/// The capability set of one resource kind.
#[derive(Clone)]
pub struct KindCapabilities {
    pub converter: Arc<dyn ContentConverter>,
    pub thumbnailer: Arc<dyn ThumbnailRenderer>,
    pub geocoder: Arc<dyn Geocoder>,
}

impl Default for KindCapabilities {
    fn default() -> Self {
        Self {
            converter: Arc::new(PassthroughConverter),
            thumbnailer: Arc::new(PassthroughRenderer),
            geocoder: Arc::new(NoGeocoder),
        }
    }
}

impl KindCapabilities {
    pub fn with_converter(mut self, converter: Arc<dyn ContentConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_thumbnailer(mut self, thumbnailer: Arc<dyn ThumbnailRenderer>) -> Self {
        self.thumbnailer = thumbnailer;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }
}
