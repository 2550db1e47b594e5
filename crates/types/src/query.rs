//! List-query and thumbnail vocabulary shared by the service and REST layers.

use std::fmt;
use std::str::FromStr;

/// Error returned when a query parameter value is not in its vocabulary.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for '{parameter}': '{value}'")]
pub struct InvalidParameter {
    pub parameter: &'static str,
    pub value: String,
}

/// Sort direction for resource listings. Defaults to descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::Desc)
    }
}

impl FromStr for SortOrder {
    type Err = InvalidParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(InvalidParameter {
                parameter: "order",
                value: other.to_owned(),
            }),
        }
    }
}

/// Sort key for resource listings. Defaults to the resource id, which is
/// creation order for sortable ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    CreatedAt,
    UpdatedAt,
    /// First content entry's filename.
    Filename,
    /// First content entry's size.
    Size,
    /// `detail_meta.sorting_string`, compared as a string.
    SortingString,
    /// `detail_meta.sorting_date`, parsed as an ISO-8601 timestamp.
    SortingDate,
}

impl FromStr for SortField {
    type Err = InvalidParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "created_at" => Ok(SortField::CreatedAt),
            "updated_at" => Ok(SortField::UpdatedAt),
            "filename" => Ok(SortField::Filename),
            "size" => Ok(SortField::Size),
            "sorting_string" => Ok(SortField::SortingString),
            "sorting_date" => Ok(SortField::SortingDate),
            other => Err(InvalidParameter {
                parameter: "sort",
                value: other.to_owned(),
            }),
        }
    }
}

/// Stored thumbnail variants.
///
/// `Original` is the uploaded (or extracted) source image; the sized variants
/// are derived from it on demand and cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThumbnailSize {
    Original,
    Small,
    #[default]
    Medium,
    Large,
}

impl ThumbnailSize {
    pub const ALL: [ThumbnailSize; 4] = [
        ThumbnailSize::Original,
        ThumbnailSize::Small,
        ThumbnailSize::Medium,
        ThumbnailSize::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThumbnailSize::Original => "original",
            ThumbnailSize::Small => "small",
            ThumbnailSize::Medium => "medium",
            ThumbnailSize::Large => "large",
        }
    }

    /// Target pixel dimensions, `None` for the original.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            ThumbnailSize::Original => None,
            ThumbnailSize::Small => Some((100, 100)),
            ThumbnailSize::Medium => Some((150, 150)),
            ThumbnailSize::Large => Some((300, 300)),
        }
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThumbnailSize {
    type Err = InvalidParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(ThumbnailSize::Original),
            "small" => Ok(ThumbnailSize::Small),
            "medium" => Ok(ThumbnailSize::Medium),
            "large" => Ok(ThumbnailSize::Large),
            other => Err(InvalidParameter {
                parameter: "size",
                value: other.to_owned(),
            }),
        }
    }
}
