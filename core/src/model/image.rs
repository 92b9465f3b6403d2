use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Digest, ImageId, ProjectId};

/// Encoded formats images are accepted in. Variants are always
/// encoded in the format of their original.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// File extension for derived files, jpeg is always written as `jpg`
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// A row of the Image table: one uploaded image attached to a project.
/// Several records may share the same digest (and therefore the same files).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: ImageId,
    pub project_id: ProjectId,
    pub digest: Digest,
    pub format: ImageFormat,
    /// storage key of the original object
    pub path: String,
    pub created_at: DateTime<Utc>,
}
