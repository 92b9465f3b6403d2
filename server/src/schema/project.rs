use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use folio_core::{
    catalog::storage_key,
    model::{self, ImageFormat},
    processing::image::VariantTable,
};

use super::{ImageId, ProjectId};

/// Public URL of an original, served with a sniffed content type
pub fn original_url(digest: &model::Digest) -> String {
    format!("/uploads/original/{}", digest)
}

pub fn variant_url(name: &str, digest: &model::Digest, format: ImageFormat) -> String {
    format!("/uploads/{}", storage_key::variant(name, digest, format))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub id: ImageId,
    pub digest: String,
    pub format: ImageFormat,
    pub original: String,
    /// variant name to URL
    pub variants: BTreeMap<String, String>,
}

impl Image {
    pub fn from_model(image: &model::ImageRecord, variants: &VariantTable) -> Image {
        Image {
            id: image.id.into(),
            digest: image.digest.to_string(),
            format: image.format,
            original: original_url(&image.digest),
            variants: variants
                .names()
                .map(|name| {
                    (
                        name.to_owned(),
                        variant_url(name, &image.digest, image.format),
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    /// sanitized iframe markup or empty
    pub video_embed: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub images: Vec<Image>,
}

impl Project {
    pub fn from_model(project: &model::Project, variants: &VariantTable) -> Project {
        Project {
            id: project.id.into(),
            title: project.title.clone(),
            description: project.description.clone(),
            video_embed: project.video_embed.clone(),
            date: project.date,
            created_at: project.created_at,
            updated_at: project.updated_at,
            tags: project.tags.clone(),
            images: project
                .images
                .iter()
                .map(|image| Image::from_model(image, variants))
                .collect(),
        }
    }

    pub fn from_models(projects: &[model::Project], variants: &VariantTable) -> Vec<Project> {
        projects
            .iter()
            .map(|p| Project::from_model(p, variants))
            .collect()
    }
}
