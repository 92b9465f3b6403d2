use std::collections::HashSet;

use image::{
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
    imageops::FilterType,
    ColorType, DynamicImage, GenericImageView, ImageEncoder,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::{catalog::storage_key::OBJECTS_DIR, model::ImageFormat};

pub const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSpec {
    pub name: String,
    /// target width in pixels, images are never scaled up to reach it
    pub width: u32,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>, width: u32) -> VariantSpec {
        VariantSpec {
            name: name.into(),
            width,
        }
    }
}

/// The fixed set of sizes every ingested image is rendered at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTable {
    specs: Vec<VariantSpec>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidVariantTable {
    #[error("at least two variants are required")]
    TooFew,
    #[error("invalid variant name '{0}', names must be lowercase [a-z0-9_-] and not 'objects'")]
    InvalidName(String),
    #[error("duplicate variant name '{0}'")]
    DuplicateName(String),
    #[error("variant '{0}' has a width of zero")]
    ZeroWidth(String),
}

impl VariantTable {
    pub fn new(specs: Vec<VariantSpec>) -> Result<VariantTable, InvalidVariantTable> {
        if specs.len() < 2 {
            return Err(InvalidVariantTable::TooFew);
        }
        let mut names = HashSet::new();
        for spec in &specs {
            let valid_name = !spec.name.is_empty()
                && spec.name != OBJECTS_DIR
                && spec
                    .name
                    .bytes()
                    .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-'));
            if !valid_name {
                return Err(InvalidVariantTable::InvalidName(spec.name.clone()));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(InvalidVariantTable::DuplicateName(spec.name.clone()));
            }
            if spec.width == 0 {
                return Err(InvalidVariantTable::ZeroWidth(spec.name.clone()));
            }
        }
        Ok(VariantTable { specs })
    }

    pub fn specs(&self) -> &[VariantSpec] {
        &self.specs
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }
}

impl Default for VariantTable {
    fn default() -> Self {
        VariantTable {
            specs: vec![
                VariantSpec::new("thumbnail", 300),
                VariantSpec::new("large", 1200),
            ],
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum VariantError {
    #[error("unsupported image format, only jpeg and png are accepted")]
    UnsupportedFormat,
    #[error("could not decode image")]
    Decode(#[source] image::ImageError),
    #[error("could not encode variant '{variant}'")]
    Encode {
        variant: String,
        #[source]
        source: image::ImageError,
    },
}

impl VariantError {
    /// The input was bad, as opposed to us failing to process it
    pub fn is_decode_error(&self) -> bool {
        matches!(self, VariantError::UnsupportedFormat | VariantError::Decode(_))
    }
}

#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
    format: ImageFormat,
}

impl DecodedImage {
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedVariant {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Format of an encoded image judged by its magic bytes alone
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Jpeg) => Some(ImageFormat::Jpeg),
        Ok(image::ImageFormat::Png) => Some(ImageFormat::Png),
        _ => None,
    }
}

/// Sniffs the format from the bytes themselves, file names and client
/// supplied content types are never trusted.
#[instrument(skip(bytes), fields(len = bytes.len()), level = "debug")]
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, VariantError> {
    let format = sniff_format(bytes).ok_or(VariantError::UnsupportedFormat)?;
    let image_format = match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
    };
    let image =
        image::load_from_memory_with_format(bytes, image_format).map_err(VariantError::Decode)?;
    Ok(DecodedImage { image, format })
}

/// Size of a variant with target width `target` for an image of `width`x`height`.
/// Never larger than the original, aspect ratio is kept and no side is zero.
pub fn target_size(width: u32, height: u32, target: u32) -> (u32, u32) {
    if width <= target {
        return (width, height);
    }
    let scaled = (height as f64 * target as f64 / width as f64).round() as u32;
    (target, scaled.max(1))
}

/// Renders every entry of `specs`, in the same order. The variants are
/// resized and encoded in parallel on the rayon pool.
#[instrument(skip(image, specs), level = "debug")]
pub fn generate_variants(
    image: &DecodedImage,
    specs: &[VariantSpec],
) -> Result<Vec<EncodedVariant>, VariantError> {
    specs
        .par_iter()
        .map(|spec| render_variant(image, spec))
        .collect()
}

fn render_variant(image: &DecodedImage, spec: &VariantSpec) -> Result<EncodedVariant, VariantError> {
    let (width, height) = image.dimensions();
    let (target_width, target_height) = target_size(width, height, spec.width);
    let resized;
    let img = if (target_width, target_height) == (width, height) {
        &image.image
    } else {
        resized = image
            .image
            .resize_exact(target_width, target_height, FilterType::Lanczos3);
        &resized
    };
    let bytes = encode(img, image.format).map_err(|source| VariantError::Encode {
        variant: spec.name.clone(),
        source,
    })?;
    Ok(EncodedVariant {
        name: spec.name.clone(),
        width: target_width,
        height: target_height,
        bytes,
    })
}

fn encode(img: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let (width, height) = img.dimensions();
    match format {
        ImageFormat::Jpeg => {
            // jpeg has no alpha, and the encoder wants 8 bit samples
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode(
                rgb.as_raw(),
                width,
                height,
                ColorType::Rgb8,
            )?;
        }
        ImageFormat::Png => {
            let color = img.color();
            PngEncoder::new(&mut buf).write_image(img.as_bytes(), width, height, color)?;
        }
    }
    Ok(buf)
}
