use camino::Utf8Path;
use folio_core::model::ImageFormat;

pub fn guess_mime_type(file_ext: &str) -> Option<&'static str> {
    match file_ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg.mime_type()),
        "png" => Some(ImageFormat::Png.mime_type()),
        _ => None,
    }
}

/// MIME type for a variant key like `thumbnail/<digest>.jpg`
pub fn guess_mime_type_key(key: &str) -> Option<&'static str> {
    let path = Utf8Path::new(key);
    let ext = path.extension()?;
    match guess_mime_type(ext) {
        Some(m) => Some(m),
        None => {
            tracing::warn!(
                "can't guess MIME type for filename '{}'",
                path.file_name().unwrap_or_default()
            );
            None
        }
    }
}
