use crate::model::{Digest, ImageFormat};

/// Directory originals are sharded into. No variant may use this name.
pub const OBJECTS_DIR: &str = "objects";

pub fn original(digest: &Digest) -> String {
    let (a, b) = digest.shard();
    format!("{}/{}/{}/{}", OBJECTS_DIR, a, b, digest)
}

pub fn variant(name: &str, digest: &Digest, format: ImageFormat) -> String {
    format!("{}/{}.{}", name, digest, format.extension())
}

/// Recovers the digest from a key returned by `original` or `variant`.
/// None for anything else (temp files, stray files).
pub fn digest_from_key(key: &str) -> Option<Digest> {
    let parts: Vec<&str> = key.split('/').collect();
    match parts.as_slice() {
        [OBJECTS_DIR, a, b, name] => {
            let digest: Digest = name.parse().ok()?;
            let (sa, sb) = digest.shard();
            (sa == *a && sb == *b).then_some(digest)
        }
        [_variant, file_name] => {
            let (stem, ext) = file_name.rsplit_once('.')?;
            if !["jpg", "png"].contains(&ext) {
                return None;
            }
            stem.parse().ok()
        }
        _ => None,
    }
}
