use sha2::{Digest as _, Sha256};

use crate::model::Digest;

/// Content address of `bytes`
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    Digest::from_hex_unchecked(hex::encode(Sha256::digest(bytes)))
}

/// Client addresses are only ever stored hashed
pub fn hash_ip(ip: &str) -> String {
    hex::encode(Sha256::digest(ip.as_bytes()))
}
