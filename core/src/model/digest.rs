use serde::Serialize;
use std::{fmt::Display, str::FromStr};

/// Content address of a stored object: the lowercase hex SHA-256 of its bytes.
///
/// Two byte sequences have the same `Digest` iff they are identical
/// (modulo hash collisions, which we don't care about).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Digest(String);

pub const DIGEST_LEN: usize = 64;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a valid content digest")]
pub struct InvalidDigestError(pub String);

impl Digest {
    /// Caller guarantees `hex` is 64 lowercase hex chars.
    pub(crate) fn from_hex_unchecked(hex: String) -> Digest {
        debug_assert!(is_valid_digest(&hex));
        Digest(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two directory levels objects are sharded into
    pub fn shard(&self) -> (&str, &str) {
        (&self.0[0..2], &self.0[2..4])
    }
}

fn is_valid_digest(s: &str) -> bool {
    s.len() == DIGEST_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl FromStr for Digest {
    type Err = InvalidDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_valid_digest(s) {
            Ok(Digest(s.to_owned()))
        } else {
            Err(InvalidDigestError(s.to_owned()))
        }
    }
}

impl TryFrom<String> for Digest {
    type Error = InvalidDigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_digest(&value) {
            Ok(Digest(value))
        } else {
            Err(InvalidDigestError(value))
        }
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
