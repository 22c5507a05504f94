use std::path::Path;

use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};

use crate::core::error::{ResolverError, ResolverResult};

/// Hash `bytes` with the named index hash format and return lowercase hex.
pub fn hex_digest(format: &str, bytes: &[u8]) -> ResolverResult<String> {
    let digest = match format.to_ascii_lowercase().as_str() {
        "sha1" => hex::encode(Sha1::digest(bytes)),
        "sha256" => hex::encode(Sha256::digest(bytes)),
        "sha512" => hex::encode(Sha512::digest(bytes)),
        "md5" => hex::encode(Md5::digest(bytes)),
        other => return Err(ResolverError::UnsupportedHashFormat(other.to_string())),
    };
    Ok(digest)
}

/// Check `bytes` read from `path` against the hash recorded in the index.
pub fn verify(path: &Path, format: &str, expected: &str, bytes: &[u8]) -> ResolverResult<()> {
    let actual = hex_digest(format, bytes)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ResolverError::HashMismatch {
            path: path.to_path_buf(),
            format: format.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
