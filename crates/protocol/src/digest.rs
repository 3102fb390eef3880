//! Content hash for large-object uploads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha512};

pub const HASH_HEADER: &str = "x-ms-meta-hash";
pub const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";
pub const BLOB_TYPE: &str = "BlockBlob";

/// `base64;sha512;<hash>` over the payload. Standard base64: unlike request
/// signatures, `/` and `+` are left alone.
pub fn format_hash_header(data: &[u8]) -> String {
    format!("base64;sha512;{}", STANDARD.encode(Sha512::digest(data)))
}
