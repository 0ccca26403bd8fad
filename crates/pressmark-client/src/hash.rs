//! Response body hashing via the RustCrypto digests.

use md5::Md5;
use pressmark_core::HashAlgorithm;
use sha2::{Digest, Sha256};

/// Hex digest of `data` under the requested algorithm.
///
/// Returns lowercase hex, matching the catalog's signature encoding.
#[must_use]
pub fn digest_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex_string(&Md5::digest(data)),
        HashAlgorithm::Sha256 => hex_string(&Sha256::digest(data)),
    }
}

fn hex_string(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_known_vector() {
        assert_eq!(
            digest_bytes(HashAlgorithm::Md5, b"hello world"),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            digest_bytes(HashAlgorithm::Sha256, b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            digest_bytes(HashAlgorithm::Md5, b""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }
}
