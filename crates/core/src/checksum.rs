//! Content digests
//!
//! Digests are lowercase hex strings.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const READ_BUFFER: usize = 64 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Md5,
}

impl ChecksumAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Md5 => "md5",
        }
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ChecksumAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(ChecksumAlgorithm::Sha256),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            other => Err(Error::Unsupported(format!("checksum algorithm '{other}'"))),
        }
    }
}

/// Digest an in-memory byte sequence
pub fn digest(algorithm: ChecksumAlgorithm, data: &[u8]) -> String {
    match algorithm {
        ChecksumAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        ChecksumAlgorithm::Md5 => format!("{:x}", md5::compute(data)),
    }
}

/// Digest a local file without loading it whole (blocking)
pub fn digest_file(algorithm: ChecksumAlgorithm, path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut buffer = vec![0u8; READ_BUFFER];

    match algorithm {
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = file.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buffer[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
        ChecksumAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            loop {
                let n = file.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                context.consume(&buffer[..n]);
            }
            Ok(format!("{:x}", context.compute()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            digest(ChecksumAlgorithm::Sha256, b"test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_md5_known_value() {
        assert_eq!(
            digest(ChecksumAlgorithm::Md5, b""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_file_digest_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        for algorithm in [ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Md5] {
            assert_eq!(
                digest_file(algorithm, &path).unwrap(),
                digest(algorithm, &data)
            );
        }
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!(
            "SHA256".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha256
        );
        assert_eq!("md5".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Md5);
        assert!("crc32".parse::<ChecksumAlgorithm>().is_err());
    }
}
