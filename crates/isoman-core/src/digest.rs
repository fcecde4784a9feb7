//! Streaming file digests.

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use crate::error::VerifyError;

const BLOCK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(VerifyError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

fn stream<D: Digest, R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; BLOCK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest everything `reader` yields, as lowercase hex.
pub fn hash_reader<R: Read>(reader: R, algorithm: DigestAlgorithm) -> io::Result<String> {
    match algorithm {
        DigestAlgorithm::Md5 => stream::<Md5, _>(reader),
        DigestAlgorithm::Sha1 => stream::<Sha1, _>(reader),
        DigestAlgorithm::Sha256 => stream::<Sha256, _>(reader),
        DigestAlgorithm::Sha512 => stream::<Sha512, _>(reader),
    }
}

/// Digest a file in fixed-size blocks; memory use does not grow with the
/// file, which matters for multi-gigabyte images.
pub fn hash_file(path: &Path, algorithm: DigestAlgorithm) -> Result<String, VerifyError> {
    let io_err = |source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    hash_reader(file, algorithm).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("SHA1".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha1);
        assert_eq!("sha-256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert_eq!("md5".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Md5);
        match "crc32".parse::<DigestAlgorithm>() {
            Err(VerifyError::UnsupportedAlgorithm { name }) => assert_eq!(name, "crc32"),
            other => panic!("expected unsupported, got {other:?}"),
        }
    }

    #[test]
    fn known_digests_of_hello() {
        let data: &[u8] = b"hello\n";
        assert_eq!(
            hash_reader(data, DigestAlgorithm::Md5).unwrap(),
            "b1946ac92492d2347c6235b4d2611184"
        );
        assert_eq!(
            hash_reader(data, DigestAlgorithm::Sha1).unwrap(),
            "f572d396fae9206628714fb2ce00f72e94f2258f"
        );
        assert_eq!(
            hash_reader(data, DigestAlgorithm::Sha256).unwrap(),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn file_larger_than_one_block() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let body: Vec<u8> = (0u8..=255).cycle().take(3 * BLOCK_SIZE + 17).collect();
        f.write_all(&body).unwrap();
        f.flush().unwrap();
        let from_file = hash_file(f.path(), DigestAlgorithm::Sha512).unwrap();
        let in_memory = hex::encode(Sha512::digest(&body));
        assert_eq!(from_file, in_memory);
        assert_eq!(from_file.len(), 128);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = hash_file(Path::new("/nonexistent/x.iso"), DigestAlgorithm::Sha1).unwrap_err();
        assert!(matches!(err, VerifyError::Io { .. }));
    }
}
