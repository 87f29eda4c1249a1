use crate::error::{Result, VerificationError};
use crate::hasher::{Hasher, Sha256Hasher};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const READ_CHUNK: usize = 8 * 1024;

/// Decides whether a downloaded archive may be applied.
pub trait Verifier: Send + Sync {
    /// `Ok(false)` rejects the archive; `Err` means it could not be checked.
    fn verify(&self, download_path: &Path) -> Result<bool>;
}

/// Accepts every archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Verifier for AcceptAll {
    fn verify(&self, _download_path: &Path) -> Result<bool> {
        Ok(true)
    }
}

/// Compares the file's SHA-256 against a known digest.
#[derive(Debug, Clone)]
pub struct Sha256Verifier {
    expected: Vec<u8>,
}

impl Sha256Verifier {
    pub fn new(expected: impl Into<Vec<u8>>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    pub fn from_hex(digest: &str) -> Result<Self> {
        Ok(Self::new(hex::decode(digest.trim())?))
    }

    pub fn digest_file(path: &Path) -> Result<Vec<u8>> {
        let io_err = |source| VerificationError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).map_err(io_err)?;
        let mut hasher = Sha256Hasher::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut buf).map_err(io_err)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize())
    }

    /// Like [`Verifier::verify`] but reports both digests on mismatch.
    pub fn check(&self, path: &Path) -> Result<()> {
        let actual = Self::digest_file(path)?;
        if actual != self.expected {
            return Err(VerificationError::Mismatch {
                expected: hex::encode(&self.expected),
                actual: hex::encode(actual),
            });
        }
        Ok(())
    }
}

impl Verifier for Sha256Verifier {
    fn verify(&self, download_path: &Path) -> Result<bool> {
        match self.check(download_path) {
            Ok(()) => Ok(true),
            Err(VerificationError::Mismatch { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
