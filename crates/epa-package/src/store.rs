//! Artifact persistence
//!
//! # Core Concepts
//!
//! - [`ContentDigest`]: Blake3 digest of an artifact's bytes, hex on the wire
//! - [`ArtifactStore`]: where artifacts and manifests land
//! - [`FsArtifactStore`]: directory tree under a root
//! - [`MemoryArtifactStore`]: in-process map, for hosts that persist elsewhere

use crate::error::{PackageError, PackageResult};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Blake3 digest of artifact content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Digest of arbitrary bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 16 hex chars
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Digest text was not 64 hex chars
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content digest '{0}'")]
pub struct DigestParseError(String);

impl FromStr for ContentDigest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| DigestParseError(s.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| DigestParseError(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = DigestParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.to_string()
    }
}

/// Where and what was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// Path relative to the store root
    pub path: PathBuf,
    /// Bytes written
    pub byte_size: u64,
    /// Digest of the bytes written
    pub digest: ContentDigest,
}

impl StoredArtifact {
    fn describe(path: &Path, bytes: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            byte_size: bytes.len() as u64,
            digest: ContentDigest::compute(bytes),
        }
    }
}

/// Destination for generated artifacts
///
/// Implementations overwrite on repeated writes to one path.
pub trait ArtifactStore: Send + Sync {
    /// Write bytes at a path relative to the store root
    ///
    /// # Errors
    /// Returns [`PackageError::Io`] when the bytes cannot be persisted
    fn write(&self, relative: &Path, bytes: &[u8]) -> PackageResult<StoredArtifact>;
}

/// Stores artifacts as files under a root directory
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Store rooted at `root`; created lazily on first write
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(&self, relative: &Path, bytes: &[u8]) -> PackageResult<StoredArtifact> {
        let full = self.root.join(relative);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PackageError::io_error(relative, e))?;
        }
        std::fs::write(&full, bytes).map_err(|e| PackageError::io_error(relative, e))?;
        tracing::debug!(path = %full.display(), bytes = bytes.len(), "artifact written");
        Ok(StoredArtifact::describe(relative, bytes))
    }
}

/// Keeps artifacts in memory, in write order
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    files: RwLock<IndexMap<PathBuf, Vec<u8>>>,
}

impl MemoryArtifactStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content at a path, as UTF-8 text
    #[must_use]
    pub fn read_to_string(&self, relative: impl AsRef<Path>) -> Option<String> {
        self.files
            .read()
            .get(relative.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Stored paths, in first-write order
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.read().keys().cloned().collect()
    }

    /// Number of stored files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Whether nothing was stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn write(&self, relative: &Path, bytes: &[u8]) -> PackageResult<StoredArtifact> {
        self.files.write().insert(relative.to_path_buf(), bytes.to_vec());
        Ok(StoredArtifact::describe(relative, bytes))
    }
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for &S {
    fn write(&self, relative: &Path, bytes: &[u8]) -> PackageResult<StoredArtifact> {
        (**self).write(relative, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_hex_roundtrip_and_rejects_garbage() {
        let digest = ContentDigest::compute("融资租赁合同".as_bytes());
        let text = digest.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<ContentDigest>(), Ok(digest));
        assert_eq!(digest.short(), text[..16]);
        assert!("abc".parse::<ContentDigest>().is_err());
    }

    #[test]
    fn fs_store_creates_group_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let relative = Path::new("证据组1/证据组1_E001_合同.txt");
        let stored = store.write(relative, "出租人：东方公司".as_bytes()).unwrap();

        assert_eq!(stored.path, relative);
        assert_eq!(stored.byte_size, "出租人：东方公司".len() as u64);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(relative)).unwrap(),
            "出租人：东方公司"
        );
    }

    #[test]
    fn memory_store_overwrites_in_place() {
        let store = MemoryArtifactStore::new();
        store.write(Path::new("a.txt"), b"one").unwrap();
        store.write(Path::new("b.txt"), b"two").unwrap();
        let again = store.write(Path::new("a.txt"), b"three").unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.paths(), vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(store.read_to_string("a.txt").as_deref(), Some("three"));
        assert_eq!(again.digest, ContentDigest::compute(b"three"));
    }
}
