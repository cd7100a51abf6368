//! Local file backend.
//!
//! The fetch key is the file path. Files carry no revision of their own,
//! so the source derives one per path according to [`FileVersioning`].
//!
//! Reads and version assignment happen under one lock, so versions follow
//! read order: bytes read later never get an older version than bytes
//! read earlier.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::{ConfigSource, RawConfig, SourceError};
use crate::config::FileVersioning;
use crate::store::VersionToken;

const SOURCE_NAME: &str = "file";

#[derive(Debug, Clone, Copy)]
struct Generation {
    digest: u64,
    len: usize,
    version: VersionToken,
}

/// Reads configuration documents from the local filesystem.
#[derive(Debug, Default)]
pub struct FileSource {
    versioning: FileVersioning,
    generations: Mutex<HashMap<PathBuf, Generation>>,
}

impl FileSource {
    pub fn new(versioning: FileVersioning) -> Self {
        Self {
            versioning,
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn versioning(&self) -> FileVersioning {
        self.versioning
    }
}

/// Version for `bytes` read from `path`, advancing the per-path generation
/// when `versioning` says the file changed.
fn next_version(
    generations: &mut HashMap<PathBuf, Generation>,
    versioning: FileVersioning,
    path: PathBuf,
    bytes: &[u8],
) -> VersionToken {
    let digest = content_digest(bytes);
    let entry = generations.entry(path).or_insert(Generation {
        digest,
        len: bytes.len(),
        version: VersionToken::UNSET,
    });

    let unchanged = entry.digest == digest && entry.len == bytes.len();
    let advance = match versioning {
        FileVersioning::Always => true,
        FileVersioning::Content => entry.version.is_unset() || !unchanged,
    };

    if advance {
        *entry = Generation {
            digest,
            len: bytes.len(),
            version: entry.version.next(),
        };
    }
    entry.version
}

fn content_digest(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl ConfigSource for FileSource {
    async fn fetch(&self, key: &str) -> Result<RawConfig, SourceError> {
        let path = PathBuf::from(key);
        tracing::debug!(path = %path.display(), "Reading configuration file");

        let mut generations = self.generations.lock().await;
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::not_found(key),
            _ => SourceError::unavailable(SOURCE_NAME, format!("{}: {}", path.display(), e)),
        })?;

        let version = next_version(&mut generations, self.versioning, path, &bytes);
        Ok(RawConfig { bytes, version })
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
