// No broad clippy allows - production code uses proper error handling

//! # Manifest Loader
//!
//! Shallow-clones a compute block's source repository, locates its manifest
//! file, and parses it into a typed [`BlockManifest`].
//!
//! ## Example
//!
//! ```no_run
//! use scyflow_manifest::ManifestLoader;
//!
//! # tokio_test::block_on(async {
//! let loader = ManifestLoader::new();
//! let manifest = loader.fetch("https://example.invalid/blocks/ingest.git").await.unwrap();
//! println!("{}", manifest.name);
//! # });
//! ```

mod clone;
mod schema;

pub use schema::{BlockManifest, EntrypointManifest, PortManifest};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors that can occur while loading a compute block manifest.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ManifestError {
    /// The source repository could not be cloned.
    #[error("could not reach repository {url}: {source}")]
    RepoUnreachable {
        /// The repository URL that failed.
        url: String,
        /// Underlying libgit2 error.
        #[source]
        source: git2::Error,
    },

    /// No manifest file was found at the repository root.
    #[error("no cbc.yaml/cbc.yml manifest found in {0}")]
    NotFound(String),

    /// The manifest file did not parse, or failed schema validation.
    #[error("manifest at {path} is invalid: {source}")]
    Invalid {
        /// Path of the offending file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_yml::Error,
    },

    /// Filesystem I/O failure unrelated to git itself (e.g. reading the
    /// manifest file after a successful clone).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ManifestError {
    /// Maps this error onto the shared client-facing taxonomy.
    pub fn code(&self) -> scyflow_core::ErrorCode {
        match self {
            ManifestError::RepoUnreachable { .. } => scyflow_core::ErrorCode::RepoUnreachable,
            ManifestError::NotFound(_) => scyflow_core::ErrorCode::ManifestNotFound,
            ManifestError::Invalid { .. } => scyflow_core::ErrorCode::ManifestInvalid,
            ManifestError::Io(_) => scyflow_core::ErrorCode::UpstreamFailure,
        }
    }
}

const MANIFEST_FILE_NAMES: &[&str] = &["cbc.yaml", "cbc.yml"];
const CACHE_CAPACITY: usize = 64;
const CACHE_TTL: Duration = Duration::from_secs(30);

struct CachedClone {
    // Kept alive only for its Drop impl: the directory is removed the
    // moment this entry is evicted or the loader is dropped.
    dir: tempfile::TempDir,
    fetched_at: Instant,
}

/// Fetches and parses compute-block manifests from remote git repositories.
///
/// Clones are shallow (`depth = 1`), single-branch, and land in a scratch
/// directory that is removed automatically when the clone falls out of the
/// short-lived in-process cache (see the module-level cache notes in the
/// crate's design doc) — there is no manual cleanup call to forget.
pub struct ManifestLoader {
    cache: Arc<Mutex<LruCache<String, CachedClone>>>,
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestLoader {
    /// Builds a loader with a bounded, time-limited clone cache.
    pub fn new() -> Self {
        let capacity = std::num::NonZeroUsize::new(CACHE_CAPACITY).expect("CACHE_CAPACITY is non-zero");
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Fetches and parses the manifest at `repo_url`.
    pub async fn fetch(&self, repo_url: &str) -> Result<BlockManifest, ManifestError> {
        let root = self.checkout(repo_url).await?;
        self.parse_manifest(&root).await
    }

    async fn checkout(&self, repo_url: &str) -> Result<PathBuf, ManifestError> {
        {
            let mut cache = self.cache.lock().await;
            if let Some(entry) = cache.get(repo_url) {
                if entry.fetched_at.elapsed() < CACHE_TTL {
                    debug!(repo_url, "reusing cached clone");
                    return Ok(entry.dir.path().to_path_buf());
                }
                debug!(repo_url, "cached clone expired, re-cloning");
                cache.pop(repo_url);
            }
        }

        let url = repo_url.to_string();
        let dir = tokio::task::spawn_blocking(move || clone::shallow_clone(&url))
            .await
            .map_err(|e| ManifestError::Io(std::io::Error::other(e.to_string())))??;

        let path = dir.path().to_path_buf();
        let mut cache = self.cache.lock().await;
        cache.put(
            repo_url.to_string(),
            CachedClone {
                dir,
                fetched_at: Instant::now(),
            },
        );
        Ok(path)
    }

    /// Clones `repo_url` (or reuses a cached clone) and returns every
    /// `*.yaml`/`*.yml` file at its root as `(file_name, contents)` pairs.
    /// Used by the template engine, which treats each such file as a
    /// candidate workflow template rather than a compute-block manifest.
    pub async fn list_yaml_files(&self, repo_url: &str) -> Result<Vec<(String, String)>, ManifestError> {
        let root = self.checkout(repo_url).await?;
        tokio::task::spawn_blocking(move || -> Result<Vec<(String, String)>, ManifestError> {
            let mut out = Vec::new();
            for entry in std::fs::read_dir(&root)? {
                let entry = entry?;
                let path = entry.path();
                let is_yaml = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
                    .unwrap_or(false);
                if path.is_file() && is_yaml {
                    let name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default()
                        .to_string();
                    out.push((name, std::fs::read_to_string(&path)?));
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| ManifestError::Io(std::io::Error::other(e.to_string())))?
    }

    async fn parse_manifest(&self, root: &Path) -> Result<BlockManifest, ManifestError> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let candidate = MANIFEST_FILE_NAMES
                .iter()
                .map(|name| root.join(name))
                .find(|p| p.is_file())
                .ok_or_else(|| ManifestError::NotFound(root.display().to_string()))?;

            let raw = std::fs::read_to_string(&candidate)?;
            schema::parse(&raw).map_err(|source| ManifestError::Invalid {
                path: candidate.display().to_string(),
                source,
            })
        })
        .await
        .map_err(|e| ManifestError::Io(std::io::Error::other(e.to_string())))?
    }
}
