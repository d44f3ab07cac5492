//! Identifier to storage path resolution.
//!
//! Identifiers are spread over a directory tree by hashing: the SHA-256
//! digest of the identifier, in lowercase hex, is cut into fixed-width
//! segments, one per level. With the default width of one character no
//! directory has more than 16 children. Paths are recomputed from the
//! identifier every time; there is no index to consult or keep in sync.

use sha2::{Digest, Sha256};
use url::Url;

use crate::config::{RepositoryConfig, TreeifyConfig};
use crate::error::{NoidError, Result};

/// Bucket segments for `id`.
///
/// Pure function of its arguments. Levels beyond the 64 hex characters of
/// the digest are not produced, and a zero `segment_width` yields no levels.
#[must_use]
pub fn treeify(id: &str, segment_width: usize, depth: usize) -> Vec<String> {
    if segment_width == 0 {
        return Vec::new();
    }

    let digest = hex::encode(Sha256::digest(id.as_bytes()));
    digest
        .as_bytes()
        .chunks(segment_width)
        .take(depth)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// Maps identifiers to repository URIs and back.
#[derive(Debug, Clone)]
pub struct PathResolver {
    host: String,
    base_path: String,
    treeify: TreeifyConfig,
    /// Path segments before the bucket levels.
    base_depth: usize,
}

impl PathResolver {
    /// Create a resolver.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either configuration fails validation or the
    /// host is not an absolute URL.
    pub fn new(repository: &RepositoryConfig, treeify: TreeifyConfig) -> Result<Self> {
        repository
            .validate()
            .and_then(|()| treeify.validate())
            .map_err(|e| NoidError::InvalidConfig(e.to_string()))?;

        let host = repository.host.trim_end_matches('/').to_string();
        let base_path = repository.base_path.trim_end_matches('/').to_string();

        let url = Url::parse(&format!("{host}{base_path}/"))
            .map_err(|e| NoidError::InvalidConfig(format!("repository.host: {e}")))?;
        let base_depth = url
            .path_segments()
            .ok_or_else(|| NoidError::InvalidConfig(format!("repository.host: {host} cannot have paths")))?
            .filter(|segment| !segment.is_empty())
            .count();

        Ok(Self {
            host,
            base_path,
            treeify,
            base_depth,
        })
    }

    /// Bucket segments for `id`.
    #[must_use]
    pub fn treeify(&self, id: &str) -> Vec<String> {
        treeify(id, self.treeify.segment_width, self.treeify.depth)
    }

    /// Relative storage path: bucket segments followed by the identifier.
    #[must_use]
    pub fn bucket_path(&self, id: &str) -> String {
        let mut segments = self.treeify(id);
        segments.push(id.to_string());
        segments.join("/")
    }

    /// `{host}{base_path}` without a trailing slash.
    #[must_use]
    pub fn base_uri(&self) -> String {
        format!("{}{}", self.host, self.base_path)
    }

    /// Join the base URI, `segments` and `id`.
    #[must_use]
    pub fn compose_uri(&self, segments: &[String], id: &str) -> String {
        let mut uri = self.base_uri();
        for segment in segments {
            uri.push('/');
            uri.push_str(segment);
        }
        uri.push('/');
        uri.push_str(id);
        uri
    }

    /// Repository URI of `id`.
    #[must_use]
    pub fn uri_from_id(&self, id: &str) -> String {
        self.compose_uri(&self.treeify(id), id)
    }

    /// Identifier addressed by `uri`.
    ///
    /// The base path and bucket levels are skipped by count; everything after
    /// them is the identifier.
    ///
    /// # Errors
    ///
    /// Returns `MalformedUri` if `uri` does not parse or has no path segment
    /// beyond the expected prefix.
    pub fn id_from_uri(&self, uri: &str) -> Result<String> {
        let malformed = |reason: &str| NoidError::MalformedUri(format!("{uri}: {reason}"));

        let url = Url::parse(uri).map_err(|e| malformed(&e.to_string()))?;
        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(|| malformed("no path"))?
            .collect();

        let prefix = self.base_depth + self.treeify.depth;
        if segments.len() <= prefix {
            return Err(malformed(&format!(
                "expected more than {prefix} path segments, got {}",
                segments.len()
            )));
        }

        let id = segments[prefix..].join("/");
        if id.is_empty() {
            return Err(malformed("empty identifier"));
        }

        Ok(id)
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        let repository = RepositoryConfig::default();
        let base_depth = repository
            .base_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .count();

        Self {
            host: repository.host,
            base_path: repository.base_path,
            treeify: TreeifyConfig::default(),
            base_depth,
        }
    }
}
