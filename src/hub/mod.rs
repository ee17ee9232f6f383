//! Model hub access: repository metadata and filtered snapshot downloads.
//!
//! Talks to the hub's REST API (`/api/models/{repo_id}`) to list repository
//! files, then fetches each selected file over the `resolve` endpoint.
//! Downloads run strictly in sequence and are staged under a `.incomplete`
//! suffix until their size (and, for LFS blobs, SHA-256 digest) checks out.

pub mod patterns;

pub use patterns::PatternSet;

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::HubError;

/// Public hub endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

const REQUEST_TIMEOUT_SECS: u64 = 600;

/// LFS pointer metadata for a large file stored out of band.
#[derive(Debug, Clone, Deserialize)]
pub struct LfsInfo {
    /// Hex-encoded SHA-256 digest of the blob.
    pub oid: String,
    /// Blob size in bytes.
    pub size: u64,
}

/// One file entry in a repository listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoFile {
    /// Path of the file relative to the repository root.
    pub rfilename: String,
    /// File size in bytes, present when the listing includes blob metadata.
    #[serde(default)]
    pub size: Option<u64>,
    /// LFS metadata, present for files stored via LFS.
    #[serde(default)]
    pub lfs: Option<LfsInfo>,
}

impl RepoFile {
    /// The authoritative size for verification: the LFS blob size when the
    /// file is an LFS pointer, the plain size otherwise.
    pub fn expected_size(&self) -> Option<u64> {
        self.lfs.as_ref().map(|l| l.size).or(self.size)
    }
}

/// Repository metadata returned by the hub API.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    /// Commit hash the listing was taken at.
    #[serde(default)]
    pub sha: Option<String>,
    /// All files in the repository.
    #[serde(default)]
    pub siblings: Vec<RepoFile>,
}

/// Parameters for a snapshot download.
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    /// Repository identifier, e.g. `ibm-granite/granite-3.0-2b-instruct`.
    pub repo_id: String,
    /// Git revision to download, `main` by default.
    pub revision: String,
    /// Directory the snapshot is written into.
    pub local_dir: PathBuf,
    /// Optional allowlist; when set, only matching files are downloaded.
    pub allow_patterns: Option<Vec<String>>,
}

impl SnapshotRequest {
    /// Request the `main` revision of a repository with no file filter.
    pub fn new(repo_id: impl Into<String>, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_id: repo_id.into(),
            revision: "main".to_string(),
            local_dir: local_dir.into(),
            allow_patterns: None,
        }
    }

    /// Pin the download to a specific revision.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Restrict the download to files matching any of the given patterns.
    pub fn with_allow_patterns<I, S>(mut self, allow_patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_patterns = Some(allow_patterns.into_iter().map(Into::into).collect());
        self
    }
}

/// Outcome of a snapshot download.
#[derive(Debug, Clone)]
pub struct SnapshotSummary {
    /// Directory the snapshot was written into.
    pub local_dir: PathBuf,
    /// Files written by this call.
    pub files: Vec<PathBuf>,
    /// Total bytes written.
    pub bytes: u64,
    /// Files skipped because they were already present at the expected size.
    pub skipped: usize,
}

/// Client for the model hub REST API.
#[derive(Debug, Clone)]
pub struct HubClient {
    endpoint: String,
    token: Option<String>,
    http: Client,
}

impl Default for HubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HubClient {
    /// Create a client against the public hub endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom endpoint (e.g. a mirror).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: None,
            http: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .user_agent(format!("pipekit/{}", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Attach a bearer token for gated repositories.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the file listing for a model repository.
    ///
    /// Requests blob metadata (`?blobs=true`) so LFS sizes and digests are
    /// available for download verification.
    ///
    /// # Errors
    ///
    /// Returns `HubError::RepoNotFound` when the repository or revision does
    /// not exist (the hub answers 401 for repositories it will not reveal),
    /// `HubError::Api` for other error statuses.
    pub async fn repo_info(&self, repo_id: &str, revision: &str) -> Result<RepoInfo, HubError> {
        let url = if revision == "main" {
            format!("{}/api/models/{}?blobs=true", self.endpoint, repo_id)
        } else {
            format!(
                "{}/api/models/{}/revision/{}?blobs=true",
                self.endpoint, repo_id, revision
            )
        };
        debug!(url = %url, "fetching repository metadata");

        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(|e| HubError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNAUTHORIZED {
            return Err(HubError::RepoNotFound(format!("{repo_id}@{revision}")));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HubError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<RepoInfo>()
            .await
            .map_err(|e| HubError::Http(e.to_string()))
    }

    /// Download a snapshot of a repository into a local directory.
    ///
    /// Files are fetched one at a time in listing order. Each file streams to
    /// a `.incomplete` staging path and is renamed into place only after its
    /// byte count matches the advertised size and, for LFS files, its SHA-256
    /// digest matches the recorded oid. Files already present at the expected
    /// size are skipped. Listing paths must stay under `local_dir`; an
    /// absolute or `..`-carrying name is an error. The first failure aborts
    /// the remaining files.
    pub async fn snapshot_download(
        &self,
        request: &SnapshotRequest,
    ) -> Result<SnapshotSummary, HubError> {
        let allow = match &request.allow_patterns {
            Some(allow_patterns) => Some(PatternSet::new(allow_patterns)?),
            None => None,
        };

        let repo = self.repo_info(&request.repo_id, &request.revision).await?;
        let selected = select_files(&repo, allow.as_ref());

        info!(
            repo_id = %request.repo_id,
            revision = %request.revision,
            total = repo.siblings.len(),
            selected = selected.len(),
            "starting snapshot download"
        );

        fs::create_dir_all(&request.local_dir).await?;

        let mut summary = SnapshotSummary {
            local_dir: request.local_dir.clone(),
            files: Vec::new(),
            bytes: 0,
            skipped: 0,
        };

        for file in selected {
            if !is_safe_relative_path(&file.rfilename) {
                return Err(HubError::UnsafePath(file.rfilename.clone()));
            }
            let target = request.local_dir.join(&file.rfilename);

            if let Ok(existing) = fs::metadata(&target).await {
                if existing.is_file() && file.expected_size() == Some(existing.len()) {
                    debug!(file = %file.rfilename, "already present, skipping");
                    summary.skipped += 1;
                    continue;
                }
            }

            let written = self.download_file(request, file, &target).await?;
            summary.bytes += written;
            summary.files.push(target);
        }

        info!(
            files = summary.files.len(),
            skipped = summary.skipped,
            bytes = summary.bytes,
            local_dir = %summary.local_dir.display(),
            "snapshot download complete"
        );
        Ok(summary)
    }

    /// Fetch one repository file to `target`, staging and verifying on the way.
    async fn download_file(
        &self,
        request: &SnapshotRequest,
        file: &RepoFile,
        target: &Path,
    ) -> Result<u64, HubError> {
        let url = format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint, request.repo_id, request.revision, file.rfilename
        );
        info!(file = %file.rfilename, "downloading");

        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(|e| HubError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HubError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        let staging = staging_path(target);
        let mut out = fs::File::create(&staging).await?;

        let mut hasher = Sha256::new();
        let mut written: u64 = 0;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| HubError::Http(e.to_string()))?;
            hasher.update(&chunk);
            written += chunk.len() as u64;
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        drop(out);

        let digest = hex::encode(hasher.finalize());
        verify_download(file, written, &digest)?;

        fs::rename(&staging, target).await?;
        debug!(file = %file.rfilename, bytes = written, "download verified");
        Ok(written)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Files from the listing that pass the allowlist (all of them when no
/// allowlist is set).
fn select_files<'a>(repo: &'a RepoInfo, allow: Option<&PatternSet>) -> Vec<&'a RepoFile> {
    repo.siblings
        .iter()
        .filter(|f| allow.map_or(true, |p| p.matches(&f.rfilename)))
        .collect()
}

/// Check a finished transfer against the listing: byte count against the
/// advertised size, digest against the LFS oid when there is one.
fn verify_download(file: &RepoFile, written: u64, digest: &str) -> Result<(), HubError> {
    if let Some(expected) = file.expected_size() {
        if written != expected {
            return Err(HubError::SizeMismatch {
                path: file.rfilename.clone(),
                expected,
                actual: written,
            });
        }
    }
    if let Some(lfs) = &file.lfs {
        if !digest.eq_ignore_ascii_case(&lfs.oid) {
            return Err(HubError::ChecksumMismatch {
                path: file.rfilename.clone(),
                expected: lfs.oid.clone(),
                actual: digest.to_string(),
            });
        }
    }
    Ok(())
}

/// Whether a server-supplied listing path can be joined under the download
/// directory: non-empty, relative, no `..` components.
fn is_safe_relative_path(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Staging path for an in-flight download: `<target>.incomplete`.
fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".incomplete");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_with(files: &[(&str, Option<u64>)]) -> RepoInfo {
        RepoInfo {
            sha: Some("abc123".to_string()),
            siblings: files
                .iter()
                .map(|(name, size)| RepoFile {
                    rfilename: name.to_string(),
                    size: *size,
                    lfs: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_select_files_respects_allowlist() {
        let repo = repo_with(&[
            ("config.json", Some(600)),
            ("model.safetensors", Some(1 << 20)),
            ("tokenizer.model", Some(4096)),
            ("merges.txt", Some(128)),
            ("onnx/model.onnx", Some(2048)),
        ]);
        let allow =
            PatternSet::new(["*.safetensors", "*.json", "*.txt"]).expect("valid patterns");

        let selected = select_files(&repo, Some(&allow));
        let names: Vec<&str> = selected.iter().map(|f| f.rfilename.as_str()).collect();
        assert_eq!(names, vec!["config.json", "model.safetensors", "merges.txt"]);
    }

    #[test]
    fn test_select_files_without_allowlist_keeps_everything() {
        let repo = repo_with(&[("a.bin", None), ("b/c.bin", None)]);
        assert_eq!(select_files(&repo, None).len(), 2);
    }

    #[test]
    fn test_expected_size_prefers_lfs() {
        let file = RepoFile {
            rfilename: "model.safetensors".to_string(),
            size: Some(134),
            lfs: Some(LfsInfo {
                oid: "deadbeef".to_string(),
                size: 1 << 30,
            }),
        };
        assert_eq!(file.expected_size(), Some(1 << 30));

        let plain = RepoFile {
            rfilename: "config.json".to_string(),
            size: Some(600),
            lfs: None,
        };
        assert_eq!(plain.expected_size(), Some(600));
    }

    fn lfs_file(oid: &str, size: u64) -> RepoFile {
        RepoFile {
            rfilename: "model.safetensors".to_string(),
            size: Some(134),
            lfs: Some(LfsInfo {
                oid: oid.to_string(),
                size,
            }),
        }
    }

    #[test]
    fn test_verify_download_accepts_matching_transfer() {
        let file = lfs_file("0123abcd", 2048);
        assert!(verify_download(&file, 2048, "0123abcd").is_ok());
        // Digest comparison is case-insensitive.
        assert!(verify_download(&file, 2048, "0123ABCD").is_ok());

        let plain = RepoFile {
            rfilename: "config.json".to_string(),
            size: Some(600),
            lfs: None,
        };
        assert!(verify_download(&plain, 600, "unchecked").is_ok());
    }

    #[test]
    fn test_verify_download_rejects_short_transfer() {
        let file = lfs_file("0123abcd", 2048);
        let err = verify_download(&file, 1024, "0123abcd").expect_err("size mismatch");
        assert!(matches!(
            err,
            HubError::SizeMismatch {
                expected: 2048,
                actual: 1024,
                ..
            }
        ));
    }

    #[test]
    fn test_verify_download_rejects_wrong_digest() {
        let file = lfs_file("0123abcd", 2048);
        let err = verify_download(&file, 2048, "deadbeef").expect_err("checksum mismatch");
        assert!(matches!(err, HubError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_verify_download_without_size_metadata_passes() {
        let file = RepoFile {
            rfilename: "unknown.bin".to_string(),
            size: None,
            lfs: None,
        };
        assert!(verify_download(&file, 12345, "").is_ok());
    }

    #[test]
    fn test_rejects_escaping_listing_paths() {
        assert!(is_safe_relative_path("config.json"));
        assert!(is_safe_relative_path("onnx/model.onnx"));
        assert!(!is_safe_relative_path("../outside.bin"));
        assert!(!is_safe_relative_path("onnx/../../outside.bin"));
        assert!(!is_safe_relative_path("/etc/passwd"));
        assert!(!is_safe_relative_path(""));
    }

    #[test]
    fn test_staging_path_appends_suffix() {
        let staging = staging_path(Path::new("models/model.safetensors"));
        assert_eq!(
            staging,
            PathBuf::from("models/model.safetensors.incomplete")
        );
    }

    #[test]
    fn test_repo_info_deserializes_hub_listing() {
        let payload = r#"{
            "sha": "f8c2e1a0",
            "siblings": [
                {"rfilename": "config.json", "size": 731},
                {"rfilename": "model.safetensors", "size": 134,
                 "lfs": {"oid": "0123abcd", "size": 5368709120}}
            ],
            "private": false,
            "downloads": 12345
        }"#;
        let repo: RepoInfo = serde_json::from_str(payload).expect("listing should parse");
        assert_eq!(repo.sha.as_deref(), Some("f8c2e1a0"));
        assert_eq!(repo.siblings.len(), 2);
        let lfs = repo.siblings[1].lfs.as_ref().expect("lfs metadata");
        assert_eq!(lfs.size, 5_368_709_120);
    }

    #[test]
    fn test_snapshot_request_builder() {
        let request = SnapshotRequest::new("org/model", "./models")
            .with_revision("refs/pr/1")
            .with_allow_patterns(["*.json"]);
        assert_eq!(request.repo_id, "org/model");
        assert_eq!(request.revision, "refs/pr/1");
        assert_eq!(request.local_dir, PathBuf::from("./models"));
        assert_eq!(request.allow_patterns, Some(vec!["*.json".to_string()]));
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = HubClient::with_endpoint("https://hub.example.com/");
        assert_eq!(client.endpoint(), "https://hub.example.com");
    }
}
