//! Remote directory listing and raw-file download against GitHub's
//! contents API and raw-content host.
//!
//! This is the only module that talks to the network. A 404 on a listing
//! means "category does not exist upstream" and yields an empty list; any
//! other failure is fatal to the enclosing analysis (see `error.rs`).

use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, SyncError};
use crate::settings::Settings;
use crate::walk::is_noise_entry;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Remote source location: repository, branch, and the path prefix under
/// which the configuration bundle lives.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    /// `owner/name`.
    pub repo: String,
    pub branch: String,
    /// Prefix inside the repository, e.g. `claude-code-config`. May be empty.
    pub base_path: String,
    pub token: Option<String>,
    /// Contents-API endpoint. Overridable so tests can point at a local
    /// listener; everything else uses the GitHub default.
    pub api_base: String,
    /// Raw-content host, same deal.
    pub raw_base: String,
}

impl RemoteSource {
    pub fn new(
        repo: impl Into<String>,
        branch: impl Into<String>,
        base_path: impl Into<String>,
        token: Option<String>,
    ) -> RemoteSource {
        RemoteSource {
            repo: repo.into(),
            branch: branch.into(),
            base_path: base_path.into(),
            token,
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry from the contents API, with `path` relative to the source's
/// base path.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Git blob SHA as reported by the API (tree SHA for directories).
    pub sha: String,
}

#[derive(Deserialize)]
struct ApiEntry {
    name: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

pub struct RemoteClient {
    http: reqwest::Client,
    source: RemoteSource,
}

impl RemoteClient {
    pub fn new(source: RemoteSource) -> Result<RemoteClient> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ccsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(RemoteClient { http, source })
    }

    pub fn source(&self) -> &RemoteSource {
        &self.source
    }

    fn repo_path(&self, rel: &str) -> String {
        if self.source.base_path.is_empty() {
            rel.to_string()
        } else if rel.is_empty() {
            self.source.base_path.clone()
        } else {
            format!("{}/{}", self.source.base_path, rel)
        }
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.source.token {
            Some(token) => req.header("Authorization", format!("token {token}")),
            None => req,
        }
    }

    /// List one directory level. 404 → empty list.
    pub async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>> {
        let url = format!(
            "{}/repos/{}/contents/{}?ref={}",
            self.source.api_base,
            self.source.repo,
            self.repo_path(dir),
            self.source.branch
        );
        tracing::debug!(%url, "listing remote directory");

        let response = self
            .authorize(self.http.get(&url))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(SyncError::RemoteListing {
                path: dir.to_string(),
                status: status.as_u16(),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        let items: Vec<ApiEntry> = serde_json::from_value(payload)
            .map_err(|_| SyncError::MalformedListing(dir.to_string()))?;

        let mut entries = Vec::new();
        for item in items {
            if is_noise_entry(std::ffi::OsStr::new(&item.name)) {
                continue;
            }
            let kind = match item.kind.as_str() {
                "file" => EntryKind::File,
                "dir" => EntryKind::Dir,
                // Symlinks and submodules are not part of the bundle format.
                _ => continue,
            };
            let path = if dir.is_empty() {
                item.name.clone()
            } else {
                format!("{}/{}", dir, item.name)
            };
            entries.push(RemoteEntry {
                name: item.name,
                path,
                kind,
                sha: item.sha,
            });
        }
        Ok(entries)
    }

    /// Depth-first flat listing under `dir`. Directory entries are included
    /// (after their traversal) so the classifier knows which remote paths
    /// are directories.
    pub async fn list_recursive(&self, dir: &str) -> Result<Vec<RemoteEntry>> {
        let mut out = Vec::new();
        let mut stack = vec![dir.to_string()];
        while let Some(current) = stack.pop() {
            for entry in self.list(&current).await? {
                if entry.kind == EntryKind::Dir {
                    stack.push(entry.path.clone());
                }
                out.push(entry);
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    /// Fetch one file's raw bytes.
    pub async fn download(&self, rel_path: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/{}/{}/{}",
            self.source.raw_base,
            self.source.repo,
            self.source.branch,
            self.repo_path(rel_path)
        );
        tracing::debug!(%url, "downloading remote file");

        let response = self
            .authorize(self.http.get(&url))
            .header("Accept", "application/vnd.github.v3.raw")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Download {
                path: rel_path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch and parse the remote settings document. Absent upstream
    /// settings are `None`, not an error; hooks are optional.
    pub async fn fetch_settings(&self) -> Result<Option<Settings>> {
        let bytes = match self.download(crate::settings::SETTINGS_FILE).await {
            Ok(bytes) => bytes,
            Err(SyncError::Download { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let settings = serde_json::from_slice(&bytes)
            .map_err(|_| SyncError::InvalidSettings(Path::new(crate::settings::SETTINGS_FILE).to_path_buf()))?;
        Ok(Some(settings))
    }
}
