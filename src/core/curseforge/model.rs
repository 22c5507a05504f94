// ─── CurseForge wire types ───
// Request and response bodies for the two batch endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/mods/files`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFilesRequest<'a> {
    pub file_ids: &'a [u32],
}

/// Body of `POST /v1/mods`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetModsRequest<'a> {
    pub mod_ids: &'a [u32],
}

/// Envelope shared by every CurseForge response.
#[derive(Debug, Deserialize)]
pub struct DataResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// A single file entry returned by the file lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: u32,
    pub mod_id: u32,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl FileRecord {
    /// The download URL, treating an empty string the same as a missing one.
    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// A single project entry returned by the project lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectRecord {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub links: Option<ProjectLinks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLinks {
    #[serde(default)]
    pub website_url: String,
}

impl ProjectRecord {
    pub fn website_url(&self) -> &str {
        self.links
            .as_ref()
            .map(|links| links.website_url.as_str())
            .unwrap_or_default()
    }

    /// Page the user opens to fetch `file_id` by hand.
    pub fn manual_download_url(&self, file_id: u32) -> String {
        format!(
            "{}/files/{}",
            self.website_url().trim_end_matches('/'),
            file_id
        )
    }
}
