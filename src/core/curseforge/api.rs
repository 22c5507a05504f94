use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::model::{DataResponse, FileRecord, GetFilesRequest, GetModsRequest, ProjectRecord};
use crate::core::error::{ResolverError, ResolverResult};
use crate::core::http::build_api_client;

pub const CURSEFORGE_API: &str = "https://api.curseforge.com";

const FILES_ENDPOINT: &str = "/v1/mods/files";
const MODS_ENDPOINT: &str = "/v1/mods";

/// The two batch lookups the resolver depends on.
///
/// Either call is all-or-nothing: an `Err` means no records are usable.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    async fn get_files(&self, file_ids: &[u32]) -> ResolverResult<Vec<FileRecord>>;
    async fn get_mods(&self, mod_ids: &[u32]) -> ResolverResult<Vec<ProjectRecord>>;
}

/// `MetadataApi` backed by the public CurseForge REST API.
pub struct CurseForgeClient {
    client: Client,
    base_url: String,
}

impl CurseForgeClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a client with its own HTTP stack from the configured credentials.
    pub fn from_credentials(
        base_url: &str,
        user_agent: &str,
        api_key: Option<&str>,
    ) -> ResolverResult<Self> {
        let api_key = api_key
            .filter(|key| !key.is_empty())
            .ok_or(ResolverError::MissingApiKey)?;
        let client = build_api_client(user_agent, api_key)?;
        Ok(Self::new(client, base_url))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_batch<B, T>(&self, path: &str, body: &B) -> ResolverResult<Vec<T>>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let url = self.endpoint(path);
        let resp = self.client.post(&url).json(body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ResolverError::ApiStatus {
                endpoint: url,
                status: status.as_u16(),
            });
        }

        let parsed = resp.json::<DataResponse<T>>().await?;
        debug!("{} returned {} records", url, parsed.data.len());
        Ok(parsed.data)
    }
}

#[async_trait]
impl MetadataApi for CurseForgeClient {
    async fn get_files(&self, file_ids: &[u32]) -> ResolverResult<Vec<FileRecord>> {
        self.post_batch(FILES_ENDPOINT, &GetFilesRequest { file_ids })
            .await
    }

    async fn get_mods(&self, mod_ids: &[u32]) -> ResolverResult<Vec<ProjectRecord>> {
        self.post_batch(MODS_ENDPOINT, &GetModsRequest { mod_ids })
            .await
    }
}
