use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;

use crate::core::error::{ResolverError, ResolverResult};

pub const APP_USER_AGENT: &str = "cfmeta/0.1.0";

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Build the shared client for the metadata API.
///
/// Every request carries the JSON accept header, the user agent and the API key.
pub fn build_api_client(user_agent: &str, api_key: &str) -> ResolverResult<Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut key = HeaderValue::from_str(api_key).map_err(|_| ResolverError::InvalidApiKey)?;
    key.set_sensitive(true);
    default_headers.insert(API_KEY_HEADER, key);

    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(default_headers)
        .build()?;

    Ok(client)
}
