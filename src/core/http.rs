use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const APP_USER_AGENT: &str = concat!("launcher-core/", env!("CARGO_PKG_VERSION"));

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}

/// GET `url` and return the body text. Any transport failure or non-2xx
/// status is reported as a fetch error naming `what`.
pub async fn fetch_text(client: &Client, url: &str, what: &str) -> LauncherResult<String> {
    debug!("Fetching {} from {}", what, url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| LauncherError::fetch(what, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LauncherError::fetch(what, format!("HTTP {} from {}", status, url)));
    }

    response.text().await.map_err(|e| LauncherError::fetch(what, e))
}

/// GET `url` and parse it as `T`, keeping the raw text for callers that
/// persist the document to disk.
pub async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    what: &str,
) -> LauncherResult<(T, String)> {
    let raw = fetch_text(client, url, what).await?;
    let parsed = serde_json::from_str(&raw).map_err(|e| LauncherError::invalid(what, e))?;
    Ok((parsed, raw))
}

/// `{"data": ...}` wrapper used by the modpack server endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// GET a `{"data": T}` document and unwrap it.
pub async fn fetch_data<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    what: &str,
) -> LauncherResult<T> {
    let (envelope, _raw): (DataEnvelope<T>, String) = fetch_json(client, url, what).await?;
    Ok(envelope.data)
}
