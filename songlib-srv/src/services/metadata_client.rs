//! External song metadata client
//!
//! Fetches `text`, `link` and `releaseDate` for a group/song pair from
//! `GET {base_url}/info?group=..&song=..`. No retries; callers treat any
//! error as "no enrichment".

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use songlib_common::release_date::{self, ReleaseDate};
use std::time::Duration;
use thiserror::Error;

const INFO_PATH: &str = "/info";
const USER_AGENT: &str = concat!("songlib-srv/", env!("CARGO_PKG_VERSION"));

/// Metadata client errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Invalid metadata service URL '{0}'")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Metadata service returned {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Enrichment data returned by the metadata service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongMetadata {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, with = "release_date::optional")]
    pub release_date: Option<ReleaseDate>,
}

/// Source of enrichment data for new songs
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// `Ok(None)` means the service had nothing to add
    async fn fetch(&self, group: &str, song: &str) -> Result<Option<SongMetadata>, MetadataError>;
}

/// HTTP implementation of [`MetadataSource`]
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http_client: reqwest::Client,
    info_url: Url,
}

impl MetadataClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MetadataError> {
        let base = base_url.trim().trim_end_matches('/');
        let info_url = Url::parse(&format!("{}{}", base, INFO_PATH))
            .map_err(|_| MetadataError::InvalidUrl(base_url.to_string()))?;

        if !matches!(info_url.scheme(), "http" | "https") {
            return Err(MetadataError::InvalidUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            info_url,
        })
    }

    pub fn info_url(&self) -> &Url {
        &self.info_url
    }
}

#[async_trait]
impl MetadataSource for MetadataClient {
    async fn fetch(&self, group: &str, song: &str) -> Result<Option<SongMetadata>, MetadataError> {
        tracing::debug!(group = %group, song = %song, url = %self.info_url, "Querying metadata service");

        let response = self
            .http_client
            .get(self.info_url.clone())
            .query(&[("group", group), ("song", song)])
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MetadataError::Status(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        if body.trim().is_empty() {
            tracing::debug!(group = %group, song = %song, "Metadata service returned empty body");
            return Ok(None);
        }

        let metadata: SongMetadata =
            serde_json::from_str(&body).map_err(|e| MetadataError::Parse(e.to_string()))?;

        tracing::info!(group = %group, song = %song, "Retrieved song metadata");

        Ok(Some(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MetadataClient {
        MetadataClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            MetadataClient::new("not a url", Duration::from_secs(1)),
            Err(MetadataError::InvalidUrl(_))
        ));
        assert!(matches!(
            MetadataClient::new("ftp://example.com", Duration::from_secs(1)),
            Err(MetadataError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let client = MetadataClient::new("http://localhost:9000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.info_url().as_str(), "http://localhost:9000/api/info");
    }

    #[tokio::test]
    async fn test_fetch_sends_group_and_song() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/info"))
            .and(query_param("group", "Muse"))
            .and(query_param("song", "Supermassive Black Hole"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "releaseDate": "16.07.2006",
                "text": "Ooh baby, don't you know I suffer?\n\nOoh baby",
                "link": "https://www.youtube.com/watch?v=Xsp3_a-PMTw"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let metadata = client_for(&server)
            .fetch("Muse", "Supermassive Black Hole")
            .await
            .unwrap()
            .expect("metadata expected");

        assert_eq!(metadata.release_date, ReleaseDate::from_ymd(2006, 7, 16));
        assert!(metadata.text.starts_with("Ooh baby"));
        assert_eq!(metadata.link, "https://www.youtube.com/watch?v=Xsp3_a-PMTw");
    }

    #[tokio::test]
    async fn test_empty_body_is_no_data() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch("Muse", "Hysteria").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
            .mount(&server)
            .await;

        match client_for(&server).fetch("Muse", "Hysteria").await {
            Err(MetadataError::Status(code, message)) => {
                assert_eq!(code, 503);
                assert!(message.contains("maintenance"));
            }
            other => panic!("Expected Status error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).fetch("Muse", "Hysteria").await,
            Err(MetadataError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_release_date_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "releaseDate": "2006-07-16"
            })))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).fetch("Muse", "Hysteria").await,
            Err(MetadataError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // port 9 (discard) on localhost is expected to refuse connections
        let client = MetadataClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        assert!(matches!(
            client.fetch("Muse", "Hysteria").await,
            Err(MetadataError::Network(_))
        ));
    }
}
